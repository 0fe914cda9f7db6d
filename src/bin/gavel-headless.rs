//! Headless auction engine for driving and E2E testing.
//!
//! Runs one engine instance per process with JSON-over-stdio IPC.
//! Logging goes to stderr; stdout is reserved for the IPC protocol.
//!
//! On startup, emits a `Ready` JSON line to stdout. Then reads `Command`
//! JSON lines from stdin and writes `Response` lines. Room events from
//! watched auctions are interleaved on stdout as they fire.

use std::sync::Arc;

use gavel::{
    AdmissionPolicy, Auction, AuctionHouse, BidderId, GavelResult, OfflineGateway, ProductId,
    Room, SystemClock,
};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ── IPC types ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ReadyEvent {
    event: &'static str,
}

#[derive(Deserialize)]
#[serde(tag = "cmd")]
enum Command {
    CreateAuction {
        product: u64,
        seller: u64,
        item: String,
        starting_bid: u64,
        min_increment: u64,
        duration_secs: u64,
    },
    PlaceBid {
        product: u64,
        bidder: u64,
        amount: u64,
    },
    BidHistory {
        product: u64,
    },
    Watch {
        product: u64,
    },
    CancelAuction {
        product: u64,
    },
    Shutdown,
}

#[derive(Serialize)]
#[serde(tag = "status")]
enum Response {
    Ok { data: Option<serde_json::Value> },
    Err { message: String },
}

// ── Helpers ──────────────────────────────────────────────────────────

fn init_logging_stderr() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();
}

fn emit<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!("Failed to serialize IPC line: {}", e),
    }
}

fn respond(result: GavelResult<Option<serde_json::Value>>) {
    match result {
        Ok(data) => emit(&Response::Ok { data }),
        Err(e) => emit(&Response::Err {
            message: e.to_string(),
        }),
    }
}

/// Mirror a room's events onto stdout until the process shuts down.
fn watch_room(
    house: &AuctionHouse<SystemClock, OfflineGateway>,
    room: Room,
    token: &CancellationToken,
) {
    let mut rx = house.subscribe(room);
    let token = token.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = token.cancelled() => break,
                received = rx.recv() => match received {
                    Ok(event) => emit(&event),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("Room watcher lagged, {} event(s) missed", missed);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    });
}

async fn handle(
    house: &Arc<AuctionHouse<SystemClock, OfflineGateway>>,
    token: &CancellationToken,
    command: Command,
) -> GavelResult<Option<serde_json::Value>> {
    match command {
        Command::CreateAuction {
            product,
            seller,
            item,
            starting_bid,
            min_increment,
            duration_secs,
        } => {
            let auction = Auction::builder()
                .id(ProductId(product))
                .seller(BidderId(seller))
                .item(item)
                .starting_bid(starting_bid)
                .min_increment(min_increment)
                .duration_ms(duration_secs * 1000)
                .build()
                .map_err(gavel::AuctionError::Validation)?;
            let closes_at = auction.closes_at;
            house.list_auction(auction).await?;
            watch_room(house, Room::Auction(ProductId(product)), token);
            Ok(Some(serde_json::json!({ "closesAt": closes_at })))
        }
        Command::PlaceBid {
            product,
            bidder,
            amount,
        } => {
            let bid = house
                .place_bid(ProductId(product), BidderId(bidder), amount)
                .await?;
            Ok(Some(serde_json::to_value(bid).map_err(|e| {
                gavel::AuctionError::Serialization(e.to_string())
            })?))
        }
        Command::BidHistory { product } => {
            let history = house.bid_history(ProductId(product)).await;
            Ok(Some(serde_json::to_value(history).map_err(|e| {
                gavel::AuctionError::Serialization(e.to_string())
            })?))
        }
        Command::Watch { product } => {
            watch_room(house, Room::Auction(ProductId(product)), token);
            Ok(None)
        }
        Command::CancelAuction { product } => {
            house.cancel_auction(ProductId(product)).await?;
            Ok(None)
        }
        Command::Shutdown => {
            token.cancel();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() {
    init_logging_stderr();

    let house = Arc::new(AuctionHouse::new(
        SystemClock::new(),
        OfflineGateway::new(),
        std::env::var("GAVEL_GATEWAY_SECRET").unwrap_or_default(),
        AdmissionPolicy::default(),
    ));

    let token = CancellationToken::new();
    let sweeper = house.clone().start_sweeper(token.clone());

    emit(&ReadyEvent { event: "Ready" });
    info!("Engine ready, reading commands from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            () = token.cancelled() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match serde_json::from_str::<Command>(&line) {
                    Ok(command) => respond(handle(&house, &token, command).await),
                    Err(e) => emit(&Response::Err {
                        message: format!("unrecognized command: {e}"),
                    }),
                },
                Ok(None) => {
                    info!("stdin closed, shutting down");
                    token.cancel();
                    break;
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    token.cancel();
                    break;
                }
            },
        }
    }

    let _ = sweeper.await;
    info!("Engine stopped");
}
