//! Utility functions shared across the auction engine crate.

use crate::error::{AuctionError, GavelResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serialize a record to CBOR bytes.
pub fn to_cbor<T: Serialize>(value: &T) -> GavelResult<Vec<u8>> {
    let mut data = Vec::new();
    ciborium::into_writer(value, &mut data)
        .map_err(|e| AuctionError::Serialization(format!("CBOR serialization failed: {e}")))?;
    Ok(data)
}

/// Deserialize CBOR data with a size limit to prevent oversized payloads.
pub fn cbor_from_limited_reader<T: DeserializeOwned>(
    data: &[u8],
    max_bytes: usize,
) -> GavelResult<T> {
    if data.len() > max_bytes {
        return Err(AuctionError::Validation(format!(
            "CBOR payload too large: {} bytes (max {})",
            data.len(),
            max_bytes
        )));
    }
    ciborium::from_reader(data)
        .map_err(|e| AuctionError::Serialization(format!("CBOR deserialization failed: {e}")))
}
