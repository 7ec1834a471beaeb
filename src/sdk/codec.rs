//! Record ⇄ wire bytes.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::datum::{BountyRecord, SettingsRecord};
use super::error::BountyError;

/// Encoding of records into the bytes attached to ledger outputs.
///
/// Decoding fails closed: a missing, extra or mistyped field is a
/// [`BountyError::Decode`], never a partially populated record.
pub trait Codec: Send + Sync + 'static {
    fn encode_record(&self, record: &BountyRecord) -> Result<Vec<u8>, BountyError>;
    fn decode_record(&self, bytes: &[u8]) -> Result<BountyRecord, BountyError>;
    fn encode_settings(&self, settings: &SettingsRecord) -> Result<Vec<u8>, BountyError>;
    fn decode_settings(&self, bytes: &[u8]) -> Result<SettingsRecord, BountyError>;
}

/// JSON wire format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, BountyError> {
    serde_json::to_vec(value).map_err(|e| BountyError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, BountyError> {
    serde_json::from_slice(bytes).map_err(|e| BountyError::Decode(e.to_string()))
}

impl Codec for JsonCodec {
    fn encode_record(&self, record: &BountyRecord) -> Result<Vec<u8>, BountyError> {
        encode(record)
    }

    fn decode_record(&self, bytes: &[u8]) -> Result<BountyRecord, BountyError> {
        decode(bytes)
    }

    fn encode_settings(&self, settings: &SettingsRecord) -> Result<Vec<u8>, BountyError> {
        encode(settings)
    }

    fn decode_settings(&self, bytes: &[u8]) -> Result<SettingsRecord, BountyError> {
        decode(bytes)
    }
}
