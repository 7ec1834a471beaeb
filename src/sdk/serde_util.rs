//! Field adapters shared by the wire types.

use serde::{Deserialize, Deserializer, Serializer};

/// Arbitrary-precision integers as decimal strings.
pub mod decimal {
    use std::fmt::Display;

    use num_bigint::BigUint;
    use serde::de::Error;

    use super::*;

    pub fn serialize<T: Display, S: Serializer>(value: &T, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigUint, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse::<BigUint>()
            .map_err(|e| D::Error::custom(format!("invalid quantity {raw:?}: {e}")))
    }
}

/// `Option<Vec<u8>>` as a hex string or null. The field must be present.
pub mod opt_hex {
    use serde::de::Error;

    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => s.serialize_some(&hex::encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|h| hex::decode(&h).map_err(|e| D::Error::custom(format!("invalid hex: {e}"))))
            .transpose()
    }
}

/// Deserializes an `Option<T>` without serde's implicit `None` for a missing
/// field, so absent keys fail instead of decoding as unset.
pub fn required<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d)
}
