/*
Copyright 2022 EmeraldPay, Inc

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/
//! # Util functions module

mod json;

pub use self::json::{GoJsonFormatter, JsonLines};
use sha2::{Digest, Sha256};

/// Double SHA-256 length in bytes
pub const SHA256D_BYTES: usize = 32;

/// `SHA256(SHA256(data))`
pub fn sha256d(data: &[u8]) -> [u8; SHA256D_BYTES] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// Convert a slice into array
pub fn to_arr<A, T>(slice: &[T]) -> A
where
    A: AsMut<[T]> + Default,
    T: Clone,
{
    let mut arr = Default::default();
    <A as AsMut<[T]>>::as_mut(&mut arr).clone_from_slice(slice);
    arr
}

/// Serde helper for byte fields kept as standard base64 strings in JSON
pub mod base64_bytes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        match value {
            None => Ok(Vec::new()),
            Some(s) => base64::decode(s).map_err(de::Error::custom),
        }
    }
}

/// Serde helper for text kept by the ledger as bytes, so it's base64 of UTF-8 in JSON
pub mod base64_string {
    use serde::{de, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
        super::base64_bytes::serialize(value.as_bytes(), serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let bytes = super::base64_bytes::deserialize(deserializer)?;
        String::from_utf8(bytes).map_err(de::Error::custom)
    }
}

/// Serde helper for amounts kept as base64 of their big-endian bytes
pub mod base64_amount {
    use crate::blockchain::amount::{amount_to_bytes, bytes_to_amount};
    use num::BigUint;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        super::base64_bytes::serialize(&amount_to_bytes(value), serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        super::base64_bytes::deserialize(deserializer).map(|b| bytes_to_amount(&b))
    }
}

/// Serde helper for a map of byte values, each kept as base64
pub mod base64_map {
    use serde::{de, ser::SerializeMap, Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        value: &BTreeMap<String, Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(value.len()))?;
        for (k, v) in value {
            map.serialize_entry(k, &base64::encode(v))?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Vec<u8>>, D::Error> {
        let raw = BTreeMap::<String, Option<String>>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(k, v)| match v {
                None => Ok((k, Vec::new())),
                Some(s) => base64::decode(s).map(|b| (k, b)).map_err(de::Error::custom),
            })
            .collect()
    }
}

/// Serde helper for amounts kept as a decimal string, where an empty string is zero
pub mod decimal_amount {
    use num::{BigUint, Num, Zero};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_zero() {
            serializer.serialize_str("")
        } else {
            serializer.serialize_str(&value.to_str_radix(10))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if value.is_empty() {
            return Ok(BigUint::zero());
        }
        BigUint::from_str_radix(&value, 10).map_err(de::Error::custom)
    }
}

/// Go `omitempty` check
pub(crate) fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

#[cfg(test)]
pub use self::tests::*;

#[cfg(test)]
mod tests {
    use super::*;

    pub fn to_32bytes(hex: &str) -> [u8; 32] {
        to_arr(&hex::decode(hex).unwrap())
    }

    #[test]
    fn should_convert_key_into_32bytes() {
        assert_eq!(
            to_32bytes("fa384e6fe915747cd13faa1022044b0def5e6bec4238bec53166487a5cca569f")[..4],
            [0xfa, 0x38, 0x4e, 0x6f]
        );
    }

    #[test]
    fn sha256d_of_empty() {
        // sha256(sha256(""))
        assert_eq!(
            hex::encode(sha256d(b"")),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }
}
