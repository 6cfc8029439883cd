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
//! # Ledger transaction
//!
//! JSON form of the structures follows the ledger, i.e. the same field names, byte fields as
//! base64 and empty values omitted.

use super::contract::InvokeRequest;
use crate::{
    error::TxError,
    util::{base64_amount, base64_bytes, base64_string, is_default, to_arr},
};
use num::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Transaction id length in bytes
pub const TXID_BYTES: usize = 32;

/// Transaction id, the identifying digest of a signed transaction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxId(pub [u8; TXID_BYTES]);

impl TxId {
    pub fn try_from(data: &[u8]) -> Result<Self, TxError> {
        if data.len() != TXID_BYTES {
            return Err(TxError::InvalidArgument(format!(
                "Transaction id must be {} bytes, got {}",
                TXID_BYTES,
                data.len()
            )));
        }
        Ok(TxId(to_arr(data)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; TXID_BYTES]> for TxId {
    fn from(value: [u8; TXID_BYTES]) -> Self {
        TxId(value)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for TxId {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TxId::try_from(&hex::decode(s)?)
    }
}

impl Serialize for TxId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        base64_bytes::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for TxId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = base64_bytes::deserialize(deserializer)?;
        TxId::try_from(&bytes).map_err(de::Error::custom)
    }
}

/// Spending of a previous output
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    #[serde(rename = "ref_txid")]
    pub ref_tx_id: TxId,
    #[serde(rename = "ref_offset", default, skip_serializing_if = "is_default")]
    pub ref_output_index: u32,
    #[serde(
        rename = "from_addr",
        with = "base64_string",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub from_address: String,
    #[serde(with = "base64_amount", default, skip_serializing_if = "is_default")]
    pub amount: BigUint,
    #[serde(default, skip_serializing_if = "is_default")]
    pub frozen_height: i64,
}

/// Amount assigned to an address
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    #[serde(with = "base64_amount", default, skip_serializing_if = "is_default")]
    pub amount: BigUint,
    #[serde(
        rename = "to_addr",
        with = "base64_string",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub to_address: String,
    #[serde(default, skip_serializing_if = "is_default")]
    pub frozen_height: i64,
}

/// Contract state read by the transaction
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInputExt {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bucket: String,
    #[serde(with = "base64_bytes", default, skip_serializing_if = "Vec::is_empty")]
    pub key: Vec<u8>,
    #[serde(
        rename = "ref_txid",
        with = "base64_bytes",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub ref_tx_id: Vec<u8>,
    #[serde(rename = "ref_offset", default, skip_serializing_if = "is_default")]
    pub ref_output_index: u32,
}

/// Contract state written by the transaction
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutputExt {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bucket: String,
    #[serde(with = "base64_bytes", default, skip_serializing_if = "Vec::is_empty")]
    pub key: Vec<u8>,
    #[serde(with = "base64_bytes", default, skip_serializing_if = "Vec::is_empty")]
    pub value: Vec<u8>,
}

/// Signature with the raw form of the signer public key
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    #[serde(rename = "PublicKey", default, skip_serializing_if = "String::is_empty")]
    pub public_key: String,
    #[serde(
        rename = "Sign",
        with = "base64_bytes",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sign: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "txid", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TxId>,
    #[serde(rename = "tx_inputs", default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<TxInput>,
    #[serde(rename = "tx_outputs", default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<TxOutput>,
    #[serde(
        rename = "desc",
        with = "base64_bytes",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub descriptor: Vec<u8>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub coinbase: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nonce: String,
    #[serde(default, skip_serializing_if = "is_default")]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "is_default")]
    pub version: i32,
    #[serde(default, skip_serializing_if = "is_default")]
    pub autogen: bool,
    #[serde(rename = "tx_inputs_ext", default, skip_serializing_if = "Vec::is_empty")]
    pub inputs_ext: Vec<TxInputExt>,
    #[serde(rename = "tx_outputs_ext", default, skip_serializing_if = "Vec::is_empty")]
    pub outputs_ext: Vec<TxOutputExt>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contract_requests: Vec<InvokeRequest>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub initiator: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auth_require: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub initiator_signs: Vec<SignatureInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auth_require_signs: Vec<SignatureInfo>,
}

impl Transaction {
    /// Sum of all output amounts
    pub fn total_output(&self) -> BigUint {
        self.outputs.iter().map(|o| &o.amount).sum()
    }

    /// Sum of all input amounts
    pub fn total_input(&self) -> BigUint {
        self.inputs.iter().map(|i| &i.amount).sum()
    }
}
