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
//! # Transaction digest
//!
//! The ledger hashes a transaction as a sequence of JSON values, one per line, in a fixed order
//! of fields. There are two forms of it:
//!
//!  * _signable_, without signatures, which is the message signed by the initiator and by each
//!    of `auth_require` signers
//!  * _identifying_, with the signatures, which is the transaction id
//!
//! Both are double SHA-256 of the payload. The `id` field itself never goes into the payload.

use super::{
    amount::amount_to_bytes,
    transaction::{Transaction, TxId},
};
use crate::{
    error::TxError,
    util::{sha256d, JsonLines, SHA256D_BYTES},
};
use serde::{Serialize, Serializer};

/// Top-level byte string, `null` when empty
struct Base64<'a>(&'a [u8]);

impl<'a> Serialize for Base64<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_empty() {
            serializer.serialize_none()
        } else {
            serializer.serialize_str(&base64::encode(self.0))
        }
    }
}

/// Top-level list, `null` when empty
struct List<'a, T>(&'a [T]);

impl<'a, T: Serialize> Serialize for List<'a, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_empty() {
            serializer.serialize_none()
        } else {
            self.0.serialize(serializer)
        }
    }
}

/// Payload of a digest. `include_signs` switches between the signable and the identifying form.
pub fn encode_tx_data(tx: &Transaction, include_signs: bool) -> Result<Vec<u8>, TxError> {
    let mut out = JsonLines::new();

    for input in &tx.inputs {
        out.push(&Base64(input.ref_tx_id.as_bytes()))?;
        out.push(&input.ref_output_index)?;
        out.push(&Base64(input.from_address.as_bytes()))?;
        out.push(&Base64(&amount_to_bytes(&input.amount)))?;
        out.push(&input.frozen_height)?;
    }
    out.push(&List(&tx.outputs))?;
    if !tx.descriptor.is_empty() {
        out.push(&Base64(&tx.descriptor))?;
    }
    out.push(&tx.nonce)?;
    out.push(&tx.timestamp)?;
    out.push(&tx.version)?;

    for input in &tx.inputs_ext {
        out.push(&input.bucket)?;
        out.push(&Base64(&input.key))?;
        out.push(&Base64(&input.ref_tx_id))?;
        out.push(&input.ref_output_index)?;
    }
    for output in &tx.outputs_ext {
        out.push(&output.bucket)?;
        out.push(&Base64(&output.key))?;
        out.push(&Base64(&output.value))?;
    }
    out.push(&List(&tx.contract_requests))?;

    out.push(&tx.initiator)?;
    out.push(&List(&tx.auth_require))?;
    if include_signs {
        out.push(&List(&tx.initiator_signs))?;
        out.push(&List(&tx.auth_require_signs))?;
    }

    out.push(&tx.coinbase)?;
    out.push(&tx.autogen)?;

    Ok(out.into_bytes())
}

/// Signable digest, the message for the initiator and the `auth_require` signatures
pub fn compute_digest(tx: &Transaction) -> Result<[u8; SHA256D_BYTES], TxError> {
    let payload = encode_tx_data(tx, false)?;
    Ok(sha256d(&payload))
}

/// Identifying digest, i.e. the transaction id. Covers the signatures.
pub fn compute_txid(tx: &Transaction) -> Result<TxId, TxError> {
    let payload = encode_tx_data(tx, true)?;
    Ok(TxId(sha256d(&payload)))
}
