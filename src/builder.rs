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
//! # Transaction assembly
//!
//! A transaction goes through a fixed sequence of stages, each builder step checks that it's
//! called at the right one:
//!
//! `Empty → InputsBound → OutputsBound → Digested → Signed → Identified → Assembled`
//!
//! The builder does no I/O. Keys and the signer are provided by the caller.

use crate::{
    blockchain::{
        address::validate_recipient,
        contract::PreExecution,
        digest::{compute_digest, compute_txid},
        transaction::{SignatureInfo, Transaction, TxId, TxInput, TxOutput},
    },
    crypto::{keys::PublicKey, KeyProvider, Signer},
    error::TxError,
    util::SHA256D_BYTES,
    utxo::Selection,
};
use chrono::Utc;
use num::{BigUint, Zero};
use rand::Rng;
use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// Transaction format version
pub const TX_VERSION: i32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildStage {
    Empty,
    InputsBound,
    OutputsBound,
    Digested,
    Signed,
    Identified,
    Assembled,
}

/// Nonce and timestamp of a transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxStamp {
    pub nonce: String,
    /// Unix time in nanoseconds
    pub timestamp: i64,
}

impl TxStamp {
    /// Current time, with the nonce made of unix seconds and 8 random digits
    pub fn now() -> TxStamp {
        let now = Utc::now();
        let random: u32 = rand::thread_rng().gen_range(0..100_000_000);
        TxStamp {
            nonce: format!("{}{:08}", now.timestamp(), random),
            // out of range only after year 2262
            timestamp: now.timestamp_nanos_opt().unwrap_or_default(),
        }
    }
}

/// Fully signed transaction with its id. Read-only, the only way to change it is to build a new
/// one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    tx: Transaction,
    id: TxId,
}

impl SignedTransaction {
    pub fn id(&self) -> TxId {
        self.id
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn into_transaction(self) -> Transaction {
        self.tx
    }
}

impl Serialize for SignedTransaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.tx.serialize(serializer)
    }
}

/// Builds a single transaction step by step
#[derive(Debug)]
pub struct TxBuilder {
    tx: Transaction,
    stage: BuildStage,
    digest: Option<[u8; SHA256D_BYTES]>,
}

impl Default for TxBuilder {
    fn default() -> Self {
        TxBuilder::new()
    }
}

/// Address which signs for an `auth_require` entry. An entry is either an address, or
/// `<account>/<address>` for a contract account.
pub fn auth_require_address(entry: &str) -> &str {
    match entry.rfind('/') {
        Some(pos) => &entry[pos + 1..],
        None => entry,
    }
}

fn sign_as(
    address: &str,
    keys: &dyn KeyProvider,
    signer: &dyn Signer,
    digest: &[u8],
) -> Result<SignatureInfo, TxError> {
    let account = keys
        .account(address)
        .ok_or_else(|| TxError::SigningFailed(format!("No key for {}", address)))?;
    let sign = signer
        .sign(&account.private_key, digest)
        .map_err(|e| match e {
            TxError::SigningFailed(_) => e,
            other => TxError::SigningFailed(other.to_string()),
        })?;
    Ok(SignatureInfo {
        public_key: account.public_key.raw_form().to_string(),
        sign,
    })
}

impl TxBuilder {
    pub fn new() -> TxBuilder {
        TxBuilder {
            tx: Transaction::default(),
            stage: BuildStage::Empty,
            digest: None,
        }
    }

    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    /// Transaction in its current state
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    fn expect_stage(&self, expected: BuildStage) -> Result<(), TxError> {
        if self.stage != expected {
            return Err(TxError::BuildSequence {
                expected,
                actual: self.stage,
            });
        }
        Ok(())
    }

    /// Spend the selected outputs
    pub fn bind_inputs(&mut self, selection: &Selection) -> Result<(), TxError> {
        self.expect_stage(BuildStage::Empty)?;
        let mut seen = HashSet::new();
        let mut inputs = Vec::with_capacity(selection.chosen.len());
        for utxo in &selection.chosen {
            if !seen.insert(utxo.outpoint()) {
                return Err(TxError::InvalidArgument(format!(
                    "Output {}:{} is spent twice",
                    utxo.ref_tx_id, utxo.ref_output_index
                )));
            }
            inputs.push(TxInput {
                ref_tx_id: utxo.ref_tx_id,
                ref_output_index: utxo.ref_output_index,
                from_address: utxo.owner.clone(),
                amount: utxo.amount.clone(),
                frozen_height: utxo.frozen_height,
            });
        }
        self.tx.inputs = inputs;
        self.stage = BuildStage::InputsBound;
        Ok(())
    }

    fn push_change(&mut self, change_address: &str, total: &BigUint, spent: &BigUint) {
        if total > spent {
            self.tx.outputs.push(TxOutput {
                amount: total - spent,
                to_address: change_address.to_string(),
                frozen_height: 0,
            });
        }
    }

    /// Outputs of a value transfer: the amount to the recipient, and the rest of the inputs back
    /// to `change_address`
    pub fn bind_transfer(
        &mut self,
        recipient: &str,
        amount: &BigUint,
        change_address: &str,
    ) -> Result<(), TxError> {
        self.expect_stage(BuildStage::InputsBound)?;
        validate_recipient(recipient)?;
        if amount.is_zero() {
            return Err(TxError::InvalidArgument("Transfer amount is zero".to_string()));
        }
        let total = self.tx.total_input();
        if &total < amount {
            return Err(TxError::InsufficientFunds {
                required: amount.clone(),
                available: total,
            });
        }

        self.tx.outputs = vec![TxOutput {
            amount: amount.clone(),
            to_address: recipient.to_string(),
            frozen_height: 0,
        }];
        self.push_change(change_address, &total, amount);
        self.stage = BuildStage::OutputsBound;
        Ok(())
    }

    /// Outputs and contract data of a contract call, exactly as returned by the pre-execution,
    /// plus the change back to `change_address`
    pub fn bind_contract(
        &mut self,
        pre_execution: &PreExecution,
        change_address: &str,
    ) -> Result<(), TxError> {
        self.expect_stage(BuildStage::InputsBound)?;
        if let Some(failed) = pre_execution.failure() {
            return Err(TxError::ContractFailed {
                status: failed.status,
                message: failed.message.clone(),
            });
        }
        if pre_execution.requests.is_empty() {
            return Err(TxError::InvalidArgument(
                "Pre-execution returned no requests".to_string(),
            ));
        }
        let total = self.tx.total_input();
        let required = pre_execution.derived_total();
        if total < required {
            return Err(TxError::InsufficientFunds {
                required,
                available: total,
            });
        }
        self.tx.inputs_ext = pre_execution.inputs_ext.clone();
        self.tx.outputs_ext = pre_execution.outputs_ext.clone();
        self.tx.contract_requests = pre_execution.requests.clone();
        self.tx.outputs = pre_execution.derived_outputs.clone();
        self.push_change(change_address, &total, &required);
        self.stage = BuildStage::OutputsBound;
        Ok(())
    }

    /// Set the descriptive fields. Can be repeated until the digest is calculated.
    pub fn describe(
        &mut self,
        initiator: &str,
        descriptor: &[u8],
        auth_require: &[String],
        version: i32,
        stamp: TxStamp,
    ) -> Result<(), TxError> {
        self.expect_stage(BuildStage::OutputsBound)?;
        if initiator.is_empty() {
            return Err(TxError::InvalidArgument("Initiator is empty".to_string()));
        }
        self.tx.initiator = initiator.to_string();
        self.tx.descriptor = descriptor.to_vec();
        self.tx.auth_require = auth_require.to_vec();
        self.tx.version = version;
        self.tx.nonce = stamp.nonce;
        self.tx.timestamp = stamp.timestamp;
        self.tx.coinbase = false;
        self.tx.autogen = false;
        Ok(())
    }

    /// Calculate the signable digest
    pub fn digest(&mut self) -> Result<[u8; SHA256D_BYTES], TxError> {
        self.expect_stage(BuildStage::OutputsBound)?;
        if self.tx.initiator.is_empty() {
            return Err(TxError::InvalidArgument(
                "Transaction is not described".to_string(),
            ));
        }
        let digest = compute_digest(&self.tx)?;
        debug!("Digest {}", hex::encode(digest));
        self.digest = Some(digest);
        self.stage = BuildStage::Digested;
        Ok(digest)
    }

    /// Sign the digest by the initiator, then by each of `auth_require` in their order
    pub fn sign(&mut self, keys: &dyn KeyProvider, signer: &dyn Signer) -> Result<(), TxError> {
        self.expect_stage(BuildStage::Digested)?;
        let digest = self.digest.ok_or(TxError::BuildSequence {
            expected: BuildStage::Digested,
            actual: self.stage,
        })?;

        let initiator = sign_as(&self.tx.initiator, keys, signer, &digest)?;
        let auth = self
            .tx
            .auth_require
            .iter()
            .map(|entry| sign_as(auth_require_address(entry), keys, signer, &digest))
            .collect::<Result<Vec<_>, _>>()?;

        self.tx.initiator_signs = vec![initiator];
        self.tx.auth_require_signs = auth;
        self.stage = BuildStage::Signed;
        Ok(())
    }

    /// Calculate the transaction id over the signed transaction
    pub fn identify(&mut self) -> Result<TxId, TxError> {
        self.expect_stage(BuildStage::Signed)?;
        let id = compute_txid(&self.tx)?;
        self.tx.id = Some(id);
        self.stage = BuildStage::Identified;
        Ok(id)
    }

    pub fn finish(mut self) -> Result<SignedTransaction, TxError> {
        self.expect_stage(BuildStage::Identified)?;
        let id = self.tx.id.ok_or(TxError::BuildSequence {
            expected: BuildStage::Identified,
            actual: self.stage,
        })?;
        self.stage = BuildStage::Assembled;
        info!("Transaction {} assembled", id);
        Ok(SignedTransaction { tx: self.tx, id })
    }
}

/// What a transaction does
#[derive(Clone, Copy, Debug)]
pub enum TxPayload<'a> {
    /// Value transfer to a recipient
    Transfer {
        recipient: &'a str,
        amount: &'a BigUint,
    },
    /// Contract call, prepared by a pre-execution
    Contract(&'a PreExecution),
}

/// All the data to assemble a transaction in one call
pub struct AssembleRequest<'a> {
    pub selection: &'a Selection,
    /// Address which pays and receives the change
    pub initiator: &'a str,
    pub payload: TxPayload<'a>,
    pub descriptor: &'a [u8],
    pub auth_require: &'a [String],
    pub version: i32,
    pub stamp: TxStamp,
    pub keys: &'a dyn KeyProvider,
    pub signer: &'a dyn Signer,
}

/// Run all the builder steps for a request
pub fn assemble(request: AssembleRequest<'_>) -> Result<SignedTransaction, TxError> {
    let mut builder = TxBuilder::new();
    builder.bind_inputs(request.selection)?;
    match request.payload {
        TxPayload::Transfer { recipient, amount } => {
            builder.bind_transfer(recipient, amount, request.initiator)?
        }
        TxPayload::Contract(pre_execution) => {
            builder.bind_contract(pre_execution, request.initiator)?
        }
    }
    builder.describe(
        request.initiator,
        request.descriptor,
        request.auth_require,
        request.version,
        request.stamp,
    )?;
    builder.digest()?;
    builder.sign(request.keys, request.signer)?;
    builder.identify()?;
    builder.finish()
}

/// Check the id and every signature of a transaction
pub fn verify_signatures(
    signed: &SignedTransaction,
    signer: &dyn Signer,
) -> Result<bool, TxError> {
    let tx = signed.transaction();
    if compute_txid(tx)? != signed.id() {
        warn!("Transaction id {} doesn't match its content", signed.id());
        return Ok(false);
    }
    if tx.initiator_signs.is_empty() || tx.auth_require_signs.len() != tx.auth_require.len() {
        return Ok(false);
    }
    let digest = compute_digest(tx)?;
    for info in tx.initiator_signs.iter().chain(tx.auth_require_signs.iter()) {
        let key = PublicKey::from_raw_form(&info.public_key)?;
        if !signer.verify(&key, &info.sign, &digest)? {
            return Ok(false);
        }
    }
    Ok(true)
}
