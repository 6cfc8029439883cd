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
use crate::builder::BuildStage;
use num::BigUint;
use std::fmt;

/// Domain failures of the transaction core. None of them are retried internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxError {
    /// DER signature cannot be parsed
    MalformedSignature(String),
    /// Candidate outputs don't cover the requested amount
    InsufficientFunds {
        required: BigUint,
        available: BigUint,
    },
    /// External signer failed, or there is no key for a required signer
    SigningFailed(String),
    InvalidRecipient(String),
    /// Builder step called in a wrong state
    BuildSequence {
        expected: BuildStage,
        actual: BuildStage,
    },
    /// Ledger refused the transaction, code and message are passed verbatim
    SubmissionRejected { code: i32, message: String },
    /// Contract pre-execution returned an error status (>= 400)
    ContractFailed { status: i32, message: String },
    InvalidArgument(String),
    /// Ledger has no such item, e.g. an unknown transaction
    NotFound(String),
    InvalidKey(String),
    Serialization(String),
}

impl TxError {
    /// Missing amount for `InsufficientFunds`, `None` for any other error
    pub fn shortfall(&self) -> Option<BigUint> {
        match self {
            TxError::InsufficientFunds { required, available } if required > available => {
                Some(required - available)
            }
            _ => None,
        }
    }
}

impl fmt::Display for TxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxError::MalformedSignature(msg) => write!(f, "Malformed signature: {}", msg),
            TxError::InsufficientFunds { required, available } => write!(
                f,
                "Insufficient funds: required {}, available {}",
                required, available
            ),
            TxError::SigningFailed(msg) => write!(f, "Signing failed: {}", msg),
            TxError::InvalidRecipient(addr) => write!(f, "Invalid recipient: '{}'", addr),
            TxError::BuildSequence { expected, actual } => write!(
                f,
                "Build step requires {:?} stage, but transaction is {:?}",
                expected, actual
            ),
            TxError::SubmissionRejected { code, message } => {
                write!(f, "Submission rejected [{}]: {}", code, message)
            }
            TxError::ContractFailed { status, message } => {
                write!(f, "Contract failed [{}]: {}", status, message)
            }
            TxError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            TxError::NotFound(what) => write!(f, "Not found: {}", what),
            TxError::InvalidKey(msg) => write!(f, "Invalid key: {}", msg),
            TxError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for TxError {}

impl From<serde_json::Error> for TxError {
    fn from(err: serde_json::Error) -> Self {
        TxError::Serialization(err.to_string())
    }
}

impl From<protobuf::ProtobufError> for TxError {
    fn from(err: protobuf::ProtobufError) -> Self {
        TxError::Serialization(err.to_string())
    }
}

impl From<hex::FromHexError> for TxError {
    fn from(err: hex::FromHexError) -> Self {
        TxError::InvalidArgument(format!("Not HEX: {}", err))
    }
}

impl From<p256::ecdsa::Error> for TxError {
    fn from(err: p256::ecdsa::Error) -> Self {
        TxError::InvalidKey(err.to_string())
    }
}
