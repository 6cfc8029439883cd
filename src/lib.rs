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
//! # XuperChain transaction SDK
//!
//! Selects unspent outputs, assembles UTXO transactions (transfers and contract calls), computes
//! their digest and id, and signs them with NIST P-256 keys. Network access is left to the caller
//! through the traits in [`client`].

#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate serde_derive;

pub mod blockchain;
pub mod builder;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod util;
pub mod utxo;

pub use self::{
    blockchain::{
        address_from_public_key, compute_digest, compute_txid, ContractVm, InvokeRequest,
        PreExecution, Transaction, TxId,
    },
    builder::{
        assemble, verify_signatures, AssembleRequest, SignedTransaction, TxBuilder, TxPayload,
        TxStamp,
    },
    client::{CallResult, ClientError, TransportError, XChainClient},
    config::ClientConfig,
    crypto::{Account, EcdsaSigner, KeyProvider, PrivateKey, PublicKey, Signer},
    error::TxError,
    utxo::{select, Selection, UnspentOutput},
};

#[cfg(test)]
mod tests {
    pub use crate::util::*;
}
