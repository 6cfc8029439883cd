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
//! # Ledger data and rules

pub mod address;
pub mod amount;
pub mod contract;
pub mod digest;
pub mod transaction;

pub use self::address::{address_from_public_key, contract_account, validate_recipient};
pub use self::amount::{amount_to_bytes, bytes_to_amount};
pub use self::contract::{
    ContractResponse, ContractVm, InvokeRequest, PreExecution, ResourceKind, ResourceLimit,
};
pub use self::digest::{compute_digest, compute_txid, encode_tx_data};
pub use self::transaction::{
    SignatureInfo, Transaction, TxId, TxInput, TxInputExt, TxOutput, TxOutputExt, TXID_BYTES,
};
