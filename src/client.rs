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
//! # Client operations
//!
//! Operations of an account on a chain: balance, transfer, contract accounts and contract calls.
//! The node is provided by the caller through the collaborator traits below, the client itself
//! only selects outputs, assembles and signs transactions.

use crate::{
    blockchain::{
        address::{contract_account, is_contract_account, validate_recipient},
        contract::{ContractVm, InvokeRequest, PreExecution},
        transaction::{Transaction, TxId},
    },
    builder::{assemble, AssembleRequest, SignedTransaction, TxPayload, TxStamp},
    config::ClientConfig,
    crypto::{Account, EcdsaSigner, Signer},
    error::TxError,
    utxo::{select, UnspentOutput},
};
use num::{BigUint, Zero};
use protobuf::CodedOutputStream;
use regex::Regex;
use std::{collections::BTreeMap, fmt};

lazy_static! {
    static ref ACCOUNT_NUMBER_RE: Regex = Regex::new(r"^[0-9]{16}$").unwrap();
}

/// Failure of the node or of the connection to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    ConnectFailed(String),
    /// Node responded with an error header
    NodeError { code: i32, message: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ConnectFailed(msg) => write!(f, "Connect failed: {}", msg),
            TransportError::NodeError { code, message } => {
                write!(f, "Node error [{}]: {}", code, message)
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// Error of a client operation. `Tx` is an expected outcome of the operation itself, `Transport`
/// is an infrastructure failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    Tx(TxError),
    Transport(TransportError),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Tx(e) => write!(f, "{}", e),
            ClientError::Transport(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<TxError> for ClientError {
    fn from(err: TxError) -> Self {
        ClientError::Tx(err)
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        ClientError::Transport(err)
    }
}

/// Answer of the node to a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitStatus {
    pub accepted: bool,
    pub error_code: i32,
    pub error_message: String,
}

impl SubmitStatus {
    pub fn accepted() -> SubmitStatus {
        SubmitStatus {
            accepted: true,
            ..SubmitStatus::default()
        }
    }

    pub fn rejected<S: Into<String>>(code: i32, message: S) -> SubmitStatus {
        SubmitStatus {
            accepted: false,
            error_code: code,
            error_message: message.into(),
        }
    }
}

pub trait UtxoQuery {
    /// Unspent outputs of the address, enough to cover `min_total` if the address has it
    fn query_utxo(
        &self,
        chain: &str,
        address: &str,
        min_total: &BigUint,
    ) -> Result<Vec<UnspentOutput>, TransportError>;
}

pub trait Submitter {
    fn submit(&self, chain: &str, tx: &SignedTransaction) -> Result<SubmitStatus, TransportError>;
}

pub trait PreExecutor {
    /// Dry run of the requests, returns the data to put into the transaction
    fn pre_execute(
        &self,
        chain: &str,
        requests: &[InvokeRequest],
        initiator: &str,
        auth_require: &[String],
    ) -> Result<PreExecution, TransportError>;
}

pub trait LedgerQuery {
    fn get_balance(&self, chain: &str, address: &str) -> Result<BigUint, TransportError>;
    fn query_tx(&self, chain: &str, txid: &TxId) -> Result<Option<Transaction>, TransportError>;
}

/// Result of a client operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResult {
    Balance(BigUint),
    /// Id of a submitted transaction, as lowercase hex
    Txid(String),
    Transaction(Transaction),
    /// Name of a created contract account
    Account(String),
    /// Submitted contract call, with the responses keyed by `contract:method`
    Contract {
        txid: String,
        results: BTreeMap<String, String>,
    },
}

/// Protobuf `WasmCodeDesc` with only the runtime set
fn wasm_code_desc(runtime: &str) -> Result<Vec<u8>, TxError> {
    let mut buf = Vec::new();
    {
        let mut os = CodedOutputStream::vec(&mut buf);
        os.write_string(1, runtime)?;
        os.flush()?;
    }
    Ok(buf)
}

/// Account ACL which accepts the single address
fn single_address_acl(address: &str) -> String {
    format!(
        r#"{{"pm":{{"rule":1,"acceptValue":1.0}},"aksWeight":{{"{}":1.0}}}}"#,
        address
    )
}

/// Client of an account on a chain
pub struct XChainClient<'a, N> {
    config: ClientConfig,
    account: Account,
    /// Keys of the account and of the cosigners
    keys: Vec<Account>,
    node: &'a N,
    signer: &'a dyn Signer,
}

impl<'a, N> XChainClient<'a, N>
where
    N: UtxoQuery + Submitter + PreExecutor + LedgerQuery,
{
    pub fn new(config: ClientConfig, account: Account, node: &'a N) -> XChainClient<'a, N> {
        XChainClient {
            config,
            keys: vec![account.clone()],
            account,
            node,
            signer: &EcdsaSigner,
        }
    }

    /// Use a custom signer instead of the default ECDSA one
    pub fn with_signer(mut self, signer: &'a dyn Signer) -> Self {
        self.signer = signer;
        self
    }

    /// Add a key of an `auth_require` signer
    pub fn with_cosigner(mut self, account: Account) -> Self {
        self.keys.push(account);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    fn chain(&self) -> &str {
        &self.config.chain_name
    }

    fn post(&self, signed: &SignedTransaction) -> Result<(), ClientError> {
        let status = self.node.submit(self.chain(), signed)?;
        if !status.accepted {
            warn!(
                "Transaction {} rejected [{}]: {}",
                signed.id(),
                status.error_code,
                status.error_message
            );
            return Err(TxError::SubmissionRejected {
                code: status.error_code,
                message: status.error_message,
            }
            .into());
        }
        info!("Transaction {} submitted to {}", signed.id(), self.chain());
        Ok(())
    }

    fn select_for(&self, target: &BigUint) -> Result<Vec<UnspentOutput>, ClientError> {
        if target.is_zero() {
            return Ok(Vec::new());
        }
        Ok(self
            .node
            .query_utxo(self.chain(), &self.account.address, target)?)
    }

    /// Balance of an address, or of the client account when `address` is `None`
    pub fn get_balance(&self, address: Option<&str>) -> Result<CallResult, ClientError> {
        let address = address.unwrap_or(self.account.address.as_str());
        let balance = self.node.get_balance(self.chain(), address)?;
        Ok(CallResult::Balance(balance))
    }

    /// Transfer `amount` to an address or a contract account
    pub fn transfer(
        &self,
        to: &str,
        amount: &BigUint,
        desc: &str,
    ) -> Result<CallResult, ClientError> {
        validate_recipient(to)?;
        let candidates = self.select_for(amount)?;
        let selection = select(&candidates, amount)?;
        let signed = assemble(AssembleRequest {
            selection: &selection,
            initiator: &self.account.address,
            payload: TxPayload::Transfer {
                recipient: to,
                amount,
            },
            descriptor: desc.as_bytes(),
            auth_require: &[],
            version: self.config.tx_version,
            stamp: TxStamp::now(),
            keys: &self.keys,
            signer: self.signer,
        })?;
        self.post(&signed)?;
        Ok(CallResult::Txid(signed.id().to_string()))
    }

    /// Find a transaction by its hex id
    pub fn query_tx(&self, txid: &str) -> Result<CallResult, ClientError> {
        let id = txid.parse::<TxId>()?;
        match self.node.query_tx(self.chain(), &id)? {
            Some(tx) => Ok(CallResult::Transaction(tx)),
            None => Err(TxError::NotFound(format!("Transaction {}", id)).into()),
        }
    }

    /// Create a contract account `XC<account_number>@<chain>` controlled by the client account.
    /// The number must be 16 digits.
    pub fn new_contract_account(&self, account_number: &str) -> Result<CallResult, ClientError> {
        if !ACCOUNT_NUMBER_RE.is_match(account_number) {
            return Err(TxError::InvalidArgument(format!(
                "Account name must be 16 digits: {}",
                account_number
            ))
            .into());
        }
        let request = InvokeRequest::new(ContractVm::XKernel.module_name(), "", "NewAccount")
            .with_arg("account_name", account_number)
            .with_arg("acl", single_address_acl(&self.account.address));
        self.invoke(vec![request], &[], "")?;
        Ok(CallResult::Account(contract_account(
            account_number,
            self.chain(),
        )))
    }

    /// Deploy WASM code as a contract of a contract account
    pub fn deploy_wasm_contract(
        &self,
        contract_name: &str,
        code: &[u8],
        account_name: &str,
        init_args: &BTreeMap<String, Vec<u8>>,
        runtime: &str,
        desc: &str,
    ) -> Result<CallResult, ClientError> {
        if !is_contract_account(account_name) {
            return Err(TxError::InvalidArgument(format!(
                "Not a contract account: {}",
                account_name
            ))
            .into());
        }
        let init_args: BTreeMap<&str, String> = init_args
            .iter()
            .map(|(k, v)| (k.as_str(), base64::encode(v)))
            .collect();
        let request = InvokeRequest::new(ContractVm::XKernel.module_name(), contract_name, "Deploy")
            .with_arg("account_name", account_name)
            .with_arg("contract_name", contract_name)
            .with_arg("contract_code", code)
            .with_arg("contract_desc", wasm_code_desc(runtime)?)
            .with_arg("init_args", serde_json::to_vec(&init_args).map_err(TxError::from)?);
        let auth_require = vec![format!("{}/{}", account_name, self.account.address)];
        self.invoke(vec![request], &auth_require, desc)
    }

    /// Call a contract method. Uses the VM from the config when `vm` is not set.
    pub fn invoke_contract(
        &self,
        vm: Option<ContractVm>,
        contract_name: &str,
        method_name: &str,
        args: BTreeMap<String, Vec<u8>>,
        auth_require: &[String],
        desc: &str,
    ) -> Result<CallResult, ClientError> {
        let vm = vm.unwrap_or(self.config.contract_vm);
        let mut request = InvokeRequest::new(vm.module_name(), contract_name, method_name);
        request.args = args;
        self.invoke(vec![request], auth_require, desc)
    }

    fn invoke(
        &self,
        requests: Vec<InvokeRequest>,
        auth_require: &[String],
        desc: &str,
    ) -> Result<CallResult, ClientError> {
        let pre_execution =
            self.node
                .pre_execute(self.chain(), &requests, &self.account.address, auth_require)?;
        if let Some(failed) = pre_execution.failure() {
            warn!(
                "Contract call failed [{}]: {}",
                failed.status, failed.message
            );
            return Err(TxError::ContractFailed {
                status: failed.status,
                message: failed.message.clone(),
            }
            .into());
        }
        let results: BTreeMap<String, String> = pre_execution
            .requests
            .iter()
            .zip(pre_execution.responses.iter())
            .map(|(req, resp)| {
                (
                    req.call_name(),
                    String::from_utf8_lossy(&resp.body).into_owned(),
                )
            })
            .collect();
        debug!(
            "Pre-executed {} requests, gas used {}",
            pre_execution.requests.len(),
            pre_execution.gas_used
        );

        let fee = pre_execution.derived_total();
        let candidates = self.select_for(&fee)?;
        let selection = select(&candidates, &fee)?;
        let signed = assemble(AssembleRequest {
            selection: &selection,
            initiator: &self.account.address,
            payload: TxPayload::Contract(&pre_execution),
            descriptor: desc.as_bytes(),
            auth_require,
            version: self.config.tx_version,
            stamp: TxStamp::now(),
            keys: &self.keys,
            signer: self.signer,
        })?;
        self.post(&signed)?;
        Ok(CallResult::Contract {
            txid: signed.id().to_string(),
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_wasm_code_desc() {
        assert_eq!(wasm_code_desc("c").unwrap(), vec![0x0a, 0x01, b'c']);
        assert_eq!(wasm_code_desc("go").unwrap(), vec![0x0a, 0x02, b'g', b'o']);
    }

    #[test]
    fn acl_for_address() {
        assert_eq!(
            single_address_acl("abc"),
            r#"{"pm":{"rule":1,"acceptValue":1.0},"aksWeight":{"abc":1.0}}"#
        );
    }

    #[test]
    fn account_number_format() {
        assert!(ACCOUNT_NUMBER_RE.is_match("1111111111111111"));
        assert!(!ACCOUNT_NUMBER_RE.is_match("111111111111111"));
        assert!(!ACCOUNT_NUMBER_RE.is_match("111111111111111a"));
    }

    #[test]
    fn errors_display() {
        let err: ClientError = TransportError::ConnectFailed("refused".to_string()).into();
        assert_eq!(err.to_string(), "Connect failed: refused");
        let err: ClientError = TxError::InvalidRecipient("x".to_string()).into();
        assert_eq!(err.to_string(), "Invalid recipient: 'x'");
    }
}
