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
//! # Client configuration parameters

use crate::{blockchain::contract::ContractVm, builder::TX_VERSION, error::TxError};

pub const DEFAULT_CHAIN_NAME: &str = "xuper";

/// Configuration parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Name of the chain, e.g. `xuper`
    pub chain_name: String,
    /// Version of created transactions
    pub tx_version: i32,
    /// VM of contracts called without an explicit one
    pub contract_vm: ContractVm,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            chain_name: DEFAULT_CHAIN_NAME.to_string(),
            tx_version: TX_VERSION,
            contract_vm: ContractVm::Wasm,
        }
    }
}

impl ClientConfig {
    pub fn new<S: Into<String>>(chain_name: S) -> ClientConfig {
        ClientConfig {
            chain_name: chain_name.into(),
            ..ClientConfig::default()
        }
    }

    /// Read from a JSON object, missing fields are set to defaults
    pub fn from_json(json: &str) -> Result<ClientConfig, TxError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(TxError::InvalidArgument(
                "Config must be a JSON object".to_string(),
            ));
        }
        let config: ClientConfig = serde_json::from_value(value)?;
        if config.chain_name.is_empty() {
            return Err(TxError::InvalidArgument("Chain name is empty".to_string()));
        }
        Ok(config)
    }
}
