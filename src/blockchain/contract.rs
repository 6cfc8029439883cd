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
//! # Contract invocation requests and pre-execution results

use super::transaction::{TxInputExt, TxOutput, TxOutputExt};
use crate::{
    error::TxError,
    util::{base64_bytes, base64_map, decimal_amount, is_default},
};
use num::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Virtual machine running a contract, it's also the module name of a request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractVm {
    Wasm,
    XKernel,
    Native,
    Evm,
}

impl ContractVm {
    pub fn module_name(&self) -> &'static str {
        match self {
            ContractVm::Wasm => "wasm",
            ContractVm::XKernel => "xkernel",
            ContractVm::Native => "native",
            ContractVm::Evm => "evm",
        }
    }
}

impl Default for ContractVm {
    fn default() -> Self {
        ContractVm::Wasm
    }
}

impl fmt::Display for ContractVm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.module_name())
    }
}

impl FromStr for ContractVm {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wasm" => Ok(ContractVm::Wasm),
            "xkernel" => Ok(ContractVm::XKernel),
            "native" => Ok(ContractVm::Native),
            "evm" => Ok(ContractVm::Evm),
            _ => Err(TxError::InvalidArgument(format!("Unknown contract VM: {}", s))),
        }
    }
}

/// Kind of a resource limited for a contract call, written as its integer code
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Cpu,
    Memory,
    Disk,
    /// Fee paid for the execution
    XFee,
}

impl ResourceKind {
    pub fn code(&self) -> i32 {
        match self {
            ResourceKind::Cpu => 0,
            ResourceKind::Memory => 1,
            ResourceKind::Disk => 2,
            ResourceKind::XFee => 3,
        }
    }

    pub fn from_code(code: i32) -> Result<ResourceKind, TxError> {
        match code {
            0 => Ok(ResourceKind::Cpu),
            1 => Ok(ResourceKind::Memory),
            2 => Ok(ResourceKind::Disk),
            3 => Ok(ResourceKind::XFee),
            _ => Err(TxError::InvalidArgument(format!("Unknown resource type: {}", code))),
        }
    }
}

impl Default for ResourceKind {
    fn default() -> Self {
        ResourceKind::Cpu
    }
}

impl Serialize for ResourceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for ResourceKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i32::deserialize(deserializer)?;
        ResourceKind::from_code(code).map_err(de::Error::custom)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimit {
    #[serde(rename = "type", default, skip_serializing_if = "is_default")]
    pub kind: ResourceKind,
    #[serde(default, skip_serializing_if = "is_default")]
    pub limit: i64,
}

/// Call of a contract method. Arguments are kept sorted by name, so any serialization of them is
/// deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub module_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub contract_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub method_name: String,
    #[serde(with = "base64_map", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, Vec<u8>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_limits: Vec<ResourceLimit>,
    /// Amount transferred to the contract along with the call
    #[serde(with = "decimal_amount", default, skip_serializing_if = "is_default")]
    pub amount: BigUint,
}

impl InvokeRequest {
    pub fn new<M, C, F>(module_name: M, contract_name: C, method_name: F) -> InvokeRequest
    where
        M: Into<String>,
        C: Into<String>,
        F: Into<String>,
    {
        InvokeRequest {
            module_name: module_name.into(),
            contract_name: contract_name.into(),
            method_name: method_name.into(),
            ..InvokeRequest::default()
        }
    }

    pub fn with_arg<K: Into<String>, V: Into<Vec<u8>>>(mut self, key: K, value: V) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// `contract:method`, the key of the call in the results
    pub fn call_name(&self) -> String {
        format!("{}:{}", self.contract_name, self.method_name)
    }
}

/// Status, message and body returned by a contract method
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractResponse {
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub message: String,
    #[serde(with = "base64_bytes", default)]
    pub body: Vec<u8>,
}

impl ContractResponse {
    /// Statuses from 400 are failures of the contract
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

/// Result of a dry run of contract calls on a node
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreExecution {
    /// Requests filled with the resource limits required to execute them
    #[serde(default)]
    pub requests: Vec<InvokeRequest>,
    #[serde(default)]
    pub responses: Vec<ContractResponse>,
    #[serde(rename = "inputs", default)]
    pub inputs_ext: Vec<TxInputExt>,
    #[serde(rename = "outputs", default)]
    pub outputs_ext: Vec<TxOutputExt>,
    /// Outputs the calls must pay, e.g. the fee
    #[serde(rename = "utxo_outputs", default)]
    pub derived_outputs: Vec<TxOutput>,
    #[serde(default)]
    pub gas_used: i64,
}

impl PreExecution {
    /// First response with an error status
    pub fn failure(&self) -> Option<&ContractResponse> {
        self.responses.iter().find(|r| r.is_error())
    }

    pub fn derived_total(&self) -> BigUint {
        self.derived_outputs.iter().map(|o| &o.amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vm_module_names() {
        assert_eq!(ContractVm::Wasm.module_name(), "wasm");
        assert_eq!(ContractVm::XKernel.module_name(), "xkernel");
        assert_eq!(ContractVm::Native.module_name(), "native");
        assert_eq!(ContractVm::Evm.module_name(), "evm");
        assert_eq!("XKernel".parse::<ContractVm>().unwrap(), ContractVm::XKernel);
        assert!("jvm".parse::<ContractVm>().is_err());
    }

    #[test]
    fn request_json_as_ledger() {
        let mut req = InvokeRequest::new("wasm", "counter", "increase")
            .with_arg("key", "xchain")
            .with_arg("empty", Vec::<u8>::new());
        req.resource_limits = vec![
            ResourceLimit {
                kind: ResourceKind::Cpu,
                limit: 1000,
            },
            ResourceLimit {
                kind: ResourceKind::XFee,
                limit: 0,
            },
        ];
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"module_name":"wasm","contract_name":"counter","method_name":"increase","args":{"empty":"","key":"eGNoYWlu"},"resource_limits":[{"limit":1000},{"type":3}]}"#
        );
    }

    #[test]
    fn amount_as_decimal_string() {
        let mut req = InvokeRequest::new("wasm", "counter", "increase");
        req.amount = BigUint::from(1_000_000u32);
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.ends_with(r#""amount":"1000000"}"#));
        let parsed: InvokeRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, req);
    }

    #[test]
    fn parse_resource_kind() {
        let limit: ResourceLimit = serde_json::from_str(r#"{"type":2,"limit":10}"#).unwrap();
        assert_eq!(limit.kind, ResourceKind::Disk);
        assert!(serde_json::from_str::<ResourceLimit>(r#"{"type":7}"#).is_err());
    }

    #[test]
    fn find_failed_response() {
        let pre = PreExecution {
            responses: vec![
                ContractResponse {
                    status: 200,
                    ..ContractResponse::default()
                },
                ContractResponse {
                    status: 500,
                    message: "no such method".to_string(),
                    ..ContractResponse::default()
                },
            ],
            ..PreExecution::default()
        };
        assert_eq!(pre.failure().map(|r| r.status), Some(500));
    }

    #[test]
    fn call_name() {
        assert_eq!(
            InvokeRequest::new("wasm", "counter", "get").call_name(),
            "counter:get"
        );
    }
}
