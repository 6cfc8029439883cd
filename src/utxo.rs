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
//! # Selection of unspent outputs to cover an amount

use crate::{
    blockchain::transaction::TxId,
    error::TxError,
    util::{base64_amount, base64_string},
};
use num::{BigUint, Zero};
use std::collections::HashSet;

/// Output of a previous transaction available for spending
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    #[serde(rename = "ref_txid")]
    pub ref_tx_id: TxId,
    #[serde(rename = "ref_offset", default)]
    pub ref_output_index: u32,
    #[serde(rename = "to_addr", with = "base64_string", default)]
    pub owner: String,
    #[serde(with = "base64_amount", default)]
    pub amount: BigUint,
    #[serde(default)]
    pub frozen_height: i64,
}

impl UnspentOutput {
    /// Reference to the output, `(txid, index)`
    pub fn outpoint(&self) -> (TxId, u32) {
        (self.ref_tx_id, self.ref_output_index)
    }
}

/// Outputs chosen to cover a target, in the order they were received
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub chosen: Vec<UnspentOutput>,
    /// Sum of the chosen amounts
    pub total: BigUint,
}

/// Picks candidates in the received order until their sum reaches the target.
///
/// A candidate referencing an already chosen output is skipped. Fails with
/// `TxError::InsufficientFunds` when all candidates together don't reach the target.
pub fn select(candidates: &[UnspentOutput], target: &BigUint) -> Result<Selection, TxError> {
    let mut selection = Selection::default();
    if target.is_zero() {
        return Ok(selection);
    }

    let mut seen = HashSet::new();
    for utxo in candidates {
        if !seen.insert(utxo.outpoint()) {
            warn!(
                "Duplicate unspent output {}:{} skipped",
                utxo.ref_tx_id, utxo.ref_output_index
            );
            continue;
        }
        selection.total += &utxo.amount;
        selection.chosen.push(utxo.clone());
        if &selection.total >= target {
            debug!(
                "Selected {} of {} outputs, total {}",
                selection.chosen.len(),
                candidates.len(),
                selection.total
            );
            return Ok(selection);
        }
    }

    Err(TxError::InsufficientFunds {
        required: target.clone(),
        available: selection.total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{quickcheck, TestResult};

    fn utxo(id: u8, index: u32, amount: u64) -> UnspentOutput {
        UnspentOutput {
            ref_tx_id: TxId([id; 32]),
            ref_output_index: index,
            owner: "alice".to_string(),
            amount: BigUint::from(amount),
            frozen_height: 0,
        }
    }

    fn amounts(selection: &Selection) -> Vec<BigUint> {
        selection.chosen.iter().map(|u| u.amount.clone()).collect()
    }

    #[test]
    fn stops_when_target_reached() {
        let candidates = vec![utxo(1, 0, 100), utxo(2, 0, 50), utxo(3, 0, 30)];
        let selection = select(&candidates, &BigUint::from(120u32)).unwrap();
        assert_eq!(amounts(&selection), vec![BigUint::from(100u32), BigUint::from(50u32)]);
        assert_eq!(selection.total, BigUint::from(150u32));
    }

    #[test]
    fn exact_match() {
        let candidates = vec![utxo(1, 0, 100), utxo(2, 0, 50)];
        let selection = select(&candidates, &BigUint::from(100u32)).unwrap();
        assert_eq!(selection.chosen.len(), 1);
        assert_eq!(selection.total, BigUint::from(100u32));
    }

    #[test]
    fn reports_shortfall() {
        let candidates = vec![utxo(1, 0, 50)];
        let err = select(&candidates, &BigUint::from(120u32)).unwrap_err();
        assert_eq!(
            err,
            TxError::InsufficientFunds {
                required: BigUint::from(120u32),
                available: BigUint::from(50u32),
            }
        );
        assert_eq!(err.shortfall(), Some(BigUint::from(70u32)));
    }

    #[test]
    fn empty_candidates() {
        let err = select(&[], &BigUint::from(1u32)).unwrap_err();
        assert_eq!(err.shortfall(), Some(BigUint::from(1u32)));
    }

    #[test]
    fn zero_target_selects_nothing() {
        let candidates = vec![utxo(1, 0, 100)];
        let selection = select(&candidates, &BigUint::zero()).unwrap();
        assert!(selection.chosen.is_empty());
        assert!(selection.total.is_zero());
    }

    #[test]
    fn skips_duplicates() {
        let candidates = vec![utxo(1, 0, 50), utxo(1, 0, 50), utxo(1, 1, 50)];
        let selection = select(&candidates, &BigUint::from(100u32)).unwrap();
        assert_eq!(selection.chosen, vec![utxo(1, 0, 50), utxo(1, 1, 50)]);

        let err = select(&candidates[..2], &BigUint::from(100u32)).unwrap_err();
        assert_eq!(err.shortfall(), Some(BigUint::from(50u32)));
    }

    #[test]
    fn parse_ledger_json() {
        let json = r#"{"ref_txid":"+jhOb+kVdHzRP6oQIgRLDe9ea+xCOL7FMWZIelzKVp8=","ref_offset":2,"to_addr":"YWxpY2U=","amount":"A3g="}"#;
        let parsed: UnspentOutput = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.ref_output_index, 2);
        assert_eq!(parsed.owner, "alice");
        assert_eq!(parsed.amount, BigUint::from(888u32));
    }

    #[test]
    fn covers_target_or_fails() {
        fn prop(values: Vec<u32>, target: u64) -> bool {
            let candidates: Vec<UnspentOutput> = values
                .iter()
                .enumerate()
                .map(|(i, v)| utxo(0, i as u32, *v as u64))
                .collect();
            let target = BigUint::from(target);
            let all: BigUint = candidates.iter().map(|u| &u.amount).sum();
            match select(&candidates, &target) {
                Ok(selection) => {
                    let sum: BigUint = selection.chosen.iter().map(|u| &u.amount).sum();
                    sum == selection.total && (target.is_zero() || selection.total >= target)
                }
                Err(err) => all < target && err.shortfall() == Some(&target - &all),
            }
        }
        quickcheck(prop as fn(Vec<u32>, u64) -> bool);
    }

    #[test]
    fn minimal_prefix() {
        fn prop(values: Vec<u32>, target: u64) -> TestResult {
            let candidates: Vec<UnspentOutput> = values
                .iter()
                .enumerate()
                .map(|(i, v)| utxo(0, i as u32, *v as u64))
                .collect();
            let target = BigUint::from(target);
            let selection = match select(&candidates, &target) {
                Ok(s) => s,
                Err(_) => return TestResult::discard(),
            };
            if selection.chosen.is_empty() {
                return TestResult::from_bool(target.is_zero());
            }
            // the selection is a prefix of candidates, and without its last element it's short
            let n = selection.chosen.len();
            let prefix_ok = selection.chosen[..] == candidates[..n];
            let without_last: BigUint = selection.chosen[..n - 1].iter().map(|u| &u.amount).sum();
            TestResult::from_bool(prefix_ok && without_last < target)
        }
        quickcheck(prop as fn(Vec<u32>, u64) -> TestResult);
    }

    #[test]
    fn selection_is_pure() {
        let candidates = vec![utxo(1, 0, 10), utxo(2, 0, 20), utxo(3, 0, 30)];
        let copy = candidates.clone();
        let a = select(&candidates, &BigUint::from(25u32)).unwrap();
        let b = select(&candidates, &BigUint::from(25u32)).unwrap();
        assert_eq!(a, b);
        assert_eq!(candidates, copy);
    }
}
