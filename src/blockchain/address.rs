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
//! # Account and contract account addresses

use crate::{crypto::keys::PublicKey, error::TxError};
use bitcoin::util::base58;
use bitcoin_hashes::{ripemd160, sha256, Hash};
use regex::Regex;

/// Version byte of an address derived from a NIST P-256 key
pub const ADDRESS_VERSION_NIST: u8 = 1;

/// Address payload: version byte + RIPEMD-160
pub const ADDRESS_PAYLOAD_BYTES: usize = 21;

lazy_static! {
    static ref CONTRACT_ACCOUNT_RE: Regex = Regex::new(r"^XC[0-9]{16}@[0-9A-Za-z_]+$").unwrap();
}

/// Address of a public key, `base58check(version || RIPEMD160(SHA256(04 || X || Y)))`.
/// Fails with `InvalidKey` when a coordinate doesn't fit into the field.
pub fn address_from_public_key(key: &PublicKey) -> Result<String, TxError> {
    let point = key.to_uncompressed()?;
    let sha = sha256::Hash::hash(&point);
    let ripemd = ripemd160::Hash::hash(&sha.into_inner());

    let mut payload = Vec::with_capacity(ADDRESS_PAYLOAD_BYTES);
    payload.push(ADDRESS_VERSION_NIST);
    payload.extend_from_slice(&ripemd.into_inner());
    Ok(base58::check_encode_slice(&payload))
}

/// Checks base58 encoding, the 4-byte checksum and the payload length
pub fn is_account_address(value: &str) -> bool {
    match base58::from_check(value) {
        Ok(payload) => payload.len() == ADDRESS_PAYLOAD_BYTES,
        Err(_) => false,
    }
}

/// Contract account name in form of `XC<16 digits>@<chain>`
pub fn is_contract_account(value: &str) -> bool {
    CONTRACT_ACCOUNT_RE.is_match(value)
}

/// Contract account name for a 16-digit account number on a chain
pub fn contract_account(account_name: &str, chain_name: &str) -> String {
    format!("XC{}@{}", account_name, chain_name)
}

/// A recipient must be either an account address or a contract account
pub fn validate_recipient(value: &str) -> Result<(), TxError> {
    if value.is_empty() || !(is_account_address(value) || is_contract_account(value)) {
        return Err(TxError::InvalidRecipient(value.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::{Curve, PrivateKey};
    use crate::util::sha256d;
    use num::BigUint;

    /// First 4 bytes of double SHA-256 over the payload
    fn check_code(payload: &[u8]) -> [u8; 4] {
        let hash = sha256d(payload);
        [hash[0], hash[1], hash[2], hash[3]]
    }

    fn test_key() -> PrivateKey {
        PrivateKey::from_scalar(Curve::P256, &BigUint::from(0x1234_5678u64)).unwrap()
    }

    #[test]
    fn derived_address_is_valid() {
        let address = address_from_public_key(&test_key().public_key()).unwrap();
        assert!(is_account_address(&address));
        assert!(validate_recipient(&address).is_ok());
    }

    #[test]
    fn address_is_stable() {
        let key = test_key().public_key();
        assert_eq!(
            address_from_public_key(&key).unwrap(),
            address_from_public_key(&key).unwrap()
        );
    }

    #[test]
    fn address_payload_has_version_and_check_code() {
        let address = address_from_public_key(&test_key().public_key()).unwrap();
        let raw = base58::from(&address).unwrap();
        assert_eq!(raw.len(), ADDRESS_PAYLOAD_BYTES + 4);
        assert_eq!(raw[0], ADDRESS_VERSION_NIST);
        assert_eq!(raw[21..], check_code(&raw[..21]));
    }

    #[test]
    fn different_keys_different_addresses() {
        let other = PrivateKey::from_scalar(Curve::P256, &BigUint::from(7u32)).unwrap();
        assert_ne!(
            address_from_public_key(&test_key().public_key()).unwrap(),
            address_from_public_key(&other.public_key()).unwrap()
        );
    }

    #[test]
    fn reject_oversized_coordinate() {
        let key = PublicKey::new(
            Curve::P256,
            BigUint::from_bytes_be(&[0x01; 33]),
            BigUint::from(1u32),
        );
        assert!(matches!(
            address_from_public_key(&key),
            Err(TxError::InvalidKey(_))
        ));
    }

    #[test]
    fn reject_corrupted_checksum() {
        let address = address_from_public_key(&test_key().public_key()).unwrap();
        let mut raw = base58::from(&address).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let corrupted = base58::encode_slice(&raw);
        assert!(!is_account_address(&corrupted));
        assert_eq!(
            validate_recipient(&corrupted),
            Err(TxError::InvalidRecipient(corrupted.clone()))
        );
    }

    #[test]
    fn contract_accounts() {
        assert!(is_contract_account("XC1111111111111111@xuper"));
        assert!(validate_recipient("XC1111111111111111@xuper").is_ok());
        assert_eq!(contract_account("1111111111111111", "xuper"), "XC1111111111111111@xuper");

        assert!(!is_contract_account("XC111@xuper"));
        assert!(!is_contract_account("XC1111111111111111"));
        assert!(!is_contract_account("1111111111111111@xuper"));
    }

    #[test]
    fn reject_empty_and_garbage() {
        assert!(validate_recipient("").is_err());
        assert!(validate_recipient("alice").is_err());
        assert!(validate_recipient("0OIl").is_err());
    }
}
