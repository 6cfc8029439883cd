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
//! # ECDSA signatures over NIST P-256

use crate::{
    blockchain::amount::bytes_to_amount,
    crypto::{
        der,
        keys::{to_field_bytes, PrivateKey, PublicKey},
    },
    error::TxError,
};
use p256::{
    ecdsa::{
        signature::hazmat::{PrehashSigner, PrehashVerifier},
        Signature,
    },
    FieldBytes,
};

/// Produces and checks DER-encoded signatures of a 32-byte digest
pub trait Signer {
    fn sign(&self, key: &PrivateKey, digest: &[u8]) -> Result<Vec<u8>, TxError>;

    /// `Ok(false)` for a well-formed signature which doesn't match or has components out of
    /// the curve order range, an error when the signature or the key cannot be parsed
    fn verify(&self, key: &PublicKey, signature: &[u8], digest: &[u8]) -> Result<bool, TxError>;
}

/// Signs the digest as is, without hashing it again. Nonces are deterministic (RFC 6979).
#[derive(Clone, Copy, Debug, Default)]
pub struct EcdsaSigner;

impl Signer for EcdsaSigner {
    fn sign(&self, key: &PrivateKey, digest: &[u8]) -> Result<Vec<u8>, TxError> {
        let sk = key
            .signing_key()
            .map_err(|e| TxError::SigningFailed(e.to_string()))?;
        let signature: Signature = sk
            .sign_prehash(digest)
            .map_err(|e| TxError::SigningFailed(e.to_string()))?;
        let (r, s) = signature.split_bytes();
        Ok(der::encode(&bytes_to_amount(&r), &bytes_to_amount(&s)))
    }

    fn verify(&self, key: &PublicKey, signature: &[u8], digest: &[u8]) -> Result<bool, TxError> {
        let (r, s) = der::decode(signature)?;
        // zero or out of range components can't be a valid signature
        let (r, s) = match (to_field_bytes(&r), to_field_bytes(&s)) {
            (Ok(r), Ok(s)) => (FieldBytes::from(r), FieldBytes::from(s)),
            _ => return Ok(false),
        };
        let signature = match Signature::from_scalars(r, s) {
            Ok(signature) => signature,
            Err(_) => return Ok(false),
        };
        let vk = key.verifying_key()?;
        Ok(vk.verify_prehash(digest, &signature).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{crypto::keys::Curve, util::sha256d};
    use num::BigUint;

    fn test_key() -> PrivateKey {
        PrivateKey::from_scalar(
            Curve::P256,
            &BigUint::parse_bytes(
                b"29079635126530934056640915735344231956621504557963207107451663058887647996601",
                10,
            )
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn sign_and_verify() {
        let key = test_key();
        let digest = sha256d(b"transaction payload");
        let sig = EcdsaSigner.sign(&key, &digest).unwrap();
        assert_eq!(sig[0], 0x30);
        assert!(EcdsaSigner.verify(&key.public_key(), &sig, &digest).unwrap());
    }

    #[test]
    fn deterministic_nonce() {
        let key = test_key();
        let digest = sha256d(b"same");
        assert_eq!(
            EcdsaSigner.sign(&key, &digest).unwrap(),
            EcdsaSigner.sign(&key, &digest).unwrap()
        );
    }

    #[test]
    fn changed_digest_fails() {
        let key = test_key();
        let sig = EcdsaSigner.sign(&key, &sha256d(b"one")).unwrap();
        assert!(!EcdsaSigner
            .verify(&key.public_key(), &sig, &sha256d(b"two"))
            .unwrap());
    }

    #[test]
    fn other_key_fails() {
        let key = test_key();
        let other = PrivateKey::from_scalar(Curve::P256, &BigUint::from(42u32)).unwrap();
        let digest = sha256d(b"payload");
        let sig = EcdsaSigner.sign(&key, &digest).unwrap();
        assert!(!EcdsaSigner.verify(&other.public_key(), &sig, &digest).unwrap());
    }

    #[test]
    fn malformed_signature_is_error() {
        let key = test_key();
        let digest = sha256d(b"payload");
        assert!(matches!(
            EcdsaSigner.verify(&key.public_key(), &[0x31, 0x00], &digest),
            Err(TxError::MalformedSignature(_))
        ));
    }

    #[test]
    fn zero_components_do_not_verify() {
        let key = test_key();
        let digest = sha256d(b"payload");
        let sig = der::encode(&BigUint::from(0u32), &BigUint::from(0u32));
        assert!(!EcdsaSigner.verify(&key.public_key(), &sig, &digest).unwrap());
    }

    #[test]
    fn oversized_components_do_not_verify() {
        let key = test_key();
        let digest = sha256d(b"payload");
        let long = BigUint::from_bytes_be(&[0x01; 33]);
        let sig = der::encode(&long, &BigUint::from(1u32));
        assert_eq!(EcdsaSigner.verify(&key.public_key(), &sig, &digest), Ok(false));
        let sig = der::encode(&BigUint::from(1u32), &long);
        assert_eq!(EcdsaSigner.verify(&key.public_key(), &sig, &digest), Ok(false));
    }

    #[test]
    fn invalid_scalar_fails_to_sign() {
        let key = PrivateKey::with_raw_form(
            Curve::P256,
            BigUint::from(1u32),
            BigUint::from(1u32),
            BigUint::from(0u32),
            "{}".to_string(),
        );
        assert!(matches!(
            EcdsaSigner.sign(&key, &sha256d(b"payload")),
            Err(TxError::SigningFailed(_))
        ));
    }
}
