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
//! # Account keys
//!
//! Keys are expected to be already loaded and parsed by the caller. The crate only needs the
//! curve, the coordinates and the raw form, i.e. the key JSON exactly as the ledger sees it.

use crate::{
    blockchain::{address::address_from_public_key, amount::amount_to_bytes},
    error::TxError,
};
use num::BigUint;
use p256::ecdsa::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use regex::Regex;
use std::{fmt, str::FromStr};

lazy_static! {
    static ref RAW_CURVE_RE: Regex = Regex::new(r#""Curvname"\s*:\s*"([^"]*)""#).unwrap();
    static ref RAW_X_RE: Regex = Regex::new(r#""X"\s*:\s*([0-9]+)"#).unwrap();
    static ref RAW_Y_RE: Regex = Regex::new(r#""Y"\s*:\s*([0-9]+)"#).unwrap();
    static ref RAW_D_RE: Regex = Regex::new(r#""D"\s*:\s*([0-9]+)"#).unwrap();
}

fn parse_coordinate(value: &str) -> Result<BigUint, TxError> {
    BigUint::parse_bytes(value.as_bytes(), 10)
        .ok_or_else(|| TxError::InvalidKey(format!("Invalid number: {}", value)))
}

fn raw_field<'a>(re: &Regex, raw: &'a str, name: &str) -> Result<&'a str, TxError> {
    re.captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| TxError::InvalidKey(format!("No {} in the key", name)))
}

/// Size of a coordinate or a scalar in bytes
pub const FIELD_BYTES: usize = 32;

/// Supported elliptic curves
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Curve {
    /// NIST P-256
    P256,
}

impl Curve {
    pub fn name(&self) -> &'static str {
        match self {
            Curve::P256 => "P-256",
        }
    }
}

impl FromStr for Curve {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P-256" => Ok(Curve::P256),
            _ => Err(TxError::InvalidKey(format!("Unsupported curve: {}", s))),
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Left-pad a number to a fixed-size field
pub(crate) fn to_field_bytes(value: &BigUint) -> Result<[u8; FIELD_BYTES], TxError> {
    let bytes = amount_to_bytes(value);
    if bytes.len() > FIELD_BYTES {
        return Err(TxError::InvalidKey(format!(
            "Value is {} bytes, expected up to {}",
            bytes.len(),
            FIELD_BYTES
        )));
    }
    let mut result = [0u8; FIELD_BYTES];
    result[FIELD_BYTES - bytes.len()..].copy_from_slice(&bytes);
    Ok(result)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    curve: Curve,
    x: BigUint,
    y: BigUint,
    raw: String,
}

impl PublicKey {
    /// Key with the raw form rendered as `{"Curvname":..,"X":..,"Y":..}`
    pub fn new(curve: Curve, x: BigUint, y: BigUint) -> PublicKey {
        let raw = format!(r#"{{"Curvname":"{}","X":{},"Y":{}}}"#, curve.name(), x, y);
        PublicKey { curve, x, y, raw }
    }

    /// Key with the raw form kept exactly as provided, since it goes into the signed transaction
    pub fn with_raw_form(curve: Curve, x: BigUint, y: BigUint, raw: String) -> PublicKey {
        PublicKey { curve, x, y, raw }
    }

    /// Parse the ledger key JSON. Coordinates are plain JSON numbers of any size, so they are
    /// read as text and not through a JSON parser.
    pub fn from_raw_form(raw: &str) -> Result<PublicKey, TxError> {
        let curve = raw_field(&RAW_CURVE_RE, raw, "Curvname")?.parse::<Curve>()?;
        let x = parse_coordinate(raw_field(&RAW_X_RE, raw, "X")?)?;
        let y = parse_coordinate(raw_field(&RAW_Y_RE, raw, "Y")?)?;
        Ok(PublicKey::with_raw_form(curve, x, y, raw.to_string()))
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    pub fn x(&self) -> &BigUint {
        &self.x
    }

    pub fn y(&self) -> &BigUint {
        &self.y
    }

    pub fn raw_form(&self) -> &str {
        &self.raw
    }

    /// SEC1 uncompressed point: `04 || X || Y`
    pub fn to_uncompressed(&self) -> Result<Vec<u8>, TxError> {
        let mut point = Vec::with_capacity(1 + FIELD_BYTES * 2);
        point.push(0x04);
        point.extend_from_slice(&to_field_bytes(&self.x)?);
        point.extend_from_slice(&to_field_bytes(&self.y)?);
        Ok(point)
    }

    pub(crate) fn verifying_key(&self) -> Result<VerifyingKey, TxError> {
        VerifyingKey::from_sec1_bytes(&self.to_uncompressed()?)
            .map_err(|_| TxError::InvalidKey("Point is not on the curve".to_string()))
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    curve: Curve,
    x: BigUint,
    y: BigUint,
    d: BigUint,
    raw: String,
}

impl PrivateKey {
    /// Create a key from the secret scalar, the public point is derived from it
    pub fn from_scalar(curve: Curve, d: &BigUint) -> Result<PrivateKey, TxError> {
        let key = SigningKey::from_slice(&to_field_bytes(d)?)?;
        let point = key.verifying_key().to_encoded_point(false);
        let (x, y) = match (point.x(), point.y()) {
            (Some(x), Some(y)) => (BigUint::from_bytes_be(x), BigUint::from_bytes_be(y)),
            _ => return Err(TxError::InvalidKey("Identity point".to_string())),
        };
        let raw = format!(
            r#"{{"Curvname":"{}","X":{},"Y":{},"D":{}}}"#,
            curve.name(),
            x,
            y,
            d
        );
        Ok(PrivateKey {
            curve,
            x,
            y,
            d: d.clone(),
            raw,
        })
    }

    /// Key as provided by an external key store, not verified until used for signing
    pub fn with_raw_form(
        curve: Curve,
        x: BigUint,
        y: BigUint,
        d: BigUint,
        raw: String,
    ) -> PrivateKey {
        PrivateKey {
            curve,
            x,
            y,
            d,
            raw,
        }
    }

    /// Parse the ledger private key JSON, `{"Curvname":..,"X":..,"Y":..,"D":..}`
    pub fn from_raw_form(raw: &str) -> Result<PrivateKey, TxError> {
        let curve = raw_field(&RAW_CURVE_RE, raw, "Curvname")?.parse::<Curve>()?;
        let x = parse_coordinate(raw_field(&RAW_X_RE, raw, "X")?)?;
        let y = parse_coordinate(raw_field(&RAW_Y_RE, raw, "Y")?)?;
        let d = parse_coordinate(raw_field(&RAW_D_RE, raw, "D")?)?;
        Ok(PrivateKey::with_raw_form(curve, x, y, d, raw.to_string()))
    }

    /// Generate a new random key (`rand::OsRng`)
    pub fn generate(curve: Curve) -> Result<PrivateKey, TxError> {
        let key = SigningKey::random(&mut OsRng);
        PrivateKey::from_scalar(curve, &BigUint::from_bytes_be(&key.to_bytes()))
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    pub fn raw_form(&self) -> &str {
        &self.raw
    }

    /// Public part of the key, with the raw form rendered from the coordinates
    pub fn public_key(&self) -> PublicKey {
        PublicKey::new(self.curve, self.x.clone(), self.y.clone())
    }

    pub(crate) fn signing_key(&self) -> Result<SigningKey, TxError> {
        Ok(SigningKey::from_slice(&to_field_bytes(&self.d)?)?)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("curve", &self.curve)
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

/// Account of a signer, an address with its key pair
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub address: String,
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}

impl Account {
    pub fn new(address: String, public_key: PublicKey, private_key: PrivateKey) -> Account {
        Account {
            address,
            public_key,
            private_key,
        }
    }

    /// Account for a private key, with the address derived from its public key
    pub fn from_private_key(private_key: PrivateKey) -> Result<Account, TxError> {
        let public_key = private_key.public_key();
        Ok(Account {
            address: address_from_public_key(&public_key)?,
            public_key,
            private_key,
        })
    }
}

/// Source of signer accounts, looked up by address
pub trait KeyProvider {
    fn account(&self, address: &str) -> Option<&Account>;
}

impl KeyProvider for Account {
    fn account(&self, address: &str) -> Option<&Account> {
        if self.address == address {
            Some(self)
        } else {
            None
        }
    }
}

impl KeyProvider for [Account] {
    fn account(&self, address: &str) -> Option<&Account> {
        self.iter().find(|a| a.address == address)
    }
}

impl KeyProvider for Vec<Account> {
    fn account(&self, address: &str) -> Option<&Account> {
        self.as_slice().account(address)
    }
}
