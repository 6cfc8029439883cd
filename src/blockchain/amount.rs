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
//! # Conversion between big integers and their wire bytes
//!
//! The ledger keeps amounts and signature components as unsigned big-endian bytes of minimal
//! length. It's the same as taking the signed little-endian form of a number, dropping the
//! trailing `0x00` sign byte and reversing. Zero is an empty byte string.

use num::{BigUint, Zero};

/// Unsigned big-endian bytes of the value, without leading zeroes. Empty for zero.
pub fn amount_to_bytes(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        // BigUint gives [0] for zero, but the ledger writes nothing
        return Vec::new();
    }
    value.to_bytes_be()
}

/// Big-endian bytes to a number. Leading zeroes are ignored, empty input is zero.
pub fn bytes_to_amount(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    #[test]
    fn zero_is_empty() {
        assert_eq!(amount_to_bytes(&BigUint::zero()), Vec::<u8>::new());
        assert_eq!(bytes_to_amount(&[]), BigUint::zero());
    }

    #[test]
    fn encode_small_values() {
        assert_eq!(amount_to_bytes(&BigUint::from(1u32)), vec![0x01]);
        assert_eq!(amount_to_bytes(&BigUint::from(888u32)), vec![0x03, 0x78]);
        assert_eq!(amount_to_bytes(&BigUint::from(256u32)), vec![0x01, 0x00]);
    }

    #[test]
    fn high_bit_has_no_sign_byte() {
        // 190 is 0xbe, it needs a sign byte in the signed form but not here
        assert_eq!(amount_to_bytes(&BigUint::from(190u32)), vec![0xbe]);
        assert_eq!(amount_to_bytes(&BigUint::from(0x8000u32)), vec![0x80, 0x00]);
    }

    #[test]
    fn decode_ignores_leading_zeroes() {
        assert_eq!(bytes_to_amount(&[0x00, 0x00, 0xbe]), BigUint::from(190u32));
    }

    #[test]
    fn decode_large() {
        let bytes = hex::decode("0de0b6b3a7640000").unwrap();
        assert_eq!(
            bytes_to_amount(&bytes),
            BigUint::from(1_000_000_000_000_000_000u64)
        );
    }

    #[test]
    fn roundtrip_any_value() {
        fn prop(value: Vec<u8>) -> bool {
            let n = BigUint::from_bytes_le(&value);
            bytes_to_amount(&amount_to_bytes(&n)) == n
        }
        quickcheck(prop as fn(Vec<u8>) -> bool);
    }

    #[test]
    fn encoded_is_minimal() {
        fn prop(value: u64) -> bool {
            let bytes = amount_to_bytes(&BigUint::from(value));
            bytes.first().map_or(value == 0, |b| *b != 0)
        }
        quickcheck(prop as fn(u64) -> bool);
    }
}
