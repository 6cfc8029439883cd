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
//! # DER encoding of an ECDSA signature
//!
//! `SEQUENCE { INTEGER r, INTEGER s }`, the same as produced by Go `asn1.Marshal` on the ledger.

use crate::{
    blockchain::amount::{amount_to_bytes, bytes_to_amount},
    error::TxError,
};
use num::BigUint;
use std::mem::size_of;

const TAG_SEQUENCE: u8 = 0x30;
const TAG_INTEGER: u8 = 0x02;

fn malformed<S: Into<String>>(msg: S) -> TxError {
    TxError::MalformedSignature(msg.into())
}

/// Encode `(r, s)` pair as DER bytes
pub fn encode(r: &BigUint, s: &BigUint) -> Vec<u8> {
    let mut body = Vec::with_capacity(72);
    write_integer(&mut body, r);
    write_integer(&mut body, s);

    let mut out = Vec::with_capacity(body.len() + 4);
    out.push(TAG_SEQUENCE);
    write_length(&mut out, body.len());
    out.extend(body);
    out
}

/// Decode DER bytes into `(r, s)`. Accepts only the canonical (strict DER) form.
pub fn decode(data: &[u8]) -> Result<(BigUint, BigUint), TxError> {
    let mut outer = DerReader::new(data);
    let sequence = outer.read_tlv(TAG_SEQUENCE)?;
    if !outer.is_empty() {
        return Err(malformed("trailing data after SEQUENCE"));
    }

    let mut inner = DerReader::new(sequence);
    let r = read_integer(inner.read_tlv(TAG_INTEGER)?)?;
    let s = read_integer(inner.read_tlv(TAG_INTEGER)?)?;
    if !inner.is_empty() {
        return Err(malformed("trailing data inside SEQUENCE"));
    }
    Ok((r, s))
}

/// INTEGER content, a `0x00` guard is prepended when the top bit is set so the value stays
/// non-negative
fn integer_content(value: &BigUint) -> Vec<u8> {
    let magnitude = amount_to_bytes(value);
    match magnitude.first() {
        None => vec![0x00],
        Some(b) if b & 0x80 != 0 => {
            let mut content = Vec::with_capacity(magnitude.len() + 1);
            content.push(0x00);
            content.extend(magnitude);
            content
        }
        Some(_) => magnitude,
    }
}

fn write_integer(out: &mut Vec<u8>, value: &BigUint) {
    let content = integer_content(value);
    out.push(TAG_INTEGER);
    write_length(out, content.len());
    out.extend(content);
}

fn write_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

fn read_integer(content: &[u8]) -> Result<BigUint, TxError> {
    match content {
        [] => Err(malformed("empty INTEGER")),
        [first, ..] if first & 0x80 != 0 => Err(malformed("negative INTEGER")),
        [0x00, next, ..] if next & 0x80 == 0 => Err(malformed("INTEGER is not minimally encoded")),
        _ => Ok(bytes_to_amount(content)),
    }
}

struct DerReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    fn new(data: &'a [u8]) -> DerReader<'a> {
        DerReader { data, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn next_byte(&mut self) -> Result<u8, TxError> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or_else(|| malformed("unexpected end of data"))?;
        self.pos += 1;
        Ok(b)
    }

    fn read_length(&mut self) -> Result<usize, TxError> {
        let first = self.next_byte()?;
        if first < 0x80 {
            return Ok(first as usize);
        }
        let count = (first & 0x7f) as usize;
        if count == 0 {
            return Err(malformed("indefinite length"));
        }
        if count > size_of::<usize>() {
            return Err(malformed("length is too large"));
        }
        let mut len = 0usize;
        for i in 0..count {
            let b = self.next_byte()?;
            if i == 0 && b == 0 {
                return Err(malformed("length is not minimally encoded"));
            }
            len = (len << 8) | b as usize;
        }
        if len < 0x80 {
            return Err(malformed("long form for a short length"));
        }
        Ok(len)
    }

    fn read_tlv(&mut self, tag: u8) -> Result<&'a [u8], TxError> {
        let actual = self.next_byte()?;
        if actual != tag {
            return Err(malformed(format!(
                "expected tag 0x{:02x}, got 0x{:02x}",
                tag, actual
            )));
        }
        let len = self.read_length()?;
        if len > self.data.len() - self.pos {
            return Err(malformed(format!(
                "declared length {} overruns {} remaining bytes",
                len,
                self.data.len() - self.pos
            )));
        }
        let content = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(content)
    }
}
