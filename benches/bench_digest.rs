extern crate xchain_sdk as xchain;
#[macro_use]
extern crate bencher;

use crate::xchain::{
    blockchain::{
        compute_digest, compute_txid, InvokeRequest, Transaction, TxId, TxInput, TxOutput,
    },
    crypto::{Curve, EcdsaSigner, PrivateKey, Signer},
    utxo::{select, UnspentOutput},
};
use bencher::Bencher;
use num::BigUint;

fn sample_tx() -> Transaction {
    let inputs = (0..16u8)
        .map(|i| TxInput {
            ref_tx_id: TxId([i; 32]),
            ref_output_index: i as u32,
            from_address: "dpzuVdosQrF2kmzumhVeFQZa1aYcdgFpN".to_string(),
            amount: BigUint::from(1_000_000u32 + i as u32),
            frozen_height: 0,
        })
        .collect();
    Transaction {
        inputs,
        outputs: vec![TxOutput {
            amount: BigUint::from(10_000_000u32),
            to_address: "alice".to_string(),
            frozen_height: 0,
        }],
        descriptor: b"bench".to_vec(),
        nonce: "166578947212345678".to_string(),
        timestamp: 1_665_789_472_000_000_000,
        version: 1,
        contract_requests: vec![
            InvokeRequest::new("wasm", "counter", "increase").with_arg("key", "counter")
        ],
        initiator: "dpzuVdosQrF2kmzumhVeFQZa1aYcdgFpN".to_string(),
        ..Transaction::default()
    }
}

fn bench_digest(b: &mut Bencher) {
    let tx = sample_tx();
    b.iter(|| compute_digest(&tx));
}

fn bench_txid(b: &mut Bencher) {
    let tx = sample_tx();
    b.iter(|| compute_txid(&tx));
}

fn bench_sign(b: &mut Bencher) {
    let key = PrivateKey::from_scalar(Curve::P256, &BigUint::from(1001u32)).unwrap();
    let digest = compute_digest(&sample_tx()).unwrap();
    b.iter(|| EcdsaSigner.sign(&key, &digest));
}

fn bench_select(b: &mut Bencher) {
    let candidates: Vec<UnspentOutput> = (0..1000u32)
        .map(|i| UnspentOutput {
            ref_tx_id: TxId([(i % 256) as u8; 32]),
            ref_output_index: i,
            owner: "alice".to_string(),
            amount: BigUint::from(i + 1),
            frozen_height: 0,
        })
        .collect();
    let target = BigUint::from(400_000u32);
    b.iter(|| select(&candidates, &target));
}

benchmark_group!(benches, bench_digest, bench_txid, bench_sign, bench_select);
benchmark_main!(benches);
