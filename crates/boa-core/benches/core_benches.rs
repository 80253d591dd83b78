//! Criterion benchmarks for boa-core hot paths.
//!
//! Covers: transaction digest, Ed25519 sign/verify, address encoding
//! and decimal amount parsing.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use boa_core::address::Address;
use boa_core::amount::Amount;
use boa_core::crypto::{verify, KeyPair};
use boa_core::types::{Hash, Transaction, TxInput, TxOutput};

fn sample_transaction(inputs: usize) -> Transaction {
    Transaction {
        inputs: (0..inputs)
            .map(|i| TxInput::new(Hash::digest(&(i as u64).to_le_bytes())))
            .collect(),
        outputs: vec![
            TxOutput::payment(Address::from_bytes([0xCC; 32]), Amount::new(50 * 10_000_000)),
            TxOutput::payment(Address::from_bytes([0xDD; 32]), Amount::new(25 * 10_000_000)),
        ],
        payload: vec![],
        lock_height: 0,
    }
}

fn bench_signing_digest(c: &mut Criterion) {
    let small = sample_transaction(1);
    let large = sample_transaction(100);

    c.bench_function("signing_digest_1_input", |b| {
        b.iter(|| black_box(&small).signing_digest())
    });

    c.bench_function("signing_digest_100_inputs", |b| {
        b.iter(|| black_box(&large).signing_digest())
    });
}

fn bench_ed25519(c: &mut Criterion) {
    let keypair = KeyPair::from_secret_bytes([42u8; 32]);
    let digest = Hash::digest(b"bench message");
    let signature = keypair.sign_bytes(digest.as_bytes());
    let address = keypair.address();

    c.bench_function("ed25519_sign", |b| {
        b.iter(|| keypair.sign_bytes(black_box(digest.as_bytes())))
    });

    c.bench_function("ed25519_verify", |b| {
        b.iter(|| verify(&address, black_box(digest.as_bytes()), black_box(&signature)))
    });
}

fn bench_address(c: &mut Criterion) {
    let address = Address::from_bytes([0xAB; 32]);
    let encoded = address.encode();

    c.bench_function("address_encode", |b| b.iter(|| black_box(&address).encode()));
    c.bench_function("address_decode", |b| {
        b.iter(|| Address::decode(black_box(&encoded)))
    });
}

fn bench_amount_parse(c: &mut Criterion) {
    c.bench_function("amount_from_boa_str", |b| {
        b.iter(|| Amount::from_boa_str(black_box("1234567.0012345")))
    });
}

criterion_group!(
    benches,
    bench_signing_digest,
    bench_ed25519,
    bench_address,
    bench_amount_parse,
);
criterion_main!(benches);
