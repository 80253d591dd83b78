//! Criterion benchmarks for coin selection.
//!
//! Covers: a full selection pass over many small UTXOs spread across
//! several senders, and the single-UTXO fast path.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use boa_core::amount::Amount;
use boa_core::constants::FEE_RATE;
use boa_core::crypto::KeyPair;
use boa_core::types::{Hash, UnspentTxOutput, UtxoType};
use boa_wallet::{Account, CoinSelector, FeeMode, SelectionRequest, Sender};

fn senders(count: u8, utxos_each: usize, amount: u64) -> Vec<Sender> {
    (0..count)
        .map(|seed| {
            let candidates: Vec<UnspentTxOutput> = (0..utxos_each)
                .map(|i| UnspentTxOutput {
                    hash: Hash::digest(format!("{seed}:{i}").as_bytes()),
                    utxo_type: UtxoType::Payment,
                    unlock_height: 0,
                    amount: Amount::new(amount),
                })
                .collect();
            Sender {
                account: Account::from_keypair(format!("s{seed}"), KeyPair::from_secret_bytes([seed; 32])),
                intended: Amount::new(amount * utxos_each as u64),
                candidates,
                selected: Vec::new(),
                drawn: Amount::ZERO,
            }
        })
        .collect()
}

fn request(required: u64) -> SelectionRequest {
    SelectionRequest {
        required: Amount::new(required),
        fee: FeeMode::Rate(Amount::new(FEE_RATE)),
        outputs: 2,
        payload_len: 0,
    }
}

fn bench_many_small_utxos(c: &mut Criterion) {
    // 4 senders x 250 UTXOs of 1 BOA; paying 900 BOA draws almost all of them.
    let mut pool = senders(4, 250, 10_000_000);
    let req = request(900 * 10_000_000);

    c.bench_function("select_1000_utxos", |b| {
        b.iter(|| CoinSelector::select(black_box(&mut pool), black_box(&req)))
    });
}

fn bench_single_covering_utxo(c: &mut Criterion) {
    let mut pool = senders(1, 1, 1_000 * 10_000_000);
    let req = request(10_000_000);

    c.bench_function("select_single_utxo", |b| {
        b.iter(|| CoinSelector::select(black_box(&mut pool), black_box(&req)))
    });
}

criterion_group!(benches, bench_many_small_utxos, bench_single_covering_utxo);
criterion_main!(benches);
