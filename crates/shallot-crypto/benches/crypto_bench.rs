//! Performance benchmarks for shallot-crypto.
//!
//! Run with: `cargo bench -p shallot-crypto`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand_core::OsRng;
use shallot_crypto::envelope;
use shallot_crypto::{KeyPair, SymmetricKey, codec};

fn bench_symmetric_encrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("symmetric_encrypt");

    for size in [64, 256, 1024, 4096, 16384] {
        let key = SymmetricKey::new([0x42u8; 32]);
        let plaintext = vec![0xAA; size];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| key.encrypt(black_box(&plaintext)))
        });
    }

    group.finish();
}

fn bench_symmetric_decrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("symmetric_decrypt");

    for size in [64, 256, 1024, 4096, 16384] {
        let key = SymmetricKey::new([0x42u8; 32]);
        let combined = key.encrypt(&vec![0xAA; size]).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| key.decrypt(black_box(&combined)))
        });
    }

    group.finish();
}

fn bench_envelope(c: &mut Criterion) {
    let relay = KeyPair::generate(&mut OsRng);
    let key = [0x5au8; 32];
    let sealed = envelope::encrypt(&key, relay.public_key()).unwrap();

    c.bench_function("envelope_encrypt", |b| {
        b.iter(|| envelope::encrypt(black_box(&key), relay.public_key()))
    });

    c.bench_function("envelope_decrypt", |b| {
        b.iter(|| envelope::decrypt(black_box(&sealed), relay.private_key()))
    });
}

fn bench_codec(c: &mut Criterion) {
    let relay = KeyPair::generate(&mut OsRng);
    let text = codec::encode_public_key(relay.public_key());

    c.bench_function("decode_public_key", |b| {
        b.iter(|| codec::decode_public_key(black_box(&text)))
    });
}

criterion_group!(
    benches,
    bench_symmetric_encrypt,
    bench_symmetric_decrypt,
    bench_envelope,
    bench_codec
);
criterion_main!(benches);
