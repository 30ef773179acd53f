//! Onion construction and peeling benchmarks

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use shallot_core::{Address, Hop, build_onion, peel};
use shallot_crypto::KeyPair;

fn circuit(rng: &mut StdRng, len: u16) -> (Vec<KeyPair>, Vec<Hop>) {
    let keys: Vec<KeyPair> = (0..len).map(|_| KeyPair::generate(rng)).collect();
    let hops = keys
        .iter()
        .enumerate()
        .map(|(i, k)| Hop {
            address: Address::new(4000 + i as u16),
            public_key: *k.public_key(),
        })
        .collect();
    (keys, hops)
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("onion_build");
    let mut rng = StdRng::seed_from_u64(0);
    let (_, hops) = circuit(&mut rng, 3);

    for size in [16, 1024, 8192] {
        let message = "x".repeat(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &message, |b, message| {
            b.iter(|| build_onion(&mut rng, black_box(message), Address::new(3001), &hops))
        });
    }

    group.finish();
}

fn bench_peel(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let (keys, hops) = circuit(&mut rng, 3);
    let onion = build_onion(&mut rng, "hello", Address::new(3001), &hops).unwrap();

    c.bench_function("onion_peel_outer", |b| {
        b.iter(|| peel(black_box(onion.as_str()), keys[0].private_key()))
    });
}

criterion_group!(benches, bench_build, bench_peel);
criterion_main!(benches);
