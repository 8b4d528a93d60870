use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use diagnostics::NullSink;
use h264::{CpbArrival, HrdVerifier, VerifierMode};

fn benchmark_hrd_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("HRD Verifier");

    group.bench_function("admit 1000 CBR access units", |b| {
        b.iter(|| {
            let mut verifier = HrdVerifier::new(40_000_000, 30_000_000, true, 16, 3003, VerifierMode::LogAndContinue);
            let mut sink = NullSink;
            for _ in 0..1000 {
                let arrival = CpbArrival { length_in_bits: black_box(120_000), initial_cpb_removal_delay: None };
                verifier.admit_au(arrival, &mut sink);
            }
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_hrd_admission);
criterion_main!(benches);
