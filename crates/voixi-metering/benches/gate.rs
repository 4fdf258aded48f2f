//! Admission gate benchmarks
//!
//! - single-account checks below the ceiling
//! - checks spread across many accounts
//! - rejections at the ceiling

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use voixi_common::{AccountId, Tier};
use voixi_metering::{AdmissionGate, InMemoryLedger, InboundEvent, TierPolicy};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
}

fn bench_unlimited_checks(c: &mut Criterion) {
    let rt = runtime();
    let policy = TierPolicy::default()
        .with_override(AccountId::parse(Some("bench")).expect("id"), Tier::Growth);
    let gate = AdmissionGate::new(Arc::new(InMemoryLedger::monthly()), Arc::new(policy));
    let event = InboundEvent::new("bench");

    c.bench_function("gate/unlimited_check", |b| {
        b.iter(|| rt.block_on(gate.check(black_box(&event))))
    });
}

fn bench_many_accounts(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("gate/accounts");

    for accounts in [10usize, 1_000, 100_000].iter() {
        group.throughput(Throughput::Elements(*accounts as u64));
        group.bench_with_input(BenchmarkId::from_parameter(accounts), accounts, |b, &n| {
            let gate = AdmissionGate::new(
                Arc::new(InMemoryLedger::monthly()),
                Arc::new(TierPolicy::default()),
            );
            let events: Vec<_> = (0..n).map(|i| InboundEvent::new(format!("+1555{:07}", i))).collect();
            b.iter(|| {
                rt.block_on(async {
                    for event in &events {
                        let _ = gate.check(black_box(event)).await;
                    }
                })
            });
        });
    }

    group.finish();
}

fn bench_rejections(c: &mut Criterion) {
    let rt = runtime();
    let gate = AdmissionGate::new(Arc::new(InMemoryLedger::monthly()), Arc::new(TierPolicy::default()));
    let event = InboundEvent::new("+15550001234");
    rt.block_on(async {
        for _ in 0..500 {
            let _ = gate.check(&event).await;
        }
    });

    c.bench_function("gate/reject_at_ceiling", |b| {
        b.iter(|| rt.block_on(gate.check(black_box(&event))))
    });
}

criterion_group!(benches, bench_unlimited_checks, bench_many_accounts, bench_rejections);
criterion_main!(benches);
