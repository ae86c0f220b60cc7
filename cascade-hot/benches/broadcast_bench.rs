// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use cascade_hot::{Broadcast, BroadcastConfig};
use criterion::{BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use tokio::runtime::Runtime;

pub fn bench_broadcast_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast_fan_out");
    let subscriber_counts = [1usize, 8, 64];
    let sizes = [100usize, 1000];

    for &subscribers in &subscriber_counts {
        for &size in &sizes {
            let id = BenchmarkId::from_parameter(format!("s{subscribers}_m{size}"));
            group.throughput(Throughput::Elements((subscribers * size) as u64));
            group.bench_with_input(id, &(subscribers, size), |bencher, &(subscribers, size)| {
                let rt = Runtime::new().unwrap();
                bencher.iter(|| {
                    rt.block_on(async {
                        let broadcast = Broadcast::new(BroadcastConfig::default());
                        let attached: Vec<_> = (0..subscribers).map(|_| broadcast.attach()).collect();
                        for n in 0..size {
                            broadcast.emit(n).await;
                        }
                        for subscription in &attached {
                            while let Some(v) = subscription.try_next() {
                                black_box(v);
                            }
                        }
                    });
                });
            });
        }
    }

    group.finish();
}

pub fn bench_broadcast_replay_attach(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast_replay_attach");
    let replays = [1usize, 16, 256];

    for &replay in &replays {
        let id = BenchmarkId::from_parameter(format!("r{replay}"));
        group.throughput(Throughput::Elements(replay as u64));
        group.bench_with_input(id, &replay, |bencher, &replay| {
            let broadcast = Broadcast::new(BroadcastConfig::with_replay(replay));
            for n in 0..replay {
                broadcast.try_emit(n);
            }
            bencher.iter(|| {
                let subscription = broadcast.attach();
                black_box(subscription.pending());
            });
        });
    }

    group.finish();
}
