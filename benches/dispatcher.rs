//! 调度器与令牌桶性能基准测试

use std::hint::black_box;
use std::time::{Duration, Instant};

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use geoproxy::dispatch::{RatePolicy, ServiceDispatcher, TokenBucket};
use geoproxy::services::LookupService;

fn dispatcher_with(services: usize, burst: u32, now: Instant) -> ServiceDispatcher {
    let entries = (0..services)
        .map(|i| {
            let name = format!("svc{}", i);
            (
                LookupService::new(
                    name.clone(),
                    format!("https://{}.example/{{ip}}", name),
                    vec!["country".to_string()],
                ),
                RatePolicy::new(burst, Duration::from_secs(1), None).unwrap(),
            )
        })
        .collect();
    ServiceDispatcher::new(entries, now)
}

// ============== TokenBucket 基准测试 ==============

fn bench_token_bucket(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/token_bucket");

    group.bench_function("fill_and_consume", |b| {
        let start = Instant::now();
        let policy = RatePolicy::new(1_000_000, Duration::from_secs(1), None).unwrap();
        let mut bucket = TokenBucket::new(policy, start);
        let mut tick = 0u64;
        b.iter(|| {
            tick += 1;
            bucket.fill(start + Duration::from_micros(tick));
            black_box(bucket.consume());
        });
    });

    group.finish();
}

// ============== ServiceDispatcher 基准测试 ==============

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/select");

    for services in [1usize, 4, 16] {
        // 充足额度：每次都命中游标所在的服务
        group.bench_with_input(
            BenchmarkId::new("first_hit", services),
            &services,
            |b, &services| {
                let now = Instant::now();
                let dispatcher = dispatcher_with(services, u32::MAX, now);
                b.iter(|| black_box(dispatcher.select(now).is_ok()));
            },
        );

        // 额度耗尽：每次都扫描全部服务
        group.bench_with_input(
            BenchmarkId::new("exhausted", services),
            &services,
            |b, &services| {
                let now = Instant::now();
                let dispatcher = dispatcher_with(services, 1, now);
                while dispatcher.select(now).is_ok() {}
                b.iter(|| black_box(dispatcher.select(now).is_err()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_token_bucket, bench_select);
criterion_main!(benches);
