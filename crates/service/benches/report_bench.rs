use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use service::clock::FixedClock;
use service::costs::domain::{Category, CostItem};
use service::costs::repository::memory::{MemoryCostRepository, MemoryReportCache, MemoryUserDirectory};
use service::costs::repository::CostRepository;
use service::costs::service::ReportService;

fn bench_compute_report(c: &mut Criterion) {
    let costs = Arc::new(MemoryCostRepository::default());
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    let svc = ReportService::new(
        costs.clone(),
        Arc::new(MemoryReportCache::default()),
        Arc::new(MemoryUserDirectory::with_users([1])),
    )
    .with_clock(Arc::new(FixedClock::new(start)));

    // one month of data, spread over every category
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        for i in 0..2_000i64 {
            let item = CostItem {
                userid: 1,
                description: format!("item {i}"),
                category: Category::ALL[(i % 5) as usize],
                sum: (i % 97) as f64,
                created_at: start + Duration::minutes(i * 20),
            };
            costs.insert(item).await.unwrap();
        }
    });

    c.bench_function("compute_report_2000_items", |b| {
        b.iter(|| rt.block_on(svc.compute_report(1, 2026, 3)).unwrap());
    });
}

criterion_group!(benches, bench_compute_report);
criterion_main!(benches);
