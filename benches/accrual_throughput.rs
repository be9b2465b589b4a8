use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;

use pointr::accrual::{aggregate, normalize, project};
use pointr::domain::{Conditions, Customer, CustomerId, PurchaseRecord, Reward, Rule, RuleStatus};

fn purchase_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap_or_default()
}

fn create_records(count: usize) -> Vec<PurchaseRecord> {
    (0..count)
        .map(|i| PurchaseRecord {
            customer_id: CustomerId::new(format!("C{}", i % 500)),
            product_id: format!("P{}", i % 37),
            category_id: format!("CT100{}", i % 4),
            category_name: "BEVERAGE".to_string(),
            branch_id: format!("BR34{}", i % 8),
            purchased_amount: Decimal::new(1_000 + (i as i64 * 731) % 90_000, 2),
            currency: "THB".to_string(),
            purchase_date: purchase_date(),
        })
        .collect()
}

fn create_rules() -> Vec<Rule> {
    let rule = |id: &str, branch: Option<&str>, reward: Reward| Rule {
        id: id.to_string(),
        name: id.to_string(),
        status: RuleStatus::Active,
        conditions: Conditions {
            min_amount: Decimal::new(5_000, 2),
            branch_id: branch.map(str::to_string),
            category_ids: smallvec::smallvec!["CT1001".to_string(), "CT1002".to_string()],
        },
        reward,
    };

    vec![
        rule("FIXED", Some("BR341"), Reward::FixedPoint { value: 20 }),
        rule("PCT", None, Reward::Percentage { rate: 5 }),
        rule(
            "RATIO",
            Some("BR343"),
            Reward::Ratio {
                value: 5,
                unit: Some(Decimal::new(300, 1)),
            },
        ),
    ]
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for size in [1_000, 10_000] {
        let mut records = create_records(size);
        // every tenth record repeated
        records.extend(records.iter().step_by(10).cloned().collect::<Vec<_>>());

        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| normalize(black_box(records.clone())))
        });
    }

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let rules = create_rules();
    let mut group = c.benchmark_group("aggregate");

    for size in [1_000, 10_000] {
        let records = create_records(size);
        let history: Vec<Customer> = aggregate(&rules, &records[..size / 2], &[])
            .into_iter()
            .filter_map(|update| {
                let mut customer = Customer::new(update.customer_id.clone());
                customer.apply(&update).ok()?;
                Some(customer)
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| aggregate(black_box(&rules), black_box(records), black_box(&history)))
        });
    }

    group.finish();
}

fn bench_project(c: &mut Criterion) {
    let customers: Vec<Customer> = (0..10_000)
        .map(|i| {
            let mut customer = Customer::new(CustomerId::new(format!("C{i}")));
            for day in 1..=30 {
                if let Some(date) = NaiveDate::from_ymd_opt(2025, 1, day) {
                    customer.points_by_date.insert(date, (i * day as i64) % 97);
                }
            }
            customer
        })
        .collect();

    c.bench_function("project_10k_customers", |b| {
        b.iter(|| project(black_box(&customers), black_box(purchase_date())))
    });
}

criterion_group!(benches, bench_normalize, bench_aggregate, bench_project);
criterion_main!(benches);
