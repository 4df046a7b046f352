use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use table_reconcile::{
    data::Value,
    derive::{complete_fields, default_display_fields, derive_due_flag},
    keys::{default_candidates, infer_key},
    merge::merge,
    normalize::{NormalizedRecord, RawRow, normalize},
};

fn generate_tables(rows: usize) -> Vec<Vec<NormalizedRecord>> {
    let crm: Vec<RawRow> = (0..rows)
        .map(|i| {
            vec![
                ("Org ID".to_string(), Value::text(i.to_string())),
                ("Client".to_string(), Value::text(format!("Customer {i}"))),
                (
                    "Engagement Status".to_string(),
                    Value::text(if i % 3 == 0 { "Active" } else { "" }),
                ),
            ]
        })
        .collect();
    let esg: Vec<RawRow> = (0..rows)
        .rev()
        .map(|i| {
            vec![
                ("organisation_id".to_string(), Value::text(i.to_string())),
                ("Carbon Factor".to_string(), Value::Number(i as f64 * 0.5)),
                (
                    "Next Activity Due Date".to_string(),
                    Value::text(format!("2024-01-{:02}", (i % 28) + 1)),
                ),
            ]
        })
        .collect();
    vec![normalize(&crm).records, normalize(&esg).records]
}

fn bench_merge(c: &mut Criterion) {
    let tables = generate_tables(50_000);
    let key = infer_key(&tables, &default_candidates()).expect("shared key");
    let display_fields = default_display_fields();

    let mut group = c.benchmark_group("merge_50k");
    group.bench_function("merge_only", |b| {
        b.iter(|| merge(&tables, &key));
    });
    group.bench_function("merge_and_derive", |b| {
        b.iter_batched(
            || merge(&tables, &key).dataset,
            |dataset| derive_due_flag(complete_fields(dataset, &display_fields)),
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_merge);
criterion_main!(benches);
