//! Performance benchmarks for config store operations

use configfile::{ConfigStore, SchemaValidator, SerdeValidator};
use configfile_test_helpers::prelude::{FooConfig, foo_validator, must};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::{Map, Value, json};
use std::hint::black_box;
use tempfile::TempDir;

fn bench_write_changed(c: &mut Criterion) {
    let temp_dir = must(TempDir::new());
    let store: ConfigStore<FooConfig, SchemaValidator<FooConfig>> =
        must(ConfigStore::new(temp_dir.path().join("config.json"), foo_validator()));
    let mut counter = 0u64;

    c.bench_function("write_changed", |b| {
        b.iter(|| {
            counter = counter.wrapping_add(1);
            let info = must(store.write(&FooConfig::new(counter.to_string())));
            black_box(info);
        });
    });
}

fn bench_write_suppressed(c: &mut Criterion) {
    let temp_dir = must(TempDir::new());
    let store: ConfigStore<FooConfig, SchemaValidator<FooConfig>> =
        must(ConfigStore::new(temp_dir.path().join("config.json"), foo_validator()));
    let config = FooConfig::new("steady");
    must(store.write(&config));

    c.bench_function("write_suppressed", |b| {
        b.iter(|| {
            let info = must(store.write(black_box(&config)));
            black_box(info);
        });
    });
}

fn bench_read(c: &mut Criterion) {
    let temp_dir = must(TempDir::new());
    let store: ConfigStore<FooConfig, SchemaValidator<FooConfig>> =
        must(ConfigStore::new(temp_dir.path().join("config.json"), foo_validator()));
    must(store.write(&FooConfig::new("bar").with_baz("qux")));

    c.bench_function("read", |b| {
        b.iter(|| {
            let config = must(store.read());
            black_box(config);
        });
    });
}

fn document_with_keys(count: usize) -> Value {
    let entries: Map<String, Value> = (0..count)
        .map(|i| (format!("key_{i}"), json!({ "enabled": i % 2 == 0, "weight": i })))
        .collect();
    Value::Object(entries)
}

fn bench_update_document_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");
    for count in [10, 100, 1000].iter() {
        let temp_dir = must(TempDir::new());
        let store: ConfigStore<Value, SerdeValidator<Value>> = must(
            ConfigStore::builder(temp_dir.path().join("config.json"), SerdeValidator::new())
                .initial_value(document_with_keys(*count))
                .build(),
        );
        must(store.initialize());
        let mut toggle = false;

        group.bench_with_input(BenchmarkId::new("keys", count), count, |b, _| {
            b.iter(|| {
                toggle = !toggle;
                let info = must(store.modify(|document| {
                    if let Some(map) = document.as_object_mut() {
                        map.insert("toggle".to_string(), Value::Bool(toggle));
                    }
                }));
                black_box(info);
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_write_changed,
    bench_write_suppressed,
    bench_read,
    bench_update_document_size
);
criterion_main!(benches);
