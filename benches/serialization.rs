use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jsonplan::{
    hash, json, reflect_struct, to_vec, to_vec_with_options, EncodeOptions, Value,
};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Serialize, Clone)]
struct User {
    id: u32,
    name: String,
    email: String,
    active: bool,
}

reflect_struct!(User {
    id: u32,
    name: String,
    email: String,
    active: bool,
});

#[derive(Serialize, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

reflect_struct!(Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
});

#[derive(Serialize, Clone)]
struct Metadata {
    created: String,
    updated: String,
    version: u32,
}

reflect_struct!(Metadata {
    created: String,
    updated: String,
    version: u32,
});

#[derive(Serialize, Clone)]
struct NestedData {
    id: u32,
    metadata: Metadata,
    tags: Vec<String>,
    counters: HashMap<String, u64>,
}

reflect_struct!(NestedData {
    id: u32,
    metadata: Metadata,
    tags: Vec<String>,
    counters: HashMap<String, u64> = "counters,omitempty",
});

fn user() -> User {
    User {
        id: 123,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        active: true,
    }
}

fn products(size: u32) -> Vec<Product> {
    (0..size)
        .map(|i| Product {
            sku: format!("SKU{}", i),
            name: format!("Product {}", i),
            price: 9.99 + f64::from(i),
            quantity: i,
        })
        .collect()
}

fn nested() -> NestedData {
    NestedData {
        id: 42,
        metadata: Metadata {
            created: "2023-01-01T00:00:00Z".to_string(),
            updated: "2023-12-31T23:59:59Z".to_string(),
            version: 3,
        },
        tags: vec![
            "important".to_string(),
            "verified".to_string(),
            "production".to_string(),
        ],
        counters: (0..16).map(|i| (format!("counter{i}"), i * 7)).collect(),
    }
}

fn benchmark_encode_simple(c: &mut Criterion) {
    let user = user();
    c.bench_function("encode_simple_struct", |b| b.iter(|| to_vec(black_box(&user))));
}

fn benchmark_encode_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_array");

    for size in [10, 50, 100, 500].iter() {
        let products = products(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| to_vec(black_box(&products)))
        });
    }
    group.finish();
}

fn benchmark_presets(c: &mut Criterion) {
    let data = nested();
    let fastest = EncodeOptions::fastest();
    let pretty = EncodeOptions::pretty();

    let mut group = c.benchmark_group("presets");
    group.bench_function("standard", |b| b.iter(|| to_vec(black_box(&data))));
    group.bench_function("fastest", |b| {
        b.iter(|| to_vec_with_options(black_box(&data), &fastest))
    });
    group.bench_function("pretty", |b| {
        b.iter(|| to_vec_with_options(black_box(&data), &pretty))
    });
    group.finish();
}

fn benchmark_strings(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_strings");

    let plain = "This is a very long string that contains a lot of text and no escapes".to_string();
    let escaped = "<tag attr=\"value\">line\nbreak & tab\t</tag>".repeat(4);

    group.bench_function("plain", |b| b.iter(|| to_vec(black_box(&plain))));
    group.bench_function("escaped", |b| b.iter(|| to_vec(black_box(&escaped))));
    group.finish();
}

fn benchmark_primitive_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitive_array");

    let numbers: Vec<i32> = (0..100).collect();
    let bools: Vec<bool> = (0..100).map(|i| i % 2 == 0).collect();
    let floats: Vec<f64> = (0..100).map(|i| i as f64 * 1.5).collect();

    group.bench_function("integers", |b| b.iter(|| to_vec(black_box(&numbers))));
    group.bench_function("booleans", |b| b.iter(|| to_vec(black_box(&bools))));
    group.bench_function("floats", |b| b.iter(|| to_vec(black_box(&floats))));
    group.finish();
}

fn benchmark_dynamic_values(c: &mut Criterion) {
    let value: Value = json!({
        "user": { "id": 123, "name": "Bob", "active": true },
        "tags": ["admin", "developer"],
        "scores": [1.5, 2.5, 3.5]
    });
    c.bench_function("encode_dynamic_value", |b| b.iter(|| to_vec(black_box(&value))));
}

fn benchmark_comparison_with_serde_json(c: &mut Criterion) {
    let products = products(100);

    let mut group = c.benchmark_group("comparison");
    let fastest = EncodeOptions::fastest();
    group.bench_function("jsonplan", |b| {
        b.iter(|| to_vec_with_options(black_box(&products), &fastest))
    });
    group.bench_function("serde_json", |b| {
        b.iter(|| serde_json::to_vec(black_box(&products)))
    });
    group.finish();
}

fn benchmark_hash(c: &mut Criterion) {
    let data = nested();
    c.bench_function("hash_nested_struct", |b| b.iter(|| hash(black_box(&data))));
}

criterion_group!(
    benches,
    benchmark_encode_simple,
    benchmark_encode_array,
    benchmark_presets,
    benchmark_strings,
    benchmark_primitive_array,
    benchmark_dynamic_values,
    benchmark_comparison_with_serde_json,
    benchmark_hash
);
criterion_main!(benches);
