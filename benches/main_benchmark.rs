use crfloat::{FloatValue, Format};
use num_bigint::BigInt;

const WIDE: Format = Format::new(20, 1000);

fn test_divide() {
    let a = FloatValue::from_i64(WIDE, 355);
    let b = FloatValue::from_i64(WIDE, 113);
    black_box(a.divide(&b));
}

fn test_sqrt() {
    let two = FloatValue::from_i64(WIDE, 2);
    black_box(two.sqrt());
}

fn test_exp() {
    for v in [0.1, 1.5, -20.25, 300.] {
        black_box(FloatValue::from_f64(v).exp().unwrap());
    }
}

fn test_ln() {
    for v in [0.1, 1.5, 1e-200, 7e300] {
        black_box(FloatValue::from_f64(v).ln().unwrap());
    }
}

fn test_pow() {
    let x = FloatValue::from_f64(1.75);
    let y = FloatValue::from_f64(-3.3);
    black_box(x.pow(&y).unwrap());
    black_box(x.pow_int(&BigInt::from(1000)).unwrap());
}

fn test_parse_print() {
    let f = Format::FLOAT128;
    let v = FloatValue::from_string(f, "2.718281828459045235360287471352662497757e-1234").unwrap();
    black_box(v.to_string());
}

fn test_add_mul() {
    let mut acc = FloatValue::zero(Format::FLOAT64);
    for i in 1..100 {
        let v = FloatValue::from_f64(1.0 / i as f64);
        acc = acc.add(&v.multiply(&v));
    }
    black_box(acc);
}

use criterion::{black_box, criterion_group, criterion_main, Criterion};

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("test_divide", |b| b.iter(test_divide));
    c.bench_function("test_sqrt", |b| b.iter(test_sqrt));
    c.bench_function("test_exp", |b| b.iter(test_exp));
    c.bench_function("test_ln", |b| b.iter(test_ln));
    c.bench_function("test_pow", |b| b.iter(test_pow));
    c.bench_function("test_parse_print", |b| b.iter(test_parse_print));
    c.bench_function("test_add_mul", |b| b.iter(test_add_mul));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
