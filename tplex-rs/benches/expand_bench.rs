use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tplex::engine::{Generator, Value};

fn make_text(repeats: usize) -> String {
    let chunk = "The quick brown fox jumps over the lazy dog. ";
    chunk.repeat(repeats)
}

fn make_calls(repeats: usize) -> String {
    let chunk = "Dear {{ name }}, {{ if {{ == {{ name }} Ada }} {{ func welcome back }} {{ func hello }} }}. ";
    chunk.repeat(repeats)
}

fn expand(src: &str) -> String {
    let mut gen = Generator::from_source(src);
    gen.push_variable("name", Value::new("Ada"));
    gen.parse().output
}

fn bench_expand(c: &mut Criterion) {
    let text_med = make_text(1000); // ~45k, no calls
    let calls_small = make_calls(10);
    let calls_med = make_calls(1000);

    let items: Vec<String> = (0..200).map(|i| format!("item{i}")).collect();
    let nested = format!(
        "{{{{ for x {{{{ list {} }}}} {{{{ func {{{{ for y {{{{ list a b c }}}} {{{{ func {{{{x}}}}-{{{{y}}}} }}}} }}}} }}}} }}}}",
        items.join(" ")
    );

    let mut g = c.benchmark_group("expand");

    g.bench_function("plain_text_med", |b| b.iter(|| expand(black_box(&text_med))));
    g.bench_function("calls_small", |b| b.iter(|| expand(black_box(&calls_small))));
    g.bench_function("calls_med", |b| b.iter(|| expand(black_box(&calls_med))));
    g.bench_function("nested_for", |b| b.iter(|| expand(black_box(&nested))));

    g.finish();
}

criterion_group!(benches, bench_expand);
criterion_main!(benches);
