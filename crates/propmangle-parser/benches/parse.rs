//! Parser and printer benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use propmangle_parser::{parse, Codegen, CodegenOptions, Lexer, TokenKind};

const SAMPLE_SOURCE: &str = r#"
// Sample JavaScript code for benchmarking
function fibonacci(n) {
    if (n <= 1) return n;
    return fibonacci(n - 1) + fibonacci(n - 2);
}

class Calculator {
    constructor() {
        this.result = 0;
    }

    add(x, y) {
        return x + y;
    }

    async fetchData(url) {
        const response = await fetch(url);
        return response.json();
    }
}

var calc = new Calculator();
var numbers = [1, 2, 3, 4, 5].map(n => n * 2);
var { a, b, ...rest } = { a: 1, b: 2, c: 3, d: 4 };
var template = `Hello ${name}, you have ${count} messages`;
window.app = { calc: calc, numbers, settings: { verbose: true } };
"#;

fn bench_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");
    group.throughput(Throughput::Bytes(SAMPLE_SOURCE.len() as u64));

    group.bench_function("sample", |b| {
        b.iter(|| {
            let mut lexer = Lexer::new(black_box(SAMPLE_SOURCE));
            loop {
                let token = lexer.next_token();
                if matches!(token.kind, TokenKind::Eof) {
                    break;
                }
            }
        });
    });

    group.finish();
}

fn bench_parse_and_print(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");
    group.throughput(Throughput::Bytes(SAMPLE_SOURCE.len() as u64));

    group.bench_function("parse", |b| {
        b.iter(|| parse(black_box(SAMPLE_SOURCE)).unwrap());
    });

    let ast = parse(SAMPLE_SOURCE).unwrap();
    group.bench_function("print", |b| {
        b.iter(|| Codegen::new(black_box(&ast), CodegenOptions::default()).generate());
    });

    group.finish();
}

criterion_group!(benches, bench_lexer, bench_parse_and_print);
criterion_main!(benches);
