//! Name generation and full-program mangling benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use propmangle_core::{
    mangle_program, AlphabetPolicy, CacheOptions, Generator, MangleOptions, NameCache, NameTable,
    SubstituteMode,
};
use propmangle_parser::parse;

const SAMPLE_SOURCE: &str = r"
function createStore(reducer, initialState) {
    var state = initialState;
    var listeners = [];
    return {
        getState: function () { return state; },
        dispatch: function (action) {
            state = reducer(state, action);
            for (var i = 0; i < listeners.length; i++) listeners[i].onChange(state);
            return action;
        },
        subscribe: function (listener) {
            listeners.push(listener);
            return function () { listeners.splice(listeners.indexOf(listener), 1); };
        }
    };
}

class TodoList {
    constructor(store) {
        this.store = store;
        this.items = [];
    }
    render(container) {
        container.innerHTML = this.items.map(item => `<li>${item.title}</li>`).join('');
    }
}

window.app = createStore(function (state, action) {
    return action.type === 'add' ? { todos: state.todos.concat([action.payload]) } : state;
}, { todos: [] });
";

fn bench_generator(c: &mut Criterion) {
    let mut group = c.benchmark_group("generator");
    group.throughput(Throughput::Elements(10_000));

    let disjoint = Generator::new(&AlphabetPolicy::Disjoint, "", None).unwrap();
    group.bench_function("disjoint_10k", |b| {
        b.iter(|| {
            for seed in 0..10_000 {
                black_box(disjoint.generate(black_box(seed)));
            }
        });
    });

    let shared = Generator::new(&AlphabetPolicy::Shared(Default::default()), "", Some(7)).unwrap();
    group.bench_function("shared_shuffled_10k", |b| {
        b.iter(|| {
            for seed in 0..10_000 {
                black_box(shared.generate(black_box(seed)));
            }
        });
    });

    group.bench_function("cache_fill_10k", |b| {
        let names: Vec<String> = (0..10_000).map(|i| format!("name{i}")).collect();
        b.iter_batched(
            || NameCache::new(CacheOptions::default()).unwrap(),
            |mut cache| {
                for name in &names {
                    black_box(cache.substitute(name, SubstituteMode::Generated, &|_| false));
                }
                cache
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_mangle(c: &mut Criterion) {
    let mut group = c.benchmark_group("mangle");
    group.throughput(Throughput::Bytes(SAMPLE_SOURCE.len() as u64));

    let ast = parse(SAMPLE_SOURCE).unwrap();
    let options = MangleOptions::default();
    group.bench_function("sample", |b| {
        b.iter_batched(
            || (ast.clone(), NameCache::new(CacheOptions::default()).unwrap()),
            |(mut ast, mut cache)| {
                mangle_program(&mut ast, &mut cache, &options);
                (ast, cache)
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_generator, bench_mangle);
criterion_main!(benches);
