use std::sync::LazyLock;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use scangen::{CodeGenConfig, CompiledAutomaton, NfaCompiler, StateHandle};

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "true", "try", "type", "typeof",
    "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

fn add_literal(compiler: &mut NfaCompiler, text: &str, kind: u32) {
    let start = compiler.start_state();
    let nodes: Vec<StateHandle> = text.chars().map(|_| compiler.new_state()).collect();
    let accept = compiler.new_state();
    for (i, ch) in text.chars().enumerate() {
        let to = if i + 1 < nodes.len() { nodes[i + 1] } else { accept };
        compiler.add_move(nodes[i], ch, ch, to).unwrap();
    }
    compiler.set_accepting(accept, kind).unwrap();
    compiler.add_epsilon(start, nodes[0]);
}

fn keyword_compiler() -> NfaCompiler {
    let mut compiler = NfaCompiler::new("INITIAL");
    for (i, keyword) in KEYWORDS.iter().enumerate() {
        add_literal(&mut compiler, keyword, i as u32);
    }
    // An identifier rule overlapping every keyword.
    let start = compiler.start_state();
    let body = compiler.new_state();
    let hub = compiler.new_state();
    compiler.add_move(body, 'a', 'z', hub).unwrap();
    compiler.add_epsilon(hub, body);
    compiler.set_accepting(hub, KEYWORDS.len() as u32).unwrap();
    compiler.add_epsilon(start, body);
    compiler
}

static AUTOMATON: LazyLock<CompiledAutomaton> =
    LazyLock::new(|| keyword_compiler().compile(&CodeGenConfig::default()).unwrap());

fn compile_benchmark(c: &mut Criterion) {
    c.bench_function("compile_benchmark", |b| {
        b.iter(|| {
            black_box(
                keyword_compiler()
                    .compile(&CodeGenConfig::default())
                    .unwrap(),
            );
        });
    });
}

fn emit_benchmark(c: &mut Criterion) {
    c.bench_function("emit_benchmark", |b| {
        b.iter(|| {
            black_box(AUTOMATON.emit_to_string().unwrap());
        });
    });
}

fn scan_benchmark(c: &mut Criterion) {
    let input = "while unsafely typeofx matching continue zzz";
    c.bench_function("scan_benchmark", |b| {
        b.iter(|| {
            for word in input.split(' ') {
                black_box(AUTOMATON.scan(word));
            }
        });
    });
}

criterion_group!(benches, compile_benchmark, emit_benchmark, scan_benchmark);
criterion_main!(benches);
