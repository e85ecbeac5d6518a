//! Benchmark suite for the fuzzy scoring and ranking pipeline
//!
//! Measures:
//! - Single-candidate scoring across prefix lengths
//! - Full scoring passes over synthetic identifier dictionaries, with and
//!   without memoization
//! - The complete rank step (partition, score, sort, ordinals)
//!
//! Run with: cargo bench --bench scoring_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use completion_mux::context::LineWindow;
use completion_mux::ranking::rank;
use completion_mux::scoring::{score_candidate, ScorePass};
use completion_mux::{Candidate, EngineConfig, SourceId};

const VERBS: &[&str] = &[
    "get", "set", "find", "make", "take", "push", "pull", "load", "store", "parse",
];
const NOUNS: &[&str] = &[
    "node", "index", "buffer", "cursor", "token", "entry", "result", "handle", "source", "window",
];
const SUFFIXES: &[&str] = &["", "_mut", "_ref", "_all", "_or_default", "_unchecked"];

/// Generate a dictionary of plausible snake_case identifiers.
fn generate_identifiers(count: usize) -> Vec<String> {
    let mut out = Vec::with_capacity(count);
    let mut i = 0;
    'outer: loop {
        for suffix in SUFFIXES {
            for noun in NOUNS {
                for verb in VERBS {
                    if out.len() >= count {
                        break 'outer;
                    }
                    out.push(format!("{verb}_{noun}{suffix}{}", if i > 0 { i.to_string() } else { String::new() }));
                }
            }
        }
        i += 1;
    }
    out
}

fn make_candidate(text: &str) -> Candidate {
    Candidate {
        insert_text: text.to_string(),
        display_label: text.to_string(),
        kind_tag: String::new(),
        detail: None,
        source_id: SourceId::new("bench"),
        score: 0.0,
        raw: Default::default(),
    }
}

/// A window of source-like lines so the proximity scan has real work to do.
fn make_window(identifiers: &[String]) -> LineWindow {
    let lines = identifiers
        .iter()
        .take(40)
        .map(|id| format!("    let value = {id}(input);"))
        .collect();
    LineWindow::new(0, lines)
}

fn bench_single_score(c: &mut Criterion) {
    let window = LineWindow::default();
    let mut group = c.benchmark_group("score_candidate");

    for prefix in ["g", "gn", "gni", "get_node"] {
        group.bench_with_input(BenchmarkId::from_parameter(prefix), prefix, |b, prefix| {
            b.iter(|| {
                score_candidate(
                    black_box("get_node_index_or_default"),
                    black_box(prefix),
                    20,
                    &window,
                    20,
                    Some('='),
                )
            });
        });
    }
    group.finish();
}

fn bench_scoring_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring_pass");

    for size in [100, 1_000, 5_000] {
        let identifiers = generate_identifiers(size);
        let window = make_window(&identifiers);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(
            BenchmarkId::new("fresh", size),
            &identifiers,
            |b, identifiers| {
                b.iter(|| {
                    let mut pass = ScorePass::new("gni", 20, &window, 20, Some('='));
                    let mut total = 0.0;
                    for id in identifiers {
                        total += pass.score(black_box(id));
                    }
                    total
                });
            },
        );

        // Repeated lookups of the same texts, as happens when the cache is
        // re-ranked on every keystroke before the next response lands.
        group.bench_with_input(
            BenchmarkId::new("memoized", size),
            &identifiers,
            |b, identifiers| {
                let mut pass = ScorePass::new("gni", 20, &window, 20, Some('='));
                for id in identifiers {
                    pass.score(id);
                }
                b.iter(|| {
                    let mut total = 0.0;
                    for id in identifiers {
                        total += pass.score(black_box(id));
                    }
                    total
                });
            },
        );
    }
    group.finish();
}

fn bench_rank(c: &mut Criterion) {
    let config = EngineConfig::default();
    let mut group = c.benchmark_group("rank");

    for size in [100, 1_000, 5_000] {
        let identifiers = generate_identifiers(size);
        let window = make_window(&identifiers);
        let candidates: Vec<Candidate> = identifiers.iter().map(|id| make_candidate(id)).collect();
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &candidates,
            |b, candidates| {
                b.iter(|| {
                    let mut pass = ScorePass::new("get_n", 20, &window, 20, Some('='));
                    rank(black_box(candidates.clone()), "get_n", &mut pass, &config)
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_single_score, bench_scoring_pass, bench_rank);
criterion_main!(benches);
