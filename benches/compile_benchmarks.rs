//! Performance benchmarks for the NotQuiteJava pipeline.
//!
//! - Phases: parsing, analysis and lowering measured separately
//! - Size-based: real test scripts and a generated class hierarchy
//! - Execution: interpreting generated IR
//!
//! ## Profiling with Puffin
//!
//! Run with the `profile-with-puffin` feature to collect phase timings:
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

#![allow(clippy::collapsible_if)]

use bumpalo::Bump;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use nqj::parser::Parser;
use nqj::{CompileOptions, Compiler, ExecOptions};
use std::fmt::Write;
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
use std::collections::HashMap;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

/// Initialize puffin profiler.
#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

/// Call at the end of each benchmark iteration to flush profiling data.
#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// Print the average time spent in each top-level scope.
#[cfg(feature = "profile-with-puffin")]
fn print_profiling_stats() {
    use puffin::Reader;

    let Some(frame_view) = FRAME_VIEW.get() else {
        println!("Profiler not initialized");
        return;
    };

    let view = frame_view.lock();
    let scope_collection = view.scope_collection();
    let mut scope_timings: HashMap<String, i64> = HashMap::new();
    let mut frame_count = 0i64;

    for frame in view.recent_frames() {
        frame_count += 1;
        let Ok(unpacked) = frame.unpacked() else {
            continue;
        };
        for (_thread_info, stream_info) in unpacked.thread_streams.iter() {
            let reader = Reader::from_start(&stream_info.stream);
            if let Ok(scopes) = reader.read_top_scopes() {
                for scope in scopes {
                    if let Some(details) = scope_collection.fetch_by_id(&scope.id) {
                        *scope_timings.entry(details.name().to_string()).or_insert(0) +=
                            scope.record.duration_ns;
                    }
                }
            }
        }
    }

    println!("\n=== Profiling Summary ({} frames) ===", frame_count);
    let mut entries: Vec<_> = scope_timings.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    for (name, ns) in entries {
        let avg_ns = if frame_count > 0 { ns / frame_count } else { ns };
        println!(
            "  {:30} {:>10.2?} avg",
            name,
            std::time::Duration::from_nanos(avg_ns as u64)
        );
    }
    println!("=====================================\n");
}

#[cfg(not(feature = "profile-with-puffin"))]
fn print_profiling_stats() {}

/// A program with `classes` classes, each extending the previous one and
/// adding a field and a method that walks an array.
fn generate_hierarchy(classes: usize) -> String {
    let mut source = String::new();
    for i in 0..classes {
        let extends = if i == 0 {
            String::new()
        } else {
            format!(" extends C{}", i - 1)
        };
        let _ = write!(
            source,
            r#"
class C{i}{extends} {{
    int f{i};
    int[] data{i};

    int step{i}(int n) {{
        int k;
        data{i} = new int[n];
        while (k < n) {{
            data{i}[k] = k * {i} + f{i};
            k = k + 1;
        }}
        f{i} = data{i}[n - 1] / (k + 1);
        return f{i};
    }}
}}
"#
        );
    }
    let last = classes.saturating_sub(1);
    let _ = write!(
        source,
        r#"
int main() {{
    C{last} c;
    c = new C{last}();
    printInt(c.step{last}(10));
    return 0;
}}
"#
    );
    source
}

/// Parsing, analysis and lowering on one mid-sized script.
fn phase_benchmarks(c: &mut Criterion) {
    setup_profiler();

    let source = include_str!("../test_scripts/list_append.nqj");
    let mut group = c.benchmark_group("pipeline/phases");
    group.throughput(Throughput::Bytes(source.len() as u64));

    group.bench_function("parse", |b| {
        b.iter(|| {
            let arena = Bump::new();
            let program = Parser::parse(black_box(source), &arena).unwrap();
            black_box(program.classes.len())
        });
    });

    let compiler = Compiler::default();
    group.bench_function("analyze", |b| {
        let arena = Bump::new();
        let program = Parser::parse(source, &arena).unwrap();
        b.iter(|| {
            let analysis = compiler.analyze(black_box(program));
            black_box(analysis.diagnostics.len())
        });
    });

    group.bench_function("compile", |b| {
        let arena = Bump::new();
        let program = Parser::parse(source, &arena).unwrap();
        b.iter(|| {
            let result = compiler.compile(black_box(program));
            end_profiling_frame();
            black_box(result.module.map(|m| m.procedures().len()))
        });
    });

    group.finish();
    print_profiling_stats();
}

/// End-to-end compilation across file sizes.
fn size_based_benchmarks(c: &mut Criterion) {
    setup_profiler();

    let mut group = c.benchmark_group("pipeline/file_sizes");
    let options = CompileOptions::default();

    let scripts = [
        ("tiny", include_str!("../test_scripts/hello_world.nqj").to_string()),
        ("small", include_str!("../test_scripts/bubble_sort.nqj").to_string()),
        ("hierarchy_50", generate_hierarchy(50)),
        ("hierarchy_500", generate_hierarchy(500)),
    ];

    for (name, source) in &scripts {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(*name, |b| {
            b.iter(|| {
                let module = nqj::compile_with(black_box(source), &options).unwrap();
                end_profiling_frame();
                black_box(module.procedures().len())
            });
        });
    }

    group.finish();
    print_profiling_stats();
}

/// Interpreting generated code.
fn execution_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpreter");
    let exec = ExecOptions::default();

    for (name, source) in [
        ("bubble_sort", include_str!("../test_scripts/bubble_sort.nqj")),
        ("list_append", include_str!("../test_scripts/list_append.nqj")),
    ] {
        let module = nqj::compile(source).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| {
                let execution = nqj::ir::run(black_box(&module), "main", &exec);
                black_box(execution.output.len())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    phase_benchmarks,
    size_based_benchmarks,
    execution_benchmarks
);
criterion_main!(benches);
