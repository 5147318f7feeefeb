//! Benchmarks for the per-file analyzers and the coordinator.
//!
//! Run with: cargo bench
//! Run specific benchmark: cargo bench -- coordinator

use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;

use pymetrics::analyzers::{complexity, dependency, patterns, performance, quality, security};
use pymetrics::config::Config;
use pymetrics::coordinator::{Coordinator, Pipeline};
use pymetrics::core::{AnalysisContext, SourceUnit};
use pymetrics::parser::Parser;

/// Generate a Python module with classes, branches, loops and imports.
fn generate_python_module(index: usize, functions: usize) -> String {
    let mut code = format!(
        "\"\"\"Module {index}.\"\"\"\nimport os\nimport json\nfrom module_{next} import helper\n\n",
        next = index + 1
    );
    code.push_str(&format!("class Service{index}:\n    _instance = None\n\n"));
    code.push_str("    @classmethod\n    def get_instance(cls):\n        if cls._instance is None:\n            cls._instance = cls()\n        return cls._instance\n\n");
    for f in 0..functions {
        code.push_str(&format!(
            r#"
def process_{f}(items: list, limit: int = 10) -> list:
    """Filter and transform items."""
    result = []
    for item in items:
        if item > limit and item % 2 == 0:
            for sub in range(item):
                if sub % 3 == 0:
                    result.append(sub)
        elif item < 0:
            continue
    try:
        data = json.dumps(result)
    except ValueError:
        data = ""
    print(data)
    return result
"#
        ));
    }
    code
}

fn create_benchmark_project(file_count: usize) -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");
    for i in 0..file_count {
        std::fs::write(
            temp.path().join(format!("module_{i}.py")),
            generate_python_module(i, 8),
        )
        .expect("Failed to write file");
    }
    temp
}

fn bench_analyzers(c: &mut Criterion) {
    let config = Config::default();
    let parser = Parser::new();
    let code = generate_python_module(0, 20);
    let unit = SourceUnit::parse("bench.py", &code, &parser);

    let mut group = c.benchmark_group("analyzers");
    group.throughput(Throughput::Bytes(code.len() as u64));
    group.bench_function("parse", |b| {
        b.iter(|| SourceUnit::parse("bench.py", black_box(&code), &parser))
    });
    group.bench_function("complexity", |b| b.iter(|| complexity::analyze_unit(black_box(&unit))));
    group.bench_function("quality", |b| {
        b.iter(|| quality::analyze_unit(black_box(&unit), &config.quality))
    });
    group.bench_function("security", |b| b.iter(|| security::analyze_unit(black_box(&unit))));
    group.bench_function("performance", |b| {
        b.iter(|| performance::analyze_unit(black_box(&unit), &config.performance))
    });
    group.bench_function("patterns", |b| b.iter(|| patterns::analyze_unit(black_box(&unit))));
    group.bench_function("dependency", |b| b.iter(|| dependency::analyze_unit(black_box(&unit), Path::new("."))));
    group.finish();
}

fn bench_coordinator(c: &mut Criterion) {
    let config = Config::default();
    let ctx = AnalysisContext::new(Path::new("."), &config);
    let parser = Parser::new();

    let mut group = c.benchmark_group("coordinator");
    for jobs in [1, 2, 4] {
        let coordinator = Coordinator::new(jobs).expect("worker pool");
        let unit = SourceUnit::parse("bench.py", &generate_python_module(0, 20), &parser);
        group.bench_with_input(BenchmarkId::new("extract", jobs), &unit, |b, unit| {
            b.iter(|| coordinator.extract(black_box(unit), &ctx))
        });
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);
    for files in [10, 50] {
        let project = create_benchmark_project(files);
        let pipeline = Pipeline::new(project.path(), Config::default())
            .expect("pipeline")
            .with_coverage(None)
            .with_health(None);
        group.throughput(Throughput::Elements(files as u64));
        group.bench_with_input(BenchmarkId::new("run", files), &pipeline, |b, pipeline| {
            b.iter(|| pipeline.run().expect("analysis"))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_analyzers, bench_coordinator, bench_pipeline);
criterion_main!(benches);
