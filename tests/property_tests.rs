use std::path::Path;
use std::sync::OnceLock;

use proptest::prelude::*;

use pymetrics::analyzers::complexity::analyze_unit as complexity_of;
use pymetrics::analyzers::dependency::{health_score, ImportGraph};
use pymetrics::analyzers::performance::performance_score;
use pymetrics::config::{Config, DependencyConfig, ScoreWeights};
use pymetrics::coordinator::{Coordinator, ProjectFeatures};
use pymetrics::core::{AnalysisContext, SourceUnit};
use pymetrics::parser::records::extract_imports;
use pymetrics::parser::Parser;
use pymetrics::score::{ProjectReport, ScoreComponents};

fn unit(code: &str) -> SourceUnit {
    SourceUnit::parse("prop.py", code, &Parser::new())
}

fn coordinator() -> &'static Coordinator {
    static COORDINATOR: OnceLock<Coordinator> = OnceLock::new();
    COORDINATOR.get_or_init(|| Coordinator::new(2).expect("worker pool"))
}

// ---------------------------------------------------------------------------
// Complexity
// ---------------------------------------------------------------------------

proptest! {
    /// Straight-line functions have exactly one path.
    #[test]
    fn straight_line_function_has_cyclomatic_one(
        body in prop::collection::vec(
            prop_oneof![
                Just("x = 1"),
                Just("y = x + 2"),
                Just("print(x)"),
                Just("items = [1, 2, 3]"),
                Just("name = 'a' + 'b'"),
                Just("pass"),
                Just("del x"),
            ],
            1..10,
        )
    ) {
        let code = format!("def f(x):\n    {}\n    return x\n", body.join("\n    "));
        let result = complexity_of(&unit(&code));
        prop_assert!(!result.skipped);
        prop_assert_eq!(result.functions.len(), 1);
        prop_assert_eq!(result.functions[0].metrics.cyclomatic, 1);
    }

    /// Nesting the same construct scores strictly higher than repeating it flat.
    #[test]
    fn nesting_increases_cognitive(
        header in prop_oneof![Just("if x:"), Just("for i in x:"), Just("while x:")],
        depth in 2usize..6,
    ) {
        let mut flat = String::from("def f(x):\n");
        for _ in 0..depth {
            flat.push_str(&format!("    {header}\n        pass\n"));
        }

        let mut nested = String::from("def f(x):\n");
        for level in 0..depth {
            nested.push_str(&format!("{}{header}\n", "    ".repeat(level + 1)));
        }
        nested.push_str(&format!("{}pass\n", "    ".repeat(depth + 1)));

        let flat = complexity_of(&unit(&flat));
        let nested = complexity_of(&unit(&nested));
        prop_assert!(
            nested.functions[0].metrics.cognitive > flat.functions[0].metrics.cognitive,
            "nested {} <= flat {}",
            nested.functions[0].metrics.cognitive,
            flat.functions[0].metrics.cognitive
        );
    }
}

// ---------------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------------

proptest! {
    /// Unused imports are always a subset of imported modules.
    #[test]
    fn unused_imports_subset_of_imported(
        imports in prop::collection::vec(
            prop_oneof![
                Just("import os"),
                Just("import sys"),
                Just("import json as j"),
                Just("import xml.etree.ElementTree"),
                Just("from collections import OrderedDict"),
                Just("from os import path"),
                Just("from . import sibling"),
            ],
            0..7,
        ),
        uses in prop::collection::vec(
            prop_oneof![
                Just("print(os.name)"),
                Just("sys.exit(0)"),
                Just("j.dumps({})"),
                Just("d = OrderedDict()"),
                Just("p = path.join('a', 'b')"),
                Just("sibling.run()"),
                Just("x = 1"),
            ],
            0..7,
        ),
    ) {
        let code = format!("{}\n{}\n", imports.join("\n"), uses.join("\n"));
        let set = extract_imports(&unit(&code));
        prop_assert!(set.unused.is_subset(&set.modules), "{:?} not within {:?}", set.unused, set.modules);
    }

    /// Edges that only point forward in a fixed order never form a cycle.
    #[test]
    fn acyclic_graph_has_no_cycles(
        edges in prop::collection::vec((0usize..8, 0usize..8), 0..20)
    ) {
        let names: Vec<String> = (0..8).map(|i| format!("m{i}")).collect();
        let forward: Vec<(&str, &str)> = edges
            .iter()
            .filter(|(a, b)| a < b)
            .map(|&(a, b)| (names[a].as_str(), names[b].as_str()))
            .collect();
        prop_assert!(ImportGraph::from_edges(forward.iter().copied()).cycles().is_empty());

        let mut with_cycle = forward;
        with_cycle.push(("a", "b"));
        with_cycle.push(("b", "a"));
        let cycles = ImportGraph::from_edges(with_cycle).cycles();
        prop_assert!(!cycles.is_empty());
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn component_scores_bounded(
        unused in 0usize..500,
        cycles in 0usize..100,
        vulnerable in 0usize..100,
        hotspots in 0usize..200,
        memory in 0usize..200,
        io in 0usize..200,
        caching in 0usize..200,
    ) {
        let health = health_score(unused, cycles, vulnerable, &DependencyConfig::default());
        prop_assert!((0.0..=100.0).contains(&health));
        let perf = performance_score(hotspots, memory, io, caching);
        prop_assert!((0.0..=100.0).contains(&perf));
    }

    #[test]
    fn overall_score_bounded(
        values in prop::array::uniform6(-500.0f64..500.0),
        weights in prop::array::uniform6(0.0f64..5.0),
    ) {
        let components = ScoreComponents {
            maintainability: values[0].clamp(0.0, 100.0),
            quality: values[1].clamp(0.0, 100.0),
            security: values[2].clamp(0.0, 100.0),
            performance: values[3].clamp(0.0, 100.0),
            dependency: values[4].clamp(0.0, 100.0),
            patterns: values[5].clamp(0.0, 100.0),
        };
        let weights = ScoreWeights {
            complexity: weights[0],
            quality: weights[1],
            security: weights[2],
            performance: weights[3],
            dependency: weights[4],
            patterns: weights[5],
        };
        let overall = components.overall(&weights);
        prop_assert!((0.0..=100.0).contains(&overall));
    }

    /// Project aggregation stays in range for arbitrary mixes of files.
    #[test]
    fn project_scores_bounded(
        files in prop::collection::vec(
            prop::collection::vec(
                prop_oneof![
                    Just("import os\nos.system(cmd)\n"),
                    Just("password = 'hunter2'\n"),
                    Just("def f(a, b, c, d, e, f, g):\n    for x in a:\n        for y in b:\n            if x and y:\n                print(x)\n"),
                    Just("class Service:\n    \"\"\"Doc.\"\"\"\n    def run(self) -> int:\n        return 1\n"),
                    Just("try:\n    pass\nexcept:\n    pass\n"),
                    Just("def broken(:\n"),
                    Just("x = eval(data)\n"),
                ],
                0..4,
            ),
            0..4,
        ),
        coverage in -50.0f64..150.0,
    ) {
        let config = Config::default();
        let ctx = AnalysisContext::new(Path::new("."), &config);
        let mut features = ProjectFeatures::default();
        for (i, snippets) in files.iter().enumerate() {
            let code = snippets.concat();
            let unit = SourceUnit::parse(format!("m{i}.py"), &code, &Parser::new());
            features.files.push(coordinator().extract(&unit, &ctx));
        }

        let report = ProjectReport::build(features, coverage, None, Vec::new(), &config);
        let m = &report.metrics;
        for score in [
            m.overall_score,
            m.components.maintainability,
            m.components.quality,
            m.components.security,
            m.components.performance,
            m.components.dependency,
            m.components.patterns,
            m.quality.test_coverage,
        ] {
            prop_assert!((0.0..=100.0).contains(&score), "score {} out of range", score);
        }
        prop_assert!(report.errors.is_empty());
    }
}
