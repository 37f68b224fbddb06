use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use phpantom_analyzer::codebase::Codebase;
use phpantom_analyzer::config::AnalyzerConfig;
use phpantom_analyzer::context::FileSource;
use phpantom_analyzer::issue::IssueSettings;
use phpantom_analyzer::scenario::parse_static_call;
use phpantom_analyzer::ttype::parse_union;
use phpantom_analyzer::types::{ClassInfo, ClassKind, MethodInfo};
use phpantom_analyzer::{Analyzer, Project};

/// A `Model` root with `depth` levels of subclasses below it, the
/// deepest named `Leaf`.
fn hierarchy(depth: usize) -> Codebase {
    let codebase = Codebase::new();
    codebase.add_class(
        ClassInfo::new("Model", ClassKind::Class)
            .with_method(MethodInfo::new("query").with_static(true).with_return_type(parse_union("static"))),
    );
    let mut parent = "Model".to_string();
    for level in 0..depth {
        let name = if level + 1 == depth {
            "Leaf".to_string()
        } else {
            format!("Level{level}")
        };
        codebase.add_class(ClassInfo::new(name.clone(), ClassKind::Class).with_parent(parent));
        parent = name;
    }
    codebase
}

fn bench_inherited_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("inherited_static_call");
    let call = parse_static_call("Leaf::query()").unwrap_or_else(|err| panic!("{err}"));

    for depth in [1usize, 8, 32] {
        let project = Arc::new(Project::new(hierarchy(depth), AnalyzerConfig::default()));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            let mut analyzer = Analyzer::new(Arc::clone(&project), FileSource::new("bench.php"), IssueSettings::default());
            b.iter(|| {
                let mut ctx = project.context(None);
                black_box(analyzer.analyze_static_call(black_box(&call), &mut ctx))
            });
        });
    }
    group.finish();
}

fn bench_union_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("union_receiver");
    let call = parse_static_call("$cls::query()").unwrap_or_else(|err| panic!("{err}"));

    for width in [2usize, 16] {
        let codebase = hierarchy(1);
        let names: Vec<String> = (0..width).map(|i| format!("Variant{i}")).collect();
        for name in &names {
            codebase.add_class(ClassInfo::new(name.clone(), ClassKind::Class).with_parent("Model"));
        }
        let receiver = parse_union(&names.join("|"));
        let project = Arc::new(Project::new(codebase, AnalyzerConfig::default()));

        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            let mut analyzer = Analyzer::new(Arc::clone(&project), FileSource::new("bench.php"), IssueSettings::default());
            b.iter(|| {
                let mut ctx = project.context(None);
                ctx.set_var("$cls", receiver.clone());
                black_box(analyzer.analyze_static_call(black_box(&call), &mut ctx))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_inherited_lookup, bench_union_fan_out);
criterion_main!(benches);
