//! Criterion benchmarks for the merge hot paths.
//!
//! - chain construction and NPC model building per record
//! - winner resolution and wig assessment per NPC
//! - the full pre-build check pass over a synthetic profile

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use npc_merge::build::{BuildChecker, BuildSettings, Profile};
use npc_merge::npc::{Npc, NpcAnalysis};
use npc_merge::records::{LoadOrder, RecordAnalysisChain, Sourced};
use npc_merge::source::LoadOrderFile;

fn analysis(id: usize, plugin: usize) -> NpcAnalysis {
    serde_json::from_value(serde_json::json!({
        "key": format!("{id:06X}:Skyrim.esm"),
        "editor_id": format!("Npc{id}"),
        "name": format!("Npc {id}"),
        "behavior": format!("b{}", plugin % 3),
        "body": format!("y{}", plugin % 2),
        "outfits": "o0",
        "face_data": { "face_parts": { "nose": plugin % 4, "eyes": 1, "mouth": 1 } }
    }))
    .unwrap_or_else(|err| panic!("bench analysis: {err}"))
}

fn chain(id: usize, depth: usize) -> RecordAnalysisChain<NpcAnalysis> {
    let items = (0..depth).map(|p| {
        let plugin = if p == 0 {
            "Skyrim.esm".to_string()
        } else {
            format!("Mod{p}.esp")
        };
        Sourced::new(plugin, analysis(id, p))
    });
    RecordAnalysisChain::new(items).unwrap_or_else(|err| panic!("bench chain: {err}"))
}

fn load_order(depth: usize) -> Arc<LoadOrderFile> {
    let plugins: Vec<serde_json::Value> = (0..depth)
        .map(|p| {
            if p == 0 {
                serde_json::json!({ "name": "Skyrim.esm" })
            } else {
                serde_json::json!({ "name": format!("Mod{p}.esp"), "masters": ["Skyrim.esm"] })
            }
        })
        .collect();
    let raw = serde_json::json!({ "plugins": plugins, "bad_archives": ["Mod1 - Textures.bsa"] });
    Arc::new(
        LoadOrderFile::from_json(&raw.to_string())
            .unwrap_or_else(|err| panic!("bench load order: {err}")),
    )
}

fn model_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("npc_model");

    for depth in [2usize, 8, 32] {
        let chain = chain(1, depth);
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::new("from_chain", depth), &chain, |b, chain| {
            b.iter(|| Npc::from_chain(black_box(chain)));
        });

        let npc = Npc::from_chain(&chain);
        group.bench_with_input(BenchmarkId::new("merge", depth), &npc, |b, npc| {
            b.iter(|| black_box(npc).merge());
        });
    }

    group.finish();
}

fn check_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pre_build_checks");
    let depth = 8;
    let file = load_order(depth);
    let load_order: Arc<dyn LoadOrder> = file.clone();
    let checker = BuildChecker::standard(load_order, file, &[]);
    let settings = BuildSettings::default();

    for count in [100usize, 1000] {
        let profile = Profile::new((0..count).map(|id| Npc::from_chain(&chain(id, depth))).collect());
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("check_all", count), &profile, |b, profile| {
            b.iter(|| checker.check_all(black_box(profile), &settings));
        });
    }

    group.finish();
}

criterion_group!(benches, model_benchmarks, check_benchmarks);

criterion_main!(benches);
