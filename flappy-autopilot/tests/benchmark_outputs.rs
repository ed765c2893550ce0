use flappy_autopilot::benchmark::{run_benchmark, BenchmarkConfig, BenchmarkReport, Objective};
use flappy_core::SimConfig;
use std::fs;
use std::path::Path;

fn config(out_dir: &Path, jobs: Option<usize>) -> BenchmarkConfig {
    BenchmarkConfig {
        controllers: vec!["idle".to_string(), "gap-tracker".to_string()],
        seeds: vec![0x1111_0001, 0x2222_0002],
        sim: SimConfig {
            max_ticks: Some(600),
            ..SimConfig::default()
        },
        objective: Objective::Fitness,
        out_dir: out_dir.to_path_buf(),
        jobs,
    }
}

#[test]
fn benchmark_writes_summary_and_csv() {
    let dir = tempfile::tempdir().expect("tempdir");
    let report = run_benchmark(config(dir.path(), Some(2))).expect("benchmark");

    assert_eq!(report.run_count, 4);
    assert_eq!(report.rankings.len(), 2);
    assert_eq!(report.rankings[0].controller_id, "gap-tracker");
    assert_eq!(report.rankings[1].controller_id, "idle");
    assert!((report.rankings[1].avg_fitness - 2.3).abs() < 1e-9);
    assert_eq!(report.rankings[1].survival_rate, 0.0);

    let summary = fs::read(dir.path().join("summary.json")).expect("summary.json");
    let parsed: BenchmarkReport = serde_json::from_slice(&summary).expect("parse summary");
    assert_eq!(parsed.run_count, 4);
    assert_eq!(parsed.max_ticks, Some(600));

    let runs = fs::read_to_string(dir.path().join("runs.csv")).expect("runs.csv");
    assert_eq!(runs.lines().count(), 5);
    assert!(runs.starts_with("controller_id,"));

    let rankings = fs::read_to_string(dir.path().join("rankings.csv")).expect("rankings.csv");
    assert_eq!(rankings.lines().count(), 3);
    assert!(rankings.lines().nth(1).is_some_and(|line| line.contains("gap-tracker")));
}

#[test]
fn thread_count_does_not_change_results() {
    let serial_dir = tempfile::tempdir().expect("tempdir");
    let parallel_dir = tempfile::tempdir().expect("tempdir");
    let serial = run_benchmark(config(serial_dir.path(), Some(1))).expect("serial");
    let parallel = run_benchmark(config(parallel_dir.path(), None)).expect("parallel");

    let key = |report: &BenchmarkReport| {
        report
            .runs
            .iter()
            .map(|run| (run.controller_id.clone(), run.seed, run.ticks, run.fitness.to_bits()))
            .collect::<Vec<_>>()
    };
    assert_eq!(key(&serial), key(&parallel));
}

#[test]
fn unknown_controller_fails_the_benchmark() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut bad = config(dir.path(), Some(1));
    bad.controllers.push("no-such-controller".to_string());
    assert!(run_benchmark(bad).is_err());
}
