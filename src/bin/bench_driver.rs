use std::{
    process::{Command, ExitCode, Stdio},
    time::{Duration, Instant},
};

use clap::Parser;

/// Bench targets with the Criterion groups each one defines.
const BENCH_TARGETS: [(&str, &[&str]); 3] = [
    ("bench_generate", &["generate_directed", "generate_undirected"]),
    (
        "bench_traversal",
        &["level_sync_bfs", "serial_bfs", "single_pass_claim"],
    ),
    ("bench_codec", &["encode", "decode"]),
];

#[derive(Parser, Debug)]
#[command(
    name = "bench_driver",
    about = "Run the densegraph Criterion benches and print a pass/fail summary"
)]
struct Args {
    /// Shrink graph sizes through the bench-ci feature
    #[arg(long)]
    ci: bool,

    /// Run only the bench target(s) that define this Criterion group
    #[arg(long = "group")]
    groups: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct BenchRun {
    target: &'static str,
    cargo_args: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
struct BenchOutcome {
    target: &'static str,
    ok: bool,
    elapsed: Duration,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let runs = match plan_runs(&args) {
        Ok(runs) => runs,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };
    println!(
        "densegraph bench driver ({} targets{})\n==========================",
        runs.len(),
        if args.ci { ", bench-ci sizes" } else { "" }
    );
    let outcomes = collect_results(&runs, |run| {
        Command::new("cargo")
            .args(&run.cargo_args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map(|code| code.success())
            .unwrap_or(false)
    });
    println!("\nSummary\n=======");
    for outcome in &outcomes {
        let status = if outcome.ok { "OK" } else { "FAIL" };
        println!("{:<20}{status:<6}{:.1?}", outcome.target, outcome.elapsed);
    }
    if outcomes.iter().all(|outcome| outcome.ok) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// One cargo invocation per selected target. A group filter is forwarded to
/// Criterion so only the matching benchmark group runs.
fn plan_runs(args: &Args) -> Result<Vec<BenchRun>, String> {
    let known = |group: &str| BENCH_TARGETS.iter().any(|(_, groups)| groups.contains(&group));
    if let Some(unknown) = args.groups.iter().find(|group| !known(group.as_str())) {
        return Err(format!("no bench target defines group `{unknown}`"));
    }
    let runs = BENCH_TARGETS
        .iter()
        .filter_map(|&(target, groups)| {
            let selected: Vec<&str> = groups
                .iter()
                .copied()
                .filter(|group| args.groups.iter().any(|wanted| wanted == group))
                .collect();
            if !args.groups.is_empty() && selected.is_empty() {
                return None;
            }
            let mut cargo_args: Vec<String> =
                ["bench", "--bench", target].map(String::from).into();
            if args.ci {
                cargo_args.extend(["--features".to_string(), "bench-ci".to_string()]);
            }
            if !selected.is_empty() {
                cargo_args.push("--".to_string());
                cargo_args.push(format!("^({})/", selected.join("|")));
            }
            Some(BenchRun { target, cargo_args })
        })
        .collect();
    Ok(runs)
}

fn collect_results<F>(runs: &[BenchRun], mut runner: F) -> Vec<BenchOutcome>
where
    F: FnMut(&BenchRun) -> bool,
{
    runs.iter()
        .map(|run| {
            let started = Instant::now();
            let ok = runner(run);
            BenchOutcome {
                target: run.target,
                ok,
                elapsed: started.elapsed(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("bench_driver").chain(extra.iter().copied()))
            .expect("args")
    }

    #[test]
    fn test_default_plan_runs_every_target_at_full_size() {
        let runs = plan_runs(&args(&[])).unwrap();
        let targets: Vec<&str> = runs.iter().map(|run| run.target).collect();
        assert_eq!(targets, vec!["bench_generate", "bench_traversal", "bench_codec"]);
        assert_eq!(runs[1].cargo_args, vec!["bench", "--bench", "bench_traversal"]);
    }

    #[test]
    fn test_ci_flag_enables_small_graphs() {
        let runs = plan_runs(&args(&["--ci"])).unwrap();
        assert!(runs.iter().all(|run| {
            run.cargo_args.ends_with(&["--features".to_string(), "bench-ci".to_string()])
        }));
    }

    #[test]
    fn test_group_selects_owning_target_and_filters_criterion() {
        let runs = plan_runs(&args(&["--group", "level_sync_bfs", "--group", "decode"])).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].target, "bench_traversal");
        assert_eq!(runs[0].cargo_args.last().unwrap(), "^(level_sync_bfs)/");
        assert_eq!(runs[1].target, "bench_codec");
        assert_eq!(runs[1].cargo_args.last().unwrap(), "^(decode)/");
    }

    #[test]
    fn test_unknown_group_is_rejected() {
        let err = plan_runs(&args(&["--group", "dijkstra"])).unwrap_err();
        assert!(err.contains("dijkstra"));
    }

    #[test]
    fn test_collect_results_preserves_order_and_status() {
        let runs = plan_runs(&args(&[])).unwrap();
        let outcomes = collect_results(&runs, |run| run.target != "bench_traversal");
        let summary: Vec<(&str, bool)> = outcomes.iter().map(|o| (o.target, o.ok)).collect();
        assert_eq!(
            summary,
            vec![
                ("bench_generate", true),
                ("bench_traversal", false),
                ("bench_codec", true)
            ]
        );
    }
}
