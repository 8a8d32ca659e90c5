//! 循环手法仿真
//!
//! 按场景配置跑决斗者示例若干轮迭代，输出各来源的资源指标汇总。

use clap::Parser;
use rotsim_rs::demo::run_duel;
use rotsim_rs::sim::ScenarioSpec;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "rotation-sim", about = "Run the demo duelist rotation for N iterations")]
struct Args {
    /// Path to scenario.json (flags below override individual fields)
    #[arg(long)]
    scenario: Option<PathBuf>,

    #[arg(long)]
    iterations: Option<u64>,

    /// Base seed; iteration i runs with seed + i
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    duration_ms: Option<i64>,

    /// 开战前导时间（毫秒），时钟从 -prepull_ms 起
    #[arg(long)]
    prepull_ms: Option<i64>,

    /// Print the aggregate report as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    // 初始化 tracing；日志走 stderr，stdout 留给报告
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let mut spec = match &args.scenario {
        Some(path) => match ScenarioSpec::from_path(path) {
            Ok(spec) => spec,
            Err(err) => {
                eprintln!("scenario error: {err}");
                std::process::exit(2);
            }
        },
        None => ScenarioSpec::default(),
    };
    if let Some(iterations) = args.iterations {
        spec.iterations = iterations;
    }
    if let Some(seed) = args.seed {
        spec.seed = seed;
    }
    if let Some(duration_ms) = args.duration_ms {
        spec.duration_ms = duration_ms;
    }
    if let Some(prepull_ms) = args.prepull_ms {
        spec.prepull_ms = prepull_ms;
    }

    let report = run_duel(&spec);

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).expect("serialize report")
        );
        return;
    }

    println!(
        "done: iterations={} seed={} duration_ms={}",
        report.iterations, report.seed, report.duration_ms
    );
    for unit in &report.units {
        for m in &unit.resources {
            if m.events == 0 {
                continue;
            }
            println!(
                "{:>16} {:>12} {:<16} events={:<8} gross={:>12.1} net={:>12.1} wasted={:>10.1}",
                unit.unit,
                m.kind.to_string(),
                m.action.to_string(),
                m.events,
                m.gross,
                m.net,
                m.wasted()
            );
        }
    }
}
