use clap::Parser;
use gridsim_rs::error::SimError;
use gridsim_rs::model::{register_reporter, Builder, MetricsCollector, SchedulerKind};
use gridsim_rs::routing::RoutingTable;
use gridsim_rs::services::ServiceEvent;
use gridsim_rs::sim::{SimConfig, SimTime, SimulationMode, Simulator};
use gridsim_rs::workload::{ArrivalProcess, UniformRandomWorkload};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "linear-sim",
    about = "Simulate a master and machines chained by a linear topology"
)]
struct Args {
    /// Number of worker cores (0 = all available)
    #[arg(long, default_value_t = 0)]
    cores: u32,

    /// GVT (Global Virtual Time) computation period in microseconds
    #[arg(long, default_value_t = 1000)]
    gvt: u64,

    /// Checkpoint interval in events (0 = every event)
    #[arg(long, default_value_t = 0)]
    ckpt: u32,

    /// Number of machines chained linearly
    #[arg(long, default_value_t = 10)]
    machines: u32,

    /// Number of tasks to generate
    #[arg(long, default_value_t = 1000)]
    tasks: u32,

    /// Run in sequential mode instead of Time Warp
    #[arg(long)]
    serial: bool,

    /// Pin worker threads to OS cores
    #[arg(long)]
    core_binding: bool,

    /// Seed for the per-LP PRNGs
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Write final metrics as pretty JSON to this path
    #[arg(long)]
    metrics_json: Option<PathBuf>,
}

/// 线性拓扑：`0 -(1)- 2 -(3)- 4 - ... - 2m`，偶数是机器，奇数是链路。
/// 路由文件与原始模型一样先写盘再读回，顺带检验读取器。
fn write_linear_routes(machines: u32) -> Result<PathBuf, SimError> {
    let path = std::env::temp_dir().join(format!("gridsim-linear-{}.route", std::process::id()));
    let mut text = String::new();
    for machine_id in (2..=machines * 2).step_by(2) {
        text.push('0');
        text.push(' ');
        text.push_str(&machine_id.to_string());
        for link_id in (1..machine_id).step_by(2) {
            text.push(' ');
            text.push_str(&link_id.to_string());
        }
        text.push('\n');
    }
    fs::write(&path, text)?;
    Ok(path)
}

fn run(args: Args) -> Result<(), SimError> {
    let route_path = write_linear_routes(args.machines)?;
    let routing = Arc::new(RoutingTable::read_from(&route_path)?);

    let config = SimConfig {
        mode: if args.serial {
            SimulationMode::Sequential
        } else {
            SimulationMode::Optimistic
        },
        threads: args.cores,
        ckpt_interval: args.ckpt,
        gvt_period_us: args.gvt,
        core_binding: args.core_binding,
        prng_seed: args.seed,
        termination_time: None,
    };

    let mut sim = Simulator::new(config);
    let mut builder = Builder::new(&mut sim, Arc::clone(&routing));

    let machine_higher_id = args.machines * 2;
    let tasks = args.tasks;
    builder.register_master(0, SchedulerKind::RoundRobin, move |master, ctx| {
        master.set_workload(Box::new(UniformRandomWorkload::new(
            tasks,
            10.0,
            15.0,
            20.0,
            50.0,
            ArrivalProcess::Fixed(0.0),
        )));
        for machine_id in (2..=machine_higher_id).step_by(2) {
            master.add_slave(machine_id);
        }
        ctx.schedule_event(master.id(), SimTime::ZERO, ServiceEvent::SchedulerInit);
    })?;

    for machine_id in (2..=machine_higher_id).step_by(2) {
        builder.register_machine(machine_id, 2.0, 0.0, 2)?;
    }
    for link_id in (1..machine_higher_id).step_by(2) {
        builder.register_link(link_id, link_id - 1, link_id + 1, 5.0, 0.0, 1.0)?;
    }

    let collector = MetricsCollector::new();
    for sid in 0..=machine_higher_id {
        register_reporter(&mut sim, sid, Some(&collector))?;
    }

    sim.simulate()?;

    if let Some(path) = args.metrics_json {
        let json = serde_json::to_string_pretty(&collector.snapshot())
            .expect("serialize metrics snapshot");
        fs::write(&path, json)?;
        eprintln!("wrote metrics to {}", path.display());
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        tracing::error!(error = %e, "fatal configuration error");
        std::process::exit(1);
    }
}
