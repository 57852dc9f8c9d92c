use clap::Parser;
use gridsim_rs::error::SimError;
use gridsim_rs::model::{register_reporter, Builder, MetricsCollector, SchedulerKind};
use gridsim_rs::routing::RoutingTable;
use gridsim_rs::services::ServiceEvent;
use gridsim_rs::sim::{SimConfig, SimTime, SimulationMode, Simulator};
use gridsim_rs::workload::{ArrivalProcess, ConstantWorkload};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "ring-sim",
    about = "Simulate machines placed on a ring around the master"
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

    /// Number of machines on the ring
    #[arg(long, default_value_t = 4)]
    machines: u32,

    /// Number of tasks to generate
    #[arg(long, default_value_t = 100)]
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

/// 环形拓扑：`0 -(1)- 2 -(3)- ... -(2m-1)- 2m -(2m+1)- 0`，
/// m 台机器由 m+1 条链路围成一圈。路由取较短的一侧，平局走正向。
fn write_ring_routes(machines: u32) -> Result<PathBuf, SimError> {
    let path = std::env::temp_dir().join(format!("gridsim-ring-{}.route", std::process::id()));
    let mut text = String::new();
    for i in 1..=machines {
        let machine_id = 2 * i;
        text.push('0');
        text.push(' ');
        text.push_str(&machine_id.to_string());
        let forward_len = i;
        let backward_len = machines - i + 1;
        if forward_len <= backward_len {
            for link_id in (1..machine_id).step_by(2) {
                text.push(' ');
                text.push_str(&link_id.to_string());
            }
        } else {
            let mut link_id = 2 * machines + 1;
            while link_id > machine_id {
                text.push(' ');
                text.push_str(&link_id.to_string());
                link_id -= 2;
            }
        }
        text.push('\n');
    }
    fs::write(&path, text)?;
    Ok(path)
}

fn run(args: Args) -> Result<(), SimError> {
    let route_path = write_ring_routes(args.machines)?;
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
        master.set_workload(Box::new(ConstantWorkload::new(
            tasks,
            50.0,
            80.0,
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
    // 第 2i+1 条链路连接服务 2i 与 2i+2；最后一条绕回主控。
    for i in 0..=args.machines {
        let link_id = 2 * i + 1;
        let from = 2 * i;
        let to = if i == args.machines { 0 } else { 2 * i + 2 };
        builder.register_link(link_id, from, to, 5.0, 0.0, 1.0)?;
    }

    let collector = MetricsCollector::new();
    for sid in 0..=machine_higher_id + 1 {
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
