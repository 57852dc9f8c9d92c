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
    name = "star-sim",
    about = "Simulate machines fanned out behind a switch in a star topology"
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

    /// Number of machines behind the switch
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

/// 星形拓扑：`0 -(1)- 交换机 2 -(3+2i)- 机器 (4+2i)`。
/// 交换机是两侧链路的端点，不出现在路由里；
/// 去程与返程因此天然对称。
fn write_star_routes(machines: u32) -> Result<PathBuf, SimError> {
    let path = std::env::temp_dir().join(format!("gridsim-star-{}.route", std::process::id()));
    let mut text = String::new();
    for i in 0..machines {
        let machine_id = 4 + 2 * i;
        let link_id = 3 + 2 * i;
        text.push_str(&format!("0 {machine_id} 1 {link_id}\n"));
    }
    fs::write(&path, text)?;
    Ok(path)
}

fn run(args: Args) -> Result<(), SimError> {
    let route_path = write_star_routes(args.machines)?;
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

    let tasks = args.tasks;
    let machines = args.machines;
    builder.register_master(0, SchedulerKind::RoundRobin, move |master, ctx| {
        master.set_workload(Box::new(ConstantWorkload::new(
            tasks,
            50.0,
            80.0,
            ArrivalProcess::Fixed(0.0),
        )));
        for i in 0..machines {
            master.add_slave(4 + 2 * i);
        }
        ctx.schedule_event(master.id(), SimTime::ZERO, ServiceEvent::SchedulerInit);
    })?;

    builder.register_link(1, 0, 2, 5.0, 0.0, 1.0)?;
    builder.register_switch(2, 5.0, 0.0, 1.0)?;
    for i in 0..machines {
        let machine_id = 4 + 2 * i;
        let link_id = 3 + 2 * i;
        builder.register_link(link_id, 2, machine_id, 5.0, 0.0, 1.0)?;
        builder.register_machine(machine_id, 2.0, 0.0, 2)?;
    }

    let collector = MetricsCollector::new();
    for sid in 0..(2 * machines + 3) {
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
