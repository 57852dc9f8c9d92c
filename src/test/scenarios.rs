use crate::model::{Builder, MetricsCollector, SchedulerKind, ServiceMetrics};
use crate::routing::{Route, RoutingTable};
use crate::services::ServiceEvent;
use crate::sim::{SimConfig, SimTime, SimulationMode, Simulator, Sid};
use crate::workload::{ArrivalProcess, ConstantWorkload};
use std::collections::BTreeMap;
use std::sync::Arc;

fn config(mode: SimulationMode, threads: u32, ckpt: u32) -> SimConfig {
    SimConfig {
        mode,
        threads,
        ckpt_interval: ckpt,
        gvt_period_us: 200,
        ..SimConfig::default()
    }
}

fn completed_tasks(metrics: &BTreeMap<Sid, ServiceMetrics>, sid: Sid) -> u64 {
    match &metrics[&sid] {
        ServiceMetrics::Master(m) => m.completed_tasks,
        other => panic!("expected master metrics, got {other:?}"),
    }
}

fn proc_tasks(metrics: &BTreeMap<Sid, ServiceMetrics>, sid: Sid) -> u64 {
    match &metrics[&sid] {
        ServiceMetrics::Machine(m) => m.proc_tasks,
        other => panic!("expected machine metrics, got {other:?}"),
    }
}

fn switch_packets(metrics: &BTreeMap<Sid, ServiceMetrics>, sid: Sid) -> u64 {
    match &metrics[&sid] {
        ServiceMetrics::Switch(s) => s.comm_packets,
        other => panic!("expected switch metrics, got {other:?}"),
    }
}

/// Four machines and five links on a ring around the master:
/// `0 -(1)- 2 -(3)- 4 -(5)- 6 -(7)- 8 -(9)- 0`, shortest-side routes.
fn run_ring(mode: SimulationMode, threads: u32, ckpt: u32) -> BTreeMap<Sid, ServiceMetrics> {
    let mut table = RoutingTable::new();
    table.add(0, 2, Route::new(vec![1]));
    table.add(0, 4, Route::new(vec![1, 3]));
    table.add(0, 6, Route::new(vec![9, 7]));
    table.add(0, 8, Route::new(vec![9]));
    let routing = Arc::new(table);

    let mut sim = Simulator::new(config(mode, threads, ckpt));
    let mut builder = Builder::new(&mut sim, Arc::clone(&routing));

    builder
        .register_master(0, SchedulerKind::RoundRobin, |master, ctx| {
            master.set_workload(Box::new(ConstantWorkload::new(
                100,
                50.0,
                80.0,
                ArrivalProcess::Fixed(0.0),
            )));
            for machine_id in [2, 4, 6, 8] {
                master.add_slave(machine_id);
            }
            ctx.schedule_event(master.id(), SimTime::ZERO, ServiceEvent::SchedulerInit);
        })
        .expect("register master");
    for machine_id in [2u32, 4, 6, 8] {
        builder
            .register_machine(machine_id, 2.0, 0.0, 2)
            .expect("register machine");
    }
    for i in 0..=4u32 {
        let link_id = 2 * i + 1;
        let from = 2 * i;
        let to = if i == 4 { 0 } else { 2 * i + 2 };
        builder
            .register_link(link_id, from, to, 5.0, 0.0, 1.0)
            .expect("register link");
    }

    let collector = MetricsCollector::new();
    for sid in 0..10 {
        collector.attach(&mut sim, sid).expect("attach collector");
    }
    sim.simulate().expect("simulate");
    collector.snapshot()
}

#[test]
fn ring_partitions_the_workload_evenly_across_machines() {
    let metrics = run_ring(SimulationMode::Sequential, 0, 0);

    assert_eq!(completed_tasks(&metrics, 0), 100);
    for machine_id in [2, 4, 6, 8] {
        assert_eq!(proc_tasks(&metrics, machine_id), 25, "machine {machine_id}");
    }
}

#[test]
fn ring_metrics_agree_between_modes() {
    let sequential = run_ring(SimulationMode::Sequential, 0, 0);
    let optimistic = run_ring(SimulationMode::Optimistic, 2, 1);
    assert_eq!(sequential, optimistic);
}

/// Star behind one switch: `0 -(1)- switch(2) -(3+2i)- machine(4+2i)`.
/// The switch is an endpoint of every link, so it never appears in a route
/// and forwards by descriptor in both directions.
fn run_star(
    mode: SimulationMode,
    threads: u32,
    ckpt: u32,
    machines: u32,
    tasks: u32,
) -> BTreeMap<Sid, ServiceMetrics> {
    let mut table = RoutingTable::new();
    for i in 0..machines {
        table.add(0, 4 + 2 * i, Route::new(vec![1, 3 + 2 * i]));
    }
    let routing = Arc::new(table);

    let mut sim = Simulator::new(config(mode, threads, ckpt));
    let mut builder = Builder::new(&mut sim, Arc::clone(&routing));

    builder
        .register_master(0, SchedulerKind::RoundRobin, move |master, ctx| {
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
        })
        .expect("register master");
    builder.register_link(1, 0, 2, 5.0, 0.0, 1.0).expect("register link 1");
    builder.register_switch(2, 5.0, 0.0, 1.0).expect("register switch");
    for i in 0..machines {
        let machine_id = 4 + 2 * i;
        let link_id = 3 + 2 * i;
        builder
            .register_link(link_id, 2, machine_id, 5.0, 0.0, 1.0)
            .expect("register link");
        builder
            .register_machine(machine_id, 2.0, 0.0, 2)
            .expect("register machine");
    }

    let collector = MetricsCollector::new();
    for sid in 0..(2 * machines + 3) {
        collector.attach(&mut sim, sid).expect("attach collector");
    }
    sim.simulate().expect("simulate");
    collector.snapshot()
}

#[test]
fn every_task_crosses_the_switch_once_per_direction() {
    let metrics = run_star(SimulationMode::Sequential, 0, 0, 4, 40);

    assert_eq!(completed_tasks(&metrics, 0), 40);
    assert_eq!(switch_packets(&metrics, 2), 80);
    for i in 0..4 {
        assert_eq!(proc_tasks(&metrics, 4 + 2 * i), 10);
    }
}

#[test]
fn star_metrics_agree_between_modes() {
    let sequential = run_star(SimulationMode::Sequential, 0, 0, 4, 40);
    let optimistic = run_star(SimulationMode::Optimistic, 2, 1, 4, 40);
    assert_eq!(sequential, optimistic);
}
