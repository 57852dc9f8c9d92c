use crate::error::SimError;
use crate::sim::{Dispatcher, SimConfig, SimTime, Simulator, Sid};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Per-LP log of `(time, payload)` dispatches.
type Log = Vec<(f64, u32)>;

fn recording_dispatcher() -> Dispatcher<Log, u32> {
    Arc::new(|_me, now, payload, state, _ctx| state.push((now.0, *payload)))
}

fn collect_logs(sim: &mut Simulator<Log, u32>, lps: Sid) -> Arc<Mutex<BTreeMap<Sid, Log>>> {
    let logs: Arc<Mutex<BTreeMap<Sid, Log>>> = Arc::new(Mutex::new(BTreeMap::new()));
    for sid in 0..lps {
        let sink = Arc::clone(&logs);
        sim.register_finalizer(
            sid,
            Box::new(move |sid, state: &Log| {
                sink.lock().expect("logs lock").insert(sid, state.clone());
            }),
        )
        .expect("register finalizer");
    }
    logs
}

#[test]
fn events_dispatch_in_time_order_with_seq_tie_break() {
    let mut sim = Simulator::<Log, u32>::new(SimConfig::default());
    sim.set_dispatcher(recording_dispatcher());
    sim.register_service(
        0,
        Box::new(|ctx| {
            ctx.schedule_event(0, SimTime(10.0), 1);
            ctx.schedule_event(0, SimTime(5.0), 2);
            ctx.schedule_event(0, SimTime(10.0), 3);
            Vec::new()
        }),
    )
    .expect("register");
    let logs = collect_logs(&mut sim, 1);

    sim.simulate().expect("simulate");

    let logs = logs.lock().expect("logs lock");
    assert_eq!(logs[&0], vec![(5.0, 2), (10.0, 1), (10.0, 3)]);
}

#[test]
fn event_scheduled_at_the_same_time_runs_after_the_current_one() {
    let mut sim = Simulator::<Log, u32>::new(SimConfig::default());
    let dispatcher: Dispatcher<Log, u32> = Arc::new(|me, now, payload, state, ctx| {
        state.push((now.0, *payload));
        if *payload == 1 {
            ctx.schedule_event(me, now, 2);
        }
    });
    sim.set_dispatcher(dispatcher);
    sim.register_service(
        0,
        Box::new(|ctx| {
            ctx.schedule_event(0, SimTime::ZERO, 1);
            Vec::new()
        }),
    )
    .expect("register");
    let logs = collect_logs(&mut sim, 1);

    sim.simulate().expect("simulate");

    let logs = logs.lock().expect("logs lock");
    assert_eq!(logs[&0], vec![(0.0, 1), (0.0, 2)]);
}

#[test]
fn events_past_the_termination_time_are_never_dispatched() {
    let config = SimConfig {
        termination_time: Some(SimTime(5.0)),
        ..SimConfig::default()
    };
    let mut sim = Simulator::<Log, u32>::new(config);
    sim.set_dispatcher(recording_dispatcher());
    sim.register_service(
        0,
        Box::new(|ctx| {
            ctx.schedule_event(0, SimTime::ZERO, 1);
            ctx.schedule_event(0, SimTime(5.0), 2);
            ctx.schedule_event(0, SimTime(10.0), 3);
            Vec::new()
        }),
    )
    .expect("register");
    let logs = collect_logs(&mut sim, 1);

    sim.simulate().expect("simulate");

    // The event exactly at the termination time still runs; the later one does not.
    let logs = logs.lock().expect("logs lock");
    assert_eq!(logs[&0], vec![(0.0, 1), (5.0, 2)]);
}

#[test]
fn committed_predicate_ends_the_run_early() {
    let mut sim = Simulator::<Log, u32>::new(SimConfig::default());
    sim.set_dispatcher(recording_dispatcher());
    sim.set_committed(Arc::new(|_sid, state: &Log| !state.is_empty()));
    sim.register_service(
        0,
        Box::new(|ctx| {
            ctx.schedule_event(0, SimTime(1.0), 1);
            ctx.schedule_event(0, SimTime(2.0), 2);
            ctx.schedule_event(0, SimTime(3.0), 3);
            Vec::new()
        }),
    )
    .expect("register");
    let logs = collect_logs(&mut sim, 1);

    sim.simulate().expect("simulate");

    let logs = logs.lock().expect("logs lock");
    assert_eq!(logs[&0], vec![(1.0, 1)]);
}

#[test]
fn duplicate_service_registration_is_a_config_error() {
    let mut sim = Simulator::<Log, u32>::new(SimConfig::default());
    sim.register_service(5, Box::new(|_| Vec::new())).expect("first");
    let err = sim.register_service(5, Box::new(|_| Vec::new()));
    assert!(matches!(err, Err(SimError::DuplicateService(5))));
}

#[test]
fn sparse_service_ids_are_a_config_error() {
    let mut sim = Simulator::<Log, u32>::new(SimConfig::default());
    sim.set_dispatcher(recording_dispatcher());
    sim.register_service(0, Box::new(|_| Vec::new())).expect("register 0");
    sim.register_service(2, Box::new(|_| Vec::new())).expect("register 2");
    assert!(matches!(sim.simulate(), Err(SimError::SparseServiceIds(1))));
}

#[test]
fn simulating_without_a_dispatcher_is_a_config_error() {
    let mut sim = Simulator::<Log, u32>::new(SimConfig::default());
    sim.register_service(0, Box::new(|_| Vec::new())).expect("register");
    assert!(matches!(sim.simulate(), Err(SimError::MissingDispatcher)));
}
