use crate::error::SimError;
use crate::model::{Builder, SchedulerKind};
use crate::routing::RoutingTable;
use crate::services::{LpState, ServiceEvent};
use crate::sim::{SimConfig, Simulator};
use std::sync::Arc;

fn new_sim() -> Simulator<LpState, ServiceEvent> {
    Simulator::new(SimConfig::default())
}

#[test]
fn machine_with_non_positive_power_is_rejected() {
    let mut sim = new_sim();
    let mut builder = Builder::new(&mut sim, Arc::new(RoutingTable::new()));
    let err = builder.register_machine(2, 0.0, 0.0, 2);
    assert!(matches!(err, Err(SimError::InvalidPower(2, _))));
    let err = builder.register_machine(2, -1.0, 0.0, 2);
    assert!(matches!(err, Err(SimError::InvalidPower(2, _))));
}

#[test]
fn load_factor_outside_the_unit_interval_is_rejected() {
    let mut sim = new_sim();
    let mut builder = Builder::new(&mut sim, Arc::new(RoutingTable::new()));
    assert!(matches!(
        builder.register_machine(2, 1.0, 1.5, 2),
        Err(SimError::InvalidLoadFactor(2, _))
    ));
    assert!(matches!(
        builder.register_link(1, 0, 2, 5.0, -0.1, 1.0),
        Err(SimError::InvalidLoadFactor(1, _))
    ));
    assert!(matches!(
        builder.register_switch(3, 5.0, 2.0, 1.0),
        Err(SimError::InvalidLoadFactor(3, _))
    ));
}

#[test]
fn machine_with_zero_cores_is_rejected() {
    let mut sim = new_sim();
    let mut builder = Builder::new(&mut sim, Arc::new(RoutingTable::new()));
    assert!(matches!(
        builder.register_machine(2, 1.0, 0.0, 0),
        Err(SimError::InvalidCoreCount(2))
    ));
}

#[test]
fn duplicate_registration_through_the_builder_is_rejected() {
    let mut sim = new_sim();
    let mut builder = Builder::new(&mut sim, Arc::new(RoutingTable::new()));
    builder
        .register_machine(2, 1.0, 0.0, 2)
        .expect("first registration");
    assert!(matches!(
        builder.register_link(2, 0, 4, 5.0, 0.0, 1.0),
        Err(SimError::DuplicateService(2))
    ));
    assert!(matches!(
        builder.register_master(2, SchedulerKind::RoundRobin, |_, _| {}),
        Err(SimError::DuplicateService(2))
    ));
}
