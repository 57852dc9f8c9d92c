//! 模型构建器
//!
//! 减少搭建模型的样板：按种类注册服务、做配置校验，并把
//! 服务分发器和路由表绑进仿真器。

use std::sync::Arc;

use tracing::debug;

use crate::error::SimError;
use crate::routing::RoutingTable;
use crate::scheduler::RoundRobin;
use crate::services::{self, Link, LpState, Machine, Master, ReturnOffset, ServiceEvent, Switch};
use crate::sim::{Dispatcher, EventContext, Sid, Simulator};

/// 可用的主控调度算法。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerKind {
    RoundRobin,
}

/// 模型构建器。构造时安装服务分发器。
pub struct Builder<'a> {
    simulator: &'a mut Simulator<LpState, ServiceEvent>,
    routing: Arc<RoutingTable>,
    return_offset: ReturnOffset,
}

impl<'a> Builder<'a> {
    pub fn new(
        simulator: &'a mut Simulator<LpState, ServiceEvent>,
        routing: Arc<RoutingTable>,
    ) -> Self {
        let table = Arc::clone(&routing);
        let dispatcher: Dispatcher<LpState, ServiceEvent> =
            Arc::new(move |me, now, payload, state, ctx| {
                services::dispatch(&table, me, now, payload, state, ctx)
            });
        simulator.set_dispatcher(dispatcher);
        Self {
            simulator,
            routing,
            return_offset: ReturnOffset::default(),
        }
    }

    /// 切换返程游标的推进方式（见 `ReturnOffset`）。
    /// 只影响在此之后注册的机器。
    pub fn return_offset(&mut self, mode: ReturnOffset) -> &mut Self {
        self.return_offset = mode;
        self
    }

    pub fn routing(&self) -> &Arc<RoutingTable> {
        &self.routing
    }

    /// 注册主控。`callback` 在主控初始化后调用，可登记从机、
    /// 设置负载并向自己调度 `SchedulerInit` 事件。
    pub fn register_master(
        &mut self,
        master_id: Sid,
        scheduler: SchedulerKind,
        callback: impl Fn(&mut Master, &mut EventContext<'_, ServiceEvent>) + Send + Sync + 'static,
    ) -> Result<(), SimError> {
        debug!(master_id, ?scheduler, "注册主控");
        self.simulator.register_service(
            master_id,
            Box::new(move |ctx| {
                let scheduler = match scheduler {
                    SchedulerKind::RoundRobin => Box::new(RoundRobin::new()),
                };
                let mut master = Master::new(master_id, scheduler);
                callback(&mut master, ctx);
                LpState::Master(master)
            }),
        )
    }

    /// 注册机器。算力必须为正，负载因子落在 [0, 1]，核数为正。
    pub fn register_machine(
        &mut self,
        machine_id: Sid,
        power: f64,
        load_factor: f64,
        cores: u32,
    ) -> Result<(), SimError> {
        if power <= 0.0 {
            return Err(SimError::InvalidPower(machine_id, power));
        }
        if !(0.0..=1.0).contains(&load_factor) {
            return Err(SimError::InvalidLoadFactor(machine_id, load_factor));
        }
        if cores == 0 {
            return Err(SimError::InvalidCoreCount(machine_id));
        }
        debug!(machine_id, power, load_factor, cores, "注册机器");
        let return_offset = self.return_offset;
        self.simulator.register_service(
            machine_id,
            Box::new(move |_ctx| {
                LpState::Machine(Machine::new(
                    machine_id,
                    power,
                    load_factor,
                    cores,
                    return_offset,
                ))
            }),
        )
    }

    /// 注册链路，连接 `from` 与 `to` 两个服务。
    pub fn register_link(
        &mut self,
        link_id: Sid,
        from: Sid,
        to: Sid,
        bandwidth: f64,
        load_factor: f64,
        latency: f64,
    ) -> Result<(), SimError> {
        if !(0.0..=1.0).contains(&load_factor) {
            return Err(SimError::InvalidLoadFactor(link_id, load_factor));
        }
        debug!(link_id, from, to, bandwidth, latency, "注册链路");
        self.simulator.register_service(
            link_id,
            Box::new(move |_ctx| {
                LpState::Link(Link::new(link_id, from, to, bandwidth, load_factor, latency))
            }),
        )
    }

    /// 注册交换机。
    pub fn register_switch(
        &mut self,
        switch_id: Sid,
        bandwidth: f64,
        load_factor: f64,
        latency: f64,
    ) -> Result<(), SimError> {
        if !(0.0..=1.0).contains(&load_factor) {
            return Err(SimError::InvalidLoadFactor(switch_id, load_factor));
        }
        debug!(switch_id, bandwidth, latency, "注册交换机");
        self.simulator.register_service(
            switch_id,
            Box::new(move |_ctx| {
                LpState::Switch(Switch::new(switch_id, bandwidth, load_factor, latency))
            }),
        )
    }
}
