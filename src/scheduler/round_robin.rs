//! 轮转调度
//!
//! 资源放在数组里，游标每次前进一格并对资源数取模。

use tracing::trace;

use super::Scheduler;
use crate::math::szudzik;
use crate::routing::{RouteDescriptor, RoutingTable};
use crate::services::{ServiceEvent, Task, TaskEvent};
use crate::sim::{EventContext, Sid, SimTime};
use crate::workload::Workload;

#[derive(Debug, Clone, Default)]
pub struct RoundRobin {
    resources: Vec<Sid>,
    next_resource: usize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从负载取一个任务并派发给下一个从机。
    ///
    /// 任务标识符用派发前的剩余计数与主控标识符做 Szudzik 配对，
    /// 对单个主控单调递减、全局无碰撞。
    fn dispatch_next(
        &mut self,
        master_id: Sid,
        workload: &mut Box<dyn Workload>,
        arrival: &mut SimTime,
        routing: &RoutingTable,
        ctx: &mut EventContext<'_, ServiceEvent>,
    ) {
        let tid = szudzik(workload.remaining(), master_id);
        let (proc_size, comm_size) = workload.next_task(ctx.rng());
        workload.set_arrival_time(ctx.rng(), arrival);

        let slave = self.schedule();
        let route = routing.lookup(master_id, slave);
        let task = Task::new(tid, master_id, proc_size, comm_size);

        trace!(master = master_id, slave, tid, at = arrival.0, "派发任务");

        ctx.schedule_event(
            route.first(),
            *arrival,
            ServiceEvent::TaskArrival(TaskEvent {
                task,
                route: RouteDescriptor::outbound(master_id, slave),
            }),
        );
    }
}

impl Scheduler for RoundRobin {
    fn add_resource(&mut self, slave: Sid) {
        self.resources.push(slave);
    }

    fn schedule(&mut self) -> Sid {
        assert!(
            !self.resources.is_empty(),
            "round-robin scheduler has no resources"
        );
        let resource = self.resources[self.next_resource];
        self.next_resource = (self.next_resource + 1) % self.resources.len();
        resource
    }

    fn on_init(
        &mut self,
        now: SimTime,
        master_id: Sid,
        workload: &mut Option<Box<dyn Workload>>,
        routing: &RoutingTable,
        ctx: &mut EventContext<'_, ServiceEvent>,
    ) {
        // 没有负载的主控只调度转手任务，不需要派发初始任务。
        let Some(workload) = workload.as_mut() else {
            return;
        };

        let mut arrival = now;
        for _ in 0..self.resources.len() {
            if !workload.has_remaining() {
                return;
            }
            self.dispatch_next(master_id, workload, &mut arrival, routing, ctx);
        }
    }

    fn on_completed_task(
        &mut self,
        now: SimTime,
        _slave: Sid,
        _task: &Task,
        master_id: Sid,
        workload: &mut Option<Box<dyn Workload>>,
        routing: &RoutingTable,
        ctx: &mut EventContext<'_, ServiceEvent>,
    ) {
        let Some(workload) = workload.as_mut() else {
            return;
        };
        if !workload.has_remaining() {
            return;
        }
        let mut arrival = now;
        self.dispatch_next(master_id, workload, &mut arrival, routing, ctx);
    }

    fn clone_box(&self) -> Box<dyn Scheduler> {
        Box::new(self.clone())
    }
}
