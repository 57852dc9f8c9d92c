//! 主控服务
//!
//! 持有调度器与可选的工作负载，负责任务派发与完成计数。
//! 任务途经的其它主控只是转发节点。

use serde::Serialize;
use tracing::trace;

use super::{forward_packet, ServiceEvent, TaskCompletionState, TaskEvent};
use crate::routing::RoutingTable;
use crate::scheduler::Scheduler;
use crate::sim::{EventContext, Sid, SimTime};
use crate::workload::Workload;

/// 主控指标。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MasterMetrics {
    pub last_activity_time: f64,
    /// 回到家的自家任务数：等于收到的 `origin == self` 的完工回执数。
    pub completed_tasks: u64,
}

#[derive(Debug, Clone)]
pub struct Master {
    id: Sid,
    scheduler: Box<dyn Scheduler>,
    slaves: Vec<Sid>,
    workload: Option<Box<dyn Workload>>,
    pub metrics: MasterMetrics,
}

impl Master {
    pub fn new(id: Sid, scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            id,
            scheduler,
            slaves: Vec::new(),
            workload: None,
            metrics: MasterMetrics::default(),
        }
    }

    pub fn id(&self) -> Sid {
        self.id
    }

    /// 登记一个从机，同时告知调度器。
    pub fn add_slave(&mut self, slave: Sid) {
        self.slaves.push(slave);
        self.scheduler.add_resource(slave);
    }

    pub fn slaves(&self) -> &[Sid] {
        &self.slaves
    }

    pub fn set_workload(&mut self, workload: Box<dyn Workload>) {
        self.workload = Some(workload);
    }

    /// `TASK_SCHEDULER_INIT`：委托调度器派发初始任务。
    pub fn on_scheduler_init(
        &mut self,
        now: SimTime,
        routing: &RoutingTable,
        ctx: &mut EventContext<'_, ServiceEvent>,
    ) {
        self.scheduler
            .on_init(now, self.id, &mut self.workload, routing, ctx);
    }

    pub fn on_task_arrival(
        &mut self,
        now: SimTime,
        ev: &TaskEvent,
        routing: &RoutingTable,
        ctx: &mut EventContext<'_, ServiceEvent>,
    ) {
        self.metrics.last_activity_time = now.0;

        match ev.task.completion_state {
            TaskCompletionState::Processed => {
                if ev.task.origin == self.id {
                    // 自家任务回到家：计数，并向调度器要下一个。
                    self.metrics.completed_tasks += 1;
                    let slave = ev.route.dst;
                    trace!(
                        master = self.id,
                        tid = ev.task.tid,
                        slave,
                        completed = self.metrics.completed_tasks,
                        "任务完成"
                    );
                    self.scheduler.on_completed_task(
                        now,
                        slave,
                        &ev.task,
                        self.id,
                        &mut self.workload,
                        routing,
                        ctx,
                    );
                } else {
                    // 别家的完工任务：继续沿返程路由转发。
                    forward_packet(self.id, now, ev, routing, ctx);
                }
            }
            TaskCompletionState::JustGenerated => {
                if ev.route.dst != self.id {
                    // 去程途经的主控只是转发节点。
                    forward_packet(self.id, now, ev, routing, ctx);
                } else {
                    // 自家负载注入的新任务（本地游标的目的就是自己）。
                    self.dispatch_generated(now, ev, routing, ctx);
                }
            }
        }
    }

    /// 刚从负载注入的新任务：挑一个从机，向路由第一跳发出。
    fn dispatch_generated(
        &mut self,
        now: SimTime,
        ev: &TaskEvent,
        routing: &RoutingTable,
        ctx: &mut EventContext<'_, ServiceEvent>,
    ) {
        let slave = self.scheduler.schedule();
        let route = routing.lookup(self.id, slave);
        trace!(master = self.id, tid = ev.task.tid, slave, "调度新任务");
        ctx.schedule_event(
            route.first(),
            now,
            ServiceEvent::TaskArrival(TaskEvent {
                task: ev.task,
                route: crate::routing::RouteDescriptor::outbound(self.id, slave),
            }),
        );
    }
}
