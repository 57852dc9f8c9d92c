//! 链路服务
//!
//! 连接两个服务的单服务台 FIFO 队列。链路不查路由表：
//! 它认识自己的两端，把包递给 `previous` 之外的那一端。

use serde::Serialize;
use tracing::trace;

use super::{ServiceEvent, TaskEvent};
use crate::sim::{EventContext, Sid, SimTime};

/// 链路指标。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LinkMetrics {
    pub comm_mbits: f64,
    pub comm_time: f64,
    pub comm_tasks: u64,
}

#[derive(Debug, Clone)]
pub struct Link {
    id: Sid,
    from: Sid,
    to: Sid,
    bandwidth: f64,
    load_factor: f64,
    latency: f64,
    available_time: SimTime,
    pub lvt: SimTime,
    pub metrics: LinkMetrics,
}

impl Link {
    pub fn new(
        id: Sid,
        from: Sid,
        to: Sid,
        bandwidth: f64,
        load_factor: f64,
        latency: f64,
    ) -> Self {
        Self {
            id,
            from,
            to,
            bandwidth,
            load_factor,
            latency,
            available_time: SimTime::ZERO,
            lvt: SimTime::ZERO,
            metrics: LinkMetrics::default(),
        }
    }

    pub fn id(&self) -> Sid {
        self.id
    }

    /// 传输给定通信量所需的时间（秒）。
    fn time_to_communicate(&self, comm_size: f64) -> f64 {
        self.latency + comm_size / ((1.0 - self.load_factor) * self.bandwidth)
    }

    pub fn on_task_arrival(
        &mut self,
        now: SimTime,
        ev: &TaskEvent,
        ctx: &mut EventContext<'_, ServiceEvent>,
    ) {
        let comm_size = ev.task.comm_size;
        let comm_time = self.time_to_communicate(comm_size);

        let waiting_time = (self.available_time.0 - now.0).max(0.0);
        let departure_time = now.after(waiting_time + comm_time);

        self.available_time = departure_time;
        self.metrics.comm_mbits += comm_size;
        self.metrics.comm_time += comm_time;
        self.metrics.comm_tasks += 1;
        self.lvt = departure_time;

        // 按来向选择去向；两端都对不上说明拓扑配置坏了。
        let next = if ev.route.previous == self.from {
            self.to
        } else if ev.route.previous == self.to {
            self.from
        } else {
            panic!(
                "link {}: previous service {} matches neither endpoint ({}, {})",
                self.id, ev.route.previous, self.from, self.to
            );
        };

        trace!(
            link = self.id,
            tid = ev.task.tid,
            next,
            departure = departure_time.0,
            "传输任务"
        );

        ctx.schedule_event(
            next,
            departure_time,
            ServiceEvent::TaskArrival(TaskEvent {
                task: ev.task,
                route: ev.route.relayed(self.id),
            }),
        );
    }
}
