//! 交换机服务
//!
//! 多端口的带宽队列。与链路不同，交换机按事件携带的路由游标
//! 决定下一跳，两个方向用同一条推进规则。

use serde::Serialize;
use tracing::trace;

use super::{forward_packet, ServiceEvent, TaskEvent};
use crate::routing::RoutingTable;
use crate::sim::{EventContext, Sid, SimTime};

/// 交换机指标。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SwitchMetrics {
    pub last_activity_time: f64,
    pub comm_mbits: f64,
    pub comm_time: f64,
    pub comm_packets: u64,
}

#[derive(Debug, Clone)]
pub struct Switch {
    id: Sid,
    bandwidth: f64,
    load_factor: f64,
    latency: f64,
    available_time: SimTime,
    pub metrics: SwitchMetrics,
}

impl Switch {
    pub fn new(id: Sid, bandwidth: f64, load_factor: f64, latency: f64) -> Self {
        Self {
            id,
            bandwidth,
            load_factor,
            latency,
            available_time: SimTime::ZERO,
            metrics: SwitchMetrics::default(),
        }
    }

    pub fn id(&self) -> Sid {
        self.id
    }

    fn time_to_communicate(&self, comm_size: f64) -> f64 {
        self.latency + comm_size / ((1.0 - self.load_factor) * self.bandwidth)
    }

    pub fn on_task_arrival(
        &mut self,
        now: SimTime,
        ev: &TaskEvent,
        routing: &RoutingTable,
        ctx: &mut EventContext<'_, ServiceEvent>,
    ) {
        let comm_size = ev.task.comm_size;
        let comm_time = self.time_to_communicate(comm_size);

        let waiting_time = (self.available_time.0 - now.0).max(0.0);
        let departure_time = now.after(waiting_time + comm_time);

        self.available_time = departure_time;
        self.metrics.last_activity_time = departure_time.0;
        self.metrics.comm_mbits += comm_size;
        self.metrics.comm_time += comm_time;
        self.metrics.comm_packets += 1;

        trace!(
            switch = self.id,
            tid = ev.task.tid,
            departure = departure_time.0,
            "交换任务"
        );

        forward_packet(self.id, departure_time, ev, routing, ctx);
    }
}
