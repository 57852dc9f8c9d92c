//! 机器服务
//!
//! 多核处理资源：每个核维护一个释放时刻，任务总是落到最早空闲的核上。

use serde::Serialize;
use tracing::trace;

use super::{forward_packet, ServiceEvent, TaskEvent};
use crate::routing::{RouteDescriptor, RoutingTable};
use crate::sim::{EventContext, Sid, SimTime};

/// 返程游标的推进方式。
///
/// 完工回执直接发给 `previous`（送达的那条链路），所以游标要指向
/// 返程中该链路的下一条链路：`SkipLink` 减二。`NextHop` 减一是
/// 对称直觉下的另一种解读，会让游标停在刚走过的链路上。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnOffset {
    #[default]
    SkipLink,
    NextHop,
}

impl ReturnOffset {
    fn adjustment(self) -> i64 {
        match self {
            ReturnOffset::SkipLink => 2,
            ReturnOffset::NextHop => 1,
        }
    }
}

/// 机器指标。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MachineMetrics {
    pub last_activity_time: f64,
    pub proc_mflops: f64,
    pub proc_time: f64,
    pub proc_tasks: u64,
    /// 收到但目的不是自己、被转发出去的包数。
    pub forwarded_packets: u64,
}

#[derive(Debug, Clone)]
pub struct Machine {
    id: Sid,
    power_per_core: f64,
    load_factor: f64,
    core_free_time: Vec<SimTime>,
    return_offset: ReturnOffset,
    pub metrics: MachineMetrics,
}

impl Machine {
    /// `power` 是整机算力（megaflops/s），均分到各核。
    pub fn new(
        id: Sid,
        power: f64,
        load_factor: f64,
        cores: u32,
        return_offset: ReturnOffset,
    ) -> Self {
        Self {
            id,
            power_per_core: power / f64::from(cores),
            load_factor,
            core_free_time: vec![SimTime::ZERO; cores as usize],
            return_offset,
            metrics: MachineMetrics::default(),
        }
    }

    pub fn id(&self) -> Sid {
        self.id
    }

    /// 处理给定处理量所需的时间（秒）。
    fn time_to_process(&self, proc_size: f64) -> f64 {
        proc_size / ((1.0 - self.load_factor) * self.power_per_core)
    }

    /// 最早空闲的核：释放时刻最小，并列取最小下标。
    fn least_core(&self) -> (usize, SimTime) {
        let mut core = 0;
        let mut least = self.core_free_time[0];
        for (i, &t) in self.core_free_time.iter().enumerate().skip(1) {
            if t < least {
                least = t;
                core = i;
            }
        }
        (core, least)
    }

    pub fn on_task_arrival(
        &mut self,
        now: SimTime,
        ev: &TaskEvent,
        routing: &RoutingTable,
        ctx: &mut EventContext<'_, ServiceEvent>,
    ) {
        self.metrics.last_activity_time = now.0;

        // 目的不是自己：沿路由转发。
        if ev.route.dst != self.id {
            self.metrics.forwarded_packets += 1;
            forward_packet(self.id, now, ev, routing, ctx);
            return;
        }

        let proc_size = ev.task.proc_size;
        let proc_time = self.time_to_process(proc_size);

        self.metrics.proc_mflops += proc_size;
        self.metrics.proc_time += proc_time;
        self.metrics.proc_tasks += 1;

        let (core, free_at) = self.least_core();
        let waiting_time = (free_at.0 - now.0).max(0.0);
        let departure_time = now.after(waiting_time + proc_time);
        self.core_free_time[core] = departure_time;

        trace!(
            machine = self.id,
            tid = ev.task.tid,
            core,
            departure = departure_time.0,
            "执行任务"
        );

        // 完工回执发回送达的链路，沿原路返回源主控。
        let descriptor = RouteDescriptor {
            src: ev.route.src,
            dst: ev.route.dst,
            previous: self.id,
            offset: ev.route.offset - self.return_offset.adjustment(),
            forward: false,
        };
        ctx.schedule_event(
            ev.route.previous,
            departure_time,
            ServiceEvent::TaskArrival(TaskEvent {
                task: ev.task.processed(),
                route: descriptor,
            }),
        );
    }
}
