//! 指标汇报
//!
//! 终结器输出：每个 LP 一段自由文本；可选地把指标收进共享
//! 收集器，供测试断言与 JSON 导出使用。

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::SimError;
use crate::services::{
    LinkMetrics, LpState, MachineMetrics, MasterMetrics, ServiceEvent, SwitchMetrics,
};
use crate::sim::{Sid, Simulator};

/// 按服务种类打包的指标快照。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "service", rename_all = "snake_case")]
pub enum ServiceMetrics {
    Master(MasterMetrics),
    Machine(MachineMetrics),
    Link(LinkMetrics),
    Switch(SwitchMetrics),
}

impl ServiceMetrics {
    fn of(state: &LpState) -> Self {
        match state {
            LpState::Master(m) => ServiceMetrics::Master(m.metrics),
            LpState::Machine(m) => ServiceMetrics::Machine(m.metrics),
            LpState::Link(l) => ServiceMetrics::Link(l.metrics),
            LpState::Switch(s) => ServiceMetrics::Switch(s.metrics),
        }
    }
}

/// 跨终结器共享的指标收集器。
#[derive(Debug, Default, Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<BTreeMap<Sid, ServiceMetrics>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个 LP 的最终指标。
    pub fn record(&self, sid: Sid, state: &LpState) {
        self.inner.lock().insert(sid, ServiceMetrics::of(state));
    }

    /// 给某个 LP 注册只收集、不打印的终结器。
    pub fn attach(
        &self,
        sim: &mut Simulator<LpState, ServiceEvent>,
        sid: Sid,
    ) -> Result<(), SimError> {
        let collector = self.clone();
        sim.register_finalizer(sid, Box::new(move |sid, state| collector.record(sid, state)))
    }

    /// 当前已收集的指标。
    pub fn snapshot(&self) -> BTreeMap<Sid, ServiceMetrics> {
        self.inner.lock().clone()
    }
}

/// 把一个 LP 的指标块打印到标准输出。
pub fn print_metrics(sid: Sid, state: &LpState) {
    match state {
        LpState::Master(m) => {
            let metrics = &m.metrics;
            println!(
                "Master Metrics\n \
                 - Last Activity Time: {:.6} @ LP ({sid})\n \
                 - Completed Tasks...: {} @ LP ({sid})\n",
                metrics.last_activity_time, metrics.completed_tasks
            );
        }
        LpState::Machine(m) => {
            let metrics = &m.metrics;
            println!(
                "Machine Metrics\n \
                 - Last Activity Time: {:.6} @ LP ({sid})\n \
                 - Processed MFLOPS..: {:.6} @ LP ({sid})\n \
                 - Processed Time....: {:.6} @ LP ({sid})\n \
                 - Processed Tasks...: {} @ LP ({sid})\n \
                 - Forwarded Packets.: {} @ LP ({sid})\n",
                metrics.last_activity_time,
                metrics.proc_mflops,
                metrics.proc_time,
                metrics.proc_tasks,
                metrics.forwarded_packets
            );
        }
        LpState::Link(l) => {
            let metrics = &l.metrics;
            println!(
                "Link Metrics\n \
                 - LVT..................: {:.6} @ LP ({sid})\n \
                 - Communicated Megabits: {:.6} @ LP ({sid})\n \
                 - Communicated Time....: {:.6} @ LP ({sid})\n \
                 - Communicated Tasks...: {} @ LP ({sid})\n",
                l.lvt.0, metrics.comm_mbits, metrics.comm_time, metrics.comm_tasks
            );
        }
        LpState::Switch(s) => {
            let metrics = &s.metrics;
            println!(
                "Switch Metrics\n \
                 - Last Activity Time..: {:.6} @ LP ({sid})\n \
                 - Communicated Megabits: {:.6} @ LP ({sid})\n \
                 - Communicated Time....: {:.6} @ LP ({sid})\n \
                 - Communicated Packets.: {} @ LP ({sid})\n",
                metrics.last_activity_time, metrics.comm_mbits, metrics.comm_time, metrics.comm_packets
            );
        }
    }
}

/// 注册既打印又（可选）收集的终结器。
pub fn register_reporter(
    sim: &mut Simulator<LpState, ServiceEvent>,
    sid: Sid,
    collector: Option<&MetricsCollector>,
) -> Result<(), SimError> {
    let collector = collector.cloned();
    sim.register_finalizer(
        sid,
        Box::new(move |sid, state| {
            print_metrics(sid, state);
            if let Some(c) = &collector {
                c.record(sid, state);
            }
        }),
    )
}
