//! 从机调度策略
//!
//! 主控通过调度器决定下一个任务派给哪个从机。游标等策略状态
//! 属于主控 LP 状态，随检查点保存、随回滚恢复。

mod round_robin;

use std::fmt::Debug;

use crate::routing::RoutingTable;
use crate::services::{ServiceEvent, Task};
use crate::sim::{EventContext, Sid, SimTime};
use crate::workload::Workload;

pub use round_robin::RoundRobin;

/// 调度策略接口。
///
/// `on_init` 在主控就绪后调用一次，为每个从机（最多从机数个）
/// 派发初始任务；`on_completed_task` 在主控收到自家任务的完成
/// 回执时调用，负载还有余量就派发下一个。
pub trait Scheduler: Debug + Send {
    /// 把一个从机加入资源池。
    fn add_resource(&mut self, slave: Sid);

    /// 返回下一个要派发的从机。
    fn schedule(&mut self) -> Sid;

    fn on_init(
        &mut self,
        now: SimTime,
        master_id: Sid,
        workload: &mut Option<Box<dyn Workload>>,
        routing: &RoutingTable,
        ctx: &mut EventContext<'_, ServiceEvent>,
    );

    fn on_completed_task(
        &mut self,
        now: SimTime,
        slave: Sid,
        task: &Task,
        master_id: Sid,
        workload: &mut Option<Box<dyn Workload>>,
        routing: &RoutingTable,
        ctx: &mut EventContext<'_, ServiceEvent>,
    );

    fn clone_box(&self) -> Box<dyn Scheduler>;
}

impl Clone for Box<dyn Scheduler> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
