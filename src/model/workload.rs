//! 负载注入
//!
//! 把预生成的任务流直接投给主控（主控按 `JustGenerated` 分支调度），
//! 与主控自有负载（经 `SchedulerInit` 派发）互为补充。

use crate::math::szudzik;
use crate::routing::RouteDescriptor;
use crate::services::{ServiceEvent, Task, TaskEvent};
use crate::sim::{EventContext, Sid, SimTime};

/// 向主控注入 `task_amount` 个定常任务。
///
/// `jittered` 为假时全部任务在 0.0 时刻到达；为真时第 i 个任务比
/// 前一个晚 `1e-52`——名义上仍是同刻到达，但按生成顺序严格排序。
pub fn inject_constant(
    ctx: &mut EventContext<'_, ServiceEvent>,
    master_id: Sid,
    proc_size: f64,
    comm_size: f64,
    task_amount: u32,
    jittered: bool,
) {
    let mut arrival = SimTime::ZERO;
    for i in 0..task_amount {
        let task = Task::new(szudzik(i, master_id), master_id, proc_size, comm_size);
        ctx.schedule_event(
            master_id,
            arrival,
            ServiceEvent::TaskArrival(TaskEvent {
                task,
                route: RouteDescriptor::local(master_id),
            }),
        );
        if jittered {
            arrival = arrival.after(1e-52);
        }
    }
}
