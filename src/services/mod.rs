//! 服务协议
//!
//! LP 状态用带标签的变体表示（主控/机器/链路/交换机），
//! 由单个 `match` 分发事件；所有状态都可克隆，运行时据此做快照。

mod link;
mod machine;
mod master;
mod switch;
mod task;

use tracing::instrument;

use crate::routing::{RouteDescriptor, RoutingTable};
use crate::sim::{EventContext, Sid, SimTime};

pub use link::{Link, LinkMetrics};
pub use machine::{Machine, MachineMetrics, ReturnOffset};
pub use master::{Master, MasterMetrics};
pub use switch::{Switch, SwitchMetrics};
pub use task::{Task, TaskCompletionState};

/// 用户事件负载：携带任务与路由游标。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskEvent {
    pub task: Task,
    pub route: RouteDescriptor,
}

/// 服务事件种类。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ServiceEvent {
    /// `TASK_ARRIVAL`：任务（或其完工回执）抵达。
    TaskArrival(TaskEvent),
    /// `TASK_SCHEDULER_INIT`：主控就绪，初始化其调度算法。
    SchedulerInit,
}

/// 一个 LP 的业务状态。
#[derive(Debug, Clone)]
pub enum LpState {
    Master(Master),
    Machine(Machine),
    Link(Link),
    Switch(Switch),
}

impl LpState {
    fn kind_name(&self) -> &'static str {
        match self {
            LpState::Master(_) => "master",
            LpState::Machine(_) => "machine",
            LpState::Link(_) => "link",
            LpState::Switch(_) => "switch",
        }
    }
}

/// 事件分发器：把负载交给对应服务的处理函数。
///
/// 服务种类处理不了的事件说明模型已不可信，直接终止。
#[instrument(level = "trace", skip_all, fields(lp = me, time = now.0))]
pub fn dispatch(
    routing: &RoutingTable,
    me: Sid,
    now: SimTime,
    payload: &ServiceEvent,
    state: &mut LpState,
    ctx: &mut EventContext<'_, ServiceEvent>,
) {
    match (state, payload) {
        (LpState::Master(m), ServiceEvent::TaskArrival(ev)) => {
            m.on_task_arrival(now, ev, routing, ctx)
        }
        (LpState::Master(m), ServiceEvent::SchedulerInit) => m.on_scheduler_init(now, routing, ctx),
        (LpState::Machine(m), ServiceEvent::TaskArrival(ev)) => {
            m.on_task_arrival(now, ev, routing, ctx)
        }
        (LpState::Link(l), ServiceEvent::TaskArrival(ev)) => l.on_task_arrival(now, ev, ctx),
        (LpState::Switch(s), ServiceEvent::TaskArrival(ev)) => {
            s.on_task_arrival(now, ev, routing, ctx)
        }
        (state, ServiceEvent::SchedulerInit) => {
            panic!(
                "unknown event kind SchedulerInit for LP {me} ({})",
                state.kind_name()
            )
        }
    }
}

/// 转发节点共用的一步推进：投递给 `route[offset]`，
/// 新游标按方向加减一，`previous` 记为自己。
pub(crate) fn forward_packet(
    me: Sid,
    at: SimTime,
    ev: &TaskEvent,
    routing: &RoutingTable,
    ctx: &mut EventContext<'_, ServiceEvent>,
) {
    let route = routing.lookup(ev.route.src, ev.route.dst);
    let (hop, descriptor) = ev.route.advanced(me);
    let next = route.hop(hop);
    ctx.schedule_event(
        next,
        at,
        ServiceEvent::TaskArrival(TaskEvent {
            task: ev.task,
            route: descriptor,
        }),
    );
}
