//! 任务类型
//!
//! 任务是处理资源的最小工作单元：处理量（megaflops）+ 通信量（megabits）。

use crate::sim::Sid;

/// 任务完成状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCompletionState {
    /// 刚生成，尚未被任何机器执行。
    JustGenerated,
    /// 已执行完毕，正沿原路返回源主控。
    Processed,
}

/// 任务：不可变值对象，随事件复制。
///
/// `tid` 由 Szudzik 配对 `(工作负载计数, 主控标识符)` 生成，全局唯一。
/// `origin` 是最早发出该任务的主控，整个旅程保持不变：
/// 途中的主控据此判断该把任务继续转发还是计入自己的完成数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Task {
    pub tid: u64,
    pub origin: Sid,
    pub proc_size: f64,
    pub comm_size: f64,
    pub completion_state: TaskCompletionState,
}

impl Task {
    /// 新生成的任务。
    pub fn new(tid: u64, origin: Sid, proc_size: f64, comm_size: f64) -> Self {
        Self {
            tid,
            origin,
            proc_size,
            comm_size,
            completion_state: TaskCompletionState::JustGenerated,
        }
    }

    /// 同一任务的已处理副本。
    pub fn processed(self) -> Self {
        Self {
            completion_state: TaskCompletionState::Processed,
            ..self
        }
    }
}
