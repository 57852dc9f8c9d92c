//! 仿真配置
//!
//! 定义同步模式与运行参数。

use super::time::SimTime;

/// 同步模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    /// 单优先队列，无回滚路径。
    Sequential,
    /// Time Warp 乐观并行。
    Optimistic,
}

/// 仿真运行配置。
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub mode: SimulationMode,
    /// 工作线程数；0 表示使用全部硬件并发。
    pub threads: u32,
    /// 每处理多少个事件保存一次状态快照；0 表示每个事件都存。
    pub ckpt_interval: u32,
    /// GVT 计算周期（微秒）。
    pub gvt_period_us: u64,
    /// 是否把工作线程绑定到 OS 核。
    pub core_binding: bool,
    /// LP 本地 PRNG 的种子。
    pub prng_seed: u64,
    /// 终止时间：时间戳大于它的事件不再进入队列。
    pub termination_time: Option<SimTime>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            mode: SimulationMode::Sequential,
            threads: 0,
            ckpt_interval: 0,
            gvt_period_us: 1_000,
            core_binding: false,
            prng_seed: 0,
            termination_time: None,
        }
    }
}

impl SimConfig {
    /// 实际的工作线程数。
    pub fn worker_threads(&self) -> usize {
        if self.threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            self.threads as usize
        }
    }

    /// 快照间隔（至少为 1 个事件）。
    pub(crate) fn ckpt_every(&self) -> u32 {
        self.ckpt_interval.max(1)
    }
}
