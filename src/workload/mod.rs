//! 工作负载生成
//!
//! 主控持有的任务流：给出每个任务的处理量/通信量并推进到达时间。
//! 负载对象属于主控 LP 状态的一部分，随快照保存、随回滚恢复。

mod arrival;

use std::fmt::Debug;

use rand::Rng;

use crate::sim::{LpRng, SimTime};

pub use arrival::ArrivalProcess;

/// 任务流。`clone_box` 让 `Box<dyn Workload>` 可随 LP 状态克隆进快照。
pub trait Workload: Debug + Send {
    /// 取下一个任务的 `(处理量, 通信量)` 并消耗一份剩余额度。
    fn next_task(&mut self, rng: &mut LpRng) -> (f64, f64);

    /// 剩余任务数。
    fn remaining(&self) -> u32;

    /// 按到达过程推进时间戳。
    fn set_arrival_time(&mut self, rng: &mut LpRng, t: &mut SimTime);

    fn clone_box(&self) -> Box<dyn Workload>;

    fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }
}

impl Clone for Box<dyn Workload> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// 定常负载：所有任务的处理量与通信量相同。
#[derive(Debug, Clone)]
pub struct ConstantWorkload {
    remaining: u32,
    proc_size: f64,
    comm_size: f64,
    arrival: ArrivalProcess,
}

impl ConstantWorkload {
    pub fn new(task_amount: u32, proc_size: f64, comm_size: f64, arrival: ArrivalProcess) -> Self {
        Self {
            remaining: task_amount,
            proc_size,
            comm_size,
            arrival,
        }
    }
}

impl Workload for ConstantWorkload {
    fn next_task(&mut self, _rng: &mut LpRng) -> (f64, f64) {
        self.remaining = self.remaining.saturating_sub(1);
        (self.proc_size, self.comm_size)
    }

    fn remaining(&self) -> u32 {
        self.remaining
    }

    fn set_arrival_time(&mut self, rng: &mut LpRng, t: &mut SimTime) {
        self.arrival.advance(rng, t);
    }

    fn clone_box(&self) -> Box<dyn Workload> {
        Box::new(self.clone())
    }
}

/// 均匀随机负载：处理量与通信量各自独立地落在给定区间内。
#[derive(Debug, Clone)]
pub struct UniformRandomWorkload {
    remaining: u32,
    min_proc: f64,
    max_proc: f64,
    min_comm: f64,
    max_comm: f64,
    arrival: ArrivalProcess,
}

impl UniformRandomWorkload {
    pub fn new(
        task_amount: u32,
        min_proc: f64,
        max_proc: f64,
        min_comm: f64,
        max_comm: f64,
        arrival: ArrivalProcess,
    ) -> Self {
        Self {
            remaining: task_amount,
            min_proc,
            max_proc,
            min_comm,
            max_comm,
            arrival,
        }
    }
}

impl Workload for UniformRandomWorkload {
    fn next_task(&mut self, rng: &mut LpRng) -> (f64, f64) {
        self.remaining = self.remaining.saturating_sub(1);
        let u: f64 = rng.gen();
        let proc = u * (self.max_proc - self.min_proc) + self.min_proc;
        let u: f64 = rng.gen();
        let comm = u * (self.max_comm - self.min_comm) + self.min_comm;
        (proc, comm)
    }

    fn remaining(&self) -> u32 {
        self.remaining
    }

    fn set_arrival_time(&mut self, rng: &mut LpRng, t: &mut SimTime) {
        self.arrival.advance(rng, t);
    }

    fn clone_box(&self) -> Box<dyn Workload> {
        Box::new(self.clone())
    }
}
