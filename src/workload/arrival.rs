//! 到达过程
//!
//! 推进任务到达时间戳的分布：固定间隔或泊松（指数间隔）。

use rand::Rng;

use crate::sim::{LpRng, SimTime};

/// 任务间隔到达过程。每次调用把时间戳向后推一个间隔。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArrivalProcess {
    /// 固定偏移；`Fixed(0.0)` 表示全部任务同刻到达。
    Fixed(f64),
    /// 泊松到达：间隔服从均值为 `mean` 的指数分布。
    Poisson { mean: f64 },
}

impl ArrivalProcess {
    /// 就地推进到达时间。随机抽样一律使用 LP 本地 PRNG，
    /// 保证回滚重放结果一致。
    pub fn advance(&self, rng: &mut LpRng, t: &mut SimTime) {
        match self {
            ArrivalProcess::Fixed(offset) => *t = t.after(*offset),
            ArrivalProcess::Poisson { mean } => {
                let u: f64 = rng.gen();
                *t = t.after(-mean * (1.0 - u).ln());
            }
        }
    }
}
