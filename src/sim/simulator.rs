//! 仿真器门面
//!
//! 登记每个 LP 的初始化器/终结器与事件分发器，按配置选择
//! 顺序或乐观引擎推进仿真。

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::SeedableRng;
use tracing::info;

use super::config::{SimConfig, SimulationMode};
use super::context::{EventContext, LpCell, LpRng};
use super::event::{Event, Sid};
use super::time::SimTime;
use super::{sequential, timewarp};
use crate::error::SimError;

/// LP 初始化器：构造 LP 状态，可向任意 LP（含自身）调度初始事件。
pub type Initializer<S, P> = Box<dyn Fn(&mut EventContext<'_, P>) -> S + Send + Sync>;

/// LP 终结器：在最后一次 GVT 扫描之后、以提交态状态调用。
pub type Finalizer<S> = Box<dyn Fn(Sid, &S) + Send + Sync>;

/// 事件分发器 `(me, now, payload, lp_state, ctx)`。
pub type Dispatcher<S, P> =
    Arc<dyn Fn(Sid, SimTime, &P, &mut S, &mut EventContext<'_, P>) + Send + Sync>;

/// 提交谓词：某 LP 的提交态快照满足谓词后记为可终止；
/// 所有 LP 都满足时仿真结束。
pub type CommitPredicate<S> = Arc<dyn Fn(Sid, &S) -> bool + Send + Sync>;

/// 仿真器：LP 注册表 + 运行配置。
pub struct Simulator<S, P> {
    config: SimConfig,
    initializers: BTreeMap<Sid, Initializer<S, P>>,
    finalizers: BTreeMap<Sid, Finalizer<S>>,
    dispatcher: Option<Dispatcher<S, P>>,
    committed: Option<CommitPredicate<S>>,
}

impl<S, P> Simulator<S, P>
where
    S: Clone + Send,
    P: Clone + Send,
{
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            initializers: BTreeMap::new(),
            finalizers: BTreeMap::new(),
            dispatcher: None,
            committed: None,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// 注册一个服务初始化器；重复的标识符是致命配置错误。
    pub fn register_service(
        &mut self,
        sid: Sid,
        initializer: Initializer<S, P>,
    ) -> Result<(), SimError> {
        if self.initializers.contains_key(&sid) {
            return Err(SimError::DuplicateService(sid));
        }
        self.initializers.insert(sid, initializer);
        Ok(())
    }

    /// 注册一个服务终结器。与初始化器不同，终结器不要求每个服务都有。
    pub fn register_finalizer(
        &mut self,
        sid: Sid,
        finalizer: Finalizer<S>,
    ) -> Result<(), SimError> {
        if self.finalizers.contains_key(&sid) {
            return Err(SimError::DuplicateService(sid));
        }
        self.finalizers.insert(sid, finalizer);
        Ok(())
    }

    pub fn set_dispatcher(&mut self, dispatcher: Dispatcher<S, P>) {
        self.dispatcher = Some(dispatcher);
    }

    pub fn set_committed(&mut self, predicate: CommitPredicate<S>) {
        self.committed = Some(predicate);
    }

    /// 执行仿真直到事件耗尽或满足终止条件，随后按标识符顺序调用终结器。
    pub fn simulate(self) -> Result<(), SimError> {
        let mode = self.config.mode;
        info!(?mode, lps = self.initializers.len(), "▶️  开始仿真");
        match mode {
            SimulationMode::Sequential => sequential::run(self),
            SimulationMode::Optimistic => timewarp::run(self),
        }
    }

    /// 校验标识符稠密性，实例化所有 LP 并收集初始事件。
    pub(crate) fn instantiate(&self) -> Result<(Vec<LpCell<S>>, Vec<Event<P>>), SimError> {
        let lp_count = self.initializers.len() as Sid;
        for sid in 0..lp_count {
            if !self.initializers.contains_key(&sid) {
                return Err(SimError::SparseServiceIds(sid));
            }
        }

        let mut cells = Vec::with_capacity(lp_count as usize);
        let mut initial = Vec::new();
        for (&sid, initializer) in &self.initializers {
            let mut rng = lp_rng(self.config.prng_seed, sid);
            let mut next_seq = 0u64;
            let mut outgoing = Vec::new();
            let state = {
                let mut ctx =
                    EventContext::new(sid, SimTime::ZERO, &mut rng, &mut next_seq, &mut outgoing);
                initializer(&mut ctx)
            };
            initial.append(&mut outgoing);
            cells.push(LpCell {
                state,
                rng,
                next_seq,
            });
        }
        Ok((cells, initial))
    }

    pub(crate) fn dispatcher(&self) -> Result<Dispatcher<S, P>, SimError> {
        self.dispatcher.clone().ok_or(SimError::MissingDispatcher)
    }

    pub(crate) fn committed(&self) -> Option<CommitPredicate<S>> {
        self.committed.clone()
    }

    /// 按标识符顺序运行终结器。没有对应 LP 的登记项直接跳过。
    pub(crate) fn finalize(&self, cells: &[LpCell<S>]) {
        for (&sid, finalizer) in &self.finalizers {
            if let Some(cell) = cells.get(sid as usize) {
                finalizer(sid, &cell.state);
            }
        }
    }

    /// 时间戳超过终止时间的事件不进入队列；两种引擎同样裁剪，
    /// 以保持跨模式结果一致。
    pub(crate) fn within_horizon(&self, time: SimTime) -> bool {
        match self.config.termination_time {
            Some(t) => time <= t,
            None => true,
        }
    }
}

/// 由全局种子与 LP 标识符派生 LP 本地 PRNG。
fn lp_rng(seed: u64, sid: Sid) -> LpRng {
    LpRng::seed_from_u64(seed ^ u64::from(sid).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}
