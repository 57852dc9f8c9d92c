//! 事件上下文
//!
//! 处理函数通过它调度新事件、访问 LP 本地 PRNG。

use rand_chacha::ChaCha8Rng;

use super::event::{Event, EventKey, Sid};
use super::time::SimTime;

/// LP 本地伪随机数发生器。
///
/// 属于 LP 状态的一部分：随快照保存、随回滚恢复，保证重放完全一致。
pub type LpRng = ChaCha8Rng;

/// 事件处理上下文。
///
/// 出站事件先缓存在这里，等处理函数返回后由引擎投递；
/// 这样发送方在处理事件期间不持有任何其它 LP 的锁。
pub struct EventContext<'a, P> {
    me: Sid,
    now: SimTime,
    rng: &'a mut LpRng,
    next_seq: &'a mut u64,
    outgoing: &'a mut Vec<Event<P>>,
}

impl<'a, P> EventContext<'a, P> {
    pub(crate) fn new(
        me: Sid,
        now: SimTime,
        rng: &'a mut LpRng,
        next_seq: &'a mut u64,
        outgoing: &'a mut Vec<Event<P>>,
    ) -> Self {
        Self {
            me,
            now,
            rng,
            next_seq,
            outgoing,
        }
    }

    /// 当前 LP 的标识符。
    pub fn me(&self) -> Sid {
        self.me
    }

    /// 当前仿真时间。
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// LP 本地 PRNG。
    pub fn rng(&mut self) -> &mut LpRng {
        self.rng
    }

    /// 向 `receiver` 调度一个时间戳为 `time` 的事件。
    ///
    /// 允许 `receiver == me`（给自己的未来投递）。时间戳不得早于当前时间。
    pub fn schedule_event(&mut self, receiver: Sid, time: SimTime, payload: P) {
        debug_assert!(
            time >= self.now,
            "event scheduled into the past: {:?} < {:?}",
            time,
            self.now
        );
        let key = EventKey {
            time,
            sender: self.me,
            seq: *self.next_seq,
        };
        *self.next_seq += 1;
        self.outgoing.push(Event {
            key,
            receiver,
            payload,
        });
    }
}

/// 单个 LP 携带的运行时状态束：业务状态 + PRNG + 发送序号。
///
/// 快照即整束克隆，回滚即整束替换。
#[derive(Debug, Clone)]
pub(crate) struct LpCell<S> {
    pub(crate) state: S,
    pub(crate) rng: LpRng,
    pub(crate) next_seq: u64,
}
