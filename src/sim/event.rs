//! 事件类型
//!
//! 定义事件值对象、事件全序键与正/反消息。

use std::cmp::Ordering;

use super::time::SimTime;

/// 服务标识符：从 0 开始的稠密非负整数，命名一个逻辑进程（LP）。
pub type Sid = u32;

/// 事件全序键 `(时间戳, 发送者, 发送者序号)`。
///
/// 序号由发送者的单调计数器生成（计数器属于 LP 状态，回滚时一起恢复），
/// 因此同一时间戳的事件在顺序模式与乐观模式下排序一致，
/// 也为反消息提供了逐发送者的唯一指纹。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventKey {
    pub time: SimTime,
    pub sender: Sid,
    pub seq: u64,
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then(self.sender.cmp(&other.sender))
            .then(self.seq.cmp(&other.seq))
    }
}

/// 事件：按值复制进接收方邮箱，不做跨 LP 共享。
#[derive(Debug, Clone)]
pub struct Event<P> {
    pub key: EventKey,
    pub receiver: Sid,
    pub payload: P,
}

/// 在途消息：正事件或撤销其孪生正事件的反消息。
///
/// 反消息按 `(sender, seq)`（键里自带）与孪生事件匹配：
/// 孪生尚未处理则原地湮灭，已处理则触发接收方回滚。
#[derive(Debug, Clone)]
pub enum Message<P> {
    Event(Event<P>),
    Anti { receiver: Sid, key: EventKey },
}

/// 顺序引擎堆元素。
///
/// BinaryHeap 是 max-heap；需要最小键优先，因此反向比较。
pub(crate) struct ScheduledEvent<P>(pub(crate) Event<P>);

impl<P> Ord for ScheduledEvent<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.key.cmp(&other.0.key).reverse()
    }
}

impl<P> PartialOrd for ScheduledEvent<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P> PartialEq for ScheduledEvent<P> {
    fn eq(&self, other: &Self) -> bool {
        self.0.key == other.0.key
    }
}

impl<P> Eq for ScheduledEvent<P> {}
