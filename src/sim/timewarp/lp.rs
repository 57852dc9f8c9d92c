//! 单个 LP 的 Time Warp 运行时
//!
//! 输入队列按事件键升序存放（含已处理项，供滑行重放）；
//! 输出队列记录已发送事件的指纹，回滚时据此发出反消息；
//! 快照栈按检查点间隔保存整束 LP 状态。

use tracing::{debug, trace};

use crate::sim::context::{EventContext, LpCell};
use crate::sim::event::{Event, EventKey, Message, Sid};
use crate::sim::simulator::Dispatcher;
use crate::sim::time::SimTime;

/// 输入队列条目。回滚不会移除条目，只把 `processed` 翻回未处理。
#[derive(Debug, Clone)]
pub(crate) struct InputEntry<P> {
    pub(crate) key: EventKey,
    pub(crate) payload: P,
    pub(crate) processed: bool,
}

/// 输出队列条目：`send_key` 是发送时正在处理的事件键，
/// `msg_key` 是所发事件自身的键（反消息的匹配指纹）。
#[derive(Debug, Clone, Copy)]
pub(crate) struct OutputEntry {
    pub(crate) send_key: EventKey,
    pub(crate) msg_key: EventKey,
    pub(crate) receiver: Sid,
}

pub(crate) struct Lp<S, P> {
    pub(crate) id: Sid,
    pub(crate) cell: LpCell<S>,
    pub(crate) input: Vec<InputEntry<P>>,
    pub(crate) output: Vec<OutputEntry>,
    /// `(事件键, 该事件处理完后的整束状态)`；`None` 键是初始快照。
    pub(crate) snapshots: Vec<(Option<EventKey>, LpCell<S>)>,
    /// 最近一次（推测）处理的事件键。
    pub(crate) lvt: Option<EventKey>,
    /// 滑行上界：键小于它的重放不再发送（原件仍然有效在途）。
    coast_until: Option<EventKey>,
    events_since_ckpt: u32,
    pub(crate) rollbacks: u64,
}

impl<S, P> Lp<S, P>
where
    S: Clone,
    P: Clone,
{
    pub(crate) fn new(id: Sid, cell: LpCell<S>) -> Self {
        let initial = cell.clone();
        Self {
            id,
            cell,
            input: Vec::new(),
            output: Vec::new(),
            snapshots: vec![(None, initial)],
            lvt: None,
            coast_until: None,
            events_since_ckpt: 0,
            rollbacks: 0,
        }
    }

    /// 接收一个正事件。若它是迟到者（键不大于 LVT），先回滚。
    pub(crate) fn insert_event(&mut self, ev: Event<P>, antis: &mut Vec<Message<P>>) {
        let key = ev.key;
        let pos = match self.input.binary_search_by(|e| e.key.cmp(&key)) {
            Err(pos) => pos,
            Ok(_) => panic!("duplicate event key delivered to LP {}", self.id),
        };
        self.input.insert(
            pos,
            InputEntry {
                key,
                payload: ev.payload,
                processed: false,
            },
        );
        if Some(key) <= self.lvt {
            trace!(lp = self.id, time = key.time.0, "迟到事件，回滚");
            self.rollback(key, antis);
        }
    }

    /// 接收一个反消息并湮灭其孪生正事件。
    ///
    /// 孪生未处理时是纯粹的湮灭；已处理时先回滚到它的键再移除。
    pub(crate) fn cancel(&mut self, key: EventKey, antis: &mut Vec<Message<P>>) {
        let pos = self
            .input
            .binary_search_by(|e| e.key.cmp(&key))
            .unwrap_or_else(|_| {
                panic!("anti-message without a positive twin at LP {}", self.id)
            });
        if self.input[pos].processed {
            trace!(lp = self.id, time = key.time.0, "撤销已处理事件，回滚");
            self.rollback(key, antis);
        }
        let pos = self
            .input
            .binary_search_by(|e| e.key.cmp(&key))
            .expect("twin survived rollback");
        self.input.remove(pos);
    }

    /// 回滚到 `target` 之前：
    /// 1. 为发送键不小于 `target` 的输出条目发出反消息并移除；
    /// 2. 恢复键严格小于 `target` 的最新快照，丢弃其后的快照；
    /// 3. 把快照之后的输入条目翻回未处理，进入滑行区间。
    fn rollback(&mut self, target: EventKey, antis: &mut Vec<Message<P>>) {
        self.rollbacks += 1;

        self.output.retain(|entry| {
            if entry.send_key >= target {
                antis.push(Message::Anti {
                    receiver: entry.receiver,
                    key: entry.msg_key,
                });
                false
            } else {
                true
            }
        });

        let idx = self
            .snapshots
            .iter()
            .rposition(|(k, _)| match k {
                None => true,
                Some(k) => *k < target,
            })
            .expect("no snapshot below rollback target");
        self.snapshots.truncate(idx + 1);
        let (restore_key, cell) = &self.snapshots[idx];
        let restore_key = *restore_key;
        self.cell = cell.clone();

        for entry in &mut self.input {
            if Some(entry.key) > restore_key {
                entry.processed = false;
            }
        }

        debug!(
            lp = self.id,
            target = target.time.0,
            restored = restore_key.map(|k| k.time.0),
            "回滚完成"
        );

        self.lvt = restore_key;
        self.coast_until = Some(target);
        self.events_since_ckpt = 0;
    }

    /// 推测处理下一个未处理事件；没有则返回 false。
    ///
    /// 滑行区间内的重放只复原状态，不重复发送；
    /// 正常处理把出站事件计入输出队列并交给 `out` 投递。
    pub(crate) fn process_next(
        &mut self,
        dispatcher: &Dispatcher<S, P>,
        ckpt_every: u32,
        horizon: Option<SimTime>,
        out: &mut Vec<Message<P>>,
    ) -> bool {
        let Some(idx) = self.input.iter().position(|e| !e.processed) else {
            return false;
        };
        let key = self.input[idx].key;
        debug_assert!(
            Some(key) > self.lvt,
            "unprocessed event at or below LVT escaped rollback"
        );
        let payload = self.input[idx].payload.clone();
        self.input[idx].processed = true;

        let coasting = match self.coast_until {
            Some(c) => key < c,
            None => false,
        };
        if !coasting {
            self.coast_until = None;
        }

        let mut outgoing = Vec::new();
        {
            let dispatch = dispatcher.as_ref();
            let mut ctx = EventContext::new(
                self.id,
                key.time,
                &mut self.cell.rng,
                &mut self.cell.next_seq,
                &mut outgoing,
            );
            dispatch(self.id, key.time, &payload, &mut self.cell.state, &mut ctx);
        }
        self.lvt = Some(key);

        if coasting {
            // 重放的发送与在途原件逐字节一致，丢弃副本即可。
            outgoing.clear();
        } else {
            for ev in outgoing {
                if let Some(h) = horizon {
                    if ev.key.time > h {
                        continue;
                    }
                }
                self.output.push(OutputEntry {
                    send_key: key,
                    msg_key: ev.key,
                    receiver: ev.receiver,
                });
                out.push(Message::Event(ev));
            }
        }

        self.events_since_ckpt += 1;
        if self.events_since_ckpt >= ckpt_every {
            self.snapshots.push((Some(key), self.cell.clone()));
            self.events_since_ckpt = 0;
        }
        true
    }

    /// 最早未处理事件的时间戳，GVT 取所有 LP 的最小值。
    pub(crate) fn min_unprocessed_time(&self) -> Option<SimTime> {
        self.input
            .iter()
            .find(|e| !e.processed)
            .map(|e| e.key.time)
    }

    /// 化石回收：保留时间严格小于 GVT 的最新快照作为恢复地板，
    /// 丢弃更早的快照、地板之前的输入条目和已提交的输出条目。
    pub(crate) fn fossil_collect(&mut self, gvt: SimTime) {
        let floor = self
            .snapshots
            .iter()
            .rposition(|(k, _)| match k {
                None => true,
                Some(k) => k.time < gvt,
            })
            .expect("snapshot floor missing");
        self.snapshots.drain(..floor);

        let floor_key = self.snapshots[0].0;
        self.input.retain(|e| Some(e.key) > floor_key);
        self.output.retain(|o| o.send_key.time >= gvt);
    }

    /// 提交态状态（恢复地板上的快照）。
    pub(crate) fn committed_state(&self) -> &S {
        &self.snapshots[0].1.state
    }
}
