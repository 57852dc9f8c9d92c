//! 顺序引擎
//!
//! 单优先队列，按 `(时间戳, 发送者, 序号)` 键弹出并分发，不走回滚路径。

use std::collections::BinaryHeap;

use tracing::{debug, info, trace};

use super::context::EventContext;
use super::event::ScheduledEvent;
use super::simulator::Simulator;
use crate::error::SimError;

pub(crate) fn run<S, P>(sim: Simulator<S, P>) -> Result<(), SimError>
where
    S: Clone + Send,
    P: Clone + Send,
{
    let dispatcher = sim.dispatcher()?;
    let dispatch = dispatcher.as_ref();
    let committed = sim.committed();
    let (mut cells, initial) = sim.instantiate()?;

    let mut q = BinaryHeap::new();
    for ev in initial {
        if sim.within_horizon(ev.key.time) {
            q.push(ScheduledEvent(ev));
        }
    }

    // 提交谓词是粘性的：LP 一旦满足就保持满足。
    let mut can_end = vec![false; cells.len()];
    let mut ended = 0usize;

    let mut event_count = 0u64;
    let mut now = super::time::SimTime::ZERO;

    while let Some(ScheduledEvent(ev)) = q.pop() {
        event_count += 1;
        now = ev.key.time;
        trace!(
            receiver = ev.receiver,
            time = now.0,
            seq = ev.key.seq,
            "分发事件"
        );

        let cell = &mut cells[ev.receiver as usize];
        let mut outgoing = Vec::new();
        {
            let mut ctx = EventContext::new(
                ev.receiver,
                now,
                &mut cell.rng,
                &mut cell.next_seq,
                &mut outgoing,
            );
            dispatch(ev.receiver, now, &ev.payload, &mut cell.state, &mut ctx);
        }
        for out in outgoing {
            if sim.within_horizon(out.key.time) {
                q.push(ScheduledEvent(out));
            }
        }

        if let Some(pred) = &committed {
            let idx = ev.receiver as usize;
            if !can_end[idx] && pred.as_ref()(ev.receiver, &cells[idx].state) {
                can_end[idx] = true;
                ended += 1;
                debug!(lp = ev.receiver, "LP 满足提交谓词");
                if ended == cells.len() {
                    break;
                }
            }
        }
    }

    info!(
        total_events = event_count,
        final_time = now.0,
        "✅ 顺序仿真完成"
    );

    sim.finalize(&cells);
    Ok(())
}
