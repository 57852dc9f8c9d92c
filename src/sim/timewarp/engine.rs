//! Time Warp 工作线程池与 GVT
//!
//! LP 按下标静态划分给工作线程；发送是同步的邮箱插入（一次只持有
//! 一把 LP 锁），因此在 GVT 屏障处不存在在途消息，
//! `GVT = 所有 LP 最早未处理事件时间的最小值`。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Barrier;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, trace};

use super::lp::Lp;
use crate::error::SimError;
use crate::sim::config::SimConfig;
use crate::sim::event::{Message, Sid};
use crate::sim::simulator::{CommitPredicate, Dispatcher, Simulator};
use crate::sim::time::SimTime;

/// 每把 LP 锁一次最多连续处理的事件数。
const BATCH: usize = 32;

struct Shared<S, P> {
    lps: Vec<Mutex<Lp<S, P>>>,
    dispatcher: Dispatcher<S, P>,
    barrier: Barrier,
    gvt_requested: AtomicBool,
    done: AtomicBool,
    ckpt_every: u32,
    horizon: Option<SimTime>,
}

pub(crate) fn run<S, P>(sim: Simulator<S, P>) -> Result<(), SimError>
where
    S: Clone + Send,
    P: Clone + Send,
{
    let dispatcher = sim.dispatcher()?;
    let committed = sim.committed();
    let config = sim.config().clone();
    let (cells, initial) = sim.instantiate()?;
    let lp_count = cells.len();
    if lp_count == 0 {
        sim.finalize(&[]);
        return Ok(());
    }

    let lps: Vec<Mutex<Lp<S, P>>> = cells
        .into_iter()
        .enumerate()
        .map(|(sid, cell)| Mutex::new(Lp::new(sid as Sid, cell)))
        .collect();

    // 初始事件入队。此刻尚无已处理事件，不可能触发回滚。
    {
        let mut cascade = Vec::new();
        for ev in initial {
            if sim.within_horizon(ev.key.time) {
                lps[ev.receiver as usize].lock().insert_event(ev, &mut cascade);
            }
        }
        debug_assert!(cascade.is_empty());
    }

    let workers = config.worker_threads().min(lp_count);
    let shared = Shared {
        lps,
        dispatcher,
        barrier: Barrier::new(workers + 1),
        gvt_requested: AtomicBool::new(false),
        done: AtomicBool::new(false),
        ckpt_every: config.ckpt_every(),
        horizon: config.termination_time,
    };

    info!(workers, lps = lp_count, "启动 Time Warp 工作线程");

    std::thread::scope(|scope| {
        for w in 0..workers {
            let shared = &shared;
            let core_binding = config.core_binding;
            scope.spawn(move || worker_loop(w, workers, core_binding, shared));
        }
        controller_loop(&shared, &config, committed.as_ref(), lp_count);
    });

    let mut total_rollbacks = 0u64;
    let cells_out: Vec<_> = shared
        .lps
        .into_iter()
        .map(|m| {
            let lp = m.into_inner();
            total_rollbacks += lp.rollbacks;
            lp.cell
        })
        .collect();
    info!(total_rollbacks, "✅ 乐观仿真完成");

    sim.finalize(&cells_out);
    Ok(())
}

fn worker_loop<S, P>(worker: usize, workers: usize, core_binding: bool, shared: &Shared<S, P>)
where
    S: Clone + Send,
    P: Clone + Send,
{
    if core_binding {
        if let Some(cores) = core_affinity::get_core_ids() {
            if !cores.is_empty() {
                let core = cores[worker % cores.len()];
                core_affinity::set_for_current(core);
                trace!(worker, core = core.id, "线程绑核");
            }
        }
    }

    let my_lps: Vec<usize> = (0..shared.lps.len())
        .filter(|i| i % workers == worker)
        .collect();
    let mut cascade: Vec<Message<P>> = Vec::new();

    loop {
        if shared.gvt_requested.load(Ordering::Acquire) {
            shared.barrier.wait();
            shared.barrier.wait();
            if shared.done.load(Ordering::Acquire) {
                break;
            }
            continue;
        }

        let mut did_work = false;
        for &i in &my_lps {
            {
                let mut lp = shared.lps[i].lock();
                for _ in 0..BATCH {
                    if lp.process_next(
                        &shared.dispatcher,
                        shared.ckpt_every,
                        shared.horizon,
                        &mut cascade,
                    ) {
                        did_work = true;
                    } else {
                        break;
                    }
                }
            }
            // 锁已释放，逐条投递；回滚产生的反消息追加到同一工作表。
            while let Some(msg) = cascade.pop() {
                deliver(shared, msg, &mut cascade);
            }
        }

        if !did_work {
            std::thread::sleep(Duration::from_micros(50));
        }
    }
}

/// 投递一条消息。一次只持有一把 LP 锁，不会死锁；
/// 级联回滚通过工作表迭代消化。
fn deliver<S, P>(shared: &Shared<S, P>, msg: Message<P>, cascade: &mut Vec<Message<P>>)
where
    S: Clone + Send,
    P: Clone + Send,
{
    match msg {
        Message::Event(ev) => {
            shared.lps[ev.receiver as usize]
                .lock()
                .insert_event(ev, cascade);
        }
        Message::Anti { receiver, key } => {
            shared.lps[receiver as usize].lock().cancel(key, cascade);
        }
    }
}

fn controller_loop<S, P>(
    shared: &Shared<S, P>,
    config: &SimConfig,
    committed: Option<&CommitPredicate<S>>,
    lp_count: usize,
) where
    S: Clone + Send,
    P: Clone + Send,
{
    let period = Duration::from_micros(config.gvt_period_us.max(1));
    let mut can_end = vec![false; lp_count];

    loop {
        std::thread::sleep(period);

        shared.gvt_requested.store(true, Ordering::Release);
        shared.barrier.wait();
        // 所有工作线程静止且工作表已排空：没有在途消息。

        let mut gvt = f64::INFINITY;
        for lp in &shared.lps {
            if let Some(t) = lp.lock().min_unprocessed_time() {
                gvt = gvt.min(t.0);
            }
        }

        let mut done = gvt == f64::INFINITY;
        if !done {
            for lp in &shared.lps {
                lp.lock().fossil_collect(SimTime(gvt));
            }
            if let Some(pred) = committed {
                let pred = pred.as_ref();
                let mut ended = 0usize;
                for (i, lp) in shared.lps.iter().enumerate() {
                    if !can_end[i] && pred(i as Sid, lp.lock().committed_state()) {
                        can_end[i] = true;
                    }
                    if can_end[i] {
                        ended += 1;
                    }
                }
                if ended == lp_count {
                    done = true;
                }
            }
        }

        debug!(gvt, done, "GVT 扫描");

        shared.done.store(done, Ordering::Release);
        shared.gvt_requested.store(false, Ordering::Release);
        shared.barrier.wait();

        if done {
            break;
        }
    }
}
