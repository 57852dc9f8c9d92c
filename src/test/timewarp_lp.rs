use crate::sim::timewarp::Lp;
use crate::sim::{Dispatcher, Event, EventKey, LpCell, LpRng, Message, SimTime, Sid};
use rand::SeedableRng;
use std::sync::Arc;

type Log = Vec<(f64, u32)>;

fn key(time: f64, sender: Sid, seq: u64) -> EventKey {
    EventKey {
        time: SimTime(time),
        sender,
        seq,
    }
}

fn event(receiver: Sid, key: EventKey, payload: u32) -> Event<u32> {
    Event {
        key,
        receiver,
        payload,
    }
}

fn new_lp(id: Sid) -> Lp<Log, u32> {
    Lp::new(
        id,
        LpCell {
            state: Vec::new(),
            rng: LpRng::seed_from_u64(0),
            next_seq: 0,
        },
    )
}

fn recording() -> Dispatcher<Log, u32> {
    Arc::new(|_me, now, payload, state, _ctx| state.push((now.0, *payload)))
}

/// Records and also sends a copy to LP 7, one second later.
fn forwarding() -> Dispatcher<Log, u32> {
    Arc::new(|_me, now, payload, state, ctx| {
        state.push((now.0, *payload));
        ctx.schedule_event(7, SimTime(now.0 + 1.0), *payload);
    })
}

fn drain(lp: &mut Lp<Log, u32>, dispatcher: &Dispatcher<Log, u32>, out: &mut Vec<Message<u32>>) {
    while lp.process_next(dispatcher, 1, None, out) {}
}

#[test]
fn events_process_in_key_order_and_snapshots_accumulate() {
    let mut lp = new_lp(3);
    let dispatcher = recording();
    let mut out = Vec::new();

    lp.insert_event(event(3, key(2.0, 9, 1), 20), &mut out);
    lp.insert_event(event(3, key(1.0, 9, 0), 10), &mut out);
    drain(&mut lp, &dispatcher, &mut out);

    assert_eq!(lp.cell.state, vec![(1.0, 10), (2.0, 20)]);
    assert_eq!(lp.snapshots.len(), 3); // initial + one per event
    assert_eq!(lp.lvt, Some(key(2.0, 9, 1)));
    assert!(out.is_empty());
}

#[test]
fn straggler_restores_a_snapshot_and_replays() {
    let mut lp = new_lp(3);
    let dispatcher = recording();
    let mut out = Vec::new();

    lp.insert_event(event(3, key(1.0, 9, 0), 10), &mut out);
    lp.insert_event(event(3, key(2.0, 9, 1), 20), &mut out);
    drain(&mut lp, &dispatcher, &mut out);

    lp.insert_event(event(3, key(1.5, 8, 0), 15), &mut out);
    assert_eq!(lp.rollbacks, 1);
    assert_eq!(lp.cell.state, vec![(1.0, 10)]);
    assert_eq!(lp.lvt, Some(key(1.0, 9, 0)));
    assert!(out.is_empty(), "no sends were made, so no anti-messages");

    drain(&mut lp, &dispatcher, &mut out);
    assert_eq!(lp.cell.state, vec![(1.0, 10), (1.5, 15), (2.0, 20)]);
}

#[test]
fn rollback_emits_anti_messages_for_later_sends() {
    let mut lp = new_lp(3);
    let dispatcher = forwarding();
    let mut out = Vec::new();

    lp.insert_event(event(3, key(1.0, 9, 0), 10), &mut out);
    lp.insert_event(event(3, key(2.0, 9, 1), 20), &mut out);
    drain(&mut lp, &dispatcher, &mut out);
    assert_eq!(out.len(), 2, "one send per processed event");
    out.clear();

    lp.insert_event(event(3, key(1.5, 8, 0), 15), &mut out);
    // The send made while processing t=2.0 must be cancelled; the t=1.0 one stays.
    assert_eq!(out.len(), 1);
    match &out[0] {
        Message::Anti { receiver: 7, key } => assert_eq!(key.time, SimTime(3.0)),
        other => panic!("expected an anti-message to LP 7, got {other:?}"),
    }
    out.clear();

    // Replay: the straggler and the rolled-back event both send again.
    drain(&mut lp, &dispatcher, &mut out);
    assert_eq!(lp.cell.state, vec![(1.0, 10), (1.5, 15), (2.0, 20)]);
    let times: Vec<f64> = out
        .iter()
        .map(|m| match m {
            Message::Event(ev) => ev.key.time.0,
            other => panic!("expected positive events, got {other:?}"),
        })
        .collect();
    assert_eq!(times, vec![2.5, 3.0]);
}

#[test]
fn cancelling_an_unprocessed_event_is_a_no_op() {
    let mut lp = new_lp(3);
    let mut out = Vec::new();

    lp.insert_event(event(3, key(5.0, 9, 0), 50), &mut out);
    lp.cancel(key(5.0, 9, 0), &mut out);

    assert!(lp.input.is_empty());
    assert!(out.is_empty());
    assert_eq!(lp.rollbacks, 0);
}

#[test]
fn cancelling_a_processed_event_rolls_back_past_it() {
    let mut lp = new_lp(3);
    let dispatcher = recording();
    let mut out = Vec::new();

    lp.insert_event(event(3, key(1.0, 9, 0), 10), &mut out);
    lp.insert_event(event(3, key(2.0, 9, 1), 20), &mut out);
    drain(&mut lp, &dispatcher, &mut out);

    lp.cancel(key(2.0, 9, 1), &mut out);
    assert_eq!(lp.rollbacks, 1);
    assert_eq!(lp.cell.state, vec![(1.0, 10)]);

    // The cancelled event is gone for good.
    drain(&mut lp, &dispatcher, &mut out);
    assert_eq!(lp.cell.state, vec![(1.0, 10)]);
}

#[test]
fn fossil_collection_keeps_the_restore_floor() {
    let mut lp = new_lp(3);
    let dispatcher = recording();
    let mut out = Vec::new();

    for (i, t) in [1.0, 2.0, 3.0].into_iter().enumerate() {
        lp.insert_event(event(3, key(t, 9, i as u64), (t * 10.0) as u32), &mut out);
    }
    drain(&mut lp, &dispatcher, &mut out);
    assert_eq!(lp.snapshots.len(), 4);

    lp.fossil_collect(SimTime(2.5));

    // Newest snapshot below GVT survives as the restore floor.
    assert_eq!(lp.snapshots.len(), 2);
    assert_eq!(lp.snapshots[0].0, Some(key(2.0, 9, 1)));
    // Input entries at or below the floor are gone; the one after it stays.
    assert_eq!(lp.input.len(), 1);
    assert_eq!(lp.input[0].key, key(3.0, 9, 2));
}
