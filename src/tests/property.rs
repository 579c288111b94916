//! Property tests: random operation sequences against the list invariants.

use super::helpers::{MockThread, SimpleRng};
use crate::clock::{ClockNode, ClockQueue};
use crate::wait::{WaitNode, WaitQueue};
use std::vec::Vec;

fn assert_non_increasing(priorities: &[u8]) {
    for pair in priorities.windows(2) {
        assert!(
            pair[0] >= pair[1],
            "wait queue out of order: {:?}",
            priorities
        );
    }
}

fn assert_non_decreasing(timestamps: &[u64]) {
    for pair in timestamps.windows(2) {
        assert!(
            pair[0] <= pair[1],
            "clock queue out of order: {:?}",
            timestamps
        );
    }
}

#[test]
fn property_wait_queue_stays_consistent_under_random_ops() {
    let mut rng = SimpleRng::new(0x5EED_0001);
    let thread_count = 16;
    let steps = 400;

    let threads: Vec<MockThread> = (0..thread_count)
        .map(|i| MockThread::new(i as u64, rng.gen_range(1, 11) as u8))
        .collect();
    let nodes: Vec<WaitNode<'_>> = threads.iter().map(|t| WaitNode::new(t)).collect();
    let queue = WaitQueue::new();

    let mut linked = 0usize;
    for _ in 0..steps {
        let idx = rng.gen_range(0, thread_count as u64) as usize;
        if nodes[idx].is_linked() {
            unsafe { queue.remove(&nodes[idx]) };
            linked -= 1;
        } else {
            unsafe { queue.add(&nodes[idx]) };
            linked += 1;
        }

        // Linkage, ring closure and the count are re-checked after every
        // mutation; the priority ordering must hold at every point too.
        queue.assert_consistent();
        assert_eq!(queue.len(), linked);
        assert_non_increasing(&queue.collect_priorities());
    }

    for node in &nodes {
        unsafe { queue.remove(node) };
    }
    assert!(queue.is_empty());
}

#[test]
fn property_remove_twice_equals_remove_once() {
    let mut rng = SimpleRng::new(0x5EED_0002);
    let thread_count = 8;

    let threads: Vec<MockThread> = (0..thread_count)
        .map(|i| MockThread::new(i as u64, rng.gen_range(1, 6) as u8))
        .collect();
    let nodes: Vec<WaitNode<'_>> = threads.iter().map(|t| WaitNode::new(t)).collect();
    let queue = WaitQueue::new();

    for node in &nodes {
        unsafe { queue.add(node) };
    }

    for _ in 0..100 {
        let idx = rng.gen_range(0, thread_count as u64) as usize;
        unsafe { queue.remove(&nodes[idx]) };

        let len_after_first = queue.len();
        let order_after_first = queue.collect_thread_ptrs();

        // The second removal must change nothing.
        unsafe { queue.remove(&nodes[idx]) };
        assert_eq!(queue.len(), len_after_first);
        assert_eq!(queue.collect_thread_ptrs(), order_after_first);
        assert!(nodes[idx].links().next_ptr().is_null());
        assert!(nodes[idx].links().prev_ptr().is_null());
        queue.assert_consistent();

        // Put it back so later rounds have something to remove.
        unsafe { queue.add(&nodes[idx]) };
    }

    for node in &nodes {
        unsafe { queue.remove(node) };
    }
}

#[test]
fn property_equal_priorities_keep_arrival_order() {
    let thread_count = 10;
    let threads: Vec<MockThread> = (0..thread_count)
        .map(|i| MockThread::new(i as u64, 7))
        .collect();
    let nodes: Vec<WaitNode<'_>> = threads.iter().map(|t| WaitNode::new(t)).collect();
    let queue = WaitQueue::new();

    for node in &nodes {
        unsafe { queue.add(node) };
    }

    let expected: Vec<*const ()> = threads
        .iter()
        .map(|t| t as *const MockThread as *const ())
        .collect();
    assert_eq!(queue.collect_thread_ptrs(), expected);

    // Waking drains in the same order the threads arrived.
    for thread in &threads {
        queue.resume_one();
        assert_eq!(thread.resume_calls(), 1);
    }
    assert!(queue.is_empty());
}

#[test]
fn property_resume_all_wakes_by_descending_priority() {
    let mut rng = SimpleRng::new(0x5EED_0003);
    let log = super::helpers::wake_log();
    let thread_count = 12usize;

    let threads: Vec<MockThread> = (0..thread_count)
        .map(|i| MockThread::with_log(i as u64, rng.gen_range(1, 9) as u8, &log))
        .collect();
    let nodes: Vec<WaitNode<'_>> = threads.iter().map(|t| WaitNode::new(t)).collect();
    let queue = WaitQueue::new();

    for node in &nodes {
        unsafe { queue.add(node) };
    }

    queue.resume_all();
    assert!(queue.is_empty());

    let woken = log.lock().clone();
    assert_eq!(woken.len(), thread_count);
    let priorities: Vec<u8> = woken
        .iter()
        .map(|&id| {
            use crate::thread::SchedThread;
            threads[id as usize].sched_priority()
        })
        .collect();
    assert_non_increasing(&priorities);
}

#[test]
fn property_clock_queue_orders_and_drains_completely() {
    let mut rng = SimpleRng::new(0x5EED_0004);
    let node_count = 12usize;

    let threads: Vec<MockThread> = (0..node_count)
        .map(|i| MockThread::new(i as u64, 5))
        .collect();
    let queue = ClockQueue::new();
    let timestamps: Vec<u64> = (0..node_count).map(|_| rng.gen_range(1, 50)).collect();
    let nodes: Vec<ClockNode<'_>> = threads
        .iter()
        .zip(&timestamps)
        .map(|(t, &ts)| ClockNode::wakeup(&queue, ts, t))
        .collect();

    for node in &nodes {
        unsafe { queue.add(node) };
        queue.assert_consistent();
        assert_non_decreasing(&queue.collect_timestamps());
    }
    assert_eq!(queue.len(), node_count);

    let now = rng.gen_range(1, 50);
    queue.check_timestamp(now);

    // Drain completeness: whatever is left is strictly in the future, and
    // exactly the nodes due by `now` fired.
    if let Some(due) = queue.next_due() {
        assert!(due > now);
    }
    for (i, &ts) in timestamps.iter().enumerate() {
        let expected = if ts <= now { 1 } else { 0 };
        assert_eq!(threads[i].resume_calls(), expected);
        assert_eq!(nodes[i].is_linked(), ts > now);
        if ts <= now {
            // Fired nodes carry the unlinked sentinel in both directions.
            assert!(nodes[i].links().next_ptr().is_null());
            assert!(nodes[i].links().prev_ptr().is_null());
        }
    }

    for node in &nodes {
        unsafe { queue.remove(node) };
    }
    assert!(queue.is_empty());
}

#[test]
fn property_equal_timestamps_fire_in_arrival_order() {
    let log = super::helpers::wake_log();
    let node_count = 6;

    let threads: Vec<MockThread> = (0..node_count)
        .map(|i| MockThread::with_log(i as u64, 5, &log))
        .collect();
    let queue = ClockQueue::new();
    let nodes: Vec<ClockNode<'_>> = threads
        .iter()
        .map(|t| ClockNode::wakeup(&queue, 40, t))
        .collect();

    for node in &nodes {
        unsafe { queue.add(node) };
    }

    queue.check_timestamp(40);
    assert!(queue.is_empty());

    let woken = log.lock().clone();
    let expected: Vec<u64> = (0..node_count as u64).collect();
    assert_eq!(woken, expected);
}
