//! Batched watcher flushing.
//!
//! Notifications do not run watchers immediately: non-sync watchers are
//! queued, deduplicated by id, and run in creation order when [`flush`] is
//! called. The host drives the tick - call [`flush`] once per frame or after
//! a batch of mutations, and use [`next_tick`] to observe the state of the
//! world after the pending queue has drained.
//!
//! During a flush the queue stays open: watchers queued by a running watcher
//! are spliced into the live queue at their sorted position and picked up by
//! the same flush. A watcher that keeps re-queueing itself trips the circular
//! update guard after [`MAX_UPDATE_COUNT`] rounds.

use std::cell::RefCell;

use ahash::{AHashMap, AHashSet};

use crate::error::Error;
use crate::reactive::watcher::Watcher;

/// Re-queue rounds a single watcher may go through within one flush before
/// the flush aborts as a circular update.
pub const MAX_UPDATE_COUNT: usize = 100;

#[derive(Default)]
struct Scheduler {
    queue: Vec<Watcher>,
    has: AHashSet<u64>,
    circular: AHashMap<u64, usize>,
    flushing: bool,
    index: usize,
    callbacks: Vec<Box<dyn FnOnce()>>,
    flushed_hook: Option<Box<dyn FnMut()>>,
}

thread_local! {
    static SCHEDULER: RefCell<Scheduler> = RefCell::new(Scheduler::default());
}

/// Queue a watcher for the next flush.
///
/// Deduplicated by id. Outside a flush, order does not matter yet (the queue
/// is sorted when the flush starts); during a flush the watcher is inserted
/// at its id position, but never before the slot currently running.
pub fn queue_watcher(watcher: &Watcher) {
    SCHEDULER.with(|s| {
        let mut s = s.borrow_mut();
        let id = watcher.id();
        if !s.has.insert(id) {
            return;
        }
        if !s.flushing {
            s.queue.push(watcher.clone());
            return;
        }
        // s.index already points past the running watcher, so s.index is the
        // earliest legal insertion slot.
        let mut i = s.queue.len();
        while i > s.index && s.queue[i - 1].id() > id {
            i -= 1;
        }
        s.queue.insert(i, watcher.clone());
    });
}

/// Register a callback to run after the current queue has drained.
pub fn next_tick(cb: impl FnOnce() + 'static) {
    SCHEDULER.with(|s| s.borrow_mut().callbacks.push(Box::new(cb)));
}

/// Whether a flush would do any work.
pub fn needs_flush() -> bool {
    SCHEDULER.with(|s| {
        let s = s.borrow();
        !s.queue.is_empty() || !s.callbacks.is_empty()
    })
}

/// Install a hook invoked at the end of every successful flush.
pub fn set_flushed_hook(hook: impl FnMut() + 'static) {
    SCHEDULER.with(|s| s.borrow_mut().flushed_hook = Some(Box::new(hook)));
}

/// Drain the watcher queue in id order, then run [`next_tick`] callbacks.
///
/// Queue state is reset before the post-flush callbacks run and before an
/// error propagates, so a render error never wedges the scheduler.
pub fn flush() -> Result<(), Error> {
    SCHEDULER.with(|s| {
        let mut s = s.borrow_mut();
        s.flushing = true;
        s.queue.sort_by_key(Watcher::id);
    });

    let mut failure = None;
    loop {
        // Re-read the live queue each round: running a watcher may splice
        // more entries in.
        let watcher = SCHEDULER.with(|s| {
            let mut s = s.borrow_mut();
            if s.index >= s.queue.len() {
                return None;
            }
            let watcher = s.queue[s.index].clone();
            s.index += 1;
            s.has.remove(&watcher.id());
            Some(watcher)
        });
        let Some(watcher) = watcher else { break };

        watcher.run_before();
        if let Err(err) = watcher.run() {
            failure = Some(err);
            break;
        }

        let overflowed = SCHEDULER.with(|s| {
            let mut s = s.borrow_mut();
            let id = watcher.id();
            if !s.has.contains(&id) {
                return false;
            }
            let count = s.circular.entry(id).or_insert(0);
            *count += 1;
            *count > MAX_UPDATE_COUNT
        });
        if overflowed {
            tracing::warn!(
                watcher_id = watcher.id(),
                "infinite update loop detected, aborting flush"
            );
            break;
        }
    }

    let (ran_any, callbacks) = SCHEDULER.with(|s| {
        let mut s = s.borrow_mut();
        let ran_any = s.index > 0;
        s.queue.clear();
        s.has.clear();
        s.circular.clear();
        s.flushing = false;
        s.index = 0;
        (ran_any, std::mem::take(&mut s.callbacks))
    });

    if let Some(err) = failure {
        return Err(err);
    }

    // The hook is taken out of the registry while it runs so it can itself
    // call into the scheduler. It only fires when the pass ran watchers.
    let hook = if ran_any {
        SCHEDULER.with(|s| s.borrow_mut().flushed_hook.take())
    } else {
        None
    };
    if let Some(mut hook) = hook {
        hook();
        SCHEDULER.with(|s| {
            let mut s = s.borrow_mut();
            if s.flushed_hook.is_none() {
                s.flushed_hook = Some(hook);
            }
        });
    }
    for cb in callbacks {
        cb();
    }
    Ok(())
}

/// Clear all scheduler state, including pending callbacks and the post-flush
/// hook (for tests).
pub fn reset_scheduler_state() {
    SCHEDULER.with(|s| *s.borrow_mut() = Scheduler::default());
    Watcher::reset_watcher_ids();
    crate::reactive::dep::reset_dep_state();
}
