//! Deferred callbacks.
//!
//! The lens engine never blocks and never spawns threads. The only place it
//! suspends work is here: the transaction coordinator hands its flush to a
//! `Scheduler` and lets the host decide when "later" is.
//!
//! - `ManualScheduler`: a queue on a virtual clock, drained explicitly with
//!   `tick`, `advance` or `run_until_idle`. This is the default.
//! - `ImmediateScheduler`: runs every task inline. No coalescing.
//! - `Debounce`: keeps only the most recent request live, using a generation
//!   stamp plus cancellation of the previous task.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

/// Identifier of a scheduled task.
pub type TaskId = u64;

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce()>;

/// Something that can run tasks later.
pub trait Scheduler {
    /// Schedules `task` to run after `delay` ticks.
    fn schedule(&self, task: Task, delay: u32) -> TaskId;

    /// Cancels a pending task.
    ///
    /// Returns true if the task was still pending.
    fn cancel(&self, id: TaskId) -> bool;

    /// Runs all pending work, returning the number of tasks run.
    fn flush(&self) -> usize;
}

struct Pending {
    id: TaskId,
    due: u64,
    task: Task,
}

/// A task queue on a virtual clock.
///
/// Tasks run in `(due, id)` order. Nothing runs until the host calls
/// `tick`, `advance` or `run_until_idle`.
pub struct ManualScheduler {
    now: Cell<u64>,
    next_id: Cell<TaskId>,
    queue: RefCell<Vec<Pending>>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    /// Creates an empty scheduler at time 0.
    pub fn new() -> Self {
        Self {
            now: Cell::new(0),
            next_id: Cell::new(1),
            queue: RefCell::new(Vec::new()),
        }
    }

    /// Returns the current virtual time.
    #[inline]
    pub fn now(&self) -> u64 {
        self.now.get()
    }

    /// Returns the number of pending tasks.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Runs the tasks that are due now and were queued before this call.
    ///
    /// Tasks scheduled while the tick runs wait for the next tick.
    pub fn tick(&self) -> usize {
        let last_id = self.next_id.get() - 1;
        let now = self.now.get();
        self.run_while(|p| p.due <= now && p.id <= last_id, false)
    }

    /// Moves the clock forward by `ticks`, running every task that falls due
    /// on the way.
    pub fn advance(&self, ticks: u64) -> usize {
        let target = self.now.get() + ticks;
        let ran = self.run_while(|p| p.due <= target, true);
        self.now.set(target);
        ran
    }

    /// Runs tasks, advancing the clock as needed, until the queue is empty.
    ///
    /// A task that always reschedules itself makes this loop forever.
    pub fn run_until_idle(&self) -> usize {
        self.run_while(|_| true, true)
    }

    fn run_while(&self, eligible: impl Fn(&Pending) -> bool, move_clock: bool) -> usize {
        let mut ran = 0;
        loop {
            // Pick one task at a time so tasks may cancel or schedule others.
            let next = {
                let mut queue = self.queue.borrow_mut();
                let position = queue
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| eligible(p))
                    .min_by_key(|(_, p)| (p.due, p.id))
                    .map(|(i, _)| i);
                position.map(|i| queue.remove(i))
            };

            match next {
                Some(pending) => {
                    if move_clock && pending.due > self.now.get() {
                        self.now.set(pending.due);
                    }
                    (pending.task)();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, task: Task, delay: u32) -> TaskId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.queue.borrow_mut().push(Pending {
            id,
            due: self.now.get() + delay as u64,
            task,
        });
        id
    }

    fn cancel(&self, id: TaskId) -> bool {
        let mut queue = self.queue.borrow_mut();
        let before = queue.len();
        queue.retain(|p| p.id != id);
        queue.len() != before
    }

    fn flush(&self) -> usize {
        self.run_until_idle()
    }
}

/// Runs every task as soon as it is scheduled, ignoring the delay.
#[derive(Default)]
pub struct ImmediateScheduler {
    next_id: Cell<TaskId>,
}

impl ImmediateScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for ImmediateScheduler {
    fn schedule(&self, task: Task, _delay: u32) -> TaskId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        task();
        id
    }

    fn cancel(&self, _id: TaskId) -> bool {
        false
    }

    fn flush(&self) -> usize {
        0
    }
}

/// Generation stamp handed to a debounced callback.
pub struct Stamp {
    stamp: Rc<Cell<u64>>,
    generation: u64,
}

impl Stamp {
    /// Returns true while no newer request has been made.
    #[inline]
    pub fn is_current(&self) -> bool {
        self.stamp.get() == self.generation
    }

    /// The generation this callback was scheduled under.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A deferred runner where only the most recent request fires.
///
/// Every `run` bumps the generation stamp and cancels the previously
/// scheduled task. A task that still fires after being superseded (for
/// example on a scheduler that cannot cancel) sees a stale stamp and does
/// nothing.
pub struct Debounce {
    scheduler: Rc<dyn Scheduler>,
    delay: u32,
    stamp: Rc<Cell<u64>>,
    live: Cell<Option<TaskId>>,
}

impl Debounce {
    /// Creates a debounce over `scheduler` with a default delay in ticks.
    pub fn new(scheduler: Rc<dyn Scheduler>, delay: u32) -> Self {
        Self {
            scheduler,
            delay,
            stamp: Rc::new(Cell::new(0)),
            live: Cell::new(None),
        }
    }

    /// Returns the scheduler this debounce runs on.
    pub fn scheduler(&self) -> &Rc<dyn Scheduler> {
        &self.scheduler
    }

    /// Returns the current generation.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.stamp.get()
    }

    /// Schedules `f` with the default delay, superseding any pending request.
    pub fn run<F>(&self, f: F)
    where
        F: FnOnce(Stamp) + 'static,
    {
        self.run_after(f, self.delay);
    }

    /// Schedules `f` after `delay` ticks, superseding any pending request.
    pub fn run_after<F>(&self, f: F, delay: u32)
    where
        F: FnOnce(Stamp) + 'static,
    {
        let generation = self.stamp.get() + 1;
        self.stamp.set(generation);

        if let Some(previous) = self.live.take() {
            self.scheduler.cancel(previous);
        }

        let stamp = Rc::clone(&self.stamp);
        let id = self.scheduler.schedule(
            Box::new(move || {
                if stamp.get() == generation {
                    f(Stamp { stamp, generation });
                }
            }),
            delay,
        );
        self.live.set(Some(id));
    }

    /// Invalidates the pending request, if any.
    pub fn cancel(&self) {
        self.stamp.set(self.stamp.get() + 1);
        if let Some(previous) = self.live.take() {
            self.scheduler.cancel(previous);
        }
    }
}
