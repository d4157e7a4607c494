/*!
 * Event Loop
 * Cooperative timer queue drained after the entry unit returns
 */

use crate::core::LoaderResult;
use crate::sandbox::script::call;
use crate::sandbox::{surface, Value};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Shortest interval period; keeps zero-delay intervals from spinning
const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub type TimerId = u64;

struct Task {
    id: TimerId,
    callback: Value,
    args: Vec<Value>,
    /// Unit that scheduled the task, for fault reporting
    origin: PathBuf,
    period: Option<Duration>,
}

#[derive(Default)]
struct Queue {
    next_id: TimerId,
    immediates: VecDeque<Task>,
    /// Keyed by due time, then scheduling order
    timers: BTreeMap<(Instant, TimerId), Task>,
}

impl Queue {
    fn allocate(&mut self) -> TimerId {
        self.next_id += 1;
        self.next_id
    }
}

enum Next {
    Run(Task),
    Wait(Duration),
    Idle,
}

/// Single-threaded cooperative scheduler
///
/// Immediates run first in FIFO order, then timers in due order. Intervals
/// are re-armed before their callback runs so the callback can clear them.
#[derive(Default)]
pub struct EventLoop {
    queue: Mutex<Queue>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_immediate(&self, callback: Value, args: Vec<Value>, origin: PathBuf) -> TimerId {
        let mut queue = self.queue.lock();
        let id = queue.allocate();
        queue.immediates.push_back(Task {
            id,
            callback,
            args,
            origin,
            period: None,
        });
        trace!(id, "Immediate scheduled");
        id
    }

    pub fn set_timeout(
        &self,
        callback: Value,
        delay: Duration,
        args: Vec<Value>,
        origin: PathBuf,
    ) -> TimerId {
        self.schedule(callback, delay, None, args, origin)
    }

    pub fn set_interval(
        &self,
        callback: Value,
        period: Duration,
        args: Vec<Value>,
        origin: PathBuf,
    ) -> TimerId {
        let period = period.max(MIN_INTERVAL);
        self.schedule(callback, period, Some(period), args, origin)
    }

    fn schedule(
        &self,
        callback: Value,
        delay: Duration,
        period: Option<Duration>,
        args: Vec<Value>,
        origin: PathBuf,
    ) -> TimerId {
        let mut queue = self.queue.lock();
        let id = queue.allocate();
        queue.timers.insert(
            (Instant::now() + delay, id),
            Task {
                id,
                callback,
                args,
                origin,
                period,
            },
        );
        trace!(id, delay_ms = delay.as_millis() as u64, "Timer scheduled");
        id
    }

    /// Cancel a pending immediate, timeout or interval; false if unknown
    pub fn cancel(&self, id: TimerId) -> bool {
        let mut queue = self.queue.lock();
        let before = queue.immediates.len() + queue.timers.len();
        queue.immediates.retain(|task| task.id != id);
        queue.timers.retain(|_, task| task.id != id);
        before != queue.immediates.len() + queue.timers.len()
    }

    pub fn pending(&self) -> usize {
        let queue = self.queue.lock();
        queue.immediates.len() + queue.timers.len()
    }

    fn next(&self) -> Next {
        let mut queue = self.queue.lock();
        if let Some(task) = queue.immediates.pop_front() {
            return Next::Run(task);
        }

        let (due, id) = match queue.timers.keys().next() {
            Some(key) => *key,
            None => return Next::Idle,
        };
        let now = Instant::now();
        if due > now {
            return Next::Wait(due - now);
        }

        match queue.timers.remove(&(due, id)) {
            Some(task) => {
                if let Some(period) = task.period {
                    queue.timers.insert(
                        (due + period, id),
                        Task {
                            id,
                            callback: task.callback.clone(),
                            args: task.args.clone(),
                            origin: task.origin.clone(),
                            period: Some(period),
                        },
                    );
                }
                Next::Run(task)
            }
            None => Next::Idle,
        }
    }

    /// Run tasks until none remain; the first callback fault stops the loop
    ///
    /// Returns the number of callbacks run.
    pub fn run(&self) -> LoaderResult<usize> {
        let mut ran = 0;
        loop {
            match self.next() {
                Next::Run(task) => {
                    trace!(id = task.id, "Running task");
                    call(&task.callback, task.args).map_err(|e| surface(e, &task.origin))?;
                    ran += 1;
                }
                Next::Wait(duration) => std::thread::sleep(duration),
                Next::Idle => break,
            }
        }
        debug!(tasks = ran, "Event loop drained");
        Ok(ran)
    }
}
