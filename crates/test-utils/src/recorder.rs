use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use taskpool::TaskHandle;

/// Something that happened to a recorded task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    Finished(String),
}

/// Shared, ordered log of task starts and finishes.
///
/// Tasks created through the log record `Started(name)` before their body
/// and `Finished(name)` after it, so tests can check ordering between
/// tasks. It also flags any task whose body was entered while another run
/// of the same handle was still in progress.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    events: Arc<Mutex<Vec<Event>>>,
    overlap_detected: Arc<AtomicBool>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A task that only records itself.
    pub fn task(&self, name: &str) -> TaskHandle {
        self.task_with(name, || Ok(()))
    }

    /// A task that records itself and sleeps for `delay` in between.
    pub fn sleeping_task(&self, name: &str, delay: Duration) -> TaskHandle {
        self.task_with(name, move || {
            thread::sleep(delay);
            Ok(())
        })
    }

    /// A task that records itself around `body`. `Finished` is recorded
    /// even if `body` fails.
    pub fn task_with<F>(&self, name: &str, body: F) -> TaskHandle
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let log = self.clone();
        let running = Arc::new(AtomicBool::new(false));
        let label = name.to_string();
        let name = name.to_string();

        TaskHandle::from_fn(move || {
            if running.swap(true, Ordering::SeqCst) {
                log.overlap_detected.store(true, Ordering::SeqCst);
            }
            log.push(Event::Started(name.clone()));
            let result = body();
            log.push(Event::Finished(name.clone()));
            running.store(false, Ordering::SeqCst);
            result
        })
        .with_label(label)
    }

    pub fn push(&self, event: Event) {
        self.events
            .lock()
            .expect("execution log poisoned")
            .push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .expect("execution log poisoned")
            .clone()
    }

    /// Names in the order their tasks started.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Started(name) => Some(name),
                Event::Finished(_) => None,
            })
            .collect()
    }

    /// Names in the order their tasks finished.
    pub fn finished(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Finished(name) => Some(name),
                Event::Started(_) => None,
            })
            .collect()
    }

    /// Concatenated names of finished tasks, e.g. `"aabbc"`.
    pub fn output(&self) -> String {
        self.finished().concat()
    }

    pub fn start_count(&self, name: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Started(n) if n == name))
            .count()
    }

    pub fn has_started(&self, name: &str) -> bool {
        self.start_count(name) > 0
    }

    /// `true` if `first` finished before `second` started.
    ///
    /// Both must have run; with repeated names the last finish of `first`
    /// and the first start of `second` are compared.
    pub fn finished_before_started(&self, first: &str, second: &str) -> bool {
        let events = self.events();
        let finished = events
            .iter()
            .rposition(|e| matches!(e, Event::Finished(n) if n == first));
        let started = events
            .iter()
            .position(|e| matches!(e, Event::Started(n) if n == second));
        match (finished, started) {
            (Some(f), Some(s)) => f < s,
            _ => false,
        }
    }

    /// Whether any task body was entered twice concurrently.
    pub fn overlap_detected(&self) -> bool {
        self.overlap_detected.load(Ordering::SeqCst)
    }
}
