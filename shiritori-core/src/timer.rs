use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;

/// Called every second with the remaining time.
pub type TickFn = Arc<dyn Fn(u32) + Send + Sync>;
/// Called exactly once when the countdown reaches zero.
pub type ExpiredFn = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct TimerState {
    time_limit: u32,
    left: u32,
    generation: u64,
    cancel: Option<oneshot::Sender<()>>,
}

struct TimerInner {
    state: Mutex<TimerState>,
    on_tick: TickFn,
    on_expired: ExpiredFn,
}

/// Per-room turn countdown. A single driver task ticks at 1 s cadence;
/// `reset` rewinds the countdown, `stop` cancels the driver and is safe to
/// call more than once.
pub struct TurnTimer {
    inner: Arc<TimerInner>,
}

impl TurnTimer {
    pub fn new(on_tick: TickFn, on_expired: ExpiredFn) -> Self {
        Self {
            inner: Arc::new(TimerInner {
                state: Mutex::new(TimerState::default()),
                on_tick,
                on_expired,
            }),
        }
    }

    /// Begins the countdown. A non-positive limit leaves the timer idle.
    /// Any previous driver is cancelled.
    pub fn start(&self, time_limit: u32) {
        let mut state = self.inner.state.lock().expect("timer lock poisoned");
        stop_locked(&mut state);
        state.time_limit = time_limit;
        if time_limit == 0 {
            return;
        }
        state.left = time_limit;
        state.generation += 1;

        let (tx, rx) = oneshot::channel();
        state.cancel = Some(tx);
        tokio::spawn(run(self.inner.clone(), state.generation, rx));
    }

    /// Rewinds the countdown to the configured limit.
    pub fn reset(&self) {
        let mut state = self.inner.state.lock().expect("timer lock poisoned");
        if state.time_limit > 0 {
            state.left = state.time_limit;
        }
    }

    /// Cancels the running driver. Idempotent.
    pub fn stop(&self) {
        let mut state = self.inner.state.lock().expect("timer lock poisoned");
        stop_locked(&mut state);
    }

    /// Remaining seconds.
    pub fn time_left(&self) -> u32 {
        self.inner.state.lock().expect("timer lock poisoned").left
    }
}

fn stop_locked(state: &mut TimerState) {
    // Dropping the sender wakes the driver's cancel branch.
    state.cancel = None;
    state.generation += 1;
}

async fn run(inner: Arc<TimerInner>, generation: u64, mut cancel: oneshot::Receiver<()>) {
    let start = tokio::time::Instant::now() + Duration::from_secs(1);
    let mut interval = tokio::time::interval_at(start, Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = &mut cancel => return,
            _ = interval.tick() => {
                let left = {
                    let mut state = inner.state.lock().expect("timer lock poisoned");
                    if state.generation != generation {
                        return;
                    }
                    state.left = state.left.saturating_sub(1);
                    if state.left == 0 {
                        state.cancel = None;
                    }
                    state.left
                };
                if left == 0 {
                    (inner.on_expired)();
                    return;
                }
                (inner.on_tick)(left);
            }
        }
    }
}
