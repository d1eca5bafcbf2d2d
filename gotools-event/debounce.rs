//! Utilities for declaring an async (usually debounced) hook

use std::time::Duration;

use futures_executor::block_on;
use tokio::{
  runtime::Handle,
  sync::mpsc::{
    self,
    Sender,
    error::TrySendError,
  },
  time::Instant,
};

/// Maximum time to block when sending to a full channel.
const SEND_TIMEOUT_MS: u64 = 2;

/// Async hooks run as a background tokio task that waits for events sent
/// through a channel. Synchronous editor callbacks forward their events to
/// the hook, which can consume them immediately or debounce them until the
/// burst has quieted down.
pub trait AsyncHook: Sync + Send + 'static + Sized {
  type Event: Sync + Send + 'static;
  /// Called immediately whenever an event is received, this function can
  /// consume the event immediately or debounce it. In case of debouncing,
  /// it can either define a new debounce timeout or continue the current one
  fn handle_event(&mut self, event: Self::Event, timeout: Option<Instant>) -> Option<Instant>;

  /// Called whenever the debounce deadline is reached. Returning a new
  /// deadline reschedules the hook instead of settling it, which lets a hook
  /// wait for its own in-flight work to finish.
  fn finish_debounce(&mut self) -> Option<Instant>;

  /// Starts the hook task on `runtime`. The task ends once every sender
  /// is dropped.
  fn spawn_on(self, runtime: &Handle) -> mpsc::Sender<Self::Event> {
    let (tx, rx) = mpsc::channel(256);
    runtime.spawn(run(self, rx));
    tx
  }
}

async fn run<Hook: AsyncHook>(mut hook: Hook, mut rx: mpsc::Receiver<Hook::Event>) {
  let mut deadline = None;
  loop {
    let event = match deadline {
      Some(deadline_) => {
        let res = tokio::time::timeout_at(deadline_, rx.recv()).await;
        match res {
          Ok(event) => event,
          Err(_) => {
            deadline = hook.finish_debounce();
            continue;
          },
        }
      },
      None => rx.recv().await,
    };
    let Some(event) = event else {
      break;
    };
    deadline = hook.handle_event(event, deadline);
  }
}

/// Send an event to a channel, blocking only briefly if the channel is full.
///
/// Called from synchronous editor callbacks. A full channel blocks for at
/// most `SEND_TIMEOUT_MS` milliseconds, after which the event is dropped.
pub fn send_blocking<T>(tx: &Sender<T>, data: T) {
  match tx.try_send(data) {
    Ok(()) => {},
    Err(TrySendError::Full(data)) => {
      let _ = block_on(tx.send_timeout(data, Duration::from_millis(SEND_TIMEOUT_MS)));
    },
    Err(TrySendError::Closed(_)) => {
      log::warn!("Attempted to send to closed channel");
    },
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    atomic::{
      AtomicUsize,
      Ordering,
    },
  };

  use tokio::{
    runtime::Handle,
    time::{
      Duration,
      Instant,
      advance,
      sleep,
    },
  };

  use super::{
    AsyncHook,
    send_blocking,
  };

  const WINDOW: Duration = Duration::from_millis(500);

  struct Counter {
    attempts: Arc<AtomicUsize>,
    fired:    Arc<AtomicUsize>,
    busy_for: usize,
  }

  impl AsyncHook for Counter {
    type Event = ();

    fn handle_event(&mut self, _: (), _: Option<Instant>) -> Option<Instant> {
      Some(Instant::now() + WINDOW)
    }

    fn finish_debounce(&mut self) -> Option<Instant> {
      self.attempts.fetch_add(1, Ordering::SeqCst);
      if self.busy_for > 0 {
        self.busy_for -= 1;
        return Some(Instant::now() + WINDOW);
      }
      self.fired.fetch_add(1, Ordering::SeqCst);
      None
    }
  }

  fn counter(busy_for: usize) -> (Counter, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let attempts = Arc::new(AtomicUsize::new(0));
    let fired = Arc::new(AtomicUsize::new(0));
    let hook = Counter {
      attempts: attempts.clone(),
      fired: fired.clone(),
      busy_for,
    };
    (hook, attempts, fired)
  }

  #[tokio::test(start_paused = true)]
  async fn burst_settles_into_one_run() {
    let (hook, _, fired) = counter(0);
    let tx = hook.spawn_on(&Handle::current());

    for _ in 0..5 {
      tx.send(()).await.unwrap();
      advance(Duration::from_millis(100)).await;
    }
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    sleep(Duration::from_millis(1000)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn separated_bursts_run_separately() {
    let (hook, _, fired) = counter(0);
    let tx = hook.spawn_on(&Handle::current());

    tx.send(()).await.unwrap();
    sleep(Duration::from_millis(1000)).await;
    tx.send(()).await.unwrap();
    sleep(Duration::from_millis(1000)).await;

    assert_eq!(fired.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn busy_hook_reschedules() {
    let (hook, attempts, fired) = counter(1);
    let tx = hook.spawn_on(&Handle::current());

    tx.send(()).await.unwrap();
    sleep(Duration::from_millis(700)).await;
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    sleep(Duration::from_millis(1000)).await;
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn synchronous_callers_drive_a_runtime_they_do_not_run_on() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
      .worker_threads(1)
      .enable_time()
      .build()
      .unwrap();
    let (hook, _, fired) = counter(0);
    let tx = hook.spawn_on(runtime.handle());

    send_blocking(&tx, ());
    send_blocking(&tx, ());
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    std::thread::sleep(Duration::from_millis(900));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
  }
}
