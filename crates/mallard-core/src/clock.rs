//! Reply timers
//!
//! The controller never sleeps itself. It asks a [`Scheduler`] to deliver a
//! [`ReplyTicket`] after a delay and keeps the returned handle so the timer
//! can be cancelled on teardown. The host feeds delivered tickets back into
//! `InteractionController::on_timer`.
//!
//! Two schedulers are provided: [`TokioScheduler`] for the real event loop and
//! [`ManualClock`], a logical clock that only moves when told to.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Identifies one scheduled reply. Tickets are issued in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReplyTicket(u64);

impl ReplyTicket {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// A cancellable one-shot timer.
pub trait TimerHandle {
    /// Cancel the timer. Cancelling an already fired timer does nothing.
    fn cancel(&self);
}

pub trait Scheduler {
    type Handle: TimerHandle;

    /// Arrange for `ticket` to be delivered once `delay` has elapsed.
    fn schedule(&self, delay: Duration, ticket: ReplyTicket) -> Self::Handle;
}

/// Timers backed by spawned tokio sleep tasks.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<ReplyTicket>,
}

impl TokioScheduler {
    /// Create a scheduler along with the receiver that due tickets arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReplyTicket>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[derive(Debug)]
pub struct TokioTimer {
    handle: AbortHandle,
}

impl TimerHandle for TokioTimer {
    fn cancel(&self) {
        self.handle.abort();
    }
}

impl Scheduler for TokioScheduler {
    type Handle = TokioTimer;

    fn schedule(&self, delay: Duration, ticket: ReplyTicket) -> TokioTimer {
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the app is shutting down
            let _ = tx.send(ticket);
        });
        TokioTimer {
            handle: task.abort_handle(),
        }
    }
}

#[derive(Debug, Default)]
struct ManualClockInner {
    now: Duration,
    next_id: u64,
    timers: Vec<ManualEntry>,
}

#[derive(Debug)]
struct ManualEntry {
    id: u64,
    deadline: Duration,
    ticket: ReplyTicket,
}

/// Logical clock for deterministic timing.
///
/// Time starts at zero and only moves through [`ManualClock::advance`].
/// Clones share the same clock.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    inner: Rc<RefCell<ManualClockInner>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Number of timers that have neither fired nor been cancelled.
    pub fn pending(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.inner.borrow().timers.iter().map(|t| t.deadline).min()
    }

    /// Move time forward and return the tickets that became due, earliest
    /// deadline first.
    pub fn advance(&self, by: Duration) -> Vec<ReplyTicket> {
        let mut inner = self.inner.borrow_mut();
        inner.now += by;
        let now = inner.now;

        let (mut due, waiting): (Vec<_>, Vec<_>) =
            inner.timers.drain(..).partition(|t| t.deadline <= now);
        inner.timers = waiting;

        due.sort_by_key(|t| (t.deadline, t.id));
        due.into_iter().map(|t| t.ticket).collect()
    }
}

#[derive(Debug)]
pub struct ManualTimer {
    id: u64,
    clock: Weak<RefCell<ManualClockInner>>,
}

impl TimerHandle for ManualTimer {
    fn cancel(&self) {
        if let Some(inner) = self.clock.upgrade() {
            inner.borrow_mut().timers.retain(|t| t.id != self.id);
        }
    }
}

impl Scheduler for ManualClock {
    type Handle = ManualTimer;

    fn schedule(&self, delay: Duration, ticket: ReplyTicket) -> ManualTimer {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let deadline = inner.now + delay;
        inner.timers.push(ManualEntry {
            id,
            deadline,
            ticket,
        });
        ManualTimer {
            id,
            clock: Rc::downgrade(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_fires_at_deadline() {
        let clock = ManualClock::new();
        let _timer = clock.schedule(Duration::from_millis(100), ReplyTicket::new(1));

        assert!(clock.advance(Duration::from_millis(99)).is_empty());
        assert_eq!(clock.pending(), 1);
        assert_eq!(
            clock.advance(Duration::from_millis(1)),
            vec![ReplyTicket::new(1)]
        );
        assert_eq!(clock.pending(), 0);
        assert_eq!(clock.now(), Duration::from_millis(100));
    }

    #[test]
    fn test_manual_clock_orders_by_deadline() {
        let clock = ManualClock::new();
        let _a = clock.schedule(Duration::from_millis(50), ReplyTicket::new(1));
        let _b = clock.schedule(Duration::from_millis(10), ReplyTicket::new(2));

        assert_eq!(clock.next_deadline(), Some(Duration::from_millis(10)));
        assert_eq!(
            clock.advance(Duration::from_secs(1)),
            vec![ReplyTicket::new(2), ReplyTicket::new(1)]
        );
    }

    #[test]
    fn test_manual_cancel_prevents_delivery() {
        let clock = ManualClock::new();
        let timer = clock.schedule(Duration::from_millis(10), ReplyTicket::new(1));
        timer.cancel();

        assert_eq!(clock.pending(), 0);
        assert!(clock.advance(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_cancel_after_clock_dropped_is_harmless() {
        let clock = ManualClock::new();
        let timer = clock.schedule(Duration::from_millis(10), ReplyTicket::new(1));
        drop(clock);
        timer.cancel();
    }

    #[tokio::test]
    async fn test_tokio_scheduler_delivers_ticket() {
        let (scheduler, mut rx) = TokioScheduler::new();
        let _timer = scheduler.schedule(Duration::from_millis(5), ReplyTicket::new(7));

        let got = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("ticket should arrive");
        assert_eq!(got, Some(ReplyTicket::new(7)));
    }

    #[tokio::test]
    async fn test_tokio_cancel_prevents_delivery() {
        let (scheduler, mut rx) = TokioScheduler::new();
        let timer = scheduler.schedule(Duration::from_millis(20), ReplyTicket::new(1));
        timer.cancel();

        let got = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
        assert!(got.is_err(), "cancelled timer must not deliver");
    }
}
