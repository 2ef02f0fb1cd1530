// SPDX-License-Identifier: MIT
//
// Bounded event queue with cancellation.
//
// Producers (the backend's input thread, application threads) push into a
// bounded FIFO; the application pulls. A single stop signal, raised by
// `stop()`, wakes every blocked consumer and producer at once. Stopping
// is one-way: after it, every poll returns `None` and every post fails.
//
// The stop signal is a channel whose only sender is dropped on stop, so
// `select!` sees a disconnected receiver and all waiters unblock together.
//
// A producer that cannot go on (its input source hit end of file or
// failed) calls `close()` instead: posts are refused from then on, the
// consumer drains what is already buffered, and the queue stops when the
// last event is taken.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, select};

use crate::error::{Error, Result};
use crate::event::Event;

/// Default number of events buffered before posts start failing.
pub const DEFAULT_CAPACITY: usize = 10;

/// Cloneable handle to a shared event queue.
#[derive(Clone)]
pub struct EventQueue {
    inner: Arc<Inner>,
}

struct Inner {
    tx: Sender<Event>,
    rx: Receiver<Event>,
    stop_tx: Mutex<Option<Sender<()>>>,
    stop_rx: Receiver<()>,
    stopped: AtomicBool,
    closing: AtomicBool,
}

impl EventQueue {
    /// Create a queue holding at most `capacity` pending events.
    ///
    /// A capacity of zero is bumped to one; a rendezvous queue would make
    /// non-blocking posts always fail.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        let (stop_tx, stop_rx) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                tx,
                rx,
                stop_tx: Mutex::new(Some(stop_tx)),
                stop_rx,
                stopped: AtomicBool::new(false),
                closing: AtomicBool::new(false),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.tx.capacity().unwrap_or(DEFAULT_CAPACITY)
    }

    /// Number of events currently buffered.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.rx.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.rx.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    /// Block until an event arrives or the queue is stopped.
    ///
    /// Returns `None` once stopped, even if events remain buffered.
    #[must_use]
    pub fn poll(&self) -> Option<Event> {
        if self.is_stopped() {
            return None;
        }
        let ev = select! {
            recv(self.inner.rx) -> ev => ev.ok(),
            recv(self.inner.stop_rx) -> _ => None,
        };
        if self.is_stopped() {
            return None;
        }
        self.stop_if_drained();
        ev
    }

    /// Take an event if one is ready, without blocking.
    #[must_use]
    pub fn try_poll(&self) -> Option<Event> {
        if self.is_stopped() {
            return None;
        }
        let ev = self.inner.rx.try_recv().ok();
        self.stop_if_drained();
        ev
    }

    /// True when a poll would return immediately with an event.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.is_stopped() && !self.inner.rx.is_empty()
    }

    /// Enqueue without blocking.
    ///
    /// # Errors
    ///
    /// [`Error::EventQueueFull`] when the queue is at capacity,
    /// [`Error::NotRunning`] after stop or close.
    pub fn post(&self, ev: Event) -> Result<()> {
        if !self.accepting() {
            return Err(Error::NotRunning);
        }
        match self.inner.tx.try_send(ev) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(Error::EventQueueFull),
            Err(TrySendError::Disconnected(_)) => Err(Error::NotRunning),
        }
    }

    /// Enqueue, blocking while the queue is full.
    ///
    /// Unblocks when space frees up or the queue is stopped; in the latter
    /// case the event is dropped and `false` is returned. Calling this from
    /// the only consumer thread while the queue is full deadlocks.
    pub fn post_wait(&self, ev: Event) -> bool {
        if !self.accepting() {
            return false;
        }
        select! {
            send(self.inner.tx, ev) -> res => res.is_ok(),
            recv(self.inner.stop_rx) -> _ => false,
        }
    }

    /// Like [`post_wait`](Self::post_wait), but gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// [`Error::EventQueueFull`] when no space freed up in time,
    /// [`Error::NotRunning`] once stopped.
    pub fn post_timeout(&self, ev: Event, timeout: Duration) -> Result<()> {
        if !self.accepting() {
            return Err(Error::NotRunning);
        }
        select! {
            send(self.inner.tx, ev) -> res => res.map_err(|_| Error::NotRunning),
            recv(self.inner.stop_rx) -> _ => Err(Error::NotRunning),
            default(timeout) => Err(Error::EventQueueFull),
        }
    }

    /// Forward events into `ch` until `quit` fires or the queue stops.
    ///
    /// Blocks the calling thread. `ch` is dropped on return, so the
    /// receiving side sees exactly one disconnect. An event already taken
    /// from the queue when a stop arrives is discarded.
    pub fn forward(&self, ch: Sender<Event>, quit: &Receiver<()>) {
        loop {
            let ev = select! {
                recv(quit) -> _ => break,
                recv(self.inner.stop_rx) -> _ => break,
                recv(self.inner.rx) -> ev => match ev {
                    Ok(ev) => ev,
                    Err(_) => break,
                },
            };
            if self.is_stopped() {
                break;
            }
            select! {
                send(ch, ev) -> res => if res.is_err() { break },
                recv(quit) -> _ => break,
                recv(self.inner.stop_rx) -> _ => break,
            }
            self.stop_if_drained();
        }
        drop(ch);
    }

    /// Raise the stop signal. Idempotent.
    pub fn stop(&self) {
        if self.inner.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        let sender = match self.inner.stop_tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(sender);
        log::debug!("event queue stopped");
    }

    /// Refuse further posts and stop once the buffered events have been
    /// taken. Stops at once when nothing is buffered.
    pub fn close(&self) {
        if self.inner.closing.swap(true, Ordering::SeqCst) {
            return;
        }
        log::debug!("event queue closing with {} buffered", self.len());
        self.stop_if_drained();
    }

    #[inline]
    fn accepting(&self) -> bool {
        !self.is_stopped() && !self.inner.closing.load(Ordering::SeqCst)
    }

    fn stop_if_drained(&self) {
        if self.inner.closing.load(Ordering::SeqCst) && self.inner.rx.is_empty() {
            self.stop();
        }
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::event::{EventKind, KeyCode, Modifiers};

    fn key(c: char) -> Event {
        Event::key(KeyCode::Char(c), Modifiers::empty())
    }

    fn char_of(ev: &Event) -> char {
        match ev.kind() {
            EventKind::Key(k) => match k.code {
                KeyCode::Char(c) => c,
                other => panic!("unexpected key {other:?}"),
            },
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn fifo_order() {
        let q = EventQueue::new(4);
        for c in ['a', 'b', 'c'] {
            q.post(key(c)).unwrap();
        }
        assert_eq!(q.len(), 3);
        let got: Vec<char> = (0..3).map(|_| char_of(&q.poll().unwrap())).collect();
        assert_eq!(got, vec!['a', 'b', 'c']);
        assert!(q.is_empty());
    }

    #[test]
    fn post_fails_when_full() {
        let q = EventQueue::new(2);
        q.post(key('a')).unwrap();
        q.post(key('b')).unwrap();
        assert!(matches!(q.post(key('c')), Err(Error::EventQueueFull)));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn default_capacity_is_ten() {
        let q = EventQueue::default();
        assert_eq!(q.capacity(), 10);
        for _ in 0..10 {
            q.post(key('x')).unwrap();
        }
        assert!(q.post(key('x')).is_err());
    }

    #[test]
    fn zero_capacity_is_bumped() {
        let q = EventQueue::new(0);
        assert_eq!(q.capacity(), 1);
        q.post(key('a')).unwrap();
    }

    #[test]
    fn stop_unblocks_poll() {
        let q = EventQueue::new(4);
        let q2 = q.clone();
        let h = thread::spawn(move || q2.poll());
        thread::sleep(Duration::from_millis(20));
        q.stop();
        assert!(h.join().unwrap().is_none());
    }

    #[test]
    fn poll_after_stop_ignores_buffered_events() {
        let q = EventQueue::new(4);
        q.post(key('a')).unwrap();
        q.stop();
        assert!(q.poll().is_none());
        assert!(q.try_poll().is_none());
        assert!(!q.has_pending());
    }

    #[test]
    fn post_after_stop_fails() {
        let q = EventQueue::new(4);
        q.stop();
        assert!(matches!(q.post(key('a')), Err(Error::NotRunning)));
        assert!(!q.post_wait(key('a')));
    }

    #[test]
    fn stop_is_idempotent() {
        let q = EventQueue::new(4);
        q.stop();
        q.stop();
        assert!(q.is_stopped());
    }

    #[test]
    fn post_wait_blocks_until_space() {
        let q = EventQueue::new(1);
        q.post(key('a')).unwrap();
        let q2 = q.clone();
        let h = thread::spawn(move || q2.post_wait(key('b')));
        thread::sleep(Duration::from_millis(20));
        assert_eq!(char_of(&q.poll().unwrap()), 'a');
        assert!(h.join().unwrap());
        assert_eq!(char_of(&q.poll().unwrap()), 'b');
    }

    #[test]
    fn post_wait_unblocks_on_stop() {
        let q = EventQueue::new(1);
        q.post(key('a')).unwrap();
        let q2 = q.clone();
        let h = thread::spawn(move || q2.post_wait(key('b')));
        thread::sleep(Duration::from_millis(20));
        q.stop();
        assert!(!h.join().unwrap());
    }

    #[test]
    fn post_timeout_gives_up_when_full() {
        let q = EventQueue::new(1);
        q.post_timeout(key('a'), Duration::from_millis(10)).unwrap();
        assert!(matches!(
            q.post_timeout(key('b'), Duration::from_millis(10)),
            Err(Error::EventQueueFull)
        ));
        q.stop();
        assert!(matches!(
            q.post_timeout(key('c'), Duration::from_millis(10)),
            Err(Error::NotRunning)
        ));
    }

    #[test]
    fn has_pending_tracks_buffer() {
        let q = EventQueue::new(2);
        assert!(!q.has_pending());
        q.post(key('a')).unwrap();
        assert!(q.has_pending());
        let _ = q.poll();
        assert!(!q.has_pending());
    }

    #[test]
    fn forward_relays_in_order_and_closes_on_quit() {
        let q = EventQueue::new(4);
        let (tx, rx) = crossbeam_channel::unbounded();
        let (quit_tx, quit_rx) = bounded::<()>(0);
        let q2 = q.clone();
        let h = thread::spawn(move || q2.forward(tx, &quit_rx));

        q.post(key('a')).unwrap();
        q.post(key('b')).unwrap();
        assert_eq!(char_of(&rx.recv().unwrap()), 'a');
        assert_eq!(char_of(&rx.recv().unwrap()), 'b');

        drop(quit_tx);
        h.join().unwrap();
        assert!(rx.recv().is_err());
    }

    #[test]
    fn forward_closes_on_stop() {
        let q = EventQueue::new(4);
        let (tx, rx) = crossbeam_channel::unbounded();
        let (_quit_tx, quit_rx) = bounded::<()>(0);
        let q2 = q.clone();
        let h = thread::spawn(move || q2.forward(tx, &quit_rx));
        thread::sleep(Duration::from_millis(20));
        q.stop();
        h.join().unwrap();
        assert!(rx.recv().is_err());
    }

    #[test]
    fn close_drains_buffered_events_then_stops() {
        let q = EventQueue::new(4);
        q.post(key('a')).unwrap();
        q.post(key('b')).unwrap();
        q.close();
        assert!(!q.is_stopped());
        assert!(matches!(q.post(key('c')), Err(Error::NotRunning)));
        assert!(!q.post_wait(key('c')));

        assert_eq!(char_of(&q.poll().unwrap()), 'a');
        assert_eq!(char_of(&q.try_poll().unwrap()), 'b');
        assert!(q.is_stopped());
        assert!(q.poll().is_none());
    }

    #[test]
    fn close_on_empty_queue_stops_at_once() {
        let q = EventQueue::new(4);
        q.close();
        q.close();
        assert!(q.is_stopped());
        assert!(!q.has_pending());
    }

    #[test]
    fn close_unblocks_poll() {
        let q = EventQueue::new(4);
        let q2 = q.clone();
        let h = thread::spawn(move || q2.poll());
        thread::sleep(Duration::from_millis(20));
        q.close();
        assert!(h.join().unwrap().is_none());
    }

    #[test]
    fn forward_relays_buffered_events_after_close() {
        let q = EventQueue::new(4);
        q.post(key('x')).unwrap();
        q.close();
        let (tx, rx) = crossbeam_channel::unbounded();
        let (_quit_tx, quit_rx) = bounded::<()>(0);
        q.forward(tx, &quit_rx);
        assert_eq!(char_of(&rx.recv().unwrap()), 'x');
        assert!(rx.recv().is_err());
        assert!(q.is_stopped());
    }
}
