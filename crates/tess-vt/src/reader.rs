// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Background input thread: stdin bytes and window-size changes in,
// screen events out.
//
// The thread `poll()`s stdin with a short timeout so it can notice its
// stop flag, a stopped queue, or a pending SIGWINCH between reads. Bytes
// go through the input parser; a lone ESC is flushed as an Escape press
// once no follow-up byte has arrived within the escape timeout.
//
// Delivery blocks while the queue is full, in slices of the poll timeout,
// so a suspend or shutdown can still stop the thread. Input is never
// dropped because the application is slow.
//
// End of input and read failures are fatal: a failure is reported as an
// error event, then the queue is closed so the application drains what
// is left and sees the screen stop.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tess_screen::Error;
use tess_screen::event::{Event, EventKind};
use tess_screen::queue::EventQueue;

use crate::terminal::Size;

/// Sized for a paste burst; a keypress is 1-6 bytes.
const READ_BUF_SIZE: usize = 4096;

// ─── SIGWINCH ───────────────────────────────────────────────────────────────

/// Set by the SIGWINCH handler, cleared by the reader.
static SIGWINCH_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Writing an atomic is async-signal-safe; that is all the handler does.
#[cfg(unix)]
fn install_sigwinch_handler() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    SIGWINCH_RECEIVED.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
fn install_sigwinch_handler() {}

// ─── Shared Size ────────────────────────────────────────────────────────────

/// Terminal size shared between the reader (which notices changes) and
/// the backend (which reports it). Packed into one atomic so readers
/// never see a torn pair.
#[derive(Debug, Clone)]
pub struct SharedSize(Arc<AtomicU32>);

impl SharedSize {
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self(Arc::new(AtomicU32::new(pack(size))))
    }

    #[must_use]
    pub fn get(&self) -> Size {
        unpack(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, size: Size) {
        self.0.store(pack(size), Ordering::Release);
    }
}

const fn pack(size: Size) -> u32 {
    ((size.cols as u32) << 16) | size.rows as u32
}

#[allow(clippy::cast_possible_truncation)]
const fn unpack(v: u32) -> Size {
    Size {
        cols: (v >> 16) as u16,
        rows: v as u16,
    }
}

// ─── Reader ─────────────────────────────────────────────────────────────────

/// Timing knobs for the input thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Upper bound on how long the thread sleeps before rechecking its
    /// stop conditions.
    pub poll_timeout: Duration,
    /// How long a lone ESC waits for the rest of a sequence.
    pub escape_timeout: Duration,
}

/// Handle to the running input thread. Stops it on drop.
#[derive(Debug)]
pub struct InputReader {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl InputReader {
    /// Start reading stdin into `queue`. Window-size changes update
    /// `size` and post a resize event.
    ///
    /// # Errors
    ///
    /// The OS refused to spawn a thread.
    pub fn spawn(queue: EventQueue, size: SharedSize, config: ReaderConfig) -> io::Result<Self> {
        #[cfg(unix)]
        let source = {
            use std::os::unix::io::AsRawFd;
            io::stdin().as_raw_fd()
        };
        #[cfg(not(unix))]
        let source = ();
        Self::spawn_on(source, queue, size, config)
    }

    fn spawn_on(
        source: Source,
        queue: EventQueue,
        size: SharedSize,
        config: ReaderConfig,
    ) -> io::Result<Self> {
        install_sigwinch_handler();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("tess-input".into())
            .spawn(move || reader_loop(source, &queue, &size, &stop_flag, config))?;

        log::debug!("input reader started");
        Ok(Self {
            handle: Some(handle),
            stop,
        })
    }

    /// Whether the thread is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the thread and wait for it. Idempotent.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            log::debug!("input reader stopped");
        }
    }
}

impl Drop for InputReader {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Post `ev`, waiting for space in `slice`-sized steps. Gives up when the
/// queue or the reader is stopped.
fn deliver(queue: &EventQueue, stop: &AtomicBool, ev: &Event, slice: Duration) -> bool {
    loop {
        match queue.post_timeout(ev.clone(), slice) {
            Ok(()) => return true,
            Err(Error::EventQueueFull) if !stop.load(Ordering::Relaxed) => {}
            Err(_) => return false,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn millis(d: Duration) -> i32 {
    d.as_millis().min(i32::MAX as u128) as i32
}

#[cfg(unix)]
type Source = std::os::unix::io::RawFd;
#[cfg(not(unix))]
type Source = ();

/// Why the read loop ended.
#[derive(Debug)]
enum Exit {
    /// Stop flag raised or queue stopped.
    Stopped,
    /// The input source reached end of file.
    Eof,
    Failed(io::Error),
}

fn reader_loop(
    source: Source,
    queue: &EventQueue,
    size: &SharedSize,
    stop: &AtomicBool,
    config: ReaderConfig,
) {
    match read_input(source, queue, size, stop, config) {
        Exit::Stopped => {}
        Exit::Eof => {
            log::debug!("input closed");
            queue.close();
        }
        Exit::Failed(err) => {
            log::warn!("input reader failed: {err}");
            let ev = Event::new(EventKind::Error(Arc::new(Error::Io(err))));
            if !deliver(queue, stop, &ev, config.poll_timeout) {
                log::debug!("input error not delivered");
            }
            queue.close();
        }
    }
}

#[cfg(unix)]
fn read_input(
    fd: Source,
    queue: &EventQueue,
    size: &SharedSize,
    stop: &AtomicBool,
    config: ReaderConfig,
) -> Exit {
    use std::time::Instant;

    use crate::input::Parser;
    use crate::terminal;

    let mut buf = [0u8; READ_BUF_SIZE];
    let mut parser = Parser::new();
    let mut last_input = Instant::now();
    let slice = config.poll_timeout;

    let send = |ev: Event| deliver(queue, stop, &ev, slice);

    loop {
        if stop.load(Ordering::Relaxed) || queue.is_stopped() {
            return Exit::Stopped;
        }

        if SIGWINCH_RECEIVED.swap(false, Ordering::Relaxed) {
            if let Some(s) = terminal::get_size() {
                size.set(s);
            }
            let s = size.get();
            log::debug!("window resized to {}x{}", s.cols, s.rows);
            if !send(Event::resize(s.cols, s.rows)) {
                return Exit::Stopped;
            }
        }

        let timeout = if parser.has_pending() {
            config.escape_timeout.min(config.poll_timeout)
        } else {
            config.poll_timeout
        };
        let ready = unsafe {
            let mut pfd = libc::pollfd {
                fd,
                events: libc::POLLIN,
                revents: 0,
            };
            libc::poll(&raw mut pfd, 1, millis(timeout))
        };

        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Exit::Failed(err);
        }
        if ready == 0 {
            if parser.has_pending() && last_input.elapsed() >= config.escape_timeout {
                for input in parser.flush() {
                    if !send(Event::new(input.into())) {
                        return Exit::Stopped;
                    }
                }
            }
            continue;
        }

        let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
        if n == 0 {
            // A lone ESC right before end of input is still a keypress.
            for input in parser.flush() {
                if !send(Event::new(input.into())) {
                    return Exit::Stopped;
                }
            }
            return Exit::Eof;
        }
        if n < 0 {
            let err = io::Error::last_os_error();
            if matches!(err.kind(), io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock) {
                continue;
            }
            return Exit::Failed(err);
        }
        last_input = Instant::now();

        #[allow(clippy::cast_sign_loss)]
        let chunk = &buf[..n as usize];
        for input in parser.advance(chunk) {
            if !send(Event::new(input.into())) {
                return Exit::Stopped;
            }
        }
    }
}

/// Without `poll()` there is nothing to read from; idle until stopped.
#[cfg(not(unix))]
fn read_input(
    _source: Source,
    queue: &EventQueue,
    _size: &SharedSize,
    stop: &AtomicBool,
    config: ReaderConfig,
) -> Exit {
    while !stop.load(Ordering::Relaxed) && !queue.is_stopped() {
        thread::sleep(config.poll_timeout);
    }
    Exit::Stopped
}

// ─── Tests ───────────────────────────────────────────────────────────────────
