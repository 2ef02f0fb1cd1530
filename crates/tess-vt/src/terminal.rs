// SPDX-License-Identifier: MIT
//
// The tty device: termios raw mode, the alternate screen, and restoring
// both on exit or panic.
//
// Unsafe is confined to the POSIX calls (tcgetattr/tcsetattr, the
// TIOCGWINSZ ioctl, isatty, a raw write to fd 1 from the panic hook).
#![allow(unsafe_code)]
//
// The terminal handle owns the device's raw state: it enters raw mode via
// termios, switches to the alternate screen and enables focus reporting.
// Mouse, paste and cursor shape are switched by the backend on request;
// they are not this module's business except in an emergency.
//
// The panic hook writes a pre-built restore sequence straight to fd 1,
// bypassing Rust's stdout lock (a panic mid-frame may hold it), restores
// termios, then hands over to the original hook so the message prints to
// a working terminal.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use crate::ansi;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

/// Size used when the device cannot be queried.
pub const FALLBACK_SIZE: Size = Size { cols: 80, rows: 24 };

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current size with `ioctl(TIOCGWINSZ)` on stdout.
///
/// `None` when stdout is not a terminal or reports a zero dimension.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Whether stdin is a terminal.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Original termios, reachable from the panic hook.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

/// Everything a crashed session may have left switched on: synchronized
/// output, mouse tracking, bracketed paste, focus reporting, line drawing,
/// SGR state, cursor shape and visibility, alternate screen. The alternate
/// screen exit comes last so the shell's content reappears clean.
#[rustfmt::skip]
const EMERGENCY_RESTORE: &[u8] = b"\
    \x1b[?2026l\
    \x1b[?1006l\x1b[?1003l\x1b[?1002l\x1b[?1000l\
    \x1b[?2004l\
    \x1b[?1004l\
    \x1b(B\
    \x1b[0m\
    \x1b[0 q\
    \x1b[?25h\
    \x1b[?1049l";

static PANIC_HOOK_INSTALLED: Once = Once::new();

fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// What [`Terminal::enter`] switches on besides raw mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnterOptions {
    pub alt_screen: bool,
    pub focus_reporting: bool,
}

/// Raw-mode handle. Restores the device on drop.
///
/// Escape sequences go to the writer passed to `enter`/`leave`, so the
/// handle can be exercised without a terminal attached.
pub struct Terminal {
    #[cfg(unix)]
    original_termios: Option<libc::termios>,
    options: EnterOptions,
    size: Size,
    active: bool,
}

impl Terminal {
    /// A handle sized from the device, or 80×24 when that fails.
    #[must_use]
    pub fn new(options: EnterOptions) -> Self {
        Self {
            #[cfg(unix)]
            original_termios: None,
            options,
            size: get_size().unwrap_or(FALLBACK_SIZE),
            active: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Re-query the size, e.g. after `SIGWINCH`.
    pub fn refresh_size(&mut self) -> Size {
        if let Some(s) = get_size() {
            self.size = s;
        }
        self.size
    }

    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter raw mode, switch screens and hide the cursor. Idempotent.
    ///
    /// # Errors
    ///
    /// termios or write failures.
    pub fn enter(&mut self, w: &mut impl Write) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        install_panic_hook();
        self.enable_raw_mode()?;

        if self.options.alt_screen {
            ansi::enter_alt_screen(w)?;
        }
        ansi::cursor_hide(w)?;
        ansi::clear_screen(w)?;
        if self.options.focus_reporting {
            ansi::focus_reporting(w, true)?;
        }
        w.flush()?;

        self.active = true;
        log::debug!("terminal entered ({}x{})", self.size.cols, self.size.rows);
        Ok(())
    }

    /// Undo [`enter`](Self::enter). With `clear`, the display is wiped
    /// before leaving. Idempotent.
    ///
    /// # Errors
    ///
    /// Write or termios failures.
    pub fn leave(&mut self, w: &mut impl Write, clear: bool) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        ansi::end_sync(w)?;
        if self.options.focus_reporting {
            ansi::focus_reporting(w, false)?;
        }
        ansi::exit_line_drawing(w)?;
        ansi::reset(w)?;
        if clear {
            ansi::clear_screen(w)?;
            ansi::cursor_to(w, 0, 0)?;
        } else {
            ansi::cursor_to(w, 0, self.size.rows.saturating_sub(1))?;
        }
        ansi::cursor_show(w)?;
        if self.options.alt_screen {
            ansi::exit_alt_screen(w)?;
        }
        w.flush()?;

        self.disable_raw_mode()?;
        self.active = false;
        log::debug!("terminal left (clear={clear})");
        Ok(())
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        if !is_tty() {
            return Ok(());
        }

        let fd = io::stdin().as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            self.original_termios = Some(termios);
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            // cfmakeraw equivalent.
            termios.c_iflag &= !(libc::IGNBRK
                | libc::BRKINT
                | libc::PARMRK
                | libc::ISTRIP
                | libc::INLCR
                | libc::IGNCR
                | libc::ICRNL
                | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &=
                !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8;

            // The reader polls before reading, so a blocking read is fine.
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        if let Some(ref original) = self.original_termios {
            use std::os::unix::io::AsRawFd;
            let fd = io::stdin().as_raw_fd();

            unsafe {
                if libc::tcsetattr(fd, libc::TCSAFLUSH, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }

            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }
            self.original_termios = None;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave(&mut io::stdout().lock(), false);
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
