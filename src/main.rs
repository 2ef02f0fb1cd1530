// SPDX-License-Identifier: MIT
//
// tessera — interactive event viewer for the screen layer.
//
// Wires the pieces together on a real terminal:
//
//   tess-vt     → raw mode, input thread, escape-sequence output
//   tess-screen → cell grids, diff renderer, event queue, modes
//
// Every event the terminal reports is listed as it arrives. Keys toggle
// the optional modes so their effect can be watched live:
//
//   m  cycle mouse reporting (off → buttons → drag → motion)
//   p  toggle bracketed paste
//   c  cycle cursor shapes
//   b  beep
//   r  full repaint
//   z  suspend to $SHELL, resume on exit
//   q  quit (also Ctrl+C)
//
// Layout:
//
//   ┌ tessera ─────────────────────┐
//   │ event log (newest last)      │
//   └──────────────────────────────┘
//    status: size, colors, charset, modes

use std::collections::VecDeque;
use std::env;
use std::process::{self, Command};

use tess_screen::backend::Backend;
use tess_screen::event::{Event, EventKind, KeyCode, Modifiers, MouseEventKind};
use tess_screen::mode::{CursorStyle, MouseFlags};
use tess_screen::screen::Screen;
use tess_screen::style::{Attr, Color, Style};
use tess_vt::{VtBackend, VtConfig};

// ─── Demo State ─────────────────────────────────────────────────────────────

/// Mouse levels in the order `m` cycles through them.
const MOUSE_LEVELS: [MouseFlags; 4] = [
    MouseFlags::empty(),
    MouseFlags::BUTTON_EVENTS,
    MouseFlags::DRAG_EVENTS,
    MouseFlags::MOTION_EVENTS,
];

const CURSOR_STYLES: [CursorStyle; 7] = [
    CursorStyle::Default,
    CursorStyle::BlinkingBlock,
    CursorStyle::SteadyBlock,
    CursorStyle::BlinkingUnderline,
    CursorStyle::SteadyUnderline,
    CursorStyle::BlinkingBar,
    CursorStyle::SteadyBar,
];

/// Log lines kept; older ones scroll away.
const LOG_CAPACITY: usize = 256;

/// What the main loop does after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Continue,
    Repaint,
    Suspend,
    Quit,
}

struct Viewer {
    log: VecDeque<String>,
    mouse_level: usize,
    cursor_style: usize,
    paste: bool,
    in_paste: bool,
    pointer: Option<(u16, u16)>,
}

impl Viewer {
    fn new() -> Self {
        Self {
            log: VecDeque::with_capacity(LOG_CAPACITY),
            mouse_level: 0,
            cursor_style: 0,
            paste: false,
            in_paste: false,
            pointer: None,
        }
    }

    fn record(&mut self, line: String) {
        if self.log.len() == LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }

    /// React to `ev`. Mode toggles go straight to the screen.
    fn handle<B: Backend>(&mut self, screen: &mut Screen<B>, ev: &Event) -> Action {
        self.record(describe(ev));

        match ev.kind() {
            EventKind::PasteStart => self.in_paste = true,
            EventKind::PasteEnd => self.in_paste = false,
            EventKind::Mouse(m) => {
                self.pointer = match m.kind {
                    MouseEventKind::Release(_) => None,
                    _ => Some((m.x, m.y)),
                };
            }
            EventKind::Key(k) if !self.in_paste => match (k.code, k.modifiers) {
                (KeyCode::Char('q'), _) => return Action::Quit,
                (KeyCode::Char('c'), m) if m.contains(Modifiers::CTRL) => return Action::Quit,
                (KeyCode::Char('m'), _) => {
                    self.mouse_level = (self.mouse_level + 1) % MOUSE_LEVELS.len();
                    match MOUSE_LEVELS[self.mouse_level] {
                        f if f.is_empty() => screen.disable_mouse(),
                        f => screen.enable_mouse(f),
                    }
                    self.pointer = None;
                }
                (KeyCode::Char('p'), _) => {
                    self.paste = !self.paste;
                    if self.paste {
                        screen.enable_paste();
                    } else {
                        screen.disable_paste();
                    }
                }
                (KeyCode::Char('c'), _) => {
                    self.cursor_style = (self.cursor_style + 1) % CURSOR_STYLES.len();
                    screen.set_cursor_style(CURSOR_STYLES[self.cursor_style]);
                }
                (KeyCode::Char('b'), _) => {
                    if let Err(err) = screen.beep() {
                        self.record(format!("beep failed: {err}"));
                    }
                }
                (KeyCode::Char('r'), _) => return Action::Repaint,
                (KeyCode::Char('z'), _) => return Action::Suspend,
                _ => {}
            },
            _ => {}
        }
        Action::Continue
    }

    fn paint<B: Backend>(&self, screen: &mut Screen<B>) {
        screen.clear();
        let (w, h) = screen.size();
        if w < 4 || h < 4 {
            screen.put_str(0, 0, "too small", Style::DEFAULT);
            return;
        }
        let (w, h) = (i32::from(w), i32::from(h));
        let frame = Style::DEFAULT.fg(Color::Indexed(6));

        // Border, drawn with line-drawing runes so narrow charsets
        // exercise the alternate set and fallbacks.
        screen.set_content(0, 0, '┌', &[], frame);
        screen.set_content(w - 1, 0, '┐', &[], frame);
        screen.set_content(0, h - 2, '└', &[], frame);
        screen.set_content(w - 1, h - 2, '┘', &[], frame);
        for x in 1..w - 1 {
            screen.set_content(x, 0, '─', &[], frame);
            screen.set_content(x, h - 2, '─', &[], frame);
        }
        for y in 1..h - 2 {
            screen.set_content(0, y, '│', &[], frame);
            screen.set_content(w - 1, y, '│', &[], frame);
        }
        screen.put_str(2, 0, " tessera ", frame.attrs(Attr::BOLD));

        let rows = usize::try_from(h - 3).unwrap_or(0);
        let skip = self.log.len().saturating_sub(rows);
        for (y, line) in (1..).zip(self.log.iter().skip(skip)) {
            let clipped: String = line.chars().take(usize::try_from(w - 3).unwrap_or(0)).collect();
            screen.put_str(2, y, &clipped, Style::DEFAULT);
        }

        if let Some((x, y)) = self.pointer {
            screen.set_content(i32::from(x), i32::from(y), '◆', &[], Style::DEFAULT.fg(Color::Indexed(3)));
        }

        let status = format!(
            " {}x{}  {} colors  {}  mouse:{:?}  paste:{}  cursor:{:?}   q quit  m p c b r z",
            w,
            h,
            screen.colors(),
            screen.character_set(),
            screen.modes().mouse(),
            screen.modes().paste(),
            CURSOR_STYLES[self.cursor_style],
        );
        screen.put_str(0, h - 1, &status, Style::DEFAULT.reverse());
        screen.show_cursor(2, h - 2);
    }
}

/// One log line per event.
fn describe(ev: &Event) -> String {
    match ev.kind() {
        EventKind::Key(k) => {
            let mods = if k.modifiers.is_empty() {
                String::new()
            } else {
                format!("{:?}+", k.modifiers)
            };
            format!("key    {mods}{:?} ({:?})", k.code, k.kind)
        }
        EventKind::Mouse(m) => format!("mouse  {:?} at {},{}", m.kind, m.x, m.y),
        EventKind::PasteStart => "paste  begin".to_owned(),
        EventKind::PasteEnd => "paste  end".to_owned(),
        EventKind::Resize { width, height } => format!("resize {width}x{height}"),
        EventKind::Focus { gained } => {
            format!("focus  {}", if *gained { "gained" } else { "lost" })
        }
        EventKind::Interrupt(_) => "interrupt".to_owned(),
        EventKind::Error(err) => format!("error  {err}"),
        EventKind::Custom(_) => "custom".to_owned(),
    }
}

// ─── Main Loop ──────────────────────────────────────────────────────────────

fn run<B: Backend>(screen: &mut Screen<B>, shell: &str) -> tess_screen::Result<()> {
    let mut viewer = Viewer::new();
    viewer.record("ready, press q to quit".to_owned());

    loop {
        viewer.paint(screen);
        screen.show()?;

        let Some(ev) = screen.poll_event() else {
            return Ok(());
        };
        match viewer.handle(screen, &ev) {
            Action::Continue => {}
            Action::Repaint => {
                viewer.paint(screen);
                screen.sync()?;
            }
            Action::Suspend => {
                screen.suspend()?;
                let status = Command::new(shell).status();
                screen.resume()?;
                match status {
                    Ok(s) => viewer.record(format!("shell exited: {s}")),
                    Err(err) => viewer.record(format!("shell failed: {err}")),
                }
            }
            Action::Quit => return Ok(()),
        }
    }
}

fn main() {
    env_logger::init();

    let shell = env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_owned());
    let mut screen = Screen::new(VtBackend::new(VtConfig::default()));

    if let Err(e) = screen.init() {
        eprintln!("tessera: failed to initialize terminal: {e}");
        process::exit(1);
    }

    let result = run(&mut screen, &shell);
    screen.fini();

    if let Err(e) = result {
        eprintln!("tessera: {e}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tess_screen::event::{MouseButton, MouseEvent};
    use tess_screen::sim::SimBackend;

    fn screen() -> Screen<SimBackend> {
        let mut s = Screen::new(SimBackend::new(40, 8));
        s.init().unwrap();
        s
    }

    fn press(ch: char) -> Event {
        Event::key(KeyCode::Char(ch), Modifiers::empty())
    }

    #[test]
    fn q_and_ctrl_c_quit() {
        let mut s = screen();
        let mut v = Viewer::new();
        assert_eq!(v.handle(&mut s, &press('q')), Action::Quit);
        assert_eq!(
            v.handle(&mut s, &Event::key(KeyCode::Char('c'), Modifiers::CTRL)),
            Action::Quit
        );
    }

    #[test]
    fn m_cycles_mouse_levels() {
        let mut s = screen();
        let mut v = Viewer::new();
        v.handle(&mut s, &press('m'));
        assert_eq!(s.backend().mouse(), MouseFlags::BUTTON_EVENTS);
        v.handle(&mut s, &press('m'));
        v.handle(&mut s, &press('m'));
        assert_eq!(s.backend().mouse(), MouseFlags::MOTION_EVENTS);
        v.handle(&mut s, &press('m'));
        assert!(s.backend().mouse().is_empty());
    }

    #[test]
    fn p_toggles_paste_and_c_cycles_cursor() {
        let mut s = screen();
        let mut v = Viewer::new();
        v.handle(&mut s, &press('p'));
        assert!(s.backend().paste());
        v.handle(&mut s, &press('c'));
        assert_eq!(s.backend().cursor_style(), CursorStyle::BlinkingBlock);
        v.handle(&mut s, &press('p'));
        assert!(!s.backend().paste());
    }

    #[test]
    fn keys_inside_paste_are_not_commands() {
        let mut s = screen();
        let mut v = Viewer::new();
        v.handle(&mut s, &Event::new(EventKind::PasteStart));
        assert_eq!(v.handle(&mut s, &press('q')), Action::Continue);
        v.handle(&mut s, &Event::new(EventKind::PasteEnd));
        assert_eq!(v.handle(&mut s, &press('q')), Action::Quit);
    }

    #[test]
    fn mouse_press_sets_pointer() {
        let mut s = screen();
        let mut v = Viewer::new();
        let click = |kind| {
            Event::new(EventKind::Mouse(MouseEvent {
                kind,
                x: 5,
                y: 3,
                modifiers: Modifiers::empty(),
            }))
        };
        v.handle(&mut s, &click(MouseEventKind::Press(MouseButton::Left)));
        assert_eq!(v.pointer, Some((5, 3)));
        v.handle(&mut s, &click(MouseEventKind::Release(MouseButton::Left)));
        assert_eq!(v.pointer, None);
    }

    #[test]
    fn paint_draws_border_log_and_status() {
        let mut s = screen();
        let mut v = Viewer::new();
        v.handle(&mut s, &Event::resize(40, 8));
        v.paint(&mut s);
        s.show().unwrap();
        let be = s.backend();
        assert_eq!(be.text_at(0, 0), "┌");
        assert_eq!(be.text_at(39, 6), "┘");
        assert!(be.row_text(0).contains("tessera"));
        assert!(be.row_text(1).contains("resize 40x8"));
        assert!(be.row_text(7).contains("40x8"));
        assert_eq!(be.cursor(), Some((2, 6)));
    }

    #[test]
    fn log_is_bounded() {
        let mut v = Viewer::new();
        for i in 0..LOG_CAPACITY + 10 {
            v.record(i.to_string());
        }
        assert_eq!(v.log.len(), LOG_CAPACITY);
        assert_eq!(v.log.front().map(String::as_str), Some("10"));
    }

    #[test]
    fn describe_is_readable() {
        assert_eq!(describe(&Event::resize(3, 4)), "resize 3x4");
        assert!(describe(&press('x')).contains("Char('x')"));
        assert_eq!(
            describe(&Event::new(EventKind::Focus { gained: false })),
            "focus  lost"
        );
    }
}
