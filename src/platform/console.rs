// src/platform/console.rs

//! ANSI console implementation of [`SurfaceDriver`].
//!
//! One character cell is one "pixel": a cell square of pixel size 3 covers
//! a 3x3 block of character cells. The driver sets the terminal to raw
//! mode, enables SGR mouse reporting so clicks arrive as escape sequences,
//! and draws with cursor positioning plus 24-bit background colors. The
//! bottom terminal row is reserved for the status line and excluded from
//! the drawable area.

use std::io::{self, stdin, stdout, Read, Write};
use std::mem;
use std::os::unix::io::RawFd;

use anyhow::{Context, Result};
use libc::{winsize, STDIN_FILENO, TIOCGWINSZ};
use log::{debug, info, trace, warn};
use termios::{tcsetattr, Termios, ECHO, ICANON, ISIG, TCSANOW, VMIN, VTIME};

use crate::color::Rgb;
use crate::platform::{BackendEvent, DrawCommand, KeySymbol, Modifiers, SurfaceDriver};

const CURSOR_HIDE: &str = "\x1b[?25l";
const CURSOR_SHOW: &str = "\x1b[?25h";
const MOUSE_ENABLE: &str = "\x1b[?1000h\x1b[?1006h";
const MOUSE_DISABLE: &str = "\x1b[?1006l\x1b[?1000l";
const SGR_RESET: &str = "\x1b[0m";
const CLEAR_SCREEN_AND_HOME: &str = "\x1b[2J\x1b[H";
const CLEAR_LINE: &str = "\x1b[2K";

// Fallback terminal size when TIOCGWINSZ reports zero.
const DEFAULT_WIDTH_CELLS: u16 = 80;
const DEFAULT_HEIGHT_CELLS: u16 = 24;

// SGR mouse report button bits.
const MOUSE_BUTTON_MASK: u16 = 0x3;
const MOUSE_SHIFT_BIT: u16 = 4;
const MOUSE_ALT_BIT: u16 = 8;
const MOUSE_CONTROL_BIT: u16 = 16;
const MOUSE_MOTION_BIT: u16 = 32;
const MOUSE_WHEEL_BIT: u16 = 64;

pub struct ConsoleDriver {
    /// Original terminal attributes, restored on cleanup. `None` once
    /// cleanup has run (or if they could not be captured).
    original_termios: Option<Termios>,
    last_known_width_cells: u16,
    last_known_height_cells: u16,
    input_buffer: [u8; 128],
    /// Bytes carried over when an escape sequence is split across reads.
    pending: Vec<u8>,
    /// Background color applied by subsequent `FillRect` commands.
    fill_color: Rgb,
}

impl ConsoleDriver {
    /// Captures the current terminal attributes, switches to raw mode,
    /// hides the cursor, clears the screen, and enables SGR mouse
    /// reporting.
    pub fn new() -> Result<Self> {
        info!("ConsoleDriver: initializing");
        let original_termios = match Termios::from_fd(STDIN_FILENO) {
            Ok(ts) => Some(ts),
            Err(e) => {
                warn!(
                    "ConsoleDriver: failed to get termios: {}. Proceeding without raw mode.",
                    e
                );
                None
            }
        };

        if let Some(ref ots) = original_termios {
            let mut raw_termios = *ots;
            // No echo, no line buffering, no signal keys; reads return
            // immediately with whatever is available.
            raw_termios.c_lflag &= !(ECHO | ICANON | ISIG);
            raw_termios.c_iflag &= !(libc::IXON | libc::IXOFF | libc::ICRNL);
            raw_termios.c_cc[VMIN] = 0;
            raw_termios.c_cc[VTIME] = 0;
            if let Err(e) = tcsetattr(STDIN_FILENO, TCSANOW, &raw_termios) {
                warn!(
                    "ConsoleDriver: failed to set raw mode: {}. Input may misbehave.",
                    e
                );
            } else {
                debug!("ConsoleDriver: terminal in raw mode");
            }
        }

        print!("{}{}{}", CURSOR_HIDE, CLEAR_SCREEN_AND_HOME, MOUSE_ENABLE);
        stdout()
            .flush()
            .context("ConsoleDriver: failed to flush terminal setup")?;

        let (cols, rows) = terminal_size_cells(STDIN_FILENO)
            .context("ConsoleDriver: failed to get initial terminal size")?;
        info!("ConsoleDriver: terminal is {}x{} cells", cols, rows);

        Ok(ConsoleDriver {
            original_termios,
            last_known_width_cells: cols,
            last_known_height_cells: rows,
            input_buffer: [0u8; 128],
            pending: Vec::new(),
            fill_color: Rgb::BLACK,
        })
    }

    /// Consumes complete input sequences from `pending`, leaving behind an
    /// unterminated mouse report for the next poll.
    fn drain_pending(&mut self, events: &mut Vec<BackendEvent>) {
        let mut consumed = 0;
        while consumed < self.pending.len() {
            let rest = &self.pending[consumed..];
            if rest[0] == 0x1b && rest.len() >= 3 && rest[1] == b'[' && rest[2] == b'<' {
                match parse_sgr_mouse(rest) {
                    MouseParse::Incomplete => break,
                    MouseParse::Consumed(len, event) => {
                        if let Some(event) = event {
                            events.push(event);
                        }
                        consumed += len;
                    }
                }
            } else if rest[0] == 0x1b && rest.len() < 3 {
                // Might still grow into a mouse report prefix.
                break;
            } else {
                if let Some(event) = key_event(rest[0]) {
                    events.push(event);
                }
                consumed += 1;
            }
        }
        self.pending.drain(..consumed);
    }

    fn status_row(&self) -> u16 {
        self.last_known_height_cells.max(1)
    }
}

impl SurfaceDriver for ConsoleDriver {
    fn process_events(&mut self) -> Result<Vec<BackendEvent>> {
        let mut events = Vec::new();

        match terminal_size_cells(STDIN_FILENO) {
            Ok((cols, rows)) => {
                if cols != self.last_known_width_cells || rows != self.last_known_height_cells {
                    info!(
                        "ConsoleDriver: resized from {}x{} to {}x{} cells",
                        self.last_known_width_cells, self.last_known_height_cells, cols, rows
                    );
                    self.last_known_width_cells = cols;
                    self.last_known_height_cells = rows;
                    let (width_px, height_px) = self.surface_size_px();
                    events.push(BackendEvent::Resize {
                        width_px,
                        height_px,
                    });
                }
            }
            Err(e) => {
                warn!(
                    "ConsoleDriver: failed to get terminal size: {}. Using last known.",
                    e
                );
            }
        }

        // With VMIN=0/VTIME=0 an idle read also returns 0 bytes, so
        // readiness is checked first; a zero-byte read after POLLIN is a
        // genuine EOF.
        match poll_readable(STDIN_FILENO)? {
            Readiness::Empty => {}
            Readiness::HungUp => {
                info!("ConsoleDriver: stdin hung up, requesting close");
                events.push(BackendEvent::CloseRequested);
            }
            Readiness::Ready => match stdin().read(&mut self.input_buffer) {
                Ok(0) => {
                    info!("ConsoleDriver: EOF on stdin, requesting close");
                    events.push(BackendEvent::CloseRequested);
                }
                Ok(bytes_read) => {
                    trace!("ConsoleDriver: read {} bytes from stdin", bytes_read);
                    self.pending.extend_from_slice(&self.input_buffer[..bytes_read]);
                    self.drain_pending(&mut events);
                    // A bare Escape is never the prefix of anything we are
                    // still waiting for once the poll has seen all input.
                    if self.pending.len() == 1 && self.pending[0] == 0x1b {
                        self.pending.clear();
                        events.push(BackendEvent::Key {
                            symbol: KeySymbol::Escape,
                            modifiers: Modifiers::empty(),
                        });
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    trace!("ConsoleDriver: stdin read would block");
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {
                    trace!("ConsoleDriver: stdin read interrupted");
                }
                Err(e) => {
                    return Err(e).context("ConsoleDriver: error reading from stdin");
                }
            },
        }

        Ok(events)
    }

    fn surface_size_px(&self) -> (u32, u32) {
        // Bottom row is the status line.
        let rows = self.last_known_height_cells.saturating_sub(1);
        (self.last_known_width_cells as u32, rows as u32)
    }

    fn execute(&mut self, commands: Vec<DrawCommand>) -> Result<()> {
        let mut out = String::new();
        for command in commands {
            match command {
                DrawCommand::ClearAll { color } => {
                    out.push_str(&sgr_background(color));
                    out.push_str(CLEAR_SCREEN_AND_HOME);
                }
                DrawCommand::SetFillColor { color } => {
                    self.fill_color = color;
                }
                DrawCommand::FillRect {
                    x_px,
                    y_px,
                    width_px,
                    height_px,
                } => {
                    if width_px == 0 || height_px == 0 {
                        continue;
                    }
                    out.push_str(&sgr_background(self.fill_color));
                    let spaces = " ".repeat(width_px as usize);
                    for row_offset in 0..height_px {
                        out.push_str(&cursor_position(y_px + row_offset + 1, x_px + 1));
                        out.push_str(&spaces);
                    }
                }
                DrawCommand::StatusText { text } => {
                    out.push_str(&cursor_position(self.status_row() as u32, 1));
                    out.push_str(SGR_RESET);
                    out.push_str(CLEAR_LINE);
                    let cols = self.last_known_width_cells as usize;
                    out.extend(text.chars().take(cols));
                }
                DrawCommand::Present => {
                    if !out.is_empty() {
                        print!("{}", out);
                        out.clear();
                    }
                    stdout()
                        .flush()
                        .context("ConsoleDriver: failed to flush for Present")?;
                }
            }
        }
        if !out.is_empty() {
            print!("{}", out);
        }
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        info!("ConsoleDriver: cleaning up");
        print!(
            "{}{}{}{}",
            MOUSE_DISABLE, SGR_RESET, CLEAR_SCREEN_AND_HOME, CURSOR_SHOW
        );
        stdout()
            .flush()
            .context("ConsoleDriver: failed to flush cleanup sequences")?;
        if let Some(original) = self.original_termios.take() {
            debug!("ConsoleDriver: restoring terminal attributes");
            tcsetattr(STDIN_FILENO, TCSANOW, &original)
                .context("ConsoleDriver: failed to restore terminal attributes")?;
        }
        Ok(())
    }
}

impl Drop for ConsoleDriver {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            warn!("ConsoleDriver: cleanup during drop failed: {}", e);
        }
    }
}

enum MouseParse {
    /// The buffer holds a report prefix with no terminator yet.
    Incomplete,
    /// `len` bytes consumed, optionally yielding an event.
    Consumed(usize, Option<BackendEvent>),
}

/// Parses one SGR mouse report, `ESC [ < Cb ; Cx ; Cy (M|m)`, from the
/// start of `bytes` (the caller has verified the three-byte prefix).
fn parse_sgr_mouse(bytes: &[u8]) -> MouseParse {
    let Some(end) = bytes.iter().position(|&b| b == b'M' || b == b'm') else {
        return if bytes.len() > 32 {
            // Garbage that will never terminate; discard the prefix byte
            // and let the rest reparse.
            MouseParse::Consumed(1, None)
        } else {
            MouseParse::Incomplete
        };
    };
    let is_press = bytes[end] == b'M';
    let body = &bytes[3..end];
    let consumed = end + 1;

    let mut fields = body.split(|&b| b == b';').filter_map(|field| {
        std::str::from_utf8(field).ok()?.parse::<u16>().ok()
    });
    let (Some(cb), Some(cx), Some(cy)) = (fields.next(), fields.next(), fields.next()) else {
        trace!("ConsoleDriver: malformed mouse report, skipping");
        return MouseParse::Consumed(consumed, None);
    };

    // Left-button presses only; releases, drags, and wheel are ignored.
    if !is_press
        || cb & MOUSE_BUTTON_MASK != 0
        || cb & (MOUSE_MOTION_BIT | MOUSE_WHEEL_BIT) != 0
    {
        return MouseParse::Consumed(consumed, None);
    }

    let mut modifiers = Modifiers::empty();
    if cb & MOUSE_SHIFT_BIT != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if cb & MOUSE_ALT_BIT != 0 {
        modifiers |= Modifiers::ALT;
    }
    if cb & MOUSE_CONTROL_BIT != 0 {
        modifiers |= Modifiers::CONTROL;
    }

    // Report coordinates are 1-based.
    MouseParse::Consumed(
        consumed,
        Some(BackendEvent::PointerPress {
            x_px: cx.saturating_sub(1) as u32,
            y_px: cy.saturating_sub(1) as u32,
            modifiers,
        }),
    )
}

fn key_event(byte: u8) -> Option<BackendEvent> {
    let (symbol, modifiers) = match byte {
        0x03 => return Some(BackendEvent::CloseRequested), // Ctrl-C
        b'\r' | b'\n' => (KeySymbol::Enter, Modifiers::empty()),
        0x20..=0x7e => (KeySymbol::Char(byte as char), Modifiers::empty()),
        // Remaining control bytes map to their letter with Control held.
        0x01..=0x1a => (
            KeySymbol::Char((byte - 1 + b'a') as char),
            Modifiers::CONTROL,
        ),
        _ => (KeySymbol::Unknown(byte), Modifiers::empty()),
    };
    Some(BackendEvent::Key { symbol, modifiers })
}

fn sgr_background(color: Rgb) -> String {
    format!("\x1b[0;48;2;{};{};{}m", color.r, color.g, color.b)
}

fn cursor_position(row_1_based: u32, col_1_based: u32) -> String {
    format!("\x1b[{};{}H", row_1_based, col_1_based)
}

/// Input-side state of a terminal descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    /// Bytes are waiting to be read.
    Ready,
    /// Nothing pending; the descriptor is still live.
    Empty,
    /// The peer is gone and no data remains.
    HungUp,
}

/// Zero-timeout poll of `fd` for readable data. A hang-up with bytes
/// still buffered reports `Ready` so the tail of the input is drained
/// before the close is observed.
fn poll_readable(fd: RawFd) -> Result<Readiness> {
    let mut pollfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    // SAFETY: poll reads one pollfd struct; pollfd lives for the call.
    let rc = unsafe { libc::poll(&mut pollfd, 1, 0) };
    if rc == -1 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(Readiness::Empty);
        }
        return Err(anyhow::Error::from(err).context("ConsoleDriver: poll on stdin failed"));
    }
    if rc == 0 {
        return Ok(Readiness::Empty);
    }
    if pollfd.revents & libc::POLLIN != 0 {
        return Ok(Readiness::Ready);
    }
    if pollfd.revents & (libc::POLLHUP | libc::POLLERR | libc::POLLNVAL) != 0 {
        return Ok(Readiness::HungUp);
    }
    Ok(Readiness::Empty)
}

/// Terminal size in character cells via `ioctl(TIOCGWINSZ)`.
fn terminal_size_cells(fd: RawFd) -> Result<(u16, u16)> {
    // SAFETY: ioctl with TIOCGWINSZ writes a winsize struct through the
    // pointer; winsz lives for the duration of the call.
    unsafe {
        let mut winsz: winsize = mem::zeroed();
        if libc::ioctl(fd, TIOCGWINSZ, &mut winsz) == -1 {
            return Err(anyhow::Error::from(io::Error::last_os_error())
                .context("ConsoleDriver: ioctl(TIOCGWINSZ) failed"));
        }
        let cols = if winsz.ws_col == 0 {
            DEFAULT_WIDTH_CELLS
        } else {
            winsz.ws_col
        };
        let rows = if winsz.ws_row == 0 {
            DEFAULT_HEIGHT_CELLS
        } else {
            winsz.ws_row
        };
        Ok((cols, rows))
    }
}
