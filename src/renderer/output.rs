//! Output devices.
//!
//! The render loop hands each finished [`FrameBuffer`] to an [`OutputDevice`].
//! [`TerminalDevice`] drives a real terminal through crossterm:
//!
//! - **Fullscreen**: alternate screen, raw mode, hidden cursor. Only lines
//!   that changed since the previous frame are rewritten; after a resize the
//!   next frame is painted in full.
//! - **Inline**: normal screen buffer. Each frame moves back over the
//!   previous one and redraws it in place, leaving scrollback intact.
//!
//! [`MemoryDevice`] keeps every presented frame for headless runs and tests.

use std::io::{self, Write};

use crossterm::{cursor, execute, terminal};
use tracing::debug;

use super::ansi;
use super::buffer::FrameBuffer;
use crate::error::Result;

// =============================================================================
// Render Mode
// =============================================================================

/// How frames are placed on the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Alternate screen buffer with line diffing.
    #[default]
    Fullscreen,
    /// Normal buffer, redrawn in place each frame.
    Inline,
}

// =============================================================================
// OutputDevice
// =============================================================================

/// Destination for rendered frames.
pub trait OutputDevice {
    /// Current size in cells, `(width, height)`.
    fn size(&self) -> Result<(u16, u16)>;

    /// Take over the terminal (raw mode, screen buffer, cursor).
    fn enter(&mut self) -> Result<()>;

    /// Restore the terminal.
    fn exit(&mut self) -> Result<()>;

    /// Show `frame`; place the cursor at `cursor` (column, row) or hide it.
    fn present(&mut self, frame: &FrameBuffer, cursor: Option<(u16, u16)>) -> Result<()>;

    /// Forget what is on screen so the next frame is drawn in full.
    fn invalidate(&mut self) {}
}

// =============================================================================
// TerminalDevice
// =============================================================================

/// crossterm-backed terminal output.
pub struct TerminalDevice {
    mode: RenderMode,
    out: Vec<u8>,
    previous: Option<Vec<String>>,
    inline_height: u16,
    entered: bool,
}

impl TerminalDevice {
    pub fn new(mode: RenderMode) -> Self {
        Self {
            mode,
            out: Vec::with_capacity(16384),
            previous: None,
            inline_height: 0,
            entered: false,
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    fn write_fullscreen(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        let previous = self.previous.take();
        for (row, line) in frame.lines().iter().enumerate() {
            let unchanged = previous
                .as_ref()
                .and_then(|prev| prev.get(row))
                .is_some_and(|prev| prev == line);
            if unchanged {
                continue;
            }
            ansi::cursor_to(&mut self.out, 0, to_u16(row))?;
            self.out.extend_from_slice(line.as_bytes());
            ansi::reset(&mut self.out)?;
            ansi::erase_to_eol(&mut self.out)?;
        }

        // Rows the new frame no longer covers.
        let stale_rows = previous.as_ref().map_or(0, Vec::len);
        if stale_rows > frame.height() {
            ansi::cursor_to(&mut self.out, 0, to_u16(frame.height()))?;
            ansi::erase_down(&mut self.out)?;
        }

        self.previous = Some(frame.lines().to_vec());
        Ok(())
    }

    fn write_inline(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        if self.inline_height > 1 {
            ansi::cursor_up(&mut self.out, self.inline_height - 1)?;
        }
        ansi::cursor_column_zero(&mut self.out)?;
        ansi::erase_down(&mut self.out)?;

        for (row, line) in frame.lines().iter().enumerate() {
            if row > 0 {
                self.out.extend_from_slice(b"\r\n");
            }
            self.out.extend_from_slice(line.as_bytes());
            ansi::reset(&mut self.out)?;
        }

        self.inline_height = to_u16(frame.height());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&self.out)?;
        stdout.flush()?;
        self.out.clear();
        Ok(())
    }
}

impl OutputDevice for TerminalDevice {
    fn size(&self) -> Result<(u16, u16)> {
        Ok(terminal::size()?)
    }

    fn enter(&mut self) -> Result<()> {
        if self.entered {
            return Ok(());
        }
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        match self.mode {
            RenderMode::Fullscreen => execute!(
                stdout,
                terminal::EnterAlternateScreen,
                cursor::Hide,
                terminal::Clear(terminal::ClearType::All)
            )?,
            RenderMode::Inline => execute!(stdout, cursor::Hide)?,
        }
        self.entered = true;
        self.previous = None;
        self.inline_height = 0;
        debug!(mode = ?self.mode, "terminal entered");
        Ok(())
    }

    fn exit(&mut self) -> Result<()> {
        if !self.entered {
            return Ok(());
        }
        self.entered = false;
        let mut stdout = io::stdout();
        match self.mode {
            RenderMode::Fullscreen => execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen)?,
            RenderMode::Inline => {
                stdout.write_all(b"\r\n")?;
                execute!(stdout, cursor::Show)?;
            }
        }
        terminal::disable_raw_mode()?;
        debug!("terminal restored");
        Ok(())
    }

    fn present(&mut self, frame: &FrameBuffer, cursor: Option<(u16, u16)>) -> Result<()> {
        ansi::begin_sync(&mut self.out)?;
        match self.mode {
            RenderMode::Fullscreen => self.write_fullscreen(frame)?,
            RenderMode::Inline => self.write_inline(frame)?,
        }
        match (self.mode, cursor) {
            (RenderMode::Fullscreen, Some((x, y))) => {
                ansi::cursor_to(&mut self.out, x, y)?;
                self.out.extend_from_slice(b"\x1b[?25h");
            }
            _ => self.out.extend_from_slice(b"\x1b[?25l"),
        }
        ansi::end_sync(&mut self.out)?;
        self.flush()?;
        Ok(())
    }

    fn invalidate(&mut self) {
        self.previous = None;
    }
}

impl Drop for TerminalDevice {
    fn drop(&mut self) {
        // Best effort: never leave the terminal in raw mode.
        let _ = self.exit();
    }
}

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

// =============================================================================
// MemoryDevice
// =============================================================================

/// Headless device that records presented frames.
#[derive(Debug, Clone)]
pub struct MemoryDevice {
    width: u16,
    height: u16,
    frames: Vec<FrameBuffer>,
    cursor: Option<(u16, u16)>,
    entered: bool,
    invalidations: usize,
}

impl MemoryDevice {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            frames: Vec::new(),
            cursor: None,
            entered: false,
            invalidations: 0,
        }
    }

    /// Simulate a terminal resize.
    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn frames(&self) -> &[FrameBuffer] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&FrameBuffer> {
        self.frames.last()
    }

    pub fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    pub fn is_entered(&self) -> bool {
        self.entered
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations
    }
}

impl OutputDevice for MemoryDevice {
    fn size(&self) -> Result<(u16, u16)> {
        Ok((self.width, self.height))
    }

    fn enter(&mut self) -> Result<()> {
        self.entered = true;
        Ok(())
    }

    fn exit(&mut self) -> Result<()> {
        self.entered = false;
        Ok(())
    }

    fn present(&mut self, frame: &FrameBuffer, cursor: Option<(u16, u16)>) -> Result<()> {
        self.frames.push(frame.clone());
        self.cursor = cursor;
        Ok(())
    }

    fn invalidate(&mut self) {
        self.invalidations += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullscreen_diff_skips_unchanged_lines() {
        let mut device = TerminalDevice::new(RenderMode::Fullscreen);
        let first = FrameBuffer::from_text("aaa\nbbb");
        device.write_fullscreen(&first).unwrap();
        device.out.clear();

        let second = FrameBuffer::from_text("aaa\nccc");
        device.write_fullscreen(&second).unwrap();
        let written = String::from_utf8(device.out.clone()).unwrap();
        assert!(!written.contains("aaa"));
        assert!(written.contains("\x1b[2;1Hccc"));
    }

    #[test]
    fn invalidate_forces_full_repaint() {
        let mut device = TerminalDevice::new(RenderMode::Fullscreen);
        let frame = FrameBuffer::from_text("same");
        device.write_fullscreen(&frame).unwrap();
        device.out.clear();
        device.invalidate();
        device.write_fullscreen(&frame).unwrap();
        assert!(String::from_utf8_lossy(&device.out).contains("same"));
    }

    #[test]
    fn shrinking_frame_erases_stale_rows() {
        let mut device = TerminalDevice::new(RenderMode::Fullscreen);
        device.write_fullscreen(&FrameBuffer::from_text("a\nb\nc")).unwrap();
        device.out.clear();
        device.write_fullscreen(&FrameBuffer::from_text("a")).unwrap();
        assert!(String::from_utf8_lossy(&device.out).contains("\x1b[2;1H\x1b[J"));
    }

    #[test]
    fn memory_device_records() {
        let mut device = MemoryDevice::new(10, 2);
        device.present(&FrameBuffer::from_text("hi"), Some((1, 0))).unwrap();
        assert_eq!(device.frames().len(), 1);
        assert_eq!(device.cursor(), Some((1, 0)));
        assert_eq!(device.size().unwrap(), (10, 2));
    }
}
