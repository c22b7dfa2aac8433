/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame from an engine `Snapshot` into `front`
///   2. Compare each cell with `back` (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The renderer also remembers where the grid was drawn so mouse
/// clicks can be mapped back to grid cells.

use std::io::{self, BufWriter, Write};
use std::time::Instant;

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::grid::Coord;
use crate::sim::engine::Phase;
use crate::sim::snapshot::{CellView, Overlay, Snapshot};
use crate::sim::timer::TimerBucket;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every empty terminal cell, so row gaps
    /// match cell colour on terminals that paint them separately.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 18, b: 30 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Never produced by composing; forces a full repaint when it
    /// fills the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        let x = self.width.saturating_sub(len) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    fn fill(&mut self, x: usize, y: usize, w: usize, h: usize, bg: Color) {
        for yy in y..y + h {
            for xx in x..x + w {
                self.set(xx, yy, Cell::new(' ', Color::White, bg));
            }
        }
    }
}

// ── Layout ──

/// Terminal columns per grid cell, including a one-column gap.
const CELL_W: usize = 9;
/// Terminal rows per grid cell, including a one-row gap.
const CELL_H: usize = 4;

const TITLE_ROW: usize = 0;
const HUD_ROW: usize = 2;
const GRID_ROW: usize = 4;

/// Blink period for the expired countdown.
const FLASH_PERIOD_MS: u128 = 250;

// ── Palette ──

const TITLE_FG: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const TEXT_FG: Color = Color::Rgb { r: 200, g: 200, b: 210 };
const DIM_FG: Color = Color::Rgb { r: 120, g: 120, b: 140 };
const CELL_BG: Color = Color::Rgb { r: 48, g: 52, b: 74 };
const ACTIVE_BG: Color = Color::Rgb { r: 90, g: 96, b: 140 };
const VISITED_BG: Color = Color::Rgb { r: 30, g: 110, b: 80 };
const LIT_BG: Color = Color::Rgb { r: 43, g: 179, b: 107 };
const WRONG_BG: Color = Color::Rgb { r: 200, g: 50, b: 50 };
const OK_FG: Color = Color::Rgb { r: 120, g: 220, b: 140 };
const WARN_FG: Color = Color::Rgb { r: 250, g: 200, b: 60 };
const DANGER_FG: Color = Color::Rgb { r: 250, g: 80, b: 80 };
const OVERLAY_BG: Color = Color::Rgb { r: 30, g: 30, b: 48 };
const FLAWLESS_BG: Color = Color::Rgb { r: 70, g: 50, b: 10 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    started: Instant,
    /// Left edge of the grid and its size, from the last frame.
    grid_x: usize,
    grid_rows: usize,
    grid_cols: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            started: Instant::now(),
            grid_x: 0,
            grid_rows: 0,
            grid_cols: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Map a terminal position to the grid cell drawn there, if any.
    pub fn cell_at(&self, x: u16, y: u16) -> Option<Coord> {
        let (x, y) = (x as usize, y as usize);
        if x < self.grid_x || y < GRID_ROW {
            return None;
        }
        let (dx, dy) = (x - self.grid_x, y - GRID_ROW);
        // Gaps between cells are not part of any cell.
        if dx % CELL_W == CELL_W - 1 || dy % CELL_H == CELL_H - 1 {
            return None;
        }
        let (col, row) = (dx / CELL_W, dy / CELL_H);
        (row < self.grid_rows && col < self.grid_cols).then(|| Coord::new(row, col))
    }

    pub fn render(&mut self, snap: &Snapshot, gamepad: bool) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        self.compose_header(snap);
        let below_grid = self.compose_grid(snap);
        self.compose_footer(snap, below_grid, gamepad);
        if let Some(overlay) = &snap.overlay {
            self.compose_overlay(overlay);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn flash_on(&self) -> bool {
        (self.started.elapsed().as_millis() / FLASH_PERIOD_MS) % 2 == 0
    }

    fn compose_header(&mut self, s: &Snapshot) {
        self.front.put_centered(TITLE_ROW, "Brain Train - Memory Challenge", TITLE_FG, Color::Reset);

        let timer_fg = match s.timer_bucket {
            TimerBucket::Ok => OK_FG,
            TimerBucket::Warn => WARN_FG,
            TimerBucket::Danger => DANGER_FG,
        };
        let level = format!("Level {}", s.level);
        let score = format!("Score {}", s.score);
        let time = if s.timer_flashing && !self.flash_on() {
            "Time   ".to_string()
        } else {
            format!("Time {:>2}", s.remaining_seconds)
        };
        let mistakes = format!("Mistakes {}", s.mistakes_in_level);

        let parts = [
            (level, TEXT_FG),
            (score, TEXT_FG),
            (time, timer_fg),
            (mistakes, DIM_FG),
        ];
        let total: usize = parts.iter().map(|(t, _)| t.chars().count() + 4).sum();
        let mut x = self.front.width.saturating_sub(total) / 2;
        for (text, fg) in &parts {
            self.front.put_str(x, HUD_ROW, text, *fg, Color::Reset);
            x += text.chars().count() + 4;
        }
    }

    /// Draw the grid and return the first free row below it.
    fn compose_grid(&mut self, s: &Snapshot) -> usize {
        let grid_w = s.cols * CELL_W - 1;
        self.grid_x = self.front.width.saturating_sub(grid_w) / 2;
        self.grid_rows = s.rows;
        self.grid_cols = s.cols;

        for row in 0..s.rows {
            for col in 0..s.cols {
                let at = Coord::new(row, col);
                let view = s.cell(at);
                let x = self.grid_x + col * CELL_W;
                let y = GRID_ROW + row * CELL_H;
                self.compose_cell(x, y, view, s.input_locked);
            }
        }
        GRID_ROW + s.rows * CELL_H
    }

    fn compose_cell(&mut self, x: usize, y: usize, view: CellView, locked: bool) {
        let bg = if view.wrong {
            WRONG_BG
        } else if view.lit {
            LIT_BG
        } else if view.visited {
            VISITED_BG
        } else if view.active {
            ACTIVE_BG
        } else {
            CELL_BG
        };
        self.front.fill(x, y, CELL_W - 1, CELL_H - 1, bg);

        if view.wrong {
            self.front.put_str(x + 3, y + 1, "✗", Color::White, bg);
        } else if view.lit || view.visited {
            self.front.put_str(x + 3, y + 1, "✓", Color::White, bg);
        }
        if view.active && !locked {
            self.front.put_str(x, y, "┏", TITLE_FG, bg);
            self.front.put_str(x + CELL_W - 2, y, "┓", TITLE_FG, bg);
            self.front.put_str(x, y + CELL_H - 2, "┗", TITLE_FG, bg);
            self.front.put_str(x + CELL_W - 2, y + CELL_H - 2, "┛", TITLE_FG, bg);
        }
    }

    fn compose_footer(&mut self, s: &Snapshot, y: usize, gamepad: bool) {
        if !s.status.is_empty() {
            let fg = match s.phase {
                Phase::TimeExpiredFlash => DANGER_FG,
                _ => OK_FG,
            };
            self.front.put_centered(y + 1, &s.status, fg, Color::Reset);
        }
        let help = if gamepad {
            "D-pad/stick move   A select   Select quit"
        } else {
            "←/→ move   ↑ climb   Space/Enter select   click to tap   Esc quit"
        };
        self.front.put_centered(y + 3, help, DIM_FG, Color::Reset);
    }

    fn compose_overlay(&mut self, overlay: &Overlay) {
        let (bg, border) = if overlay.flawless {
            (FLAWLESS_BG, TITLE_FG)
        } else {
            (OVERLAY_BG, TEXT_FG)
        };
        let text_w = overlay.lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let box_w = (text_w + 8).min(self.front.width);
        let box_h = overlay.lines.len() + 4;
        let box_x = self.front.width.saturating_sub(box_w) / 2;
        let box_y = GRID_ROW + 4;

        self.front.fill(box_x, box_y, box_w, box_h, bg);
        let horiz: String = "─".repeat(box_w.saturating_sub(2));
        self.front.put_str(box_x, box_y, &format!("┌{horiz}┐"), border, bg);
        self.front.put_str(box_x, box_y + box_h - 1, &format!("└{horiz}┘"), border, bg);
        let right = (box_x + box_w).saturating_sub(1);
        for yy in box_y + 1..box_y + box_h - 1 {
            self.front.put_str(box_x, yy, "│", border, bg);
            self.front.put_str(right, yy, "│", border, bg);
        }

        for (i, line) in overlay.lines.iter().enumerate() {
            let fg = if i == 0 { TITLE_FG } else { TEXT_FG };
            let len = line.chars().count();
            let x = box_x + box_w.saturating_sub(len) / 2;
            self.front.put_str(x, box_y + 2 + i, line, fg, bg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clicks_map_to_cells_and_skip_gaps() {
        let mut r = Renderer::new();
        r.grid_x = 10;
        r.grid_rows = 5;
        r.grid_cols = 2;

        let top = GRID_ROW as u16;
        assert_eq!(r.cell_at(10, top), Some(Coord::new(0, 0)));
        assert_eq!(r.cell_at(10 + CELL_W as u16, top + 1), Some(Coord::new(0, 1)));
        assert_eq!(r.cell_at(12, top + (4 * CELL_H) as u16), Some(Coord::new(4, 0)));
        // Gap column between cells, gap row below a cell.
        assert_eq!(r.cell_at(10 + CELL_W as u16 - 1, top), None);
        assert_eq!(r.cell_at(10, top + CELL_H as u16 - 1), None);
        // Outside the grid.
        assert_eq!(r.cell_at(9, top), None);
        assert_eq!(r.cell_at(10, top - 1), None);
        assert_eq!(r.cell_at(10 + (2 * CELL_W) as u16, top), None);
        assert_eq!(r.cell_at(10, top + (5 * CELL_H) as u16), None);
    }
}
