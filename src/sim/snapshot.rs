/// Read-only view of the engine handed to the presentation layer.
///
/// Built fresh each frame; the adapter never holds engine state.

use crate::domain::grid::Coord;
use super::engine::Phase;
use super::timer::TimerBucket;

/// End-of-level overlay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Overlay {
    /// Reward headline, "Level n Passed!", "Prepare for Level n+1!".
    pub lines: [String; 3],
    pub flawless: bool,
}

#[derive(Clone, Debug)]
pub struct Snapshot {
    pub phase: Phase,
    pub level: u32,
    pub rows: usize,
    pub cols: usize,
    pub cursor: Coord,
    pub visited: Vec<Coord>,
    pub wrong_flash: Option<Coord>,
    /// Safe cells taking part in the celebration blink.
    pub blinking: Vec<Coord>,
    pub blink_on: bool,
    pub input_locked: bool,
    pub remaining_seconds: u32,
    pub timer_bucket: TimerBucket,
    pub timer_flashing: bool,
    pub mistakes_in_level: u32,
    pub score: u32,
    pub status: String,
    pub overlay: Option<Overlay>,
}

/// Per-cell render flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellView {
    pub active: bool,
    pub visited: bool,
    pub wrong: bool,
    pub lit: bool,
}

impl Snapshot {
    pub fn cell(&self, at: Coord) -> CellView {
        CellView {
            active: self.cursor == at,
            visited: self.visited.contains(&at),
            wrong: self.wrong_flash == Some(at),
            lit: self.blink_on && self.blinking.contains(&at),
        }
    }
}
