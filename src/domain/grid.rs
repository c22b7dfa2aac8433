/// Grid geometry: fixed row count, level-dependent column count,
/// and the two per-attempt cell sets (safe path, visited cells).
///
/// Row 0 is the top row (goal). Row `ROWS - 1` is the bottom row
/// where every attempt starts.

/// Number of rows. Fixed for the life of the process.
pub const ROWS: usize = 5;

/// Column count at level 1.
pub const BASE_COLS: usize = 2;

/// One extra column every this many levels.
const LEVELS_PER_COLUMN: u32 = 5;

/// Column count for a level: `BASE_COLS + floor((level - 1) / 5)`.
/// Level 0 is treated as level 1.
pub fn cols_for_level(level: u32) -> usize {
    BASE_COLS + (level.saturating_sub(1) / LEVELS_PER_COLUMN) as usize
}

/// Bottom row index, where attempts start.
pub const fn bottom_row() -> usize {
    ROWS - 1
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Coord { row, col }
    }
}

// ── SafePath ──

/// The accepted column for every row of the current level.
///
/// One entry per row by construction. Columns may repeat across rows.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SafePath {
    cols: [usize; ROWS],
}

impl SafePath {
    pub fn from_cols(cols: [usize; ROWS]) -> Self {
        SafePath { cols }
    }

    #[cfg(test)]
    pub fn safe_col(&self, row: usize) -> usize {
        self.cols[row]
    }

    pub fn contains(&self, at: Coord) -> bool {
        at.row < ROWS && self.cols[at.row] == at.col
    }

    /// All safe cells, top row first.
    pub fn cells(&self) -> impl Iterator<Item = Coord> + '_ {
        self.cols.iter().enumerate().map(|(row, &col)| Coord::new(row, col))
    }

    /// Largest column used, for bounds checks against the grid width.
    #[cfg(test)]
    pub fn max_col(&self) -> usize {
        self.cols.iter().copied().max().unwrap_or(0)
    }
}

// ── VisitedSet ──

/// Safe cells confirmed in the current attempt.
/// At most one cell per row, since only safe cells are ever added.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct VisitedSet {
    confirmed: [Option<usize>; ROWS],
}

impl VisitedSet {
    pub fn new() -> Self {
        VisitedSet::default()
    }

    pub fn insert(&mut self, at: Coord) {
        if at.row < ROWS {
            self.confirmed[at.row] = Some(at.col);
        }
    }

    pub fn contains(&self, at: Coord) -> bool {
        at.row < ROWS && self.confirmed[at.row] == Some(at.col)
    }

    /// Has any cell in this row been confirmed?
    pub fn row_cleared(&self, row: usize) -> bool {
        row < ROWS && self.confirmed[row].is_some()
    }

    pub fn clear(&mut self) {
        self.confirmed = [None; ROWS];
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.confirmed.iter().filter(|c| c.is_some()).count()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cells(&self) -> impl Iterator<Item = Coord> + '_ {
        self.confirmed
            .iter()
            .enumerate()
            .filter_map(|(row, col)| col.map(|c| Coord::new(row, c)))
    }
}
