/// Safe path generation.
///
/// Each row independently draws a uniformly random column. Rows are
/// not linked: consecutive safe cells need not be adjacent.

use rand::Rng;

use super::grid::{SafePath, ROWS};

/// Draw a fresh safe path for a grid `cols` wide.
pub fn generate<R: Rng + ?Sized>(cols: usize, rng: &mut R) -> SafePath {
    debug_assert!(cols > 0, "grid must have at least one column");
    let mut picks = [0usize; ROWS];
    for pick in picks.iter_mut() {
        *pick = rng.gen_range(0..cols);
    }
    SafePath::from_cols(picks)
}

/// Where the engine gets a new path at the start of each level.
pub trait PathSource {
    fn next_path(&mut self, cols: usize) -> SafePath;
}

/// Production source: independent uniform draws from an owned RNG.
pub struct RandomPaths<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomPaths<R> {
    pub fn new(rng: R) -> Self {
        RandomPaths { rng }
    }
}

impl<R: Rng> PathSource for RandomPaths<R> {
    fn next_path(&mut self, cols: usize) -> SafePath {
        let path = generate(cols, &mut self.rng);
        log::debug!("generated safe path {:?} for {} cols", path, cols);
        path
    }
}

/// Replays a fixed list of paths, then keeps repeating the last one.
#[cfg(test)]
pub struct ScriptedPaths {
    paths: Vec<SafePath>,
    next: usize,
}

#[cfg(test)]
impl ScriptedPaths {
    pub fn new(paths: Vec<SafePath>) -> Self {
        assert!(!paths.is_empty());
        ScriptedPaths { paths, next: 0 }
    }
}

#[cfg(test)]
impl PathSource for ScriptedPaths {
    fn next_path(&mut self, cols: usize) -> SafePath {
        let idx = self.next.min(self.paths.len() - 1);
        self.next += 1;
        let path = self.paths[idx];
        assert!(path.max_col() < cols, "scripted path wider than grid");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::Coord;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn one_column_per_row_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for cols in 1..=8 {
            for _ in 0..200 {
                let p = generate(cols, &mut rng);
                assert_eq!(p.cells().count(), ROWS);
                for (row, cell) in p.cells().enumerate() {
                    assert_eq!(cell.row, row);
                    assert!(cell.col < cols);
                }
            }
        }
    }

    #[test]
    fn single_column_grid_is_forced() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = generate(1, &mut rng);
        assert!(p.cells().all(|c| c.col == 0));
    }

    #[test]
    fn every_column_gets_drawn() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [false; 3];
        for _ in 0..100 {
            let p = generate(3, &mut rng);
            seen[p.safe_col(0)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn same_seed_same_path() {
        let mut a = RandomPaths::new(StdRng::seed_from_u64(99));
        let mut b = RandomPaths::new(StdRng::seed_from_u64(99));
        assert_eq!(a.next_path(4), b.next_path(4));
    }

    #[test]
    fn scripted_paths_repeat_last() {
        let first = SafePath::from_cols([1, 0, 1, 0, 1]);
        let second = SafePath::from_cols([0, 0, 0, 0, 0]);
        let mut s = ScriptedPaths::new(vec![first, second]);
        assert_eq!(s.next_path(2), first);
        assert_eq!(s.next_path(2), second);
        assert_eq!(s.next_path(2), second);
        assert!(second.contains(Coord::new(2, 0)));
    }
}
