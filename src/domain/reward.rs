/// Level-clear rewards: score delta and the flavor headline.
///
/// Headline selection is two steps: pick a category from the clear
/// conditions, then pick uniformly within that category's pool.

use rand::seq::SliceRandom;
use rand::Rng;

/// At or below this many seconds left, the time-crunch pool is used.
pub const TIME_CRUNCH_SECONDS: u32 = 5;

const BASE_REWARD: u32 = 100;
const PER_LEVEL_REWARD: u32 = 10;
const FLAWLESS_BONUS: u32 = 200;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Category {
    TimeCrunch,
    Flawless,
    Good,
    Okay,
    Retry,
}

const TIME_CRUNCH: &[&str] = &[
    "Just in time!",
    "Phew, down to the wire!",
    "Clutch finish!",
    "That was close!",
];

const FLAWLESS: &[&str] = &[
    "You're on a roll!",
    "Wow, that was fast — keep it going!",
    "Fantastic focus!",
    "Boom! Nailed it.",
    "Impressive!",
    "Crushing it!",
];

const GOOD: &[&str] = &[
    "Nice! Your memory is sharp.",
    "Great pace — next one!",
    "Smooth moves!",
    "Keep that streak alive!",
];

const OKAY: &[&str] = &[
    "Got there in the end!",
    "Persistence pays off.",
    "Solid recovery!",
];

const RETRY: &[&str] = &[
    "Tough one, but you made it!",
    "Never give up!",
    "Practice makes perfect.",
];

impl Category {
    pub fn pool(self) -> &'static [&'static str] {
        match self {
            Category::TimeCrunch => TIME_CRUNCH,
            Category::Flawless => FLAWLESS,
            Category::Good => GOOD,
            Category::Okay => OKAY,
            Category::Retry => RETRY,
        }
    }
}

/// Encouragement tier by mistakes made during the level.
pub fn pick_tier(mistakes: u32) -> Category {
    match mistakes {
        0 => Category::Flawless,
        1..=2 => Category::Good,
        3..=5 => Category::Okay,
        _ => Category::Retry,
    }
}

/// Category for a clear, with time pressure taking precedence.
pub fn pick_category(remaining_seconds: u32, mistakes: u32) -> Category {
    if remaining_seconds <= TIME_CRUNCH_SECONDS {
        Category::TimeCrunch
    } else {
        pick_tier(mistakes)
    }
}

pub fn pick_message<R: Rng + ?Sized>(category: Category, rng: &mut R) -> &'static str {
    category.pool().choose(rng).copied().unwrap_or("Level cleared!")
}

/// Points for clearing `level`.
pub fn score_delta(level: u32, flawless: bool) -> u32 {
    let bonus = if flawless { FLAWLESS_BONUS } else { 0 };
    BASE_REWARD + level * PER_LEVEL_REWARD + bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn tiers_by_mistake_count() {
        assert_eq!(pick_tier(0), Category::Flawless);
        assert_eq!(pick_tier(1), Category::Good);
        assert_eq!(pick_tier(2), Category::Good);
        assert_eq!(pick_tier(3), Category::Okay);
        assert_eq!(pick_tier(5), Category::Okay);
        assert_eq!(pick_tier(6), Category::Retry);
        assert_eq!(pick_tier(100), Category::Retry);
    }

    #[test]
    fn time_crunch_overrides_tier() {
        assert_eq!(pick_category(5, 0), Category::TimeCrunch);
        assert_eq!(pick_category(0, 9), Category::TimeCrunch);
        assert_eq!(pick_category(6, 0), Category::Flawless);
        assert_eq!(pick_category(30, 4), Category::Okay);
    }

    #[test]
    fn message_comes_from_pool() {
        let mut rng = StdRng::seed_from_u64(3);
        for cat in [
            Category::TimeCrunch,
            Category::Flawless,
            Category::Good,
            Category::Okay,
            Category::Retry,
        ] {
            for _ in 0..20 {
                let msg = pick_message(cat, &mut rng);
                assert!(cat.pool().contains(&msg));
            }
        }
    }

    #[test]
    fn score_formula() {
        assert_eq!(score_delta(1, false), 110);
        assert_eq!(score_delta(1, true), 310);
        assert_eq!(score_delta(7, true), 100 + 70 + 200);
        assert_eq!(score_delta(12, false), 220);
    }
}
