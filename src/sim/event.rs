/// Events emitted by engine commands and clock updates.
/// The presentation layer consumes these for sound and logging.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ResetCause {
    Mistake,
    TimeExpired,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(dead_code)]
pub enum GameEvent {
    CorrectGuess { row: usize, col: usize },
    WrongGuess { row: usize, col: usize },
    LevelComplete { level: u32, delta: u32, flawless: bool },
    TimeExpired,
    AttemptReset { cause: ResetCause },
    LevelStarted { level: u32, cols: usize },
}
