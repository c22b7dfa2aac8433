/// Game simulation: the engine state machine and its clock.
///
/// Nothing in here touches the terminal, audio, or wall time.

pub mod engine;
pub mod event;
pub mod schedule;
pub mod snapshot;
pub mod timer;
