/// Terminal presentation adapter: renders engine snapshots, turns
/// keyboard, mouse and gamepad input into engine commands, and plays
/// sound for engine events.

pub mod gamepad;
pub mod input;
pub mod renderer;
pub mod sound;
