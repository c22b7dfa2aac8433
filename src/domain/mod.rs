/// Pure game rules: grid geometry, path generation, rewards.
/// No timing and no I/O.

pub mod grid;
pub mod path;
pub mod reward;
