/// Gamepad input via gilrs.
///
/// Button mapping comes from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick   →  Move left / right / up
///   A / B                →  Select
///   Select               →  Quit
///
/// All queries are edge-triggered: one command per press.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

/// Logical button identifiers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,      // South
    B,      // East
    X,      // West
    Y,      // North
    L1,
    R1,
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER" => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Directions the grid understands. There is no "down".
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Dir {
    Left,
    Right,
    Up,
}

struct ActionMap {
    select: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            select: vec![Btn::A, Btn::B],
            quit: vec![Btn::Select],
        }
    }
}

/// Parse button names, dropping unknown ones.
fn parse_buttons(names: &[String]) -> Vec<Btn> {
    names
        .iter()
        .filter_map(|s| {
            let btn = Btn::from_name(s);
            if btn.is_none() {
                log::warn!("unknown gamepad button name {s:?}");
            }
            btn
        })
        .collect()
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Buttons pressed since the last update, indexed by `Btn`.
    just_pressed: [bool; BTN_COUNT],
    /// Directions pressed since the last update (D-pad or stick edge).
    dirs: Vec<Dir>,
    /// Stick direction currently held, for edge detection.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick: Option<Dir>,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_x: f32,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                log::info!("gamepad support ready (connected: {has_pad})");
                (Some(g), has_pad)
            }
            Err(e) => {
                log::warn!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            just_pressed: [false; BTN_COUNT],
            dirs: Vec::with_capacity(4),
            stick: None,
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Replace the default mapping with configured buttons.
    /// An empty or fully unknown list keeps the default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        let select = parse_buttons(&cfg.select);
        if !select.is_empty() {
            self.action_map.select = select;
        }
        let quit = parse_buttons(&cfg.quit);
        if !quit.is_empty() {
            self.action_map.quit = quit;
        }
    }

    pub fn update(&mut self) {
        self.just_pressed = [false; BTN_COUNT];
        self.dirs.clear();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.press(btn);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    log::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.stick = None;
                    self.stick_x = 0.0;
                    self.stick_y = 0.0;
                }
                _ => {}
            }
        }

        let stick = if self.stick_x < -STICK_DEADZONE {
            Some(Dir::Left)
        } else if self.stick_x > STICK_DEADZONE {
            Some(Dir::Right)
        } else if self.stick_y > STICK_DEADZONE {
            Some(Dir::Up)
        } else {
            None
        };
        if stick.is_some() && stick != self.stick {
            self.dirs.extend(stick);
        }
        self.stick = stick;
    }

    #[cfg(feature = "gamepad")]
    fn press(&mut self, gilrs_btn: Button) {
        match gilrs_btn {
            Button::DPadLeft => self.dirs.push(Dir::Left),
            Button::DPadRight => self.dirs.push(Dir::Right),
            Button::DPadUp => self.dirs.push(Dir::Up),
            other => {
                if let Some(btn) = Btn::from_gilrs(other) {
                    self.just_pressed[btn as usize] = true;
                }
            }
        }
    }

    // ── Action queries ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.just_pressed[b as usize])
    }

    pub fn select_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.select)
    }

    pub fn quit_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.quit)
    }

    pub fn left_pressed(&self) -> bool {
        self.dirs.contains(&Dir::Left)
    }

    pub fn right_pressed(&self) -> bool {
        self.dirs.contains(&Dir::Right)
    }

    pub fn up_pressed(&self) -> bool {
        self.dirs.contains(&Dir::Up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_names_are_case_insensitive() {
        assert_eq!(Btn::from_name("a"), Some(Btn::A));
        assert_eq!(Btn::from_name("South"), Some(Btn::A));
        assert_eq!(Btn::from_name("back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("rb"), Some(Btn::R1));
        assert_eq!(Btn::from_name("Z"), None);
    }

    #[test]
    fn config_overrides_default_mapping() {
        let mut gp = GamepadState::new();
        gp.load_button_config(&GamepadConfig {
            select: vec!["X".into(), "bogus".into()],
            quit: vec![],
        });
        assert_eq!(gp.action_map.select, vec![Btn::X]);
        assert_eq!(gp.action_map.quit, vec![Btn::Select]);
    }

    #[test]
    fn nothing_pressed_after_update() {
        let mut gp = GamepadState::new();
        gp.just_pressed[Btn::A as usize] = true;
        gp.dirs.push(Dir::Left);
        assert!(gp.select_pressed());
        assert!(gp.left_pressed());
        gp.update();
        assert!(!gp.select_pressed());
        assert!(!gp.left_pressed());
        assert!(!gp.quit_pressed());
    }
}
