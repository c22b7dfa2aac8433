/// Entry point and game loop.

mod config;
mod domain;
mod logging;
mod sim;
mod ui;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::event::KeyCode;

use config::GameConfig;
use sim::engine::GameEngine;
use sim::event::GameEvent;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

/// Brain Train: recall the hidden safe path, row by row, before time runs out.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Read settings from this file instead of searching for config.toml.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for paths and messages, for a reproducible game.
    #[arg(long, value_name = "N")]
    seed: Option<u64>,
    /// Append log records to this file.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Log level: off, error, warn, info, debug, trace.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
    /// Disable sound.
    #[arg(long)]
    mute: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if let Some(path) = &config.log_file {
        logging::init(path, config.log_level)?;
    }
    for warning in &config.warnings {
        eprintln!("Warning: {warning}");
        log::warn!("{warning}");
    }
    match &config.source {
        Some(path) => log::info!("settings from {}", path.display()),
        None => log::info!("default settings"),
    }

    let mut engine = GameEngine::new(config.timing.clone(), config.seed);
    let mut renderer = Renderer::new();
    renderer.init()?;

    let sound = if config.mute { None } else { SoundEngine::new() };

    let result = game_loop(&mut engine, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = &result {
        log::error!("game loop failed: {e}");
    }
    result?;

    log::info!("quit at level {} with score {}", engine.level(), engine.score());
    println!();
    println!("Thanks for playing Brain Train!");
    println!("Reached level {}, final score: {}", engine.level(), engine.score());
    Ok(())
}

/// File settings with command-line overrides applied.
fn load_config(cli: &Cli) -> Result<GameConfig, Box<dyn std::error::Error>> {
    let mut config = GameConfig::load(cli.config.as_deref())?;
    config.apply_cli(cli.seed, cli.log_file.clone(), cli.log_level.as_deref(), cli.mute)?;
    Ok(config)
}

fn game_loop(
    engine: &mut GameEngine,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> std::io::Result<()> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let frame_sleep = Duration::from_millis(config.frame_ms);
    let mut last_update = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) || gp.quit_pressed() {
            break;
        }

        let mut events = forward_commands(engine, renderer, &kb, &gp);

        let now = Instant::now();
        events.extend(engine.update(now - last_update));
        last_update = now;

        process_sound_events(sound, &events);

        renderer.render(&engine.snapshot(), gp.connected)?;
        std::thread::sleep(frame_sleep);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_SELECT: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

/// Turn this frame's input into engine commands, in arrival order.
/// The engine ignores whatever arrives while input is locked.
fn forward_commands(
    engine: &mut GameEngine,
    renderer: &Renderer,
    kb: &InputState,
    gp: &GamepadState,
) -> Vec<GameEvent> {
    let mut events = Vec::new();

    for code in kb.pressed() {
        if KEYS_LEFT.contains(&code) {
            engine.move_left();
        } else if KEYS_RIGHT.contains(&code) {
            engine.move_right();
        } else if KEYS_UP.contains(&code) {
            engine.move_up();
        } else if KEYS_SELECT.contains(&code) {
            events.extend(engine.select_cell());
        }
    }

    for &(x, y) in kb.clicks() {
        if let Some(at) = renderer.cell_at(x, y) {
            events.extend(engine.select_cell_at(at.row, at.col));
        }
    }

    if gp.left_pressed() {
        engine.move_left();
    }
    if gp.right_pressed() {
        engine.move_right();
    }
    if gp.up_pressed() {
        engine.move_up();
    }
    if gp.select_pressed() {
        events.extend(engine.select_cell());
    }

    events
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::CorrectGuess { .. } => sfx.play_correct(),
            GameEvent::WrongGuess { .. } => sfx.play_wrong(),
            GameEvent::LevelComplete { .. } => sfx.play_level_complete(),
            _ => {}
        }
    }
}
