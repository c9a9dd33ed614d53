/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use config::GameConfig;
use domain::catalog::Catalog;
use sim::controller::Controller;
use sim::event::GameEvent;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{cue_for, SoundEngine};

fn main() -> ExitCode {
    let database = std::env::args_os().nth(1).map(PathBuf::from);
    let config = GameConfig::load(database);
    init_logging(&config);

    for warning in &config.warnings {
        log::warn!("config: {warning}");
    }
    log::info!("Starting pixelated {}", env!("CARGO_PKG_VERSION"));

    // The terminal stays untouched until the images are in memory.
    let images = match sim::store::load_images(&config.database) {
        Ok(images) => images,
        Err(e) => {
            log::error!("{e}");
            eprintln!("Cannot start: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut controller = Controller::new(Catalog::new(images), config.settings);

    let mut renderer = Renderer::new();
    let honor_release = match renderer.init() {
        Ok(enhanced) => enhanced,
        Err(e) => {
            let _ = renderer.cleanup();
            eprintln!("Terminal init failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let sound = SoundEngine::new();

    let result = game_loop(&mut controller, &mut renderer, sound.as_ref(), &config, honor_release);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(()) => {
            log::info!("Session ended");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Game error: {e}");
            eprintln!("Game error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Route `log` output to the configured file. Raw mode owns the terminal, so
/// without a log file nothing is logged at all.
fn init_logging(config: &GameConfig) {
    let Some(path) = &config.log_file else { return };
    let file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Cannot open log file {}: {e}", path.display());
            return;
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn game_loop(
    controller: &mut Controller,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    honor_release: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let frame_sleep = Duration::from_millis(config.frame_ms);
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            log::info!("Interrupted");
            break;
        }
        if let Some((w, h)) = kb.resized() {
            renderer.on_resize(w, h);
        }

        controller
            .actions_mut()
            .observe_all(|action| kb.action_held(action) || gp.action_held(action));
        controller.process_input();

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;
        controller.update(dt);

        process_events(sound, &controller.drain_events());

        if controller.quit_requested() {
            break;
        }

        renderer.render(&controller.frame(), gp.connected)?;
        std::thread::sleep(frame_sleep);
    }

    Ok(())
}

fn process_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    for event in events {
        if let (Some(sfx), Some(cue)) = (sound, cue_for(event)) {
            sfx.play(cue);
        }
    }
}
