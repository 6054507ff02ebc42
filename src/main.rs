use note_trainer::console_display;
use note_trainer::controller::Controller;
use note_trainer::json_output;
use note_trainer::keyboard;
use note_trainer::sound::{SilentSound, TickSound};
use note_trainer::types::*;

use clap::Parser;
use crossbeam_channel::unbounded;
use log::info;
use std::thread;

#[derive(Parser)]
#[command(name = "note-trainer")]
#[command(about = "Shows a random note on every beat for note-recognition practice")]
struct Cli {
    /// Tempo in beats per minute (clamped to 40–180)
    #[arg(long, default_value_t = BPM_DEFAULT as i64, allow_negative_numbers = true)]
    bpm: i64,

    /// Note set to draw from
    #[arg(long, value_enum, default_value_t = Scale::Major)]
    scale: Scale,

    /// Start ticking immediately instead of waiting for the Start command
    #[arg(long)]
    start: bool,

    /// Do not play the tick sound
    #[arg(long)]
    mute: bool,

    /// Seed the note RNG for a reproducible sequence
    #[arg(long)]
    seed: Option<u64>,

    /// Emit views as JSON lines on stdout instead of drawing the panel
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let cli = Cli::parse();
    let params = Params::new(cli.bpm, cli.scale);

    info!("═══════════════════════════════════════════════");
    info!("  NOTE TRAINER v{}", env!("CARGO_PKG_VERSION"));
    info!("  Tempo: {} bpm   Scale: {}", params.bpm, params.scale);
    info!("  Sound: {}", if cli.mute { "muted" } else { TICK_ASSET_PATH });
    info!("  UI: {}", if cli.json { "JSON lines" } else { "Console" });
    info!("═══════════════════════════════════════════════");

    // Channel: keyboard → controller
    let (cmd_tx, cmd_rx) = unbounded::<Command>();
    // Channel: controller → display
    let (view_tx, view_rx) = unbounded::<View>();

    // ─── Display ────────────────────────────────────────────────────
    let display = if cli.json {
        thread::Builder::new().name("json".into()).spawn(move || {
            json_output::JsonOutput::stdout(view_rx).run();
        }).unwrap()
    } else {
        thread::Builder::new().name("display".into()).spawn(move || {
            console_display::ConsoleDisplay::new(view_rx).run();
        }).unwrap()
    };

    // ─── Keyboard input ─────────────────────────────────────────────
    // Detached: it blocks on stdin and ends with the process.
    let kb_tx = cmd_tx.clone();
    thread::Builder::new().name("keyboard".into()).spawn(move || {
        keyboard::KeyboardInput::new(kb_tx).run();
    }).unwrap();

    if cli.start {
        let _ = cmd_tx.send(Command::Start);
    }
    drop(cmd_tx);

    // ─── Controller on the main thread ──────────────────────────────
    let mut controller = Controller::new(params, open_sound(cli.mute));
    if let Some(seed) = cli.seed {
        controller = controller.with_seed(seed);
    }
    controller.run(cmd_rx, vec![view_tx]);
    drop(controller);

    let _ = display.join();
}

#[cfg(feature = "audio")]
fn open_sound(mute: bool) -> Box<dyn TickSound> {
    use log::warn;
    use note_trainer::audio_output::CpalTickPlayer;
    use note_trainer::sound::TickSample;
    use std::path::Path;

    if mute {
        return Box::new(SilentSound);
    }
    match TickSample::load(Path::new(TICK_ASSET_PATH)).and_then(CpalTickPlayer::open) {
        Ok(player) => Box::new(player),
        Err(e) => {
            warn!("Tick sound disabled: {}", e);
            Box::new(SilentSound)
        }
    }
}

#[cfg(not(feature = "audio"))]
fn open_sound(mute: bool) -> Box<dyn TickSound> {
    if !mute {
        log::warn!("Built without the 'audio' feature; running silent.");
    }
    Box::new(SilentSound)
}
