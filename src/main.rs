// Chordgrid demo runner
// Records a short phrase over one loop, plays it back with the metronome and strums a chord

use std::time::Duration;

use chordgrid::{
    AudioOutput, ClockSource, EngineConfig, EngineResult, GridKey, LogVoicePort, PlaybackEngine,
    SystemClock, VoicePort,
};

/// (beat, x, y) of the recorded phrase
const PHRASE: [(f64, u16, u16); 6] = [
    (0.0, 0, 0),
    (1.0, 4, 0),
    (2.0, 2, 1),
    (3.0, 7, 1),
    (4.5, 5, 1),
    (6.0, 0, 1),
];

/// C major triad: C3, E3, G3
const CHORD: [(u16, u16); 3] = [(0, 0), (4, 0), (2, 1)];

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => {
                log::info!("loaded configuration from {}", path);
                config
            }
            Err(e) => {
                log::error!("cannot load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };
    log::info!("tempo: {}", config.tempo);

    let result = match AudioOutput::open(config.grid) {
        Ok((output, voices)) => {
            log::info!(
                "audio output at {} Hz, {} channels",
                output.sample_rate(),
                output.channels()
            );
            run(&config, output.clock(), voices)
        }
        Err(e) => {
            log::warn!("{}; running headless", e);
            run(&config, SystemClock::new(), LogVoicePort::new(config.grid))
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run<C: ClockSource, V: VoicePort>(
    config: &EngineConfig,
    clock: C,
    voices: V,
) -> EngineResult<()> {
    let mut engine = PlaybackEngine::from_config(config, clock, voices)?;

    for (x, y) in CHORD {
        engine.toggle_chord_key(0, GridKey::new(x, y))?;
    }
    engine.rename_chord(0, "C major")?;

    let tempo = *engine.tempo();
    let loop_seconds = tempo.loop_duration_seconds();
    let interval = Duration::from_secs_f64(config.tick_interval_seconds());

    engine.set_metronome_enabled(true);
    engine.set_recording(true);
    let started_at = engine.clock().now();
    engine.start();

    let mut phrase = PHRASE.iter().peekable();
    let mut strummed = false;

    loop {
        // Voice failures are reported, never retried
        if let Err(e) = engine.update() {
            log::warn!("control tick failed: {}", e);
        }

        let elapsed = engine.clock().now() - started_at;

        while let Some(&&(beat, x, y)) = phrase.peek() {
            if elapsed < tempo.beats_to_seconds(beat) {
                break;
            }
            let key = GridKey::new(x, y);
            if engine.record_note(key).is_some() {
                log::info!("recorded {}", engine.layout().label(key));
            }
            phrase.next();
        }

        if elapsed >= loop_seconds && !strummed {
            engine.set_recording(false);
            if let Err(e) = engine.play_chord(0) {
                log::warn!("chord failed: {}", e);
            }
            strummed = true;
        }

        if elapsed >= 2.0 * loop_seconds {
            break;
        }

        std::thread::sleep(interval);
    }

    engine.stop()?;
    log::info!(
        "done: {} notes recorded, transport {} at bar {}",
        engine.recorded_notes().len(),
        engine.snapshot().transport,
        engine.transport().bar_and_beat().0
    );
    Ok(())
}
