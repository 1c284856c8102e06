mod config;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use config::Config;
use nbs_core::{NoteSink, NoteTrigger, PlaybackClock, Session, load_song};
use tracing_subscriber::EnvFilter;

/// Stands in for the audio side: every triggered note is logged.
struct LogSink;

impl NoteSink for LogSink {
    fn trigger(&mut self, trigger: NoteTrigger) {
        tracing::info!(
            tick = trigger.tick,
            layer = trigger.layer,
            instrument = trigger.instrument,
            key = trigger.key,
            volume = trigger.volume,
            panning = trigger.panning,
            pitch = trigger.pitch,
            "note"
        );
    }
}

fn frame_interval(config: &Config) -> Duration {
    if config.frame_rate.is_finite() && config.frame_rate > 0.0 {
        Duration::from_secs_f64(1.0 / config.frame_rate)
    } else {
        PlaybackClock::frame_interval()
    }
}

fn main() -> anyhow::Result<()> {
    let config = Config::load();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: nbs_app <song file>")?;

    let mut song = load_song(&path).with_context(|| format!("failed to load {}", path.display()))?;
    if !(song.header.tempo.is_finite() && song.header.tempo > 0.0) {
        tracing::warn!(
            tempo = song.header.tempo,
            fallback = config.default_tempo,
            "song has no valid tempo"
        );
        song.header.tempo = config.default_tempo;
    }
    if config.loop_playback {
        song.header.loop_settings.enabled = true;
    }

    let mut session = Session::from_song(&song)?;
    let Some(length) = session.length_ticks() else {
        tracing::info!(path = %path.display(), "song is empty, nothing to play");
        return Ok(());
    };

    let time = session.time_context();
    tracing::info!(
        title = %session.info().title,
        author = %session.info().author,
        bpm = time.bpm(),
        length = %time.format_duration(length),
        "playing"
    );

    let interval = frame_interval(&config);
    let mut sink = LogSink;
    session.play();
    while session.is_playing() {
        thread::sleep(interval);
        let tick = session.advance(&mut sink);
        tracing::trace!(position = %time.format_position(tick as u32), "frame");
    }

    tracing::info!(loops = session.loops_played(), "playback finished");
    Ok(())
}
