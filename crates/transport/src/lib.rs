use std::time::{Duration, Instant};

/// Scheduling resolution of the playback clock, independent of the musical tempo.
pub const FRAME_RATE: f64 = 60.0;

/// Expected wall-clock time between two `advance` calls, in milliseconds.
pub const FRAME_MS: f64 = 1000.0 / FRAME_RATE;

/// Beats per minute shown for one tick per second.
pub const BPM_PER_TPS: f64 = 15.0;

/// Tempo of a freshly created clock, in ticks per second.
pub const DEFAULT_TEMPO: f64 = 10.0;

/// Convert a tempo in ticks per second to the BPM shown to users.
pub fn tps_to_bpm(tps: f64) -> f64 {
    tps * BPM_PER_TPS
}

/// Convert a BPM value back to ticks per second.
pub fn bpm_to_tps(bpm: f64) -> f64 {
    bpm / BPM_PER_TPS
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ClockError {
    #[error("Invalid tempo {0}: must be a positive number of ticks per second")]
    InvalidTempo(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl TransportState {
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }
}

/// Handle returned by [`PlaybackClock::on_position_changed`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type PositionCallback = Box<dyn FnMut(f64)>;

/// Fractional tick counter driven by a periodic scheduler.
///
/// Every `advance` scales the nominal per-frame step (`tempo / 60`) by the ratio
/// of the real elapsed time to the expected frame interval, so ticks per real
/// second stay accurate when the scheduler delivers frames late or early. A
/// stall therefore produces one large step rather than lost time.
///
/// Position notifications are delivered synchronously, observers first (in
/// registration order) and the tick callback last. `current_tick` already holds
/// the new value when they run.
///
/// # Examples
///
/// ```
/// use nbs_transport::PlaybackClock;
/// use std::time::{Duration, Instant};
///
/// let mut clock = PlaybackClock::new(20.0).unwrap();
/// clock.start();
///
/// let t0 = Instant::now();
/// clock.advance_at(t0);
/// // a frame delivered twice as late as expected advances twice as far
/// clock.advance_at(t0 + Duration::from_secs_f64(2.0 / 60.0));
/// assert!((clock.current_tick() - 1.0).abs() < 1e-6);
/// ```
pub struct PlaybackClock {
    tempo: f64,
    current_tick: f64,
    state: TransportState,
    last_tick_timestamp: Option<Instant>,
    observers: Vec<(ObserverId, PositionCallback)>,
    tick_callback: Option<PositionCallback>,
    next_observer_id: u64,
}

impl PlaybackClock {
    pub fn new(tempo: f64) -> Result<Self, ClockError> {
        validate_tempo(tempo)?;
        Ok(Self {
            tempo,
            current_tick: 0.0,
            state: TransportState::Stopped,
            last_tick_timestamp: None,
            observers: Vec::new(),
            tick_callback: None,
            next_observer_id: 0,
        })
    }

    /// Change the tempo. Takes effect on the next advance; the position is kept.
    pub fn set_tempo(&mut self, tps: f64) -> Result<(), ClockError> {
        validate_tempo(tps)?;
        tracing::debug!(from = self.tempo, to = tps, "tempo changed");
        self.tempo = tps;
        Ok(())
    }

    pub fn start(&mut self) {
        tracing::debug!(tick = self.current_tick, "clock started");
        self.state = TransportState::Playing;
        self.last_tick_timestamp = None;
    }

    /// Halt and rewind to tick 0, notifying observers of the reset.
    pub fn stop(&mut self) {
        tracing::debug!(tick = self.current_tick, "clock stopped");
        self.state = TransportState::Stopped;
        self.last_tick_timestamp = None;
        self.current_tick = 0.0;
        self.notify();
    }

    /// Halt without moving the playhead.
    pub fn pause(&mut self) {
        if self.state.is_playing() {
            tracing::debug!(tick = self.current_tick, "clock paused");
            self.state = TransportState::Paused;
        }
        self.last_tick_timestamp = None;
    }

    /// Move the playhead. Negative (and NaN) positions clamp to 0.
    pub fn set_position(&mut self, tick: f64) {
        self.current_tick = if tick > 0.0 { tick } else { 0.0 };
        self.notify();
    }

    pub fn advance(&mut self) -> f64 {
        self.advance_at(Instant::now())
    }

    /// Advance as if the scheduler fired at `now`. Returns the new position.
    ///
    /// Does nothing while the clock is not running.
    pub fn advance_at(&mut self, now: Instant) -> f64 {
        if !self.is_running() {
            return self.current_tick;
        }

        let nominal_step = self.tempo / FRAME_RATE;
        let step = match self.last_tick_timestamp {
            Some(last) => {
                // An Instant earlier than the previous frame saturates to zero elapsed.
                let elapsed_ms = now.saturating_duration_since(last).as_secs_f64() * 1000.0;
                nominal_step * (elapsed_ms / FRAME_MS)
            }
            None => nominal_step,
        };

        self.last_tick_timestamp = Some(now);
        self.current_tick += step;
        self.notify();
        self.current_tick
    }

    /// Register a position observer. Observers run in registration order.
    pub fn on_position_changed(&mut self, callback: impl FnMut(f64) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        self.observers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if `id` was not registered.
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer, _)| *observer != id);
        self.observers.len() != before
    }

    /// Install the per-tick callback, replacing any previous one.
    pub fn set_tick_callback(&mut self, callback: impl FnMut(f64) + 'static) {
        self.tick_callback = Some(Box::new(callback));
    }

    pub fn clear_tick_callback(&mut self) {
        self.tick_callback = None;
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn bpm(&self) -> f64 {
        tps_to_bpm(self.tempo)
    }

    pub fn current_tick(&self) -> f64 {
        self.current_tick
    }

    /// Position rounded to the nearest whole tick, for display.
    pub fn display_tick(&self) -> u64 {
        self.current_tick.round() as u64
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_playing()
    }

    /// Interval at which the scheduler is expected to call `advance`.
    pub fn frame_interval() -> Duration {
        Duration::from_secs_f64(1.0 / FRAME_RATE)
    }

    fn notify(&mut self) {
        let tick = self.current_tick;
        for (_, callback) in self.observers.iter_mut() {
            callback(tick);
        }
        if let Some(callback) = self.tick_callback.as_mut() {
            callback(tick);
        }
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self {
            tempo: DEFAULT_TEMPO,
            current_tick: 0.0,
            state: TransportState::Stopped,
            last_tick_timestamp: None,
            observers: Vec::new(),
            tick_callback: None,
            next_observer_id: 0,
        }
    }
}

impl std::fmt::Debug for PlaybackClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackClock")
            .field("tempo", &self.tempo)
            .field("current_tick", &self.current_tick)
            .field("state", &self.state)
            .field("last_tick_timestamp", &self.last_tick_timestamp)
            .field("observers", &self.observers.len())
            .field("tick_callback", &self.tick_callback.is_some())
            .finish()
    }
}

fn validate_tempo(tps: f64) -> Result<(), ClockError> {
    if tps.is_finite() && tps > 0.0 {
        Ok(())
    } else {
        Err(ClockError::InvalidTempo(tps))
    }
}
