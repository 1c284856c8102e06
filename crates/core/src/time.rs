use nbs_transport::tps_to_bpm;

/// Note block songs subdivide every beat into four ticks.
pub const TICKS_PER_BEAT: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub beats_per_measure: u32,
}

impl TimeSignature {
    pub fn new(beats_per_measure: u32) -> Self {
        Self {
            beats_per_measure: beats_per_measure.max(1),
        }
    }

    pub fn ticks_per_measure(&self) -> u32 {
        TICKS_PER_BEAT * self.beats_per_measure
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::new(4)
    }
}

impl From<u32> for TimeSignature {
    fn from(beats_per_measure: u32) -> Self {
        Self::new(beats_per_measure)
    }
}

impl From<TimeSignature> for u32 {
    fn from(ts: TimeSignature) -> Self {
        ts.beats_per_measure
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeContext {
    /// Ticks per second.
    pub tempo: f64,
    pub time_signature: TimeSignature,
}

impl TimeContext {
    pub fn new(tempo: f64, time_signature: impl Into<TimeSignature>) -> Self {
        Self {
            tempo,
            time_signature: time_signature.into(),
        }
    }

    pub fn bpm(&self) -> f64 {
        tps_to_bpm(self.tempo)
    }

    pub fn ticks_to_seconds(&self, ticks: f64) -> f64 {
        ticks / self.tempo
    }

    pub fn seconds_to_ticks(&self, seconds: f64) -> f64 {
        seconds * self.tempo
    }

    pub fn format_position(&self, tick: u32) -> MusicalPosition {
        let ticks_per_measure = self.time_signature.ticks_per_measure();

        MusicalPosition {
            measure: tick / ticks_per_measure + 1,
            beat: (tick % ticks_per_measure) / TICKS_PER_BEAT + 1,
            tick: tick % TICKS_PER_BEAT,
        }
    }

    /// Song length as `m:ss`.
    pub fn format_duration(&self, ticks: u32) -> String {
        let total_seconds = self.ticks_to_seconds(ticks as f64).floor() as u64;
        format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
    }
}

impl Default for TimeContext {
    fn default() -> Self {
        Self::new(nbs_transport::DEFAULT_TEMPO, TimeSignature::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MusicalPosition {
    pub measure: u32,
    pub beat: u32,
    pub tick: u32,
}

impl std::fmt::Display for MusicalPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.measure, self.beat, self.tick)
    }
}
