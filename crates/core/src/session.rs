use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Instant;

use crate::grid::{GridError, NoteGrid, Region};
use crate::note::{Layer, Note};
use crate::time::{TimeContext, TimeSignature};
use nbs_project::{
    LayerData, LoopSettings, NoteData, ProjectError, SongFile, SongHeader, SongStats, load_song,
    save_song,
};
use nbs_transport::{ClockError, ObserverId, PlaybackClock, TransportState};

/// Slack for fractional positions that should sit exactly on a tick but land
/// just below it after accumulating steps like `10.0 / 60.0`.
const TICK_EPSILON: f64 = 1e-6;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Project(#[from] ProjectError),
}

/// A note ready to be sounded, with its layer's volume and panning applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteTrigger {
    pub tick: u32,
    pub layer: u32,
    pub instrument: u8,
    pub key: u8,
    /// Volume percent after layer volume.
    pub volume: u8,
    pub panning: i8,
    pub pitch: i16,
}

/// Receives the notes to play as the playhead crosses ticks.
pub trait NoteSink {
    fn trigger(&mut self, trigger: NoteTrigger);
}

impl NoteSink for Vec<NoteTrigger> {
    fn trigger(&mut self, trigger: NoteTrigger) {
        self.push(trigger);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongInfo {
    pub title: String,
    pub author: String,
    pub original_author: String,
    pub description: String,
    pub stats: SongStats,
}

/// One open song: its notes, the playback clock driving it, and header data.
#[derive(Debug)]
pub struct Session {
    grid: NoteGrid,
    clock: PlaybackClock,
    info: SongInfo,
    time_signature: TimeSignature,
    loop_settings: LoopSettings,
    loops_played: u32,
    /// First whole tick whose notes have not been triggered yet.
    next_tick: u32,
    finished: bool,
}

impl Session {
    pub fn new(tempo: f64) -> Result<Self, SessionError> {
        Ok(Self::with_clock(PlaybackClock::new(tempo)?, NoteGrid::new()))
    }

    fn with_clock(clock: PlaybackClock, grid: NoteGrid) -> Self {
        Self {
            grid,
            clock,
            info: SongInfo::default(),
            time_signature: TimeSignature::default(),
            loop_settings: LoopSettings::default(),
            loops_played: 0,
            next_tick: 0,
            finished: false,
        }
    }

    pub fn from_song(song: &SongFile) -> Result<Self, SessionError> {
        let header = &song.header;
        let clock = PlaybackClock::new(header.tempo)?;

        let mut grid = NoteGrid::with_layers(song.layers.iter().map(Layer::from).collect());
        for data in &song.notes {
            grid.insert(Note::from(data));
        }

        let mut session = Self::with_clock(clock, grid);
        session.info = SongInfo {
            title: header.title.clone(),
            author: header.author.clone(),
            original_author: header.original_author.clone(),
            description: header.description.clone(),
            stats: header.stats,
        };
        session.time_signature = TimeSignature::new(header.time_signature);
        session.loop_settings = header.loop_settings;
        Ok(session)
    }

    pub fn to_song(&self) -> SongFile {
        SongFile {
            header: SongHeader {
                title: self.info.title.clone(),
                author: self.info.author.clone(),
                original_author: self.info.original_author.clone(),
                description: self.info.description.clone(),
                tempo: self.clock.tempo(),
                time_signature: self.time_signature.into(),
                loop_settings: self.loop_settings,
                stats: self.info.stats,
            },
            notes: self.grid.notes().into_iter().map(NoteData::from).collect(),
            layers: self.grid.layers().iter().map(LayerData::from).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let song = load_song(path)?;
        Self::from_song(&song)
    }

    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        save_song(path, &self.to_song())?;
        Ok(())
    }

    // Transport

    /// Start playback. A song that played to its end restarts from tick 0.
    pub fn play(&mut self) {
        if self.finished {
            self.seek(0.0);
            self.loops_played = 0;
        }
        self.clock.start();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn stop(&mut self) {
        self.clock.stop();
        self.next_tick = 0;
        self.loops_played = 0;
        self.finished = false;
    }

    /// Move the playhead. Notes at the target tick fire on the next advance.
    pub fn seek(&mut self, tick: f64) {
        self.clock.set_position(tick);
        self.next_tick = (self.clock.current_tick() - TICK_EPSILON).ceil() as u32;
        self.finished = false;
    }

    pub fn advance(&mut self, sink: &mut impl NoteSink) -> f64 {
        self.advance_at(Instant::now(), sink)
    }

    /// Advance the clock to `now` and trigger the notes of every whole tick the
    /// playhead reached since the previous call. Handles looping and the end of
    /// the song. Returns the playhead position.
    pub fn advance_at(&mut self, now: Instant, sink: &mut impl NoteSink) -> f64 {
        if !self.clock.is_running() {
            return self.clock.current_tick();
        }

        let position = self.clock.advance_at(now);
        let reached = (position + TICK_EPSILON).floor() as u32;

        if let Some(last) = self.grid.last_tick() {
            let upper = reached.min(last);
            if self.next_tick <= upper {
                for trigger in self.triggers_in(self.next_tick..=upper) {
                    sink.trigger(trigger);
                }
            }
        }
        self.next_tick = self.next_tick.max(reached.saturating_add(1));

        if let Some(end) = self.length_ticks() {
            if position + TICK_EPSILON >= end as f64 {
                self.wrap_or_finish(position, end);
            }
        }

        self.clock.current_tick()
    }

    /// Audible notes at `tick`, in layer order.
    ///
    /// Locked layers are silent, and while any layer is solo only solo layers
    /// sound. Rows without layer metadata behave like a default layer.
    pub fn triggers_at(&self, tick: u32) -> Vec<NoteTrigger> {
        self.triggers_in(tick..=tick)
    }

    /// Audible notes over a range of ticks, ordered by tick then layer.
    pub fn triggers_in(&self, ticks: RangeInclusive<u32>) -> Vec<NoteTrigger> {
        let layers = self.grid.layers();
        let solo_active = layers.iter().any(|layer| layer.solo);
        let default_layer = Layer::default();

        self.grid
            .notes_in_region(&Region::new(ticks, 0..=u32::MAX))
            .into_iter()
            .filter_map(|note| {
                let layer = layers.get(note.layer as usize).unwrap_or(&default_layer);
                if layer.locked || (solo_active && !layer.solo) {
                    return None;
                }
                Some(NoteTrigger {
                    tick: note.tick,
                    layer: note.layer,
                    instrument: note.instrument,
                    key: note.key,
                    volume: mix_volume(note.velocity, layer.volume),
                    panning: mix_panning(note.panning, layer.panning),
                    pitch: note.pitch,
                })
            })
            .collect()
    }

    /// The part of the last step that ran past `end` is carried into the loop.
    fn wrap_or_finish(&mut self, position: f64, end: u32) {
        let settings = self.loop_settings;
        let loops_left =
            settings.max_loop_count == 0 || self.loops_played < settings.max_loop_count;

        if settings.enabled && settings.start_tick < end && loops_left {
            self.loops_played += 1;
            tracing::debug!(
                loop_count = self.loops_played,
                start = settings.start_tick,
                "song looped"
            );
            let span = (end - settings.start_tick) as f64;
            let overshoot = (position - end as f64).max(0.0) % span;
            self.clock.set_position(settings.start_tick as f64 + overshoot);
            self.next_tick = settings.start_tick;
        } else {
            tracing::debug!(end, "song finished");
            self.clock.pause();
            self.finished = true;
        }
    }

    pub fn on_position_changed(&mut self, callback: impl FnMut(f64) + 'static) -> ObserverId {
        self.clock.on_position_changed(callback)
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.clock.remove_observer(id)
    }

    pub fn current_tick(&self) -> f64 {
        self.clock.current_tick()
    }

    pub fn playback_state(&self) -> TransportState {
        self.clock.state()
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_running()
    }

    /// True once playback ran past the last note without looping.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn loops_played(&self) -> u32 {
        self.loops_played
    }

    pub fn tempo(&self) -> f64 {
        self.clock.tempo()
    }

    pub fn set_tempo(&mut self, tps: f64) -> Result<(), SessionError> {
        self.clock.set_tempo(tps)?;
        Ok(())
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn set_time_signature(&mut self, time_signature: impl Into<TimeSignature>) {
        self.time_signature = time_signature.into();
    }

    pub fn time_context(&self) -> TimeContext {
        TimeContext::new(self.tempo(), self.time_signature)
    }

    pub fn loop_settings(&self) -> LoopSettings {
        self.loop_settings
    }

    pub fn set_loop_settings(&mut self, settings: LoopSettings) {
        self.loop_settings = settings;
    }

    // Song content

    /// Ticks up to and including the last note, or `None` for an empty song.
    pub fn length_ticks(&self) -> Option<u32> {
        self.grid.last_tick().map(|tick| tick.saturating_add(1))
    }

    pub fn grid(&self) -> &NoteGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut NoteGrid {
        &mut self.grid
    }

    /// Place a note and count it in the song statistics.
    pub fn insert_note(&mut self, tick: u32, layer: u32, note: Note) -> Option<Note> {
        self.info.stats.blocks_added = self.info.stats.blocks_added.saturating_add(1);
        self.grid.insert_note(tick, layer, note)
    }

    /// Remove a note and count it in the song statistics.
    pub fn remove_note(&mut self, tick: u32, layer: u32) -> Option<Note> {
        let removed = self.grid.remove_note(tick, layer);
        if removed.is_some() {
            self.info.stats.blocks_removed = self.info.stats.blocks_removed.saturating_add(1);
        }
        removed
    }

    pub fn insert_layer(&mut self, index: u32, layer: Layer) -> Result<(), SessionError> {
        Ok(self.grid.insert_layer(index, layer)?)
    }

    pub fn remove_layer(&mut self, index: u32) -> Result<Layer, SessionError> {
        Ok(self.grid.remove_layer(index)?)
    }

    pub fn info(&self) -> &SongInfo {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut SongInfo {
        &mut self.info
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::with_clock(PlaybackClock::default(), NoteGrid::new())
    }
}

fn mix_volume(velocity: u8, layer_volume: u8) -> u8 {
    (velocity as u32 * layer_volume as u32 / 100) as u8
}

fn mix_panning(note_panning: i8, layer_panning: i8) -> i8 {
    if layer_panning == 0 {
        note_panning
    } else {
        ((note_panning as i16 + layer_panning as i16) / 2) as i8
    }
}
