mod load;
mod save;

use serde::{Deserialize, Serialize};

pub use load::{SongMetadata, load_song, load_song_metadata};
pub use save::{save_song, save_song_msgpack};

/// On-disk shape of a note block song: header, notes and layer metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongFile {
    #[serde(default)]
    pub header: SongHeader,
    #[serde(default)]
    pub notes: Vec<NoteData>,
    #[serde(default)]
    pub layers: Vec<LayerData>,
}

impl SongFile {
    /// Number of ticks up to and including the last note.
    pub fn length_ticks(&self) -> u32 {
        self.notes
            .iter()
            .map(|n| n.tick.saturating_add(1))
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SongHeader {
    pub title: String,
    pub author: String,
    pub original_author: String,
    pub description: String,
    /// Ticks per second.
    pub tempo: f64,
    /// Beats per measure.
    pub time_signature: u32,
    pub loop_settings: LoopSettings,
    pub stats: SongStats,
}

impl Default for SongHeader {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            original_author: String::new(),
            description: String::new(),
            tempo: 10.0,
            time_signature: 4,
            loop_settings: LoopSettings::default(),
            stats: SongStats::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopSettings {
    pub enabled: bool,
    pub start_tick: u32,
    /// 0 loops forever.
    pub max_loop_count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SongStats {
    pub minutes_spent: u32,
    pub left_clicks: u32,
    pub right_clicks: u32,
    pub blocks_added: u32,
    pub blocks_removed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteData {
    pub tick: u32,
    pub layer: u32,
    pub instrument: u8,
    pub key: u8,
    #[serde(default = "default_velocity")]
    pub velocity: u8,
    #[serde(default)]
    pub panning: i8,
    #[serde(default)]
    pub pitch: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lock: LayerLock,
    #[serde(default = "default_volume")]
    pub volume: u8,
    #[serde(default)]
    pub panning: i8,
}

fn default_velocity() -> u8 {
    100
}

fn default_volume() -> u8 {
    100
}

/// Layer lock state, stored as `0` (unlocked), `1` (locked) or `2` (solo).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LayerLock {
    #[default]
    Unlocked,
    Locked,
    Solo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid layer lock state {0}: expected 0, 1 or 2")]
pub struct InvalidLayerLock(pub u8);

impl TryFrom<u8> for LayerLock {
    type Error = InvalidLayerLock;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(LayerLock::Unlocked),
            1 => Ok(LayerLock::Locked),
            2 => Ok(LayerLock::Solo),
            other => Err(InvalidLayerLock(other)),
        }
    }
}

impl From<LayerLock> for u8 {
    fn from(lock: LayerLock) -> Self {
        match lock {
            LayerLock::Unlocked => 0,
            LayerLock::Locked => 1,
            LayerLock::Solo => 2,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] rmp_serde::encode::Error),

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] rmp_serde::decode::Error),
}
