use nbs_project::{LayerData, LayerLock, NoteData};

/// A single note block. `tick` and `layer` mirror the grid cell it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub tick: u32,
    pub layer: u32,
    pub instrument: u8,
    pub key: u8,
    /// Volume percent.
    pub velocity: u8,
    /// -100 (left) to 100 (right).
    pub panning: i8,
    /// Fine pitch offset in cents.
    pub pitch: i16,
}

impl Note {
    pub fn new(instrument: u8, key: u8) -> Self {
        Self {
            tick: 0,
            layer: 0,
            instrument,
            key,
            velocity: 100,
            panning: 0,
            pitch: 0,
        }
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_panning(mut self, panning: i8) -> Self {
        self.panning = panning;
        self
    }

    pub fn with_pitch(mut self, pitch: i16) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn at(mut self, tick: u32, layer: u32) -> Self {
        self.tick = tick;
        self.layer = layer;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub name: String,
    /// 0 to 100.
    pub volume: u8,
    /// -100 to 100.
    pub panning: i8,
    pub locked: bool,
    pub solo: bool,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self {
            name: String::new(),
            volume: 100,
            panning: 0,
            locked: false,
            solo: false,
        }
    }
}

impl From<&NoteData> for Note {
    fn from(data: &NoteData) -> Self {
        Self {
            tick: data.tick,
            layer: data.layer,
            instrument: data.instrument,
            key: data.key,
            velocity: data.velocity,
            panning: data.panning,
            pitch: data.pitch,
        }
    }
}

impl From<&Note> for NoteData {
    fn from(note: &Note) -> Self {
        Self {
            tick: note.tick,
            layer: note.layer,
            instrument: note.instrument,
            key: note.key,
            velocity: note.velocity,
            panning: note.panning,
            pitch: note.pitch,
        }
    }
}

impl From<&LayerData> for Layer {
    fn from(data: &LayerData) -> Self {
        Self {
            name: data.name.clone(),
            volume: data.volume.min(100),
            panning: data.panning.clamp(-100, 100),
            locked: data.lock == LayerLock::Locked,
            solo: data.lock == LayerLock::Solo,
        }
    }
}

impl From<&Layer> for LayerData {
    /// The file format has a single lock field; solo wins over locked.
    fn from(layer: &Layer) -> Self {
        let lock = if layer.solo {
            LayerLock::Solo
        } else if layer.locked {
            LayerLock::Locked
        } else {
            LayerLock::Unlocked
        };

        Self {
            name: layer.name.clone(),
            lock,
            volume: layer.volume,
            panning: layer.panning,
        }
    }
}
