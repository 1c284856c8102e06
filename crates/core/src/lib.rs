pub mod grid;
pub mod note;
pub mod session;
pub mod time;

pub use grid::{GridError, MoveOutcome, NoteGrid, Region};
pub use note::{Layer, Note};
pub use session::{NoteSink, NoteTrigger, Session, SessionError, SongInfo};
pub use time::{MusicalPosition, TICKS_PER_BEAT, TimeContext, TimeSignature};

pub use nbs_project::{
    LayerData, LayerLock, LoopSettings, NoteData, ProjectError, SongFile, SongHeader, SongStats,
    load_song, save_song, save_song_msgpack,
};
pub use nbs_transport::{
    ClockError, FRAME_RATE, ObserverId, PlaybackClock, TransportState, bpm_to_tps, tps_to_bpm,
};
