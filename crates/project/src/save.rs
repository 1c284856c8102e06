use crate::{ProjectError, SongFile};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `song` to `path` as pretty-printed JSON.
pub fn save_song(path: &Path, song: &SongFile) -> Result<(), ProjectError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, song)?;
    writer.flush()?;

    tracing::debug!(path = %path.display(), notes = song.notes.len(), "song saved");
    Ok(())
}

/// Write `song` to `path` as MessagePack, keeping field names so defaults
/// apply when the file is read back by a newer version.
pub fn save_song_msgpack(path: &Path, song: &SongFile) -> Result<(), ProjectError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    rmp_serde::encode::write_named(&mut writer, song)?;
    writer.flush()?;

    tracing::debug!(path = %path.display(), notes = song.notes.len(), "song saved as msgpack");
    Ok(())
}
