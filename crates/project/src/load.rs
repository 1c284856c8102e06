use crate::{ProjectError, SongFile};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct SongMetadata {
    pub title: String,
    pub author: String,
    pub tempo: f64,
    pub note_count: usize,
    pub layer_count: usize,
    pub length_ticks: u32,
}

/// Read a song, trying JSON first and falling back to MessagePack.
///
/// If neither format decodes, the JSON error is returned.
pub fn load_song(path: &Path) -> Result<SongFile, ProjectError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let json_err = match serde_json::from_reader(reader) {
        Ok(song) => {
            tracing::debug!(path = %path.display(), "song loaded");
            return Ok(song);
        }
        Err(err) => err,
    };

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    match rmp_serde::decode::from_read(reader) {
        Ok(song) => {
            tracing::debug!(path = %path.display(), "song loaded from msgpack");
            Ok(song)
        }
        Err(msgpack_err) => {
            tracing::debug!(path = %path.display(), %msgpack_err, "song is not msgpack either");
            Err(json_err.into())
        }
    }
}

pub fn load_song_metadata(path: &Path) -> Result<SongMetadata, ProjectError> {
    let song = load_song(path)?;
    let length_ticks = song.length_ticks();

    Ok(SongMetadata {
        title: song.header.title,
        author: song.header.author,
        tempo: song.header.tempo,
        note_count: song.notes.len(),
        layer_count: song.layers.len(),
        length_ticks,
    })
}
