//! Clip loading from asset directories.
//!
//! Every supported file directly inside a directory is decoded to PCM and
//! registered under its file stem (`Battle_Theme.ogg` becomes `Battle_Theme`,
//! matched case-insensitively). A file that fails to decode still produces an
//! entry, with no clip, so the registry skips it and lookups report it as
//! missing.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use cadence_common::{AudioError, AudioResult, ClipKind};
use cadence_kernel::{ClipHandle, PcmBuffer};
use rodio::{Decoder, Source};
use tracing::{debug, info, warn};

/// File extensions the decoder is asked to handle.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["wav", "mp3", "ogg", "flac"];

/// One registry entry: identifier plus the clip, if it loaded.
pub type ClipEntry = (String, Option<ClipHandle>);

/// Counters from a directory scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Files decoded successfully.
    pub loaded: usize,
    /// Files that failed to read or decode.
    pub failed: usize,
    /// Total decoded sample memory.
    pub bytes: usize,
}

/// Clips found in the music and effect directories.
#[derive(Debug, Default)]
pub struct ClipLibrary {
    /// Music entries.
    pub music: Vec<ClipEntry>,
    /// Effect entries.
    pub sfx: Vec<ClipEntry>,
    /// Combined scan counters.
    pub stats: LoaderStats,
}

impl ClipLibrary {
    /// Scan both directories.
    #[must_use]
    pub fn load(music_dir: &Path, sfx_dir: &Path) -> Self {
        let mut stats = LoaderStats::default();
        let music = load_dir(music_dir, ClipKind::Music, &mut stats);
        let sfx = load_dir(sfx_dir, ClipKind::Sfx, &mut stats);
        info!(
            "Loaded {} audio clips ({} failed, {:.1} MiB)",
            stats.loaded,
            stats.failed,
            stats.bytes as f64 / (1024.0 * 1024.0)
        );
        Self { music, sfx, stats }
    }
}

/// Whether `path` has a supported extension.
#[must_use]
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(ext)))
}

/// Decode every supported file in `dir`. A missing directory yields nothing.
pub fn load_dir(dir: &Path, kind: ClipKind, stats: &mut LoaderStats) -> Vec<ClipEntry> {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) => {
            warn!("Cannot read {} directory {}: {}", kind, dir.display(), e);
            return Vec::new();
        },
    };

    let mut paths: Vec<PathBuf> = read_dir
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported(path))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?.to_string();
            let clip = match decode_file(&path) {
                Ok(pcm) => {
                    stats.loaded += 1;
                    stats.bytes += pcm.size_bytes();
                    debug!(
                        "Loaded {} '{}' ({:?}, {}Hz, {} channels)",
                        kind,
                        stem,
                        pcm.duration(),
                        pcm.sample_rate,
                        pcm.channels
                    );
                    Some(ClipHandle::from_pcm(stem.as_str(), pcm))
                },
                Err(e) => {
                    stats.failed += 1;
                    warn!("{}", e);
                    None
                },
            };
            Some((stem, clip))
        })
        .collect()
}

/// Read and decode one file.
pub fn decode_file(path: &Path) -> AudioResult<PcmBuffer> {
    let data = fs::read(path).map_err(|e| AudioError::LoadFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    decode_bytes(data)
}

/// Decode an in-memory file.
pub fn decode_bytes(data: Vec<u8>) -> AudioResult<PcmBuffer> {
    let decoder = Decoder::new(Cursor::new(data)).map_err(|e| AudioError::DecodeFailed(e.to_string()))?;
    let sample_rate = decoder.sample_rate();
    let channels = decoder.channels();
    let samples: Vec<f32> = decoder.convert_samples().collect();
    if channels == 0 || sample_rate == 0 {
        return Err(AudioError::DecodeFailed("stream has no channels".to_string()));
    }
    Ok(PcmBuffer::new(samples, sample_rate, channels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    /// 16-bit PCM WAV of silence.
    fn silent_wav(duration_secs: f32, sample_rate: u32, channels: u16) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let frames = (sample_rate as f32 * duration_secs) as u32;
        let block_align = channels * bits_per_sample / 8;
        let byte_rate = sample_rate * u32::from(block_align);
        let data_size = frames * u32::from(block_align);

        let mut wav = Vec::with_capacity(44 + data_size as usize);
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_size).to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&channels.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&bits_per_sample.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_size.to_le_bytes());
        wav.resize(44 + data_size as usize, 0);
        wav
    }

    #[test]
    fn test_decode_wav_duration() {
        let pcm = decode_bytes(silent_wav(0.5, 8_000, 2)).expect("valid wav");
        assert_eq!(pcm.channels, 2);
        assert_eq!(pcm.sample_rate, 8_000);
        assert_eq!(pcm.frame_count(), 4_000);
        assert_eq!(pcm.duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_bytes(b"not audio at all".to_vec()).expect_err("garbage");
        assert!(matches!(err, AudioError::DecodeFailed(_)));
    }

    #[test]
    fn test_missing_file_is_load_failure() {
        let err = decode_file(Path::new("/nonexistent/clip.wav")).expect_err("missing");
        assert!(matches!(err, AudioError::LoadFailed { .. }));
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported(Path::new("a/Theme.OGG")));
        assert!(is_supported(Path::new("click.wav")));
        assert!(!is_supported(Path::new("notes.txt")));
        assert!(!is_supported(Path::new("README")));
    }

    #[test]
    fn test_load_dir_registers_by_stem() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("Click.wav"), silent_wav(0.1, 8_000, 1)).expect("write");
        fs::write(dir.path().join("Broken.wav"), b"RIFF????").expect("write");
        fs::write(dir.path().join("readme.txt"), b"ignored").expect("write");

        let mut stats = LoaderStats::default();
        let entries = load_dir(dir.path(), ClipKind::Sfx, &mut stats);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "Broken");
        assert!(entries[0].1.is_none());
        assert_eq!(entries[1].0, "Click");
        assert!(entries[1].1.is_some());
        assert_eq!(stats.loaded, 1);
        assert_eq!(stats.failed, 1);
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let mut stats = LoaderStats::default();
        assert!(load_dir(Path::new("/nonexistent/music"), ClipKind::Music, &mut stats).is_empty());
    }
}
