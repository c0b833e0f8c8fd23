//! Audio sources
//!
//! Uploaded files and downloaded clips both become an [`AudioSource`] before
//! they reach the pipeline. Fetching from remote platforms belongs to a
//! [`SourceFetcher`] supplied by the caller.

use crate::error::{AudioError, Result};
use std::path::Path;
use tracing::debug;
use url::Url;

/// File extensions the decoder is expected to handle
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["mp3", "wav", "flac", "m4a", "ogg"];

/// Hosts recognised as video/audio platforms
pub const KNOWN_PLATFORMS: [&str; 8] = [
    "youtube.com",
    "youtu.be",
    "soundcloud.com",
    "vimeo.com",
    "dailymotion.com",
    "facebook.com",
    "instagram.com",
    "tiktok.com",
];

/// Longest title prefix kept in a download's file name
const MAX_TITLE_CHARS: usize = 50;

/// Encoded audio bytes plus the name they arrived under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSource {
    bytes: Vec<u8>,
    filename: String,
}

impl AudioSource {
    /// Wrap an uploaded file
    pub fn from_upload(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
        }
    }

    /// Wrap downloaded audio, naming it after the clip title
    ///
    /// Keeps the first 50 characters of `title`, replaces characters that
    /// are unsafe in file names with `_`, and appends `.wav`.
    pub fn from_download(bytes: Vec<u8>, title: &str) -> Self {
        let safe: String = title
            .chars()
            .take(MAX_TITLE_CHARS)
            .map(|c| match c {
                '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
                c => c,
            })
            .collect();
        let stem = if safe.trim().is_empty() {
            "audio".to_string()
        } else {
            safe
        };
        Self {
            bytes,
            filename: format!("{}.wav", stem),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lower-cased extension, used as a decoder hint
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// File name without its last extension
    pub fn stem(&self) -> &str {
        match self.filename.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.filename,
        }
    }
}

/// Metadata reported by the ingestion collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    pub title: String,
    pub duration_secs: Option<f64>,
    pub uploader: Option<String>,
}

/// Remote ingestion collaborator
///
/// Implementations perform the network and extraction work and report
/// failures as [`AudioError::SourceUnavailable`].
pub trait SourceFetcher {
    /// Look up clip metadata without downloading audio
    fn info(&self, url: &Url) -> Result<SourceInfo>;

    /// Download and extract the audio track in a decodable container
    fn fetch_audio(&self, url: &Url) -> Result<Vec<u8>>;
}

/// Whether `filename` has a supported audio extension (case-insensitive)
pub fn is_supported_format(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}

/// Parse a user-entered URL
///
/// Accepts only `http`/`https` URLs with a host. Surrounding whitespace is
/// ignored.
pub fn validate_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AudioError::Transform("URL is empty".into()));
    }
    let url = Url::parse(trimmed)
        .map_err(|e| AudioError::Transform(format!("invalid URL '{}': {}", trimmed, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AudioError::Transform(format!(
            "unsupported URL scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(AudioError::Transform(format!("URL '{}' has no host", trimmed)));
    }
    Ok(url)
}

/// Whether the URL points at one of the [`KNOWN_PLATFORMS`] (or a subdomain)
pub fn is_known_platform(url: &Url) -> bool {
    let host = match url.host_str() {
        Some(h) => h.to_ascii_lowercase(),
        None => return false,
    };
    KNOWN_PLATFORMS
        .iter()
        .any(|p| host == *p || host.ends_with(&format!(".{}", p)))
}

/// Validate `url`, fetch its audio and wrap it as a source
pub fn download(fetcher: &dyn SourceFetcher, url: &str) -> Result<(AudioSource, SourceInfo)> {
    let url = validate_url(url)?;
    if !is_known_platform(&url) {
        debug!(host = url.host_str().unwrap_or_default(), "fetching from unlisted platform");
    }
    let info = fetcher.info(&url)?;
    let bytes = fetcher.fetch_audio(&url)?;
    debug!(title = %info.title, bytes = bytes.len(), "downloaded audio");
    Ok((AudioSource::from_download(bytes, &info.title), info))
}
