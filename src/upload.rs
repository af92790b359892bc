use std::path::Path;

use serde::Serialize;

use crate::error::CoachError;

/// Declared types the coach accepts, after normalization.
pub const ACCEPTED_TYPES: [&str; 4] = ["video/mp4", "audio/wav", "image/png", "image/jpeg"];

const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Builds a candidate from a filesystem path, guessing the declared type
    /// from the extension the way a browser fills in `File.type`.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| FALLBACK_MIME.to_string());
        Self { name, mime_type }
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.mime_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Anything that is not a video is treated as a still (audio included).
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.to_ascii_lowercase().contains("video") {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }
}

/// Lowercases, strips parameters and folds `image/jpg` into `image/jpeg`.
pub fn normalize_mime(raw: &str) -> String {
    let essence = raw.split(';').next().unwrap_or_default().trim();
    let lower = essence.to_ascii_lowercase();
    if lower == "image/jpg" {
        "image/jpeg".to_string()
    } else {
        lower
    }
}

pub fn validate(file: &UploadFile) -> Result<MediaKind, CoachError> {
    let normalized = normalize_mime(&file.mime_type);
    if ACCEPTED_TYPES.contains(&normalized.as_str()) {
        Ok(file.kind())
    } else {
        Err(CoachError::InvalidFileType {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
        })
    }
}

/// A drop can carry several files; the first acceptable one wins.
pub fn first_accepted<I>(files: I) -> Option<UploadFile>
where
    I: IntoIterator<Item = UploadFile>,
{
    files.into_iter().find(|file| validate(file).is_ok())
}

/// Splits pasted text into candidate paths. Terminals paste dragged files as
/// whitespace-separated paths, optionally quoted or with escaped spaces.
pub fn parse_dropped_paths(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = raw.trim().chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => quote = Some(ch),
            (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            (None, c) if c.is_whitespace() => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
            (None, c) => current.push(c),
        }
    }
    if !current.is_empty() {
        out.push(current);
    }

    out.into_iter()
        .map(|p| p.strip_prefix("file://").map(str::to_string).unwrap_or(p))
        .collect()
}
