//! Stack frames and stable call-site identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One captured stack frame, as recorded by the embedding runner.
///
/// Frames are data: the tracker never walks a live stack itself, it only
/// classifies frames it is handed (or that were recorded into a replay log).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Function name, if the runtime could resolve one.
    #[serde(default)]
    pub function: Option<String>,
    /// Source file the frame points into.
    #[serde(default)]
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
}

impl Frame {
    pub fn new(function: Option<&str>, file: Option<&str>, line: u32, column: u32) -> Self {
        Self {
            function: function.map(str::to_string),
            file: file.map(str::to_string),
            line,
            column,
        }
    }

    /// Render the frame's source location, shortening `base_dir` to `.`.
    pub fn location(&self, base_dir: Option<&str>) -> String {
        let file = self.file.as_deref().unwrap_or("<unknown>");
        let file = match base_dir {
            Some(base) if !base.is_empty() && file.starts_with(base) => {
                format!(".{}", &file[base.len()..])
            }
            _ => file.to_string(),
        };
        format!("{}:{}:{}", file, self.line, self.column)
    }
}

/// Stable identifier for a physical call site, unique for the run's lifetime.
///
/// Formatted as `"{column}-{line}-{h}"` where `h` is the first 8 bytes of the
/// SHA-256 of the file name, hex-encoded. Re-invocation of the same call site
/// always yields the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiteId(String);

impl SiteId {
    pub fn for_frame(frame: &Frame) -> Self {
        let file = frame.file.as_deref().unwrap_or("");
        Self(format!(
            "{}-{}-{}",
            frame.column,
            frame.line,
            file_hash(file)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First 8 bytes of the SHA-256 digest, hex-encoded (16 chars).
fn file_hash(file: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}
