//! Recovers the produced file's path from yt-dlp's standard output.
//!
//! yt-dlp's console output is not a stable contract, so the path is looked up
//! by an ordered list of matchers, strict first. The first rule that yields a
//! path inside the output root wins:
//!
//! 1. [`MatchRule::Strict`]: `<root>/<id>_<token>_<HH-MM-SS|NA>.<ext>` with a
//!    word-only job id.
//! 2. [`MatchRule::Relaxed`]: same suffix, any prefix (ids containing `-`,
//!    the `WIDTHxHEIGHT` segment, ...).
//! 3. [`MatchRule::AlreadyDownloaded`]: `<path> has already been downloaded`,
//!    any extension. A cache hit counts as success.

mod types;

pub use types::{ArtifactKind, ArtifactReference, MatchRule};

use regex_lite::Regex;
use std::path::Path;

/// Extensions accepted by the strict and relaxed rules.
const MEDIA_EXTENSIONS: &str = "mp4|webm|mov|mkv|png|jpg|jpeg";

struct Matcher {
    rule: MatchRule,
    regex: Regex,
    /// Capture group holding the path.
    group: usize,
}

impl Matcher {
    fn find(&self, root: &str, output: &str) -> Option<ArtifactReference> {
        self.regex
            .captures_iter(output)
            .filter_map(|caps| caps.get(self.group))
            .find_map(|m| ArtifactReference::new(root, m.as_str().trim_end(), self.rule))
    }
}

/// Ordered set of output matchers bound to one output root.
pub struct ArtifactResolver {
    root: String,
    matchers: Vec<Matcher>,
}

impl ArtifactResolver {
    /// Compiles the matchers for files written under `output_root`.
    pub fn new(output_root: &Path) -> Result<Self, regex_lite::Error> {
        let root = normalize_root(output_root);
        let escaped = regex_lite::escape(&root);
        let suffix = format!(r"_(\d\d-\d\d-\d\d|NA)\.({MEDIA_EXTENSIONS})");

        let matchers = vec![
            Matcher {
                rule: MatchRule::Strict,
                regex: Regex::new(&format!(r"{escaped}/\w*?_[\w-]*?{suffix}"))?,
                group: 0,
            },
            Matcher {
                rule: MatchRule::Relaxed,
                regex: Regex::new(&format!(r"{escaped}/.*?_[\w-]*?{suffix}"))?,
                group: 0,
            },
            Matcher {
                rule: MatchRule::AlreadyDownloaded,
                regex: Regex::new(&format!(
                    r"({escaped}/[^\r\n]*?) has already been downloaded"
                ))?,
                group: 1,
            },
        ];

        Ok(Self { root, matchers })
    }

    /// The output root as it appears in tool output.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns the first artifact found by the ordered rules, or `None`.
    pub fn resolve(&self, output: &str) -> Option<ArtifactReference> {
        self.matchers
            .iter()
            .find_map(|matcher| matcher.find(&self.root, output))
    }
}

fn normalize_root(output_root: &Path) -> String {
    let root = output_root.to_string_lossy();
    let root = root.strip_prefix("./").unwrap_or(&root);
    let trimmed = root.trim_end_matches('/');
    if trimmed.is_empty() {
        root.to_string()
    } else {
        trimmed.to_string()
    }
}
