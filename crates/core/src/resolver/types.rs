use serde::Serialize;
use std::path::{Component, Path};

/// Which matcher recovered the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Strict,
    Relaxed,
    AlreadyDownloaded,
}

impl MatchRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchRule::Strict => "strict",
            MatchRule::Relaxed => "relaxed",
            MatchRule::AlreadyDownloaded => "already_downloaded",
        }
    }
}

/// Media family derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Video,
    Image,
    /// Unrecognized extension, accepted as an opaque binary.
    Other,
}

impl ArtifactKind {
    fn from_path(path: &str) -> Self {
        let ext = Path::new(path)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "mp4" | "webm" | "mov" | "mkv" => ArtifactKind::Video,
            "png" | "jpg" | "jpeg" => ArtifactKind::Image,
            _ => ArtifactKind::Other,
        }
    }
}

/// A file produced by the tool, located inside the output root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactReference {
    path: String,
    relative_path: String,
    kind: ArtifactKind,
    rule: MatchRule,
}

impl ArtifactReference {
    /// Builds a reference for `path` as printed by the tool.
    ///
    /// Returns `None` unless `path` is `<root>/<relative>` where `<relative>`
    /// is non-empty and made only of normal components.
    pub(crate) fn new(root: &str, path: &str, rule: MatchRule) -> Option<Self> {
        let relative = path.strip_prefix(root)?.strip_prefix('/')?;
        if !is_contained(relative) {
            return None;
        }

        Some(Self {
            path: path.to_string(),
            relative_path: relative.to_string(),
            kind: ArtifactKind::from_path(relative),
            rule,
        })
    }

    /// Path as printed by the tool, including the output root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path relative to the output root.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn rule(&self) -> MatchRule {
        self.rule
    }

    /// Public URL the file is served under: `<base>/download/<relative path>`.
    pub fn public_url(&self, base_url: &str) -> String {
        format!(
            "{}/download/{}",
            base_url.trim_end_matches('/'),
            self.relative_path
        )
    }
}

fn is_contained(relative: &str) -> bool {
    let path = Path::new(relative);
    path.components().next().is_some()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}
