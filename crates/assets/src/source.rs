use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Base size of procedural sprites, in pixels.
pub const DEFAULT_SPRITE_SIZE: u32 = 64;

/// Procedural sprite colours, one per default entity type:
/// friendly, hostile, neutral, unknown.
pub const DEFAULT_SPRITE_COLORS: [[u8; 4]; 4] = [
    [64, 160, 255, 255],
    [255, 72, 64, 255],
    [96, 220, 120, 255],
    [240, 220, 80, 255],
];

/// Where the atlas layers come from. Layer `i` is the sprite for type `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AtlasSource {
    /// Image files decoded in order.
    Files { paths: Vec<PathBuf> },
    /// Soft discs of the given colours, generated in memory.
    Procedural { size: u32, colors: Vec<[u8; 4]> },
}

impl Default for AtlasSource {
    fn default() -> Self {
        Self::Procedural {
            size: DEFAULT_SPRITE_SIZE,
            colors: DEFAULT_SPRITE_COLORS.to_vec(),
        }
    }
}

impl AtlasSource {
    pub fn files<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self::Files {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of layers this source declares.
    pub fn layer_count(&self) -> usize {
        match self {
            Self::Files { paths } => paths.len(),
            Self::Procedural { colors, .. } => colors.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_four_procedural_layers() {
        let source = AtlasSource::default();
        assert_eq!(source.layer_count(), 4);
        assert!(matches!(source, AtlasSource::Procedural { size: 64, .. }));
    }

    #[test]
    fn files_keep_order() {
        let source = AtlasSource::files(["a.png", "b.png"]);
        let AtlasSource::Files { paths } = &source else {
            panic!("expected files");
        };
        assert_eq!(paths[0], PathBuf::from("a.png"));
        assert_eq!(paths[1], PathBuf::from("b.png"));
    }

    #[test]
    fn serde_tagged_form() {
        let json = r#"{"kind":"files","paths":["x.png"]}"#;
        let source: AtlasSource = serde_json::from_str(json).expect("valid json");
        assert_eq!(source, AtlasSource::files(["x.png"]));
    }
}
