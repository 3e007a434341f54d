use crate::mips::build_mip_chain;
use crate::source::AtlasSource;
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};

/// Errors from atlas loading. All of them are fatal to engine start-up.
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("atlas source declares no layers")]
    Empty,
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{path} is {actual:?}, expected {expected:?} like the first layer")]
    DimensionMismatch {
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("invalid procedural sprite size {0}")]
    InvalidSize(u32),
    #[error(
        "atlas of {layers} layers at {width}x{height} exceeds the device limit \
         of {max_layers} layers at {max_dimension}x{max_dimension}"
    )]
    ExceedsDeviceLimits {
        layers: u32,
        width: u32,
        height: u32,
        max_layers: u32,
        max_dimension: u32,
    },
}

/// Decoded atlas: one mip chain per layer, all layers the same size.
#[derive(Debug, Clone)]
pub struct AtlasImage {
    width: u32,
    height: u32,
    layers: Vec<Vec<RgbaImage>>,
}

impl AtlasImage {
    /// Decode or generate every layer of `source` and build its mip chain.
    pub fn load(source: &AtlasSource) -> Result<Self, AtlasError> {
        let bases = match source {
            AtlasSource::Files { paths } => paths
                .iter()
                .map(|p| decode_file(p))
                .collect::<Result<Vec<_>, _>>()?,
            AtlasSource::Procedural { size, colors } => {
                if *size == 0 {
                    return Err(AtlasError::InvalidSize(*size));
                }
                colors.iter().map(|c| soft_disc(*size, *c)).collect()
            }
        };
        let names: Vec<PathBuf> = match source {
            AtlasSource::Files { paths } => paths.clone(),
            AtlasSource::Procedural { colors, .. } => (0..colors.len())
                .map(|i| PathBuf::from(format!("procedural:{i}")))
                .collect(),
        };
        let atlas = Self::from_layers(bases, &names)?;
        tracing::info!(
            layers = atlas.layer_count(),
            mips = atlas.mip_level_count(),
            width = atlas.width,
            height = atlas.height,
            "atlas prepared"
        );
        Ok(atlas)
    }

    /// Assemble an atlas from already decoded base images.
    fn from_layers(bases: Vec<RgbaImage>, names: &[PathBuf]) -> Result<Self, AtlasError> {
        let Some(first) = bases.first() else {
            return Err(AtlasError::Empty);
        };
        let expected = first.dimensions();
        for (base, name) in bases.iter().zip(names) {
            if base.dimensions() != expected {
                return Err(AtlasError::DimensionMismatch {
                    path: name.clone(),
                    expected,
                    actual: base.dimensions(),
                });
            }
        }
        Ok(Self {
            width: expected.0,
            height: expected.1,
            layers: bases.iter().map(build_mip_chain).collect(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layer_count(&self) -> u32 {
        self.layers.len() as u32
    }

    pub fn mip_level_count(&self) -> u32 {
        self.layers.first().map_or(0, |chain| chain.len() as u32)
    }

    /// Fail unless the atlas fits a texture array of at most `max_layers`
    /// layers with edges of at most `max_dimension` pixels.
    pub fn check_limits(&self, max_layers: u32, max_dimension: u32) -> Result<(), AtlasError> {
        if self.layer_count() > max_layers
            || self.width > max_dimension
            || self.height > max_dimension
        {
            return Err(AtlasError::ExceedsDeviceLimits {
                layers: self.layer_count(),
                width: self.width,
                height: self.height,
                max_layers,
                max_dimension,
            });
        }
        Ok(())
    }

    /// Pixels of mip `level` of `layer`.
    pub fn level(&self, layer: u32, level: u32) -> Option<&RgbaImage> {
        self.layers.get(layer as usize)?.get(level as usize)
    }
}

fn decode_file(path: &Path) -> Result<RgbaImage, AtlasError> {
    let bytes = std::fs::read(path).map_err(|source| AtlasError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let image = image::load_from_memory(&bytes).map_err(|source| AtlasError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "decoded atlas layer");
    Ok(image.to_rgba8())
}

/// A disc of `color` with a one-pixel-wide soft edge on a transparent background.
fn soft_disc(size: u32, color: [u8; 4]) -> RgbaImage {
    let centre = size as f32 / 2.0;
    let radius = centre - 1.0;
    RgbaImage::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - centre;
        let dy = y as f32 + 0.5 - centre;
        let d = (dx * dx + dy * dy).sqrt();
        let coverage = (radius - d + 0.5).clamp(0.0, 1.0);
        let alpha = (color[3] as f32 * coverage).round() as u8;
        Rgba([color[0], color[1], color[2], alpha])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procedural_atlas_has_full_chain() {
        let atlas = AtlasImage::load(&AtlasSource::default()).expect("procedural atlas");
        assert_eq!(atlas.layer_count(), 4);
        assert_eq!(atlas.width(), 64);
        assert_eq!(atlas.mip_level_count(), 7);
        assert_eq!(atlas.level(3, 6).map(|m| m.dimensions()), Some((1, 1)));
        assert!(atlas.level(4, 0).is_none());
    }

    #[test]
    fn procedural_disc_is_opaque_inside_and_clear_outside() {
        let disc = soft_disc(32, [1, 2, 3, 255]);
        assert_eq!(disc.get_pixel(16, 16)[3], 255);
        assert_eq!(disc.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn zero_size_procedural_is_rejected() {
        let source = AtlasSource::Procedural {
            size: 0,
            colors: vec![[0, 0, 0, 255]],
        };
        assert!(matches!(AtlasImage::load(&source), Err(AtlasError::InvalidSize(0))));
    }

    #[test]
    fn empty_sources_are_rejected() {
        let files = AtlasSource::Files { paths: Vec::new() };
        assert!(matches!(AtlasImage::load(&files), Err(AtlasError::Empty)));
        let procedural = AtlasSource::Procedural {
            size: 8,
            colors: Vec::new(),
        };
        assert!(matches!(AtlasImage::load(&procedural), Err(AtlasError::Empty)));
    }

    #[test]
    fn limits_reject_too_many_layers_or_oversized_edges() {
        let source = AtlasSource::Procedural {
            size: 4,
            colors: vec![[255, 255, 255, 255]; 300],
        };
        let atlas = AtlasImage::load(&source).expect("procedural atlas");
        assert!(atlas.check_limits(300, 4).is_ok());
        assert!(matches!(
            atlas.check_limits(256, 8192),
            Err(AtlasError::ExceedsDeviceLimits {
                layers: 300,
                max_layers: 256,
                ..
            })
        ));
        assert!(matches!(
            atlas.check_limits(300, 2),
            Err(AtlasError::ExceedsDeviceLimits { width: 4, .. })
        ));
    }

    #[test]
    fn loads_png_files_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        RgbaImage::from_pixel(16, 16, Rgba([255, 0, 0, 255]))
            .save(&a)
            .expect("write a");
        RgbaImage::from_pixel(16, 16, Rgba([0, 0, 255, 255]))
            .save(&b)
            .expect("write b");

        let atlas = AtlasImage::load(&AtlasSource::files([&a, &b])).expect("load");
        assert_eq!(atlas.layer_count(), 2);
        assert_eq!(atlas.mip_level_count(), 5);
        assert_eq!(atlas.level(0, 0).map(|m| m.get_pixel(0, 0)[0]), Some(255));
        assert_eq!(atlas.level(1, 0).map(|m| m.get_pixel(0, 0)[2]), Some(255));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.png");
        let err = AtlasImage::load(&AtlasSource::files([&missing])).unwrap_err();
        assert!(matches!(err, AtlasError::Io { .. }));
    }

    #[test]
    fn garbage_file_is_decode_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bad = dir.path().join("bad.png");
        std::fs::write(&bad, b"not an image").expect("write");
        let err = AtlasImage::load(&AtlasSource::files([&bad])).unwrap_err();
        assert!(matches!(err, AtlasError::Decode { .. }));
    }

    #[test]
    fn mismatched_layers_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        RgbaImage::new(16, 16).save(&a).expect("write a");
        RgbaImage::new(8, 8).save(&b).expect("write b");
        let err = AtlasImage::load(&AtlasSource::files([&a, &b])).unwrap_err();
        assert!(matches!(
            err,
            AtlasError::DimensionMismatch {
                expected: (16, 16),
                actual: (8, 8),
                ..
            }
        ));
    }
}
