use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Number of levels in a full mip chain: `floor(log2(max(w, h))) + 1`.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    u32::BITS - largest.leading_zeros()
}

/// Size of mip `level` for a base of `width` x `height`, never below 1x1.
pub fn mip_extent(width: u32, height: u32, level: u32) -> (u32, u32) {
    let shrink = |v: u32| v.checked_shr(level).unwrap_or(0).max(1);
    (shrink(width), shrink(height))
}

/// Build the full mip chain of `base`, level 0 first.
///
/// Each level is resampled from the base image rather than from the previous
/// level, so error does not accumulate down the chain.
pub fn build_mip_chain(base: &RgbaImage) -> Vec<RgbaImage> {
    let (width, height) = base.dimensions();
    let levels = mip_level_count(width, height);
    let mut chain = Vec::with_capacity(levels as usize);
    chain.push(base.clone());
    for level in 1..levels {
        let (w, h) = mip_extent(width, height, level);
        chain.push(imageops::resize(base, w, h, FilterType::Triangle));
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn level_counts() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 2), 2);
        assert_eq!(mip_level_count(64, 64), 7);
        assert_eq!(mip_level_count(100, 50), 7);
        assert_eq!(mip_level_count(256, 1), 9);
    }

    #[test]
    fn extents_halve_and_floor_at_one() {
        assert_eq!(mip_extent(64, 16, 0), (64, 16));
        assert_eq!(mip_extent(64, 16, 2), (16, 4));
        assert_eq!(mip_extent(64, 16, 5), (2, 1));
        assert_eq!(mip_extent(64, 16, 6), (1, 1));
        assert_eq!(mip_extent(3, 3, 40), (1, 1));
    }

    #[test]
    fn chain_has_every_level() {
        let base = RgbaImage::from_pixel(32, 8, Rgba([200, 100, 50, 255]));
        let chain = build_mip_chain(&base);
        assert_eq!(chain.len(), 6);
        let sizes: Vec<(u32, u32)> = chain.iter().map(|m| m.dimensions()).collect();
        assert_eq!(sizes, vec![(32, 8), (16, 4), (8, 2), (4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn uniform_image_stays_uniform() {
        let base = RgbaImage::from_pixel(16, 16, Rgba([10, 20, 30, 255]));
        let chain = build_mip_chain(&base);
        let last = chain.last().expect("at least one level");
        assert_eq!(last.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }
}
