//! Crop geometry for the virtual camera.
//!
//! The crop window size is fixed for the whole clip; only its origin moves
//! with the tracked subject.

use autoframe_models::TargetAspect;

use super::models::PointF;
use crate::error::{MediaError, MediaResult};

/// Fixed crop window dimensions, derived once per clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropGeometry {
    pub width: u32,
    pub height: u32,
}

/// Compute the largest crop window with the target aspect that fits the
/// source frame.
///
/// If the source is wider than the target aspect the crop spans the full
/// height; otherwise it spans the full width.
pub fn crop_geometry(
    src_width: u32,
    src_height: u32,
    aspect: TargetAspect,
) -> MediaResult<CropGeometry> {
    if src_width == 0 || src_height == 0 {
        return Err(MediaError::InvalidGeometry {
            width: src_width,
            height: src_height,
        });
    }

    let Some(target_ratio) = aspect.ratio() else {
        // Match-source keeps the full frame.
        return Ok(CropGeometry {
            width: src_width,
            height: src_height,
        });
    };

    let src_ratio = src_width as f64 / src_height as f64;

    let (width, height) = if src_ratio > target_ratio {
        let h = src_height;
        let w = (src_height as f64 * target_ratio).round() as u32;
        (w.min(src_width), h)
    } else {
        let w = src_width;
        let h = (src_width as f64 / target_ratio).round() as u32;
        (w, h.min(src_height))
    };

    Ok(CropGeometry { width, height })
}

/// Crop origin for a given camera center, clamped so the window lies fully
/// inside the source frame.
pub fn crop_origin(
    center: PointF,
    geometry: &CropGeometry,
    src_width: u32,
    src_height: u32,
) -> (i32, i32) {
    let max_x = src_width.saturating_sub(geometry.width) as i64;
    let max_y = src_height.saturating_sub(geometry.height) as i64;

    let x = (center.x - geometry.width as f64 / 2.0).round() as i64;
    let y = (center.y - geometry.height as f64 / 2.0).round() as i64;

    (x.clamp(0, max_x) as i32, y.clamp(0, max_y) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_hd_to_portrait() {
        let geom = crop_geometry(1920, 1080, TargetAspect::Portrait).unwrap();
        // 1080 * 9/16 = 607.5 -> 608
        assert_eq!(geom.width, 608);
        assert_eq!(geom.height, 1080);
    }

    #[test]
    fn test_portrait_source_to_landscape() {
        let geom = crop_geometry(1080, 1920, TargetAspect::Landscape).unwrap();
        assert_eq!(geom.width, 1080);
        assert_eq!(geom.height, 608);
    }

    #[test]
    fn test_square_of_square_is_identity() {
        let geom = crop_geometry(720, 720, TargetAspect::Square).unwrap();
        assert_eq!(geom.width, 720);
        assert_eq!(geom.height, 720);
    }

    #[test]
    fn test_match_source_keeps_frame() {
        let geom = crop_geometry(1280, 720, TargetAspect::Source).unwrap();
        assert_eq!(geom.width, 1280);
        assert_eq!(geom.height, 720);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            crop_geometry(0, 1080, TargetAspect::Portrait),
            Err(MediaError::InvalidGeometry { .. })
        ));
        assert!(matches!(
            crop_geometry(1920, 0, TargetAspect::Portrait),
            Err(MediaError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn test_origin_clamped_to_frame() {
        let geom = CropGeometry { width: 608, height: 1080 };

        // Center far left: origin clamps to 0
        let (x, y) = crop_origin(PointF::new(-500.0, 540.0), &geom, 1920, 1080);
        assert_eq!((x, y), (0, 0));

        // Center far right: origin clamps to src - crop
        let (x, _) = crop_origin(PointF::new(5000.0, 540.0), &geom, 1920, 1080);
        assert_eq!(x, 1920 - 608);

        // Centered
        let (x, y) = crop_origin(PointF::new(960.0, 540.0), &geom, 1920, 1080);
        assert_eq!((x, y), (656, 0));
    }

    #[test]
    fn test_origin_always_within_bounds() {
        let geom = CropGeometry { width: 608, height: 1080 };
        for cx in [-1000.0, 0.0, 303.9, 960.0, 1616.1, 3000.0] {
            for cy in [-1000.0, 0.0, 540.0, 2000.0] {
                let (x, y) = crop_origin(PointF::new(cx, cy), &geom, 1920, 1080);
                assert!(x >= 0 && x as u32 <= 1920 - geom.width);
                assert!(y >= 0 && y as u32 <= 1080 - geom.height);
            }
        }
    }
}
