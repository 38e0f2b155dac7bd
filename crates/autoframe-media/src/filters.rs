//! FFmpeg video filter construction for the static crop styles.
//!
//! Geometric crops are a one-shot calculation: the crop rectangle is fixed
//! for the whole clip and rendered by FFmpeg in a single pass. The follow
//! styles never go through this module.

use autoframe_models::{CropStyle, ManualCrop, TargetAspect};

/// Build the `-vf` filter chain for a static crop style.
///
/// Returns `None` when no filtering is needed (no crop and no resize).
/// `manual` is only consulted for [`CropStyle::Manual`].
pub fn build_crop_filter(
    in_width: u32,
    in_height: u32,
    aspect: TargetAspect,
    style: CropStyle,
    manual: &ManualCrop,
    out_width: u32,
    out_height: u32,
) -> Option<String> {
    let target_ratio = aspect.resolve(in_width, in_height);
    let mut filters: Vec<String> = Vec::new();

    match style {
        CropStyle::Center | CropStyle::Left | CropStyle::Right => {
            let in_ratio = if in_height > 0 {
                in_width as f64 / in_height as f64
            } else {
                1.0
            };

            let (crop_w, crop_h, x, y);
            if in_ratio > target_ratio {
                crop_h = in_height;
                crop_w = (in_height as f64 * target_ratio).round() as u32;
                x = match style {
                    CropStyle::Left => 0,
                    CropStyle::Right => in_width.saturating_sub(crop_w),
                    _ => (in_width.saturating_sub(crop_w)) / 2,
                };
                y = 0;
            } else {
                crop_w = in_width;
                crop_h = (in_width as f64 / target_ratio).round() as u32;
                x = 0;
                y = (in_height.saturating_sub(crop_h)) / 2;
            }

            filters.push(format!("crop={}:{}:{}:{}", crop_w, crop_h, x, y));
        }

        CropStyle::Manual => {
            let m = manual.clamped();

            let crop_w = (in_width as f64 * (m.width / 100.0)).round() as i64;
            let crop_h = (in_height as f64 * (m.height / 100.0)).round() as i64;

            let center_x = (in_width as f64 * (m.x / 100.0)).round() as i64;
            let center_y = (in_height as f64 * (m.y / 100.0)).round() as i64;

            let x = (center_x - crop_w / 2).clamp(0, (in_width as i64 - crop_w).max(0));
            let y = (center_y - crop_h / 2).clamp(0, (in_height as i64 - crop_h).max(0));

            filters.push(format!("crop={}:{}:{}:{}", crop_w, crop_h, x, y));
        }

        // No geometric crop; the follow styles are rendered elsewhere.
        CropStyle::None | CropStyle::Face | CropStyle::Speaker => {}
    }

    if out_width > 0 && out_height > 0 {
        filters.push(format!("scale={}:{}", out_width, out_height));
    }

    if filters.is_empty() {
        None
    } else {
        Some(filters.join(","))
    }
}
