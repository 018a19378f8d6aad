//! Resize policy: how big the encoded output should be.
//!
//! Planning is pure arithmetic on dimensions; the actual pixel scaling
//! happens in the encoder when the bitmap is drawn onto its surface.

use serde::{Deserialize, Serialize};

/// How a fractional scaled dimension becomes a whole pixel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rounding {
    /// Round half away from zero (`1706.5 -> 1707`).
    #[default]
    HalfAwayFromZero,
    /// Always round down.
    Floor,
}

impl Rounding {
    fn apply(self, value: f64) -> u32 {
        let rounded = match self {
            Rounding::HalfAwayFromZero => value.round(),
            Rounding::Floor => value.floor(),
        };
        rounded as u32
    }
}

/// Target dimensions computed by [`plan_resize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Whether the output differs from the source dimensions.
    pub was_resized: bool,
}

/// Fit `width x height` inside a `max_dimension` square, preserving aspect
/// ratio, using [`Rounding::HalfAwayFromZero`].
///
/// # Examples
///
/// ```ignore
/// let plan = plan_resize(4000, 3000, 2048);
/// assert_eq!((plan.width, plan.height, plan.was_resized), (2048, 1536, true));
/// ```
pub fn plan_resize(width: u32, height: u32, max_dimension: u32) -> ResizePlan {
    plan_resize_with(width, height, max_dimension, Rounding::default())
}

/// Same as [`plan_resize`] with an explicit rounding rule.
///
/// The constrained side is pinned to exactly `max_dimension`; only the other
/// side goes through `rounding`, and it never drops below one pixel for a
/// non-empty source. The scale ratio is at most 1, so the plan never
/// upscales. A `max_dimension` of 0 is treated as 1.
pub fn plan_resize_with(
    width: u32,
    height: u32,
    max_dimension: u32,
    rounding: Rounding,
) -> ResizePlan {
    let max_dimension = max_dimension.max(1);
    if width <= max_dimension && height <= max_dimension {
        return ResizePlan {
            width,
            height,
            was_resized: false,
        };
    }

    let max = f64::from(max_dimension);
    let ratio = (max / f64::from(width)).min(max / f64::from(height));

    let (target_width, target_height) = if width >= height {
        let h = rounding.apply(f64::from(height) * ratio);
        (max_dimension, h.max(1).min(height))
    } else {
        let w = rounding.apply(f64::from(width) * ratio);
        (w.max(1).min(width), max_dimension)
    };

    ResizePlan {
        width: target_width,
        height: target_height,
        was_resized: true,
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn rounding_strategy() -> impl Strategy<Value = Rounding> {
        prop_oneof![Just(Rounding::HalfAwayFromZero), Just(Rounding::Floor)]
    }

    proptest! {
        /// Property: Images that already fit are never touched.
        #[test]
        fn prop_fitting_images_unchanged(
            max in 1u32..=4096,
            w_frac in 0.0f64..=1.0,
            h_frac in 0.0f64..=1.0,
        ) {
            let width = ((f64::from(max) * w_frac) as u32).max(1);
            let height = ((f64::from(max) * h_frac) as u32).max(1);

            let plan = plan_resize(width, height, max);
            prop_assert!(!plan.was_resized);
            prop_assert_eq!((plan.width, plan.height), (width, height));
        }

        /// Property: The larger side lands exactly on the limit.
        #[test]
        fn prop_larger_side_hits_limit(
            width in 1u32..=20_000,
            height in 1u32..=20_000,
            max in 1u32..=4096,
            rounding in rounding_strategy(),
        ) {
            prop_assume!(width > max || height > max);

            let plan = plan_resize_with(width, height, max, rounding);
            prop_assert!(plan.was_resized);
            prop_assert_eq!(plan.width.max(plan.height), max);
        }

        /// Property: Never upscales and never exceeds the limit.
        #[test]
        fn prop_no_upscaling(
            width in 1u32..=20_000,
            height in 1u32..=20_000,
            max in 1u32..=4096,
            rounding in rounding_strategy(),
        ) {
            let plan = plan_resize_with(width, height, max, rounding);
            prop_assert!(plan.width <= width);
            prop_assert!(plan.height <= height);
            prop_assert!(plan.width >= 1 && plan.height >= 1);
            prop_assert!(plan.width <= max && plan.height <= max);
        }

        /// Property: Aspect ratio is kept within one pixel of rounding error.
        #[test]
        fn prop_aspect_ratio_preserved(
            width in 1u32..=20_000,
            height in 1u32..=20_000,
            max in 16u32..=4096,
        ) {
            prop_assume!(width > max || height > max);

            let plan = plan_resize(width, height, max);
            let ratio = (f64::from(max) / f64::from(width)).min(f64::from(max) / f64::from(height));
            let exact_w = f64::from(width) * ratio;
            let exact_h = f64::from(height) * ratio;

            prop_assert!((f64::from(plan.width) - exact_w).abs() <= 1.0);
            prop_assert!((f64::from(plan.height) - exact_h).abs() <= 1.0);
        }
    }
}
