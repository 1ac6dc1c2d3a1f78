//! Region rectangles and frame geometry.
//!
//! Callers send rectangles in source-pixel coordinates with no guarantees
//! at all. [`RawRect`] holds them as given; [`RawRect::clamp`] turns them
//! into [`ClampedRect`]s that are safe to hand to the masking filter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use masker_common::error::{MaskerError, MaskerResult, ValidationKind};

/// Smallest width/height a masking region may have.
pub const MIN_EXTENT: u32 = 2;

const DEFAULT_ORIGIN: f64 = 0.0;
const DEFAULT_EXTENT: f64 = 1.0;

/// Frame size of the first video stream, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameDimensions {
    pub width: u32,
    pub height: u32,
}

impl FrameDimensions {
    /// Returns `None` unless both axes are positive.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    /// Whether either axis has an odd pixel count.
    pub fn has_odd_axis(&self) -> bool {
        self.width % 2 == 1 || self.height % 2 == 1
    }

    /// Each axis rounded up to the next even value.
    pub fn even_aligned(&self) -> Self {
        Self {
            width: round_up_even(self.width),
            height: round_up_even(self.height),
        }
    }
}

fn round_up_even(v: u32) -> u32 {
    v.saturating_add(v & 1)
}

/// A rectangle exactly as the caller supplied it.
///
/// Values may be negative, fractional, or far outside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl RawRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Build a rectangle from one element of the `rects` array.
    ///
    /// Each field is coerced the lenient way: numbers pass through,
    /// numeric strings are parsed, booleans map to 1/0. Anything that ends
    /// up zero or not-a-number takes the default (0 for the origin, 1 for
    /// the extent). Non-object elements therefore become the default
    /// rectangle.
    pub fn from_json(value: &Value) -> Self {
        let field = |key: &str, default: f64| coerce_number(value.get(key), default);
        Self {
            x: field("x", DEFAULT_ORIGIN),
            y: field("y", DEFAULT_ORIGIN),
            w: field("w", DEFAULT_EXTENT),
            h: field("h", DEFAULT_EXTENT),
        }
    }

    /// Parse the raw `rects` form field.
    ///
    /// A missing or empty field means `[]`. Malformed JSON fails with
    /// `bad_rects_json`; anything but a non-empty array fails with
    /// `no_rects`.
    pub fn parse_list(raw: Option<&str>) -> MaskerResult<Vec<Self>> {
        let text = match raw {
            Some(text) if !text.is_empty() => text,
            _ => "[]",
        };

        let value: Value = serde_json::from_str(text)
            .map_err(|_| MaskerError::validation(ValidationKind::BadRectsJson))?;

        match value {
            Value::Array(items) if !items.is_empty() => {
                Ok(items.iter().map(Self::from_json).collect())
            }
            _ => Err(MaskerError::validation(ValidationKind::NoRects)),
        }
    }

    /// Clamp into the frame, or into the non-negative quadrant when the
    /// frame size is unknown.
    ///
    /// Returns `None` when the result would be narrower or shorter than
    /// [`MIN_EXTENT`].
    pub fn clamp(&self, dims: Option<FrameDimensions>) -> Option<ClampedRect> {
        let min_extent = f64::from(MIN_EXTENT);
        let x = half_up(or_default(self.x, DEFAULT_ORIGIN));
        let y = half_up(or_default(self.y, DEFAULT_ORIGIN));

        let (x, y, max_w, max_h) = match dims {
            Some(d) => {
                let x = x.clamp(0.0, f64::from(d.width.saturating_sub(1)));
                let y = y.clamp(0.0, f64::from(d.height.saturating_sub(1)));
                (x, y, f64::from(d.width) - x, f64::from(d.height) - y)
            }
            None => (x.max(0.0), y.max(0.0), f64::INFINITY, f64::INFINITY),
        };

        let w = half_up(or_default(self.w, DEFAULT_EXTENT))
            .max(min_extent)
            .min(max_w);
        let h = half_up(or_default(self.h, DEFAULT_EXTENT))
            .max(min_extent)
            .min(max_h);

        if w < min_extent || h < min_extent {
            return None;
        }

        Some(ClampedRect {
            x: to_pixel(x),
            y: to_pixel(y),
            w: to_pixel(w),
            h: to_pixel(h),
        })
    }
}

/// A rectangle that satisfies the masking invariants.
///
/// `w >= 2`, `h >= 2`, and when the frame size is known the rectangle lies
/// entirely inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClampedRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl ClampedRect {
    /// One past the rightmost covered column.
    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.w)
    }

    /// One past the bottom covered row.
    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.h)
    }

    /// Whether the rectangle lies fully inside `dims`.
    pub fn fits_within(&self, dims: FrameDimensions) -> bool {
        self.right() <= u64::from(dims.width) && self.bottom() <= u64::from(dims.height)
    }
}

/// Clamp every rectangle, dropping the ones that cannot be made valid.
///
/// Fails with `no_rects` on empty input and `no_rects_after_clamp` when
/// nothing survives.
pub fn clamp_rects(
    raws: &[RawRect],
    dims: Option<FrameDimensions>,
) -> MaskerResult<Vec<ClampedRect>> {
    if raws.is_empty() {
        return Err(MaskerError::validation(ValidationKind::NoRects));
    }

    let clamped: Vec<ClampedRect> = raws.iter().filter_map(|r| r.clamp(dims)).collect();
    if clamped.is_empty() {
        return Err(MaskerError::validation(ValidationKind::NoRectsAfterClamp));
    }

    Ok(clamped)
}

fn coerce_number(value: Option<&Value>, default: f64) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse().unwrap_or(f64::NAN)
            }
        }
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        _ => f64::NAN,
    };
    or_default(n, default)
}

fn or_default(v: f64, default: f64) -> f64 {
    if v.is_nan() || v == 0.0 {
        default
    } else {
        v
    }
}

/// Round half toward positive infinity: `-2.5 -> -2`, `2.5 -> 3`.
fn half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

// `as` saturates at the u32 bounds.
fn to_pixel(v: f64) -> u32 {
    v as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HD: FrameDimensions = FrameDimensions {
        width: 1920,
        height: 1080,
    };

    fn clamped(x: u32, y: u32, w: u32, h: u32) -> ClampedRect {
        ClampedRect { x, y, w, h }
    }

    #[test]
    fn test_frame_dimensions_require_positive_axes() {
        assert!(FrameDimensions::new(0, 1080).is_none());
        assert!(FrameDimensions::new(1920, 0).is_none());
        assert_eq!(FrameDimensions::new(1920, 1080), Some(HD));
    }

    #[test]
    fn test_even_alignment() {
        let odd = FrameDimensions::new(1919, 1079).unwrap();
        assert!(odd.has_odd_axis());
        assert_eq!(odd.even_aligned(), HD);
        assert!(!HD.has_odd_axis());
        assert_eq!(HD.even_aligned(), HD);
    }

    #[test]
    fn test_negative_origin_is_pulled_into_frame() {
        let rect = RawRect::new(-10.0, 0.0, 100.0, 50.0).clamp(Some(HD));
        assert_eq!(rect, Some(clamped(0, 0, 100, 50)));
    }

    #[test]
    fn test_far_outside_rect_is_dropped() {
        // x clamps to 1919, leaving a single column.
        let rect = RawRect::new(5000.0, 5000.0, 10.0, 10.0).clamp(Some(HD));
        assert_eq!(rect, None);
    }

    #[test]
    fn test_overhanging_rect_is_trimmed() {
        let rect = RawRect::new(1900.0, 1000.0, 100.0, 200.0).clamp(Some(HD));
        assert_eq!(rect, Some(clamped(1900, 1000, 20, 80)));
    }

    #[test]
    fn test_tiny_extent_grows_to_minimum() {
        let rect = RawRect::new(10.0, 10.0, 0.4, 1.0).clamp(Some(HD));
        assert_eq!(rect, Some(clamped(10, 10, 2, 2)));
    }

    #[test]
    fn test_rounding_is_half_up() {
        let rect = RawRect::new(10.5, -2.5, 20.5, 30.4).clamp(None);
        assert_eq!(rect, Some(clamped(11, 0, 21, 30)));
        assert_eq!(half_up(-2.5), -2.0);
        assert_eq!(half_up(2.5), 3.0);
    }

    #[test]
    fn test_unknown_dimensions_only_enforce_minimums() {
        let rect = RawRect::new(-5.0, 9000.0, 1.0, 50000.0).clamp(None);
        assert_eq!(rect, Some(clamped(0, 9000, 2, 50000)));
    }

    #[test]
    fn test_huge_values_saturate() {
        let rect = RawRect::new(1e300, 0.0, f64::INFINITY, 4.0).clamp(None);
        assert_eq!(rect, Some(clamped(u32::MAX, 0, u32::MAX, 4)));
    }

    #[test]
    fn test_from_json_coerces_fields() {
        let value = serde_json::json!({"x": "12", "y": true, "w": null, "h": "abc"});
        assert_eq!(RawRect::from_json(&value), RawRect::new(12.0, 1.0, 1.0, 1.0));

        let value = serde_json::json!({"x": 0, "y": "", "w": 0, "h": -3.5});
        assert_eq!(RawRect::from_json(&value), RawRect::new(0.0, 0.0, 1.0, -3.5));
    }

    #[test]
    fn test_from_json_non_object_is_default_rect() {
        let rect = RawRect::from_json(&serde_json::json!(42));
        assert_eq!(rect, RawRect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(rect.clamp(Some(HD)), Some(clamped(0, 0, 2, 2)));
    }

    #[test]
    fn test_parse_list_errors() {
        let kind = |raw: Option<&str>| {
            RawRect::parse_list(raw)
                .unwrap_err()
                .validation_kind()
                .unwrap()
        };
        assert_eq!(kind(None), ValidationKind::NoRects);
        assert_eq!(kind(Some("")), ValidationKind::NoRects);
        assert_eq!(kind(Some("[]")), ValidationKind::NoRects);
        assert_eq!(kind(Some("{\"x\":1}")), ValidationKind::NoRects);
        assert_eq!(kind(Some("[{")), ValidationKind::BadRectsJson);
    }

    #[test]
    fn test_parse_list_keeps_order() {
        let rects =
            RawRect::parse_list(Some(r#"[{"x":1,"y":2,"w":3,"h":4},{"x":5,"y":6,"w":7,"h":8}]"#))
                .unwrap();
        assert_eq!(
            rects,
            vec![
                RawRect::new(1.0, 2.0, 3.0, 4.0),
                RawRect::new(5.0, 6.0, 7.0, 8.0)
            ]
        );
    }

    #[test]
    fn test_clamp_rects_reports_empty_results() {
        let err = clamp_rects(&[], Some(HD)).unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationKind::NoRects));

        let err = clamp_rects(&[RawRect::new(5000.0, 5000.0, 10.0, 10.0)], Some(HD)).unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationKind::NoRectsAfterClamp));
    }

    #[test]
    fn test_zero_sized_frame_drops_everything() {
        let empty = FrameDimensions {
            width: 0,
            height: 0,
        };
        assert_eq!(RawRect::new(1.0, 1.0, 5.0, 5.0).clamp(Some(empty)), None);

        let err = clamp_rects(&[RawRect::new(1.0, 1.0, 5.0, 5.0)], Some(empty)).unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationKind::NoRectsAfterClamp));
    }

    #[test]
    fn test_out_of_range_literal_is_bad_json() {
        let err = RawRect::parse_list(Some(r#"[{"x":1,"y":1,"w":1e400,"h":4}]"#)).unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationKind::BadRectsJson));
    }

    #[test]
    fn test_clamp_rects_drops_only_invalid() {
        let raws = [
            RawRect::new(5000.0, 5000.0, 10.0, 10.0),
            RawRect::new(100.0, 100.0, 40.0, 40.0),
        ];
        let rects = clamp_rects(&raws, Some(HD)).unwrap();
        assert_eq!(rects, vec![clamped(100, 100, 40, 40)]);
    }

    fn inside_rect() -> impl Strategy<Value = (FrameDimensions, ClampedRect)> {
        (2u32..4096, 2u32..4096).prop_flat_map(|(width, height)| {
            (0..width - 1, 0..height - 1).prop_flat_map(move |(x, y)| {
                (2..=width - x, 2..=height - y).prop_map(move |(w, h)| {
                    (FrameDimensions { width, height }, ClampedRect { x, y, w, h })
                })
            })
        })
    }

    proptest! {
        #[test]
        fn prop_inside_rects_are_unchanged((dims, rect) in inside_rect()) {
            let raw = RawRect::new(
                f64::from(rect.x),
                f64::from(rect.y),
                f64::from(rect.w),
                f64::from(rect.h),
            );
            prop_assert_eq!(raw.clamp(Some(dims)), Some(rect));
        }

        #[test]
        fn prop_clamped_rects_fit_or_drop(
            width in 1u32..4096,
            height in 1u32..4096,
            x in -10_000.0f64..10_000.0,
            y in -10_000.0f64..10_000.0,
            w in -10_000.0f64..10_000.0,
            h in -10_000.0f64..10_000.0,
        ) {
            let dims = FrameDimensions { width, height };
            if let Some(rect) = RawRect::new(x, y, w, h).clamp(Some(dims)) {
                prop_assert!(rect.w >= MIN_EXTENT && rect.h >= MIN_EXTENT);
                prop_assert!(rect.fits_within(dims));
            }
        }
    }
}
