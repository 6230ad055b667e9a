//! Search windows placed relative to a detection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};
use crate::template_matching::BoundingBox;

/// Side of the anchor on which an annotation is expected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Right,
    Left,
    Top,
    Bottom,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Right => "right",
            Direction::Left => "left",
            Direction::Top => "top",
            Direction::Bottom => "bottom",
        };
        f.write_str(name)
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "right" => Ok(Direction::Right),
            "left" => Ok(Direction::Left),
            "top" => Ok(Direction::Top),
            "bottom" => Ok(Direction::Bottom),
            other => Err(format!(
                "unknown direction '{other}', expected right, left, top or bottom"
            )),
        }
    }
}

/// Window of `size` next to `anchor`, clipped to an image of `image_size`.
///
/// Right and bottom windows start at the anchor. Left and top windows end at
/// the anchor, covering `[anchor - size, anchor)` on that axis, so an anchor
/// close to the image edge yields a narrower window rather than a shifted
/// one. A window with no area left after clipping is
/// [`EngineError::InvalidSearchWindow`].
pub fn search_window(
    anchor: (u32, u32),
    size: (u32, u32),
    direction: Direction,
    image_size: (u32, u32),
) -> EngineResult<BoundingBox> {
    let (ax, ay) = (i64::from(anchor.0), i64::from(anchor.1));
    let (w, h) = (i64::from(size.0), i64::from(size.1));

    let (left, top) = match direction {
        Direction::Right | Direction::Bottom => (ax, ay),
        Direction::Left => (ax - w, ay),
        Direction::Top => (ax, ay - h),
    };

    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = (left + w).min(i64::from(image_size.0));
    let y1 = (top + h).min(i64::from(image_size.1));

    if x1 <= x0 || y1 <= y0 {
        return Err(EngineError::InvalidSearchWindow {
            x: anchor.0,
            y: anchor.1,
            width: size.0,
            height: size.1,
            direction,
        });
    }

    // Every bound is within [0, image_size] here
    Ok(BoundingBox::new(
        x0 as u32,
        y0 as u32,
        (x1 - x0) as u32,
        (y1 - y0) as u32,
    ))
}
