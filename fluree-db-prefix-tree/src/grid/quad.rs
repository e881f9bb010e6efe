//! Quad grid: each cell splits into four equal quadrants.
//!
//! Child indices: 0 top-left, 1 top-right, 2 bottom-left, 3 bottom-right.

use crate::shape::Rectangle;

pub(super) const FAN_OUT: u8 = 4;

/// Region of child `index` within `parent`.
pub(super) fn child_region(parent: &Rectangle, index: u8) -> Rectangle {
    let mid_x = (parent.min_x() + parent.max_x()) / 2.0;
    let mid_y = (parent.min_y() + parent.max_y()) / 2.0;
    let (min_x, max_x) = if index & 1 == 0 {
        (parent.min_x(), mid_x)
    } else {
        (mid_x, parent.max_x())
    };
    let (min_y, max_y) = if index & 2 == 0 {
        (mid_y, parent.max_y())
    } else {
        (parent.min_y(), mid_y)
    };
    Rectangle::new_unchecked(min_x, max_x, min_y, max_y)
}

/// Child of `parent` holding `(x, y)`, choosing right/top on the midlines.
pub(super) fn child_index_for(parent: &Rectangle, x: f64, y: f64) -> u8 {
    let mid_x = (parent.min_x() + parent.max_x()) / 2.0;
    let mid_y = (parent.min_y() + parent.max_y()) / 2.0;
    let right = u8::from(x >= mid_x);
    let bottom = u8::from(y < mid_y);
    (bottom << 1) | right
}

/// Cell width and height at `level`.
pub(super) fn dimensions(world: &Rectangle, level: u8) -> (f64, f64) {
    let divisor = 2f64.powi(i32::from(level));
    (world.width() / divisor, world.height() / divisor)
}
