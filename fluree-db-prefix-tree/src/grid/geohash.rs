//! Geohash grid: each cell splits into 32 children.
//!
//! Bits of each base-32 symbol interleave longitude and latitude, longitude
//! first. Levels at even depth (0-based symbol position) split 8 columns by
//! 4 rows; odd depths split 4 columns by 8 rows.

use crate::shape::Rectangle;

pub(super) const FAN_OUT: u8 = 32;

/// Columns and rows for the children of a cell at `parent_level`.
fn split(parent_level: u8) -> (u8, u8) {
    if parent_level % 2 == 0 {
        (8, 4)
    } else {
        (4, 8)
    }
}

/// `(column, row)` of a child index; row 0 is the southernmost.
fn col_row(parent_level: u8, index: u8) -> (u8, u8) {
    let bit = |n: u8| (index >> n) & 1;
    if parent_level % 2 == 0 {
        // lon lat lon lat lon
        ((bit(4) << 2) | (bit(2) << 1) | bit(0), (bit(3) << 1) | bit(1))
    } else {
        // lat lon lat lon lat
        ((bit(3) << 1) | bit(1), (bit(4) << 2) | (bit(2) << 1) | bit(0))
    }
}

fn index_of(parent_level: u8, col: u8, row: u8) -> u8 {
    if parent_level % 2 == 0 {
        (((col >> 2) & 1) << 4)
            | (((row >> 1) & 1) << 3)
            | (((col >> 1) & 1) << 2)
            | ((row & 1) << 1)
            | (col & 1)
    } else {
        (((row >> 2) & 1) << 4)
            | (((col >> 1) & 1) << 3)
            | (((row >> 1) & 1) << 2)
            | ((col & 1) << 1)
            | (row & 1)
    }
}

pub(super) fn child_region(parent: &Rectangle, parent_level: u8, index: u8) -> Rectangle {
    let (cols, rows) = split(parent_level);
    let (col, row) = col_row(parent_level, index);
    let w = parent.width() / f64::from(cols);
    let h = parent.height() / f64::from(rows);
    let min_x = parent.min_x() + w * f64::from(col);
    let min_y = parent.min_y() + h * f64::from(row);
    Rectangle::new_unchecked(min_x, min_x + w, min_y, min_y + h)
}

/// Child of `parent` holding `(x, y)`; coordinates on an interior split
/// line go to the east/north child.
pub(super) fn child_index_for(parent: &Rectangle, parent_level: u8, x: f64, y: f64) -> u8 {
    let (cols, rows) = split(parent_level);
    let slot = |v: f64, min: f64, extent: f64, n: u8| -> u8 {
        let i = ((v - min) / extent * f64::from(n)).floor();
        i.clamp(0.0, f64::from(n - 1)) as u8
    };
    let col = slot(x, parent.min_x(), parent.width(), cols);
    let row = slot(y, parent.min_y(), parent.height(), rows);
    index_of(parent_level, col, row)
}

/// Cell width and height at `level`.
pub(super) fn dimensions(level: u8) -> (f64, f64) {
    let bits = 5 * u32::from(level);
    let lon_bits = bits.div_ceil(2);
    let lat_bits = bits / 2;
    (
        360.0 / 2f64.powi(lon_bits as i32),
        180.0 / 2f64.powi(lat_bits as i32),
    )
}
