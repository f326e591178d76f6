//! Geometric types for page coordinates and pointer mapping
//!
//! All overlay objects are stored in page-bitmap pixel coordinates. Pointer
//! events arrive in display coordinates and are mapped through a
//! [`ViewTransform`] before any tool logic sees them.

use serde::{Deserialize, Serialize};

/// A point in page-bitmap pixel coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Vector from `self` to `other`
    pub fn delta_to(self, other: Point) -> (f32, f32) {
        (other.x - self.x, other.y - self.y)
    }

    pub fn distance_to(self, other: Point) -> f32 {
        let (dx, dy) = self.delta_to(other);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned rectangle with a top-left origin
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Check if this rectangle contains a point (edges inclusive)
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// Maps pointer-device coordinates onto a page bitmap
///
/// The page is displayed inside a canvas whose top-left corner sits at
/// `origin` in client coordinates and whose on-screen size may differ from
/// the bitmap size (CSS-style display scaling).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    /// Top-left corner of the displayed canvas in client coordinates
    pub origin: Point,
    /// Displayed canvas size in client units
    pub display_size: (f32, f32),
    /// Page bitmap size in pixels
    pub page_size: (f32, f32),
}

impl ViewTransform {
    /// Identity mapping for a page displayed at its native size
    pub fn identity(page_width: u32, page_height: u32) -> Self {
        let size = (page_width as f32, page_height as f32);
        Self {
            origin: Point::default(),
            display_size: size,
            page_size: size,
        }
    }

    fn scale(&self) -> (f32, f32) {
        let sx = if self.display_size.0 > 0.0 {
            self.page_size.0 / self.display_size.0
        } else {
            1.0
        };
        let sy = if self.display_size.1 > 0.0 {
            self.page_size.1 / self.display_size.1
        } else {
            1.0
        };
        (sx, sy)
    }

    /// Convert a client-space pointer position to page-bitmap coordinates
    pub fn to_page(&self, client: Point) -> Point {
        let (sx, sy) = self.scale();
        Point::new(
            (client.x - self.origin.x) * sx,
            (client.y - self.origin.y) * sy,
        )
    }

    /// Convert a page-bitmap position back to client space
    pub fn to_display(&self, page: Point) -> Point {
        let (sx, sy) = self.scale();
        Point::new(page.x / sx + self.origin.x, page.y / sy + self.origin.y)
    }
}
