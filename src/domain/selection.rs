//! Selection and resize-handle types

use serde::{Deserialize, Serialize};

use super::geometry::{Point, Rect};
use super::overlay::{ObjectId, ObjectKind};

/// The single selected object, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub id: ObjectId,
    pub kind: ObjectKind,
}

impl Selection {
    pub fn text(id: ObjectId) -> Self {
        Self {
            id,
            kind: ObjectKind::Text,
        }
    }

    pub fn image(id: ObjectId) -> Self {
        Self {
            id,
            kind: ObjectKind::Image,
        }
    }
}

/// One of the eight resize handles drawn around a selected object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    /// North-West corner
    NW,
    /// North edge
    N,
    /// North-East corner
    NE,
    /// East edge
    E,
    /// South-East corner
    SE,
    /// South edge
    S,
    /// South-West corner
    SW,
    /// West edge
    W,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::NW,
        ResizeHandle::N,
        ResizeHandle::NE,
        ResizeHandle::E,
        ResizeHandle::SE,
        ResizeHandle::S,
        ResizeHandle::SW,
        ResizeHandle::W,
    ];

    pub const CORNERS: [ResizeHandle; 4] = [
        ResizeHandle::NW,
        ResizeHandle::NE,
        ResizeHandle::SE,
        ResizeHandle::SW,
    ];

    pub fn has_north(self) -> bool {
        matches!(self, ResizeHandle::NW | ResizeHandle::N | ResizeHandle::NE)
    }

    pub fn has_south(self) -> bool {
        matches!(self, ResizeHandle::SW | ResizeHandle::S | ResizeHandle::SE)
    }

    pub fn has_east(self) -> bool {
        matches!(self, ResizeHandle::NE | ResizeHandle::E | ResizeHandle::SE)
    }

    pub fn has_west(self) -> bool {
        matches!(self, ResizeHandle::NW | ResizeHandle::W | ResizeHandle::SW)
    }

    /// Position of this handle on the given bounds
    pub fn position(self, bounds: &Rect) -> Point {
        let x = if self.has_west() {
            bounds.x
        } else if self.has_east() {
            bounds.right()
        } else {
            bounds.center().x
        };
        let y = if self.has_north() {
            bounds.y
        } else if self.has_south() {
            bounds.bottom()
        } else {
            bounds.center().y
        };
        Point::new(x, y)
    }
}

/// Horizontal alignment target for the alignment helper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}
