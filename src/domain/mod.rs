//! Pure domain types with minimal dependencies
//!
//! This module contains the overlay object model and the geometry it is
//! expressed in. Nothing here knows about tools, history or rendering.

pub mod color;
pub mod geometry;
pub mod overlay;
pub mod selection;

pub use color::*;
pub use geometry::*;
pub use overlay::*;
pub use selection::*;
