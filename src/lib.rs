//! Calibrated geometric annotations for photographs of planar scenes.
//!
//! A photograph of a flat scene (a sports field, a court, a pitch diagram)
//! is related to the scene plane by a projective transform. This crate
//! computes that transform from operator-marked point correspondences and
//! uses it to render lines, shapes and inserted images at geometrically
//! correct positions in the photograph, despite perspective distortion.
//!
//! The pipeline: a [`PointManager`] accumulates correspondence pairs, a
//! [`Homography`] solves the 3x3 projective matrix from them, each drawable
//! holds a shared handle to that transform and projects its scene-plane
//! geometry into photograph space, and a [`Renderer`] composites the drawn
//! annotations over the photograph.

pub mod calibration;
pub mod drawables;
pub mod image_utils;
pub mod rendering;

pub use calibration::homography::{Homography, SharedHomography};
pub use calibration::point::Point;
pub use calibration::point_manager::{PointManager, UserPoint};
pub use drawables::circle::Circle;
pub use drawables::image::{Image, Rotation};
pub use drawables::line::{Line, LineOrientation};
pub use drawables::rectangle::{Rectangle, RectangleKind};
pub use drawables::{Drawable, Style};
pub use rendering::context::Context;
pub use rendering::renderer::{DrawableHandle, Renderer};
