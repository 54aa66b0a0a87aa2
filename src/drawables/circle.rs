use crate::calibration::homography::SharedHomography;
use crate::calibration::point::Point;
use crate::drawables::{project_shape_outline, stroke_closed_contour, Drawable, Style};
use crate::rendering::context::Context;
use image::{GrayImage, Luma};
use imageproc::drawing::draw_hollow_circle_mut;

/// Blur applied to the reprojected circle raster before contour extraction,
/// to keep the traced outline smooth.
const OUTLINE_BLUR_SIGMA: f32 = 1.1;

/// A circle on the scene plane, rendered as its projective image (a curved
/// closed outline) in the photograph.
///
/// A circle under a projective transform has no simple closed-form boundary
/// in the photograph, so the true circle is rasterized at its scene-plane
/// position and the raster is reprojected instead; the outline is then
/// recovered as a contour and stroked with this drawable's style.
pub struct Circle {
    homography: SharedHomography,
    style: Style,
    point: Point,
    radius: u32,
}

impl Circle {
    /// New circle with `point` as its scene-plane center and `radius` in
    /// scene units.
    pub fn new(homography: SharedHomography, point: Point, radius: u32) -> Circle {
        Circle {
            homography,
            style: Style::new(),
            point,
            radius,
        }
    }

    pub fn point(&self) -> Point {
        self.point
    }

    pub fn set_point(&mut self, point: Point) {
        self.point = point;
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: u32) {
        self.radius = radius;
    }
}

impl Drawable for Circle {
    fn draw(&self, context: &mut Context) {
        let homography = self.homography.borrow();
        log::trace!(
            "circle at {} projects to {}",
            self.point,
            homography.project(self.point)
        );

        let mut scene_raster = GrayImage::new(context.width(), context.height());
        draw_hollow_circle_mut(
            &mut scene_raster,
            (self.point.x.round() as i32, self.point.y.round() as i32),
            self.radius as i32,
            Luma([255]),
        );

        let Some(contour) =
            project_shape_outline(&scene_raster, &homography, Some(OUTLINE_BLUR_SIGMA))
        else {
            log::debug!("circle at {} has no projected outline, skipped", self.point);
            return;
        };
        stroke_closed_contour(
            context.image_mut(),
            &contour.points,
            self.style.stroke_color(),
            self.style.thickness,
        );
    }

    fn style(&self) -> &Style {
        &self.style
    }

    fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }
}
