use crate::calibration::homography::SharedHomography;
use crate::calibration::point::Point;
use crate::drawables::{project_shape_outline, stroke_closed_contour, Drawable, Style};
use crate::rendering::context::Context;
use image::{GrayImage, Luma};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

/// Whether both corners are used as given, or the span is squared off.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RectangleKind {
    Rectangle,
    Square,
}

/// An axis-aligned rectangle (or square) on the scene plane, rendered as
/// its projective image (a general quadrilateral outline) in the
/// photograph.
///
/// Like [`Circle`](crate::drawables::circle::Circle), the undistorted shape
/// is rasterized at its scene-plane position and reprojected; the outline
/// is recovered as a contour. For [`RectangleKind::Square`], the side
/// length is the smaller absolute coordinate delta between the corners and
/// the second corner is moved onto that square, keeping its quadrant
/// relative to the first corner.
pub struct Rectangle {
    homography: SharedHomography,
    style: Style,
    kind: RectangleKind,
    from: Point,
    to: Point,
}

impl Rectangle {
    /// New rectangle between two scene-plane corner points.
    pub fn new(
        homography: SharedHomography,
        kind: RectangleKind,
        from: Point,
        to: Point,
    ) -> Rectangle {
        Rectangle {
            homography,
            style: Style::new(),
            kind,
            from,
            to,
        }
    }

    pub fn from_point(&self) -> Point {
        self.from
    }

    pub fn set_from_point(&mut self, from: Point) {
        self.from = from;
    }

    pub fn to_point(&self) -> Point {
        self.to
    }

    pub fn set_to_point(&mut self, to: Point) {
        self.to = to;
    }

    pub fn kind(&self) -> RectangleKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: RectangleKind) {
        self.kind = kind;
    }

    /// The second corner actually used for rasterization: as given for
    /// rectangles, squared off for squares.
    fn effective_to(&self) -> Point {
        match self.kind {
            RectangleKind::Rectangle => self.to,
            RectangleKind::Square => {
                let side = (self.from.x - self.to.x)
                    .abs()
                    .min((self.from.y - self.to.y).abs());
                let x = if self.to.x > self.from.x {
                    self.from.x + side
                } else {
                    self.from.x - side
                };
                let y = if self.to.y > self.from.y {
                    self.from.y + side
                } else {
                    self.from.y - side
                };
                Point::new(x, y)
            }
        }
    }
}

impl Drawable for Rectangle {
    fn draw(&self, context: &mut Context) {
        let homography = self.homography.borrow();
        log::trace!(
            "rectangle corners {} -> {} project to {} -> {}",
            self.from,
            self.to,
            homography.project(self.from),
            homography.project(self.to)
        );

        let to = self.effective_to();
        let left = self.from.x.min(to.x).round() as i32;
        let top = self.from.y.min(to.y).round() as i32;
        let width = (self.from.x - to.x).abs().round() as u32 + 1;
        let height = (self.from.y - to.y).abs().round() as u32 + 1;

        let mut scene_raster = GrayImage::new(context.width(), context.height());
        draw_hollow_rect_mut(
            &mut scene_raster,
            Rect::at(left, top).of_size(width, height),
            Luma([255]),
        );

        let Some(contour) = project_shape_outline(&scene_raster, &homography, None) else {
            log::debug!(
                "rectangle {} -> {} has no projected outline, skipped",
                self.from,
                self.to
            );
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
