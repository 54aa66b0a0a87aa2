use crate::calibration::homography::SharedHomography;
use crate::calibration::point::Point;
use crate::drawables::{stroke_segment, Drawable, Style};
use crate::rendering::context::Context;

/// Axis the line follows on the scene plane.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineOrientation {
    Horizontal,
    Vertical,
}

/// A full-width (or full-height) line of the scene-plane reference window,
/// anchored at a single scene point and projected into the photograph.
///
/// The anchor fixes the line's position on the orthogonal axis; the two
/// endpoints span the reference window, inset from its edges by `offset`
/// scene units. After projection, a horizontal line whose endpoint lands
/// outside both photograph bounds at once is clipped back to the left or
/// right photograph edge along the projected line.
pub struct Line {
    homography: SharedHomography,
    style: Style,
    point: Point,
    orientation: LineOrientation,
    offset: f32,
    window_size: (u32, u32),
}

impl Line {
    /// New line through the scene-plane `point`. `window_size` is the
    /// reference window from the point manager; `offset` insets the
    /// endpoints from the window edges.
    pub fn new(
        homography: SharedHomography,
        orientation: LineOrientation,
        point: Point,
        window_size: (u32, u32),
        offset: f32,
    ) -> Line {
        Line {
            homography,
            style: Style::new(),
            point,
            orientation,
            offset,
            window_size,
        }
    }

    pub fn point(&self) -> Point {
        self.point
    }

    pub fn set_point(&mut self, point: Point) {
        self.point = point;
    }

    pub fn orientation(&self) -> LineOrientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: LineOrientation) {
        self.orientation = orientation;
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: f32) {
        self.offset = offset;
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    pub fn set_window_size(&mut self, window_size: (u32, u32)) {
        self.window_size = window_size;
    }

    /// Projected, clipped and rounded photograph-space endpoints for a
    /// photograph of the given size.
    fn compute_endpoints(&self, photo_width: u32, photo_height: u32) -> (Point, Point) {
        let homography = self.homography.borrow();
        let anchor = homography.project(self.point);

        let mut start = self.point;
        let mut end = self.point;
        match self.orientation {
            LineOrientation::Horizontal => {
                start.x = self.offset;
                end.x = self.window_size.0 as f32 - self.offset;
            }
            LineOrientation::Vertical => {
                start.y = self.offset;
                end.y = self.window_size.1 as f32 - self.offset;
            }
        }

        let mut start = homography.project(start);
        let mut end = homography.project(end);

        if self.orientation == LineOrientation::Horizontal {
            let width = photo_width as f32;
            let height = photo_height as f32;
            // Clip only when an endpoint overflows both bounds at once;
            // a single-axis overflow is left as projected.
            if start.x.round().abs() > width && start.y.round().abs() > height {
                start = intersect_lines(
                    (Point::new(0.0, 0.0), Point::new(0.0, height)),
                    (anchor, end),
                );
            } else if end.x.round().abs() > width && end.y.round().abs() > height {
                end = intersect_lines(
                    (Point::new(width, 0.0), Point::new(width, height)),
                    (start, anchor),
                );
            }
        }

        (
            Point::new(start.x.round(), start.y.round()),
            Point::new(end.x.round(), end.y.round()),
        )
    }
}

impl Drawable for Line {
    fn draw(&self, context: &mut Context) {
        let (start, end) = self.compute_endpoints(context.width(), context.height());
        stroke_segment(
            context.image_mut(),
            (start.x, start.y),
            (end.x, end.y),
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

/// Intersection of two lines, each given by two points, in determinant
/// (cross-product) form. Parallel lines yield `(0, 0)`; callers tolerate
/// the degenerate value.
fn intersect_lines(first: (Point, Point), second: (Point, Point)) -> Point {
    let a1 = first.0.y - first.1.y;
    let b1 = first.1.x - first.0.x;
    let c1 = first.0.x * first.1.y - first.1.x * first.0.y;

    let a2 = second.0.y - second.1.y;
    let b2 = second.1.x - second.0.x;
    let c2 = second.0.x * second.1.y - second.1.x * second.0.y;

    let px = b1 * c2 - b2 * c1;
    let py = a2 * c1 - a1 * c2;
    let denominator = a1 * b2 - a2 * b1;

    if denominator == 0.0 {
        return Point::new(0.0, 0.0);
    }
    Point::new(px / denominator, py / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::homography::Homography;
    use ndarray::array;

    #[test]
    fn horizontal_line_spans_the_window_under_identity() {
        let line = Line::new(
            Homography::new_shared(),
            LineOrientation::Horizontal,
            Point::new(50.0, 50.0),
            (100, 100),
            0.0,
        );
        let (start, end) = line.compute_endpoints(100, 100);
        assert_eq!(start, Point::new(0.0, 50.0));
        assert_eq!(end, Point::new(100.0, 50.0));
    }

    #[test]
    fn vertical_line_spans_the_window_under_identity() {
        let line = Line::new(
            Homography::new_shared(),
            LineOrientation::Vertical,
            Point::new(30.0, 70.0),
            (100, 100),
            5.0,
        );
        let (start, end) = line.compute_endpoints(100, 100);
        assert_eq!(start, Point::new(30.0, 5.0));
        assert_eq!(end, Point::new(30.0, 95.0));
    }

    #[test]
    fn drawn_horizontal_line_covers_the_full_row() {
        let mut line = Line::new(
            Homography::new_shared(),
            LineOrientation::Horizontal,
            Point::new(50.0, 50.0),
            (100, 100),
            0.0,
        );
        line.set_color(image::Rgb([0, 0, 255]));
        let mut context = Context::new(100, 100);
        line.draw(&mut context);
        for x in 0..100 {
            assert!(context.image().get_pixel(x, 50)[3] > 0, "column {x}");
        }
        assert_eq!(context.image().get_pixel(50, 49)[3], 0);
    }

    #[test]
    fn endpoint_outside_both_bounds_is_clipped_to_the_photograph_edge() {
        let shared = Homography::new_shared();
        // Scene -> photo: scale by 10 and shift, pushing the projected
        // start endpoint outside both bounds of a 100x100 photograph.
        shared.borrow_mut().set_matrix(array![
            [-10.0, 0.0, 150.0],
            [0.0, 10.0, 150.0],
            [0.0, 0.0, 1.0]
        ]);
        let line = Line::new(
            shared,
            LineOrientation::Horizontal,
            Point::new(5.0, 5.0),
            (10, 10),
            0.0,
        );
        // Unclipped endpoints would be (150, 200) and (50, 200); the first
        // overflows both bounds and is pulled back to the left-edge
        // intersection of the projected line.
        let (start, end) = line.compute_endpoints(100, 100);
        assert_eq!(end, Point::new(50.0, 200.0));
        assert_eq!(start, Point::new(0.0, 200.0));
    }

    #[test]
    fn endpoint_outside_one_bound_only_is_not_clipped() {
        let shared = Homography::new_shared();
        shared.borrow_mut().set_matrix(array![
            [3.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0]
        ]);
        let line = Line::new(
            shared,
            LineOrientation::Horizontal,
            Point::new(50.0, 50.0),
            (100, 100),
            0.0,
        );
        // End projects to (300, 50): outside the width but inside the
        // height, so the heuristic leaves it alone.
        let (start, end) = line.compute_endpoints(100, 100);
        assert_eq!(start, Point::new(0.0, 50.0));
        assert_eq!(end, Point::new(300.0, 50.0));
    }

    #[test]
    fn intersection_of_crossing_lines() {
        let point = intersect_lines(
            (Point::new(0.0, 0.0), Point::new(10.0, 10.0)),
            (Point::new(0.0, 10.0), Point::new(10.0, 0.0)),
        );
        assert_eq!(point, Point::new(5.0, 5.0));
    }

    #[test]
    fn parallel_lines_intersect_at_the_degenerate_origin() {
        let point = intersect_lines(
            (Point::new(0.0, 0.0), Point::new(10.0, 0.0)),
            (Point::new(0.0, 5.0), Point::new(10.0, 5.0)),
        );
        assert_eq!(point, Point::new(0.0, 0.0));
    }
}
