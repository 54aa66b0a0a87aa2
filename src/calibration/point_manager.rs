use crate::calibration::point::Point;
use serde::{Deserialize, Serialize};

/// A pair of corresponding points: one marked in the photograph, one on the
/// scene-plane reference diagram.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct UserPoint {
    pub image_point: Point,
    pub mapping_point: Point,
}

/// Stores the correspondence pairs used to solve a homography.
///
/// Mapping points describe positions on the flat reference plane (for sport
/// fields these are derived from real field dimensions, in meters). A scale
/// can be applied so that one scene unit covers more than one pixel in the
/// reference window, and an offset shifts every mapping point to leave a
/// margin beyond the field boundary. Both are applied once, up front, to
/// every mapping point handed to the constructor.
///
/// User points are kept in insertion order; removal and iteration follow
/// that order. The solved transform does not depend on it.
#[derive(Clone, Debug, Default)]
pub struct PointManager {
    user_points: Vec<UserPoint>,
    mapping_points: Vec<Point>,
    offset: Point,
    scale: Point,
    window_size: (u32, u32),
}

impl PointManager {
    /// New manager over a set of reference mapping points. Every mapping
    /// point is scaled and then offset; the reference window size is the
    /// maximum integer extent of the adjusted points.
    pub fn new(mapping_points: Vec<Point>, scale: Point, offset: Point) -> PointManager {
        let mapping_points: Vec<Point> = mapping_points
            .into_iter()
            .map(|point| Point::new(point.x * scale.x + offset.x, point.y * scale.y + offset.y))
            .collect();
        let window_size = compute_window_size(&mapping_points);
        PointManager {
            user_points: Vec::new(),
            mapping_points,
            offset,
            scale,
            window_size,
        }
    }

    /// New manager with no predefined mapping points, for storing custom
    /// correspondences.
    pub fn new_custom() -> PointManager {
        PointManager::new(Vec::new(), Point::new(1.0, 1.0), Point::new(0.0, 0.0))
    }

    /// Adds a correspondence pair and returns its index handle.
    pub fn add_user_point(&mut self, image_point: Point, mapping_point: Point) -> usize {
        self.user_points.push(UserPoint {
            image_point,
            mapping_point,
        });
        self.user_points.len() - 1
    }

    /// Removes the correspondence at `index`. Out-of-range indices are a
    /// no-op.
    pub fn remove_user_point(&mut self, index: usize) {
        if index < self.user_points.len() {
            self.user_points.remove(index);
        }
    }

    /// Removes every correspondence.
    pub fn clear_user_points(&mut self) {
        self.user_points.clear();
    }

    /// Copies the stored correspondences out as two parallel, index-aligned
    /// sequences of image points and mapping points.
    pub fn copy_image_mapping_points(&self) -> (Vec<Point>, Vec<Point>) {
        self.user_points
            .iter()
            .map(|point| (point.image_point, point.mapping_point))
            .unzip()
    }

    /// Estimates the pixel density (scene units per photograph pixel) from
    /// the first two correspondences, corrected for the x scale. Returns
    /// zero when fewer than two correspondences exist or the two image
    /// points coincide.
    pub fn compute_pixel_density(&self) -> f32 {
        if self.user_points.len() < 2 {
            return 0.0;
        }
        let from = &self.user_points[0];
        let to = &self.user_points[1];
        let image_distance = from.image_point.distance_to(&to.image_point);
        if image_distance == 0.0 {
            return 0.0;
        }
        let mapping_distance = from.mapping_point.distance_to(&to.mapping_point);
        mapping_distance / image_distance / self.scale.x
    }

    pub fn mapping_points(&self) -> &[Point] {
        &self.mapping_points
    }

    pub fn user_points(&self) -> &[UserPoint] {
        &self.user_points
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn scale(&self) -> Point {
        self.scale
    }

    /// The scene-plane reference window size (maximum mapping extents).
    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }
}

fn compute_window_size(mapping_points: &[Point]) -> (u32, u32) {
    let mut width = 0i64;
    let mut height = 0i64;
    for point in mapping_points {
        width = width.max(point.x as i64);
        height = height.max(point.y as i64);
    }
    (width.max(0) as u32, height.max(0) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tennis_like_manager() -> PointManager {
        PointManager::new(
            vec![
                Point::new(0.0, 0.0),
                Point::new(23.77, 0.0),
                Point::new(23.77, 10.97),
                Point::new(0.0, 10.97),
            ],
            Point::new(1.0, 1.0),
            Point::new(0.0, 0.0),
        )
    }

    #[test]
    fn scale_and_offset_are_applied_to_mapping_points() {
        let manager = PointManager::new(
            vec![Point::new(2.0, 3.0)],
            Point::new(10.0, 10.0),
            Point::new(5.0, 7.0),
        );
        assert_eq!(manager.mapping_points()[0], Point::new(25.0, 37.0));
    }

    #[test]
    fn window_size_is_max_mapping_extent() {
        let manager = PointManager::new(
            vec![
                Point::new(0.0, 0.0),
                Point::new(13.4, 2.0),
                Point::new(4.0, 6.1),
            ],
            Point::new(10.0, 10.0),
            Point::new(0.0, 0.0),
        );
        assert_eq!(manager.window_size(), (134, 61));
    }

    #[test]
    fn user_points_keep_insertion_order() {
        let mut manager = PointManager::new_custom();
        manager.add_user_point(Point::new(1.0, 1.0), Point::new(10.0, 10.0));
        let handle = manager.add_user_point(Point::new(2.0, 2.0), Point::new(20.0, 20.0));
        manager.add_user_point(Point::new(3.0, 3.0), Point::new(30.0, 30.0));

        manager.remove_user_point(handle);
        let (image_points, mapping_points) = manager.copy_image_mapping_points();
        assert_eq!(image_points, vec![Point::new(1.0, 1.0), Point::new(3.0, 3.0)]);
        assert_eq!(mapping_points, vec![Point::new(10.0, 10.0), Point::new(30.0, 30.0)]);

        manager.remove_user_point(99);
        assert_eq!(manager.user_points().len(), 2);

        manager.clear_user_points();
        assert!(manager.user_points().is_empty());
    }

    #[test]
    fn pixel_density_uses_first_two_points() {
        let mut manager = tennis_like_manager();
        assert_eq!(manager.compute_pixel_density(), 0.0);

        manager.add_user_point(Point::new(0.0, 0.0), Point::new(0.0, 0.0));
        manager.add_user_point(Point::new(100.0, 0.0), Point::new(50.0, 0.0));
        assert!((manager.compute_pixel_density() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn pixel_density_with_coincident_image_points_is_zero() {
        let mut manager = PointManager::new_custom();
        manager.add_user_point(Point::new(5.0, 5.0), Point::new(0.0, 0.0));
        manager.add_user_point(Point::new(5.0, 5.0), Point::new(10.0, 0.0));
        assert_eq!(manager.compute_pixel_density(), 0.0);
    }
}
