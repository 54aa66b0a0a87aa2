extern crate openblas_src;

use crate::calibration::point::Point;
use crate::calibration::point_manager::PointManager;
use imageproc::geometric_transformations::Projection;
use ndarray::{Array1, Array2};
use ndarray_linalg::{Inverse, SVD};
use std::cell::RefCell;
use std::rc::Rc;

/// Minimum number of correspondence pairs needed to solve the transform.
const MIN_CORRESPONDENCES: usize = 4;

/// Shared handle to a [`Homography`].
///
/// Many drawables may reference the same transform at once; replacing the
/// matrix through one handle updates the projection of every holder on the
/// next render. Rendering and mutation are single-threaded per renderer, so
/// a reference-counted cell is the sharing model.
pub type SharedHomography = Rc<RefCell<Homography>>;

/// Computes and stores a projective transform between the scene plane and
/// the photograph.
///
/// A homography is a 3x3 matrix mapping homogeneous coordinates on one
/// plane to homogeneous coordinates on another. Here the forward matrix
/// maps scene-plane coordinates (e.g. meters on a field diagram) to
/// photograph pixel coordinates, and is solved from the correspondence
/// pairs collected by a [`PointManager`]. Once solved, the matrix can be
/// reused for the same camera position as long as parameters like zoom
/// remain unchanged.
///
/// The inverse matrix is recomputed every time the forward matrix is
/// stored, so the two are never inconsistent. Degenerate or insufficient
/// input never raises an error: the transform falls back to the identity
/// and annotations render unwarped instead of the caller crashing.
#[derive(Clone, Debug)]
pub struct Homography {
    matrix: Array2<f64>,
    inverse_matrix: Array2<f64>,
}

impl Homography {
    /// New transform initialized to the identity.
    pub fn new() -> Homography {
        Homography {
            matrix: Array2::eye(3),
            inverse_matrix: Array2::eye(3),
        }
    }

    /// New transform solved from the correspondences of a point manager.
    pub fn from_point_manager(point_manager: &PointManager) -> Homography {
        let mut homography = Homography::new();
        homography.compute(point_manager);
        homography
    }

    /// New shared handle around an identity transform.
    pub fn new_shared() -> SharedHomography {
        Rc::new(RefCell::new(Homography::new()))
    }

    /// Solves the forward matrix from the correspondences of a point
    /// manager, so that `matrix * mapping_point ~ image_point` for every
    /// pair. Falls back to the identity on insufficient or degenerate
    /// input.
    pub fn compute(&mut self, point_manager: &PointManager) {
        let (image_points, mapping_points) = point_manager.copy_image_mapping_points();
        self.compute_from_points(&image_points, &mapping_points);
    }

    /// Solves the forward matrix from parallel, index-aligned point
    /// sequences. See [`Homography::compute`].
    pub fn compute_from_points(&mut self, image_points: &[Point], mapping_points: &[Point]) {
        match solve_projective(mapping_points, image_points) {
            Some(matrix) => self.set_matrix(matrix),
            None => {
                log::debug!(
                    "projective solve failed for {} correspondence pairs, keeping identity",
                    image_points.len()
                );
                self.reset_to_identity();
            }
        }
    }

    /// Stores an externally supplied 3x3 matrix and recomputes the inverse.
    ///
    /// Anything that is not an invertible 3x3 matrix resets the transform
    /// to the identity.
    pub fn set_matrix(&mut self, matrix: Array2<f64>) {
        if matrix.shape() != [3, 3] {
            log::debug!("rejecting {:?} matrix, resetting to identity", matrix.shape());
            self.reset_to_identity();
            return;
        }
        match matrix.inv() {
            Ok(inverse) => {
                self.matrix = matrix;
                self.inverse_matrix = inverse;
            }
            Err(_) => {
                log::debug!("singular matrix rejected, resetting to identity");
                self.reset_to_identity();
            }
        }
    }

    /// The forward (scene-plane to photograph) matrix.
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// The inverse (photograph to scene-plane) matrix.
    pub fn inverse_matrix(&self) -> &Array2<f64> {
        &self.inverse_matrix
    }

    /// Projects a scene-plane point into photograph pixel coordinates.
    pub fn project(&self, point: Point) -> Point {
        apply_homogeneous(&self.matrix, point)
    }

    /// Projects a photograph pixel back onto the scene plane.
    pub fn unproject(&self, point: Point) -> Point {
        apply_homogeneous(&self.inverse_matrix, point)
    }

    /// The forward matrix as an `imageproc` projection, for raster warps.
    ///
    /// Warping a scene-plane raster with this projection samples, for each
    /// output photograph pixel, the raster at the pixel's inverse-transform
    /// preimage, which is exactly the double-warp reprojection step.
    pub fn to_projection(&self) -> Option<Projection> {
        let m = &self.matrix;
        Projection::from_matrix([
            m[(0, 0)] as f32,
            m[(0, 1)] as f32,
            m[(0, 2)] as f32,
            m[(1, 0)] as f32,
            m[(1, 1)] as f32,
            m[(1, 2)] as f32,
            m[(2, 0)] as f32,
            m[(2, 1)] as f32,
            m[(2, 2)] as f32,
        ])
    }

    /// The inverse matrix as an `imageproc` projection.
    pub fn to_inverse_projection(&self) -> Option<Projection> {
        self.to_projection().map(|projection| projection.invert())
    }

    fn reset_to_identity(&mut self) {
        self.matrix = Array2::eye(3);
        self.inverse_matrix = Array2::eye(3);
    }
}

impl Default for Homography {
    fn default() -> Homography {
        Homography::new()
    }
}

fn apply_homogeneous(matrix: &Array2<f64>, point: Point) -> Point {
    let x = point.x as f64;
    let y = point.y as f64;
    let u = matrix[(0, 0)] * x + matrix[(0, 1)] * y + matrix[(0, 2)];
    let v = matrix[(1, 0)] * x + matrix[(1, 1)] * y + matrix[(1, 2)];
    let w = matrix[(2, 0)] * x + matrix[(2, 1)] * y + matrix[(2, 2)];
    if w.abs() < 1e-10 {
        // Point at infinity; a defined value keeps callers total.
        return Point::new(0.0, 0.0);
    }
    Point::new((u / w) as f32, (v / w) as f32)
}

/// Least-squares DLT solve of `destination ~ H * source`.
///
/// Both point sets are Hartley-normalized (translated to their centroid and
/// scaled so the mean distance from it is sqrt(2)) before building the
/// 2Nx9 system `A h = 0`, which keeps the SVD well conditioned. The
/// solution is the right singular vector of the smallest singular value,
/// denormalized and scaled so the bottom-right entry is one.
fn solve_projective(source: &[Point], destination: &[Point]) -> Option<Array2<f64>> {
    if source.len() < MIN_CORRESPONDENCES || source.len() != destination.len() {
        return None;
    }

    let (source_normalized, t_source) = normalize_points(source);
    let (destination_normalized, t_destination) = normalize_points(destination);

    let pair_count = source.len();
    let mut a = Array2::<f64>::zeros((2 * pair_count, 9));
    for k in 0..pair_count {
        let (x, y) = source_normalized[k];
        let (u, v) = destination_normalized[k];

        a[(2 * k, 0)] = -x;
        a[(2 * k, 1)] = -y;
        a[(2 * k, 2)] = -1.0;
        a[(2 * k, 6)] = u * x;
        a[(2 * k, 7)] = u * y;
        a[(2 * k, 8)] = u;

        a[(2 * k + 1, 3)] = -x;
        a[(2 * k + 1, 4)] = -y;
        a[(2 * k + 1, 5)] = -1.0;
        a[(2 * k + 1, 6)] = v * x;
        a[(2 * k + 1, 7)] = v * y;
        a[(2 * k + 1, 8)] = v;
    }

    let (_, _, vt) = a.svd(false, true).ok()?;
    let vt = vt?;
    let h: Array1<f64> = vt.row(vt.nrows() - 1).to_owned();

    let mut normalized = Array2::<f64>::zeros((3, 3));
    for row in 0..3 {
        for column in 0..3 {
            normalized[(row, column)] = h[row * 3 + column];
        }
    }

    // Denormalize: H = T_destination^-1 * Hn * T_source.
    let denormalized = t_destination.inv().ok()?.dot(&normalized).dot(&t_source);

    let scale = denormalized[(2, 2)];
    if scale.abs() < 1e-12 {
        return None;
    }
    Some(denormalized / scale)
}

fn normalize_points(points: &[Point]) -> (Vec<(f64, f64)>, Array2<f64>) {
    let n = points.len() as f64;
    let mut centroid_x = 0.0;
    let mut centroid_y = 0.0;
    for point in points {
        centroid_x += point.x as f64;
        centroid_y += point.y as f64;
    }
    centroid_x /= n;
    centroid_y /= n;

    let mut mean_distance = 0.0;
    for point in points {
        let dx = point.x as f64 - centroid_x;
        let dy = point.y as f64 - centroid_y;
        mean_distance += (dx * dx + dy * dy).sqrt();
    }
    mean_distance /= n;

    let scale = if mean_distance > 1e-12 {
        2.0_f64.sqrt() / mean_distance
    } else {
        1.0
    };

    let mut transform = Array2::<f64>::eye(3);
    transform[(0, 0)] = scale;
    transform[(0, 2)] = -scale * centroid_x;
    transform[(1, 1)] = scale;
    transform[(1, 2)] = -scale * centroid_y;

    let normalized = points
        .iter()
        .map(|point| {
            (
                scale * (point.x as f64 - centroid_x),
                scale * (point.y as f64 - centroid_y),
            )
        })
        .collect();

    (normalized, transform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn assert_close(actual: Point, expected: Point, tolerance: f32) {
        assert!(
            (actual.x - expected.x).abs() < tolerance && (actual.y - expected.y).abs() < tolerance,
            "expected ({}, {}) ~ ({}, {}) within {}",
            actual.x,
            actual.y,
            expected.x,
            expected.y,
            tolerance
        );
    }

    fn ground_truth() -> Array2<f64> {
        array![
            [0.8, 0.05, 120.0],
            [-0.02, 1.1, 80.0],
            [0.0009, -0.0004, 1.0]
        ]
    }

    #[test]
    fn default_transform_is_identity() {
        let homography = Homography::new();
        for point in [
            Point::new(0.0, 0.0),
            Point::new(50.0, -20.0),
            Point::new(320.0, 200.0),
        ] {
            assert_close(homography.project(point), point, 1e-6);
            assert_close(homography.unproject(point), point, 1e-6);
        }
    }

    #[test]
    fn project_then_unproject_round_trips() {
        let mut homography = Homography::new();
        homography.set_matrix(ground_truth());
        for point in [
            Point::new(0.0, 0.0),
            Point::new(60.0, 40.0),
            Point::new(150.0, 120.0),
        ] {
            let projected = homography.project(point);
            assert_close(homography.unproject(projected), point, 1e-3);
        }
    }

    #[test]
    fn set_matrix_rejects_wrong_shape() {
        let mut homography = Homography::new();
        homography.set_matrix(ground_truth());
        homography.set_matrix(Array2::zeros((2, 2)));
        assert_close(homography.project(Point::new(7.0, 9.0)), Point::new(7.0, 9.0), 1e-6);
    }

    #[test]
    fn set_matrix_rejects_singular_matrix() {
        let mut homography = Homography::new();
        homography.set_matrix(Array2::zeros((3, 3)));
        assert_close(homography.project(Point::new(3.0, 4.0)), Point::new(3.0, 4.0), 1e-6);
    }

    #[test]
    fn too_few_correspondences_fall_back_to_identity() {
        let mut homography = Homography::new();
        let image_points = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ];
        let mapping_points = vec![
            Point::new(5.0, 5.0),
            Point::new(25.0, 5.0),
            Point::new(25.0, 25.0),
        ];
        homography.compute_from_points(&image_points, &mapping_points);
        assert_close(homography.project(Point::new(1.0, 2.0)), Point::new(1.0, 2.0), 1e-6);
    }

    #[test]
    fn mismatched_lengths_fall_back_to_identity() {
        let mut homography = Homography::new();
        let image_points = vec![Point::new(1.0, 1.0); 4];
        let mapping_points = vec![Point::new(0.0, 0.0); 5];
        homography.compute_from_points(&image_points, &mapping_points);
        assert_close(homography.project(Point::new(8.0, 8.0)), Point::new(8.0, 8.0), 1e-6);
    }

    #[test]
    fn collinear_correspondences_fall_back_to_identity() {
        let mut homography = Homography::new();
        let mapping_points: Vec<Point> =
            (0..6).map(|i| Point::new(i as f32 * 10.0, 0.0)).collect();
        let image_points: Vec<Point> =
            (0..6).map(|i| Point::new(i as f32 * 7.0, 0.0)).collect();
        homography.compute_from_points(&image_points, &mapping_points);
        assert_close(homography.project(Point::new(4.0, 4.0)), Point::new(4.0, 4.0), 1e-6);
    }

    #[test]
    fn solved_transform_reproduces_correspondences() {
        let mut truth = Homography::new();
        truth.set_matrix(ground_truth());

        let mapping_points: Vec<Point> = (0..3)
            .flat_map(|y| (0..3).map(move |x| Point::new(x as f32 * 40.0, y as f32 * 50.0)))
            .collect();
        let image_points: Vec<Point> =
            mapping_points.iter().map(|&p| truth.project(p)).collect();

        let mut homography = Homography::new();
        homography.compute_from_points(&image_points, &mapping_points);

        for (mapping, image) in mapping_points.iter().zip(image_points.iter()) {
            assert_close(homography.project(*mapping), *image, 1e-2);
        }
    }

    #[test]
    fn exactly_four_correspondences_recover_the_transform() {
        let mut truth = Homography::new();
        truth.set_matrix(ground_truth());

        let mapping_points = vec![
            Point::new(0.0, 0.0),
            Point::new(180.0, 0.0),
            Point::new(180.0, 130.0),
            Point::new(0.0, 130.0),
        ];
        let image_points: Vec<Point> =
            mapping_points.iter().map(|&p| truth.project(p)).collect();

        let mut homography = Homography::new();
        homography.compute_from_points(&image_points, &mapping_points);

        for point in [Point::new(0.0, 0.0), Point::new(60.0, 40.0), Point::new(150.0, 120.0)] {
            assert_close(homography.project(point), truth.project(point), 1e-2);
        }
    }

    #[test]
    fn from_point_manager_solves_the_stored_correspondences() {
        let mut truth = Homography::new();
        truth.set_matrix(ground_truth());

        let mut manager = crate::calibration::point_manager::PointManager::new_custom();
        for mapping in [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 60.0),
            Point::new(0.0, 60.0),
            Point::new(50.0, 30.0),
        ] {
            manager.add_user_point(truth.project(mapping), mapping);
        }

        let homography = Homography::from_point_manager(&manager);
        assert_close(
            homography.project(Point::new(20.0, 40.0)),
            truth.project(Point::new(20.0, 40.0)),
            1e-2,
        );
    }

    #[test]
    fn shared_handle_mutation_is_visible_to_all_holders() {
        let shared = Homography::new_shared();
        let other = Rc::clone(&shared);
        shared.borrow_mut().set_matrix(array![
            [2.0, 0.0, 0.0],
            [0.0, 2.0, 0.0],
            [0.0, 0.0, 1.0]
        ]);
        assert_close(other.borrow().project(Point::new(3.0, 5.0)), Point::new(6.0, 10.0), 1e-6);
    }

    #[test]
    fn to_projection_matches_matrix_apply() {
        let mut homography = Homography::new();
        homography.set_matrix(ground_truth());
        let projection = homography.to_projection().expect("invertible");
        let (u, v) = projection * (60.0, 40.0);
        let expected = homography.project(Point::new(60.0, 40.0));
        assert!((u - expected.x).abs() < 1e-2 && (v - expected.y).abs() < 1e-2);
    }
}
