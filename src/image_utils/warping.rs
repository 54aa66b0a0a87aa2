use crate::calibration::homography::Homography;
use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

/// Remaps an image through a projection into a target size, filling
/// uncovered pixels with transparency.
pub fn warp_to_size(image: &RgbaImage, projection: &Projection, size: (u32, u32)) -> RgbaImage {
    let mut output = RgbaImage::new(size.0, size.1);
    warp_into(
        image,
        projection,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
        &mut output,
    );
    output
}

/// Transforms the photograph into a top-down view of the scene plane, sized
/// to the reference window. An empty photograph or a zero-size window
/// yields an empty image.
pub fn birds_eye_view(
    homography: &Homography,
    image: &RgbaImage,
    window_size: (u32, u32),
) -> RgbaImage {
    if image.width() == 0 || image.height() == 0 || window_size.0 == 0 || window_size.1 == 0 {
        return RgbaImage::new(0, 0);
    }
    let Some(projection) = homography.to_inverse_projection() else {
        return RgbaImage::new(0, 0);
    };
    warp_to_size(image, &projection, window_size)
}
