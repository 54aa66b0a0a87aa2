use image::RgbImage;

/// Removes barrel or pincushion distortion with a direct per-pixel radial
/// model: positive `k` corrects barrel distortion, negative `k` corrects
/// pincushion distortion. `scale` enlarges the sampled region to crop away
/// the black border the correction introduces. Pixels whose source falls
/// outside the input stay black.
///
/// This is a plain raster routine; it does not involve the projective
/// pipeline.
pub fn undistort(input: &RgbImage, k: f64, scale: f64) -> RgbImage {
    let width = input.width();
    let height = input.height();
    let mut output = RgbImage::new(width, height);

    let mid_x = (width / 2) as f64;
    let mid_y = (height / 2) as f64;

    for x in 0..width {
        for y in 0..height {
            let dx = x as f64 - mid_x;
            let dy = y as f64 - mid_y;
            let r = dx * dx + dy * dy;

            let undistorted_x = dx / (1.0 - k * r) * scale + mid_x;
            let undistorted_y = dy / (1.0 - k * r) * scale + mid_y;

            let in_bounds = undistorted_x.round() >= 0.0
                && undistorted_y.round() >= 0.0
                && undistorted_x.round() < width as f64
                && undistorted_y.round() < height as f64;
            if in_bounds {
                let source_x = undistorted_x as u32;
                let source_y = undistorted_y as u32;
                output.put_pixel(x, y, *input.get_pixel(source_x, source_y));
            }
        }
    }

    output
}
