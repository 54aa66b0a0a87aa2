use image::{Rgba, RgbaImage, RgbImage};

/// Blends `source` over `destination` in place, weighting every channel by
/// the source pixel's alpha: `destination = (1 - a) * destination +
/// a * source`. Images of different sizes are left untouched.
pub fn blend_images(destination: &mut RgbaImage, source: &RgbaImage) {
    if destination.dimensions() != source.dimensions() {
        log::debug!(
            "blend skipped, {:?} does not match {:?}",
            destination.dimensions(),
            source.dimensions()
        );
        return;
    }
    for (destination_pixel, source_pixel) in destination.pixels_mut().zip(source.pixels()) {
        let alpha = source_pixel[3] as f32 / 255.0;
        for channel in 0..4 {
            destination_pixel[channel] = ((1.0 - alpha) * destination_pixel[channel] as f32
                + alpha * source_pixel[channel] as f32) as u8;
        }
    }
}

/// Weighted sum of two equally sized images: `alpha * first +
/// (1 - alpha) * second` per channel. Mismatched sizes yield a copy of
/// `second`.
pub fn add_weighted(first: &RgbaImage, alpha: f32, second: &RgbaImage) -> RgbaImage {
    if first.dimensions() != second.dimensions() {
        log::debug!(
            "weighted add skipped, {:?} does not match {:?}",
            first.dimensions(),
            second.dimensions()
        );
        return second.clone();
    }
    let mut output = RgbaImage::new(first.width(), first.height());
    for ((output_pixel, first_pixel), second_pixel) in
        output.pixels_mut().zip(first.pixels()).zip(second.pixels())
    {
        for channel in 0..4 {
            let value = alpha * first_pixel[channel] as f32
                + (1.0 - alpha) * second_pixel[channel] as f32;
            output_pixel[channel] = value.round().clamp(0.0, 255.0) as u8;
        }
    }
    output
}

/// Adds an opaque alpha channel to an RGB image.
pub fn rgb_to_rgba(input: &RgbImage) -> RgbaImage {
    let mut output = RgbaImage::new(input.width(), input.height());
    for (output_pixel, input_pixel) in output.pixels_mut().zip(input.pixels()) {
        let [r, g, b] = input_pixel.0;
        *output_pixel = Rgba([r, g, b, 255]);
    }
    output
}
