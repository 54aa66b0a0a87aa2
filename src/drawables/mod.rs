//! Annotation entities that project their scene-plane geometry into the
//! photograph and paint themselves onto a rendering context.

pub mod circle;
pub mod image;
pub mod line;
pub mod rectangle;

use crate::calibration::homography::Homography;
use crate::rendering::context::Context;
use ::image::{GrayImage, Luma, Rgb, Rgba, RgbaImage};
use imageproc::contours::{find_contours, Contour};
use imageproc::drawing::{
    draw_antialiased_line_segment_mut, draw_filled_circle_mut, draw_polygon_mut,
};
use imageproc::geometric_transformations::{warp, Interpolation};
use imageproc::pixelops::interpolate;
use imageproc::point::Point as PixelPoint;
use itertools::Itertools;

/// Style attributes shared by every drawable.
#[derive(Clone, Copy, Debug)]
pub struct Style {
    color: Rgb<u8>,
    thickness: u32,
    alpha: f32,
}

impl Style {
    pub fn new() -> Style {
        Style {
            color: Rgb([0, 0, 0]),
            thickness: 1,
            alpha: 1.0,
        }
    }

    /// The stroke color with the opacity folded into the alpha channel.
    pub(crate) fn stroke_color(&self) -> Rgba<u8> {
        let Rgb([r, g, b]) = self.color;
        Rgba([r, g, b, (255.0 * self.alpha).round() as u8])
    }
}

impl Default for Style {
    fn default() -> Style {
        Style::new()
    }
}

/// A geometric annotation that knows how to project and render itself.
///
/// Implementations hold a shared handle to the projective transform and a
/// [`Style`]; the provided methods expose the style attributes the way
/// every drawable supports them. Opacity writes are clamped to `[0, 1]`.
pub trait Drawable {
    /// Projects this drawable's geometry and paints it onto the context.
    ///
    /// Failures (degenerate transform, geometry outside the photograph, no
    /// extractable outline) skip the draw; they never abort a render pass.
    fn draw(&self, context: &mut Context);

    fn style(&self) -> &Style;

    fn style_mut(&mut self) -> &mut Style;

    fn color(&self) -> Rgb<u8> {
        self.style().color
    }

    fn set_color(&mut self, color: Rgb<u8>) {
        self.style_mut().color = color;
    }

    fn thickness(&self) -> u32 {
        self.style().thickness
    }

    fn set_thickness(&mut self, thickness: u32) {
        self.style_mut().thickness = thickness;
    }

    fn alpha(&self) -> f32 {
        self.style().alpha
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.style_mut().alpha = alpha.clamp(0.0, 1.0);
    }
}

/// Reprojects a scene-plane shape raster into photograph space and extracts
/// its outline.
///
/// The raster holds the undistorted shape at its scene-plane position; the
/// warp samples it at each photograph pixel's inverse-transform preimage,
/// which yields the projectively distorted region without any closed-form
/// boundary math. An optional blur smooths aliasing before the outer
/// boundary contour is traced. `None` means there is nothing to draw.
pub(crate) fn project_shape_outline(
    scene_raster: &GrayImage,
    homography: &Homography,
    blur_sigma: Option<f32>,
) -> Option<Contour<i32>> {
    let projection = homography.to_projection()?;
    let mut warped = warp(scene_raster, &projection, Interpolation::Bilinear, Luma([0]));
    if let Some(sigma) = blur_sigma {
        warped = imageproc::filter::gaussian_blur_f32(&warped, sigma);
    }
    let mut contours = find_contours::<i32>(&warped);
    if contours.is_empty() {
        return None;
    }
    Some(contours.swap_remove(0))
}

/// Strokes a closed contour polygon onto the surface.
///
/// Contour points are dense (successive points are adjacent pixels), so a
/// thickness above one is rendered by stamping a disc at every point;
/// hairlines use antialiased segments between successive points, wrapping
/// around to close the outline.
pub(crate) fn stroke_closed_contour(
    surface: &mut RgbaImage,
    points: &[PixelPoint<i32>],
    color: Rgba<u8>,
    thickness: u32,
) {
    if points.is_empty() {
        return;
    }
    if thickness <= 1 {
        for (from, to) in points.iter().circular_tuple_windows() {
            draw_antialiased_line_segment_mut(
                surface,
                (from.x, from.y),
                (to.x, to.y),
                color,
                interpolate,
            );
        }
    } else {
        let radius = (thickness / 2).max(1) as i32;
        for point in points {
            draw_filled_circle_mut(surface, (point.x, point.y), radius, color);
        }
    }
}

/// Strokes a single straight segment with the given thickness.
pub(crate) fn stroke_segment(
    surface: &mut RgbaImage,
    start: (f32, f32),
    end: (f32, f32),
    color: Rgba<u8>,
    thickness: u32,
) {
    if thickness <= 1 {
        draw_antialiased_line_segment_mut(
            surface,
            (start.0.round() as i32, start.1.round() as i32),
            (end.0.round() as i32, end.1.round() as i32),
            color,
            interpolate,
        );
        return;
    }

    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let length = (dx * dx + dy * dy).sqrt();
    let half = thickness as f32 / 2.0;
    if length < 1.0 {
        draw_filled_circle_mut(
            surface,
            (start.0.round() as i32, start.1.round() as i32),
            half.round().max(1.0) as i32,
            color,
        );
        return;
    }

    // Perpendicular unit vector scaled to half the stroke width.
    let nx = -dy / length * half;
    let ny = dx / length * half;
    let corners = [
        PixelPoint::new((start.0 + nx).round() as i32, (start.1 + ny).round() as i32),
        PixelPoint::new((end.0 + nx).round() as i32, (end.1 + ny).round() as i32),
        PixelPoint::new((end.0 - nx).round() as i32, (end.1 - ny).round() as i32),
        PixelPoint::new((start.0 - nx).round() as i32, (start.1 - ny).round() as i32),
    ];
    draw_quad(surface, &corners, color);
}

/// Fills a quadrilateral, tolerating degenerate (collapsed) corners.
pub(crate) fn draw_quad<I>(surface: &mut I, corners: &[PixelPoint<i32>; 4], color: I::Pixel)
where
    I: ::image::GenericImage,
    I::Pixel: 'static,
    <I::Pixel as ::image::Pixel>::Subpixel: imageproc::definitions::Clamp<f32> + Into<f32>,
{
    let mut polygon: Vec<PixelPoint<i32>> = Vec::with_capacity(4);
    for corner in corners {
        if polygon.last() != Some(corner) {
            polygon.push(*corner);
        }
    }
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    match polygon.len() {
        0 => {}
        1 => draw_filled_circle_mut(surface, (polygon[0].x, polygon[0].y), 1, color),
        2 => draw_antialiased_line_segment_mut(
            surface,
            (polygon[0].x, polygon[0].y),
            (polygon[1].x, polygon[1].y),
            color,
            interpolate,
        ),
        _ => draw_polygon_mut(surface, &polygon, color),
    }
}
