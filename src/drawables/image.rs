use crate::calibration::homography::SharedHomography;
use crate::calibration::point::Point;
use crate::drawables::{draw_quad, Drawable, Style};
use crate::image_utils::blending::add_weighted;
use crate::rendering::context::Context;
use ::image::imageops::{replace, FilterType};
use ::image::{DynamicImage, GenericImageView, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{warp, Interpolation};
use imageproc::point::Point as PixelPoint;

/// Blur applied to a warped alpha mask before it is binarized again; the
/// threshold removes the soft edge the warp resampling introduces.
const MASK_BLUR_SIGMA: f32 = 4.1;
const MASK_THRESHOLD: u8 = 128;

/// Quarter-turn rotation applied to the source raster before placement.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

/// A raster image inserted between two scene-plane corners and reprojected
/// into the photograph as a perspective quadrilateral.
///
/// `from` names the top-left and `to` the bottom-right corner of the
/// placement rectangle before any rotation. On top of the explicit
/// [`Rotation`], an automatic orientation correction derived from the
/// relative position of the two corners keeps the content upright when the
/// corners are given in another order. Sources carrying an alpha channel
/// keep their transparent regions; opaque sources fill the whole placement
/// quadrilateral. The drawable's opacity blends the final composite over
/// the surface.
pub struct Image {
    homography: SharedHomography,
    style: Style,
    from: Point,
    to: Point,
    image: DynamicImage,
    rotation: Rotation,
}

impl Image {
    /// New inserted image between two scene-plane corners.
    pub fn new(
        homography: SharedHomography,
        from: Point,
        to: Point,
        image: DynamicImage,
        rotation: Rotation,
    ) -> Image {
        Image {
            homography,
            style: Style::new(),
            from,
            to,
            image,
            rotation,
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

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Replaces the source raster. Empty images are ignored.
    pub fn set_image(&mut self, image: DynamicImage) {
        if image.width() == 0 || image.height() == 0 {
            log::debug!("empty source raster ignored");
            return;
        }
        self.image = image;
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }
}

impl Drawable for Image {
    fn draw(&self, context: &mut Context) {
        if self.image.width() == 0 || self.image.height() == 0 {
            log::debug!("image drawable has an empty source, skipped");
            return;
        }

        let width = (self.to.x - self.from.x).abs().ceil() as u32;
        let height = (self.to.y - self.from.y).abs().ceil() as u32;
        if width == 0 || height == 0 {
            log::debug!(
                "image placement {} -> {} has no extent, skipped",
                self.from,
                self.to
            );
            return;
        }

        let homography = self.homography.borrow();
        let Some(projection) = homography.to_projection() else {
            return;
        };
        log::trace!(
            "image corners {} -> {} project to {} -> {}",
            self.from,
            self.to,
            homography.project(self.from),
            homography.project(self.to)
        );

        // Explicit rotation, scale to the placement extents, then the
        // orientation correction implied by the corner order.
        let rotated = match self.rotation {
            Rotation::Deg0 => self.image.clone(),
            Rotation::Deg90 => self.image.rotate90(),
            Rotation::Deg180 => self.image.rotate180(),
            Rotation::Deg270 => self.image.rotate270(),
        };
        let rotated = rotated.resize_exact(width, height, FilterType::Triangle);
        let rotated = if self.to.x > self.from.x {
            if self.from.y > self.to.y {
                rotated.rotate270()
            } else {
                rotated
            }
        } else if self.from.y > self.to.y {
            rotated.rotate180()
        } else {
            rotated.rotate90()
        };
        let rgba = rotated.to_rgba8();

        let position_x = self.from.x.min(self.to.x) as i64;
        let position_y = self.from.y.min(self.to.y) as i64;

        let mask = if self.image.color().has_alpha() {
            // The source's own transparency decides what is kept; the warp
            // softens the mask edge, so blur and re-binarize.
            let mut alpha_channel = GrayImage::new(rgba.width(), rgba.height());
            for (mask_pixel, source_pixel) in alpha_channel.pixels_mut().zip(rgba.pixels()) {
                mask_pixel.0[0] = source_pixel.0[3];
            }
            let mut mask = GrayImage::new(context.width(), context.height());
            replace(&mut mask, &alpha_channel, position_x, position_y);
            let mask = warp(&mask, &projection, Interpolation::Bilinear, Luma([0]));
            let mask = gaussian_blur_f32(&mask, MASK_BLUR_SIGMA);
            threshold(&mask, MASK_THRESHOLD, ThresholdType::Binary)
        } else {
            // Opaque sources cover the whole placement rectangle: fill its
            // projected quadrilateral.
            let corners = [
                Point::new(self.from.x, self.from.y),
                Point::new(self.to.x, self.from.y),
                Point::new(self.to.x, self.to.y),
                Point::new(self.from.x, self.to.y),
            ];
            let quad = corners.map(|corner| {
                let projected = homography.project(corner);
                PixelPoint::new(projected.x.ceil() as i32, projected.y.ceil() as i32)
            });
            let mut mask = GrayImage::new(context.width(), context.height());
            draw_quad(&mut mask, &quad, Luma([255]));
            mask
        };

        let mut placement = RgbaImage::new(context.width(), context.height());
        replace(&mut placement, &rgba, position_x, position_y);
        let warped = warp(&placement, &projection, Interpolation::Bilinear, Rgba([0, 0, 0, 0]));

        let mut composite = context.image().clone();
        for (x, y, mask_pixel) in mask.enumerate_pixels() {
            if mask_pixel.0[0] > 0 {
                composite.put_pixel(x, y, *warped.get_pixel(x, y));
            }
        }

        let blended = add_weighted(&composite, self.style.alpha, context.image());
        *context.image_mut() = blended;
    }

    fn style(&self) -> &Style {
        &self.style
    }

    fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }
}
