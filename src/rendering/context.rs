use crate::drawables::Drawable;
use image::{Rgba, RgbaImage};

/// Fully transparent white. White color channels keep background-free
/// exports from haloing dark at feathered edges.
const CLEAR_PIXEL: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// A transient transparent drawing surface sized to the photograph.
///
/// Every drawable paints onto a context; the renderer then merges the
/// context over the background image. A context is recreated whenever the
/// photograph size changes and cleared before each render pass.
pub struct Context {
    image: RgbaImage,
}

impl Context {
    /// New fully transparent surface of the given size.
    pub fn new(width: u32, height: u32) -> Context {
        Context {
            image: RgbaImage::from_pixel(width, height, CLEAR_PIXEL),
        }
    }

    /// Erases all content, back to full transparency.
    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = CLEAR_PIXEL;
        }
    }

    /// Draws a drawable onto this surface.
    pub fn draw(&mut self, drawable: &dyn Drawable) {
        drawable.draw(self);
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
