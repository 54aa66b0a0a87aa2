use crate::drawables::Drawable;
use crate::image_utils::blending::{blend_images, rgb_to_rgba};
use crate::rendering::context::Context;
use image::{RgbImage, RgbaImage};

/// Non-owning handle to a drawable stored in a [`Renderer`].
///
/// Handles stay valid across removals of other drawables and are never
/// reused within one renderer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DrawableHandle(u64);

/// Stores drawables and renders them over a background photograph.
///
/// After construction, [`Renderer::set_background_image`] must be called to
/// provide the photograph; this sizes the drawing context. Drawables are
/// added with [`Renderer::add_drawable`] and painted in insertion order,
/// later entries over earlier ones. Each [`Renderer::render`] call clears
/// the context, draws every drawable onto it and alpha-blends the result
/// over a fresh copy of the background. The composited image (or the bare
/// annotation layer) is obtained from [`Renderer::get_output_image`].
#[derive(Default)]
pub struct Renderer {
    context: Option<Context>,
    background_image: Option<RgbaImage>,
    output_image: Option<RgbaImage>,
    drawables: Vec<(DrawableHandle, Box<dyn Drawable>)>,
    next_handle: u64,
}

impl Renderer {
    pub fn new() -> Renderer {
        Renderer::default()
    }

    /// Sets the photograph all drawables are rendered over. An opaque alpha
    /// channel is added, and the drawing context is recreated at the new
    /// size. Empty images are ignored.
    pub fn set_background_image(&mut self, image: &RgbImage) {
        if image.width() == 0 || image.height() == 0 {
            log::debug!("empty background image ignored");
            return;
        }
        self.background_image = Some(rgb_to_rgba(image));
        self.output_image = None;
        self.context = Some(Context::new(image.width(), image.height()));
    }

    /// Renders all drawables: clears the context, draws each drawable in
    /// list order and blends the context over a fresh copy of the
    /// background. Without a context (no background was ever set) this is a
    /// no-op.
    pub fn render(&mut self) {
        let Some(context) = self.context.as_mut() else {
            return;
        };

        if self.background_image.is_none() {
            // Nothing to composite over yet: capture the current surface
            // as the background.
            self.background_image = Some(context.image().clone());
        } else {
            self.output_image = self.background_image.clone();
        }

        context.clear();
        for (_, drawable) in &self.drawables {
            context.draw(drawable.as_ref());
        }

        if let Some(output) = self.output_image.as_mut() {
            blend_images(output, context.image());
        }
    }

    /// Appends a drawable and returns a handle to it. The renderer owns
    /// the drawable until it is removed.
    pub fn add_drawable(&mut self, drawable: Box<dyn Drawable>) -> DrawableHandle {
        let handle = DrawableHandle(self.next_handle);
        self.next_handle += 1;
        self.drawables.push((handle, drawable));
        handle
    }

    /// Removes the drawable behind `handle`. Unknown handles are a no-op.
    pub fn remove_drawable(&mut self, handle: DrawableHandle) {
        self.drawables.retain(|(stored, _)| *stored != handle);
    }

    /// Removes every drawable.
    pub fn clear_drawables(&mut self) {
        self.drawables.clear();
    }

    pub fn drawable_count(&self) -> usize {
        self.drawables.len()
    }

    /// Mutable access to a stored drawable, for editing its style or
    /// geometry between renders.
    pub fn drawable_mut(&mut self, handle: DrawableHandle) -> Option<&mut (dyn Drawable + 'static)> {
        self.drawables
            .iter_mut()
            .find(|(stored, _)| *stored == handle)
            .map(|(_, drawable)| drawable.as_mut())
    }

    pub fn background_image(&self) -> Option<&RgbaImage> {
        self.background_image.as_ref()
    }

    /// The rendered result. With `include_background` the composited output
    /// of the last [`Renderer::render`] call is returned; without it, the
    /// bare annotation layer on transparency. `None` until the renderer has
    /// something to return.
    pub fn get_output_image(&self, include_background: bool) -> Option<RgbaImage> {
        if include_background {
            self.output_image.clone()
        } else {
            self.context.as_ref().map(|context| context.image().clone())
        }
    }
}
