//! Resize handling for the mounted viewport.

use crate::{context::Context, data_structures::texture::Texture};

/// Current drawable dimensions in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Apply new viewport dimensions to the surface, projection and depth
/// buffer. Zero-sized updates (minimised window, collapsed container) are
/// ignored so the surface keeps its last valid configuration. Returns
/// whether the resize was applied.
pub fn apply_resize(ctx: &mut Context, size: ViewportSize) -> bool {
    if size.width == 0 || size.height == 0 {
        log::debug!("ignoring zero-sized viewport update");
        return false;
    }

    ctx.config.width = size.width;
    ctx.config.height = size.height;
    ctx.surface.configure(&ctx.device, &ctx.config);
    ctx.projection.resize(size.width, size.height);
    // The depth attachment must match the surface extent exactly.
    ctx.depth_texture = Texture::create_depth_texture(
        &ctx.device,
        [ctx.config.width, ctx.config.height],
        "depth_texture",
    );
    true
}
