use std::{fmt, sync::Arc};

use log::warn;

use crate::{
    render::UiRenderContext,
    texture_manager::{Texture, TextureHandle, TextureManager},
};

use super::{Frame, Widget};

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
const HIGHLIGHT: [f32; 3] = [1.0, 0.0, 0.0];

pub type ClickFunc = Box<dyn FnMut(&Frame, i32)>;

/// A textured rectangle, optionally clickable.
pub struct UiTexture {
    frame: Frame,
    texture: Arc<Texture>,
    highlight: bool,
    click_func: Option<ClickFunc>,
    id: i32,
}

impl UiTexture {
    pub fn new(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        path: &str,
        textures: &mut TextureManager,
    ) -> Self {
        Self {
            frame: Frame::new(x, y, width, height),
            texture: textures.new_texture(path),
            highlight: false,
            click_func: None,
            id: 0,
        }
    }

    pub fn set_texture(&mut self, texture: Arc<Texture>) {
        self.texture = texture;
    }

    /// Returns false, keeping the current texture, if no live texture has this handle.
    pub fn set_texture_handle(&mut self, handle: TextureHandle, textures: &TextureManager) -> bool {
        match textures.item(handle) {
            Some(texture) => {
                self.texture = texture;
                true
            }
            None => {
                warn!("No texture with handle {}", handle.raw());
                false
            }
        }
    }

    pub fn set_texture_path(&mut self, path: &str, textures: &mut TextureManager) {
        self.texture = textures.new_texture(path);
    }

    pub fn texture(&self) -> &Arc<Texture> {
        &self.texture
    }

    pub fn set_highlight(&mut self, highlight: bool) {
        self.highlight = highlight;
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlight
    }

    /// `id` is handed back to `f` on every click.
    pub fn set_click_func<F: FnMut(&Frame, i32) + 'static>(&mut self, f: F, id: i32) {
        self.click_func = Some(Box::new(f));
        self.id = id;
    }
}

impl Widget for UiTexture {
    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn render(&self, ctx: &mut dyn UiRenderContext) {
        let Frame {
            x,
            y,
            width,
            height,
        } = self.frame;

        ctx.draw_textured_quad(
            &self.texture,
            [[x, y], [x + width, y], [x, y + height], [x + width, y + height]],
            [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
            WHITE,
        );

        if self.highlight {
            ctx.draw_line_loop(
                &[
                    [x - 1.0, y],
                    [x + width, y],
                    [x + width, y + height],
                    [x - 1.0, y + height],
                ],
                HIGHLIGHT,
            );
        }
    }

    /// The click position is not checked: the parent dispatches clicks to the widget under the
    /// mouse.
    fn process_left_click(&mut self, _mx: f32, _my: f32) -> bool {
        match self.click_func.as_mut() {
            Some(f) => {
                f(&self.frame, self.id);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for UiTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiTexture")
            .field("frame", &self.frame)
            .field("texture", &self.texture.path())
            .field("highlight", &self.highlight)
            .field("clickable", &self.click_func.is_some())
            .field("id", &self.id)
            .finish()
    }
}
