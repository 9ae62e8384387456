use crate::render::UiRenderContext;

pub mod texture;

/// A rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, mx: f32, my: f32) -> bool {
        mx >= self.x && mx <= self.x + self.width && my >= self.y && my <= self.y + self.height
    }
}

pub trait Widget {
    fn frame(&self) -> &Frame;

    fn render(&self, ctx: &mut dyn UiRenderContext);

    /// Returns whether the click was handled by this widget.
    fn process_left_click(&mut self, mx: f32, my: f32) -> bool;
}
