pub mod render;

pub use render::LiquidRender;
