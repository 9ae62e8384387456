use std::ops::{Deref, DerefMut};

use shared::models::geometry::{BoundingBox, Vector3};

use crate::{selection::SelectionId, texture_manager::Texture};

pub mod frustum;
pub mod recorder;

pub type Color = [f32; 4];

pub const COLOR_WHITE: Color = [1.0, 1.0, 1.0, 1.0];
pub const COLOR_RED: Color = [1.0, 0.0, 0.0, 1.0];
pub const COLOR_GREEN: Color = [0.0, 1.0, 0.0, 1.0];
pub const COLOR_YELLOW: Color = [1.0, 1.0, 0.0, 1.0];

/// Geometry submission for one WMO group in normal rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct WmoGroupDraw {
    pub group: usize,
    pub doodad_set: u16,
    pub highlight: bool,
    pub draw_doodads: bool,
    pub draw_fog: bool,
    pub fog_distance: f32,
    pub draw_skybox: bool,
}

/// Geometry submission for one WMO group in pick rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct WmoGroupSelect {
    pub group: usize,
    pub doodad_set: u16,
    pub draw_doodads: bool,
}

/// A GLSL program handed to the backend, which compiles and caches it by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderProgram {
    pub name: &'static str,
    pub vertex_source: &'static str,
    pub fragment_source: &'static str,
}

/// The immediate-mode 3D backend: a transform stack, a pick-name stack and geometry submission.
/// Matching pops are best issued through the scope guards below.
pub trait RenderContext {
    fn push_matrix(&mut self);
    fn pop_matrix(&mut self);
    fn translate(&mut self, offset: Vector3);
    fn rotate(&mut self, angle_degrees: f32, axis: Vector3);

    fn push_name(&mut self, id: SelectionId);
    fn pop_name(&mut self);

    fn draw_wmo_group(&mut self, group: &WmoGroupDraw);
    fn draw_wmo_group_select(&mut self, group: &WmoGroupSelect);
    fn draw_box(&mut self, bounding_box: &BoundingBox, color: Color);

    fn use_program(&mut self, program: &ShaderProgram);
    fn release_program(&mut self);
    fn set_uniform_i32(&mut self, name: &str, value: i32);
    fn bind_texture(&mut self, unit: u32, texture: &Texture);
}

/// The 2D backend used by widgets, in screen coordinates.
pub trait UiRenderContext {
    /// `strip` is in triangle-strip order, `uvs` matches it.
    fn draw_textured_quad(
        &mut self,
        texture: &Texture,
        strip: [[f32; 2]; 4],
        uvs: [[f32; 2]; 4],
        color: [f32; 3],
    );
    fn draw_line_loop(&mut self, points: &[[f32; 2]], color: [f32; 3]);
}

/// Pushes a matrix on creation and pops it when dropped.
pub struct MatrixScope<'a, C: RenderContext + ?Sized> {
    ctx: &'a mut C,
}

impl<'a, C: RenderContext + ?Sized> MatrixScope<'a, C> {
    pub fn new(ctx: &'a mut C) -> Self {
        ctx.push_matrix();
        Self { ctx }
    }
}

impl<'a, C: RenderContext + ?Sized> Drop for MatrixScope<'a, C> {
    fn drop(&mut self) {
        self.ctx.pop_matrix();
    }
}

impl<'a, C: RenderContext + ?Sized> Deref for MatrixScope<'a, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.ctx
    }
}

impl<'a, C: RenderContext + ?Sized> DerefMut for MatrixScope<'a, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.ctx
    }
}

/// Pushes a pick name on creation and pops it when dropped.
pub struct NameScope<'a, C: RenderContext + ?Sized> {
    ctx: &'a mut C,
}

impl<'a, C: RenderContext + ?Sized> NameScope<'a, C> {
    pub fn new(ctx: &'a mut C, id: SelectionId) -> Self {
        ctx.push_name(id);
        Self { ctx }
    }
}

impl<'a, C: RenderContext + ?Sized> Drop for NameScope<'a, C> {
    fn drop(&mut self) {
        self.ctx.pop_name();
    }
}

impl<'a, C: RenderContext + ?Sized> Deref for NameScope<'a, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.ctx
    }
}

impl<'a, C: RenderContext + ?Sized> DerefMut for NameScope<'a, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.ctx
    }
}

/// Binds a shader program for its lifetime.
pub struct ProgramScope<'a, C: RenderContext + ?Sized> {
    ctx: &'a mut C,
}

impl<'a, C: RenderContext + ?Sized> ProgramScope<'a, C> {
    pub fn new(ctx: &'a mut C, program: &ShaderProgram) -> Self {
        ctx.use_program(program);
        Self { ctx }
    }

    pub fn uniform_i32(&mut self, name: &str, value: i32) {
        self.ctx.set_uniform_i32(name, value);
    }

    pub fn bind_texture(&mut self, unit: u32, texture: &Texture) {
        self.ctx.bind_texture(unit, texture);
    }
}

impl<'a, C: RenderContext + ?Sized> Drop for ProgramScope<'a, C> {
    fn drop(&mut self) {
        self.ctx.release_program();
    }
}

impl<'a, C: RenderContext + ?Sized> Deref for ProgramScope<'a, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.ctx
    }
}

impl<'a, C: RenderContext + ?Sized> DerefMut for ProgramScope<'a, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.ctx
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    use super::{recorder::CommandRecorder, *};

    fn early_return(ctx: &mut dyn RenderContext, bail: bool) -> Option<()> {
        let mut ctx = MatrixScope::new(ctx);
        ctx.translate(Vector3::X);
        if bail {
            return None;
        }
        ctx.rotate(90.0, Vector3::Y);
        Some(())
    }

    #[test]
    fn test_matrix_scope_pops_on_early_return() {
        let mut recorder = CommandRecorder::new();

        assert!(early_return(&mut recorder, true).is_none());
        assert!(early_return(&mut recorder, false).is_some());

        assert_eq!(recorder.matrix_depth(), 0);
        assert_eq!(recorder.matrix_push_count(), 2);
        assert_eq!(recorder.matrix_pop_count(), 2);
    }

    #[test]
    fn test_scopes_pop_on_panic() {
        let mut recorder = CommandRecorder::new();

        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut ctx = MatrixScope::new(&mut recorder);
            let _name = NameScope::new(&mut *ctx, SelectionId::from_raw(3).unwrap());
            panic!("geometry submission failed");
        }));

        assert!(result.is_err());
        assert_eq!(recorder.matrix_depth(), 0);
        assert!(recorder.name_stack().is_empty());
    }

    #[test]
    fn test_program_scope() {
        let mut recorder = CommandRecorder::new();
        let program = ShaderProgram {
            name: "test",
            vertex_source: "",
            fragment_source: "",
        };

        {
            let mut scope = ProgramScope::new(&mut recorder, &program);
            scope.uniform_i32("type", 2);
        }

        assert_eq!(recorder.current_program(), None);
        assert_eq!(recorder.uniform_i32("type"), Some(2));
    }
}
