use std::collections::HashMap;

use log::error;
use shared::models::geometry::{BoundingBox, Vector3};

use crate::{
    selection::SelectionId,
    texture_manager::{Texture, TextureHandle},
};

use super::{
    Color, RenderContext, ShaderProgram, UiRenderContext, WmoGroupDraw, WmoGroupSelect,
};

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    PushMatrix,
    PopMatrix,
    Translate(Vector3),
    Rotate { angle: f32, axis: Vector3 },
    PushName(SelectionId),
    PopName,
    DrawWmoGroup(WmoGroupDraw),
    DrawWmoGroupSelect(WmoGroupSelect),
    DrawBox { bounding_box: BoundingBox, color: Color },
    UseProgram(&'static str),
    ReleaseProgram,
    SetUniformI32 { name: String, value: i32 },
    BindTexture { unit: u32, handle: TextureHandle },
    TexturedQuad {
        handle: TextureHandle,
        strip: [[f32; 2]; 4],
        uvs: [[f32; 2]; 4],
        color: [f32; 3],
    },
    LineLoop { points: Vec<[f32; 2]>, color: [f32; 3] },
}

/// A headless backend keeping every call it receives, used by tools and tests.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<RenderCommand>,
    matrix_depth: usize,
    name_stack: Vec<SelectionId>,
    current_program: Option<&'static str>,
    uniforms: HashMap<String, i32>,
    bound_textures: HashMap<u32, TextureHandle>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn matrix_depth(&self) -> usize {
        self.matrix_depth
    }

    pub fn matrix_push_count(&self) -> usize {
        self.count(|command| *command == RenderCommand::PushMatrix)
    }

    pub fn matrix_pop_count(&self) -> usize {
        self.count(|command| *command == RenderCommand::PopMatrix)
    }

    pub fn name_stack(&self) -> &[SelectionId] {
        &self.name_stack
    }

    pub fn current_program(&self) -> Option<&'static str> {
        self.current_program
    }

    /// Last value set for the uniform.
    pub fn uniform_i32(&self, name: &str) -> Option<i32> {
        self.uniforms.get(name).copied()
    }

    pub fn bound_texture(&self, unit: u32) -> Option<TextureHandle> {
        self.bound_textures.get(&unit).copied()
    }

    pub fn count<F: Fn(&RenderCommand) -> bool>(&self, predicate: F) -> usize {
        self.commands.iter().filter(|command| predicate(command)).count()
    }
}

impl RenderContext for CommandRecorder {
    fn push_matrix(&mut self) {
        self.matrix_depth += 1;
        self.commands.push(RenderCommand::PushMatrix);
    }

    fn pop_matrix(&mut self) {
        if self.matrix_depth == 0 {
            error!("Matrix stack underflow");
        } else {
            self.matrix_depth -= 1;
        }
        self.commands.push(RenderCommand::PopMatrix);
    }

    fn translate(&mut self, offset: Vector3) {
        self.commands.push(RenderCommand::Translate(offset));
    }

    fn rotate(&mut self, angle_degrees: f32, axis: Vector3) {
        self.commands.push(RenderCommand::Rotate {
            angle: angle_degrees,
            axis,
        });
    }

    fn push_name(&mut self, id: SelectionId) {
        self.name_stack.push(id);
        self.commands.push(RenderCommand::PushName(id));
    }

    fn pop_name(&mut self) {
        if self.name_stack.pop().is_none() {
            error!("Name stack underflow");
        }
        self.commands.push(RenderCommand::PopName);
    }

    fn draw_wmo_group(&mut self, group: &WmoGroupDraw) {
        self.commands.push(RenderCommand::DrawWmoGroup(group.clone()));
    }

    fn draw_wmo_group_select(&mut self, group: &WmoGroupSelect) {
        self.commands
            .push(RenderCommand::DrawWmoGroupSelect(group.clone()));
    }

    fn draw_box(&mut self, bounding_box: &BoundingBox, color: Color) {
        self.commands.push(RenderCommand::DrawBox {
            bounding_box: *bounding_box,
            color,
        });
    }

    fn use_program(&mut self, program: &ShaderProgram) {
        self.current_program = Some(program.name);
        self.commands.push(RenderCommand::UseProgram(program.name));
    }

    fn release_program(&mut self) {
        self.current_program = None;
        self.commands.push(RenderCommand::ReleaseProgram);
    }

    fn set_uniform_i32(&mut self, name: &str, value: i32) {
        if self.current_program.is_none() {
            error!("Setting uniform {} without a bound program", name);
        }
        self.uniforms.insert(name.to_owned(), value);
        self.commands.push(RenderCommand::SetUniformI32 {
            name: name.to_owned(),
            value,
        });
    }

    fn bind_texture(&mut self, unit: u32, texture: &Texture) {
        self.bound_textures.insert(unit, texture.handle());
        self.commands.push(RenderCommand::BindTexture {
            unit,
            handle: texture.handle(),
        });
    }
}

impl UiRenderContext for CommandRecorder {
    fn draw_textured_quad(
        &mut self,
        texture: &Texture,
        strip: [[f32; 2]; 4],
        uvs: [[f32; 2]; 4],
        color: [f32; 3],
    ) {
        self.commands.push(RenderCommand::TexturedQuad {
            handle: texture.handle(),
            strip,
            uvs,
            color,
        });
    }

    fn draw_line_loop(&mut self, points: &[[f32; 2]], color: [f32; 3]) {
        self.commands.push(RenderCommand::LineLoop {
            points: points.to_vec(),
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underflow_keeps_depth_at_zero() {
        let mut recorder = CommandRecorder::new();
        recorder.pop_matrix();
        recorder.pop_name();

        assert_eq!(recorder.matrix_depth(), 0);
        assert!(recorder.name_stack().is_empty());
        assert_eq!(recorder.commands().len(), 2);
    }

    #[test]
    fn test_tracks_stacks() {
        let mut recorder = CommandRecorder::new();
        let id = SelectionId::from_raw(7).unwrap();

        recorder.push_matrix();
        recorder.push_matrix();
        recorder.push_name(id);
        assert_eq!(recorder.matrix_depth(), 2);
        assert_eq!(recorder.name_stack(), &[id]);

        recorder.pop_name();
        recorder.pop_matrix();
        assert_eq!(recorder.matrix_depth(), 1);
        assert_eq!(recorder.matrix_push_count(), 2);
        assert_eq!(recorder.matrix_pop_count(), 1);
    }
}
