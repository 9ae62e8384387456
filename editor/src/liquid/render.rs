use std::{collections::HashMap, sync::Arc};

use log::{debug, warn};

use crate::{
    datastore::liquid_type::LiquidTypes,
    render::{ProgramScope, RenderContext, ShaderProgram},
    texture_manager::{Texture, TextureManager},
};

pub const LIQUID_PROGRAM: ShaderProgram = ShaderProgram {
    name: "liquid",
    vertex_source: include_str!("../../shaders/liquid.vert"),
    fragment_source: include_str!("../../shaders/liquid.frag"),
};

const ANIMATION_FRAMES: u32 = 30;
const FALLBACK_TEXTURE_PATTERN: &str = "XTextures\\river\\lake_a.%d.blp";
const FALLBACK_LIQUID_TYPE: u32 = 0;

/// Sets up the liquid shader for a liquid: its type and its animated texture.
pub struct LiquidRender {
    program: ShaderProgram,
    liquid_types: LiquidTypes,
    current_liquid_id: Option<u32>,
    current_is_wmo: Option<bool>,
    liquid_id_types: HashMap<u32, u32>,
    textures_by_liquid_id: HashMap<u32, Vec<Arc<Texture>>>,
}

impl LiquidRender {
    pub fn new(liquid_types: LiquidTypes) -> Self {
        Self {
            program: LIQUID_PROGRAM,
            liquid_types,
            current_liquid_id: None,
            current_is_wmo: None,
            liquid_id_types: HashMap::new(),
            textures_by_liquid_id: HashMap::new(),
        }
    }

    pub fn shader_program(&self) -> &ShaderProgram {
        &self.program
    }

    /// To be called with the program returned by `shader_program` in use, before drawing a
    /// liquid surface.
    pub fn prepare_draw<C: RenderContext + ?Sized>(
        &mut self,
        water_shader: &mut ProgramScope<'_, C>,
        liquid_id: u32,
        anim_time: u32,
        is_wmo: bool,
        textures: &mut TextureManager,
    ) {
        if !self.textures_by_liquid_id.contains_key(&liquid_id) {
            self.add_liquid_id(liquid_id, textures);
        }

        if self.current_liquid_id != Some(liquid_id) {
            let liquid_type = self
                .liquid_id_types
                .get(&liquid_id)
                .copied()
                .unwrap_or(FALLBACK_LIQUID_TYPE);
            water_shader.uniform_i32("type", liquid_type as i32);
            self.current_liquid_id = Some(liquid_id);
        }

        if self.current_is_wmo != Some(is_wmo) {
            water_shader.uniform_i32("wmo", is_wmo as i32);
            self.current_is_wmo = Some(is_wmo);
        }

        if let Some(frames) = self.textures_by_liquid_id.get(&liquid_id) {
            if !frames.is_empty() {
                water_shader.bind_texture(0, &frames[anim_time as usize % frames.len()]);
            }
        }
    }

    fn add_liquid_id(&mut self, liquid_id: u32, textures: &mut TextureManager) {
        let (pattern, liquid_type) = match self.liquid_types.get(liquid_id) {
            Some(record) if !record.texture_pattern.is_empty() => {
                (record.texture_pattern.as_str(), record.liquid_type)
            }
            _ => {
                warn!(
                    "Unknown liquid {}, falling back to {}",
                    liquid_id, FALLBACK_TEXTURE_PATTERN
                );
                (FALLBACK_TEXTURE_PATTERN, FALLBACK_LIQUID_TYPE)
            }
        };
        debug!("Loading textures of liquid {} ({})", liquid_id, pattern);

        let frames: Vec<Arc<Texture>> = (1..=ANIMATION_FRAMES)
            .map(|frame| textures.new_texture(&pattern.replace("%d", &frame.to_string())))
            .collect();

        self.liquid_id_types.insert(liquid_id, liquid_type);
        self.textures_by_liquid_id.insert(liquid_id, frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        datastore::{dbc::Dbc, liquid_type::tests::liquid_type_dbc},
        render::recorder::{CommandRecorder, RenderCommand},
    };

    fn liquid_render() -> LiquidRender {
        let dbc = Dbc::parse(&liquid_type_dbc()).unwrap();
        LiquidRender::new(LiquidTypes::from_dbc(&dbc).unwrap())
    }

    fn type_uniform_count(recorder: &CommandRecorder) -> usize {
        recorder.count(|command| {
            matches!(command, RenderCommand::SetUniformI32 { name, .. } if name == "type")
        })
    }

    #[test]
    fn test_known_liquid() {
        let mut render = liquid_render();
        let mut textures = TextureManager::new();
        let mut recorder = CommandRecorder::new();

        {
            let program = *render.shader_program();
            let mut shader = ProgramScope::new(&mut recorder, &program);
            render.prepare_draw(&mut shader, 4, 0, false, &mut textures);
            render.prepare_draw(&mut shader, 4, 31, false, &mut textures);
        }

        assert_eq!(recorder.uniform_i32("type"), Some(3));
        assert_eq!(recorder.uniform_i32("wmo"), Some(0));
        assert_eq!(type_uniform_count(&recorder), 1);
        assert_eq!(textures.len(), 30);

        let bound = recorder.bound_texture(0).unwrap();
        assert_eq!(
            textures.item(bound).unwrap().path(),
            "XTextures\\slime\\slime.2.blp"
        );
    }

    #[test]
    fn test_unknown_liquid_falls_back_to_lake() {
        let mut render = liquid_render();
        let mut textures = TextureManager::new();
        let mut recorder = CommandRecorder::new();

        {
            let program = *render.shader_program();
            let mut shader = ProgramScope::new(&mut recorder, &program);
            render.prepare_draw(&mut shader, 99, 29, true, &mut textures);
        }

        assert_eq!(recorder.uniform_i32("type"), Some(0));
        assert_eq!(recorder.uniform_i32("wmo"), Some(1));
        let bound = recorder.bound_texture(0).unwrap();
        assert_eq!(
            textures.item(bound).unwrap().path(),
            "XTextures\\river\\lake_a.30.blp"
        );
    }

    #[test]
    fn test_switching_liquids_loads_each_once() {
        let mut render = liquid_render();
        let mut textures = TextureManager::new();
        let mut recorder = CommandRecorder::new();

        {
            let program = *render.shader_program();
            let mut shader = ProgramScope::new(&mut recorder, &program);
            for anim_time in 0..3 {
                render.prepare_draw(&mut shader, 4, anim_time, false, &mut textures);
                render.prepare_draw(&mut shader, 99, anim_time, false, &mut textures);
            }
        }

        assert_eq!(textures.len(), 60);
        assert_eq!(type_uniform_count(&recorder), 6);
        assert_eq!(
            recorder.count(|command| matches!(command, RenderCommand::BindTexture { .. })),
            6
        );
    }

    #[test]
    fn test_shader_sources() {
        let render = LiquidRender::new(LiquidTypes::empty());

        assert_eq!(render.shader_program().name, "liquid");
        assert!(render.shader_program().fragment_source.contains("uniform int type;"));
    }
}
