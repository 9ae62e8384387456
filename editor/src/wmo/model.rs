use binrw::{binread, io::Cursor, BinReaderExt};
use enumflags2::{bitflags, BitFlags};
use log::{trace, warn};
use mpq::{ArchiveManager, MpqFile};
use shared::models::geometry::{BoundingBox, Vector3};

use crate::{
    chunk::FileChunk,
    render::{
        frustum::Frustum, RenderContext, WmoGroupDraw, WmoGroupSelect, COLOR_GREEN, COLOR_YELLOW,
    },
    EditorError, EditorResult,
};

const WMO_VERSION: u32 = 17;
const MOGI_ENTRY_SIZE: usize = 32;

#[allow(dead_code)]
#[bitflags]
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WmoGroupFlag {
    HasBsp = 0x1,
    HasVertexColors = 0x4,
    Exterior = 0x8,
    ExteriorLit = 0x40,
    Unreachable = 0x80,
    HasLights = 0x200,
    HasDoodads = 0x800,
    HasWater = 0x1000,
    Interior = 0x2000,
    AlwaysDraw = 0x10000,
    ShowSkybox = 0x40000,
}

/// Group data known from the root file. Boxes are in the asset's local editor space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WmoGroupInfo {
    pub flags: BitFlags<WmoGroupFlag>,
    pub bounding_box: BoundingBox,
}

impl WmoGroupInfo {
    /// Whether the group, placed at `position` and turned by `yaw` degrees about Y, is close
    /// enough to the camera and inside the frustum.
    fn is_visible(
        &self,
        position: &Vector3,
        yaw: f32,
        cull_distance: f32,
        frustum: &Frustum,
        camera: &Vector3,
    ) -> bool {
        let local = self.bounding_box.center();
        let (sin, cos) = yaw.to_radians().sin_cos();
        let center = *position
            + Vector3::new(
                local.x * cos + local.z * sin,
                local.y,
                local.z * cos - local.x * sin,
            );
        let radius = self.bounding_box.half_diagonal();

        let in_range = self.flags.contains(WmoGroupFlag::AlwaysDraw)
            || center.distance(camera) - radius < cull_distance;

        in_range && frustum.intersects_sphere(&center, radius)
    }
}

pub struct WmoDrawArgs<'a> {
    pub doodad_set: u16,
    pub position: Vector3,
    pub yaw: f32,
    pub cull_distance: f32,
    pub draw_bounding_box: bool,
    pub draw_group_boxes: bool,
    pub highlight: bool,
    pub draw_doodads: bool,
    pub draw_fog: bool,
    pub draw_skies: bool,
    pub fog_distance: f32,
    pub frustum: &'a Frustum,
    pub camera: Vector3,
}

pub struct WmoSelectArgs<'a> {
    pub doodad_set: u16,
    pub position: Vector3,
    pub yaw: f32,
    pub cull_distance: f32,
    pub draw_doodads: bool,
    pub frustum: &'a Frustum,
    pub camera: Vector3,
}

/// A parsed world model object, shared by every instance placing it.
pub trait WmoModel {
    fn path(&self) -> &str;
    fn extents(&self) -> BoundingBox;
    fn groups(&self) -> &[WmoGroupInfo];
    /// Submits the geometry with the caller's transform already applied.
    fn draw(&self, ctx: &mut dyn RenderContext, args: &WmoDrawArgs);
    fn draw_select(&self, ctx: &mut dyn RenderContext, args: &WmoSelectArgs);
}

#[binread]
#[derive(Debug)]
struct MOHD {
    _n_textures: u32,
    n_groups: u32,
    _n_portals: u32,
    _n_lights: u32,
    _n_models: u32,
    _n_doodads: u32,
    _n_sets: u32,
    _ambient_color: u32,
    _wmo_id: u32,
    bbox_min: [f32; 3],
    bbox_max: [f32; 3],
    _flags: u16,
    _num_lod: u16,
}

#[binread]
#[derive(Debug)]
struct MOGIEntry {
    flags: u32,
    bbox_min: [f32; 3],
    bbox_max: [f32; 3],
    _name_offset: i32,
}

/// A WMO known from its root file.
#[derive(Debug)]
pub struct Wmo {
    path: String,
    extents: BoundingBox,
    groups: Vec<WmoGroupInfo>,
}

impl Wmo {
    pub fn load(
        path: &str,
        archives: &mut ArchiveManager,
        disk_search_path: &str,
    ) -> EditorResult<Wmo> {
        let file = MpqFile::open(path, archives, disk_search_path)?;
        Self::parse(path, file.buffer())
    }

    pub fn parse(path: &str, raw: &[u8]) -> EditorResult<Wmo> {
        let chunks = FileChunk::read_all(raw)?;

        let mut header: Option<MOHD> = None;
        let mut groups: Vec<WmoGroupInfo> = Vec::new();

        for chunk in &chunks {
            if chunk.is(b"MVER") {
                let version: u32 = Cursor::new(chunk.data()).read_le()?;
                if version != WMO_VERSION {
                    return Err(EditorError::InvalidAsset(format!(
                        "{}: unsupported WMO version {}",
                        path, version
                    )));
                }
            } else if chunk.is(b"MOHD") {
                header = Some(Cursor::new(chunk.data()).read_le()?);
            } else if chunk.is(b"MOGI") {
                let mut reader = Cursor::new(chunk.data());
                for _ in 0..(chunk.data().len() / MOGI_ENTRY_SIZE) {
                    let entry: MOGIEntry = reader.read_le()?;
                    groups.push(WmoGroupInfo {
                        flags: BitFlags::from_bits_truncate(entry.flags),
                        bounding_box: BoundingBox::from_file_space(
                            entry.bbox_min,
                            entry.bbox_max,
                        ),
                    });
                }
            } else {
                trace!("{}: skipping chunk {}", path, chunk.magic_str());
            }
        }

        let header = header.ok_or_else(|| {
            EditorError::InvalidAsset(format!("{}: missing MOHD chunk", path))
        })?;

        if header.n_groups as usize != groups.len() {
            warn!(
                "{}: header announces {} groups, found {}",
                path,
                header.n_groups,
                groups.len()
            );
        }

        Ok(Wmo {
            path: path.to_owned(),
            extents: BoundingBox::from_file_space(header.bbox_min, header.bbox_max),
            groups,
        })
    }
}

impl WmoModel for Wmo {
    fn path(&self) -> &str {
        &self.path
    }

    fn extents(&self) -> BoundingBox {
        self.extents
    }

    fn groups(&self) -> &[WmoGroupInfo] {
        &self.groups
    }

    fn draw(&self, ctx: &mut dyn RenderContext, args: &WmoDrawArgs) {
        for (index, group) in self.groups.iter().enumerate() {
            if !group.is_visible(
                &args.position,
                args.yaw,
                args.cull_distance,
                args.frustum,
                &args.camera,
            ) {
                continue;
            }

            ctx.draw_wmo_group(&WmoGroupDraw {
                group: index,
                doodad_set: args.doodad_set,
                highlight: args.highlight,
                draw_doodads: args.draw_doodads,
                draw_fog: args.draw_fog,
                fog_distance: args.fog_distance,
                draw_skybox: args.draw_skies && group.flags.contains(WmoGroupFlag::ShowSkybox),
            });

            if args.draw_group_boxes {
                ctx.draw_box(&group.bounding_box, COLOR_YELLOW);
            }
        }

        if args.draw_bounding_box {
            ctx.draw_box(&self.extents, COLOR_GREEN);
        }
    }

    fn draw_select(&self, ctx: &mut dyn RenderContext, args: &WmoSelectArgs) {
        for (index, group) in self.groups.iter().enumerate() {
            if group.is_visible(
                &args.position,
                args.yaw,
                args.cull_distance,
                args.frustum,
                &args.camera,
            ) {
                ctx.draw_wmo_group_select(&WmoGroupSelect {
                    group: index,
                    doodad_set: args.doodad_set,
                    draw_doodads: args.draw_doodads,
                });
            }
        }
    }
}
