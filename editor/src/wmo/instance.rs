use std::sync::Arc;

use binrw::io::{Seek, Write};
use log::trace;
use mpq::MpqFile;
use shared::models::{
    geometry::{BoundingBox, Vector3},
    wmo_placement::{ModfEntry, WmoPlacementRecord, WMO_PLACEMENT_RECORD_SIZE},
};

use crate::{
    render::{frustum::Frustum, MatrixScope, NameScope, RenderContext},
    selection::{SelectionId, SelectionNames, SelectionOwner},
    EditorResult,
};

use super::model::{WmoDrawArgs, WmoModel, WmoSelectArgs};

/// Authored WMOs face +X, the world faces -Z.
const YAW_OFFSET: f32 = 90.0;

pub struct InstanceDrawArgs<'a> {
    pub draw_doodads: bool,
    pub draw_fog: bool,
    pub draw_skies: bool,
    pub cull_distance: f32,
    pub fog_distance: f32,
    pub frustum: &'a Frustum,
    pub camera: Vector3,
}

pub struct InstanceSelectArgs<'a> {
    pub draw_doodads: bool,
    pub cull_distance: f32,
    pub frustum: &'a Frustum,
    pub camera: Vector3,
}

/// Reads a placement record from the stream. A stream too short for a full record leaves the
/// trailing fields zeroed.
pub fn read_placement(file: &mut MpqFile) -> EditorResult<WmoPlacementRecord> {
    let mut raw = [0_u8; WMO_PLACEMENT_RECORD_SIZE];
    let read = file.read(&mut raw);
    if read < WMO_PLACEMENT_RECORD_SIZE {
        trace!(
            "Short WMO placement record ({} of {} bytes)",
            read,
            WMO_PLACEMENT_RECORD_SIZE
        );
    }

    Ok(WmoPlacementRecord::from_le_bytes(&raw)?)
}

/// One placement of a WMO in the world.
///
/// The extents are a cache: after moving or turning the instance, call
/// [`WmoInstance::recalc_extents`] to bring them up to date.
pub struct WmoInstance {
    wmo: Arc<dyn WmoModel>,
    position: Vector3,
    rotation: Vector3, // Degrees, x tilts around Z, y is the yaw, z rolls around X
    extents: BoundingBox,
    unique_id: u32,
    flags: u16,
    doodad_set: u16,
    name_set: u16,
    unknown: u16,
    selection_id: SelectionId,
    selection_names: Arc<SelectionNames>,
}

impl WmoInstance {
    pub fn new(
        wmo: Arc<dyn WmoModel>,
        placement: WmoPlacementRecord,
        selection_names: &Arc<SelectionNames>,
    ) -> Self {
        let selection_id = selection_names.add(SelectionOwner::Wmo {
            unique_id: placement.unique_id,
        });

        Self {
            wmo,
            position: placement.position,
            rotation: placement.rotation,
            extents: placement.extents,
            unique_id: placement.unique_id,
            flags: placement.flags,
            doodad_set: placement.doodad_set,
            name_set: placement.name_set,
            unknown: placement.unknown,
            selection_id,
            selection_names: selection_names.clone(),
        }
    }

    pub fn from_stream(
        wmo: Arc<dyn WmoModel>,
        file: &mut MpqFile,
        selection_names: &Arc<SelectionNames>,
    ) -> EditorResult<Self> {
        let placement = read_placement(file)?;
        Ok(Self::new(wmo, placement, selection_names))
    }

    pub fn from_modf(
        wmo: Arc<dyn WmoModel>,
        entry: &ModfEntry,
        selection_names: &Arc<SelectionNames>,
    ) -> Self {
        Self::new(wmo, WmoPlacementRecord::from(entry), selection_names)
    }

    /// An instance not placed yet: everything at zero.
    pub fn new_default(wmo: Arc<dyn WmoModel>, selection_names: &Arc<SelectionNames>) -> Self {
        Self::new(wmo, WmoPlacementRecord::default(), selection_names)
    }

    /// Applies the placement transform and returns the yaw handed to the asset.
    fn apply_transform(&self, ctx: &mut dyn RenderContext) -> f32 {
        let yaw = self.rotation.y - YAW_OFFSET;

        ctx.translate(self.position);
        ctx.rotate(yaw, Vector3::Y);
        ctx.rotate(-self.rotation.x, Vector3::Z);
        ctx.rotate(self.rotation.z, Vector3::X);

        yaw
    }

    pub fn draw(
        &self,
        ctx: &mut dyn RenderContext,
        args: &InstanceDrawArgs,
        selected: Option<SelectionId>,
    ) {
        let mut ctx = MatrixScope::new(ctx);
        let yaw = self.apply_transform(&mut *ctx);

        let is_selected = self.selection_names.is_same(self.selection_id, selected);

        self.wmo.draw(
            &mut *ctx,
            &WmoDrawArgs {
                doodad_set: self.doodad_set,
                position: self.position,
                yaw,
                cull_distance: args.cull_distance,
                draw_bounding_box: is_selected,
                draw_group_boxes: is_selected,
                highlight: is_selected,
                draw_doodads: args.draw_doodads,
                draw_fog: args.draw_fog,
                draw_skies: args.draw_skies,
                fog_distance: args.fog_distance,
                frustum: args.frustum,
                camera: args.camera,
            },
        );
    }

    /// Pick rendering. The asset gets the opposite yaw of `draw`, which is what its select
    /// geometry expects.
    pub fn draw_select(&self, ctx: &mut dyn RenderContext, args: &InstanceSelectArgs) {
        let mut ctx = MatrixScope::new(ctx);
        let yaw = self.apply_transform(&mut *ctx);

        let mut named = NameScope::new(&mut *ctx, self.selection_id);
        self.wmo.draw_select(
            &mut *named,
            &WmoSelectArgs {
                doodad_set: self.doodad_set,
                position: self.position,
                yaw: -yaw,
                cull_distance: args.cull_distance,
                draw_doodads: args.draw_doodads,
                frustum: args.frustum,
                camera: args.camera,
            },
        );
    }

    fn world_matrix(&self) -> glm::Mat4 {
        glm::translation(&self.position.to_glm())
            * glm::rotation(self.rotation.y.to_radians(), &glm::vec3(0.0, 1.0, 0.0))
            * glm::rotation((-self.rotation.x).to_radians(), &glm::vec3(0.0, 0.0, 1.0))
            * glm::rotation(self.rotation.z.to_radians(), &glm::vec3(1.0, 0.0, 0.0))
    }

    /// Recomputes the world space box around the asset box and every group box.
    pub fn recalc_extents(&mut self) {
        let matrix = self.world_matrix();

        let asset_box = self.wmo.extents();
        let corners = asset_box.corners().into_iter().chain(
            self.wmo
                .groups()
                .iter()
                .flat_map(|group| group.bounding_box.corners()),
        );

        let mut extents = BoundingBox::empty();
        for corner in corners {
            let transformed = matrix * glm::vec4(corner.x, corner.y, corner.z, 1.0);
            extents.expand(Vector3::from_glm(&transformed.xyz()));
        }

        self.extents = extents;
    }

    /// Keeps the yaw only.
    pub fn reset_direction(&mut self) {
        self.rotation = Vector3::new(0.0, self.rotation.y, 0.0);
    }

    pub fn wmo(&self) -> &Arc<dyn WmoModel> {
        &self.wmo
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
    }

    pub fn rotation(&self) -> Vector3 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vector3) {
        self.rotation = rotation;
    }

    pub fn extents(&self) -> BoundingBox {
        self.extents
    }

    pub fn unique_id(&self) -> u32 {
        self.unique_id
    }

    pub fn set_unique_id(&mut self, unique_id: u32) {
        self.unique_id = unique_id;
    }

    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn doodad_set(&self) -> u16 {
        self.doodad_set
    }

    pub fn set_doodad_set(&mut self, doodad_set: u16) {
        self.doodad_set = doodad_set;
    }

    pub fn name_set(&self) -> u16 {
        self.name_set
    }

    pub fn unknown(&self) -> u16 {
        self.unknown
    }

    pub fn selection_id(&self) -> SelectionId {
        self.selection_id
    }

    pub fn placement(&self) -> WmoPlacementRecord {
        WmoPlacementRecord {
            unique_id: self.unique_id,
            position: self.position,
            rotation: self.rotation,
            extents: self.extents,
            flags: self.flags,
            doodad_set: self.doodad_set,
            name_set: self.name_set,
            unknown: self.unknown,
        }
    }

    pub fn to_modf_entry(&self, name_id: u32) -> ModfEntry {
        ModfEntry::from_record(name_id, &self.placement())
    }

    pub fn write_to<W: Write + Seek>(&self, writer: &mut W) -> EditorResult<()> {
        self.placement().write_to(writer)?;
        Ok(())
    }
}

impl Drop for WmoInstance {
    fn drop(&mut self) {
        self.selection_names.del(self.selection_id);
    }
}
