use std::{collections::HashMap, sync::Arc};

use log::{debug, info};
use mpq::ArchiveManager;
use shared::models::{geometry::Vector3, wmo_placement::WmoPlacementRecord};

use crate::{
    map::adt::Adt,
    render::RenderContext,
    selection::{SelectionId, SelectionNames, SelectionOwner},
    wmo::{InstanceDrawArgs, InstanceSelectArgs, WmoInstance, WmoManager},
    EditorError, EditorResult,
};

/// The scene being edited.
pub struct World {
    // Instances release their selection names when dropped, keep them first
    wmo_instances: HashMap<u32, WmoInstance>,
    wmo_manager: WmoManager,
    selected: Option<SelectionId>,
    selection_names: Arc<SelectionNames>,
}

impl World {
    pub fn new(disk_search_path: &str) -> Self {
        Self {
            wmo_instances: HashMap::new(),
            wmo_manager: WmoManager::new(disk_search_path),
            selected: None,
            selection_names: Arc::new(SelectionNames::new()),
        }
    }

    pub fn selection_names(&self) -> &Arc<SelectionNames> {
        &self.selection_names
    }

    pub fn wmo_manager(&mut self) -> &mut WmoManager {
        &mut self.wmo_manager
    }

    /// One past the highest id in use, or the lowest free id once that would overflow.
    fn next_unique_id(&self) -> EditorResult<u32> {
        let next = match self.wmo_instances.keys().max() {
            None => Some(1),
            Some(max) => max.checked_add(1),
        };

        next.or_else(|| (1..=u32::MAX).find(|id| !self.wmo_instances.contains_key(id)))
            .ok_or(EditorError::UniqueIdsExhausted)
    }

    /// Places a new instance of the WMO at `path` and returns its unique id.
    pub fn add_wmo(
        &mut self,
        path: &str,
        position: Vector3,
        rotation: Vector3,
        archives: &mut ArchiveManager,
    ) -> EditorResult<u32> {
        let wmo = self.wmo_manager.resolve(path, archives)?;
        let unique_id = self.next_unique_id()?;

        let mut instance = WmoInstance::new(
            wmo,
            WmoPlacementRecord {
                unique_id,
                position,
                rotation,
                ..Default::default()
            },
            &self.selection_names,
        );
        instance.recalc_extents();

        info!("Placed {} as WMO {}", path, unique_id);
        self.wmo_instances.insert(unique_id, instance);
        Ok(unique_id)
    }

    /// Instantiates the WMO placements of a map tile. Placements already in the scene, as the
    /// ones shared with a neighbouring tile, are skipped. Every asset is resolved before the
    /// first instance is added: on error the scene is left as it was.
    pub fn load_adt_wmos(
        &mut self,
        adt: &Adt,
        archives: &mut ArchiveManager,
    ) -> EditorResult<usize> {
        let mut resolved = Vec::new();

        for (path, entry) in adt.wmo_placements() {
            if self.wmo_instances.contains_key(&entry.unique_id) {
                debug!("WMO {} already loaded", entry.unique_id);
                continue;
            }

            resolved.push((self.wmo_manager.resolve(path, archives)?, entry));
        }

        let loaded = resolved.len();
        for (wmo, entry) in resolved {
            let instance = WmoInstance::from_modf(wmo, entry, &self.selection_names);
            self.wmo_instances.insert(entry.unique_id, instance);
        }

        debug!("Loaded {} WMO instances", loaded);
        Ok(loaded)
    }

    pub fn remove_wmo(&mut self, unique_id: u32) -> bool {
        match self.wmo_instances.remove(&unique_id) {
            Some(instance) => {
                if self.selected == Some(instance.selection_id()) {
                    self.selected = None;
                }
                true
            }
            None => false,
        }
    }

    pub fn wmo(&self, unique_id: u32) -> Option<&WmoInstance> {
        self.wmo_instances.get(&unique_id)
    }

    pub fn wmo_mut(&mut self, unique_id: u32) -> Option<&mut WmoInstance> {
        self.wmo_instances.get_mut(&unique_id)
    }

    pub fn wmo_by_selection(&self, id: SelectionId) -> Option<&WmoInstance> {
        match self.selection_names.owner(id)? {
            SelectionOwner::Wmo { unique_id } => self
                .wmo_instances
                .get(&unique_id)
                .filter(|instance| instance.selection_id() == id),
        }
    }

    pub fn wmo_count(&self) -> usize {
        self.wmo_instances.len()
    }

    pub fn select(&mut self, id: Option<SelectionId>) {
        self.selected = id;
    }

    pub fn selected(&self) -> Option<SelectionId> {
        self.selected
    }

    pub fn draw_wmos(&self, ctx: &mut dyn RenderContext, args: &InstanceDrawArgs) {
        for instance in self.wmo_instances.values() {
            instance.draw(ctx, args, self.selected);
        }
    }

    pub fn draw_wmos_select(&self, ctx: &mut dyn RenderContext, args: &InstanceSelectArgs) {
        for instance in self.wmo_instances.values() {
            instance.draw_select(ctx, args);
        }
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.wmo_instances.clear();
        self.wmo_manager.purge_unused();
    }
}

#[cfg(test)]
mod tests {
    use mpq::MpqArchive;
    use shared::models::geometry::BoundingBox;

    use super::*;
    use crate::{
        map::adt::tests::{placement, tile},
        render::{frustum::Frustum, recorder::CommandRecorder},
        test_utils::temp_archive_path,
        wmo::model::tests::{root_file, StubWmo},
    };

    fn world_with_stub() -> World {
        let mut world = World::new("");
        world
            .wmo_manager()
            .insert("World\\wmo\\stub.wmo", Arc::new(StubWmo::unit_cube()));
        world
    }

    #[test]
    fn test_add_and_remove() {
        let mut world = world_with_stub();
        let mut archives = ArchiveManager::empty();

        let first = world
            .add_wmo(
                "World\\wmo\\stub.wmo",
                Vector3::new(5.0, 0.0, 0.0),
                Vector3::ZERO,
                &mut archives,
            )
            .unwrap();
        let second = world
            .add_wmo("world/wmo/STUB.wmo", Vector3::ZERO, Vector3::ZERO, &mut archives)
            .unwrap();

        assert_eq!((first, second), (1, 2));
        assert_eq!(world.selection_names().len(), 2);
        assert!(world.wmo(first).unwrap().extents().approx_eq(
            &BoundingBox::new(
                Vector3::new(4.0, -1.0, -1.0),
                Vector3::new(6.0, 1.0, 1.0)
            ),
            1.0e-3
        ));

        let id = world.wmo(first).unwrap().selection_id();
        world.select(Some(id));
        assert_eq!(world.wmo_by_selection(id).unwrap().unique_id(), first);

        assert!(world.remove_wmo(first));
        assert!(!world.remove_wmo(first));
        assert_eq!(world.selected(), None);
        assert!(world.wmo_by_selection(id).is_none());
        assert_eq!(world.selection_names().len(), 1);
    }

    #[test]
    fn test_load_adt_wmos_skips_known_placements() {
        let path = temp_archive_path("world-adt.MPQ");

        let mut archive = MpqArchive::create(&path, 16).unwrap();
        archive
            .add_file(
                "World\\wmo\\a.wmo",
                &root_file(&[(0, [-1.0, -1.0, -1.0], [1.0, 1.0, 1.0])]),
            )
            .unwrap();
        let mut archives = ArchiveManager::empty();
        archives.push_front(archive);

        let adt = Adt::parse(&tile(
            &["World\\wmo\\a.wmo"],
            &[placement(0, 10), placement(0, 11)],
        ))
        .unwrap();

        let mut world = World::new("/nonexistent/");
        assert_eq!(world.load_adt_wmos(&adt, &mut archives).unwrap(), 2);
        assert_eq!(world.load_adt_wmos(&adt, &mut archives).unwrap(), 0);
        assert_eq!(world.wmo_count(), 2);

        let instance = world.wmo(10).unwrap();
        assert_eq!(instance.extents(), WmoPlacementRecord::from(&placement(0, 10)).extents);
        assert!(Arc::ptr_eq(instance.wmo(), world.wmo(11).unwrap().wmo()));
    }

    #[test]
    fn test_load_adt_wmos_is_all_or_nothing() {
        let mut world = world_with_stub();
        let mut archives = ArchiveManager::empty();

        let adt = Adt::parse(&tile(
            &["World\\wmo\\stub.wmo", "World\\wmo\\missing.wmo"],
            &[placement(0, 10), placement(1, 11)],
        ))
        .unwrap();

        assert!(matches!(
            world.load_adt_wmos(&adt, &mut archives),
            Err(EditorError::AssetNotFound(_))
        ));
        assert_eq!(world.wmo_count(), 0);
        assert!(world.selection_names().is_empty());
    }

    #[test]
    fn test_unique_id_after_the_last_one() {
        let mut world = world_with_stub();
        let mut archives = ArchiveManager::empty();

        let adt = Adt::parse(&tile(
            &["World\\wmo\\stub.wmo"],
            &[placement(0, 1), placement(0, u32::MAX)],
        ))
        .unwrap();
        world.load_adt_wmos(&adt, &mut archives).unwrap();

        let unique_id = world
            .add_wmo("World\\wmo\\stub.wmo", Vector3::ZERO, Vector3::ZERO, &mut archives)
            .unwrap();
        assert_eq!(unique_id, 2);
        assert_eq!(world.wmo_count(), 3);
    }

    #[test]
    fn test_draw_wmos() {
        let mut world = world_with_stub();
        let mut archives = ArchiveManager::empty();
        for _ in 0..3 {
            world
                .add_wmo("World\\wmo\\stub.wmo", Vector3::ZERO, Vector3::ZERO, &mut archives)
                .unwrap();
        }

        let frustum = Frustum::everything();
        let mut recorder = CommandRecorder::new();
        world.draw_wmos(
            &mut recorder,
            &InstanceDrawArgs {
                draw_doodads: true,
                draw_fog: false,
                draw_skies: false,
                cull_distance: 100.0,
                fog_distance: 100.0,
                frustum: &frustum,
                camera: Vector3::ZERO,
            },
        );
        world.draw_wmos_select(
            &mut recorder,
            &InstanceSelectArgs {
                draw_doodads: true,
                cull_distance: 100.0,
                frustum: &frustum,
                camera: Vector3::ZERO,
            },
        );

        assert_eq!(recorder.matrix_push_count(), 6);
        assert_eq!(recorder.matrix_depth(), 0);
    }

    #[test]
    fn test_drop_releases_every_name() {
        let mut world = world_with_stub();
        let mut archives = ArchiveManager::empty();
        world
            .add_wmo("World\\wmo\\stub.wmo", Vector3::ZERO, Vector3::ZERO, &mut archives)
            .unwrap();

        let names = world.selection_names().clone();
        drop(world);
        assert!(names.is_empty());
    }
}
