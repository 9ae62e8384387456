use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;
use log::{debug, info};
use mpq::ArchiveManager;
use rustbolt_editor::{
    config::EditorConfig,
    map::adt::Adt,
    render::{
        frustum::Frustum,
        recorder::{CommandRecorder, RenderCommand},
    },
    wmo::InstanceDrawArgs,
    world::World,
};
use shared::models::geometry::Vector3;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let mut config = EditorConfig::load()?;
    if let Some(client_data_dir) = args.client_data_dir {
        config.data.client_directory = client_data_dir.to_string_lossy().into_owned();
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(config.log.level.as_str()))
        .init();

    let mut archives = ArchiveManager::open(&config.data.archive_paths())?;
    let mut world = World::new(&config.data.disk_search_path);

    if let Some(adt_path) = args.adt {
        let adt = Adt::load(&adt_path, &mut archives, &config.data.disk_search_path)?;
        let loaded = world.load_adt_wmos(&adt, &mut archives)?;
        info!("{}: {} WMO placements", adt_path, loaded);

        for (path, entry) in adt.wmo_placements() {
            if let Some(instance) = world.wmo_mut(entry.unique_id) {
                let stored = instance.extents();
                instance.recalc_extents();
                info!(
                    "{} ({}): stored extents {:?}, recomputed {:?}",
                    path,
                    entry.unique_id,
                    stored,
                    instance.extents()
                );
            }
        }
    }

    if let Some(wmo_path) = args.wmo {
        let unique_id = world.add_wmo(&wmo_path, Vector3::ZERO, Vector3::ZERO, &mut archives)?;
        if let Some(instance) = world.wmo(unique_id) {
            info!(
                "{}: {} groups, extents {:?}",
                wmo_path,
                instance.wmo().groups().len(),
                instance.extents()
            );
        }
    }

    // Headless frame, seen from the origin
    let frustum = Frustum::everything();
    let mut recorder = CommandRecorder::new();
    world.draw_wmos(
        &mut recorder,
        &InstanceDrawArgs {
            draw_doodads: config.render.draw_doodads,
            draw_fog: config.render.draw_fog,
            draw_skies: true,
            cull_distance: config.render.view_distance,
            fog_distance: config.render.fog_distance,
            frustum: &frustum,
            camera: Vector3::ZERO,
        },
    );
    debug!(
        "{} WMO groups within view distance",
        recorder.count(|command| matches!(command, RenderCommand::DrawWmoGroup(_)))
    );

    Ok(())
}

#[derive(Parser)]
#[command(name = "Rustbolt Editor")]
#[command(about = "Loads WMO placements from the client archives", long_about = None)]
struct Cli {
    /// Path to the client Data folder, overrides the configuration
    #[arg(short, long)]
    client_data_dir: Option<PathBuf>,
    /// Archive path of a WMO to place at the origin
    #[arg(short, long)]
    wmo: Option<String>,
    /// Archive path of a map tile whose WMO placements are loaded
    #[arg(short, long)]
    adt: Option<String>,
}
