use engine::{load_rgb_raster, resolve_app_paths, LoopConfig, Scene};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::load_gameplay_config;
use super::gameplay::{self, WorldMap};
use super::title::TitleScene;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) title: Box<dyn Scene>,
    pub(crate) overworld: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, String> {
    init_tracing();
    info!("=== Hollowmere Startup ===");

    let app_paths = resolve_app_paths().map_err(|error| format!("resolve app paths: {error}"))?;
    let gameplay_config = load_gameplay_config(&app_paths.config_dir)?;

    let map_path = app_paths.maps_dir.join(gameplay::OVERWORLD_MAP_FILE);
    let raster = load_rgb_raster(&map_path)
        .map_err(|error| format!("load map '{}': {error}", map_path.display()))?;
    let map = WorldMap::decode(&raster, gameplay::TILE_SIZE_PX)?;
    info!(
        width_tiles = map.width(),
        height_tiles = map.height(),
        objects = map.objects().len(),
        "map_decoded"
    );

    let title = Box::new(TitleScene::new());
    let overworld = gameplay::build_overworld_scene(map, gameplay_config);

    Ok(AppWiring {
        config: LoopConfig::default(),
        title,
        overworld,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
