//! Headless scene demo
//!
//! Builds (or loads) a small scene, drives it for a fixed number of frames
//! with scripted input and a logging renderer, then saves it back to disk.
//!
//! ```text
//! scene_demo run [config.toml|config.ron]
//! scene_demo import <mesh.obj> <mesh.ron>
//! ```

use std::path::{Path, PathBuf};

use log::{debug, error, info, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use scene_engine::assets::ImportError;
use scene_engine::foundation::logging;
use scene_engine::prelude::*;
use scene_engine::render::FrameContext;

/// Demo settings, read from TOML or RON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    /// Scene to load instead of building the built-in one
    scene_path: Option<PathBuf>,
    /// Where the scene is written after the run
    output_path: PathBuf,
    /// Number of frames to simulate
    frames: u32,
    /// Seconds per frame; zero or less uses wall-clock time
    fixed_delta: f32,
    /// Frame clock settings
    world: WorldConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            scene_path: None,
            output_path: PathBuf::from("demo_scene.ron"),
            frames: 120,
            fixed_delta: 1.0 / 60.0,
            world: WorldConfig::default(),
        }
    }
}

impl Config for DemoConfig {}

#[derive(Error, Debug)]
enum DemoError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("World error: {0}")]
    World(#[from] WorldError),

    #[error("Scene error: {0}")]
    Scene(#[from] SerializationError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Usage: {0}")]
    Usage(String),
}

/// Renderer that logs what it is asked to draw
#[derive(Default)]
struct LoggingRenderer {
    draws_this_frame: usize,
    total_draws: usize,
    frames: usize,
}

impl Renderer for LoggingRenderer {
    fn begin_frame(&mut self, frame: &FrameContext) -> Result<(), RenderError> {
        self.draws_this_frame = 0;
        trace!("Frame {}: camera {:?}, {} lights", self.frames, frame.camera, frame.lights.len());
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall) -> Result<(), RenderError> {
        trace!(
            "Draw {} at ({:.2}, {:.2}, {:.2})",
            call.params.mesh_path,
            call.world_matrix[(0, 3)],
            call.world_matrix[(1, 3)],
            call.world_matrix[(2, 3)]
        );
        self.draws_this_frame += 1;
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.total_draws += self.draws_this_frame;
        self.frames += 1;
        debug!("Frame {} submitted {} draws", self.frames, self.draws_this_frame);
        Ok(())
    }
}

/// Camera, sun, player, two platforms and a lamp
fn build_demo_scene(config: &WorldConfig) -> Result<World, WorldError> {
    let mut world = World::with_config(config);
    let root = world.root();

    let camera = world.spawn("Main Camera", root)?;
    world.add_component::<Camera>(camera)?.field_of_view = 50.0;
    world
        .transform_mut(camera)?
        .set_position(Vec3::new(0.0, 3.0, -8.0))
        .look_at(Vec3::zeros());

    let sun = world.spawn("Sun", root)?;
    world.add_component::<DirectionalLight>(sun)?.direction = Vec3::new(-0.5, -1.0, 0.3).normalize();
    world.add_component::<LightToggle>(sun)?;

    let player = world.spawn("Player", root)?;
    world.insert_component(player, MeshRenderer::with_mesh("models/player.ron"))?;
    world.add_component::<CharacterMove>(player)?;

    let platform = world.spawn("Trigger Platform", root)?;
    world.transform_mut(platform)?.set_position(Vec3::new(0.0, 0.0, 3.0));
    world.insert_component(platform, MeshRenderer::with_mesh("models/platform.ron"))?;
    let mut trigger = TriggerJump::with_player(EntityRef::from_entity(&world, player));
    trigger.trigger_radius = 1.5;
    world.insert_component(platform, trigger)?;

    let lamp = world.spawn("Lamp", platform)?;
    world.transform_mut(lamp)?.set_local_position(Vec3::new(0.0, 1.0, 0.0));
    world.add_component::<PointLight>(lamp)?.range = 4.0;

    let bouncer = world.spawn("Bouncer", root)?;
    world.transform_mut(bouncer)?.set_position(Vec3::new(3.0, 0.0, 0.0));
    world.insert_component(bouncer, MeshRenderer::with_mesh("models/cube.ron"))?;
    world.add_component::<BounceJump>(bouncer)?;

    info!("Built demo scene with {} entities", world.entity_count());
    Ok(world)
}

/// Walk forward onto the platform, flip the sun off, then turn around
fn demo_input() -> ScriptedInput {
    ScriptedInput::new()
        .then_hold_for(&[], 4)
        .then_hold_for(&[Key::W], 75)
        .then_hold(&[Key::O])
        .then_hold_for(&[Key::Q], 20)
}

fn run(config_path: Option<&Path>) -> Result<(), DemoError> {
    let config = match config_path {
        Some(path) => DemoConfig::load_from_file(path)?,
        None => DemoConfig::default(),
    };
    info!("Running {} frames", config.frames);

    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);

    let mut world = match &config.scene_path {
        Some(path) => {
            let mut world = serializer.load(path)?;
            *world.time_mut() = GameTime::new(config.world.time_scale, config.world.max_delta_time);
            world
        }
        None => build_demo_scene(&config.world)?,
    };
    world.set_input_provider(Box::new(demo_input()));

    let mut renderer = LoggingRenderer::default();
    let mut timer = Timer::new();
    for _ in 0..config.frames {
        timer.update();
        let delta = if config.fixed_delta > 0.0 {
            config.fixed_delta
        } else {
            timer.delta_time()
        };
        world.frame(delta, &mut renderer)?;
    }

    if let Some(player) = world.find_entity("Player") {
        if let Some(view) = world.transform(player) {
            let position = view.position();
            info!("Player ended at ({:.2}, {:.2}, {:.2})", position.x, position.y, position.z);
        }
    }
    info!(
        "Simulated {:.2}s in {} frames ({} draws, {:.0} fps wall clock)",
        world.time().elapsed(),
        renderer.frames,
        renderer.total_draws,
        timer.average_fps()
    );

    serializer.save(&world, &config.output_path)?;
    let reloaded = serializer.load(&config.output_path)?;
    info!(
        "Reloaded {} entities and {} components from {}",
        reloaded.entity_count(),
        reloaded.component_count(),
        config.output_path.display()
    );

    world.destroy_all()?;
    Ok(())
}

fn import(source: &Path, target: &Path) -> Result<(), DemoError> {
    let importer = ObjImporter;
    if !importer.accepts(source) {
        return Err(DemoError::Usage(format!("{} is not an OBJ file", source.display())));
    }
    let mesh = importer.import(source)?;
    mesh.save(target)?;
    Ok(())
}

fn dispatch(args: &[String]) -> Result<(), DemoError> {
    match args.first().map(String::as_str) {
        None => run(None),
        Some("run") => run(args.get(1).map(Path::new)),
        Some("import") => match (args.get(1), args.get(2)) {
            (Some(source), Some(target)) => import(Path::new(source), Path::new(target)),
            _ => Err(DemoError::Usage("scene_demo import <mesh.obj> <mesh.ron>".to_string())),
        },
        Some(other) => Err(DemoError::Usage(format!(
            "unknown command `{other}`; expected `run [config]` or `import <obj> <out>`"
        ))),
    }
}

fn main() {
    logging::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = dispatch(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_scene_survives_a_save_load_cycle() {
        let registry = ComponentRegistry::with_builtins();
        let serializer = SceneSerializer::new(&registry);
        let mut world = build_demo_scene(&WorldConfig::default()).unwrap();
        world.set_input_provider(Box::new(demo_input()));
        let mut renderer = LoggingRenderer::default();
        for _ in 0..90 {
            world.frame(1.0 / 60.0, &mut renderer).unwrap();
        }
        assert!(renderer.total_draws > 0);

        let document = serializer.serialize(&world).unwrap();
        let loaded = serializer.deserialize(&document).unwrap();
        assert_eq!(loaded.entity_count(), world.entity_count());
        assert_eq!(loaded.component_count(), world.component_count());
    }

    #[test]
    fn test_demo_config_defaults_fill_missing_keys() {
        let config: DemoConfig = toml::from_str("frames = 10").unwrap();
        assert_eq!(config.frames, 10);
        assert_eq!(config.output_path, PathBuf::from("demo_scene.ron"));
    }

    #[test]
    fn test_unknown_command_is_a_usage_error() {
        let err = dispatch(&["explode".to_string()]).unwrap_err();
        assert!(matches!(err, DemoError::Usage(_)));
    }
}
