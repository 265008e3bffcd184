mod app;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tiny_rasterizer::CullMode;

/// Winding kept on screen, see `CullMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Cull {
    None,
    Clockwise,
    CounterClockwise,
}

impl From<Cull> for CullMode {
    fn from(cull: Cull) -> CullMode {
        return match cull {
            Cull::None => CullMode::None,
            Cull::Clockwise => CullMode::Clockwise,
            Cull::CounterClockwise => CullMode::CounterClockwise,
        };
    }
}

/// Renders a Wavefront OBJ model, or a built-in cube and plane scene, to PNG.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Params {
    /// OBJ file to render instead of the built-in scene.
    #[arg(short = 'p', long)]
    pub model: Option<PathBuf>,

    /// Image used as the ambient texture of the model.
    #[arg(long)]
    pub texture: Option<PathBuf>,

    /// Uniform scale applied to the loaded model.
    #[arg(long, default_value_t = 10.0)]
    pub scale: f64,

    #[arg(long, default_value_t = 800)]
    pub width: i32,

    #[arg(long, default_value_t = 800)]
    pub height: i32,

    /// Worker threads, one per core when omitted.
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Number of frames to render, the scene turns a full circle over all of them.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub frames: u32,

    #[arg(long, value_enum, default_value_t = Cull::Clockwise)]
    pub cull: Cull,

    /// Draw triangle edges instead of filled triangles.
    #[arg(long)]
    pub wireframe: bool,

    /// Parallel projection instead of perspective.
    #[arg(long)]
    pub orthographic: bool,

    /// 0 disables the light, 1 is full contrast.
    #[arg(long, default_value_t = 0.4)]
    pub light_intensity: f64,

    /// Where the last frame is written.
    #[arg(short = 'o', long, default_value = "frame.png")]
    pub output: PathBuf,

    /// Where the depth buffer of the last frame is written, if at all.
    #[arg(long)]
    pub depth_output: Option<PathBuf>,

    /// Log frames per second once a second.
    #[arg(long)]
    pub print_fps: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let params = Params::parse();
    app::run(params)?;

    return Ok(());
}
