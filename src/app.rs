use std::f64::consts::PI;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::time;

use anyhow::Context;
use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use obj::{load_obj, Obj, TexturedVertex};

use tiny_rasterizer::scene::buffer::Uniforms;
use tiny_rasterizer::scene::shader::Lambert;
use tiny_rasterizer::scene::util::{orthographic, perspective};
use tiny_rasterizer::{
    render_wireframe, Camera, Color, Framebuffer, Material, Model, RenderStats, Renderer, SceneObject, Texture,
};

use crate::Params;

const CLEAR_COLOR: Color = Color::CORNFLOWER_BLUE;
const WIREFRAME_COLOR: Color = Color::RED;

/// Loads the requested OBJ model, or builds a textured cube in front of a plane.
fn build_scene(params: &Params) -> anyhow::Result<Vec<SceneObject>> {
    let texture = match &params.texture {
        Some(path) => {
            let image = image::open(path)
                .with_context(|| format!("failed to read texture {}", path.display()))?
                .to_rgb8();
            Some(Arc::new(Texture::from_image(&image)?))
        }
        None => None,
    };

    if let Some(path) = &params.model {
        let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let obj: Obj<TexturedVertex, u32> =
            load_obj(BufReader::new(file)).with_context(|| format!("failed to parse {}", path.display()))?;
        log::info!("number of vertices - {}", obj.vertices.len());
        log::info!("number of indices  - {}", obj.indices.len());

        let material = Material {
            ambient_texture: texture,
            ..Material::default()
        };
        let model = Model::from_obj(&obj)?.with_material(Some(Arc::new(material)));
        return Ok(vec![SceneObject::new(Arc::new(model), Vector3::zeros(), params.scale)]);
    }

    let checker = match texture {
        Some(texture) => texture,
        None => Arc::new(Texture::checkerboard(
            64,
            64,
            8,
            Vector3::new(0.9, 0.9, 0.9),
            Vector3::new(0.8, 0.3, 0.1),
        )?),
    };
    let cube_material = Material {
        ambient_texture: Some(checker),
        ..Material::diffuse("checker", Vector3::new(1.0, 1.0, 1.0))
    };
    let plane_material = Material::diffuse("ground", Vector3::new(0.4, 0.7, 0.4));

    let mut cube = SceneObject::new(
        Arc::new(Model::cube(1.0, Some(Arc::new(cube_material)))),
        Vector3::zeros(),
        10.0,
    );
    cube.rotation = UnitQuaternion::from_euler_angles(PI / 6.0, PI / 5.0, 0.0);
    let plane = SceneObject::new(
        Arc::new(Model::plane(2.0, Some(Arc::new(plane_material)))),
        Vector3::new(0.0, 0.0, 15.0),
        10.0,
    );
    return Ok(vec![cube, plane]);
}

fn projection(params: &Params) -> anyhow::Result<Matrix4<f64>> {
    if params.orthographic {
        return Ok(orthographic(0.05));
    }
    let aspect = params.width as f64 / params.height as f64;
    return Ok(perspective(PI / 3.0, aspect, 0.1, 1000.0)?);
}

/// Renders `params.frames` frames and writes the last one to disk.
pub fn run(params: Params) -> anyhow::Result<()> {
    let renderer = match params.threads {
        Some(threads) => Renderer::new(threads)?,
        None => Renderer::with_available_parallelism(),
    };
    let mut framebuffer = Arc::new(Framebuffer::new(params.width, params.height)?);
    let mut objects = build_scene(&params)?;
    let camera = Camera::new(Vector3::new(0.0, 0.0, -40.0));
    let projection = projection(&params)?;
    let light_direction = Vector3::new(1.0, 1.0, -1.0);
    let turn = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 2.0 * PI / params.frames.max(1) as f64);

    let time_begin = time::Instant::now();
    let mut frame_counter_time_begin = time::Instant::now();
    let mut frame_counter: u32 = 0;
    for frame in 0..params.frames {
        Arc::get_mut(&mut framebuffer)
            .context("framebuffer is still shared with a worker")?
            .resize(params.width, params.height)?;
        framebuffer.clear(CLEAR_COLOR, f64::INFINITY);

        let view_projection = projection * camera.view_matrix();
        let mut stats = RenderStats::default();
        for object in &objects {
            let world = object.world_matrix();
            if params.wireframe {
                render_wireframe(&framebuffer, &object.model, &(view_projection * world), WIREFRAME_COLOR);
                continue;
            }
            let uniforms = Uniforms::new(world, view_projection, light_direction, params.light_intensity);
            let shader = Lambert::new(Arc::clone(&object.model), uniforms);
            stats += renderer.render(&framebuffer, &object.model, shader.clone(), shader, params.cull.into())?;
        }
        log::debug!("frame {}: {:?}", frame, stats);

        for object in &mut objects {
            object.rotation = turn * object.rotation;
        }

        if params.print_fps {
            // Counting frames to print out stats every second.
            frame_counter += 1;
            if frame_counter_time_begin.elapsed().as_secs_f32() > 1.0 {
                log::info!("FPS --- {}", frame_counter);
                frame_counter_time_begin = time::Instant::now();
                frame_counter = 0;
            }
        }
    }
    let elapsed = time_begin.elapsed().as_secs_f64();
    log::info!(
        "rendered {} frame(s) in {:.3}s with {} workers",
        params.frames,
        elapsed,
        renderer.workers()
    );

    framebuffer
        .to_image()
        .save(&params.output)
        .with_context(|| format!("failed to write {}", params.output.display()))?;
    log::info!("frame written to {}", params.output.display());
    if let Some(path) = &params.depth_output {
        framebuffer
            .depth_image()
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("depth written to {}", path.display());
    }

    return Ok(());
}
