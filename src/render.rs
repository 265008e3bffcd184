use std::num::NonZeroUsize;
use std::ops;
use std::ops::Range;
use std::sync::mpsc;
use std::sync::Arc;

use nalgebra::{Matrix4, Vector2, Vector4};
use threadpool::ThreadPool;

use crate::error::{RasterError, Result};
use crate::framebuffer::{Color, Framebuffer};
use crate::interpolate::Interpolate;
use crate::model::Model;
use crate::raster::{rasterize, Coverage, CullMode};
use crate::scene::util::to_hom_point;
use crate::shader::{PixelShader, VertexShader};
use crate::util::{clip_segment, Point};

/// Triangle counts of a render call, by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub triangles: usize,
    pub drawn: usize,
    pub culled: usize,
    pub degenerate: usize,
    pub clipped: usize,
    pub fragments: usize, // Pixels written, a pixel overwritten later counts twice.
}

impl RenderStats {
    pub fn record(&mut self, coverage: Coverage) {
        self.triangles += 1;
        match coverage {
            Coverage::Culled => self.culled += 1,
            Coverage::Degenerate => self.degenerate += 1,
            Coverage::Clipped => self.clipped += 1,
            Coverage::Drawn { fragments } => {
                self.drawn += 1;
                self.fragments += fragments;
            }
        }
    }
}

impl ops::Add<RenderStats> for RenderStats {
    type Output = RenderStats;

    fn add(self, rhs: RenderStats) -> RenderStats {
        return RenderStats {
            triangles: self.triangles + rhs.triangles,
            drawn: self.drawn + rhs.drawn,
            culled: self.culled + rhs.culled,
            degenerate: self.degenerate + rhs.degenerate,
            clipped: self.clipped + rhs.clipped,
            fragments: self.fragments + rhs.fragments,
        };
    }
}

impl ops::AddAssign<RenderStats> for RenderStats {
    fn add_assign(&mut self, rhs: RenderStats) {
        *self = *self + rhs;
    }
}

/// Splits `0..len` into at most `workers` contiguous, disjoint ranges.
fn chunks(len: usize, workers: usize) -> impl Iterator<Item = Range<usize>> {
    let size = len.div_ceil(workers.max(1)).max(1);
    return (0..len).step_by(size).map(move |start| start..(start + size).min(len));
}

/// Draws models with a fixed number of worker threads.
///
/// Every face of a model goes through the vertex shader exactly once, then the triangle list is
/// split into one contiguous chunk per worker and the chunks are rasterized in parallel into
/// the shared framebuffer.
pub struct Renderer {
    pool: ThreadPool,
    workers: usize,
}

impl Renderer {
    pub fn new(workers: usize) -> Result<Renderer> {
        let workers = NonZeroUsize::new(workers).ok_or(RasterError::InvalidWorkerCount)?;
        return Ok(Renderer::with_workers(workers));
    }

    /// Renderer with one worker per available core.
    pub fn with_available_parallelism() -> Renderer {
        let workers = std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN);
        return Renderer::with_workers(workers);
    }

    fn with_workers(workers: NonZeroUsize) -> Renderer {
        let workers = workers.get();
        log::debug!("starting renderer with {} workers", workers);
        return Renderer {
            pool: ThreadPool::with_name(String::from("rasterizer"), workers),
            workers,
        };
    }

    pub fn workers(&self) -> usize {
        return self.workers;
    }

    /// Draws `model` into `target` and blocks until the frame is complete.
    ///
    /// The framebuffer is neither resized nor cleared. When the call returns no worker holds a
    /// reference to `target` or `model` anymore, so the caller may take them back with
    /// `Arc::get_mut`. A panicking shader fails the call with [`RasterError::WorkerPanicked`];
    /// pixels written by the other workers stay in the framebuffer.
    pub fn render<T, V, P>(
        &self,
        target: &Arc<Framebuffer>,
        model: &Arc<Model>,
        vertex_shader: V,
        pixel_shader: P,
        cull: CullMode,
    ) -> Result<RenderStats>
    where
        T: Interpolate + Send + Sync + 'static,
        V: VertexShader<T> + 'static,
        P: PixelShader<T> + 'static,
    {
        log::debug!(
            "rendering {} faces, {} triangles into {}x{}",
            model.faces().len(),
            model.triangles().len(),
            target.width(),
            target.height()
        );

        let (attributes, positions) = self.shade_faces(model, vertex_shader)?;
        let stats = self.rasterize_triangles(target, model, attributes, positions, pixel_shader, cull)?;

        log::debug!("frame done: {:?}", stats);
        return Ok(stats);
    }

    /// Runs the vertex stage once for every face. Results are indexed like `model.faces()`.
    fn shade_faces<T, V>(&self, model: &Arc<Model>, vertex_shader: V) -> Result<(Arc<Vec<T>>, Arc<Vec<Vector4<f64>>>)>
    where
        T: Interpolate + Send + Sync + 'static,
        V: VertexShader<T> + 'static,
    {
        let vertex_shader = Arc::new(vertex_shader);
        let (sender, receiver) = mpsc::channel();
        let mut jobs = 0;
        for range in chunks(model.faces().len(), self.workers) {
            let model = Arc::clone(model);
            let vertex_shader = Arc::clone(&vertex_shader);
            let sender = sender.clone();
            jobs += 1;
            self.pool.execute(move || {
                log::trace!("shading faces {:?}", range);
                let shaded: Vec<(T, Vector4<f64>)> = model.faces()[range.clone()]
                    .iter()
                    .map(|face| vertex_shader.vertex(face))
                    .collect();
                let _ = sender.send((range.start, shaded));
            });
        }
        drop(sender);

        let mut chunks: Vec<(usize, Vec<(T, Vector4<f64>)>)> = receiver.iter().collect();
        self.pool.join();
        if chunks.len() < jobs {
            let failed = jobs - chunks.len();
            log::warn!("vertex stage: {} of {} jobs panicked", failed, jobs);
            return Err(RasterError::WorkerPanicked { failed });
        }

        chunks.sort_by_key(|(start, _)| *start);
        let mut attributes = Vec::with_capacity(model.faces().len());
        let mut positions = Vec::with_capacity(model.faces().len());
        for (_, chunk) in chunks {
            for (attribute, position) in chunk {
                attributes.push(attribute);
                positions.push(position);
            }
        }
        return Ok((Arc::new(attributes), Arc::new(positions)));
    }

    fn rasterize_triangles<T, P>(
        &self,
        target: &Arc<Framebuffer>,
        model: &Arc<Model>,
        attributes: Arc<Vec<T>>,
        positions: Arc<Vec<Vector4<f64>>>,
        pixel_shader: P,
        cull: CullMode,
    ) -> Result<RenderStats>
    where
        T: Interpolate + Send + Sync + 'static,
        P: PixelShader<T> + 'static,
    {
        let pixel_shader = Arc::new(pixel_shader);
        let (sender, receiver) = mpsc::channel();
        let mut jobs = 0;
        for range in chunks(model.triangles().len(), self.workers) {
            let target = Arc::clone(target);
            let model = Arc::clone(model);
            let attributes = Arc::clone(&attributes);
            let positions = Arc::clone(&positions);
            let pixel_shader = Arc::clone(&pixel_shader);
            let sender = sender.clone();
            jobs += 1;
            self.pool.execute(move || {
                log::trace!("rasterizing triangles {:?}", range);
                let mut stats = RenderStats::default();
                for triangle in &model.triangles()[range] {
                    let [f0, f1, f2] = triangle.faces;
                    let coverage = rasterize(
                        &target,
                        &[positions[f0], positions[f1], positions[f2]],
                        [&attributes[f0], &attributes[f1], &attributes[f2]],
                        triangle.material.as_deref(),
                        cull,
                        &*pixel_shader,
                    );
                    stats.record(coverage);
                }
                let _ = sender.send(stats);
            });
        }
        drop(sender);

        let results: Vec<RenderStats> = receiver.iter().collect();
        self.pool.join();
        if results.len() < jobs {
            let failed = jobs - results.len();
            log::warn!("pixel stage: {} of {} jobs panicked", failed, jobs);
            return Err(RasterError::WorkerPanicked { failed });
        }
        return Ok(results.into_iter().fold(RenderStats::default(), |sum, stats| sum + stats));
    }
}

/// Draws the edges of every triangle of `model` transformed by `transform` (object to clip space).
/// Depth is ignored. Edges with an endpoint at or behind the eye are skipped, the others are
/// clipped to the framebuffer before they are drawn.
pub fn render_wireframe(target: &Framebuffer, model: &Model, transform: &Matrix4<f64>, color: Color) {
    if target.width() == 0 || target.height() == 0 {
        return;
    }
    let min = Vector2::new(0.0, 0.0);
    let max = Vector2::new((target.width() - 1) as f64, (target.height() - 1) as f64);
    for triangle in model.triangles() {
        let corners = triangle
            .faces
            .map(|f| transform * to_hom_point(model.position(&model.faces()[f])));
        for (a, b) in [(0, 1), (1, 2), (2, 0)] {
            let (p_0, p_1) = (corners[a], corners[b]);
            if !(p_0.w > 0.0) || !(p_1.w > 0.0) {
                continue;
            }
            let (s_0, s_1) = match clip_segment(target.to_screen(&p_0), target.to_screen(&p_1), min, max) {
                Some(segment) => segment,
                None => continue,
            };
            target.draw_line(Point::round(s_0.x, s_0.y), Point::round(s_1.x, s_1.y), color);
        }
    }
}
