mod buffers;
mod pass;
mod passes;
mod state;

use std::ops::DerefMut;

use glam::Vec2;
use log::{debug, info};

pub use self::buffers::*;
pub use self::pass::*;
pub use self::passes::*;
pub use self::state::*;
use crate::{
    camera, gpu, utils, Camera, Config, Engine, Event, EventHandler,
    EventHandlerContext, Texture,
};

/// Frame graph of a single viewport: its camera, images and passes.
#[derive(Debug)]
pub struct Renderer {
    pub(crate) camera: Camera,
    pub(crate) config: Config,
    pub(crate) buffers: RendererBuffers,
    pub(crate) passes: RendererPasses,
    pub(crate) frame: gpu::Frame,
    pub(crate) history: HistoryState,
    pub(crate) taa: TaaState,
    pub(crate) ground_truth: GroundTruthState,
}

impl Renderer {
    pub(crate) fn new(
        engine: &Engine,
        device: &wgpu::Device,
        camera: Camera,
        config: Config,
    ) -> Self {
        info!("Creating renderer: {}", camera.describe());

        let config = config.clamped();

        let camera_data = camera.serialize(
            None,
            engine.light,
            Vec2::ZERO,
            config.ao.enabled,
        );

        let buffers =
            RendererBuffers::new(device, &camera, &config, camera_data);

        let passes = RendererPasses::new(engine, device, &config, &buffers);

        debug!("Renderer created");

        Self {
            camera,
            buffers,
            passes,
            frame: gpu::Frame::new(0),
            history: HistoryState::default(),
            taa: TaaState::new(config.taa.enabled),
            ground_truth: GroundTruthState::default(),
            config,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn frame(&self) -> u32 {
        self.frame.get()
    }

    /// Returns how many frames the ground-truth image has accumulated so
    /// far.
    pub fn accumulated_frames(&self) -> u32 {
        self.ground_truth.frame_idx()
    }

    /// Returns the image containing the most recently rendered frame, in
    /// linear HDR (`Rgba16Float`), before tonemapping.
    pub fn output(&self) -> &Texture {
        &self.buffers.output
    }

    pub(crate) fn is_alternate(&self) -> bool {
        self.frame.is_alternate()
    }

    pub(crate) fn update(
        &mut self,
        engine: &Engine,
        device: &wgpu::Device,
        camera: Camera,
    ) {
        if self.camera.has_moved(&camera) {
            self.ground_truth.reset();
        }

        let needs_rebuilding = self.camera.is_invalidated_by(&camera);

        self.camera = camera;

        if needs_rebuilding {
            self.rebuild_buffers(engine, device);
            self.rebuild_passes(engine, device);
            self.ground_truth.reset();
        }
    }

    pub(crate) fn configure(
        &mut self,
        engine: &Engine,
        device: &wgpu::Device,
        config: Config,
    ) {
        let config = config.clamped();

        if config == self.config {
            return;
        }

        let change = Reconfiguration::new(&self.config, &config);

        self.config = config;
        self.taa = self.taa.configure(config.taa.enabled);

        if change.rebuild_buffers {
            self.rebuild_buffers(engine, device);
        }

        if change.rebuild_passes {
            self.rebuild_passes(engine, device);
        }

        if change.reset_history {
            self.reset_history();
        }

        if change.reset_ground_truth {
            self.ground_truth.reset();

            // TAA's history contains whatever got displayed before
            self.taa = self.taa.reset();
        }
    }

    /// Makes the next frame start from cleared history images.
    fn reset_history(&mut self) {
        self.history.invalidate();
        self.taa = self.taa.reset();
    }

    fn rebuild_buffers(&mut self, engine: &Engine, device: &wgpu::Device) {
        debug!("Rebuilding buffers for renderer: {}", self.camera.describe());

        let camera_data = self.camera.serialize(
            None,
            engine.light,
            Vec2::ZERO,
            self.config.ao.enabled,
        );

        self.buffers = RendererBuffers::new(
            device,
            &self.camera,
            &self.config,
            camera_data,
        );

        self.frame = gpu::Frame::new(0);
        self.reset_history();
    }

    fn rebuild_passes(&mut self, engine: &Engine, device: &wgpu::Device) {
        debug!("Rebuilding passes for renderer: {}", self.camera.describe());

        self.passes =
            RendererPasses::new(engine, device, &self.config, &self.buffers);
    }

    /// Serializes the camera for the upcoming frame and sends it to the GPU.
    pub(crate) fn flush(&mut self, light: gpu::Light, queue: &wgpu::Queue) {
        let jitter = if self.taa.is_enabled()
            && !self.config.visualization.is_ground_truth()
        {
            camera::jitter(
                self.frame.get(),
                self.config.taa.halton_samples,
                self.camera.size,
            )
        } else {
            Vec2::ZERO
        };

        let prev = if self.history.needs_clear() {
            None
        } else {
            Some(*self.buffers.camera)
        };

        *self.buffers.camera.deref_mut() = self.camera.serialize(
            prev.as_ref(),
            light,
            jitter,
            self.config.ao.enabled,
        );

        self.buffers.camera.flush(queue);
    }

    /// Records the frame into `encoder`; the result lands in
    /// [`Self::output()`].
    pub(crate) fn render(
        &mut self,
        engine: &Engine,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        utils::metric("render", || {
            if self.config.visualization.is_ground_truth() {
                self.render_ground_truth(encoder);
            } else {
                self.render_hybrid(engine, encoder);
            }
        });

        self.frame = self.frame.next();
    }

    fn render_ground_truth(&mut self, encoder: &mut wgpu::CommandEncoder) {
        self.passes.ground_truth.run(self, encoder);
        self.buffers.gt_output.copy_to(encoder, &self.buffers.output);
        self.ground_truth.advance();
    }

    fn render_hybrid(
        &mut self,
        engine: &Engine,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        let passes = &self.passes;
        let config = &self.config;

        if self.history.needs_clear() {
            passes.history.run(self, encoder);
        }

        passes.gbuffer.run(engine, self, encoder);
        passes.gbuffer_mips.run(self, encoder);

        if config.shadows.enabled {
            passes.shadows.run(self, encoder);
        }

        if config.ao.enabled {
            passes.ao.run(self, encoder);
        }

        if config.reflections.enabled {
            passes.reflections.run(self, encoder);
        }

        if config.diffuse.enabled {
            passes.diffuse.run(self, encoder);
        }

        passes.deferred_shading.run(self, encoder);

        if self.taa.is_enabled() {
            passes.taa.run(self, encoder);

            self.buffers
                .taa
                .get(self.is_alternate())
                .copy_to(encoder, &self.buffers.output);
        } else {
            self.buffers.hdr.copy_to(encoder, &self.buffers.output);
        }

        self.history.advance();
        self.taa = self.taa.advance();
    }
}

impl EventHandler for Renderer {
    fn handle(&mut self, ctxt: EventHandlerContext) {
        // Light lives in the camera's uniform, so it needs no rebuilding
        if let Event::SceneChanged | Event::EnvironmentChanged = ctxt.event {
            self.rebuild_passes(ctxt.engine, ctxt.device);
            self.reset_history();
        }

        self.ground_truth.reset();
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        info!("Deleting renderer: {}", self.camera.describe());
    }
}
