//! Real-time hybrid renderer: rasterized G-Buffer combined with ray-traced
//! shadows, ambient occlusion, reflections and diffuse illumination, each
//! denoised within the frame, plus a progressive path tracer used as the
//! reference.
//!
//! The library records commands only; creating the device, presenting and
//! tonemapping belong to the host application.

mod buffers;
mod camera;
mod config;
mod environment;
mod error;
mod event;
mod event_handler;
mod noise;
mod renderer;
mod renderers;
mod scene;
mod shaders;
mod utils;

use std::mem;
use std::path::Path;
use std::sync::{Arc, Mutex};

use log::{error, info};
pub use penumbra_gpu as gpu;

pub(crate) use self::buffers::*;
pub use self::buffers::Texture;
pub use self::camera::*;
pub use self::config::*;
pub use self::environment::*;
pub use self::error::*;
pub use self::event::*;
pub(crate) use self::event_handler::*;
pub(crate) use self::noise::*;
pub use self::renderer::*;
pub use self::renderers::*;
pub use self::scene::*;
pub use self::shaders::*;

/// Resources shared by all renderers: shaders, blue noise, the scene, the
/// environment and the light.
#[derive(Debug)]
pub struct Engine {
    pub(crate) shaders: Shaders,
    pub(crate) noise: Noise,
    pub(crate) scene: SceneBuffers,
    pub(crate) environment: Environment,
    pub(crate) env_map: Texture,
    pub(crate) world: MappedUniformBuffer<gpu::World>,
    pub(crate) light: gpu::Light,
    renderers: Renderers,
    device_error: Arc<Mutex<Option<String>>>,
}

impl Engine {
    /// Creates the engine, loading shaders from `shaders_dir` (as built by
    /// `penumbra-shader-builder`).
    ///
    /// The device has to be created with [`Shaders::required_features()`]
    /// and [`Shaders::required_limits()`].
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        shaders_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        info!("Initializing engine");

        let missing_features =
            Shaders::required_features().difference(device.features());

        if !missing_features.is_empty() {
            return Err(Error::MissingFeatures(missing_features));
        }

        let device_error = Arc::new(Mutex::new(None));

        device.on_uncaptured_error(Box::new({
            let device_error = Arc::clone(&device_error);

            move |err: wgpu::Error| {
                error!("Device error: {err}");

                if let Ok(mut device_error) = device_error.lock() {
                    device_error.get_or_insert_with(|| err.to_string());
                }
            }
        }));

        let shaders = Shaders::new(device, shaders_dir.as_ref())?;
        let noise = Noise::new(device);
        let scene = SceneBuffers::new(device, &Scene::default());
        let environment = Environment::default();
        let light = gpu::Light::default();
        let env_map = environment.create_map(device, queue);

        let world = MappedUniformBuffer::new(
            device,
            "world",
            environment.serialize(&light),
        );

        info!("Engine initialized");

        Ok(Self {
            shaders,
            noise,
            scene,
            environment,
            env_map,
            world,
            light,
            renderers: Default::default(),
            device_error,
        })
    }

    /// Uploads a new scene; all renderers pick it up on their next frame.
    pub fn set_scene(&mut self, device: &wgpu::Device, scene: &Scene) {
        self.scene = SceneBuffers::new(device, scene);
        self.emit(device, Event::SceneChanged);
    }

    pub fn scene_id(&self) -> u64 {
        self.scene.id
    }

    pub fn set_light(&mut self, device: &wgpu::Device, light: gpu::Light) {
        if light == self.light {
            return;
        }

        self.light = light;

        // Procedural sky's sun follows the light
        *self.world = self.environment.serialize(&self.light);

        self.emit(device, Event::LightChanged);
    }

    pub fn light(&self) -> gpu::Light {
        self.light
    }

    pub fn set_environment(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        environment: Environment,
    ) {
        if environment == self.environment {
            return;
        }

        self.env_map = environment.create_map(device, queue);
        *self.world = environment.serialize(&self.light);
        self.environment = environment;
        self.emit(device, Event::EnvironmentChanged);
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn create_renderer(
        &mut self,
        device: &wgpu::Device,
        camera: Camera,
        config: Config,
    ) -> RendererHandle {
        let renderer = Renderer::new(self, device, camera, config);

        self.renderers.add(renderer)
    }

    pub fn renderer(&self, handle: RendererHandle) -> &Renderer {
        self.renderers.get(handle)
    }

    /// Updates renderer's camera; resizing it reallocates its images.
    pub fn update_renderer(
        &mut self,
        device: &wgpu::Device,
        handle: RendererHandle,
        camera: Camera,
    ) {
        self.with_renderer(handle, |engine, renderer| {
            renderer.update(engine, device, camera);
        });
    }

    /// Changes renderer's configuration; out-of-range values get clamped.
    pub fn configure_renderer(
        &mut self,
        device: &wgpu::Device,
        handle: RendererHandle,
        config: Config,
    ) {
        self.with_renderer(handle, |engine, renderer| {
            renderer.configure(engine, device, config);
        });
    }

    /// Records renderer's frame into `encoder`; once submitted, the image is
    /// available through [`Renderer::output()`].
    ///
    /// [`Self::flush()`] has to be called before submitting the commands.
    pub fn render_renderer(
        &mut self,
        handle: RendererHandle,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        self.with_renderer(handle, |engine, renderer| {
            renderer.render(engine, encoder);
        });
    }

    pub fn delete_renderer(&mut self, handle: RendererHandle) {
        self.renderers.remove(handle);
    }

    /// Sends all pending uniform changes to the GPU.
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        self.world.flush(queue);

        for renderer in self.renderers.iter_mut() {
            renderer.flush(self.light, queue);
        }
    }

    /// Returns an error if the device has reported a failure since the
    /// engine was created; such device is unusable.
    pub fn check_device(&self) -> Result<()> {
        let device_error = self
            .device_error
            .lock()
            .map_err(|_| Error::DeviceLost("poisoned error slot".into()))?;

        match &*device_error {
            Some(err) => Err(Error::DeviceLost(err.clone())),
            None => Ok(()),
        }
    }

    fn with_renderer(
        &mut self,
        handle: RendererHandle,
        f: impl FnOnce(&Self, &mut Renderer),
    ) {
        let mut renderers = mem::take(&mut self.renderers);

        f(self, renderers.get_mut(handle));

        self.renderers = renderers;
    }

    fn emit(&mut self, device: &wgpu::Device, event: Event) {
        let mut renderers = mem::take(&mut self.renderers);

        for renderer in renderers.iter_mut() {
            renderer.handle(EventHandlerContext {
                engine: self,
                device,
                event,
            });
        }

        self.renderers = renderers;
    }
}
