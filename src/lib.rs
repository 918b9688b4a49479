use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, WebGl2RenderingContext};

pub mod config;
pub mod error;
pub mod interaction;
pub mod math;
pub mod mesh;
pub mod morph;
pub mod particles;
pub mod render;
pub mod scene;
pub mod ui;

#[cfg(target_arch = "wasm32")]
mod app;

#[cfg(target_arch = "wasm32")]
pub use app::start_app;

use config::SceneConfig;
use error::Error;
use morph::MorphMode;
use particles::DecorationKind;
use render::pipeline::BatchKey;
use render::RenderPipeline;
use scene::Scene;

/// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    console_log::init_with_level(log::Level::Info).ok();
}

/// Main engine state exposed to JavaScript
#[wasm_bindgen]
pub struct SignatureTree {
    pipeline: RenderPipeline,
    scene: Scene,
}

#[wasm_bindgen]
impl SignatureTree {
    /// Create an engine with the stock scene
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement) -> Result<SignatureTree, JsValue> {
        Ok(Self::build(canvas, SceneConfig::default())?)
    }

    /// Create an engine from a YAML scene description
    #[wasm_bindgen]
    pub fn new_with_config(canvas: HtmlCanvasElement, yaml: &str) -> Result<SignatureTree, JsValue> {
        let config = SceneConfig::from_yaml(yaml)?;
        Ok(Self::build(canvas, config)?)
    }

    /// Update and render a frame
    #[wasm_bindgen]
    pub fn render(&mut self, dt: f32) {
        if !self.pipeline.instances_ready() {
            if let Err(e) = self.pipeline.prepare_instances() {
                log::error!("instance buffers unavailable: {}", e);
            }
        }

        let ready = self.pipeline.instances_ready();
        if self.scene.step(dt, ready) {
            self.pipeline
                .update_instances(BatchKey::Particles, self.scene.particle_scratch());
            for kind in DecorationKind::ALL {
                self.pipeline
                    .update_instances(BatchKey::Decorations(kind), self.scene.decoration_scratch().batch(kind));
            }
        }
        self.pipeline
            .update_points(self.scene.stars().point_data(), self.scene.sparkles().point_data());

        self.pipeline.render(&self.scene.render_frame());
    }

    /// Resize the canvas
    #[wasm_bindgen]
    pub fn resize(&mut self, width: i32, height: i32) -> Result<(), JsValue> {
        self.scene.camera_mut().resize(width as f32, height as f32);
        Ok(self.pipeline.resize(width, height)?)
    }

    /// The "SCATTER" action
    #[wasm_bindgen]
    pub fn scatter(&mut self) {
        self.scene.controller_mut().scatter();
    }

    /// The "ASSEMBLE" action
    #[wasm_bindgen]
    pub fn assemble(&mut self) {
        self.scene.controller_mut().assemble();
    }

    #[wasm_bindgen]
    pub fn set_tree_shape(&mut self, tree: bool) {
        let mode = if tree { MorphMode::TreeShape } else { MorphMode::Scattered };
        self.scene.controller_mut().set_mode(mode);
    }

    #[wasm_bindgen]
    pub fn is_tree_shape(&self) -> bool {
        self.scene.mode().is_tree()
    }

    /// Toggle between the two modes, returning whether the tree is now assembled
    #[wasm_bindgen]
    pub fn toggle(&mut self) -> bool {
        self.scene.controller_mut().toggle().is_tree()
    }

    /// Orbit camera by a pointer drag in pixels
    #[wasm_bindgen]
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) {
        self.scene.camera_mut().orbit(delta_x, delta_y);
    }

    /// Zoom camera by a wheel delta
    #[wasm_bindgen]
    pub fn zoom(&mut self, delta: f32) {
        self.scene.camera_mut().zoom(delta);
    }

    /// Change the needle count; rerolls the set only if it differs
    #[wasm_bindgen]
    pub fn set_particle_count(&mut self, count: usize) {
        self.scene.set_particle_count(count);
    }

    #[wasm_bindgen]
    pub fn particle_count(&self) -> usize {
        self.scene.particle_count()
    }

    /// Change the decoration count; rerolls the set only if it differs
    #[wasm_bindgen]
    pub fn set_decoration_count(&mut self, count: usize) {
        self.scene.set_decoration_count(count);
    }

    #[wasm_bindgen]
    pub fn decoration_count(&self) -> usize {
        self.scene.decoration_count()
    }
}

impl SignatureTree {
    fn build(canvas: HtmlCanvasElement, config: SceneConfig) -> Result<Self, Error> {
        let width = canvas.width() as i32;
        let height = canvas.height() as i32;

        let gl = canvas
            .get_context("webgl2")
            .map_err(|e| Error::WebGl(format!("{:?}", e)))?
            .ok_or_else(|| Error::WebGl("Failed to get WebGL2 context".to_string()))?
            .dyn_into::<WebGl2RenderingContext>()
            .map_err(|_| Error::WebGl("context is not WebGL2".to_string()))?;

        let seed = config
            .seed
            .unwrap_or_else(|| (js_sys::Math::random() * u64::MAX as f64) as u64);

        let pipeline = RenderPipeline::new(gl, width, height, &config)?;
        let scene = Scene::new(&config, seed, width as f32, height as f32)?;

        Ok(Self { pipeline, scene })
    }

    pub fn mode(&self) -> MorphMode {
        self.scene.mode()
    }

    pub fn set_mode(&mut self, mode: MorphMode) {
        self.scene.controller_mut().set_mode(mode);
    }
}
