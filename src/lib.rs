//! Ambient page backgrounds: a scroll-reactive particle field and a
//! wireframe orbit.
//!
//! The engines are target independent and run against the traits in
//! [`frame`], [`host`], [`surface`] and [`orbit`]. The browser bindings
//! live in the wasm-only `wasm` module; [`headless`] drives the same
//! engines without a browser.

pub mod camera;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod headless;
pub mod host;
pub mod orbit;
pub mod particles;
pub mod scroll;
pub mod surface;

pub use config::{MountOptions, OrbitConfig, ParticleConfig, ScrollBinding};
pub use error::{ConfigError, MountError};
pub use orbit::{OrbitEngine, OrbitScene, SceneRenderer};
pub use particles::{ParticleEngine, ParticleField};
pub use scroll::{ScrollSignal, ScrollTracker};

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlCanvasElement};

    use crate::config::MountOptions;
    use crate::error::MountError;
    use crate::frame::FrameSource;
    use crate::orbit::OrbitEngine;
    use crate::particles::ParticleEngine;
    use crate::scroll::{ScrollSignal, ScrollTracker};

    mod canvas;
    mod frames;
    mod render;
    mod viewport;

    use canvas::CanvasSurface;
    use frames::RafFrameSource;
    use render::GlRenderer;
    use viewport::WindowViewport;

    thread_local! {
        static MOUNTED: RefCell<Option<Background>> = const { RefCell::new(None) };
    }

    /// Both engines and the scroll tracker feeding them. Dropping it stops
    /// the engines before the tracker lets go of its scroll listener.
    pub struct Background {
        particles: Option<ParticleEngine<CanvasSurface>>,
        orbit: Option<OrbitEngine<GlRenderer>>,
        tracker: ScrollTracker,
    }

    impl Background {
        /// Mount whatever can be mounted. Engines whose element or context
        /// is unavailable are left out.
        pub fn mount(options: &MountOptions) -> Result<Self, MountError> {
            let window = web_sys::window()
                .ok_or_else(|| MountError::SurfaceUnavailable("no window".into()))?;
            let document = window
                .document()
                .ok_or_else(|| MountError::SurfaceUnavailable("no document".into()))?;

            let viewport = WindowViewport::new(window.clone());
            let frames: Rc<dyn FrameSource> = Rc::new(RafFrameSource::new(window));
            let tracker = ScrollTracker::attach(&viewport)?;
            let seed = options.seed.unwrap_or_else(random_seed);
            let mut rng = SmallRng::seed_from_u64(seed);

            let particles = mount_particles(
                &document,
                options,
                tracker.signal(),
                &viewport,
                frames.clone(),
                &mut rng,
            )
            .map_err(|err| log::info!("particle field disabled: {err}"))
            .ok();
            let orbit = mount_orbit(&document, options, tracker.signal(), &viewport, frames, &mut rng)
                .map_err(|err| log::info!("wireframe orbit disabled: {err}"))
                .ok();

            Ok(Self {
                particles,
                orbit,
                tracker,
            })
        }

        pub fn has_particles(&self) -> bool {
            self.particles.is_some()
        }

        pub fn has_orbit(&self) -> bool {
            self.orbit.is_some()
        }
    }

    fn random_seed() -> u64 {
        (js_sys::Math::random() * 2f64.powi(53)) as u64
    }

    fn element_by_id(document: &Document, id: &str) -> Result<Element, MountError> {
        document
            .get_element_by_id(id)
            .ok_or_else(|| MountError::ElementMissing(id.to_owned()))
    }

    fn mount_particles(
        document: &Document,
        options: &MountOptions,
        scroll: ScrollSignal,
        viewport: &WindowViewport,
        frames: Rc<dyn FrameSource>,
        rng: &mut SmallRng,
    ) -> Result<ParticleEngine<CanvasSurface>, MountError> {
        let id = &options.particle_canvas_id;
        let canvas = element_by_id(document, id)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| MountError::SurfaceUnavailable(format!("#{id} is not a canvas")))?;

        let mut config = options.particles.clone();
        if let Some(count) = canvas
            .get_attribute("data-particle-count")
            .and_then(|value| value.trim().parse().ok())
        {
            config.count = count;
        }

        let surface = CanvasSurface::acquire(canvas)?;
        ParticleEngine::start(surface, config, scroll, viewport, frames, rng)
    }

    fn mount_orbit(
        document: &Document,
        options: &MountOptions,
        scroll: ScrollSignal,
        viewport: &WindowViewport,
        frames: Rc<dyn FrameSource>,
        rng: &mut SmallRng,
    ) -> Result<OrbitEngine<GlRenderer>, MountError> {
        let container = element_by_id(document, &options.orbit_container_id)?;
        let renderer = GlRenderer::attach(document, &container)?;
        OrbitEngine::start(renderer, options.orbit.clone(), scroll, viewport, frames, rng)
    }

    fn install(options: &MountOptions) -> Result<(), JsValue> {
        // Tear down any earlier mount before touching the elements again.
        MOUNTED.with(|slot| slot.borrow_mut().take());
        let background = Background::mount(options).map_err(|err| JsValue::from_str(&err.to_string()))?;
        log::info!(
            "background mounted (particles: {}, orbit: {})",
            background.has_particles(),
            background.has_orbit()
        );
        MOUNTED.with(|slot| *slot.borrow_mut() = Some(background));
        Ok(())
    }

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();

        if let Err(err) = install(&MountOptions::default()) {
            log::info!("ambient background not mounted: {err:?}");
        }
        Ok(())
    }

    /// Mount on the canvas and container with the given ids, replacing any
    /// earlier mount.
    #[wasm_bindgen]
    pub fn mount(canvas_id: &str, container_id: &str) -> Result<(), JsValue> {
        install(&MountOptions {
            particle_canvas_id: canvas_id.to_owned(),
            orbit_container_id: container_id.to_owned(),
            ..MountOptions::default()
        })
    }

    /// Stop both engines and release every listener, frame and surface.
    #[wasm_bindgen]
    pub fn unmount() {
        if MOUNTED.with(|slot| slot.borrow_mut().take()).is_some() {
            log::info!("background unmounted");
        }
    }

    /// `[particles, orbit]` liveness of the current mount.
    #[wasm_bindgen]
    pub fn mounted_engines() -> Vec<u8> {
        MOUNTED.with(|slot| match slot.borrow().as_ref() {
            Some(bg) => vec![bg.has_particles() as u8, bg.has_orbit() as u8],
            None => Vec::new(),
        })
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::{mount, mounted_engines, unmount, Background};
