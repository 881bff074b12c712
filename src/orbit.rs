//! 3D background: a wireframe icosphere inside a shell of points, spun a
//! little every frame and tilted by page scroll.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{EulerRot, Mat4, Vec3};
use rand::Rng;

use crate::camera::PerspectiveCamera;
use crate::config::{OrbitConfig, ScrollBinding};
use crate::error::MountError;
use crate::frame::{AnimationLoop, FrameSource};
use crate::geometry::{sample_shell, Polyhedron};
use crate::host::{Subscription, Viewport};
use crate::scroll::ScrollSignal;
use crate::surface::Rgba;

/// Euler angles in XYZ order.
fn rotation_matrix(rotation: Vec3) -> Mat4 {
    Mat4::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z)
}

#[derive(Debug, Clone)]
pub struct Wireframe {
    pub geometry: Polyhedron,
    pub color: Rgba,
    pub rotation: Vec3,
}

impl Wireframe {
    pub fn model_matrix(&self) -> Mat4 {
        rotation_matrix(self.rotation)
    }
}

#[derive(Debug, Clone)]
pub struct PointCloud {
    pub points: Vec<Vec3>,
    pub color: Rgba,
    pub size: f32,
    pub rotation: Vec3,
}

impl PointCloud {
    pub fn model_matrix(&self) -> Mat4 {
        rotation_matrix(self.rotation)
    }

    pub fn positions(&self) -> Vec<f32> {
        self.points.iter().flat_map(|p| p.to_array()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct OrbitScene {
    pub mesh: Wireframe,
    pub cloud: PointCloud,
    mesh_spin: (f32, f32),
    cloud_spin: (f32, f32),
    scroll_coefficient: f32,
    binding: ScrollBinding,
}

impl OrbitScene {
    pub fn new(config: &OrbitConfig, rng: &mut impl Rng) -> Self {
        Self {
            mesh: Wireframe {
                geometry: Polyhedron::icosahedron(config.mesh_radius, config.mesh_detail),
                color: config.mesh_color,
                rotation: Vec3::ZERO,
            },
            cloud: PointCloud {
                points: sample_shell(
                    config.point_count,
                    config.mesh_radius,
                    config.shell_thickness,
                    rng,
                ),
                color: config.point_color,
                size: config.point_size,
                rotation: Vec3::ZERO,
            },
            mesh_spin: config.mesh_spin,
            cloud_spin: config.cloud_spin,
            scroll_coefficient: config.scroll_coefficient,
            binding: config.scroll_binding,
        }
    }

    /// Per-frame rotation update.
    ///
    /// Both objects spin by their fixed increments, then every bound object
    /// has its x/y rotation replaced outright by the scroll-driven angle.
    /// On the bound axes the increment therefore never shows.
    pub fn advance(&mut self, scroll_offset: f64) {
        self.mesh.rotation.x += self.mesh_spin.0;
        self.mesh.rotation.y += self.mesh_spin.1;
        self.cloud.rotation.x += self.cloud_spin.0;
        self.cloud.rotation.y += self.cloud_spin.1;

        let factor = scroll_offset as f32 * self.scroll_coefficient;
        if self.binding.mesh {
            self.mesh.rotation.x = factor;
            self.mesh.rotation.y = factor * 0.5;
        }
        if self.binding.cloud {
            self.cloud.rotation.x = factor;
            self.cloud.rotation.y = factor * 0.5;
        }
    }
}

/// Rasterizes an [`OrbitScene`] onto an output surface.
pub trait SceneRenderer {
    /// Resize the output to `width` x `height` pixels.
    fn set_size(&mut self, width: u32, height: u32);

    fn render(&mut self, scene: &OrbitScene, camera: &PerspectiveCamera);

    /// Free GPU resources and detach the output.
    fn dispose(&mut self) {}
}

struct Stage<R> {
    scene: OrbitScene,
    camera: PerspectiveCamera,
    renderer: R,
}

/// An [`OrbitScene`] bound to a renderer, a frame loop and the viewport.
pub struct OrbitEngine<R: SceneRenderer + 'static> {
    stage: Rc<RefCell<Option<Stage<R>>>>,
    animation: Option<AnimationLoop>,
    resize: Option<Subscription>,
}

impl<R: SceneRenderer + 'static> OrbitEngine<R> {
    pub fn start(
        mut renderer: R,
        config: OrbitConfig,
        scroll: ScrollSignal,
        viewport: &dyn Viewport,
        frames: Rc<dyn FrameSource>,
        rng: &mut impl Rng,
    ) -> Result<Self, MountError> {
        // The renderer is already attached to the page, so it is released on every failure.
        if let Err(err) = config.validate() {
            renderer.dispose();
            return Err(err.into());
        }

        let (width, height) = viewport.inner_size();
        renderer.set_size(width, height);
        let mut camera =
            PerspectiveCamera::for_viewport(config.fov, width, height, config.near, config.far);
        camera.set_position(Vec3::new(0.0, 0.0, config.camera_distance));
        let scene = OrbitScene::new(&config, rng);
        let edges = scene.mesh.geometry.edges.len();
        let stage = Rc::new(RefCell::new(Some(Stage {
            scene,
            camera,
            renderer,
        })));

        let resize = {
            let stage = Rc::downgrade(&stage);
            viewport.on_resize(Box::new(move |width, height| {
                let Some(stage) = stage.upgrade() else {
                    return;
                };
                if let Some(stage) = stage.borrow_mut().as_mut() {
                    stage.camera.set_viewport(width, height);
                    stage.camera.update_projection_matrix();
                    stage.renderer.set_size(width, height);
                };
            }))
        };
        // A refused listener must not leak the renderer output.
        let resize = match resize {
            Ok(resize) => resize,
            Err(err) => {
                if let Some(mut stage) = stage.borrow_mut().take() {
                    stage.renderer.dispose();
                }
                return Err(err);
            }
        };

        let animation = {
            let stage = stage.clone();
            AnimationLoop::start(frames, move || {
                if let Some(Stage {
                    scene,
                    camera,
                    renderer,
                }) = stage.borrow_mut().as_mut()
                {
                    scene.advance(scroll.get());
                    renderer.render(scene, camera);
                }
            })
        };

        log::debug!(
            "wireframe orbit started: {edges} edges, {} points on {width}x{height}",
            config.point_count
        );
        Ok(Self {
            stage,
            animation: Some(animation),
            resize: Some(resize),
        })
    }

    pub fn is_running(&self) -> bool {
        self.animation.as_ref().is_some_and(AnimationLoop::is_running)
    }

    pub fn with_scene<T>(&self, f: impl FnOnce(&OrbitScene, &PerspectiveCamera) -> T) -> Option<T> {
        self.stage
            .borrow()
            .as_ref()
            .map(|stage| f(&stage.scene, &stage.camera))
    }

    /// Cancel the loop, drop the resize listener, clear the scene and
    /// dispose the renderer.
    pub fn stop(&mut self) {
        if let Some(animation) = self.animation.take() {
            animation.stop();
        }
        if let Some(resize) = self.resize.take() {
            resize.cancel();
        }
        if let Some(mut stage) = self.stage.borrow_mut().take() {
            stage.renderer.dispose();
            log::debug!("wireframe orbit stopped");
        }
    }
}

impl<R: SceneRenderer + 'static> Drop for OrbitEngine<R> {
    fn drop(&mut self) {
        self.stop();
    }
}
