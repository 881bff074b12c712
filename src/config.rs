//! Tunables for both engines and for the browser mount.
//!
//! Defaults reproduce the portfolio background; every value can be
//! overridden before `start` and is checked by `validate`.

use crate::error::ConfigError;
use crate::surface::Rgba;

pub const DEFAULT_PARTICLE_CANVAS_ID: &str = "ambient-particles";
pub const DEFAULT_ORBIT_CONTAINER_ID: &str = "ambient-orbit";

#[derive(Debug, Clone, PartialEq)]
pub struct ParticleConfig {
    pub count: usize,
    /// Disc radius, sampled uniformly from `[min, max)`.
    pub radius: (f64, f64),
    /// Per-axis velocity is sampled from `[-max_speed, max_speed)`.
    pub max_speed: f64,
    pub alpha: f64,
    /// Pairs closer than this are linked.
    pub link_distance: f64,
    /// Alpha is the link opacity at zero distance; it fades linearly to 0
    /// at `link_distance`.
    pub link_color: Rgba,
    pub link_width: f64,
    /// Scroll offset to influence factor.
    pub scroll_coefficient: f64,
    /// Scale of the x-proportional drift the influence adds each frame.
    pub scroll_drift: f64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 100,
            radius: (0.1, 0.2),
            max_speed: 0.1,
            alpha: 0.2,
            link_distance: 80.0,
            link_color: Rgba::new(100, 50, 255, 0.1),
            link_width: 0.3,
            scroll_coefficient: 1e-6,
            scroll_drift: 0.01,
        }
    }
}

impl ParticleConfig {
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::NoParticles);
        }
        range("radius", self.radius)?;
        positive("max_speed", self.max_speed)?;
        positive("link_distance", self.link_distance)?;
        positive("link_width", self.link_width)?;
        Ok(())
    }
}

/// Which scene objects have their x/y rotation driven by scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollBinding {
    pub mesh: bool,
    pub cloud: bool,
}

impl Default for ScrollBinding {
    fn default() -> Self {
        Self {
            mesh: true,
            cloud: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitConfig {
    pub mesh_radius: f32,
    /// Icosahedron subdivision level; 0 is the plain 20-face solid.
    pub mesh_detail: u32,
    pub mesh_color: Rgba,
    pub point_count: usize,
    /// Points lie at `mesh_radius + [0, shell_thickness)` from the origin.
    pub shell_thickness: f32,
    pub point_color: Rgba,
    /// World-space point size, attenuated with depth.
    pub point_size: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub camera_distance: f32,
    /// Per-frame (x, y) rotation increments.
    pub mesh_spin: (f32, f32),
    pub cloud_spin: (f32, f32),
    pub scroll_coefficient: f32,
    pub scroll_binding: ScrollBinding,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            mesh_radius: 10.0,
            mesh_detail: 1,
            mesh_color: Rgba::from_hex(0x8A2BE2, 0.2),
            point_count: 1000,
            shell_thickness: 5.0,
            point_color: Rgba::from_hex(0xAA88FF, 0.6),
            point_size: 0.05,
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            camera_distance: 20.0,
            mesh_spin: (0.001, 0.002),
            cloud_spin: (0.0005, 0.001),
            scroll_coefficient: 0.0005,
            scroll_binding: ScrollBinding::default(),
        }
    }
}

impl OrbitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.point_count == 0 {
            return Err(ConfigError::NoPoints);
        }
        positive("mesh_radius", self.mesh_radius as f64)?;
        positive("shell_thickness", self.shell_thickness as f64)?;
        positive("point_size", self.point_size as f64)?;
        positive("fov", self.fov as f64)?;
        range("clip planes", (self.near as f64, self.far as f64))?;
        positive("near", self.near as f64)?;
        Ok(())
    }
}

/// Where the browser mount finds its two attachment points.
#[derive(Debug, Clone, PartialEq)]
pub struct MountOptions {
    pub particle_canvas_id: String,
    pub orbit_container_id: String,
    pub particles: ParticleConfig,
    pub orbit: OrbitConfig,
    /// Fixed RNG seed; random when `None`.
    pub seed: Option<u64>,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            particle_canvas_id: DEFAULT_PARTICLE_CANVAS_ID.to_owned(),
            orbit_container_id: DEFAULT_ORBIT_CONTAINER_ID.to_owned(),
            particles: ParticleConfig::default(),
            orbit: OrbitConfig::default(),
            seed: None,
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

fn range(name: &'static str, (min, max): (f64, f64)) -> Result<(), ConfigError> {
    if min.is_finite() && max.is_finite() && min < max {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange { name, min, max })
    }
}
