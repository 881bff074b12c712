//! 2D particle field: drifting discs on a torus, linked when close.

use std::cell::RefCell;
use std::rc::Rc;

use rand::Rng;

use crate::config::ParticleConfig;
use crate::error::MountError;
use crate::frame::{AnimationLoop, FrameSource};
use crate::host::{Subscription, Viewport};
use crate::scroll::ScrollSignal;
use crate::surface::{DrawSurface, Rgba};

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: Rgba,
    pub dx: f64,
    pub dy: f64,
}

impl Particle {
    fn random(rng: &mut impl Rng, width: f64, height: f64, config: &ParticleConfig) -> Self {
        let (min_radius, max_radius) = config.radius;
        let speed = config.max_speed;
        Self {
            x: rng.gen::<f64>() * width,
            y: rng.gen::<f64>() * height,
            radius: rng.gen_range(min_radius..max_radius),
            color: Rgba::new(
                rng.gen_range(100..200),
                rng.gen_range(0..100),
                rng.gen_range(0..255),
                config.alpha,
            ),
            dx: rng.gen_range(-speed..speed),
            dy: rng.gen_range(-speed..speed),
        }
    }
}

/// Opacity of the link between two particles `distance` apart, or `None`
/// when they are too far apart to be linked.
pub fn link_alpha(distance: f64, threshold: f64, max_alpha: f64) -> Option<f64> {
    (distance < threshold).then(|| max_alpha * (1.0 - distance / threshold))
}

/// Toroidal wrap onto `[0, extent]`.
fn wrap(value: f64, extent: f64) -> f64 {
    if value < 0.0 {
        extent
    } else if value > extent {
        0.0
    } else {
        value
    }
}

pub struct ParticleField {
    particles: Vec<Particle>,
    width: f64,
    height: f64,
    config: ParticleConfig,
}

impl ParticleField {
    pub fn new(config: ParticleConfig, width: u32, height: u32, rng: &mut impl Rng) -> Self {
        let (w, h) = (width as f64, height as f64);
        let particles = (0..config.count)
            .map(|_| Particle::random(rng, w, h, &config))
            .collect();
        Self {
            particles,
            width: w,
            height: h,
            config,
        }
    }

    pub fn from_particles(
        config: ParticleConfig,
        width: u32,
        height: u32,
        particles: Vec<Particle>,
    ) -> Self {
        Self {
            particles,
            width: width as f64,
            height: height as f64,
            config,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// New bounds. Particles stay put; strays wrap on the next step.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width as f64;
        self.height = height as f64;
    }

    /// One frame: clear, draw and move every particle, then link the
    /// close pairs.
    pub fn step(&mut self, scroll_offset: f64, surface: &mut impl DrawSurface) {
        surface.clear();

        let influence = scroll_offset * self.config.scroll_coefficient;
        let drift = self.config.scroll_drift;
        for p in &mut self.particles {
            surface.fill_disc(p.x, p.y, p.radius, p.color);

            p.x += p.dx + influence * p.x * drift;
            p.y += p.dy;
            p.x = wrap(p.x, self.width);
            p.y = wrap(p.y, self.height);
        }

        self.draw_links(surface);
    }

    // O(n^2); fine at the default hundred particles.
    fn draw_links(&self, surface: &mut impl DrawSurface) {
        let threshold = self.config.link_distance;
        let color = self.config.link_color;
        for (i, a) in self.particles.iter().enumerate() {
            for b in &self.particles[i + 1..] {
                let distance = (a.x - b.x).hypot(a.y - b.y);
                if let Some(alpha) = link_alpha(distance, threshold, color.a) {
                    surface.stroke_line(
                        (a.x, a.y),
                        (b.x, b.y),
                        self.config.link_width,
                        color.with_alpha(alpha),
                    );
                }
            }
        }
    }
}

struct Stage<S> {
    field: ParticleField,
    surface: S,
}

/// A [`ParticleField`] bound to a surface, a frame loop and the viewport.
pub struct ParticleEngine<S: DrawSurface + 'static> {
    stage: Rc<RefCell<Option<Stage<S>>>>,
    animation: Option<AnimationLoop>,
    resize: Option<Subscription>,
}

impl<S: DrawSurface + 'static> ParticleEngine<S> {
    /// Size `surface` to the viewport, scatter the particles and start the
    /// frame loop. Nothing is left registered if this fails.
    pub fn start(
        mut surface: S,
        config: ParticleConfig,
        scroll: ScrollSignal,
        viewport: &dyn Viewport,
        frames: Rc<dyn FrameSource>,
        rng: &mut impl Rng,
    ) -> Result<Self, MountError> {
        config.validate()?;

        let (width, height) = viewport.inner_size();
        surface.set_size(width, height);
        let count = config.count;
        let field = ParticleField::new(config, width, height, rng);
        let stage = Rc::new(RefCell::new(Some(Stage { field, surface })));

        let resize = {
            let stage = Rc::downgrade(&stage);
            viewport.on_resize(Box::new(move |width, height| {
                let Some(stage) = stage.upgrade() else {
                    return;
                };
                if let Some(stage) = stage.borrow_mut().as_mut() {
                    stage.surface.set_size(width, height);
                    stage.field.resize(width, height);
                };
            }))?
        };

        let animation = {
            let stage = stage.clone();
            AnimationLoop::start(frames, move || {
                if let Some(Stage { field, surface }) = stage.borrow_mut().as_mut() {
                    field.step(scroll.get(), surface);
                }
            })
        };

        log::debug!("particle field started: {count} particles on {width}x{height}");
        Ok(Self {
            stage,
            animation: Some(animation),
            resize: Some(resize),
        })
    }

    pub fn is_running(&self) -> bool {
        self.animation.as_ref().is_some_and(AnimationLoop::is_running)
    }

    /// Read the field, if the engine still holds it.
    pub fn with_field<R>(&self, f: impl FnOnce(&ParticleField) -> R) -> Option<R> {
        self.stage.borrow().as_ref().map(|stage| f(&stage.field))
    }

    /// Halt the loop, drop the resize listener and release the surface.
    pub fn stop(&mut self) {
        if let Some(animation) = self.animation.take() {
            animation.stop();
        }
        if let Some(resize) = self.resize.take() {
            resize.cancel();
        }
        if self.stage.borrow_mut().take().is_some() {
            log::debug!("particle field stopped");
        }
    }
}

impl<S: DrawSurface + 'static> Drop for ParticleEngine<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{DisplayList, DrawCommand};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn particle(x: f64, y: f64, dx: f64, dy: f64) -> Particle {
        Particle {
            x,
            y,
            radius: 0.15,
            color: Rgba::new(150, 50, 100, 0.2),
            dx,
            dy,
        }
    }

    #[test]
    fn initial_particles_follow_palette() {
        let mut rng = SmallRng::seed_from_u64(7);
        let field = ParticleField::new(ParticleConfig::default(), 800, 600, &mut rng);
        assert_eq!(field.len(), 100);
        for p in field.particles() {
            assert!((0.0..800.0).contains(&p.x) && (0.0..600.0).contains(&p.y));
            assert!((0.1..0.2).contains(&p.radius));
            assert!((100..200).contains(&p.color.r));
            assert!(p.color.g < 100);
            assert!(p.color.b < 255);
            assert_eq!(p.color.a, 0.2);
            assert!((-0.1..0.1).contains(&p.dx) && (-0.1..0.1).contains(&p.dy));
        }
    }

    #[test]
    fn wraps_each_axis_to_opposite_edge() {
        assert_eq!(wrap(-0.01, 800.0), 800.0);
        assert_eq!(wrap(800.01, 800.0), 0.0);
        assert_eq!(wrap(800.0, 800.0), 800.0);
        assert_eq!(wrap(0.0, 800.0), 0.0);
    }

    #[test]
    fn diagonal_exit_wraps_both_axes() {
        let mut field = ParticleField::from_particles(
            ParticleConfig::default(),
            100,
            50,
            vec![particle(0.05, 0.05, -0.1, -0.1), particle(99.95, 49.95, 0.1, 0.1)],
        );
        field.step(0.0, &mut DisplayList::new(100, 50));
        let p = &field.particles()[0];
        assert_eq!((p.x, p.y), (100.0, 50.0));
        let p = &field.particles()[1];
        assert_eq!((p.x, p.y), (0.0, 0.0));
    }

    #[test]
    fn scroll_adds_drift_proportional_to_x() {
        let mut field = ParticleField::from_particles(
            ParticleConfig::default(),
            1000,
            1000,
            vec![particle(500.0, 10.0, 0.0, 0.0), particle(0.0, 10.0, 0.0, 0.0)],
        );
        field.step(1_000_000.0, &mut DisplayList::new(1000, 1000));
        // influence = 1e6 * 1e-6 = 1; drift = 1 * 500 * 0.01
        assert!((field.particles()[0].x - 505.0).abs() < 1e-9);
        assert_eq!(field.particles()[1].x, 0.0);
    }

    #[test]
    fn link_alpha_fades_to_zero_at_threshold() {
        assert_eq!(link_alpha(80.0, 80.0, 0.1), None);
        assert_eq!(link_alpha(120.0, 80.0, 0.1), None);
        assert_eq!(link_alpha(0.0, 80.0, 0.1), Some(0.1));
        let near = link_alpha(10.0, 80.0, 0.1).unwrap();
        let far = link_alpha(70.0, 80.0, 0.1).unwrap();
        assert!(near > far && far > 0.0);
        assert!(link_alpha(79.999_999, 80.0, 0.1).unwrap() < 1e-8);
    }

    #[test]
    fn links_only_close_pairs() {
        let mut field = ParticleField::from_particles(
            ParticleConfig::default(),
            1000,
            1000,
            vec![
                particle(100.0, 100.0, 0.0, 0.0),
                particle(140.0, 100.0, 0.0, 0.0),
                particle(300.0, 100.0, 0.0, 0.0),
            ],
        );
        let list = DisplayList::new(1000, 1000);
        field.step(0.0, &mut list.clone());

        let lines: Vec<_> = list
            .last_frame()
            .into_iter()
            .filter_map(|c| match c {
                DrawCommand::Line { from, to, width, color } => Some((from, to, width, color)),
                _ => None,
            })
            .collect();
        assert_eq!(lines.len(), 1);
        let (from, to, width, color) = lines[0];
        assert_eq!((from, to), ((100.0, 100.0), (140.0, 100.0)));
        assert_eq!(width, 0.3);
        assert_eq!((color.r, color.g, color.b), (100, 50, 255));
        assert!((color.a - 0.05).abs() < 1e-12);
    }

    #[test]
    fn resize_keeps_particles_in_place() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut field = ParticleField::new(ParticleConfig::default(), 800, 600, &mut rng);
        let before: Vec<_> = field.particles().to_vec();
        field.resize(200, 100);
        assert_eq!(field.bounds(), (200.0, 100.0));
        assert_eq!(field.particles(), &before[..]);
    }
}
