use ambient_wasm::config::{OrbitConfig, ParticleConfig};
use ambient_wasm::headless::{DisplayList, HeadlessViewport, ManualFrames, SceneRecorder};
use ambient_wasm::orbit::OrbitEngine;
use ambient_wasm::particles::ParticleEngine;
use ambient_wasm::scroll::ScrollTracker;
use rand::rngs::SmallRng;
use rand::SeedableRng;

struct Page {
    viewport: HeadlessViewport,
    frames: ManualFrames,
    tracker: ScrollTracker,
    list: DisplayList,
    recorder: SceneRecorder,
    particles: ParticleEngine<DisplayList>,
    orbit: OrbitEngine<SceneRecorder>,
}

fn mount() -> Page {
    let viewport = HeadlessViewport::new(800, 600);
    let frames = ManualFrames::new();
    let tracker = ScrollTracker::attach(&viewport).unwrap();
    let list = DisplayList::default();
    let recorder = SceneRecorder::new();
    let mut rng = SmallRng::seed_from_u64(12);

    let particles = ParticleEngine::start(
        list.clone(),
        ParticleConfig::default(),
        tracker.signal(),
        &viewport,
        frames.source(),
        &mut rng,
    )
    .unwrap();
    let orbit = OrbitEngine::start(
        recorder.clone(),
        OrbitConfig::default(),
        tracker.signal(),
        &viewport,
        frames.source(),
        &mut rng,
    )
    .unwrap();

    Page {
        viewport,
        frames,
        tracker,
        list,
        recorder,
        particles,
        orbit,
    }
}

#[test]
fn both_engines_share_one_frame_source() {
    let page = mount();
    assert_eq!(page.frames.pending(), 2);
    assert_eq!(page.frames.tick(), 2);
    assert_eq!(page.frames.pending(), 2);
    assert_eq!(page.recorder.frames().len(), 1);
    assert!(page.list.draw_calls() >= 100);
    assert!(page.particles.is_running() && page.orbit.is_running());
}

#[test]
fn one_scroll_listener_one_resize_listener_per_engine() {
    let page = mount();
    assert_eq!(page.viewport.scroll_listeners(), 1);
    assert_eq!(page.viewport.resize_listeners(), 2);
}

#[test]
fn both_engines_read_the_same_scroll() {
    let page = mount();
    page.viewport.scroll_to(1200.0);
    assert_eq!(page.tracker.signal().get(), 1200.0);
    page.frames.tick();
    assert_eq!(page.recorder.last_frame().unwrap().mesh_rotation.x, 1200.0 * 0.0005);
}

#[test]
fn stopped_particles_never_draw_again() {
    let mut page = mount();
    page.frames.tick();
    page.particles.stop();
    page.list.reset();

    page.frames.advance(20);
    page.viewport.resize(640, 480);
    assert_eq!(page.list.draw_calls(), 0);
    assert!(page.list.commands().is_empty());
    assert!(!page.particles.is_running());
    assert_eq!(page.particles.with_field(|f| f.len()), None);
    assert_eq!(page.list.handles(), 1);

    // The other engine is unaffected.
    assert_eq!(page.recorder.frames().len(), 21);
}

#[test]
fn stopped_orbit_never_renders_again() {
    let mut page = mount();
    page.frames.tick();
    page.orbit.stop();

    page.frames.advance(20);
    page.viewport.resize(640, 480);
    assert_eq!(page.recorder.frames().len(), 1);
    assert_eq!(page.recorder.size(), (800, 600));
    assert!(page.recorder.is_disposed());
    assert!(page.orbit.with_scene(|_, _| ()).is_none());
}

#[test]
fn stop_releases_resize_listeners() {
    let mut page = mount();
    page.particles.stop();
    assert_eq!(page.viewport.resize_listeners(), 1);
    page.orbit.stop();
    assert_eq!(page.viewport.resize_listeners(), 0);
    assert_eq!(page.frames.pending(), 0);

    // Stopping twice is harmless.
    page.particles.stop();
    page.orbit.stop();
}

#[test]
fn dropping_the_page_releases_everything() {
    let page = mount();
    let viewport = page.viewport.clone();
    let frames = page.frames.clone();
    let list = page.list.clone();
    let recorder = page.recorder.clone();
    drop(page);

    assert_eq!(viewport.scroll_listeners(), 0);
    assert_eq!(viewport.resize_listeners(), 0);
    assert_eq!(frames.pending(), 0);
    assert_eq!(frames.tick(), 0);
    assert_eq!(list.handles(), 1);
    assert!(recorder.is_disposed());
}
