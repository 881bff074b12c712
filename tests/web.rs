#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

fn add_element(tag: &str, id: &str) -> web_sys::Element {
    let document = document();
    if let Some(old) = document.get_element_by_id(id) {
        old.remove();
    }
    let el = document.create_element(tag).unwrap();
    el.set_id(id);
    document.body().unwrap().append_child(&el).unwrap();
    el
}

#[wasm_bindgen_test]
fn particle_canvas_sized_to_window() {
    let canvas = add_element("canvas", "test-particles")
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .unwrap();
    add_element("div", "test-orbit");

    ambient_wasm::mount("test-particles", "test-orbit").unwrap();
    assert_eq!(ambient_wasm::mounted_engines()[0], 1);

    let window = web_sys::window().unwrap();
    let width = window.inner_width().unwrap().as_f64().unwrap() as u32;
    let height = window.inner_height().unwrap().as_f64().unwrap() as u32;
    assert_eq!((canvas.width(), canvas.height()), (width, height));

    ambient_wasm::unmount();
    assert!(ambient_wasm::mounted_engines().is_empty());
}

#[wasm_bindgen_test]
fn orbit_canvas_replaces_container_contents() {
    add_element("canvas", "test-particles-2");
    let container = add_element("div", "test-orbit-2");
    container.set_inner_html("<span>stale</span>");

    ambient_wasm::mount("test-particles-2", "test-orbit-2").unwrap();
    if ambient_wasm::mounted_engines()[1] == 1 {
        assert_eq!(container.child_element_count(), 1);
        assert_eq!(
            container.first_element_child().unwrap().tag_name().to_lowercase(),
            "canvas"
        );
    }

    ambient_wasm::unmount();
    if container.child_element_count() > 0 {
        // WebGL2 was unavailable, so the container was never touched.
        assert_eq!(container.first_element_child().unwrap().tag_name().to_lowercase(), "span");
    }
}

#[wasm_bindgen_test]
fn missing_elements_are_not_fatal() {
    ambient_wasm::mount("no-such-canvas", "no-such-container").unwrap();
    assert_eq!(ambient_wasm::mounted_engines(), vec![0, 0]);
    ambient_wasm::unmount();
}

#[wasm_bindgen_test]
fn orbit_context_tests_depth() {
    add_element("canvas", "test-particles-3");
    let container = add_element("div", "test-orbit-3");

    ambient_wasm::mount("test-particles-3", "test-orbit-3").unwrap();
    if ambient_wasm::mounted_engines()[1] == 1 {
        let canvas = container
            .first_element_child()
            .unwrap()
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .unwrap();
        let gl = canvas
            .get_context("webgl2")
            .unwrap()
            .unwrap()
            .dyn_into::<web_sys::WebGl2RenderingContext>()
            .unwrap();
        assert!(gl.is_enabled(web_sys::WebGl2RenderingContext::DEPTH_TEST));
    }
    ambient_wasm::unmount();
}
