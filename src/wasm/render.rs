use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, HtmlCanvasElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram,
    WebGlShader, WebGlUniformLocation, WebGlVertexArrayObject,
};

use crate::camera::PerspectiveCamera;
use crate::error::MountError;
use crate::orbit::{OrbitScene, SceneRenderer};

const VERTEX_SHADER: &str = r#"#version 300 es
uniform mat4 u_model_view;
uniform mat4 u_projection;
uniform float u_point_size;
uniform float u_point_scale;
in vec3 a_position;

void main() {
    vec4 eye = u_model_view * vec4(a_position, 1.0);
    gl_Position = u_projection * eye;
    // world-space size shrinking with depth
    gl_PointSize = max(u_point_size * u_point_scale / -eye.z, 1.0);
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;
uniform vec4 u_color;
out vec4 out_color;

void main() {
    out_color = u_color;
}
"#;

const POSITION: u32 = 0;

fn unavailable(what: impl std::fmt::Display) -> MountError {
    MountError::RendererUnavailable(what.to_string())
}

fn compile(gl: &GL, kind: u32, source: &str) -> Result<WebGlShader, MountError> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| unavailable("cannot create shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);
    if gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(unavailable(format!("shader compile failed: {log}")))
    }
}

fn link(gl: &GL) -> Result<WebGlProgram, MountError> {
    let vertex = compile(gl, GL::VERTEX_SHADER, VERTEX_SHADER)?;
    let fragment = compile(gl, GL::FRAGMENT_SHADER, FRAGMENT_SHADER)?;
    let program = gl
        .create_program()
        .ok_or_else(|| unavailable("cannot create program"))?;
    gl.attach_shader(&program, &vertex);
    gl.attach_shader(&program, &fragment);
    gl.bind_attrib_location(&program, POSITION, "a_position");
    gl.link_program(&program);
    gl.delete_shader(Some(&vertex));
    gl.delete_shader(Some(&fragment));

    if gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(program)
    } else {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        Err(unavailable(format!("program link failed: {log}")))
    }
}

struct Uniforms {
    model_view: Option<WebGlUniformLocation>,
    projection: Option<WebGlUniformLocation>,
    color: Option<WebGlUniformLocation>,
    point_size: Option<WebGlUniformLocation>,
    point_scale: Option<WebGlUniformLocation>,
}

impl Uniforms {
    fn locate(gl: &GL, program: &WebGlProgram) -> Self {
        Self {
            model_view: gl.get_uniform_location(program, "u_model_view"),
            projection: gl.get_uniform_location(program, "u_projection"),
            color: gl.get_uniform_location(program, "u_color"),
            point_size: gl.get_uniform_location(program, "u_point_size"),
            point_scale: gl.get_uniform_location(program, "u_point_scale"),
        }
    }
}

/// One uploaded vertex array: indexed lines or plain points.
struct Batch {
    vao: WebGlVertexArrayObject,
    buffers: Vec<WebGlBuffer>,
    count: i32,
    indexed: bool,
}

impl Batch {
    fn upload(gl: &GL, positions: &[f32], indices: Option<&[u32]>) -> Result<Self, MountError> {
        let vao = gl
            .create_vertex_array()
            .ok_or_else(|| unavailable("cannot create vertex array"))?;
        gl.bind_vertex_array(Some(&vao));

        let mut buffers = Vec::with_capacity(2);
        let vertices = gl
            .create_buffer()
            .ok_or_else(|| unavailable("cannot create buffer"))?;
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&vertices));
        gl.buffer_data_with_array_buffer_view(
            GL::ARRAY_BUFFER,
            &js_sys::Float32Array::from(positions),
            GL::STATIC_DRAW,
        );
        gl.enable_vertex_attrib_array(POSITION);
        gl.vertex_attrib_pointer_with_i32(POSITION, 3, GL::FLOAT, false, 0, 0);
        buffers.push(vertices);

        let count = match indices {
            Some(indices) => {
                let elements = gl
                    .create_buffer()
                    .ok_or_else(|| unavailable("cannot create buffer"))?;
                gl.bind_buffer(GL::ELEMENT_ARRAY_BUFFER, Some(&elements));
                gl.buffer_data_with_array_buffer_view(
                    GL::ELEMENT_ARRAY_BUFFER,
                    &js_sys::Uint32Array::from(indices),
                    GL::STATIC_DRAW,
                );
                buffers.push(elements);
                indices.len()
            }
            None => positions.len() / 3,
        };

        gl.bind_vertex_array(None);
        Ok(Self {
            vao,
            buffers,
            count: count as i32,
            indexed: indices.is_some(),
        })
    }

    fn draw(&self, gl: &GL, mode: u32) {
        gl.bind_vertex_array(Some(&self.vao));
        if self.indexed {
            gl.draw_elements_with_i32(mode, self.count, GL::UNSIGNED_INT, 0);
        } else {
            gl.draw_arrays(mode, 0, self.count);
        }
        gl.bind_vertex_array(None);
    }

    fn delete(&self, gl: &GL) {
        for buffer in &self.buffers {
            gl.delete_buffer(Some(buffer));
        }
        gl.delete_vertex_array(Some(&self.vao));
    }
}

enum Upload {
    Pending,
    Ready { mesh: Batch, cloud: Batch },
    Failed,
}

/// WebGL2 renderer drawing the orbit scene onto its own transparent canvas
/// inside the mount container.
pub struct GlRenderer {
    canvas: HtmlCanvasElement,
    gl: GL,
    program: WebGlProgram,
    uniforms: Uniforms,
    upload: Upload,
    size: (u32, u32),
}

impl GlRenderer {
    /// Replace the contents of `container` with a fresh WebGL2 canvas.
    pub fn attach(document: &Document, container: &Element) -> Result<Self, MountError> {
        let canvas = document
            .create_element("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().map_err(JsValue::from))
            .map_err(|err| unavailable(format!("cannot create canvas: {err:?}")))?;

        let options = js_sys::Object::new();
        js_sys::Reflect::set(&options, &"alpha".into(), &JsValue::TRUE).ok();
        js_sys::Reflect::set(&options, &"antialias".into(), &JsValue::TRUE).ok();
        let gl: GL = canvas
            .get_context_with_context_options("webgl2", &options)
            .map_err(|err| unavailable(format!("{err:?}")))?
            .ok_or_else(|| unavailable("WebGL2 not supported"))?
            .dyn_into()
            .map_err(|_| unavailable("unexpected context type"))?;

        let program = link(&gl)?;
        let uniforms = Uniforms::locate(&gl, &program);

        while let Some(child) = container.first_child() {
            container
                .remove_child(&child)
                .map_err(|err| unavailable(format!("cannot clear container: {err:?}")))?;
        }
        container
            .append_child(&canvas)
            .map_err(|err| unavailable(format!("cannot attach canvas: {err:?}")))?;

        gl.enable(GL::DEPTH_TEST);
        gl.depth_func(GL::LEQUAL);
        gl.enable(GL::BLEND);
        gl.blend_func(GL::SRC_ALPHA, GL::ONE_MINUS_SRC_ALPHA);
        gl.clear_color(0.0, 0.0, 0.0, 0.0);

        Ok(Self {
            canvas,
            gl,
            program,
            uniforms,
            upload: Upload::Pending,
            size: (0, 0),
        })
    }

    fn ensure_uploaded(&mut self, scene: &OrbitScene) {
        if !matches!(self.upload, Upload::Pending) {
            return;
        }
        let gl = &self.gl;
        let geometry = &scene.mesh.geometry;
        let uploaded = Batch::upload(gl, &geometry.positions(), Some(geometry.edge_indices().as_slice()))
            .and_then(|mesh| match Batch::upload(gl, &scene.cloud.positions(), None) {
                Ok(cloud) => Ok((mesh, cloud)),
                Err(err) => {
                    mesh.delete(gl);
                    Err(err)
                }
            });
        self.upload = match uploaded {
            Ok((mesh, cloud)) => Upload::Ready { mesh, cloud },
            Err(err) => {
                log::warn!("orbit upload failed: {err}");
                Upload::Failed
            }
        };
    }
}

impl SceneRenderer for GlRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        let style = self.canvas.style();
        style.set_property("width", &format!("{width}px")).ok();
        style.set_property("height", &format!("{height}px")).ok();
        self.gl.viewport(0, 0, width as i32, height as i32);
    }

    fn render(&mut self, scene: &OrbitScene, camera: &PerspectiveCamera) {
        self.ensure_uploaded(scene);
        let gl = &self.gl;
        gl.clear(GL::COLOR_BUFFER_BIT | GL::DEPTH_BUFFER_BIT);
        let Upload::Ready { mesh, cloud } = &self.upload else {
            return;
        };

        gl.use_program(Some(&self.program));
        let u = &self.uniforms;
        gl.uniform_matrix4fv_with_f32_array(
            u.projection.as_ref(),
            false,
            &camera.projection_matrix().to_cols_array(),
        );
        let view = camera.view_matrix();

        let model_view = view * scene.mesh.model_matrix();
        gl.uniform_matrix4fv_with_f32_array(u.model_view.as_ref(), false, &model_view.to_cols_array());
        gl.uniform4fv_with_f32_array(u.color.as_ref(), &scene.mesh.color.to_f32());
        mesh.draw(gl, GL::LINES);

        let model_view = view * scene.cloud.model_matrix();
        gl.uniform_matrix4fv_with_f32_array(u.model_view.as_ref(), false, &model_view.to_cols_array());
        gl.uniform4fv_with_f32_array(u.color.as_ref(), &scene.cloud.color.to_f32());
        gl.uniform1f(u.point_size.as_ref(), scene.cloud.size);
        gl.uniform1f(u.point_scale.as_ref(), self.size.1 as f32 * 0.5);
        cloud.draw(gl, GL::POINTS);
    }

    fn dispose(&mut self) {
        if let Upload::Ready { mesh, cloud } = std::mem::replace(&mut self.upload, Upload::Failed) {
            mesh.delete(&self.gl);
            cloud.delete(&self.gl);
        }
        self.gl.delete_program(Some(&self.program));
        self.canvas.remove();
    }
}
