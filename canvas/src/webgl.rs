//! WebGL implementation of [`RendererBackend`].
//!
//! Owns the GL context, one linked program and the two vertex buffers. The
//! shaders multiply each document-space vertex by the `coordinateTransform`
//! uniform and pass the per-vertex color through unchanged.

use js_sys::Float32Array;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlCanvasElement, WebGlBuffer, WebGlProgram, WebGlRenderingContext as Gl, WebGlShader};

use crate::consts::{CLEAR_RGBA, TRANSFORM_UNIFORM};
use crate::error::RenderError;
use crate::render::RendererBackend;

const VERTEX_SHADER: &str = r"
attribute vec4 vPosition;
attribute vec4 vColor;
uniform mat4 coordinateTransform;
varying vec4 fColor;

void main() {
    gl_Position = coordinateTransform * vPosition;
    fColor = vColor;
}
";

const FRAGMENT_SHADER: &str = r"
precision mediump float;
varying vec4 fColor;

void main() {
    gl_FragColor = fColor;
}
";

const POSITION_ATTRIBUTE: &str = "vPosition";
const COLOR_ATTRIBUTE: &str = "vColor";

pub struct WebGlBackend {
    gl: Gl,
    program: WebGlProgram,
    position_buffer: WebGlBuffer,
    color_buffer: WebGlBuffer,
    position_location: u32,
    color_location: u32,
}

impl WebGlBackend {
    /// Acquire a `webgl` context from `canvas` and build the line program.
    ///
    /// # Errors
    ///
    /// Any setup step failing: context, shader compile, link, buffers, attribute lookup.
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, RenderError> {
        let gl = canvas
            .get_context("webgl")
            .map_err(|e| RenderError::Backend(describe(&e)))?
            .ok_or(RenderError::ContextUnavailable)?
            .dyn_into::<Gl>()
            .map_err(|_| RenderError::ContextUnavailable)?;

        let width = i32::try_from(canvas.width()).map_err(|_| RenderError::Backend("canvas too wide".into()))?;
        let height = i32::try_from(canvas.height()).map_err(|_| RenderError::Backend("canvas too tall".into()))?;
        gl.viewport(0, 0, width, height);

        let vertex = compile_shader(&gl, Gl::VERTEX_SHADER, VERTEX_SHADER)?;
        let fragment = compile_shader(&gl, Gl::FRAGMENT_SHADER, FRAGMENT_SHADER)?;
        let program = link_program(&gl, &vertex, &fragment)?;
        gl.use_program(Some(&program));

        let position_buffer = gl.create_buffer().ok_or(RenderError::BufferAllocation)?;
        let color_buffer = gl.create_buffer().ok_or(RenderError::BufferAllocation)?;
        let position_location = attribute_location(&gl, &program, POSITION_ATTRIBUTE)?;
        let color_location = attribute_location(&gl, &program, COLOR_ATTRIBUTE)?;

        if gl.get_uniform_location(&program, TRANSFORM_UNIFORM).is_none() {
            return Err(RenderError::MissingUniform(TRANSFORM_UNIFORM.to_owned()));
        }

        tracing::debug!(width, height, "webgl backend ready");
        Ok(Self { gl, program, position_buffer, color_buffer, position_location, color_location })
    }

    fn upload(&self, buffer: &WebGlBuffer, location: u32, data: &[glam::Vec4]) {
        let flat: Vec<f32> = data.iter().flat_map(|v| v.to_array()).collect();
        let array = Float32Array::from(flat.as_slice());
        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(buffer));
        self.gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &array, Gl::STATIC_DRAW);
        self.gl.vertex_attrib_pointer_with_i32(location, 4, Gl::FLOAT, false, 0, 0);
        self.gl.enable_vertex_attrib_array(location);
    }
}

impl RendererBackend for WebGlBackend {
    fn set_uniform_matrix(&mut self, name: &str, matrix: &glam::Mat4) -> Result<(), RenderError> {
        let location = self
            .gl
            .get_uniform_location(&self.program, name)
            .ok_or_else(|| RenderError::MissingUniform(name.to_owned()))?;
        self.gl.uniform_matrix4fv_with_f32_array(Some(&location), false, &matrix.to_cols_array());
        Ok(())
    }

    fn draw_segments(&mut self, points: &[glam::Vec4], colors: &[glam::Vec4]) -> Result<(), RenderError> {
        if points.len() != colors.len() {
            return Err(RenderError::BufferMismatch { points: points.len(), colors: colors.len() });
        }
        let count = i32::try_from(points.len()).map_err(|_| RenderError::Backend("too many vertices".into()))?;

        self.upload(&self.position_buffer, self.position_location, points);
        self.upload(&self.color_buffer, self.color_location, colors);

        let [r, g, b, a] = CLEAR_RGBA;
        self.gl.clear_color(r, g, b, a);
        self.gl.clear(Gl::COLOR_BUFFER_BIT);
        self.gl.draw_arrays(Gl::LINES, 0, count);
        Ok(())
    }
}

fn compile_shader(gl: &Gl, kind: u32, source: &str) -> Result<WebGlShader, RenderError> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| RenderError::ShaderCompile("unable to create shader".into()))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);
    let compiled = gl.get_shader_parameter(&shader, Gl::COMPILE_STATUS).as_bool().unwrap_or(false);
    if compiled {
        Ok(shader)
    } else {
        Err(RenderError::ShaderCompile(gl.get_shader_info_log(&shader).unwrap_or_default()))
    }
}

fn link_program(gl: &Gl, vertex: &WebGlShader, fragment: &WebGlShader) -> Result<WebGlProgram, RenderError> {
    let program = gl
        .create_program()
        .ok_or_else(|| RenderError::ProgramLink("unable to create program".into()))?;
    gl.attach_shader(&program, vertex);
    gl.attach_shader(&program, fragment);
    gl.link_program(&program);
    let linked = gl.get_program_parameter(&program, Gl::LINK_STATUS).as_bool().unwrap_or(false);
    if linked {
        Ok(program)
    } else {
        Err(RenderError::ProgramLink(gl.get_program_info_log(&program).unwrap_or_default()))
    }
}

fn attribute_location(gl: &Gl, program: &WebGlProgram, name: &str) -> Result<u32, RenderError> {
    u32::try_from(gl.get_attrib_location(program, name)).map_err(|_| RenderError::MissingAttribute(name.to_owned()))
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
