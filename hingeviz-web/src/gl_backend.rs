/// WebGL2 render backend
use hingeviz_core::{
    DrawCall, GeometryBuffers, HingevizError, LightingUniforms, RenderBackend, Result, TextureImage, TextureSampling,
    TransformUniforms,
};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader, WebGlTexture,
    WebGlUniformLocation, WebGlVertexArrayObject,
};

const VERTEX_SHADER: &str = r#"#version 300 es
layout(location = 0) in vec4 a_position;
layout(location = 1) in vec4 a_color;
layout(location = 2) in vec3 a_normal;
layout(location = 3) in vec2 a_texcoord;

uniform mat4 u_model_view;
uniform mat4 u_projection;
uniform mat3 u_normal_matrix;

out vec4 v_color;
out vec3 v_normal;
out vec3 v_eye_position;
out vec2 v_texcoord;

void main() {
    vec4 eye = u_model_view * a_position;
    v_eye_position = eye.xyz;
    v_normal = u_normal_matrix * a_normal;
    v_color = a_color;
    v_texcoord = a_texcoord;
    gl_Position = u_projection * eye;
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;

in vec4 v_color;
in vec3 v_normal;
in vec3 v_eye_position;
in vec2 v_texcoord;

uniform vec3 u_ambient;
uniform vec3 u_diffuse;
uniform vec3 u_specular;
uniform vec3 u_light_position;
uniform float u_shininess;
uniform bool u_enable_lighting;
uniform sampler2D u_texture;
uniform bool u_use_texture;

out vec4 frag_color;

void main() {
    vec4 base = v_color;
    if (u_use_texture) {
        base *= texture(u_texture, v_texcoord);
    }
    if (!u_enable_lighting) {
        frag_color = base;
        return;
    }

    vec3 n = normalize(v_normal);
    vec3 l = normalize(u_light_position - v_eye_position);
    vec3 e = normalize(-v_eye_position);
    vec3 h = normalize(l + e);

    float kd = max(dot(l, n), 0.0);
    float ks = kd > 0.0 ? pow(max(dot(n, h), 0.0), u_shininess) : 0.0;
    frag_color = vec4(base.rgb * (u_ambient + kd * u_diffuse) + ks * u_specular, base.a);
}
"#;

/// Attribute slot, float component count
const ATTRIBUTES: [(u32, i32); 4] = [(0, 4), (1, 4), (2, 3), (3, 2)];

fn unavailable(what: &str) -> HingevizError {
    HingevizError::BackendUnavailable(what.to_string())
}

fn js_error(context: &str, err: JsValue) -> HingevizError {
    HingevizError::BackendUnavailable(format!("{context}: {err:?}"))
}

struct Uniforms {
    model_view: Option<WebGlUniformLocation>,
    projection: Option<WebGlUniformLocation>,
    normal_matrix: Option<WebGlUniformLocation>,
    ambient: Option<WebGlUniformLocation>,
    diffuse: Option<WebGlUniformLocation>,
    specular: Option<WebGlUniformLocation>,
    light_position: Option<WebGlUniformLocation>,
    shininess: Option<WebGlUniformLocation>,
    enable_lighting: Option<WebGlUniformLocation>,
    texture: Option<WebGlUniformLocation>,
    use_texture: Option<WebGlUniformLocation>,
}

impl Uniforms {
    fn locate(gl: &Gl, program: &WebGlProgram) -> Self {
        let at = |name: &str| gl.get_uniform_location(program, name);
        Self {
            model_view: at("u_model_view"),
            projection: at("u_projection"),
            normal_matrix: at("u_normal_matrix"),
            ambient: at("u_ambient"),
            diffuse: at("u_diffuse"),
            specular: at("u_specular"),
            light_position: at("u_light_position"),
            shininess: at("u_shininess"),
            enable_lighting: at("u_enable_lighting"),
            texture: at("u_texture"),
            use_texture: at("u_use_texture"),
        }
    }
}

/// Draws session buffers into a canvas through WebGL2
pub struct WebGlBackend {
    gl: Gl,
    // Kept alive for the lifetime of the context
    _program: WebGlProgram,
    vao: WebGlVertexArrayObject,
    attribute_buffers: [WebGlBuffer; 4],
    index_buffer: WebGlBuffer,
    edge_buffer: WebGlBuffer,
    texture: WebGlTexture,
    uniforms: Uniforms,
    clear_color: [f32; 4],
    width: u32,
    height: u32,
}

impl WebGlBackend {
    /// Acquire a WebGL2 context on `canvas` and build the shader program
    pub fn new(canvas: &HtmlCanvasElement, clear_color: [f32; 4], cull_back_faces: bool) -> Result<Self> {
        let gl = canvas
            .get_context("webgl2")
            .map_err(|err| js_error("webgl2 context request failed", err))?
            .ok_or_else(|| unavailable("WebGL2 is not available"))?
            .dyn_into::<Gl>()
            .map_err(|_| unavailable("webgl2 context has an unexpected type"))?;

        let program = link_program(&gl)?;
        gl.use_program(Some(&program));
        let uniforms = Uniforms::locate(&gl, &program);

        let vao = gl.create_vertex_array().ok_or_else(|| unavailable("vertex array"))?;
        gl.bind_vertex_array(Some(&vao));

        let create_buffer = || gl.create_buffer().ok_or_else(|| unavailable("buffer"));
        let attribute_buffers = [create_buffer()?, create_buffer()?, create_buffer()?, create_buffer()?];
        for (buffer, (slot, size)) in attribute_buffers.iter().zip(ATTRIBUTES) {
            gl.bind_buffer(Gl::ARRAY_BUFFER, Some(buffer));
            gl.vertex_attrib_pointer_with_i32(slot, size, Gl::FLOAT, false, 0, 0);
            gl.enable_vertex_attrib_array(slot);
        }
        let index_buffer = create_buffer()?;
        let edge_buffer = create_buffer()?;

        let texture = gl.create_texture().ok_or_else(|| unavailable("texture"))?;
        gl.active_texture(Gl::TEXTURE0);
        gl.bind_texture(Gl::TEXTURE_2D, Some(&texture));
        gl.uniform1i(uniforms.texture.as_ref(), 0);

        gl.enable(Gl::DEPTH_TEST);
        if cull_back_faces {
            gl.enable(Gl::CULL_FACE);
            gl.cull_face(Gl::BACK);
        }

        log::debug!("webgl2 backend ready on {}x{} canvas", canvas.width(), canvas.height());

        Ok(Self {
            gl,
            _program: program,
            vao,
            attribute_buffers,
            index_buffer,
            edge_buffer,
            texture,
            uniforms,
            clear_color,
            width: canvas.width(),
            height: canvas.height(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn upload_array(&self, target: u32, buffer: &WebGlBuffer, bytes: &[u8]) {
        self.gl.bind_buffer(target, Some(buffer));
        self.gl.buffer_data_with_u8_array(target, bytes, Gl::STATIC_DRAW);
    }
}

impl RenderBackend for WebGlBackend {
    fn begin_frame(&mut self) -> Result<()> {
        let [r, g, b, a] = self.clear_color;
        self.gl.viewport(0, 0, self.width as i32, self.height as i32);
        self.gl.clear_color(r, g, b, a);
        self.gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
        self.gl.bind_vertex_array(Some(&self.vao));
        Ok(())
    }

    fn upload_buffers(&mut self, buffers: &GeometryBuffers) -> Result<()> {
        let attributes = [
            buffers.flat_positions(),
            buffers.flat_colors(),
            buffers.flat_normals(),
            buffers.flat_texcoords(),
        ];
        for (buffer, data) in self.attribute_buffers.iter().zip(&attributes) {
            self.upload_array(Gl::ARRAY_BUFFER, buffer, bytemuck::cast_slice(data));
        }

        self.gl.bind_vertex_array(Some(&self.vao));
        let edges = buffers.edge_indices();
        self.upload_array(Gl::ELEMENT_ARRAY_BUFFER, &self.edge_buffer, bytemuck::cast_slice(&edges));
        self.upload_array(
            Gl::ELEMENT_ARRAY_BUFFER,
            &self.index_buffer,
            bytemuck::cast_slice(buffers.indices()),
        );
        Ok(())
    }

    fn set_transform_uniforms(&mut self, uniforms: &TransformUniforms) -> Result<()> {
        let u = &self.uniforms;
        self.gl
            .uniform_matrix4fv_with_f32_array(u.model_view.as_ref(), false, uniforms.model_view.as_slice());
        self.gl
            .uniform_matrix4fv_with_f32_array(u.projection.as_ref(), false, uniforms.projection.as_slice());
        self.gl
            .uniform_matrix3fv_with_f32_array(u.normal_matrix.as_ref(), false, uniforms.normal_matrix.as_slice());
        Ok(())
    }

    fn set_lighting_uniforms(&mut self, uniforms: &LightingUniforms) -> Result<()> {
        let u = &self.uniforms;
        self.gl.uniform3fv_with_f32_array(u.ambient.as_ref(), &uniforms.ambient);
        self.gl.uniform3fv_with_f32_array(u.diffuse.as_ref(), &uniforms.diffuse);
        self.gl.uniform3fv_with_f32_array(u.specular.as_ref(), &uniforms.specular);
        self.gl
            .uniform3fv_with_f32_array(u.light_position.as_ref(), &uniforms.light_position);
        self.gl.uniform1f(u.shininess.as_ref(), uniforms.shininess);
        self.gl.uniform1i(u.enable_lighting.as_ref(), i32::from(uniforms.enabled));
        Ok(())
    }

    fn set_texture(&mut self, image: &TextureImage, sampling: TextureSampling) -> Result<()> {
        let gl = &self.gl;
        gl.active_texture(Gl::TEXTURE0);
        gl.bind_texture(Gl::TEXTURE_2D, Some(&self.texture));
        gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            Gl::TEXTURE_2D,
            0,
            Gl::RGBA as i32,
            image.width() as i32,
            image.height() as i32,
            0,
            Gl::RGBA,
            Gl::UNSIGNED_BYTE,
            Some(image.pixels()),
        )
        .map_err(|err| js_error("texture upload failed", err))?;

        match sampling {
            TextureSampling::Mipmapped => {
                gl.generate_mipmap(Gl::TEXTURE_2D);
                gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MIN_FILTER, Gl::LINEAR_MIPMAP_LINEAR as i32);
            }
            TextureSampling::ClampLinear => {
                gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_WRAP_S, Gl::CLAMP_TO_EDGE as i32);
                gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_WRAP_T, Gl::CLAMP_TO_EDGE as i32);
                gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MIN_FILTER, Gl::LINEAR as i32);
            }
        }
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MAG_FILTER, Gl::LINEAR as i32);
        log::debug!("uploaded {}x{} texture", image.width(), image.height());
        Ok(())
    }

    fn set_texture_enabled(&mut self, enabled: bool) -> Result<()> {
        self.gl.uniform1i(self.uniforms.use_texture.as_ref(), i32::from(enabled));
        Ok(())
    }

    fn draw(&mut self, call: DrawCall) -> Result<()> {
        match call {
            DrawCall::Triangles { index_count } => {
                self.gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&self.index_buffer));
                self.gl
                    .draw_elements_with_i32(Gl::TRIANGLES, index_count as i32, Gl::UNSIGNED_INT, 0);
            }
            DrawCall::Edges { index_count } => {
                self.gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&self.edge_buffer));
                self.gl
                    .draw_elements_with_i32(Gl::LINES, index_count as i32, Gl::UNSIGNED_INT, 0);
            }
            DrawCall::Lines(range) => {
                let count = range.end.saturating_sub(range.start);
                self.gl.draw_arrays(Gl::LINES, range.start as i32, count as i32);
            }
        }
        Ok(())
    }
}

fn compile_shader(gl: &Gl, kind: u32, source: &str) -> Result<WebGlShader> {
    let shader = gl.create_shader(kind).ok_or_else(|| unavailable("shader object"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let info = gl.get_shader_info_log(&shader).unwrap_or_default();
        Err(HingevizError::BackendUnavailable(format!("shader compile failed: {info}")))
    }
}

fn link_program(gl: &Gl) -> Result<WebGlProgram> {
    let vertex = compile_shader(gl, Gl::VERTEX_SHADER, VERTEX_SHADER)?;
    let fragment = compile_shader(gl, Gl::FRAGMENT_SHADER, FRAGMENT_SHADER)?;

    let program = gl.create_program().ok_or_else(|| unavailable("program object"))?;
    gl.attach_shader(&program, &vertex);
    gl.attach_shader(&program, &fragment);
    gl.link_program(&program);

    if gl
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(program)
    } else {
        let info = gl.get_program_info_log(&program).unwrap_or_default();
        Err(HingevizError::BackendUnavailable(format!("program link failed: {info}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_layout_matches_flat_buffers() {
        let mut buffers = GeometryBuffers::new();
        buffers.push_line(nalgebra::Point3::origin(), nalgebra::Point3::new(1.0, 0.0, 0.0), [1.0; 4]);
        let lengths = [
            buffers.flat_positions().len(),
            buffers.flat_colors().len(),
            buffers.flat_normals().len(),
            buffers.flat_texcoords().len(),
        ];
        for ((_, size), len) in ATTRIBUTES.iter().zip(lengths) {
            assert_eq!(len, *size as usize * buffers.vertex_count());
        }
    }

    #[test]
    fn test_shaders_declare_attribute_slots() {
        for (slot, _) in ATTRIBUTES {
            assert!(VERTEX_SHADER.contains(&format!("layout(location = {slot})")));
        }
        assert!(FRAGMENT_SHADER.contains("uniform bool u_use_texture;"));
    }
}
