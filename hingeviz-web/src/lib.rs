/// hingeviz web viewer - WebGL2 rendering of the hinged assemblies
///
/// JavaScript creates a [`WebViewer`] on a canvas, forwards pointer and
/// control events to it, and calls [`WebViewer::frame`] from
/// `requestAnimationFrame`.
use std::cell::RefCell;
use std::rc::Rc;

use hingeviz_core::{parse_hex_color, AnimationKind, AssemblyKind, Axis, HingevizError, Session};
use nalgebra::Point3;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlCanvasElement;

mod gl_backend;
mod texture_loader;

pub use gl_backend::WebGlBackend;
use texture_loader::{TextureInbox, TextureRequest};

fn to_js(err: HingevizError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse<T: std::str::FromStr<Err = HingevizError>>(input: &str) -> Result<T, JsValue> {
    input.parse().map_err(to_js)
}

/// Background color per assembly
fn clear_color(kind: AssemblyKind) -> [f32; 4] {
    match kind {
        AssemblyKind::Socket => [0.9, 0.9, 0.9, 1.0],
        AssemblyKind::Door => [0.78, 0.82, 0.85, 1.0],
    }
}

/// The open hinge sleeves are drawn without back faces
fn culls_back_faces(kind: AssemblyKind) -> bool {
    kind == AssemblyKind::Door
}

fn canvas_by_id(canvas_id: &str) -> Result<HtmlCanvasElement, HingevizError> {
    web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(canvas_id))
        .ok_or_else(|| HingevizError::BackendUnavailable(format!("no element with id {canvas_id:?}")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| HingevizError::BackendUnavailable(format!("{canvas_id:?} is not a canvas")))
}

/// One assembly rendered into one canvas
#[wasm_bindgen]
pub struct WebViewer {
    session: Session,
    backend: WebGlBackend,
    inbox: TextureInbox,
    texture_request: Option<TextureRequest>,
}

#[wasm_bindgen]
impl WebViewer {
    /// Attach to the canvas with `canvas_id` and show `assembly`
    /// (`"socket"` or `"door"`)
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, assembly: &str) -> Result<WebViewer, JsValue> {
        let kind: AssemblyKind = parse(assembly)?;
        let canvas = canvas_by_id(canvas_id).map_err(to_js)?;
        let backend = WebGlBackend::new(&canvas, clear_color(kind), culls_back_faces(kind)).map_err(|err| {
            log::error!("{err}");
            to_js(err)
        })?;
        log::info!("{kind} viewer attached to #{canvas_id}");

        Ok(WebViewer {
            session: Session::new(kind, canvas.width(), canvas.height()),
            backend,
            inbox: Rc::new(RefCell::new(None)),
            texture_request: None,
        })
    }

    /// Render one frame
    pub fn frame(&mut self) -> Result<(), JsValue> {
        let loaded = self.inbox.borrow_mut().take();
        if let Some(result) = loaded {
            self.texture_request = None;
            self.session.texture_loaded(result);
        }
        self.session.frame(&mut self.backend).map(|_| ()).map_err(to_js)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.session.set_viewport(width, height);
        self.backend.resize(width, height);
    }

    /// Start loading an image; the placeholder stays until it arrives and
    /// a wood pattern replaces it if the load fails
    pub fn load_texture(&mut self, url: &str) -> Result<(), JsValue> {
        let request = TextureRequest::start(url, Rc::clone(&self.inbox)).map_err(to_js)?;
        self.texture_request = Some(request);
        Ok(())
    }

    // Joints and animation

    /// Returns the angle actually applied after clamping
    pub fn set_joint_angle(&mut self, joint: usize, degrees: f32) -> Result<f32, JsValue> {
        self.session.set_joint_angle(joint, degrees).map_err(to_js)
    }

    pub fn joint_values(&self) -> Vec<f32> {
        self.session.joint_values()
    }

    pub fn joint_count(&self) -> usize {
        self.session.joint_count()
    }

    pub fn rebuild(&mut self) -> Result<(), JsValue> {
        self.session.trigger_rebuild().map_err(to_js)
    }

    /// `"open"`, `"close"` or `"fold"`
    pub fn start_animation(&mut self, kind: &str) -> Result<(), JsValue> {
        let kind: AnimationKind = parse(kind)?;
        self.session.start_animation(kind).map_err(to_js)
    }

    pub fn stop_animation(&mut self) {
        self.session.stop_animation();
    }

    pub fn reset_joints(&mut self) {
        self.session.reset_joints();
    }

    pub fn animation_state(&self) -> String {
        self.session.animation_state().name().to_string()
    }

    // Camera

    pub fn set_camera_rotation(&mut self, yaw: f32, pitch: f32) {
        self.session.set_camera_rotation(yaw, pitch);
    }

    pub fn set_zoom(&mut self, distance: f32) {
        self.session.set_zoom(distance);
    }

    pub fn zoom(&self) -> f32 {
        self.session.camera().zoom
    }

    pub fn set_pan(&mut self, x: f32, y: f32) {
        self.session.set_pan(x, y);
    }

    pub fn reset_view(&mut self) {
        self.session.reset_view();
    }

    pub fn toggle_projection(&mut self) {
        self.session.toggle_projection();
    }

    pub fn pointer_down(&mut self, button: i16, x: f32, y: f32) {
        self.session.pointer_down(button, x, y);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.session.pointer_move(x, y);
    }

    pub fn pointer_up(&mut self) {
        self.session.pointer_up();
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.session.wheel(delta_y);
    }

    // Display

    pub fn toggle_grid(&mut self) -> bool {
        self.session.toggle_grid()
    }

    pub fn toggle_wireframe(&mut self) -> bool {
        self.session.toggle_wireframe()
    }

    pub fn toggle_texture(&mut self) -> bool {
        self.session.toggle_texture()
    }

    pub fn toggle_lighting(&mut self) -> bool {
        self.session.toggle_lighting()
    }

    /// Color-picker value such as `"#ff8800"`
    pub fn set_ambient_color(&mut self, hex: &str) {
        self.session.lighting_mut().ambient = parse_hex_color(hex);
    }

    pub fn set_diffuse_color(&mut self, hex: &str) {
        self.session.lighting_mut().diffuse = parse_hex_color(hex);
    }

    pub fn set_specular_color(&mut self, hex: &str) {
        self.session.lighting_mut().specular = parse_hex_color(hex);
    }

    pub fn set_light_position(&mut self, x: f32, y: f32, z: f32) {
        self.session.lighting_mut().position = Point3::new(x, y, z);
    }

    pub fn set_shininess(&mut self, shininess: f32) {
        self.session.lighting_mut().shininess = shininess;
    }

    pub fn reset_lighting(&mut self) {
        self.session.reset_lighting();
    }

    // Object transform

    pub fn set_object_rotation(&mut self, x: f32, y: f32, z: f32) {
        self.session.set_object_rotation(x, y, z);
    }

    pub fn set_object_scale(&mut self, x: f32, y: f32, z: f32) {
        self.session.set_object_scale(x, y, z);
    }

    /// `"x"`, `"y"` or `"z"`
    pub fn start_auto_rotation(&mut self, axis: &str) -> Result<(), JsValue> {
        let axis: Axis = parse(axis)?;
        self.session.start_auto_rotation(axis);
        Ok(())
    }

    pub fn stop_auto_rotation(&mut self) {
        self.session.stop_auto_rotation();
    }

    pub fn reset_object_transform(&mut self) {
        self.session.reset_object_transform();
    }

    // Statistics

    pub fn vertex_count(&self) -> usize {
        self.session.buffers().vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.session.buffers().triangle_count()
    }
}

/// Change the console log level: off, error, warn, info, debug or trace
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let level = level
        .parse::<log::LevelFilter>()
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    log::set_max_level(level);
    Ok(())
}

#[wasm_bindgen(start)]
pub fn start() {
    // Log panics using `console.error`.
    console_error_panic_hook::set_once();

    // The logger itself passes everything; `set_log_level` filters.
    wasm_logger::init(wasm_logger::Config::new(log::Level::Trace));
    log::set_max_level(log::LevelFilter::Info);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backgrounds_differ_per_assembly() {
        assert_ne!(clear_color(AssemblyKind::Socket), clear_color(AssemblyKind::Door));
        assert!(culls_back_faces(AssemblyKind::Door));
        assert!(!culls_back_faces(AssemblyKind::Socket));
    }

    #[test]
    fn test_set_log_level_changes_max_level() {
        assert!(set_log_level("debug").is_ok());
        assert_eq!(log::max_level(), log::LevelFilter::Debug);
        assert!(set_log_level("Warn").is_ok());
        assert_eq!(log::max_level(), log::LevelFilter::Warn);
    }
}
