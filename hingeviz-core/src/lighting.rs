//! Phong lighting parameters and color-picker parsing

use nalgebra::{Matrix4, Point3, Vector3};
use nom::{
    bytes::complete::{tag, take_while_m_n},
    combinator::{all_consuming, map_res, opt},
    sequence::{preceded, tuple},
    IResult,
};

/// Uniform values a backend needs to shade one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingUniforms {
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    /// Light position in eye space
    pub light_position: [f32; 3],
    pub shininess: f32,
    pub enabled: bool,
}

/// Light colors, world-space position and shininess
#[derive(Debug, Clone, PartialEq)]
pub struct Lighting {
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub position: Point3<f32>,
    pub shininess: f32,
    pub enabled: bool,
}

impl Lighting {
    pub fn new(enabled: bool) -> Self {
        Self {
            ambient: Vector3::repeat(0.2),
            diffuse: Vector3::repeat(1.0),
            specular: Vector3::repeat(1.0),
            position: Point3::new(3.0, 5.0, 3.0),
            shininess: 50.0,
            enabled,
        }
    }

    /// Restore the default colors, position and shininess. The enabled flag
    /// is left alone.
    pub fn reset(&mut self) {
        *self = Self::new(self.enabled);
    }

    /// Uniforms with the light moved into the eye space of `view`
    pub fn uniforms(&self, view: &Matrix4<f32>) -> LightingUniforms {
        let eye = view.transform_point(&self.position);
        LightingUniforms {
            ambient: self.ambient.into(),
            diffuse: self.diffuse.into(),
            specular: self.specular.into(),
            light_position: eye.coords.into(),
            shininess: self.shininess,
            enabled: self.enabled,
        }
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Self::new(true)
    }
}

fn hex_channel(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()), |digits| {
        u8::from_str_radix(digits, 16)
    })(input)
}

fn hex_rgb(input: &str) -> IResult<&str, (u8, u8, u8)> {
    all_consuming(preceded(
        opt(tag("#")),
        tuple((hex_channel, hex_channel, hex_channel)),
    ))(input)
}

/// Parse `#rrggbb` (the `#` is optional) into unit RGB. Anything else falls
/// back to white.
pub fn parse_hex_color(input: &str) -> Vector3<f32> {
    match hex_rgb(input.trim()) {
        Ok((_, (r, g, b))) => Vector3::new(r as f32, g as f32, b as f32) / 255.0,
        Err(_) => {
            log::warn!("unparseable color {input:?}, using white");
            Vector3::repeat(1.0)
        }
    }
}
