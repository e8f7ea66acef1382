//! The lit model program.
//!
//! One directional light, one point light and one spot light, all shading the
//! diffuse and specular maps of a loaded model. The light structs mirror the
//! uniform block of `assets/shader/phong_model.wgsl` field by field; `apply`
//! writes a light into a program by its dotted uniform names.

use cgmath::{Angle, Deg, Vector3};

use crate::{
    camera::Camera,
    pipelines::{
        shader::{ShaderDesc, ShaderProgram},
        uniforms::{UniformField, UniformKind, field},
    },
};

pub const PHONG_UNIFORMS: &[UniformField] = &[
    field("ViewPos", UniformKind::Vec3),
    field("paraLight.direction", UniformKind::Vec3),
    field("paraLight.ambient", UniformKind::Vec3),
    field("paraLight.diffuse", UniformKind::Vec3),
    field("paraLight.specular", UniformKind::Vec3),
    field("pointLight.position", UniformKind::Vec3),
    field("pointLight.ambient", UniformKind::Vec3),
    field("pointLight.diffuse", UniformKind::Vec3),
    field("pointLight.specular", UniformKind::Vec3),
    field("pointLight.constant", UniformKind::Float),
    field("pointLight.linear", UniformKind::Float),
    field("pointLight.quadratic", UniformKind::Float),
    field("spotLight.position", UniformKind::Vec3),
    field("spotLight.direction", UniformKind::Vec3),
    field("spotLight.diffuse", UniformKind::Vec3),
    field("spotLight.specular", UniformKind::Vec3),
    field("spotLight.innerCutOff", UniformKind::Float),
    field("spotLight.outerCutOff", UniformKind::Float),
    field("material.shininess", UniformKind::Float),
];

pub const DIFFUSE_SLOT: &str = "material.texture_diffuse1";
pub const SPECULAR_SLOT: &str = "material.texture_specular1";

pub const PHONG_MODEL: ShaderDesc = ShaderDesc {
    label: "phong_model",
    uniforms: PHONG_UNIFORMS,
    textures: &[DIFFUSE_SLOT, SPECULAR_SLOT],
    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
};

#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

impl DirectionalLight {
    pub fn apply(&self, program: &mut ShaderProgram) {
        program.set_vec3("paraLight.direction", self.direction);
        program.set_vec3("paraLight.ambient", self.ambient);
        program.set_vec3("paraLight.diffuse", self.diffuse);
        program.set_vec3("paraLight.specular", self.specular);
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vector3::new(-0.2, -1.0, -0.3),
            ambient: Vector3::new(0.02, 0.02, 0.02),
            diffuse: Vector3::new(0.05, 0.05, 0.05),
            specular: Vector3::new(0.1, 0.1, 0.1),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl PointLight {
    /// A white light at `position` that fades out over roughly 50 units.
    pub fn at(position: Vector3<f32>) -> Self {
        Self {
            position,
            ambient: Vector3::new(0.2, 0.2, 0.2),
            diffuse: Vector3::new(0.5, 0.5, 0.5),
            specular: Vector3::new(1.0, 1.0, 1.0),
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }

    /// Same falloff the fragment stage applies.
    pub fn attenuation(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }

    pub fn apply(&self, program: &mut ShaderProgram) {
        program.set_vec3("pointLight.position", self.position);
        program.set_vec3("pointLight.ambient", self.ambient);
        program.set_vec3("pointLight.diffuse", self.diffuse);
        program.set_vec3("pointLight.specular", self.specular);
        program.set_float("pointLight.constant", self.constant);
        program.set_float("pointLight.linear", self.linear);
        program.set_float("pointLight.quadratic", self.quadratic);
    }
}

/// A flashlight. Position and direction are updated every frame with [`SpotLight::follow`].
#[derive(Clone, Debug, PartialEq)]
pub struct SpotLight {
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub inner_cut_off: Deg<f32>,
    pub outer_cut_off: Deg<f32>,
}

impl SpotLight {
    /// 1 inside the inner cone, 0 outside the outer one, linear in the cosine in between.
    pub fn intensity(&self, cos_theta: f32) -> f32 {
        let inner = self.inner_cut_off.cos();
        let outer = self.outer_cut_off.cos();
        ((cos_theta - outer) / (inner - outer)).clamp(0.0, 1.0)
    }

    pub fn apply(&self, program: &mut ShaderProgram) {
        program.set_vec3("spotLight.diffuse", self.diffuse);
        program.set_vec3("spotLight.specular", self.specular);
        // the fragment stage compares cosines
        program.set_float("spotLight.innerCutOff", self.inner_cut_off.cos());
        program.set_float("spotLight.outerCutOff", self.outer_cut_off.cos());
    }

    /// Puts the light at the camera, pointing where it looks.
    pub fn follow(program: &mut ShaderProgram, camera: &Camera) {
        program.set_vec3("spotLight.position", camera.position);
        program.set_vec3("spotLight.direction", camera.front());
    }
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            diffuse: Vector3::new(0.5, 0.5, 0.5),
            specular: Vector3::new(1.0, 1.0, 1.0),
            inner_cut_off: Deg(12.5),
            outer_cut_off: Deg(17.5),
        }
    }
}

/// The static part of the lighting: every light, plus the material shininess.
#[derive(Clone, Debug, PartialEq)]
pub struct PhongLights {
    pub directional: DirectionalLight,
    pub point: PointLight,
    pub spot: SpotLight,
    pub shininess: f32,
}

impl PhongLights {
    pub fn new(point_light_position: Vector3<f32>) -> Self {
        Self {
            directional: DirectionalLight::default(),
            point: PointLight::at(point_light_position),
            spot: SpotLight::default(),
            shininess: 32.0,
        }
    }

    pub fn apply(&self, program: &mut ShaderProgram) {
        self.directional.apply(program);
        self.point.apply(program);
        self.spot.apply(program);
        program.set_float("material.shininess", self.shininess);
    }
}

/// Per-frame values: the eye position for specular highlights and the flashlight.
pub fn apply_view(program: &mut ShaderProgram, camera: &Camera) {
    program.set_vec3("ViewPos", camera.position);
    SpotLight::follow(program, camera);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::shader::validate_program;

    #[test]
    fn attenuation_is_one_at_the_light() {
        let light = PointLight::at(Vector3::new(1.2, 1.0, 2.0));
        assert_eq!(light.attenuation(0.0), 1.0);
        let at_ten = light.attenuation(10.0);
        assert!((at_ten - 1.0 / (1.0 + 0.9 + 3.2)).abs() < 1e-6);
        assert!(light.attenuation(20.0) < at_ten);
    }

    #[test]
    fn spot_intensity_fades_between_the_cones() {
        let spot = SpotLight::default();
        assert_eq!(spot.intensity(1.0), 1.0);
        assert_eq!(spot.intensity(Deg(30.0_f32).cos()), 0.0);
        let halfway = spot.intensity(Deg(15.0_f32).cos());
        assert!(halfway > 0.0 && halfway < 1.0);
    }

    #[test]
    fn phong_shader_links() {
        let source = include_str!("../../assets/shader/phong_model.wgsl");
        validate_program("phong_model", PHONG_MODEL.textures.len(), source, source).unwrap();
    }

    #[test]
    fn unlit_shaders_link() {
        use crate::pipelines::basic::{SINGLE_COLOR, SINGLE_TEX};
        let color = include_str!("../../assets/shader/single_color.wgsl");
        validate_program("single_color", SINGLE_COLOR.textures.len(), color, color).unwrap();
        let tex = include_str!("../../assets/shader/single_tex.wgsl");
        validate_program("single_tex", SINGLE_TEX.textures.len(), tex, tex).unwrap();
    }
}
