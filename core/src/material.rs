//! Material & light registry (`spec.md` component C): fixed-size arrays of
//! directional/point/spot light records and the process-wide current
//! material.

use crate::math::{Vec3, Vec4, EPSILON};
use crate::message::MessageBus;

/// Maximum number of light slots per kind (`spec.md` §3: "small, e.g. 2").
pub const MAX_LIGHTS_PER_KIND: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub direction: Vec3,
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        DirectionalLight {
            ambient: Vec3::zero(),
            diffuse: Vec3::zero(),
            specular: Vec3::zero(),
            direction: Vec3::new(0.0, 0.0, -1.0),
            intensity: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PointLight {
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub position: Vec3,
    pub intensity: f32,
    pub range: f32,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        PointLight {
            diffuse: Vec3::zero(),
            specular: Vec3::zero(),
            position: Vec3::zero(),
            intensity: 0.0,
            range: 1.0,
            constant: 1.0,
            linear: 0.0,
            quadratic: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SpotLight {
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub position: Vec3,
    pub direction: Vec3,
    pub intensity: f32,
    pub range: f32,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    /// Cosine of the half-angle cutoff.
    pub cutoff_cosine: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        SpotLight {
            diffuse: Vec3::zero(),
            specular: Vec3::zero(),
            position: Vec3::zero(),
            direction: Vec3::new(0.0, 0.0, -1.0),
            intensity: 0.0,
            range: 1.0,
            constant: 1.0,
            linear: 0.0,
            quadratic: 0.0,
            cutoff_cosine: 0.0,
        }
    }
}

/// Identifies which light array `set_light`/`attenuation` operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

/// A light of any kind is "inactive" iff its intensity is (near) zero
/// (`spec.md` §3).
pub trait LightIntensity {
    fn is_active(&self) -> bool;
}

impl LightIntensity for DirectionalLight {
    fn is_active(&self) -> bool {
        self.intensity > EPSILON
    }
}
impl LightIntensity for PointLight {
    fn is_active(&self) -> bool {
        self.intensity > EPSILON
    }
}
impl LightIntensity for SpotLight {
    fn is_active(&self) -> bool {
        self.intensity > EPSILON
    }
}

/// Fixed-size arrays of light records, two slots per kind.
pub struct LightRegistry {
    pub directional: [DirectionalLight; MAX_LIGHTS_PER_KIND],
    pub point: [PointLight; MAX_LIGHTS_PER_KIND],
    pub spot: [SpotLight; MAX_LIGHTS_PER_KIND],
}

impl LightRegistry {
    pub fn new() -> Self {
        LightRegistry {
            directional: [DirectionalLight::default(); MAX_LIGHTS_PER_KIND],
            point: [PointLight::default(); MAX_LIGHTS_PER_KIND],
            spot: [SpotLight::default(); MAX_LIGHTS_PER_KIND],
        }
    }

    /// `compute_attenuation` (`spec.md` §4.6): `kc = constant`,
    /// `kl = 4.5 / range`, `kq = 75 / range^2`. Directional lights reject
    /// this with a warning, since they carry no attenuation terms.
    pub fn compute_attenuation(&mut self, kind: LightKind, idx: usize, constant: f32, messages: &MessageBus) {
        match kind {
            LightKind::Directional => {
                messages.warning("compute_attenuation is not defined for directional lights");
            }
            LightKind::Point => {
                if let Some(light) = self.point.get_mut(idx) {
                    light.constant = constant;
                    light.linear = 4.5 / light.range;
                    light.quadratic = 75.0 / (light.range * light.range);
                } else {
                    messages.warning(format!("point light index {idx} out of range"));
                }
            }
            LightKind::Spot => {
                if let Some(light) = self.spot.get_mut(idx) {
                    light.constant = constant;
                    light.linear = 4.5 / light.range;
                    light.quadratic = 75.0 / (light.range * light.range);
                } else {
                    messages.warning(format!("spot light index {idx} out of range"));
                }
            }
        }
    }
}

impl Default for LightRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide material singleton — no per-object material binding
/// (`spec.md` §3).
#[derive(Debug, Clone, Copy)]
pub struct Material {
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
            diffuse: Vec4::new(0.8, 0.8, 0.8, 1.0),
            specular: Vec4::new(0.0, 0.0, 0.0, 1.0),
            shininess: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attenuation_formula() {
        let messages = MessageBus::new();
        let mut lights = LightRegistry::new();
        lights.point[0].range = 10.0;
        lights.compute_attenuation(LightKind::Point, 0, 1.0, &messages);
        assert_eq!(lights.point[0].constant, 1.0);
        assert!((lights.point[0].linear - 0.45).abs() < 1e-5);
        assert!((lights.point[0].quadratic - 0.75).abs() < 1e-5);
    }

    #[test]
    fn directional_attenuation_is_rejected() {
        let received = std::sync::Arc::new(std::sync::Mutex::new(false));
        let received2 = received.clone();
        let mut messages = MessageBus::new();
        messages.set_sink(Some(Box::new(move |_, _| *received2.lock().unwrap() = true)));
        let mut lights = LightRegistry::new();
        lights.compute_attenuation(LightKind::Directional, 0, 1.0, &messages);
        assert!(*received.lock().unwrap());
    }

    #[test]
    fn inactive_below_epsilon_intensity() {
        let light = DirectionalLight::default();
        assert!(!light.is_active());
    }
}
