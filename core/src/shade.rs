//! Per-fragment shading (`spec.md` component G, §4.6): unlit, flat, and
//! smooth shade models, Blinn-Phong evaluation of the active lights.

use crate::material::{DirectionalLight, LightIntensity, LightRegistry, Material, PointLight, SpotLight};
use crate::math::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadeModel {
    Unlit,
    Flat,
    Smooth,
}

/// Blinn-Phong contribution of a single directional light. Direction is
/// transformed by the light-matrix top before use (`spec.md` §4.6:
/// `L = normalize(-lightMatrix * direction)`).
fn shade_directional(light: &DirectionalLight, normal: Vec3, view_dir: Vec3, material: &Material, light_matrix: &Mat4) -> (Vec3, Vec3, Vec3) {
    let light_dir = (-light_matrix.transform_direction(&light.direction)).normalize();
    let diffuse_term = normal.dot(&light_dir).max(0.0);
    let half = (light_dir + view_dir).normalize();
    let specular_term = normal.dot(&half).max(0.0).powf(material.shininess);

    let ambient = light.ambient;
    let diffuse = light.diffuse * diffuse_term * light.intensity;
    let specular = light.specular * specular_term * light.intensity;
    (ambient, diffuse, specular)
}

fn attenuation(constant: f32, linear: f32, quadratic: f32, distance: f32) -> f32 {
    1.0 / (constant + linear * distance + quadratic * distance * distance).max(crate::math::EPSILON)
}

/// Point-light position is transformed by the light-matrix top before use
/// (`spec.md` §4.6: the light-matrix top transforms light position).
fn shade_point(light: &PointLight, position: Vec3, normal: Vec3, view_dir: Vec3, material: &Material, light_matrix: &Mat4) -> (Vec3, Vec3) {
    let light_position = light_matrix.transform_point(&light.position);
    let to_light = light_position - position;
    let distance = to_light.length();
    let light_dir = if distance <= crate::math::EPSILON { Vec3::new(0.0, 0.0, 1.0) } else { to_light / distance };
    let att = attenuation(light.constant, light.linear, light.quadratic, distance);

    let diffuse_term = normal.dot(&light_dir).max(0.0);
    let half = (light_dir + view_dir).normalize();
    let specular_term = normal.dot(&half).max(0.0).powf(material.shininess);

    let diffuse = light.diffuse * diffuse_term * light.intensity * att;
    let specular = light.specular * specular_term * light.intensity * att;
    (diffuse, specular)
}

/// Spot position and direction are both transformed by the light-matrix top
/// before use (`spec.md` §4.6).
fn shade_spot(light: &SpotLight, position: Vec3, normal: Vec3, view_dir: Vec3, material: &Material, light_matrix: &Mat4) -> (Vec3, Vec3) {
    let light_position = light_matrix.transform_point(&light.position);
    let light_direction = light_matrix.transform_direction(&light.direction).normalize();
    let to_light = light_position - position;
    let distance = to_light.length();
    let light_dir = if distance <= crate::math::EPSILON { Vec3::new(0.0, 0.0, 1.0) } else { to_light / distance };

    let spot_cosine = (-light_dir).dot(&light_direction);
    if spot_cosine < light.cutoff_cosine {
        return (Vec3::zero(), Vec3::zero());
    }

    let att = attenuation(light.constant, light.linear, light.quadratic, distance);
    let diffuse_term = normal.dot(&light_dir).max(0.0);
    let half = (light_dir + view_dir).normalize();
    let specular_term = normal.dot(&half).max(0.0).powf(material.shininess);

    let diffuse = light.diffuse * diffuse_term * light.intensity * att;
    let specular = light.specular * specular_term * light.intensity * att;
    (diffuse, specular)
}

/// Evaluates every active light against one fragment and combines with the
/// material's ambient/diffuse/specular reflectance (`spec.md` §4.6). `unlit`
/// fragments (`ShadeModel::Unlit`) bypass this entirely and keep the vertex
/// color verbatim — that branch lives in the caller, not here. `light_matrix`
/// is the top of the `light` matrix stack, applied to every light's
/// position/direction before evaluation.
pub fn shade_fragment(lights: &LightRegistry, material: &Material, position: Vec3, normal: Vec3, view_dir: Vec3, light_matrix: &Mat4) -> Vec3 {
    let normal = normal.normalize();
    let view_dir = view_dir.normalize();

    let mut ambient_sum = Vec3::zero();
    let mut diffuse_sum = Vec3::zero();
    let mut specular_sum = Vec3::zero();

    for light in lights.directional.iter().filter(|l| l.is_active()) {
        let (a, d, s) = shade_directional(light, normal, view_dir, material, light_matrix);
        ambient_sum += a;
        diffuse_sum += d;
        specular_sum += s;
    }
    for light in lights.point.iter().filter(|l| l.is_active()) {
        let (d, s) = shade_point(light, position, normal, view_dir, material, light_matrix);
        diffuse_sum += d;
        specular_sum += s;
    }
    for light in lights.spot.iter().filter(|l| l.is_active()) {
        let (d, s) = shade_spot(light, position, normal, view_dir, material, light_matrix);
        diffuse_sum += d;
        specular_sum += s;
    }

    let ambient = material.ambient.xyz() * ambient_sum;
    let diffuse = material.diffuse.xyz() * diffuse_sum;
    let specular = material.specular.xyz() * specular_sum;
    (ambient + diffuse + specular).clamp(Vec3::zero(), Vec3::splat(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageBus;

    #[test]
    fn directional_light_straight_on_is_bright() {
        let messages = MessageBus::new();
        let _ = &messages;
        let mut lights = LightRegistry::new();
        lights.directional[0].diffuse = Vec3::new(1.0, 1.0, 1.0);
        lights.directional[0].direction = Vec3::new(0.0, 0.0, -1.0);
        lights.directional[0].intensity = 1.0;
        let material = Material::default();
        let normal = Vec3::new(0.0, 0.0, 1.0);
        let view_dir = Vec3::new(0.0, 0.0, 1.0);
        let color = shade_fragment(&lights, &material, Vec3::zero(), normal, view_dir, &Mat4::identity());
        assert!(color.x > 0.0);
    }

    #[test]
    fn inactive_lights_contribute_nothing() {
        let lights = LightRegistry::new();
        let material = Material::default();
        let color = shade_fragment(&lights, &material, Vec3::zero(), Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, 1.0), &Mat4::identity());
        assert!(color.equals(&Vec3::zero()));
    }

    #[test]
    fn spot_light_outside_cone_is_dark() {
        let mut lights = LightRegistry::new();
        lights.spot[0].diffuse = Vec3::new(1.0, 1.0, 1.0);
        lights.spot[0].intensity = 1.0;
        lights.spot[0].position = Vec3::new(0.0, 0.0, 5.0);
        lights.spot[0].direction = Vec3::new(1.0, 0.0, 0.0);
        lights.spot[0].cutoff_cosine = 0.99;
        let material = Material::default();
        let color = shade_fragment(&lights, &material, Vec3::zero(), Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, 1.0), &Mat4::identity());
        assert!(color.equals(&Vec3::zero()));
    }

    #[test]
    fn specular_uses_material_specular_not_diffuse() {
        let mut lights = LightRegistry::new();
        lights.directional[0].specular = Vec3::new(1.0, 1.0, 1.0);
        lights.directional[0].direction = Vec3::new(0.0, 0.0, -1.0);
        lights.directional[0].intensity = 1.0;
        let mut material = Material::default();
        material.diffuse = crate::math::Vec4::new(0.0, 0.0, 0.0, 1.0);
        material.specular = crate::math::Vec4::new(1.0, 1.0, 1.0, 1.0);
        material.shininess = 1.0;
        let normal = Vec3::new(0.0, 0.0, 1.0);
        let view_dir = Vec3::new(0.0, 0.0, 1.0);
        let color = shade_fragment(&lights, &material, Vec3::zero(), normal, view_dir, &Mat4::identity());
        assert!(color.x > 0.0, "zero material diffuse must not zero out the specular highlight");
    }

    #[test]
    fn light_matrix_rotates_directional_light_direction() {
        let mut lights = LightRegistry::new();
        lights.directional[0].diffuse = Vec3::new(1.0, 1.0, 1.0);
        lights.directional[0].direction = Vec3::new(1.0, 0.0, 0.0);
        lights.directional[0].intensity = 1.0;
        let material = Material::default();
        let normal = Vec3::new(0.0, 0.0, 1.0);
        let view_dir = Vec3::new(0.0, 0.0, 1.0);

        let identity_color = shade_fragment(&lights, &material, Vec3::zero(), normal, view_dir, &Mat4::identity());
        let rotated = Mat4::rotation(&Vec3::new(0.0, 1.0, 0.0), std::f32::consts::FRAC_PI_2);
        let rotated_color = shade_fragment(&lights, &material, Vec3::zero(), normal, view_dir, &rotated);
        assert!(!identity_color.equals(&rotated_color));
    }
}
