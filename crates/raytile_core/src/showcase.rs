//! The stock showcase scene.
//!
//! An open box of five walls (mirror floor and back wall), a yellow
//! sphere, a green cube, a red mirror cube and a stack of small mirror
//! cubes, lit by three point lights and one spot light.

use std::sync::Arc;

use raytile_math::Vec3;

use crate::scene::{color_from_hex, CameraRig, Geometry, Light, Material, Scene, SceneObject, Transform};

const LIGHT_INTENSITY: f32 = 70_000.0;

/// Build the showcase scene.
pub fn scene() -> Scene {
    let mut scene = Scene::new("showcase");
    scene.camera = CameraRig::default();
    add_lights(&mut scene);
    add_geometry(&mut scene);
    scene
}

fn add_lights(scene: &mut Scene) {
    let white = color_from_hex(0xffffff);
    let warm = color_from_hex(0xffe61a);

    scene.add_light(Light::point(Vec3::new(15.0, -85.0, 200.0), white, LIGHT_INTENSITY * 1.3));
    scene.add_light(Light::point(Vec3::new(-280.0, 250.0, 20.0), warm, LIGHT_INTENSITY));
    scene.add_light(Light::point(Vec3::new(90.0, -275.0, 260.0), warm, LIGHT_INTENSITY * 1.75));
    scene.add_light(Light::spot(Vec3::new(280.0, 250.0, 2.0), white, LIGHT_INTENSITY * 1.8));
}

fn add_geometry(scene: &mut Scene) {
    let phong = |name: &str, hex: u32| Arc::new(Material::new(name, color_from_hex(hex), 150.0));
    let mirror = |name: &str, hex: u32| {
        Arc::new(Material::new(name, color_from_hex(hex), 10_000.0).with_mirror(0.3))
    };

    let red = phong("red", 0xff0000);
    let green = phong("green", 0x00ff00);
    let dark_green = phong("dark_green", 0x006400);
    let blue = phong("blue", 0x0000ff);
    let yellow = phong("yellow", 0xffff00);

    let mirror_orange = mirror("mirror_orange", 0xffaa00);
    let mirror_ruby = mirror("mirror_ruby", 0x9b111e);
    let mirror_grey = mirror("mirror_grey", 0x585858);
    let mirror_blue = mirror("mirror_blue", 0x77b5fe);

    let sphere = Geometry::Sphere { radius: 100.0 };
    let plane = Geometry::Cuboid {
        size: Vec3::new(600.0, 5.0, 600.0),
    };
    let cube = Geometry::Cuboid {
        size: Vec3::splat(100.0),
    };

    scene.add_object(SceneObject::new(
        "sphere",
        sphere,
        &Transform::from_translation(Vec3::new(-50.0, -245.0, -50.0)).with_uniform_scale(0.5),
        yellow,
    ));

    scene.add_object(SceneObject::new(
        "mirror_box",
        cube,
        &Transform::from_translation(Vec3::new(-175.0, -247.5, -150.0)).with_euler(0.0, 0.5, 0.0),
        mirror_ruby,
    ));

    scene.add_object(SceneObject::new(
        "green_box",
        cube,
        &Transform::from_translation(Vec3::new(75.0, -262.5, -75.0)).with_uniform_scale(0.6),
        green,
    ));

    let stack = [
        Vec3::new(200.0, -272.5, -200.0),
        Vec3::new(230.0, -272.5, -160.0),
        Vec3::new(215.0, -227.5, -180.0),
        Vec3::new(200.0, -182.5, -200.0),
        Vec3::new(230.0, -182.5, -160.0),
        Vec3::new(215.0, -137.5, -180.0),
    ];
    for (i, position) in stack.into_iter().enumerate() {
        scene.add_object(SceneObject::new(
            format!("small_box_{}", i + 1),
            cube,
            &Transform::from_translation(position)
                .with_euler(0.0, 0.5, 0.0)
                .with_uniform_scale(0.37),
            mirror_blue.clone(),
        ));
    }

    scene.add_object(SceneObject::new(
        "floor",
        plane,
        &Transform::from_translation(Vec3::new(0.0, -297.5, -300.0)),
        mirror_orange,
    ));
    scene.add_object(SceneObject::new(
        "ceiling",
        plane,
        &Transform::from_translation(Vec3::new(0.0, 297.5, -300.0)),
        dark_green,
    ));
    scene.add_object(SceneObject::new(
        "back_wall",
        plane,
        &Transform::from_translation(Vec3::new(0.0, 0.0, -300.0)).with_euler(1.57, 0.0, 0.0),
        mirror_grey,
    ));
    scene.add_object(SceneObject::new(
        "left_wall",
        plane,
        &Transform::from_translation(Vec3::new(-300.0, 0.0, -300.0)).with_euler(0.0, 0.0, 1.57),
        blue,
    ));
    scene.add_object(SceneObject::new(
        "right_wall",
        plane,
        &Transform::from_translation(Vec3::new(300.0, 0.0, -300.0)).with_euler(0.0, 0.0, 1.57),
        red,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_showcase_is_renderable() {
        let scene = scene();
        assert!(scene.validate().is_ok());
        assert_eq!(scene.lights.len(), 4);
        assert_eq!(scene.objects.len(), 14);
    }

    #[test]
    fn test_showcase_mirrors() {
        let scene = scene();
        let mirrors = scene.objects.iter().filter(|o| o.material.mirror).count();
        // ruby box, six small boxes, floor, back wall
        assert_eq!(mirrors, 9);
    }
}
