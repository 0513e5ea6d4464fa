//! Hydrogen 3d_z² orbital probability density, extracted at a relative threshold.
//!
//! Up/Down arrows move the threshold; the plugin re-extracts whenever the volume changes.

use bevy::prelude::*;
use bevy_marching_tetrahedra::{
    MarchingTetrahedraPlugin,
    types::{Point, Value},
    volume::{Threshold, Volume},
};

/// Half extent of the sampled region, in Bohr radii.
const EXTENT: Value = 18.0;

fn main() {
    App::new()
        .add_plugins((DefaultPlugins, MarchingTetrahedraPlugin::default()))
        .add_systems(Startup, setup)
        .add_systems(Update, adjust_threshold)
        .run();
}

/// |ψ|² of the n = 3, l = 2, m = 0 orbital with Z = a0 = 1.
fn density(p: Point) -> Value {
    use std::f64::consts::PI;

    let c = p.map(|v| v * 2.0 * EXTENT - EXTENT);
    let r = c.coords.norm();
    let theta = c.x.hypot(c.y).atan2(c.z);

    let normalization = 1.0 / (81.0 * (6.0 * PI).sqrt());
    let radial = r * r * (-r / 3.0).exp();
    let angular = 3.0 * theta.cos().powi(2) - 1.0;

    (normalization * radial * angular).powi(2)
}

fn setup(mut commands: Commands, mut materials: ResMut<Assets<StandardMaterial>>) {
    const RESOLUTION: usize = 48;
    const SIZE: f32 = 10.0;

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(SIZE * 1.5, SIZE, SIZE * 1.5).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight::default(),
        Transform::default().with_rotation(Quat::from_rotation_x(-45.0_f32.to_radians())),
    ));

    let volume = match Volume::from_fn(RESOLUTION, RESOLUTION, RESOLUTION, &density) {
        Ok(volume) => volume.with_relative_threshold(0.05),
        Err(error) => {
            error!(%error, "could not build the orbital volume");
            return;
        }
    };

    commands.spawn((
        volume,
        // Orbital z axis is the world Y axis.
        Transform::from_rotation(Quat::from_rotation_x(-90.0_f32.to_radians()))
            .with_translation(Vec3::new(-SIZE / 2.0, -SIZE / 2.0, SIZE / 2.0))
            .with_scale(Vec3::splat(SIZE)),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.4, 0.6, 1.0),
            double_sided: true,
            cull_mode: None,
            ..Default::default()
        })),
    ));
}

fn adjust_threshold(keyboard: Res<ButtonInput<KeyCode>>, mut volumes: Query<&mut Volume>) {
    let step = if keyboard.just_pressed(KeyCode::ArrowUp) {
        0.01
    } else if keyboard.just_pressed(KeyCode::ArrowDown) {
        -0.01
    } else {
        return;
    };

    for mut volume in volumes.iter_mut() {
        if let Threshold::Relative(t) = volume.threshold {
            let t = (t + step).clamp(0.001, 0.999);
            volume.threshold = Threshold::Relative(t);
            info!(threshold = t, iso = volume.iso_value(), "threshold changed");
        }
    }
}
