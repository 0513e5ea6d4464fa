use bevy::{
    pbr::wireframe::{Wireframe, WireframeConfig},
    prelude::*,
};
use bevy_marching_tetrahedra::{MarchingTetrahedraPlugin, types::Point, volume::Volume};

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            // #[cfg(not(target_arch = "wasm32"))]
            bevy::pbr::wireframe::WireframePlugin::default(),
            MarchingTetrahedraPlugin::default(),
        ))
        .insert_resource(WireframeConfig {
            global: true,
            ..Default::default()
        })
        .add_systems(Startup, setup)
        .run();
}

fn setup(mut commands: Commands) {
    const RESOLUTION: usize = 16;
    const SIZE: f32 = 8.0;

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(SIZE * 1.2, SIZE * 1.4, SIZE * 1.2).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Signed distance to a sphere in the middle of the unit cube.
    let function = |p: Point| (p - Point::new(0.5, 0.5, 0.5)).norm() - 0.3;

    let volume = match Volume::from_fn(RESOLUTION, RESOLUTION, RESOLUTION, &function) {
        Ok(volume) => volume.with_threshold(0.),
        Err(error) => {
            error!(%error, "could not build the sphere volume");
            return;
        }
    };

    commands.spawn((
        volume,
        // The mesh lives in the unit cube; center it and scale it up.
        Transform::from_translation(Vec3::splat(-SIZE / 2.0)).with_scale(Vec3::splat(SIZE)),
        Wireframe,
    ));
}
