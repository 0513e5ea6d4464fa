//! Noise terrain split into a field of volumes sharing their boundary samples.
//!
//! Hold the arrow keys to scroll the noise; every edited volume is re-extracted.

use bevy::prelude::*;
use bevy_infinite_grid::{InfiniteGridBundle, InfiniteGridPlugin, InfiniteGridSettings};
use bevy_marching_tetrahedra::{MarchingTetrahedraPlugin, volume::Volume};
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};
use noiz::prelude::*;

/// Samples along x and z; neighbouring volumes overlap by one sample.
const SAMPLES: usize = 17;
const HEIGHT: usize = 65;
const FIELD_RADIUS: i32 = 4;

type TerrainNoise = Noise<
    LayeredNoise<
        Normed<f32>,
        Persistence,
        Octave<MixCellGradients<OrthoGrid, Smoothstep, QuickGradients>>,
    >,
>;

#[derive(Resource)]
struct Terrain {
    noise: TerrainNoise,
    offset: Vec3,
}

impl Default for Terrain {
    fn default() -> Self {
        let mut noise = TerrainNoise::default();
        noise.set_frequency(0.04);
        Self {
            noise,
            offset: Vec3::ZERO,
        }
    }
}

/// World-space corner of one volume.
#[derive(Component)]
struct Patch(Vec3);

fn patch_size() -> Vec3 {
    Vec3::new((SAMPLES - 1) as f32, (HEIGHT - 1) as f32, (SAMPLES - 1) as f32)
}

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            MarchingTetrahedraPlugin {
                max_tasks_per_frame: 16,
                ..default()
            },
            PanOrbitCameraPlugin,
            InfiniteGridPlugin,
        ))
        .init_resource::<Terrain>()
        .add_systems(Startup, (spawn_scene, spawn_patches))
        .add_systems(Update, scroll_terrain)
        .run();
}

fn spawn_scene(mut commands: Commands) {
    commands.spawn(InfiniteGridBundle {
        settings: InfiniteGridSettings {
            fadeout_distance: 600.0,
            ..Default::default()
        },
        ..Default::default()
    });

    commands.spawn((
        Camera3d::default(),
        PanOrbitCamera {
            button_orbit: MouseButton::Right,
            button_pan: MouseButton::Middle,
            ..default()
        },
        Transform::from_xyz(90., 120., 90.).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: light_consts::lux::OVERCAST_DAY,
            shadows_enabled: true,
            ..Default::default()
        },
        Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.9, 0.4, 0.)),
    ));
}

/// Height field turned into a density: negative below ground, positive above.
fn fill(volume: &mut Volume, terrain: &Terrain, corner: Vec3) {
    let size = patch_size();
    volume.for_each_voxel(|p, value| {
        let world = corner + Vec3::new(p.x as f32, p.y as f32, p.z as f32) * size;
        let sample: f32 = terrain.noise.sample_for(world + terrain.offset);
        *value = (world.y / size.y - 0.35 - sample * 0.3) as f64;
    });
}

fn spawn_patches(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
    terrain: Res<Terrain>,
) {
    let size = patch_size();
    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.35, 0.55, 0.25),
        perceptual_roughness: 0.9,
        ..Default::default()
    });

    for x in -FIELD_RADIUS..FIELD_RADIUS {
        for z in -FIELD_RADIUS..FIELD_RADIUS {
            let corner = Vec3::new(x as f32 * size.x, 0., z as f32 * size.z);

            let mut volume = Volume::new(SAMPLES, HEIGHT, SAMPLES).with_threshold(0.);
            fill(&mut volume, &terrain, corner);

            commands.spawn((
                volume,
                Patch(corner),
                Transform::from_translation(corner).with_scale(size),
                MeshMaterial3d(material.clone()),
            ));
        }
    }
}

fn scroll_terrain(
    time: Res<Time>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut terrain: ResMut<Terrain>,
    mut patches: Query<(&Patch, &mut Volume)>,
) {
    let mut direction = Vec3::ZERO;
    for (key, step) in [
        (KeyCode::ArrowLeft, Vec3::NEG_X),
        (KeyCode::ArrowRight, Vec3::X),
        (KeyCode::ArrowUp, Vec3::NEG_Z),
        (KeyCode::ArrowDown, Vec3::Z),
    ] {
        if keyboard.pressed(key) {
            direction += step;
        }
    }
    if direction == Vec3::ZERO {
        return;
    }

    terrain.offset += direction * 20.0 * time.delta_secs();
    for (patch, mut volume) in patches.iter_mut() {
        fill(&mut volume, &terrain, patch.0);
    }
}
