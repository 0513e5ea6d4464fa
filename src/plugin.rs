use bevy::{
    asset::RenderAssetUsages,
    mesh::{Indices, PrimitiveTopology},
    prelude::*,
    tasks::{AsyncComputeTaskPool, Task, block_on, futures_lite::future},
};

use crate::{
    error::Result,
    extract::{ExtractionConfig, marching_tetrahedra},
    mesh::GeneratedMesh,
    volume::Volume,
};

/// System sets for the marching tetrahedra pipeline.
///
/// Order your own systems against these, e.g. to read the mesh before it is uploaded:
///
/// ```rust,ignore
/// // Run after geometry is ready but before it's uploaded, e.g. to build a collider:
/// app.add_systems(Update, build_collider.after(MarchingTetrahedraSet::Generate)
///                                       .before(MarchingTetrahedraSet::Upload));
/// ```
///
/// ```text
/// MarchingTetrahedraSet::Spawn  →  [async compute]  →  MarchingTetrahedraSet::Generate  →  [your systems]  →  MarchingTetrahedraSet::Upload
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarchingTetrahedraSet {
    /// Spawns an async compute task for each queued volume.
    Spawn,
    /// Collects finished tasks; inserts [`GeneratedMesh`] for each success.
    Generate,
    /// Turns [`GeneratedMesh`] into a [`Mesh3d`] asset.
    Upload,
}

/// Marker component added to [`Volume`] entities that are waiting to be processed.
///
/// Removed automatically once the volume's mesh has been generated and uploaded.
#[derive(Component)]
pub struct QueuedVolume;

/// Holds the in-flight async compute task for a [`Volume`].
///
/// Inserted by [`MarchingTetrahedraSet::Spawn`], removed once the task completes
/// and [`GeneratedMesh`] has been inserted by [`MarchingTetrahedraSet::Generate`].
#[derive(Component)]
pub struct ComputeTask(Task<Result<GeneratedMesh>>);

/// Runtime configuration for the marching tetrahedra pipeline.
///
/// Inserted as a resource by [`MarchingTetrahedraPlugin`]. Modify it at any time to change behaviour:
///
/// ```rust,ignore
/// app.add_plugins(MarchingTetrahedraPlugin { max_tasks_per_frame: 8, ..default() });
///
/// // Later, from any system:
/// fn my_system(mut config: ResMut<MarchingTetrahedraConfig>) {
///     config.extraction.degenerate_edges = DegenerateEdgePolicy::Propagate;
/// }
/// ```
#[derive(Resource)]
pub struct MarchingTetrahedraConfig {
    /// Upper bound on extraction tasks started in one frame.
    ///
    /// Raising it drains a large queue sooner at the cost of frame time. Default: `4`.
    pub max_tasks_per_frame: usize,
    /// Options handed to every extraction.
    pub extraction: ExtractionConfig,
}

impl Default for MarchingTetrahedraConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: 4,
            extraction: ExtractionConfig::default(),
        }
    }
}

/// Bevy plugin that drives marching tetrahedra mesh generation.
///
/// When the `auto_queue` feature is enabled, any [`Volume`] added to the world, or
/// changed afterwards, is (re)processed. Mesh generation runs on Bevy's
/// `AsyncComputeTaskPool` so the main thread is never blocked:
///
/// ```text
/// Volume added / changed
///   → QueuedVolume inserted, stale ComputeTask dropped   (queue_changed_volumes)
///   → ComputeTask spawned                                (MarchingTetrahedraSet::Spawn)
///   → [extraction on the async compute pool]
///   → GeneratedMesh inserted                             (MarchingTetrahedraSet::Generate)
///   → [systems reading GeneratedMesh]
///   → Mesh3d inserted                                    (MarchingTetrahedraSet::Upload)
///   → QueuedVolume + GeneratedMesh removed
/// ```
///
/// The mesh is built in the volume's unit cube, so the entity's [`Transform`] is the
/// mesh's model transform.
pub struct MarchingTetrahedraPlugin {
    /// Initial value for [`MarchingTetrahedraConfig::max_tasks_per_frame`].
    pub max_tasks_per_frame: usize,
    /// Initial value for [`MarchingTetrahedraConfig::extraction`].
    pub extraction: ExtractionConfig,
}

impl Default for MarchingTetrahedraPlugin {
    fn default() -> Self {
        let config = MarchingTetrahedraConfig::default();
        Self {
            max_tasks_per_frame: config.max_tasks_per_frame,
            extraction: config.extraction,
        }
    }
}

impl Plugin for MarchingTetrahedraPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(MarchingTetrahedraConfig {
            max_tasks_per_frame: self.max_tasks_per_frame,
            extraction: self.extraction.clone(),
        });

        #[cfg(feature = "auto_queue")]
        app.configure_sets(
            Update,
            (
                MarchingTetrahedraSet::Spawn,
                MarchingTetrahedraSet::Generate,
                MarchingTetrahedraSet::Upload,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (
                queue_changed_volumes.before(MarchingTetrahedraSet::Spawn),
                spawn_mesh_tasks.in_set(MarchingTetrahedraSet::Spawn),
                poll_mesh_tasks.in_set(MarchingTetrahedraSet::Generate),
                upload_mesh.in_set(MarchingTetrahedraSet::Upload),
            ),
        );
    }
}

/// Queues every added or changed [`Volume`].
///
/// A task still running for an older version of the volume is dropped, which cancels it.
fn queue_changed_volumes(mut commands: Commands, query: Query<Entity, Changed<Volume>>) {
    for entity in query.iter() {
        commands
            .entity(entity)
            .insert(QueuedVolume)
            .remove::<(ComputeTask, GeneratedMesh)>();
    }
}

/// Spawns async compute tasks for [`QueuedVolume`]s, up to [`MarchingTetrahedraConfig::max_tasks_per_frame`] per frame.
fn spawn_mesh_tasks(
    mut commands: Commands,
    config: Res<MarchingTetrahedraConfig>,
    query: Query<
        (Entity, &Volume, &Transform),
        (With<QueuedVolume>, Without<ComputeTask>, Without<GeneratedMesh>),
    >,
) {
    let task_pool = AsyncComputeTaskPool::get();

    for (entity, volume, transform) in query.iter().take(config.max_tasks_per_frame) {
        // shares the samples through the Arc
        let volume = volume.clone();
        let extraction = config.extraction.clone();
        let transform = *transform;

        let task = task_pool
            .spawn(async move { run_marching_tetrahedra(&volume, transform, &extraction) });

        commands.entity(entity).insert(ComputeTask(task));
    }
}

/// Checks every [`ComputeTask`] once without blocking; unfinished ones wait for the next frame.
///
/// A failed extraction is logged and the volume is dequeued.
fn poll_mesh_tasks(mut commands: Commands, mut query: Query<(Entity, &mut ComputeTask)>) {
    for (entity, mut compute_task) in query.iter_mut() {
        let Some(result) = block_on(future::poll_once(&mut compute_task.0)) else {
            continue;
        };

        match result {
            Ok(generated_mesh) => {
                commands
                    .entity(entity)
                    .insert(generated_mesh)
                    .remove::<ComputeTask>();
            }
            Err(error) => {
                error!(?entity, %error, "marching tetrahedra extraction failed");
                commands
                    .entity(entity)
                    .remove::<(ComputeTask, QueuedVolume)>();
            }
        }
    }
}

/// Uploads a [`GeneratedMesh`] into a Bevy [`Mesh3d`], then removes [`GeneratedMesh`] and [`QueuedVolume`].
///
/// The mesh is rendered with the entity's current [`Transform`];
/// [`GeneratedMesh::transform`] is only read by systems between `Generate` and `Upload`.
fn upload_mesh(
    mut commands: Commands,
    query: Query<(Entity, &GeneratedMesh), With<QueuedVolume>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    for (entity, generated) in query.iter() {
        commands
            .entity(entity)
            .insert(Mesh3d(meshes.add(to_bevy_mesh(generated))))
            .remove::<(QueuedVolume, GeneratedMesh)>();
    }
}

/// Builds a triangle-list [`Mesh`] with position, normal and colour attributes.
pub fn to_bevy_mesh(generated: &GeneratedMesh) -> Mesh {
    let mut bevy_mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    );

    bevy_mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, generated.vertices.clone());
    bevy_mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, generated.normals.clone());
    bevy_mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, generated.colors.clone());
    bevy_mesh.insert_indices(Indices::U32(generated.indices.clone()));
    bevy_mesh
}

/// Extracts the surface of `volume` at [`Volume::iso_value`].
///
/// ```text
/// 1. Volume::iso_value      →  absolute iso value (relative thresholds resolved)
/// 2. marching_tetrahedra    →  GeneratedMesh
/// 3. with_transform         →  frame the volume had when the task was spawned
/// ```
fn run_marching_tetrahedra(
    volume: &Volume,
    transform: Transform,
    extraction: &ExtractionConfig,
) -> Result<GeneratedMesh> {
    marching_tetrahedra(volume, volume.iso_value(), extraction)
        .map(|mesh| mesh.with_transform(transform))
}
