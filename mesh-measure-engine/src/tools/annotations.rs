//! Transient measurement annotations.
//!
//! Markers are emissive spheres at world-frame pick points, owned by the
//! scene root; segments are thin oriented cuboids between two local-frame
//! points, spawned as children of the measured model so they follow its
//! rotation. `AnnotationSet` is the registry of everything currently
//! displayed; a new measurement always starts from an empty set.

use bevy::prelude::*;

use constants::render_settings::{
    MIN_SEGMENT_LENGTH, PICK_MARKER_COLOR, PICK_MARKER_RADIUS, SEGMENT_THICKNESS,
};

use crate::engine::geometry::{LocalPoint, WorldPoint};

#[derive(Component)]
pub struct PickMarker;

#[derive(Component)]
pub struct MeasureSegment;

/// Registry of live annotation entities.
#[derive(Resource, Default)]
pub struct AnnotationSet {
    markers: Vec<Entity>,
    segments: Vec<Entity>,
}

impl AnnotationSet {
    pub fn live_count(&self) -> usize {
        self.markers.len() + self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.segments.is_empty()
    }
}

fn annotation_material(color: [f32; 3]) -> StandardMaterial {
    let [r, g, b] = color;
    StandardMaterial {
        base_color: Color::srgb(r, g, b),
        emissive: LinearRgba::new(r, g, b, 1.0),
        unlit: true,
        ..default()
    }
}

/// Create and display a marker sphere at a world-frame point.
pub fn spawn_marker(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    annotations: &mut AnnotationSet,
    point: WorldPoint,
) {
    let entity = commands
        .spawn((
            Mesh3d(meshes.add(Sphere::new(PICK_MARKER_RADIUS))),
            MeshMaterial3d(materials.add(annotation_material(PICK_MARKER_COLOR))),
            Transform::from_translation(point.as_vec3()),
            PickMarker,
        ))
        .id();
    annotations.markers.push(entity);
}

/// Create a segment between two local-frame points as a child of `model`.
/// Spans shorter than `MIN_SEGMENT_LENGTH` spawn nothing.
pub fn spawn_segment(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    annotations: &mut AnnotationSet,
    model: Entity,
    a: LocalPoint,
    b: LocalPoint,
    color: [f32; 3],
) {
    let span = b.as_vec3() - a.as_vec3();
    let length = span.length();
    if length < MIN_SEGMENT_LENGTH {
        return;
    }
    let midpoint = (a.as_vec3() + b.as_vec3()) * 0.5;
    let rotation = Quat::from_rotation_arc(Vec3::X, span / length);
    let mesh = Mesh3d(meshes.add(Cuboid::new(length, SEGMENT_THICKNESS, SEGMENT_THICKNESS)));
    let material = MeshMaterial3d(materials.add(annotation_material(color)));
    let mut entity = Entity::PLACEHOLDER;
    commands.entity(model).with_children(|parent| {
        entity = parent
            .spawn((
                mesh,
                material,
                Transform::from_translation(midpoint).with_rotation(rotation),
                MeasureSegment,
            ))
            .id();
    });
    annotations.segments.push(entity);
}

/// Remove every live annotation from display and empty both registries.
/// Idempotent: an empty set is a no-op.
pub fn clear_annotations(commands: &mut Commands, annotations: &mut AnnotationSet) {
    for entity in annotations.markers.drain(..) {
        commands.entity(entity).despawn();
    }
    for entity in annotations.segments.drain(..) {
        commands.entity(entity).despawn();
    }
}
