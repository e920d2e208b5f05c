//! Integration test: raycasts and overlap queries in handle terms.

use torque_core::{
    BackendError, BodyDesc, BodyHandle, ColliderShape, FilterData, Quat, QueryFilter, Vec3,
};
use torque_engine::BodyError;
use torque_test_utils::scripted_world;

fn fixed_sphere(x: f32, z: f32) -> BodyDesc {
    BodyDesc::fixed(ColliderShape::sphere(0.5)).at(Vec3::new(x, 0.0, z))
}

#[test]
fn raycast_skips_the_caster_and_sorts_hits() {
    let world = scripted_world();
    world.add_body(BodyHandle(1), fixed_sphere(0.0, 0.0), None).unwrap();
    world.add_body(BodyHandle(2), fixed_sphere(0.0, 6.0), None).unwrap();
    world.add_body(BodyHandle(3), fixed_sphere(0.0, 3.0), None).unwrap();

    let info = world
        .raycast(BodyHandle(1), Vec3::new(0.0, 0.0, 2.0), 20.0, &QueryFilter::ALL)
        .unwrap();

    let bodies: Vec<_> = info.hits.iter().map(|h| h.body).collect();
    assert_eq!(bodies, vec![BodyHandle(3), BodyHandle(2)]);
    assert!(info.is_hit());
    let nearest = info.nearest().unwrap();
    assert!((nearest.distance - 2.5).abs() < 1e-4);
    assert!((info.position().unwrap().z - 2.5).abs() < 1e-4);
    assert_eq!(info.hit_count(), 2);
}

#[test]
fn raycast_respects_distance_and_degenerate_input() {
    let world = scripted_world();
    world.add_body(BodyHandle(1), fixed_sphere(0.0, 5.0), None).unwrap();
    let forward = Vec3::new(0.0, 0.0, 1.0);

    assert!(!world
        .raycast_from(Vec3::ZERO, forward, 4.0, &QueryFilter::ALL)
        .is_hit());
    assert!(world
        .raycast_from(Vec3::ZERO, forward, 5.0, &QueryFilter::ALL)
        .is_hit());
    assert!(!world
        .raycast_from(Vec3::ZERO, Vec3::ZERO, 50.0, &QueryFilter::ALL)
        .is_hit());
    assert!(!world
        .raycast_from(Vec3::ZERO, forward, f32::NAN, &QueryFilter::ALL)
        .is_hit());
    assert_eq!(
        world.raycast(BodyHandle(9), forward, 10.0, &QueryFilter::ALL),
        Err(BodyError::UnknownBody {
            handle: BodyHandle(9)
        })
    );
}

#[test]
fn filters_exclude_triggers_and_layers() {
    let world = scripted_world();
    world
        .add_body(BodyHandle(1), fixed_sphere(0.0, 2.0).trigger(), None)
        .unwrap();
    world
        .add_body(
            BodyHandle(2),
            fixed_sphere(0.0, 4.0).with_filter(FilterData {
                group: 0b10,
                mask: u32::MAX,
            }),
            None,
        )
        .unwrap();
    let forward = Vec3::new(0.0, 0.0, 1.0);

    let solid = world.raycast_from(Vec3::ZERO, forward, 10.0, &QueryFilter::SOLID);
    assert_eq!(solid.nearest().map(|h| h.body), Some(BodyHandle(2)));

    let layer_one = QueryFilter {
        hit_triggers: true,
        layer_mask: 0b01,
    };
    let hits = world.raycast_from(Vec3::ZERO, forward, 10.0, &layer_one);
    assert_eq!(hits.hits.iter().map(|h| h.body).collect::<Vec<_>>(), vec![BodyHandle(1)]);
}

#[test]
fn overlap_helpers_agree() {
    let world = scripted_world();
    world.add_body(BodyHandle(1), fixed_sphere(0.0, 0.0), None).unwrap();
    world.add_body(BodyHandle(2), fixed_sphere(3.0, 0.0), None).unwrap();
    world.add_body(BodyHandle(3), fixed_sphere(30.0, 0.0), None).unwrap();

    let sphere = world
        .overlap_sphere(Vec3::new(1.5, 0.0, 0.0), 1.2, &QueryFilter::ALL)
        .unwrap();
    assert_eq!(sphere.len(), 2);
    assert!(sphere.contains(BodyHandle(1)) && sphere.contains(BodyHandle(2)));

    let boxed = world
        .overlap_box(Vec3::new(30.0, 0.0, 0.0), Vec3::splat(1.0), Quat::IDENTITY, &QueryFilter::ALL)
        .unwrap();
    assert_eq!(boxed.bodies, vec![BodyHandle(3)]);

    assert!(world
        .check_capsule(Vec3::new(3.0, 2.0, 0.0), 0.5, 1.5, Quat::IDENTITY, &QueryFilter::ALL)
        .unwrap());
    assert!(!world
        .check_sphere(Vec3::new(15.0, 0.0, 0.0), 1.0, &QueryFilter::ALL)
        .unwrap());
    assert!(world
        .check_box(Vec3::ZERO, Vec3::splat(0.1), Quat::IDENTITY, &QueryFilter::ALL)
        .unwrap());
}

#[test]
fn overlap_rejects_degenerate_shapes() {
    let world = scripted_world();
    assert!(matches!(
        world.overlap_sphere(Vec3::ZERO, 0.0, &QueryFilter::ALL),
        Err(BodyError::Backend(BackendError::InvalidShape { .. }))
    ));
}
