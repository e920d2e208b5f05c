//! Integration test: readers on other threads during updates, and hooks
//! that call back into the world.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam_channel::{bounded, unbounded, TryRecvError};
use torque_core::{BodyDesc, BodyHandle, ColliderShape, QueryFilter, Vec3};
use torque_engine::{FnListener, PhysicsWorld};
use torque_test_utils::{scatter_spheres, scripted_world, ScriptedBackend};

#[test]
fn readers_never_observe_a_torn_step() {
    let world = Arc::new(scripted_world());
    for (handle, desc) in scatter_spheres(42, 32, 1, 20.0, 0.75) {
        world.add_body(handle, desc, None).unwrap();
    }
    world
        .add_force(BodyHandle(1), Vec3::new(0.0, 0.0, 50.0), torque_core::ForceMode::Impulse)
        .unwrap();

    let (stop_tx, stop_rx) = bounded::<()>(0);
    let (seen_tx, seen_rx) = unbounded::<u64>();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let world = Arc::clone(&world);
            let stop = stop_rx.clone();
            let seen = seen_tx.clone();
            thread::spawn(move || {
                let mut reads = 0u64;
                loop {
                    {
                        let view = world.read();
                        let step = view.step_id();
                        for handle in view.bodies() {
                            view.position(handle).unwrap();
                        }
                        assert_eq!(view.step_id(), step);
                    }
                    world.collisions_entered();
                    world.raycast_from(Vec3::ZERO, Vec3::Y, 100.0, &QueryFilter::ALL);
                    reads += 1;
                    if let Err(TryRecvError::Disconnected) = stop.try_recv() {
                        break;
                    }
                }
                seen.send(reads).unwrap();
            })
        })
        .collect();
    drop(seen_tx);

    for _ in 0..200 {
        world.update(1.0 / 120.0).unwrap();
    }
    drop(stop_tx);

    for r in readers {
        r.join().unwrap();
    }
    let total: u64 = seen_rx.iter().sum();
    assert!(total >= 4);
    assert_eq!(world.step_id().0, 200);
}

#[test]
fn concurrent_updates_are_serialised() {
    let world = Arc::new(scripted_world());
    let threads: Vec<_> = (0..4)
        .map(|_| {
            let world = Arc::clone(&world);
            thread::spawn(move || {
                for _ in 0..25 {
                    world.update(0.01).unwrap();
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }
    assert_eq!(world.step_id().0, 100);
    assert_eq!(world.with_backend(|b| b.simulate_calls()), 100);
}

#[test]
fn hooks_can_read_query_and_remove_bodies() {
    let world: Arc<PhysicsWorld<ScriptedBackend>> = Arc::new(scripted_world());
    let poses = Arc::new(Mutex::new(Vec::new()));
    let removed = Arc::new(AtomicUsize::new(0));

    let listener = {
        let world = Arc::downgrade(&world);
        let poses = Arc::clone(&poses);
        let removed = Arc::clone(&removed);
        FnListener::new()
            .with_collision_enter(move |c| {
                let Some(world) = world.upgrade() else { return };
                poses
                    .lock()
                    .unwrap()
                    .push(world.position(c.other_body).unwrap());
                world
                    .raycast(c.this_body, Vec3::new(1.0, 0.0, 0.0), 10.0, &QueryFilter::ALL)
                    .unwrap();
                if world.remove_body(c.other_body).is_ok() {
                    removed.fetch_add(1, Ordering::Relaxed);
                }
            })
            .into_shared()
    };

    world
        .add_body(
            BodyHandle(1),
            BodyDesc::fixed(ColliderShape::sphere(1.0)),
            Some(listener),
        )
        .unwrap();
    world
        .add_body(
            BodyHandle(2),
            BodyDesc::dynamic(ColliderShape::sphere(1.0)).at(Vec3::new(1.5, 0.0, 0.0)),
            None,
        )
        .unwrap();

    world.update(0.01).unwrap();

    assert_eq!(*poses.lock().unwrap(), vec![Vec3::new(1.5, 0.0, 0.0)]);
    assert_eq!(removed.load(Ordering::Relaxed), 1);
    assert!(!world.contains(BodyHandle(2)));
    assert!(world.collisions_entered().is_empty());

    world.update(0.01).unwrap();
    assert!(world.collisions_exited().is_empty());
}
