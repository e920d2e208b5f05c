//! Integration test: world bring-up, stepping policy, error surfaces, and
//! teardown.

use std::sync::Arc;

use torque_arena::ScratchConfig;
use torque_core::{
    AggregateId, BackendDiagnostic, BackendError, BodyDesc, BodyHandle, ColliderShape,
    DiagnosticLevel, ForceMode, InitStage, Pose, Quat, Vec3,
};
use torque_engine::{BodyError, PhysicsWorld, StepError, Timestep, WorldConfig};
use torque_test_utils::{
    scripted_world, test_config, world_logging_to, world_with, RecordingLogSink, ScriptedBackend,
};

fn ball() -> BodyDesc {
    BodyDesc::dynamic(ColliderShape::sphere(0.5))
}

// ── Initialisation ───────────────────────────────────────────────────

#[test]
fn successful_init_announces_scene() {
    let sink = RecordingLogSink::new();
    let world = world_logging_to(sink.clone());
    let messages = sink.messages();
    assert_eq!(messages.len(), 1);
    assert!(
        messages[0].starts_with("scripted scene ready"),
        "{messages:?}"
    );
    assert!(sink.errors().is_empty());
    assert!(world.with_backend(|b| b.is_initialized()));
}

#[test]
fn backend_init_failure_reports_stage() {
    let sink = RecordingLogSink::new();
    let err = PhysicsWorld::new(
        test_config().with_log_sink(sink.clone()),
        ScriptedBackend::failing_init(InitStage::Dispatcher),
    )
    .err()
    .expect("init should fail");
    assert_eq!(err.stage, InitStage::Dispatcher);
    assert_eq!(
        sink.errors(),
        vec!["dispatcher creation failed: scripted failure".to_string()]
    );
    assert!(sink.messages().is_empty());
}

#[test]
fn invalid_config_fails_at_config_stage() {
    let sink = RecordingLogSink::new();
    let config = WorldConfig {
        worker_threads: 0,
        ..test_config()
    }
    .with_log_sink(sink.clone());
    let err = PhysicsWorld::new(config, ScriptedBackend::new())
        .err()
        .expect("init should fail");
    assert_eq!(err.stage, InitStage::Config);
    assert_eq!(sink.errors().len(), 1);
}

#[cfg(target_pointer_width = "64")]
#[test]
fn unreservable_scratch_fails_at_scratch_stage() {
    let config = test_config().with_scratch(ScratchConfig {
        reserve_size: 1 << 60,
        ..torque_test_utils::small_scratch()
    });
    let err = PhysicsWorld::new(config, ScriptedBackend::new())
        .err()
        .expect("init should fail");
    assert_eq!(err.stage, InitStage::Scratch);
}

// ── Stepping ─────────────────────────────────────────────────────────

#[test]
fn fixed_timestep_ignores_caller_dt() {
    let world = world_with(
        ScriptedBackend::new(),
        test_config().with_timestep(Timestep::Fixed { frame_rate: 50 }),
    );
    let report = world.update(123.0).unwrap();
    assert_eq!(report.dt, 0.02);
    let report = world.update(f32::NAN).unwrap();
    assert_eq!(report.dt, 0.02);
    assert_eq!(world.with_backend(|b| b.last_dt()), Some(0.02));
}

#[test]
fn variable_timestep_uses_and_validates_dt() {
    let world = scripted_world();
    assert_eq!(world.update(0.25).unwrap().dt, 0.25);
    assert_eq!(world.with_backend(|b| b.last_dt()), Some(0.25));
    for bad in [0.0, -1.0, f32::INFINITY] {
        assert_eq!(
            world.update(bad).unwrap_err(),
            StepError::InvalidTimestep { dt: bad }
        );
    }
    assert!(world.update(f32::NAN).is_err());
    assert_eq!(world.with_backend(|b| b.simulate_calls()), 1);
}

#[test]
fn step_block_is_handed_to_backend() {
    let world = scripted_world();
    world.update(0.01).unwrap();
    let expected = torque_test_utils::small_scratch().step_block_size;
    assert_eq!(world.with_backend(|b| b.last_scratch_len()), expected);
    let metrics = world.last_metrics();
    assert_eq!(metrics.scratch_used_bytes, expected);
    assert!(metrics.scratch_committed_bytes >= expected);
}

#[test]
fn gravity_moves_dynamic_bodies_only() {
    let world = world_with(
        ScriptedBackend::new(),
        WorldConfig {
            gravity: Vec3::new(0.0, -10.0, 0.0),
            ..test_config()
        },
    );
    world.add_body(BodyHandle(1), ball(), None).unwrap();
    world
        .add_body(
            BodyHandle(2),
            BodyDesc::fixed(ColliderShape::sphere(0.5))
                .at(Vec3::new(5.0, 0.0, 0.0)),
            None,
        )
        .unwrap();
    world.update(0.5).unwrap();
    assert_eq!(world.linear_velocity(BodyHandle(1)).unwrap().y, -5.0);
    assert_eq!(world.position(BodyHandle(2)).unwrap(), Vec3::new(5.0, 0.0, 0.0));
}

// ── Diagnostics ──────────────────────────────────────────────────────

#[test]
fn backend_diagnostics_reach_the_sink() {
    let sink = RecordingLogSink::new();
    let world = world_logging_to(sink.clone());
    world.with_backend_mut(|b| {
        b.inject_diagnostic(BackendDiagnostic {
            level: DiagnosticLevel::Error,
            message: "invalid mesh".into(),
            location: Some(("cooking.cpp".into(), 12)),
        });
        b.inject_diagnostic(BackendDiagnostic::error(""));
    });

    let report = world.update(0.01).unwrap();

    assert_eq!(report.metrics.backend_errors, 2);
    assert_eq!(
        sink.errors(),
        vec![
            "invalid mesh in file: cooking.cpp in line: 12".to_string(),
            "backend error".to_string(),
        ]
    );
}

#[test]
fn failed_step_still_forwards_diagnostics() {
    let sink = RecordingLogSink::new();
    let world = world_logging_to(sink.clone());
    world.with_backend_mut(|b| {
        b.inject_diagnostic(BackendDiagnostic::error("solver warning"));
        b.fail_next_simulate(BackendError::Failed {
            reason: "device lost".into(),
        });
    });

    let err = world.update(0.01).unwrap_err();

    assert_eq!(
        err,
        StepError::Backend(BackendError::Failed {
            reason: "device lost".into()
        })
    );
    assert_eq!(sink.errors(), vec!["solver warning".to_string()]);
    assert_eq!(world.step_id().0, 0);
    assert!(world.update(0.01).is_ok());
}

// ── Bodies ───────────────────────────────────────────────────────────

#[test]
fn body_bookkeeping_errors() {
    let world = scripted_world();
    world.add_body(BodyHandle(1), ball(), None).unwrap();
    assert_eq!(
        world.add_body(BodyHandle(1), ball(), None),
        Err(BodyError::DuplicateHandle {
            handle: BodyHandle(1)
        })
    );
    assert_eq!(
        world.pose(BodyHandle(7)),
        Err(BodyError::UnknownBody {
            handle: BodyHandle(7)
        })
    );
    assert!(matches!(
        world.add_body(BodyHandle(2), BodyDesc::dynamic(ColliderShape::sphere(-1.0)), None),
        Err(BodyError::Backend(BackendError::InvalidShape { .. }))
    ));
    assert_eq!(world.body_count(), 1);

    world.remove_body(BodyHandle(1)).unwrap();
    assert!(!world.contains(BodyHandle(1)));
    assert_eq!(world.with_backend(|b| b.actor_count()), 0);
    assert_eq!(
        world.remove_body(BodyHandle(1)),
        Err(BodyError::UnknownBody {
            handle: BodyHandle(1)
        })
    );
}

#[test]
fn failed_destroy_keeps_the_body_registered() {
    let world = scripted_world();
    world.add_body(BodyHandle(1), ball(), None).unwrap();
    world.add_body(BodyHandle(2), ball(), None).unwrap();
    let actor = world.actor(BodyHandle(1)).unwrap();

    world.with_backend_mut(|b| {
        b.fail_next_destroy(BackendError::Failed {
            reason: "actor locked by solver".into(),
        })
    });
    assert!(matches!(
        world.remove_body(BodyHandle(1)),
        Err(BodyError::Backend(BackendError::Failed { .. }))
    ));
    assert!(world.contains(BodyHandle(1)));
    assert_eq!(world.actor(BodyHandle(1)).unwrap(), actor);
    assert!(world.with_backend(|b| b.has_actor(actor)));

    // Reports about the surviving actor still resolve.
    let report = world.update(0.01).unwrap();
    assert_eq!(report.metrics.dropped_reports, 0);
    assert_eq!(world.collisions_entered().len(), 1);

    world.remove_body(BodyHandle(1)).unwrap();
    assert!(!world.contains(BodyHandle(1)));
    assert!(!world.with_backend(|b| b.has_actor(actor)));
}

#[test]
fn failed_destroy_restores_aggregate_membership() {
    let world = scripted_world();
    world.add_body(BodyHandle(1), ball(), None).unwrap();
    let agg = world.create_aggregate(4, true).unwrap();
    world.add_to_aggregate(agg, BodyHandle(1)).unwrap();
    let actor = world.actor(BodyHandle(1)).unwrap();

    world.with_backend_mut(|b| {
        b.fail_next_destroy(BackendError::Failed {
            reason: "busy".into(),
        })
    });
    assert!(world.remove_body(BodyHandle(1)).is_err());
    assert_eq!(world.aggregate_members(agg).unwrap(), vec![BodyHandle(1)]);
    assert_eq!(world.with_backend(|b| b.aggregate_of(actor)), Some(agg));
}

#[test]
fn teleport_mass_and_force() {
    let world = scripted_world();
    world.add_body(BodyHandle(1), ball().with_mass(2.0), None).unwrap();
    world
        .add_body(BodyHandle(2), BodyDesc::fixed(ColliderShape::sphere(1.0)), None)
        .unwrap();

    let rot = Quat::from_axis_angle(Vec3::Y, 1.0);
    world
        .set_pose(BodyHandle(1), Pose::new(Vec3::new(1.0, 2.0, 3.0), rot))
        .unwrap();
    world
        .set_position(BodyHandle(1), Vec3::new(4.0, 5.0, 6.0))
        .unwrap();
    assert_eq!(world.rotation(BodyHandle(1)).unwrap(), rot);
    assert_eq!(world.position(BodyHandle(1)).unwrap(), Vec3::new(4.0, 5.0, 6.0));

    assert_eq!(world.mass(BodyHandle(1)).unwrap(), 2.0);
    world.set_mass(BodyHandle(1), 4.0).unwrap();
    assert_eq!(world.mass(BodyHandle(1)).unwrap(), 4.0);
    assert!(matches!(
        world.set_mass(BodyHandle(1), 0.0),
        Err(BodyError::Backend(BackendError::InvalidMass { .. }))
    ));
    assert!(matches!(
        world.set_mass(BodyHandle(2), 1.0),
        Err(BodyError::Backend(BackendError::NotDynamic { .. }))
    ));

    world
        .add_force(BodyHandle(1), Vec3::new(8.0, 0.0, 0.0), ForceMode::Impulse)
        .unwrap();
    assert_eq!(
        world.linear_velocity(BodyHandle(1)).unwrap(),
        Vec3::new(2.0, 0.0, 0.0)
    );
    assert!(world
        .add_force(BodyHandle(2), Vec3::Y, ForceMode::Force)
        .is_err());
}

#[test]
fn aggregate_membership() {
    let world = scripted_world();
    for h in 1..=3 {
        world.add_body(BodyHandle(h), ball(), None).unwrap();
    }
    let agg = world.create_aggregate(2, false).unwrap();
    world.add_to_aggregate(agg, BodyHandle(1)).unwrap();
    world.add_to_aggregate(agg, BodyHandle(2)).unwrap();
    assert!(matches!(
        world.add_to_aggregate(agg, BodyHandle(3)),
        Err(BodyError::Backend(BackendError::AggregateFull { capacity: 2, .. }))
    ));
    assert_eq!(
        world.add_to_aggregate(agg, BodyHandle(1)),
        Err(BodyError::AlreadyAggregated {
            handle: BodyHandle(1),
            aggregate: agg
        })
    );
    assert_eq!(
        world.aggregate_members(agg).unwrap(),
        vec![BodyHandle(1), BodyHandle(2)]
    );

    // Members of an isolated aggregate overlap without touching.
    world.update(0.01).unwrap();
    assert_eq!(world.collisions_entered().len(), 2);

    world.remove_from_aggregate(agg, BodyHandle(2)).unwrap();
    world.remove_body(BodyHandle(1)).unwrap();
    assert!(world.aggregate_members(agg).unwrap().is_empty());
    world.release_aggregate(agg).unwrap();
    assert_eq!(
        world.aggregate_members(agg),
        Err(BodyError::UnknownAggregate { aggregate: agg })
    );
    assert!(world.release_aggregate(AggregateId(99)).is_err());
}

// ── Teardown ─────────────────────────────────────────────────────────

#[test]
fn released_world_refuses_work() {
    let sink = RecordingLogSink::new();
    let world = world_logging_to(sink.clone());
    world.add_body(BodyHandle(1), ball(), None).unwrap();

    world.release();
    world.release();

    assert!(world.is_released());
    assert!(matches!(world.update(0.01), Err(StepError::Released)));
    assert_eq!(world.add_body(BodyHandle(2), ball(), None), Err(BodyError::Released));
    assert_eq!(world.pose(BodyHandle(1)), Err(BodyError::Released));
    assert!(!world
        .raycast_from(Vec3::ZERO, Vec3::Y, 10.0, &Default::default())
        .is_hit());
    assert_eq!(world.with_backend(|b| b.releases()), 1);
    assert_eq!(
        sink.messages().iter().filter(|m| *m == "scene released").count(),
        1
    );
}

#[test]
fn dropping_an_unreleased_world_tears_down_quietly() {
    let sink = RecordingLogSink::new();
    let world = world_logging_to(sink.clone());
    world.add_body(BodyHandle(1), ball(), None).unwrap();
    world.update(0.01).unwrap();
    drop(world);
    assert!(sink.errors().is_empty());
    assert_eq!(Arc::strong_count(&sink), 1);
}
