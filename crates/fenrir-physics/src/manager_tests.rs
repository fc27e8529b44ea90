//! Integration tests for the physics manager: determinism, accumulator
//! behavior, sleep transitions, collision contracts, and body lifecycle.

use fenrir_math::{Fixed, FixedVec3};

use crate::body::{BodySpec, BodyType, GROUND_BODY_ID, PLAYER_BODY_ID};
use crate::config::PhysicsConfig;
use crate::constraint::{DistanceConstraint, RangeConstraint};
use crate::layers::layer;
use crate::manager::PhysicsManager;

/// Config with gravity disabled, for tests that need bodies to hold
/// still unless acted upon.
fn zero_gravity_config() -> PhysicsConfig {
    PhysicsConfig {
        gravity: FixedVec3::ZERO,
        ..PhysicsConfig::default()
    }
}

fn dynamic_spec(x: f32, y: f32, radius: f32) -> BodySpec {
    BodySpec {
        position: FixedVec3::from_f32(x, y, 0.0),
        radius: Fixed::from_f32(radius),
        ..BodySpec::default()
    }
}

#[test]
fn test_initialize_creates_player_body() {
    let manager = PhysicsManager::new(PhysicsConfig::default());
    assert_eq!(manager.body_count(), 1);
    let player = manager.get_body(PLAYER_BODY_ID).unwrap();
    assert_eq!(player.body_type, BodyType::Knockback);
    assert_eq!(player.mass, Fixed::from_int(70));
    assert_eq!(player.collision_layer, layer::PLAYER);
    assert_eq!(player.collision_mask, layer::ENEMY | layer::ENVIRONMENT);
}

#[test]
fn test_reset_restores_initial_state() {
    let mut manager = PhysicsManager::new(PhysicsConfig::default());
    manager
        .create_wolf_body(Fixed::ONE, Fixed::ONE, Fixed::from_f32(0.04))
        .unwrap();
    manager.update(0.1);
    manager.reset();
    assert_eq!(manager.body_count(), 1);
    assert_eq!(manager.tick_accumulator(), 0);
    assert!(manager.get_body(PLAYER_BODY_ID).is_some());
}

#[test]
fn test_determinism_identical_sequences() {
    let run = || {
        let mut manager = PhysicsManager::new(PhysicsConfig::default());
        let wolf = manager
            .create_wolf_body(Fixed::from_f32(0.8), Fixed::from_int(2), Fixed::from_f32(0.04))
            .unwrap();
        manager.apply_impulse(wolf, FixedVec3::from_f32(1.5, 0.5, 0.0));
        for _ in 0..120 {
            manager.update(1.0 / 60.0);
        }
        let body = manager.get_body(wolf).unwrap();
        (
            body.position.x.to_raw(),
            body.position.y.to_raw(),
            body.velocity.x.to_raw(),
            body.velocity.y.to_raw(),
        )
    };
    assert_eq!(run(), run());
}

#[test]
fn test_accumulator_small_vs_large_updates() {
    let build = || {
        let mut manager = PhysicsManager::new(PhysicsConfig {
            max_iterations: 16,
            ..PhysicsConfig::default()
        });
        let wolf = manager
            .create_wolf_body(Fixed::ZERO, Fixed::from_int(5), Fixed::from_f32(0.04))
            .unwrap();
        (manager, wolf)
    };

    // 100 ms delivered as 10×10 ms vs 2×50 ms.
    let (mut small, wolf_a) = build();
    for _ in 0..10 {
        small.update(0.01);
    }
    let (mut large, wolf_b) = build();
    for _ in 0..2 {
        large.update(0.05);
    }

    let a = small.get_body(wolf_a).unwrap();
    let b = large.get_body(wolf_b).unwrap();
    assert_eq!(a.position.y.to_raw(), b.position.y.to_raw());
    assert_eq!(a.velocity.y.to_raw(), b.velocity.y.to_raw());
    assert_eq!(small.tick_accumulator(), large.tick_accumulator());
}

#[test]
fn test_update_caps_steps_and_banks_leftover() {
    let mut manager = PhysicsManager::new(PhysicsConfig::default());
    // One second of host stall: 60 steps owed, only max_iterations run.
    manager.update(1.0);
    let step_us = manager.config().timestep_us;
    let expected_left = 1_000_000 - step_us * manager.config().max_iterations as i64;
    assert_eq!(manager.tick_accumulator(), expected_left);
}

#[test]
fn test_update_ignores_non_positive_dt() {
    let mut manager = PhysicsManager::new(PhysicsConfig::default());
    manager.update(0.0);
    manager.update(-1.0);
    assert_eq!(manager.tick_accumulator(), 0);
}

#[test]
fn test_sub_timestep_remainder_carries_over() {
    let mut manager = PhysicsManager::new(PhysicsConfig::default());
    // 10 ms < one 16.666 ms step: nothing runs, time banks.
    manager.update(0.01);
    assert_eq!(manager.tick_accumulator(), 10_000);
    // Second 10 ms banks enough for exactly one step.
    manager.update(0.01);
    assert_eq!(manager.tick_accumulator(), 20_000 - manager.config().timestep_us);
}

#[test]
fn test_dynamic_body_falls_under_gravity() {
    let mut manager = PhysicsManager::new(PhysicsConfig::default());
    let wolf = manager
        .create_wolf_body(Fixed::ZERO, Fixed::from_int(5), Fixed::from_f32(0.04))
        .unwrap();
    for _ in 0..30 {
        manager.update(1.0 / 60.0);
    }
    let body = manager.get_body(wolf).unwrap();
    assert!(body.position.y < Fixed::from_int(5), "body did not fall");
    assert!(body.velocity.y < Fixed::ZERO);
}

#[test]
fn test_sleep_after_sustained_low_motion() {
    let mut manager = PhysicsManager::new(zero_gravity_config());
    let id = manager.create_body(&dynamic_spec(2.0, 2.0, 0.05)).unwrap();
    // 1.5 simulated seconds of stillness.
    for _ in 0..100 {
        manager.update(1.0 / 60.0);
    }
    let body = manager.get_body(id).unwrap();
    assert!(body.is_sleeping);
    assert!(body.velocity.is_zero());
    assert!(body.acceleration.is_zero());
}

#[test]
fn test_impulse_wakes_sleeping_body() {
    let mut manager = PhysicsManager::new(zero_gravity_config());
    let id = manager.create_body(&dynamic_spec(2.0, 2.0, 0.05)).unwrap();
    for _ in 0..100 {
        manager.update(1.0 / 60.0);
    }
    assert!(manager.get_body(id).unwrap().is_sleeping);

    manager.apply_impulse(id, FixedVec3::from_ints(70, 0, 0));
    let body = manager.get_body(id).unwrap();
    assert!(!body.is_sleeping);
    assert!(body.velocity.x > Fixed::ZERO);
}

#[test]
fn test_overlapping_spheres_separate_after_step() {
    let mut manager = PhysicsManager::new(zero_gravity_config());
    let a = manager.create_body(&dynamic_spec(2.0, 2.0, 0.05)).unwrap();
    let b = manager.create_body(&dynamic_spec(2.06, 2.0, 0.05)).unwrap();
    manager.update(1.0 / 60.0);

    let pa = manager.get_body(a).unwrap();
    let pb = manager.get_body(b).unwrap();
    let dist = (pb.position - pa.position).length();
    let combined = pa.radius + pb.radius;
    assert!(dist >= combined, "still penetrating: {dist} < {combined}");

    let normal = (pb.position - pa.position).normalized();
    let closing = (pb.velocity - pa.velocity).dot(normal);
    assert!(closing >= Fixed::ZERO);
}

#[test]
fn test_ground_clamp_exact_and_restitution() {
    let mut manager = PhysicsManager::new(PhysicsConfig::default());
    let spec = BodySpec {
        position: FixedVec3::from_f32(3.0, 0.06, 0.0),
        radius: Fixed::from_f32(0.05),
        restitution: Fixed::from_ratio(3, 10),
        friction: Fixed::ONE,
        drag: Fixed::ONE,
        ..BodySpec::default()
    };
    let id = manager.create_body(&spec).unwrap();
    manager.set_velocity(id, FixedVec3::from_ints(0, -2, 0));
    manager.update(1.0 / 60.0);

    let body = manager.get_body(id).unwrap();
    // Lower extent sits exactly on the plane.
    assert_eq!(body.position.y, body.radius);
    // Vertical velocity reflected by restitution (drag = 1, so only the
    // one gravity tick perturbs the pre-impact speed).
    assert!(body.velocity.y > Fixed::ZERO);
    let ground_events: Vec<_> = manager
        .drain_events()
        .filter(|e| e.body_b == GROUND_BODY_ID)
        .collect();
    assert_eq!(ground_events.len(), 1);
    assert_eq!(ground_events[0].body_a, id);
}

#[test]
fn test_layer_mask_exclusion_prevents_collision() {
    let mut manager = PhysicsManager::new(zero_gravity_config());
    // Two player-layer bodies masking only enemies/environment: never
    // collide with each other even when overlapping.
    let spec = BodySpec {
        position: FixedVec3::from_f32(2.0, 2.0, 0.0),
        radius: Fixed::from_f32(0.05),
        collision_layer: layer::PLAYER,
        collision_mask: layer::ENEMY | layer::ENVIRONMENT,
        ..BodySpec::default()
    };
    let a = manager.create_body(&spec).unwrap();
    let spec_b = BodySpec {
        position: FixedVec3::from_f32(2.04, 2.0, 0.0),
        ..spec
    };
    let b = manager.create_body(&spec_b).unwrap();
    manager.update(1.0 / 60.0);

    let pa = manager.get_body(a).unwrap();
    let pb = manager.get_body(b).unwrap();
    let dist = (pb.position - pa.position).length();
    assert!(dist < pa.radius + pb.radius, "excluded pair was separated");
    assert!(manager.events().is_empty());
    assert_eq!(manager.collisions_resolved(), 0);
}

#[test]
fn test_broadphase_matches_naive_for_small_bodies() {
    let run = |broadphase: bool| {
        let mut manager = PhysicsManager::new(zero_gravity_config());
        manager.enable_broadphase(broadphase);
        let mut ids = Vec::new();
        for i in 0..8 {
            let x = 1.0 + (i as f32) * 0.07;
            ids.push(manager.create_body(&dynamic_spec(x, 2.0, 0.04)).unwrap());
        }
        for _ in 0..30 {
            manager.update(1.0 / 60.0);
        }
        ids.iter()
            .map(|&id| {
                let b = manager.get_body(id).unwrap();
                (b.position.x.to_raw(), b.position.y.to_raw())
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(run(false), run(true));
}

#[test]
fn test_destroy_body_purges_constraints_and_patches_map() {
    let mut manager = PhysicsManager::new(zero_gravity_config());
    let a = manager.create_body(&dynamic_spec(1.0, 1.0, 0.05)).unwrap();
    let b = manager.create_body(&dynamic_spec(2.0, 1.0, 0.05)).unwrap();
    let c = manager.create_body(&dynamic_spec(3.0, 1.0, 0.05)).unwrap();
    manager.add_distance_constraint(DistanceConstraint {
        body_a: a,
        body_b: b,
        rest_length: Fixed::ONE,
        stiffness: Fixed::HALF,
    });
    manager.add_range_constraint(RangeConstraint {
        body_a: b,
        body_b: c,
        min_length: Fixed::ZERO,
        max_length: Fixed::from_int(2),
        stiffness: Fixed::HALF,
    });

    manager.destroy_body(b);
    assert_eq!(manager.body_count(), 3); // player + a + c
    assert!(manager.get_body(b).is_none());
    // Swap-removed storage still resolves the moved body correctly.
    let pc = manager.get_body(c).unwrap();
    assert_eq!(pc.id, c);
    assert_eq!(pc.position.x, Fixed::from_int(3));
    // Constraints referencing b are gone; stepping runs cleanly.
    manager.update(0.1);
}

#[test]
fn test_destroy_unknown_id_is_noop() {
    let mut manager = PhysicsManager::new(PhysicsConfig::default());
    manager.destroy_body(12345);
    assert_eq!(manager.body_count(), 1);
}

#[test]
fn test_mutators_ignore_unknown_ids() {
    let mut manager = PhysicsManager::new(PhysicsConfig::default());
    manager.apply_impulse(999, FixedVec3::from_ints(1, 0, 0));
    manager.apply_force(999, FixedVec3::from_ints(1, 0, 0));
    manager.set_velocity(999, FixedVec3::from_ints(1, 0, 0));
    manager.set_position(999, FixedVec3::from_ints(1, 0, 0));
}

#[test]
fn test_ids_strictly_increase_and_never_reuse() {
    let mut manager = PhysicsManager::new(PhysicsConfig::default());
    let a = manager.create_body(&dynamic_spec(1.0, 1.0, 0.05)).unwrap();
    manager.destroy_body(a);
    let b = manager.create_body(&dynamic_spec(1.0, 1.0, 0.05)).unwrap();
    assert!(b > a);
}

#[test]
fn test_knockback_body_decays_to_rest() {
    let mut manager = PhysicsManager::new(zero_gravity_config());
    let start = manager.get_body(PLAYER_BODY_ID).unwrap().position;
    manager.apply_impulse(PLAYER_BODY_ID, FixedVec3::from_ints(140, 0, 0));
    for _ in 0..180 {
        manager.update(1.0 / 60.0);
    }
    let player = manager.get_body(PLAYER_BODY_ID).unwrap();
    // Knockback moved the player, then drag decayed it to a full stop.
    assert!(player.position.x > start.x);
    assert!(player.velocity.is_zero());
    assert!(!player.should_simulate());
}

#[test]
fn test_player_ignores_gravity() {
    let mut manager = PhysicsManager::new(PhysicsConfig::default());
    let before = manager.get_body(PLAYER_BODY_ID).unwrap().position.y;
    for _ in 0..60 {
        manager.update(1.0 / 60.0);
    }
    let after = manager.get_body(PLAYER_BODY_ID).unwrap().position.y;
    assert_eq!(before.to_raw(), after.to_raw());
}

#[test]
fn test_world_bounds_clamp_and_zero_velocity() {
    let mut manager = PhysicsManager::new(zero_gravity_config());
    let id = manager.create_body(&dynamic_spec(9.5, 2.0, 0.05)).unwrap();
    manager.set_velocity(id, FixedVec3::from_ints(40, 0, 0));
    for _ in 0..30 {
        manager.update(1.0 / 60.0);
    }
    let body = manager.get_body(id).unwrap();
    assert_eq!(body.position.x, manager.config().world_max.x);
    assert_eq!(body.velocity.x, Fixed::ZERO);
}

#[test]
fn test_counters_track_work() {
    let mut manager = PhysicsManager::new(zero_gravity_config());
    manager.create_body(&dynamic_spec(2.0, 2.0, 0.05)).unwrap();
    manager.create_body(&dynamic_spec(2.06, 2.0, 0.05)).unwrap();
    manager.update(1.0 / 60.0);
    assert!(manager.pairs_checked() > 0);
    assert!(manager.collisions_resolved() > 0);
}

#[test]
fn test_events_drain_once_per_frame() {
    let mut manager = PhysicsManager::new(zero_gravity_config());
    manager.create_body(&dynamic_spec(2.0, 2.0, 0.05)).unwrap();
    manager.create_body(&dynamic_spec(2.06, 2.0, 0.05)).unwrap();
    manager.update(1.0 / 60.0);
    let first: Vec<_> = manager.drain_events().collect();
    assert!(!first.is_empty());
    assert!(manager.events().is_empty());
}

#[test]
fn test_distance_constraint_convergence_through_manager() {
    let mut manager = PhysicsManager::new(zero_gravity_config());
    let a = manager.create_body(&dynamic_spec(1.0, 2.0, 0.01)).unwrap();
    let b = manager.create_body(&dynamic_spec(4.0, 2.0, 0.01)).unwrap();
    manager.add_distance_constraint(DistanceConstraint {
        body_a: a,
        body_b: b,
        rest_length: Fixed::from_int(1),
        stiffness: Fixed::HALF,
    });
    for _ in 0..30 {
        manager.update(1.0 / 60.0);
    }
    let pa = manager.get_body(a).unwrap().position;
    let pb = manager.get_body(b).unwrap().position;
    let dist = (pb - pa).length();
    assert!(
        (dist - Fixed::ONE).abs() < Fixed::from_ratio(1, 50),
        "constraint did not converge: {dist}"
    );
}

#[test]
fn test_wolf_body_defaults() {
    let mut manager = PhysicsManager::new(PhysicsConfig::default());
    let wolf = manager
        .create_wolf_body(Fixed::ONE, Fixed::ONE, Fixed::from_f32(0.04))
        .unwrap();
    let body = manager.get_body(wolf).unwrap();
    assert_eq!(body.body_type, BodyType::Dynamic);
    assert_eq!(body.mass, Fixed::from_int(40));
    assert_eq!(body.collision_layer, layer::ENEMY);
    assert!(body.collision_mask & layer::PLAYER != 0);
}

#[test]
fn test_wolf_body_invalid_radius_rejected() {
    let mut manager = PhysicsManager::new(PhysicsConfig::default());
    assert!(manager
        .create_wolf_body(Fixed::ONE, Fixed::ONE, Fixed::ZERO)
        .is_err());
}
