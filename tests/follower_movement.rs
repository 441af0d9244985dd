//! Follower movement integration tests

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use formation_ai::core::types::{ActorId, SpawnId};
use formation_ai::formation::{FormationSettings, FormationStore, FormationType};
use formation_ai::movement::{MotionSlot, MovementFlags, MovementGeneratorType, UnitState};
use formation_ai::world::{CollisionMap, Unit, UnitAi, World};
use glam::Vec2;

#[derive(Debug, Default)]
struct RecordingAi {
    informs: Rc<RefCell<Vec<(MovementGeneratorType, u32)>>>,
}

impl UnitAi for RecordingAi {
    fn movement_inform(&mut self, kind: MovementGeneratorType, id: u32) {
        self.informs.borrow_mut().push((kind, id));
    }
}

fn single_file_store(radius: f32) -> Arc<FormationStore> {
    let mut store = FormationStore::new();
    store.insert_settings(
        SpawnId(1),
        FormationSettings {
            formation_type: FormationType::SingleFile,
            radius,
        },
    );
    Arc::new(store)
}

fn run(world: &mut World, ticks: u32) {
    for _ in 0..ticks {
        world.update(100);
    }
}

#[test]
fn test_followers_settle_behind_creature_leader() {
    let mut world = World::with_store(single_file_store(2.0));
    let leader = world.spawn(Unit::creature(Some(SpawnId(1)), Vec2::ZERO));
    let mut followers = Vec::new();
    for i in 0..3 {
        let id = world.spawn(Unit::creature(None, Vec2::new(-3.0, 2.0 * i as f32)));
        world.add_follower(leader, id, i).unwrap();
        followers.push(id);
    }

    world.move_point(leader, 1, Vec2::new(40.0, 0.0)).unwrap();
    run(&mut world, 100);

    let leader_unit = world.unit(leader).unwrap();
    assert_eq!(leader_unit.position, Vec2::new(40.0, 0.0));
    assert!(leader_unit.motion_master.is_empty());

    for (i, id) in followers.iter().enumerate() {
        let unit = world.unit(*id).unwrap();
        let slot = Vec2::new(40.0 - 2.0 * (i + 1) as f32, 0.0);
        assert!(
            unit.position.distance(slot) < 0.05,
            "follower {} at {:?}, slot {:?}",
            i,
            unit.position,
            slot
        );
        assert!(!unit.has_state(UnitState::ROAMING_MOVE));
        assert_eq!(unit.home_position, unit.position);
    }
}

#[test]
fn test_followers_keep_pace_while_leader_moves() {
    let mut world = World::with_store(single_file_store(2.0));
    let leader = world.spawn(Unit::creature(Some(SpawnId(1)), Vec2::ZERO));
    let follower = world.spawn(Unit::creature(None, Vec2::new(-2.0, 0.0)));
    world.add_follower(leader, follower, 0).unwrap();

    world.move_point(leader, 1, Vec2::new(200.0, 0.0)).unwrap();
    run(&mut world, 50);

    let leader_position = world.unit(leader).unwrap().position;
    let follower_unit = world.unit(follower).unwrap();
    assert!(follower_unit.is_moving());
    assert!(follower_unit.position.x < leader_position.x);
    // Never more than the prediction horizon plus the capped catch-up behind
    assert!(leader_position.x - follower_unit.position.x < 15.0);
}

#[test]
fn test_moving_player_leader_is_predicted_one_second_ahead() {
    let mut world = World::with_store(single_file_store(2.0));
    let leader = world.spawn(Unit::player(Vec2::ZERO));
    world
        .set_formation_type(leader, FormationType::SingleFile)
        .unwrap();
    world.set_follower_distance(leader, 2.0).unwrap();
    let follower = world.spawn(Unit::creature(None, Vec2::new(-2.0, 3.0)));
    world.add_follower(leader, follower, 0).unwrap();

    world.unit_mut(leader).unwrap().movement_flags = MovementFlags::FORWARD;
    world.update(100);

    let leader_position = world.unit(leader).unwrap().position;
    assert!((leader_position - Vec2::new(0.7, 0.0)).length() < 1e-4);
    let destination = world.unit(follower).unwrap().move_spline.current_destination();
    assert!((destination - Vec2::new(5.7, 0.0)).length() < 1e-3);
}

#[test]
fn test_stopped_player_leader_draws_followers_to_its_position() {
    let mut world = World::with_store(single_file_store(2.0));
    let leader = world.spawn(Unit::player(Vec2::ZERO));
    world
        .set_formation_type(leader, FormationType::SingleFile)
        .unwrap();
    let follower = world.spawn(Unit::creature(None, Vec2::new(-2.0, 3.0)));
    world.add_follower(leader, follower, 0).unwrap();

    world.unit_mut(leader).unwrap().movement_flags = MovementFlags::FORWARD;
    world.update(100);
    let first_destination = world.unit(follower).unwrap().move_spline.current_destination();
    world.unit_mut(leader).unwrap().stop_moving();

    // Player cadence is 400 ms: the first path stands until three ticks later
    run(&mut world, 2);
    assert_eq!(
        world.unit(follower).unwrap().move_spline.current_destination(),
        first_destination
    );
    world.update(100);

    let leader_position = world.unit(leader).unwrap().position;
    let destination = world.unit(follower).unwrap().move_spline.current_destination();
    assert!((destination - leader_position).length() < 1e-4);
}

#[test]
fn test_unbounded_random_radius_does_not_panic() {
    let toml = r#"
[[settings]]
leader_spawn_id = 1
formation_type = 0
radius = inf
"#;
    let store = FormationStore::from_toml_str(toml).unwrap();
    let mut world = World::with_store(Arc::new(store));
    let leader = world.spawn(Unit::creature(Some(SpawnId(1)), Vec2::ZERO));
    let follower = world.spawn(Unit::creature(None, Vec2::new(-3.0, 0.0)));
    world.add_follower(leader, follower, 0).unwrap();
    assert_eq!(
        world.formation(leader).unwrap().formation_type(),
        FormationType::GridBehindLeader
    );

    world.set_follower_distance(leader, f32::NAN).unwrap();
    world.set_formation_type(leader, FormationType::Random).unwrap();
    assert_eq!(
        world.formation(leader).unwrap().follower(follower).unwrap().offset,
        Vec2::ZERO
    );
    world.set_follower_distance(leader, f32::INFINITY).unwrap();
    run(&mut world, 3);
    assert!(world.unit(follower).unwrap().position.is_finite());
}

#[test]
fn test_missing_leader_tears_down_generator() {
    let mut world = World::with_store(Arc::new(FormationStore::new()));
    let follower = world.spawn(Unit::creature(None, Vec2::ZERO));
    world
        .unit_mut(follower)
        .unwrap()
        .move_formation(ActorId::new(), Vec2::new(-3.0, 0.0));
    assert!(world.unit(follower).unwrap().has_state(UnitState::ROAMING));

    world.update(100);

    let unit = world.unit(follower).unwrap();
    assert!(unit.motion_master.is_empty());
    assert!(!unit.has_state(UnitState::ROAMING));
}

#[test]
fn test_rooted_follower_stops_and_resumes() {
    let mut world = World::with_store(single_file_store(2.0));
    let leader = world.spawn(Unit::creature(Some(SpawnId(1)), Vec2::ZERO));
    let follower = world.spawn(Unit::creature(None, Vec2::new(-3.0, 0.0)));
    world.add_follower(leader, follower, 0).unwrap();
    world.move_point(leader, 1, Vec2::new(100.0, 0.0)).unwrap();
    run(&mut world, 5);
    assert!(world.unit(follower).unwrap().is_moving());

    world.unit_mut(follower).unwrap().add_state(UnitState::ROOT);
    world.update(100);
    let frozen = world.unit(follower).unwrap().position;
    assert!(world.unit(follower).unwrap().move_spline.finalized());

    run(&mut world, 3);
    assert_eq!(world.unit(follower).unwrap().position, frozen);
    assert!(!world.unit(follower).unwrap().has_state(UnitState::ROAMING_MOVE));

    world.unit_mut(follower).unwrap().clear_state(UnitState::ROOT);
    world.update(100);
    let unit = world.unit(follower).unwrap();
    assert!(!unit.move_spline.finalized());
    assert!(unit.has_state(UnitState::ROAMING_MOVE));
}

#[test]
fn test_formation_arrival_reaches_ai() {
    let mut world = World::with_store(single_file_store(2.0));
    let leader = world.spawn(Unit::creature(Some(SpawnId(1)), Vec2::ZERO));
    let ai = RecordingAi::default();
    let informs = Rc::clone(&ai.informs);
    let follower = world.spawn(Unit::creature(None, Vec2::new(-5.0, 0.0)).with_ai(Box::new(ai)));
    world.add_follower(leader, follower, 0).unwrap();

    run(&mut world, 10);

    assert_eq!(*informs.borrow(), vec![(MovementGeneratorType::Formation, 0)]);
    assert!((world.unit(follower).unwrap().position - Vec2::new(-2.0, 0.0)).length() < 1e-4);
}

#[test]
fn test_point_order_overrides_formation() {
    let mut world = World::with_store(single_file_store(2.0));
    let leader = world.spawn(Unit::creature(Some(SpawnId(1)), Vec2::ZERO));
    let ai = RecordingAi::default();
    let informs = Rc::clone(&ai.informs);
    let follower = world.spawn(Unit::creature(None, Vec2::new(-2.0, 0.0)).with_ai(Box::new(ai)));
    world.add_follower(leader, follower, 0).unwrap();
    world.update(100);

    world.move_point(follower, 9, Vec2::new(-2.0, 10.0)).unwrap();
    assert_eq!(
        world.unit(follower).unwrap().motion_master.current_type(),
        Some(MovementGeneratorType::Point)
    );
    run(&mut world, 20);

    let unit = world.unit(follower).unwrap();
    assert_eq!(unit.position, Vec2::new(-2.0, 10.0));
    assert!(unit.motion_master.is_slot_empty(MotionSlot::Active));
    assert_eq!(
        unit.motion_master.slot_type(MotionSlot::Idle),
        Some(MovementGeneratorType::Formation)
    );
    assert!(informs
        .borrow()
        .contains(&(MovementGeneratorType::Point, 9)));

    // Leader moves again: the follower falls back in
    world.move_point(leader, 2, Vec2::new(10.0, 0.0)).unwrap();
    world.update(100);
    let unit = world.unit(follower).unwrap();
    assert!(!unit.move_spline.finalized());
    assert!(unit.move_spline.current_destination().x > 0.0);
}

#[test]
fn test_formation_destination_stops_at_wall() {
    let mut collision = CollisionMap::new();
    collision.block_rect((-3, -1), (-3, 1));
    let mut world = World::with_store(single_file_store(4.0)).with_collision(collision);
    let leader = world.spawn(Unit::creature(Some(SpawnId(1)), Vec2::ZERO));
    let follower = world.spawn(Unit::creature(None, Vec2::new(0.0, 5.0)));
    world.add_follower(leader, follower, 0).unwrap();

    world.update(100);

    let destination = world.unit(follower).unwrap().move_spline.current_destination();
    assert!(destination.x > -3.0);
    assert!(!world.collision().is_position_blocked(destination));
}

#[test]
fn test_despawned_leader_leaves_followers_idle() {
    let mut world = World::with_store(single_file_store(2.0));
    let leader = world.spawn(Unit::creature(Some(SpawnId(1)), Vec2::ZERO));
    let follower = world.spawn(Unit::creature(None, Vec2::new(-3.0, 0.0)));
    world.add_follower(leader, follower, 0).unwrap();
    world.move_point(leader, 1, Vec2::new(30.0, 0.0)).unwrap();
    run(&mut world, 5);

    world.despawn(leader);
    run(&mut world, 5);

    let unit = world.unit(follower).unwrap();
    assert!(unit.motion_master.is_empty());
    assert_eq!(unit.formation_leader(), None);
    assert!(!unit.has_state(UnitState::ROAMING));
}
