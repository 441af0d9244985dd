//! The world: every unit, every formation and the tick that drives them

use std::sync::Arc;

use ahash::AHashMap;

use crate::core::error::{FormationError, Result};
use crate::core::types::{ActorId, SpawnId};
use crate::formation::coordinator::AiFormation;
use crate::formation::store::{formation_store, FormationDataSource, FormationStore};
use crate::formation::topology::FormationType;
use crate::movement::generator::MotionContext;
use crate::world::collision::CollisionMap;
use crate::world::unit::Unit;

/// Formation coordinators keyed by leader
pub type FormationRegistry = AHashMap<ActorId, AiFormation>;

/// Unit storage that remembers spawn order
#[derive(Debug, Default)]
pub struct Units {
    units: AHashMap<ActorId, Unit>,
    order: Vec<ActorId>,
}

impl Units {
    pub fn insert(&mut self, unit: Unit) -> ActorId {
        let id = unit.id;
        if self.units.insert(id, unit).is_none() {
            self.order.push(id);
        }
        id
    }

    pub fn remove(&mut self, id: ActorId) -> Option<Unit> {
        let unit = self.units.remove(&id)?;
        self.order.retain(|other| *other != id);
        Some(unit)
    }

    pub fn get(&self, id: ActorId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.units.contains_key(&id)
    }

    /// Ids in spawn order
    pub fn ids(&self) -> &[ActorId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.order.iter().filter_map(|id| self.units.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

pub struct World {
    units: Units,
    formations: FormationRegistry,
    collision: CollisionMap,
    store: Arc<FormationStore>,
    spawned: AHashMap<SpawnId, ActorId>,
    pub tick: u64,
}

impl World {
    /// Empty world reading formation definitions from the process-wide store
    pub fn new() -> Self {
        Self::with_store(formation_store())
    }

    pub fn with_store(store: Arc<FormationStore>) -> Self {
        Self {
            units: Units::default(),
            formations: FormationRegistry::default(),
            collision: CollisionMap::new(),
            store,
            spawned: AHashMap::new(),
            tick: 0,
        }
    }

    pub fn with_collision(mut self, collision: CollisionMap) -> Self {
        self.collision = collision;
        self
    }

    pub fn units(&self) -> &Units {
        &self.units
    }

    pub fn unit(&self, id: ActorId) -> Option<&Unit> {
        self.units.get(id)
    }

    pub fn unit_mut(&mut self, id: ActorId) -> Option<&mut Unit> {
        self.units.get_mut(id)
    }

    pub fn formation(&self, leader: ActorId) -> Option<&AiFormation> {
        self.formations.get(&leader)
    }

    pub fn formation_mut(&mut self, leader: ActorId) -> Option<&mut AiFormation> {
        self.formations.get_mut(&leader)
    }

    pub fn collision(&self) -> &CollisionMap {
        &self.collision
    }

    pub fn collision_mut(&mut self) -> &mut CollisionMap {
        &mut self.collision
    }

    /// Leader whose formation currently lists `follower`
    pub fn leader_of(&self, follower: ActorId) -> Option<ActorId> {
        self.formations
            .values()
            .find(|formation| formation.follower(follower).is_some())
            .map(|formation| formation.owner())
    }

    /// Add `unit` to the world and give it a formation
    ///
    /// Creatures with stored membership join their stored leader if it is
    /// already spawned, and a stored leader collects its spawned members.
    pub fn spawn(&mut self, unit: Unit) -> ActorId {
        let formation = AiFormation::new(&unit, self.store.as_ref());
        let spawn_id = unit.spawn_id.filter(|_| unit.is_creature());
        let id = self.units.insert(unit);
        self.formations.insert(id, formation);

        if let Some(spawn_id) = spawn_id {
            self.spawned.insert(spawn_id, id);
            self.join_stored_formations(id, spawn_id);
        }

        tracing::debug!("Spawned unit {:?} ({} units)", id, self.units.len());
        id
    }

    /// Wire up store memberships for a creature that just spawned
    fn join_stored_formations(&mut self, id: ActorId, spawn_id: SpawnId) {
        let store = Arc::clone(&self.store);

        if let Some(member) = store.member_data(spawn_id) {
            if member.leader_spawn_id != spawn_id {
                if let Some(leader) = self.spawned.get(&member.leader_spawn_id).copied() {
                    if let Err(err) = self.add_follower(leader, id, member.formation_position) {
                        tracing::warn!("Stored formation join failed for {:?}: {}", spawn_id, err);
                    }
                }
            }
        }

        let Some(members) = store.member_ids(spawn_id) else {
            return;
        };
        for member_spawn_id in members {
            if *member_spawn_id == spawn_id {
                continue;
            }
            let Some(member) = self.spawned.get(member_spawn_id).copied() else {
                continue;
            };
            let position = store
                .member_data(*member_spawn_id)
                .map(|data| data.formation_position)
                .unwrap_or_default();
            if let Err(err) = self.add_follower(id, member, position) {
                tracing::warn!(
                    "Stored formation join failed for {:?}: {}",
                    member_spawn_id,
                    err
                );
            }
        }
    }

    /// Remove a unit, detaching it from every formation it is part of
    pub fn despawn(&mut self, id: ActorId) -> Option<Unit> {
        if let Some(leader) = self.leader_of(id) {
            self.remove_follower(leader, id);
        }

        if let Some(mut formation) = self.formations.remove(&id) {
            formation.remove_all_followers(&mut self.units);
        }

        let mut unit = self.units.remove(id)?;
        unit.clear_all_motion();
        if let Some(spawn_id) = unit.spawn_id {
            if self.spawned.get(&spawn_id) == Some(&id) {
                self.spawned.remove(&spawn_id);
            }
        }

        tracing::debug!("Despawned unit {:?} ({} units)", id, self.units.len());
        Some(unit)
    }

    /// Attach `follower` to `leader`'s formation
    ///
    /// A follower already in a formation, this one included, is detached
    /// from it first.
    pub fn add_follower(
        &mut self,
        leader: ActorId,
        follower: ActorId,
        formation_position: u8,
    ) -> Result<()> {
        if leader == follower {
            return Err(FormationError::SelfFollow(follower));
        }
        if !self.formations.contains_key(&leader) {
            return Err(FormationError::UnitNotFound(leader));
        }
        if !self.units.contains(follower) {
            return Err(FormationError::UnitNotFound(follower));
        }

        if let Some(previous) = self.leader_of(follower) {
            self.remove_follower(previous, follower);
        }

        let formation = self
            .formations
            .get_mut(&leader)
            .ok_or(FormationError::UnitNotFound(leader))?;
        formation.add_follower(&mut self.units, follower, formation_position)
    }

    pub fn remove_follower(&mut self, leader: ActorId, follower: ActorId) {
        if let Some(formation) = self.formations.get_mut(&leader) {
            formation.remove_follower(&mut self.units, follower);
        }
    }

    pub fn remove_all_followers(&mut self, leader: ActorId) {
        if let Some(formation) = self.formations.get_mut(&leader) {
            formation.remove_all_followers(&mut self.units);
        }
    }

    pub fn set_formation_type(&mut self, leader: ActorId, formation_type: FormationType) -> Result<()> {
        let formation = self
            .formations
            .get_mut(&leader)
            .ok_or(FormationError::UnitNotFound(leader))?;
        formation.set_formation_type(&mut self.units, formation_type);
        Ok(())
    }

    pub fn set_follower_distance(&mut self, leader: ActorId, radius: f32) -> Result<()> {
        let formation = self
            .formations
            .get_mut(&leader)
            .ok_or(FormationError::UnitNotFound(leader))?;
        formation.set_follower_distance(&mut self.units, radius);
        Ok(())
    }

    pub fn invert_formation_offsets(&mut self, leader: ActorId) -> Result<()> {
        let formation = self
            .formations
            .get_mut(&leader)
            .ok_or(FormationError::UnitNotFound(leader))?;
        formation.invert_formation_offsets(&mut self.units);
        Ok(())
    }

    /// Order `id` to walk to `destination`, overriding formation movement
    pub fn move_point(&mut self, id: ActorId, point_id: u32, destination: glam::Vec2) -> Result<()> {
        let unit = self
            .units
            .get_mut(id)
            .ok_or(FormationError::UnitNotFound(id))?;
        unit.move_point(point_id, destination);
        Ok(())
    }

    /// Advance the world by `diff` ms
    ///
    /// Formation cadences advance first. Units then move in spawn order,
    /// each ticking the generator in its highest occupied slot.
    pub fn update(&mut self, diff: u32) {
        self.tick += 1;

        for formation in self.formations.values_mut() {
            formation.update(diff);
        }

        let ids = self.units.ids().to_vec();
        for id in ids {
            let Some(unit) = self.units.get_mut(id) else {
                continue;
            };
            let completed = unit.update_movement(diff, &self.collision);

            let Some(slot) = unit.motion_master.top_slot() else {
                continue;
            };
            let Some(mut generator) = unit.motion_master.take(slot) else {
                continue;
            };
            if completed {
                generator.movement_inform(unit);
            }

            let keep = {
                let mut ctx = MotionContext {
                    units: &mut self.units,
                    formations: &self.formations,
                    collision: &self.collision,
                };
                generator.update(id, &mut ctx, diff)
            };

            let Some(unit) = self.units.get_mut(id) else {
                continue;
            };
            if keep && unit.motion_master.is_slot_empty(slot) {
                unit.motion_master.replace(slot, generator);
            } else {
                tracing::trace!("Unit {:?} dropped {:?} generator", id, generator.kind());
                generator.finalize(unit);
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::generator::{MotionSlot, MovementGeneratorType};
    use glam::Vec2;

    fn world() -> World {
        World::with_store(Arc::new(FormationStore::new()))
    }

    #[test]
    fn test_units_keep_spawn_order() {
        let mut units = Units::default();
        let a = units.insert(Unit::creature(None, Vec2::ZERO));
        let b = units.insert(Unit::creature(None, Vec2::ZERO));
        let c = units.insert(Unit::creature(None, Vec2::ZERO));

        units.remove(b);
        assert_eq!(units.ids(), &[a, c]);
        assert_eq!(units.len(), 2);
        assert!(!units.contains(b));
    }

    #[test]
    fn test_spawn_creates_formation() {
        let mut world = world();
        let id = world.spawn(Unit::creature(None, Vec2::ZERO));
        let formation = world.formation(id).unwrap();
        assert_eq!(formation.owner(), id);
        assert_eq!(formation.formation_type(), FormationType::GridBehindLeader);
    }

    #[test]
    fn test_add_follower_moves_between_leaders() {
        let mut world = world();
        let first = world.spawn(Unit::creature(None, Vec2::ZERO));
        let second = world.spawn(Unit::creature(None, Vec2::new(20.0, 0.0)));
        let follower = world.spawn(Unit::creature(None, Vec2::new(0.0, 5.0)));

        world.add_follower(first, follower, 0).unwrap();
        world.add_follower(second, follower, 0).unwrap();

        assert!(!world.formation(first).unwrap().has_followers());
        assert_eq!(world.leader_of(follower), Some(second));
        assert_eq!(world.unit(follower).unwrap().formation_leader(), Some(second));
    }

    #[test]
    fn test_add_follower_to_unknown_leader() {
        let mut world = world();
        let follower = world.spawn(Unit::creature(None, Vec2::ZERO));
        let missing = ActorId::new();

        let result = world.add_follower(missing, follower, 0);
        assert!(matches!(result, Err(FormationError::UnitNotFound(id)) if id == missing));
    }

    #[test]
    fn test_despawn_leader_releases_followers() {
        let mut world = world();
        let leader = world.spawn(Unit::creature(None, Vec2::ZERO));
        let follower = world.spawn(Unit::creature(None, Vec2::new(0.0, 5.0)));
        world.add_follower(leader, follower, 0).unwrap();

        assert!(world.despawn(leader).is_some());

        let unit = world.unit(follower).unwrap();
        assert_eq!(unit.formation_leader(), None);
        assert!(unit.motion_master.is_empty());
        assert!(world.formation(leader).is_none());
    }

    #[test]
    fn test_despawn_follower_leaves_formation() {
        let mut world = world();
        let leader = world.spawn(Unit::creature(None, Vec2::ZERO));
        let follower = world.spawn(Unit::creature(None, Vec2::new(0.0, 5.0)));
        world.add_follower(leader, follower, 0).unwrap();

        world.despawn(follower);

        assert!(!world.formation(leader).unwrap().has_followers());
        assert!(world.despawn(follower).is_none());
    }

    #[test]
    fn test_update_drops_finished_point_movement() {
        let mut world = world();
        let id = world.spawn(Unit::creature(None, Vec2::ZERO));
        world.move_point(id, 1, Vec2::new(7.0, 0.0)).unwrap();
        assert_eq!(
            world.unit(id).unwrap().motion_master.current_type(),
            Some(MovementGeneratorType::Point)
        );

        world.update(500);
        world.update(600);

        let unit = world.unit(id).unwrap();
        assert_eq!(unit.position, Vec2::new(7.0, 0.0));
        assert!(unit.motion_master.is_slot_empty(MotionSlot::Active));
        assert_eq!(world.tick, 2);
    }
}
