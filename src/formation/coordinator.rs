//! Formation coordinator
//!
//! One `AiFormation` exists per leader. It owns the follower list, the
//! formation shape and the leader's movement cadence, and pushes freshly
//! computed offsets into followers' formation movement generators.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::core::config::config;
use crate::core::error::{FormationError, Result};
use crate::core::types::{timer_ms, ActorId};
use crate::formation::store::FormationDataSource;
use crate::formation::topology::FormationType;
use crate::movement::generator::MotionSlot;
use crate::world::unit::Unit;
use crate::world::Units;

/// Membership record of one follower
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormationFollower {
    pub id: ActorId,
    /// Sort key assigned from outside, not the follower's rank
    pub formation_position: u8,
    /// Offset relative to the leader, valid until the next recalculation
    pub offset: Vec2,
}

impl FormationFollower {
    pub fn new(id: ActorId, formation_position: u8) -> Self {
        Self {
            id,
            formation_position,
            offset: Vec2::ZERO,
        }
    }
}

/// Formation of followers anchored to a single leader
#[derive(Debug)]
pub struct AiFormation {
    owner: ActorId,
    followers: Vec<FormationFollower>,
    formation_type: FormationType,
    radius: f32,
    movement_timer: i32,
    movement_interval: u32,
    rng: StdRng,
}

impl AiFormation {
    /// Create the formation for `owner`
    ///
    /// Creatures with stored settings for their spawn id adopt them. Players
    /// and unconfigured creatures get a grid behind the leader at the
    /// default follower distance.
    pub fn new(owner: &Unit, store: &dyn FormationDataSource) -> Self {
        let config = config();
        let stored = if owner.is_creature() {
            owner.spawn_id.and_then(|spawn_id| store.settings(spawn_id))
        } else {
            None
        };

        let (formation_type, radius) = match stored {
            Some(settings) => (settings.formation_type, settings.radius),
            None => (
                FormationType::GridBehindLeader,
                config.default_follower_distance,
            ),
        };

        let movement_interval = if owner.is_player() {
            config.player_movement_interval
        } else {
            config.creature_movement_interval
        };

        Self {
            owner: owner.id,
            followers: Vec::new(),
            formation_type,
            radius,
            movement_timer: 0,
            movement_interval,
            rng: StdRng::from_entropy(),
        }
    }

    /// Reseed the generator used by random formations
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.reseed(seed);
        self
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn owner(&self) -> ActorId {
        self.owner
    }

    /// Followers in their current order (sorted at the last recalculation)
    pub fn followers(&self) -> &[FormationFollower] {
        &self.followers
    }

    pub fn follower(&self, id: ActorId) -> Option<&FormationFollower> {
        self.followers.iter().find(|f| f.id == id)
    }

    pub fn follower_count(&self) -> usize {
        self.followers.len()
    }

    pub fn has_followers(&self) -> bool {
        !self.followers.is_empty()
    }

    pub fn formation_type(&self) -> FormationType {
        self.formation_type
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn movement_interval(&self) -> u32 {
        self.movement_interval
    }

    /// Time until the formation's next move (ms), may be negative between updates
    pub fn next_formation_movement_time(&self) -> i32 {
        self.movement_timer
    }

    /// Attach `follower` at `formation_position` and start its formation movement
    pub fn add_follower(
        &mut self,
        units: &mut Units,
        follower: ActorId,
        formation_position: u8,
    ) -> Result<()> {
        if follower == self.owner {
            return Err(FormationError::SelfFollow(follower));
        }
        if !units.contains(follower) {
            return Err(FormationError::UnitNotFound(follower));
        }

        self.followers
            .push(FormationFollower::new(follower, formation_position));
        self.update_offsets_for_all_followers(units);

        let offset = self.follower(follower).map(|f| f.offset).unwrap_or_default();
        if let Some(unit) = units.get_mut(follower) {
            unit.move_formation(self.owner, offset);
            if unit.is_creature() {
                unit.set_formation_leader(Some(self.owner));
            }
        }

        tracing::debug!(
            "Follower {:?} joined formation of {:?} at position {} ({} followers)",
            follower,
            self.owner,
            formation_position,
            self.followers.len()
        );

        Ok(())
    }

    /// Detach `follower`, clearing its formation movement
    ///
    /// Does nothing if `follower` is not a member.
    pub fn remove_follower(&mut self, units: &mut Units, follower: ActorId) {
        let Some(index) = self.followers.iter().position(|f| f.id == follower) else {
            return;
        };

        if let Some(unit) = units.get_mut(follower) {
            unit.clear_formation_movement();
            if unit.is_creature() {
                unit.set_formation_leader(None);
            }
        }

        self.followers.remove(index);

        tracing::debug!(
            "Follower {:?} left formation of {:?} ({} followers)",
            follower,
            self.owner,
            self.followers.len()
        );

        if !self.followers.is_empty() {
            self.update_offsets_for_all_followers(units);
        }
    }

    /// Detach every follower and clear their links back to this leader
    pub fn remove_all_followers(&mut self, units: &mut Units) {
        for follower in &self.followers {
            if let Some(unit) = units.get_mut(follower.id) {
                unit.clear_formation_movement();
                if unit.formation_leader() == Some(self.owner) {
                    unit.set_formation_leader(None);
                }
            }
        }

        if !self.followers.is_empty() {
            tracing::debug!(
                "Removed all {} followers from formation of {:?}",
                self.followers.len(),
                self.owner
            );
        }
        self.followers.clear();
    }

    /// Advance the movement cadence timer
    ///
    /// The interval is added back on expiry, so overshoot carries into the
    /// next period.
    pub fn update(&mut self, diff: u32) {
        self.movement_timer = self.movement_timer.saturating_sub(timer_ms(diff));
        if self.movement_timer <= 0 {
            self.movement_timer = self
                .movement_timer
                .saturating_add(timer_ms(self.movement_interval));
        }
    }

    pub fn set_formation_type(&mut self, units: &mut Units, formation_type: FormationType) {
        self.formation_type = formation_type;
        self.update_offsets_for_all_followers(units);
    }

    pub fn set_follower_distance(&mut self, units: &mut Units, radius: f32) {
        self.radius = radius;
        self.update_offsets_for_all_followers(units);
    }

    /// Mirror the stored offsets through the leader, then recalculate
    ///
    /// The recalculation replaces the mirrored values again for every
    /// deterministic formation type.
    pub fn invert_formation_offsets(&mut self, units: &mut Units) {
        for follower in &mut self.followers {
            follower.offset.x *= -1.0;
            follower.offset.y *= -1.0;
        }

        self.update_offsets_for_all_followers(units);
    }

    /// Sort followers, recompute every offset and push it to live generators
    pub fn update_offsets_for_all_followers(&mut self, units: &mut Units) {
        // Stable: equal positions keep their join order
        self.followers.sort_by_key(|f| f.formation_position);

        let count = self.followers.len();
        for (index, follower) in self.followers.iter_mut().enumerate() {
            follower.offset =
                self.formation_type
                    .offset(index as u32, count, self.radius, &mut self.rng);

            let Some(unit) = units.get_mut(follower.id) else {
                continue;
            };
            if let Some(receiver) = unit
                .motion_master
                .formation_offset_receiver(MotionSlot::Idle)
            {
                receiver.set_formation_offset(follower.offset);
            }
        }

        tracing::trace!(
            "Recalculated {} offsets for {:?} ({}, radius {})",
            count,
            self.owner,
            self.formation_type,
            self.radius
        );
    }
}
