//! Per-unit motion slots
//!
//! Each slot holds at most one movement generator. Installation and
//! removal go through `Unit` so generators can be initialized and
//! finalized against their owner.

use crate::movement::generator::{
    FormationOffsetReceiver, MotionSlot, MovementGenerator, MovementGeneratorType,
    MAX_MOTION_SLOT,
};

#[derive(Debug, Default)]
pub struct MotionMaster {
    slots: [Option<Box<dyn MovementGenerator>>; MAX_MOTION_SLOT],
}

impl MotionMaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }

    /// Kind of the generator in `slot`, if any
    pub fn slot_type(&self, slot: MotionSlot) -> Option<MovementGeneratorType> {
        self.slots[slot as usize].as_ref().map(|g| g.kind())
    }

    pub fn slot(&self, slot: MotionSlot) -> Option<&dyn MovementGenerator> {
        self.slots[slot as usize].as_deref()
    }

    /// Highest occupied slot, the one that is ticked
    pub fn top_slot(&self) -> Option<MotionSlot> {
        MotionSlot::ALL
            .iter()
            .rev()
            .copied()
            .find(|slot| self.slots[*slot as usize].is_some())
    }

    /// Generator kind in the top slot
    pub fn current_type(&self) -> Option<MovementGeneratorType> {
        self.top_slot().and_then(|slot| self.slot_type(slot))
    }

    /// Offset setter of the generator in `slot`
    ///
    /// Only returned when the installed generator reports the formation
    /// kind; anything else in the slot is left alone.
    pub fn formation_offset_receiver(
        &mut self,
        slot: MotionSlot,
    ) -> Option<&mut dyn FormationOffsetReceiver> {
        let generator = self.slots[slot as usize].as_deref_mut()?;
        if generator.kind() != MovementGeneratorType::Formation {
            return None;
        }
        generator.as_offset_receiver()
    }

    /// Detach the generator in `slot` without finalizing it
    pub fn take(&mut self, slot: MotionSlot) -> Option<Box<dyn MovementGenerator>> {
        self.slots[slot as usize].take()
    }

    /// Put a generator into `slot`, returning whatever was there
    pub fn replace(
        &mut self,
        slot: MotionSlot,
        generator: Box<dyn MovementGenerator>,
    ) -> Option<Box<dyn MovementGenerator>> {
        self.slots[slot as usize].replace(generator)
    }

    pub fn is_slot_empty(&self, slot: MotionSlot) -> bool {
        self.slots[slot as usize].is_none()
    }
}
