//! Weekly time grid: working days, 1-hour slots, lunch-boundary rule.

use std::collections::HashMap;
use thiserror::Error;
use types::{DayOfWeek, GridConfig, SlotSpec};

#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid has no working days")]
    NoDays,
    #[error("grid has no slots")]
    NoSlots,
    #[error("duplicate working day {0}")]
    DuplicateDay(DayOfWeek),
    #[error("duplicate slot start {0}")]
    DuplicateSlotStart(String),
    #[error("lunch boundary {boundary} outside slot range 0..={slots}")]
    BoundaryOutOfRange { boundary: usize, slots: usize },
}

/// Deterministic, side-effect-free view of the teaching week. Slot identity
/// is the positional index; the `HH:MM` start string is the wire identity.
#[derive(Clone, Debug)]
pub struct TimeGrid {
    days: Vec<DayOfWeek>,
    slots: Vec<SlotSpec>,
    lunch_boundary: usize,
    day_pos: HashMap<DayOfWeek, usize>,
    slot_pos: HashMap<String, usize>,
}

impl TimeGrid {
    pub fn from_config(cfg: &GridConfig) -> Result<Self, GridError> {
        if cfg.days.is_empty() {
            return Err(GridError::NoDays);
        }
        if cfg.slots.is_empty() {
            return Err(GridError::NoSlots);
        }
        if cfg.lunch_boundary_index > cfg.slots.len() {
            return Err(GridError::BoundaryOutOfRange {
                boundary: cfg.lunch_boundary_index,
                slots: cfg.slots.len(),
            });
        }

        let mut day_pos = HashMap::new();
        for (i, day) in cfg.days.iter().enumerate() {
            if day_pos.insert(*day, i).is_some() {
                return Err(GridError::DuplicateDay(*day));
            }
        }
        let mut slot_pos = HashMap::new();
        for (i, slot) in cfg.slots.iter().enumerate() {
            if slot_pos.insert(slot.start.clone(), i).is_some() {
                return Err(GridError::DuplicateSlotStart(slot.start.clone()));
            }
        }

        Ok(Self {
            days: cfg.days.clone(),
            slots: cfg.slots.clone(),
            lunch_boundary: cfg.lunch_boundary_index,
            day_pos,
            slot_pos,
        })
    }

    /// The default Mon-Fri, 09-12 + 13-17 grid.
    pub fn standard() -> Self {
        Self::from_config(&GridConfig::default()).expect("default grid config is valid")
    }

    pub fn days(&self) -> &[DayOfWeek] {
        &self.days
    }

    pub fn slots(&self) -> &[SlotSpec] {
        &self.slots
    }

    pub fn day_index(&self, day: DayOfWeek) -> Option<usize> {
        self.day_pos.get(&day).copied()
    }

    pub fn slot_index_by_start(&self, start: &str) -> Option<usize> {
        self.slot_pos.get(start).copied()
    }

    /// Index of the slot whose `end` string matches, for resolving the span
    /// of a multi-hour placement.
    pub fn slot_index_by_end(&self, end: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.end == end)
    }

    /// Whether a block of `duration` slots starting at `start` stays inside
    /// the day.
    pub fn fits(&self, start: usize, duration: usize) -> bool {
        start + duration <= self.slots.len()
    }

    /// A block may not span the lunch break.
    pub fn crosses_lunch(&self, start: usize, duration: usize) -> bool {
        start < self.lunch_boundary && start + duration > self.lunch_boundary
    }

    pub fn usable_slots_per_week(&self) -> u32 {
        (self.days.len() * self.slots.len()) as u32
    }
}
