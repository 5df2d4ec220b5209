//! Lock-step motion interpolation
//!
//! Several servos move from their current positions to new targets together,
//! finishing at the same time regardless of individual travel distance. The
//! position table records the last-commanded angle per channel so later
//! relative moves are seamless.

use crate::servo::{ServoId, Servos};
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Last-commanded angle per channel.
///
/// The mutex also serializes whole moves: `move_together` holds the lock for
/// the duration of the interpolation, so two loops can never interleave
/// partial moves to the same channel.
#[derive(Debug, Default)]
pub struct PositionTable {
    angles: Mutex<HashMap<ServoId, f32>>,
}

impl PositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ServoId) -> Option<f32> {
        self.angles.lock().get(&id).copied()
    }

    pub fn set(&self, id: ServoId, angle: f32) {
        self.angles.lock().insert(id, angle);
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, HashMap<ServoId, f32>> {
        self.angles.lock()
    }
}

/// Move every listed channel to its target in lock-step.
///
/// The step count is the largest angular delta in the batch; each iteration
/// advances every channel to `current + (target - current) * min(1, i/steps)`
/// so the whole batch arrives together at constant angular velocity. On
/// completion the table is corrected to the exact targets, erasing any
/// rounding drift from the intermediate steps. An empty target map or a
/// batch already at its targets issues no writes.
pub fn move_together(
    servos: &Servos,
    table: &PositionTable,
    targets: &HashMap<ServoId, f32>,
    step_size: f32,
    step_delay: Duration,
) {
    if targets.is_empty() {
        return;
    }

    let mut positions = table.lock();

    // Unknown channels start at their target and therefore do not move.
    let starts: HashMap<ServoId, f32> = targets
        .iter()
        .map(|(&id, &target)| (id, positions.get(&id).copied().unwrap_or(target)))
        .collect();

    let steps = targets
        .iter()
        .map(|(id, target)| (target - starts[id]).abs())
        .fold(0.0f32, f32::max);

    if steps == 0.0 {
        return;
    }

    debug!(steps, channels = targets.len(), "interpolating batch");

    let iterations = (steps / step_size).ceil() as u32;
    for i in 0..=iterations {
        let t = ((i as f32 * step_size) / steps).min(1.0);
        for (&id, &target) in targets {
            let start = starts[&id];
            if start == target {
                continue;
            }
            servos.set_angle(id, start + (target - start) * t);
        }
        thread::sleep(step_delay);
    }

    // Authoritative correction: the table holds the exact targets.
    for (&id, &target) in targets {
        positions.insert(id, target);
    }
}
