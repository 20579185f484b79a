//! Instruction trigger timing.
//!
//! Spoken instructions of a step are stored farthest trigger first, and the
//! traveler crosses them in that order as the distance remaining in the step
//! shrinks.  The scheduler walks that list from the front, firing each
//! crossed, unfired trigger.  It stops at the first trigger that has not been
//! crossed yet, so a closer trigger can never fire before a farther one.

use nav_core::InstructionConfig;
use nav_route::{RouteGeometry, SpokenInstruction, VisualInstruction};
use tracing::debug;

use crate::RouteProgress;

/// Per-step "already fired" markers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InstructionCursor {
    pub leg_index:    usize,
    pub step_index:   usize,
    /// Bit `i` is set once spoken instruction `i` of the step has fired.
    pub spoken_fired: u64,
    pub visual_fired: bool,
}

impl InstructionCursor {
    pub fn new(leg_index: usize, step_index: usize) -> Self {
        Self { leg_index, step_index, spoken_fired: 0, visual_fired: false }
    }

    pub fn is_clear(&self) -> bool {
        self.spoken_fired == 0 && !self.visual_fired
    }

    pub fn spoken_has_fired(&self, index: usize) -> bool {
        index < 64 && self.spoken_fired & (1u64 << index) != 0
    }

    fn mark_spoken(&mut self, index: usize) {
        self.spoken_fired |= 1u64 << index;
    }
}

/// One instruction surfaced by [`InstructionScheduler::evaluate`].
#[derive(Clone, Debug, PartialEq)]
pub enum InstructionFire {
    Spoken {
        leg_index:   usize,
        step_index:  usize,
        /// Position in the step's (descending) spoken list.
        index:       usize,
        instruction: SpokenInstruction,
    },
    Visual {
        leg_index:   usize,
        step_index:  usize,
        instruction: VisualInstruction,
    },
}

pub struct InstructionScheduler {
    config: InstructionConfig,
    cursor: InstructionCursor,
}

impl InstructionScheduler {
    pub fn new(config: InstructionConfig) -> Self {
        Self { config, cursor: InstructionCursor::default() }
    }

    pub fn cursor(&self) -> &InstructionCursor {
        &self.cursor
    }

    /// Clear every marker and point at the first step of the route.
    pub fn reset(&mut self) {
        self.cursor = InstructionCursor::new(0, 0);
    }

    /// Fire every instruction of the current step whose trigger has been
    /// crossed, farthest spoken trigger first, then the visual one.
    pub fn evaluate(&mut self, route: &RouteGeometry, progress: &RouteProgress) -> Vec<InstructionFire> {
        let (leg, step_idx) = (progress.leg_index, progress.step_index);
        if (self.cursor.leg_index, self.cursor.step_index) != (leg, step_idx) {
            self.cursor = InstructionCursor::new(leg, step_idx);
        }
        let Some(step) = route.step(leg, step_idx) else {
            return Vec::new();
        };
        let remaining = progress.distance_remaining_in_step_m;
        let mut fired = Vec::new();

        let leg_start = self.config.announce_first_on_leg_start && step_idx == 0;
        let cap = self.config.max_spoken_per_tick.unwrap_or(usize::MAX);
        let mut spoken_this_tick = 0;

        for (i, instruction) in step.spoken.iter().enumerate() {
            if self.cursor.spoken_has_fired(i) {
                continue;
            }
            let crossed = remaining <= instruction.trigger_distance_m || (leg_start && i == 0);
            if !crossed || spoken_this_tick >= cap {
                break;
            }
            self.cursor.mark_spoken(i);
            spoken_this_tick += 1;
            debug!(leg, step = step_idx, index = i, trigger_m = instruction.trigger_distance_m, "spoken instruction");
            fired.push(InstructionFire::Spoken {
                leg_index:   leg,
                step_index:  step_idx,
                index:       i,
                instruction: instruction.clone(),
            });
        }

        if let Some(visual) = &step.visual {
            if !self.cursor.visual_fired && (remaining <= visual.trigger_distance_m || leg_start) {
                self.cursor.visual_fired = true;
                debug!(leg, step = step_idx, trigger_m = visual.trigger_distance_m, "visual instruction");
                fired.push(InstructionFire::Visual {
                    leg_index:   leg,
                    step_index:  step_idx,
                    instruction: visual.clone(),
                });
            }
        }
        fired
    }
}
