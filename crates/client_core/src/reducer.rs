//! Pure edit reducer: `(Sequence, EditIntent) -> Sequence`.

use shared::{
    domain::{quantize, Axis, Flag, MotorId, Sequence, Step, DWELL_RANGE},
    error::SequenceError,
};

/// A discrete user edit coming from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditIntent {
    SetMotorValue {
        step: usize,
        motor: MotorId,
        axis: Axis,
        value: f64,
    },
    SetDwell {
        step: usize,
        value: f64,
    },
    AddStep,
    RemoveLastStep,
    SetLoop(bool),
    SetStartWithHome(bool),
}

impl EditIntent {
    pub fn name(&self) -> &'static str {
        match self {
            EditIntent::SetMotorValue { .. } => "set_motor_value",
            EditIntent::SetDwell { .. } => "set_dwell",
            EditIntent::AddStep => "add_step",
            EditIntent::RemoveLastStep => "remove_last_step",
            EditIntent::SetLoop(_) => "set_loop",
            EditIntent::SetStartWithHome(_) => "set_start_with_home",
        }
    }
}

/// Applies `intent` to `sequence` and returns the next sequence.
///
/// Values are clamped and quantized here. A step index outside the sequence is
/// a caller bug and comes back as `IndexOutOfRange`; `sequence` is never touched.
pub fn apply(sequence: &Sequence, intent: &EditIntent) -> Result<Sequence, SequenceError> {
    match *intent {
        EditIntent::SetMotorValue {
            step,
            motor,
            axis,
            value,
        } => {
            let current = *sequence.step(step)?;
            let target = current.motor(motor).with(axis, quantize(value, axis.range()));
            sequence.with_step(step, current.with_motor(motor, target))
        }
        EditIntent::SetDwell { step, value } => {
            let current = *sequence.step(step)?;
            sequence.with_step(step, current.with_dwell(quantize(value, DWELL_RANGE)))
        }
        EditIntent::AddStep => Ok(sequence.append_step(Step::default())),
        EditIntent::RemoveLastStep => Ok(sequence.drop_last_step()),
        EditIntent::SetLoop(enabled) => Ok(sequence.with_loop(Flag::from(enabled))),
        EditIntent::SetStartWithHome(enabled) => {
            Ok(sequence.with_start_with_home(Flag::from(enabled)))
        }
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
