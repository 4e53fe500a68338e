use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SequenceError;

/// Step size shared by every editable value (positions, speeds, dwell).
pub const RESOLUTION: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// Percent of travel range.
pub const POSITION_RANGE: ValueRange = ValueRange {
    min: 0.0,
    max: 100.0,
};
/// Percent of max speed.
pub const SPEED_RANGE: ValueRange = ValueRange {
    min: 0.0,
    max: 100.0,
};
/// Seconds.
pub const DWELL_RANGE: ValueRange = ValueRange {
    min: 0.0,
    max: 900.0,
};

/// Clamps `value` into `range` and rounds half-up to the nearest [`RESOLUTION`] step.
///
/// NaN maps to `range.min`. Range bounds are multiples of the resolution, so the
/// rounded value never leaves the range.
pub fn quantize(value: f64, range: ValueRange) -> f64 {
    if value.is_nan() {
        return range.min;
    }
    let clamped = value.clamp(range.min, range.max);
    (clamped / RESOLUTION + 0.5).floor() * RESOLUTION
}

/// Integer on/off flag as carried on the wire. Any nonzero value means "on".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Flag(pub i64);

impl Flag {
    pub const OFF: Flag = Flag(0);
    pub const ON: Flag = Flag(1);

    pub fn is_set(self) -> bool {
        self.0 != 0
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        if value {
            Self::ON
        } else {
            Self::OFF
        }
    }
}

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawFlag {
            Int(i64),
            Bool(bool),
        }

        Ok(match RawFlag::deserialize(deserializer)? {
            RawFlag::Int(value) => Flag(value),
            RawFlag::Bool(value) => Flag::from(value),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotorId {
    Motor1,
    Motor2,
    Motor3,
}

impl MotorId {
    pub const ALL: [MotorId; 3] = [MotorId::Motor1, MotorId::Motor2, MotorId::Motor3];

    pub fn as_str(self) -> &'static str {
        match self {
            MotorId::Motor1 => "Motor1",
            MotorId::Motor2 => "Motor2",
            MotorId::Motor3 => "Motor3",
        }
    }
}

impl fmt::Display for MotorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MotorId {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let lower = raw.trim().to_ascii_lowercase();
        let suffix = lower.strip_prefix("motor").unwrap_or(&lower);
        match suffix {
            "1" => Ok(MotorId::Motor1),
            "2" => Ok(MotorId::Motor2),
            "3" => Ok(MotorId::Motor3),
            _ => Err(format!("unknown motor `{raw}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Position,
    Speed,
}

impl Axis {
    pub fn range(self) -> ValueRange {
        match self {
            Axis::Position => POSITION_RANGE,
            Axis::Speed => SPEED_RANGE,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Position => f.write_str("position"),
            Axis::Speed => f.write_str("speed"),
        }
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "position" | "pos" => Ok(Axis::Position),
            "speed" => Ok(Axis::Speed),
            _ => Err(format!("unknown axis `{raw}`")),
        }
    }
}

/// Commanded position and speed for one motor, `[position, speed]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct MotorTarget {
    pub position: f64,
    pub speed: f64,
}

impl MotorTarget {
    pub fn new(position: f64, speed: f64) -> Self {
        Self { position, speed }
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Position => self.position,
            Axis::Speed => self.speed,
        }
    }

    pub fn with(mut self, axis: Axis, value: f64) -> Self {
        match axis {
            Axis::Position => self.position = value,
            Axis::Speed => self.speed = value,
        }
        self
    }
}

impl From<[f64; 2]> for MotorTarget {
    fn from([position, speed]: [f64; 2]) -> Self {
        Self { position, speed }
    }
}

impl From<MotorTarget> for [f64; 2] {
    fn from(value: MotorTarget) -> Self {
        [value.position, value.speed]
    }
}

/// Targets for the three fixed motors. Unknown motor keys are rejected on
/// decode; a motor left out of older sequence files decodes as `[0, 0]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Motors {
    #[serde(rename = "Motor1")]
    pub motor1: MotorTarget,
    #[serde(rename = "Motor2")]
    pub motor2: MotorTarget,
    #[serde(rename = "Motor3")]
    pub motor3: MotorTarget,
}

impl Motors {
    pub fn get(&self, motor: MotorId) -> MotorTarget {
        match motor {
            MotorId::Motor1 => self.motor1,
            MotorId::Motor2 => self.motor2,
            MotorId::Motor3 => self.motor3,
        }
    }

    pub fn with(mut self, motor: MotorId, target: MotorTarget) -> Self {
        match motor {
            MotorId::Motor1 => self.motor1 = target,
            MotorId::Motor2 => self.motor2 = target,
            MotorId::Motor3 => self.motor3 = target,
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Step {
    pub dwell: f64,
    pub motors: Motors,
}

impl Step {
    pub fn motor(&self, motor: MotorId) -> MotorTarget {
        self.motors.get(motor)
    }

    pub fn with_motor(mut self, motor: MotorId, target: MotorTarget) -> Self {
        self.motors = self.motors.with(motor, target);
        self
    }

    pub fn with_dwell(mut self, dwell: f64) -> Self {
        self.dwell = dwell;
        self
    }
}

/// The whole motion program. Every update produces a new value; nothing here
/// mutates in place.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(rename = "loop", default)]
    pub looping: Flag,
    #[serde(default)]
    pub start_with_home: Flag,
    pub steps: Vec<Step>,
}

impl Sequence {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Result<&Step, SequenceError> {
        self.steps.get(index).ok_or(SequenceError::IndexOutOfRange {
            index,
            len: self.steps.len(),
        })
    }

    pub fn with_step(&self, index: usize, step: Step) -> Result<Self, SequenceError> {
        self.step(index)?;
        let mut next = self.clone();
        next.steps[index] = step;
        Ok(next)
    }

    pub fn append_step(&self, step: Step) -> Self {
        let mut next = self.clone();
        next.steps.push(step);
        next
    }

    /// Returns an equal sequence when there is nothing to drop.
    pub fn drop_last_step(&self) -> Self {
        let mut next = self.clone();
        next.steps.pop();
        next
    }

    pub fn with_loop(&self, looping: Flag) -> Self {
        Self {
            looping,
            ..self.clone()
        }
    }

    pub fn with_start_with_home(&self, start_with_home: Flag) -> Self {
        Self {
            start_with_home,
            ..self.clone()
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
