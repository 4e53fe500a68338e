//! Line commands typed at the editor prompt.

use client_core::EditIntent;
use shared::domain::{Axis, MotorId};

pub const HELP: &str = "\
commands:
  show                                   print the current sequence
  json                                   print the sequence as sent on save
  add                                    append a zeroed step
  remove                                 drop the last step
  motor <step> <Motor1|2|3> <position|speed> <value>
  dwell <step> <seconds>
  loop <on|off>
  home <on|off>
  save                                   send the sequence to the controller
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    Show,
    Json,
    Help,
    Edit(EditIntent),
    Save,
    Quit,
}

/// `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<EditorCommand>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = words.split_first() else {
        return Ok(None);
    };

    let command = match (verb.to_ascii_lowercase().as_str(), args) {
        ("show", []) => EditorCommand::Show,
        ("json", []) => EditorCommand::Json,
        ("help" | "?", _) => EditorCommand::Help,
        ("add", []) => EditorCommand::Edit(EditIntent::AddStep),
        ("remove", []) => EditorCommand::Edit(EditIntent::RemoveLastStep),
        ("motor", [step, motor, axis, value]) => EditorCommand::Edit(EditIntent::SetMotorValue {
            step: parse_step(step)?,
            motor: motor.parse::<MotorId>()?,
            axis: axis.parse::<Axis>()?,
            value: parse_value(value)?,
        }),
        ("dwell", [step, value]) => EditorCommand::Edit(EditIntent::SetDwell {
            step: parse_step(step)?,
            value: parse_value(value)?,
        }),
        ("loop", [state]) => EditorCommand::Edit(EditIntent::SetLoop(parse_switch(state)?)),
        ("home", [state]) => {
            EditorCommand::Edit(EditIntent::SetStartWithHome(parse_switch(state)?))
        }
        ("save", []) => EditorCommand::Save,
        ("quit" | "exit", []) => EditorCommand::Quit,
        _ => return Err(format!("unrecognized command `{}`; try `help`", line.trim())),
    };
    Ok(Some(command))
}

fn parse_step(raw: &str) -> Result<usize, String> {
    raw.parse()
        .map_err(|_| format!("step must be a non-negative integer, got `{raw}`"))
}

fn parse_value(raw: &str) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(format!("value must be a number, got `{raw}`")),
    }
}

fn parse_switch(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "1" | "true" => Ok(true),
        "off" | "0" | "false" => Ok(false),
        _ => Err(format!("expected on or off, got `{raw}`")),
    }
}
