use std::fmt::Write as _;

use shared::domain::{MotorId, Sequence};

pub fn render_sequence(sequence: &Sequence) -> String {
    let mut out = format!(
        "loop={} start_with_home={} steps={}\n",
        on_off(sequence.looping.is_set()),
        on_off(sequence.start_with_home.is_set()),
        sequence.len()
    );
    for (index, step) in sequence.steps.iter().enumerate() {
        let _ = write!(out, "  [{index}] dwell={:.2}s", step.dwell);
        for motor in MotorId::ALL {
            let target = step.motor(motor);
            let _ = write!(out, "  {motor}={:.2}%@{:.2}%", target.position, target.speed);
        }
        out.push('\n');
    }
    out
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
