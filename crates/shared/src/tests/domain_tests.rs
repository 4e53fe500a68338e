use super::*;

fn sample_step() -> Step {
    Step::default()
        .with_dwell(1.5)
        .with_motor(MotorId::Motor1, MotorTarget::new(20.0, 100.0))
}

#[test]
fn quantize_rounds_half_up_to_quarter_steps() {
    assert_eq!(quantize(37.3, POSITION_RANGE), 37.25);
    assert_eq!(quantize(37.4, POSITION_RANGE), 37.5);
    assert_eq!(quantize(0.1, POSITION_RANGE), 0.0);
    assert_eq!(quantize(0.125, POSITION_RANGE), 0.25);
    assert_eq!(quantize(12.0, SPEED_RANGE), 12.0);
}

#[test]
fn quantize_clamps_into_range() {
    assert_eq!(quantize(101.0, POSITION_RANGE), 100.0);
    assert_eq!(quantize(-3.0, SPEED_RANGE), 0.0);
    assert_eq!(quantize(1000.0, DWELL_RANGE), 900.0);
    assert_eq!(quantize(f64::INFINITY, DWELL_RANGE), 900.0);
    assert_eq!(quantize(f64::NAN, DWELL_RANGE), 0.0);
}

#[test]
fn step_lookup_reports_index_and_len() {
    let sequence = Sequence::default().append_step(sample_step());

    assert_eq!(sequence.step(0).expect("step"), &sample_step());
    assert_eq!(
        sequence.step(1),
        Err(SequenceError::IndexOutOfRange { index: 1, len: 1 })
    );
}

#[test]
fn with_step_leaves_original_untouched() {
    let original = Sequence::default().append_step(Step::default());
    let updated = original.with_step(0, sample_step()).expect("with_step");

    assert_eq!(original.steps[0], Step::default());
    assert_eq!(updated.steps[0], sample_step());
    assert_eq!(
        original.with_step(3, sample_step()),
        Err(SequenceError::IndexOutOfRange { index: 3, len: 1 })
    );
}

#[test]
fn drop_last_step_removes_tail_and_tolerates_empty() {
    let sequence = Sequence::default()
        .append_step(sample_step())
        .append_step(Step::default());

    let dropped = sequence.drop_last_step();
    assert_eq!(dropped.steps, vec![sample_step()]);
    assert_eq!(Sequence::default().drop_last_step(), Sequence::default());
}

#[test]
fn flags_replace_without_touching_steps() {
    let sequence = Sequence::default().append_step(sample_step());
    let updated = sequence.with_loop(Flag::ON).with_start_with_home(Flag::ON);

    assert!(updated.looping.is_set());
    assert!(updated.start_with_home.is_set());
    assert_eq!(updated.steps, sequence.steps);
}

#[test]
fn sequence_uses_documented_wire_shape() {
    let sequence = Sequence {
        looping: Flag::ON,
        start_with_home: Flag::OFF,
        steps: vec![sample_step()],
    };

    let json = serde_json::to_value(&sequence).expect("serialize");
    assert_eq!(
        json,
        serde_json::json!({
            "loop": 1,
            "start_with_home": 0,
            "steps": [{
                "dwell": 1.5,
                "motors": {
                    "Motor1": [20.0, 100.0],
                    "Motor2": [0.0, 0.0],
                    "Motor3": [0.0, 0.0]
                }
            }]
        })
    );
}

#[test]
fn boolean_flags_decode_as_integers() {
    let sequence: Sequence = serde_json::from_str(
        r#"{"loop": true, "start_with_home": false, "steps": []}"#,
    )
    .expect("decode");

    assert_eq!(sequence.looping, Flag::ON);
    assert_eq!(sequence.start_with_home, Flag::OFF);
    assert_eq!(
        serde_json::to_string(&sequence).expect("encode"),
        r#"{"loop":1,"start_with_home":0,"steps":[]}"#
    );
}

#[test]
fn unknown_motor_ids_are_rejected() {
    let extra = r#"{"dwell": 0, "motors": {
        "Motor1": [0, 0], "Motor2": [0, 0], "Motor3": [0, 0], "Motor4": [0, 0]
    }}"#;

    assert!(serde_json::from_str::<Step>(extra).is_err());
}

#[test]
fn motors_left_out_of_a_step_default_to_zero() {
    let partial = r#"{"dwell": 2, "motors": {"Motor1": [20, 100]}}"#;

    let step: Step = serde_json::from_str(partial).expect("partial step");
    assert_eq!(step.motor(MotorId::Motor1), MotorTarget::new(20.0, 100.0));
    assert_eq!(step.motor(MotorId::Motor2), MotorTarget::default());
    assert_eq!(step.motor(MotorId::Motor3), MotorTarget::default());
    assert_eq!(
        serde_json::to_value(step).expect("encode")["motors"]["Motor3"],
        serde_json::json!([0.0, 0.0])
    );
}

#[test]
fn motor_and_axis_names_parse_leniently() {
    assert_eq!("Motor2".parse::<MotorId>(), Ok(MotorId::Motor2));
    assert_eq!("motor3".parse::<MotorId>(), Ok(MotorId::Motor3));
    assert_eq!("1".parse::<MotorId>(), Ok(MotorId::Motor1));
    assert!("Motor4".parse::<MotorId>().is_err());

    assert_eq!("Speed".parse::<Axis>(), Ok(Axis::Speed));
    assert_eq!("pos".parse::<Axis>(), Ok(Axis::Position));
    assert!("torque".parse::<Axis>().is_err());
}
