use super::*;
use crate::domain::{Flag, MotorId, MotorTarget, Step};

#[test]
fn client_commands_use_cmd_tag() {
    assert_eq!(
        ClientCommand::GetSequence.to_frame().expect("encode"),
        r#"{"cmd":"get_sequence"}"#
    );

    let save = ClientCommand::SaveSequence {
        sequence: Sequence::default(),
    };
    assert_eq!(
        serde_json::to_value(&save).expect("encode"),
        serde_json::json!({
            "cmd": "save_sequence",
            "sequence": {"loop": 0, "start_with_home": 0, "steps": []}
        })
    );
}

#[test]
fn decodes_sequence_message() {
    let frame = r#"{"type":"sequence","sequence":{"loop":1,"start_with_home":1,"steps":[
        {"dwell":2.5,"motors":{"Motor1":[10,50],"Motor2":[20,60],"Motor3":[30,70]}}
    ]}}"#;

    let ServerMessage::Sequence { sequence } = ServerMessage::decode(frame).expect("decode")
    else {
        panic!("expected sequence message");
    };
    assert_eq!(sequence.looping, Flag::ON);
    assert_eq!(sequence.start_with_home, Flag::ON);
    assert_eq!(sequence.steps.len(), 1);
    let step: &Step = &sequence.steps[0];
    assert_eq!(step.dwell, 2.5);
    assert_eq!(step.motor(MotorId::Motor3), MotorTarget::new(30.0, 70.0));
}

#[test]
fn unknown_types_are_tolerated() {
    assert_eq!(
        ServerMessage::decode(r#"{"type":"pong"}"#).expect("decode"),
        ServerMessage::Pong
    );
    let message = ServerMessage::decode(r#"{"type":"motor_status","motor":"Motor1"}"#)
        .expect("decode");
    assert_eq!(message, ServerMessage::Unknown("motor_status".to_string()));
    assert_eq!(message.kind(), "motor_status");
}

#[test]
fn malformed_frames_are_typed_errors() {
    assert!(matches!(
        ServerMessage::decode("{not json"),
        Err(ProtocolError::InvalidJson(_))
    ));
    assert_eq!(
        ServerMessage::decode(r#"{"sequence":{}}"#),
        Err(ProtocolError::MissingType)
    );
    assert_eq!(
        ServerMessage::decode(r#"{"type":7}"#),
        Err(ProtocolError::MissingType)
    );
    assert!(matches!(
        ServerMessage::decode(r#"{"type":"sequence"}"#),
        Err(ProtocolError::InvalidPayload { kind, .. }) if kind == "sequence"
    ));
    assert!(matches!(
        ServerMessage::decode(r#"{"type":"sequence","sequence":{"loop":1,"steps":[{"dwell":1}]}}"#),
        Err(ProtocolError::InvalidPayload { .. })
    ));
}

#[test]
fn server_messages_encode_with_type_tag() {
    assert_eq!(
        ServerMessage::Pong.to_frame().expect("encode"),
        r#"{"type":"pong"}"#
    );
    let frame = ServerMessage::Sequence {
        sequence: Sequence::default(),
    }
    .to_frame()
    .expect("encode");
    assert_eq!(
        ServerMessage::decode(&frame).expect("decode"),
        ServerMessage::Sequence {
            sequence: Sequence::default()
        }
    );
}

#[test]
fn server_parses_client_commands() {
    let command: ClientCommand = serde_json::from_str(
        r#"{"cmd":"save_sequence","sequence":{"loop":0,"start_with_home":1,"steps":[]}}"#,
    )
    .expect("decode");
    assert_eq!(command.name(), "save_sequence");
    assert!(serde_json::from_str::<ClientCommand>(r#"{"cmd":"reboot"}"#).is_err());
}
