//! Unit tests for the `VeDirectError` enum and its `Display` implementation.

use vedirect_bridge::error::VeDirectError;

#[test]
fn test_device_unavailable_error() {
    let err = VeDirectError::DeviceUnavailable {
        port: "/dev/ttyUSB0".into(),
        reason: "No such file or directory".into(),
    };
    assert_eq!(
        err.to_string(),
        "Device /dev/ttyUSB0 unavailable: No such file or directory"
    );
}

#[test]
fn test_invalid_index_error() {
    assert_eq!(VeDirectError::InvalidIndex(42).to_string(), "Invalid field index: 42");
}

#[test]
fn test_field_type_mismatch_error() {
    let err = VeDirectError::FieldTypeMismatch {
        tag: "Alarm",
        expected: "number",
    };
    assert_eq!(err.to_string(), "Field Alarm is not a number field");
}

#[test]
fn test_invalid_config_error() {
    let err = VeDirectError::InvalidConfig("baud rate must be positive".into());
    assert_eq!(err.to_string(), "Invalid configuration: baud rate must be positive");
}

#[test]
fn test_serialization_error_conversion() {
    let json_err = serde_json::from_str::<u8>("not json").unwrap_err();
    let err: VeDirectError = json_err.into();
    assert!(err.to_string().starts_with("Serialization error: "));
}
