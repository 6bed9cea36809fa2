//! Field schema of the BMV-7xx battery monitors.
//!
//! Units are those of the raw wire values; the consumer scales them.

use crate::vedirect::registry::{FieldDefinition, FieldType};

pub const PID: FieldDefinition = FieldDefinition::new(FieldType::Number, "PID", 0);
pub const VOLTAGE: FieldDefinition = FieldDefinition::with_unit(FieldType::Number, "V", 1, "mV");
pub const VOLTAGE_AUX: FieldDefinition =
    FieldDefinition::with_unit(FieldType::Number, "VS", 2, "mV");
pub const CURRENT: FieldDefinition = FieldDefinition::with_unit(FieldType::Number, "I", 3, "mA");
pub const POWER: FieldDefinition = FieldDefinition::with_unit(FieldType::Number, "P", 4, "W");
pub const CONSUMED: FieldDefinition =
    FieldDefinition::with_unit(FieldType::Number, "CE", 5, "mAh");
pub const STATE_OF_CHARGE: FieldDefinition =
    FieldDefinition::with_unit(FieldType::Number, "SOC", 6, "1/1000");
pub const TIME_TO_GO: FieldDefinition =
    FieldDefinition::with_unit(FieldType::Number, "TTG", 7, "Minutes");
pub const ALARM: FieldDefinition = FieldDefinition::new(FieldType::Boolean, "Alarm", 8);
pub const RELAY: FieldDefinition = FieldDefinition::new(FieldType::Boolean, "Relay", 9);
pub const ALARM_REASON: FieldDefinition =
    FieldDefinition::with_unit(FieldType::Number, "AR", 10, "Enum");
pub const MODEL: FieldDefinition = FieldDefinition::new(FieldType::String, "BMV", 11);
pub const FIRMWARE: FieldDefinition = FieldDefinition::new(FieldType::String, "FW", 12);
pub const MONITOR_MODE: FieldDefinition =
    FieldDefinition::with_unit(FieldType::Number, "MON", 13, "Enum");
pub const TEMPERATURE: FieldDefinition =
    FieldDefinition::with_unit(FieldType::Number, "T", 14, "C");

pub const BMV_N_FIELDS: usize = 15;

pub static BMV_FIELDS: [FieldDefinition; BMV_N_FIELDS] = [
    PID,
    VOLTAGE,
    VOLTAGE_AUX,
    CURRENT,
    POWER,
    CONSUMED,
    STATE_OF_CHARGE,
    TIME_TO_GO,
    ALARM,
    RELAY,
    ALARM_REASON,
    MODEL,
    FIRMWARE,
    MONITOR_MODE,
    TEMPERATURE,
];
