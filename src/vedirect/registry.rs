//! # VE.Direct Field Registry
//!
//! A registry holds the latest value of every field of one device schema,
//! together with the time it arrived. Lines go in through
//! [`FieldRegistry::load_key_value`]; typed point queries come out. A field
//! that has not been seen since the last [`FieldRegistry::reset`] reads as
//! `None`.
//!
//! The schema itself is a static slice of [`FieldDefinition`]s shared by every
//! registry built on it (see [`crate::vedirect::schema`]).

use crate::error::VeDirectError;
use crate::vedirect::codec::{parse_int, parse_onoff, parse_tagged_value};
use std::fmt;

/// Declared wire type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Number,
    Boolean,
    String,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Number => write!(f, "number"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::String => write!(f, "string"),
        }
    }
}

/// One named slot of a device schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    pub kind: FieldType,
    pub tag: &'static str,
    pub index: usize,
    pub unit: Option<&'static str>,
}

impl FieldDefinition {
    pub const fn new(kind: FieldType, tag: &'static str, index: usize) -> Self {
        FieldDefinition {
            kind,
            tag,
            index,
            unit: None,
        }
    }

    pub const fn with_unit(
        kind: FieldType,
        tag: &'static str,
        index: usize,
        unit: &'static str,
    ) -> Self {
        FieldDefinition {
            kind,
            tag,
            index,
            unit: Some(unit),
        }
    }
}

/// Latest decoded value of a field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    #[default]
    Unset,
    Number(i64),
    Boolean(bool),
    Text(String),
}

#[derive(Debug, Clone, Default)]
struct FieldSlot {
    value: FieldValue,
    /// `None` until the field is observed
    updated_at: Option<u64>,
}

/// Per-device store of the latest field values.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    schema: &'static [FieldDefinition],
    slots: Vec<FieldSlot>,
    fresh_count: usize,
}

impl FieldRegistry {
    pub fn new(schema: &'static [FieldDefinition]) -> Self {
        log::trace!("New VE.Direct registry with {} fields", schema.len());
        for field in schema {
            log::trace!(
                "Field {} {} {}",
                field.index,
                field.tag,
                field.unit.unwrap_or("-")
            );
        }

        FieldRegistry {
            schema,
            slots: vec![FieldSlot::default(); schema.len()],
            fresh_count: 0,
        }
    }

    pub fn definitions(&self) -> &'static [FieldDefinition] {
        self.schema
    }

    /// Schema position of the field with the given tag.
    pub fn index_of(&self, tag: &str) -> Option<usize> {
        self.schema.iter().position(|f| f.tag == tag)
    }

    pub fn definition(&self, index: usize) -> Result<&'static FieldDefinition, VeDirectError> {
        self.schema.get(index).ok_or(VeDirectError::InvalidIndex(index))
    }

    /// Decode `line` against the schema and store the value of the field it
    /// carries, stamped with `arrival_time`.
    ///
    /// Returns `true` if a field was updated. Numeric lines holding `---` or an
    /// unparseable token leave the field untouched. An `arrival_time` of `0` is
    /// stored as `1`, since `0` reads as "never observed".
    pub fn load_key_value(&mut self, line: &str, arrival_time: u64) -> bool {
        let mut updated = false;

        for (slot, field) in self.slots.iter_mut().zip(self.schema) {
            let Some(token) = parse_tagged_value(line, field.tag) else {
                continue;
            };

            let value = match field.kind {
                FieldType::Number => match parse_int(token) {
                    Some(n) => FieldValue::Number(n),
                    None => continue,
                },
                FieldType::Boolean => FieldValue::Boolean(parse_onoff(token)),
                FieldType::String => FieldValue::Text(token.to_string()),
            };

            slot.value = value;
            slot.updated_at = Some(arrival_time.max(1));
            self.fresh_count += 1;
            updated = true;
        }

        updated
    }

    fn fresh_slot(&self, index: usize) -> Option<&FieldSlot> {
        self.slots.get(index).filter(|s| s.updated_at.is_some())
    }

    /// Latest value of the field, if observed since the last reset.
    pub fn value(&self, index: usize) -> Option<&FieldValue> {
        self.fresh_slot(index).map(|s| &s.value)
    }

    pub fn get_number(&self, index: usize) -> Option<i64> {
        match self.value(index)? {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value multiplied by `precision`, e.g. millivolts × 0.001 → volts.
    pub fn get_scaled(&self, index: usize, precision: f64) -> Option<f64> {
        self.get_number(index).map(|n| n as f64 * precision)
    }

    pub fn get_boolean(&self, index: usize) -> Option<bool> {
        match self.value(index)? {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn get_string(&self, index: usize) -> Option<&str> {
        match self.value(index)? {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Like [`get_number`](Self::get_number) but tells a wrong index or a
    /// non-numeric field apart from "not observed yet".
    pub fn try_get_number(&self, index: usize) -> Result<Option<i64>, VeDirectError> {
        let field = self.definition(index)?;
        if field.kind != FieldType::Number {
            return Err(VeDirectError::FieldTypeMismatch {
                tag: field.tag,
                expected: "number",
            });
        }
        Ok(self.get_number(index))
    }

    /// Arrival time of the field's value, `0` if never observed.
    pub fn get_last_timestamp(&self, index: usize) -> u64 {
        self.slots
            .get(index)
            .and_then(|s| s.updated_at)
            .unwrap_or(0)
    }

    /// Number of field updates since the last reset.
    pub fn fresh_count(&self) -> usize {
        self.fresh_count
    }

    /// At least one field was updated since the last reset.
    pub fn is_valid(&self) -> bool {
        self.fresh_count > 0
    }

    /// Forget every value and timestamp.
    pub fn reset(&mut self) {
        self.slots.fill(FieldSlot::default());
        self.fresh_count = 0;
    }
}
