//! Raw weight-entry log rows as delivered by the upstream API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of operation a log row records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "OperationRepr", into = "String")]
pub enum OperationType {
    Create,
    Delete,
    /// Any operation the pipeline does not interpret (updates, syncs, ...).
    Other(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OperationRepr {
    Code(i64),
    Text(String),
}

impl From<OperationRepr> for OperationType {
    fn from(repr: OperationRepr) -> Self {
        match repr {
            OperationRepr::Code(1) => OperationType::Create,
            OperationRepr::Code(2) => OperationType::Delete,
            OperationRepr::Code(code) => OperationType::Other(code.to_string()),
            OperationRepr::Text(text) => OperationType::parse(&text),
        }
    }
}

impl From<OperationType> for String {
    fn from(op: OperationType) -> Self {
        op.to_string()
    }
}

impl OperationType {
    /// Decode an operation name, case-insensitively.
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "create" | "add" | "insert" => OperationType::Create,
            "delete" | "remove" => OperationType::Delete,
            _ => OperationType::Other(text.to_string()),
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, OperationType::Create)
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, OperationType::Delete)
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Create => write!(f, "create"),
            OperationType::Delete => write!(f, "delete"),
            OperationType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Display unit of a weight value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
    Jin,
    Other(String),
}

impl WeightUnit {
    /// Decode an optional unit string; missing or blank means kilograms.
    pub fn parse(unit: Option<&str>) -> Self {
        let Some(raw) = unit.map(str::trim).filter(|u| !u.is_empty()) else {
            return WeightUnit::Kg;
        };
        match raw.to_ascii_lowercase().as_str() {
            "kg" | "kgs" | "kilogram" | "kilograms" => WeightUnit::Kg,
            "lb" | "lbs" | "pound" | "pounds" => WeightUnit::Lb,
            "jin" | "斤" => WeightUnit::Jin,
            _ => WeightUnit::Other(raw.to_string()),
        }
    }

    /// Multiplier converting a value in this unit to kilograms.
    ///
    /// Unknown units are assumed to already be kilogram-equivalent.
    pub fn kg_factor(&self) -> f64 {
        match self {
            WeightUnit::Kg | WeightUnit::Other(_) => 1.0,
            WeightUnit::Lb => 0.453_592_37,
            WeightUnit::Jin => 0.5,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lb => "lb",
            WeightUnit::Jin => "jin",
            WeightUnit::Other(label) => label,
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One logged operation from the source system.
///
/// Several rows may share `entry_timestamp`; together they are the full
/// operation history of one logical weight entry. `weight` and the
/// body-composition fields are fixed-point values scaled by 10.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    pub operation_type: OperationType,
    pub entry_timestamp: String,
    #[serde(default)]
    pub server_timestamp: String,
    pub weight: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_fat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muscle_mass: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bone_mass: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impedance: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmr: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metabolic_age: Option<i64>,
    /// Fields this crate does not model, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RawEntry {
    /// Build a bare entry with no body-composition data.
    pub fn new(
        operation_type: OperationType,
        entry_timestamp: impl Into<String>,
        server_timestamp: impl Into<String>,
        weight: i64,
    ) -> Self {
        Self {
            operation_type,
            entry_timestamp: entry_timestamp.into(),
            server_timestamp: server_timestamp.into(),
            weight,
            unit: None,
            bmi: None,
            body_fat: None,
            muscle_mass: None,
            bone_mass: None,
            water: None,
            impedance: None,
            pulse: None,
            bmr: None,
            metabolic_age: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_bmi(mut self, bmi: i64) -> Self {
        self.bmi = Some(bmi);
        self
    }

    pub fn weight_unit(&self) -> WeightUnit {
        WeightUnit::parse(self.unit.as_deref())
    }

    /// Weight in the entry's own unit.
    pub fn weight_value(&self) -> f64 {
        self.weight as f64 / 10.0
    }
}

/// Decode an entry log from a JSON array.
pub fn parse_entries_json(json: &str) -> crate::error::ChartResult<Vec<RawEntry>> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_type_parse() {
        assert_eq!(OperationType::parse("Create"), OperationType::Create);
        assert_eq!(OperationType::parse(" DELETE "), OperationType::Delete);
        assert_eq!(
            OperationType::parse("update"),
            OperationType::Other("update".to_string())
        );
    }

    #[test]
    fn test_decode_entry_camel_case() {
        let json = r#"[{
            "operationType": "create",
            "entryTimestamp": "2024-01-01T08:00:00Z",
            "serverTimestamp": "2024-01-01T08:00:05.123Z",
            "weight": 705,
            "unit": "kg",
            "bmi": 231,
            "visceralFat": 9
        }]"#;
        let entries = parse_entries_json(json).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert!(entry.operation_type.is_create());
        assert_eq!(entry.weight, 705);
        assert_eq!(entry.bmi, Some(231));
        assert_eq!(entry.weight_unit(), WeightUnit::Kg);
        assert!((entry.weight_value() - 70.5).abs() < 1e-9);
        assert_eq!(entry.extra.get("visceralFat"), Some(&serde_json::json!(9)));
    }

    #[test]
    fn test_decode_numeric_operation_codes() {
        let json = r#"[
            {"operationType": 1, "entryTimestamp": "a", "weight": 700},
            {"operationType": 2, "entryTimestamp": "a", "weight": 700},
            {"operationType": 7, "entryTimestamp": "b", "weight": 700}
        ]"#;
        let entries = parse_entries_json(json).unwrap();
        assert!(entries[0].operation_type.is_create());
        assert!(entries[1].operation_type.is_delete());
        assert_eq!(entries[2].operation_type, OperationType::Other("7".into()));
        assert_eq!(entries[0].server_timestamp, "");
    }

    #[test]
    fn test_weight_unit_defaults_to_kg() {
        assert_eq!(WeightUnit::parse(None), WeightUnit::Kg);
        assert_eq!(WeightUnit::parse(Some("  ")), WeightUnit::Kg);
        assert_eq!(WeightUnit::parse(Some("LBS")), WeightUnit::Lb);
        assert_eq!(WeightUnit::parse(Some("st")).label(), "st");
    }

    #[test]
    fn test_serialize_operation_as_string() {
        let entry = RawEntry::new(OperationType::Delete, "t", "s", 650);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["operationType"], "delete");
        assert_eq!(value["entryTimestamp"], "t");
        assert!(value.get("bmi").is_none());
    }
}
