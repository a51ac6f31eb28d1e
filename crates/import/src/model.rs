use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input grids
// ---------------------------------------------------------------------------

/// A raw scalar as produced by the workbook loader.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// One workbook sheet as an ordered grid of rows.
#[derive(Debug, Clone)]
pub struct SheetGrid {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetGrid {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { name: name.into(), rows }
    }

    /// Build a sheet from plain string rows (CSV-style input, tests).
    pub fn from_strings<S: AsRef<str>>(name: impl Into<String>, rows: &[Vec<S>]) -> Self {
        let rows = rows
            .iter()
            .map(|r| r.iter().map(|c| CellValue::from(c.as_ref())).collect())
            .collect();
        Self { name: name.into(), rows }
    }
}

/// Pre-loaded sheets in workbook order.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<SheetGrid>,
}

// ---------------------------------------------------------------------------
// Canonical schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Name,
    Email,
    Phone,
    Course,
    Place,
}

impl CanonicalField {
    /// Fixed field order used for extraction, validation and reporting.
    pub const ALL: [CanonicalField; 5] = [
        Self::Name,
        Self::Email,
        Self::Phone,
        Self::Course,
        Self::Place,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Course => "course",
            Self::Place => "place",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Name => 0,
            Self::Email => 1,
            Self::Phone => 2,
            Self::Course => 3,
            Self::Place => 4,
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Where a record came from. `row_idx` is the 0-based grid row inside the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Provenance {
    pub sheet_name: String,
    pub row_idx: usize,
}

impl Provenance {
    /// `"<sheet> Row <n>"` with the 1-based row number a spreadsheet user sees.
    pub fn descriptor(&self) -> String {
        format!("{} Row {}", self.sheet_name, self.row_idx + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub course: String,
    pub place: String,
    pub provenance: Provenance,
    pub normalized_email: String,
    pub normalized_phone: String,
    pub name_course_place_key: String,
}

impl Record {
    pub fn field(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::Name => &self.name,
            CanonicalField::Email => &self.email,
            CanonicalField::Phone => &self.phone,
            CanonicalField::Course => &self.course,
            CanonicalField::Place => &self.place,
        }
    }

    /// The 5-field subset sent to the persistence collaborator.
    pub fn payload(&self) -> ContactPayload {
        ContactPayload {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            course: self.course.clone(),
            place: self.place.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPayload {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub course: String,
    pub place: String,
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Missing,
    Format,
    Duplicate,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Format => write!(f, "format"),
            Self::Duplicate => write!(f, "duplicate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub provenance: Provenance,
    pub field: CanonicalField,
    pub category: ErrorCategory,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Server outcome
// ---------------------------------------------------------------------------

/// A loosely-shaped "already existing" item reported by the commit collaborator.
///
/// Deserializes from any JSON value: unknown keys are ignored, numbers and
/// strings are both accepted, and every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct ServerOutcomeItem {
    #[serde(rename = "sheetName", skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
}

const ROW_KEYS: [&str; 4] = ["rowIdxInSheet", "rowIndex", "row", "index"];

impl From<serde_json::Value> for ServerOutcomeItem {
    fn from(value: serde_json::Value) -> Self {
        let serde_json::Value::Object(map) = value else {
            return Self::default();
        };
        let get = |key: &str| map.get(key).and_then(scalar_to_string);

        Self {
            sheet_name: get("sheetName").or_else(|| get("sheet_name")),
            row: ROW_KEYS.iter().find_map(|k| get(k)),
            email: get("email"),
            phone: get("phone"),
            name: get("name"),
            course: get("course"),
            place: get("place"),
        }
    }
}

fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl ServerOutcomeItem {
    /// Flatten every present value into one lowercase string for containment tests.
    pub fn flatten(&self) -> String {
        [
            &self.sheet_name,
            &self.row,
            &self.email,
            &self.phone,
            &self.name,
            &self.course,
            &self.place,
        ]
        .iter()
        .filter_map(|v| v.as_deref())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outcome_item_tolerates_any_shape() {
        let item: ServerOutcomeItem = serde_json::from_value(json!({
            "sheetName": "Batch A",
            "rowIndex": 4,
            "email": "a@b.co",
            "extra": {"nested": true}
        }))
        .unwrap();
        assert_eq!(item.sheet_name.as_deref(), Some("Batch A"));
        assert_eq!(item.row.as_deref(), Some("4"));
        assert_eq!(item.email.as_deref(), Some("a@b.co"));
        assert!(item.phone.is_none());

        let empty: ServerOutcomeItem = serde_json::from_value(json!("not an object")).unwrap();
        assert_eq!(empty, ServerOutcomeItem::default());
    }

    #[test]
    fn outcome_item_row_key_priority() {
        let item: ServerOutcomeItem =
            serde_json::from_value(json!({"index": 9, "rowIdxInSheet": "3"})).unwrap();
        assert_eq!(item.row.as_deref(), Some("3"));
    }

    #[test]
    fn flatten_is_lowercase() {
        let item = ServerOutcomeItem {
            email: Some("Ann@X.COM".into()),
            place: Some("Goa".into()),
            ..Default::default()
        };
        assert_eq!(item.flatten(), "ann@x.com goa");
    }

    #[test]
    fn provenance_descriptor_is_one_based() {
        let p = Provenance { sheet_name: "Sheet1".into(), row_idx: 1 };
        assert_eq!(p.descriptor(), "Sheet1 Row 2");
    }
}
