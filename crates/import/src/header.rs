//! Header row detection and raw header → canonical field resolution.

use serde::Serialize;

use crate::model::CanonicalField;
use crate::normalize::{collapse_whitespace, fill_header_blanks};

/// Serial-number style headers that never map to a contact field.
pub const DEFAULT_IGNORED_HEADERS: [&str; 7] =
    ["slno", "sno", "s.no", "srno", "serialno", "serial", "id"];

/// Index of the first row holding any non-blank cell, or `None` for a blank sheet.
pub fn find_header_row(rows: &[Vec<String>]) -> Option<usize> {
    rows.iter().position(|row| row.iter().any(|c| !c.is_empty()))
}

/// Lowercase, collapse whitespace, then drop every non-word character.
pub fn header_key(raw: &str) -> String {
    collapse_whitespace(&raw.to_lowercase())
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Resolved keys, positionally aligned to grid columns. `""` = ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderMap {
    pub keys: Vec<String>,
}

/// Fill header blanks, derive keys and blank out ignore-listed columns.
pub fn build_header_map(raw_headers: &[String], ignored: &[String]) -> HeaderMap {
    let ignored_keys: Vec<String> = ignored.iter().map(|h| header_key(h)).collect();
    let keys = fill_header_blanks(raw_headers)
        .iter()
        .map(|h| {
            let key = header_key(h);
            if ignored_keys.iter().any(|i| *i == key) {
                String::new()
            } else {
                key
            }
        })
        .collect();
    HeaderMap { keys }
}

/// Column indexes feeding each canonical field for one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnResolution {
    columns: [Vec<usize>; 5],
}

impl ColumnResolution {
    pub fn columns(&self, field: CanonicalField) -> &[usize] {
        &self.columns[field.index()]
    }

    pub fn is_resolved(&self, field: CanonicalField) -> bool {
        !self.columns[field.index()].is_empty()
    }

    pub fn resolved_fields(&self) -> impl Iterator<Item = CanonicalField> + '_ {
        CanonicalField::ALL.into_iter().filter(|f| self.is_resolved(*f))
    }
}

/// Exact key matches win; otherwise the first key containing the field name.
pub fn resolve_columns(map: &HeaderMap) -> ColumnResolution {
    let mut resolution = ColumnResolution::default();
    for field in CanonicalField::ALL {
        let name = field.key();
        let exact: Vec<usize> = map
            .keys
            .iter()
            .enumerate()
            .filter(|(_, k)| k.as_str() == name)
            .map(|(i, _)| i)
            .collect();

        resolution.columns[field.index()] = if exact.is_empty() {
            map.keys
                .iter()
                .position(|k| !k.is_empty() && k.contains(name))
                .into_iter()
                .collect()
        } else {
            exact
        };
    }
    resolution
}
