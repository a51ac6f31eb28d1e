//! Map server-reported "already existing" items back to the source rows they came from.
//!
//! Each item is resolved independently through a fixed chain; the first
//! strategy that hits wins:
//!
//! 1. exact normalized email
//! 2. exact normalized phone
//! 3. exact `name|course|place` key
//! 4. fuzzy containment against the flattened item
//! 5. positional alignment (only when item and batch counts are equal)
//! 6. unresolved

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::extract::{name_course_place_key, normalize_email, normalize_phone};
use crate::model::{Provenance, Record, ServerOutcomeItem};

pub const UNKNOWN_SHEET: &str = "Unknown sheet";
pub const UNKNOWN_ROW: &str = "Unknown row";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Email,
    Phone,
    NameCoursePlace,
    Fuzzy,
    Positional,
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::Phone => write!(f, "phone"),
            Self::NameCoursePlace => write!(f, "name_course_place"),
            Self::Fuzzy => write!(f, "fuzzy"),
            Self::Positional => write!(f, "positional"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum Resolution {
    Matched {
        strategy: MatchStrategy,
        provenance: Provenance,
    },
    Unresolved,
}

impl Resolution {
    pub fn descriptor(&self) -> String {
        match self {
            Self::Matched { provenance, .. } => provenance.descriptor(),
            Self::Unresolved => format!("{UNKNOWN_SHEET} Row {UNKNOWN_ROW}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciledItem {
    pub item: ServerOutcomeItem,
    pub resolution: Resolution,
    pub descriptor: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub items: Vec<ReconciledItem>,
    pub strategy_counts: BTreeMap<String, usize>,
    pub unresolved: usize,
}

impl Reconciliation {
    /// Every resolved descriptor, in server item order. Never truncated.
    pub fn descriptors(&self) -> Vec<String> {
        self.items.iter().map(|i| i.descriptor.clone()).collect()
    }

    /// First `limit` descriptors joined, plus a `+N more` suffix when cut.
    pub fn display_line(&self, limit: usize) -> String {
        let shown: Vec<&str> = self.items.iter().take(limit).map(|i| i.descriptor.as_str()).collect();
        let mut line = shown.join(", ");
        let hidden = self.items.len().saturating_sub(limit);
        if hidden > 0 {
            line.push_str(&format!(" +{hidden} more"));
        }
        line
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Exact-key indexes over the submitted batch. First record holding a key wins.
struct BatchIndex<'a> {
    batch: &'a [Record],
    by_email: HashMap<&'a str, usize>,
    by_phone: HashMap<&'a str, usize>,
    by_key: HashMap<&'a str, usize>,
}

impl<'a> BatchIndex<'a> {
    fn new(batch: &'a [Record]) -> Self {
        let mut by_email = HashMap::new();
        let mut by_phone = HashMap::new();
        let mut by_key = HashMap::new();
        for (i, r) in batch.iter().enumerate() {
            if !r.normalized_email.is_empty() {
                by_email.entry(r.normalized_email.as_str()).or_insert(i);
            }
            if !r.normalized_phone.is_empty() {
                by_phone.entry(r.normalized_phone.as_str()).or_insert(i);
            }
            if has_key_content(&r.name_course_place_key) {
                by_key.entry(r.name_course_place_key.as_str()).or_insert(i);
            }
        }
        Self { batch, by_email, by_phone, by_key }
    }

    fn exact(&self, item: &ServerOutcomeItem) -> Option<(MatchStrategy, usize)> {
        if let Some(email) = item.email.as_deref().map(normalize_email) {
            if let Some(&i) = self.by_email.get(email.as_str()) {
                return Some((MatchStrategy::Email, i));
            }
        }

        if let Some(phone) = item.phone.as_deref().map(normalize_phone) {
            if let Some(&i) = self.by_phone.get(phone.as_str()) {
                return Some((MatchStrategy::Phone, i));
            }
        }

        let key = name_course_place_key(
            item.name.as_deref().unwrap_or(""),
            item.course.as_deref().unwrap_or(""),
            item.place.as_deref().unwrap_or(""),
        );
        if has_key_content(&key) {
            if let Some(&i) = self.by_key.get(key.as_str()) {
                return Some((MatchStrategy::NameCoursePlace, i));
            }
        }
        None
    }

    fn fuzzy(&self, item: &ServerOutcomeItem) -> Option<usize> {
        let flat = item.flatten();
        if flat.is_empty() {
            return None;
        }
        self.batch.iter().position(|r| {
            if !r.normalized_email.is_empty() && flat.contains(&r.normalized_email) {
                return true;
            }
            if !r.normalized_phone.is_empty() && flat.contains(&r.normalized_phone) {
                return true;
            }
            r.name_course_place_key
                .split('|')
                .any(|seg| !seg.is_empty() && flat.contains(seg))
        })
    }
}

fn has_key_content(key: &str) -> bool {
    key.split('|').any(|seg| !seg.is_empty())
}

/// Resolve each server item against the submitted batch.
pub fn reconcile(batch: &[Record], items: &[ServerOutcomeItem]) -> Reconciliation {
    let index = BatchIndex::new(batch);
    let positional = items.len() == batch.len();

    let mut out = Reconciliation::default();
    for (pos, item) in items.iter().enumerate() {
        let hit = index
            .exact(item)
            .or_else(|| index.fuzzy(item).map(|i| (MatchStrategy::Fuzzy, i)))
            .or_else(|| positional.then_some((MatchStrategy::Positional, pos)));

        let resolution = match hit {
            Some((strategy, i)) => {
                *out.strategy_counts.entry(strategy.to_string()).or_insert(0) += 1;
                Resolution::Matched {
                    strategy,
                    provenance: batch[i].provenance.clone(),
                }
            }
            None => {
                out.unresolved += 1;
                Resolution::Unresolved
            }
        };

        debug!(item = pos, descriptor = %resolution.descriptor(), "server item reconciled");
        out.items.push(ReconciledItem {
            item: item.clone(),
            descriptor: resolution.descriptor(),
            resolution,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(row: usize, name: &str, email: &str, phone: &str) -> Record {
        Record {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            course: "Art".into(),
            place: "Goa".into(),
            provenance: Provenance { sheet_name: "S".into(), row_idx: row },
            normalized_email: normalize_email(email),
            normalized_phone: normalize_phone(phone),
            name_course_place_key: name_course_place_key(name, "Art", "Goa"),
        }
    }

    fn batch() -> Vec<Record> {
        vec![
            rec(1, "Ann", "ann@x.com", "1111111111"),
            rec(2, "Bob", "bob@x.com", "2222222222"),
            rec(3, "Cy", "cy@x.com", "3333333333"),
        ]
    }

    fn matched_row(r: &Reconciliation, i: usize) -> Option<(MatchStrategy, usize)> {
        match &r.items[i].resolution {
            Resolution::Matched { strategy, provenance } => Some((*strategy, provenance.row_idx)),
            Resolution::Unresolved => None,
        }
    }

    #[test]
    fn email_only_item_resolves_to_its_record() {
        let item = ServerOutcomeItem { email: Some(" BOB@X.com".into()), ..Default::default() };
        let r = reconcile(&batch(), &[item]);
        assert_eq!(matched_row(&r, 0), Some((MatchStrategy::Email, 2)));
        assert_eq!(r.items[0].descriptor, "S Row 3");
    }

    #[test]
    fn email_beats_phone() {
        let item = ServerOutcomeItem {
            email: Some("cy@x.com".into()),
            phone: Some("1111111111".into()),
            ..Default::default()
        };
        let r = reconcile(&batch(), &[item]);
        assert_eq!(matched_row(&r, 0), Some((MatchStrategy::Email, 3)));
    }

    #[test]
    fn phone_then_key() {
        let by_phone = ServerOutcomeItem {
            email: Some("other@x.com".into()),
            phone: Some("22222 22222".into()),
            ..Default::default()
        };
        let by_key = ServerOutcomeItem {
            name: Some("  CY ".into()),
            course: Some("art".into()),
            place: Some("GOA".into()),
            ..Default::default()
        };
        let r = reconcile(&batch(), &[by_phone, by_key]);
        assert_eq!(matched_row(&r, 0), Some((MatchStrategy::Phone, 2)));
        assert_eq!(matched_row(&r, 1), Some((MatchStrategy::NameCoursePlace, 3)));
    }

    #[test]
    fn fuzzy_scans_batch_order() {
        // Row text mentions Bob's phone; no exact field matches
        let item = ServerOutcomeItem { row: Some("dup of 2222222222".into()), ..Default::default() };
        let r = reconcile(&batch(), &[item]);
        assert_eq!(matched_row(&r, 0), Some((MatchStrategy::Fuzzy, 2)));
    }

    #[test]
    fn fuzzy_segment_first_hit_wins() {
        // "art" is a segment of every record key; the first record wins
        let item = ServerOutcomeItem { course: Some("Fine Art".into()), ..Default::default() };
        let r = reconcile(&batch(), &[item]);
        assert_eq!(matched_row(&r, 0), Some((MatchStrategy::Fuzzy, 1)));
    }

    #[test]
    fn positional_only_when_counts_match() {
        let blank = ServerOutcomeItem { sheet_name: Some("zzz".into()), ..Default::default() };
        let r = reconcile(&batch(), &[blank.clone(), blank.clone(), blank.clone()]);
        assert_eq!(matched_row(&r, 1), Some((MatchStrategy::Positional, 2)));

        let r = reconcile(&batch(), &[blank.clone(), blank]);
        assert_eq!(matched_row(&r, 0), None);
        assert_eq!(r.items[0].descriptor, "Unknown sheet Row Unknown row");
        assert_eq!(r.unresolved, 2);
    }

    #[test]
    fn blank_item_keys_never_match_blank_records() {
        let batch = vec![rec(1, "", "", "")];
        let item = ServerOutcomeItem { email: Some("".into()), ..Default::default() };
        let r = reconcile(&batch, &[item.clone(), item]);
        assert_eq!(r.unresolved, 2);
        assert!(r.items.iter().all(|i| i.resolution == Resolution::Unresolved));
    }

    #[test]
    fn display_line_truncates_but_keeps_full_list() {
        let batch: Vec<Record> = (0..12)
            .map(|i| rec(i + 1, "Ann", &format!("a{i}@x.com"), &format!("{:010}", i)))
            .collect();
        let items: Vec<ServerOutcomeItem> = (0..12)
            .map(|i| ServerOutcomeItem { email: Some(format!("a{i}@x.com")), ..Default::default() })
            .collect();
        let r = reconcile(&batch, &items);
        assert_eq!(r.descriptors().len(), 12);
        let line = r.display_line(10);
        assert!(line.ends_with("S Row 11 +2 more"), "{line}");
        assert_eq!(r.strategy_counts.get("email"), Some(&12));
    }
}
