//! Commit contract with the persistence collaborator, and the session object
//! that guards it.
//!
//! `Importer` holds the current preview and a commit state. A commit is split
//! into `begin_commit` (snapshot the batch, mark pending) and `finish_commit`
//! (reconcile the server outcome) so callers that suspend between the two
//! cannot start a second commit in the meantime.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::model::{ContactPayload, Record, ServerOutcomeItem, Workbook};
use crate::preview::PreviewSession;
use crate::reconcile::{reconcile, Reconciliation};

/// What the persistence collaborator reports after a bulk insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommitResponse {
    pub inserted_count: u64,
    pub modified_count: u64,
    pub invalid_count: u64,
    pub already_existing: Vec<ServerOutcomeItem>,
}

/// Persistence collaborator. Implementations own transport and storage.
pub trait CommitSink {
    fn commit(&mut self, records: &[ContactPayload]) -> Result<CommitResponse, ImportError>;
}

/// Batch-level outcome of one successful commit.
#[derive(Debug, Clone, Serialize)]
pub struct CommitReport {
    pub committed_at: String,
    pub submitted: usize,
    pub inserted_count: u64,
    pub modified_count: u64,
    pub invalid_count: u64,
    pub existing: Reconciliation,
    /// Truncated one-line list of existing rows for notifications.
    pub existing_summary: String,
}

impl CommitReport {
    /// Complete, untruncated row descriptors for detail views and logs.
    pub fn existing_rows(&self) -> Vec<String> {
        self.existing.descriptors()
    }
}

/// Snapshot of the batch handed out by `begin_commit`.
#[derive(Debug, Clone)]
pub struct PendingCommit {
    batch: Vec<Record>,
}

impl PendingCommit {
    pub fn payload(&self) -> Vec<ContactPayload> {
        self.batch.iter().map(Record::payload).collect()
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitState {
    Idle,
    Pending,
}

/// One user's import workflow: the latest preview plus commit state.
pub struct Importer {
    config: ImportConfig,
    session: Option<PreviewSession>,
    state: CommitState,
}

impl Importer {
    pub fn new(config: ImportConfig) -> Self {
        Self {
            config,
            session: None,
            state: CommitState::Idle,
        }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&PreviewSession> {
        self.session.as_ref()
    }

    pub fn state(&self) -> CommitState {
        self.state
    }

    /// Build a fresh preview, replacing any previous one wholesale.
    pub fn preview(&mut self, workbook: &Workbook) -> &PreviewSession {
        self.session.insert(PreviewSession::build(workbook, &self.config))
    }

    /// Snapshot the committable batch and mark a commit as pending.
    pub fn begin_commit(&mut self) -> Result<PendingCommit, ImportError> {
        if self.state == CommitState::Pending {
            warn!("commit refused: another commit is still pending");
            return Err(ImportError::CommitInProgress);
        }
        let session = self.session.as_ref().ok_or(ImportError::NoSession)?;
        if !session.can_commit {
            return Err(ImportError::NotCommittable(session.message.clone()));
        }

        self.state = CommitState::Pending;
        info!(records = session.records.len(), "commit started");
        Ok(PendingCommit {
            batch: session.records.clone(),
        })
    }

    /// Resolve a pending commit. A failed call aborts without reconciliation.
    pub fn finish_commit(
        &mut self,
        pending: PendingCommit,
        outcome: Result<CommitResponse, ImportError>,
    ) -> Result<CommitReport, ImportError> {
        if self.state != CommitState::Pending {
            return Err(ImportError::NoPendingCommit);
        }
        self.state = CommitState::Idle;

        let response = outcome.inspect_err(|e| warn!(error = %e, "commit failed"))?;
        let existing = reconcile(&pending.batch, &response.already_existing);
        let existing_summary = existing.display_line(self.config.display_limit);

        info!(
            inserted = response.inserted_count,
            modified = response.modified_count,
            invalid = response.invalid_count,
            existing = existing.items.len(),
            unresolved = existing.unresolved,
            "commit reconciled"
        );

        Ok(CommitReport {
            committed_at: chrono::Utc::now().to_rfc3339(),
            submitted: pending.len(),
            inserted_count: response.inserted_count,
            modified_count: response.modified_count,
            invalid_count: response.invalid_count,
            existing,
            existing_summary,
        })
    }

    /// Begin, call the sink, and finish in one step.
    pub fn commit_with(&mut self, sink: &mut dyn CommitSink) -> Result<CommitReport, ImportError> {
        let pending = self.begin_commit()?;
        let outcome = sink.commit(&pending.payload());
        self.finish_commit(pending, outcome)
    }
}
