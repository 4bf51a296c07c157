//! In-memory employee directory with a search-driven filtered projection.
//!
//! The store never patches records locally: every successful mutation is followed by a
//! full reload from the gateway. Loads are sequenced with tickets so a response that
//! resolves after a newer one has been applied is discarded instead of overwriting it.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::{
    domain::{EmployeeDraft, EmployeeId, EmployeeRecord},
    validation::validate_employee,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    error::{ClientError, GatewayError},
    PositionCatalog, RecordGateway,
};

pub const PAGE_SIZE_OPTIONS: [usize; 3] = [5, 10, 15];
pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { ticket: u64, count: usize },
    /// A newer load had already been applied when this one resolved.
    Stale { ticket: u64 },
}

#[derive(Default)]
struct DirectoryState {
    records: Vec<EmployeeRecord>,
    filtered: Vec<EmployeeRecord>,
    search_term: String,
    positions: Vec<String>,
    applied_ticket: u64,
}

impl DirectoryState {
    fn refilter(&mut self) {
        let needle = self.search_term.to_lowercase();
        self.filtered = self
            .records
            .iter()
            .filter(|record| record.first_name_contains(&needle))
            .cloned()
            .collect();
    }
}

pub struct DirectoryStore {
    gateway: Arc<dyn RecordGateway>,
    next_ticket: AtomicU64,
    state: RwLock<DirectoryState>,
}

impl DirectoryStore {
    pub fn new(gateway: Arc<dyn RecordGateway>) -> Self {
        Self {
            gateway,
            next_ticket: AtomicU64::new(0),
            state: RwLock::new(DirectoryState::default()),
        }
    }

    /// Replaces the directory with the gateway's list and resets the search. On failure the
    /// previous state is kept and the error returned.
    pub async fn load(&self) -> Result<LoadOutcome, GatewayError> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let records = self.gateway.list().await.inspect_err(|err| {
            warn!(ticket, error = %err, "directory load failed; keeping previous state");
        })?;

        let mut state = self.state.write().await;
        if ticket <= state.applied_ticket {
            debug!(
                ticket,
                applied = state.applied_ticket,
                "discarding stale directory load"
            );
            return Ok(LoadOutcome::Stale { ticket });
        }

        let count = records.len();
        state.applied_ticket = ticket;
        state.records = records;
        state.search_term.clear();
        state.filtered = state.records.clone();
        info!(ticket, count, "directory loaded");
        Ok(LoadOutcome::Applied { ticket, count })
    }

    /// Fetches the valid positions used when validating create and update forms.
    pub async fn load_positions(
        &self,
        catalog: &dyn PositionCatalog,
    ) -> Result<usize, GatewayError> {
        let positions = catalog.positions().await.inspect_err(|err| {
            warn!(error = %err, "failed to load position catalog");
        })?;
        let count = positions.len();
        self.state.write().await.positions = positions;
        Ok(count)
    }

    pub async fn set_search_term(&self, term: impl Into<String>) {
        let mut state = self.state.write().await;
        state.search_term = term.into();
        state.refilter();
    }

    pub async fn search_term(&self) -> String {
        self.state.read().await.search_term.clone()
    }

    pub async fn records(&self) -> Vec<EmployeeRecord> {
        self.state.read().await.records.clone()
    }

    pub async fn filtered(&self) -> Vec<EmployeeRecord> {
        self.state.read().await.filtered.clone()
    }

    pub async fn filtered_len(&self) -> usize {
        self.state.read().await.filtered.len()
    }

    pub async fn positions(&self) -> Vec<String> {
        self.state.read().await.positions.clone()
    }

    /// Items `[page_index * page_size, page_index * page_size + page_size)` of the filtered
    /// projection. Out-of-range requests yield an empty page.
    pub async fn page(&self, page_index: usize, page_size: usize) -> Vec<EmployeeRecord> {
        let Some(start) = page_index.checked_mul(page_size) else {
            return Vec::new();
        };
        let state = self.state.read().await;
        state
            .filtered
            .iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect()
    }

    pub async fn page_count(&self, page_size: usize) -> usize {
        if page_size == 0 {
            return 0;
        }
        self.filtered_len().await.div_ceil(page_size)
    }

    pub async fn create(&self, draft: EmployeeDraft) -> Result<EmployeeRecord, ClientError> {
        let draft = draft.trimmed();
        self.validate(&draft).await?;
        let created = self.gateway.create(&draft).await.inspect_err(|err| {
            warn!(error = %err, "create employee failed");
        })?;
        info!(id = %created.id, "employee created");
        self.reload_after("create").await;
        Ok(created)
    }

    pub async fn update(
        &self,
        id: EmployeeId,
        draft: EmployeeDraft,
    ) -> Result<EmployeeRecord, ClientError> {
        let draft = draft.trimmed();
        self.validate(&draft).await?;
        let updated = self.gateway.update(id, &draft).await.inspect_err(|err| {
            warn!(%id, error = %err, "update employee failed");
        })?;
        info!(%id, "employee updated");
        self.reload_after("update").await;
        Ok(updated)
    }

    pub async fn delete(&self, id: EmployeeId) -> Result<(), ClientError> {
        self.gateway.delete(id).await.inspect_err(|err| {
            warn!(%id, error = %err, "delete employee failed");
        })?;
        info!(%id, "employee deleted");
        self.reload_after("delete").await;
        Ok(())
    }

    async fn validate(&self, draft: &EmployeeDraft) -> Result<(), ClientError> {
        let positions = self.positions().await;
        validate_employee(draft, &positions).into_result()?;
        Ok(())
    }

    // The mutation already succeeded server-side; a failed reload only leaves the view stale.
    async fn reload_after(&self, operation: &'static str) {
        if let Err(err) = self.load().await {
            warn!(operation, error = %err, "reload after mutation failed");
        }
    }
}

#[cfg(test)]
#[path = "tests/directory_tests.rs"]
mod tests;
