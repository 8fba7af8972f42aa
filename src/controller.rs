use thiserror::Error;
use tracing::{debug, info};

use crate::columns::{self, ColumnDescriptor};
use crate::fetch::{Backend, FetchCoordinator, FetchOutcome, FetchResult, Row};
use crate::query::{QueryKey, QueryState, QueryStore, SortDirection, ValidationError};
use crate::view::{DisplayMode, Pagination, TableView, ViewError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    View(#[from] ViewError),
}

/// What processing one response did to the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableEvent {
    /// Rows for the current query are on screen.
    Loaded { sequence: u64 },
    /// The current query failed; the error replaces the table.
    Failed { sequence: u64, message: String },
    /// A newer-than-processed response for a query the user has already left.
    /// Its rows are held but the table stays in loading and the total is
    /// left alone.
    Superseded { sequence: u64 },
}

struct Published {
    key: QueryKey,
    result: FetchResult,
}

/// One mounted ranked table: query state, request bookkeeping and the last
/// accepted page, all scoped to this instance.
pub struct TableController<B> {
    store: QueryStore,
    coordinator: FetchCoordinator<B>,
    columns: Vec<ColumnDescriptor>,
    issued_key: Option<QueryKey>,
    published: Option<Published>,
    mode: DisplayMode,
}

impl<B: Backend + 'static> TableController<B> {
    pub fn new(backend: B, initial: QueryState, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            store: QueryStore::new(initial),
            coordinator: FetchCoordinator::new(backend),
            columns,
            issued_key: None,
            published: None,
            mode: DisplayMode::Idle,
        }
    }

    /// Issues the first request. Calling it again is a no-op.
    pub fn mount(&mut self) {
        if self.mode == DisplayMode::Idle {
            self.sync();
        }
    }

    pub fn unmount(self) {
        info!(
            requests = self.coordinator.requests_issued(),
            orphaned = self.coordinator.in_flight(),
            discarded = self.coordinator.discarded(),
            "unmounting table"
        );
    }

    pub fn state(&self) -> &QueryState {
        self.store.state()
    }

    pub fn mode(&self) -> &DisplayMode {
        &self.mode
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        match (&self.mode, self.published.as_ref()) {
            (DisplayMode::Success, Some(published)) => &published.result.rows,
            _ => &[],
        }
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::derive(self.store.state())
    }

    pub fn view(&self) -> TableView {
        TableView::derive(
            self.store.state(),
            self.published.as_ref().map(|p| &p.result),
            &self.columns,
            &self.mode,
        )
    }

    pub fn in_flight(&self) -> usize {
        self.coordinator.in_flight()
    }

    pub fn requests_issued(&self) -> u64 {
        self.coordinator.requests_issued()
    }

    pub fn set_page(&mut self, page_index: usize) -> Result<(), ControllerError> {
        self.pagination().check_page(page_index)?;
        self.store.set_page(page_index);
        self.sync();
        Ok(())
    }

    pub fn next_page(&mut self) -> Result<(), ControllerError> {
        let pagination = self.pagination();
        let page = pagination
            .page_index
            .checked_add(1)
            .ok_or(ViewError::PageOutOfRange {
                page: pagination.page_index,
                page_count: pagination.page_count,
            })?;
        self.set_page(page)
    }

    pub fn previous_page(&mut self) -> Result<(), ControllerError> {
        let page = self
            .state()
            .page_index()
            .checked_sub(1)
            .ok_or(ViewError::NoPreviousPage)?;
        self.set_page(page)
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), ControllerError> {
        self.store.set_page_size(page_size)?;
        self.sync();
        Ok(())
    }

    pub fn set_sort(
        &mut self,
        column_key: &str,
        direction: SortDirection,
    ) -> Result<(), ControllerError> {
        let key = self.sortable_column(column_key)?.key;
        self.store.set_sort(key, direction);
        self.sync();
        Ok(())
    }

    pub fn clear_sort(&mut self) {
        self.store.clear_sort();
        self.sync();
    }

    /// Column header click.
    pub fn toggle_sort(&mut self, column_key: &str) -> Result<(), ControllerError> {
        let column = self.sortable_column(column_key)?.clone();
        self.store.toggle_sort(&column)?;
        self.sync();
        Ok(())
    }

    pub fn set_filter(&mut self, text: &str) -> Result<(), ControllerError> {
        self.store.set_filter(text)?;
        self.sync();
        Ok(())
    }

    pub fn clear_filter(&mut self) -> Result<(), ControllerError> {
        self.store.clear_filter()?;
        self.sync();
        Ok(())
    }

    /// Re-issues the current query even though nothing changed, e.g. after a
    /// failure.
    pub fn retry(&mut self) {
        let key = self.state().key();
        self.issue(key);
    }

    /// Processes the next non-stale response. `None` when nothing is in flight.
    pub async fn next_event(&mut self) -> Option<TableEvent> {
        let outcome = self.coordinator.next_outcome().await?;
        Some(self.apply(outcome))
    }

    /// Drives responses until the current query resolves or nothing is left
    /// in flight.
    pub async fn settle(&mut self) -> &DisplayMode {
        while self.mode.is_loading() {
            if self.next_event().await.is_none() {
                break;
            }
        }
        &self.mode
    }

    fn sortable_column(&self, column_key: &str) -> Result<&ColumnDescriptor, ValidationError> {
        let column =
            columns::find(&self.columns, column_key).ok_or_else(|| ValidationError::UnknownColumn {
                key: column_key.to_string(),
            })?;
        if !column.sortable {
            return Err(ValidationError::NotSortable {
                key: column.key.to_string(),
            });
        }
        Ok(column)
    }

    fn sync(&mut self) {
        let key = self.state().key();
        if self.issued_key.as_ref() == Some(&key) {
            debug!(key = %key, "query unchanged, no request issued");
            return;
        }
        self.issue(key);
    }

    fn issue(&mut self, key: QueryKey) {
        self.coordinator.issue(key.clone());
        self.issued_key = Some(key);
        self.mode = DisplayMode::Loading;
    }

    fn apply(&mut self, outcome: FetchOutcome) -> TableEvent {
        let sequence = outcome.sequence();
        let current = outcome.key() == &self.state().key();

        if !current && !self.mode.is_loading() {
            debug!(sequence, "response for a query already answered, ignoring");
            return TableEvent::Superseded { sequence };
        }

        match outcome {
            FetchOutcome::Accepted { key, result, .. } => {
                let total_count = result.total_count;
                self.published = Some(Published { key, result });
                if current {
                    self.store.set_total_count(total_count);
                    self.mode = DisplayMode::Success;
                    TableEvent::Loaded { sequence }
                } else {
                    TableEvent::Superseded { sequence }
                }
            }
            FetchOutcome::Failed { error, .. } => {
                if current {
                    let message = error.to_string();
                    self.mode = DisplayMode::Error(message.clone());
                    TableEvent::Failed { sequence, message }
                } else {
                    TableEvent::Superseded { sequence }
                }
            }
        }
    }

    /// Key of the rows currently held, if any.
    pub fn published_key(&self) -> Option<&QueryKey> {
        self.published.as_ref().map(|p| &p.key)
    }
}
