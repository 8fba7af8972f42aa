use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::columns::ColumnDescriptor;

pub const PAGE_SIZES: [usize; 4] = [10, 25, 50, 100];
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_SORT_COLUMN: &str = "eviction_count";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub column_key: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(column_key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column_key: column_key.into(),
            direction,
        }
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.column_key, self.direction)
    }
}

/// The query tuple. Two states with equal keys map to the same backend request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub page_index: usize,
    pub page_size: usize,
    pub sort: Option<SortSpec>,
    pub filter_text: String,
}

impl QueryKey {
    /// 1-based page number used on the wire.
    pub fn page_number(&self) -> usize {
        self.page_index.saturating_add(1)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page={} size={}", self.page_number(), self.page_size)?;
        if let Some(sort) = self.sort.as_ref() {
            write!(f, " sort={sort}")?;
        }
        if !self.filter_text.is_empty() {
            write!(f, " filter={:?}", self.filter_text)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("enter a landlord name or address to filter by")]
    EmptyFilter,

    #[error("already showing results for \"{text}\"")]
    UnchangedFilter { text: String },

    #[error(
        "invalid page size {value}, expected one of {}",
        crate::utils::page_sizes_csv()
    )]
    PageSize { value: usize },

    #[error("column '{key}' is not sortable")]
    NotSortable { key: String },

    #[error("unknown column '{key}'")]
    UnknownColumn { key: String },
}

/// User-editable query parameters plus the last known total row count.
///
/// Every transition returns a new state; sort, filter and page size changes
/// always land on the first page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryState {
    page_index: usize,
    page_size: usize,
    sort: Option<SortSpec>,
    filter_text: String,
    total_count: u64,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
            sort: Some(SortSpec::new(DEFAULT_SORT_COLUMN, SortDirection::Desc)),
            filter_text: String::new(),
            total_count: 0,
        }
    }
}

pub fn validate_page_size(value: usize) -> Result<usize, ValidationError> {
    if PAGE_SIZES.contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::PageSize { value })
    }
}

impl QueryState {
    pub fn new(page_size: usize, sort: Option<SortSpec>) -> Result<Self, ValidationError> {
        Ok(Self {
            page_index: 0,
            page_size: validate_page_size(page_size)?,
            sort,
            filter_text: String::new(),
            total_count: 0,
        })
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn key(&self) -> QueryKey {
        QueryKey {
            page_index: self.page_index,
            page_size: self.page_size,
            sort: self.sort.clone(),
            filter_text: self.filter_text.clone(),
        }
    }

    pub fn with_page(&self, page_index: usize) -> Self {
        Self {
            page_index,
            ..self.clone()
        }
    }

    pub fn with_page_size(&self, page_size: usize) -> Result<Self, ValidationError> {
        Ok(Self {
            page_index: 0,
            page_size: validate_page_size(page_size)?,
            ..self.clone()
        })
    }

    pub fn with_sort(&self, column_key: &str, direction: SortDirection) -> Self {
        Self {
            page_index: 0,
            sort: Some(SortSpec::new(column_key, direction)),
            ..self.clone()
        }
    }

    pub fn without_sort(&self) -> Self {
        Self {
            page_index: 0,
            sort: None,
            ..self.clone()
        }
    }

    /// Header click: unsorted -> first direction -> reversed -> unsorted.
    /// Columns that are always sorted flip between the two directions instead
    /// of clearing.
    pub fn with_sort_toggled(&self, column: &ColumnDescriptor) -> Result<Self, ValidationError> {
        if !column.sortable {
            return Err(ValidationError::NotSortable {
                key: column.key.to_string(),
            });
        }
        let first = column.first_direction();
        let current = self
            .sort
            .as_ref()
            .filter(|s| s.column_key == column.key)
            .map(|s| s.direction);
        let next = match current {
            None => Some(first),
            Some(direction) if direction == first => Some(first.reversed()),
            Some(_) if column.always_sorted => Some(first),
            Some(_) => None,
        };
        Ok(match next {
            Some(direction) => self.with_sort(column.key, direction),
            None => self.without_sort(),
        })
    }

    pub fn with_filter(&self, text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyFilter);
        }
        if text == self.filter_text {
            return Err(ValidationError::UnchangedFilter {
                text: text.to_string(),
            });
        }
        Ok(Self {
            page_index: 0,
            filter_text: text.to_string(),
            ..self.clone()
        })
    }

    pub fn without_filter(&self) -> Result<Self, ValidationError> {
        if self.filter_text.is_empty() {
            return Err(ValidationError::UnchangedFilter {
                text: String::new(),
            });
        }
        Ok(Self {
            page_index: 0,
            filter_text: String::new(),
            ..self.clone()
        })
    }

    pub(crate) fn with_total_count(&self, total_count: u64) -> Self {
        Self {
            total_count,
            ..self.clone()
        }
    }
}

/// Owns the current [`QueryState`] for one mounted table.
#[derive(Clone, Debug, Default)]
pub struct QueryStore {
    state: QueryState,
}

impl QueryStore {
    pub fn new(initial: QueryState) -> Self {
        Self { state: initial }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn set_page(&mut self, page_index: usize) -> &QueryState {
        let next = self.state.with_page(page_index);
        self.commit("set_page", next)
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<&QueryState, ValidationError> {
        let next = self.state.with_page_size(page_size)?;
        Ok(self.commit("set_page_size", next))
    }

    pub fn set_sort(&mut self, column_key: &str, direction: SortDirection) -> &QueryState {
        let next = self.state.with_sort(column_key, direction);
        self.commit("set_sort", next)
    }

    pub fn clear_sort(&mut self) -> &QueryState {
        let next = self.state.without_sort();
        self.commit("clear_sort", next)
    }

    pub fn toggle_sort(&mut self, column: &ColumnDescriptor) -> Result<&QueryState, ValidationError> {
        let next = self.state.with_sort_toggled(column)?;
        Ok(self.commit("toggle_sort", next))
    }

    pub fn set_filter(&mut self, text: &str) -> Result<&QueryState, ValidationError> {
        let next = self.state.with_filter(text)?;
        Ok(self.commit("set_filter", next))
    }

    pub fn clear_filter(&mut self) -> Result<&QueryState, ValidationError> {
        let next = self.state.without_filter()?;
        Ok(self.commit("clear_filter", next))
    }

    pub(crate) fn set_total_count(&mut self, total_count: u64) -> &QueryState {
        let next = self.state.with_total_count(total_count);
        self.commit("set_total_count", next)
    }

    fn commit(&mut self, transition: &'static str, next: QueryState) -> &QueryState {
        debug!(
            transition,
            key = %next.key(),
            total = next.total_count,
            "query state updated"
        );
        self.state = next;
        &self.state
    }
}
