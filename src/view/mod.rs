use serde::Serialize;
use thiserror::Error;

use crate::columns::ColumnDescriptor;
use crate::fetch::FetchResult;
use crate::query::{QueryState, SortDirection};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum DisplayMode {
    Idle,
    Loading,
    Success,
    Error(String),
}

impl DisplayMode {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortIndicator {
    None,
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("page {page} is out of range, there are {page_count} pages")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("already on the first page")]
    NoPreviousPage,
}

pub fn page_count(total_count: u64, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(page_size as u64) as usize
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total_count: u64,
    pub can_previous: bool,
    pub can_next: bool,
}

impl Pagination {
    pub fn derive(state: &QueryState) -> Self {
        let page_index = state.page_index();
        let page_count = page_count(state.total_count(), state.page_size());
        Self {
            page_index,
            page_size: state.page_size(),
            page_count,
            total_count: state.total_count(),
            can_previous: page_index > 0,
            can_next: page_index < page_count.saturating_sub(1),
        }
    }

    /// The store accepts any page; bounds against the known page count are
    /// enforced here. Page 0 is always reachable.
    pub fn check_page(&self, page: usize) -> Result<usize, ViewError> {
        if page == 0 || page < self.page_count {
            Ok(page)
        } else {
            Err(ViewError::PageOutOfRange {
                page,
                page_count: self.page_count,
            })
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnHeader {
    pub key: &'static str,
    pub label: &'static str,
    pub sortable: bool,
    pub indicator: SortIndicator,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewRow {
    pub key: String,
    pub cells: Vec<String>,
}

/// Everything a front end needs to draw one frame of the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub mode: DisplayMode,
    pub headers: Vec<ColumnHeader>,
    pub rows: Vec<ViewRow>,
    pub pagination: Pagination,
    pub filter_text: String,
}

impl TableView {
    pub fn derive(
        state: &QueryState,
        published: Option<&FetchResult>,
        columns: &[ColumnDescriptor],
        mode: &DisplayMode,
    ) -> Self {
        let visible: Vec<&ColumnDescriptor> = columns.iter().filter(|c| !c.hidden).collect();

        let headers = visible
            .iter()
            .map(|c| ColumnHeader {
                key: c.key,
                label: c.label,
                sortable: c.sortable,
                indicator: sort_indicator(state, c.key),
            })
            .collect();

        let rows = match (mode, published) {
            (DisplayMode::Success, Some(result)) => result
                .rows
                .iter()
                .enumerate()
                .map(|(position, row)| ViewRow {
                    key: row
                        .id()
                        .unwrap_or_else(|| format!("{}#{position}", state.page_index())),
                    cells: visible.iter().map(|c| c.render(row)).collect(),
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            mode: mode.clone(),
            headers,
            rows,
            pagination: Pagination::derive(state),
            filter_text: state.filter_text().to_string(),
        }
    }
}

pub fn sort_indicator(state: &QueryState, column_key: &str) -> SortIndicator {
    match state.sort() {
        Some(sort) if sort.column_key == column_key => match sort.direction {
            SortDirection::Asc => SortIndicator::Ascending,
            SortDirection::Desc => SortIndicator::Descending,
        },
        _ => SortIndicator::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns;
    use crate::fetch::Row;
    use serde_json::json;

    fn state_with_total(total: u64) -> QueryState {
        QueryState::default().with_total_count(total)
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(47, 10), 5);
        assert_eq!(page_count(100, 25), 4);
        for total in 0..300u64 {
            for size in [10usize, 25, 50, 100] {
                let expected = (total as f64 / size as f64).ceil() as usize;
                assert_eq!(page_count(total, size), expected);
            }
        }
    }

    #[test]
    fn last_page_enables_previous_only() {
        let pagination = Pagination::derive(&state_with_total(47).with_page(4));
        assert_eq!(pagination.page_count, 5);
        assert!(pagination.can_previous);
        assert!(!pagination.can_next);
        assert_eq!(pagination.check_page(4), Ok(4));
        assert_eq!(
            pagination.check_page(5),
            Err(ViewError::PageOutOfRange {
                page: 5,
                page_count: 5
            })
        );
    }

    #[test]
    fn first_page_enables_next_only() {
        let pagination = Pagination::derive(&state_with_total(47));
        assert!(!pagination.can_previous);
        assert!(pagination.can_next);
    }

    #[test]
    fn huge_page_index_does_not_overflow() {
        let pagination = Pagination::derive(&state_with_total(47).with_page(usize::MAX));
        assert!(pagination.can_previous);
        assert!(!pagination.can_next);
        assert!(pagination.check_page(usize::MAX).is_err());
    }

    #[test]
    fn empty_result_allows_only_first_page() {
        let pagination = Pagination::derive(&state_with_total(0));
        assert_eq!(pagination.page_count, 0);
        assert!(!pagination.can_next);
        assert_eq!(pagination.check_page(0), Ok(0));
        assert!(pagination.check_page(1).is_err());
    }

    #[test]
    fn indicators_follow_sort_spec() {
        let state = QueryState::default().with_sort("grade", SortDirection::Asc);
        assert_eq!(sort_indicator(&state, "grade"), SortIndicator::Ascending);
        assert_eq!(sort_indicator(&state, "eviction_count"), SortIndicator::None);
        assert_eq!(
            sort_indicator(&QueryState::default(), "eviction_count"),
            SortIndicator::Descending
        );
    }

    #[test]
    fn rows_only_render_on_success() {
        let columns = columns::landlord_columns();
        let result = FetchResult {
            rows: vec![
                serde_json::from_value::<Row>(json!({"id": 3, "name": "Acme", "grade": "C"}))
                    .unwrap(),
                serde_json::from_value::<Row>(json!({"name": "No Id"})).unwrap(),
            ],
            total_count: 2,
        };
        let state = state_with_total(2);

        let view = TableView::derive(&state, Some(&result), &columns, &DisplayMode::Success);
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].key, "3");
        assert_eq!(view.rows[1].key, "0#1");
        assert_eq!(view.headers.len(), 8);
        assert!(view.headers.iter().all(|h| h.key != "id"));
        assert_eq!(view.rows[0].cells[0], "Acme");
        assert_eq!(view.rows[0].cells.last().map(String::as_str), Some("C"));

        let loading = TableView::derive(&state, Some(&result), &columns, &DisplayMode::Loading);
        assert!(loading.rows.is_empty());
        assert_eq!(loading.pagination.page_count, 1);
    }
}
