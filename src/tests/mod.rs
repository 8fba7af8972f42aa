use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::rc::Rc;

use async_trait::async_trait;
use tokio::sync::oneshot;
use futures::FutureExt;
use serde_json::json;

use crate::fetch::{Backend, FetchResult, Row, TransportError};
use crate::query::QueryKey;

type Reply = Result<FetchResult, TransportError>;

#[derive(Default)]
struct Script {
    waiting: HashMap<QueryKey, VecDeque<oneshot::Sender<Reply>>>,
    buffered: HashMap<QueryKey, VecDeque<Reply>>,
    calls: Vec<QueryKey>,
}

/// In-memory backend whose requests stay pending until the test answers them,
/// so arrival order is whatever order the test responds in.
#[derive(Clone, Default)]
pub(crate) struct ScriptedBackend {
    script: Rc<RefCell<Script>>,
}

impl ScriptedBackend {
    pub(crate) fn calls(&self) -> Vec<QueryKey> {
        self.script.borrow().calls.clone()
    }

    pub(crate) fn respond(&self, key: &QueryKey, reply: Reply) {
        let mut script = self.script.borrow_mut();
        match script.waiting.get_mut(key).and_then(|q| q.pop_front()) {
            Some(sender) => {
                let _ = sender.send(reply);
            }
            None => script
                .buffered
                .entry(key.clone())
                .or_default()
                .push_back(reply),
        }
    }

    /// Answers with the slice of a `total`-row listing that `key` selects.
    pub(crate) fn respond_ok(&self, key: &QueryKey, total: u64) {
        let start = (key.page_index * key.page_size) as u64;
        let end = (start + key.page_size as u64).min(total);
        let rows = (start..end)
            .map(|i| {
                serde_json::from_value::<Row>(json!({
                    "id": i,
                    "name": format!("Landlord {i}"),
                    "eviction_count": total - i,
                }))
                .unwrap()
            })
            .collect();
        self.respond(
            key,
            Ok(FetchResult {
                rows,
                total_count: total,
            }),
        );
    }

    pub(crate) fn respond_err(&self, key: &QueryKey, status: u16) {
        self.respond(
            key,
            Err(TransportError::Status {
                url: format!("scripted://{key}"),
                status,
            }),
        );
    }
}

#[async_trait(?Send)]
impl Backend for ScriptedBackend {
    async fn fetch_page(&self, key: &QueryKey) -> Reply {
        let receiver = {
            let mut script = self.script.borrow_mut();
            script.calls.push(key.clone());
            if let Some(reply) = script.buffered.get_mut(key).and_then(|q| q.pop_front()) {
                return reply;
            }
            let (sender, receiver) = oneshot::channel();
            script.waiting.entry(key.clone()).or_default().push_back(sender);
            receiver
        };
        receiver.await.unwrap_or_else(|_| {
            Err(TransportError::Status {
                url: "scripted://dropped".to_string(),
                status: 599,
            })
        })
    }
}

/// Polls once so every queued request reaches the backend, and checks that
/// nothing has resolved yet.
pub(crate) fn assert_pending<F: Future>(future: F) {
    assert!(future.now_or_never().is_none(), "future resolved early");
}

mod table {
    use super::*;
    use crate::columns;
    use crate::controller::{ControllerError, TableController};
    use crate::output;
    use crate::query::{QueryState, SortDirection, ValidationError};
    use crate::view::DisplayMode;

    fn controller(backend: &ScriptedBackend) -> TableController<ScriptedBackend> {
        let state = QueryState::new(10, None).unwrap();
        let mut controller =
            TableController::new(backend.clone(), state, columns::landlord_columns());
        controller.mount();
        controller
    }

    #[tokio::test]
    async fn page_index_resets_on_every_non_page_transition() {
        let backend = ScriptedBackend::default();
        let mut table = controller(&backend);
        backend.respond_ok(&table.state().key(), 500);
        table.settle().await;

        let resets: [fn(&mut TableController<ScriptedBackend>); 6] = [
            |t| t.set_page_size(50).unwrap(),
            |t| t.set_sort("grade", SortDirection::Asc).unwrap(),
            |t| t.toggle_sort("property_count").unwrap(),
            |t| t.set_filter("north").unwrap(),
            |t| t.clear_filter().unwrap(),
            |t| t.clear_sort(),
        ];
        for reset in resets {
            table.set_page(3).unwrap();
            assert_eq!(table.state().page_index(), 3);
            reset(&mut table);
            assert_eq!(table.state().page_index(), 0);
        }
    }

    #[tokio::test]
    async fn repeated_filter_issues_one_request() {
        let backend = ScriptedBackend::default();
        let mut table = controller(&backend);
        let before = table.requests_issued();
        table.set_filter("smith").unwrap();
        assert_eq!(
            table.set_filter("smith"),
            Err(ControllerError::Validation(ValidationError::UnchangedFilter {
                text: "smith".to_string()
            }))
        );
        assert_eq!(table.requests_issued(), before + 1);
    }

    #[tokio::test]
    async fn rendered_page_reflects_sort_and_pagination() {
        let backend = ScriptedBackend::default();
        let mut table = controller(&backend);
        table.set_sort("eviction_count", SortDirection::Desc).unwrap();
        let key = table.state().key();
        assert_pending(table.next_event());
        backend.respond_ok(&key, 47);
        assert_eq!(table.settle().await, &DisplayMode::Success);

        let text = output::render_text(&table.view(), false);
        assert!(text.contains("Eviction Count v"));
        assert!(text.contains("Landlord 0"));
        assert!(text.contains("Page 1 of 5"));
        assert!(text.contains("47 landlords"));
    }
}
