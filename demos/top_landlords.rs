//! Drives a table against an in-memory listing whose responses come back out
//! of order, then prints the page that wins.
//!
//! Run with `RUST_LOG=landlordtop=debug cargo run --example top_landlords` to
//! watch stale responses being discarded.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use landlordtop::columns;
use landlordtop::controller::TableController;
use landlordtop::fetch::{Backend, FetchResult, Row, TransportError};
use landlordtop::output;
use landlordtop::query::{QueryKey, QueryState, SortDirection};

const LANDLORDS: u64 = 137;

struct SlowListing;

#[async_trait(?Send)]
impl Backend for SlowListing {
    async fn fetch_page(&self, key: &QueryKey) -> Result<FetchResult, TransportError> {
        // Earlier pages are slower, so newer requests overtake older ones.
        let delay = 40u64.saturating_sub(key.page_index as u64 * 10);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        let start = (key.page_index * key.page_size) as u64;
        let end = (start + key.page_size as u64).min(LANDLORDS);
        let rows = (start..end)
            .filter_map(|i| {
                let grade = ["A", "B", "C", "D", "F"][(i % 5) as usize];
                serde_json::from_value::<Row>(json!({
                    "id": i,
                    "name": format!("Holding Co {i}"),
                    "address": format!("{} Main St", 100 + i),
                    "eviction_count": LANDLORDS - i,
                    "property_count": i % 7 + 1,
                    "grade": grade,
                }))
                .ok()
            })
            .collect();
        Ok(FetchResult {
            rows,
            total_count: LANDLORDS,
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    landlordtop::logging::init(1, false);

    let mut table = TableController::new(
        SlowListing,
        QueryState::default(),
        columns::landlord_columns(),
    );
    table.mount();
    table.settle().await;

    // Rapid clicks: every page request is issued before any answer arrives.
    for _ in 0..3 {
        if let Err(e) = table.next_page() {
            eprintln!("{e}");
        }
    }
    if let Err(e) = table.set_sort("eviction_count", SortDirection::Asc) {
        eprintln!("{e}");
    }
    table.settle().await;

    print!("{}", output::render_text(&table.view(), true));
    table.unmount();
}
