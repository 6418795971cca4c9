use std::sync::atomic::{AtomicU64, Ordering};

use backend_domain::UpsertOutcome;

#[derive(Debug, Default)]
pub struct Metrics {
    upserts_created: AtomicU64,
    upserts_superseded: AtomicU64,
    upserts_ignored: AtomicU64,
    upserts_skipped: AtomicU64,
    upsert_errors: AtomicU64,
    item_queries: AtomicU64,
    rank_queries: AtomicU64,
    query_errors: AtomicU64,
}

impl Metrics {
    pub fn record_upsert(&self, outcome: UpsertOutcome) {
        let counter = match outcome {
            UpsertOutcome::Created => &self.upserts_created,
            UpsertOutcome::Superseded => &self.upserts_superseded,
            UpsertOutcome::Ignored => &self.upserts_ignored,
            UpsertOutcome::Skipped => &self.upserts_skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upsert_error(&self) {
        self.upsert_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_item_query(&self) {
        self.item_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rank_query(&self) {
        self.rank_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_query_error(&self) {
        self.query_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn upsert_errors(&self) -> u64 {
        self.upsert_errors.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let created = self.upserts_created.load(Ordering::Relaxed);
        let superseded = self.upserts_superseded.load(Ordering::Relaxed);
        let ignored = self.upserts_ignored.load(Ordering::Relaxed);
        let skipped = self.upserts_skipped.load(Ordering::Relaxed);
        let upsert_errors = self.upsert_errors.load(Ordering::Relaxed);
        let item_queries = self.item_queries.load(Ordering::Relaxed);
        let rank_queries = self.rank_queries.load(Ordering::Relaxed);
        let query_errors = self.query_errors.load(Ordering::Relaxed);

        format!(
            "# TYPE wearrank_upserts_total counter\n\
wearrank_upserts_total{{outcome=\"created\"}} {}\n\
wearrank_upserts_total{{outcome=\"superseded\"}} {}\n\
wearrank_upserts_total{{outcome=\"ignored\"}} {}\n\
wearrank_upserts_total{{outcome=\"skipped\"}} {}\n\
# TYPE wearrank_upsert_errors_total counter\n\
wearrank_upsert_errors_total {}\n\
# TYPE wearrank_item_queries_total counter\n\
wearrank_item_queries_total {}\n\
# TYPE wearrank_rank_queries_total counter\n\
wearrank_rank_queries_total {}\n\
# TYPE wearrank_query_errors_total counter\n\
wearrank_query_errors_total {}\n",
            created,
            superseded,
            ignored,
            skipped,
            upsert_errors,
            item_queries,
            rank_queries,
            query_errors
        )
    }
}
