//! Name-keyed registry of bulkheads, one per tier or per batch.

use crate::{Bulkhead, BulkheadConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct Registry {
    bulkheads: Mutex<HashMap<String, Arc<Bulkhead>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_insert_with(
        &self,
        name: &str,
        make_config: impl FnOnce() -> BulkheadConfig,
    ) -> Arc<Bulkhead> {
        let mut bulkheads = self.bulkheads.lock().await;
        if let Some(bulkhead) = bulkheads.get(name) {
            return Arc::clone(bulkhead);
        }
        let bulkhead = Arc::new(Bulkhead::new(make_config()));
        bulkheads.insert(name.to_string(), Arc::clone(&bulkhead));
        bulkhead
    }

    /// Removes the bulkhead for `name`, if any (e.g. when a batch finishes).
    pub async fn remove(&self, name: &str) {
        self.bulkheads.lock().await.remove(name);
    }
}
