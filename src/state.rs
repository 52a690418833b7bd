use std::sync::Arc;

use crate::store::{CrmStore, MemoryStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CrmStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn CrmStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}
