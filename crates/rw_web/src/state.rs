use rw_core::ArticleStorage;
use std::sync::Arc;

pub struct AppState {
    pub storage: Arc<dyn ArticleStorage>,
}

impl AppState {
    pub fn new(storage: Arc<dyn ArticleStorage>) -> Self {
        Self { storage }
    }
}
