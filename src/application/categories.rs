use std::sync::Arc;

use crate::application::repos::{CategoriesRepo, RepoError};
use crate::domain::entities::CategoryRecord;

#[derive(Clone)]
pub struct CategoryService {
    repo: Arc<dyn CategoriesRepo>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoriesRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        self.repo.list_categories().await
    }
}
