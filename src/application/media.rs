use std::sync::Arc;

use crate::application::repos::{MediaRepo, RepoError};
use crate::domain::entities::MediaRecord;

#[derive(Clone)]
pub struct MediaService {
    repo: Arc<dyn MediaRepo>,
}

impl MediaService {
    pub fn new(repo: Arc<dyn MediaRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<MediaRecord>, RepoError> {
        self.repo.list_media().await
    }
}
