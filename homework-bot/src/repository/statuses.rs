//! Homework statuses repository
//!
//! Fetches the raw status document from the grading API.

use async_trait::async_trait;
use homework_client::{ClientError, PracticumClient};
use serde_json::Value;

/// Repository trait for reading homework statuses
#[async_trait]
pub trait StatusRepository: Send + Sync {
    /// Fetches statuses changed since `from_date`
    ///
    /// # Arguments
    /// * `from_date` - Unix timestamp (seconds), lower bound of the window
    async fn fetch_statuses(&self, from_date: i64) -> Result<Value, ClientError>;
}

/// HTTP implementation of StatusRepository
pub struct HttpStatusRepository {
    client: PracticumClient,
}

impl HttpStatusRepository {
    pub fn new(client: PracticumClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusRepository for HttpStatusRepository {
    async fn fetch_statuses(&self, from_date: i64) -> Result<Value, ClientError> {
        self.client.homework_statuses(from_date).await
    }
}
