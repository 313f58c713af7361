use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{flexible_timestamp, ListResponse};
use crate::http::{ApiClient, ApiError};

const PATH: &str = "/api/notifications";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(alias = "Id", alias = "notificationId", alias = "NotificationId")]
    pub id: i64,

    #[serde(alias = "Message", alias = "content", alias = "Content")]
    pub message: String,

    #[serde(default, alias = "Title")]
    pub title: Option<String>,

    #[serde(default, alias = "IsRead", alias = "is_read", alias = "read", alias = "Read")]
    pub is_read: bool,

    #[serde(default, alias = "CreatedAt", alias = "created_at", deserialize_with = "flexible_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NotificationService {
    client: ApiClient,
}

impl NotificationService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Notification>, ApiError> {
        let list: ListResponse<Notification> = self.client.get_json(PATH).await?;
        Ok(list.into_vec())
    }

    pub async fn unread_count(&self) -> Result<usize, ApiError> {
        Ok(self.list().await?.iter().filter(|n| !n.is_read).count())
    }

    pub async fn mark_read(&self, id: i64) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self
            .client
            .put_json(&format!("{PATH}/{id}/read"), &serde_json::json!({}))
            .await?;
        Ok(())
    }
}
