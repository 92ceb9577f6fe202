use super::TimeEntryApi;
use super::dto::{CloseTimeEntry, ErrorBody, NewTimeEntry};
use crate::errors::{AppError, AppResult};
use crate::models::session::Session;
use crate::models::user::User;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// reqwest-backed client for the time-entry REST API.
#[derive(Clone)]
pub struct HttpTimeEntryApi {
    client: Client,
    base_url: String,
}

impl HttpTimeEntryApi {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> AppResult<T> {
        let resp = req.send().await?;
        Self::decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> AppResult<T> {
        let status = resp.status();
        let url = resp.url().to_string();
        if status.is_success() {
            debug!(%url, status = status.as_u16(), "backend call succeeded");
            return Ok(resp.json::<T>().await?);
        }

        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.message)
            .unwrap_or_else(|_| {
                if text.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                } else {
                    text
                }
            });
        warn!(%url, status = status.as_u16(), %message, "backend call failed");
        Err(AppError::Remote {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl TimeEntryApi for HttpTimeEntryApi {
    async fn create_entry(&self, entry: &NewTimeEntry) -> AppResult<Session> {
        self.send(self.client.post(self.url("time-entries")).json(entry))
            .await
    }

    async fn update_entry(&self, id: &str, close: &CloseTimeEntry) -> AppResult<Session> {
        let path = format!("time-entries/{}", id);
        self.send(self.client.put(self.url(&path)).json(close)).await
    }

    async fn list_entries(&self, user_id: Option<&str>) -> AppResult<Vec<Session>> {
        let mut req = self.client.get(self.url("time-entries"));
        if let Some(uid) = user_id {
            req = req.query(&[("userId", uid)]);
        }
        self.send(req).await
    }

    async fn fetch_user(&self, id: &str) -> AppResult<User> {
        let path = format!("users/{}", id);
        self.send(self.client.get(self.url(&path))).await
    }
}
