//! Backend collaborator: the REST time-entry store.

pub mod dto;
pub mod http;

use crate::errors::AppResult;
use crate::models::session::Session;
use crate::models::user::User;
use async_trait::async_trait;
use dto::{CloseTimeEntry, NewTimeEntry};

pub use http::HttpTimeEntryApi;

#[async_trait]
pub trait TimeEntryApi: Send + Sync {
    /// `POST /time-entries`
    async fn create_entry(&self, entry: &NewTimeEntry) -> AppResult<Session>;

    /// `PUT /time-entries/{id}`
    async fn update_entry(&self, id: &str, close: &CloseTimeEntry) -> AppResult<Session>;

    /// `GET /time-entries`, optionally restricted to one user.
    async fn list_entries(&self, user_id: Option<&str>) -> AppResult<Vec<Session>>;

    /// `GET /users/{id}`
    async fn fetch_user(&self, id: &str) -> AppResult<User>;
}
