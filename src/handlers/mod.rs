pub mod changelog;
pub mod diagnostics;
pub mod doc_export;
pub mod doc_list;
pub mod doc_open;
pub mod doc_save;
pub mod doc_version;
pub mod health;
pub mod history;
pub mod login;
pub mod message;

pub use changelog::*;
pub use diagnostics::*;
pub use doc_export::*;
pub use doc_list::*;
pub use doc_open::*;
pub use doc_save::*;
pub use doc_version::*;
pub use health::*;
pub use history::*;
pub use login::*;
pub use message::*;

use axum::{http::StatusCode, Json};
use crate::models::ErrorResponse;
use crate::services::doc_store_service::StoreError;

/// Map a storage failure to its HTTP reply
pub fn store_error_reply(e: &StoreError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::InvalidName(_) => StatusCode::BAD_REQUEST,
        StoreError::Persistence(_) | StoreError::Degraded { .. } | StoreError::Corrupt(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    ErrorResponse::reply(status, e.to_string())
}
