pub mod doc_store_service;
pub mod history_service;
pub mod user_service;
