pub mod get_model;
pub mod list_models;
pub mod notification;
pub mod router;
pub mod submit_job;
pub mod websocket;
