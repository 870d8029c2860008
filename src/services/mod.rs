pub mod notification;
pub mod record_sink;
pub mod submission_service;
