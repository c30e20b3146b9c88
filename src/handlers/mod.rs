//! HTTP handlers. Thin: extract, call the service, wrap in the success
//! envelope. All domain decisions live in the service layer.

pub mod admins;
pub mod comments;
pub mod courses;
pub mod payments;
pub mod schools;
pub mod students;
