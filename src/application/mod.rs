//! Application services: dashboard state, filter/URL synchronization, pagination.

pub mod dashboard;
pub mod error;
pub mod pagination;
pub mod query_state;
pub mod repos;
pub mod stream;
