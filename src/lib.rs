//! A posts dashboard: fetches a remote post list, filters it by tag and search
//! text kept in the URL, and renders it as a paginated table.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
