//! JSON rendition of the dashboard for scripted clients.

use axum::{
    Json,
    extract::{RawQuery, State},
};
use serde::Serialize;

use crate::{
    application::{dashboard::DashboardState, pagination::PageWindow},
    domain::posts::Post,
};

use super::public::HttpState;

#[derive(Debug, Serialize)]
pub struct FilterSummary {
    pub tags: Vec<String>,
    pub search: String,
}

#[derive(Debug, Serialize)]
pub struct PostsPageResponse {
    pub location: String,
    pub filter: FilterSummary,
    pub page: PageWindow,
    pub fetched: usize,
    pub posts: Vec<Post>,
}

impl From<DashboardState> for PostsPageResponse {
    fn from(state: DashboardState) -> Self {
        Self {
            filter: FilterSummary {
                tags: state.filter.tags().to_vec(),
                search: state.filter.search().to_string(),
            },
            location: state.location,
            page: state.window,
            fetched: state.fetched,
            posts: state.rows,
        }
    }
}

/// Same semantics as loading the dashboard page: refetch, then filter and paginate.
/// Scripted clients hold no view, so nothing is kept between calls.
pub async fn list_posts(
    State(state): State<HttpState>,
    RawQuery(query): RawQuery,
) -> Json<PostsPageResponse> {
    let location = query.unwrap_or_default();
    let dashboard = state.dashboard.snapshot_once(&location).await;
    Json(PostsPageResponse::from(dashboard))
}
