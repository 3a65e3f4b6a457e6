use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{Query, RawQuery, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use datastar::prelude::ElementPatchMode;
use serde::Deserialize;

use crate::{
    application::{
        dashboard::{DashboardService, DashboardState, PanelChange, ViewId},
        error::HttpError,
        query_state::{SEARCH_PARAM, TAGS_PARAM},
        stream::StreamBuilder,
    },
    infra::assets,
    presentation::views::{
        DashboardTemplate, POSTS_PANEL_ID, PostsPanelTemplate, PostsPanelView, render_template,
        render_template_response,
    },
};

use super::{
    DATASTAR_REQUEST_HEADER, api,
    middleware::{log_responses, set_request_context},
};

const PAGE_TITLE: &str = "Posts";
const DASHBOARD_PATH: &str = "/";

#[derive(Clone)]
pub struct HttpState {
    pub dashboard: Arc<DashboardService>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route(DASHBOARD_PATH, get(index))
        .route("/ui/posts", post(posts_panel))
        .route("/api/posts", get(api::list_posts))
        .route("/static/{*path}", get(assets::serve_static))
        .route("/_health", get(health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

/// Navigation: every full page load refetches with the query forwarded verbatim.
async fn index(State(state): State<HttpState>, RawQuery(query): RawQuery) -> Response {
    let location = query.unwrap_or_default();
    let view = state.dashboard.open_view();
    let dashboard = state.dashboard.navigate(view, &location).await;
    let template = DashboardTemplate {
        title: PAGE_TITLE.to_string(),
        panel: PostsPanelView::from(&dashboard),
    };
    render_template_response(template, StatusCode::OK)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PanelQuery {
    view: Option<ViewId>,
    location: Option<String>,
    page: Option<usize>,
}

/// Filter or page change. Never refetches; answers datastar requests with a
/// panel patch plus an in-place URL rewrite.
async fn posts_panel(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Query(query): Query<PanelQuery>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Response, HttpError> {
    let view = query.view.unwrap_or_else(|| state.dashboard.open_view());
    let change = panel_change(query, fields);
    let dashboard = state.dashboard.apply_change(view, change).await;

    if headers.contains_key(DATASTAR_REQUEST_HEADER) {
        return build_panel_stream(&dashboard);
    }

    Ok(render_template_response(
        PostsPanelTemplate {
            panel: PostsPanelView::from(&dashboard),
        },
        StatusCode::OK,
    ))
}

fn panel_change(query: PanelQuery, fields: Vec<(String, String)>) -> PanelChange {
    let mut change = PanelChange {
        location: query.location.unwrap_or_default(),
        page: query.page,
        ..PanelChange::default()
    };

    for (name, value) in fields {
        if name == TAGS_PARAM {
            change.tags.push(value);
        } else if name == SEARCH_PARAM {
            change.search = value;
        }
    }

    change
}

fn build_panel_stream(dashboard: &DashboardState) -> Result<Response, HttpError> {
    let html = render_template(PostsPanelTemplate {
        panel: PostsPanelView::from(dashboard),
    })?;

    let mut stream = StreamBuilder::new();
    stream.push_patch(
        html.0,
        &format!("#{POSTS_PANEL_ID}"),
        ElementPatchMode::Replace,
    );
    stream.push_replace_location(DASHBOARD_PATH, &dashboard.location);
    Ok(stream.into_response())
}

async fn health() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
