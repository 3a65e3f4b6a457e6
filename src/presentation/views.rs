use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::application::{dashboard::DashboardState, error::HttpError};

/// Element id the datastar panel patches target.
pub const POSTS_PANEL_ID: &str = "posts-panel";

const PANEL_ENDPOINT: &str = "/ui/posts";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Clone, Debug)]
pub struct TagOptionView {
    pub name: String,
    pub selected: bool,
}

#[derive(Clone, Debug)]
pub struct PostRowView {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub tags: String,
}

#[derive(Clone, Debug)]
pub struct PageLinkView {
    pub number: usize,
    pub current: bool,
}

#[derive(Clone, Debug)]
pub struct PagerView {
    pub page: usize,
    pub page_count: usize,
    pub previous: Option<usize>,
    pub next: Option<usize>,
    pub pages: Vec<PageLinkView>,
}

/// Everything the posts panel needs: filters, table rows, and pager.
#[derive(Clone, Debug)]
pub struct PostsPanelView {
    pub panel_id: &'static str,
    /// Panel change endpoint bound to this view; further parameters are appended with `&`.
    pub change_url: String,
    pub tag_options: Vec<TagOptionView>,
    pub search: String,
    pub rows: Vec<PostRowView>,
    pub pager: PagerView,
    pub visible_total: usize,
    pub fetched_total: usize,
}

impl PostsPanelView {
    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn has_multiple_pages(&self) -> bool {
        self.pager.page_count > 1
    }
}

impl From<&DashboardState> for PostsPanelView {
    fn from(state: &DashboardState) -> Self {
        let tag_options = state
            .picker_tags()
            .into_iter()
            .map(|name| TagOptionView {
                selected: state.filter.is_selected(&name),
                name,
            })
            .collect();

        let rows = state
            .rows
            .iter()
            .map(|post| PostRowView {
                id: post.id,
                title: post.title.clone(),
                body: post.body.clone(),
                tags: post.tags_label(),
            })
            .collect();

        let window = state.window;
        let pager = PagerView {
            page: window.page,
            page_count: window.page_count,
            previous: window.previous(),
            next: window.next(),
            pages: window
                .pages()
                .map(|number| PageLinkView {
                    number,
                    current: number == window.page,
                })
                .collect(),
        };

        Self {
            panel_id: POSTS_PANEL_ID,
            change_url: format!("{PANEL_ENDPOINT}?view={}", state.view),
            tag_options,
            search: state.filter.search().to_string(),
            rows,
            pager,
            visible_total: window.total,
            fetched_total: state.fetched,
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub title: String,
    pub panel: PostsPanelView,
}

#[derive(Template)]
#[template(path = "posts_panel.html")]
pub struct PostsPanelTemplate {
    pub panel: PostsPanelView,
}
