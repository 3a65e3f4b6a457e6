//! The posts dashboard: every open view owns its fetched snapshot and derives what
//! its table shows from it.
//!
//! A page load mounts a view and fetches the full list from the remote source,
//! forwarding the location query verbatim. Filter and page changes never
//! refetch; they only recompute the visible set from that view's snapshot and
//! re-serialize the location.

use std::{
    num::NonZeroUsize,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};

use lru::LruCache;
use metrics::{counter, histogram};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    application::{
        pagination::PageWindow,
        query_state::{self, FilterState},
        repos::PostSource,
    },
    domain::posts::{self, Post},
};

pub const METRIC_FETCH_TOTAL: &str = "postboard_upstream_fetch_total";
pub const METRIC_FETCH_FAILED_TOTAL: &str = "postboard_upstream_fetch_failed_total";
pub const METRIC_FETCH_STALE_TOTAL: &str = "postboard_upstream_fetch_stale_total";
pub const METRIC_FETCH_MS: &str = "postboard_upstream_fetch_ms";

/// Tag choices offered by default in the tag picker.
pub const DEFAULT_TAG_OPTIONS: [&str; 10] = [
    "history", "american", "crime", "french", "fiction", "english", "magical", "love", "classic",
    "mystery",
];

/// Identifies one mounted dashboard view (one page load).
pub type ViewId = Uuid;

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub page_size: NonZeroUsize,
    pub tag_options: Vec<String>,
    pub view_capacity: NonZeroUsize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            page_size: NonZeroUsize::new(10).unwrap_or(NonZeroUsize::MIN),
            tag_options: DEFAULT_TAG_OPTIONS.iter().map(|tag| tag.to_string()).collect(),
            view_capacity: NonZeroUsize::new(1024).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// Result of a refetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The view's snapshot was replaced with `count` posts.
    Updated { count: usize },
    /// A newer fetch for the same view already landed; this response was discarded.
    Stale,
    /// The fetch failed and the view keeps its previous snapshot.
    Failed,
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    generation: u64,
    posts: Arc<[Post]>,
}

/// A user-driven filter or page change coming from the panel.
#[derive(Debug, Clone, Default)]
pub struct PanelChange {
    /// Query string the browser currently shows.
    pub location: String,
    pub tags: Vec<String>,
    pub search: String,
    pub page: Option<usize>,
}

/// Everything the dashboard renders for one location.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub view: ViewId,
    pub location: String,
    pub filter: FilterState,
    pub window: PageWindow,
    pub fetched: usize,
    pub rows: Vec<Post>,
    pub tag_options: Vec<String>,
}

impl DashboardState {
    /// Options shown in the tag picker: configured tags followed by any selected extras.
    pub fn picker_tags(&self) -> Vec<String> {
        let mut tags = self.tag_options.clone();
        for tag in self.filter.tags() {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        tags
    }
}

pub struct DashboardService {
    source: Arc<dyn PostSource>,
    views: Mutex<LruCache<ViewId, Snapshot>>,
    generations: AtomicU64,
    options: DashboardOptions,
}

impl DashboardService {
    pub fn new(source: Arc<dyn PostSource>, options: DashboardOptions) -> Self {
        Self {
            source,
            views: Mutex::new(LruCache::new(options.view_capacity)),
            generations: AtomicU64::new(0),
            options,
        }
    }

    /// Identifier for a newly mounted view.
    pub fn open_view(&self) -> ViewId {
        Uuid::new_v4()
    }

    /// Posts currently held by `view`; empty for a view that never fetched.
    pub async fn posts(&self, view: ViewId) -> Arc<[Post]> {
        self.views
            .lock()
            .await
            .get(&view)
            .map(|snapshot| snapshot.posts.clone())
            .unwrap_or_default()
    }

    /// Refetch the full list for `view`, forwarding `query` verbatim.
    ///
    /// Failures are logged and swallowed; the view keeps what it had. A response
    /// only replaces the view's snapshot when no later fetch for it has landed first.
    pub async fn refresh(&self, view: ViewId, query: &str) -> RefreshOutcome {
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let forwarded = query_state::forwarded_query(query);

        let Some(posts) = self.fetch(forwarded, Some(view)).await else {
            let mut views = self.views.lock().await;
            if !views.contains(&view) {
                views.put(view, Snapshot::default());
            }
            return RefreshOutcome::Failed;
        };

        let mut views = self.views.lock().await;
        let current = views.peek(&view).map_or(0, |snapshot| snapshot.generation);
        if current > generation {
            counter!(METRIC_FETCH_STALE_TOTAL).increment(1);
            debug!(
                target = "postboard::dashboard",
                %view,
                generation,
                current,
                "discarding stale fetch result"
            );
            return RefreshOutcome::Stale;
        }

        let count = posts.len();
        views.put(
            view,
            Snapshot {
                generation,
                posts: posts.into(),
            },
        );
        info!(
            target = "postboard::dashboard",
            %view,
            generation,
            count,
            "post list refreshed"
        );
        RefreshOutcome::Updated { count }
    }

    /// Navigation: refetch into `view`, then derive its state for `location`.
    pub async fn navigate(&self, view: ViewId, location: &str) -> DashboardState {
        self.refresh(view, location).await;
        self.view(view, location).await
    }

    /// One-off navigation that is not kept as a view, for scripted clients.
    ///
    /// A failed fetch yields an empty list, the state of a view that never loaded.
    pub async fn snapshot_once(&self, location: &str) -> DashboardState {
        let location = query_state::forwarded_query(location).to_string();
        let posts: Arc<[Post]> = self
            .fetch(&location, None)
            .await
            .map(Arc::from)
            .unwrap_or_default();
        let filter = FilterState::from_query(&location);
        let page = query_state::page_from_query(&location);
        self.derive(self.open_view(), &posts, location, filter, page)
    }

    /// Derive the state of `view` for `location` from its current snapshot.
    pub async fn view(&self, view: ViewId, location: &str) -> DashboardState {
        let location = query_state::forwarded_query(location).to_string();
        let posts = self.posts(view).await;
        let filter = FilterState::from_query(&location);
        let page = query_state::page_from_query(&location);
        self.derive(view, &posts, location, filter, page)
    }

    /// Apply a panel change to `view` and return its state with the rewritten location.
    ///
    /// A changed filter resets the table to its first page. A view this service
    /// no longer holds (evicted, or issued before a restart) is mounted again by
    /// fetching its current location.
    pub async fn apply_change(&self, view: ViewId, change: PanelChange) -> DashboardState {
        let location = query_state::forwarded_query(&change.location).to_string();
        if !self.views.lock().await.contains(&view) {
            debug!(
                target = "postboard::dashboard",
                %view,
                "panel change for unknown view; mounting it again"
            );
            self.refresh(view, &location).await;
        }

        let current = FilterState::from_query(&location);
        let next = FilterState::new(&change.tags, change.search);

        let page = if next == current {
            change
                .page
                .unwrap_or_else(|| query_state::page_from_query(&location))
        } else {
            1
        };

        let location = next.apply_to_query(&location);
        let posts = self.posts(view).await;
        self.derive(view, &posts, location, next, page)
    }

    async fn fetch(&self, query: &str, view: Option<ViewId>) -> Option<Vec<Post>> {
        let started_at = Instant::now();
        counter!(METRIC_FETCH_TOTAL).increment(1);
        let result = self.source.fetch_posts(query).await;
        histogram!(METRIC_FETCH_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok(posts) => Some(posts),
            Err(err) => {
                counter!(METRIC_FETCH_FAILED_TOTAL, "kind" => err.kind()).increment(1);
                warn!(
                    target = "postboard::dashboard",
                    error = %err,
                    view = ?view,
                    query,
                    "error fetching posts; keeping previous list"
                );
                None
            }
        }
    }

    fn derive(
        &self,
        view: ViewId,
        posts: &[Post],
        location: String,
        filter: FilterState,
        page: usize,
    ) -> DashboardState {
        let visible = posts::collect(posts, filter.as_filter());
        let window = PageWindow::new(visible.len(), page, self.options.page_size);
        let rows = window.slice(&visible).iter().map(|post| (*post).clone()).collect();
        let location = query_state::apply_page(&location, window.page);

        DashboardState {
            view,
            location,
            filter,
            window,
            fetched: posts.len(),
            rows,
            tag_options: self.options.tag_options.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, sync::Mutex as StdMutex};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::application::repos::SourceError;

    fn post(id: u64, body: &str, tags: &[&str]) -> Post {
        Post {
            id,
            title: format!("Post {id}"),
            body: body.to_string(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    #[derive(Default)]
    struct ScriptedSource {
        responses: StdMutex<VecDeque<Result<Vec<Post>, SourceError>>>,
        queries: StdMutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn push(&self, response: Result<Vec<Post>, SourceError>) {
            self.responses.lock().expect("lock").push_back(response);
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl PostSource for ScriptedSource {
        async fn fetch_posts(&self, query: &str) -> Result<Vec<Post>, SourceError> {
            self.queries.lock().expect("lock").push(query.to_string());
            self.responses
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn service(source: Arc<ScriptedSource>, page_size: usize) -> DashboardService {
        DashboardService::new(
            source,
            DashboardOptions {
                page_size: NonZeroUsize::new(page_size).expect("non-zero"),
                ..DashboardOptions::default()
            },
        )
    }

    #[tokio::test]
    async fn navigation_forwards_query_verbatim() {
        let source = Arc::new(ScriptedSource::default());
        let dashboard = service(source.clone(), 10);

        dashboard
            .navigate(dashboard.open_view(), "?limit=5&tags=a%2Cb")
            .await;

        assert_eq!(source.queries(), vec!["limit=5&tags=a%2Cb".to_string()]);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_list() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(vec![post(1, "alpha", &["love"])]));
        source.push(Err(SourceError::Status {
            url: "https://remote/posts".into(),
            status: 503,
        }));
        let dashboard = service(source, 10);
        let view = dashboard.open_view();

        assert_eq!(
            dashboard.refresh(view, "").await,
            RefreshOutcome::Updated { count: 1 }
        );
        let state = dashboard.navigate(view, "").await;

        assert_eq!(state.fetched, 1);
        assert_eq!(state.rows[0].id, 1);
    }

    #[tokio::test]
    async fn views_keep_their_own_fetched_posts() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok((1..=5).map(|id| post(id, "body", &["love"])).collect()));
        source.push(Ok(vec![post(1, "body", &["love"])]));
        let dashboard = service(source, 10);
        let first = dashboard.open_view();
        let second = dashboard.open_view();

        assert_eq!(dashboard.navigate(first, "").await.fetched, 5);
        assert_eq!(dashboard.navigate(second, "limit=1").await.fetched, 1);

        let state = dashboard
            .apply_change(
                first,
                PanelChange {
                    location: String::new(),
                    tags: vec!["love".into()],
                    ..PanelChange::default()
                },
            )
            .await;

        assert_eq!(state.view, first);
        assert_eq!(state.fetched, 5);
        assert_eq!(state.window.total, 5);
        assert_eq!(dashboard.posts(second).await.len(), 1);
    }

    #[tokio::test]
    async fn least_recently_used_views_are_evicted() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(vec![post(1, "one", &[])]));
        source.push(Ok(vec![post(2, "two", &[])]));
        let dashboard = DashboardService::new(
            source,
            DashboardOptions {
                view_capacity: NonZeroUsize::new(1).expect("non-zero"),
                ..DashboardOptions::default()
            },
        );
        let first = dashboard.open_view();
        let second = dashboard.open_view();

        dashboard.refresh(first, "").await;
        dashboard.refresh(second, "").await;

        assert!(dashboard.posts(first).await.is_empty());
        assert_eq!(dashboard.posts(second).await[0].id, 2);
    }

    #[tokio::test]
    async fn unknown_view_is_mounted_from_its_location() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(vec![
            post(1, "the history of it", &["history"]),
            post(2, "a love story", &["love"]),
        ]));
        let dashboard = service(source.clone(), 10);

        let state = dashboard
            .apply_change(
                dashboard.open_view(),
                PanelChange {
                    location: "limit=2".into(),
                    tags: vec!["love".into()],
                    ..PanelChange::default()
                },
            )
            .await;

        assert_eq!(source.queries(), vec!["limit=2".to_string()]);
        assert_eq!(state.rows.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(state.location, "limit=2&tags=love");
    }

    #[tokio::test]
    async fn one_off_snapshot_is_not_kept() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(vec![post(1, "alpha", &[])]));
        let dashboard = service(source, 10);

        let state = dashboard.snapshot_once("limit=1").await;

        assert_eq!(state.fetched, 1);
        assert!(dashboard.posts(state.view).await.is_empty());
    }

    #[tokio::test]
    async fn view_reads_filter_from_location_without_refetch() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(vec![
            post(1, "the history of it", &["history"]),
            post(2, "a love story", &["love"]),
        ]));
        let dashboard = service(source.clone(), 10);
        let view = dashboard.open_view();
        dashboard.refresh(view, "").await;

        let state = dashboard.view(view, "tags=history").await;

        assert_eq!(state.rows.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(state.filter.tags(), ["history".to_string()]);
        assert_eq!(source.queries().len(), 1);
    }

    #[tokio::test]
    async fn changing_filter_rewrites_location_and_resets_page() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok((1..=25).map(|id| post(id, "body", &["love"])).collect()));
        let dashboard = service(source, 10);
        let view = dashboard.open_view();
        dashboard.refresh(view, "").await;

        let state = dashboard
            .apply_change(
                view,
                PanelChange {
                    location: "limit=30&page=3".into(),
                    tags: vec!["love".into()],
                    search: String::new(),
                    page: Some(3),
                },
            )
            .await;

        assert_eq!(state.window.page, 1);
        assert_eq!(state.location, "limit=30&tags=love");
        assert_eq!(state.rows.len(), 10);
    }

    #[tokio::test]
    async fn page_change_keeps_filter_and_clamps() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok((1..=25).map(|id| post(id, "body", &["love"])).collect()));
        let dashboard = service(source, 10);
        let view = dashboard.open_view();
        dashboard.refresh(view, "").await;

        let state = dashboard
            .apply_change(
                view,
                PanelChange {
                    location: "tags=love".into(),
                    tags: vec!["love".into()],
                    search: String::new(),
                    page: Some(7),
                },
            )
            .await;

        assert_eq!(state.window.page, 3);
        assert_eq!(state.location, "tags=love&page=3");
        assert_eq!(state.rows.first().map(|p| p.id), Some(21));
    }

    #[tokio::test]
    async fn picker_lists_selected_tags_missing_from_options() {
        let source = Arc::new(ScriptedSource::default());
        let dashboard = service(source, 10);

        let state = dashboard
            .view(dashboard.open_view(), "tags=history,sci-fi")
            .await;
        let picker = state.picker_tags();

        assert_eq!(picker.len(), DEFAULT_TAG_OPTIONS.len() + 1);
        assert_eq!(picker.last().map(String::as_str), Some("sci-fi"));
    }

    struct GatedSource {
        first_gate: Notify,
        calls: AtomicU64,
    }

    #[async_trait]
    impl PostSource for GatedSource {
        async fn fetch_posts(&self, _query: &str) -> Result<Vec<Post>, SourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                self.first_gate.notified().await;
                Ok(vec![post(1, "stale", &[])])
            } else {
                Ok(vec![post(2, "fresh", &[])])
            }
        }
    }

    #[tokio::test]
    async fn stale_response_does_not_overwrite_newer_data() {
        let source = Arc::new(GatedSource {
            first_gate: Notify::new(),
            calls: AtomicU64::new(0),
        });
        let dashboard = Arc::new(DashboardService::new(
            source.clone(),
            DashboardOptions::default(),
        ));
        let view = dashboard.open_view();

        let slow = {
            let dashboard = dashboard.clone();
            tokio::spawn(async move { dashboard.refresh(view, "first").await })
        };
        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            dashboard.refresh(view, "second").await,
            RefreshOutcome::Updated { count: 1 }
        );
        source.first_gate.notify_one();
        let outcome = slow.await.expect("task joins");

        assert_eq!(outcome, RefreshOutcome::Stale);
        assert_eq!(dashboard.posts(view).await[0].id, 2);
    }

    #[tokio::test]
    async fn slow_fetch_for_another_view_is_not_stale() {
        let source = Arc::new(GatedSource {
            first_gate: Notify::new(),
            calls: AtomicU64::new(0),
        });
        let dashboard = Arc::new(DashboardService::new(
            source.clone(),
            DashboardOptions::default(),
        ));
        let slow_view = dashboard.open_view();
        let fast_view = dashboard.open_view();

        let slow = {
            let dashboard = dashboard.clone();
            tokio::spawn(async move { dashboard.refresh(slow_view, "").await })
        };
        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        dashboard.refresh(fast_view, "").await;
        source.first_gate.notify_one();

        assert_eq!(
            slow.await.expect("task joins"),
            RefreshOutcome::Updated { count: 1 }
        );
        assert_eq!(dashboard.posts(slow_view).await[0].id, 1);
        assert_eq!(dashboard.posts(fast_view).await[0].id, 2);
    }
}
