//! Posts as delivered by the remote API and the pure filter that selects the visible set.

use serde::{Deserialize, Serialize};

/// A single fetched content record. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Post {
    pub fn has_any_tag<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        self.tags
            .iter()
            .any(|tag| tags.iter().any(|wanted| wanted.as_ref() == tag))
    }

    /// Tags joined the way the table column displays them.
    pub fn tags_label(&self) -> String {
        self.tags.join(", ")
    }
}

/// Response envelope of `GET /posts`. Pagination fields sent alongside are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostList {
    #[serde(default)]
    pub posts: Vec<Post>,
}

/// Borrowed view of the user's filter selection.
#[derive(Debug, Clone, Copy)]
pub struct PostFilter<'a> {
    pub tags: &'a [String],
    pub search: &'a str,
}

impl<'a> PostFilter<'a> {
    pub fn new(tags: &'a [String], search: &'a str) -> Self {
        Self { tags, search }
    }

    pub fn matches(&self, post: &Post, needle: &str) -> bool {
        let tag_ok = self.tags.is_empty() || post.has_any_tag(self.tags);
        tag_ok && post.body.to_lowercase().contains(needle)
    }
}

/// Select the posts passing `filter`, preserving fetch order.
pub fn collect<'p>(posts: &'p [Post], filter: PostFilter<'_>) -> Vec<&'p Post> {
    let needle = filter.search.to_lowercase();
    posts
        .iter()
        .filter(|post| filter.matches(post, &needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: u64, body: &str, tags: &[&str]) -> Post {
        Post {
            id,
            title: format!("Post {id}"),
            body: body.to_string(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    fn sample() -> Vec<Post> {
        vec![
            post(1, "His mother had always taught him", &["history", "american"]),
            post(2, "He was an expert but not in a discipline", &["love", "french"]),
            post(3, "Dave watched as the forest burned up", &["history", "crime"]),
            post(4, "All he wanted was a candy bar", &["magical"]),
        ]
    }

    fn ids(visible: &[&Post]) -> Vec<u64> {
        visible.iter().map(|post| post.id).collect()
    }

    #[test]
    fn empty_filter_shows_everything() {
        let posts = sample();
        let visible = collect(&posts, PostFilter::new(&[], ""));
        assert_eq!(ids(&visible), vec![1, 2, 3, 4]);
    }

    #[test]
    fn tag_selection_keeps_only_intersecting_posts() {
        let posts = vec![post(1, "a", &["history"]), post(2, "b", &["love"])];
        let tags = vec!["history".to_string()];
        let visible = collect(&posts, PostFilter::new(&tags, ""));
        assert_eq!(ids(&visible), vec![1]);
    }

    #[test]
    fn multiple_tags_match_any() {
        let posts = sample();
        let tags = vec!["crime".to_string(), "magical".to_string()];
        let visible = collect(&posts, PostFilter::new(&tags, ""));
        assert_eq!(ids(&visible), vec![3, 4]);
        assert!(visible.iter().all(|post| post.has_any_tag(&tags)));
    }

    #[test]
    fn search_is_case_insensitive_substring_of_body() {
        let posts = sample();
        let visible = collect(&posts, PostFilter::new(&[], "HE WAS"));
        assert_eq!(ids(&visible), vec![2]);
    }

    #[test]
    fn search_does_not_look_at_title() {
        let posts = sample();
        let visible = collect(&posts, PostFilter::new(&[], "Post 1"));
        assert!(visible.is_empty());
    }

    #[test]
    fn empty_search_leaves_tag_filtered_set_unchanged() {
        let posts = sample();
        let tags = vec!["history".to_string()];
        let by_tag = collect(&posts, PostFilter::new(&tags, ""));
        assert_eq!(ids(&by_tag), vec![1, 3]);
    }

    #[test]
    fn tags_and_search_combine_with_and() {
        let posts = sample();
        let tags = vec!["history".to_string()];
        let visible = collect(&posts, PostFilter::new(&tags, "forest"));
        assert_eq!(ids(&visible), vec![3]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let posts = sample();
        let once: Vec<Post> = collect(&posts, PostFilter::new(&[], "he"))
            .into_iter()
            .cloned()
            .collect();
        let twice = collect(&once, PostFilter::new(&[], "he"));
        assert_eq!(ids(&twice), once.iter().map(|post| post.id).collect::<Vec<_>>());
    }

    #[test]
    fn unknown_tag_matches_nothing() {
        let posts = sample();
        let tags = vec!["mystery".to_string()];
        assert!(collect(&posts, PostFilter::new(&tags, "")).is_empty());
    }

    #[test]
    fn post_list_ignores_envelope_extras() {
        let payload = r#"{
            "posts": [{"id": 7, "title": "t", "body": "b", "tags": ["love"], "userId": 3,
                       "reactions": {"likes": 1, "dislikes": 0}, "views": 10}],
            "total": 251, "skip": 0, "limit": 30
        }"#;
        let list: PostList = serde_json::from_str(payload).expect("decodes");
        assert_eq!(list.posts.len(), 1);
        assert_eq!(list.posts[0].tags_label(), "love");
    }
}
