//! Two-way mapping between the dashboard URL query string and its filter state.
//!
//! The filter state is owned by the dashboard; the query string is only its
//! serialization. `tags` carries the comma-joined tag selection and `search`
//! the raw search text. Every other parameter is left untouched so it keeps
//! being forwarded to the remote API.

use url::form_urlencoded;

use crate::domain::posts::PostFilter;

pub const TAGS_PARAM: &str = "tags";
pub const SEARCH_PARAM: &str = "search";
pub const PAGE_PARAM: &str = "page";

const TAG_SEPARATOR: char = ',';

/// User-controlled tag and search-text selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    tags: Vec<String>,
    search: String,
}

impl FilterState {
    pub fn new<I, S>(tags: I, search: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = Self {
            tags: Vec::new(),
            search: search.into(),
        };
        state.set_tags(tags);
        state
    }

    /// Parse the recognized parameters out of a query string (leading `?` allowed).
    ///
    /// Repeated `tags` parameters (as sent by a plain form submit) are merged.
    pub fn from_query(query: &str) -> Self {
        let tags = all_values(query, TAGS_PARAM);
        let search = first_value(query, SEARCH_PARAM).unwrap_or_default();
        Self::new(
            tags.iter().flat_map(|value| value.split(TAG_SEPARATOR)),
            search,
        )
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.search.is_empty()
    }

    pub fn is_selected(&self, tag: &str) -> bool {
        self.tags.iter().any(|selected| selected == tag)
    }

    /// Replace the tag selection. Blank and repeated entries are dropped; order is kept.
    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.clear();
        for tag in tags {
            let tag = tag.as_ref().trim();
            if !tag.is_empty() && !self.is_selected(tag) {
                self.tags.push(tag.to_string());
            }
        }
    }

    pub fn as_filter(&self) -> PostFilter<'_> {
        PostFilter::new(&self.tags, &self.search)
    }

    pub fn tags_param(&self) -> Option<String> {
        if self.tags.is_empty() {
            None
        } else {
            Some(self.tags.join(&TAG_SEPARATOR.to_string()))
        }
    }

    pub fn search_param(&self) -> Option<String> {
        if self.search.is_empty() {
            None
        } else {
            Some(self.search.clone())
        }
    }

    /// Write this state into `query`, keeping every other parameter in place.
    pub fn apply_to_query(&self, query: &str) -> String {
        set_params(
            query,
            &[
                (TAGS_PARAM, self.tags_param()),
                (SEARCH_PARAM, self.search_param()),
            ],
        )
    }

    /// Query string holding only the recognized parameters.
    pub fn to_query(&self) -> String {
        self.apply_to_query("")
    }
}

/// Requested table page; anything missing or unparsable means the first page.
pub fn page_from_query(query: &str) -> usize {
    first_value(query, PAGE_PARAM)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|page| *page > 0)
        .unwrap_or(1)
}

/// Write the table page into `query`; the first page is implied and therefore removed.
pub fn apply_page(query: &str, page: usize) -> String {
    let value = (page > 1).then(|| page.to_string());
    set_params(query, &[(PAGE_PARAM, value)])
}

/// The query string handed to the remote API on navigation.
pub fn forwarded_query(query: &str) -> &str {
    query.strip_prefix('?').unwrap_or(query)
}

/// First decoded value of `key`, mirroring `URLSearchParams.get`.
pub fn first_value(query: &str, key: &str) -> Option<String> {
    form_urlencoded::parse(forwarded_query(query).as_bytes())
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

fn all_values(query: &str, key: &str) -> Vec<String> {
    form_urlencoded::parse(forwarded_query(query).as_bytes())
        .filter(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
        .collect()
}

/// Set or remove parameters in place.
///
/// The first occurrence of each key is replaced (or removed when the new value is
/// `None`), later duplicates are dropped, and keys not yet present are appended.
pub fn set_params(query: &str, updates: &[(&str, Option<String>)]) -> String {
    let mut written = vec![false; updates.len()];
    let mut serializer = form_urlencoded::Serializer::new(String::new());

    for (name, value) in form_urlencoded::parse(forwarded_query(query).as_bytes()) {
        match updates.iter().position(|(key, _)| *key == name) {
            Some(index) => {
                if !written[index] {
                    written[index] = true;
                    if let Some(replacement) = &updates[index].1 {
                        serializer.append_pair(&name, replacement);
                    }
                }
            }
            None => {
                serializer.append_pair(&name, &value);
            }
        }
    }

    for (index, (key, value)) in updates.iter().enumerate() {
        if written[index] {
            continue;
        }
        if let Some(value) = value {
            serializer.append_pair(key, value);
        }
    }

    serializer.finish()
}
