//! Navigation links for paginated responses.
//!
//! Links are assembled as structured parameter lists ([`LinkQuery`]) and
//! serialized once with `application/x-www-form-urlencoded` rules, so values
//! such as the JSON-encoded sort list are always escaped:
//!
//! ```text
//! /users?page=2&size=10&sort=%5B%22name%3Dasc%22%5D
//! ```

use serde_json::Value;
use url::form_urlencoded;

use crate::models::Links;
use crate::pagination::PageWindow;

/// Query parameters of one link, in serialization order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkQuery {
    params: Vec<(&'static str, String)>,
}

impl LinkQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn page(self, page: u64) -> Self {
        self.param("page", page.to_string())
    }

    #[must_use]
    pub fn size(self, size: u64) -> Self {
        self.param("size", size.to_string())
    }

    /// Attach the raw sort tokens as a JSON array, if there are any
    #[must_use]
    pub fn sort(self, sort: Option<&[String]>) -> Self {
        match sort {
            Some(tokens) if !tokens.is_empty() => {
                self.param("sort", Value::from(tokens.to_vec()).to_string())
            }
            _ => self,
        }
    }

    fn param(mut self, key: &'static str, value: String) -> Self {
        self.params.push((key, value));
        self
    }

    #[must_use]
    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    /// Serialize as a URL query string (without the leading `?`)
    #[must_use]
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter().map(|(key, value)| (*key, value.as_str())))
            .finish()
    }

    /// Append to `route`, continuing an existing query string if present
    #[must_use]
    pub fn to_url(&self, route: &str) -> String {
        let separator = if route.contains('?') { '&' } else { '?' };
        format!("{route}{separator}{}", self.encode())
    }
}

/// Build `first`/`prev`/`next`/`last` for `window` within `total_pages` pages.
///
/// `prev` is empty on the first page and `next` is empty from the last page on.
#[must_use]
pub fn build_links(
    route: &str,
    window: PageWindow,
    total_pages: u64,
    sort: Option<&[String]>,
) -> Links {
    let link = |page: Option<u64>| {
        let query = match page {
            Some(page) => LinkQuery::new().page(page),
            None => LinkQuery::new(),
        };
        query.size(window.size).sort(sort).to_url(route)
    };

    Links {
        first: link(None),
        prev: if window.has_prev() {
            link(Some(window.page - 1))
        } else {
            String::new()
        },
        next: if window.has_next(total_pages) {
            link(Some(window.page + 1))
        } else {
            String::new()
        },
        last: link(Some(total_pages)),
    }
}
