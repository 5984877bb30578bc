//! Lazy page-by-page cursor over GitLab list endpoints

use std::marker::PhantomData;

use compact_str::{format_compact, CompactString};
use futures_util::{stream, Stream, TryStreamExt};
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{
    api::GitlabApi,
    error::{ClientError, Result},
};

/// Pagination headers returned with every page of a list endpoint.
///
/// See https://docs.gitlab.com/ee/api/rest/#pagination-link-header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// `None` both when the header is missing and when it is empty
    pub next_page: Option<u32>,
    /// Whether `X-Next-Page` was sent at all
    pub has_next_page_header: bool,
    /// GitLab omits this for very large collections
    pub total: Option<u64>,
    pub total_pages: Option<u32>,
}

impl PageInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        fn header<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .and_then(|v| v.parse().ok())
        }

        Self {
            page: header(headers, "x-page"),
            per_page: header(headers, "x-per-page"),
            next_page: header(headers, "x-next-page"),
            has_next_page_header: headers.contains_key("x-next-page"),
            total: header(headers, "x-total"),
            total_pages: header(headers, "x-total-pages"),
        }
    }

    /// Whether another page follows `page`, which returned `received` items.
    fn has_next(&self, page: u32, received: usize, per_page: u32) -> bool {
        if self.has_next_page_header {
            self.next_page.is_some()
        } else if let Some(total_pages) = self.total_pages {
            page < total_pages
        } else {
            received >= per_page as usize
        }
    }
}

/// Appends `page` and `per_page` to a list URL that may already carry a query.
pub(crate) fn page_url(url: &str, page: u32, per_page: u32) -> CompactString {
    let separator = if url.contains('?') { '&' } else { '?' };
    format_compact!("{url}{separator}page={page}&per_page={per_page}")
}

/// Cursor over a paginated list endpoint. Nothing is requested until
/// [`Pager::next_page`] is first called.
#[derive(Debug, Clone)]
pub struct Pager<T> {
    api: GitlabApi,
    url: CompactString,
    per_page: u32,
    current_page: u32,
    total_items: Option<u64>,
    total_pages: Option<u32>,
    exhausted: bool,
    _item: PhantomData<fn() -> T>,
}

impl<T> Pager<T>
where
    T: for<'de> Deserialize<'de>,
{
    pub(crate) fn new(api: GitlabApi, url: CompactString, per_page: u32) -> Self {
        Self {
            api,
            url,
            per_page,
            current_page: 0,
            total_items: None,
            total_pages: None,
            exhausted: false,
            _item: PhantomData,
        }
    }

    /// Fetches the page after the current one, or `None` once the last page
    /// has been consumed.
    #[instrument(skip(self), fields(url = %self.url, page = self.current_page + 1))]
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self.current_page + 1;
        let (items, info) = self.fetch(page).await?;
        self.current_page = page;

        if items.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        self.exhausted = !info.has_next(page, items.len(), self.per_page);
        debug!(item_count = items.len(), exhausted = self.exhausted, "Fetched page");

        Ok(Some(items))
    }

    /// Fetches an arbitrary page without moving the cursor.
    pub async fn page(&mut self, page: u32) -> Result<Vec<T>> {
        if page == 0 {
            return Err(ClientError::invalid_argument("pages are numbered from 1"));
        }

        let (items, _) = self.fetch(page).await?;
        Ok(items)
    }

    /// Drains all remaining pages, in order.
    pub async fn all(&mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }

        Ok(items)
    }

    /// Resets the cursor so the next call fetches page 1 again.
    pub fn rewind(&mut self) {
        self.current_page = 0;
        self.exhausted = false;
    }

    /// Page number of the most recently fetched page, 0 before the first.
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Total number of items, known after the first fetch.
    pub fn total_items(&self) -> Option<u64> {
        self.total_items
    }

    /// Total number of pages, known after the first fetch.
    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    /// The remaining items as a stream, fetching pages on demand.
    pub fn into_stream(self) -> impl Stream<Item = Result<T>> {
        stream::try_unfold(self, |mut pager| async move {
            let page = pager.next_page().await?;
            Ok::<_, ClientError>(page.map(|items| (items, pager)))
        })
        .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
        .try_flatten()
    }

    async fn fetch(&mut self, page: u32) -> Result<(Vec<T>, PageInfo)> {
        let url = page_url(&self.url, page, self.per_page);
        let (items, info) = self.api.get_page::<T>(&url).await?;

        if info.total.is_some() {
            self.total_items = info.total;
        }
        if info.total_pages.is_some() {
            self.total_pages = info.total_pages;
        }

        Ok((items, info))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_page_info_from_headers() {
        let info = PageInfo::from_headers(&headers(&[
            ("x-page", "2"),
            ("x-per-page", "20"),
            ("x-next-page", "3"),
            ("x-total", "55"),
            ("x-total-pages", "3"),
        ]));

        assert_eq!(info.page, Some(2));
        assert_eq!(info.per_page, Some(20));
        assert_eq!(info.next_page, Some(3));
        assert_eq!(info.total, Some(55));
        assert_eq!(info.total_pages, Some(3));
        assert!(info.has_next(2, 20, 20));
    }

    #[test]
    fn test_empty_next_page_header_ends_listing() {
        let info = PageInfo::from_headers(&headers(&[("x-page", "3"), ("x-next-page", "")]));

        assert!(info.has_next_page_header);
        assert_eq!(info.next_page, None);
        assert!(!info.has_next(3, 20, 20));
    }

    #[test]
    fn test_missing_headers_fall_back_to_page_size() {
        let info = PageInfo::from_headers(&HeaderMap::new());

        assert!(info.has_next(1, 20, 20));
        assert!(!info.has_next(1, 7, 20));
    }

    #[test]
    fn test_page_url() {
        assert_eq!(
            page_url("https://gitlab.example.com/projects/1/jobs", 2, 50),
            "https://gitlab.example.com/projects/1/jobs?page=2&per_page=50"
        );
        assert_eq!(
            page_url("https://gitlab.example.com/projects/1/jobs?scope=failed", 1, 20),
            "https://gitlab.example.com/projects/1/jobs?scope=failed&page=1&per_page=20"
        );
    }
}
