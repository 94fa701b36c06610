// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Blocking counterparts of the [paginator][crate::paginator] adapters.
//!
//! Applications without an async runtime consume list APIs through these
//! types. They implement [Iterator] instead of [futures::Stream] and are
//! otherwise identical in behavior to their asynchronous counterparts: both
//! sequence pages through the same kernel.
//!
//! # Example
//! ```
//! use listax::blocking::{PageableResponse, Paginator};
//!
//! struct ListZonesResponse {
//!     zones: Vec<String>,
//!     next_page_token: String,
//! }
//! # impl PageableResponse for ListZonesResponse {
//! #     type PageItem = String;
//! #     fn take_items(&mut self) -> Vec<String> {
//! #         std::mem::take(&mut self.zones)
//! #     }
//! #     fn next_page_token(&self) -> String {
//! #         self.next_page_token.clone()
//! #     }
//! # }
//!
//! fn list_zones(page_token: String) -> Result<ListZonesResponse, String> {
//!     // A real application would block on a request here.
//!     match page_token.as_str() {
//!         "" => Ok(ListZonesResponse {
//!             zones: vec!["us-central1-a".into(), "us-central1-b".into()],
//!             next_page_token: String::new(),
//!         }),
//!         other => Err(format!("unexpected page token {other}")),
//!     }
//! }
//!
//! let zones = Paginator::new(String::new(), list_zones)
//!     .items()
//!     .collect::<Result<Vec<_>, _>>()?;
//! assert_eq!(zones, ["us-central1-a", "us-central1-b"]);
//! # Ok::<(), String>(())
//! ```

pub use crate::paginator::PageableResponse;
use crate::paginator::{ControlFlow, advance};

/// An adapter that converts a paginated list method into an [Iterator] of
/// pages.
///
/// The iterator is lazy, it only fetches a page when the application asks
/// for it.
pub struct Paginator<T, E> {
    state: ControlFlow,
    execute: Box<dyn FnMut(String) -> Result<T, E> + Send>,
}

impl<T, E> Paginator<T, E>
where
    T: PageableResponse,
{
    /// Creates a new [Paginator] given the initial page token and a function
    /// to fetch pages.
    ///
    /// `execute` follows the same conventions as in the asynchronous
    /// [Paginator::new][crate::paginator::Paginator::new]. It may be a
    /// [FnMut] closure, the iterator performs at most one call at a time.
    pub fn new(
        seed_token: String,
        execute: impl FnMut(String) -> Result<T, E> + Send + 'static,
    ) -> Self {
        Self {
            state: ControlFlow::Continue(seed_token),
            execute: Box::new(execute),
        }
    }

    /// Converts this paginator into an iterator over the individual items.
    pub fn items(self) -> ItemPaginator<T, E> {
        ItemPaginator::new(self)
    }
}

impl<T, E> Iterator for Paginator<T, E>
where
    T: PageableResponse,
{
    type Item = Result<T, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let state = std::mem::replace(&mut self.state, ControlFlow::Break(()));
        let token = match state {
            ControlFlow::Continue(token) => token,
            ControlFlow::Break(_) => return None,
        };
        let (page, next_state) = advance((self.execute)(token));
        self.state = next_state;
        Some(page)
    }
}

/// An adapter that flattens a [Paginator] into an [Iterator] over its items.
///
/// The items are yielded in page order, and in their response order within
/// each page. The next page is fetched only once every item of the current
/// page has been consumed.
pub struct ItemPaginator<T, E>
where
    T: PageableResponse,
{
    pages: Paginator<T, E>,
    current: Option<T>,
    items: std::vec::IntoIter<T::PageItem>,
}

impl<T, E> ItemPaginator<T, E>
where
    T: PageableResponse,
{
    /// Creates a new [ItemPaginator] from an iterator over pages.
    pub fn new(pages: Paginator<T, E>) -> Self {
        Self {
            pages,
            current: None,
            items: Vec::new().into_iter(),
        }
    }

    /// Returns the most recently fetched page.
    ///
    /// The same conventions apply as in the asynchronous
    /// [ItemPaginator::current_page][crate::paginator::ItemPaginator::current_page].
    pub fn current_page(&self) -> Option<&T> {
        self.current.as_ref()
    }
}

impl<T, E> From<Paginator<T, E>> for ItemPaginator<T, E>
where
    T: PageableResponse,
{
    fn from(pages: Paginator<T, E>) -> Self {
        Self::new(pages)
    }
}

impl<T, E> Iterator for ItemPaginator<T, E>
where
    T: PageableResponse,
{
    type Item = Result<T::PageItem, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.items.next() {
                return Some(Ok(item));
            }
            match self.pages.next()? {
                Ok(mut page) => {
                    self.items = page.take_items().into_iter();
                    self.current = Some(page);
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type TestError = Box<dyn std::error::Error + Send + Sync>;

    #[derive(Debug)]
    struct TestResponse {
        items: Vec<String>,
        next_page_token: String,
        request_id: String,
    }

    impl PageableResponse for TestResponse {
        type PageItem = String;

        fn take_items(&mut self) -> Vec<String> {
            std::mem::take(&mut self.items)
        }

        fn next_page_token(&self) -> String {
            self.next_page_token.clone()
        }
    }

    fn page(items: &[&str], next_page_token: &str, request_id: &str) -> TestResponse {
        TestResponse {
            items: items.iter().map(|item| item.to_string()).collect(),
            next_page_token: next_page_token.into(),
            request_id: request_id.into(),
        }
    }

    fn pages(
        responses: Vec<TestResponse>,
        expected_tokens: &[&str],
        calls: Arc<AtomicUsize>,
    ) -> Paginator<TestResponse, TestError> {
        let mut responses = VecDeque::from(responses);
        let mut expected = expected_tokens
            .iter()
            .map(|token| token.to_string())
            .collect::<VecDeque<_>>();
        Paginator::new(String::new(), move |token| {
            calls.fetch_add(1, Ordering::SeqCst);
            let expected_token = expected
                .pop_front()
                .expect("received a request after the last page");
            assert_eq!(token, expected_token);
            responses
                .pop_front()
                .ok_or_else(|| "simulated failure".into())
        })
    }

    #[test]
    fn iterate_pages_until_last() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut paginator = pages(
            vec![
                page(&["a", "b", "c"], "abc", "r1"),
                page(&[], "def", "r2"),
                page(&["d", "e"], "", "r3"),
            ],
            &["", "abc", "def"],
            calls.clone(),
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let mut names = Vec::new();
        for page in paginator.by_ref() {
            names.extend(page.unwrap().take_items());
        }
        assert_eq!(names, ["a", "b", "c", "d", "e"]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(paginator.next().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn resume_from_seed_token() {
        let mut responses = VecDeque::from(vec![
            page(&["c"], "token2", "r1"),
            page(&["d"], "", "r2"),
        ]);
        let mut expected = VecDeque::from(["token1".to_string(), "token2".to_string()]);
        let paginator = Paginator::new("token1".into(), move |token: String| {
            assert_eq!(Some(token), expected.pop_front());
            Ok::<_, TestError>(responses.pop_front().unwrap())
        });
        let names = paginator.items().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(names, ["c", "d"]);
    }

    #[test]
    fn flatten_items_on_demand() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut items = pages(
            vec![page(&["a", "b"], "abc", "r1"), page(&["c"], "", "r2")],
            &["", "abc"],
            calls.clone(),
        )
        .items();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        items.next();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        items.next();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        items.next();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(items.next().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn track_current_page() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut items = pages(
            vec![page(&["a", "b"], "abc", "r1"), page(&["c"], "", "r2")],
            &["", "abc"],
            calls.clone(),
        )
        .items();
        assert!(items.current_page().is_none());

        let item = items.next().transpose().unwrap();
        assert_eq!(item.as_deref(), Some("a"));
        let current = items.current_page().unwrap();
        assert_eq!(current.request_id, "r1");
        assert!(current.items.is_empty(), "{current:?}");

        items.next();
        assert_eq!(items.current_page().unwrap().request_id, "r1");

        items.next();
        assert_eq!(items.current_page().unwrap().request_id, "r2");

        // The last page remains available after the iterator finishes.
        assert!(items.next().is_none());
        assert_eq!(items.current_page().unwrap().request_id, "r2");
    }

    #[test]
    fn yield_error_and_stop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut items = pages(vec![page(&["a"], "abc", "r1")], &["", "abc"], calls.clone()).items();
        let first = items.next().transpose().unwrap();
        assert_eq!(first.as_deref(), Some("a"));
        let second = items.next().unwrap();
        assert!(second.is_err(), "{second:?}");
        assert!(items.next().is_none());
        assert!(items.next().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
