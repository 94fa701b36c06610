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

//! Adapters to consume paginated list APIs as asynchronous streams.
//!
//! List methods return their results in pages. Each response holds one batch
//! of items and the continuation token for the next page, with an empty
//! token marking the last page. [Paginator] turns such a method into a
//! stream of pages, and [ItemPaginator] flattens the pages into a stream of
//! their items. Both are lazy, they only fetch a page when the application
//! polls past the data already received.

use futures::stream::unfold;
use futures::{Stream, StreamExt};
use pin_project::pin_project;
use std::future::Future;
use std::pin::Pin;

/// Describes a list response that can be driven by a [Paginator].
pub trait PageableResponse {
    /// The type of the elements in the repeated field of the response.
    type PageItem;

    /// Removes and returns the items in this page.
    ///
    /// Implementations typically use [std::mem::take] on the repeated field.
    /// The other fields of the response are unaffected, so they remain
    /// available through [ItemPaginator::current_page].
    fn take_items(&mut self) -> Vec<Self::PageItem>;

    /// Returns the continuation token for the next page.
    ///
    /// An empty token indicates that this is the last page.
    fn next_page_token(&self) -> String;
}

pub(crate) type ControlFlow = std::ops::ControlFlow<(), String>;

/// Maps one fetch result to the page to yield and the state for the next
/// fetch.
///
/// Both the asynchronous and the [blocking][crate::blocking] adapters
/// sequence pages through this function, they differ only in how they await
/// the fetch itself.
pub(crate) fn advance<T, E>(result: Result<T, E>) -> (Result<T, E>, ControlFlow)
where
    T: PageableResponse,
{
    match result {
        Ok(page) => {
            let token = page.next_page_token();
            let next_state = if token.is_empty() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(token)
            };
            (Ok(page), next_state)
        }
        // An error ends the sequence. Pagination is forward-only, there is
        // no way to retry or restart a partially consumed paginator.
        Err(e) => (Err(e), ControlFlow::Break(())),
    }
}

/// An adapter that converts list methods, as defined by
/// [AIP-4233](https://google.aip.dev/client-libraries/4233), into a
/// [futures::Stream] of pages.
#[pin_project]
pub struct Paginator<T, E> {
    #[pin]
    stream: Pin<Box<dyn Stream<Item = Result<T, E>> + Send>>,
}

impl<T, E> Paginator<T, E>
where
    T: PageableResponse,
{
    /// Creates a new [Paginator] given the initial page token and a function
    /// to fetch pages.
    ///
    /// `execute` receives the continuation token for the page it should
    /// fetch, and builds a fresh request from it. The paginator never reuses
    /// a request across calls. An empty `seed_token` requests the first
    /// page; a non-empty one resumes a sequence from a token obtained
    /// elsewhere.
    ///
    /// # Example
    /// ```
    /// # use listax::paginator::{PageableResponse, Paginator};
    /// # struct ListResponse {
    /// #     instances: Vec<String>,
    /// #     next_page_token: String,
    /// # }
    /// # impl PageableResponse for ListResponse {
    /// #     type PageItem = String;
    /// #     fn take_items(&mut self) -> Vec<String> {
    /// #         std::mem::take(&mut self.instances)
    /// #     }
    /// #     fn next_page_token(&self) -> String {
    /// #         self.next_page_token.clone()
    /// #     }
    /// # }
    /// async fn list_instances(page_token: String) -> Result<ListResponse, String> {
    ///     // A real application would send the request here.
    ///     Ok(ListResponse {
    ///         instances: vec!["instance-1".into(), "instance-2".into()],
    ///         next_page_token: String::new(),
    ///     })
    /// }
    ///
    /// # tokio_test::block_on(async {
    /// let mut pages = Paginator::new(String::new(), list_instances);
    /// while let Some(page) = pages.next().await {
    ///     let mut page = page?;
    ///     println!("fetched {} instances", page.take_items().len());
    /// }
    /// # Ok::<(), String>(())
    /// # }).unwrap();
    /// ```
    pub fn new<F>(
        seed_token: String,
        execute: impl Fn(String) -> F + Clone + Send + 'static,
    ) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let stream = unfold(ControlFlow::Continue(seed_token), move |state| {
            let execute = execute.clone();
            async move {
                let page_token = match state {
                    ControlFlow::Continue(token) => token,
                    ControlFlow::Break(_) => return None,
                };
                Some(advance(execute(page_token).await))
            }
        });
        Self {
            stream: Box::pin(stream),
        }
    }

    /// Converts this paginator into a stream of the individual items.
    pub fn items(self) -> ItemPaginator<T, E> {
        ItemPaginator::new(self)
    }

    /// Returns the next page of the wrapped stream.
    pub fn next(&mut self) -> futures::stream::Next<'_, Self> {
        StreamExt::next(self)
    }
}

impl<T, E> Stream for Paginator<T, E> {
    type Item = Result<T, E>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.project().stream.poll_next(cx)
    }
}

/// An adapter that flattens a [Paginator] into a [futures::Stream] of its
/// items.
///
/// The items are yielded in page order, and in their response order within
/// each page. The next page is fetched only once every item of the current
/// page has been consumed.
#[pin_project]
pub struct ItemPaginator<T, E>
where
    T: PageableResponse,
{
    #[pin]
    pages: Paginator<T, E>,
    current: Option<T>,
    items: std::vec::IntoIter<T::PageItem>,
}

impl<T, E> ItemPaginator<T, E>
where
    T: PageableResponse,
{
    /// Creates a new [ItemPaginator] from a stream of pages.
    pub fn new(pages: Paginator<T, E>) -> Self {
        Self {
            pages,
            current: None,
            items: Vec::new().into_iter(),
        }
    }

    /// Returns the most recently fetched page.
    ///
    /// Returns `None` until the first page arrives. The items of the page
    /// have already been removed, the other fields remain untouched so the
    /// application can inspect them, e.g. a total size or the raw
    /// continuation token. After the stream finishes the last page remains
    /// available.
    pub fn current_page(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Returns the next item of the wrapped stream.
    pub fn next(&mut self) -> futures::stream::Next<'_, Self> {
        StreamExt::next(self)
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

impl<T, E> Stream for ItemPaginator<T, E>
where
    T: PageableResponse,
{
    type Item = Result<T::PageItem, E>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            if let Some(item) = this.items.next() {
                return std::task::Poll::Ready(Some(Ok(item)));
            }
            match futures::ready!(this.pages.as_mut().poll_next(cx)) {
                Some(Ok(mut page)) => {
                    *this.items = page.take_items().into_iter();
                    *this.current = Some(page);
                }
                Some(Err(e)) => return std::task::Poll::Ready(Some(Err(e))),
                None => return std::task::Poll::Ready(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    type TestError = Box<dyn std::error::Error + Send + Sync>;

    #[derive(Clone, Debug, PartialEq)]
    struct PageItem {
        name: String,
    }

    #[derive(Debug)]
    struct TestResponse {
        items: Vec<PageItem>,
        next_page_token: String,
        request_id: String,
    }

    impl PageableResponse for TestResponse {
        type PageItem = PageItem;

        fn take_items(&mut self) -> Vec<PageItem> {
            std::mem::take(&mut self.items)
        }

        fn next_page_token(&self) -> String {
            self.next_page_token.clone()
        }
    }

    fn page(names: &[&str], next_page_token: &str, request_id: &str) -> TestResponse {
        TestResponse {
            items: names
                .iter()
                .map(|name| PageItem {
                    name: name.to_string(),
                })
                .collect(),
            next_page_token: next_page_token.into(),
            request_id: request_id.into(),
        }
    }

    struct InnerClient {
        data: VecDeque<TestResponse>,
        expected_tokens: VecDeque<String>,
        call_count: usize,
    }

    #[derive(Clone)]
    struct Client {
        inner: Arc<Mutex<InnerClient>>,
    }

    impl Client {
        fn new(data: Vec<TestResponse>, expected_tokens: Vec<&str>) -> Self {
            Self {
                inner: Arc::new(Mutex::new(InnerClient {
                    data: data.into(),
                    expected_tokens: expected_tokens.into_iter().map(str::to_string).collect(),
                    call_count: 0,
                })),
            }
        }

        async fn execute(
            inner: Arc<Mutex<InnerClient>>,
            token: String,
        ) -> Result<TestResponse, TestError> {
            let mut inner = inner.lock().unwrap();
            inner.call_count += 1;
            let expected = inner
                .expected_tokens
                .pop_front()
                .expect("received a request after the last page");
            assert_eq!(token, expected);
            inner
                .data
                .pop_front()
                .ok_or_else(|| "simulated failure".into())
        }

        fn pages(&self) -> Paginator<TestResponse, TestError> {
            let inner = self.inner.clone();
            Paginator::new(String::new(), move |token| {
                let inner = inner.clone();
                Client::execute(inner, token)
            })
        }

        fn call_count(&self) -> usize {
            self.inner.lock().unwrap().call_count
        }
    }

    #[tokio::test]
    async fn iterate_pages_until_last() {
        let client = Client::new(
            vec![
                page(&["a", "b", "c"], "abc", "r1"),
                // A page may be empty and still continue the sequence. Only
                // the token decides if the sequence ends.
                page(&[], "def", "r2"),
                page(&["d", "e"], "", "r3"),
            ],
            vec!["", "abc", "def"],
        );
        let mut paginator = client.pages();
        let mut names = Vec::new();
        while let Some(page) = paginator.next().await {
            let mut page = page.unwrap();
            names.extend(page.take_items().into_iter().map(|item| item.name));
        }
        assert_eq!(names, ["a", "b", "c", "d", "e"]);
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn fetch_pages_on_demand() {
        let client = Client::new(
            vec![page(&["a"], "abc", "r1"), page(&["b"], "", "r2")],
            vec!["", "abc"],
        );
        let mut paginator = client.pages();
        assert_eq!(client.call_count(), 0);
        let page = paginator.next().await.transpose().unwrap();
        assert!(page.is_some(), "{page:?}");
        assert_eq!(client.call_count(), 1);
        let page = paginator.next().await.transpose().unwrap();
        assert!(page.is_some(), "{page:?}");
        assert_eq!(client.call_count(), 2);
        assert!(paginator.next().await.is_none());
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn yield_error_and_stop() {
        // The tokens promise two pages, but the backing data runs out after
        // the first one. The second fetch fails.
        let client = Client::new(vec![page(&["a"], "abc", "r1")], vec!["", "abc"]);
        let mut paginator = client.pages();
        let page = paginator.next().await.unwrap();
        assert!(page.is_ok(), "{page:?}");
        let page = paginator.next().await.unwrap();
        assert!(page.is_err(), "{page:?}");
        assert!(paginator.next().await.is_none());
        assert!(paginator.next().await.is_none());
    }

    #[tokio::test]
    async fn flatten_items_in_order() {
        let client = Client::new(
            vec![
                page(&["a", "b", "c"], "abc", "r1"),
                page(&[], "def", "r2"),
                page(&["d", "e"], "", "r3"),
            ],
            vec!["", "abc", "def"],
        );
        let mut items = client.pages().items();
        let mut names = Vec::new();
        while let Some(item) = items.next().await {
            names.push(item.unwrap().name);
        }
        assert_eq!(names, ["a", "b", "c", "d", "e"]);
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn flatten_items_on_demand() {
        let client = Client::new(
            vec![page(&["a", "b"], "abc", "r1"), page(&["c"], "", "r2")],
            vec!["", "abc"],
        );
        let mut items = client.pages().items();
        assert_eq!(client.call_count(), 0);
        items.next().await;
        assert_eq!(client.call_count(), 1);
        items.next().await;
        assert_eq!(client.call_count(), 1);
        items.next().await;
        assert_eq!(client.call_count(), 2);
        assert!(items.next().await.is_none());
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn track_current_page() {
        let client = Client::new(
            vec![page(&["a", "b"], "abc", "r1"), page(&["c"], "", "r2")],
            vec!["", "abc"],
        );
        let mut items = client.pages().items();
        assert!(items.current_page().is_none());

        let item = items.next().await.transpose().unwrap();
        assert_eq!(item.map(|i| i.name).as_deref(), Some("a"));
        let current = items.current_page().unwrap();
        assert_eq!(current.request_id, "r1");
        assert!(current.items.is_empty(), "{current:?}");

        // The second item comes from the same page.
        items.next().await;
        assert_eq!(items.current_page().unwrap().request_id, "r1");

        items.next().await;
        assert_eq!(items.current_page().unwrap().request_id, "r2");

        // The last page remains available after the stream finishes.
        assert!(items.next().await.is_none());
        assert_eq!(items.current_page().unwrap().request_id, "r2");
    }

    #[tokio::test]
    async fn flatten_yields_error_and_stops() {
        let client = Client::new(vec![page(&["a"], "abc", "r1")], vec!["", "abc"]);
        let mut items = client.pages().items();
        let first = items.next().await.transpose().unwrap();
        assert_eq!(first.map(|i| i.name).as_deref(), Some("a"));
        let second = items.next().await.unwrap();
        assert!(second.is_err(), "{second:?}");
        assert!(items.next().await.is_none());
    }

    #[tokio::test]
    async fn item_paginator_from_paginator() {
        let client = Client::new(vec![page(&["a"], "", "r1")], vec![""]);
        let mut items = ItemPaginator::from(client.pages());
        let first = items.next().await.transpose().unwrap();
        assert_eq!(first.map(|i| i.name).as_deref(), Some("a"));
        assert!(items.next().await.is_none());
    }
}
