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

//! Pagination and retry helpers for token-based list APIs.
//!
//! Many services return large result sets in pages. Each response carries a
//! batch of items and an opaque continuation token, where an empty token
//! marks the end of the results. The types in this crate consume such APIs
//! as lazy sequences of pages or of individual items, so applications do not
//! need hand-written token loops. Asynchronous callers use the adapters in
//! [paginator], applications without an async runtime use the mirrors in
//! [blocking].
//!
//! The crate also provides wrappers to retry flaky calls with truncated
//! exponential backoff, see [retry]. They are designed for integration tests
//! and tooling that call services which only become consistent after some
//! time.
//!
//! # Example
//! ```
//! use listax::paginator::{PageableResponse, Paginator};
//!
//! struct ListLogsResponse {
//!     log_names: Vec<String>,
//!     next_page_token: String,
//! }
//!
//! impl PageableResponse for ListLogsResponse {
//!     type PageItem = String;
//!     fn take_items(&mut self) -> Vec<String> {
//!         std::mem::take(&mut self.log_names)
//!     }
//!     fn next_page_token(&self) -> String {
//!         self.next_page_token.clone()
//!     }
//! }
//!
//! // Simulates a service that returns the results in two pages. A real
//! // application would send a request with the given page token.
//! async fn list_logs(page_token: String) -> Result<ListLogsResponse, String> {
//!     match page_token.as_str() {
//!         "" => Ok(ListLogsResponse {
//!             log_names: vec!["projects/p/logs/a".into(), "projects/p/logs/b".into()],
//!             next_page_token: "page-2".into(),
//!         }),
//!         "page-2" => Ok(ListLogsResponse {
//!             log_names: vec!["projects/p/logs/c".into()],
//!             next_page_token: String::new(),
//!         }),
//!         other => Err(format!("unexpected page token {other}")),
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let mut names = Paginator::new(String::new(), list_logs).items();
//! while let Some(name) = names.next().await {
//!     println!("{}", name?);
//! }
//! # Ok::<(), String>(())
//! # }).unwrap();
//! ```

/// Defines the trait implemented by all backoff strategies.
pub mod backoff_policy;

/// Blocking counterparts of the [paginator] adapters.
pub mod blocking;

/// Truncated exponential backoff.
pub mod exponential_backoff;

/// Adapters to consume paginated list APIs as asynchronous streams.
pub mod paginator;

/// Wrappers to retry flaky calls.
pub mod retry;
