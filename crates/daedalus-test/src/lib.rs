//! # Daedalus Test
//!
//! In-memory request testing for Daedalus applications.
//!
//! A [`TestClient`] feeds requests straight into a compiled
//! `DispatchTable`, so tests see exactly what a browser would: middleware
//! order, error bodies, htmx redirects and event-stream frames, without
//! binding a port.
//!
//! ## Example
//!
//! ```ignore
//! use daedalus_test::TestClient;
//!
//! #[tokio::test]
//! async fn test_login_redirects() {
//!     let client = TestClient::from_router(app_router()).unwrap();
//!
//!     client
//!         .post("/login")
//!         .htmx()
//!         .form(&[("email", "a@b.io"), ("password", "secret")])
//!         .send()
//!         .await
//!         .assert_redirect("/dashboard");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{PendingRequest, TestClient};
pub use error::TestError;
pub use request::TestRequest;
pub use response::{SseFrame, TestResponse};
