//! Browser page session abstraction
//!
//! The verifier only needs four things from a browser: load a path, count the
//! elements matching a selector, click one, and read the current location.
//! Each [`PageSession`] is an isolated browser context owned by exactly one
//! scenario run; a [`SessionFactory`] hands out fresh ones.

use async_trait::async_trait;

use crate::error::NavResult;

#[async_trait]
pub trait PageSession: Send {
    /// Load `path` relative to the application's base URL and wait for the load event
    async fn goto(&mut self, path: &str) -> NavResult<()>;

    /// Number of elements currently matching `selector`
    async fn count(&mut self, selector: &str) -> NavResult<usize>;

    /// Dispatch a user click on the first element matching `selector`
    async fn click(&mut self, selector: &str) -> NavResult<()>;

    /// The document's current location
    async fn location(&mut self) -> NavResult<String>;

    /// Release the browser context
    async fn close(&mut self) -> NavResult<()>;
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> NavResult<Box<dyn PageSession>>;
}
