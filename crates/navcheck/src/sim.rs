//! In-memory simulated site
//!
//! A [`SimulatedSite`] models pages as lists of anchors and implements
//! [`SessionFactory`], so scenario catalogs and the verifier can be exercised
//! without launching a browser. Links can be made dead (clicking does
//! nothing), misrouted (they land somewhere other than their `href`) or slow
//! (the location only changes after a number of polls).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{NavError, NavResult};
use crate::locator::Locator;
use crate::page::{PageSession, SessionFactory};

#[derive(Debug, Clone)]
pub struct SimLink {
    href: String,
    target: Option<String>,
    delay_polls: u32,
}

impl SimLink {
    /// A link that navigates to its own `href`
    pub fn to(href: &str) -> Self {
        Self {
            href: href.to_string(),
            target: Some(href.to_string()),
            delay_polls: 0,
        }
    }

    /// A link whose click never changes the location
    pub fn dead(href: &str) -> Self {
        Self {
            href: href.to_string(),
            target: None,
            delay_polls: 0,
        }
    }

    /// A link that lands on `target` instead of its `href`
    pub fn misrouted(href: &str, target: &str) -> Self {
        Self {
            href: href.to_string(),
            target: Some(target.to_string()),
            delay_polls: 0,
        }
    }

    /// Delay the location change by `polls` location reads
    pub fn after_polls(mut self, polls: u32) -> Self {
        self.delay_polls = polls;
        self
    }
}

#[derive(Debug)]
struct SiteMap {
    base_url: String,
    pages: HashMap<String, Vec<SimLink>>,
    sessions_opened: AtomicUsize,
}

#[derive(Debug, Clone)]
pub struct SimulatedSite {
    inner: Arc<SiteMap>,
}

impl SimulatedSite {
    pub fn builder(base_url: &str) -> SimulatedSiteBuilder {
        SimulatedSiteBuilder {
            base_url: base_url.trim_end_matches('/').to_string(),
            pages: HashMap::new(),
        }
    }

    /// The four-route music app the built-in scenarios target
    pub fn music_app(base_url: &str) -> Self {
        let nav = || {
            vec![
                SimLink::to("/settings"),
                SimLink::to("/playlists"),
                SimLink::to("/generator"),
                SimLink::to("/library"),
            ]
        };
        Self::builder(base_url)
            .page("/", nav())
            .page("/settings", nav())
            .page("/playlists", nav())
            .page("/generator", nav())
            .page("/library", nav())
            .build()
    }

    pub fn sessions_opened(&self) -> usize {
        self.inner.sessions_opened.load(Ordering::SeqCst)
    }

    /// Start a session directly, without going through the factory
    pub fn session(&self) -> SimulatedSession {
        self.inner.sessions_opened.fetch_add(1, Ordering::SeqCst);
        SimulatedSession {
            site: Arc::clone(&self.inner),
            path: None,
            pending: None,
            closed: false,
        }
    }
}

pub struct SimulatedSiteBuilder {
    base_url: String,
    pages: HashMap<String, Vec<SimLink>>,
}

impl SimulatedSiteBuilder {
    pub fn page(mut self, path: &str, links: Vec<SimLink>) -> Self {
        self.pages.insert(path.to_string(), links);
        self
    }

    pub fn build(self) -> SimulatedSite {
        SimulatedSite {
            inner: Arc::new(SiteMap {
                base_url: self.base_url,
                pages: self.pages,
                sessions_opened: AtomicUsize::new(0),
            }),
        }
    }
}

#[async_trait]
impl SessionFactory for SimulatedSite {
    async fn open(&self) -> NavResult<Box<dyn PageSession>> {
        Ok(Box::new(self.session()))
    }
}

/// One isolated browsing session on a [`SimulatedSite`]
pub struct SimulatedSession {
    site: Arc<SiteMap>,
    path: Option<String>,
    pending: Option<(String, u32)>,
    closed: bool,
}

impl SimulatedSession {
    fn ensure_open(&self) -> NavResult<()> {
        if self.closed {
            return Err(NavError::Driver("session is closed".to_string()));
        }
        Ok(())
    }

    fn current_links(&self) -> &[SimLink] {
        self.path
            .as_ref()
            .and_then(|p| self.site.pages.get(p))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn matching<'a>(&'a self, selector: &str) -> impl Iterator<Item = &'a SimLink> + 'a {
        let selector = selector.to_string();
        self.current_links()
            .iter()
            .filter(move |l| Locator::href(l.href.as_str()).selector() == selector)
    }
}

#[async_trait]
impl PageSession for SimulatedSession {
    async fn goto(&mut self, path: &str) -> NavResult<()> {
        self.ensure_open()?;
        self.path = Some(path.to_string());
        self.pending = None;
        Ok(())
    }

    async fn count(&mut self, selector: &str) -> NavResult<usize> {
        self.ensure_open()?;
        Ok(self.matching(selector).count())
    }

    async fn click(&mut self, selector: &str) -> NavResult<()> {
        self.ensure_open()?;
        let link = self
            .matching(selector)
            .next()
            .cloned()
            .ok_or_else(|| NavError::Driver(format!("no element matches {}", selector)))?;

        if let Some(target) = link.target {
            self.pending = Some((target, link.delay_polls));
        }
        Ok(())
    }

    async fn location(&mut self) -> NavResult<String> {
        self.ensure_open()?;

        if let Some((target, remaining)) = self.pending.take() {
            if remaining == 0 {
                self.path = Some(target);
            } else {
                self.pending = Some((target, remaining - 1));
            }
        }

        Ok(match &self.path {
            Some(path) => format!("{}{}", self.site.base_url, path),
            None => "about:blank".to_string(),
        })
    }

    async fn close(&mut self) -> NavResult<()> {
        self.closed = true;
        Ok(())
    }
}
