//! Testing utilities including mock agents.
//!
//! These drive the pipelines without a real browser or messaging client.
//! Every mock records its calls and counts session releases so tests can
//! assert on lifecycle as well as results.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::cancel::CancellationController;
use crate::error::{AgentError, AgentResult};
use crate::traits::{
    AgentSession, BrowserAgent, DetailFields, Messenger, MessengerSession, Probe, SearchSession,
};
use crate::types::{ScrapeQuery, Target};

/// Arms a controller once a mock has seen `after` interactions.
#[derive(Debug, Clone)]
struct CancelHook {
    after: usize,
    controller: CancellationController,
}

impl CancelHook {
    fn fire_at(hook: &Option<CancelHook>, seen: usize) {
        if let Some(hook) = hook {
            if seen == hook.after {
                hook.controller.request_cancel();
            }
        }
    }
}

// ============================================================================
// Browser
// ============================================================================

/// Record of a call made to a mock search session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBrowserCall {
    Open,
    Search { text: String },
    LocateTargets,
    Select { target: String },
    Extract,
    Release,
}

/// A mock browser serving a fixed result list.
///
/// Results are identified by name; each may carry [`DetailFields`] that are
/// returned when that result is selected.
#[derive(Clone)]
pub struct MockBrowser {
    results: Vec<String>,
    details: HashMap<String, DetailFields>,
    feed_ready: bool,
    open_error: Option<String>,
    fail_select: HashSet<String>,
    fail_extract: HashSet<String>,
    panic_on: Option<String>,
    panel_delay: usize,
    cancel: Option<CancelHook>,

    /// Call tracking
    calls: Arc<RwLock<Vec<MockBrowserCall>>>,
    releases: Arc<AtomicUsize>,
}

impl Default for MockBrowser {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            details: HashMap::new(),
            feed_ready: true,
            open_error: None,
            fail_select: HashSet::new(),
            fail_extract: HashSet::new(),
            panic_on: None,
            panel_delay: 0,
            cancel: None,
            calls: Arc::new(RwLock::new(Vec::new())),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result with the fields its detail view shows.
    pub fn with_result(mut self, name: impl Into<String>, fields: DetailFields) -> Self {
        let name = name.into();
        self.results.push(name.clone());
        self.details.insert(name, fields);
        self
    }

    /// Add a result whose detail view shows only a title equal to its name.
    pub fn with_titled(self, name: impl Into<String>) -> Self {
        let name = name.into();
        let fields = DetailFields {
            title: Some(name.clone()),
            ..Default::default()
        };
        self.with_result(name, fields)
    }

    /// The results container never appears.
    pub fn feed_never_ready(mut self) -> Self {
        self.feed_ready = false;
        self
    }

    /// `open` fails as if the browser could not be launched.
    pub fn unavailable(mut self, reason: impl Into<String>) -> Self {
        self.open_error = Some(reason.into());
        self
    }

    pub fn fail_select(mut self, name: impl Into<String>) -> Self {
        self.fail_select.insert(name.into());
        self
    }

    pub fn fail_extract(mut self, name: impl Into<String>) -> Self {
        self.fail_extract.insert(name.into());
        self
    }

    /// Panic while selecting `name`.
    pub fn panic_on(mut self, name: impl Into<String>) -> Self {
        self.panic_on = Some(name.into());
        self
    }

    /// After each selection the previous detail panel stays on screen for
    /// `polls` detail-view checks before the selected one replaces it.
    pub fn slow_detail_panel(mut self, polls: usize) -> Self {
        self.panel_delay = polls;
        self
    }

    /// Request cancellation on `controller` right after the `after`-th selection.
    /// With `after == 0` cancellation fires as soon as the search is submitted.
    pub fn cancel_after(mut self, after: usize, controller: CancellationController) -> Self {
        self.cancel = Some(CancelHook { after, controller });
        self
    }

    /// Get all calls made to sessions of this browser.
    pub fn calls(&self) -> Vec<MockBrowserCall> {
        self.calls.read().unwrap().clone()
    }

    /// Number of targets selected across all sessions.
    pub fn selections(&self) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, MockBrowserCall::Select { .. }))
            .count()
    }

    /// Number of sessions released.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserAgent for MockBrowser {
    async fn open(&self) -> AgentResult<Box<dyn SearchSession>> {
        self.calls.write().unwrap().push(MockBrowserCall::Open);

        if let Some(reason) = &self.open_error {
            return Err(AgentError::Unavailable(reason.clone()));
        }

        Ok(Box::new(MockSearchSession {
            script: self.clone(),
            searched: false,
            selected: None,
            showing: None,
            loading: 0,
            selections: 0,
        }))
    }
}

/// A session opened by [`MockBrowser`].
pub struct MockSearchSession {
    script: MockBrowser,
    searched: bool,
    /// Result most recently clicked.
    selected: Option<String>,
    /// Result whose detail panel is on screen.
    showing: Option<String>,
    /// Detail-view checks left before `selected` replaces `showing`.
    loading: usize,
    selections: usize,
}

impl MockSearchSession {
    fn record(&self, call: MockBrowserCall) {
        self.script.calls.write().unwrap().push(call);
    }
}

#[async_trait]
impl AgentSession for MockSearchSession {
    async fn release(&mut self) -> AgentResult<()> {
        self.record(MockBrowserCall::Release);
        self.script.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl SearchSession for MockSearchSession {
    async fn search(&mut self, query: &ScrapeQuery) -> AgentResult<()> {
        self.record(MockBrowserCall::Search {
            text: query.search_text(),
        });
        self.searched = true;
        CancelHook::fire_at(&self.script.cancel, 0);
        Ok(())
    }

    async fn probe(&mut self, probe: Probe) -> AgentResult<bool> {
        Ok(match probe {
            Probe::ResultsFeed => self.searched && self.script.feed_ready,
            Probe::DetailView => {
                if self.loading > 0 {
                    self.loading -= 1;
                } else if self.selected.is_some() {
                    self.showing = self.selected.clone();
                }
                self.selected.is_some() && self.showing == self.selected
            }
        })
    }

    async fn locate_targets(&mut self) -> AgentResult<Vec<String>> {
        self.record(MockBrowserCall::LocateTargets);
        Ok(self.script.results.clone())
    }

    async fn select_target(&mut self, target: &Target) -> AgentResult<()> {
        self.record(MockBrowserCall::Select {
            target: target.resolved.clone(),
        });
        self.selections += 1;
        self.selected = None;

        if self.script.panic_on.as_deref() == Some(target.resolved.as_str()) {
            panic!("mock browser crashed on {}", target.resolved);
        }

        let result = if self.script.fail_select.contains(&target.resolved) {
            Err(AgentError::NotFound(format!("result {}", target.resolved)))
        } else {
            self.selected = Some(target.resolved.clone());
            self.loading = self.script.panel_delay;
            Ok(())
        };

        CancelHook::fire_at(&self.script.cancel, self.selections);
        result
    }

    async fn extract_fields(&mut self) -> AgentResult<DetailFields> {
        self.record(MockBrowserCall::Extract);

        // Reads whatever panel is on screen, stale or not
        let Some(name) = &self.showing else {
            return Err(AgentError::NotFound("detail view".to_string()));
        };
        if self.script.fail_extract.contains(name) {
            return Err(AgentError::Interaction(format!("could not read {}", name)));
        }

        Ok(self.script.details.get(name).cloned().unwrap_or_default())
    }
}

// ============================================================================
// Messenger
// ============================================================================

/// Record of a call made to a mock messenger session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockMessengerCall {
    Connect,
    IsRegistered { number: String },
    Send { number: String, text: String },
    Release,
}

/// A mock messaging client. Every number is registered unless marked otherwise.
#[derive(Clone, Default)]
pub struct MockMessenger {
    unregistered: HashSet<String>,
    fail_check: HashSet<String>,
    fail_send: HashSet<String>,
    unavailable: Option<String>,
    cancel: Option<CancelHook>,

    /// Call tracking
    calls: Arc<RwLock<Vec<MockMessengerCall>>>,
    releases: Arc<AtomicUsize>,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unregistered(mut self, number: impl Into<String>) -> Self {
        self.unregistered.insert(number.into());
        self
    }

    /// The registration lookup for `number` errors.
    pub fn fail_check(mut self, number: impl Into<String>) -> Self {
        self.fail_check.insert(number.into());
        self
    }

    pub fn fail_send(mut self, number: impl Into<String>) -> Self {
        self.fail_send.insert(number.into());
        self
    }

    /// `connect` fails as if the client never became ready.
    pub fn unavailable(mut self, reason: impl Into<String>) -> Self {
        self.unavailable = Some(reason.into());
        self
    }

    /// Request cancellation on `controller` after the `after`-th registration check.
    pub fn cancel_after(mut self, after: usize, controller: CancellationController) -> Self {
        self.cancel = Some(CancelHook { after, controller });
        self
    }

    pub fn calls(&self) -> Vec<MockMessengerCall> {
        self.calls.read().unwrap().clone()
    }

    /// Messages accepted, as `(number, text)` pairs.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                MockMessengerCall::Send { number, text } if !self.fail_send.contains(number) => {
                    Some((number.clone(), text.clone()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn connect(&self) -> AgentResult<Box<dyn MessengerSession>> {
        self.calls.write().unwrap().push(MockMessengerCall::Connect);

        if let Some(reason) = &self.unavailable {
            return Err(AgentError::Unavailable(reason.clone()));
        }

        Ok(Box::new(MockMessengerSession {
            script: self.clone(),
            checks: 0,
        }))
    }
}

/// A session opened by [`MockMessenger`].
pub struct MockMessengerSession {
    script: MockMessenger,
    checks: usize,
}

impl MockMessengerSession {
    fn record(&self, call: MockMessengerCall) {
        self.script.calls.write().unwrap().push(call);
    }
}

#[async_trait]
impl AgentSession for MockMessengerSession {
    async fn release(&mut self) -> AgentResult<()> {
        self.record(MockMessengerCall::Release);
        self.script.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl MessengerSession for MockMessengerSession {
    async fn is_registered(&mut self, number: &str) -> AgentResult<bool> {
        self.record(MockMessengerCall::IsRegistered {
            number: number.to_string(),
        });
        self.checks += 1;
        CancelHook::fire_at(&self.script.cancel, self.checks);

        if self.script.fail_check.contains(number) {
            return Err(AgentError::Interaction("lookup timed out".to_string()));
        }
        Ok(!self.script.unregistered.contains(number))
    }

    async fn send_message(&mut self, number: &str, text: &str) -> AgentResult<()> {
        self.record(MockMessengerCall::Send {
            number: number.to_string(),
            text: text.to_string(),
        });

        if self.script.fail_send.contains(number) {
            return Err(AgentError::Interaction("message rejected".to_string()));
        }
        Ok(())
    }
}
