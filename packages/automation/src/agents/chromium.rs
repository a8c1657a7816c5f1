//! Chromium DevTools browser agent.
//!
//! Drives a map search page: type the query, submit, then walk the results
//! feed and read each detail panel. All page knowledge (URL, selectors, label
//! prefixes) lives here.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{AgentError, AgentResult};
use crate::traits::{AgentSession, BrowserAgent, DetailFields, Probe, SearchSession};
use crate::types::{ScrapeQuery, Target};

pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com.br/maps";

const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

mod selectors {
    pub const SEARCH_BOX: &str = "#searchboxinput";
    pub const SEARCH_BUTTON: &str = "#searchbox-searchbutton > span";
    pub const RESULTS_FEED: &str = r#"div[role="feed"]"#;
    pub const RESULT_LINKS: &str =
        r#"div[role="feed"] > div:nth-child(odd) > [jsaction] a:not(.bm892c):not(.A1zNzb)"#;
    pub const TITLE: &str = "h1.DUwDvf.lfPIob";
    pub const PHONE: &str = r#"button[aria-label^="Telefone:"]"#;
    pub const WEBSITE: &str = "div > div:nth-child(7) > div:nth-child(5) > a";
}

const PHONE_LABEL: &str = "Telefone: ";
const WEBSITE_LABEL: &str = "Website: ";

/// Launch options for [`ChromiumBrowser`].
#[derive(Debug, Clone)]
pub struct ChromiumConfig {
    pub headless: bool,
    pub search_url: String,
    pub user_agent: String,
    pub window: (u32, u32),
}

impl Default for ChromiumConfig {
    fn default() -> Self {
        Self {
            headless: false,
            search_url: DEFAULT_SEARCH_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            window: (1200, 800),
        }
    }
}

/// Launches one Chromium instance per session.
#[derive(Debug, Clone, Default)]
pub struct ChromiumBrowser {
    config: ChromiumConfig,
}

impl ChromiumBrowser {
    pub fn new(config: ChromiumConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrowserAgent for ChromiumBrowser {
    async fn open(&self) -> AgentResult<Box<dyn SearchSession>> {
        let (width, height) = self.config.window;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .no_sandbox()
            .arg("--disable-setuid-sandbox");
        if !self.config.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| AgentError::Unavailable(format!("invalid browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AgentError::Unavailable(format!("failed to launch browser: {}", e)))?;

        // The handler must be polled for the browser to make progress.
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(AgentError::Unavailable(format!("failed to open page: {}", e)));
            }
        };
        if let Err(e) = page
            .set_user_agent(SetUserAgentOverrideParams::new(self.config.user_agent.clone()))
            .await
        {
            debug!(error = %e, "could not set user agent");
        }
        let headers = Headers::new(serde_json::json!({ "Accept-Language": ACCEPT_LANGUAGE }));
        if let Err(e) = page.execute(SetExtraHttpHeadersParams::new(headers)).await {
            debug!(error = %e, "could not set extra headers");
        }

        info!(headless = self.config.headless, "browser launched");
        Ok(Box::new(ChromiumSearchSession {
            browser,
            page,
            handler,
            search_url: self.config.search_url.clone(),
            before_click: PanelMark::default(),
        }))
    }
}

/// One browser window driven through a single search.
pub struct ChromiumSearchSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    search_url: String,
    before_click: PanelMark,
}

/// What the detail panel showed when the last result was clicked.
///
/// The previous place's panel stays on screen while the next one loads, so
/// the title selector alone cannot tell the two apart.
#[derive(Debug, Clone, Default)]
struct PanelMark {
    title: Option<String>,
    href: Option<String>,
}

impl ChromiumSearchSession {
    async fn exists(&self, selector: &str) -> bool {
        self.page.find_element(selector).await.is_ok()
    }

    async fn links(&self) -> AgentResult<Vec<Element>> {
        self.page
            .find_elements(selectors::RESULT_LINKS)
            .await
            .map_err(|e| AgentError::NotFound(format!("result links: {}", e)))
    }

    async fn title(&self) -> Option<String> {
        let element = self.page.find_element(selectors::TITLE).await.ok()?;
        element.inner_text().await.ok().flatten()
    }

    async fn attribute(&self, selector: &str, name: &str) -> Option<String> {
        let element = self.page.find_element(selector).await.ok()?;
        element.attribute(name).await.ok().flatten()
    }
}

/// Strip a display label such as `"Telefone: "` from an aria-label value.
fn strip_label(value: String, label: &str) -> String {
    match value.strip_prefix(label) {
        Some(rest) => rest.to_string(),
        None => value,
    }
}

/// Whether the panel now shows the place opened by the last click.
fn panel_switched(title: Option<&str>, url: Option<&str>, before: &PanelMark) -> bool {
    let Some(title) = title else {
        return false;
    };
    if before.title.as_deref() != Some(title) {
        return true;
    }
    // Same title as before the click: wait until the page points at the clicked place.
    match (url, before.href.as_deref()) {
        (Some(url), Some(href)) => without_query(url) == without_query(href),
        _ => false,
    }
}

fn without_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// Identifier for a result link: its href, or its position when it has none.
fn link_id(href: Option<String>, index: usize) -> String {
    href.filter(|h| !h.is_empty())
        .unwrap_or_else(|| format!("result-{}", index))
}

#[async_trait]
impl AgentSession for ChromiumSearchSession {
    async fn release(&mut self) -> AgentResult<()> {
        let closed = self.browser.close().await;
        self.handler.abort();
        closed
            .map(|_| ())
            .map_err(|e| AgentError::interaction(format!("browser close: {}", e)))
    }
}

#[async_trait]
impl SearchSession for ChromiumSearchSession {
    async fn search(&mut self, query: &ScrapeQuery) -> AgentResult<()> {
        self.page
            .goto(self.search_url.as_str())
            .await
            .map_err(AgentError::interaction)?;

        let text = query.search_text();
        self.page
            .find_element(selectors::SEARCH_BOX)
            .await
            .map_err(|e| AgentError::NotFound(format!("search box: {}", e)))?
            .click()
            .await
            .map_err(AgentError::interaction)?
            .type_str(&text)
            .await
            .map_err(AgentError::interaction)?;

        self.page
            .find_element(selectors::SEARCH_BUTTON)
            .await
            .map_err(|e| AgentError::NotFound(format!("search button: {}", e)))?
            .click()
            .await
            .map_err(AgentError::interaction)?;

        debug!(search = %text, "search submitted");
        Ok(())
    }

    async fn probe(&mut self, probe: Probe) -> AgentResult<bool> {
        match probe {
            Probe::ResultsFeed => Ok(self.exists(selectors::RESULTS_FEED).await),
            Probe::DetailView => {
                let title = self.title().await;
                let url = self.page.url().await.ok().flatten();
                Ok(panel_switched(
                    title.as_deref(),
                    url.as_deref(),
                    &self.before_click,
                ))
            }
        }
    }

    async fn locate_targets(&mut self) -> AgentResult<Vec<String>> {
        let links = self.links().await?;

        let mut ids = Vec::with_capacity(links.len());
        for (index, link) in links.iter().enumerate() {
            let href = link.attribute("href").await.ok().flatten();
            ids.push(link_id(href, index));
        }
        Ok(ids)
    }

    async fn select_target(&mut self, target: &Target) -> AgentResult<()> {
        // Opening a detail panel can re-render the feed, so look the link up again.
        let links = self.links().await?;

        let mut chosen = None;
        for (index, link) in links.iter().enumerate() {
            let href = link.attribute("href").await.ok().flatten();
            if link_id(href.clone(), index) == target.resolved {
                chosen = Some((link, href));
                break;
            }
        }

        let (link, href) = match chosen {
            Some(found) => found,
            None => match links.get(target.index) {
                Some(link) => (link, link.attribute("href").await.ok().flatten()),
                None => return Err(AgentError::NotFound(format!("result {}", target))),
            },
        };

        self.before_click = PanelMark {
            title: self.title().await,
            href,
        };
        link.click().await.map_err(AgentError::interaction)?;
        Ok(())
    }

    async fn extract_fields(&mut self) -> AgentResult<DetailFields> {
        let title = self.title().await;

        let phone = self
            .attribute(selectors::PHONE, "aria-label")
            .await
            .map(|p| strip_label(p, PHONE_LABEL));

        let website = self
            .attribute(selectors::WEBSITE, "aria-label")
            .await
            .map(|w| strip_label(w, WEBSITE_LABEL));

        Ok(DetailFields {
            title,
            phone,
            website,
        })
    }
}
