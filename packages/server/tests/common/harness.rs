//! Test harness driving the Axum router with mock agents.
//!
//! No browser, bridge or network is involved: the router is called in-process
//! with `tower::ServiceExt::oneshot` and exports land in a temporary directory.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, HeaderMap, Method, Request, StatusCode},
    Router,
};
use automation::testing::{MockBrowser, MockMessenger};
use automation::{CsvExporter, JobRunner, MessagingSettings, Pacer, ScrapeSettings};
use serde_json::Value;
use server_core::kernel::ServerDeps;
use server_core::server::{build_app, AppState};
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tower::ServiceExt;

/// A response collected into memory.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body should be JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("response body should be UTF-8")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Test harness that manages test infrastructure.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let response = ctx.get("/health").await;
///     // ... test code
/// }
/// ```
pub struct TestHarness {
    pub app: Router,
    /// Same runner the router uses; lets tests observe the job slot.
    pub runner: JobRunner,
    pub browser: MockBrowser,
    pub messenger: MockMessenger,
    pub export_dir: TempDir,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::with_agents(MockBrowser::new(), MockMessenger::new())
    }

    async fn teardown(self) {
        // Export directory is removed on drop
    }
}

impl TestHarness {
    /// Build a router around the given mocks with millisecond timings.
    pub fn with_agents(browser: MockBrowser, messenger: MockMessenger) -> Self {
        Self::with_runner(JobRunner::new(), browser, messenger)
    }

    /// Like [`TestHarness::with_agents`], sharing `runner` with the router so
    /// mocks can be wired to its cancellation controller.
    pub fn with_runner(runner: JobRunner, browser: MockBrowser, messenger: MockMessenger) -> Self {
        Self::build(runner, browser, messenger, false)
    }

    /// Like [`TestHarness::with_agents`], but the exporter writes into a path
    /// occupied by a plain file, so every export fails.
    pub fn with_blocked_export(browser: MockBrowser) -> Self {
        Self::build(JobRunner::new(), browser, MockMessenger::new(), true)
    }

    fn build(
        runner: JobRunner,
        browser: MockBrowser,
        messenger: MockMessenger,
        block_export: bool,
    ) -> Self {
        // Uses try_init() to avoid panicking if already initialized.
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let export_dir = tempfile::tempdir().expect("Failed to create export dir");
        let export_path = if block_export {
            let blocker = export_dir.path().join("blocked");
            std::fs::write(&blocker, b"not a directory").expect("Failed to create blocker");
            blocker
        } else {
            export_dir.path().to_path_buf()
        };

        let scrape_settings = ScrapeSettings {
            results_timeout: Duration::from_millis(50),
            detail_timeout: Duration::from_millis(20),
            poll_interval: Duration::from_millis(5),
            pacing: Pacer::new(Duration::from_millis(1)),
            ..Default::default()
        };
        let messaging_settings = MessagingSettings {
            pacing: Pacer::new(Duration::from_millis(1)),
        };

        let deps = ServerDeps::new(
            Arc::new(browser.clone()),
            Arc::new(messenger.clone()),
            Arc::new(CsvExporter::new(export_path)),
            scrape_settings,
            messaging_settings,
        );
        let state = AppState {
            deps: Arc::new(deps),
            runner: runner.clone(),
        };

        Self {
            app: build_app(state, &[]),
            runner,
            browser,
            messenger,
            export_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body")
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn post_json(&self, path: &str, body: Value) -> TestResponse {
        self.post_raw(path, body.to_string()).await
    }

    pub async fn post_raw(&self, path: &str, body: impl Into<String>) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.into()))
            .expect("valid request");
        self.send(request).await
    }

    pub async fn post_empty(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .body(Body::empty())
            .expect("valid request");
        self.send(request).await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .uri(path)
            .body(Body::empty())
            .expect("valid request");
        self.send(request).await
    }

    /// Wait until a Job holds the slot.
    pub async fn wait_until_busy(&self) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !self.runner.is_busy() {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("job never started");
    }

    /// Files currently in the export directory.
    pub fn exported_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.export_dir.path())
            .expect("export dir exists")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
