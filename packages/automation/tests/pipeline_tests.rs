//! Integration tests for the scraping and messaging pipelines.
//!
//! These run both pipelines end to end against the mock agents and check:
//! 1. The agent session is released exactly once on every exit path
//! 2. Cancellation stops the Job between targets
//! 3. Per-target failures are recorded without aborting the Job
//! 4. The scraping aggregate is exported only when the Job completes

use std::sync::Arc;
use std::time::Duration;

use automation::testing::{MockBrowser, MockBrowserCall, MockMessenger, MockMessengerCall};
use automation::{
    AgentError, CsvExporter, DetailFields, JobRunner, JobStatus, MessageBatch, MessagingPipeline,
    MessagingSettings, Outcome, Pacer, PipelineError, ScrapePipeline, ScrapeQuery, ScrapeRun,
    ScrapeSettings,
};
use tempfile::TempDir;

fn fast_scrape_settings() -> ScrapeSettings {
    ScrapeSettings {
        results_timeout: Duration::from_millis(50),
        detail_timeout: Duration::from_millis(20),
        poll_interval: Duration::from_millis(5),
        pacing: Pacer::new(Duration::from_millis(1)),
        ..Default::default()
    }
}

fn fast_messaging_settings() -> MessagingSettings {
    MessagingSettings {
        pacing: Pacer::new(Duration::from_millis(1)),
    }
}

fn padaria_query() -> ScrapeQuery {
    ScrapeQuery::new(
        Some("padaria".to_string()),
        Some("Sao Paulo".to_string()),
        Some("SP".to_string()),
    )
    .unwrap()
}

fn fields(title: Option<&str>, phone: Option<&str>, website: Option<&str>) -> DetailFields {
    DetailFields {
        title: title.map(String::from),
        phone: phone.map(String::from),
        website: website.map(String::from),
    }
}

fn scrape_pipeline(browser: &MockBrowser, dir: &TempDir) -> ScrapePipeline {
    ScrapePipeline::new(
        Arc::new(browser.clone()),
        Arc::new(CsvExporter::new(dir.path())),
        fast_scrape_settings(),
    )
}

fn batch(numbers: &[&str]) -> MessageBatch {
    MessageBatch::new(
        Some("Olá!".to_string()),
        Some(numbers.iter().map(|n| n.to_string()).collect()),
        None,
    )
    .unwrap()
}

// ============================================================================
// Scraping
// ============================================================================

#[tokio::test]
async fn test_scrape_end_to_end_exports_deduplicated_listings() {
    let dir = tempfile::tempdir().unwrap();
    let browser = MockBrowser::new()
        .with_result(
            "place/1",
            fields(Some("Padaria Central"), Some("Telefone fixo (11) 3333-4444"), None),
        )
        .with_result("place/2", fields(None, None, None))
        .with_result(
            "place/3",
            fields(Some("Pão Quente"), Some("(11) 98888-7777"), Some("paoquente.com.br")),
        );
    let pipeline = scrape_pipeline(&browser, &dir);
    let runner = JobRunner::new();
    let job = runner.begin().unwrap();

    let run = pipeline.run(&job, &padaria_query()).await.unwrap();

    let ScrapeRun::Exported { report, export } = run else {
        panic!("expected an export");
    };
    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.interactions, 3);
    assert_eq!(report.counts.succeeded, 2);
    assert_eq!(report.counts.skipped, 1);
    assert_eq!(report.aggregate.len(), 2);

    assert_eq!(export.file_name, "padaria_Sao Paulo_SP.csv");
    assert_eq!(export.rows, 2);
    let written = std::fs::read_to_string(dir.path().join("padaria_Sao Paulo_SP.csv")).unwrap();
    assert_eq!(
        written,
        "Título,Telefone,Website\n\
         Padaria Central,551133334444,\n\
         Pão Quente,5511988887777,paoquente.com.br\n"
    );
    assert_eq!(browser.releases(), 1);
}

#[tokio::test]
async fn test_scrape_session_released_before_export() {
    let dir = tempfile::tempdir().unwrap();
    let browser = MockBrowser::new().with_titled("A");
    let pipeline = scrape_pipeline(&browser, &dir);
    let runner = JobRunner::new();
    let job = runner.begin().unwrap();

    pipeline.run(&job, &padaria_query()).await.unwrap();

    let calls = browser.calls();
    assert_eq!(calls.first(), Some(&MockBrowserCall::Open));
    assert_eq!(calls.last(), Some(&MockBrowserCall::Release));
    assert!(calls.contains(&MockBrowserCall::Search {
        text: "padaria em Sao Paulo, SP".to_string()
    }));
}

#[tokio::test]
async fn test_scrape_duplicate_titles_keep_first() {
    let dir = tempfile::tempdir().unwrap();
    let browser = MockBrowser::new()
        .with_result("place/1", fields(Some("Padaria"), Some("1111"), None))
        .with_result("place/2", fields(Some("Padaria"), Some("2222"), None));
    let pipeline = scrape_pipeline(&browser, &dir);
    let runner = JobRunner::new();
    let job = runner.begin().unwrap();

    let run = pipeline.run(&job, &padaria_query()).await.unwrap();

    let report = run.report();
    assert_eq!(report.interactions, 2);
    assert_eq!(report.aggregate.len(), 1);
    assert_eq!(
        report.aggregate.entries()[0].phone.as_deref(),
        Some("551111")
    );
}

#[tokio::test]
async fn test_scrape_target_failures_do_not_abort() {
    let dir = tempfile::tempdir().unwrap();
    let browser = MockBrowser::new()
        .with_titled("A")
        .with_titled("B")
        .with_titled("C")
        .fail_select("A")
        .fail_extract("B");
    let pipeline = scrape_pipeline(&browser, &dir);
    let runner = JobRunner::new();
    let job = runner.begin().unwrap();

    let run = pipeline.run(&job, &padaria_query()).await.unwrap();

    let report = run.report();
    assert_eq!(report.interactions, 3);
    assert_eq!(report.counts.failed, 2);
    assert_eq!(report.counts.succeeded, 1);
    assert!(matches!(
        &report.records[0].outcome,
        Outcome::Failed { reason } if reason.starts_with("select failed")
    ));
    assert!(matches!(
        &report.records[1].outcome,
        Outcome::Failed { reason } if reason.starts_with("extract failed")
    ));
    assert_eq!(report.aggregate.entries()[0].title, "C");
    assert_eq!(browser.releases(), 1);
}

#[tokio::test]
async fn test_scrape_feed_timeout_is_discovery_error() {
    let dir = tempfile::tempdir().unwrap();
    let browser = MockBrowser::new().with_titled("A").feed_never_ready();
    let pipeline = scrape_pipeline(&browser, &dir);
    let runner = JobRunner::new();
    let job = runner.begin().unwrap();

    let result = pipeline.run(&job, &padaria_query()).await;

    assert!(matches!(result, Err(PipelineError::Discovery { .. })));
    assert_eq!(browser.selections(), 0);
    assert_eq!(browser.releases(), 1);
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_scrape_browser_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let browser = MockBrowser::new().unavailable("no chromium binary");
    let pipeline = scrape_pipeline(&browser, &dir);
    let runner = JobRunner::new();
    let job = runner.begin().unwrap();

    let result = pipeline.run(&job, &padaria_query()).await;

    assert!(matches!(
        result,
        Err(PipelineError::Agent(AgentError::Unavailable(_)))
    ));
    assert_eq!(browser.releases(), 0);
}

#[tokio::test]
async fn test_scrape_cancel_during_discovery_interacts_with_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let runner = JobRunner::new();
    let browser = MockBrowser::new()
        .with_titled("A")
        .with_titled("B")
        .cancel_after(0, runner.cancellation().clone());
    let pipeline = scrape_pipeline(&browser, &dir);
    let job = runner.begin().unwrap();

    let run = pipeline.run(&job, &padaria_query()).await.unwrap();

    assert!(matches!(run, ScrapeRun::Cancelled { .. }));
    assert_eq!(run.report().interactions, 0);
    assert_eq!(browser.selections(), 0);
    assert_eq!(browser.releases(), 1);
}

#[tokio::test]
async fn test_scrape_cancel_after_two_of_five() {
    let dir = tempfile::tempdir().unwrap();
    let runner = JobRunner::new();
    let browser = MockBrowser::new()
        .with_titled("A")
        .with_titled("B")
        .with_titled("C")
        .with_titled("D")
        .with_titled("E")
        .cancel_after(2, runner.cancellation().clone());
    let pipeline = scrape_pipeline(&browser, &dir);
    let job = runner.begin().unwrap();

    let run = pipeline.run(&job, &padaria_query()).await.unwrap();

    let ScrapeRun::Cancelled { report } = run else {
        panic!("expected cancellation");
    };
    assert_eq!(report.status, JobStatus::Cancelled);
    assert_eq!(report.interactions, 2);
    assert_eq!(report.aggregate.len(), 2);
    assert_eq!(browser.selections(), 2);
    assert_eq!(browser.releases(), 1);
    // No export for a cancelled Job
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_scrape_panic_still_releases_session() {
    let dir = tempfile::tempdir().unwrap();
    let browser = MockBrowser::new()
        .with_titled("A")
        .with_titled("B")
        .panic_on("B");
    let pipeline = scrape_pipeline(&browser, &dir);
    let runner = JobRunner::new();
    let job = runner.begin().unwrap();

    let handle = tokio::spawn(async move {
        let _ = pipeline.run(&job, &padaria_query()).await;
    });
    let joined = handle.await;

    assert!(joined.unwrap_err().is_panic());
    assert_eq!(browser.releases(), 1);
    assert!(!runner.is_busy());
}

#[tokio::test]
async fn test_scrape_distinct_results_survive_slow_detail_panel() {
    let dir = tempfile::tempdir().unwrap();
    let browser = MockBrowser::new()
        .with_titled("Padaria A")
        .with_titled("Padaria B")
        .with_titled("Padaria C")
        .slow_detail_panel(3);
    let settings = ScrapeSettings {
        detail_timeout: Duration::from_secs(1),
        ..fast_scrape_settings()
    };
    let pipeline = ScrapePipeline::new(
        Arc::new(browser.clone()),
        Arc::new(CsvExporter::new(dir.path())),
        settings,
    );
    let runner = JobRunner::new();
    let job = runner.begin().unwrap();

    let run = pipeline.run(&job, &padaria_query()).await.unwrap();

    let report = run.report();
    assert_eq!(report.counts.succeeded, 3);
    let titles: Vec<&str> = report
        .aggregate
        .entries()
        .iter()
        .map(|l| l.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Padaria A", "Padaria B", "Padaria C"]);
}

#[tokio::test]
async fn test_scrape_export_failure_after_release() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("exports");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let browser = MockBrowser::new().with_titled("A");
    let pipeline = ScrapePipeline::new(
        Arc::new(browser.clone()),
        Arc::new(CsvExporter::new(&blocker)),
        fast_scrape_settings(),
    );
    let runner = JobRunner::new();
    let job = runner.begin().unwrap();

    let result = pipeline.run(&job, &padaria_query()).await;

    assert!(matches!(result, Err(PipelineError::Export(_))));
    assert_eq!(browser.releases(), 1);
    assert_eq!(browser.calls().last(), Some(&MockBrowserCall::Release));
}

#[tokio::test]
async fn test_scrape_empty_results_exports_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let browser = MockBrowser::new();
    let pipeline = scrape_pipeline(&browser, &dir);
    let runner = JobRunner::new();
    let job = runner.begin().unwrap();

    let run = pipeline.run(&job, &padaria_query()).await.unwrap();

    let ScrapeRun::Exported { report, export } = run else {
        panic!("expected an export");
    };
    assert_eq!(report.interactions, 0);
    assert_eq!(export.rows, 0);
    let written = std::fs::read_to_string(&export.path).unwrap();
    assert_eq!(written, "Título,Telefone,Website\n");
}

// ============================================================================
// Messaging
// ============================================================================

#[tokio::test]
async fn test_messaging_skips_and_failures_continue() {
    let messenger = MockMessenger::new()
        .unregistered("5511922222222")
        .fail_send("5511933333333");
    let pipeline = MessagingPipeline::new(Arc::new(messenger.clone()), fast_messaging_settings());
    let runner = JobRunner::new();
    let job = runner.begin().unwrap();

    let report = pipeline
        .run(
            &job,
            &batch(&[
                "+55 11 91111-1111",
                "5511922222222",
                "not a number",
                "5511933333333",
                "5511944444444",
            ]),
        )
        .await
        .unwrap();

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.interactions, 5);
    assert_eq!(report.counts.succeeded, 2);
    assert_eq!(report.counts.skipped, 2);
    assert_eq!(report.counts.failed, 1);
    assert_eq!(report.records[1].outcome, Outcome::skipped("not registered"));
    assert_eq!(report.records[2].outcome, Outcome::skipped("invalid number"));
    assert!(matches!(
        &report.records[3].outcome,
        Outcome::Failed { reason } if reason.starts_with("send failed")
    ));

    assert_eq!(
        messenger.sent(),
        vec![
            ("5511911111111".to_string(), "Olá!".to_string()),
            ("5511944444444".to_string(), "Olá!".to_string()),
        ]
    );
    assert_eq!(messenger.releases(), 1);
}

#[tokio::test]
async fn test_messaging_registration_error_is_failure() {
    let messenger = MockMessenger::new().fail_check("5511911111111");
    let pipeline = MessagingPipeline::new(Arc::new(messenger.clone()), fast_messaging_settings());
    let runner = JobRunner::new();
    let job = runner.begin().unwrap();

    let report = pipeline
        .run(&job, &batch(&["5511911111111", "5511922222222"]))
        .await
        .unwrap();

    assert!(matches!(
        &report.records[0].outcome,
        Outcome::Failed { reason } if reason.starts_with("registration check failed")
    ));
    assert!(report.records[1].outcome.is_success());
    assert!(!messenger
        .calls()
        .contains(&MockMessengerCall::Send {
            number: "5511911111111".to_string(),
            text: "Olá!".to_string(),
        }));
}

#[tokio::test]
async fn test_messaging_duplicate_numbers_counted_once_in_aggregate() {
    let messenger = MockMessenger::new();
    let pipeline = MessagingPipeline::new(Arc::new(messenger.clone()), fast_messaging_settings());
    let runner = JobRunner::new();
    let job = runner.begin().unwrap();

    let report = pipeline
        .run(&job, &batch(&["5511911111111", "(55) 11 91111-1111"]))
        .await
        .unwrap();

    assert_eq!(report.interactions, 2);
    assert_eq!(report.aggregate.len(), 1);
    assert_eq!(messenger.sent().len(), 2);
}

#[tokio::test]
async fn test_messaging_client_unavailable() {
    let messenger = MockMessenger::new().unavailable("auth failure");
    let pipeline = MessagingPipeline::new(Arc::new(messenger.clone()), fast_messaging_settings());
    let runner = JobRunner::new();
    let job = runner.begin().unwrap();

    let result = pipeline.run(&job, &batch(&["5511911111111"])).await;

    assert!(matches!(
        result,
        Err(PipelineError::Agent(AgentError::Unavailable(_)))
    ));
    assert_eq!(messenger.calls(), vec![MockMessengerCall::Connect]);
    assert_eq!(messenger.releases(), 0);
}

#[tokio::test]
async fn test_messaging_cancel_after_one_of_three() {
    let runner = JobRunner::new();
    let messenger = MockMessenger::new().cancel_after(1, runner.cancellation().clone());
    let pipeline = MessagingPipeline::new(Arc::new(messenger.clone()), fast_messaging_settings());
    let job = runner.begin().unwrap();

    let report = pipeline
        .run(
            &job,
            &batch(&["5511911111111", "5511922222222", "5511933333333"]),
        )
        .await
        .unwrap();

    assert!(report.is_cancelled());
    assert_eq!(report.interactions, 1);
    assert_eq!(messenger.sent().len(), 1);
    assert_eq!(messenger.releases(), 1);
}

#[tokio::test]
async fn test_messaging_cancel_interrupts_pacing() {
    let runner = JobRunner::new();
    let messenger = MockMessenger::new().cancel_after(1, runner.cancellation().clone());
    let settings = MessagingSettings {
        pacing: Pacer::new(Duration::from_secs(30)),
    };
    let pipeline = MessagingPipeline::new(Arc::new(messenger.clone()), settings);
    let job = runner.begin().unwrap();

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        pipeline.run(&job, &batch(&["5511911111111", "5511922222222"])),
    )
    .await
    .expect("pacing should end on cancel")
    .unwrap();

    assert!(report.is_cancelled());
    assert_eq!(report.interactions, 1);
}

#[tokio::test]
async fn test_messaging_batch_interval_overrides_settings() {
    let messenger = MockMessenger::new();
    let settings = MessagingSettings {
        pacing: Pacer::new(Duration::from_secs(30)),
    };
    let pipeline = MessagingPipeline::new(Arc::new(messenger.clone()), settings);
    let runner = JobRunner::new();
    let job = runner.begin().unwrap();

    let batch = MessageBatch::new(
        Some("oi".to_string()),
        Some(vec!["5511911111111".to_string(), "5511922222222".to_string()]),
        Some(1.0),
    )
    .unwrap();

    let report = tokio::time::timeout(Duration::from_secs(5), pipeline.run(&job, &batch))
        .await
        .expect("batch interval should be used")
        .unwrap();

    assert_eq!(report.counts.succeeded, 2);
}
