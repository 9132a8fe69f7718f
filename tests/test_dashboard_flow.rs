//! End-to-end flows: the event loop, effect executor and synthetic provider
//! wired together and drawn on an in-memory terminal.
//!
//! Tokio time is paused, so scripted delays advance the clock only once every
//! spawned effect is idle. That makes the interleaving deterministic.

use async_trait::async_trait;
use ratatui::{Terminal, backend::TestBackend};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

use kmet::dashboard::{Dashboard, DashboardSettings, Event, Key};
use kmet::domain::{MetricsSource, NamespaceScope, NodeSnapshot, PodSnapshot, ViewMode};
use kmet::error::ProviderError;
use kmet::provider::SyntheticProvider;
use kmet::trend::TrendCapacity;
use kmet::tui::{EffectExecutor, run_dashboard};

/// Step of a scripted session: wait, then post an event
type Step = (Duration, Event);

fn key(c: char) -> Event {
    Event::Key(Key::Char(c))
}

fn after(ms: u64, event: Event) -> Step {
    (Duration::from_millis(ms), event)
}

fn screen(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    let area = buffer.area;
    let mut out = String::new();
    for y in 0..area.height {
        for x in 0..area.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

/// Run a dashboard against the synthetic provider, feeding `script` as it goes
async fn run_script(settings: DashboardSettings, script: Vec<Step>) -> (Dashboard, String) {
    let provider = Arc::new(SyntheticProvider::with_seed(11, TrendCapacity::new(20)));
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let executor = EffectExecutor::new(
        provider.clone(),
        provider,
        events_tx.clone(),
        Duration::from_secs(1),
    );
    let (_shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
    events_tx
        .send(Event::Resize {
            width: 120,
            height: 40,
        })
        .unwrap();

    let driver = async {
        for (delay, event) in script {
            tokio::time::sleep(delay).await;
            events_tx.send(event).unwrap();
        }
    };

    let (result, ()) = tokio::join!(
        run_dashboard(
            &mut terminal,
            Dashboard::new(settings),
            &executor,
            events_rx,
            shutdown_rx
        ),
        driver
    );
    let dashboard = result.unwrap();
    let screen = screen(&terminal);
    (dashboard, screen)
}

#[tokio::test(start_paused = true)]
async fn test_first_poll_fills_table() {
    let (dashboard, screen) =
        run_script(DashboardSettings::default(), vec![after(300, key('q'))]).await;

    assert!(dashboard.is_quitting());
    assert_eq!(dashboard.pods().len(), 4);
    assert_eq!(
        dashboard.namespace_candidates(),
        ["default", "staging", "kube-system"]
    );
    assert!(dashboard.last_error().is_none());
    assert!(screen.contains("api-7cfb9d9c9c-9tghd (api)"));
    assert!(screen.contains("view: Pods"));
}

#[tokio::test(start_paused = true)]
async fn test_pods_sorted_by_cpu_then_memory() {
    let (dashboard, _) = run_script(
        DashboardSettings::default(),
        vec![after(300, key('s')), after(300, key('q'))],
    )
    .await;

    let pods = dashboard.pods();
    assert!(
        pods.windows(2)
            .all(|w| w[0].memory_bytes >= w[1].memory_bytes),
        "sorted by memory after toggling"
    );
}

#[tokio::test(start_paused = true)]
async fn test_trends_accumulate_across_ticks() {
    let settings = DashboardSettings {
        refresh_interval: Duration::from_millis(500),
        ..DashboardSettings::default()
    };
    let (dashboard, _) = run_script(settings, vec![after(2600, key('q'))]).await;

    // Initial poll plus five ticks
    let pod = dashboard.selected_pod().unwrap();
    assert!(pod.cpu_trend.len() >= 5, "trend len {}", pod.cpu_trend.len());
}

#[tokio::test(start_paused = true)]
async fn test_node_view_switch() {
    let (dashboard, screen) = run_script(
        DashboardSettings::default(),
        vec![after(300, Event::Key(Key::Tab)), after(300, key('q'))],
    )
    .await;

    assert_eq!(dashboard.view(), ViewMode::Nodes);
    assert_eq!(dashboard.nodes().len(), 5);
    assert!(screen.contains("view: Nodes"));
    assert!(screen.contains("ip-10-0-3-2"));
}

#[tokio::test(start_paused = true)]
async fn test_log_pane_streams_selected_pod() {
    let (dashboard, screen) = run_script(
        DashboardSettings::default(),
        vec![after(300, key('l')), after(1200, key('q'))],
    )
    .await;

    assert!(dashboard.panes().logs);
    assert!(dashboard.log_pane().len() >= 2);
    let first = &dashboard.log_pane().lines()[0];
    assert!(first.contains("request ok"), "line: {}", first);
    assert!(screen.contains("Logs: Pod default/"));
}

#[tokio::test(start_paused = true)]
async fn test_namespace_switch_cancels_log_stream() {
    let (dashboard, _) = run_script(
        DashboardSettings::default(),
        vec![
            after(300, key('l')),
            after(1200, key('n')),
            after(10, Event::Key(Key::Down)),
            after(10, Event::Key(Key::Enter)),
            // Long enough for several more synthetic lines had the stream survived
            after(2000, key('q')),
        ],
    )
    .await;

    assert_eq!(
        dashboard.namespace(),
        &NamespaceScope::Named("staging".to_string())
    );
    assert!(!dashboard.panes().logs);
    assert!(dashboard.subscription().is_none());
    assert!(dashboard.log_pane().is_empty());
    assert!(dashboard.pods().iter().all(|pod| pod.namespace == "staging"));
}

#[tokio::test(start_paused = true)]
async fn test_external_shutdown_stops_loop() {
    let provider = Arc::new(SyntheticProvider::with_seed(3, TrendCapacity::new(5)));
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let executor =
        EffectExecutor::new(provider.clone(), provider, events_tx, Duration::from_secs(1));
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

    shutdown_tx.send(()).await.unwrap();
    let dashboard = run_dashboard(
        &mut terminal,
        Dashboard::new(DashboardSettings::default()),
        &executor,
        events_rx,
        shutdown_rx,
    )
    .await
    .unwrap();

    assert!(!dashboard.is_quitting());
    assert!(executor.shutdown_token().is_cancelled());
}

/// Metrics source whose first pod listing dies without reporting back
struct CrashesOnce {
    calls: AtomicUsize,
}

#[async_trait]
impl MetricsSource for CrashesOnce {
    async fn list_namespaces(&self) -> Result<Vec<String>, ProviderError> {
        Ok(vec!["default".to_string()])
    }

    async fn list_pods(
        &self,
        _scope: &NamespaceScope,
        _selector: &str,
    ) -> Result<Vec<PodSnapshot>, ProviderError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("provider task crashed");
        }
        Ok(vec![PodSnapshot {
            namespace: "default".to_string(),
            name: "survivor".to_string(),
            cpu_millicores: 42,
            ..PodSnapshot::default()
        }])
    }

    async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>, ProviderError> {
        Ok(Vec::new())
    }
}

#[tokio::test(start_paused = true)]
async fn test_polling_resumes_after_a_poll_task_dies() {
    let metrics = Arc::new(CrashesOnce {
        calls: AtomicUsize::new(0),
    });
    let logs = Arc::new(SyntheticProvider::with_seed(5, TrendCapacity::new(5)));
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let executor = EffectExecutor::new(
        metrics.clone(),
        logs,
        events_tx.clone(),
        Duration::from_secs(1),
    );
    let (_shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
    let settings = DashboardSettings {
        refresh_interval: Duration::from_millis(200),
        ..DashboardSettings::default()
    };

    let driver = async {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        events_tx.send(key('q')).unwrap();
    };
    let (result, ()) = tokio::join!(
        run_dashboard(
            &mut terminal,
            Dashboard::new(settings),
            &executor,
            events_rx,
            shutdown_rx
        ),
        driver
    );
    let dashboard = result.unwrap();

    assert!(metrics.calls.load(Ordering::SeqCst) > 1);
    assert_eq!(dashboard.pods().len(), 1);
    assert_eq!(dashboard.pods()[0].name, "survivor");
    assert!(screen(&terminal).contains("survivor"));
}
