use std::time::Duration;

use palaver_model::{ErrorKind, ImageAttachment, ModelPart, ModelRole};
use palaver_test_model::{PresetResponse, TestModelProvider};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use super::*;
use crate::RetryPolicy;
use crate::conversation::Role;
use crate::store::{KeyValueStore, MemoryStore};
use crate::{FIRST_VISIT_KEY, LAST_VISIT_KEY};

const WINDOW: Duration = Duration::from_millis(300);

struct Harness {
    orchestrator: Orchestrator,
    provider: TestModelProvider,
    config: OrchestratorConfig,
    idle_rx: mpsc::UnboundedReceiver<()>,
    change_rx: mpsc::UnboundedReceiver<StateChange>,
}

impl Harness {
    fn new(provider: TestModelProvider) -> Self {
        let config = OrchestratorConfig {
            retry_policy: RetryPolicy::new(
                3,
                Duration::from_millis(100),
                2.0,
            ),
            debounce_window: WINDOW,
            ..Default::default()
        };
        Self::with_config(provider, config)
    }

    fn with_config(
        provider: TestModelProvider,
        config: OrchestratorConfig,
    ) -> Self {
        let (idle_tx, idle_rx) = mpsc::unbounded_channel();
        let (change_tx, change_rx) = mpsc::unbounded_channel();
        let orchestrator =
            OrchestratorBuilder::with_model_provider(provider.clone())
                .with_config(config.clone())
                .on_idle(move || {
                    idle_tx.send(()).ok();
                })
                .on_state_change(move |change| {
                    change_tx.send(change.clone()).ok();
                })
                .build();
        Self {
            orchestrator,
            provider,
            config,
            idle_rx,
            change_rx,
        }
    }

    async fn wait_idle(&mut self) {
        timeout(Duration::from_secs(60), self.idle_rx.recv())
            .await
            .unwrap()
            .unwrap();
    }

    async fn snapshot(&self) -> ConversationSnapshot {
        self.orchestrator.snapshot().await.unwrap()
    }

    fn drain_changes(&mut self) -> Vec<StateChange> {
        let mut changes = vec![];
        while let Ok(change) = self.change_rx.try_recv() {
            changes.push(change);
        }
        changes
    }
}

fn last_turn_text(provider: &TestModelProvider) -> String {
    let calls = provider.calls();
    let last = calls.last().unwrap().request.messages.last().unwrap();
    match &last.parts[0] {
        ModelPart::Text(text) => text.clone(),
        ModelPart::Image(_) => panic!("expected a text part first"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_seeded_greeting() {
    let harness = Harness::new(TestModelProvider::default());
    let snapshot = harness.snapshot().await;
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].role(), Role::Assistant);
    assert_eq!(
        snapshot.messages[0].text(),
        harness.config.introduction_greeting
    );
    assert!(!snapshot.busy);
}

#[tokio::test(start_paused = true)]
async fn test_each_exchange_adds_two_messages() {
    let mut provider = TestModelProvider::default();
    for answer in ["Jambo!", "Sawubona!", "Akwaaba!"] {
        provider.add_response(PresetResponse::with_text(answer));
    }
    let mut harness = Harness::new(provider);

    for (i, input) in ["Hello", "How do you greet in Zulu?", "And Twi?"]
        .into_iter()
        .enumerate()
    {
        harness.orchestrator.submit_text(input);
        harness.wait_idle().await;

        let snapshot = harness.snapshot().await;
        assert_eq!(snapshot.messages.len(), 1 + 2 * (i + 1));
        assert!(!snapshot.busy);

        let user = &snapshot.messages[snapshot.messages.len() - 2];
        assert_eq!(user.role(), Role::User);
        assert_eq!(user.text(), input);
    }

    let snapshot = harness.snapshot().await;
    assert_eq!(snapshot.messages.last().unwrap().text(), "Akwaaba!");
    assert_eq!(harness.provider.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_request_carries_prior_history() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_text("First answer"));
    provider.add_response(PresetResponse::with_text("Second answer"));
    let mut harness = Harness::new(provider);

    harness.orchestrator.submit_text("First question");
    harness.wait_idle().await;
    harness.orchestrator.submit_text("  Second question  ");
    harness.wait_idle().await;

    let calls = harness.provider.calls();
    let turns = &calls[1].request.messages;
    let texts: Vec<_> = turns
        .iter()
        .map(|turn| match &turn.parts[0] {
            ModelPart::Text(text) => text.as_str(),
            ModelPart::Image(_) => "<image>",
        })
        .collect();
    assert_eq!(
        texts,
        [
            harness.config.system_instruction().as_str(),
            harness.config.acknowledgement.as_str(),
            harness.config.introduction_greeting.as_str(),
            "First question",
            "First answer",
            "Second question",
        ]
    );
    let roles: Vec<_> = turns.iter().map(|turn| turn.role).collect();
    assert_eq!(
        roles,
        [
            ModelRole::User,
            ModelRole::Assistant,
            ModelRole::Assistant,
            ModelRole::User,
            ModelRole::Assistant,
            ModelRole::User,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_blank_input_is_ignored() {
    let mut harness = Harness::new(TestModelProvider::default());

    harness.orchestrator.submit_text("");
    sleep(WINDOW * 2).await;
    harness.orchestrator.submit_text("   ");
    sleep(WINDOW * 2).await;

    let snapshot = harness.snapshot().await;
    assert_eq!(snapshot.messages.len(), 1);
    assert!(!snapshot.busy);
    assert_eq!(harness.provider.call_count(), 0);
    assert!(harness.drain_changes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_blank_quick_action_is_ignored() {
    let mut harness = Harness::new(TestModelProvider::default());

    harness.orchestrator.submit_quick_action("   ", "   ");
    sleep(WINDOW * 2).await;
    harness.orchestrator.submit_quick_action("Proverb", "");
    sleep(WINDOW * 2).await;
    harness.orchestrator.submit_quick_action("", "Tell me a proverb.");
    sleep(WINDOW * 2).await;

    let snapshot = harness.snapshot().await;
    assert_eq!(snapshot.messages.len(), 1);
    assert!(!snapshot.busy);
    assert_eq!(harness.provider.call_count(), 0);
    assert!(harness.drain_changes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rapid_submits_collapse() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_text("Hello to you"));
    provider.add_response(PresetResponse::with_text("unused"));
    let mut harness = Harness::new(provider);

    harness.orchestrator.submit_text("hello");
    sleep(Duration::from_millis(50)).await;
    harness.orchestrator.submit_text("hello");
    harness.wait_idle().await;

    // Nothing else should be pending.
    sleep(WINDOW * 4).await;
    assert!(harness.idle_rx.try_recv().is_err());
    assert_eq!(harness.provider.call_count(), 1);
    assert_eq!(harness.snapshot().await.messages.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_burst_uses_last_call() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_text("Answer"));
    let mut harness = Harness::new(provider);

    harness.orchestrator.submit_text("draft");
    harness.orchestrator.submit_text("final");
    harness.wait_idle().await;

    let snapshot = harness.snapshot().await;
    assert_eq!(snapshot.messages[1].text(), "final");
    assert_eq!(last_turn_text(&harness.provider), "final");
}

#[tokio::test(start_paused = true)]
async fn test_submit_while_busy_is_dropped() {
    let mut provider = TestModelProvider::default();
    provider.set_delay(Duration::from_secs(5));
    provider.add_response(PresetResponse::with_text("Slow answer"));
    provider.add_response(PresetResponse::with_text("unused"));
    let mut harness = Harness::new(provider);

    harness.orchestrator.submit_text("first");
    sleep(WINDOW * 2).await;
    assert!(harness.snapshot().await.busy);

    harness.orchestrator.submit_text("second");
    harness
        .orchestrator
        .submit_quick_action("Proverb", "Tell me a proverb.");
    harness.wait_idle().await;
    sleep(WINDOW * 2).await;

    let snapshot = harness.snapshot().await;
    assert_eq!(snapshot.messages.len(), 3);
    assert!(!snapshot.busy);
    assert_eq!(harness.provider.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_busy_notifications() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_text("Answer"));
    let mut harness = Harness::new(provider);

    harness.orchestrator.submit_text("Question");
    harness.wait_idle().await;

    let changes = harness.drain_changes();
    assert_eq!(changes.len(), 4);
    assert!(matches!(
        &changes[0],
        StateChange::MessageAppended(msg) if msg.text() == "Question"
    ));
    assert_eq!(changes[1], StateChange::BusyChanged(true));
    assert!(matches!(
        &changes[2],
        StateChange::MessageAppended(msg) if msg.text() == "Answer"
    ));
    assert_eq!(changes[3], StateChange::BusyChanged(false));
}

#[tokio::test(start_paused = true)]
async fn test_quick_action_sends_prompt() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_text("Jollof rice: ..."));
    let mut harness = Harness::new(provider);

    harness.orchestrator.submit_quick_action(
        "Suggest a dish",
        "Suggest a traditional African dish with its main ingredients.",
    );
    harness.wait_idle().await;

    let snapshot = harness.snapshot().await;
    assert_eq!(snapshot.messages.len(), 3);
    assert_eq!(snapshot.messages[1].text(), "Suggest a dish");
    assert_eq!(snapshot.messages[2].text(), "Jollof rice: ...");
    assert_eq!(
        last_turn_text(&harness.provider),
        "Suggest a traditional African dish with its main ingredients."
    );
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_fallback() {
    let mut provider = TestModelProvider::default();
    provider
        .add_response(PresetResponse::always_failing(ErrorKind::RateLimited));
    let mut harness = Harness::new(provider);

    harness.orchestrator.submit_text("Hello");
    harness.wait_idle().await;

    let snapshot = harness.snapshot().await;
    assert_eq!(harness.provider.call_count(), 3);
    assert_eq!(snapshot.messages.len(), 3);
    let reply = &snapshot.messages[2];
    assert_eq!(reply.role(), Role::Assistant);
    assert_eq!(reply.text(), harness.config.fallbacks.rate_limited);
    assert!(!snapshot.busy);
}

#[tokio::test(start_paused = true)]
async fn test_terminal_failure_fallbacks() {
    let fallbacks = OrchestratorConfig::default().fallbacks;
    let cases = [
        (ErrorKind::MalformedResponse, &fallbacks.unexpected_response),
        (ErrorKind::Unauthorized, &fallbacks.connection_issue),
        (ErrorKind::NetworkFailure, &fallbacks.unreachable),
        (
            ErrorKind::ConfigurationMissing,
            &fallbacks.configuration_missing,
        ),
    ];
    for (kind, expected) in cases {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::always_failing(kind));
        let mut harness = Harness::new(provider);

        harness.orchestrator.submit_text("Hello");
        harness.wait_idle().await;

        let snapshot = harness.snapshot().await;
        assert_eq!(snapshot.messages.len(), 3, "{kind:?}");
        assert_eq!(snapshot.messages[2].text(), expected.as_str());
        assert_eq!(harness.provider.call_count(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_image_flow_on_failure() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::always_failing(
        ErrorKind::NetworkFailure,
    ));
    let mut harness = Harness::new(provider);
    let image = ImageAttachment::new(mime::IMAGE_JPEG, &b"\xff\xd8\xff"[..]);

    harness.orchestrator.stage_image(image.clone());
    assert!(harness.snapshot().await.has_staged_image);

    harness.orchestrator.submit_image(None);
    harness.wait_idle().await;

    let snapshot = harness.snapshot().await;
    assert!(!snapshot.has_staged_image);
    assert_eq!(snapshot.messages.len(), 3);

    let user = &snapshot.messages[1];
    assert_eq!(user.role(), Role::User);
    assert_eq!(user.text(), harness.config.default_image_caption);
    assert_eq!(user.image(), Some(&image));
    assert_eq!(
        snapshot.messages[2].text(),
        harness.config.fallbacks.unreachable
    );

    let changes = harness.drain_changes();
    assert_eq!(changes[0], StateChange::ImageStaged);
    assert!(changes.contains(&StateChange::ImageCleared));
}

#[tokio::test(start_paused = true)]
async fn test_image_request_payload() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_text("A kente cloth."));
    let mut harness = Harness::new(provider);
    let image = ImageAttachment::new(mime::IMAGE_PNG, &b"\x89PNG"[..]);

    harness.orchestrator.stage_image(image.clone());
    harness.orchestrator.submit_image(Some("What pattern is this?".into()));
    harness.wait_idle().await;

    let calls = harness.provider.calls();
    let last = calls[0].request.messages.last().unwrap();
    assert_eq!(
        last.parts,
        vec![
            ModelPart::Text(
                harness.config.image_prompt(Some("What pattern is this?"))
            ),
            ModelPart::Image(image),
        ]
    );
    let snapshot = harness.snapshot().await;
    assert_eq!(snapshot.messages[1].text(), "What pattern is this?");
}

#[tokio::test(start_paused = true)]
async fn test_submit_image_without_staged_image() {
    let harness = Harness::new(TestModelProvider::default());

    harness.orchestrator.submit_image(Some("Anything?".to_owned()));
    sleep(WINDOW * 2).await;

    assert_eq!(harness.snapshot().await.messages.len(), 1);
    assert_eq!(harness.provider.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_clear_staged_image() {
    let mut harness = Harness::new(TestModelProvider::default());
    let image = ImageAttachment::new(mime::IMAGE_PNG, &b"\x89PNG"[..]);

    harness.orchestrator.stage_image(image);
    harness.orchestrator.clear_staged_image();
    assert!(!harness.snapshot().await.has_staged_image);
    assert_eq!(
        harness.drain_changes(),
        [StateChange::ImageStaged, StateChange::ImageCleared]
    );

    harness.orchestrator.submit_image(None);
    sleep(WINDOW * 2).await;
    assert_eq!(harness.provider.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_returning_greeting() {
    let store = MemoryStore::default();
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
        .to_string();
    store.set(FIRST_VISIT_KEY, &now);
    store.set(LAST_VISIT_KEY, &now);

    let config = OrchestratorConfig::default();
    let orchestrator =
        OrchestratorBuilder::with_model_provider(TestModelProvider::default())
            .with_config(config.clone())
            .with_store(store)
            .build();
    let snapshot = orchestrator.snapshot().await.unwrap();
    assert_eq!(snapshot.messages[0].text(), config.returning_greeting);
}
