//! Full-loop session tests against in-memory stores and a scripted provider.

use std::sync::Arc;

use uuid::Uuid;

use docket_agent::actions::{default_registry, ActionContext};
use docket_agent::llm::ScriptedClient;
use docket_agent::{LlmClient, MemoryLog, ProviderGateway, SessionRuntime, TurnOutcome};
use docket_core::domain::FirmId;
use docket_db::repositories::{
    CaseRepository, ClientRepository, EventRepository, HearingRepository,
    InMemoryCaseRepository, InMemoryClientRepository, InMemoryDocumentRepository,
    InMemoryEventRepository, InMemoryHearingRepository, InMemoryTranscriptRepository,
};

struct Harness {
    runtime: SessionRuntime,
    firm: FirmId,
    clients: Arc<InMemoryClientRepository>,
    cases: Arc<InMemoryCaseRepository>,
    hearings: Arc<InMemoryHearingRepository>,
    events: Arc<InMemoryEventRepository>,
}

impl Harness {
    async fn turn(&mut self, text: &str) -> TurnOutcome {
        self.runtime.handle_message(text).await.expect("turn should not fail")
    }
}

async fn harness_with(llm: ScriptedClient) -> Harness {
    let firm = FirmId(Uuid::new_v4());
    let clients = Arc::new(InMemoryClientRepository::default());
    let cases = Arc::new(InMemoryCaseRepository::default());
    let hearings = Arc::new(InMemoryHearingRepository::default());
    let documents = Arc::new(InMemoryDocumentRepository::default());
    let events = Arc::new(InMemoryEventRepository::default());

    let llm: Arc<dyn LlmClient> = Arc::new(llm);
    let gateway = ProviderGateway::with_client(Arc::clone(&llm));
    let transcript = MemoryLog::open(firm, Arc::new(InMemoryTranscriptRepository::default()))
        .await
        .expect("open transcript");
    let context = ActionContext {
        firm,
        clients: clients.clone(),
        cases: cases.clone(),
        hearings: hearings.clone(),
        documents,
        events: events.clone(),
        llm,
    };
    let runtime =
        SessionRuntime::new("Studio Bianchi", gateway, transcript, default_registry(), context);

    Harness { runtime, firm, clients, cases, hearings, events }
}

async fn harness(replies: &[&str]) -> Harness {
    harness_with(ScriptedClient::new(replies.to_vec())).await
}

#[tokio::test]
async fn a_lookup_runs_without_confirmation() {
    let mut h = harness(&[r#"{"action": "list_cases", "params": {}}"#]).await;

    let outcome = h.turn("what cases do we have?").await;
    let TurnOutcome::ActionsCompleted { lines, .. } = outcome else {
        panic!("expected actions, got {outcome:?}");
    };
    assert!(lines.join("\n").contains("no cases on file"));
    assert!(h.runtime.pending_confirmation().is_none());
}

#[tokio::test]
async fn a_mutation_waits_for_yes_and_then_runs_once() {
    let mut h = harness(&[
        r#"{"action": "create_client", "params": {"name": "Maria Rossi", "tax_id": "27334445559"}, "message": "Register Maria Rossi as a client?"}"#,
    ])
    .await;

    let outcome = h.turn("add maria rossi, tax id 27334445559").await;
    assert_eq!(
        outcome,
        TurnOutcome::ConfirmationRequested {
            prompt: "Register Maria Rossi as a client?".to_string()
        }
    );
    assert!(h.clients.search(&h.firm, "Maria").await.expect("search").is_empty());

    // The script is exhausted, so reaching the provider here would error.
    let outcome = h.turn("yes").await;
    let TurnOutcome::ActionsCompleted { lines, follow_up } = outcome else {
        panic!("expected actions, got {outcome:?}");
    };
    assert!(lines.join("\n").contains("Registered client Maria Rossi"));
    assert!(follow_up.is_none());
    assert_eq!(h.clients.search(&h.firm, "Maria").await.expect("search").len(), 1);
}

#[tokio::test]
async fn declining_leaves_the_store_untouched() {
    let mut h = harness(&[
        r#"{"action": "create_client", "params": {"name": "Maria Rossi"}, "message": "Register Maria Rossi as a client?"}"#,
    ])
    .await;

    h.turn("add maria rossi").await;
    let outcome = h.turn("no").await;

    let TurnOutcome::Reply { text } = outcome else {
        panic!("expected a reply, got {outcome:?}");
    };
    assert!(text.contains("Cancelled `create_client`"));
    assert!(h.clients.search(&h.firm, "Maria").await.expect("search").is_empty());
    assert!(h.runtime.pending_confirmation().is_none());
}

#[tokio::test]
async fn an_unrelated_turn_keeps_the_proposal_parked() {
    let mut h = harness(&[
        r#"{"action": "create_event", "params": {"title": "File the appeal", "event_date": "2026-09-01"}, "message": "Add the filing deadline to the agenda?"}"#,
        r#"{"action": "list_cases", "params": {}}"#,
    ])
    .await;

    h.turn("remind me to file the appeal by sept 1").await;
    let outcome = h.turn("what cases do we have?").await;
    assert!(matches!(outcome, TurnOutcome::ActionsCompleted { .. }));
    assert!(h.runtime.pending_confirmation().is_some());

    let outcome = h.turn("yes").await;
    let TurnOutcome::ActionsCompleted { lines, .. } = outcome else {
        panic!("expected actions, got {outcome:?}");
    };
    assert!(lines.join("\n").contains("File the appeal"));
    assert_eq!(h.events.list(&h.firm).await.expect("list").len(), 1);
}

#[tokio::test]
async fn a_newer_proposal_replaces_the_parked_one() {
    let mut h = harness(&[
        r#"{"action": "create_event", "params": {"title": "File the appeal", "event_date": "2026-09-01"}, "message": "Add the deadline?"}"#,
        r#"{"action": "create_client", "params": {"name": "Maria Rossi"}, "message": "Register Maria Rossi as a client?"}"#,
    ])
    .await;

    h.turn("remind me to file the appeal by sept 1").await;
    let outcome = h.turn("actually first register maria rossi").await;
    assert_eq!(
        outcome,
        TurnOutcome::ConfirmationRequested {
            prompt: "Register Maria Rossi as a client?".to_string()
        }
    );

    h.turn("yes").await;
    assert_eq!(h.clients.search(&h.firm, "Maria").await.expect("search").len(), 1);
    assert!(h.events.list(&h.firm).await.expect("list").is_empty());
}

#[tokio::test]
async fn each_chained_step_asks_for_its_own_confirmation() {
    let mut h = harness(&[
        r#"{"action": "create_client", "params": {"name": "Maria Rossi", "case": {"number": "123/2026", "title": "Rossi v. Lago"}}, "message": "Register Maria Rossi and open case 123/2026?"}"#,
    ])
    .await;

    let outcome = h.turn("register maria rossi and open case 123/2026 for her").await;
    assert!(matches!(outcome, TurnOutcome::ConfirmationRequested { .. }));

    // The first yes runs the client step only; the case is re-proposed.
    let outcome = h.turn("yes").await;
    let TurnOutcome::ActionsCompleted { lines, follow_up } = outcome else {
        panic!("expected actions, got {outcome:?}");
    };
    assert!(lines.join("\n").contains("Registered client Maria Rossi"));
    assert!(follow_up.expect("chained step proposed").contains("create_case"));
    assert!(h.cases.find_by_number(&h.firm, "123/2026").await.expect("lookup").is_none());
    assert!(h.runtime.pending_confirmation().is_some());

    // The second yes runs the case, carrying the generated client id.
    let outcome = h.turn("yes").await;
    let TurnOutcome::ActionsCompleted { lines, follow_up } = outcome else {
        panic!("expected actions, got {outcome:?}");
    };
    assert!(lines.join("\n").contains("Opened case 123/2026 for Maria Rossi"));
    assert!(follow_up.is_none());

    let case = h
        .cases
        .find_by_number(&h.firm, "123/2026")
        .await
        .expect("lookup")
        .expect("case stored");
    let owners = h.clients.search(&h.firm, "Maria Rossi").await.expect("search");
    assert_eq!(case.client_id, owners[0].id);
}

#[tokio::test]
async fn declining_a_chained_step_keeps_what_already_ran() {
    let mut h = harness(&[
        r#"{"action": "create_client", "params": {"name": "Maria Rossi", "case": {"number": "123/2026"}}, "message": "Register Maria Rossi and open case 123/2026?"}"#,
    ])
    .await;

    h.turn("register maria rossi and open her case").await;
    h.turn("yes").await;
    let outcome = h.turn("no").await;

    let TurnOutcome::Reply { text } = outcome else {
        panic!("expected a reply, got {outcome:?}");
    };
    assert!(text.contains("Cancelled `create_case`"));
    assert_eq!(h.clients.search(&h.firm, "Maria Rossi").await.expect("search").len(), 1);
    assert!(h.cases.find_by_number(&h.firm, "123/2026").await.expect("lookup").is_none());
    assert!(h.runtime.pending_confirmation().is_none());
}

#[tokio::test]
async fn a_failed_step_is_diagnosed_for_the_user() {
    let mut h = harness(&[
        r#"{"action": "create_hearing", "params": {"case_number": "0099/2026", "scheduled_for": "2026-09-12 09:30"}, "message": "Schedule the hearing?"}"#,
    ])
    .await;

    h.turn("schedule a hearing for case 0099/2026").await;
    let outcome = h.turn("yes").await;

    let TurnOutcome::ActionsCompleted { lines, follow_up } = outcome else {
        panic!("expected actions, got {outcome:?}");
    };
    let text = lines.join("\n");
    assert!(text.contains("case 0099/2026 was not found"));
    assert!(text.contains("Create case 0099/2026 first"));
    assert!(follow_up.is_none());
    assert!(h.hearings.list(&h.firm).await.expect("list").is_empty());
}

#[tokio::test]
async fn provider_failures_come_back_as_plain_text() {
    let mut h = harness_with(ScriptedClient::erroring("boom llm down")).await;

    let outcome = h.turn("hello?").await;
    assert_eq!(outcome, TurnOutcome::Reply { text: "boom llm down".to_string() });
}

#[tokio::test]
async fn a_stray_yes_is_just_conversation() {
    let mut h = harness(&["Happy to help. What would you like to do?"]).await;

    let outcome = h.turn("yes").await;
    let TurnOutcome::Reply { text } = outcome else {
        panic!("expected a reply, got {outcome:?}");
    };
    assert!(text.contains("Happy to help"));
}

#[tokio::test]
async fn session_startup_skips_dead_backends() {
    let candidates: Vec<Arc<dyn LlmClient>> = vec![
        Arc::new(ScriptedClient::unreachable()),
        Arc::new(ScriptedClient::new(["Good morning."]).with_tag("healthy")),
    ];
    let gateway = ProviderGateway::select(candidates).await.expect("one healthy backend");
    assert_eq!(gateway.provider_tag(), "healthy");
}
