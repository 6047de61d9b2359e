//! End-to-end dialogue flows against scripted generation
//!
//! Engines are wired through `DialogueEngine::from_settings` with the
//! keyword classifier, so only generation is scripted.

use std::sync::Arc;
use std::time::Duration;

use kiosk_agent::{
    extract_department_or, replies, Agent, ConfirmField, DialogueEngine, FailureKind, KioskAgent,
    ReceptionStore, SideEffect, TurnEvent,
};
use kiosk_config::{ClassifierKind, Settings};
use kiosk_core::{ConversationState, ReceptionRecord, SubState};
use kiosk_llm::{LlmError, ScriptedBackend};

fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.dialogue.classifier = ClassifierKind::Keyword;
    settings
}

fn engine_with(backend: ScriptedBackend) -> Arc<DialogueEngine> {
    Arc::new(DialogueEngine::from_settings(
        &settings(),
        Arc::new(backend),
        Arc::new(ReceptionStore::new()),
    ))
}

async fn say(agent: &KioskAgent, utterances: &[&str]) {
    for utterance in utterances {
        let reply = agent.process(utterance).await;
        assert!(!reply.is_failure(), "turn {utterance:?} failed: {reply:?}");
    }
}

#[tokio::test]
async fn test_termination_from_every_state() {
    let engine = engine_with(ScriptedBackend::new());

    for state in ConversationState::ALL {
        for sub_state in [None, Some(SubState::AskName), Some(SubState::AskPhone)] {
            for phrase in ["종료", "고마워", " 종료. "] {
                let mut ctx = engine.new_context();
                ctx.state = state;
                ctx.sub_state = sub_state;
                ctx.retry_count = 2;
                ctx.profile.name = "홍길동".into();
                ctx.lookup.name = "홍길동".into();

                let out = engine.handle_turn(&ctx, phrase).await.unwrap();
                assert_eq!(out.context.state, ConversationState::Idle, "from {state}");
                assert_eq!(out.context.sub_state, None);
                assert_eq!(out.context.retry_count, 0);
                assert!(out.context.profile.is_empty());
                assert!(out.context.lookup.name.is_empty());
                assert_eq!(out.reply, replies::FAREWELL);
                assert!(out.side_effect.is_none());
            }
        }
    }
}

#[tokio::test]
async fn test_termination_inside_sentence_is_not_termination() {
    let engine = engine_with(ScriptedBackend::new());
    let mut ctx = engine.new_context();
    ctx.state = ConversationState::AskName;

    let out = engine.handle_turn(&ctx, "종료하면 안 돼요").await.unwrap();
    assert_eq!(out.context.state, ConversationState::ConfirmName);
}

#[tokio::test]
async fn test_three_negatives_escalate_in_every_loop() {
    let engine = engine_with(ScriptedBackend::new());

    for (field, value) in [
        (ConfirmField::Name, "홍길동"),
        (ConfirmField::Phone, "01012345678"),
        (ConfirmField::Address, "서울시 종로구"),
    ] {
        let mut ctx = engine.new_context();
        ctx.state = field.confirm_state();

        for attempt in 1..=3u32 {
            let out = engine.handle_turn(&ctx, "아니요").await.unwrap();
            assert!(out.context.retry_count <= 3);

            if attempt < 3 {
                assert_eq!(out.context.state, field.ask_state());
                assert_eq!(out.context.retry_count, attempt);
                ctx = engine.handle_turn(&out.context, value).await.unwrap().context;
                assert_eq!(ctx.state, field.confirm_state());
                assert_eq!(ctx.retry_count, attempt);
            } else {
                assert_eq!(out.context.state, ConversationState::Idle);
                assert_eq!(out.reply, replies::ESCALATION);
                assert_eq!(
                    out.events,
                    vec![TurnEvent::RetryBudgetExhausted { field, retries: 3 }]
                );
                // the next flow starts with a fresh budget
                assert_eq!(out.context.retry_count, 0);
            }
        }
    }
}

#[tokio::test]
async fn test_registration_scenario_replies() {
    let agent = KioskAgent::new("kiosk-1", engine_with(ScriptedBackend::new()));

    let reply = agent.process("접수").await;
    assert_eq!(reply.reply, "접수를 시작하겠습니다. 이름을 말씀해주세요.");
    assert_eq!(reply.state, ConversationState::AskName);

    let reply = agent.process("홍길동").await;
    assert_eq!(reply.reply, "홍길동님, 맞습니까?");
    assert_eq!(reply.state, ConversationState::ConfirmName);

    let reply = agent.process("아니요").await;
    assert_eq!(reply.reply, "다시 이름을 말씀해주세요.");
    assert_eq!(reply.state, ConversationState::AskName);
    assert_eq!(reply.retry_count, 1);

    agent.process("홍길동").await;
    let reply = agent.process("아니요").await;
    assert_eq!(reply.state, ConversationState::AskName);
    assert_eq!(reply.retry_count, 2);

    agent.process("홍길동").await;
    let reply = agent.process("아니요").await;
    assert_eq!(reply.reply, "입력 오류가 반복되었습니다. 직원을 호출하겠습니다.");
    assert_eq!(reply.state, ConversationState::Idle);
}

#[tokio::test]
async fn test_budget_is_per_loop() {
    let agent = KioskAgent::new("kiosk-1", engine_with(ScriptedBackend::new()));
    say(&agent, &["접수", "홍길동", "아니요", "홍길동", "아니요", "홍길동", "네"]).await;
    assert_eq!(agent.snapshot().await.retry_count, 0);

    // two rejections of the phone number do not escalate
    say(&agent, &["01012345678", "아니요", "01012345678", "아니요", "01012345678"]).await;
    let snapshot = agent.snapshot().await;
    assert_eq!(snapshot.state, ConversationState::ConfirmPhone);
    assert_eq!(snapshot.retry_count, 2);
}

#[tokio::test]
async fn test_direction_scenario() {
    let backend = ScriptedBackend::with_replies(["정형외과는 본관 3층 엘리베이터 왼쪽에 있습니다."]);
    let agent = KioskAgent::new("kiosk-1", engine_with(backend.clone()));

    let reply = agent.process("길찾기").await;
    assert_eq!(reply.state, ConversationState::FindDirection);
    assert_eq!(reply.reply, replies::DIRECTION_START);

    let reply = agent.process("정형외과").await;
    assert_eq!(reply.reply, "정형외과는 본관 3층 엘리베이터 왼쪽에 있습니다.");
    assert_eq!(reply.state, ConversationState::Idle);

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 2);
    assert_eq!(calls[0][1].content, "정형외과 어디에 있나요?");
}

#[tokio::test]
async fn test_lookup_on_empty_store_misses() {
    let agent = KioskAgent::new("kiosk-1", engine_with(ScriptedBackend::new()));

    let reply = agent.process("접수내역 확인").await;
    assert_eq!(reply.state, ConversationState::CheckReceipt);
    assert_eq!(reply.sub_state, Some(SubState::AskName));

    let reply = agent.process("홍길동").await;
    assert_eq!(reply.reply, "홍길동님, 전화번호를 말씀해주세요.");
    assert_eq!(reply.sub_state, Some(SubState::AskPhone));

    let reply = agent.process("01012345678").await;
    assert_eq!(reply.reply, "접수된 내역이 없습니다.");
    assert_eq!(reply.state, ConversationState::Idle);
    assert_eq!(reply.sub_state, None);
    assert_eq!(reply.events, vec![TurnEvent::LookupMiss]);
}

#[tokio::test]
async fn test_store_round_trip() {
    let store = ReceptionStore::new();
    store.put(
        "홍길동",
        "01012345678",
        ReceptionRecord::new("내과", "2025년 7월 29일", "오전 10시"),
    );

    let record = store.get("홍길동", "01012345678").unwrap();
    assert_eq!(record.department, "내과");
    assert_eq!(record.date, "2025년 7월 29일");
    assert_eq!(record.time, "오전 10시");
}

#[test]
fn test_department_extraction() {
    assert_eq!(
        extract_department_or("그런 증상은 신경과가 적절합니다.", "해당 진료과"),
        "신경과"
    );
    let fallback = extract_department_or("가까운 병원에 방문해 보세요.", "해당 진료과");
    assert_eq!(fallback, "해당 진료과");
}

#[tokio::test]
async fn test_full_registration_then_lookup() {
    let backend = ScriptedBackend::with_replies([
        "그런 증상은 내과가 적절합니다.",
        "홍길동님, 내과 접수가 완료되었습니다. 2층으로 가세요. 대기 시간은 약 15분입니다.",
    ]);
    let engine = engine_with(backend);
    let registrar = KioskAgent::new("kiosk-1", Arc::clone(&engine));

    say(
        &registrar,
        &["접수", "홍길동", "네", "01012345678", "네", "서울시 종로구", "네"],
    )
    .await;
    assert_eq!(registrar.snapshot().await.state, ConversationState::AskSymptom);

    let reply = registrar.process("배가 아프고 열이 나요").await;
    assert_eq!(reply.state, ConversationState::WaitTriageConfirm);
    assert_eq!(
        reply.reply,
        "그런 증상은 내과가 적절합니다.\n\n이 진료과로 접수해 드릴까요?"
    );

    let reply = registrar.process("네 해주세요").await;
    assert_eq!(reply.state, ConversationState::Idle);
    assert!(reply.reply.contains("접수가 완료"));
    assert!(matches!(
        reply.side_effect,
        Some(SideEffect::CommitReception { ref record, .. }) if record.department == "내과"
    ));

    // another session sees the committed record
    let visitor = KioskAgent::new("kiosk-2", engine);
    say(&visitor, &["접수내역", "홍길동"]).await;
    let reply = visitor.process("010-1234-5678").await;
    assert_eq!(
        reply.reply,
        "홍길동님은 2025년 7월 29일 오전 10시에 내과로 접수되어 있습니다."
    );
    assert_eq!(reply.events, vec![TurnEvent::LookupHit]);
}

#[tokio::test]
async fn test_triage_unsure_and_decline() {
    let backend = ScriptedBackend::with_replies(["이비인후과를 추천드립니다."]);
    let agent = KioskAgent::new("kiosk-1", engine_with(backend));
    say(
        &agent,
        &["접수", "홍길동", "네", "01012345678", "네", "서울시", "네", "목이 아파요"],
    )
    .await;

    let reply = agent.process("음...").await;
    assert_eq!(reply.reply, replies::TRIAGE_UNSURE);
    assert_eq!(reply.state, ConversationState::WaitTriageConfirm);

    let reply = agent.process("아니요").await;
    assert_eq!(reply.reply, replies::TRIAGE_DECLINED);
    assert_eq!(reply.state, ConversationState::Idle);
    assert!(agent.engine().store().is_empty());
}

#[tokio::test]
async fn test_generation_failure_is_recoverable() {
    let backend = ScriptedBackend::new();
    backend.push_error(LlmError::Api("model not found".into()));
    backend.push_reply("신경과를 추천드립니다.");
    let agent = KioskAgent::new("kiosk-1", engine_with(backend));
    say(
        &agent,
        &["접수", "홍길동", "네", "01012345678", "네", "서울시", "네"],
    )
    .await;
    let before = agent.snapshot().await;

    let reply = agent.process("머리가 아파요").await;
    assert_eq!(reply.reply, replies::TRY_AGAIN);
    assert_eq!(reply.failure.as_ref().map(|f| f.kind), Some(FailureKind::Generation));
    assert_eq!(agent.snapshot().await, before);

    let reply = agent.process("머리가 아파요").await;
    assert!(reply.failure.is_none());
    assert_eq!(reply.state, ConversationState::WaitTriageConfirm);
}

#[tokio::test]
async fn test_registration_commit_waits_for_generation() {
    let backend = ScriptedBackend::with_replies(["내과를 추천드립니다."]);
    let agent = KioskAgent::new("kiosk-1", engine_with(backend.clone()));
    say(
        &agent,
        &["접수", "홍길동", "네", "01012345678", "네", "서울시", "네", "열이 나요"],
    )
    .await;

    backend.push_error(LlmError::Network("connection refused".into()));
    let reply = agent.process("네").await;

    assert!(reply.is_failure());
    assert_eq!(reply.state, ConversationState::WaitTriageConfirm);
    assert!(agent.engine().store().is_empty());
}

#[tokio::test]
async fn test_generation_timeout_surfaces_typed_failure() {
    let mut settings = settings();
    settings.dialogue.generation_timeout_ms = 20;
    let backend = ScriptedBackend::new().with_delay(Duration::from_millis(300));
    let engine = Arc::new(DialogueEngine::from_settings(
        &settings,
        Arc::new(backend),
        Arc::new(ReceptionStore::new()),
    ));
    let agent = KioskAgent::new("kiosk-1", engine);

    agent.process("길찾기").await;
    let reply = agent.process("응급실").await;

    let failure = reply.failure.unwrap();
    assert_eq!(failure.kind, FailureKind::Timeout);
    assert_eq!(reply.state, ConversationState::FindDirection);
}

#[tokio::test]
async fn test_finish_reached_by_restore() {
    let backend = ScriptedBackend::with_replies(["접수처는 1층 로비에 있습니다."]);
    let agent = KioskAgent::new("kiosk-1", engine_with(backend));

    let mut ctx = agent.snapshot().await;
    ctx.state = ConversationState::Finish;
    agent.restore(ctx).await;

    let reply = agent.process("접수처는 어디예요?").await;
    assert_eq!(reply.reply, "접수처는 1층 로비에 있습니다.");
    assert_eq!(reply.state, ConversationState::Idle);
}

#[tokio::test]
async fn test_sessions_are_isolated_and_concurrent() {
    let backend = ScriptedBackend::new()
        .with_fallback("내과로 가시면 됩니다.")
        .with_delay(Duration::from_millis(10));
    let engine = engine_with(backend);

    let agents: Vec<_> = (0..8)
        .map(|i| Arc::new(KioskAgent::new(format!("kiosk-{i}"), Arc::clone(&engine))))
        .collect();

    let runs = agents.iter().enumerate().map(|(i, agent)| {
        let agent = Arc::clone(agent);
        async move {
            let name = format!("방문자{i}");
            let phone = format!("0101234000{i}");
            say(
                &agent,
                &[
                    "접수",
                    name.as_str(),
                    "네",
                    phone.as_str(),
                    "네",
                    "서울시",
                    "네",
                    "배가 아파요",
                    "네",
                ],
            )
            .await;
            agent.snapshot().await
        }
    });
    let snapshots = futures::future::join_all(runs).await;

    for (i, snapshot) in snapshots.iter().enumerate() {
        assert_eq!(snapshot.state, ConversationState::Idle);
        assert_eq!(snapshot.profile.name, format!("방문자{i}"));
    }
    for i in 0..8 {
        let record = engine
            .store()
            .get(&format!("방문자{i}"), &format!("0101234000{i}"))
            .unwrap();
        assert_eq!(record.department, "내과");
    }
}

#[tokio::test]
async fn test_turns_within_a_session_are_serialized() {
    let backend = ScriptedBackend::new()
        .with_fallback("안내입니다.")
        .with_delay(Duration::from_millis(20));
    let agent = Arc::new(KioskAgent::new("kiosk-1", engine_with(backend)));
    agent.process("길찾기").await;

    let first = tokio::spawn({
        let agent = Arc::clone(&agent);
        async move { agent.process("정형외과").await }
    });
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = agent.process("접수").await;
    let first = first.await.unwrap();

    // the second turn ran only after the first finished
    assert_eq!(first.state, ConversationState::Idle);
    assert_eq!(second.state, ConversationState::AskName);
    assert_eq!(agent.snapshot().await.state, ConversationState::AskName);
}
