// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end session tests over mock collaborators.

use std::sync::Arc;
use std::time::Duration;

use myai_agent::{
    AgentCollaborators, AgentSession, CaptionSession, JsonHistoryStore, ModelResolver,
    SessionSettings,
};
use myai_core::{
    AudioEnvelope, HistorySink, ImageEnvelope, ModelSource, MyaiError, Role, TextEnvelope,
};
use myai_test_utils::{
    MockAudioCodec, MockCaptioner, MockHistorySink, MockModelLoader, MockSynthesizer,
    MockTranscriber, TestHarness,
};

fn audio(mode: &str, narrate: bool) -> AudioEnvelope {
    AudioEnvelope {
        audio: vec![10, 20, 30, 40, 50, 60, 70, 80],
        mode: Some(mode.to_string()),
        narrate_response: narrate,
    }
}

fn text(message: &str, mode: &str, narrate: bool) -> TextEnvelope {
    TextEnvelope {
        user_message: Some(message.to_string()),
        mode: Some(mode.to_string()),
        narrate_response: narrate,
    }
}

#[tokio::test]
async fn reply_to_empty_history_records_user_and_agent() {
    let mut harness = TestHarness::builder()
        .with_mock_responses(vec!["Hi there".into()])
        .build()
        .await
        .unwrap();

    let reply = harness.session.generate_reply("Hello").await.unwrap();

    let records = harness.session.history().records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].role, Role::User);
    assert_eq!(records[0].content, "Hello");
    assert_eq!(records[1].role, Role::Agent);
    assert_eq!(records[1].content, reply);
    assert_eq!(reply, "Hi there");
}

#[tokio::test]
async fn flat_context_joins_prior_turns_with_new_input() {
    let mut harness = TestHarness::builder()
        .with_mock_responses(vec!["first".into(), "second".into()])
        .build()
        .await
        .unwrap();

    harness.session.generate_reply("one").await.unwrap();
    harness.session.generate_reply("two").await.unwrap();

    let prompts = harness.model.prompts();
    assert_eq!(prompts, vec!["one".to_string(), "one first two".to_string()]);
}

#[tokio::test]
async fn chat_template_is_used_when_available() {
    let mut harness = TestHarness::builder()
        .with_loader(MockModelLoader::with_responses(vec!["hey".into()]).with_chat_template())
        .build()
        .await
        .unwrap();

    harness.session.generate_reply("Hello").await.unwrap();

    assert_eq!(harness.model.prompts(), vec!["user: Hello\nagent:".to_string()]);
}

#[tokio::test]
async fn empty_user_input_is_still_answered() {
    let mut harness = TestHarness::builder().build().await.unwrap();
    let reply = harness.session.generate_reply("").await.unwrap();
    assert_eq!(reply, "mock reply");
    assert_eq!(harness.session.history().len(), 2);
}

#[tokio::test]
async fn failed_generation_appends_nothing() {
    let mut harness = TestHarness::builder().build().await.unwrap();
    harness.model.push_failure("device lost");

    let err = harness.session.generate_reply("Hello").await.unwrap_err();

    assert!(matches!(err, MyaiError::Provider { .. }));
    assert!(harness.session.history().is_empty());
}

#[tokio::test]
async fn slow_generation_times_out_without_recording() {
    let mut harness = TestHarness::builder()
        .with_timeout(Duration::from_millis(20))
        .build()
        .await
        .unwrap();
    harness.model.set_delay(Duration::from_millis(500));

    let err = harness.session.generate_reply("Hello").await.unwrap_err();

    assert!(matches!(err, MyaiError::Timeout { .. }));
    assert!(harness.session.history().is_empty());
}

#[tokio::test]
async fn n_replies_after_wake_add_one_greeting_plus_pairs() {
    let mut harness = TestHarness::builder().build().await.unwrap();
    assert!(harness.session.wake().await);
    let before = harness.session.history().len();
    assert_eq!(before, 1);

    for i in 0..5 {
        harness.session.generate_reply(&format!("turn {i}")).await.unwrap();
    }

    assert_eq!(harness.session.history().len(), before + 5 * 2);
}

#[tokio::test]
async fn wake_twice_records_one_greeting() {
    let mut harness = TestHarness::builder()
        .with_mock_responses(vec!["I am awake".into()])
        .build()
        .await
        .unwrap();

    let awake = harness.session.awake_flag();
    assert!(!awake.load(std::sync::atomic::Ordering::Acquire));
    assert!(harness.session.wake().await);
    assert!(harness.session.wake().await);
    assert!(awake.load(std::sync::atomic::Ordering::Acquire));

    let records = harness.session.history().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].role, Role::Agent);
    assert_eq!(records[0].content, "I am awake");
    assert_eq!(harness.session.greeting(), Some("I am awake"));
    assert_eq!(harness.model.prompts(), vec!["Introduce yourself.".to_string()]);
}

#[tokio::test]
async fn wake_applies_seed_padding_and_context_limit() {
    let mut harness = TestHarness::builder()
        .with_loader(MockModelLoader::new().with_max_context(1024))
        .with_bootstrap(r#"{"seed": 7, "startup_prompt": "hi"}"#)
        .build()
        .await
        .unwrap();

    harness.session.wake().await;

    assert_eq!(harness.model.seed(), Some(7));
    assert_eq!(harness.model.pad_token_id(), Some(0));
    assert!(!harness.session.handle().needs_padding());
    assert_eq!(harness.session.handle().tokenizer.model_max_length(), Some(1024));
}

#[tokio::test]
async fn wake_failure_is_not_fatal_and_can_retry() {
    let mut harness = TestHarness::builder().without_bootstrap().build().await.unwrap();

    assert!(!harness.session.wake().await);
    assert!(!harness.session.is_awake());
    assert!(harness.session.history().is_empty());

    let reply = harness.session.generate_reply("still there?").await.unwrap();
    assert_eq!(reply, "mock reply");
}

#[tokio::test]
async fn bootstrap_defaults_seed_when_missing() {
    let mut harness = TestHarness::builder()
        .with_bootstrap(r#"{"startup_prompt": "hi"}"#)
        .build()
        .await
        .unwrap();
    harness.session.wake().await;
    assert_eq!(harness.model.seed(), Some(67));
}

#[tokio::test]
async fn long_prompts_keep_the_most_recent_tokens() {
    let mut harness = TestHarness::builder()
        .with_loader(MockModelLoader::new().with_max_context(8))
        .with_generation(myai_agent::GenerationSettings {
            max_new_tokens: 4,
            context_window: None,
            timeout: Duration::from_secs(5),
        })
        .without_bootstrap()
        .build()
        .await
        .unwrap();
    harness.session.wake().await;

    harness.session.generate_reply("abcdefgh").await.unwrap();

    assert_eq!(harness.model.prompts(), vec!["efgh".to_string()]);
}

#[tokio::test]
async fn flat_prompt_uses_last_n_records_including_the_new_input() {
    let mut harness = TestHarness::builder()
        .with_mock_responses(vec!["r1".into(), "r2".into(), "r3".into()])
        .with_generation(myai_agent::GenerationSettings {
            max_new_tokens: 32,
            context_window: Some(2),
            timeout: Duration::from_secs(5),
        })
        .build()
        .await
        .unwrap();

    assert_eq!(harness.session.generate_reply("one").await.unwrap(), "r1");
    assert_eq!(harness.session.generate_reply("two").await.unwrap(), "r2");
    assert_eq!(harness.session.generate_reply("three").await.unwrap(), "r3");

    assert_eq!(
        harness.model.prompts(),
        vec!["one".to_string(), "r1 two".to_string(), "r2 three".to_string()]
    );
    assert_eq!(harness.session.history().len(), 6);
}

#[tokio::test]
async fn continuation_only_models_keep_the_whole_output() {
    let mut harness = TestHarness::builder()
        .with_loader(
            MockModelLoader::with_responses(vec!["Only the answer".into()]).without_prompt_echo(),
        )
        .build()
        .await
        .unwrap();

    let reply = harness.session.generate_reply("What now").await.unwrap();

    assert_eq!(reply, "Only the answer");
    assert_eq!(harness.session.history().last().unwrap().content, "Only the answer");
}

#[tokio::test]
async fn embeddings_are_resized_before_generation() {
    let mut harness = TestHarness::builder()
        .with_loader(MockModelLoader::new().with_embedding_rows(100))
        .build()
        .await
        .unwrap();

    assert_eq!(harness.model.resized_to(), Some(myai_test_utils::mock_model::MOCK_VOCAB_SIZE));
    harness.session.generate_reply("Hello").await.unwrap();
}

#[tokio::test]
async fn resolver_prefers_most_recent_checkpoint() {
    let harness = TestHarness::builder()
        .with_checkpoints(&["gpt2-2025-01-01__00-00-00", "gpt2-2025-06-01__00-00-00"])
        .build()
        .await
        .unwrap();

    let expected = harness
        .pretrained_dir
        .join("results")
        .join("gpt2-2025-06-01__00-00-00");
    assert_eq!(harness.session.handle().source, ModelSource::Checkpoint(expected));
}

#[tokio::test]
async fn resolver_falls_back_when_checkpoint_fails_to_load() {
    let harness = TestHarness::builder()
        .with_loader(MockModelLoader::new().failing_checkpoints())
        .with_checkpoints(&["gpt2-broken"])
        .build()
        .await
        .unwrap();

    assert_eq!(
        harness.session.handle().source,
        ModelSource::Default("gpt2".to_string())
    );
    assert_eq!(harness.loader.state().loaded().len(), 2);
}

#[tokio::test]
async fn resolver_fallback_is_stable_across_calls() {
    let dir = tempfile::tempdir().unwrap();
    let loader = Arc::new(MockModelLoader::new());
    let resolver = ModelResolver::new(loader, "gpt2", "gpt2", Some(dir.path().join("results")));

    for _ in 0..3 {
        let handle = resolver.resolve().await.unwrap();
        assert_eq!(handle.source, ModelSource::Default("gpt2".to_string()));
        assert_eq!(resolver.fallback_source(), ModelSource::Default("gpt2".to_string()));
    }
}

#[tokio::test]
async fn failing_default_model_is_fatal() {
    let result = TestHarness::builder()
        .with_loader(MockModelLoader::new().failing_default())
        .build()
        .await;
    assert!(matches!(result, Err(MyaiError::Provider { .. })));
}

#[tokio::test]
async fn audio_transcribe_mode_returns_only_transcription() {
    for narrate in [false, true] {
        let mut harness = TestHarness::builder()
            .with_transcription("turn on the lights")
            .build()
            .await
            .unwrap();

        let out = harness.session.handle_audio_prompt(audio("transcribe", narrate)).await.unwrap();

        assert_eq!(out.transcription.as_deref(), Some("turn on the lights"));
        assert!(out.reply.is_none());
        assert!(out.audio.is_none());
        assert!(harness.session.history().is_empty());
        assert!(harness.synthesizer.calls().is_empty());
    }
}

#[tokio::test]
async fn audio_question_with_narration_fills_all_parts() {
    let mut harness = TestHarness::builder()
        .with_mock_responses(vec!["It is sunny".into()])
        .with_transcription("what is the weather")
        .build()
        .await
        .unwrap();

    let out = harness.session.handle_audio_prompt(audio("question", true)).await.unwrap();

    assert_eq!(out.transcription.as_deref(), Some("what is the weather"));
    assert_eq!(out.reply.as_deref(), Some("It is sunny"));
    let audio = out.audio.expect("narration");
    assert!(!audio.is_empty());
    assert_eq!(harness.synthesizer.calls(), vec!["It is sunny".to_string()]);
    assert_eq!(harness.session.history().len(), 2);
}

#[tokio::test]
async fn audio_is_downmixed_and_resampled_before_transcription() {
    let mut harness = TestHarness::builder().build().await.unwrap();

    harness.session.handle_audio_prompt(audio("transcribe", false)).await.unwrap();

    // 8 bytes decode to 4 stereo frames at 32 kHz, which become 2 mono samples at 16 kHz.
    assert_eq!(harness.transcriber.calls(), vec![(2, 16_000)]);
}

#[tokio::test]
async fn unknown_mode_fails_before_transcription() {
    let mut harness = TestHarness::builder().build().await.unwrap();

    let err = harness.session.handle_audio_prompt(audio("summarize", false)).await.unwrap_err();

    assert!(err.is_client_error());
    assert!(harness.transcriber.calls().is_empty());
}

#[tokio::test]
async fn missing_mode_and_empty_audio_are_client_errors() {
    let mut harness = TestHarness::builder().build().await.unwrap();

    let mut no_mode = audio("question", false);
    no_mode.mode = None;
    assert!(harness.session.handle_audio_prompt(no_mode).await.unwrap_err().is_client_error());

    let mut empty = audio("question", false);
    empty.audio.clear();
    assert!(harness.session.handle_audio_prompt(empty).await.unwrap_err().is_client_error());
}

#[tokio::test]
async fn undecodable_audio_is_a_server_error() {
    let mut harness = TestHarness::builder().build().await.unwrap();
    let mut envelope = audio("question", false);
    envelope.audio = b"garbage bytes".to_vec();

    let err = harness.session.handle_audio_prompt(envelope).await.unwrap_err();
    assert!(matches!(err, MyaiError::Audio(_)));
}

#[tokio::test]
async fn transcription_failure_leaves_history_untouched() {
    let mut harness = TestHarness::builder().with_failing_transcriber().build().await.unwrap();

    let err = harness.session.handle_audio_prompt(audio("question", false)).await.unwrap_err();

    assert!(matches!(err, MyaiError::Transcription(_)));
    assert!(harness.session.history().is_empty());
}

#[tokio::test]
async fn text_without_narration_has_null_audio() {
    let mut harness = TestHarness::builder()
        .with_mock_responses(vec!["Paris".into()])
        .build()
        .await
        .unwrap();

    let out = harness
        .session
        .handle_text_prompt(text("Capital of France?", "question", false))
        .await
        .unwrap();

    assert_eq!(out.reply.as_deref(), Some("Paris"));
    assert!(out.audio.is_none());
    assert!(out.transcription.is_none());
}

#[tokio::test]
async fn text_transcribe_mode_echoes_input() {
    let mut harness = TestHarness::builder().build().await.unwrap();

    let out = harness
        .session
        .handle_text_prompt(text("note this", "transcribe", true))
        .await
        .unwrap();

    assert_eq!(out.transcription.as_deref(), Some("note this"));
    assert!(out.reply.is_none());
    assert!(out.audio.is_none());
}

#[tokio::test]
async fn text_without_message_is_rejected() {
    let mut harness = TestHarness::builder().build().await.unwrap();
    let envelope = TextEnvelope {
        user_message: None,
        mode: Some("question".into()),
        narrate_response: false,
    };
    let err = harness.session.handle_text_prompt(envelope).await.unwrap_err();
    assert!(err.is_client_error());
}

#[tokio::test]
async fn synthesis_failure_surfaces_after_reply_is_recorded() {
    let mut harness = TestHarness::builder().with_failing_synthesizer().build().await.unwrap();

    let err = harness
        .session
        .handle_text_prompt(text("hello", "question", true))
        .await
        .unwrap_err();

    assert!(matches!(err, MyaiError::Synthesis(_)));
    assert_eq!(harness.session.history().len(), 2);
}

fn mock_collaborators(sink: Arc<dyn HistorySink>) -> AgentCollaborators {
    AgentCollaborators {
        transcriber: Arc::new(MockTranscriber::new("x")),
        synthesizer: Arc::new(MockSynthesizer::new()),
        codec: Arc::new(MockAudioCodec),
        sink,
    }
}

#[tokio::test]
async fn close_flushes_once_and_reloads_identically() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonHistoryStore::new(dir.path()));
    let resolver = ModelResolver::new(Arc::new(MockModelLoader::new()), "gpt2", "gpt2", None);
    let mut session = AgentSession::open(
        &resolver,
        mock_collaborators(store.clone()),
        SessionSettings::default(),
    )
    .await
    .unwrap();
    session.generate_reply("Hello").await.unwrap();
    session.generate_reply("How are you?").await.unwrap();
    let expected = session.history().records().to_vec();

    let path = session.close().await.unwrap().expect("flushed");

    assert!(path.starts_with(dir.path().join("AGENT")));
    assert_eq!(store.load(&path).unwrap(), expected);
    let files = std::fs::read_dir(dir.path().join("AGENT")).unwrap().count();
    assert_eq!(files, 1);
}

#[tokio::test]
async fn dropped_session_still_flushes() {
    let sink = Arc::new(MockHistorySink::new());
    let loader = Arc::new(MockModelLoader::new());
    let resolver = ModelResolver::new(loader, "gpt2", "gpt2", None);
    let collaborators = mock_collaborators(sink.clone());

    {
        let mut session = AgentSession::open(&resolver, collaborators, SessionSettings::default())
            .await
            .unwrap();
        session.generate_reply("bye").await.unwrap();
    }

    let flushes = sink.flushes();
    assert_eq!(flushes.len(), 1);
    assert_eq!(flushes[0].0, "AGENT");
    assert_eq!(flushes[0].1.len(), 2);
}

#[tokio::test]
async fn flush_failure_is_reported_not_panicking() {
    let loader = Arc::new(MockModelLoader::new());
    let resolver = ModelResolver::new(loader, "gpt2", "gpt2", None);
    let collaborators = mock_collaborators(Arc::new(MockHistorySink::failing()));
    let session = AgentSession::open(&resolver, collaborators, SessionSettings::default())
        .await
        .unwrap();

    assert!(matches!(session.close().await, Err(MyaiError::Storage { .. })));
}

#[tokio::test]
async fn caption_session_records_prefixed_turns() {
    let sink = Arc::new(MockHistorySink::new());
    let captioner = Arc::new(MockCaptioner::new());
    let mut captions = CaptionSession::new(captioner.clone(), sink.clone());

    let conditional = captions
        .caption(ImageEnvelope {
            image: vec![1, 2, 3],
            prompt: None,
        })
        .await
        .unwrap();
    let unconditional = captions.analyze(&[1, 2, 3]).await.unwrap();

    assert_eq!(conditional, "This is a photo of a cat");
    assert_eq!(unconditional, "a cat");
    let contents: Vec<&str> = captions
        .history()
        .records()
        .iter()
        .map(|r| r.content.as_str())
        .collect();
    assert_eq!(
        contents,
        vec!["[caption_img] :: This is a photo of a cat", "[analyze_img] :: a cat"]
    );

    captions.close().unwrap();
    assert_eq!(sink.flushes()[0].0, "CAPTION");
}

#[tokio::test]
async fn caption_rejects_empty_image() {
    let sink = Arc::new(MockHistorySink::new());
    let mut captions = CaptionSession::new(Arc::new(MockCaptioner::new()), sink);
    let err = captions
        .caption(ImageEnvelope {
            image: Vec::new(),
            prompt: Some("A drawing of".into()),
        })
        .await
        .unwrap_err();
    assert!(err.is_client_error());
}
