//! Dispatcher behavior tests
//!
//! Tests the routing policy through recording substitutes:
//! - Text goes to the conversational provider, Code and Image to the multi-model provider
//! - Provider failures come back as failure results, never as errors
//! - Image success writes exactly once; image failure writes nothing
//! - Unknown task labels are refused without calling any provider


use multimind::llm::provider::{LlmError, MessageRole};
use multimind::routing::{FailureKind, GenerationResult, TaskCategory};
use multimind::testing::{
    MockImageSink, MockLlmProvider, MockMultiModelProvider, ProviderCall, SubModel,
};
use std::path::PathBuf;
use test_helpers::{TestRig, FAKE_IMAGE_B64, FAKE_IMAGE_BYTES};

#[tokio::test]
async fn test_text_returns_trimmed_conversational_reply() {
    let rig = TestRig::healthy();
    let dispatcher = rig.dispatcher();

    let result = dispatcher
        .dispatch("what is the capital of France?", TaskCategory::Text)
        .await;

    assert_eq!(
        result,
        GenerationResult::Text("Paris is the capital of France.".to_string())
    );
    assert_eq!(rig.conversational.call_count().await, 1);
    assert!(rig.multi_model.get_calls().await.is_empty());
}

#[tokio::test]
async fn test_text_request_carries_prompt_model_and_temperature() {
    let rig = TestRig::healthy();
    rig.dispatcher()
        .dispatch("  hello there  ", TaskCategory::Text)
        .await;

    let calls = rig.conversational.get_calls().await;
    let ProviderCall::Completion(request) = &calls[0] else {
        panic!("Expected a completion call, got {:?}", calls[0]);
    };

    assert_eq!(request.model, "gpt-3.5-turbo");
    assert_eq!(request.temperature, Some(0.7));
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].role, MessageRole::System);
    assert_eq!(request.messages[0].content, "You are a helpful assistant.");
    assert_eq!(request.messages[1].role, MessageRole::User);
    // The raw utterance is forwarded untouched
    assert_eq!(request.messages[1].content, "  hello there  ");
}

#[tokio::test]
async fn test_text_failure_becomes_labeled_failure_result() {
    let rig = TestRig::new(
        MockLlmProvider::with_failure(LlmError::NetworkError("connection refused".to_string())),
        MockMultiModelProvider::new("unused", FAKE_IMAGE_B64),
        MockImageSink::new(),
    );

    let result = rig.dispatcher().dispatch("hello", TaskCategory::Text).await;

    let failure = result.as_failure().expect("failure result");
    assert_eq!(failure.kind, FailureKind::Conversational);
    assert!(failure.cause.contains("connection refused"));

    let rendered = result.to_string();
    assert!(rendered.starts_with("Error"));
    assert!(rendered.contains("connection refused"));
}

#[tokio::test]
async fn test_text_without_content_is_a_failure() {
    let rig = TestRig::new(
        MockLlmProvider::without_content(),
        MockMultiModelProvider::new("unused", FAKE_IMAGE_B64),
        MockImageSink::new(),
    );

    let result = rig.dispatcher().dispatch("hello", TaskCategory::Text).await;

    assert_eq!(
        result.as_failure().map(|f| f.kind),
        Some(FailureKind::Conversational)
    );
}

#[tokio::test]
async fn test_code_uses_multi_model_text_sub_model() {
    let rig = TestRig::healthy();

    let result = rig
        .dispatcher()
        .dispatch("write a python script", TaskCategory::Code)
        .await;

    assert_eq!(result, GenerationResult::Text("fn main() {}".to_string()));
    assert_eq!(rig.multi_model.invoked_sub_models().await, vec![SubModel::Text]);
    assert_eq!(rig.conversational.call_count().await, 0);

    let calls = rig.multi_model.get_calls().await;
    let ProviderCall::Completion(request) = &calls[0] else {
        panic!("Expected a completion call, got {:?}", calls[0]);
    };
    assert_eq!(request.model, "meta-llama/Meta-Llama-3.1-70B-Instruct");
    assert_eq!(
        request.messages[0].content,
        "You are a smart assistant that writes code."
    );
    assert_eq!(request.messages[1].content, "write a python script");
    assert_eq!(request.temperature, Some(0.7));
}

#[tokio::test]
async fn test_code_failure_becomes_labeled_failure_result() {
    let rig = TestRig::new(
        MockLlmProvider::single_response("unused"),
        MockMultiModelProvider::new("unused", FAKE_IMAGE_B64).with_text_failure(
            LlmError::RateLimitExceeded("quota exhausted".to_string()),
        ),
        MockImageSink::new(),
    );

    let result = rig.dispatcher().dispatch("write code", TaskCategory::Code).await;

    let failure = result.as_failure().expect("failure result");
    assert_eq!(failure.kind, FailureKind::Code);
    assert!(failure.cause.contains("quota exhausted"));
    assert_eq!(rig.conversational.call_count().await, 0);
}

#[tokio::test]
async fn test_image_success_writes_once_and_confirms() {
    let rig = TestRig::healthy();

    let result = rig
        .dispatcher()
        .dispatch("draw a lighthouse", TaskCategory::Image)
        .await;

    assert_eq!(
        result,
        GenerationResult::ImageDelivered {
            path: PathBuf::from("mock_image.png")
        }
    );
    assert!(result.to_string().contains("Image generated"));
    assert_eq!(rig.sink.get_writes(), vec![FAKE_IMAGE_BYTES.to_vec()]);
    assert_eq!(rig.multi_model.invoked_sub_models().await, vec![SubModel::Image]);
    assert_eq!(rig.conversational.call_count().await, 0);
}

#[tokio::test]
async fn test_image_request_uses_fixed_generation_configuration() {
    let rig = TestRig::healthy();
    rig.dispatcher()
        .dispatch("a picture of a fox", TaskCategory::Image)
        .await;

    let calls = rig.multi_model.get_calls().await;
    let ProviderCall::Image(request) = &calls[0] else {
        panic!("Expected an image call, got {:?}", calls[0]);
    };

    assert_eq!(request.model, "black-forest-labs/flux-dev");
    assert_eq!(request.prompt, "a picture of a fox");
    assert_eq!(request.width, 1024);
    assert_eq!(request.height, 1024);
    assert_eq!(request.inference_steps, 28);
    assert_eq!(request.negative_prompt, "");
    assert_eq!(request.seed, -1);
    assert_eq!(request.extension, "png");
}

#[tokio::test]
async fn test_image_provider_failure_writes_nothing() {
    let rig = TestRig::new(
        MockLlmProvider::single_response("unused"),
        MockMultiModelProvider::new("unused", FAKE_IMAGE_B64).with_image_failure(
            LlmError::AuthenticationFailed("invalid token".to_string()),
        ),
        MockImageSink::new(),
    );

    let result = rig.dispatcher().dispatch("draw", TaskCategory::Image).await;

    let failure = result.as_failure().expect("failure result");
    assert_eq!(failure.kind, FailureKind::Image);
    assert!(failure.cause.contains("invalid token"));
    assert!(rig.sink.get_writes().is_empty());
}

#[tokio::test]
async fn test_image_with_malformed_payload_writes_nothing() {
    let rig = TestRig::new(
        MockLlmProvider::single_response("unused"),
        MockMultiModelProvider::new("unused", "%%% not base64 %%%"),
        MockImageSink::new(),
    );

    let result = rig.dispatcher().dispatch("draw", TaskCategory::Image).await;

    assert_eq!(result.as_failure().map(|f| f.kind), Some(FailureKind::Image));
    assert!(result.to_string().contains("base64"));
    assert!(rig.sink.get_writes().is_empty());
}

#[tokio::test]
async fn test_image_sink_failure_is_reported() {
    let rig = TestRig::new(
        MockLlmProvider::single_response("unused"),
        MockMultiModelProvider::new("unused", FAKE_IMAGE_B64),
        MockImageSink::with_failure(),
    );

    let result = rig.dispatcher().dispatch("draw", TaskCategory::Image).await;

    let failure = result.as_failure().expect("failure result");
    assert_eq!(failure.kind, FailureKind::Image);
    assert!(failure.cause.contains("mock sink failure"));
}

#[tokio::test]
async fn test_unknown_task_label_is_refused_without_provider_calls() {
    let rig = TestRig::healthy();

    let result = rig.dispatcher().dispatch_label("hum a tune", "audio").await;

    let failure = result.as_failure().expect("failure result");
    assert_eq!(failure.kind, FailureKind::UnknownTask);
    assert!(result.to_string().contains("unknown task type"));
    assert_eq!(rig.conversational.call_count().await, 0);
    assert!(rig.multi_model.get_calls().await.is_empty());
    assert!(rig.sink.get_writes().is_empty());
}

#[tokio::test]
async fn test_known_task_label_dispatches_normally() {
    let rig = TestRig::healthy();

    let result = rig.dispatcher().dispatch_label("anything", "code").await;

    assert_eq!(result, GenerationResult::Text("fn main() {}".to_string()));
    assert_eq!(rig.multi_model.invoked_sub_models().await, vec![SubModel::Text]);
}

#[tokio::test]
async fn test_router_classifies_then_dispatches() {
    let rig = TestRig::healthy();
    let router = rig.router();

    let text = router.route("what is the capital of France?").await;
    let code = router.route("write a python script").await;
    let image = router.route("draw me a function").await;

    assert_eq!(
        text,
        GenerationResult::Text("Paris is the capital of France.".to_string())
    );
    assert_eq!(code, GenerationResult::Text("fn main() {}".to_string()));
    assert!(matches!(image, GenerationResult::ImageDelivered { .. }));

    assert_eq!(rig.conversational.call_count().await, 1);
    assert_eq!(
        rig.multi_model.invoked_sub_models().await,
        vec![SubModel::Text, SubModel::Image]
    );
    assert_eq!(rig.sink.get_writes().len(), 1);
}
