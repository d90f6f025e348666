//! Integration tests for the Gemini client.
//!
//! These tests make real API calls to the Gemini API.
//! Run with: GEMINI_API_KEY=your_key cargo test --test gemini_integration -- --ignored

use lingoforge::llm::{GeminiClient, LlmClient};

fn create_test_client() -> GeminiClient {
    GeminiClient::from_env().expect("GEMINI_API_KEY must be set for integration tests")
}

#[tokio::test]
#[ignore] // Run with: cargo test --test gemini_integration -- --ignored
async fn test_simple_generation() {
    let client = create_test_client();

    let response = client
        .generate_text("What is 2 + 2? Reply with just the number.")
        .await;
    assert!(response.is_ok(), "Generation failed: {:?}", response.err());

    let text = response.expect("Should have response text");
    assert!(
        text.contains('4'),
        "Response should contain '4', got: {}",
        text
    );
}

#[tokio::test]
#[ignore]
async fn test_scored_response_parses() {
    let client = create_test_client();

    let text = client
        .generate_text(
            "Rate the translation quality of 'hola' for 'hello' on a 0-100 scale. \
             End your answer with a line formatted exactly as 'Score: <number>'.",
        )
        .await
        .expect("Should have response text");

    let score = lingoforge::parser::extract_score(&text);
    assert!(score <= 100);
}
