use hotnews::llm::remote::RemoteLlmProvider;
use hotnews::llm::{AiSummarizer, LlmProvider, LlmRequest};
use mockito::Matcher;
use std::sync::Arc;
use std::time::Duration;

const ARTICLE_HTML: &str = r#"<html><body>
    <nav>Menu</nav>
    <article><h1>Launch</h1><p>The rocket reached orbit on Tuesday.</p></article>
</body></html>"#;

fn completion_body(content: &str) -> String {
    serde_json::json!({
        "model": "gpt-4o-mini",
        "choices": [{
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
    })
    .to_string()
}

#[tokio::test]
async fn test_remote_provider_with_mock() {
    let mut server = mockito::Server::new_async().await;

    let page = server
        .mock("GET", "/article")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(ARTICLE_HTML)
        .create_async()
        .await;

    let chat = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer fake-api-key")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("请用中文简短概括".to_string()),
            Matcher::Regex("The rocket reached orbit on Tuesday.".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("火箭于周二进入轨道。"))
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(
        format!("{}/v1/chat/completions", server.url()),
        "fake-api-key",
        "gpt-4o-mini",
    )
    .expect("provider");

    let request = LlmRequest::new(
        "请用中文简短概括这篇文章的内容。",
        format!("{}/article", server.url()),
    );
    let response = provider.generate(request).await.expect("answer");

    assert_eq!(response.content, "火箭于周二进入轨道。");
    assert_eq!(response.usage.total_tokens, 15);
    assert_eq!(response.model, "gpt-4o-mini");

    page.assert_async().await;
    chat.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_error_handling() {
    let mut server = mockito::Server::new_async().await;

    let _page = server
        .mock("GET", "/article")
        .with_status(200)
        .with_body(ARTICLE_HTML)
        .create_async()
        .await;

    let chat = server
        .mock("POST", "/v1/chat/completions")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": {"message": "Rate limit exceeded"}}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(
        format!("{}/v1/chat/completions", server.url()),
        "fake-api-key",
        "gpt-4o-mini",
    )
    .expect("provider");

    let result = provider
        .generate(LlmRequest::new("summarize", format!("{}/article", server.url())))
        .await;

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("429"));

    chat.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_article_is_an_error() {
    let mut server = mockito::Server::new_async().await;

    let _page = server
        .mock("GET", "/missing")
        .with_status(404)
        .create_async()
        .await;

    let chat = server
        .mock("POST", "/v1/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(
        format!("{}/v1/chat/completions", server.url()),
        "fake-api-key",
        "gpt-4o-mini",
    )
    .expect("provider");

    let result = provider
        .generate(LlmRequest::new("summarize", format!("{}/missing", server.url())))
        .await;
    assert!(result.is_err());

    chat.assert_async().await;
}

#[tokio::test]
async fn test_summarizer_absorbs_provider_errors() {
    let mut server = mockito::Server::new_async().await;

    let _page = server
        .mock("GET", "/article")
        .with_status(500)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(
        format!("{}/v1/chat/completions", server.url()),
        "fake-api-key",
        "gpt-4o-mini",
    )
    .expect("provider");

    let ai = AiSummarizer::new(Arc::new(provider), "summarize", Duration::from_secs(10));
    assert!(ai.summarize(&format!("{}/article", server.url())).await.is_none());
}

#[tokio::test]
async fn test_remote_provider_timeout() {
    let mut server = mockito::Server::new_async().await;

    let _page = server
        .mock("GET", "/article")
        .with_status(200)
        .with_body(ARTICLE_HTML)
        .create_async()
        .await;

    let _chat = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(std::time::Duration::from_secs(3));
            w.write_all(b"too late")
        })
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(
        format!("{}/v1/chat/completions", server.url()),
        "fake-api-key",
        "gpt-4o-mini",
    )
    .expect("provider");

    let mut request = LlmRequest::new("summarize", format!("{}/article", server.url()));
    request.timeout_seconds = Some(1);

    let result = provider.generate(request).await;
    assert!(result.is_err());
}
