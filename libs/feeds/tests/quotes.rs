use feeds::{Quote, QuoteClient};
use httpmock::Method::GET;
use httpmock::MockServer;

async fn client_for(server: &MockServer, status: u16, body: &str) -> QuoteClient {
    let body = body.to_string();
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/api/quotes");
            then.status(status)
                .header("content-type", "application/json")
                .body(body);
        })
        .await;

    QuoteClient::new(format!("{}/api/quotes", server.base_url())).unwrap()
}

#[tokio::test]
async fn single_quote_is_returned() {
    let server = MockServer::start_async().await;
    let client = client_for(&server, 200, r#"[{"q":"A","a":"X","h":"<blockquote>A</blockquote>"}]"#).await;

    for _ in 0..5 {
        assert_eq!(client.fetch_random().await.unwrap(), Quote::new("A", "X"));
    }
}

#[tokio::test]
async fn picks_from_returned_list() {
    let server = MockServer::start_async().await;
    let client = client_for(
        &server,
        200,
        r#"[{"q":"A","a":"X"},{"q":"B","a":"Y"},{"q":"C","a":"Z"}]"#,
    )
    .await;

    let quote = client.fetch_random().await.unwrap();

    assert!(["A", "B", "C"].contains(&quote.text.as_str()));
}

#[tokio::test]
async fn empty_list_is_an_error() {
    let server = MockServer::start_async().await;
    let client = client_for(&server, 200, "[]").await;

    assert!(client.fetch_random().await.is_err());
}

#[tokio::test]
async fn server_error_falls_back() {
    let server = MockServer::start_async().await;
    let client = client_for(&server, 503, "[]").await;

    let quote = client.fetch_random().await.unwrap_or_else(|_| Quote::fallback());

    assert_eq!(quote, Quote::new("Stay positive!", "Unknown"));
}

#[tokio::test]
async fn wrong_shape_is_an_error() {
    let server = MockServer::start_async().await;
    let client = client_for(&server, 200, r#"{"q":"A","a":"X"}"#).await;

    assert!(client.fetch_random().await.is_err());
}
