use docdesk::api::handler::handle_payload;
use docdesk::core::AppConfig;
use mockito::{Matcher, Server};
use serde_json::{Value, json};

fn config_for(server: &Server) -> AppConfig {
    AppConfig {
        openai_api_key: Some("test_openai".to_string()),
        openai_base_url: server.url(),
        maps_api_key: Some("test_maps".to_string()),
        maps_base_url: server.url(),
        ..AppConfig::default()
    }
}

fn body_of(response: &Value) -> Value {
    serde_json::from_str(response["body"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn test_tokens_action_counts_tokens() {
    let server = Server::new_async().await;
    let response = handle_payload(
        &config_for(&server),
        &json!({ "action": "tokens", "text": "hello world" }),
    )
    .await;

    assert_eq!(response["statusCode"], 200);
    assert!(body_of(&response)["token_count"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_chunk_action_respects_budget() {
    let server = Server::new_async().await;
    let text = "Chunk me into several small pieces please. ".repeat(10);
    let response = handle_payload(
        &config_for(&server),
        &json!({ "action": "chunk", "text": text, "max_tokens": 16 }),
    )
    .await;

    assert_eq!(response["statusCode"], 200);
    let body = body_of(&response);
    let chunks = body["chunks"].as_array().unwrap();
    assert!(chunks.len() > 1);
    assert!(
        chunks
            .iter()
            .all(|c| c["token_count"].as_u64().unwrap() <= 16)
    );
    let rejoined: String = chunks
        .iter()
        .map(|c| c["text"].as_str().unwrap())
        .collect();
    assert_eq!(rejoined, text);
}

#[tokio::test]
async fn test_generate_action_through_gateway_envelope() {
    let mut server = Server::new_async().await;
    let completion = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test_openai")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 2000,
            "messages": [
                { "role": "system", "content": "Generate a 2,000-character document for this keyword in English." },
                { "role": "user", "content": "tea ceremony" }
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "choices": [{ "message": { "content": "Tea ceremonies are..." } }] }).to_string())
        .create_async()
        .await;

    let payload = json!({
        "rawPath": "/docs",
        "body": json!({
            "action": "generate",
            "keyword": "tea ceremony",
            "language": "en",
            "model": "mini"
        })
        .to_string()
    });
    let response = handle_payload(&config_for(&server), &payload).await;

    assert_eq!(response["statusCode"], 200);
    let body = body_of(&response);
    assert_eq!(body["document"], "Tea ceremonies are...");
    assert_eq!(body["markdown"], "# Generated Document\n\nTea ceremonies are...");
    completion.assert_async().await;
}

#[tokio::test]
async fn test_summarize_uploaded_paragraphs() {
    let mut server = Server::new_async().await;
    let completion = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({
            "max_tokens": 500,
            "messages": [
                { "role": "system", "content": "Summarize the following document." },
                { "role": "user", "content": "Minutes\nBudget approved\nNext meeting in May" }
            ]
        })))
        .with_status(200)
        .with_body(json!({ "choices": [{ "message": { "content": "Budget approved." } }] }).to_string())
        .create_async()
        .await;

    let response = handle_payload(
        &config_for(&server),
        &json!({
            "action": "summarize",
            "paragraphs": ["Minutes", "Budget approved", "Next meeting in May"]
        }),
    )
    .await;

    assert_eq!(response["statusCode"], 200);
    let body = body_of(&response);
    assert_eq!(body["summary"], "Budget approved.");
    assert_eq!(body["chunked"], false);
    assert_eq!(body["chunk_count"], 1);
    assert!(body["token_count"].as_u64().unwrap() > 0);
    assert!(body.get("text").is_none());
    completion.assert_async().await;
}

#[tokio::test]
async fn test_summarize_link_that_fails_to_load() {
    let mut server = Server::new_async().await;
    let _doc = server
        .mock("GET", "/report.txt")
        .with_status(500)
        .create_async()
        .await;
    let completion = server
        .mock("POST", "/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let response = handle_payload(
        &config_for(&server),
        &json!({ "action": "summarize", "url": format!("{}/report.txt", server.url()) }),
    )
    .await;

    assert_eq!(response["statusCode"], 502);
    assert_eq!(
        body_of(&response)["error"],
        "Failed to load the document link."
    );
    completion.assert_async().await;
}

#[tokio::test]
async fn test_time_action_formats_local_time() {
    let mut server = Server::new_async().await;
    let _geocode = server
        .mock("GET", "/geocode/json")
        .match_query(Matcher::UrlEncoded("address".into(), "Paris".into()))
        .with_status(200)
        .with_body(
            json!({
                "status": "OK",
                "results": [{ "geometry": { "location": { "lat": 48.8566, "lng": 2.3522 } } }]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let _timezone = server
        .mock("GET", "/timezone/json")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "status": "OK",
                "timeZoneId": "Europe/Paris",
                "timeZoneName": "Central European Standard Time"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let response = handle_payload(
        &config_for(&server),
        &json!({ "action": "time", "place": "Paris", "retries": 0 }),
    )
    .await;

    assert_eq!(response["statusCode"], 200);
    let body = body_of(&response);
    assert_eq!(body["time_zone_id"], "Europe/Paris");
    let local_time = body["local_time"].as_str().unwrap();
    assert!(chrono::NaiveDateTime::parse_from_str(local_time, "%Y-%m-%d %H:%M:%S").is_ok());
}

#[tokio::test]
async fn test_missing_maps_key_is_reported() {
    let server = Server::new_async().await;
    let config = AppConfig {
        maps_api_key: None,
        ..config_for(&server)
    };
    let response =
        handle_payload(&config, &json!({ "action": "time", "place": "Seoul" })).await;

    assert_eq!(response["statusCode"], 500);
    assert!(
        body_of(&response)["error"]
            .as_str()
            .unwrap()
            .contains("GOOGLE_MAPS_API_KEY")
    );
}

#[tokio::test]
async fn test_unknown_action_is_bad_request() {
    let server = Server::new_async().await;
    let response = handle_payload(
        &config_for(&server),
        &json!({ "action": "edit", "text": "anything" }),
    )
    .await;
    assert_eq!(response["statusCode"], 400);
}
