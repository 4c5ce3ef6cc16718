use std::borrow::Cow;
use std::time::Duration;

use futures::StreamExt;
use restpx::{
    resource, Authentication, HttpMethod, JsonBody, Request, Resource, Session, StatusValidator,
    TaskOptions, TransportBuilder,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Slideshow {
    slideshow: serde_json::Value,
}

impl Resource for Slideshow {
    fn location() -> Cow<'static, str> {
        "https://httpbin.org".into()
    }

    fn path() -> &'static str {
        "json"
    }

    fn decode(data: &[u8]) -> Option<Self> {
        resource::decode_json(data)
    }
}

#[derive(Debug, Deserialize)]
struct Echo {
    url: String,
    #[serde(default)]
    json: Option<serde_json::Value>,
}

impl Resource for Echo {
    fn location() -> Cow<'static, str> {
        "https://httpbin.org".into()
    }

    fn path() -> &'static str {
        "{p}"
    }

    fn decode(data: &[u8]) -> Option<Self> {
        resource::decode_json(data)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = TransportBuilder::new()
        .timeout(Duration::from_secs(30))
        .user_agent("restpx/0.1.0")
        .build();
    let session = Session::from_config(config)?;

    println!("=== Data Task ===");

    let request = Request::<Slideshow>::get()?;
    let slideshow = session.data(&request, &StatusValidator::default()).await?;
    println!("Slideshow: {:?}", slideshow.map(|s| s.slideshow["title"].clone()));

    println!("\n=== POST with JSON Body ===");

    let request = Request::<Echo>::builder()
        .method(HttpMethod::Post)
        .placeholders(["post"])
        .authentication(Authentication::oauth2("Bearer", "token"))
        .query([("source", "restpx")])
        .body(JsonBody::new(serde_json::json!({ "name": "restpx", "language": "rust" })))
        .build()?;
    let echo = session.data(&request, &StatusValidator::success()).await?;
    if let Some(echo) = echo {
        println!("Echoed {} with {:?}", echo.url, echo.json);
    }

    println!("\n=== Suspended Download Task ===");

    let request = Request::<Echo>::builder().placeholders(["get"]).build()?;
    let (tx, rx) = tokio::sync::oneshot::channel();
    let handle = session.download_request(&request, None, TaskOptions::suspended(), move |result| {
        let _ = tx.send(result);
    });
    println!("State before resume: {:?}", handle.state());
    handle.resume();
    match rx.await? {
        Ok(echo) => println!("Downloaded: {:?}", echo.map(|e| e.url)),
        Err(e) => println!("Download failed: {}", e),
    }

    println!("\n=== Status Validation ===");

    let request = Request::<Echo>::builder().placeholders(["status/404"]).build()?;
    let mut stream = session.data_stream(&request, StatusValidator::default());
    while let Some(outcome) = stream.next().await {
        match outcome {
            Ok(_) => println!("Unexpected success"),
            Err(e) => println!("Expected error for 404: {} (status {:?})", e, e.status_code()),
        }
    }

    println!("\n=== All examples completed successfully! ===");

    Ok(())
}
