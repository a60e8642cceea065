use std::time::Duration;

use enfetch::{
    create_fetcher, create_retry_client, timeout, Delay, FetcherOptions, FnPlugin, Request,
    RetryOptions,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com".to_owned());

    let logger = FnPlugin::new("logger")
        .before_request(|req| {
            println!("-> {} {}", req.method(), req.url());
            Ok(None)
        })
        .after_response(|res, req| {
            println!("<- {} {}", res.status(), req.url());
            Ok(())
        })
        .error(|req, err| println!("!! {}: {err}", req.url()));

    let fetcher = create_fetcher(
        FetcherOptions::new()
            .with_plugin(timeout(Duration::from_secs(5)))
            .with_plugin(logger),
    );
    let client = create_retry_client(
        fetcher,
        RetryOptions::new()
            .with_max_retries(3)
            .with_delay(Delay::exponential(Duration::from_millis(250))),
    );

    let response = client.execute(Request::get(&url)?).await?;
    let status = response.status();
    let body = response.text()?;
    println!("{status}: {} bytes", body.len());

    Ok(())
}
