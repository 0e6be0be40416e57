use common::{FetchMode, DEFAULT_AGGREGATOR_ENDPOINT};
use hotnews::ingestion::FeedFetcher;
use hotnews::text::TextSummarizer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut feeds: Vec<String> = std::env::args().skip(1).collect();
    if feeds.is_empty() {
        feeds = vec![
            "https://news.ycombinator.com/rss".to_string(),
            "https://www.reddit.com/r/news/.rss".to_string(),
        ];
    }

    let endpoint = std::env::var("AGGREGATOR_ENDPOINT")
        .unwrap_or_else(|_| DEFAULT_AGGREGATOR_ENDPOINT.to_string());
    let mode = match std::env::var("FETCH_MODE").as_deref() {
        Ok("direct") => FetchMode::Direct,
        _ => FetchMode::Aggregator,
    };

    let fetcher = FeedFetcher::new(&endpoint, mode, 30)?;
    let text = TextSummarizer::default();

    for url in feeds {
        println!("\n{}", "=".repeat(60));
        println!("Testing: {} ({:?})", url, mode);
        println!("{}", "=".repeat(60));

        let entries = fetcher.fetch(&url, 3).await;
        if entries.is_empty() {
            println!("✗ No entries");
            continue;
        }

        println!("✓ {} entries", entries.len());
        for (i, entry) in entries.iter().enumerate() {
            println!("    {}. {}", i + 1, entry.title);
            println!("       URL: {}", entry.url);
            println!("       Published: {}", entry.publish_date.as_deref().unwrap_or("unknown"));
            println!("       Summary: {}", text.summarize(&entry.description_html));
        }
    }

    Ok(())
}
