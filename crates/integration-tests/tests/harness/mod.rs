//! Shared test harness: mock upstreams, config builders, and a running
//! proxy instance

pub mod config;
pub mod mock_upstream;
pub mod server;

use eventsource_stream::Eventsource;
use futures_util::StreamExt;

/// Collect every SSE `data:` payload from a streaming response, in order
pub async fn sse_data_lines(response: reqwest::Response) -> Vec<String> {
    let mut events = response.bytes_stream().eventsource();
    let mut lines = Vec::new();
    while let Some(event) = events.next().await {
        match event {
            Ok(event) => lines.push(event.data),
            Err(_) => break,
        }
    }
    lines
}
