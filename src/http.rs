use std::time::Duration;

use reqwest::Client;

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Overall request timeout. Local model servers can take a while on first load.
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);
const SNIPPET_BYTES: usize = 200;

pub fn build_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .user_agent(crate::USER_AGENT)
        .build()
}

/// Truncates an error body for log and error messages, respecting char boundaries.
pub fn snippet(text: &str) -> &str {
    if text.len() <= SNIPPET_BYTES {
        return text;
    }
    let end = text
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= SNIPPET_BYTES)
        .last()
        .unwrap_or(0);
    &text[..end]
}
