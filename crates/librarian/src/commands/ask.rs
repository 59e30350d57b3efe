use eyre::{Result, bail};
use librarian_client::{ApiClient, Backend, ChatRequest, Settings};
use tracing::debug;

/// Send one question and print the answer to stdout.
///
/// Uses the configured default `k` unless one is given. A failed request is
/// reported with the same message the interactive UI would show.
pub async fn run(settings: &Settings, question: &str, k: Option<u8>) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        bail!("the question is empty");
    }

    let client = ApiClient::new(&settings.api_base)?;
    let request = ChatRequest::new(question, k.unwrap_or_else(|| settings.default_k()));
    debug!(k = request.k, "asking {}", client.chat_url());

    match client.chat(&request).await {
        Ok(answer) => {
            println!("{answer}");
            Ok(())
        }
        Err(err) => bail!("{err}"),
    }
}
