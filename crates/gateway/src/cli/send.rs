use sr_domain::config::Config;
use sr_session::{SessionClient, SessionState};

/// Deliver one message outside the server and print the receipt as JSON.
pub async fn run(config: &Config, recipient: &str, message: &str) -> anyhow::Result<()> {
    let session = SessionState::load_or_empty(&config.session.account_file);
    let client = SessionClient::new(session, &config.session)?;

    let receipt = client.send(recipient, message).await?;
    println!("{}", serde_json::to_string_pretty(&receipt)?);
    Ok(())
}
