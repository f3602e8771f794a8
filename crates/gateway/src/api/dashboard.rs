use axum::extract::State;
use axum::response::{Html, IntoResponse};

use crate::state::AppState;

const ENDPOINTS: &[(&str, &str)] = &[
    ("/health", "Health check"),
    ("/webhook", "Platform webhook"),
    ("/test-fb", "Test the captured session"),
    ("/send-message", "Send a test message"),
    ("/fb-state", "Loaded session tokens"),
    ("/profile", "Session profile"),
];

pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.client.state();
    let loaded = if session.is_empty() { "no" } else { "yes" };

    let endpoints_html: String = ENDPOINTS
        .iter()
        .map(|(path, label)| format!("<li><a href=\"{path}\">{path}</a> &middot; {label}</li>"))
        .collect::<Vec<_>>()
        .join("\n");

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Session Relay</title>
<style>
  body {{ font-family: system-ui, sans-serif; max-width: 900px; margin: 2rem auto; padding: 0 1rem; background: #0d1117; color: #c9d1d9; }}
  h1 {{ color: #58a6ff; }}
  h2 {{ color: #79c0ff; border-bottom: 1px solid #21262d; padding-bottom: 0.3em; margin-top: 2em; }}
  ul {{ padding-left: 1.5em; }}
  li {{ margin: 0.3em 0; }}
  a {{ color: #58a6ff; text-decoration: none; }}
  a:hover {{ text-decoration: underline; }}
  .card {{ background: #161b22; border: 1px solid #30363d; border-radius: 6px; padding: 1rem; margin: 0.5rem 0; }}
  code {{ background: #21262d; padding: 0.2em 0.4em; border-radius: 3px; font-size: 0.9em; }}
  input {{ padding: 0.4em; margin-right: 0.5em; }}
</style>
</head>
<body>
<h1>Session Relay</h1>
<p>Server time: <code>{now}</code></p>

<h2>Status</h2>
<div class="card">
<p>Port: <code>{port}</code></p>
<p>Webhook mode: <code>{mode}</code></p>
<p>Session loaded: {loaded}</p>
<p>Tokens: {token_count}</p>
</div>

<h2>Endpoints</h2>
<div class="card">
<ul>{endpoints_html}</ul>
</div>

<h2>Send Test Message</h2>
<div class="card">
<form action="/send-message" method="POST">
<input type="text" name="recipient" placeholder="Recipient ID" required>
<input type="text" name="message" placeholder="Message" required>
<button type="submit">Send</button>
</form>
</div>
</body>
</html>"#,
        now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        port = state.config.server.port,
        mode = state.config.webhook.mode,
        token_count = session.len(),
    );

    Html(html)
}
