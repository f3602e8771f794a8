use sr_domain::config::Config;
use sr_session::{ProbeResult, SessionClient, SessionState};

/// Load the session, probe it and print a summary.
///
/// Returns `Ok(true)` when the session answers, `Ok(false)` otherwise.
pub async fn run(config: &Config) -> anyhow::Result<bool> {
    println!("sessionrelay check");
    println!("==================\n");

    let session = SessionState::load_or_empty(&config.session.account_file);
    print_check(
        "Session tokens",
        !session.is_empty(),
        format!(
            "{} token(s) from {}",
            session.len(),
            config.session.account_file.display()
        ),
    );
    print_check(
        "Identity and security tokens",
        session.identity_id().is_some() && session.security_token().is_some(),
        session
            .identity_id()
            .map(|id| format!("user {id}"))
            .unwrap_or_else(|| "c_user missing".into()),
    );

    let client = SessionClient::new(session, &config.session)?;

    let probe = client.verify_session().await;
    print_probe("Platform session", &probe);

    let profile = client.profile().await;
    print_probe("Profile", &profile);

    println!();
    if probe.success {
        println!("Session looks usable.");
    } else {
        println!("Session check failed. Recapture the account file.");
    }

    Ok(probe.success)
}

fn print_probe(label: &str, probe: &ProbeResult) {
    let detail = match (&probe.status, &probe.error) {
        (_, Some(err)) => err.clone(),
        (Some(status), None) => format!("HTTP {status}"),
        (None, None) => String::new(),
    };
    print_check(label, probe.success, detail);
}

fn print_check(label: &str, passed: bool, detail: String) {
    let mark = if passed { "PASS" } else { "FAIL" };
    println!("  [{mark}] {label}: {detail}");
}
