/// Classify a failure message into a normalized diagnostics category.
#[must_use]
pub fn classify_failure_category(message: &str) -> &'static str {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("timeout") || lowered.contains("timed out") {
        "timeout"
    } else if lowered.contains("cannot find module") || lowered.contains("module_not_found") {
        "sdk_missing"
    } else if lowered.contains("insufficient") || lowered.contains("gas") {
        "insufficient_funds"
    } else if lowered.contains("econnrefused")
        || lowered.contains("fetch failed")
        || lowered.contains("network")
    {
        "network"
    } else {
        "remote_failure"
    }
}

/// Redact sensitive tokens (private keys, API keys, passwords) from a message.
#[must_use]
pub fn redact_sensitive(message: &str) -> String {
    message
        .split_whitespace()
        .map(redact_token)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace every occurrence of a known secret before the text leaves the process.
#[must_use]
pub fn redact_known_secrets<'a>(message: &str, secrets: impl IntoIterator<Item = &'a str>) -> String {
    secrets
        .into_iter()
        .filter(|secret| secret.len() >= 8)
        .fold(message.to_string(), |acc, secret| {
            acc.replace(secret, "<redacted>")
        })
}

/// Redacts configured secrets and sensitive `key=value` tokens from SDK output.
#[must_use]
pub fn redact_diagnostic<'a>(message: &str, secrets: impl IntoIterator<Item = &'a str>) -> String {
    redact_sensitive(&redact_known_secrets(message, secrets))
}

#[must_use]
fn redact_token(token: &str) -> String {
    if token.starts_with("suiprivkey") {
        return "<redacted>".to_string();
    }
    token.split_once('=').map_or_else(
        || token.to_string(),
        |(key, _)| {
            let normalized = key.to_ascii_lowercase();
            if ["private_key", "privkey", "secret", "password", "api_key", "token"]
                .iter()
                .any(|sensitive| normalized.contains(sensitive))
            {
                format!("{key}=<redacted>")
            } else {
                token.to_string()
            }
        },
    )
}
