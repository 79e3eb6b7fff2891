use anyhow::{Context, Result, bail};
use std::time::Duration;

/// Both upstreams reject requests that do not look like they come from a browser.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Builds an HTTP client whose requests give up after `timeout`.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Rejects codes that would change an upstream URL beyond naming one security.
pub fn validate_security_code(code: &str) -> Result<()> {
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        bail!("Invalid security code: {code:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_security_code() {
        assert!(validate_security_code("000001").is_ok());
        assert!(validate_security_code("00700").is_ok());
        assert!(validate_security_code("AAPL").is_ok());

        for code in ["", "000001&year=2019", "600519,sz000001", "../x", "0000 01"] {
            assert!(validate_security_code(code).is_err(), "accepted {code:?}");
        }
    }
}
