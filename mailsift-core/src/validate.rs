//! Pure email syntax classification
//!
//! The syntactic half of record validation: no I/O, no ordering dependency
//! between calls, safe to invoke once per record from any number of
//! concurrently running jobs. Richer (network-backed) classification builds
//! on top of this in the server's worker.

use serde::{Deserialize, Serialize};

/// Per-record classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Valid,
    Invalid,
    Risky,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Valid => "Valid",
            Outcome::Invalid => "Invalid",
            Outcome::Risky => "Risky",
        }
    }
}

/// Outcome plus an optional human-readable reason, as written to the two
/// trailing columns of the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub status: Outcome,
    pub reason: Option<String>,
}

impl RecordOutcome {
    pub fn valid() -> Self {
        Self {
            status: Outcome::Valid,
            reason: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            status: Outcome::Invalid,
            reason: Some(reason.into()),
        }
    }

    pub fn risky(reason: impl Into<String>) -> Self {
        Self {
            status: Outcome::Risky,
            reason: Some(reason.into()),
        }
    }
}

/// Classifies a raw candidate value by syntax alone.
///
/// Fails soft: any unusable input (empty, whitespace, malformed) yields
/// `Invalid` with a reason, never an error.
pub fn syntax_outcome(raw: &str) -> RecordOutcome {
    let candidate = raw.trim();

    if candidate.is_empty() {
        return RecordOutcome::invalid("missing email value");
    }

    let mut parts = candidate.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = match parts.next() {
        Some(d) => d,
        None => return RecordOutcome::invalid("missing '@' separator"),
    };

    if domain.contains('@') {
        return RecordOutcome::invalid("multiple '@' separators");
    }

    if let Err(reason) = check_local_part(local) {
        return RecordOutcome::invalid(reason);
    }

    if let Err(reason) = check_domain(domain) {
        return RecordOutcome::invalid(reason);
    }

    RecordOutcome::valid()
}

/// Extracts the domain part of a syntactically plausible address, for
/// callers that want to run additional domain-level checks.
pub fn domain_of(candidate: &str) -> Option<&str> {
    let candidate = candidate.trim();
    let at = candidate.rfind('@')?;
    let domain = &candidate[at + 1..];
    if domain.is_empty() { None } else { Some(domain) }
}

fn check_local_part(local: &str) -> Result<(), &'static str> {
    if local.is_empty() {
        return Err("empty local part");
    }
    if local.len() > 64 {
        return Err("local part too long");
    }
    if local.starts_with('.') || local.ends_with('.') {
        return Err("local part starts or ends with '.'");
    }
    if local.contains("..") {
        return Err("consecutive dots in local part");
    }
    for c in local.chars() {
        let ok = c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~.".contains(c);
        if !ok {
            return Err("unsupported character in local part");
        }
    }
    Ok(())
}

fn check_domain(domain: &str) -> Result<(), &'static str> {
    if domain.is_empty() {
        return Err("empty domain");
    }
    if domain.len() > 253 {
        return Err("domain too long");
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err("domain has no top-level label");
    }

    for label in labels {
        if label.is_empty() {
            return Err("empty domain label");
        }
        if label.len() > 63 {
            return Err("domain label too long");
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err("domain label starts or ends with '-'");
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err("unsupported character in domain");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(raw: &str) -> Outcome {
        syntax_outcome(raw).status
    }

    #[test]
    fn test_well_formed_addresses_are_valid() {
        for addr in [
            "a@b.com",
            "first.last@example.org",
            "user+tag@mail.example.co.uk",
            "x_y-z@sub.domain.io",
            "  padded@example.com  ",
        ] {
            assert_eq!(status_of(addr), Outcome::Valid, "expected valid: {addr}");
        }
    }

    #[test]
    fn test_malformed_addresses_are_invalid() {
        for addr in [
            "",
            "   ",
            "not-an-email",
            "@example.com",
            "user@",
            "user@@example.com",
            "a@b@c.com",
            "user@localhost",
            ".leading@example.com",
            "trailing.@example.com",
            "dou..ble@example.com",
            "user@-bad.com",
            "user@bad-.com",
            "sp ace@example.com",
            "user@exa mple.com",
        ] {
            assert_eq!(status_of(addr), Outcome::Invalid, "expected invalid: {addr}");
        }
    }

    #[test]
    fn test_invalid_always_carries_a_reason() {
        let outcome = syntax_outcome("no-at-sign");
        assert_eq!(outcome.status, Outcome::Invalid);
        assert!(outcome.reason.is_some());

        assert_eq!(
            syntax_outcome("").reason.as_deref(),
            Some("missing email value")
        );
    }

    #[test]
    fn test_valid_carries_no_reason() {
        assert_eq!(syntax_outcome("a@b.com"), RecordOutcome::valid());
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("user@example.com"), Some("example.com"));
        assert_eq!(domain_of(" user@example.com "), Some("example.com"));
        assert_eq!(domain_of("no-at"), None);
        assert_eq!(domain_of("user@"), None);
    }

    #[test]
    fn test_length_bounds() {
        let long_local = format!("{}@example.com", "a".repeat(65));
        assert_eq!(status_of(&long_local), Outcome::Invalid);

        let long_label = format!("user@{}.com", "a".repeat(64));
        assert_eq!(status_of(&long_label), Outcome::Invalid);

        let max_local = format!("{}@example.com", "a".repeat(64));
        assert_eq!(status_of(&max_local), Outcome::Valid);
    }
}
