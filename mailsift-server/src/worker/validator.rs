//! Record validation strategies
//!
//! One trait, two implementations: `SyntaxValidator` classifies by address
//! structure alone, `DomainRiskValidator` adds a domain resolution check.
//! Both are per-record and order-independent, so the transcoder is free to
//! call them from any number of interleaved jobs.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, ValidationMode};
use mailsift_core::validate::{self, Outcome, RecordOutcome};

#[async_trait]
pub trait RecordValidator: Send + Sync {
    /// Classifies one candidate value; fails soft, never errors.
    async fn validate(&self, candidate: &str) -> RecordOutcome;
}

/// Builds the configured validator
pub fn build(config: &Config) -> Arc<dyn RecordValidator> {
    match config.validation_mode {
        ValidationMode::Syntax => Arc::new(SyntaxValidator),
        ValidationMode::DomainRisk => {
            Arc::new(DomainRiskValidator::new(config.domain_lookup_timeout))
        }
    }
}

/// Syntax-only strategy
pub struct SyntaxValidator;

#[async_trait]
impl RecordValidator for SyntaxValidator {
    async fn validate(&self, candidate: &str) -> RecordOutcome {
        validate::syntax_outcome(candidate)
    }
}

/// Syntax plus domain-resolution strategy
///
/// A syntactically valid address is only as good as its domain: a domain
/// the resolver rejects is `Invalid`, a lookup that cannot be concluded in
/// time is `Risky` rather than a hard rejection.
pub struct DomainRiskValidator {
    lookup_timeout: Duration,
}

impl DomainRiskValidator {
    pub fn new(lookup_timeout: Duration) -> Self {
        Self { lookup_timeout }
    }
}

#[async_trait]
impl RecordValidator for DomainRiskValidator {
    async fn validate(&self, candidate: &str) -> RecordOutcome {
        let outcome = validate::syntax_outcome(candidate);
        if outcome.status != Outcome::Valid {
            return outcome;
        }

        let Some(domain) = validate::domain_of(candidate) else {
            return RecordOutcome::invalid("missing domain");
        };

        let lookup = tokio::net::lookup_host((domain, 25));
        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(mut addrs)) => {
                if addrs.next().is_some() {
                    RecordOutcome::valid()
                } else {
                    RecordOutcome::invalid("domain does not resolve")
                }
            }
            Ok(Err(_)) => RecordOutcome::invalid("domain does not resolve"),
            Err(_) => RecordOutcome::risky("domain lookup inconclusive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_syntax_validator_delegates_to_core() {
        let validator = SyntaxValidator;
        assert_eq!(validator.validate("a@b.com").await.status, Outcome::Valid);
        assert_eq!(
            validator.validate("not-an-email").await.status,
            Outcome::Invalid
        );
    }

    #[tokio::test]
    async fn test_domain_risk_rejects_bad_syntax_without_lookup() {
        // Malformed input short-circuits before any resolution happens, so
        // a zero timeout never fires.
        let validator = DomainRiskValidator::new(Duration::from_millis(0));
        let outcome = validator.validate("definitely not an email").await;
        assert_eq!(outcome.status, Outcome::Invalid);
        assert!(outcome.reason.is_some());
    }
}
