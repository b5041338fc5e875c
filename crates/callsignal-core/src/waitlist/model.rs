//! Waitlist sign-up models and form validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CallSignalError, Result};

/// Placeholder option of the industry picker; never a valid answer.
pub const INDUSTRY_PLACEHOLDER: &str = "Select Industry";

pub const INDUSTRIES: &[&str] = &[
    "Hedge Fund / Asset Management",
    "Investment Banking",
    "Private Equity / VC",
    "Investor Relations",
    "Corporate Strategy",
    "Financial Media",
    "Other",
];

const MIN_NAME_CHARS: usize = 2;

/// Form payload as submitted by a visitor.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct WaitlistSubmission {
    pub name: String,
    pub email: String,
    pub industry: String,
}

impl WaitlistSubmission {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        industry: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            industry: industry.into(),
        }
    }

    /// Checks the form in display order and reports the first problem.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error whose message is meant to be shown inline.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().chars().count() < MIN_NAME_CHARS {
            return Err(CallSignalError::validation(
                "Name must be at least 2 characters.",
            ));
        }
        let email = self.email.trim();
        if !email.contains('@') || !email.contains('.') {
            return Err(CallSignalError::validation(
                "Please enter a valid email address.",
            ));
        }
        let industry = self.industry.trim();
        if industry.is_empty() || industry == INDUSTRY_PLACEHOLDER {
            return Err(CallSignalError::validation("Please select your industry."));
        }
        Ok(())
    }

    /// Lower-cased, trimmed email used as the dedupe key.
    pub fn email_key(&self) -> String {
        normalize_email(&self.email)
    }

    pub fn into_entry(self, joined_at: DateTime<Utc>) -> WaitlistEntry {
        WaitlistEntry {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            industry: self.industry.trim().to_string(),
            joined_at,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A stored sign-up.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct WaitlistEntry {
    pub name: String,
    pub email: String,
    pub industry: String,
    pub joined_at: DateTime<Utc>,
}

/// Server-side answer to a valid submission.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WaitlistStatus {
    Success,
    Exists,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(submission: &WaitlistSubmission) -> String {
        submission.validate().unwrap_err().to_string()
    }

    #[test]
    fn test_valid_submission() {
        let submission = WaitlistSubmission::new("Ada", "ada@fund.com", "Investment Banking");
        assert!(submission.validate().is_ok());
    }

    #[test]
    fn test_short_name_after_trim() {
        let submission = WaitlistSubmission::new("  A ", "ada@fund.com", "Other");
        assert_eq!(message(&submission), "Name must be at least 2 characters.");
    }

    #[test]
    fn test_email_needs_at_and_dot() {
        for email in ["ada.fund.com", "ada@fundcom", ""] {
            let submission = WaitlistSubmission::new("Ada", email, "Other");
            assert_eq!(message(&submission), "Please enter a valid email address.");
        }
    }

    #[test]
    fn test_placeholder_industry_rejected() {
        for industry in [INDUSTRY_PLACEHOLDER, "  "] {
            let submission = WaitlistSubmission::new("Ada", "ada@fund.com", industry);
            assert_eq!(message(&submission), "Please select your industry.");
            assert!(submission.validate().unwrap_err().is_validation());
        }
    }

    #[test]
    fn test_email_key_is_case_insensitive() {
        let a = WaitlistSubmission::new("Ada", " Ada@Fund.com ", "Other");
        let b = WaitlistSubmission::new("Ada", "ada@fund.COM", "Other");
        assert_eq!(a.email_key(), b.email_key());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&WaitlistStatus::Exists).unwrap(),
            "\"exists\""
        );
    }
}
