//! Suspicion Classifier
//!
//! Pure, deterministic heuristic scoring of a user profile. No I/O, no
//! side effects: the same profile and clock always produce the same verdict.
//!
//! Check ordering is a behavioral contract: account age is evaluated before
//! any name-based check, so a brand-new account with a keyword-laden handle
//! is reported as "account too new", not "suspicious handle". Callers that
//! audit reasons rely on this.

use crate::telegram::traits::UserProfile;
use chrono::{DateTime, Utc};

/// Minimum account age before a known-age account is considered established.
pub const DEFAULT_MIN_ACCOUNT_AGE_DAYS: i64 = 30;

/// Substrings that flag a handle or name as suspicious (matched
/// case-insensitively against the lower-cased field).
pub const SUSPICIOUS_KEYWORDS: [&str; 16] = [
    "deleted account",
    "bot",
    "bots",
    "police",
    "telegram",
    "admin",
    "support",
    "official",
    "http",
    "www",
    ".com",
    ".ru",
    ".xyz",
    "click",
    "promo",
    "sales",
];

/// Classification outcome. The reason string is for audit logging only and
/// is never parsed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Suspicious(String),
    Legitimate,
}

impl Verdict {
    pub fn is_suspicious(&self) -> bool {
        matches!(self, Verdict::Suspicious(_))
    }
}

#[derive(Debug, thiserror::Error)]
enum ClassifyError {
    #[error("account creation time is in the future")]
    CreatedInFuture,
}

/// Classify a profile against the suspicion heuristics.
///
/// Admission defaults to rejection on uncertainty: any internal evaluation
/// error yields `Suspicious("classification error")` rather than propagating.
pub fn classify(profile: &UserProfile, now: DateTime<Utc>, min_account_age_days: i64) -> Verdict {
    match evaluate(profile, now, min_account_age_days) {
        Ok(verdict) => verdict,
        Err(_) => Verdict::Suspicious("classification error".to_string()),
    }
}

/// The ordered rule list. Evaluation stops at the first matching predicate.
fn evaluate(
    profile: &UserProfile,
    now: DateTime<Utc>,
    min_account_age_days: i64,
) -> Result<Verdict, ClassifyError> {
    let checks: [(&str, &dyn Fn() -> Result<bool, ClassifyError>); 5] = [
        ("account too new", &|| {
            account_too_new(profile, now, min_account_age_days)
        }),
        ("suspicious handle", &|| {
            Ok(field_has_keyword(profile.username.as_deref()))
        }),
        ("suspicious first name", &|| {
            Ok(field_has_keyword(profile.first_name.as_deref()))
        }),
        ("suspicious last name", &|| {
            Ok(field_has_keyword(profile.last_name.as_deref()))
        }),
        ("no handle", &|| Ok(profile.username.is_none())),
    ];

    for (reason, check) in checks {
        if check()? {
            return Ok(Verdict::Suspicious(reason.to_string()));
        }
    }
    Ok(Verdict::Legitimate)
}

fn account_too_new(
    profile: &UserProfile,
    now: DateTime<Utc>,
    min_account_age_days: i64,
) -> Result<bool, ClassifyError> {
    let Some(created_at) = profile.created_at else {
        return Ok(false);
    };
    let age = now.signed_duration_since(created_at);
    // A creation time ahead of our clock by more than a day of skew is not a
    // real profile. Reject on uncertainty rather than trusting it.
    if age < chrono::Duration::days(-1) {
        return Err(ClassifyError::CreatedInFuture);
    }
    Ok(age.num_days() < min_account_age_days)
}

fn field_has_keyword(field: Option<&str>) -> bool {
    let Some(field) = field else {
        return false;
    };
    let lowered = field.to_lowercase();
    SUSPICIOUS_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}
