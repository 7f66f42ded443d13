// 📧 Email Validation - account identity rule
//
// local@domain.tld where local and domain are letters, digits and single
// interior dots, and the top-level label is at least two characters.
//
// "Letters and digits" means general categories L* and Nd, Basic
// Multilingual Plane only. Other numbers (`²`, `Ⅻ`), combining marks and
// supplementary-plane letters are rejected.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LABEL_CHARS: Regex =
        Regex::new(r"^[[\p{L}\p{Nd}.]&&[\x{0}-\x{FFFF}]]+$").unwrap();
}

/// True iff `identity` is a well-formed account email address
pub fn is_email_valid(identity: &str) -> bool {
    if identity.is_empty() {
        return false;
    }

    // exactly one @, neither first nor last
    let Some(at) = identity.find('@') else {
        return false;
    };
    if at == 0 || identity.rfind('@') != Some(at) || at == identity.len() - 1 {
        return false;
    }

    let (local, domain) = (&identity[..at], &identity[at + 1..]);

    if !is_dotted_label(local) {
        return false;
    }
    if !domain.contains('.') || !is_dotted_label(domain) {
        return false;
    }

    let tld = domain.rsplit('.').next().unwrap_or_default();
    tld.chars().count() >= 2
}

/// Non-empty run of letters/digits with no leading, trailing or doubled dot
fn is_dotted_label(part: &str) -> bool {
    !part.is_empty()
        && !part.starts_with('.')
        && !part.ends_with('.')
        && !part.contains("..")
        && LABEL_CHARS.is_match(part)
}

// ============================================================================
// TESTS
// ============================================================================
