use std::fmt::Write;

use anyhow::{Context, Result};

use glucolog_core::service::TrackerService;

/// Resolve a profile name to its user id, creating the profile (with a
/// fresh API key) on first use.
pub(crate) fn resolve_user(svc: &TrackerService, name: &str) -> Result<i64> {
    if let Some(user) = svc.get_user_by_name(name)? {
        return Ok(user.id);
    }
    let user = svc
        .create_user(name, &generate_api_key())
        .with_context(|| format!("Failed to create profile '{name}'"))?;
    eprintln!("Created profile '{name}'");
    Ok(user.id)
}

/// 32 random bytes, hex-encoded. Used as the per-user REST API key.
pub(crate) fn generate_api_key() -> String {
    use rand::Rng;

    let bytes: [u8; 32] = rand::rng().random();
    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

pub(crate) fn fmt_mmol(value: Option<f64>) -> String {
    value.map_or("-".into(), |v| format!("{v:.1}"))
}

pub(crate) fn fmt_change(value: Option<f64>) -> String {
    value.map_or("-".into(), |v| format!("{v:+.1}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_api_key_is_64_hex_chars() {
        let key = generate_api_key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_api_key_is_not_constant() {
        assert_ne!(generate_api_key(), generate_api_key());
    }

    #[test]
    fn test_resolve_user_creates_then_reuses() {
        let svc = TrackerService::new_in_memory().unwrap();
        let first = resolve_user(&svc, "default").unwrap();
        let second = resolve_user(&svc, "default").unwrap();
        assert_eq!(first, second);
        assert_eq!(svc.list_users().unwrap().len(), 1);
    }

    #[test]
    fn test_fmt_mmol() {
        assert_eq!(fmt_mmol(Some(5.0)), "5.0");
        assert_eq!(fmt_mmol(None), "-");
    }

    #[test]
    fn test_fmt_change_keeps_sign() {
        assert_eq!(fmt_change(Some(2.2)), "+2.2");
        assert_eq!(fmt_change(Some(-1.0)), "-1.0");
        assert_eq!(fmt_change(Some(0.0)), "+0.0");
        assert_eq!(fmt_change(None), "-");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
        assert_eq!(truncate("Müsli", 10), "Müsli");
    }
}
