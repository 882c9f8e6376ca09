//! Helpers for paymail handles, domains and timestamps.

use chrono::{DateTime, Utc};

use crate::{PaymailError, Result};

/// Allowed clock skew for request timestamps, in seconds.
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 120;

/// Split a paymail into `(alias, domain, address)`.
///
/// Removes a `mailto:` prefix and all whitespace, then lowercases. The
/// address is empty unless both alias and domain are present.
pub fn sanitize_paymail(paymail: &str) -> (String, String, String) {
    let cleaned: String = paymail
        .to_lowercase()
        .replace("mailto:", "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let mut parts = cleaned.splitn(2, '@');
    let alias = parts.next().unwrap_or_default().to_string();
    let domain = parts.next().unwrap_or_default().to_string();

    let address = if alias.is_empty() || domain.is_empty() {
        String::new()
    } else {
        format!("{}@{}", alias, domain)
    };
    (alias, domain, address)
}

/// Check that a paymail has the shape `alias@domain.tld`.
pub fn validate_paymail(paymail: &str) -> Result<()> {
    let invalid = || {
        PaymailError::ValidationFailed(
            "paymail address failed format validation: email is not a valid address format"
                .to_string(),
        )
    };

    let (alias, domain) = paymail.rsplit_once('@').ok_or_else(invalid)?;
    let alias_ok = !alias.is_empty()
        && !alias.starts_with('.')
        && !alias.ends_with('.')
        && alias
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._-+".contains(c));
    if !alias_ok || !is_valid_hostname(domain) {
        return Err(invalid());
    }
    Ok(())
}

/// Check that `domain` is a host name with at least two labels.
pub fn validate_domain(domain: &str) -> Result<()> {
    if !is_valid_hostname(domain) {
        return Err(PaymailError::ValidationFailed(format!(
            "domain name is invalid: {}",
            domain
        )));
    }
    Ok(())
}

fn is_valid_hostname(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > 253 {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}

/// Expand wallet shorthand handles into paymail addresses.
///
/// `$handle` maps to HandCash (`@beta.handcash.io` when `is_beta`) and short
/// handles starting with `1` map to RelayX. Anything else is returned as-is.
pub fn convert_handle(handle: &str, is_beta: bool) -> String {
    if let Some(rest) = handle.strip_prefix('$') {
        let alias = rest.replace('$', "").to_lowercase();
        let domain = if is_beta { "beta.handcash.io" } else { "handcash.io" };
        return format!("{}@{}", alias, domain);
    }
    if handle.starts_with('1') && handle.len() < 25 && !handle.contains('@') {
        return format!("{}@relayx.io", handle.replace('1', "").to_lowercase());
    }
    handle.to_string()
}

/// Check an RFC 3339 timestamp is within two minutes of now.
pub fn validate_timestamp(timestamp: &str) -> Result<()> {
    validate_timestamp_at(timestamp, Utc::now())
}

pub(crate) fn validate_timestamp_at(timestamp: &str, now: DateTime<Utc>) -> Result<()> {
    let parsed = DateTime::parse_from_rfc3339(timestamp).map_err(|e| {
        PaymailError::invalid_data("dt", format!("invalid timestamp {}: {}", timestamp, e))
    })?;

    let skew = (now - parsed.with_timezone(&Utc)).num_seconds().abs();
    if skew > TIMESTAMP_TOLERANCE_SECS {
        return Err(PaymailError::ValidationFailed(format!(
            "timestamp {} is {}s away from the current time",
            timestamp, skew
        )));
    }
    Ok(())
}

/// Substitute `{alias}` and `{domain.tld}` in an endpoint template.
pub fn replace_alias_domain(template: &str, alias: &str, domain: &str) -> String {
    template
        .replace("{alias}", alias)
        .replace("{domain.tld}", domain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_sanitize_paymail() {
        let cases = [
            ("test@domain.com", "test", "domain.com", "test@domain.com"),
            ("TEST@DomaiN.COM", "test", "domain.com", "test@domain.com"),
            ("@DomaiN.COM", "", "domain.com", ""),
            ("test@", "test", "", ""),
            ("test@domain", "test", "domain", "test@domain"),
            ("domain.com", "domain.com", "", ""),
            ("1337@Moneybutton.com", "1337", "moneybutton.com", "1337@moneybutton.com"),
            ("mailto: Test@Domain.com ", "test", "domain.com", "test@domain.com"),
            ("", "", "", ""),
        ];
        for (input, alias, domain, address) in cases {
            let out = sanitize_paymail(input);
            assert_eq!(out, (alias.into(), domain.into(), address.into()), "input {}", input);
        }
    }

    #[test]
    fn test_validate_paymail() {
        assert!(validate_paymail("test@domain.com").is_ok());
        for bad in [
            "test@example",
            "@example",
            "example",
            "test@.",
            "test@.com",
            "test@.com..",
            "test@.com.",
        ] {
            let err = validate_paymail(bad).unwrap_err();
            assert!(err.to_string().contains("email is not a valid address format"));
        }
    }

    #[test]
    fn test_validate_domain() {
        for good in ["example.com", "google.com", "example.c"] {
            assert!(validate_domain(good).is_ok(), "{}", good);
        }
        for bad in ["domain", "test@domain.com", "example..", ""] {
            let err = validate_domain(bad).unwrap_err();
            assert!(err.to_string().contains("domain name is invalid"), "{}", bad);
        }
    }

    #[test]
    fn test_convert_handle() {
        let cases = [
            ("$mr-z", false, "mr-z@handcash.io"),
            ("$MR-Z", false, "mr-z@handcash.io"),
            ("invalid$mr-z", false, "invalid$mr-z"),
            ("$", false, "@handcash.io"),
            ("$", true, "@beta.handcash.io"),
            ("1handle", false, "handle@relayx.io"),
            ("1337@moneybutton.com", false, "1337@moneybutton.com"),
            ("1337", false, "337@relayx.io"),
            (
                "1PN7K19Jmj7QQCpUg37WHpSRUw5gKhJVRa",
                false,
                "1PN7K19Jmj7QQCpUg37WHpSRUw5gKhJVRa",
            ),
            ("$misterz", true, "misterz@beta.handcash.io"),
        ];
        for (handle, beta, expected) in cases {
            assert_eq!(convert_handle(handle, beta), expected, "handle {}", handle);
        }
    }

    #[test]
    fn test_validate_timestamp() {
        let now = Utc::now();
        let fmt = |d: DateTime<Utc>| d.to_rfc3339();

        assert!(validate_timestamp_at(&fmt(now), now).is_ok());
        assert!(validate_timestamp_at(&fmt(now - Duration::seconds(118)), now).is_ok());
        assert!(validate_timestamp_at(&fmt(now + Duration::seconds(118)), now).is_ok());
        assert!(validate_timestamp_at(&fmt(now - Duration::seconds(122)), now).is_err());
        assert!(validate_timestamp_at(&fmt(now + Duration::seconds(122)), now).is_err());

        for bad in [
            "",
            "0000-00-00T00:00:00Z",
            "12345",
            "2018-01-01",
            "2020-04-09 12:00",
            "2020-04-09T12:00:00",
            "abcdef",
        ] {
            assert!(validate_timestamp(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_replace_alias_domain() {
        assert_eq!(
            replace_alias_domain("https://h/id/{alias}@{domain.tld}", "mrz", "test.com"),
            "https://h/id/mrz@test.com"
        );
    }
}
