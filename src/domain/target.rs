use crate::error::AuditError;
use std::fmt;
use url::Url;

/// A validated audit target.
///
/// Bare hosts such as `example.gov` get `https` as the primary URL and
/// `http` as a fallback. Explicit `http://` and `https://` URLs are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTarget {
    raw: String,
    url: Url,
    fallback: Option<Url>,
}

impl AuditTarget {
    pub fn parse(raw: &str) -> Result<Self, AuditError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AuditError::MissingDomain);
        }

        let invalid = |reason: String| AuditError::InvalidTarget {
            target: trimmed.to_string(),
            reason,
        };

        if trimmed.contains("://") {
            let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
            match url.scheme() {
                "http" | "https" => {}
                other => return Err(invalid(format!("unsupported scheme {other}"))),
            }
            ensure_host(&url).map_err(invalid)?;
            return Ok(Self {
                raw: trimmed.to_string(),
                url,
                fallback: None,
            });
        }

        if trimmed.starts_with('-') || trimmed.starts_with('/') {
            return Err(invalid("expected a domain name".to_string()));
        }

        let url = Url::parse(&format!("https://{trimmed}")).map_err(|e| invalid(e.to_string()))?;
        ensure_host(&url).map_err(invalid)?;
        let mut fallback = url.clone();
        fallback
            .set_scheme("http")
            .map_err(|()| invalid("cannot downgrade to http".to_string()))?;

        Ok(Self {
            raw: trimmed.to_string(),
            url,
            fallback: Some(fallback),
        })
    }

    /// The value as the client sent it, trimmed.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Plain-http URL to try when a bare host does not answer over https.
    #[must_use]
    pub fn fallback(&self) -> Option<&Url> {
        self.fallback.as_ref()
    }

    /// URLs to try, in order.
    pub fn candidates(&self) -> impl Iterator<Item = &Url> {
        std::iter::once(&self.url).chain(self.fallback.iter())
    }
}

impl fmt::Display for AuditTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

fn ensure_host(url: &Url) -> Result<(), String> {
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err("missing host".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bare_domain_prefers_https() {
        let target = AuditTarget::parse("www.zombo.com").unwrap();
        assert_eq!(target.url().as_str(), "https://www.zombo.com/");
        assert_eq!(target.fallback().unwrap().as_str(), "http://www.zombo.com/");
        assert_eq!(target.raw(), "www.zombo.com");
    }

    #[test]
    fn test_bare_domain_keeps_port_and_path() {
        let target = AuditTarget::parse("localhost:8080/about").unwrap();
        assert_eq!(target.url().as_str(), "https://localhost:8080/about");
        assert_eq!(
            target.fallback().unwrap().as_str(),
            "http://localhost:8080/about"
        );
    }

    #[test]
    fn test_explicit_scheme_has_no_fallback() {
        let target = AuditTarget::parse("http://standards.usa.gov/").unwrap();
        assert_eq!(target.url().as_str(), "http://standards.usa.gov/");
        assert!(target.fallback().is_none());
        assert_eq!(target.candidates().count(), 1);
    }

    #[test]
    fn test_whitespace_trimmed() {
        let target = AuditTarget::parse("  www.treasury.gov \n").unwrap();
        assert_eq!(target.url().host_str(), Some("www.treasury.gov"));
    }

    #[test]
    fn test_empty_is_missing_domain() {
        assert!(matches!(
            AuditTarget::parse("   "),
            Err(AuditError::MissingDomain)
        ));
    }

    #[test]
    fn test_unsupported_scheme_rejected() {
        let err = AuditTarget::parse("file:///etc/passwd").unwrap_err();
        assert!(matches!(err, AuditError::InvalidTarget { .. }));
        assert!(err.to_string().contains("unsupported scheme file"));
    }

    #[test]
    fn test_flag_like_value_rejected() {
        assert!(matches!(
            AuditTarget::parse("--config=/tmp/evil.json"),
            Err(AuditError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(AuditTarget::parse("exa mple.gov").is_err());
        assert!(AuditTarget::parse("https://").is_err());
    }

    #[test]
    fn test_candidates_order() {
        let target = AuditTarget::parse("example.gov").unwrap();
        let schemes: Vec<_> = target.candidates().map(Url::scheme).collect();
        assert_eq!(schemes, vec!["https", "http"]);
    }

    proptest! {
        #[test]
        fn prop_bare_hosts_normalize(label in "[a-z][a-z0-9]{0,15}", tld in "(gov|com|org)") {
            let domain = format!("{label}.{tld}");
            let target = AuditTarget::parse(&domain).unwrap();
            prop_assert_eq!(target.url().scheme(), "https");
            prop_assert_eq!(target.url().host_str(), Some(domain.as_str()));
            prop_assert!(!target.to_string().starts_with('-'));
        }
    }
}
