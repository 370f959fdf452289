/// Locales the service has message catalogs for.
const SUPPORTED: &[&str] = &["en-US", "pt-BR"];

/// Caller-preferred locale, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(String);

impl Locale {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Resolve an `Accept-Language` header value against the supported set,
/// falling back to the configured default when absent or unrecognized.
/// Quality weights are ignored; tags are tried in header order.
pub fn resolve(header: Option<&str>, default: &str) -> Locale {
    if let Some(header) = header {
        for tag in header.split(',') {
            let tag = tag.split(';').next().unwrap_or("").trim();
            if tag.is_empty() {
                continue;
            }
            for supported in SUPPORTED {
                if supported.eq_ignore_ascii_case(tag) {
                    return Locale(supported.to_string());
                }
                // Bare language tag, e.g. "en" -> "en-US"
                let lang = supported.split('-').next().unwrap_or(supported);
                if lang.eq_ignore_ascii_case(tag) {
                    return Locale(supported.to_string());
                }
            }
        }
    }
    Locale(default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_header_falls_back_to_default() {
        assert_eq!(resolve(None, "en-US").as_str(), "en-US");
    }

    #[test]
    fn test_exact_match() {
        assert_eq!(resolve(Some("pt-BR"), "en-US").as_str(), "pt-BR");
    }

    #[test]
    fn test_language_only_tag() {
        assert_eq!(resolve(Some("pt"), "en-US").as_str(), "pt-BR");
    }

    #[test]
    fn test_quality_weights_are_stripped() {
        assert_eq!(resolve(Some("pt-BR;q=0.9,en;q=0.8"), "en-US").as_str(), "pt-BR");
    }

    #[test]
    fn test_unrecognized_falls_back_to_default() {
        assert_eq!(resolve(Some("fr-FR,de"), "en-US").as_str(), "en-US");
    }
}
