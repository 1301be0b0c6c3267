//! Sources of a preferred language when nothing is saved yet.

use crate::application::ports::LanguageSignal;
use crate::domain::locale::Locale;

/// The operating system's UI locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLocale;

impl LanguageSignal for SystemLocale {
    fn language_tag(&self) -> Option<String> {
        sys_locale::get_locale()
    }
}

/// A browser's `Accept-Language` header value.
///
/// Entries are ranked by quality, ties keeping header order, and the
/// best-ranked one naming a supported language wins. Entries with `q=0` or
/// the `*` wildcard are never chosen.
#[derive(Debug, Clone, Default)]
pub struct AcceptLanguage(String);

impl AcceptLanguage {
    pub fn new(header: impl Into<String>) -> Self {
        Self(header.into())
    }

    /// Language tags in preference order.
    pub fn ranked(&self) -> Vec<&str> {
        let mut entries: Vec<(&str, f32)> = self
            .0
            .split(',')
            .filter_map(parse_entry)
            .filter(|(tag, quality)| *tag != "*" && *quality > 0.0)
            .collect();
        // Stable sort keeps header order for equal quality
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        entries.into_iter().map(|(tag, _)| tag).collect()
    }
}

/// Parse `en-US;q=0.8` into `("en-US", 0.8)`. Missing or malformed
/// quality values count as 1.
fn parse_entry(entry: &str) -> Option<(&str, f32)> {
    let mut parts = entry.split(';');
    let tag = parts.next()?.trim();
    if tag.is_empty() {
        return None;
    }

    let quality = parts
        .filter_map(|param| param.trim().strip_prefix("q="))
        .next()
        .map(|q| q.trim().parse::<f32>().unwrap_or(1.0))
        .unwrap_or(1.0);
    Some((tag, quality))
}

impl LanguageSignal for AcceptLanguage {
    fn language_tag(&self) -> Option<String> {
        let ranked = self.ranked();
        ranked
            .iter()
            .find(|tag| Locale::from_language_tag(tag).is_some())
            .or_else(|| ranked.first())
            .map(|tag| tag.to_string())
    }
}

/// A fixed answer, for tests and for callers that already know the tag.
#[derive(Debug, Clone, Default)]
pub struct FixedTag(Option<String>);

impl FixedTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(Some(tag.into()))
    }

    /// A signal that never yields a tag.
    pub fn none() -> Self {
        Self(None)
    }
}

impl LanguageSignal for FixedTag {
    fn language_tag(&self) -> Option<String> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_language_quality_order() {
        let header = AcceptLanguage::new("fr;q=0.3, ja-JP;q=0.9, en;q=0.9, ko;q=0.5");
        assert_eq!(header.ranked(), vec!["ja-JP", "en", "ko", "fr"]);
        assert_eq!(header.language_tag().as_deref(), Some("ja-JP"));
    }

    #[test]
    fn test_accept_language_default_quality() {
        let header = AcceptLanguage::new("en-US,en;q=0.9,ko;q=0.8");
        assert_eq!(header.language_tag().as_deref(), Some("en-US"));
    }

    #[test]
    fn test_accept_language_prefers_supported_language() {
        let header = AcceptLanguage::new("fr, ja;q=0.9");
        assert_eq!(header.ranked(), vec!["fr", "ja"]);
        assert_eq!(header.language_tag().as_deref(), Some("ja"));

        // Nothing supported: the top entry is still reported
        let header = AcceptLanguage::new("fr-FR, de;q=0.5");
        assert_eq!(header.language_tag().as_deref(), Some("fr-FR"));
    }

    #[test]
    fn test_accept_language_skips_wildcard_and_zero() {
        let header = AcceptLanguage::new("*, de;q=0, ja;q=0.1");
        assert_eq!(header.ranked(), vec!["ja"]);
    }

    #[test]
    fn test_accept_language_empty() {
        assert_eq!(AcceptLanguage::new("").language_tag(), None);
        assert_eq!(AcceptLanguage::new(" , ;q=1").language_tag(), None);
    }

    #[test]
    fn test_fixed_tag() {
        assert_eq!(FixedTag::new("ko-KR").language_tag().as_deref(), Some("ko-KR"));
        assert_eq!(FixedTag::none().language_tag(), None);
    }

    #[test]
    fn test_system_locale_does_not_panic() {
        let _ = SystemLocale.language_tag();
    }
}
