//! Embedded translation tables.
//!
//! The tables are compiled into the binary from `locales/*.json` and
//! deserialized once, on first access. Every later lookup is a reference to
//! the same `'static` table.

use crate::domain::locale::Locale;
use crate::domain::translations::Translations;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

const KO_SOURCE: &str = include_str!("../../locales/ko.json");
const EN_SOURCE: &str = include_str!("../../locales/en.json");
const JA_SOURCE: &str = include_str!("../../locales/ja.json");

struct Catalog {
    ko: Translations,
    en: Translations,
    ja: Translations,
}

static CATALOG: OnceLock<Catalog> = OnceLock::new();

fn source(locale: Locale) -> &'static str {
    match locale {
        Locale::Ko => KO_SOURCE,
        Locale::En => EN_SOURCE,
        Locale::Ja => JA_SOURCE,
    }
}

fn parse(locale: Locale) -> Translations {
    match serde_json::from_str(source(locale)) {
        Ok(table) => table,
        Err(e) => {
            tracing::error!(locale = locale.tag(), error = %e, "embedded translation table is invalid");
            Translations::default()
        }
    }
}

fn catalog() -> &'static Catalog {
    CATALOG.get_or_init(|| Catalog {
        ko: parse(Locale::Ko),
        en: parse(Locale::En),
        ja: parse(Locale::Ja),
    })
}

/// The translation table for `locale`.
///
/// # Example
/// ```
/// use eunpa_salon::{catalog, Locale};
///
/// assert_eq!(catalog::translations(Locale::Ja).header.home, "ホーム");
/// ```
pub fn translations(locale: Locale) -> &'static Translations {
    let catalog = catalog();
    match locale {
        Locale::Ko => &catalog.ko,
        Locale::En => &catalog.en,
        Locale::Ja => &catalog.ja,
    }
}

/// A locale whose key paths differ from the default locale's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParityError {
    pub locale: Locale,
    /// Paths present in the default table but not in this one
    pub missing: Vec<String>,
    /// Paths present in this table but not in the default one
    pub extra: Vec<String>,
}

impl fmt::Display for ParityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translation table {} differs from {}: missing [{}], extra [{}]",
            self.locale,
            Locale::DEFAULT,
            self.missing.join(", "),
            self.extra.join(", ")
        )
    }
}

impl std::error::Error for ParityError {}

/// Compare two tables' key paths.
///
/// # Errors
/// Returns `ParityError` naming `locale` if the shapes differ.
pub fn compare(
    reference: &Translations,
    locale: Locale,
    table: &Translations,
) -> Result<(), ParityError> {
    let expected = reference.key_paths();
    let actual = table.key_paths();
    if expected == actual {
        return Ok(());
    }

    let diff = |a: &BTreeSet<String>, b: &BTreeSet<String>| -> Vec<String> {
        a.difference(b).cloned().collect()
    };
    Err(ParityError {
        locale,
        missing: diff(&expected, &actual),
        extra: diff(&actual, &expected),
    })
}

/// Check that every embedded table has the same key paths, list lengths
/// included, as the default locale's.
///
/// # Errors
/// Returns the first locale that differs.
pub fn verify_parity() -> Result<(), ParityError> {
    let reference = translations(Locale::DEFAULT);
    Locale::ALL
        .into_iter()
        .filter(|locale| *locale != Locale::DEFAULT)
        .try_for_each(|locale| compare(reference, locale, translations(locale)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::translations::TranslationValue;

    #[test]
    fn test_embedded_tables_parse() {
        for locale in Locale::ALL {
            let table: Translations = serde_json::from_str(source(locale))
                .unwrap_or_else(|e| panic!("{} table is invalid: {}", locale, e));
            assert_eq!(&table, translations(locale));
        }
    }

    #[test]
    fn test_embedded_tables_have_parity() {
        assert_eq!(verify_parity(), Ok(()));
    }

    #[test]
    fn test_known_strings() {
        assert_eq!(translations(Locale::Ko).salon_name, "은파미용실");
        assert_eq!(translations(Locale::En).salon_name, "Eunpa Beauty Salon");
        assert_eq!(translations(Locale::Ja).salon_name, "銀波美容室");
        assert_eq!(translations(Locale::Ko).contact.title, "예약 및 문의");
        assert_eq!(translations(Locale::Ja).contact.title, "予約・お問い合わせ");
    }

    #[test]
    fn test_feature_lists_are_ordered() {
        let en = translations(Locale::En);
        assert_eq!(en.pricing.basic_features.len(), 4);
        assert_eq!(en.pricing.premium_features.len(), 6);
        assert_eq!(en.pricing.all_in_one_features.len(), 8);
        assert_eq!(
            en.lookup("pricing.allInOneFeatures[7]"),
            Some(TranslationValue::Text("Follow-up Care Consultation".to_string()))
        );
    }

    #[test]
    fn test_multiline_hours_survive() {
        assert_eq!(translations(Locale::En).contact.hours_detail.lines().count(), 3);
    }

    #[test]
    fn test_compare_reports_differences() {
        let reference = translations(Locale::Ko);
        let mut table = translations(Locale::En).clone();
        table.pricing.basic_features.pop();
        table.pricing.premium_features.push("Extra".to_string());

        let err = compare(reference, Locale::En, &table).unwrap_err();
        assert_eq!(err.locale, Locale::En);
        assert_eq!(err.missing, vec!["pricing.basicFeatures[3]".to_string()]);
        assert_eq!(err.extra, vec!["pricing.premiumFeatures[6]".to_string()]);
        assert!(err.to_string().contains("pricing.basicFeatures[3]"));
    }
}
