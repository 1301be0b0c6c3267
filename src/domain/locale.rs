//! Supported site locales.
//!
//! The site ships in exactly three languages. A [`Locale`] is always one of
//! them; anything else is rejected at the parsing boundary.

use std::fmt;
use std::str::FromStr;

/// A supported site language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Locale {
    /// Korean (default)
    Ko = 1,
    /// English
    En = 2,
    /// Japanese
    Ja = 3,
}

impl Locale {
    /// All supported locales in language-switcher order.
    pub const ALL: [Locale; 3] = [Locale::Ko, Locale::En, Locale::Ja];

    /// Locale used when nothing else resolves.
    pub const DEFAULT: Locale = Locale::Ko;

    /// The tag persisted in durable storage.
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::Ko => "ko",
            Locale::En => "en",
            Locale::Ja => "ja",
        }
    }

    /// Name of the language written in that language.
    pub fn native_name(&self) -> &'static str {
        match self {
            Locale::Ko => "한국어",
            Locale::En => "English",
            Locale::Ja => "日本語",
        }
    }

    /// Flag shown next to the name in the switcher.
    pub fn flag(&self) -> &'static str {
        match self {
            Locale::Ko => "🇰🇷",
            Locale::En => "🇺🇸",
            Locale::Ja => "🇯🇵",
        }
    }

    /// Map an external language tag such as `"ja-JP"` or `"en_US.UTF-8"`
    /// to a supported locale.
    ///
    /// Only the primary subtag is compared, case-insensitively. Returns
    /// `None` when the language is not supported.
    ///
    /// # Example
    /// ```
    /// use eunpa_salon::Locale;
    ///
    /// assert_eq!(Locale::from_language_tag("ja-JP"), Some(Locale::Ja));
    /// assert_eq!(Locale::from_language_tag("EN"), Some(Locale::En));
    /// assert_eq!(Locale::from_language_tag("fr-FR"), None);
    /// ```
    pub fn from_language_tag(tag: &str) -> Option<Locale> {
        let primary = tag
            .trim()
            .split(['-', '_', '.'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match primary.as_str() {
            "ko" => Some(Locale::Ko),
            "en" => Some(Locale::En),
            "ja" => Some(Locale::Ja),
            _ => None,
        }
    }

    pub(crate) fn to_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_u8(value: u8) -> Option<Locale> {
        match value {
            1 => Some(Locale::Ko),
            2 => Some(Locale::En),
            3 => Some(Locale::Ja),
            _ => None,
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::DEFAULT
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    /// Parse a stored locale tag. Only the exact tags `ko`, `en` and `ja`
    /// are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::ALL
            .into_iter()
            .find(|locale| locale.tag() == s)
            .ok_or_else(|| LocaleError::InvalidLocale(s.to_string()))
    }
}

/// Error returned when a tag is not one of the supported locales.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleError {
    /// The tag is outside the supported set
    InvalidLocale(String),
}

impl fmt::Display for LocaleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocaleError::InvalidLocale(tag) => {
                write!(f, "unsupported locale tag {:?} (expected ko, en or ja)", tag)
            }
        }
    }
}

impl std::error::Error for LocaleError {}
