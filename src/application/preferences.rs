//! Per-session locale resolution.
//!
//! A saved preference wins over the environment's language signal, which
//! wins over the default locale. Once resolved, the active locale only
//! changes through [`PreferenceResolver::set_locale`].

use crate::application::ports::{LanguageSignal, PreferenceStore, PREFERENCE_KEY};
use crate::domain::locale::{Locale, LocaleError};
use crate::domain::translations::Translations;
use crate::infrastructure::catalog;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

const UNRESOLVED: u8 = 0;

/// Where a resolved locale came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleSource {
    /// A valid tag saved by an earlier session
    Stored,
    /// The environment's language signal
    Detected,
    /// Nothing usable was found
    Default,
}

/// Chooses and remembers the active locale for one client session.
pub struct PreferenceResolver<P, L>
where
    P: PreferenceStore,
    L: LanguageSignal,
{
    store: P,
    signal: L,
    active: AtomicU8,
}

impl<P, L> PreferenceResolver<P, L>
where
    P: PreferenceStore,
    L: LanguageSignal,
{
    /// Create an unresolved resolver over `store` and `signal`.
    pub fn new(store: P, signal: L) -> Self {
        Self {
            store,
            signal,
            active: AtomicU8::new(UNRESOLVED),
        }
    }

    /// Determine the active locale.
    ///
    /// The first call consults storage, then the signal, then falls back to
    /// the default, and caches the answer in memory. Later calls return the
    /// cached locale. Detected and default locales are not persisted.
    pub fn resolve(&self) -> Locale {
        if let Some(locale) = self.locale() {
            return locale;
        }

        let (locale, source) = self.detect();
        tracing::debug!(locale = locale.tag(), ?source, "locale resolved");

        // A concurrent set_locale wins over detection
        match self.active.compare_exchange(
            UNRESOLVED,
            locale.to_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => locale,
            Err(current) => Locale::from_u8(current).unwrap_or(locale),
        }
    }

    fn detect(&self) -> (Locale, LocaleSource) {
        if let Some(saved) = self.store.load(PREFERENCE_KEY) {
            match saved.parse::<Locale>() {
                Ok(locale) => return (locale, LocaleSource::Stored),
                Err(e) => tracing::debug!(error = %e, "ignoring saved locale"),
            }
        }

        if let Some(locale) = self
            .signal
            .language_tag()
            .as_deref()
            .and_then(Locale::from_language_tag)
        {
            return (locale, LocaleSource::Detected);
        }

        (Locale::DEFAULT, LocaleSource::Default)
    }

    /// Make `locale` active and persist it.
    ///
    /// The in-memory change is visible immediately. A failed write is logged
    /// and otherwise ignored; the session keeps the new locale.
    pub fn set_locale(&self, locale: Locale) {
        self.active.store(locale.to_u8(), Ordering::Release);

        if let Err(e) = self.store.save(PREFERENCE_KEY, locale.tag()) {
            tracing::warn!(locale = locale.tag(), error = %e, "failed to persist locale preference");
        }
    }

    /// Parse `tag` and make it active.
    ///
    /// # Errors
    /// Returns `LocaleError::InvalidLocale` for tags outside the supported
    /// set; the active locale is left unchanged.
    pub fn set_locale_tag(&self, tag: &str) -> Result<Locale, LocaleError> {
        let locale = tag.parse::<Locale>()?;
        self.set_locale(locale);
        Ok(locale)
    }

    /// The active locale, or `None` before the first `resolve`/`set_locale`.
    pub fn locale(&self) -> Option<Locale> {
        Locale::from_u8(self.active.load(Ordering::Acquire))
    }

    /// Table for the active locale. Before resolution this is the default
    /// locale's table.
    pub fn current_translations(&self) -> &'static Translations {
        catalog::translations(self.locale().unwrap_or(Locale::DEFAULT))
    }

    /// Get a reference to the durable store.
    pub fn store(&self) -> &P {
        &self.store
    }
}

impl<P, L> fmt::Debug for PreferenceResolver<P, L>
where
    P: PreferenceStore,
    L: LanguageSignal,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferenceResolver")
            .field("store", &self.store)
            .field("signal", &self.signal)
            .field("active", &self.locale())
            .finish()
    }
}
