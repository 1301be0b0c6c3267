//! Typed translation tables.
//!
//! Every locale has one [`Translations`] value with exactly the same shape.
//! The shape is enforced by deserialization: tables with missing or unknown
//! keys do not load. UI code can either read fields directly
//! (`t.contact.title`) or resolve string keys with [`Translations::lookup`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Complete set of localized strings for one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Translations {
    pub salon_name: String,
    pub header: HeaderText,
    pub hero: HeroText,
    pub services: ServicesText,
    pub pricing: PricingText,
    pub contact: ContactText,
    pub footer: FooterText,
    pub services_list: ServiceNames,
    pub service_descriptions: ServiceDescriptions,
}

/// Navigation labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HeaderText {
    pub home: String,
    pub services: String,
    pub pricing: String,
    pub contact: String,
    pub book_now: String,
}

/// Hero banner copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HeroText {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub book_now: String,
    pub view_services: String,
    pub experience: String,
    pub satisfied: String,
    pub hygiene: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServicesText {
    pub title: String,
    pub subtitle: String,
    pub special_title: String,
    pub special_description: String,
    pub book_consultation: String,
}

/// Pricing section, including the bullet lists for each package tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PricingText {
    pub title: String,
    pub subtitle: String,
    pub individual_title: String,
    pub discount_title: String,
    pub discount_description: String,
    pub get_coupon: String,
    pub popular: String,
    pub basic_package: String,
    pub premium_package: String,
    pub all_in_one_package: String,
    pub basic_features: Vec<String>,
    pub premium_features: Vec<String>,
    pub all_in_one_features: Vec<String>,
}

/// Contact details and reservation form labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContactText {
    pub title: String,
    pub subtitle: String,
    pub contact_info: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub hours: String,
    pub hours_detail: String,
    pub reservation_form: String,
    pub name: String,
    pub phone_number: String,
    pub email_address: String,
    pub preferred_date: String,
    pub preferred_time: String,
    pub select_time: String,
    pub desired_service: String,
    pub select_service: String,
    pub additional_requests: String,
    pub additional_requests_placeholder: String,
    pub submit: String,
    pub submitting: String,
    pub success_message: String,
    pub error_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FooterText {
    pub description: String,
    pub quick_links: String,
    pub contact: String,
    pub rights: String,
    pub privacy: String,
    pub terms: String,
    pub sitemap: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceNames {
    pub cut: String,
    pub perm: String,
    pub color: String,
    pub upstyle: String,
    pub care: String,
    pub makeup: String,
    pub scalp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceDescriptions {
    pub cut: String,
    pub perm: String,
    pub care: String,
    pub upstyle: String,
    pub makeup: String,
    pub scalp: String,
}

/// Value found at a translation key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationValue {
    /// A single string
    Text(String),
    /// An ordered list of strings (feature bullets)
    List(Vec<String>),
}

impl TranslationValue {
    /// The string, if this value is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TranslationValue::Text(text) => Some(text),
            TranslationValue::List(_) => None,
        }
    }
}

impl Translations {
    /// Resolve a key in the JSON naming used by the UI layer.
    ///
    /// Groups are separated by `.`, list entries are addressed with `[n]`.
    ///
    /// # Example
    /// ```
    /// use eunpa_salon::{catalog, Locale};
    /// use eunpa_salon::domain::translations::TranslationValue;
    ///
    /// let t = catalog::translations(Locale::En);
    /// assert_eq!(
    ///     t.lookup("contact.title"),
    ///     Some(TranslationValue::Text("Reservation & Contact".to_string()))
    /// );
    /// assert_eq!(
    ///     t.lookup("pricing.basicFeatures[0]").as_ref().and_then(|v| v.as_text()),
    ///     Some("Cut & Styling")
    /// );
    /// assert_eq!(t.lookup("contact.nope"), None);
    /// ```
    pub fn lookup(&self, key: &str) -> Option<TranslationValue> {
        let tree = serde_json::to_value(self).ok()?;
        let mut node = &tree;

        for segment in key.split('.') {
            let (name, index) = parse_segment(segment)?;
            node = node.as_object()?.get(name)?;
            if let Some(index) = index {
                node = node.as_array()?.get(index)?;
            }
        }

        match node {
            Value::String(text) => Some(TranslationValue::Text(text.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(TranslationValue::List),
            _ => None,
        }
    }

    /// Every leaf key path in this table, list entries included by index.
    ///
    /// Two tables have the same shape exactly when their key paths are equal.
    pub fn key_paths(&self) -> BTreeSet<String> {
        let mut paths = BTreeSet::new();
        if let Ok(tree) = serde_json::to_value(self) {
            collect_paths(&tree, String::new(), &mut paths);
        }
        paths
    }
}

/// Split `name[3]` into `("name", Some(3))`.
fn parse_segment(segment: &str) -> Option<(&str, Option<usize>)> {
    match segment.split_once('[') {
        None => Some((segment, None)),
        Some((name, rest)) => {
            let index = rest.strip_suffix(']')?.parse().ok()?;
            Some((name, Some(index)))
        }
    }
}

fn collect_paths(node: &Value, prefix: String, paths: &mut BTreeSet<String>) {
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                collect_paths(child, path, paths);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect_paths(child, format!("{}[{}]", prefix, index), paths);
            }
        }
        _ => {
            paths.insert(prefix);
        }
    }
}
