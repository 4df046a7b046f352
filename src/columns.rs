//! Column header canonicalization.
//!
//! Every input file names the same concept differently ("Org ID",
//! "organisation_id", "Company Id"). Headers are reduced to a normalized text
//! form and resolved through an [`AliasRegistry`] to a canonical field name.
//! Headers the registry does not know pass through as their normalized text
//! and become ad-hoc fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const ORGANISATION_ID: &str = "organisation_id";
pub const CUSTOMER: &str = "customer";
pub const NAME: &str = "name";
pub const PRODUCT_STATUS: &str = "product_status";
pub const ENGAGEMENT_STATUS: &str = "engagement_status";
pub const CARBON_FACTOR: &str = "carbon_factor";
pub const NEXT_ACTIVITY_DUE_DATE: &str = "next_activity_due_date";

const BUILTIN_ALIASES: &[(&str, &[&str])] = &[
    (
        ORGANISATION_ID,
        &[
            "organisation id",
            "org id",
            "organisationid",
            "organization id",
            "company id",
        ],
    ),
    (CUSTOMER, &["customer", "client", "account", "buyer"]),
    (
        NAME,
        &[
            "name",
            "contact name",
            "full name",
            "contractor",
            "contractor name",
        ],
    ),
    (PRODUCT_STATUS, &["product status", "status product"]),
    (
        ENGAGEMENT_STATUS,
        &[
            "engagement status",
            "status engagement",
            "project status",
        ],
    ),
    (
        CARBON_FACTOR,
        &["carbon factor", "co2 factor", "emissions factor"],
    ),
    (
        NEXT_ACTIVITY_DUE_DATE,
        &[
            "next activity due date",
            "next due",
            "due date",
            "next activity",
            "next action due",
        ],
    ),
];

/// Lower-cases `raw`, collapses every run of characters outside `[a-z0-9]`
/// into a single space and trims the result.
pub fn normalize_header_text(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_space = false;
    for ch in lowered.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Resolves `raw` against the built-in registry.
pub fn canonicalize_header(raw: &str) -> String {
    AliasRegistry::builtin().canonicalize(raw)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalField {
    pub name: String,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRegistry {
    fields: Vec<CanonicalField>,
}

impl Default for AliasRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AliasRegistry {
    pub fn builtin() -> Self {
        let fields = BUILTIN_ALIASES
            .iter()
            .map(|(name, aliases)| CanonicalField {
                name: (*name).to_string(),
                aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
            })
            .collect();
        Self { fields }
    }

    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn fields(&self) -> &[CanonicalField] {
        &self.fields
    }

    /// Adds aliases to `canonical`, registering it as a new field when unknown.
    pub fn extend<I, S>(&mut self, canonical: &str, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let canonical = canonical.trim();
        // The spaced form keeps `canonicalize` idempotent for names like `sales_region`.
        let normalized = std::iter::once(normalize_header_text(canonical))
            .chain(
                aliases
                    .into_iter()
                    .map(|alias| normalize_header_text(alias.as_ref())),
            )
            .filter(|alias| !alias.is_empty() && alias != canonical)
            .collect::<Vec<_>>();
        let idx = match self.fields.iter().position(|f| f.name == canonical) {
            Some(idx) => idx,
            None => {
                self.fields.push(CanonicalField {
                    name: canonical.to_string(),
                    aliases: Vec::new(),
                });
                self.fields.len() - 1
            }
        };
        let entry = &mut self.fields[idx];
        for alias in normalized {
            if !entry.aliases.contains(&alias) {
                entry.aliases.push(alias);
            }
        }
    }

    pub fn canonicalize(&self, raw: &str) -> String {
        let normalized = normalize_header_text(raw);
        self.resolve(&normalized)
            .map(str::to_string)
            .unwrap_or(normalized)
    }

    fn resolve(&self, normalized: &str) -> Option<&str> {
        if let Some(field) = self.fields.iter().find(|f| f.name == normalized) {
            return Some(&field.name);
        }
        self.fields
            .iter()
            .find(|f| f.aliases.iter().any(|alias| alias == normalized))
            .map(|f| f.name.as_str())
    }
}

/// Alias extensions as written in a merge profile: canonical name to aliases.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AliasOverrides(pub BTreeMap<String, Vec<String>>);

impl AliasOverrides {
    pub fn apply(&self, registry: &mut AliasRegistry) {
        for (canonical, aliases) in &self.0 {
            registry.extend(canonical, aliases);
        }
    }
}
