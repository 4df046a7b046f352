//! Merge profile: key candidates, display fields and extra header aliases.
//!
//! A profile is optional. Without one the built-in defaults apply:
//!
//! ```yaml
//! key_candidates:
//!   - [organisation_id]
//!   - [customer, name]
//! display_fields: [organisation_id, customer, name, product_status,
//!                  engagement_status, carbon_factor, next_activity_due_date]
//! aliases:
//!   customer: [account holder]
//! ```

use std::{fs, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    columns::{AliasOverrides, AliasRegistry},
    derive::default_display_fields,
    keys::{JoinKey, default_candidates},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeProfile {
    pub key_candidates: Vec<JoinKey>,
    pub display_fields: Vec<String>,
    pub aliases: AliasOverrides,
}

impl Default for MergeProfile {
    fn default() -> Self {
        Self {
            key_candidates: default_candidates(),
            display_fields: default_display_fields(),
            aliases: AliasOverrides::default(),
        }
    }
}

impl MergeProfile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read_to_string(path).with_context(|| format!("Opening merge profile {path:?}"))?;
        Self::from_yaml(&raw).with_context(|| format!("Parsing merge profile {path:?}"))
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let profile: MergeProfile = serde_yaml::from_str(raw)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            !self.key_candidates.is_empty(),
            "key_candidates must list at least one key"
        );
        ensure!(
            self.key_candidates.iter().all(|keys| !keys.is_empty()),
            "key_candidates entries cannot be empty"
        );
        Ok(())
    }

    pub fn registry(&self) -> AliasRegistry {
        let mut registry = AliasRegistry::builtin();
        self.aliases.apply(&mut registry);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let profile = MergeProfile::from_yaml("{}").unwrap();
        assert_eq!(profile, MergeProfile::default());
        assert_eq!(profile.key_candidates[0], vec!["organisation_id".to_string()]);
        assert_eq!(profile.display_fields.len(), 7);
    }

    #[test]
    fn aliases_extend_the_builtin_registry() {
        let profile = MergeProfile::from_yaml(
            "key_candidates:\n  - [vendor_code]\naliases:\n  vendor_code: [Supplier No, \"vendor #\"]\n",
        )
        .unwrap();
        assert_eq!(profile.key_candidates, vec![vec!["vendor_code".to_string()]]);
        let registry = profile.registry();
        assert_eq!(registry.canonicalize("Supplier No."), "vendor_code");
        assert_eq!(registry.canonicalize("Vendor Code"), "vendor_code");
        assert_eq!(registry.canonicalize("Vendor #"), "vendor_code");
        assert_eq!(registry.canonicalize("Org ID"), "organisation_id");
    }

    #[test]
    fn full_profile_document_parses() {
        let profile = MergeProfile::from_yaml(
            r#"key_candidates:
  - [vendor_code]
  - [customer, name]
display_fields: [vendor_code, customer, name, carbon_factor]
aliases:
  vendor_code: [supplier no, "vendor #"]
"#,
        )
        .unwrap();
        assert_eq!(profile.key_candidates.len(), 2);
        assert_eq!(profile.display_fields[0], "vendor_code");
        assert_eq!(
            profile.aliases.0["vendor_code"],
            vec!["supplier no".to_string(), "vendor #".to_string()]
        );
    }

    #[test]
    fn rejects_empty_key_candidates_and_unknown_fields() {
        assert!(MergeProfile::from_yaml("key_candidates: []\n").is_err());
        assert!(MergeProfile::from_yaml("key_candidates:\n  - []\n").is_err());
        assert!(MergeProfile::from_yaml("keys: [a]\n").is_err());
    }

    #[test]
    fn yaml_round_trip_preserves_profile() {
        let profile = MergeProfile::default();
        let yaml = profile.to_yaml().unwrap();
        assert_eq!(MergeProfile::from_yaml(&yaml).unwrap(), profile);
    }
}
