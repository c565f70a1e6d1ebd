//! Item base and affix catalogs
//!
//! Read-only reference data the core resolves names against. A built-in
//! catalog is embedded at compile time from `data/` and parsed once; hosts
//! with their own game data can load replacement JSON through
//! [`Catalogs::from_json`]. All lookups return references into the catalog;
//! nothing here is mutated after load.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const BASES_JSON: &str = include_str!("../data/bases.json");
const MODS_JSON: &str = include_str!("../data/mods.json");

/// Errors raised while loading external catalog data
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("malformed catalog data: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Attribute and level requirements of a base type
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirements {
    pub strength: u32,
    pub dexterity: u32,
    pub intelligence: u32,
    pub level: u32,
}

/// Weapon base stats
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponBase {
    pub physical_min: f64,
    pub physical_max: f64,
    pub attack_rate: f64,
    pub crit_chance: f64,
    pub range: f64,
}

/// Armour base stats
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmourBase {
    pub armour: f64,
    pub evasion: f64,
    pub energy_shield: f64,
    pub block_chance: f64,
    /// Percent movement-speed penalty while equipped
    pub movement_penalty: f64,
}

/// Flask base stats
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlaskBase {
    pub life: f64,
    pub mana: f64,
    pub duration: f64,
    pub charges_max: u32,
    pub charges_used: u32,
    pub instant_percent: f64,
}

/// Cluster jewel base data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JewelBase {
    pub cluster_min: u32,
    pub cluster_max: u32,
    /// Allowed `Cluster Jewel Skill` names
    pub skills: Vec<String>,
}

/// One entry of the item base catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemBase {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub socket_limit: Option<u32>,
    #[serde(default)]
    pub weapon: Option<WeaponBase>,
    #[serde(default)]
    pub armour: Option<ArmourBase>,
    #[serde(default)]
    pub flask: Option<FlaskBase>,
    #[serde(default)]
    pub jewel: Option<JewelBase>,
}

impl ItemBase {
    pub fn is_weapon(&self) -> bool {
        self.weapon.is_some()
    }

    pub fn is_armour(&self) -> bool {
        self.armour.is_some()
    }

    pub fn is_flask(&self) -> bool {
        self.flask.is_some()
    }

    pub fn is_jewel(&self) -> bool {
        self.kind == "Jewel"
    }

    /// Two-handed weapon classes occupy the main hand alone
    pub fn is_two_handed(&self) -> bool {
        self.kind.starts_with("Two Handed") || matches!(self.kind.as_str(), "Bow" | "Staff")
    }
}

/// Item base catalog with exact and substring lookup
#[derive(Debug, Default)]
pub struct BaseCatalog {
    bases: Vec<ItemBase>,
    by_name: HashMap<String, usize>,
}

impl BaseCatalog {
    fn from_list(bases: Vec<ItemBase>) -> Self {
        let by_name = bases
            .iter()
            .enumerate()
            .map(|(i, base)| (base.name.clone(), i))
            .collect();
        BaseCatalog { bases, by_name }
    }

    /// Exact name lookup
    pub fn lookup(&self, name: &str) -> Option<&ItemBase> {
        self.by_name.get(name).map(|&i| &self.bases[i])
    }

    /// Find the longest base name occurring as a substring of `text`
    ///
    /// Returns the base plus the decoration before and after the match,
    /// which is how magic-item affix wording is separated from the base.
    pub fn find_in<'a>(&'a self, text: &str) -> Option<(&'a ItemBase, String, String)> {
        let mut best: Option<(&ItemBase, usize)> = None;
        for base in &self.bases {
            if let Some(at) = text.find(&base.name) {
                let longer = best.map_or(true, |(b, _)| base.name.len() > b.name.len());
                if longer {
                    best = Some((base, at));
                }
            }
        }
        best.map(|(base, at)| {
            let prefix = text[..at].trim_end().to_string();
            let suffix = text[at + base.name.len()..].trim_start().to_string();
            (base, prefix, suffix)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemBase> {
        self.bases.iter()
    }
}

/// Affix category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AffixKind {
    Prefix,
    Suffix,
}

/// One craftable affix definition
#[derive(Debug, Clone, Deserialize)]
pub struct AffixDef {
    /// Display wording, e.g. `of the Bear`
    pub affix: String,
    #[serde(rename = "type")]
    pub kind: AffixKind,
    pub level: u32,
    /// Base-type kinds this affix can roll on; `*` means any
    #[serde(default)]
    pub item_types: Vec<String>,
    /// Canonical ordering index per template line
    #[serde(default)]
    pub stat_order: Vec<u32>,
    #[serde(default)]
    pub mod_tags: Vec<String>,
    /// Template lines, with `(a-b)` range templates
    pub stats: Vec<String>,
    #[serde(default)]
    pub weight_tags: Vec<String>,
    #[serde(default)]
    pub weight_values: Vec<f64>,
}

impl AffixDef {
    pub fn applies_to(&self, base: &ItemBase) -> bool {
        self.item_types.iter().any(|t| t == "*" || *t == base.kind)
    }
}

/// Affix catalog keyed by modifier identifier
#[derive(Debug, Default)]
pub struct ModCatalog {
    affixes: Vec<(String, AffixDef)>,
    by_id: HashMap<String, usize>,
}

impl ModCatalog {
    fn from_map(map: Vec<(String, AffixDef)>) -> Self {
        let by_id = map
            .iter()
            .enumerate()
            .map(|(i, (id, _))| (id.clone(), i))
            .collect();
        ModCatalog { affixes: map, by_id }
    }

    pub fn lookup(&self, id: &str) -> Option<&AffixDef> {
        self.by_id.get(id).map(|&i| &self.affixes[i].1)
    }

    /// Affixes that can appear on the given base
    pub fn affixes_for<'a>(
        &'a self,
        base: &'a ItemBase,
    ) -> impl Iterator<Item = (&'a str, &'a AffixDef)> {
        self.affixes
            .iter()
            .filter(move |(_, def)| def.applies_to(base))
            .map(|(id, def)| (id.as_str(), def))
    }

    /// Resolve a literal affix display string back to its identifier
    pub fn find_by_display(&self, display: &str) -> Option<&str> {
        self.affixes
            .iter()
            .find(|(_, def)| def.affix == display)
            .map(|(id, _)| id.as_str())
    }
}

/// The catalog pair every parse and craft call borrows
#[derive(Debug, Default)]
pub struct Catalogs {
    pub bases: BaseCatalog,
    pub mods: ModCatalog,
}

impl Catalogs {
    /// Load catalogs from external JSON documents
    pub fn from_json(bases_json: &str, mods_json: &str) -> Result<Self, CatalogError> {
        let bases: Vec<ItemBase> = serde_json::from_str(bases_json)?;
        let mods: HashMap<String, AffixDef> = serde_json::from_str(mods_json)?;
        let mut mods: Vec<(String, AffixDef)> = mods.into_iter().collect();
        // Deterministic iteration order regardless of the JSON map layout
        mods.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(Catalogs {
            bases: BaseCatalog::from_list(bases),
            mods: ModCatalog::from_map(mods),
        })
    }

    /// The compile-time embedded reference catalog
    pub fn builtin() -> &'static Catalogs {
        static BUILTIN: Lazy<Catalogs> = Lazy::new(|| {
            Catalogs::from_json(BASES_JSON, MODS_JSON).expect("embedded catalog data")
        });
        &BUILTIN
    }
}

// ============================================================================
// Special-case base fixups
// ============================================================================

/// Named post-processing rules keyed by base name, applied as a final parse
/// fixup. These are intentional data-driven exceptions, not inlined
/// conditionals.
pub(crate) fn special_base_refinement(
    base_name: &str,
    saw_evasion: bool,
    saw_energy_shield: bool,
) -> Option<&'static str> {
    match base_name {
        // A synthetic dual-base entry refined by whichever defense stat
        // lines appear in the item text.
        "Two-Toned Boots" => Some(match (saw_evasion, saw_energy_shield) {
            (true, true) => "Two-Toned Boots (Evasion/Energy Shield)",
            (true, false) => "Two-Toned Boots (Armour/Evasion)",
            _ => "Two-Toned Boots (Armour/Energy Shield)",
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_loads() {
        let db = Catalogs::builtin();
        assert!(db.bases.lookup("Broad Sword").is_some());
        assert!(db.mods.lookup("StrengthSuffix").is_some());
    }

    #[test]
    fn test_exact_lookup_unknown_base() {
        assert!(Catalogs::builtin().bases.lookup("Sword of Nowhere").is_none());
    }

    #[test]
    fn test_find_in_prefers_longest_match() {
        let db = Catalogs::builtin();
        let (base, prefix, suffix) = db
            .bases
            .find_in("Heavy Two-Toned Boots (Armour/Evasion) of the Bear")
            .unwrap();
        assert_eq!(base.name, "Two-Toned Boots (Armour/Evasion)");
        assert_eq!(prefix, "Heavy");
        assert_eq!(suffix, "of the Bear");
    }

    #[test]
    fn test_affixes_for_filters_item_types() {
        let db = Catalogs::builtin();
        let sword = db.bases.lookup("Broad Sword").unwrap();
        let ids: Vec<&str> = db.mods.affixes_for(sword).map(|(id, _)| id).collect();
        assert!(ids.contains(&"FlatPhysPrefix"));
        assert!(ids.contains(&"StrengthSuffix")); // wildcard affix
        assert!(!ids.contains(&"ArmourPrefix"));
    }

    #[test]
    fn test_find_by_display() {
        let db = Catalogs::builtin();
        assert_eq!(db.mods.find_by_display("of the Bear"), Some("StrengthSuffix"));
        assert_eq!(db.mods.find_by_display("of Nothing"), None);
    }

    #[test]
    fn test_special_base_refinement() {
        assert_eq!(
            special_base_refinement("Two-Toned Boots", true, false),
            Some("Two-Toned Boots (Armour/Evasion)")
        );
        assert_eq!(
            special_base_refinement("Two-Toned Boots", false, true),
            Some("Two-Toned Boots (Armour/Energy Shield)")
        );
        assert_eq!(
            special_base_refinement("Two-Toned Boots", true, true),
            Some("Two-Toned Boots (Evasion/Energy Shield)")
        );
        assert_eq!(special_base_refinement("Iron Greaves", true, true), None);
    }
}
