//! The item record
//!
//! [`Item`] is the central entity: identity, flags, sockets, the three
//! modifier line groups, variant metadata, crafting selections, and the
//! derived per-slot blocks. It is created empty, populated in one pass by
//! the text parser, mutated in place by crafting, and extended by
//! derivation.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::catalog::{AffixDef, ItemBase, Requirements};
use crate::modifier::Modifier;
use crate::slots::{SlotModList, StatBlock};
use crate::types::{InfluenceSet, Rarity, Socket};

/// The `{ver}` variant version label naming the present-day wording; any
/// other label marks a legacy variant
pub const CURRENT_VARIANT_VERSION: &str = "current";

/// Whether the text came from a game export (with a `Rarity:` header) or a
/// community/reference listing. Governs the modifier-section boundary
/// heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TextMode {
    GameExport,
    #[default]
    Reference,
}

/// One crafting slot; `"None"` marks an empty slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffixSlot {
    pub id: String,
    /// Range fraction for the affix's templates, default 0.5
    pub range: Option<f64>,
}

impl AffixSlot {
    pub fn none() -> Self {
        AffixSlot {
            id: "None".to_string(),
            range: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id == "None"
    }
}

/// One physical modifier line
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModLine {
    /// Bare text with markers stripped; range templates are kept
    pub line: String,
    /// Resolved modifiers; empty marks an unparsed placeholder
    pub mods: Vec<Modifier>,
    /// Free-form classification tags from a `{tags:...}` marker
    pub tags: Vec<String>,
    /// 1-based variant indices this line is active for; `None` = always
    pub variants: Option<BTreeSet<usize>>,
    pub crafted: bool,
    pub custom: bool,
    pub fractured: bool,
    /// Range fraction when the line carries a `(a-b)` template
    pub range: Option<f64>,
}

impl ModLine {
    pub fn is_unparsed(&self) -> bool {
        self.mods.is_empty()
    }
}

/// A fully-resolved item card
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Item {
    // Identity
    pub name: String,
    /// Relic/unique display title; the name becomes `title, base`
    pub title: Option<String>,
    pub base_name: String,
    /// Magic/normal affix wording around the base-type substring
    pub name_prefix: String,
    pub name_suffix: String,
    pub rarity: Rarity,
    pub mode: TextMode,

    // Flags
    pub corrupted: bool,
    pub fractured: bool,
    pub synthesised: bool,
    pub crafted: bool,
    pub unreleased: bool,
    pub influences: InfluenceSet,

    // Numeric attributes
    pub item_level: u32,
    pub quality: u32,
    pub talisman_tier: u32,
    pub catalyst: Option<u8>,
    pub catalyst_quality: Option<i32>,

    // Requirements (resolved in the post-scan fixups)
    pub requirements: Requirements,

    pub sockets: Vec<Socket>,

    // Modifier line groups
    pub enchant_lines: Vec<ModLine>,
    pub implicit_lines: Vec<ModLine>,
    pub explicit_lines: Vec<ModLine>,
    /// Declared `Implicits:` count, when the text carried one
    pub implicits_hint: Option<usize>,

    // Variant metadata (indices are 1-based; 0 = unset)
    pub variants: Vec<String>,
    /// Version labels from `{ver}` variant prefixes, keyed by variant index
    pub variant_versions: BTreeMap<usize, String>,
    pub selected_variant: usize,
    pub has_alt_variant: bool,
    pub has_alt_variant2: bool,
    pub selected_alt_variant: usize,
    pub selected_alt_variant2: usize,

    // Bookkeeping fields the parser and serializer share
    pub unique_id: Option<String>,
    pub league: Option<String>,
    pub source: Option<String>,
    pub upgrades: Vec<String>,
    pub radius_label: Option<String>,
    pub limit: Option<u32>,
    pub cluster_skill: Option<String>,
    pub cluster_node_count: Option<u32>,

    // Crafting selections
    pub prefixes: Vec<AffixSlot>,
    pub suffixes: Vec<AffixSlot>,

    /// Resolved base entry; `None` is the explicit degraded mode for
    /// unknown base types
    pub base: Option<ItemBase>,

    // Derived blocks, populated only after derivation runs
    pub slot_mods: Vec<SlotModList>,
    pub weapon_data: Vec<StatBlock>,
    pub armour_data: Option<StatBlock>,
    pub flask_data: Option<StatBlock>,
    pub jewel_data: Option<StatBlock>,
}

impl Item {
    /// Number of craftable affix slots: always even, prefix count equals
    /// suffix count. 2 for magic, 6 for rare (4 for rare jewels), 0 for
    /// everything else.
    pub fn affix_limit(&self) -> usize {
        match self.rarity {
            Rarity::Magic => 2,
            Rarity::Rare => {
                if self.base.as_ref().is_some_and(|b| b.is_jewel()) {
                    4
                } else {
                    6
                }
            }
            _ => 0,
        }
    }

    /// The equip slots this item can occupy, as (slot number, slot name).
    /// Weapons and rings occupy two; a shield occupies the off-hand.
    pub fn slots(&self) -> Vec<(u8, String)> {
        let Some(base) = &self.base else {
            return Vec::new();
        };
        if base.is_weapon() {
            return if base.is_two_handed() {
                vec![(1, "Weapon 1".to_string())]
            } else {
                vec![(1, "Weapon 1".to_string()), (2, "Weapon 2".to_string())]
            };
        }
        match base.kind.as_str() {
            "Ring" => vec![(1, "Ring 1".to_string()), (2, "Ring 2".to_string())],
            "Shield" => vec![(2, "Weapon 2".to_string())],
            other => vec![(1, other.to_string())],
        }
    }

    /// Read-only query: the first slot this item occupies
    pub fn primary_slot(&self) -> Option<String> {
        self.slots().into_iter().next().map(|(_, name)| name)
    }

    /// Read-only query: spawn weight of an affix on this item's base.
    /// The first weight tag present in the base's tag set wins; `default`
    /// always matches; no match or a missing base means 0.
    pub fn mod_spawn_weight(&self, def: &AffixDef) -> f64 {
        let Some(base) = &self.base else {
            return 0.0;
        };
        for (tag, value) in def.weight_tags.iter().zip(&def.weight_values) {
            if tag == "default" || base.tags.iter().any(|t| t == tag) {
                return *value;
            }
        }
        0.0
    }

    /// Count of enchant plus implicit lines, which any declared
    /// `Implicits:` count must match
    pub fn implicit_count(&self) -> usize {
        self.enchant_lines.len() + self.implicit_lines.len()
    }

    /// Whether a modifier line is active under the current variant selection
    pub fn line_active(&self, line: &ModLine) -> bool {
        let Some(variants) = &line.variants else {
            return true;
        };
        let selected = [
            self.selected_variant,
            if self.has_alt_variant { self.selected_alt_variant } else { 0 },
            if self.has_alt_variant2 { self.selected_alt_variant2 } else { 0 },
        ];
        selected.iter().any(|&v| v != 0 && variants.contains(&v))
    }

    /// Whether the selected variant is scoped to an older version label.
    /// Legacy variants keep old-wording arithmetic during derivation.
    pub fn legacy_variant_selected(&self) -> bool {
        self.variant_versions
            .get(&self.selected_variant)
            .is_some_and(|version| version != CURRENT_VARIANT_VERSION)
    }

    /// All mod line groups in emission order
    pub fn mod_lines(&self) -> impl Iterator<Item = &ModLine> {
        self.enchant_lines
            .iter()
            .chain(self.implicit_lines.iter())
            .chain(self.explicit_lines.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalogs;

    fn item_on_base(name: &str, rarity: Rarity) -> Item {
        let db = Catalogs::builtin();
        Item {
            rarity,
            base_name: name.to_string(),
            base: db.bases.lookup(name).cloned(),
            ..Item::default()
        }
    }

    #[test]
    fn test_affix_limit_by_rarity() {
        assert_eq!(item_on_base("Broad Sword", Rarity::Magic).affix_limit(), 2);
        assert_eq!(item_on_base("Broad Sword", Rarity::Rare).affix_limit(), 6);
        assert_eq!(item_on_base("Cobalt Jewel", Rarity::Rare).affix_limit(), 4);
        assert_eq!(item_on_base("Broad Sword", Rarity::Unique).affix_limit(), 0);
    }

    #[test]
    fn test_slots_for_weapon_and_ring() {
        let sword = item_on_base("Broad Sword", Rarity::Rare);
        assert_eq!(
            sword.slots(),
            vec![(1, "Weapon 1".to_string()), (2, "Weapon 2".to_string())]
        );

        let bow = item_on_base("Hunting Bow", Rarity::Rare);
        assert_eq!(bow.slots(), vec![(1, "Weapon 1".to_string())]);

        let ring = item_on_base("Gold Ring", Rarity::Rare);
        assert_eq!(ring.slots().len(), 2);

        let shield = item_on_base("Tower Shield", Rarity::Rare);
        assert_eq!(shield.slots(), vec![(2, "Weapon 2".to_string())]);

        let plate = item_on_base("Iron Plate", Rarity::Rare);
        assert_eq!(plate.primary_slot(), Some("Body Armour".to_string()));
    }

    #[test]
    fn test_mod_spawn_weight() {
        let db = Catalogs::builtin();
        let sword = item_on_base("Broad Sword", Rarity::Rare);
        let flat_phys = db.mods.lookup("FlatPhysPrefix").unwrap();
        assert_eq!(sword.mod_spawn_weight(flat_phys), 1000.0);

        // Weapon-weighted affix cannot spawn on armour
        let plate = item_on_base("Iron Plate", Rarity::Rare);
        assert_eq!(plate.mod_spawn_weight(flat_phys), 0.0);

        let unknown = Item::default();
        assert_eq!(unknown.mod_spawn_weight(flat_phys), 0.0);
    }

    #[test]
    fn test_legacy_variant_selected() {
        let mut item = Item {
            variants: vec!["Pre 2.0".into(), "Current".into()],
            variant_versions: [(1, "2.0".to_string()), (2, "current".to_string())]
                .into_iter()
                .collect(),
            selected_variant: 2,
            ..Item::default()
        };
        assert!(!item.legacy_variant_selected());

        item.selected_variant = 1;
        assert!(item.legacy_variant_selected());

        // Unlabeled variants are not legacy
        item.variant_versions.clear();
        assert!(!item.legacy_variant_selected());
    }

    #[test]
    fn test_line_active_variants() {
        let mut item = Item {
            variants: vec!["First".into(), "Second".into()],
            selected_variant: 2,
            ..Item::default()
        };
        let always = ModLine::default();
        assert!(item.line_active(&always));

        let scoped = ModLine {
            variants: Some([1usize].into_iter().collect()),
            ..ModLine::default()
        };
        assert!(!item.line_active(&scoped));

        item.selected_variant = 1;
        assert!(item.line_active(&scoped));
    }
}
