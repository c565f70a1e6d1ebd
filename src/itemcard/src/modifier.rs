//! Structured modifiers and the ordered modifier pool
//!
//! A [`Modifier`] is one resolved effect from a modifier line; a [`ModList`]
//! is the ordered pool the derivation engine works over. Local aggregation
//! (sum-and-remove of exact matches) is a single partitioning pass so the
//! retained modifiers keep their original relative order.

use serde::{Deserialize, Serialize};

/// Modifier scope/condition bit flags
pub mod flag {
    pub const ATTACK: u32 = 0x0001;
    pub const SPELL: u32 = 0x0002;
    pub const HIT: u32 = 0x0004;
    pub const MELEE: u32 = 0x0008;
    /// Applies to the carrying weapon only
    pub const WEAPON_LOCAL: u32 = 0x0100;
    /// Applies to the carrying armour piece only
    pub const ARMOUR_LOCAL: u32 = 0x0200;
    /// Applies to the carrying flask only
    pub const FLASK_LOCAL: u32 = 0x0400;
    /// Applies to the carrying jewel only
    pub const JEWEL_LOCAL: u32 = 0x0800;
}

/// Keyword bit flags restricting a modifier to a skill keyword
pub mod keyword {
    pub const PROJECTILE: u32 = 0x0001;
    pub const AREA: u32 = 0x0002;
    pub const MINION: u32 = 0x0004;
}

/// How a modifier combines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModKind {
    /// Flat addition
    Base,
    /// Additive percentage
    Inc,
    /// Multiplicative percentage
    More,
    /// Boolean switch
    Flag,
    /// Opaque key/value payload
    List,
}

/// Modifier payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl ModValue {
    pub fn number(&self) -> f64 {
        match self {
            ModValue::Number(v) => *v,
            _ => 0.0,
        }
    }

    pub fn flag(&self) -> bool {
        matches!(self, ModValue::Flag(true))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ModValue::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Conditional tag attached to a modifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModTag {
    /// Applies only when the item occupies this slot number
    SlotNumber(u8),
    /// Applies only while the named condition holds
    Condition(String),
    /// Free-form tag carried through untouched
    Custom(String),
}

/// One resolved modifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub name: String,
    pub kind: ModKind,
    pub value: ModValue,
    pub flags: u32,
    pub keyword_flags: u32,
    pub tags: Vec<ModTag>,
}

impl Modifier {
    pub fn new(name: impl Into<String>, kind: ModKind, value: ModValue) -> Self {
        Modifier {
            name: name.into(),
            kind,
            value,
            flags: 0,
            keyword_flags: 0,
            tags: Vec::new(),
        }
    }

    pub fn base(name: impl Into<String>, value: f64) -> Self {
        Modifier::new(name, ModKind::Base, ModValue::Number(value))
    }

    pub fn inc(name: impl Into<String>, value: f64) -> Self {
        Modifier::new(name, ModKind::Inc, ModValue::Number(value))
    }

    pub fn more(name: impl Into<String>, value: f64) -> Self {
        Modifier::new(name, ModKind::More, ModValue::Number(value))
    }

    pub fn switch(name: impl Into<String>, value: bool) -> Self {
        Modifier::new(name, ModKind::Flag, ModValue::Flag(value))
    }

    pub fn list(name: impl Into<String>, value: impl Into<String>) -> Self {
        Modifier::new(name, ModKind::List, ModValue::Text(value.into()))
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_tag(mut self, tag: ModTag) -> Self {
        self.tags.push(tag);
        self
    }
}

/// Ordered modifier pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModList {
    mods: Vec<Modifier>,
}

impl ModList {
    pub fn new() -> Self {
        ModList::default()
    }

    pub fn push(&mut self, modifier: Modifier) {
        self.mods.push(modifier);
    }

    pub fn extend(&mut self, mods: impl IntoIterator<Item = Modifier>) {
        self.mods.extend(mods);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.mods.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Modifier> {
        self.mods.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    /// Whether a modifier matches for local aggregation: exact name, kind,
    /// and flags, no keyword restriction, and no conditional tag other than
    /// an "applies to this slot" marker.
    fn matches_local(modifier: &Modifier, name: &str, kind: ModKind, flags: u32, slot: u8) -> bool {
        modifier.name == name
            && modifier.kind == kind
            && modifier.flags == flags
            && modifier.keyword_flags == 0
            && modifier
                .tags
                .iter()
                .all(|tag| matches!(tag, ModTag::SlotNumber(n) if *n == slot))
    }

    /// Remove and sum every numeric modifier that matches exactly
    ///
    /// Non-matching modifiers are left untouched in original relative order.
    /// Returns 0 if nothing matched.
    pub fn sum_local(&mut self, name: &str, kind: ModKind, flags: u32, slot: u8) -> f64 {
        let mut total = 0.0;
        for modifier in std::mem::take(&mut self.mods) {
            if Self::matches_local(&modifier, name, kind, flags, slot) {
                if let ModValue::Number(v) = modifier.value {
                    total += v;
                    continue;
                }
            }
            self.mods.push(modifier);
        }
        total
    }

    /// Remove and OR every flag modifier that matches exactly
    pub fn flag_local(&mut self, name: &str, flags: u32, slot: u8) -> bool {
        let mut result = false;
        for modifier in std::mem::take(&mut self.mods) {
            if Self::matches_local(&modifier, name, ModKind::Flag, flags, slot) {
                if let ModValue::Flag(v) = modifier.value {
                    result |= v;
                    continue;
                }
            }
            self.mods.push(modifier);
        }
        result
    }

    /// Non-consuming extraction of `key=value` payloads under a modifier name
    ///
    /// Used for the generic `WeaponData`/`ArmourData`/`FlaskData`/`JewelData`
    /// override injection: external systems can append opaque overrides
    /// without the derivation engine knowing about them structurally.
    pub fn override_entries(&self, name: &str) -> Vec<(String, String)> {
        self.mods
            .iter()
            .filter(|m| m.name == name && m.kind == ModKind::List)
            .filter_map(|m| m.value.text())
            .filter_map(|payload| {
                payload
                    .split_once('=')
                    .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            })
            .collect()
    }

    /// Collect text payloads of every `List` modifier with this name,
    /// without consuming them
    pub fn list_entries(&self, name: &str) -> Vec<String> {
        self.mods
            .iter()
            .filter(|m| m.name == name && m.kind == ModKind::List)
            .filter_map(|m| m.value.text().map(str::to_string))
            .collect()
    }
}

impl IntoIterator for ModList {
    type Item = Modifier;
    type IntoIter = std::vec::IntoIter<Modifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.mods.into_iter()
    }
}

impl FromIterator<Modifier> for ModList {
    fn from_iter<T: IntoIterator<Item = Modifier>>(iter: T) -> Self {
        ModList {
            mods: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_local_combines_and_removes() {
        let mut pool = ModList::new();
        pool.push(Modifier::base("Accuracy", 5.0).with_flags(flag::WEAPON_LOCAL));
        pool.push(Modifier::inc("Speed", 8.0).with_flags(flag::WEAPON_LOCAL));
        pool.push(Modifier::base("Accuracy", 7.0).with_flags(flag::WEAPON_LOCAL));

        let total = pool.sum_local("Accuracy", ModKind::Base, flag::WEAPON_LOCAL, 1);
        assert_eq!(total, 12.0);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.iter().next().unwrap().name, "Speed");
    }

    #[test]
    fn test_sum_local_requires_exact_flags() {
        let mut pool = ModList::new();
        pool.push(Modifier::base("Accuracy", 5.0));
        let total = pool.sum_local("Accuracy", ModKind::Base, flag::WEAPON_LOCAL, 1);
        assert_eq!(total, 0.0);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_sum_local_skips_keyword_restricted() {
        let mut pool = ModList::new();
        let mut restricted = Modifier::base("Accuracy", 5.0).with_flags(flag::WEAPON_LOCAL);
        restricted.keyword_flags = keyword::PROJECTILE;
        pool.push(restricted);
        let total = pool.sum_local("Accuracy", ModKind::Base, flag::WEAPON_LOCAL, 1);
        assert_eq!(total, 0.0);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_sum_local_allows_own_slot_tag_only() {
        let mut pool = ModList::new();
        pool.push(
            Modifier::base("Armour", 40.0)
                .with_flags(flag::ARMOUR_LOCAL)
                .with_tag(ModTag::SlotNumber(1)),
        );
        pool.push(
            Modifier::base("Armour", 25.0)
                .with_flags(flag::ARMOUR_LOCAL)
                .with_tag(ModTag::SlotNumber(2)),
        );
        pool.push(
            Modifier::base("Armour", 10.0)
                .with_flags(flag::ARMOUR_LOCAL)
                .with_tag(ModTag::Condition("LowLife".into())),
        );

        let total = pool.sum_local("Armour", ModKind::Base, flag::ARMOUR_LOCAL, 1);
        assert_eq!(total, 40.0);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_flag_local() {
        let mut pool = ModList::new();
        pool.push(Modifier::switch("NoPhysicalDamage", true).with_flags(flag::WEAPON_LOCAL));
        assert!(pool.flag_local("NoPhysicalDamage", flag::WEAPON_LOCAL, 1));
        assert!(pool.is_empty());
        assert!(!pool.flag_local("NoPhysicalDamage", flag::WEAPON_LOCAL, 1));
    }

    #[test]
    fn test_override_entries_non_consuming() {
        let mut pool = ModList::new();
        pool.push(Modifier::list("ArmourData", "Armour=500"));
        pool.push(Modifier::list("ArmourData", "BlockChance=4"));
        pool.push(Modifier::list("FlaskData", "Duration=9"));

        let entries = pool.override_entries("ArmourData");
        assert_eq!(
            entries,
            vec![
                ("Armour".to_string(), "500".to_string()),
                ("BlockChance".to_string(), "4".to_string()),
            ]
        );
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_retained_order_is_stable() {
        let mut pool = ModList::new();
        for (i, name) in ["A", "B", "C", "B", "D"].iter().enumerate() {
            pool.push(Modifier::base(*name, i as f64));
        }
        pool.sum_local("B", ModKind::Base, 0, 1);
        let names: Vec<&str> = pool.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C", "D"]);
    }
}
