//! Per-slot derivation
//!
//! For every equip slot the item can occupy, builds an independent modifier
//! pool (slot token substitution, slot filtering, socket pseudo-modifiers)
//! and computes the category stat block: weapon DPS, armour values, flask
//! recovery, jewel validity. Derivation reads only parsed state, so running
//! it twice produces identical blocks.

mod armour;
mod flask;
mod jewel;
mod weapon;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::item::Item;
use crate::modifier::{ModList, ModTag, Modifier};
use crate::modparser::substitute_slot_tokens;
use crate::types::SocketColor;

/// Derived key/value stats for one item category
///
/// Keys are open-ended on purpose: the `*Data` override modifiers inject
/// arbitrary entries after the computed defaults, and the engine never needs
/// to know about them structurally.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatBlock {
    values: BTreeMap<String, f64>,
    texts: BTreeMap<String, String>,
    flags: BTreeMap<String, bool>,
    lists: BTreeMap<String, Vec<String>>,
}

impl StatBlock {
    pub fn set(&mut self, key: &str, value: f64) {
        self.values.insert(key.to_string(), value);
    }

    pub fn number(&self, key: &str) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    pub fn set_text(&mut self, key: &str, value: &str) {
        self.texts.insert(key.to_string(), value.to_string());
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.texts.get(key).map(String::as_str)
    }

    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.flags.insert(key.to_string(), value);
    }

    pub fn flag(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    pub fn set_list(&mut self, key: &str, values: Vec<String>) {
        self.lists.insert(key.to_string(), values);
    }

    pub fn list(&self, key: &str) -> &[String] {
        self.lists.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Apply one `key=value` override entry on top of the computed defaults
    pub fn apply_override(&mut self, key: &str, raw: &str) {
        if let Ok(value) = raw.parse::<f64>() {
            self.set(key, value);
        } else if raw == "true" || raw == "false" {
            self.set_flag(key, raw == "true");
        } else {
            self.set_text(key, raw);
        }
    }
}

/// The modifier pool one equip slot contributes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotModList {
    pub slot: u8,
    pub name: String,
    pub mods: ModList,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Populate the derived blocks on a parsed item
pub fn derive(item: &mut Item) {
    let Some(base) = item.base.clone() else {
        // Unknown base: no slots, no derived data
        item.slot_mods = Vec::new();
        item.weapon_data = Vec::new();
        item.armour_data = None;
        item.flask_data = None;
        item.jewel_data = None;
        return;
    };

    let mut slot_mods = Vec::new();
    let mut weapon_data = Vec::new();
    let mut armour_data = None;
    let mut flask_data = None;
    let mut jewel_data = None;

    for (slot, slot_name) in item.slots() {
        let mut pool = build_slot_pool(item, slot, &slot_name);
        if let Some(weapon) = &base.weapon {
            let legacy = item.legacy_variant_selected();
            weapon_data.push(weapon::derive(weapon, item.quality, slot, legacy, &mut pool));
        } else if let Some(armour) = &base.armour {
            armour_data = Some(armour::derive(armour, item.quality, slot, &mut pool));
        } else if let Some(flask) = &base.flask {
            flask_data = Some(flask::derive(flask, item.quality, slot, &mut pool));
        } else if base.is_jewel() {
            jewel_data = Some(jewel::derive(item, &base, slot, &mut pool));
        }
        slot_mods.push(SlotModList {
            slot,
            name: slot_name,
            mods: pool,
        });
    }

    item.slot_mods = slot_mods;
    item.weapon_data = weapon_data;
    item.armour_data = armour_data;
    item.flask_data = flask_data;
    item.jewel_data = jewel_data;
}

/// Copy the active modifiers for one slot: substitute slot tokens, drop
/// modifiers tagged for a different slot, add socket pseudo-modifiers
fn build_slot_pool(item: &Item, slot: u8, slot_name: &str) -> ModList {
    let mut pool = ModList::new();
    for line in item.mod_lines() {
        if !item.line_active(line) {
            continue;
        }
        for modifier in &line.mods {
            let other_slot = modifier
                .tags
                .iter()
                .any(|tag| matches!(tag, ModTag::SlotNumber(n) if *n != slot));
            if other_slot {
                continue;
            }
            let mut modifier = modifier.clone();
            substitute_slot_tokens(&mut modifier, slot, slot_name);
            pool.push(modifier);
        }
    }
    for socket in &item.sockets {
        let name = match socket.color {
            SocketColor::Red => "RedSockets",
            SocketColor::Green => "GreenSockets",
            SocketColor::Blue => "BlueSockets",
            SocketColor::White => "WhiteSockets",
            // Abyssal sockets grant no color bonus
            SocketColor::Abyssal => continue,
        };
        pool.push(Modifier::base(name, 1.0));
    }
    pool
}
