//! Raw text serialization
//!
//! Rebuilds card text from an [`Item`] in a fixed field order, close enough
//! to lossless that reparsing the output yields an equivalent record. The
//! crafting resolver relies on this for its final serialize-and-reparse
//! pass.

use std::fmt::Write;

use crate::annot::LineAnnotations;
use crate::item::{Item, ModLine};
use crate::types::format_sockets;

/// Serialize an item back to card text
pub fn build_raw(item: &Item) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Rarity: {}", item.rarity.name());
    if let Some(title) = &item.title {
        let _ = writeln!(out, "{title}");
        let _ = writeln!(out, "{}", item.base_name);
    } else {
        let _ = writeln!(out, "{}", item.name);
    }
    if let Some(id) = &item.unique_id {
        let _ = writeln!(out, "Unique ID: {id}");
    }
    if let Some(league) = &item.league {
        let _ = writeln!(out, "League: {league}");
    }
    if let Some(source) = &item.source {
        let _ = writeln!(out, "Source: {source}");
    }
    for upgrade in &item.upgrades {
        let _ = writeln!(out, "Upgrade: {upgrade}");
    }
    if item.unreleased {
        let _ = writeln!(out, "Unreleased: true");
    }
    for influence in item.influences.iter() {
        let _ = writeln!(out, "{} Item", influence.name());
    }
    if item.fractured {
        let _ = writeln!(out, "Fractured Item");
    }
    if item.synthesised {
        let _ = writeln!(out, "Synthesised Item");
    }
    if item.crafted {
        let _ = writeln!(out, "Crafted: true");
        for prefix in &item.prefixes {
            let _ = writeln!(out, "Prefix: {}", affix_value(prefix));
        }
        for suffix in &item.suffixes {
            let _ = writeln!(out, "Suffix: {}", affix_value(suffix));
        }
    }
    if let Some(catalyst) = item.catalyst {
        let _ = writeln!(out, "Catalyst: {catalyst}");
    }
    if let Some(quality) = item.catalyst_quality {
        let _ = writeln!(out, "CatalystQuality: {quality}");
    }
    if let Some(skill) = &item.cluster_skill {
        let _ = writeln!(out, "Cluster Jewel Skill: {skill}");
    }
    if let Some(count) = item.cluster_node_count {
        let _ = writeln!(out, "Cluster Jewel Node Count: {count}");
    }
    if item.talisman_tier > 0 {
        let _ = writeln!(out, "Talisman Tier: {}", item.talisman_tier);
    }
    if item.item_level > 0 {
        let _ = writeln!(out, "Item Level: {}", item.item_level);
    }
    for (index, variant) in item.variants.iter().enumerate() {
        match item.variant_versions.get(&(index + 1)) {
            Some(version) => {
                let _ = writeln!(out, "Variant: {{{version}}}{variant}");
            }
            None => {
                let _ = writeln!(out, "Variant: {variant}");
            }
        }
    }
    if item.has_alt_variant {
        let _ = writeln!(out, "Has Alt Variant: true");
    }
    if item.has_alt_variant2 {
        let _ = writeln!(out, "Has Alt Variant Two: true");
    }
    if item.selected_variant > 0 {
        let _ = writeln!(out, "Selected Variant: {}", item.selected_variant);
    }
    if item.has_alt_variant && item.selected_alt_variant > 0 {
        let _ = writeln!(out, "Selected Alt Variant: {}", item.selected_alt_variant);
    }
    if item.has_alt_variant2 && item.selected_alt_variant2 > 0 {
        let _ = writeln!(out, "Selected Alt Variant Two: {}", item.selected_alt_variant2);
    }
    if item.quality > 0 {
        let _ = writeln!(out, "Quality: {}", item.quality);
    }
    if !item.sockets.is_empty() {
        let _ = writeln!(out, "Sockets: {}", format_sockets(&item.sockets));
    }
    if item.requirements.level > 0 {
        let _ = writeln!(out, "LevelReq: {}", item.requirements.level);
    }
    let attrs = attribute_requirements(item);
    if !attrs.is_empty() {
        let _ = writeln!(out, "Requires: {}", attrs.join(", "));
    }
    if let Some(radius) = &item.radius_label {
        let _ = writeln!(out, "Radius: {radius}");
    }
    if let Some(limit) = item.limit {
        let _ = writeln!(out, "Limited to: {limit}");
    }
    let _ = writeln!(out, "Implicits: {}", item.implicit_count());
    for line in &item.enchant_lines {
        let _ = writeln!(out, "{} (enchant)", mod_line_text(line));
    }
    for line in &item.implicit_lines {
        let _ = writeln!(out, "{}", mod_line_text(line));
    }
    for line in &item.explicit_lines {
        let _ = writeln!(out, "{}", mod_line_text(line));
    }
    if item.corrupted {
        let _ = writeln!(out, "Corrupted");
    }
    out
}

fn affix_value(slot: &crate::item::AffixSlot) -> String {
    match slot.range {
        Some(range) => format!("{{range:{range}}}{}", slot.id),
        None => slot.id.clone(),
    }
}

fn attribute_requirements(item: &Item) -> Vec<String> {
    let req = &item.requirements;
    let mut attrs = Vec::new();
    if req.strength > 0 {
        attrs.push(format!("{} Str", req.strength));
    }
    if req.dexterity > 0 {
        attrs.push(format!("{} Dex", req.dexterity));
    }
    if req.intelligence > 0 {
        attrs.push(format!("{} Int", req.intelligence));
    }
    attrs
}

/// Re-attach the bracketed markers a line carried
fn mod_line_text(line: &ModLine) -> String {
    let annot = LineAnnotations {
        crafted: line.crafted,
        custom: line.custom,
        fractured: line.fractured,
        variants: line.variants.clone(),
        range: line.range,
        tags: line.tags.clone(),
        ..LineAnnotations::default()
    };
    format!("{}{}", annot.markers(), line.line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalogs;
    use crate::parse::parse_item;

    fn roundtrip(text: &str) -> (Item, Item) {
        let db = Catalogs::builtin();
        let first = parse_item(text, db);
        let second = parse_item(&build_raw(&first), db);
        (first, second)
    }

    #[test]
    fn test_roundtrip_rare_weapon() {
        let (first, second) = roundtrip(
            "Rarity: RARE\n\
             Storm Edge\n\
             Broad Sword\n\
             Item Level: 70\n\
             Quality: 20\n\
             Sockets: R-G B\n\
             LevelReq: 30\n\
             Implicits: 1\n\
             +12% to Fire Resistance\n\
             Adds 5 to 9 Physical Damage\n\
             12% increased Attack Speed\n\
             Culling Strike\n\
             Corrupted\n",
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_roundtrip_unique_with_variants() {
        let (first, second) = roundtrip(
            "Rarity: UNIQUE\n\
             Ventor's Gamble\n\
             Gold Ring\n\
             League: Prophecy\n\
             Variant: Pre 3.0\n\
             Variant: Current\n\
             Selected Variant: 1\n\
             Item Level: 80\n\
             Implicits: 1\n\
             +15 to maximum Life\n\
             {variant:1}+10 to maximum Energy Shield\n\
             {variant:2}{range:0.5}+(5-10) to maximum Energy Shield\n",
        );
        assert_eq!(first, second);
        assert_eq!(second.variants.len(), 2);
        assert_eq!(second.selected_variant, 1);
    }

    #[test]
    fn test_roundtrip_versioned_variants() {
        let (first, second) = roundtrip(
            "Rarity: UNIQUE\n\
             Ventor's Gamble\n\
             Gold Ring\n\
             Variant: {2.6}Pre 3.0\n\
             Variant: {current}Current\n\
             Selected Variant: 1\n\
             Implicits: 0\n\
             {variant:1}20% increased Accuracy Rating\n",
        );
        assert_eq!(first, second);
        assert_eq!(second.variant_versions.get(&1).map(String::as_str), Some("2.6"));
        assert!(second.legacy_variant_selected());
    }

    #[test]
    fn test_roundtrip_crafted_selections() {
        let (first, second) = roundtrip(
            "Rarity: RARE\n\
             Test\n\
             Broad Sword\n\
             Crafted: true\n\
             Prefix: {range:0.25}FlatPhysPrefix\n\
             Prefix: None\n\
             Prefix: None\n\
             Suffix: AttackSpeedSuffix\n\
             Suffix: None\n\
             Suffix: None\n\
             Implicits: 0\n",
        );
        assert_eq!(first, second);
        assert_eq!(second.prefixes[0].range, Some(0.25));
    }

    #[test]
    fn test_roundtrip_catalyst_and_influence() {
        let (first, second) = roundtrip(
            "Rarity: RARE\n\
             Loop\n\
             Gold Ring\n\
             Shaper Item\n\
             Hunter Item\n\
             Catalyst: 5\n\
             CatalystQuality: 10\n\
             Implicits: 0\n\
             {tags:attribute}+10 to Strength\n",
        );
        assert_eq!(first, second);
        // The tagged line scales identically on both passes
        assert_eq!(second.explicit_lines[0].mods[0].value.number(), 11.0);
    }

    #[test]
    fn test_roundtrip_preserves_unparsed_lines() {
        let (first, second) = roundtrip(
            "Rarity: RARE\n\
             Test\n\
             Gold Ring\n\
             Implicits: 0\n\
             Grants Level 20 Ice Nova Skill\n",
        );
        assert_eq!(first, second);
        assert!(second.explicit_lines[0].is_unparsed());
        assert_eq!(second.explicit_lines[0].line, "Grants Level 20 Ice Nova Skill");
    }

    #[test]
    fn test_roundtrip_enchant_lines() {
        let (first, second) = roundtrip(
            "Rarity: RARE\n\
             Test\n\
             Iron Greaves\n\
             Implicits: 1\n\
             Regenerate 2 Life per second (enchant)\n\
             +25 to maximum Life\n",
        );
        assert_eq!(first, second);
        assert_eq!(second.enchant_lines.len(), 1);
        assert_eq!(second.explicit_lines.len(), 1);
    }

    #[test]
    fn test_serialize_is_stable() {
        let db = Catalogs::builtin();
        let text = "Rarity: MAGIC\nHeavy Broad Sword of Skill\n";
        let first = build_raw(&parse_item(text, db));
        let second = build_raw(&parse_item(&first, db));
        assert_eq!(first, second);
    }

    #[test]
    fn test_emission_order() {
        let db = Catalogs::builtin();
        let item = parse_item(
            "Rarity: RARE\n\
             Test\n\
             Broad Sword\n\
             Item Level: 50\n\
             Implicits: 0\n\
             Corrupted\n",

            db,
        );
        let raw = build_raw(&item);
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines[0], "Rarity: RARE");
        assert_eq!(lines[1], "Test");
        assert_eq!(lines[2], "Broad Sword");
        assert!(raw.ends_with("Corrupted\n"));
        let implicits_at = lines.iter().position(|l| l.starts_with("Implicits:")).unwrap();
        let sockets_at = lines.iter().position(|l| l.starts_with("Sockets:")).unwrap();
        assert!(sockets_at < implicits_at);
    }
}
