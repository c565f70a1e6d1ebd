//! Jewel data collection and cluster validity

use crate::catalog::ItemBase;
use crate::item::Item;
use crate::modifier::{flag, ModKind, ModList};

use super::StatBlock;

pub(super) fn derive(item: &Item, base: &ItemBase, slot: u8, pool: &mut ModList) -> StatBlock {
    let mut data = StatBlock::default();

    if let Some(radius) = &item.radius_label {
        data.set_text("Radius", radius);
        // "Variable" defers the concrete radius to whatever consumes the
        // block, typically a threshold lookup outside this crate
        if radius == "Variable" {
            data.set_flag("RadiusVariable", true);
        }
    }
    if let Some(limit) = item.limit {
        data.set("Limit", limit as f64);
    }

    let notables = pool.list_entries("ClusterJewelNotable");
    let small_stats = pool.list_entries("ClusterJewelSmallStat");
    let keystones = pool.list_entries("JewelKeystone");

    let node_from_mods = pool.sum_local("JewelNodeCount", ModKind::Base, flag::JEWEL_LOCAL, slot);
    let nothing_count = pool.sum_local("NothingnessCount", ModKind::Base, flag::JEWEL_LOCAL, slot);
    let nothingness = pool.flag_local("ClusterNothingness", flag::JEWEL_LOCAL, slot);
    let socket_override = pool.sum_local("JewelSocketCount", ModKind::Base, flag::JEWEL_LOCAL, slot);

    let mut node_count = item
        .cluster_node_count
        .map(|n| n as f64)
        .or((node_from_mods > 0.0).then_some(node_from_mods));
    if let (Some(jewel), Some(count)) = (base.jewel.as_ref(), node_count) {
        node_count = Some(count.clamp(jewel.cluster_min as f64, jewel.cluster_max as f64));
    }

    if let Some(skill) = &item.cluster_skill {
        data.set_text("ClusterSkill", skill);
    }
    if let Some(count) = node_count {
        data.set("NodeCount", count);
    }
    if !notables.is_empty() {
        data.set_list("Notables", notables.clone());
    }
    if !small_stats.is_empty() {
        data.set_list("SmallStats", small_stats);
    }
    if let Some(keystone) = keystones.first() {
        data.set_text("Keystone", keystone);
    }
    if nothingness {
        data.set_flag("Nothingness", true);
    }
    if nothing_count > 0.0 {
        data.set("NothingnessCount", nothing_count);
    }
    if socket_override > 0.0 {
        data.set("SocketCount", socket_override);
    }

    // Plain jewels are always valid; a cluster jewel must describe a
    // coherent node layout
    let valid = if base.jewel.is_some() {
        let has_nodes = node_count.is_some_and(|n| n > 0.0);
        !keystones.is_empty()
            || ((item.cluster_skill.is_some() || nothingness) && has_nodes)
            || (socket_override > 0.0 && nothing_count > 0.0)
    } else {
        true
    };
    data.set_flag("Valid", valid);

    for (key, value) in pool.override_entries("JewelData") {
        data.apply_override(&key, &value);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalogs;
    use crate::item::ModLine;
    use crate::modifier::Modifier;
    use crate::types::Rarity;

    fn cluster_item() -> (Item, ItemBase) {
        let base = Catalogs::builtin()
            .bases
            .lookup("Large Cluster Jewel")
            .unwrap()
            .clone();
        let item = Item {
            rarity: Rarity::Rare,
            base_name: base.name.clone(),
            base: Some(base.clone()),
            ..Item::default()
        };
        (item, base)
    }

    fn pool_with(mods: Vec<Modifier>) -> ModList {
        mods.into_iter().collect()
    }

    #[test]
    fn test_plain_jewel_is_valid() {
        let base = Catalogs::builtin().bases.lookup("Cobalt Jewel").unwrap().clone();
        let item = Item {
            base: Some(base.clone()),
            radius_label: Some("Large".into()),
            ..Item::default()
        };
        let mut pool = ModList::new();
        let data = derive(&item, &base, 1, &mut pool);
        assert!(data.flag("Valid"));
        assert_eq!(data.text("Radius"), Some("Large"));
        assert!(!data.flag("RadiusVariable"));
    }

    #[test]
    fn test_variable_radius_is_deferred() {
        let base = Catalogs::builtin().bases.lookup("Cobalt Jewel").unwrap().clone();
        let item = Item {
            base: Some(base.clone()),
            radius_label: Some("Variable".into()),
            ..Item::default()
        };
        let mut pool = ModList::new();
        let data = derive(&item, &base, 1, &mut pool);
        assert_eq!(data.text("Radius"), Some("Variable"));
        assert!(data.flag("RadiusVariable"));
    }

    #[test]
    fn test_cluster_requires_skill_and_nodes() {
        let (mut item, base) = cluster_item();
        let mut pool = pool_with(vec![
            Modifier::base("JewelNodeCount", 8.0).with_flags(flag::JEWEL_LOCAL),
        ]);
        // Nodes alone are not coherent
        let data = derive(&item, &base, 1, &mut pool);
        assert!(!data.flag("Valid"));
        assert_eq!(data.number("NodeCount"), 8.0);

        item.cluster_skill = Some("Axe Damage".into());
        let mut pool = pool_with(vec![
            Modifier::base("JewelNodeCount", 8.0).with_flags(flag::JEWEL_LOCAL),
        ]);
        let data = derive(&item, &base, 1, &mut pool);
        assert!(data.flag("Valid"));
    }

    #[test]
    fn test_cluster_node_count_clamped() {
        let (mut item, base) = cluster_item();
        item.cluster_skill = Some("Fire Damage".into());
        item.cluster_node_count = Some(30);
        let mut pool = ModList::new();
        let data = derive(&item, &base, 1, &mut pool);
        assert_eq!(data.number("NodeCount"), 12.0);
    }

    #[test]
    fn test_keystone_grant_is_sufficient() {
        let (item, base) = cluster_item();
        let mut pool = pool_with(vec![Modifier::list("JewelKeystone", "Resolute Technique")]);
        let data = derive(&item, &base, 1, &mut pool);
        assert!(data.flag("Valid"));
        assert_eq!(data.text("Keystone"), Some("Resolute Technique"));
    }

    #[test]
    fn test_nothingness_with_socket_override() {
        let (item, base) = cluster_item();
        let mut pool = pool_with(vec![
            Modifier::base("JewelSocketCount", 2.0).with_flags(flag::JEWEL_LOCAL),
            Modifier::base("NothingnessCount", 4.0).with_flags(flag::JEWEL_LOCAL),
            Modifier::switch("ClusterNothingness", true).with_flags(flag::JEWEL_LOCAL),
        ]);
        let data = derive(&item, &base, 1, &mut pool);
        assert!(data.flag("Valid"));
        assert!(data.flag("Nothingness"));
        assert_eq!(data.number("SocketCount"), 2.0);
    }

    #[test]
    fn test_notables_and_small_stats_collected() {
        let (mut item, base) = cluster_item();
        item.cluster_skill = Some("Sword Damage".into());
        item.explicit_lines.push(ModLine::default());
        let mut pool = pool_with(vec![
            Modifier::base("JewelNodeCount", 9.0).with_flags(flag::JEWEL_LOCAL),
            Modifier::list("ClusterJewelNotable", "Feed the Fury"),
            Modifier::list("ClusterJewelSmallStat", "12% increased Sword Damage"),
        ]);
        let data = derive(&item, &base, 1, &mut pool);
        assert_eq!(data.list("Notables"), ["Feed the Fury".to_string()]);
        assert_eq!(
            data.list("SmallStats"),
            ["12% increased Sword Damage".to_string()]
        );
    }
}
