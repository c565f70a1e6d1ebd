//! Weapon stat derivation

use crate::catalog::WeaponBase;
use crate::modifier::{flag, ModKind, ModList, ModTag};

use super::{round2, StatBlock};

const DAMAGE_TYPES: [&str; 5] = ["Physical", "Lightning", "Cold", "Fire", "Chaos"];

/// Modifiers that only fire when this weapon is the attacking hand
const HAND_CONDITIONAL: [&str; 6] = [
    "Accuracy",
    "LifeOnHit",
    "ManaOnHit",
    "PhysicalDamageLifeLeech",
    "PoisonChance",
    "BleedChance",
];

pub(super) fn derive(
    base: &WeaponBase,
    quality: u32,
    slot: u8,
    legacy: bool,
    pool: &mut ModList,
) -> StatBlock {
    let mut data = StatBlock::default();

    let speed_inc = pool.sum_local("Speed", ModKind::Inc, flag::WEAPON_LOCAL, slot);
    let range_add = pool.sum_local("WeaponRange", ModKind::Base, flag::WEAPON_LOCAL, slot);
    let phys_inc = pool.sum_local("PhysicalDamage", ModKind::Inc, flag::WEAPON_LOCAL, slot);
    let crit_inc = pool.sum_local("CritChance", ModKind::Inc, flag::WEAPON_LOCAL, slot);
    let mut accuracy = pool.sum_local("Accuracy", ModKind::Base, flag::WEAPON_LOCAL, slot);
    let accuracy_inc = pool.sum_local("Accuracy", ModKind::Inc, flag::WEAPON_LOCAL, slot);

    // On cards from pre-rework version labels, a local accuracy increase
    // was a damage multiplier; today it scales the accuracy value itself
    let damage_more = if legacy {
        1.0 + accuracy_inc / 100.0
    } else {
        accuracy = (accuracy * (1.0 + accuracy_inc / 100.0)).round();
        1.0
    };

    let attack_rate = round2(base.attack_rate * (1.0 + speed_inc / 100.0));
    data.set("AttackRate", attack_rate);
    data.set("CritChance", round2(base.crit_chance * (1.0 + crit_inc / 100.0)));
    data.set("Range", base.range + range_add);
    if accuracy != 0.0 {
        data.set("Accuracy", accuracy);
    }

    let mut total_dps = 0.0;
    let mut elemental_dps = 0.0;
    for kind in DAMAGE_TYPES {
        let add_min = pool.sum_local(&format!("{kind}Min"), ModKind::Base, flag::WEAPON_LOCAL, slot);
        let add_max = pool.sum_local(&format!("{kind}Max"), ModKind::Base, flag::WEAPON_LOCAL, slot);
        let physical = kind == "Physical";
        let (base_min, base_max) = if physical {
            (base.physical_min, base.physical_max)
        } else {
            (0.0, 0.0)
        };
        // Physical increase and quality scale physical damage only
        let scale = if physical {
            1.0 + (phys_inc + quality as f64) / 100.0
        } else {
            1.0
        };
        let min = ((base_min + add_min) * scale).round();
        let max = ((base_max + add_max) * scale).round();
        if min == 0.0 && max == 0.0 && !physical {
            continue;
        }
        data.set(&format!("{kind}Min"), min);
        data.set(&format!("{kind}Max"), max);
        let dps = round2((min + max) / 2.0 * attack_rate * damage_more);
        data.set(&format!("{kind}DPS"), dps);
        total_dps += dps;
        if matches!(kind, "Lightning" | "Cold" | "Fire") {
            elemental_dps += dps;
        }
    }
    if elemental_dps != 0.0 {
        data.set("ElementalDPS", round2(elemental_dps));
    }
    data.set("TotalDPS", round2(total_dps));

    retag_hand_conditionals(pool, slot);
    for (key, value) in pool.override_entries("WeaponData") {
        data.apply_override(&key, &value);
    }
    data
}

fn retag_hand_conditionals(pool: &mut ModList, slot: u8) {
    let hand = if slot == 2 { "Off" } else { "Main" };
    let condition = format!("{hand}HandAttack");
    for modifier in pool.iter_mut() {
        if modifier.flags & flag::ATTACK != 0
            && HAND_CONDITIONAL.contains(&modifier.name.as_str())
        {
            modifier.tags.push(ModTag::Condition(condition.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::Modifier;

    fn broad_sword() -> WeaponBase {
        WeaponBase {
            physical_min: 10.0,
            physical_max: 20.0,
            attack_rate: 1.5,
            crit_chance: 5.0,
            range: 11.0,
        }
    }

    #[test]
    fn test_base_dps() {
        let mut pool = ModList::new();
        let data = derive(&broad_sword(), 0, 1, false, &mut pool);
        assert_eq!(data.number("PhysicalMin"), 10.0);
        assert_eq!(data.number("PhysicalMax"), 20.0);
        assert_eq!(data.number("PhysicalDPS"), 22.5);
        assert_eq!(data.number("TotalDPS"), 22.5);
        assert_eq!(data.number("ElementalDPS"), 0.0);
        assert_eq!(data.number("CritChance"), 5.0);
        assert_eq!(data.number("Range"), 11.0);
    }

    #[test]
    fn test_physical_scaling_with_quality_and_increase() {
        let mut pool = ModList::new();
        pool.push(Modifier::inc("PhysicalDamage", 30.0).with_flags(flag::WEAPON_LOCAL));
        pool.push(Modifier::base("PhysicalMin", 5.0).with_flags(flag::WEAPON_LOCAL));
        pool.push(Modifier::base("PhysicalMax", 10.0).with_flags(flag::WEAPON_LOCAL));
        let data = derive(&broad_sword(), 20, 1, false, &mut pool);
        // (10+5) * 1.5 = 22.5 -> 23, (20+10) * 1.5 = 45
        assert_eq!(data.number("PhysicalMin"), 23.0);
        assert_eq!(data.number("PhysicalMax"), 45.0);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_attack_speed_scales_rate_and_dps() {
        let mut pool = ModList::new();
        pool.push(Modifier::inc("Speed", 10.0).with_flags(flag::WEAPON_LOCAL));
        let data = derive(&broad_sword(), 0, 1, false, &mut pool);
        assert_eq!(data.number("AttackRate"), 1.65);
        assert_eq!(data.number("PhysicalDPS"), round2(15.0 * 1.65));
    }

    #[test]
    fn test_elemental_damage_totals() {
        let mut pool = ModList::new();
        pool.push(Modifier::base("FireMin", 10.0).with_flags(flag::WEAPON_LOCAL));
        pool.push(Modifier::base("FireMax", 20.0).with_flags(flag::WEAPON_LOCAL));
        pool.push(Modifier::base("ChaosMin", 4.0).with_flags(flag::WEAPON_LOCAL));
        pool.push(Modifier::base("ChaosMax", 6.0).with_flags(flag::WEAPON_LOCAL));
        let data = derive(&broad_sword(), 0, 1, false, &mut pool);
        let fire_dps = round2(15.0 * 1.5);
        let chaos_dps = round2(5.0 * 1.5);
        assert_eq!(data.number("FireDPS"), fire_dps);
        // Chaos is neither physical nor elemental
        assert_eq!(data.number("ElementalDPS"), fire_dps);
        assert_eq!(data.number("TotalDPS"), round2(22.5 + fire_dps + chaos_dps));
    }

    #[test]
    fn test_accuracy_increase_scales_accuracy_on_current_cards() {
        let mut pool = ModList::new();
        pool.push(Modifier::base("Accuracy", 100.0).with_flags(flag::WEAPON_LOCAL));
        pool.push(Modifier::inc("Accuracy", 20.0).with_flags(flag::WEAPON_LOCAL));
        let data = derive(&broad_sword(), 0, 1, false, &mut pool);
        assert_eq!(data.number("Accuracy"), 120.0);
        assert_eq!(data.number("PhysicalDPS"), 22.5);
    }

    #[test]
    fn test_legacy_accuracy_increase_is_more_damage() {
        let mut pool = ModList::new();
        pool.push(Modifier::base("Accuracy", 100.0).with_flags(flag::WEAPON_LOCAL));
        pool.push(Modifier::inc("Accuracy", 20.0).with_flags(flag::WEAPON_LOCAL));
        let data = derive(&broad_sword(), 0, 1, true, &mut pool);
        // The increase multiplies damage instead of the accuracy value
        assert_eq!(data.number("Accuracy"), 100.0);
        assert_eq!(data.number("PhysicalDPS"), 27.0);
        assert_eq!(data.number("TotalDPS"), 27.0);
    }

    #[test]
    fn test_hand_conditional_retagging() {
        let mut pool = ModList::new();
        pool.push(Modifier::base("LifeOnHit", 12.0).with_flags(flag::ATTACK));
        pool.push(Modifier::base("Accuracy", 200.0).with_flags(flag::ATTACK));
        pool.push(Modifier::base("FireResist", 10.0));
        derive(&broad_sword(), 0, 2, false, &mut pool);
        let on_hit = pool.iter().find(|m| m.name == "LifeOnHit").unwrap();
        assert_eq!(on_hit.tags, vec![ModTag::Condition("OffHandAttack".into())]);
        let accuracy = pool.iter().find(|m| m.name == "Accuracy").unwrap();
        assert_eq!(accuracy.tags, vec![ModTag::Condition("OffHandAttack".into())]);
        let resist = pool.iter().find(|m| m.name == "FireResist").unwrap();
        assert!(resist.tags.is_empty());
    }
}
