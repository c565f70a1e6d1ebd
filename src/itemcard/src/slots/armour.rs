//! Armour stat derivation
//!
//! Each final stat sums its own flat base plus every shared-base pool that
//! includes it, then scales once by all the increases that affect it plus
//! item quality.

use crate::catalog::ArmourBase;
use crate::modifier::{flag, ModKind, ModList, ModTag, Modifier};

use super::StatBlock;

pub(super) fn derive(base: &ArmourBase, quality: u32, slot: u8, pool: &mut ModList) -> StatBlock {
    let mut data = StatBlock::default();
    let quality = quality as f64;

    let mut sum_base = |name: &str| pool.sum_local(name, ModKind::Base, flag::ARMOUR_LOCAL, slot);
    let add_armour = sum_base("Armour");
    let add_evasion = sum_base("Evasion");
    let add_es = sum_base("EnergyShield");
    let add_ae = sum_base("ArmourAndEvasion");
    let add_aes = sum_base("ArmourAndEnergyShield");
    let add_ees = sum_base("EvasionAndEnergyShield");

    let mut sum_inc = |name: &str| pool.sum_local(name, ModKind::Inc, flag::ARMOUR_LOCAL, slot);
    let inc_armour = sum_inc("Armour");
    let inc_evasion = sum_inc("Evasion");
    let inc_es = sum_inc("EnergyShield");
    let inc_ae = sum_inc("ArmourAndEvasion");
    let inc_aes = sum_inc("ArmourAndEnergyShield");
    let inc_ees = sum_inc("EvasionAndEnergyShield");
    let inc_defences = sum_inc("Defences");

    let armour = ((base.armour + add_armour + add_ae + add_aes)
        * (1.0 + (inc_armour + inc_ae + inc_aes + inc_defences + quality) / 100.0))
        .round();
    let evasion = ((base.evasion + add_evasion + add_ae + add_ees)
        * (1.0 + (inc_evasion + inc_ae + inc_ees + inc_defences + quality) / 100.0))
        .round();
    let energy_shield = ((base.energy_shield + add_es + add_aes + add_ees)
        * (1.0 + (inc_es + inc_aes + inc_ees + inc_defences + quality) / 100.0))
        .round();

    if armour != 0.0 {
        data.set("Armour", armour);
    }
    if evasion != 0.0 {
        data.set("Evasion", evasion);
    }
    if energy_shield != 0.0 {
        data.set("EnergyShield", energy_shield);
    }

    let block = base.block_chance
        + pool.sum_local("BlockChance", ModKind::Base, flag::ARMOUR_LOCAL, slot);
    if block != 0.0 {
        data.set("BlockChance", block);
    }

    if base.movement_penalty != 0.0 {
        pool.push(
            Modifier::inc("MovementSpeed", -base.movement_penalty)
                .with_tag(ModTag::Condition("MovementPenaltiesNotIgnored".into())),
        );
    }

    for (key, value) in pool.override_entries("ArmourData") {
        data.apply_override(&key, &value);
    }
    data
}
