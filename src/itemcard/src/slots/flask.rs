//! Flask stat derivation

use crate::catalog::FlaskBase;
use crate::modifier::{flag, ModKind, ModList};

use super::{round2, StatBlock};

pub(super) fn derive(base: &FlaskBase, quality: u32, slot: u8, pool: &mut ModList) -> StatBlock {
    let mut data = StatBlock::default();
    let quality = quality as f64;

    let mut sum_base = |name: &str| pool.sum_local(name, ModKind::Base, flag::FLASK_LOCAL, slot);
    let instant_pct = (base.instant_percent + sum_base("FlaskInstantRecovery")).clamp(0.0, 100.0);
    let charges_add = sum_base("FlaskCharges");

    let mut sum_inc = |name: &str| pool.sum_local(name, ModKind::Inc, flag::FLASK_LOCAL, slot);
    let recovery_inc = sum_inc("FlaskRecovery");
    let rate_inc = sum_inc("FlaskRecoveryRate");
    let duration_inc = sum_inc("FlaskDuration");
    let charges_used_inc = sum_inc("FlaskChargesUsed");
    let charge_recovery_inc = sum_inc("FlaskChargeRecovery");
    let effect_inc = sum_inc("FlaskEffect");

    let recovery_flask = base.life > 0.0 || base.mana > 0.0;
    if recovery_flask {
        let duration = base.duration * (1.0 + duration_inc / 100.0) / (1.0 + rate_inc / 100.0);
        data.set("Duration", round2(duration));
        if instant_pct > 0.0 {
            data.set("InstantPercent", instant_pct);
        }
        for (resource, amount) in [("Life", base.life), ("Mana", base.mana)] {
            if amount <= 0.0 {
                continue;
            }
            let total_base = amount * (1.0 + quality / 100.0) * (1.0 + recovery_inc / 100.0);
            let instant = total_base * instant_pct / 100.0;
            // The gradual portion stretches with duration
            let gradual =
                total_base * (1.0 - instant_pct / 100.0) * (1.0 + duration_inc / 100.0);
            data.set(&format!("{resource}Base"), round2(total_base));
            data.set(&format!("{resource}Instant"), round2(instant));
            data.set(&format!("{resource}Gradual"), round2(gradual));
            data.set(&format!("{resource}Total"), round2(instant + gradual));
        }
    } else {
        // Utility flasks take quality on duration instead of recovery
        data.set(
            "Duration",
            round2(base.duration * (1.0 + (duration_inc + quality) / 100.0)),
        );
    }

    data.set("ChargesMax", base.charges_max as f64 + charges_add);
    data.set(
        "ChargesUsed",
        (base.charges_used as f64 * (1.0 + charges_used_inc / 100.0)).floor(),
    );
    if charge_recovery_inc != 0.0 {
        data.set("ChargeRecovery", 1.0 + charge_recovery_inc / 100.0);
    }
    if effect_inc != 0.0 {
        data.set("EffectInc", effect_inc);
    }

    for (key, value) in pool.override_entries("FlaskData") {
        data.apply_override(&key, &value);
    }
    data
}
