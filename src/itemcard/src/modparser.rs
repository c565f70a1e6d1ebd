//! Modifier-line text parsing
//!
//! [`ModLineParser`] is the seam the text parser hands single lines to.
//! [`DefaultModParser`] is the built-in reference implementation: an ordered
//! regex table covering the line shapes the derivation engine understands.
//! Anything it cannot fully consume comes back as leftover text, which the
//! caller treats as a parse failure for that line.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::modifier::{flag, ModKind, ModTag, ModValue, Modifier};

/// Result of parsing one physical modifier line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedModLine {
    pub mods: Vec<Modifier>,
    /// Unconsumed text; `Some` signals a partial or failed parse
    pub leftover: Option<String>,
}

impl ParsedModLine {
    pub fn is_complete(&self) -> bool {
        self.leftover.is_none()
    }
}

/// Converts a single free-text line into structured modifiers
pub trait ModLineParser {
    fn parse_mod_line(&self, line: &str) -> ParsedModLine;
}

type Builder = Box<dyn Fn(&Captures) -> Vec<Modifier> + Send + Sync>;

struct Pattern {
    re: Regex,
    build: Builder,
}

fn pattern(re: &str, build: impl Fn(&Captures) -> Vec<Modifier> + Send + Sync + 'static) -> Pattern {
    Pattern {
        re: Regex::new(re).expect("modifier pattern"),
        build: Box::new(build),
    }
}

fn num(caps: &Captures, index: usize) -> f64 {
    caps.get(index)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

/// `increased` keeps the sign, `reduced` flips it
fn signed(caps: &Captures, value_index: usize, word_index: usize) -> f64 {
    let value = num(caps, value_index);
    if caps.get(word_index).map(|m| m.as_str()) == Some("reduced") {
        -value
    } else {
        value
    }
}

fn pascal_case(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn defence_pool_name(text: &str) -> &'static str {
    match text {
        "Armour" => "Armour",
        "Evasion Rating" => "Evasion",
        "maximum Energy Shield" | "Energy Shield" => "EnergyShield",
        "Armour and Evasion" => "ArmourAndEvasion",
        "Armour and Energy Shield" => "ArmourAndEnergyShield",
        "Evasion and Energy Shield" => "EvasionAndEnergyShield",
        _ => "Defences",
    }
}

/// Ordered pattern table; specific local forms come before the generic
/// global fallbacks.
static PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        // Weapon-local
        pattern(
            r"^Adds (\d+(?:\.\d+)?) to (\d+(?:\.\d+)?) (Physical|Lightning|Cold|Fire|Chaos) Damage$",
            |caps| {
                let kind = caps[3].to_string();
                vec![
                    Modifier::base(format!("{kind}Min"), num(caps, 1)).with_flags(flag::WEAPON_LOCAL),
                    Modifier::base(format!("{kind}Max"), num(caps, 2)).with_flags(flag::WEAPON_LOCAL),
                ]
            },
        ),
        pattern(r"^(\d+(?:\.\d+)?)% (increased|reduced) Attack Speed$", |caps| {
            vec![Modifier::inc("Speed", signed(caps, 1, 2)).with_flags(flag::WEAPON_LOCAL)]
        }),
        pattern(r"^(\d+(?:\.\d+)?)% (increased|reduced) Physical Damage$", |caps| {
            vec![Modifier::inc("PhysicalDamage", signed(caps, 1, 2)).with_flags(flag::WEAPON_LOCAL)]
        }),
        pattern(
            r"^(\d+(?:\.\d+)?)% (increased|reduced) Critical Strike Chance$",
            |caps| {
                vec![Modifier::inc("CritChance", signed(caps, 1, 2)).with_flags(flag::WEAPON_LOCAL)]
            },
        ),
        pattern(r"^\+(\d+) to Weapon Range$", |caps| {
            vec![Modifier::base("WeaponRange", num(caps, 1)).with_flags(flag::WEAPON_LOCAL)]
        }),
        pattern(r"^\+(\d+(?:\.\d+)?) to Accuracy Rating$", |caps| {
            vec![Modifier::base("Accuracy", num(caps, 1)).with_flags(flag::WEAPON_LOCAL)]
        }),
        pattern(
            r"^(\d+(?:\.\d+)?)% (increased|reduced) Accuracy Rating$",
            |caps| {
                vec![Modifier::inc("Accuracy", signed(caps, 1, 2)).with_flags(flag::WEAPON_LOCAL)]
            },
        ),
        // Attack-conditional (re-tagged per hand during weapon derivation)
        pattern(
            r"^\+(\d+(?:\.\d+)?) (Life|Mana) gained for each Enemy hit by Attacks$",
            |caps| {
                let resource = caps[2].to_string();
                vec![Modifier::base(format!("{resource}OnHit"), num(caps, 1)).with_flags(flag::ATTACK)]
            },
        ),
        pattern(
            r"^(\d+(?:\.\d+)?)% of Physical Attack Damage Leeched as Life$",
            |caps| {
                vec![
                    Modifier::base("PhysicalDamageLifeLeech", num(caps, 1)).with_flags(flag::ATTACK),
                ]
            },
        ),
        pattern(r"^(\d+(?:\.\d+)?)% chance to Poison on Hit$", |caps| {
            vec![Modifier::base("PoisonChance", num(caps, 1)).with_flags(flag::ATTACK)]
        }),
        pattern(r"^(\d+(?:\.\d+)?)% chance to cause Bleeding on Hit$", |caps| {
            vec![Modifier::base("BleedChance", num(caps, 1)).with_flags(flag::ATTACK)]
        }),
        // Armour-local
        pattern(
            r"^(\d+(?:\.\d+)?)% (increased|reduced) (Armour and Evasion|Armour and Energy Shield|Evasion and Energy Shield|Armour|Evasion Rating|Energy Shield|Defences)$",
            |caps| {
                let name = defence_pool_name(&caps[3]);
                vec![Modifier::inc(name, signed(caps, 1, 2)).with_flags(flag::ARMOUR_LOCAL)]
            },
        ),
        pattern(
            r"^\+(\d+(?:\.\d+)?) to (Armour and Evasion|Armour and Energy Shield|Evasion and Energy Shield|Armour|Evasion Rating|maximum Energy Shield)$",
            |caps| {
                let name = defence_pool_name(&caps[2]);
                vec![Modifier::base(name, num(caps, 1)).with_flags(flag::ARMOUR_LOCAL)]
            },
        ),
        pattern(r"^\+(\d+(?:\.\d+)?)% Chance to Block$", |caps| {
            vec![Modifier::base("BlockChance", num(caps, 1)).with_flags(flag::ARMOUR_LOCAL)]
        }),
        // Flask-local
        pattern(r"^(\d+(?:\.\d+)?)% of Recovery applied Instantly$", |caps| {
            vec![Modifier::base("FlaskInstantRecovery", num(caps, 1)).with_flags(flag::FLASK_LOCAL)]
        }),
        pattern(r"^(\d+(?:\.\d+)?)% (increased|reduced) Amount Recovered$", |caps| {
            vec![Modifier::inc("FlaskRecovery", signed(caps, 1, 2)).with_flags(flag::FLASK_LOCAL)]
        }),
        pattern(r"^(\d+(?:\.\d+)?)% (increased|reduced) Recovery rate$", |caps| {
            vec![Modifier::inc("FlaskRecoveryRate", signed(caps, 1, 2)).with_flags(flag::FLASK_LOCAL)]
        }),
        pattern(r"^(\d+(?:\.\d+)?)% (increased|reduced) Duration$", |caps| {
            vec![Modifier::inc("FlaskDuration", signed(caps, 1, 2)).with_flags(flag::FLASK_LOCAL)]
        }),
        pattern(r"^\+(\d+) to Maximum Charges$", |caps| {
            vec![Modifier::base("FlaskCharges", num(caps, 1)).with_flags(flag::FLASK_LOCAL)]
        }),
        pattern(r"^(\d+(?:\.\d+)?)% (increased|reduced) Charges per use$", |caps| {
            vec![Modifier::inc("FlaskChargesUsed", signed(caps, 1, 2)).with_flags(flag::FLASK_LOCAL)]
        }),
        pattern(r"^(\d+(?:\.\d+)?)% (increased|reduced) Charge Recovery$", |caps| {
            vec![Modifier::inc("FlaskChargeRecovery", signed(caps, 1, 2)).with_flags(flag::FLASK_LOCAL)]
        }),
        pattern(r"^(\d+(?:\.\d+)?)% (increased|reduced) effect$", |caps| {
            vec![Modifier::inc("FlaskEffect", signed(caps, 1, 2)).with_flags(flag::FLASK_LOCAL)]
        }),
        // Cluster jewel grammar
        pattern(r"^Adds (\d+) Passive Skills?$", |caps| {
            vec![Modifier::base("JewelNodeCount", num(caps, 1)).with_flags(flag::JEWEL_LOCAL)]
        }),
        pattern(r"^1 Added Passive Skill is (.+)$", |caps| {
            vec![Modifier::list("ClusterJewelNotable", caps[1].to_string())]
        }),
        pattern(r"^Added Small Passive Skills (?:also )?grant: (.+)$", |caps| {
            vec![Modifier::list("ClusterJewelSmallStat", caps[1].to_string())]
        }),
        pattern(r"^Adds (.+) \(Keystone\)$", |caps| {
            vec![Modifier::list("JewelKeystone", caps[1].to_string())]
        }),
        pattern(r"^(\d+) Added Passive Skills are Nothingness$", |caps| {
            vec![
                Modifier::base("NothingnessCount", num(caps, 1)).with_flags(flag::JEWEL_LOCAL),
                Modifier::switch("ClusterNothingness", true).with_flags(flag::JEWEL_LOCAL),
            ]
        }),
        pattern(r"^Has (\d+) Sockets?$", |caps| {
            vec![Modifier::base("JewelSocketCount", num(caps, 1)).with_flags(flag::JEWEL_LOCAL)]
        }),
        // Global resistances
        pattern(
            r"^\+(\d+(?:\.\d+)?)% to (Fire|Cold|Lightning|Chaos) Resistance$",
            |caps| {
                let element = caps[2].to_string();
                vec![Modifier::base(format!("{element}Resist"), num(caps, 1))]
            },
        ),
        pattern(r"^\+(\d+(?:\.\d+)?)% to all Elemental Resistances$", |caps| {
            vec![Modifier::base("ElementalResist", num(caps, 1))]
        }),
        // Generic global fallbacks, last on purpose
        pattern(r"^(\d+(?:\.\d+)?)% (increased|reduced) ([A-Za-z][A-Za-z' ]+)$", |caps| {
            vec![Modifier::inc(pascal_case(&caps[3]), signed(caps, 1, 2))]
        }),
        pattern(r"^\+(-?\d+(?:\.\d+)?) to ([A-Za-z][A-Za-z ]+)$", |caps| {
            vec![Modifier::base(pascal_case(&caps[2]), num(caps, 1))]
        }),
    ]
});

/// Built-in regex-table reference parser
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultModParser;

impl ModLineParser for DefaultModParser {
    fn parse_mod_line(&self, line: &str) -> ParsedModLine {
        // Joined lines arrive newline-separated; they parse as one statement
        let normalized = line.replace('\n', " ");
        let normalized = normalized.trim();
        if normalized.is_empty() {
            return ParsedModLine::default();
        }
        for pattern in PATTERNS.iter() {
            if let Some(caps) = pattern.re.captures(normalized) {
                return ParsedModLine {
                    mods: (pattern.build)(&caps),
                    leftover: None,
                };
            }
        }
        ParsedModLine {
            mods: Vec::new(),
            leftover: Some(normalized.to_string()),
        }
    }
}

/// Slot-dependent placeholder substitution in textual modifier payloads
///
/// Replaces `{SlotName}`, `{Hand}`, and `{OtherSlotNum}` wherever they occur
/// in a modifier's text value or condition tags.
pub fn substitute_slot_tokens(modifier: &mut Modifier, slot: u8, slot_name: &str) {
    let hand = if slot == 2 { "Off" } else { "Main" };
    let other = if slot == 2 { "1" } else { "2" };
    let substitute = |text: &str| {
        text.replace("{SlotName}", slot_name)
            .replace("{Hand}", hand)
            .replace("{OtherSlotNum}", other)
    };
    if let ModValue::Text(text) = &mut modifier.value {
        *text = substitute(text);
    }
    for tag in &mut modifier.tags {
        match tag {
            ModTag::Condition(text) | ModTag::Custom(text) => *text = substitute(text),
            ModTag::SlotNumber(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::ModKind;

    fn parse(line: &str) -> ParsedModLine {
        DefaultModParser.parse_mod_line(line)
    }

    #[test]
    fn test_flat_damage_adds_min_and_max() {
        let parsed = parse("Adds 10 to 20 Physical Damage");
        assert!(parsed.is_complete());
        assert_eq!(parsed.mods.len(), 2);
        assert_eq!(parsed.mods[0].name, "PhysicalMin");
        assert_eq!(parsed.mods[0].value, ModValue::Number(10.0));
        assert_eq!(parsed.mods[1].name, "PhysicalMax");
        assert_eq!(parsed.mods[1].flags, flag::WEAPON_LOCAL);
    }

    #[test]
    fn test_attack_speed_is_local() {
        let parsed = parse("12% increased Attack Speed");
        assert_eq!(parsed.mods[0].name, "Speed");
        assert_eq!(parsed.mods[0].kind, ModKind::Inc);
        assert_eq!(parsed.mods[0].flags, flag::WEAPON_LOCAL);
    }

    #[test]
    fn test_accuracy_forms_are_local() {
        let parsed = parse("+120 to Accuracy Rating");
        assert_eq!(parsed.mods[0].name, "Accuracy");
        assert_eq!(parsed.mods[0].kind, ModKind::Base);
        assert_eq!(parsed.mods[0].flags, flag::WEAPON_LOCAL);

        let parsed = parse("20% increased Accuracy Rating");
        assert_eq!(parsed.mods[0].name, "Accuracy");
        assert_eq!(parsed.mods[0].kind, ModKind::Inc);
        assert_eq!(parsed.mods[0].flags, flag::WEAPON_LOCAL);
    }

    #[test]
    fn test_reduced_flips_sign() {
        let parsed = parse("15% reduced Attack Speed");
        assert_eq!(parsed.mods[0].value, ModValue::Number(-15.0));
    }

    #[test]
    fn test_defence_pool_names() {
        let parsed = parse("20% increased Armour and Evasion");
        assert_eq!(parsed.mods[0].name, "ArmourAndEvasion");
        assert_eq!(parsed.mods[0].flags, flag::ARMOUR_LOCAL);

        let parsed = parse("10% increased Defences");
        assert_eq!(parsed.mods[0].name, "Defences");
    }

    #[test]
    fn test_generic_fallbacks() {
        let parsed = parse("+30 to maximum Life");
        assert_eq!(parsed.mods[0].name, "MaximumLife");
        assert_eq!(parsed.mods[0].flags, 0);

        let parsed = parse("8% increased Movement Speed");
        assert_eq!(parsed.mods[0].name, "MovementSpeed");
    }

    #[test]
    fn test_unmatched_line_is_leftover() {
        let parsed = parse("Culling Strike");
        assert!(parsed.mods.is_empty());
        assert_eq!(parsed.leftover.as_deref(), Some("Culling Strike"));
    }

    #[test]
    fn test_joined_line_parses_as_one_statement() {
        let parsed = parse("Adds 10 to 20\nPhysical Damage");
        assert!(parsed.is_complete());
        assert_eq!(parsed.mods.len(), 2);
    }

    #[test]
    fn test_cluster_grammar() {
        let parsed = parse("Adds 8 Passive Skills");
        assert_eq!(parsed.mods[0].name, "JewelNodeCount");

        let parsed = parse("1 Added Passive Skill is Feed the Fury");
        assert_eq!(parsed.mods[0].kind, ModKind::List);
        assert_eq!(parsed.mods[0].value, ModValue::Text("Feed the Fury".into()));

        let parsed = parse("Added Small Passive Skills grant: 12% increased Axe Damage");
        assert_eq!(parsed.mods[0].name, "ClusterJewelSmallStat");
    }

    #[test]
    fn test_substitute_slot_tokens() {
        let mut modifier = Modifier::list("Reminder", "socketed in {SlotName} ({Hand} hand)")
            .with_tag(ModTag::Condition("{Hand}Attack".into()));
        substitute_slot_tokens(&mut modifier, 2, "Weapon 2");
        assert_eq!(
            modifier.value,
            ModValue::Text("socketed in Weapon 2 (Off hand)".into())
        );
        assert_eq!(modifier.tags[0], ModTag::Condition("OffAttack".into()));
    }
}
