//! Catalyst quality scaling
//!
//! A catalyst scales matching tagged numeric modifier values by a
//! quality-dependent percentage. The id-to-tag rules are a fixed static
//! table; the scalar itself is a pure function of id, tags, and quality.

use phf::phf_map;

/// Catalyst id -> the modifier tags its bonus applies to
static CATALYST_TAGS: phf::Map<u8, &'static [&'static str]> = phf_map! {
    1u8 => &["attack"],
    2u8 => &["speed"],
    3u8 => &["life", "mana"],
    4u8 => &["caster"],
    5u8 => &["attribute"],
    6u8 => &["physical", "chaos"],
    7u8 => &["elemental"],
    8u8 => &["defences"],
    9u8 => &["critical"],
};

/// Display names, for summaries only; the text format carries numeric ids
pub fn catalyst_name(id: u8) -> Option<&'static str> {
    match id {
        1 => Some("Abrasive"),
        2 => Some("Accelerating"),
        3 => Some("Fertile"),
        4 => Some("Imbued"),
        5 => Some("Intrinsic"),
        6 => Some("Noxious"),
        7 => Some("Prismatic"),
        8 => Some("Tempering"),
        9 => Some("Unstable"),
        _ => None,
    }
}

/// The modifier tags a catalyst's bonus applies to; empty for unknown ids
pub fn catalyst_tags(id: u8) -> &'static [&'static str] {
    CATALYST_TAGS.get(&id).copied().unwrap_or(&[])
}

/// Compute the multiplicative scalar a catalyst applies to a modifier
///
/// Returns 1.0 when the id is absent or unknown, the tag set is empty, or no
/// rule tag intersects. The first matching rule wins; matches never
/// accumulate. Quality defaults to 20 when absent.
pub fn catalyst_scalar<S: AsRef<str>>(id: Option<u8>, tags: &[S], quality: Option<i32>) -> f64 {
    let Some(id) = id else {
        return 1.0;
    };
    let Some(rule_tags) = CATALYST_TAGS.get(&id) else {
        return 1.0;
    };
    if tags.is_empty() {
        return 1.0;
    }
    let matched = tags
        .iter()
        .any(|tag| rule_tags.contains(&tag.as_ref()));
    if matched {
        (100 + quality.unwrap_or(20)) as f64 / 100.0
    } else {
        1.0
    }
}
