//! Crafting resolution
//!
//! Rebuilds an item's explicit modifier lines from its prefix/suffix
//! selections. Template lines sharing a canonical stat-order index merge
//! into one line by positional numeric addition. The result is serialized
//! and reparsed end to end, so a crafted record always has the same shape
//! as one freshly parsed from text.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::catalog::Catalogs;
use crate::catalyst::catalyst_scalar;
use crate::item::{Item, ModLine};
use crate::parse::parse_item;
use crate::range::{apply_range, apply_value_scalar, has_range_template};
use crate::raw::build_raw;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());

/// Orderless templates sort after every canonical index
const UNORDERED: u32 = u32::MAX;

/// Recompute the explicit lines of `item` from its affix selections
pub fn craft(item: &Item, db: &Catalogs) -> Item {
    let mut work = item.clone();
    work.crafted = true;

    // Crafted and custom lines survive the rebuild, appended last
    let preserved: Vec<ModLine> = work
        .explicit_lines
        .iter()
        .filter(|line| line.crafted || line.custom)
        .cloned()
        .collect();
    work.explicit_lines.clear();
    work.name_prefix.clear();
    work.name_suffix.clear();
    if work.title.is_none() && !work.base_name.is_empty() {
        work.name = work.base_name.clone();
    }

    let base_level = work
        .base
        .as_ref()
        .map(|b| b.requirements.level)
        .unwrap_or(0);
    let mut level_req = base_level;
    let mut generated: Vec<(u32, String)> = Vec::new();

    for slot in work.prefixes.iter_mut().chain(work.suffixes.iter_mut()) {
        if slot.is_empty() {
            continue;
        }
        let Some(def) = db.mods.lookup(&slot.id) else {
            log::debug!("unknown affix selection: {}", slot.id);
            slot.id = "None".to_string();
            slot.range = None;
            continue;
        };
        level_req = level_req.max((0.8 * def.level as f64).floor() as u32);
        let fraction = slot.range.unwrap_or(0.5);
        let scalar = catalyst_scalar(work.catalyst, &def.mod_tags, work.catalyst_quality);
        for (index, template) in def.stats.iter().enumerate() {
            let order = def.stat_order.get(index).copied().unwrap_or(UNORDERED);
            let text = if has_range_template(template) {
                apply_range(template, fraction, scalar)
            } else {
                apply_value_scalar(template, scalar)
            };
            let merged = order != UNORDERED
                && generated.iter_mut().any(|(existing, line)| {
                    if *existing == order {
                        *line = combine_numeric(line, &text);
                        true
                    } else {
                        false
                    }
                });
            if !merged {
                generated.push((order, text));
            }
        }
    }
    work.requirements.level = level_req;

    generated.sort_by_key(|(order, _)| *order);
    work.explicit_lines = generated
        .into_iter()
        .map(|(_, line)| ModLine {
            line,
            ..ModLine::default()
        })
        .chain(preserved)
        .collect();

    // Full round trip restores mods, fixups, and derived consistency
    parse_item(&build_raw(&work), db)
}

/// Sum the number tokens of two lines positionally, keeping the left
/// line's wording
fn combine_numeric(left: &str, right: &str) -> String {
    let right_numbers: Vec<f64> = NUMBER_RE
        .find_iter(right)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    let mut position = 0;
    NUMBER_RE
        .replace_all(left, |caps: &Captures| {
            let value: f64 = caps[0].parse().unwrap_or(0.0);
            let sum = value + right_numbers.get(position).copied().unwrap_or(0.0);
            position += 1;
            if sum.fract() == 0.0 {
                format!("{}", sum as i64)
            } else {
                format!("{sum}")
            }
        })
        .into_owned()
}
