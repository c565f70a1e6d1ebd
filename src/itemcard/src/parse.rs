//! Item text parsing
//!
//! Turns the raw multi-line card text into an [`Item`]. The parser never
//! hard-fails: unrecognized property lines become modifier lines, and
//! modifier lines the line parser cannot consume become zero-modifier
//! placeholders so the original text survives a round-trip.
//!
//! Two text shapes exist. A game export starts with a `Rarity:` header and
//! separates blocks with `--------` lines; section classification then runs
//! a small state machine over those separators. A reference listing has no
//! header; its first non-property line opens the explicit block directly.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::annot::LineAnnotations;
use crate::catalog::{special_base_refinement, Catalogs};
use crate::catalyst::catalyst_scalar;
use crate::item::{AffixSlot, Item, ModLine, TextMode, CURRENT_VARIANT_VERSION};
use crate::modparser::{DefaultModParser, ModLineParser};
use crate::range::{apply_range, apply_value_scalar, has_range_template};
use crate::types::{parse_sockets, Influence, Rarity, Socket, SocketColor};

/// Parse card text against the built-in modifier line parser
pub fn parse_item(text: &str, db: &Catalogs) -> Item {
    parse_item_with(text, db, &DefaultModParser)
}

/// Parse card text with a caller-supplied modifier line parser
pub fn parse_item_with(text: &str, db: &Catalogs, mod_parser: &dyn ModLineParser) -> Item {
    ItemParser::new(text, db, mod_parser).run()
}

/// Block separator: a line of eight or more hyphens
fn is_separator(line: &str) -> bool {
    line.len() >= 8 && line.bytes().all(|b| b == b'-')
}

fn first_number(text: &str) -> Option<f64> {
    static NUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());
    NUM_RE.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Recognized `key: value` property names, one variant per typed setter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropertyKey {
    UniqueId,
    ItemLevel,
    Quality,
    Sockets,
    Radius,
    LimitedTo,
    Variant,
    TalismanTier,
    Requires,
    RequiresLevel,
    LevelReq,
    ImportedLevel,
    HasAltVariant,
    HasAltVariantTwo,
    SelectedVariant,
    SelectedAltVariant,
    SelectedAltVariantTwo,
    League,
    Crafted,
    Implicit,
    Prefix,
    Suffix,
    Implicits,
    Unreleased,
    Upgrade,
    Source,
    EvasionRating,
    EnergyShield,
    ClusterJewelSkill,
    ClusterJewelNodeCount,
    Catalyst,
    CatalystQuality,
    /// Display-only export lines with no model field
    Ignored,
}

impl PropertyKey {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Unique ID" => PropertyKey::UniqueId,
            "Item Level" => PropertyKey::ItemLevel,
            "Quality" => PropertyKey::Quality,
            "Sockets" => PropertyKey::Sockets,
            "Radius" => PropertyKey::Radius,
            "Limited to" => PropertyKey::LimitedTo,
            "Variant" => PropertyKey::Variant,
            "Talisman Tier" => PropertyKey::TalismanTier,
            "Requires" => PropertyKey::Requires,
            "Requires Level" => PropertyKey::RequiresLevel,
            "LevelReq" => PropertyKey::LevelReq,
            "Level" => PropertyKey::ImportedLevel,
            "Has Alt Variant" => PropertyKey::HasAltVariant,
            "Has Alt Variant Two" => PropertyKey::HasAltVariantTwo,
            "Selected Variant" => PropertyKey::SelectedVariant,
            "Selected Alt Variant" => PropertyKey::SelectedAltVariant,
            "Selected Alt Variant Two" => PropertyKey::SelectedAltVariantTwo,
            "League" => PropertyKey::League,
            "Crafted" => PropertyKey::Crafted,
            "Implicit" => PropertyKey::Implicit,
            "Prefix" => PropertyKey::Prefix,
            "Suffix" => PropertyKey::Suffix,
            "Implicits" => PropertyKey::Implicits,
            "Unreleased" => PropertyKey::Unreleased,
            "Upgrade" => PropertyKey::Upgrade,
            "Source" => PropertyKey::Source,
            "Evasion Rating" => PropertyKey::EvasionRating,
            "Energy Shield" => PropertyKey::EnergyShield,
            "Cluster Jewel Skill" => PropertyKey::ClusterJewelSkill,
            "Cluster Jewel Node Count" => PropertyKey::ClusterJewelNodeCount,
            "Catalyst" => PropertyKey::Catalyst,
            "CatalystQuality" => PropertyKey::CatalystQuality,
            "Item Class" | "Armour" | "Chance to Block" | "Attacks per Second"
            | "Physical Damage" | "Elemental Damage" | "Critical Strike Chance"
            | "Weapon Range" => PropertyKey::Ignored,
            _ => return None,
        })
    }
}

/// Bare marker lines without a `key: value` shape
fn is_marker_line(line: &str) -> bool {
    matches!(line, "Corrupted" | "Fractured Item" | "Synthesised Item")
        || Influence::from_line(line).is_some()
}

fn is_property_line(line: &str) -> bool {
    if is_marker_line(line) {
        return true;
    }
    if let Some(rest) = line.strip_prefix("Requires ") {
        if !rest.contains(':') {
            return true;
        }
    }
    line.split_once(':')
        .is_some_and(|(key, _)| PropertyKey::from_name(key.trim()).is_some())
}

/// Collapse range templates (at their maximum) and catalyst scaling so the
/// line parser always sees concrete numbers
fn normalize_value_text(bare: &str, scalar: f64) -> String {
    if has_range_template(bare) {
        apply_range(bare, 1.0, scalar)
    } else if scalar != 1.0 {
        apply_value_scalar(bare, scalar)
    } else {
        bare.to_string()
    }
}

/// Modifier-block classification state for game exports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    FindImplicit,
    Implicit,
    FindExplicit,
    Explicit,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Enchant,
    Implicit,
    Explicit,
}

struct ItemParser<'a> {
    db: &'a Catalogs,
    mod_parser: &'a dyn ModLineParser,
    lines: Vec<String>,
    pos: usize,
    item: Item,
    section: Section,
    remaining_implicits: Option<usize>,
    explicit_level: bool,
    imported_level: Option<u32>,
    default_variant: Option<usize>,
    saw_evasion: bool,
    saw_energy_shield: bool,
}

impl<'a> ItemParser<'a> {
    fn new(text: &str, db: &'a Catalogs, mod_parser: &'a dyn ModLineParser) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        let mut parser = ItemParser {
            db,
            mod_parser,
            lines,
            pos: 0,
            item: Item::default(),
            section: Section::FindImplicit,
            remaining_implicits: None,
            explicit_level: false,
            imported_level: None,
            default_variant: None,
            saw_evasion: false,
            saw_energy_shield: false,
        };
        parser.parse_header(text);
        parser
    }

    fn run(mut self) -> Item {
        self.parse_name();
        while let Some(line) = self.next_line() {
            if is_separator(&line) {
                self.advance_section();
            } else if !self.apply_property(&line) {
                self.handle_mod_line(&line);
            }
        }
        self.finish();
        self.item
    }

    fn peek_line(&self) -> Option<String> {
        self.lines.get(self.pos).cloned()
    }

    fn next_line(&mut self) -> Option<String> {
        let line = self.lines.get(self.pos).cloned();
        if line.is_some() {
            self.pos += 1;
        }
        line
    }

    fn parse_header(&mut self, text: &str) {
        if let Some(first) = self.peek_line() {
            if first.starts_with("Item Class:") {
                self.pos += 1;
            }
        }
        if let Some(first) = self.peek_line() {
            if let Some(value) = first.strip_prefix("Rarity:") {
                self.item.rarity = Rarity::from_name(value).unwrap_or_default();
                self.item.mode = TextMode::GameExport;
                self.pos += 1;
            }
        }
        if text.contains("Relic Unique") {
            self.item.rarity = Rarity::Relic;
        }
        if self.item.mode == TextMode::Reference {
            self.section = Section::Explicit;
        }
    }

    fn parse_name(&mut self) {
        let Some(line) = self.next_line() else {
            return;
        };
        self.item.name = line.clone();
        match self.item.rarity {
            Rarity::Normal | Rarity::Magic => {
                let stripped = line.strip_prefix("Synthesised ").unwrap_or(&line);
                if stripped.len() < line.len() {
                    self.item.synthesised = true;
                }
                if let Some((base, prefix, suffix)) = self.db.bases.find_in(stripped) {
                    self.item.base_name = base.name.clone();
                    self.item.name_prefix = prefix;
                    self.item.name_suffix = suffix;
                    self.item.base = Some(base.clone());
                } else {
                    log::debug!("unknown base type in name: {line}");
                }
                // A game export repeats the base type on its own line
                if let Some(next) = self.peek_line() {
                    if !self.item.base_name.is_empty() && next == self.item.base_name {
                        self.pos += 1;
                    }
                }
            }
            _ => {
                let Some(next) = self.peek_line() else {
                    return;
                };
                if is_separator(&next) {
                    return;
                }
                let stripped = next.strip_prefix("Synthesised ").unwrap_or(&next).to_string();
                if let Some(base) = self.db.bases.lookup(&stripped) {
                    if stripped.len() < next.len() {
                        self.item.synthesised = true;
                    }
                    self.item.base = Some(base.clone());
                    self.item.base_name = stripped;
                    self.item.title = Some(line.clone());
                    self.item.name = format!("{}, {}", line, self.item.base_name);
                    self.pos += 1;
                }
            }
        }
    }

    fn advance_section(&mut self) {
        self.section = match self.section {
            Section::FindImplicit => Section::Implicit,
            Section::Implicit => {
                if self.item.implicit_count() > 0 {
                    Section::Explicit
                } else {
                    Section::FindExplicit
                }
            }
            Section::FindExplicit => Section::FindExplicit,
            Section::Explicit | Section::Done => Section::Done,
        };
    }

    /// Dispatch a marker or `key: value` line. Returns false when the line
    /// is not a recognized property, which hands it to the modifier block.
    fn apply_property(&mut self, line: &str) -> bool {
        if line == "Corrupted" {
            self.item.corrupted = true;
            return true;
        }
        if line == "Fractured Item" {
            self.item.fractured = true;
            return true;
        }
        if line == "Synthesised Item" {
            self.item.synthesised = true;
            return true;
        }
        if let Some(influence) = Influence::from_line(line) {
            self.item.influences.set(influence);
            return true;
        }
        if let Some(rest) = line.strip_prefix("Requires ") {
            if !rest.contains(':') {
                self.parse_requirements(rest);
                return true;
            }
        }
        let Some((name, value)) = line.split_once(':') else {
            return false;
        };
        let Some(key) = PropertyKey::from_name(name.trim()) else {
            return false;
        };
        let value = value.trim();
        match key {
            PropertyKey::UniqueId => self.item.unique_id = Some(value.to_string()),
            PropertyKey::ItemLevel => {
                self.item.item_level = first_number(value).unwrap_or(0.0) as u32;
            }
            PropertyKey::Quality => {
                self.item.quality = first_number(value).unwrap_or(0.0).max(0.0) as u32;
            }
            PropertyKey::Sockets => self.item.sockets = parse_sockets(value),
            PropertyKey::Radius => self.item.radius_label = Some(value.to_string()),
            PropertyKey::LimitedTo => {
                self.item.limit = first_number(value).map(|n| n as u32);
            }
            PropertyKey::Variant => self.add_variant(value),
            PropertyKey::TalismanTier => {
                self.item.talisman_tier = first_number(value).unwrap_or(0.0) as u32;
            }
            PropertyKey::Requires => self.parse_requirements(value),
            PropertyKey::RequiresLevel | PropertyKey::LevelReq => {
                if let Some(level) = first_number(value) {
                    self.item.requirements.level = level as u32;
                    self.explicit_level = true;
                }
            }
            PropertyKey::ImportedLevel => {
                self.imported_level = first_number(value).map(|n| n as u32);
            }
            PropertyKey::HasAltVariant => self.item.has_alt_variant = true,
            PropertyKey::HasAltVariantTwo => self.item.has_alt_variant2 = true,
            PropertyKey::SelectedVariant => {
                self.item.selected_variant = first_number(value).unwrap_or(0.0) as usize;
            }
            PropertyKey::SelectedAltVariant => {
                self.item.selected_alt_variant = first_number(value).unwrap_or(0.0) as usize;
            }
            PropertyKey::SelectedAltVariantTwo => {
                self.item.selected_alt_variant2 = first_number(value).unwrap_or(0.0) as usize;
            }
            PropertyKey::League => self.item.league = Some(value.to_string()),
            PropertyKey::Crafted => self.item.crafted = true,
            PropertyKey::Implicit => {
                let record = self.build_line_record(value);
                self.item.implicit_lines.push(record);
            }
            PropertyKey::Prefix => {
                let slot = Self::parse_affix_slot(value);
                self.item.prefixes.push(slot);
            }
            PropertyKey::Suffix => {
                let slot = Self::parse_affix_slot(value);
                self.item.suffixes.push(slot);
            }
            PropertyKey::Implicits => {
                let count = first_number(value).unwrap_or(0.0).max(0.0) as usize;
                self.item.implicits_hint = Some(count);
                self.remaining_implicits = Some(count);
                // The declared count takes over; separators no longer matter
                self.section = Section::Explicit;
            }
            PropertyKey::Unreleased => self.item.unreleased = value == "true",
            PropertyKey::Upgrade => self.item.upgrades.push(value.to_string()),
            PropertyKey::Source => self.item.source = Some(value.to_string()),
            PropertyKey::EvasionRating => self.saw_evasion = true,
            PropertyKey::EnergyShield => self.saw_energy_shield = true,
            PropertyKey::ClusterJewelSkill => self.set_cluster_skill(value),
            PropertyKey::ClusterJewelNodeCount => self.set_cluster_node_count(value),
            PropertyKey::Catalyst => {
                self.item.catalyst = first_number(value).map(|n| n as u8);
            }
            PropertyKey::CatalystQuality => {
                self.item.catalyst_quality = first_number(value).map(|n| n as i32);
            }
            PropertyKey::Ignored => {}
        }
        true
    }

    /// `Level 20, 30 Str, 25 Int` in either the bare or the keyed form
    fn parse_requirements(&mut self, text: &str) {
        for part in text.split(',') {
            let part = part.trim();
            let Some(number) = first_number(part) else {
                continue;
            };
            if part.contains("Level") {
                self.item.requirements.level = number as u32;
                self.explicit_level = true;
            } else if part.contains("Str") {
                self.item.requirements.strength = number as u32;
            } else if part.contains("Dex") {
                self.item.requirements.dexterity = number as u32;
            } else if part.contains("Int") {
                self.item.requirements.intelligence = number as u32;
            }
        }
    }

    fn add_variant(&mut self, value: &str) {
        let mut name = value;
        if let Some(rest) = value.strip_prefix('{') {
            if let Some((version, tail)) = rest.split_once('}') {
                name = tail;
                let index = self.item.variants.len() + 1;
                if version == CURRENT_VARIANT_VERSION {
                    self.default_variant = Some(index);
                }
                self.item.variant_versions.insert(index, version.to_string());
            }
        }
        self.item.variants.push(name.to_string());
    }

    fn parse_affix_slot(value: &str) -> AffixSlot {
        let (annot, id) = LineAnnotations::strip(value);
        AffixSlot {
            id: if id.is_empty() { "None".to_string() } else { id },
            range: annot.range,
        }
    }

    fn set_cluster_skill(&mut self, value: &str) {
        let allowed = self.item.base.as_ref().and_then(|b| b.jewel.as_ref());
        let valid = match allowed {
            Some(jewel) if !jewel.skills.is_empty() => jewel.skills.iter().any(|s| s == value),
            _ => true,
        };
        if valid {
            self.item.cluster_skill = Some(value.to_string());
        } else {
            log::debug!("dropping invalid cluster jewel skill: {value}");
        }
    }

    fn set_cluster_node_count(&mut self, value: &str) {
        let Some(count) = first_number(value) else {
            return;
        };
        let mut count = count.max(0.0) as u32;
        if let Some(jewel) = self.item.base.as_ref().and_then(|b| b.jewel.as_ref()) {
            count = count.clamp(jewel.cluster_min, jewel.cluster_max);
        }
        self.item.cluster_node_count = Some(count);
    }

    /// Parse one modifier line body into a record, without classification
    fn build_line_record(&self, text: &str) -> ModLine {
        let (annot, bare) = LineAnnotations::strip(text);
        let scalar = catalyst_scalar(self.item.catalyst, &annot.tags, self.item.catalyst_quality);
        let parsed = self.mod_parser.parse_mod_line(&normalize_value_text(&bare, scalar));
        let range = annot
            .range
            .or_else(|| has_range_template(&bare).then_some(0.5));
        ModLine {
            mods: if parsed.is_complete() { parsed.mods } else { Vec::new() },
            line: bare,
            tags: annot.tags,
            variants: annot.variants,
            crafted: annot.crafted,
            custom: annot.custom,
            fractured: annot.fractured,
            range,
        }
    }

    fn handle_mod_line(&mut self, line: &str) {
        if self.section == Section::Done {
            return;
        }
        let (annot, bare) = LineAnnotations::strip(line);
        if bare.is_empty() {
            return;
        }
        let scalar = catalyst_scalar(self.item.catalyst, &annot.tags, self.item.catalyst_quality);
        let mut text = bare.clone();
        let mut parsed = self.mod_parser.parse_mod_line(&normalize_value_text(&bare, scalar));

        // Wrapped lines: retry with the next line joined on, and keep the
        // combination only when it fully parses
        if !parsed.is_complete() {
            if let Some(next) = self.peek_line() {
                if !is_separator(&next) && !is_property_line(&next) {
                    let (_, next_bare) = LineAnnotations::strip(&next);
                    let combined = format!("{bare} {next_bare}");
                    let attempt = self
                        .mod_parser
                        .parse_mod_line(&normalize_value_text(&combined, scalar));
                    if attempt.is_complete() {
                        parsed = attempt;
                        text = combined;
                        self.pos += 1;
                    }
                }
            }
        }

        let complete = parsed.is_complete();
        let group = self.classify(&annot, complete);
        let Some(group) = group else {
            log::debug!("dropping unclassifiable line: {line}");
            return;
        };
        let range = annot
            .range
            .or_else(|| has_range_template(&bare).then_some(0.5));
        let record = ModLine {
            line: text,
            mods: if complete { parsed.mods } else { Vec::new() },
            tags: annot.tags,
            variants: annot.variants,
            crafted: annot.crafted,
            custom: annot.custom,
            fractured: annot.fractured,
            range,
        };
        match group {
            Group::Enchant => self.item.enchant_lines.push(record),
            Group::Implicit => self.item.implicit_lines.push(record),
            Group::Explicit => self.item.explicit_lines.push(record),
        }
    }

    /// Pick the group for a modifier line. Explicit markers win, then a
    /// declared implicit-count countdown, then the separator state machine.
    fn classify(&mut self, annot: &LineAnnotations, complete: bool) -> Option<Group> {
        if annot.enchant {
            self.section = Section::Implicit;
            self.consume_hint();
            return Some(Group::Enchant);
        }
        if annot.implicit {
            self.section = Section::Implicit;
            self.consume_hint();
            return Some(Group::Implicit);
        }
        if let Some(remaining) = self.remaining_implicits {
            return if remaining > 0 {
                self.remaining_implicits = Some(remaining - 1);
                Some(Group::Implicit)
            } else {
                Some(Group::Explicit)
            };
        }
        match self.section {
            Section::FindImplicit => {
                if complete {
                    self.section = Section::Implicit;
                    Some(Group::Implicit)
                } else {
                    // Ambiguous lead-in text with no confirmed section
                    None
                }
            }
            Section::Implicit => Some(Group::Implicit),
            Section::FindExplicit => {
                if complete {
                    self.section = Section::Explicit;
                    Some(Group::Explicit)
                } else {
                    self.section = Section::Done;
                    None
                }
            }
            Section::Explicit => Some(Group::Explicit),
            Section::Done => None,
        }
    }

    fn consume_hint(&mut self) {
        if let Some(n) = self.remaining_implicits {
            self.remaining_implicits = Some(n.saturating_sub(1));
        }
    }

    // ------------------------------------------------------------------
    // Post-scan fixups
    // ------------------------------------------------------------------

    fn finish(&mut self) {
        self.refine_base();
        self.fix_requirements();
        self.fix_quality();
        self.fix_affix_slots();
        self.fix_sockets();
        self.fix_variants();
    }

    fn refine_base(&mut self) {
        let refined =
            special_base_refinement(&self.item.base_name, self.saw_evasion, self.saw_energy_shield);
        let Some(refined) = refined else {
            return;
        };
        let Some(base) = self.db.bases.lookup(refined) else {
            return;
        };
        self.item.base = Some(base.clone());
        let old = std::mem::replace(&mut self.item.base_name, refined.to_string());
        if let Some(title) = &self.item.title {
            self.item.name = format!("{title}, {refined}");
        } else if self.item.name.contains(&old) {
            self.item.name = self.item.name.replace(&old, refined);
        }
    }

    fn fix_requirements(&mut self) {
        let base_req = self
            .item
            .base
            .as_ref()
            .map(|b| b.requirements)
            .unwrap_or_default();
        let req = &mut self.item.requirements;
        if req.strength == 0 {
            req.strength = base_req.strength;
        }
        if req.dexterity == 0 {
            req.dexterity = base_req.dexterity;
        }
        if req.intelligence == 0 {
            req.intelligence = base_req.intelligence;
        }
        if !self.explicit_level {
            // An imported Level field is only trusted on socketless text;
            // otherwise the catalog requirement stands
            req.level = match self.imported_level {
                Some(level) if self.item.sockets.is_empty() => level,
                _ => base_req.level,
            };
        }
    }

    /// Uncorrupted gear always shows max quality
    fn fix_quality(&mut self) {
        let gear = self
            .item
            .base
            .as_ref()
            .is_some_and(|b| b.is_weapon() || b.is_armour() || b.is_flask());
        let unique = matches!(self.item.rarity, Rarity::Unique | Rarity::Relic);
        if gear && !unique && !self.item.corrupted && self.item.quality < 20 {
            self.item.quality = 20;
        }
    }

    fn fix_affix_slots(&mut self) {
        if !self.item.crafted {
            return;
        }
        let per_side = self.item.affix_limit() / 2;
        while self.item.prefixes.len() < per_side {
            self.item.prefixes.push(AffixSlot::none());
        }
        while self.item.suffixes.len() < per_side {
            self.item.suffixes.push(AffixSlot::none());
        }
        for slot in self.item.prefixes.iter_mut().chain(self.item.suffixes.iter_mut()) {
            if slot.is_empty() || self.db.mods.lookup(&slot.id).is_some() {
                continue;
            }
            // A literal affix display string resolves to its identifier
            match self.db.mods.find_by_display(&slot.id) {
                Some(id) => slot.id = id.to_string(),
                None => {
                    log::debug!("unknown crafted affix: {}", slot.id);
                    slot.id = "None".to_string();
                }
            }
        }
    }

    fn fix_sockets(&mut self) {
        if !self.item.sockets.is_empty() {
            return;
        }
        let Some(base) = &self.item.base else {
            return;
        };
        let Some(limit) = base.socket_limit.filter(|&n| n > 0) else {
            return;
        };
        let req = base.requirements;
        let color = if req.dexterity > req.strength && req.dexterity >= req.intelligence {
            SocketColor::Green
        } else if req.intelligence > req.strength && req.intelligence > req.dexterity {
            SocketColor::Blue
        } else {
            SocketColor::Red
        };
        self.item.sockets = (0..limit).map(|_| Socket { color, group: 0 }).collect();
    }

    fn fix_variants(&mut self) {
        let count = self.item.variants.len();
        if count == 0 {
            return;
        }
        let fallback = self.default_variant.unwrap_or(count);
        let clamp = |selected: usize| -> usize {
            if selected == 0 {
                fallback.min(count)
            } else {
                selected.min(count)
            }
        };
        self.item.selected_variant = clamp(self.item.selected_variant);
        if self.item.has_alt_variant {
            self.item.selected_alt_variant = clamp(self.item.selected_alt_variant);
        }
        if self.item.has_alt_variant2 {
            self.item.selected_alt_variant2 = clamp(self.item.selected_alt_variant2);
        }
    }
}
