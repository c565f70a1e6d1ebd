//! Card text handlers: parse, roundtrip, craft

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use itemcard::{build_raw, craft, derive, parse_item, Catalogs, Item, StatBlock};

/// Read card text from a file, or from stdin when the path is `-`
fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read card text from stdin")?;
        Ok(text)
    } else {
        fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))
    }
}

pub fn parse(input: &Path, json: bool, no_derive: bool) -> Result<()> {
    let text = read_input(input)?;
    let db = Catalogs::builtin();
    let mut item = parse_item(&text, db);
    if !no_derive {
        derive(&mut item);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    print_summary(&item);
    Ok(())
}

pub fn roundtrip(input: &Path) -> Result<()> {
    let text = read_input(input)?;
    let db = Catalogs::builtin();
    let first = build_raw(&parse_item(&text, db));
    let second = build_raw(&parse_item(&first, db));
    if first != second {
        log::debug!("first pass:\n{first}");
        log::debug!("second pass:\n{second}");
        bail!("serialization is not stable for this card");
    }
    print!("{first}");
    Ok(())
}

pub fn run_craft(input: &Path, json: bool) -> Result<()> {
    let text = read_input(input)?;
    let db = Catalogs::builtin();
    let item = parse_item(&text, db);
    if item.prefixes.iter().chain(&item.suffixes).all(|s| s.is_empty()) {
        bail!("card has no prefix or suffix selections to resolve");
    }
    let crafted = craft(&item, db);

    if json {
        println!("{}", serde_json::to_string_pretty(&crafted)?);
    } else {
        print!("{}", build_raw(&crafted));
    }
    Ok(())
}

fn print_summary(item: &Item) {
    println!("{}", item.name);
    println!("  Rarity:     {}", item.rarity.name());
    if item.base.is_none() {
        println!("  Base:       (unknown: {})", item.base_name);
    }
    if item.item_level > 0 {
        println!("  Item Level: {}", item.item_level);
    }
    if item.quality > 0 {
        println!("  Quality:    {}", item.quality);
    }
    if item.requirements.level > 0 {
        println!("  Requires:   level {}", item.requirements.level);
    }
    if item.corrupted {
        println!("  Corrupted");
    }

    for line in item.mod_lines() {
        let marker = if line.is_unparsed() { "?" } else { " " };
        println!("  {marker} {}", line.line);
    }

    for (i, block) in item.weapon_data.iter().enumerate() {
        println!("Weapon (slot {}):", i + 1);
        print_stat_block(block);
    }
    if let Some(block) = &item.armour_data {
        println!("Armour:");
        print_stat_block(block);
    }
    if let Some(block) = &item.flask_data {
        println!("Flask:");
        print_stat_block(block);
    }
    if let Some(block) = &item.jewel_data {
        println!("Jewel:");
        print_stat_block(block);
    }
}

fn print_stat_block(block: &StatBlock) {
    // The block serializes as four maps; flatten them for display
    let Ok(serde_json::Value::Object(groups)) = serde_json::to_value(block) else {
        return;
    };
    for (_, group) in groups {
        let serde_json::Value::Object(entries) = group else {
            continue;
        };
        for (key, value) in entries {
            println!("  {key}: {value}");
        }
    }
}
