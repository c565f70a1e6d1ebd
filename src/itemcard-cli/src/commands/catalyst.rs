//! Catalyst scaling handler

use anyhow::{bail, Result};
use itemcard::{catalyst_name, catalyst_scalar, catalyst_tags};

pub fn handle(id: Option<u8>, tags: &[String], quality: Option<i32>) -> Result<()> {
    let Some(id) = id else {
        for id in 1..=9u8 {
            let name = catalyst_name(id).unwrap_or("?");
            println!("{id}  {name:<13} {}", catalyst_tags(id).join(", "));
        }
        return Ok(());
    };

    let Some(name) = catalyst_name(id) else {
        bail!("unknown catalyst id: {id}");
    };
    println!("{name} Catalyst (id {id})");
    println!("  applies to: {}", catalyst_tags(id).join(", "));
    if !tags.is_empty() {
        let scalar = catalyst_scalar(Some(id), tags, quality);
        println!("  scalar for [{}]: {scalar}", tags.join(", "));
    }
    Ok(())
}
