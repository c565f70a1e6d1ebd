//! # itemcard
//!
//! ARPG item card library - parsing, stat derivation, and crafting.
//!
//! This library provides functionality to:
//! - Parse multi-line item card text (game exports and reference listings)
//! - Resolve base types, requirements, sockets, and catalyst scaling
//! - Derive per-slot weapon, armour, flask, and jewel stats
//! - Serialize items back to card text
//! - Rebuild explicit modifiers from crafting selections
//!
//! ## Example
//!
//! ```
//! let db = itemcard::Catalogs::builtin();
//!
//! let mut item = itemcard::parse_item(
//!     "Rarity: RARE\n\
//!      Storm Edge\n\
//!      Broad Sword\n\
//!      Quality: 20\n\
//!      Implicits: 0\n\
//!      40% increased Physical Damage\n",
//!     db,
//! );
//!
//! // Round trip back to text
//! let raw = itemcard::build_raw(&item);
//! assert_eq!(itemcard::parse_item(&raw, db), item);
//!
//! itemcard::derive(&mut item);
//! println!("DPS: {}", item.weapon_data[0].number("TotalDPS"));
//! ```

pub mod annot;
pub mod catalog;
pub mod catalyst;
pub mod craft;
pub mod item;
pub mod modifier;
pub mod modparser;
pub mod parse;
pub mod range;
pub mod raw;
pub mod slots;
pub mod types;

// Re-export commonly used items
#[doc(inline)]
pub use catalog::{CatalogError, Catalogs, ItemBase};
#[doc(inline)]
pub use catalyst::{catalyst_name, catalyst_scalar, catalyst_tags};
#[doc(inline)]
pub use craft::craft;
#[doc(inline)]
pub use item::{AffixSlot, Item, ModLine, TextMode};
#[doc(inline)]
pub use parse::{parse_item, parse_item_with};
#[doc(inline)]
pub use raw::build_raw;
#[doc(inline)]
pub use slots::{derive, StatBlock};
#[doc(inline)]
pub use types::{Influence, InfluenceSet, Rarity, Socket, SocketColor};
