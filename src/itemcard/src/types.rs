//! Shared model types for item cards
//!
//! Rarity, influence markers, and sockets. These are the vocabulary every
//! other module speaks; the parser fills them in and the serializer writes
//! them back out.

use serde::{Deserialize, Serialize};

/// Item rarity tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rarity {
    #[default]
    Normal,
    Magic,
    Rare,
    Unique,
    Relic,
}

impl Rarity {
    /// Parse a rarity from the `Rarity: <word>` header value (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "NORMAL" => Some(Rarity::Normal),
            "MAGIC" => Some(Rarity::Magic),
            "RARE" => Some(Rarity::Rare),
            "UNIQUE" => Some(Rarity::Unique),
            "RELIC" => Some(Rarity::Relic),
            _ => None,
        }
    }

    /// Get the canonical header spelling
    pub fn name(&self) -> &'static str {
        match self {
            Rarity::Normal => "NORMAL",
            Rarity::Magic => "MAGIC",
            Rarity::Rare => "RARE",
            Rarity::Unique => "UNIQUE",
            Rarity::Relic => "RELIC",
        }
    }

    /// Whether this rarity carries craftable prefix/suffix slots
    pub fn is_craftable(&self) -> bool {
        matches!(self, Rarity::Magic | Rarity::Rare)
    }
}

/// Special item origin markers granting access to exclusive modifier pools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Influence {
    Shaper,
    Elder,
    Crusader,
    Hunter,
    Redeemer,
    Warlord,
}

impl Influence {
    /// All influence kinds in canonical emission order
    pub const ALL: [Influence; 6] = [
        Influence::Shaper,
        Influence::Elder,
        Influence::Crusader,
        Influence::Hunter,
        Influence::Redeemer,
        Influence::Warlord,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Influence::Shaper => "Shaper",
            Influence::Elder => "Elder",
            Influence::Crusader => "Crusader",
            Influence::Hunter => "Hunter",
            Influence::Redeemer => "Redeemer",
            Influence::Warlord => "Warlord",
        }
    }

    /// Match a bare `<Name> Item` marker line
    pub fn from_line(line: &str) -> Option<Self> {
        let name = line.strip_suffix(" Item")?;
        Influence::ALL.iter().copied().find(|i| i.name() == name)
    }
}

/// Independent boolean per influence kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InfluenceSet {
    flags: [bool; 6],
}

impl InfluenceSet {
    pub fn set(&mut self, influence: Influence) {
        self.flags[influence as usize] = true;
    }

    pub fn has(&self, influence: Influence) -> bool {
        self.flags[influence as usize]
    }

    pub fn is_empty(&self) -> bool {
        !self.flags.iter().any(|&f| f)
    }

    /// Iterate set influences in canonical order
    pub fn iter(&self) -> impl Iterator<Item = Influence> + '_ {
        Influence::ALL.into_iter().filter(|i| self.has(*i))
    }
}

/// Socket colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketColor {
    Red,
    Green,
    Blue,
    White,
    Abyssal,
}

impl SocketColor {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'R' => Some(SocketColor::Red),
            'G' => Some(SocketColor::Green),
            'B' => Some(SocketColor::Blue),
            'W' => Some(SocketColor::White),
            'A' => Some(SocketColor::Abyssal),
            _ => None,
        }
    }

    pub fn code(&self) -> char {
        match self {
            SocketColor::Red => 'R',
            SocketColor::Green => 'G',
            SocketColor::Blue => 'B',
            SocketColor::White => 'W',
            SocketColor::Abyssal => 'A',
        }
    }
}

/// One socket: color plus link-group index
///
/// The group index is only meaningful relative to neighbors: consecutive
/// sockets sharing a group are linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Socket {
    pub color: SocketColor,
    pub group: u8,
}

/// Parse a socket string like `R-G B` into colored, grouped entries
///
/// `-` keeps the link group, ` ` starts a new one. Unknown characters are
/// skipped.
pub fn parse_sockets(text: &str) -> Vec<Socket> {
    let mut sockets = Vec::new();
    let mut group = 0u8;
    let mut first = true;
    for ch in text.chars() {
        match ch {
            ' ' => {
                if !first {
                    group = group.saturating_add(1);
                }
            }
            '-' => {}
            _ => {
                if let Some(color) = SocketColor::from_code(ch) {
                    sockets.push(Socket { color, group });
                    first = false;
                }
            }
        }
    }
    sockets
}

/// Format sockets back to the `R-G B` wire form
pub fn format_sockets(sockets: &[Socket]) -> String {
    let mut out = String::new();
    for (i, socket) in sockets.iter().enumerate() {
        if i > 0 {
            out.push(if socket.group == sockets[i - 1].group {
                '-'
            } else {
                ' '
            });
        }
        out.push(socket.color.code());
    }
    out
}
