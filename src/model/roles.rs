//! # The glyph table
//!
//! Every role a piece can have is listed in an embedded tab-separated
//! table with four columns:
//!
//! - the role code, as written in algebraic notation (`k`, `eq`, `g`, ...)
//! - the display name of the piece
//! - the XFEN glyph used to draw it, `x` when the font has none
//! - a `d` flag when the glyph decodes to this role by default
//!
//! Several roles may share a glyph (a mao looks like a zebra), so only
//! the flagged one is picked when decoding XFEN.

use std::sync::LazyLock;

use include_flate::flate;
use indexmap::IndexMap;

flate!(static FAIRY_PIECES: str from "conf/fairy-pieces.txt");

/// Glyph for roles the font has no picture of.
pub const PLACEHOLDER_GLYPH: &str = "x";

/// Characters that may start an XFEN glyph, lowercase.
pub const GLYPH_ALPHABET: &str = "kqrbspeofawdx";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleEntry {
    pub code: String,
    pub name: String,
    pub glyph: String,
}

#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    roles: IndexMap<String, RoleEntry>,
    defaults: IndexMap<String, String>,
}

impl RoleTable {
    /// Parse the tab-separated table format; malformed lines are skipped.
    pub fn parse(text: &str) -> Self {
        let mut table = Self::default();
        for line in text.lines() {
            let cols: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
            let code = cols[0].trim().to_ascii_lowercase();
            if code.is_empty() || cols.len() < 2 {
                continue;
            }
            let glyph = match cols.get(2).map(|g| g.trim()) {
                Some(g) if !g.is_empty() => g.to_ascii_lowercase(),
                _ => PLACEHOLDER_GLYPH.to_string(),
            };
            if cols.get(3).map(|d| d.trim()) == Some("d") {
                table.defaults.insert(glyph.clone(), code.clone());
            }
            table.roles.insert(
                code.clone(),
                RoleEntry {
                    code,
                    name: cols[1].trim().to_string(),
                    glyph,
                },
            );
        }
        table
    }

    /// The table compiled into the crate.
    pub fn builtin() -> &'static Self {
        &ROLE_TABLE
    }

    pub fn entry(&self, code: &str) -> Option<&RoleEntry> {
        self.roles.get(&code.to_ascii_lowercase())
    }

    /// Lowercase glyph of a role, the placeholder for unknown roles.
    pub fn glyph(&self, code: &str) -> &str {
        self.entry(code)
            .map(|e| e.glyph.as_str())
            .unwrap_or(PLACEHOLDER_GLYPH)
    }

    /// Display name of a role, the code itself for unknown roles.
    pub fn name<'a>(&'a self, code: &'a str) -> &'a str {
        self.entry(code).map(|e| e.name.as_str()).unwrap_or(code)
    }

    /// Role a glyph decodes to, if the glyph has a default.
    pub fn default_role(&self, glyph: &str) -> Option<&str> {
        self.defaults
            .get(&glyph.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

static ROLE_TABLE: LazyLock<RoleTable> = LazyLock::new(|| RoleTable::parse(&FAIRY_PIECES));

#[test]
fn builtin_table() {
    let table = RoleTable::builtin();
    assert!(!table.is_empty());
    assert_eq!(table.glyph("K"), "k");
    assert_eq!(table.glyph("S"), "s");
    assert_eq!(table.glyph("G"), "q2");
    assert_eq!(table.name("eq"), "Equihopper");
    assert_eq!(table.default_role("q2"), Some("g"));
    assert_eq!(table.default_role("S"), Some("s"));
    assert_eq!(table.glyph("XYZ"), PLACEHOLDER_GLYPH);
    // a mao shares the zebra glyph but is not its default
    assert_eq!(table.glyph("MA"), "s1");
    assert_eq!(table.default_role("s1"), Some("z"));
}

#[test]
fn parse_skips_junk() {
    let table = RoleTable::parse("k\tKing\tk\td\n\n  \nzz\nhh\tHopper\n");
    assert_eq!(table.len(), 2);
    assert_eq!(table.glyph("hh"), PLACEHOLDER_GLYPH);
    assert_eq!(table.default_role("k"), Some("k"));
}
