use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use crate::model::{Color, roles::RoleTable};

/// The role of a piece, i.e. how it moves.
///
/// Stored as the uppercase code used in algebraic notation: `K`, `Q`,
/// `R`, `B`, `S`, `P` for orthodox material, `G`, `N`, `EQ`, ... for
/// fairy pieces. Codes absent from the glyph table are still valid roles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub const ORTHODOX: [&'static str; 6] = ["K", "Q", "R", "B", "S", "P"];

    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    pub fn king() -> Self {
        Self::new("K")
    }

    pub fn rook() -> Self {
        Self::new("R")
    }

    pub fn pawn() -> Self {
        Self::new("P")
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn is_orthodox(&self) -> bool {
        Self::ORTHODOX.contains(&self.0.as_str())
    }

    /// Lowercase XFEN glyph.
    pub fn glyph(&self) -> &'static str {
        RoleTable::builtin().glyph(&self.0)
    }

    pub fn name(&self) -> &str {
        RoleTable::builtin().name(&self.0)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fairy attributes a piece can carry on top of its role.
///
/// The variants are declared in alphabetical order, so the derived
/// ordering is also the serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    EnumString, Display, VariantNames, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum FairySpec {
    Chameleon,
    Functionary,
    HalfNeutral,
    HurdleColourChanging,
    Jigger,
    Kamikaze,
    Magic,
    Paralysing,
    Protean,
    Royal,
    Volage,
}

/// A piece on the board.
///
/// Pieces are values: once placed on a [`Board`](crate::model::Board)
/// they are never mutated, transforms rebuild them instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Piece {
    pub role: Role,
    pub color: Color,
    pub specs: BTreeSet<FairySpec>,
}

impl Piece {
    pub fn new(role: Role, color: Color, specs: impl IntoIterator<Item = FairySpec>) -> Self {
        Self {
            role,
            color,
            specs: specs.into_iter().collect(),
        }
    }

    pub fn orthodox(role: &str, color: Color) -> Self {
        Self::new(Role::new(role), color, [])
    }

    /// Same piece, other color.
    pub fn recolored(&self, color: Color) -> Self {
        Self {
            color,
            ..self.clone()
        }
    }

    pub fn is_fairy(&self) -> bool {
        !self.role.is_orthodox() || !self.specs.is_empty() || self.color.is_neutral()
    }

    /// XFEN glyph: cased by color, `!`-prefixed when neutral and
    /// bracketed when longer than one character.
    pub fn to_fen(&self) -> String {
        let glyph = self.role.glyph();
        let mut glyph = match self.color {
            Color::WHITE => glyph.to_ascii_uppercase(),
            _ => glyph.to_ascii_lowercase(),
        };
        if self.color.is_neutral() {
            glyph.insert(0, '!');
        }
        if glyph.len() > 1 {
            glyph = format!("({glyph})");
        }
        glyph
    }

    /// Specs and role as written before the square in algebraic
    /// notation, e.g. `Royal Volage K`.
    pub fn to_algebraic(&self) -> String {
        let mut words: Vec<String> = self.specs.iter().map(ToString::to_string).collect();
        words.push(self.role.to_string());
        words.join(" ")
    }
}

impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.color)?;
        for spec in &self.specs {
            write!(f, " {spec}")?;
        }
        write!(f, " {}", self.role.name())
    }
}

#[test]
fn piece_glyphs() {
    assert_eq!(Piece::orthodox("K", Color::WHITE).to_fen(), "K");
    assert_eq!(Piece::orthodox("s", Color::BLACK).to_fen(), "s");
    assert_eq!(Piece::orthodox("K", Color::NEUTRAL).to_fen(), "(!k)");
    assert_eq!(Piece::orthodox("G", Color::WHITE).to_fen(), "(Q2)");
    assert_eq!(Piece::orthodox("G", Color::NEUTRAL).to_fen(), "(!q2)");
    assert_eq!(Piece::orthodox("ZZZ", Color::BLACK).to_fen(), "x");
}

#[test]
fn specs_are_a_set() {
    use FairySpec::*;
    let a = Piece::new(Role::new("k"), Color::WHITE, [Volage, Royal, Royal]);
    let b = Piece::new(Role::king(), Color::WHITE, [Royal, Volage]);
    assert_eq!(a, b);
    assert_eq!(a.specs.len(), 2);
    assert_eq!(a.to_algebraic(), "Royal Volage K");
    assert_eq!(a.to_string(), "white Royal Volage King");
    assert!(a.is_fairy());
    assert!(!Piece::orthodox("P", Color::BLACK).is_fairy());
    assert_eq!("royal".parse::<FairySpec>(), Ok(Royal));
}
