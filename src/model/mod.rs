//! Modeling a fairy chess problem position.
//!
//! The board is a plain 64-slot mailbox with an intrusive occupancy list
//! threaded through the slots, see [`board`]. Pieces carry an open-ended
//! role code rather than a closed set of chessmen, since problem
//! composers use hundreds of fairy pieces.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIs, EnumIter, EnumString, FromRepr, VariantArray, VariantNames};

pub mod board;
pub mod castling;
pub mod mailbox;
pub mod piece;
pub mod roles;

pub use board::{Board, MirrorAxis, Pieces, Rotation};
pub use piece::{FairySpec, Piece, Role};

/// Representation of the squares on a chessboard.
///
/// This enum uses the convention of numbering
/// squares starting from the top-left corner, a8 = 0, and then counting
/// up over the files first, b8 = 1, c8 = 2, ... and then down the
/// ranks, a7 = 8, a6 = 16, ... ending with h1 = 63.
///
/// This is the layout in which FEN text is written, so the codecs
/// can walk the squares in index order.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    FromRepr, VariantNames, EnumIter)]
#[repr(u8)]
#[rustfmt::skip]
pub enum Square {
    a8 = 0o00, b8 = 0o01, c8 = 0o02, d8 = 0o03, e8 = 0o04, f8 = 0o05, g8 = 0o06, h8 = 0o07,
    a7 = 0o10, b7 = 0o11, c7 = 0o12, d7 = 0o13, e7 = 0o14, f7 = 0o15, g7 = 0o16, h7 = 0o17,
    a6 = 0o20, b6 = 0o21, c6 = 0o22, d6 = 0o23, e6 = 0o24, f6 = 0o25, g6 = 0o26, h6 = 0o27,
    a5 = 0o30, b5 = 0o31, c5 = 0o32, d5 = 0o33, e5 = 0o34, f5 = 0o35, g5 = 0o36, h5 = 0o37,
    a4 = 0o40, b4 = 0o41, c4 = 0o42, d4 = 0o43, e4 = 0o44, f4 = 0o45, g4 = 0o46, h4 = 0o47,
    a3 = 0o50, b3 = 0o51, c3 = 0o52, d3 = 0o53, e3 = 0o54, f3 = 0o55, g3 = 0o56, h3 = 0o57,
    a2 = 0o60, b2 = 0o61, c2 = 0o62, d2 = 0o63, e2 = 0o64, f2 = 0o65, g2 = 0o66, h2 = 0o67,
    a1 = 0o70, b1 = 0o71, c1 = 0o72, d1 = 0o73, e1 = 0o74, f1 = 0o75, g1 = 0o76, h1 = 0o77,
}

impl Square {
    /// Use this Square as an array index.
    #[inline]
    pub fn ix(self) -> usize {
        self as usize
    }

    /// Infallible conversion from a u8 by way of truncating the
    /// extraneous bits.
    #[inline]
    pub fn from_u8(ix: u8) -> Self {
        unsafe { std::mem::transmute::<u8, Self>(ix & 0x3Fu8) }
    }

    /// Checked conversion from a slot index.
    #[inline]
    pub fn from_index(ix: usize) -> Option<Self> {
        u8::try_from(ix).ok().and_then(Self::from_repr)
    }

    /// Split a square into file (0 = a) and row (0 = 8th rank).
    #[inline]
    pub fn coords(self) -> (i8, i8) {
        ((self as u8 & 0x7) as i8, (self as u8 >> 3) as i8)
    }

    /// Inverse of [`Square::coords`]; `None` when off the board.
    #[inline]
    pub fn from_coords(x: i8, y: i8) -> Option<Self> {
        if (0..8).contains(&x) && (0..8).contains(&y) {
            Some(Self::from_u8((x + 8 * y) as u8))
        } else {
            None
        }
    }

    /// Build a square from its algebraic file letter and rank digit.
    pub fn from_algebraic(file: char, rank: char) -> Option<Self> {
        if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return None;
        }
        let x = file as i8 - 'a' as i8;
        let y = 7 - (rank as i8 - '1' as i8);
        Self::from_coords(x, y)
    }

    #[inline]
    pub fn file(self) -> char {
        (b'a' + (self as u8 & 0x7)) as char
    }

    #[inline]
    pub fn rank(self) -> char {
        (b'8' - (self as u8 >> 3)) as char
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(Square::VARIANTS[self.ix()])
    }
}

#[test]
fn square_file_rank() {
    use strum::IntoEnumIterator;
    for (i, sq) in Square::iter().enumerate() {
        assert_eq!(sq.ix(), i);
        assert_eq!(format!("{}{}", sq.file(), sq.rank()), sq.to_string());
        assert_eq!(Square::from_algebraic(sq.file(), sq.rank()), Some(sq));
    }
    assert_eq!(Square::from_algebraic('e', '2'), Some(Square::e2));
    assert_eq!(Square::e2.ix(), 4 + 8 * 6);
    assert_eq!(Square::from_coords(8, 0), None);
    assert_eq!(Square::from_coords(0, -1), None);
}

/// Representation of the color of a piece.
///
/// Neutral pieces belong to both sides at once, which is why this is
/// not simply a player.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    EnumIs, EnumString, Display, VariantArray, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Color {
    WHITE = 0,
    BLACK = 1,
    NEUTRAL = 2,
}

impl Color {
    /// Swap white and black; neutral stays neutral.
    #[inline]
    pub fn inverted(self) -> Self {
        match self {
            Self::WHITE => Self::BLACK,
            Self::BLACK => Self::WHITE,
            Self::NEUTRAL => Self::NEUTRAL,
        }
    }

    /// Associated array index.
    #[inline]
    pub fn ix(self) -> usize {
        self as usize
    }
}

#[test]
fn color_names() {
    assert_eq!(Color::NEUTRAL.to_string(), "neutral");
    assert_eq!("black".parse::<Color>(), Ok(Color::BLACK));
    assert_eq!("White".parse::<Color>(), Ok(Color::WHITE));
    assert_eq!(Color::WHITE.inverted(), Color::BLACK);
    assert_eq!(Color::NEUTRAL.inverted(), Color::NEUTRAL);
}
