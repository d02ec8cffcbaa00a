//! # Algebraic piece lists
//!
//! The way problems are stored in collections: for each color, a list of
//! declarations, each the fairy attributes of the piece followed by its
//! role code and square, e.g.
//!
//! ```text
//! white: [Ke2, Bb8, Sa7, Pf3]
//! black: [Kf5, Ra5, Royal Bf4]
//! neutral: [Magic Ge4]
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::VariantArray;

use crate::{
    model::{Board, Color, FairySpec, Piece, Role, Square},
    notation::Parsable,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown color {0:?}")]
    UnknownColor(String),
    #[error("missing or invalid square in {0:?}")]
    BadSquare(String),
    #[error("missing piece code in {0:?}")]
    MissingRole(String),
    #[error("unknown fairy attribute {spec:?} in {declaration:?}")]
    UnknownSpec { spec: String, declaration: String },
}

/// Color name to piece declarations, in the order they are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Algebraic(pub IndexMap<String, Vec<String>>);

impl Algebraic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append declarations for a color.
    pub fn with(mut self, color: &str, declarations: &[&str]) -> Self {
        self.0
            .entry(color.to_string())
            .or_default()
            .extend(declarations.iter().map(|d| d.to_string()));
        self
    }

    pub fn get(&self, color: Color) -> &[String] {
        self.0
            .get(&color.to_string())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Split one declaration such as `Royal Volage Ke2` into square and piece.
pub fn parse_declaration(color: Color, declaration: &str) -> Result<(Square, Piece), DecodeError> {
    let mut words: Vec<&str> = declaration.split_whitespace().collect();
    let last = words
        .pop()
        .ok_or_else(|| DecodeError::MissingRole(declaration.to_string()))?;
    let split = last
        .len()
        .checked_sub(2)
        .filter(|&i| last.is_char_boundary(i))
        .ok_or_else(|| DecodeError::BadSquare(declaration.to_string()))?;
    let (role, square) = last.split_at(split);
    let sq = Square::parse_exact(square)
        .ok_or_else(|| DecodeError::BadSquare(declaration.to_string()))?;
    if role.is_empty() {
        return Err(DecodeError::MissingRole(declaration.to_string()));
    }
    let specs = words
        .into_iter()
        .map(|w| {
            w.parse::<FairySpec>().map_err(|_| DecodeError::UnknownSpec {
                spec: w.to_string(),
                declaration: declaration.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((sq, Piece::new(Role::new(role), color, specs)))
}

/// Build a board from piece lists. Later declarations replace earlier
/// ones on the same square.
pub fn decode_algebraic(algebraic: &Algebraic) -> Result<Board, DecodeError> {
    let mut board = Board::new();
    for (color, declarations) in &algebraic.0 {
        let color: Color = color
            .parse()
            .map_err(|_| DecodeError::UnknownColor(color.clone()))?;
        for declaration in declarations {
            let (sq, piece) = parse_declaration(color, declaration)?;
            board.add(piece, sq);
        }
    }
    Ok(board)
}

/// Piece lists for white, black and neutral, colors without pieces
/// omitted, pieces in occupancy order.
pub fn encode_algebraic(board: &Board) -> Algebraic {
    let mut algebraic = Algebraic::new();
    for &color in Color::VARIANTS {
        let declarations: Vec<String> = board
            .pieces()
            .filter(|(_, p)| p.color == color)
            .map(|(sq, p)| format!("{}{}", p.to_algebraic(), sq))
            .collect();
        if !declarations.is_empty() {
            algebraic.0.insert(color.to_string(), declarations);
        }
    }
    algebraic
}

impl Board {
    pub fn from_algebraic(algebraic: &Algebraic) -> Result<Self, DecodeError> {
        decode_algebraic(algebraic)
    }

    pub fn to_algebraic(&self) -> Algebraic {
        encode_algebraic(self)
    }
}

#[test]
fn declarations() {
    let (sq, piece) = parse_declaration(Color::BLACK, "Royal  volage EQh1").unwrap();
    assert_eq!(sq, Square::h1);
    assert_eq!(piece.role.code(), "EQ");
    assert_eq!(piece.specs.len(), 2);
    assert_eq!(piece.to_algebraic(), "Royal Volage EQ");

    use DecodeError::*;
    assert!(matches!(parse_declaration(Color::WHITE, ""), Err(MissingRole(_))));
    assert!(matches!(parse_declaration(Color::WHITE, "e2"), Err(MissingRole(_))));
    assert!(matches!(parse_declaration(Color::WHITE, "K"), Err(BadSquare(_))));
    assert!(matches!(parse_declaration(Color::WHITE, "Kz9"), Err(BadSquare(_))));
    assert!(matches!(parse_declaration(Color::WHITE, "Ké2"), Err(BadSquare(_))));
    assert!(matches!(
        parse_declaration(Color::WHITE, "Sparkly Ke2"),
        Err(UnknownSpec { spec, .. }) if spec == "Sparkly"
    ));
}

#[test]
fn algebraic_round_trip() {
    let algebraic = Algebraic::new()
        .with("white", &["Ke2", "Bb8", "Sa7", "Pf3"])
        .with("black", &["Kf5", "Ra5", "Royal Bf4"])
        .with("neutral", &["Magic Kamikaze Ge4"]);
    let board = decode_algebraic(&algebraic).unwrap();
    assert_eq!(board.len(), 8);
    assert_eq!(board.pieces_count(), "4+3+1");

    let encoded = encode_algebraic(&board);
    assert_eq!(encoded.0.keys().collect::<Vec<_>>(), ["white", "black", "neutral"]);
    assert_eq!(encoded.get(Color::WHITE), ["Pf3", "Sa7", "Bb8", "Ke2"]);
    assert_eq!(encoded.get(Color::NEUTRAL), ["Kamikaze Magic Ge4"]);
    assert_eq!(decode_algebraic(&encoded).unwrap(), board);

    let empty = encode_algebraic(&Board::new());
    assert!(empty.0.is_empty());
}

#[test]
fn unknown_color() {
    let algebraic = Algebraic::new().with("purple", &["Ke2"]);
    assert_eq!(
        decode_algebraic(&algebraic),
        Err(DecodeError::UnknownColor("purple".into()))
    );
}
