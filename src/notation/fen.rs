//! # Extended Forsyth-Edwards Notation
//!
//! Problem collections only ever need the board field of FEN: the side to
//! move follows from the stipulation and castling rights are inferred from
//! placement. The board is written as eight solidus-separated (`/`) ranks,
//! starting with the 8th rank, files in a-h order.
//!
//! Empty squares are run-length encoded as digits, 1 meaning a single empty
//! square up to 8 meaning an entirely empty rank.
//!
//! Pieces are written as glyphs, uppercase for white and lowercase for
//! black, K for kings, Q for queens, R for rooks, B for bishops, S for
//! knights (the German _Springer_, as problemists write it; N is accepted
//! when reading) and P for pawns.
//!
//! X-FEN extends this for fairy chess:
//!
//! - Fairy pieces use the glyphs `E O F A W D X` or, when the piece is drawn
//!   as a rotated orthodox figure, a bracketed multi-character glyph such as
//!   `(Q2)` for an upside-down queen, i.e. a grasshopper.
//! - Neutral pieces are marked with a leading `!` inside the brackets, as
//!   in `(!k)`.
//!
//! Reading is lenient: anything that is not a digit, a glyph or a bracketed
//! group is skipped, and glyphs past the 64th square are ignored.
//!
//! Thus the board of the standard starting position is:
//! ```text
//! rsbqkbsr/pppppppp/8/8/8/8/PPPPPPPP/RSBQKBSR
//! ```

use chumsky::prelude::*;

use crate::{
    model::{Board, Color, Piece, Role, Square, roles::RoleTable},
    notation::Prs,
};

/// Single-character glyphs, both cases, including the `n` knight alias.
const GLYPH_CHARS: &str = "kqrbspeofawdxnKQRBSPEOFAWDXN";

#[derive(Debug, Clone, PartialEq, Eq)]
enum FenToken {
    Blanks(usize),
    Glyph(String),
    Noise,
}

fn fen_token<'s>() -> impl Prs<'s, FenToken> {
    choice((
        one_of("12345678").map(|c: char| FenToken::Blanks(c as usize - '0' as usize)),
        none_of(')')
            .repeated()
            .to_slice()
            .delimited_by(just('('), just(')'))
            .map(|g: &str| FenToken::Glyph(g.to_string())),
        just('!')
            .or_not()
            .then(one_of(GLYPH_CHARS))
            .map(|(bang, c): (Option<char>, char)| {
                FenToken::Glyph(bang.into_iter().chain([c]).collect())
            }),
        any().to(FenToken::Noise),
    ))
}

fn fen_tokens<'s>() -> impl Prs<'s, Vec<FenToken>> {
    fen_token().repeated().collect::<Vec<_>>()
}

/// Resolve a glyph, brackets removed, to a piece.
///
/// An all-lowercase glyph is black, any `!` makes it neutral. Glyphs the
/// table has no default role for decode to pawns.
fn glyph_piece(glyph: &str) -> Option<Piece> {
    let base: String = glyph.chars().filter(|&c| c != '!').collect();
    if base.is_empty() {
        return None;
    }
    let color = if glyph.contains('!') {
        Color::NEUTRAL
    } else if base == base.to_lowercase() {
        Color::BLACK
    } else {
        Color::WHITE
    };
    let key = base.to_lowercase().replace('n', "s");
    let role = RoleTable::builtin().default_role(&key).unwrap_or("p");
    Some(Piece::new(Role::new(role), color, []))
}

/// Read the board field of an (X-)FEN string. Never fails: see the
/// module documentation for how malformed input is treated.
pub fn decode_fen(text: &str) -> Board {
    let tokens = fen_tokens().parse(text).into_output().unwrap_or_default();
    let mut board = Board::new();
    let mut ix = 0usize;
    for token in tokens {
        if ix >= 64 {
            break;
        }
        match token {
            FenToken::Blanks(n) => ix += n,
            FenToken::Glyph(g) => {
                if let Some(piece) = glyph_piece(&g) {
                    if let Some(sq) = Square::from_index(ix) {
                        board.add(piece, sq);
                    }
                    ix += 1;
                }
            }
            FenToken::Noise => {}
        }
    }
    board
}

/// Write the board field of an X-FEN string.
pub fn encode_fen(board: &Board) -> String {
    let mut fen = String::new();
    let mut blanks = 0;
    for ix in 0..64 {
        if ix > 0 && ix % 8 == 0 {
            if blanks > 0 {
                fen.push_str(&blanks.to_string());
            }
            fen.push('/');
            blanks = 0;
        }
        match board.get(Square::from_u8(ix)) {
            Some(piece) => {
                if blanks > 0 {
                    fen.push_str(&blanks.to_string());
                }
                fen.push_str(&piece.to_fen());
                blanks = 0;
            }
            None => blanks += 1,
        }
    }
    if blanks > 0 {
        fen.push_str(&blanks.to_string());
    }
    fen
}

/// Whether a board field contains nothing but orthodox glyphs, digits and
/// solidi.
pub fn is_orthodox_fen(fen: &str) -> bool {
    fen.chars()
        .all(|c| "kqrbsp12345678/".contains(c.to_ascii_lowercase()))
}

impl Board {
    pub fn from_fen(text: &str) -> Self {
        decode_fen(text)
    }

    pub fn to_fen(&self) -> String {
        encode_fen(self)
    }
}

#[cfg(test)]
const START: &str = "rsbqkbsr/pppppppp/8/8/8/8/PPPPPPPP/RSBQKBSR";

#[test]
fn start_position() {
    let board = decode_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR");
    assert_eq!(board.len(), 32);
    assert_eq!(board.get(Square::g1), Some(&Piece::orthodox("S", Color::WHITE)));
    assert_eq!(board.get(Square::e8), Some(&Piece::orthodox("K", Color::BLACK)));
    assert_eq!(encode_fen(&board), START);
    assert!(is_orthodox_fen(START));
    assert_eq!(encode_fen(&Board::new()), "8/8/8/8/8/8/8/8");
}

#[test]
fn orthodox_round_trip() {
    use rand::{Rng, SeedableRng, rngs::SmallRng};
    let mut rng = SmallRng::seed_from_u64(0x0123_4567_89AB_CDEF);
    for _ in 0..200 {
        let mut board = Board::new();
        for _ in 0..rng.random_range(0..40) {
            let role = Role::ORTHODOX[rng.random_range(0..6)];
            let color = if rng.random_bool(0.5) { Color::WHITE } else { Color::BLACK };
            let sq = Square::from_u8(rng.random_range(0..64));
            board.add(Piece::orthodox(role, color), sq);
        }
        let fen = encode_fen(&board);
        assert!(is_orthodox_fen(&fen), "{fen}");
        assert_eq!(decode_fen(&fen), board, "{fen}");
    }
}

#[test]
fn fairy_glyphs() {
    let board = decode_fen("(Q2)(!k)e5/8/8/8/8/8/8/(s2)6(!Q2)");
    assert_eq!(board.len(), 5);
    assert_eq!(board.get(Square::a8), Some(&Piece::orthodox("G", Color::WHITE)));
    assert_eq!(board.get(Square::b8), Some(&Piece::orthodox("K", Color::NEUTRAL)));
    assert_eq!(board.get(Square::c8), Some(&Piece::orthodox("EQ", Color::BLACK)));
    assert_eq!(board.get(Square::a1), Some(&Piece::orthodox("N", Color::BLACK)));
    assert_eq!(board.get(Square::h1), Some(&Piece::orthodox("G", Color::NEUTRAL)));
    assert_eq!(encode_fen(&board), "(Q2)(!k)e5/8/8/8/8/8/8/(s2)6(!q2)");
    assert!(!is_orthodox_fen(&encode_fen(&board)));
}

#[test]
fn unknown_glyphs_become_pawns() {
    let board = decode_fen("x(zz)6");
    assert_eq!(board.get(Square::a8), Some(&Piece::orthodox("P", Color::BLACK)));
    assert_eq!(board.get(Square::b8), Some(&Piece::orthodox("P", Color::BLACK)));
}

#[test]
fn lenient_reading() {
    // noise, a bare neutral marker and an unclosed bracket are skipped
    let board = decode_fen("  K?!k(q");
    assert_eq!(board.get(Square::a8), Some(&Piece::orthodox("K", Color::WHITE)));
    assert_eq!(board.get(Square::b8), Some(&Piece::orthodox("K", Color::NEUTRAL)));
    assert_eq!(board.get(Square::c8), Some(&Piece::orthodox("Q", Color::BLACK)));
    assert_eq!(board.len(), 3);

    // filling stops after the last square
    let board = decode_fen("8/8/8/8/8/8/8/7KKKK");
    assert_eq!(board.len(), 1);
    assert_eq!(board.get(Square::h1), Some(&Piece::orthodox("K", Color::WHITE)));
    let board = decode_fen("88888888k");
    assert!(board.is_empty());
}
