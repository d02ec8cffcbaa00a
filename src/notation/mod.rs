//! Text notations for positions.
//!
//! - [`fen`]: Forsyth-Edwards board text, extended with fairy glyphs
//! - [`algebraic`]: per-color lists of piece declarations such as `Royal Ke2`
//! - [`stipulation`]: the goal of a problem, such as `h#3`

pub mod algebraic;
pub mod fen;
pub mod stipulation;

use chumsky::prelude::*;

use crate::model::Square;

/// Shorthand for the string parsers of this module.
pub trait Prs<'s, T>: Parser<'s, &'s str, T> {}

impl<'s, T, P: Parser<'s, &'s str, T>> Prs<'s, T> for P {}

/// Types with a canonical textual representation.
pub trait Parsable: Sized {
    fn parser<'s>() -> impl Prs<'s, Self>;

    /// Parse the whole string, nothing less, nothing more.
    fn parse_exact(s: &str) -> Option<Self> {
        Self::parser().then_ignore(end()).parse(s).into_output()
    }
}

impl Parsable for Square {
    fn parser<'s>() -> impl Prs<'s, Self> {
        one_of("abcdefgh")
            .then(one_of("12345678"))
            .try_map(|(f, r), _| Square::from_algebraic(f, r).ok_or(EmptyErr::default()))
    }
}

#[test]
fn test_square_parser() {
    use strum::IntoEnumIterator;
    for sq in Square::iter() {
        let sqs = sq.to_string();
        assert_eq!(
            Square::parse_exact(&sqs).unwrap_or_else(|| panic!("Unable to parse {}", sq)),
            sq
        );
    }
    assert_eq!(Square::parse_exact("i1"), None);
    assert_eq!(Square::parse_exact("a9"), None);
    assert_eq!(Square::parse_exact("a1 "), None);
}
