//! Input for the full fairy solver.
//!
//! The solver reads a sequence of clauses, each a keyword followed by its
//! arguments:
//!
//! ```text
//! BeginProblem
//! Stipulation h#2
//! Option NoBoard
//! Condition Circe
//! Pieces
//!   white Kb1 Qd1
//!   black Ka8 Pa7b7
//!   neutral Royal Ke4
//! Twin Remove a7
//! EndProblem
//! ```
//!
//! Pieces are grouped by color, then by their set of fairy attributes, then
//! by role, each group listing its squares in the order they were placed.

use indexmap::IndexMap;
use log::debug;
use strum::VariantArray;

use crate::{
    model::{Board, Color, Role, Square},
    protocol::{
        EncodeError, Problem,
        catalogue::{Catalogue, TokenKind},
    },
};

/// Split option tokens into options and conditions, appending the sticky
/// options not already present.
fn sort_tokens(problem: &Problem, sticky: &[String]) -> Result<(Vec<String>, Vec<String>), EncodeError> {
    let catalogue = Catalogue::builtin();
    let mut options = vec![];
    let mut conditions = vec![];
    for token in problem.options.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        match catalogue.classify(token) {
            Some(TokenKind::Option) => options.push(token.to_string()),
            Some(TokenKind::Condition) => conditions.push(token.to_string()),
            None => return Err(EncodeError::UnknownCondition(token.to_string())),
        }
    }
    let keyword = |t: &str| t.split_whitespace().next().unwrap_or("").to_lowercase();
    for option in sticky {
        if !options.iter().any(|o| keyword(o) == keyword(option)) {
            debug!("adding sticky option {option}");
            options.push(option.clone());
        }
    }
    Ok((options, conditions))
}

/// Lines of the `Pieces` clause, indented by two spaces.
pub fn pieces_clause(board: &Board) -> Vec<String> {
    let mut groups: IndexMap<(Color, String), IndexMap<Role, Vec<Square>>> = IndexMap::new();
    // occupancy order is most recent first, the clause lists in placement order
    let mut pieces: Vec<_> = board.pieces().collect();
    pieces.reverse();
    for (sq, piece) in pieces {
        let specs: Vec<String> = piece.specs.iter().map(ToString::to_string).collect();
        groups
            .entry((piece.color, specs.join(" ")))
            .or_default()
            .entry(piece.role.clone())
            .or_default()
            .push(sq);
    }

    let mut lines = vec![];
    for &color in Color::VARIANTS {
        for ((_, specs), roles) in groups.iter().filter(|((c, _), _)| *c == color) {
            let mut line = format!("  {color}");
            if !specs.is_empty() {
                line.push(' ');
                line.push_str(specs);
            }
            for (role, squares) in roles {
                line.push(' ');
                line.push_str(role.code());
                for sq in squares {
                    line.push_str(&sq.to_string());
                }
            }
            lines.push(line);
        }
    }
    lines
}

pub fn encode(board: &Board, problem: &Problem, sticky: &[String]) -> Result<String, EncodeError> {
    let (options, conditions) = sort_tokens(problem, sticky)?;

    let mut lines = vec!["BeginProblem".to_string()];
    if let Some(stipulation) = problem.stipulation.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let keyword = if problem.structured_stipulation {
            "SStipulation"
        } else {
            "Stipulation"
        };
        lines.push(format!("{keyword} {stipulation}"));
    }
    if !options.is_empty() {
        lines.push(format!("Option {}", options.join(" ")));
    }
    if !conditions.is_empty() {
        lines.push(format!("Condition {}", conditions.join(" ")));
    }
    lines.push("Pieces".into());
    lines.extend(pieces_clause(board));
    if let Some(zero) = problem.twins.zero_position() {
        lines.push(format!("ZeroPosition {zero}"));
    }
    for (_, twin) in problem.twins.successive() {
        lines.push(format!("Twin {twin}"));
    }
    lines.push("EndProblem".into());

    let mut input = lines.join("\n");
    input.push('\n');
    Ok(input)
}

#[cfg(test)]
use crate::notation::algebraic::Algebraic;

#[test]
fn clauses() {
    let board = Board::from_algebraic(
        &Algebraic::new()
            .with("white", &["Kb1", "Qd1", "Royal Ge4"])
            .with("black", &["Ka8", "Pa7", "Pb7", "Royal Gh8"])
            .with("neutral", &["Kamikaze Sc3"]),
    )
    .unwrap();
    let mut problem = Problem::with_stipulation("h#2");
    problem.options = vec!["Circe".into(), "SetPlay".into()];
    problem.twins.0.insert("b".into(), "Remove a7".into());

    let input = encode(&board, &problem, &["NoBoard".into(), "setplay".into()]).unwrap();
    assert_eq!(
        input,
        "BeginProblem\n\
         Stipulation h#2\n\
         Option SetPlay NoBoard\n\
         Condition Circe\n\
         Pieces\n\
         \x20 white Kb1 Qd1\n\
         \x20 white Royal Ge4\n\
         \x20 black Ka8 Pa7b7\n\
         \x20 black Royal Gh8\n\
         \x20 neutral Kamikaze Sc3\n\
         Twin Remove a7\n\
         EndProblem\n"
    );
}

#[test]
fn zero_position_and_structured() {
    let board = Board::from_fen("8/8/8/8/8/8/8/K7");
    let mut problem = Problem::with_stipulation("dia2.5");
    problem.structured_stipulation = true;
    problem.twins = crate::protocol::Twins::parse_block("zero: Move a1 a2\nb) Move a1 a3");
    let input = encode(&board, &problem, &[]).unwrap();
    assert_eq!(
        input,
        "BeginProblem\n\
         SStipulation dia2.5\n\
         Pieces\n\
         \x20 white Ka1\n\
         ZeroPosition Move a1 a2\n\
         Twin Move a1 a3\n\
         EndProblem\n"
    );
}

#[test]
fn unknown_condition() {
    let mut problem = Problem::with_stipulation("#2");
    problem.options = vec!["Frobnicate 3".into()];
    assert_eq!(
        encode(&Board::new(), &problem, &[]),
        Err(EncodeError::UnknownCondition("Frobnicate 3".into()))
    );
}
