//! Input for the orthodox solver.
//!
//! One instruction per line:
//!
//! ```text
//! LE                 load the position that follows
//! f <fen>            board field, knights written N
//! cwl cws cbl cbs    castling rights, one line each
//! e<file><rank>      en-passant target
//! j<kind>            problem kind, omitted for direct mates
//! z<moves><side>     number of moves and the side to play first
//! ```
//!
//! The solver only knows orthodox pieces and has no notion of a helpmate
//! starting with a half-move, so such problems are refused.

use crate::{
    model::{Board, Color, castling::CLASSIC_CASTLING},
    notation::{
        fen::is_orthodox_fen,
        stipulation::{Goal, PlayType},
    },
    protocol::{EncodeError, Problem},
};

pub fn encode(board: &Board, problem: &Problem) -> Result<String, EncodeError> {
    let fen = board.to_fen();
    if !is_orthodox_fen(&fen) || board.has_fairy_pieces() {
        return Err(EncodeError::UnsupportedPosition(
            "fairy pieces need the full solver".into(),
        ));
    }
    if problem.has_fairy_conditions() {
        return Err(EncodeError::UnsupportedPosition(
            "fairy conditions need the full solver".into(),
        ));
    }
    let stipulation = problem.stipulation()?;
    if stipulation.play.is_helpmate() && stipulation.half_move {
        return Err(EncodeError::UnsupportedStipulation(stipulation.to_string()));
    }

    let mut lines = vec![
        "LE".to_string(),
        format!("f {}", fen.replace('S', "N").replace('s', "n")),
    ];

    for castling in &CLASSIC_CASTLING {
        let side = match castling.color {
            Color::WHITE => 'w',
            _ => 'b',
        };
        let [long, short] = castling.rights(board);
        if long {
            lines.push(format!("c{side}l"));
        }
        if short {
            lines.push(format!("c{side}s"));
        }
    }

    if let Some(sq) = problem.en_passant() {
        let rank = if sq.rank() == '3' { '4' } else { '5' };
        lines.push(format!("e{}{rank}", sq.file()));
    }

    match (stipulation.play, stipulation.goal) {
        (PlayType::Direct, Goal::Mate) => {}
        (PlayType::Direct, Goal::Stalemate) => lines.push("jO".into()),
        (play, Goal::Mate) => lines.push(format!("j{play}")),
        (play, Goal::Stalemate) => lines.push(format!("j{}", play.to_string().to_uppercase())),
    }

    let side = if stipulation.play.is_helpmate() { 'b' } else { 'w' };
    lines.push(format!("z{}{side}", stipulation.move_count));

    let mut input = lines.join("\n");
    input.push('\n');
    Ok(input)
}

#[cfg(test)]
fn start_board() -> Board {
    Board::from_fen("rsbqkbsr/pppppppp/8/8/8/8/PPPPPPPP/RSBQKBSR")
}

#[test]
fn start_position() {
    let input = encode(&start_board(), &Problem::with_stipulation("#2")).unwrap();
    assert_eq!(
        input,
        "LE\n\
         f rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR\n\
         cwl\ncws\ncbl\ncbs\n\
         z2w\n"
    );
}

#[test]
fn kinds_and_sides() {
    let board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3");
    let lines = |stip: &str| {
        let input = encode(&board, &Problem::with_stipulation(stip)).unwrap();
        input.lines().skip(2).map(String::from).collect::<Vec<_>>()
    };
    assert_eq!(lines("h#3"), ["cwl", "jh", "z3b"]);
    assert_eq!(lines("s#2"), ["cwl", "js", "z2w"]);
    assert_eq!(lines("s=4"), ["cwl", "jS", "z4w"]);
    assert_eq!(lines("=2"), ["cwl", "jO", "z2w"]);
    assert_eq!(lines("#2.5"), ["cwl", "z2w"]);
}

#[test]
fn en_passant_target() {
    let board = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3");
    let mut problem = Problem::with_stipulation("#1");
    problem.options.push("EnPassant d6".into());
    let input = encode(&board, &problem).unwrap();
    assert!(input.contains("\ned5\n"), "{input}");

    problem.options = vec!["EnPassant e3".into()];
    let input = encode(&board, &problem).unwrap();
    assert!(input.contains("\nee4\n"), "{input}");
}

#[test]
fn refusals() {
    let board = start_board();
    assert!(matches!(
        encode(&board, &Problem::with_stipulation("h#2.5")),
        Err(EncodeError::UnsupportedStipulation(s)) if s == "h#2.5"
    ));
    assert!(matches!(
        encode(&board, &Problem::with_stipulation("ser-h#5")),
        Err(EncodeError::UnsupportedStipulation(_))
    ));
    assert!(matches!(
        encode(&board, &Problem::default()),
        Err(EncodeError::UnsupportedStipulation(_))
    ));

    let mut circe = Problem::with_stipulation("#2");
    circe.options.push("Circe".into());
    assert!(matches!(
        encode(&board, &circe),
        Err(EncodeError::UnsupportedPosition(_))
    ));

    let fairy = Board::from_fen("4k3/8/8/8/8/8/8/(Q2)3K3");
    assert!(matches!(
        encode(&fairy, &Problem::with_stipulation("#2")),
        Err(EncodeError::UnsupportedPosition(_))
    ));
}
