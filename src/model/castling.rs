use crate::model::{Board, Color, Square};

/// Where a side's king and rooks stand before castling.
///
/// Problem positions carry no castling flags, so rights are inferred from
/// the placement alone: a king and rook of the same color on their home
/// squares are assumed to have never moved.
#[derive(Debug)]
pub struct Castling {
    pub color: Color,
    pub king_from: Square,
    /// Queenside (long) and kingside (short) rook squares.
    pub rook_from: [Square; 2],
}

pub const CLASSIC_CASTLING: [Castling; 2] = [
    Castling {
        color: Color::WHITE,
        king_from: Square::e1,
        rook_from: [Square::a1, Square::h1],
    },
    Castling {
        color: Color::BLACK,
        king_from: Square::e8,
        rook_from: [Square::a8, Square::h8],
    },
];

impl Castling {
    /// Long and short castling availability on the given board.
    pub fn rights(&self, board: &Board) -> [bool; 2] {
        let home = |sq: Square, role: &str| {
            board
                .get(sq)
                .is_some_and(|p| p.color == self.color && p.role.code() == role)
        };
        let king = home(self.king_from, "K");
        self.rook_from.map(|sq| king && home(sq, "R"))
    }
}

#[test]
fn rights_from_placement() {
    use crate::model::Piece;
    let mut board = Board::new();
    board.add(Piece::orthodox("K", Color::WHITE), Square::e1);
    board.add(Piece::orthodox("R", Color::WHITE), Square::h1);
    board.add(Piece::orthodox("R", Color::BLACK), Square::a1);
    assert_eq!(CLASSIC_CASTLING[0].rights(&board), [false, true]);
    assert_eq!(CLASSIC_CASTLING[1].rights(&board), [false, false]);
}
