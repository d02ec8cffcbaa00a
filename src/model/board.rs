//! # The problem board
//!
//! A [`Board`] is a [`Mailbox`] of 64 slots. Besides its piece, every
//! occupied slot stores the indices of the previous and next occupied
//! slots, threading a doubly linked list through the array. The list is
//! ordered most-recently-added first, starting at `head`, and `-1` is the
//! end-of-list sentinel. This allows enumerating the pieces without
//! scanning empty squares, and keeps the order in which a composer placed
//! them, which the algebraic and engine encodings reproduce.
//!
//! All geometric transforms are expressed as a map over `(x, y)`
//! coordinates, where `x` is the file and `y` the row counted from the
//! 8th rank. The board is rebuilt from the mapped pieces; pieces that
//! land outside the board are dropped, never wrapped around.

use indexmap::IndexMap;
use strum::{EnumIter, EnumString, VariantNames};

use crate::model::{Color, Piece, Square, mailbox::Mailbox};

/// End-of-list marker for the occupancy links.
pub const NIL: i8 = -1;

#[derive(Debug, Clone)]
struct Slot {
    piece: Option<Piece>,
    prev: i8,
    next: i8,
}

impl Slot {
    const EMPTY: Slot = Slot {
        piece: None,
        prev: NIL,
        next: NIL,
    };
}

#[inline]
fn link(ix: i8) -> Option<Square> {
    (ix != NIL).then(|| Square::from_u8(ix as u8))
}

#[derive(Debug, Clone)]
pub struct Board {
    slots: Mailbox<Slot>,
    head: i8,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Boards are equal when the same pieces stand on the same squares,
/// regardless of the order in which they were placed.
impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.slots
            .0
            .iter()
            .zip(other.slots.0.iter())
            .all(|(a, b)| a.piece == b.piece)
    }
}

impl Eq for Board {}

impl FromIterator<(Square, Piece)> for Board {
    fn from_iter<I: IntoIterator<Item = (Square, Piece)>>(iter: I) -> Self {
        let mut board = Self::new();
        for (sq, piece) in iter {
            board.add(piece, sq);
        }
        board
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            slots: Mailbox([Slot::EMPTY; 64]),
            head: NIL,
        }
    }

    /// The most recently added square.
    pub fn head(&self) -> Option<Square> {
        link(self.head)
    }

    pub fn get(&self, sq: Square) -> Option<&Piece> {
        self.slots[sq].piece.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.head == NIL
    }

    pub fn len(&self) -> usize {
        self.pieces().count()
    }

    /// Bit `n` set iff square index `n` is occupied.
    pub fn occupancy(&self) -> u64 {
        self.slots.mask(|_, slot| slot.piece.is_some())
    }

    /// Place a piece, evicting whatever stood there, and link it at the
    /// head of the occupancy list.
    pub fn add(&mut self, piece: Piece, sq: Square) {
        if self.slots[sq].piece.is_some() {
            self.drop(sq);
        }
        if let Some(head) = self.head() {
            self.slots[head].prev = sq as i8;
        }
        self.slots[sq] = Slot {
            piece: Some(piece),
            prev: NIL,
            next: self.head,
        };
        self.head = sq as i8;
    }

    /// Unlink and return the piece on a square.
    pub fn drop(&mut self, sq: Square) -> Option<Piece> {
        let slot = std::mem::replace(&mut self.slots[sq], Slot::EMPTY);
        let piece = slot.piece?;
        if let Some(prev) = link(slot.prev) {
            self.slots[prev].next = slot.next;
        }
        if let Some(next) = link(slot.next) {
            self.slots[next].prev = slot.prev;
        }
        if self.head == sq as i8 {
            self.head = slot.next;
        }
        Some(piece)
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Pieces in occupancy order, most recently added first.
    pub fn pieces(&self) -> Pieces<'_> {
        Pieces {
            board: self,
            current: self.head,
        }
    }

    /// Replace the occupancy by mapping every piece, in occupancy order,
    /// into a cleared board. `None` drops the piece.
    pub fn rebuild(&mut self, mut f: impl FnMut(Square, &Piece) -> Option<(Square, Piece)>) {
        let old = std::mem::take(self);
        for (sq, piece) in old.pieces() {
            if let Some((to, piece)) = f(sq, piece) {
                self.add(piece, to);
            }
        }
    }

    /// Move every piece through a coordinate map.
    pub fn transform(&mut self, f: impl Fn((i8, i8)) -> (i8, i8)) {
        self.rebuild(|sq, piece| {
            let (x, y) = f(sq.coords());
            Square::from_coords(x, y).map(|to| (to, piece.clone()))
        });
    }

    /// Shift all pieces `dx` files to the right and `dy` rows down.
    pub fn shift(&mut self, dx: i8, dy: i8) {
        self.transform(|(x, y)| (x + dx, y + dy));
    }

    pub fn rotate(&mut self, rotation: Rotation) {
        let turns = rotation.quarter_turns();
        self.transform(|mut xy| {
            for _ in 0..turns {
                xy = quarter_turn(xy);
            }
            xy
        });
    }

    pub fn mirror(&mut self, axis: MirrorAxis) {
        self.transform(axis.reflection());
    }

    /// Swap the colors of white and black pieces in place.
    pub fn invert_colors(&mut self) {
        self.rebuild(|sq, piece| Some((sq, piece.recolored(piece.color.inverted()))));
    }

    /// Whether any piece is neutral, carries fairy specs or has a
    /// non-orthodox role.
    pub fn has_fairy_pieces(&self) -> bool {
        self.pieces().any(|(_, p)| p.is_fairy())
    }

    /// Material count as `white+black`, with `+neutral` appended when
    /// there are neutral pieces.
    pub fn pieces_count(&self) -> String {
        let mut counts = [0usize; 3];
        for (_, piece) in self.pieces() {
            counts[piece.color.ix()] += 1;
        }
        match counts {
            [w, b, 0] => format!("{w}+{b}"),
            [w, b, n] => format!("{w}+{b}+{n}"),
        }
    }

    /// Descriptions of unusual pieces, e.g. `Royal Neutral King`, with the
    /// squares they stand on. Plain orthodox pieces are not listed.
    pub fn legend(&self) -> IndexMap<String, Vec<Square>> {
        let mut legend: IndexMap<String, Vec<Square>> = IndexMap::new();
        for (sq, piece) in self.pieces() {
            let mut words: Vec<String> = piece.specs.iter().map(ToString::to_string).collect();
            if piece.color.is_neutral() {
                words.push("Neutral".to_string());
            }
            if !piece.role.is_orthodox() || !words.is_empty() {
                words.push(piece.role.name().to_string());
            }
            if !words.is_empty() {
                legend.entry(words.join(" ")).or_default().push(sq);
            }
        }
        legend
    }
}

/// One 90 degree step, a8 to a1 to h1.
#[inline]
fn quarter_turn((x, y): (i8, i8)) -> (i8, i8) {
    (y, 7 - x)
}

/// Iterator over the occupied squares of a [`Board`], following the
/// occupancy links from the head.
#[derive(Debug, Clone)]
pub struct Pieces<'a> {
    board: &'a Board,
    current: i8,
}

impl<'a> Iterator for Pieces<'a> {
    type Item = (Square, &'a Piece);

    fn next(&mut self) -> Option<Self::Item> {
        let sq = link(self.current)?;
        let slot = &self.board.slots[sq];
        self.current = slot.next;
        slot.piece.as_ref().map(|p| (sq, p))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, VariantNames)]
pub enum Rotation {
    #[strum(serialize = "90")]
    R90,
    #[strum(serialize = "180")]
    R180,
    #[strum(serialize = "270")]
    R270,
}

impl Rotation {
    pub fn quarter_turns(self) -> usize {
        match self {
            Self::R90 => 1,
            Self::R180 => 2,
            Self::R270 => 3,
        }
    }
}

/// Mirror axes, named after the pair of corners they exchange.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, VariantNames)]
pub enum MirrorAxis {
    #[strum(serialize = "a1<-->h1", serialize = "a1↔h1")]
    A1_H1,
    #[strum(serialize = "a1<-->a8", serialize = "a1↔a8")]
    A1_A8,
    #[strum(serialize = "a1<-->h8", serialize = "a1↔h8")]
    A1_H8,
    #[strum(serialize = "h1<-->a8", serialize = "h1↔a8")]
    H1_A8,
}

impl MirrorAxis {
    pub fn reflection(self) -> fn((i8, i8)) -> (i8, i8) {
        match self {
            Self::A1_H1 => |(x, y)| (7 - x, y),
            Self::A1_A8 => |(x, y)| (x, 7 - y),
            Self::A1_H8 => |(x, y)| (y, x),
            Self::H1_A8 => |(x, y)| (7 - y, 7 - x),
        }
    }
}

#[cfg(test)]
fn sample() -> Board {
    use crate::model::{FairySpec, Role};
    [
        (Square::e2, Piece::orthodox("K", Color::WHITE)),
        (Square::b8, Piece::orthodox("B", Color::WHITE)),
        (Square::a7, Piece::orthodox("S", Color::WHITE)),
        (Square::f5, Piece::orthodox("K", Color::BLACK)),
        (Square::a5, Piece::orthodox("R", Color::BLACK)),
        (Square::c3, Piece::new(Role::new("G"), Color::NEUTRAL, [FairySpec::Royal])),
    ]
    .into_iter()
    .collect()
}

/// Walk the links both ways and compare against the slots.
#[cfg(test)]
fn assert_links(board: &Board) {
    let forward: Vec<Square> = board.pieces().map(|(sq, _)| sq).collect();
    assert_eq!(forward.len() as u32, board.occupancy().count_ones());
    assert_eq!(board.head(), forward.first().copied());
    let mut prev = NIL;
    for &sq in &forward {
        assert_eq!(board.slots[sq].prev, prev);
        prev = sq as i8;
    }
    if let Some(&last) = forward.last() {
        assert_eq!(board.slots[last].next, NIL);
    }
    assert_eq!(board.is_empty(), board.head == NIL);
}

#[test]
fn add_drop_links() {
    let mut board = sample();
    assert_links(&board);
    assert_eq!(board.len(), 6);
    assert_eq!(board.head(), Some(Square::c3));

    // middle, head and tail
    assert_eq!(board.drop(Square::f5).map(|p| p.role.to_string()), Some("K".into()));
    assert_links(&board);
    board.drop(Square::c3);
    assert_links(&board);
    board.drop(Square::e2);
    assert_links(&board);
    assert_eq!(board.drop(Square::e2), None);
    assert_eq!(board.len(), 3);

    // replacing an occupant relinks it at the head
    board.add(Piece::orthodox("Q", Color::BLACK), Square::a7);
    assert_links(&board);
    assert_eq!(board.len(), 3);
    assert_eq!(board.head(), Some(Square::a7));
    assert_eq!(board.get(Square::a7), Some(&Piece::orthodox("Q", Color::BLACK)));

    board.clear();
    assert_links(&board);
    assert!(board.is_empty());
}

#[test]
fn rotate_four_times_is_identity() {
    let original = sample();
    let mut board = original.clone();
    for _ in 0..4 {
        board.rotate(Rotation::R90);
        assert_links(&board);
    }
    assert_eq!(board, original);

    board.rotate(Rotation::R90);
    board.rotate(Rotation::R270);
    assert_eq!(board, original);

    let mut twice = original.clone();
    twice.rotate(Rotation::R90);
    twice.rotate(Rotation::R90);
    board.rotate(Rotation::R180);
    assert_eq!(board, twice);
}

#[test]
fn rotate_moves_corners() {
    let mut board = Board::new();
    board.add(Piece::orthodox("K", Color::WHITE), Square::a8);
    board.rotate(Rotation::R90);
    assert_eq!(board.head(), Some(Square::a1));
    board.rotate(Rotation::R90);
    assert_eq!(board.head(), Some(Square::h1));
}

#[test]
fn mirror_twice_is_identity() {
    use strum::IntoEnumIterator;
    let original = sample();
    for axis in MirrorAxis::iter() {
        let mut board = original.clone();
        board.mirror(axis);
        assert_ne!(board, original, "{axis:?}");
        board.mirror(axis);
        assert_eq!(board, original, "{axis:?}");
    }
}

#[test]
fn mirror_exchanges_named_corners() {
    let cases = [
        ("a1<-->h1", Square::a1, Square::h1),
        ("a1<-->a8", Square::a1, Square::a8),
        ("a1↔h8", Square::a1, Square::h8),
        ("h1<-->a8", Square::h1, Square::a8),
    ];
    for (name, from, to) in cases {
        let axis: MirrorAxis = name.parse().unwrap();
        let mut board = Board::new();
        board.add(Piece::orthodox("K", Color::WHITE), from);
        board.mirror(axis);
        assert_eq!(board.head(), Some(to), "{name}");
    }
}

#[test]
fn shift_off_board_drops() {
    let mut board = sample();
    board.shift(8, 0);
    assert!(board.is_empty());
    assert_links(&board);

    let mut board = sample();
    board.shift(1, 0);
    assert_links(&board);
    // h-file is empty in the sample, so nothing falls off
    assert_eq!(board.len(), 6);
    assert_eq!(board.get(Square::f2), Some(&Piece::orthodox("K", Color::WHITE)));

    board.shift(0, -2);
    // b8 and a7 were shifted to c8 and b7, then off the top
    assert_eq!(board.len(), 4);
    assert_eq!(board.get(Square::f4), Some(&Piece::orthodox("K", Color::WHITE)));
}

#[test]
fn invert_colors_keeps_neutrals() {
    let mut board = sample();
    board.invert_colors();
    assert_eq!(board.get(Square::e2).map(|p| p.color), Some(Color::BLACK));
    assert_eq!(board.get(Square::f5).map(|p| p.color), Some(Color::WHITE));
    assert_eq!(board.get(Square::c3).map(|p| p.color), Some(Color::NEUTRAL));
    board.invert_colors();
    assert_eq!(board, sample());
}

#[test]
fn counts_and_legend() {
    let board = sample();
    assert_eq!(board.pieces_count(), "3+2+1");
    assert!(board.has_fairy_pieces());
    let legend = board.legend();
    assert_eq!(legend.len(), 1);
    assert_eq!(legend["Royal Neutral Grasshopper"], vec![Square::c3]);

    let mut board = board;
    board.drop(Square::c3);
    assert_eq!(board.pieces_count(), "3+2");
    assert!(!board.has_fairy_pieces());
    assert!(board.legend().is_empty());
}
