/// # The 'mailbox' representaiton of a chessboard.
///
/// This is the simple and most obvious representation,
/// using a separate value in an array for each square, a so-called
/// 'board'-centric representation.
///
/// This module in particular is a generalized version allowing any
/// values, not just `Option<Piece>` to fill the squares. The
/// [`Board`](crate::model::Board) keeps its occupancy links in one.
use std::ops::{Index, IndexMut};

use crate::model::Square;

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct Mailbox<T>(pub [T; 64]);

impl<T> Mailbox<T> {
    /// Obtain a bit mask representing which squares the predicate
    /// returns true for. Bit `n` is square index `n`.
    pub fn mask(&self, mut p: impl FnMut(Square, &T) -> bool) -> u64 {
        let mut res = 0;
        for ix in 0..=63 {
            if p(Square::from_u8(ix as u8), &self.0[ix]) {
                res |= 1 << ix;
            }
        }
        res
    }

    /// Iterate over all squares with their contents, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Square, &T)> {
        self.0
            .iter()
            .enumerate()
            .map(|(ix, t)| (Square::from_u8(ix as u8), t))
    }
}

impl<T> Index<Square> for Mailbox<T> {
    type Output = T;

    #[inline]
    fn index(&self, sq: Square) -> &T {
        &self.0[sq.ix()]
    }
}

impl<T> IndexMut<Square> for Mailbox<T> {
    #[inline]
    fn index_mut(&mut self, sq: Square) -> &mut T {
        &mut self.0[sq.ix()]
    }
}

#[test]
fn mailbox_mask() {
    let mut mb = Mailbox([false; 64]);
    mb[Square::a8] = true;
    mb[Square::h1] = true;
    assert_eq!(mb.mask(|_, b| *b), 1 | 1 << 63);
    assert_eq!(mb.iter().filter(|(_, b)| **b).count(), 2);
}
