//! # Stipulations
//!
//! The stipulation states what has to be achieved and in how many moves.
//! The subset understood here is
//!
//! ```text
//! [s|h] (#|=) <moves> [.5]
//! ```
//!
//! - no prefix: a direct problem, white plays and achieves the goal
//! - `s`: selfmate, white forces black to achieve the goal
//! - `h`: helpmate, black plays first and both sides cooperate
//! - `#` is mate, `=` is stalemate
//! - `.5` adds a half-move, which for helpmates means white starts
//!
//! Anything else (series-movers, reflexmates, ...) is not recognized. The
//! engines that need a structured stipulation refuse such problems rather
//! than guess.

use std::{str::FromStr, sync::LazyLock};

use regex::Regex;
use strum::{Display, EnumIs};

static STIPULATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([sShH]?)([#=])(\d+)(\.5)?$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, Display)]
pub enum PlayType {
    #[strum(serialize = "")]
    Direct,
    #[strum(serialize = "s")]
    Selfmate,
    #[strum(serialize = "h")]
    Helpmate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, Display)]
pub enum Goal {
    #[strum(serialize = "#")]
    Mate,
    #[strum(serialize = "=")]
    Stalemate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Side {
    #[strum(serialize = "w")]
    White,
    #[strum(serialize = "b")]
    Black,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported stipulation {0:?}")]
pub struct UnsupportedStipulation(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stipulation {
    pub play: PlayType,
    pub goal: Goal,
    /// The number as written.
    pub move_count: u32,
    pub half_move: bool,
}

impl Stipulation {
    /// Whole moves including the one the half-move marker leaves out.
    pub fn full_moves(&self) -> u32 {
        self.move_count + u32::from(!self.half_move)
    }

    /// Black starts a helpmate in whole moves, white everything else.
    pub fn side_to_play(&self) -> Side {
        if self.play.is_helpmate() && !self.half_move {
            Side::Black
        } else {
            Side::White
        }
    }
}

impl FromStr for Stipulation {
    type Err = UnsupportedStipulation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || UnsupportedStipulation(s.to_string());
        let caps = STIPULATION.captures(s.trim()).ok_or_else(unsupported)?;
        let play = match caps[1].to_ascii_lowercase().as_str() {
            "s" => PlayType::Selfmate,
            "h" => PlayType::Helpmate,
            _ => PlayType::Direct,
        };
        let goal = match &caps[2] {
            "#" => Goal::Mate,
            _ => Goal::Stalemate,
        };
        let move_count: u32 = caps[3].parse().map_err(|_| unsupported())?;
        if move_count == 0 {
            return Err(unsupported());
        }
        Ok(Self {
            play,
            goal,
            move_count,
            half_move: caps.get(4).is_some(),
        })
    }
}

impl std::fmt::Display for Stipulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.play, self.goal, self.move_count)?;
        if self.half_move {
            f.write_str(".5")?;
        }
        Ok(())
    }
}

#[test]
fn helpmate() {
    let s: Stipulation = "h#3".parse().unwrap();
    assert_eq!(s.play, PlayType::Helpmate);
    assert_eq!(s.goal, Goal::Mate);
    assert_eq!(s.move_count, 3);
    assert_eq!(s.side_to_play(), Side::Black);
    assert_eq!(s.to_string(), "h#3");

    let s: Stipulation = "H#2.5".parse().unwrap();
    assert_eq!(s.play, PlayType::Helpmate);
    assert!(s.half_move);
    assert_eq!(s.full_moves(), 2);
    assert_eq!(s.side_to_play(), Side::White);
}

#[test]
fn direct_and_self() {
    let s: Stipulation = "s#2".parse().unwrap();
    assert_eq!(s.play, PlayType::Selfmate);
    assert_eq!(s.move_count, 2);
    assert_eq!(s.side_to_play(), Side::White);

    let s: Stipulation = " #2.5 ".parse().unwrap();
    assert_eq!(s.play, PlayType::Direct);
    assert_eq!(s.full_moves(), 2);
    assert_eq!(s.side_to_play(), Side::White);

    let s: Stipulation = "=3".parse().unwrap();
    assert_eq!(s.goal, Goal::Stalemate);
    assert_eq!(s.full_moves(), 4);
    assert_eq!(s.side_to_play().to_string(), "w");
}

#[test]
fn unsupported() {
    for text in ["", "#", "hs#3", "ser-h#5", "h#3.0", "x#2", "#0", "#99999999999", "h #3"] {
        assert_eq!(
            text.parse::<Stipulation>(),
            Err(UnsupportedStipulation(text.to_string())),
            "{text}"
        );
    }
}
