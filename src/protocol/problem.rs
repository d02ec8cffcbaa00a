//! Everything about a problem that is not on the board.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    model::{Board, Square},
    notation::{
        Parsable,
        stipulation::{Stipulation, UnsupportedStipulation},
    },
    protocol::catalogue::{Catalogue, TokenKind},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Problem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stipulation: Option<String>,
    /// Written as `SStipulation` for the full solver.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub structured_stipulation: bool,
    /// Option and condition tokens, e.g. `SetPlay`, `EnPassant e3`, `Circe`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Twins::is_empty")]
    pub twins: Twins,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intended_solutions: Option<String>,
}

impl Problem {
    pub fn with_stipulation(stipulation: &str) -> Self {
        Self {
            stipulation: Some(stipulation.to_string()),
            ..Self::default()
        }
    }

    pub fn stipulation(&self) -> Result<Stipulation, UnsupportedStipulation> {
        self.stipulation.as_deref().unwrap_or("").parse()
    }

    /// Remove the token if present, append it otherwise.
    pub fn toggle_option(&mut self, token: &str) {
        let token = token.trim();
        match self.options.iter().position(|o| o.eq_ignore_ascii_case(token)) {
            Some(ix) => {
                self.options.remove(ix);
            }
            None => self.options.push(token.to_string()),
        }
    }

    /// Any token that is not a plain engine option.
    pub fn has_fairy_conditions(&self) -> bool {
        let catalogue = Catalogue::builtin();
        self.options
            .iter()
            .any(|o| catalogue.classify(o) != Some(TokenKind::Option))
    }

    /// The square named by an `EnPassant <square>` option.
    pub fn en_passant(&self) -> Option<Square> {
        self.options.iter().find_map(|o| {
            let mut words = o.split_whitespace();
            let option = words.next()?;
            if !option.eq_ignore_ascii_case("enpassant") {
                return None;
            }
            Square::parse_exact(words.next()?)
        })
    }
}

/// Fairy pieces on the board or fairy conditions in the options.
pub fn has_fairy_elements(board: &Board, problem: &Problem) -> bool {
    board.has_fairy_pieces() || problem.has_fairy_conditions()
}

/// Twin letter to the changes that produce it.
///
/// Twin `a` is the zero position: the diagram itself is not part of the
/// solution and only serves as the base for the other twins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Twins(pub BTreeMap<String, String>);

impl Twins {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read twins as written under a diagram, one per line:
    ///
    /// ```text
    /// b) Remove a7
    /// c) Rotate 90
    /// ```
    ///
    /// The first word of every line is the label and is dropped; letters are
    /// assigned in order, starting at `a` when the first line starts with
    /// "zero" and at `b` otherwise. Lines past `z` are ignored.
    pub fn parse_block(text: &str) -> Self {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty()).peekable();
        let zero = lines
            .peek()
            .is_some_and(|l| l.trim_start().to_lowercase().starts_with("zero"));
        let first = if zero { b'a' } else { b'b' };
        let twins = (first..=b'z')
            .zip(lines)
            .map(|(letter, line)| {
                let changes: Vec<&str> = line.split_whitespace().skip(1).collect();
                ((letter as char).to_string(), changes.join(" "))
            })
            .collect();
        Self(twins)
    }

    pub fn zero_position(&self) -> Option<&str> {
        self.0.get("a").map(String::as_str)
    }

    /// Twins `b` to `z` in letter order.
    pub fn successive(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(k, _)| k.as_str() != "a")
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl std::fmt::Display for Twins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (k, v) in &self.0 {
            if !first {
                f.write_str("\n")?;
            }
            first = false;
            write!(f, "{k}: {v}")?;
        }
        Ok(())
    }
}

#[test]
fn options() {
    let mut problem = Problem::with_stipulation("#2");
    problem.toggle_option("SetPlay");
    problem.toggle_option("EnPassant e3");
    assert!(!problem.has_fairy_conditions());
    assert_eq!(problem.en_passant(), Some(Square::e3));

    problem.toggle_option("Circe");
    assert!(problem.has_fairy_conditions());
    problem.toggle_option("circe");
    assert!(!problem.has_fairy_conditions());
    assert_eq!(problem.options, ["SetPlay", "EnPassant e3"]);

    problem.toggle_option("Frobnicate");
    assert!(problem.has_fairy_conditions());
}

#[test]
fn twins_block() {
    let twins = Twins::parse_block("b) Remove a7\n\nc) Rotate 90\n");
    assert_eq!(twins.zero_position(), None);
    assert_eq!(
        twins.successive().collect::<Vec<_>>(),
        [("b", "Remove a7"), ("c", "Rotate 90")]
    );
    assert_eq!(twins.to_string(), "b: Remove a7\nc: Rotate 90");

    let twins = Twins::parse_block("Zero: Move e2 e4\nb) Exchange a1 h8");
    assert_eq!(twins.zero_position(), Some("Move e2 e4"));
    assert_eq!(twins.successive().count(), 1);

    assert!(Twins::parse_block("").is_empty());
}

#[test]
fn problem_toml() {
    let mut problem = Problem::with_stipulation("h#2");
    problem.options.push("Circe".into());
    problem.twins = Twins::parse_block("b) Remove a7");
    let text = toml::to_string(&problem).unwrap();
    assert!(text.contains("stipulation = \"h#2\""), "{text}");
    assert!(!text.contains("structured-stipulation"), "{text}");
    let back: Problem = toml::from_str(&text).unwrap();
    assert_eq!(back, problem);
    assert_eq!(toml::from_str::<Problem>("").unwrap(), Problem::default());
}
