//! Names the full solver understands beyond pieces and stipulation.
//!
//! Problem options are stored as free-form tokens such as `SetPlay`,
//! `EnPassant e3` or `Imitator a1 h8`. The first word decides what a token
//! is: an engine option when it names one exactly, a fairy condition when
//! it starts the name of one (the engine accepts unambiguous
//! abbreviations, so `Mad` is Madrasi).

use std::sync::LazyLock;

use include_flate::flate;
use indexmap::IndexMap;
use trie_rs::{Trie, TrieBuilder};

flate!(static OPTIONS: str from "conf/options.txt");
flate!(static CONDITIONS: str from "conf/conditions.txt");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Option,
    Condition,
}

pub struct Catalogue {
    /// Lowercase option name to spelling.
    options: IndexMap<String, String>,
    /// Lowercase condition name to spelling.
    conditions: IndexMap<String, String>,
    condition_prefixes: Trie<u8>,
}

impl std::fmt::Debug for Catalogue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalogue")
            .field("options", &self.options.len())
            .field("conditions", &self.conditions.len())
            .finish()
    }
}

fn names(text: &str) -> IndexMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| (l.to_lowercase(), l.to_string()))
        .collect()
}

fn first_word(token: &str) -> &str {
    token.split_whitespace().next().unwrap_or("")
}

impl Catalogue {
    pub fn new(options: &str, conditions: &str) -> Self {
        let options = names(options);
        let conditions = names(conditions);
        let mut builder = TrieBuilder::new();
        for name in conditions.keys() {
            builder.push(name);
        }
        Self {
            options,
            conditions,
            condition_prefixes: builder.build(),
        }
    }

    /// The catalogue compiled into the crate.
    pub fn builtin() -> &'static Self {
        &CATALOGUE
    }

    /// Whether the token is an engine option, e.g. `EnPassant e3`.
    pub fn is_option(&self, token: &str) -> bool {
        self.options
            .contains_key(&first_word(token).to_lowercase())
    }

    /// Condition names the word abbreviates, in their usual spelling.
    pub fn conditions_starting_with(&self, word: &str) -> Vec<&str> {
        let word = word.trim().to_lowercase();
        if word.is_empty() {
            return vec![];
        }
        let found: Vec<String> = self.condition_prefixes.predictive_search(&word).collect();
        found
            .iter()
            .filter_map(|k| self.conditions.get(k).map(String::as_str))
            .collect()
    }

    pub fn is_condition_start(&self, word: &str) -> bool {
        !self.conditions_starting_with(word).is_empty()
    }

    /// Classify an option token by its first word.
    pub fn classify(&self, token: &str) -> Option<TokenKind> {
        if self.is_option(token) {
            Some(TokenKind::Option)
        } else if self.is_condition_start(first_word(token)) {
            Some(TokenKind::Condition)
        } else {
            None
        }
    }

    /// Group loose words into condition tokens: every word that starts a
    /// condition name opens a new token, other words are its arguments.
    /// Words before the first condition form a token of their own.
    pub fn group_conditions<'a>(&self, words: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut conditions = vec![];
        let mut acc: Vec<&str> = vec![];
        for word in words.into_iter().map(str::trim).filter(|w| !w.is_empty()) {
            if self.is_condition_start(word) && !acc.is_empty() {
                conditions.push(acc.join(" "));
                acc.clear();
            }
            acc.push(word);
        }
        if !acc.is_empty() {
            conditions.push(acc.join(" "));
        }
        conditions
    }
}

static CATALOGUE: LazyLock<Catalogue> = LazyLock::new(|| Catalogue::new(&OPTIONS, &CONDITIONS));

#[test]
fn options_and_conditions() {
    let c = Catalogue::builtin();
    assert!(c.is_option("SetPlay"));
    assert!(c.is_option("enpassant e3"));
    assert!(!c.is_option("Circe"));
    assert_eq!(c.classify("Circe"), Some(TokenKind::Condition));
    assert_eq!(c.classify("mad"), Some(TokenKind::Condition));
    assert_eq!(c.classify("Imitator a1 h8"), Some(TokenKind::Condition));
    assert_eq!(c.classify("NoBoard"), Some(TokenKind::Option));
    assert_eq!(c.classify("Frobnicate"), None);
    assert_eq!(c.classify(""), None);
    assert_eq!(c.conditions_starting_with("madr"), ["Madrasi"]);
    let mut circes = c.conditions_starting_with("circe");
    circes.sort();
    assert_eq!(circes, ["Circe", "CirceAssassin", "CirceMalefique"]);
}

#[test]
fn grouping_words() {
    let c = Catalogue::builtin();
    assert_eq!(
        c.group_conditions("Circe  Imitator a1 h8 Madrasi".split(' ')),
        ["Circe", "Imitator a1 h8", "Madrasi"]
    );
    assert_eq!(c.group_conditions("a1 Circe".split(' ')), ["a1", "Circe"]);
    assert!(c.group_conditions([]).is_empty());
}
