//! Alias alphabet, random alias generation and alias normalization.
//!
//! Characters that are easily confused with each other when read or typed
//! (homoglyphs such as `l`/`1` or `rn`/`m`) are folded onto a single
//! representative. Generated aliases never contain a folded sequence, and
//! aliases typed by users are folded the same way before lookup.

use crate::error::{AppError, AppResult};
use rand::Rng;
use std::collections::BTreeSet;

/// Groups of strings that look alike.
const HOMOGLYPH_GROUPS: &[&[&str]] = &[
    &["rn", "m"],
    &["vv", "w"],
    &["9", "cj", "g"],
    &["ci", "a"],
    &["1", "I", "l"],
    &["c1", "cI", "cl", "d"],
    &["0", "O"],
    &["8", "B"],
    &["2", "z", "Z"],
    &["5", "s", "S"],
    &["6", "b"],
];

/// Build the homoglyph replacement table for a set of characters.
///
/// In each group the replacement is the shortest, then smallest, member made
/// only of `characters`; every other member of the group maps to it. Groups
/// without such a member are skipped.
pub fn homoglyph_replacement_map(characters: &str) -> Vec<(String, String)> {
    let mut replacements = Vec::new();

    for group in HOMOGLYPH_GROUPS {
        let mut candidates: Vec<&str> = group.to_vec();
        candidates.sort_unstable();
        candidates.sort_by_key(|s| s.len());

        let Some(replacement) = candidates
            .iter()
            .find(|s| s.chars().all(|c| characters.contains(c)))
        else {
            continue;
        };

        for member in group.iter().filter(|m| *m != replacement) {
            replacements.push((member.to_string(), replacement.to_string()));
        }
    }

    replacements
}

/// Factory of alias strings for a configured alphabet and length range.
#[derive(Debug, Clone)]
pub struct AliasFactory {
    alphabet: Vec<char>,
    replacements: Vec<(String, String)>,
    min_length: usize,
    max_length: usize,
}

impl AliasFactory {
    /// Create a factory.
    ///
    /// `characters` may contain homoglyphs; they are detected and only one
    /// representative per group ends up in the effective alphabet.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` unless `0 < min_length <= max_length`
    /// and at least two characters remain after homoglyph folding.
    pub fn new(characters: &str, min_length: usize, max_length: usize) -> AppResult<Self> {
        if min_length == 0 || min_length > max_length {
            return Err(AppError::Configuration(format!(
                "The condition 0 < min_length <= max_length is not fulfilled for \
                 min_length = {} and max_length = {}",
                min_length, max_length
            )));
        }

        let mut replacements = homoglyph_replacement_map(characters);
        replacements.sort_by_key(|(from, to)| (from.len(), to.len()));

        let alphabet: Vec<char> = characters
            .chars()
            .filter(|c| {
                !replacements
                    .iter()
                    .any(|(from, _)| from.len() == 1 && from.starts_with(*c))
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if alphabet.len() < 2 {
            return Err(AppError::Configuration(format!(
                "The alias alphabet '{}' leaves fewer than two usable characters",
                characters
            )));
        }

        Ok(Self {
            alphabet,
            replacements,
            min_length,
            max_length,
        })
    }

    /// Characters a new alias may be made of
    pub fn alphabet(&self) -> String {
        self.alphabet.iter().collect()
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    fn replace_homoglyphs(&self, alias: &str) -> String {
        self.replacements
            .iter()
            .fold(alias.to_string(), |acc, (from, to)| acc.replace(from.as_str(), to))
    }

    /// Create a random alias.
    ///
    /// The length is drawn uniformly from the configured range and each
    /// character uniformly from the alphabet. Folding multi-letter homoglyphs
    /// may shorten the string; a result below the minimum length is discarded
    /// and drawn again.
    pub fn create_random(&self) -> String {
        loop {
            let length = rand::rng().random_range(self.min_length..=self.max_length);
            let alias = self.replace_homoglyphs(&nanoid::nanoid!(length, &self.alphabet));
            if alias.chars().count() >= self.min_length {
                return alias;
            }
        }
    }

    /// Normalize a user-supplied alias.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidAlias` if the folded string still contains
    /// characters outside the alphabet.
    pub fn from_string(&self, alias: &str) -> AppResult<String> {
        let folded = self.replace_homoglyphs(alias);

        let unexpected: Vec<String> = folded
            .chars()
            .filter(|c| !self.alphabet.contains(c))
            .map(String::from)
            .collect();

        if !unexpected.is_empty() {
            return Err(AppError::InvalidAlias(format!(
                "'{}' contains unsupported characters: {}",
                folded,
                unexpected.join(", ")
            )));
        }

        Ok(folded)
    }
}
