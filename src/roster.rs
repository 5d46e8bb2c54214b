use crate::Competitor;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Default path of the team file.
pub const DEFAULT_TEAM_FILE: &str = "teams.txt";

/// A competitor read from a team file.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, Hash)]
pub struct CompetitorEntry {
    pub rank: u32,
    pub country: String,
    pub name: String,
}

impl CompetitorEntry {
    #[inline]
    pub fn new(rank: u32, country: impl Into<String>, name: impl Into<String>) -> Self {
        CompetitorEntry {
            rank,
            country: country.into(),
            name: name.into(),
        }
    }
}

impl Competitor for CompetitorEntry {
    #[inline]
    fn rank(&self) -> u32 {
        self.rank
    }

    #[inline]
    fn country(&self) -> &str {
        &self.country
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RosterError {
    /// The team file couldn't be read.
    #[error("couldn't read the team file: {0}")]
    Io(#[from] std::io::Error),
    /// A line starting with a digit isn't a `<rank> <country> <name>` entry.
    #[error("malformed entry at line {line}")]
    Malformed { line: usize },
    /// A line is neither an entry, a comment nor empty.
    #[error("junk at line {line}")]
    Junk { line: usize },
    /// An entry has a lower rank than the previous one.
    #[error("non-monotonic rank at line {line}")]
    NonMonotonicRank { line: usize },
    /// The team file has no entries.
    #[error("no teams found")]
    Empty,
}

/// The competitors of a team file, sorted by rank.
///
/// Every line of a team file is either:
/// - an entry `<rank> <country> <name>` (the line starts with a digit)
/// - a comment (the line starts with `#`)
/// - empty
#[derive(Serialize, Clone, Debug, Default, Eq, PartialEq)]
#[serde(transparent)]
pub struct Roster {
    entries: Vec<CompetitorEntry>,
}

impl Roster {
    /// Parses the content of a team file.
    pub fn parse(content: &str) -> Result<Self, RosterError> {
        let mut entries: Vec<CompetitorEntry> = Vec::new();

        for (i, text) in content.lines().enumerate() {
            let line = i + 1;
            match text.chars().next() {
                Some(c) if c.is_ascii_digit() => {
                    let entry = parse_entry(text).ok_or(RosterError::Malformed { line })?;
                    if entries.last().is_some_and(|last| entry.rank < last.rank) {
                        return Err(RosterError::NonMonotonicRank { line });
                    }
                    entries.push(entry);
                }
                Some('#') => {}
                _ if text.trim().is_empty() => {}
                _ => return Err(RosterError::Junk { line }),
            }
        }

        if entries.is_empty() {
            return Err(RosterError::Empty);
        }
        Ok(Roster { entries })
    }

    /// Reads and parses a team file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RosterError> {
        let path = path.as_ref();
        let roster = Self::parse(&fs::read_to_string(path)?)?;
        debug!(path = %path.display(), teams = roster.len(), "loaded team file");
        Ok(roster)
    }

    #[inline]
    pub fn entries(&self) -> &[CompetitorEntry] {
        &self.entries
    }

    #[inline]
    pub fn entries_mut(&mut self) -> &mut [CompetitorEntry] {
        &mut self.entries
    }

    #[inline]
    pub fn into_entries(self) -> Vec<CompetitorEntry> {
        self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromStr for Roster {
    type Err = RosterError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Tokens after the name are ignored
fn parse_entry(text: &str) -> Option<CompetitorEntry> {
    let mut tokens = text.split_whitespace();
    let rank = tokens.next()?.parse().ok()?;
    let country = tokens.next()?;
    let name = tokens.next()?;
    Some(CompetitorEntry::new(rank, country, name))
}
