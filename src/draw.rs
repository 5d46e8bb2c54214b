use crate::bias;
use crate::rng::{KnuthRng, Seeds};
use crate::shuffle::{self, tiers};
use crate::Competitor;
use indexmap::IndexMap;
use itertools::Itertools;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::num::NonZero;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Default number of groups.
pub const DEFAULT_NUMBER_OF_GROUPS: NonZero<usize> = match NonZero::new(2) {
    Some(n) => n,
    None => panic!("the default number of groups is 0"),
};

/// Default maximum country bias accepted by a draw.
pub const DEFAULT_MAX_BIAS: usize = 0;

#[derive(Error, Debug)]
#[cfg_attr(test, derive(Eq, PartialEq))]
#[non_exhaustive]
pub enum DrawError {
    /// The number of groups isn't a positive integer.
    #[error("invalid number of groups: {0:?}")]
    InvalidGroupCount(String),
    /// A seed isn't an unsigned 32-bit integer.
    #[error("invalid seed: {0:?}")]
    InvalidSeed(String),
    /// The size of a tier isn't a multiple of the number of groups.
    #[error("teams at rank {rank} ({size}) not divisible by the number of groups ({number_of_groups}), add dummy entries if needed")]
    TierSizeMismatch {
        rank: u32,
        size: usize,
        number_of_groups: usize,
    },
    /// There are no competitors to draw.
    #[error("no competitors to draw")]
    EmptyOrUnreadableInput,
    /// Competitors aren't sorted by rank.
    #[error("non-monotonic rank at position {position}")]
    NonMonotonicRank { position: usize },
    /// No draw met the bias limit within the allowed attempts.
    #[error("no draw with an acceptable country bias after {attempts} attempts (lowest bias: {lowest_bias})")]
    AttemptsExhausted { attempts: u64, lowest_bias: usize },
}

/// Parses a number of groups.
pub fn parse_group_count(s: &str) -> Result<NonZero<usize>, DrawError> {
    s.trim()
        .parse::<NonZero<usize>>()
        .map_err(|_| DrawError::InvalidGroupCount(s.to_owned()))
}

/// Configuration of a draw.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(default)]
pub struct DrawConfig {
    /// Number of groups the competitors are split into.
    pub number_of_groups: NonZero<usize>,
    /// Seeds of the random generator.
    pub seeds: Seeds,
    /// Highest accepted country bias (see [`bias::score`]).
    pub max_bias: usize,
    /// Maximum number of shuffles before giving up. [`None`] retries forever.
    pub max_attempts: Option<NonZero<u64>>,
}

impl Default for DrawConfig {
    #[inline]
    fn default() -> Self {
        DrawConfig {
            number_of_groups: DEFAULT_NUMBER_OF_GROUPS,
            seeds: Seeds::default(),
            max_bias: DEFAULT_MAX_BIAS,
            max_attempts: None,
        }
    }
}

/// A draw in progress. Owns the random generator and the competitors until the draw is over.
#[derive(Debug)]
pub struct Draw<'a, T: Competitor, R: RngCore = KnuthRng> {
    teams: &'a mut [T],
    rng: R,
    number_of_groups: NonZero<usize>,
    max_bias: usize,
    max_attempts: Option<NonZero<u64>>,
}

impl<'a, T: Competitor> Draw<'a, T> {
    /// Creates a draw seeded with the configured seeds.
    #[inline]
    pub fn new(teams: &'a mut [T], config: &DrawConfig) -> Result<Self, DrawError> {
        Self::with_rng(teams, config, KnuthRng::new(config.seeds))
    }
}

impl<'a, T: Competitor, R: RngCore> Draw<'a, T, R> {
    /// Creates a draw using `rng`. The seeds of `config` are ignored.
    pub fn with_rng(teams: &'a mut [T], config: &DrawConfig, rng: R) -> Result<Self, DrawError> {
        if teams.is_empty() {
            return Err(DrawError::EmptyOrUnreadableInput);
        }
        if let Some(i) = teams
            .iter()
            .tuple_windows()
            .position(|(prev, next)| prev.rank() > next.rank())
        {
            return Err(DrawError::NonMonotonicRank { position: i + 1 });
        }

        debug!(
            teams = teams.len(),
            tiers = tiers(teams).count(),
            number_of_groups = config.number_of_groups.get(),
            max_bias = config.max_bias,
            "preparing draw"
        );

        Ok(Draw {
            teams,
            rng,
            number_of_groups: config.number_of_groups,
            max_bias: config.max_bias,
            max_attempts: config.max_attempts,
        })
    }

    /// Runs the draw. See [`Draw::run_with_progress`].
    #[inline]
    pub fn run(self) -> Result<Grouping<'a, T>, DrawError> {
        self.run_with_progress(|_, _| {})
    }

    /// Shuffles the competitors until their country bias is at most the configured maximum.
    ///
    /// `progress` is called after every attempt with the attempt number (starting from 1) and its
    /// bias. Tier size errors are returned immediately without retrying.
    pub fn run_with_progress<F>(mut self, mut progress: F) -> Result<Grouping<'a, T>, DrawError>
    where
        F: FnMut(u64, usize),
    {
        let mut attempts = 0u64;
        let mut lowest_bias = usize::MAX;
        loop {
            shuffle::shuffle(self.teams, self.number_of_groups, &mut self.rng)?;
            let bias = bias::score(self.teams, self.number_of_groups);
            attempts += 1;
            lowest_bias = lowest_bias.min(bias);
            trace!(attempt = attempts, bias, "draw attempt");
            progress(attempts, bias);

            if bias <= self.max_bias {
                info!(attempts, bias, "draw accepted");
                return Ok(Grouping {
                    teams: self.teams,
                    number_of_groups: self.number_of_groups,
                    bias,
                    attempts,
                });
            }

            if self
                .max_attempts
                .is_some_and(|max_attempts| attempts >= max_attempts.get())
            {
                warn!(attempts, lowest_bias, "giving up draw");
                return Err(DrawError::AttemptsExhausted {
                    attempts,
                    lowest_bias,
                });
            }
        }
    }
}

/// Runs a draw of `teams` into `number_of_groups` groups, retrying until the country bias is at
/// most `max_bias`.
pub fn run<T: Competitor>(
    teams: &mut [T],
    number_of_groups: usize,
    seed0: u32,
    seed1: u32,
    max_bias: usize,
) -> Result<Grouping<'_, T>, DrawError> {
    let number_of_groups = NonZero::new(number_of_groups)
        .ok_or_else(|| DrawError::InvalidGroupCount(number_of_groups.to_string()))?;
    let config = DrawConfig {
        number_of_groups,
        seeds: Seeds::new(seed0, seed1),
        max_bias,
        max_attempts: None,
    };
    Draw::new(teams, &config)?.run()
}

/// The accepted result of a draw.
///
/// Group `g` is made of the competitors at positions `g`, `g + n`, `g + 2n`, ... where `n` is the
/// number of groups.
#[derive(Debug)]
pub struct Grouping<'a, T> {
    teams: &'a [T],
    number_of_groups: NonZero<usize>,
    bias: usize,
    attempts: u64,
}

impl<'a, T: Competitor> Grouping<'a, T> {
    /// The competitors in drawn order.
    #[inline]
    pub fn teams(&self) -> &'a [T] {
        self.teams
    }

    #[inline]
    pub fn number_of_groups(&self) -> NonZero<usize> {
        self.number_of_groups
    }

    /// Country bias of the accepted draw.
    #[inline]
    pub fn bias(&self) -> usize {
        self.bias
    }

    /// Number of shuffles performed, including the accepted one.
    #[inline]
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Members of group `group`. Empty if `group` is out of range.
    #[inline]
    pub fn group(&self, group: usize) -> impl Iterator<Item = &'a T> + Clone {
        bias::group_members(self.teams, group, self.number_of_groups)
    }

    /// Every group, in order.
    pub fn groups(&self) -> impl Iterator<Item = impl Iterator<Item = &'a T> + Clone> + '_ {
        (0..self.number_of_groups.get()).map(move |group| self.group(group))
    }

    /// Countries with more than one competitor in group `group`.
    #[inline]
    pub fn conflicts(&self, group: usize) -> IndexMap<&'a str, usize> {
        bias::conflicts(self.teams, group, self.number_of_groups)
    }
}
