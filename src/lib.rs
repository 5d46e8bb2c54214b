#![forbid(unsafe_code)]

//! Seeded, reproducible group draws.
//!
//! Competitors are sorted by rank into tiers. A draw shuffles every tier with a deterministic
//! generator and deals the competitors round-robin into the groups, so that each group receives
//! the same number of competitors of every tier. The shuffle is repeated until the number of
//! same-country pairs inside the groups is low enough.

use rand_pcg::Pcg64;

pub mod bias;
pub mod draw;
pub mod rng;
pub mod roster;
pub mod shuffle;

pub use draw::{run, Draw, DrawConfig, DrawError, Grouping};
pub use rng::{KnuthRng, Seeds};
pub use roster::{CompetitorEntry, Roster, RosterError};

type RandGen = Pcg64;

/// A competitor of a draw.
pub trait Competitor {
    /// The rank of the competitor. Competitors with the same rank form a tier.
    fn rank(&self) -> u32;

    /// The country of the competitor.
    fn country(&self) -> &str;
}

impl<C: Competitor> Competitor for &C {
    #[inline]
    fn rank(&self) -> u32 {
        (**self).rank()
    }

    #[inline]
    fn country(&self) -> &str {
        (**self).country()
    }
}

impl<C: Competitor> Competitor for &mut C {
    #[inline]
    fn rank(&self) -> u32 {
        (**self).rank()
    }

    #[inline]
    fn country(&self) -> &str {
        (**self).country()
    }
}
