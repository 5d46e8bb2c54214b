use crate::draw::DrawError;
use crate::Competitor;
use rand::RngCore;
use std::num::NonZero;
use std::ops::Range;
use tracing::trace;

/// A maximal run of consecutive competitors sharing the same rank.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tier {
    /// The rank shared by the competitors of this tier.
    pub rank: u32,
    /// Positions of the tier inside the sequence.
    pub range: Range<usize>,
}

impl Tier {
    #[inline]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Iterator over the tiers of a rank-sorted sequence, see [`tiers`].
#[derive(Clone, Debug)]
pub struct Tiers<'a, T> {
    teams: &'a [T],
    start: usize,
}

impl<T: Competitor> Iterator for Tiers<'_, T> {
    type Item = Tier;

    fn next(&mut self) -> Option<Tier> {
        let tier = tier_at(self.teams, self.start)?;
        self.start = tier.range.end;
        Some(tier)
    }
}

/// The tier starting at position `start`.
fn tier_at<T: Competitor>(teams: &[T], start: usize) -> Option<Tier> {
    let rank = teams.get(start)?.rank();
    let len = teams[start..]
        .iter()
        .take_while(|t| t.rank() == rank)
        .count();
    Some(Tier {
        rank,
        range: start..start + len,
    })
}

/// Splits `teams` into tiers, in sequence order.
#[inline]
pub fn tiers<T: Competitor>(teams: &[T]) -> Tiers<'_, T> {
    Tiers { teams, start: 0 }
}

/// Randomly permutes every tier of `teams` in place, leaving tier boundaries untouched.
///
/// Each tier of `n` competitors consumes exactly `n - 1` values from `rng`. Fails on the first tier
/// whose size isn't a multiple of `number_of_groups`; tiers after it are left as they are.
pub fn shuffle<T: Competitor, R: RngCore + ?Sized>(
    teams: &mut [T],
    number_of_groups: NonZero<usize>,
    rng: &mut R,
) -> Result<(), DrawError> {
    let mut start = 0;
    while let Some(Tier { rank, range }) = tier_at(teams, start) {
        start = range.end;
        let tier = &mut teams[range];
        let size = tier.len();

        trace!(rank, start = start - size, size, "shuffling tier");
        if size % number_of_groups.get() != 0 {
            return Err(DrawError::TierSizeMismatch {
                rank,
                size,
                number_of_groups: number_of_groups.get(),
            });
        }

        for k in 0..size - 1 {
            let l = rng.next_u32() as usize % (size - k);
            tier.swap(k, k + l);
        }
    }
    Ok(())
}
