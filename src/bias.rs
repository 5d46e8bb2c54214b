use crate::Competitor;
use indexmap::IndexMap;
use itertools::Itertools;
use std::num::NonZero;

/// Returns the members of group `group`, i.e. every `number_of_groups`-th competitor starting at
/// position `group`. Empty if `group` isn't lower than `number_of_groups`.
#[inline]
pub fn group_members<T>(
    teams: &[T],
    group: usize,
    number_of_groups: NonZero<usize>,
) -> impl Iterator<Item = &T> + Clone {
    let teams = if group < number_of_groups.get() {
        teams
    } else {
        &[]
    };
    teams.iter().skip(group).step_by(number_of_groups.get())
}

/// Counts the pairs of competitors from the same country that share a group.
pub fn score<T: Competitor>(teams: &[T], number_of_groups: NonZero<usize>) -> usize {
    (0..number_of_groups.get())
        .map(|group| {
            group_members(teams, group, number_of_groups)
                .tuple_combinations()
                .filter(|(t1, t2)| t1.country() == t2.country())
                .count()
        })
        .sum()
}

/// Returns the countries appearing more than once in group `group`, with the number of their
/// competitors in it, in order of first appearance.
pub fn conflicts<T: Competitor>(
    teams: &[T],
    group: usize,
    number_of_groups: NonZero<usize>,
) -> IndexMap<&str, usize> {
    let mut countries: IndexMap<&str, usize> = IndexMap::new();
    for team in group_members(teams, group, number_of_groups) {
        *countries.entry(team.country()).or_default() += 1;
    }
    countries.retain(|_, count| *count > 1);
    countries
}
