//! Reassignment and swap moves on city roles.

use crate::problem::{Problem, Role};
use crate::solution::Solution;

/// One neighbor of the current assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    SetPrimary { city: usize, location: usize },
    SetSecondary { city: usize, location: usize },
    /// Exchange the primaries of two cities
    SwapPrimaryPrimary { city_a: usize, city_b: usize },
    /// Exchange the secondaries of two cities
    SwapSecondarySecondary { city_a: usize, city_b: usize },
    /// Exchange the primary of `primary_city` with the secondary of `secondary_city`
    SwapPrimarySecondary {
        primary_city: usize,
        secondary_city: usize,
    },
}

/// A single role change caused by a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleChange {
    pub city: usize,
    pub role: Role,
    pub from: Option<usize>,
    pub to: Option<usize>,
}

/// The (at most two) role changes of a move.
#[derive(Debug, Clone, Copy)]
pub struct Changes {
    items: [Option<RoleChange>; 2],
}

impl Changes {
    fn one(change: RoleChange) -> Self {
        Changes {
            items: [Some(change), None],
        }
    }

    fn two(first: RoleChange, second: RoleChange) -> Self {
        Changes {
            items: [Some(first), Some(second)],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoleChange> {
        self.items.iter().flatten()
    }
}

impl Move {
    /// Role changes this move would make in `state`.
    pub fn changes(&self, state: &Solution) -> Changes {
        match *self {
            Move::SetPrimary { city, location } => Changes::one(RoleChange {
                city,
                role: Role::Primary,
                from: state.assignment(city).primary,
                to: Some(location),
            }),
            Move::SetSecondary { city, location } => Changes::one(RoleChange {
                city,
                role: Role::Secondary,
                from: state.assignment(city).secondary,
                to: Some(location),
            }),
            Move::SwapPrimaryPrimary { city_a, city_b } => {
                swap_changes(state, city_a, Role::Primary, city_b, Role::Primary)
            }
            Move::SwapSecondarySecondary { city_a, city_b } => {
                swap_changes(state, city_a, Role::Secondary, city_b, Role::Secondary)
            }
            Move::SwapPrimarySecondary {
                primary_city,
                secondary_city,
            } => swap_changes(
                state,
                primary_city,
                Role::Primary,
                secondary_city,
                Role::Secondary,
            ),
        }
    }

    /// Apply the move, returning the changes that were made.
    pub fn apply(&self, problem: &Problem, state: &mut Solution) -> Changes {
        let changes = self.changes(state);
        for change in changes.iter() {
            state.assign(problem, change.city, change.role, change.to);
        }
        changes
    }
}

fn swap_changes(state: &Solution, city_a: usize, role_a: Role, city_b: usize, role_b: Role) -> Changes {
    let loc_a = state.assignment(city_a).get(role_a);
    let loc_b = state.assignment(city_b).get(role_b);

    Changes::two(
        RoleChange {
            city: city_a,
            role: role_a,
            from: loc_a,
            to: loc_b,
        },
        RoleChange {
            city: city_b,
            role: role_b,
            from: loc_b,
            to: loc_a,
        },
    )
}
