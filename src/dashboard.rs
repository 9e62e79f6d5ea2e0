//! Atomic dashboard snapshot
//!
//! The consistent bundle of all dashboard-derived data at one point in
//! time. The aggregator in [`coach`](crate::coach) replaces the whole
//! snapshot as one indivisible unit or leaves it untouched.

use crate::service::types::{Goal, Group, LeaderboardEntry, SavingsStats, Transaction, UserProfile};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub profile: UserProfile,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub savings: SavingsStats,
    pub transactions: Vec<Transaction>,
    pub goals: Vec<Goal>,
    pub groups: Vec<Group>,
}

impl DashboardSnapshot {
    /// One-based leaderboard rank of the snapshot's own user, if listed
    pub fn own_rank(&self) -> Option<usize> {
        self.leaderboard
            .iter()
            .position(|entry| entry.id == self.profile.id)
            .map(|index| index + 1)
    }
}
