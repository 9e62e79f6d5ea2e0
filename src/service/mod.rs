//! Remote data-service capability
//!
//! Abstract contract for every remote read and write the coach performs,
//! decoupling the core from the concrete transport behind it. Any call may
//! fail with a classified [`CoachError`](crate::CoachError), including the
//! `Unauthenticated` cause that forces a logout.

pub mod demo;
pub mod types;

pub use types::{
    Advice, Goal, Group, LeaderboardEntry, NewTransaction, ParsedTransaction, ProfileUpdate,
    SavingsStats, Transaction, UserProfile,
};

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait FinanceService: Send + Sync {
    async fn fetch_profile(&self) -> Result<UserProfile>;

    async fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>>;

    async fn fetch_savings_stats(&self) -> Result<SavingsStats>;

    async fn fetch_transactions(&self) -> Result<Vec<Transaction>>;

    async fn fetch_goals(&self) -> Result<Vec<Goal>>;

    async fn fetch_groups(&self) -> Result<Vec<Group>>;

    async fn add_transaction(&self, tx: NewTransaction) -> Result<Transaction>;

    async fn add_goal(&self, title: &str, target: &str) -> Result<Goal>;

    async fn add_goal_progress(&self, goal_id: &str, amount: f64) -> Result<Goal>;

    async fn create_group(&self, name: &str) -> Result<Group>;

    async fn join_group(&self, code: &str) -> Result<Group>;

    async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile>;

    /// Fetch one piece of advice; uses the ambient session implicitly
    async fn get_ai_advice(&self) -> Result<Advice>;

    /// Parse free-form expense text into transaction fields
    ///
    /// Fails with `ParseFailure` when the text does not match the expense
    /// grammar; the caller recovers locally with a hint message.
    async fn parse_text_to_transaction(&self, text: &str) -> Result<ParsedTransaction>;
}
