//! In-memory demo service
//!
//! A functional [`FinanceService`] with no network behind it, used by the
//! demo binary's guest mode. State lives in memory for the lifetime of the
//! process.

use super::types::{
    Advice, Goal, Group, LeaderboardEntry, NewTransaction, ParsedTransaction, ProfileUpdate,
    SavingsStats, Transaction, UserProfile,
};
use super::FinanceService;
use crate::{CoachError, Result};
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Extracts the amount following a currency marker, e.g. "Rs 500"
static AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)rs\.?\s?(\d+(?:\.\d+)?)").expect("valid amount pattern"));

const CANNED_ADVICE: &[&str] = &[
    "Small daily expenses add up. Try logging every chai and snack this week.",
    "You're doing fine. Consider moving 10% of your balance into a goal.",
    "Review your biggest spending category and set a soft cap for it.",
    "Keep a 3-month expense buffer before chasing bigger goals.",
];

pub struct DemoService {
    profile: RwLock<UserProfile>,
    transactions: RwLock<Vec<Transaction>>,
    goals: RwLock<Vec<Goal>>,
    groups: RwLock<Vec<Group>>,
    advice_cursor: AtomicUsize,
}

impl DemoService {
    pub fn new() -> Self {
        Self {
            profile: RwLock::new(UserProfile {
                id: "user_1".to_string(),
                name: "Guest".to_string(),
                email: None,
                points: 120,
                mood_state: None,
                income: Some(30000.0),
                budget_limit: Some(20000.0),
            }),
            transactions: RwLock::new(Vec::new()),
            goals: RwLock::new(Vec::new()),
            groups: RwLock::new(Vec::new()),
            advice_cursor: AtomicUsize::new(0),
        }
    }

    fn total_spent(&self) -> f64 {
        self.transactions.read().iter().map(|tx| tx.amount).sum()
    }
}

impl Default for DemoService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FinanceService for DemoService {
    async fn fetch_profile(&self) -> Result<UserProfile> {
        Ok(self.profile.read().clone())
    }

    async fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let me = self.profile.read().clone();
        let mut board = vec![
            LeaderboardEntry {
                id: "user_7".to_string(),
                name: "Asha".to_string(),
                points: 340,
            },
            LeaderboardEntry {
                id: me.id,
                name: me.name,
                points: me.points,
            },
            LeaderboardEntry {
                id: "user_3".to_string(),
                name: "Ravi".to_string(),
                points: 95,
            },
        ];
        board.sort_by(|a, b| b.points.cmp(&a.points));
        Ok(board)
    }

    async fn fetch_savings_stats(&self) -> Result<SavingsStats> {
        let profile = self.profile.read().clone();
        let spent = self.total_spent();
        let income = profile.income.unwrap_or(0.0);
        let budget = profile.budget_limit.unwrap_or(income);
        Ok(SavingsStats {
            balance: income - spent,
            savings: (budget - spent).max(0.0),
            total_spent: spent,
        })
    }

    async fn fetch_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.transactions.read().clone())
    }

    async fn fetch_goals(&self) -> Result<Vec<Goal>> {
        Ok(self.goals.read().clone())
    }

    async fn fetch_groups(&self) -> Result<Vec<Group>> {
        Ok(self.groups.read().clone())
    }

    async fn add_transaction(&self, tx: NewTransaction) -> Result<Transaction> {
        let stored = Transaction {
            id: Uuid::new_v4().to_string(),
            merchant: tx.merchant,
            amount: tx.amount,
            category: tx.category,
            date: Utc::now(),
        };
        self.transactions.write().push(stored.clone());
        Ok(stored)
    }

    async fn add_goal(&self, title: &str, target: &str) -> Result<Goal> {
        let target: f64 = target
            .parse()
            .map_err(|_| CoachError::Capability(format!("invalid goal target '{target}'")))?;
        let goal = Goal {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            target,
            saved: 0.0,
        };
        self.goals.write().push(goal.clone());
        Ok(goal)
    }

    async fn add_goal_progress(&self, goal_id: &str, amount: f64) -> Result<Goal> {
        let mut goals = self.goals.write();
        let goal = goals
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| CoachError::Capability(format!("no goal with id '{goal_id}'")))?;
        goal.saved += amount;
        Ok(goal.clone())
    }

    async fn create_group(&self, name: &str) -> Result<Group> {
        let id = Uuid::new_v4().to_string();
        let code = id[..6].to_uppercase();
        let group = Group {
            id,
            name: name.to_string(),
            code,
            members: 1,
        };
        self.groups.write().push(group.clone());
        Ok(group)
    }

    async fn join_group(&self, code: &str) -> Result<Group> {
        let mut groups = self.groups.write();
        let group = groups
            .iter_mut()
            .find(|g| g.code.eq_ignore_ascii_case(code))
            .ok_or_else(|| CoachError::Capability(format!("no group with code '{code}'")))?;
        group.members += 1;
        Ok(group.clone())
    }

    async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile> {
        let mut profile = self.profile.write();
        if let Some(name) = update.name {
            profile.name = name;
        }
        if let Some(income) = update.income {
            profile.income = Some(income);
        }
        if let Some(budget) = update.budget_limit {
            profile.budget_limit = Some(budget);
        }
        Ok(profile.clone())
    }

    async fn get_ai_advice(&self) -> Result<Advice> {
        let index = self.advice_cursor.fetch_add(1, Ordering::Relaxed);
        Ok(Advice {
            message: CANNED_ADVICE[index % CANNED_ADVICE.len()].to_string(),
        })
    }

    async fn parse_text_to_transaction(&self, text: &str) -> Result<ParsedTransaction> {
        let amount: f64 = AMOUNT
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .ok_or_else(|| CoachError::ParseFailure(format!("no amount in '{text}'")))?;

        // Merchant is everything after the last standalone "at" token
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let at_index = tokens
            .iter()
            .rposition(|t| t.eq_ignore_ascii_case("at"))
            .ok_or_else(|| CoachError::ParseFailure(format!("no merchant in '{text}'")))?;
        let merchant = tokens[at_index + 1..]
            .join(" ")
            .trim_end_matches(['.', '!', '?'])
            .to_string();
        if merchant.is_empty() {
            return Err(CoachError::ParseFailure(format!("no merchant in '{text}'")));
        }

        Ok(ParsedTransaction {
            merchant,
            amount,
            category: Some("Expense".to_string()),
        })
    }
}
