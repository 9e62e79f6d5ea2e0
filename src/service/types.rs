use crate::chat::Mood;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user's profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub points: u64,
    /// Server-side mood indicator; overrides the chat-derived mood when set
    pub mood_state: Option<Mood>,
    pub income: Option<f64>,
    pub budget_limit: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: String,
    pub name: String,
    pub points: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsStats {
    pub balance: f64,
    pub savings: f64,
    pub total_spent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub merchant: String,
    pub amount: f64,
    pub category: String,
    pub date: DateTime<Utc>,
}

/// Fields for a transaction insert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub merchant: String,
    pub amount: f64,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub target: f64,
    pub saved: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub code: String,
    pub members: u32,
}

/// Result of the remote text-to-transaction parser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub merchant: String,
    pub amount: f64,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advice {
    pub message: String,
}

/// Partial profile update; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub income: Option<f64>,
    pub budget_limit: Option<f64>,
}
