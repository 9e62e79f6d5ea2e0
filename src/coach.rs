//! Coach controller
//!
//! Single owner of all session-wide mutable state (session, snapshot, mood,
//! transcript, voice session) and coordinator of the three moving parts:
//! the command executor, the dashboard aggregator and the voice capture
//! session. Writer roles are fixed: the executor appends to the transcript,
//! the aggregator replaces the snapshot, and both may write the ambient
//! mood with the profile-derived value taking precedence.

use crate::chat::{classify_intent, classify_mood, ChatMessage, Intent, Mood, Transcript};
use crate::config::CoachConfig;
use crate::dashboard::DashboardSnapshot;
use crate::service::types::{Goal, Group, NewTransaction, ProfileUpdate, Transaction, UserProfile};
use crate::service::FinanceService;
use crate::session::{Session, TokenStore, GUEST_TOKEN};
use crate::voice::{EngineEvent, SpeechCapability, VoiceSession, VoiceState};
use crate::{CoachError, Result};
use futures::try_join;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

const EXPENSE_HINT: &str = "I couldn't parse that. Try: 'Paid Rs 500 at Starbucks'";
const GOAL_USAGE_HINT: &str = "To add a goal, say: 'Add goal [Name] [Amount]'";
const ADVICE_UNAVAILABLE: &str = "Error connecting to the coach brain.";

/// XP awarded for creating a savings goal
const GOAL_CREATED_XP: u32 = 25;

/// What one command execution produced
struct Outcome {
    reply: String,
    refresh_dashboard: bool,
    xp_gained: Option<u32>,
}

impl Outcome {
    fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: text.into(),
            refresh_dashboard: false,
            xp_gained: None,
        }
    }

    fn with_refresh(mut self) -> Self {
        self.refresh_dashboard = true;
        self
    }

    fn with_xp(mut self, xp: u32) -> Self {
        self.xp_gained = Some(xp);
        self
    }
}

/// Clears the single-flight latch when an execution ends, on every path
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Coach {
    config: CoachConfig,
    service: Arc<dyn FinanceService>,
    tokens: Box<dyn TokenStore>,
    session: RwLock<Option<Session>>,
    snapshot: RwLock<Option<DashboardSnapshot>>,
    mood: RwLock<Mood>,
    transcript: Transcript,
    voice: Mutex<VoiceSession>,
    in_flight: AtomicBool,
}

impl Coach {
    /// Build a coach over the given capabilities
    ///
    /// The token store is read once here; a stored token resumes the
    /// previous session without a fresh credential exchange.
    pub fn new(
        service: Arc<dyn FinanceService>,
        speech: Box<dyn SpeechCapability>,
        tokens: Box<dyn TokenStore>,
        config: CoachConfig,
    ) -> Self {
        let transcript = Transcript::new();
        transcript.append(ChatMessage::coach(&config.greeting));

        let session = tokens.load().map(Session::new);
        let voice = VoiceSession::new(speech).with_max_restarts(config.max_engine_restarts);

        Self {
            config,
            service,
            tokens,
            session: RwLock::new(session),
            snapshot: RwLock::new(None),
            mood: RwLock::new(Mood::default()),
            transcript,
            voice: Mutex::new(voice),
            in_flight: AtomicBool::new(false),
        }
    }

    // === Read surface for the presentation layer ===

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.get_all()
    }

    pub fn snapshot(&self) -> Option<DashboardSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn mood(&self) -> Mood {
        *self.mood.read()
    }

    pub fn voice_state(&self) -> VoiceState {
        self.voice.lock().state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.read().is_some()
    }

    pub fn pending_voice_input(&self) -> Option<String> {
        self.voice.lock().pending_input().map(str::to_string)
    }

    // === Session lifecycle ===

    /// Store a login token and load the first snapshot
    pub async fn login(&self, token: &str) -> Result<()> {
        *self.session.write() = Some(Session::new(token));
        self.tokens.save(token);
        info!("session started");
        self.refresh_dashboard().await
    }

    /// Guest mode: fixed token, no credential exchange
    pub async fn login_guest(&self) -> Result<()> {
        self.login(GUEST_TOKEN).await
    }

    /// Tear the session down
    ///
    /// Stops any live voice engine so no background capture outlives the
    /// session, drops the snapshot and clears the stored token.
    pub fn logout(&self) {
        self.voice.lock().stop();
        *self.session.write() = None;
        *self.snapshot.write() = None;
        *self.mood.write() = Mood::default();
        self.tokens.clear();
        info!("session ended");
    }

    // === Voice capture ===

    /// Flip voice capture on or off
    pub fn toggle_voice(&self) -> Result<VoiceState> {
        self.voice.lock().toggle()
    }

    /// Forward one engine event into the voice state machine
    pub fn voice_event(&self, event: EngineEvent) {
        self.voice.lock().on_event(event);
    }

    /// Submit whatever the voice session has recognized so far
    pub async fn submit_pending_voice(&self) -> Result<Option<ChatMessage>> {
        let Some(text) = self.voice.lock().take_input() else {
            return Ok(None);
        };
        self.submit(&text).await
    }

    // === Command executor ===

    /// Classify and execute one typed or voice-derived command
    ///
    /// Returns the coach's response message, or `None` when the submission
    /// was rejected: empty input, or another command still in flight
    /// (single-flight). Submitting while voice capture is listening forces
    /// a stop first; capture and submission are mutually exclusive.
    pub async fn submit(&self, input: &str) -> Result<Option<ChatMessage>> {
        let text = input.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("submission rejected: a command is already in flight");
            return Ok(None);
        }
        let _guard = FlightGuard(&self.in_flight);

        self.stop_voice_for_submission();

        // The user's own message is tagged synchronously, independent of
        // the asynchronous response
        let mood = classify_mood(text);
        *self.mood.write() = mood;
        self.transcript.append(ChatMessage::user(text, mood));

        let outcome = match self.execute(classify_intent(text)).await {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.on_service_error(e)),
        };

        let mut message = ChatMessage::coach(outcome.reply).with_mood(mood);
        if let Some(xp) = outcome.xp_gained {
            message = message.with_xp(xp);
        }
        self.transcript.append(message.clone());

        if outcome.refresh_dashboard {
            self.try_refresh().await;
        }

        Ok(Some(message))
    }

    /// Dispatch one classified intent
    ///
    /// Every failure except an authentication rejection is converted into a
    /// user-visible reply here; `Err` escapes only when the session must be
    /// torn down.
    async fn execute(&self, intent: Intent) -> Result<Outcome> {
        match intent {
            Intent::ExpenseFromText { raw_text } => {
                match self.service.parse_text_to_transaction(&raw_text).await {
                    Ok(parsed) => Ok(Outcome::reply(format!(
                        "Recorded expense: {} at {}.",
                        parsed.amount, parsed.merchant
                    ))
                    .with_refresh()),
                    Err(CoachError::ParseFailure(reason)) => {
                        debug!("expense text rejected by parser: {reason}");
                        Ok(Outcome::reply(EXPENSE_HINT))
                    }
                    Err(e) if e.forces_logout() => Err(e),
                    Err(e) => Ok(Outcome::reply(e.user_message())),
                }
            }

            Intent::GoalCreation { title, target } => {
                match self.service.add_goal(&title, &target).await {
                    Ok(_) => Ok(Outcome::reply(format!(
                        "Goal '{title}' added with target {target}!"
                    ))
                    .with_refresh()
                    .with_xp(GOAL_CREATED_XP)),
                    Err(e) if e.forces_logout() => Err(e),
                    Err(e) => {
                        warn!("goal creation failed: {e}");
                        Ok(Outcome::reply(e.user_message()))
                    }
                }
            }

            Intent::GoalUsageHint => Ok(Outcome::reply(GOAL_USAGE_HINT)),

            Intent::GenericAdvice => match self.service.get_ai_advice().await {
                Ok(advice) => Ok(Outcome::reply(advice.message)),
                Err(e) if e.forces_logout() => Err(e),
                Err(e) => {
                    warn!("advice fetch failed: {e}");
                    Ok(Outcome::reply(ADVICE_UNAVAILABLE))
                }
            },
        }
    }

    // === Dashboard aggregator ===

    /// Aggregate the six dashboard reads into one atomic snapshot
    ///
    /// All-or-nothing: on success every field is replaced together and a
    /// profile-carried mood overwrites the ambient one; on any failure the
    /// prior snapshot is left untouched. An authentication rejection tears
    /// the session down as a side effect of this call.
    pub async fn refresh_dashboard(&self) -> Result<()> {
        let reads = try_join!(
            self.service.fetch_profile(),
            self.service.fetch_leaderboard(),
            self.service.fetch_savings_stats(),
            self.service.fetch_transactions(),
            self.service.fetch_goals(),
            self.service.fetch_groups(),
        );

        match reads {
            Ok((profile, leaderboard, savings, transactions, goals, groups)) => {
                if let Some(mood) = profile.mood_state {
                    *self.mood.write() = mood;
                }
                *self.snapshot.write() = Some(DashboardSnapshot {
                    profile,
                    leaderboard,
                    savings,
                    transactions,
                    goals,
                    groups,
                });
                debug!("dashboard snapshot replaced");
                Ok(())
            }
            Err(e) => {
                warn!("dashboard aggregation failed: {e}");
                Err(self.on_service_error(e))
            }
        }
    }

    // === Direct operations (modal/tab surface) ===

    /// Record an expense entered through the form, with a confirmation in
    /// the transcript
    pub async fn add_expense(
        &self,
        merchant: &str,
        amount: f64,
        category: &str,
    ) -> Result<Transaction> {
        let tx = self
            .service
            .add_transaction(NewTransaction {
                merchant: merchant.to_string(),
                amount,
                category: category.to_string(),
            })
            .await
            .map_err(|e| self.on_service_error(e))?;

        self.try_refresh().await;
        self.transcript.append(ChatMessage::coach(format!(
            "I've recorded {} for {}.",
            tx.amount, tx.merchant
        )));
        Ok(tx)
    }

    pub async fn create_goal(&self, title: &str, target: &str) -> Result<Goal> {
        let goal = self
            .service
            .add_goal(title, target)
            .await
            .map_err(|e| self.on_service_error(e))?;
        self.try_refresh().await;
        Ok(goal)
    }

    pub async fn add_goal_progress(&self, goal_id: &str, amount: f64) -> Result<Goal> {
        let goal = self
            .service
            .add_goal_progress(goal_id, amount)
            .await
            .map_err(|e| self.on_service_error(e))?;
        self.try_refresh().await;
        Ok(goal)
    }

    pub async fn create_group(&self, name: &str) -> Result<Group> {
        let group = self
            .service
            .create_group(name)
            .await
            .map_err(|e| self.on_service_error(e))?;
        self.try_refresh().await;
        Ok(group)
    }

    pub async fn join_group(&self, code: &str) -> Result<Group> {
        let group = self
            .service
            .join_group(code)
            .await
            .map_err(|e| self.on_service_error(e))?;
        self.try_refresh().await;
        Ok(group)
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile> {
        let profile = self
            .service
            .update_profile(update)
            .await
            .map_err(|e| self.on_service_error(e))?;
        self.try_refresh().await;
        Ok(profile)
    }

    // === Internals ===

    fn stop_voice_for_submission(&self) {
        let mut voice = self.voice.lock();
        if voice.state().is_listening() {
            debug!("stopping voice capture for command submission");
            voice.stop();
        }
    }

    /// Best-effort refresh after a successful write; failures are logged
    /// (and still drive logout on an authentication cause) but never replace
    /// the command's own response
    async fn try_refresh(&self) {
        if let Err(e) = self.refresh_dashboard().await {
            warn!("dashboard refresh failed: {e}");
        }
    }

    fn on_service_error(&self, error: CoachError) -> CoachError {
        if error.forces_logout() {
            warn!("authentication rejected; tearing the session down");
            self.logout();
        }
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::types::{
        Advice, LeaderboardEntry, ParsedTransaction, SavingsStats,
    };
    use crate::session::InMemoryTokenStore;
    use crate::voice::SpeechEngine;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Scripted service with call counters and failure injection
    #[derive(Default)]
    struct MockService {
        profile_name: Mutex<String>,
        profile_mood: Mutex<Option<Mood>>,
        fail_parse: AtomicBool,
        fail_goal_add: AtomicBool,
        fail_goals_fetch: AtomicBool,
        unauth_fetch: AtomicBool,
        unauth_advice: AtomicBool,
        fail_advice: AtomicBool,
        gate_advice: AtomicBool,
        advice_started: AtomicUsize,
        advice_gate: Notify,
        fetch_rounds: AtomicUsize,
        parse_calls: AtomicUsize,
        goal_calls: AtomicUsize,
        added_goals: Mutex<Vec<(String, String)>>,
    }

    impl MockService {
        fn new() -> Self {
            let svc = Self::default();
            *svc.profile_name.lock() = "Guest".to_string();
            svc
        }
    }

    #[async_trait]
    impl FinanceService for MockService {
        async fn fetch_profile(&self) -> Result<UserProfile> {
            self.fetch_rounds.fetch_add(1, Ordering::SeqCst);
            if self.unauth_fetch.load(Ordering::SeqCst) {
                return Err(CoachError::Unauthenticated("token expired".to_string()));
            }
            Ok(UserProfile {
                id: "user_1".to_string(),
                name: self.profile_name.lock().clone(),
                email: None,
                points: 120,
                mood_state: *self.profile_mood.lock(),
                income: Some(30000.0),
                budget_limit: Some(20000.0),
            })
        }

        async fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
            Ok(vec![LeaderboardEntry {
                id: "user_1".to_string(),
                name: "Guest".to_string(),
                points: 120,
            }])
        }

        async fn fetch_savings_stats(&self) -> Result<SavingsStats> {
            Ok(SavingsStats {
                balance: 1000.0,
                savings: 400.0,
                total_spent: 600.0,
            })
        }

        async fn fetch_transactions(&self) -> Result<Vec<Transaction>> {
            Ok(Vec::new())
        }

        async fn fetch_goals(&self) -> Result<Vec<Goal>> {
            if self.fail_goals_fetch.load(Ordering::SeqCst) {
                return Err(CoachError::Capability("goals endpoint down".to_string()));
            }
            Ok(Vec::new())
        }

        async fn fetch_groups(&self) -> Result<Vec<Group>> {
            Ok(Vec::new())
        }

        async fn add_transaction(&self, tx: NewTransaction) -> Result<Transaction> {
            Ok(Transaction {
                id: "tx_1".to_string(),
                merchant: tx.merchant,
                amount: tx.amount,
                category: tx.category,
                date: chrono::Utc::now(),
            })
        }

        async fn add_goal(&self, title: &str, target: &str) -> Result<Goal> {
            self.goal_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_goal_add.load(Ordering::SeqCst) {
                return Err(CoachError::Capability("goal service down".to_string()));
            }
            self.added_goals
                .lock()
                .push((title.to_string(), target.to_string()));
            Ok(Goal {
                id: "goal_1".to_string(),
                title: title.to_string(),
                target: target.parse().unwrap_or(0.0),
                saved: 0.0,
            })
        }

        async fn add_goal_progress(&self, _goal_id: &str, amount: f64) -> Result<Goal> {
            Ok(Goal {
                id: "goal_1".to_string(),
                title: "Vacation".to_string(),
                target: 20000.0,
                saved: amount,
            })
        }

        async fn create_group(&self, name: &str) -> Result<Group> {
            Ok(Group {
                id: "group_1".to_string(),
                name: name.to_string(),
                code: "ABC123".to_string(),
                members: 1,
            })
        }

        async fn join_group(&self, code: &str) -> Result<Group> {
            Ok(Group {
                id: "group_1".to_string(),
                name: "Savers".to_string(),
                code: code.to_string(),
                members: 2,
            })
        }

        async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile> {
            if let Some(name) = update.name {
                *self.profile_name.lock() = name;
            }
            self.fetch_profile().await
        }

        async fn get_ai_advice(&self) -> Result<Advice> {
            self.advice_started.fetch_add(1, Ordering::SeqCst);
            if self.gate_advice.load(Ordering::SeqCst) {
                self.advice_gate.notified().await;
            }
            if self.unauth_advice.load(Ordering::SeqCst) {
                return Err(CoachError::Unauthenticated("token expired".to_string()));
            }
            if self.fail_advice.load(Ordering::SeqCst) {
                return Err(CoachError::Capability("brain offline".to_string()));
            }
            Ok(Advice {
                message: "Spend less on snacks.".to_string(),
            })
        }

        async fn parse_text_to_transaction(&self, text: &str) -> Result<ParsedTransaction> {
            self.parse_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_parse.load(Ordering::SeqCst) {
                return Err(CoachError::ParseFailure(text.to_string()));
            }
            Ok(ParsedTransaction {
                merchant: "Starbucks".to_string(),
                amount: 500.0,
                category: None,
            })
        }
    }

    struct MockEngine {
        stopped: Arc<AtomicBool>,
    }

    impl SpeechEngine for MockEngine {
        fn stop(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    struct MockSpeech {
        stopped: Arc<AtomicBool>,
    }

    impl SpeechCapability for MockSpeech {
        fn is_supported(&self) -> bool {
            true
        }

        fn start_engine(&mut self) -> Result<Box<dyn SpeechEngine>> {
            Ok(Box::new(MockEngine {
                stopped: Arc::clone(&self.stopped),
            }))
        }
    }

    fn coach_with(service: Arc<MockService>) -> Coach {
        Coach::new(
            service,
            Box::new(MockSpeech {
                stopped: Arc::new(AtomicBool::new(false)),
            }),
            Box::new(InMemoryTokenStore::default()),
            CoachConfig::default(),
        )
    }

    async fn logged_in_coach(service: Arc<MockService>) -> Coach {
        let coach = coach_with(service);
        coach.login_guest().await.unwrap();
        coach
    }

    #[tokio::test]
    async fn test_expense_scenario() {
        let svc = Arc::new(MockService::new());
        let coach = logged_in_coach(svc.clone()).await;
        let rounds_before = svc.fetch_rounds.load(Ordering::SeqCst);

        let reply = coach
            .submit("Paid Rs 500 at Starbucks")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.text, "Recorded expense: 500 at Starbucks.");
        assert!(!reply.is_user);

        // Successful expense triggers a dashboard refresh
        assert!(svc.fetch_rounds.load(Ordering::SeqCst) > rounds_before);
    }

    #[tokio::test]
    async fn test_expense_parse_failure_emits_hint_without_refresh() {
        let svc = Arc::new(MockService::new());
        let coach = logged_in_coach(svc.clone()).await;
        svc.fail_parse.store(true, Ordering::SeqCst);
        let rounds_before = svc.fetch_rounds.load(Ordering::SeqCst);

        let reply = coach
            .submit("Paid Rs 500 at Starbucks")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.text, EXPENSE_HINT);
        assert_eq!(svc.fetch_rounds.load(Ordering::SeqCst), rounds_before);
    }

    #[tokio::test]
    async fn test_goal_scenario() {
        let svc = Arc::new(MockService::new());
        let coach = logged_in_coach(svc.clone()).await;

        let reply = coach.submit("Add goal Vacation 20000").await.unwrap().unwrap();
        assert!(reply.text.contains("Vacation"));
        assert!(reply.text.contains("20000"));
        assert_eq!(reply.xp_gained, Some(GOAL_CREATED_XP));
        assert_eq!(
            *svc.added_goals.lock(),
            vec![("Vacation".to_string(), "20000".to_string())]
        );
    }

    #[tokio::test]
    async fn test_malformed_goal_gets_usage_hint_without_capability_call() {
        let svc = Arc::new(MockService::new());
        let coach = logged_in_coach(svc.clone()).await;

        let reply = coach.submit("Add goal Car").await.unwrap().unwrap();
        assert_eq!(reply.text, GOAL_USAGE_HINT);
        assert_eq!(svc.goal_calls.load(Ordering::SeqCst), 0);
        assert_eq!(svc.parse_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_goal_capability_failure_is_user_visible() {
        let svc = Arc::new(MockService::new());
        let coach = logged_in_coach(svc.clone()).await;
        svc.fail_goal_add.store(true, Ordering::SeqCst);

        let reply = coach.submit("Add goal Bike 45000").await.unwrap().unwrap();
        assert_eq!(
            reply.text,
            CoachError::Capability(String::new()).user_message()
        );
        assert_eq!(coach.transcript().last().unwrap().text, reply.text);
    }

    #[tokio::test]
    async fn test_advice_verbatim_and_fallback() {
        let svc = Arc::new(MockService::new());
        let coach = logged_in_coach(svc.clone()).await;

        let reply = coach.submit("how am I doing").await.unwrap().unwrap();
        assert_eq!(reply.text, "Spend less on snacks.");

        svc.fail_advice.store(true, Ordering::SeqCst);
        let reply = coach.submit("how am I doing now").await.unwrap().unwrap();
        assert_eq!(reply.text, ADVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_empty_submission_is_rejected() {
        let svc = Arc::new(MockService::new());
        let coach = logged_in_coach(svc.clone()).await;
        let len_before = coach.transcript().len();

        assert!(coach.submit("   ").await.unwrap().is_none());
        assert_eq!(coach.transcript().len(), len_before);
    }

    #[tokio::test]
    async fn test_single_flight_rejects_second_submission() {
        let svc = Arc::new(MockService::new());
        let coach = Arc::new(logged_in_coach(svc.clone()).await);
        svc.gate_advice.store(true, Ordering::SeqCst);
        let advice_before = svc.advice_started.load(Ordering::SeqCst);

        let first = {
            let coach = Arc::clone(&coach);
            tokio::spawn(async move { coach.submit("any advice for me").await })
        };
        while svc.advice_started.load(Ordering::SeqCst) == advice_before {
            tokio::task::yield_now().await;
        }
        let len_mid = coach.transcript().len();

        // Second submission while the first is outstanding: rejected no-op
        let second = coach.submit("and another thing").await.unwrap();
        assert!(second.is_none());
        assert_eq!(coach.transcript().len(), len_mid);
        assert_eq!(svc.advice_started.load(Ordering::SeqCst), advice_before + 1);

        svc.advice_gate.notify_one();
        let reply = first.await.unwrap().unwrap().unwrap();
        assert_eq!(reply.text, "Spend less on snacks.");

        // The latch is released once the first execution completes
        svc.gate_advice.store(false, Ordering::SeqCst);
        assert!(coach.submit("one more").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_mood_attached_at_submission_time() {
        let svc = Arc::new(MockService::new());
        let coach = logged_in_coach(svc.clone()).await;

        let reply = coach
            .submit("I'm worried about my debt")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.mood, Some(Mood::Stressed));
        assert_eq!(coach.mood(), Mood::Stressed);

        let all = coach.transcript();
        let user_msg = &all[all.len() - 2];
        assert!(user_msg.is_user);
        assert_eq!(user_msg.mood, Some(Mood::Stressed));
    }

    #[tokio::test]
    async fn test_profile_mood_takes_precedence() {
        let svc = Arc::new(MockService::new());
        *svc.profile_mood.lock() = Some(Mood::Celebratory);
        let coach = logged_in_coach(svc.clone()).await;

        // Chat-derived mood is set synchronously, then the refresh that the
        // expense triggers overwrites it with the profile-derived value
        coach.submit("Paid Rs 500 at Starbucks").await.unwrap();
        assert_eq!(coach.mood(), Mood::Celebratory);
    }

    #[tokio::test]
    async fn test_snapshot_update_is_atomic() {
        let svc = Arc::new(MockService::new());
        let coach = logged_in_coach(svc.clone()).await;
        assert_eq!(coach.snapshot().unwrap().profile.name, "Guest");

        *svc.profile_name.lock() = "Renamed".to_string();
        svc.fail_goals_fetch.store(true, Ordering::SeqCst);

        let err = coach.refresh_dashboard().await.unwrap_err();
        assert!(matches!(err, CoachError::Capability(_)));

        // One failing read leaves every field of the prior snapshot intact
        assert_eq!(coach.snapshot().unwrap().profile.name, "Guest");
        assert!(coach.is_authenticated());
    }

    #[tokio::test]
    async fn test_aggregator_auth_failure_tears_down_session() {
        let svc = Arc::new(MockService::new());
        let coach = logged_in_coach(svc.clone()).await;
        svc.unauth_fetch.store(true, Ordering::SeqCst);

        let err = coach.refresh_dashboard().await.unwrap_err();
        assert!(err.forces_logout());
        assert!(!coach.is_authenticated());
        assert!(coach.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_command_auth_failure_tears_down_session() {
        let svc = Arc::new(MockService::new());
        let coach = logged_in_coach(svc.clone()).await;
        svc.unauth_advice.store(true, Ordering::SeqCst);

        let err = coach.submit("any tips").await.unwrap_err();
        assert!(err.forces_logout());
        assert!(!coach.is_authenticated());
    }

    #[tokio::test]
    async fn test_submission_forces_voice_stop() {
        let svc = Arc::new(MockService::new());
        let stopped = Arc::new(AtomicBool::new(false));
        let coach = Coach::new(
            svc.clone(),
            Box::new(MockSpeech {
                stopped: Arc::clone(&stopped),
            }),
            Box::new(InMemoryTokenStore::default()),
            CoachConfig::default(),
        );
        coach.login_guest().await.unwrap();

        coach.toggle_voice().unwrap();
        assert!(coach.voice_state().is_listening());

        coach.submit("how am I doing").await.unwrap();
        assert!(coach.voice_state().is_idle());
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_voice_input_flows_into_submission() {
        let svc = Arc::new(MockService::new());
        let coach = logged_in_coach(svc.clone()).await;

        coach.toggle_voice().unwrap();
        coach.voice_event(EngineEvent::Partial {
            segments: vec!["Add goal ".to_string(), "Vacation 20000".to_string()],
        });
        assert_eq!(
            coach.pending_voice_input().as_deref(),
            Some("Add goal Vacation 20000")
        );

        let reply = coach.submit_pending_voice().await.unwrap().unwrap();
        assert!(reply.text.contains("Vacation"));
        assert!(coach.voice_state().is_idle());
        assert!(coach.pending_voice_input().is_none());
    }

    #[tokio::test]
    async fn test_logout_stops_live_engine_and_clears_state() {
        let svc = Arc::new(MockService::new());
        let stopped = Arc::new(AtomicBool::new(false));
        let coach = Coach::new(
            svc.clone(),
            Box::new(MockSpeech {
                stopped: Arc::clone(&stopped),
            }),
            Box::new(InMemoryTokenStore::default()),
            CoachConfig::default(),
        );
        coach.login_guest().await.unwrap();
        coach.toggle_voice().unwrap();
        coach.submit("I'm worried about debt").await.unwrap();

        coach.logout();
        assert!(stopped.load(Ordering::SeqCst));
        assert!(!coach.is_authenticated());
        assert!(coach.snapshot().is_none());
        assert_eq!(coach.mood(), Mood::default());
    }

    #[tokio::test]
    async fn test_token_store_round_trip() {
        let svc = Arc::new(MockService::new());
        let store = InMemoryTokenStore::with_token("jwt-abc");
        let coach = Coach::new(
            svc.clone(),
            Box::new(MockSpeech {
                stopped: Arc::new(AtomicBool::new(false)),
            }),
            Box::new(store),
            CoachConfig::default(),
        );

        // A stored token resumes the session without a fresh login
        assert!(coach.is_authenticated());
        coach.logout();
        assert!(!coach.is_authenticated());
    }

    #[tokio::test]
    async fn test_add_expense_confirms_and_refreshes() {
        let svc = Arc::new(MockService::new());
        let coach = logged_in_coach(svc.clone()).await;
        let rounds_before = svc.fetch_rounds.load(Ordering::SeqCst);

        coach.add_expense("Manual Entry", 250.0, "Food").await.unwrap();
        assert!(svc.fetch_rounds.load(Ordering::SeqCst) > rounds_before);
        assert_eq!(
            coach.transcript().last().unwrap().text,
            "I've recorded 250 for Manual Entry."
        );
    }

    #[tokio::test]
    async fn test_greeting_seeds_transcript() {
        let svc = Arc::new(MockService::new());
        let coach = coach_with(svc);
        let all = coach.transcript();
        assert_eq!(all.len(), 1);
        assert!(!all[0].is_user);
        assert!(all[0].text.starts_with("Hello! I'm your FinCoach"));
    }
}
