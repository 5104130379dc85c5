//! The marker session coordinator.
//!
//! One reconciliation pass drains every queued observation batch, fires due
//! timers, and walks the observations in delivery order:
//!
//! 1. record every observation in the registry and tracking table;
//! 2. classify each it as qualifying (`Tracking`, or `Limited` when allowed, with a
//!    usable, unique name) or not;
//! 3. hide content of non-qualifying instances and end their streak;
//! 4. report the first qualifying observation of each streak to the state
//!    machine, guarded by the debounce ledger;
//! 5. spawn or show content for accepted reports, replacing the previous
//!    session when a different marker takes over.
//!
//! With `lost_teardown_seconds` set, content that stays hidden that long is
//! destroyed while its session lives on; the next sighting spawns it again.
//!
//! When two different markers qualify within one pass, the first one in
//! delivery order wins. Delivery order is whatever the tracking backend
//! produces and is not guaranteed to be stable across backends.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use livingbooks_content::domain::binder::{ContentBinder, EnsureOutcome};
use livingbooks_core::clock::Clock;
use livingbooks_core::config::CoordinatorConfig;
use livingbooks_core::content::{ContentHost, TemplateResolver};
use livingbooks_core::error::DomainError;
use livingbooks_core::event::{Diagnostic, EndReason, SessionEvent, SessionObserver};
use livingbooks_core::observation::{
    MarkerObservation, ObservationBatch, Pose, TrackableId, TrackingQuality,
};
use livingbooks_core::state::SessionState;
use livingbooks_core::tracking::TrackingSource;
use livingbooks_session::domain::debounce::DebounceLedger;
use livingbooks_session::domain::machine::{
    ActiveSession, Qualification, SessionStateMachine, Transition,
};
use livingbooks_session::domain::timers::{TimerHandle, TimerQueue};
use livingbooks_tracking::domain::registry::MarkerRegistry;
use livingbooks_tracking::domain::streaks::{NameWarning, TrackingTable};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::inbox::{ObservationInbox, ObservationSender};
use super::observers::{ObserverList, SubscriptionId};

/// Work scheduled for a later pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    CompleteSession { session_id: Uuid },
    TeardownLost { trackable_id: TrackableId },
}

/// A completion signal waiting for its settle delay.
#[derive(Debug, Clone, Copy)]
struct PendingCompletion {
    session_id: Uuid,
    /// `None` while the session is paused.
    timer: Option<TimerHandle>,
}

/// What one reconciliation pass processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub batches: usize,
    pub observations: usize,
    pub timers_fired: usize,
    pub events: usize,
}

/// Owns the session policy: which marker holds the session, what content
/// exists, and when a finished marker may start again.
///
/// The registry, tracking table, debounce ledger and state machine are only
/// mutated from here.
pub struct MarkerSessionCoordinator {
    config: CoordinatorConfig,
    clock: Arc<dyn Clock>,
    registry: Arc<MarkerRegistry>,
    tracking: TrackingTable,
    binder: ContentBinder,
    ledger: DebounceLedger,
    machine: SessionStateMachine,
    timers: TimerQueue<Deferred>,
    completion: Option<PendingCompletion>,
    lost_timers: HashMap<TrackableId, TimerHandle>,
    inbox: ObservationInbox,
    observers: ObserverList,
    emitted: usize,
}

impl fmt::Debug for MarkerSessionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerSessionCoordinator")
            .field("state", &self.machine.state())
            .field("active", &self.machine.active())
            .field("config", &self.config)
            .field("binder", &self.binder)
            .field("pending_timers", &self.timers.len())
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}

impl MarkerSessionCoordinator {
    /// Creates a coordinator in `Idle` from explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Configuration` if `config` is invalid.
    pub fn new(
        config: CoordinatorConfig,
        clock: Arc<dyn Clock>,
        registry: Arc<MarkerRegistry>,
        binder: ContentBinder,
        ledger: DebounceLedger,
    ) -> Result<Self, DomainError> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            registry,
            tracking: TrackingTable::new(),
            binder,
            ledger,
            machine: SessionStateMachine::new(),
            timers: TimerQueue::new(),
            completion: None,
            lost_timers: HashMap::new(),
            inbox: ObservationInbox::new(),
            observers: ObserverList::default(),
            emitted: 0,
        })
    }

    /// Creates a coordinator with a fresh registry, binder and ledger.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Configuration` if `config` is invalid.
    pub fn with_collaborators(
        config: CoordinatorConfig,
        clock: Arc<dyn Clock>,
        host: Arc<dyn ContentHost>,
        resolver: Arc<dyn TemplateResolver>,
    ) -> Result<Self, DomainError> {
        let binder = ContentBinder::new(host, resolver, config.pose_follow);
        Self::new(
            config,
            clock,
            Arc::new(MarkerRegistry::new()),
            binder,
            DebounceLedger::new(),
        )
    }

    // --- observation intake ---

    /// A sender that other threads or tasks use to deliver batches.
    #[must_use]
    pub fn sender(&self) -> ObservationSender {
        self.inbox.sender()
    }

    /// Queues a batch for the next pass.
    pub fn submit(&self, batch: ObservationBatch) {
        self.inbox.push(batch);
    }

    /// Queues everything a poll-style source has produced. Returns the number
    /// of batches queued.
    pub fn poll_source(&self, source: &mut dyn TrackingSource) -> usize {
        let batches = source.poll_batches();
        let count = batches.len();
        for batch in batches {
            self.inbox.push(batch);
        }
        count
    }

    /// Runs one reconciliation pass at the clock's current time.
    pub fn run_pass(&mut self) -> PassReport {
        let now = self.clock.now();
        let events_before = self.emitted;
        let mut report = PassReport::default();

        for (handle, deferred) in self.timers.pop_due(now) {
            report.timers_fired += 1;
            self.fire(handle, deferred, now);
        }

        let batches = self.inbox.drain();
        report.batches = batches.len();
        // Record the whole pass first so name claims are complete before any
        // observation is classified.
        for observation in batches.iter().flatten() {
            report.observations += 1;
            self.record(observation);
        }
        let mut session_claimed = false;
        for observation in batches.iter().flatten() {
            self.reconcile(observation, now, &mut session_claimed);
        }

        self.ledger.purge_expired(now);
        report.events = self.emitted - events_before;
        report
    }

    // --- commands ---

    /// Idle/Ended → Scanning. Markers already in view are evaluated afresh.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` from any other state.
    pub fn request_start(&mut self) -> Result<(), DomainError> {
        let transition = self.machine.request_start()?;
        self.tracking.reset_all_reports();
        self.prune_lost();
        self.emit_transition(transition);
        Ok(())
    }

    /// Active → Paused. A pending completion waits until resume.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the state is `Active`.
    pub fn request_pause(&mut self) -> Result<(), DomainError> {
        let transition = self.machine.pause()?;
        if let Some(pending) = self.completion.as_mut() {
            if let Some(timer) = pending.timer.take() {
                self.timers.cancel(timer);
                debug!(session_id = %pending.session_id, "completion deferred while paused");
            }
        }
        self.emit_transition(transition);
        Ok(())
    }

    /// Paused → Active. A completion deferred by pause is re-armed with the
    /// full settle delay.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the state is `Paused`.
    pub fn request_resume(&mut self) -> Result<(), DomainError> {
        let transition = self.machine.resume()?;
        if let Some(pending) = self.completion {
            if pending.timer.is_none() {
                self.arm_completion(pending.session_id);
            }
        }
        self.emit_transition(transition);
        Ok(())
    }

    /// Any → Ended. Ends the live session and destroys all content.
    ///
    /// # Errors
    ///
    /// Never fails; the `Result` keeps the command surface uniform.
    pub fn request_quit(&mut self) -> Result<(), DomainError> {
        self.cancel_all_timers();
        let (transition, ended) = self.machine.quit();
        self.binder.destroy_all();
        self.prune_lost();
        if let Some(session) = ended {
            self.emit_session_ended(&session, EndReason::Quit);
        }
        self.emit_transition(transition);
        Ok(())
    }

    /// Any → Idle (back to the start menu). Ends the live session and
    /// destroys all content.
    ///
    /// # Errors
    ///
    /// Never fails; the `Result` keeps the command surface uniform.
    pub fn request_reset(&mut self) -> Result<(), DomainError> {
        self.cancel_all_timers();
        let (transition, ended) = self.machine.reset();
        self.binder.destroy_all();
        self.prune_lost();
        if let Some(session) = ended {
            self.emit_session_ended(&session, EndReason::Reset);
        }
        self.emit_transition(transition);
        Ok(())
    }

    /// Story logic finished the active marker's narrative. The session ends
    /// and scanning resumes once the settle delay has elapsed. Repeated calls
    /// only move the deadline.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the state is `Active`.
    pub fn notify_session_completed(&mut self) -> Result<(), DomainError> {
        let active = self.machine.check_completion()?;
        let session_id = active.session_id;
        info!(marker = %active.marker_name, %session_id, "session completion signalled");
        self.cancel_completion();
        self.arm_completion(session_id);
        Ok(())
    }

    // --- observers ---

    /// Registers an observer. Events are delivered in subscription order.
    pub fn subscribe(&mut self, observer: Arc<dyn SessionObserver>) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    /// Removes an observer. Returns whether it was subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    // --- queries ---

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    #[must_use]
    pub fn active_marker_name(&self) -> Option<&str> {
        self.machine.active_marker_name()
    }

    #[must_use]
    pub fn active_session(&self) -> Option<&ActiveSession> {
        self.machine.active()
    }

    /// Whether a completion signal is waiting (armed or deferred by pause).
    #[must_use]
    pub fn is_completion_pending(&self) -> bool {
        self.completion.is_some()
    }

    /// When the armed completion will fire.
    #[must_use]
    pub fn completion_due(&self) -> Option<DateTime<Utc>> {
        self.completion
            .and_then(|pending| pending.timer)
            .and_then(|timer| self.timers.due(timer))
    }

    /// When hidden content of `id` will be torn down.
    #[must_use]
    pub fn teardown_due(&self, id: TrackableId) -> Option<DateTime<Utc>> {
        self.lost_timers
            .get(&id)
            .and_then(|timer| self.timers.due(*timer))
    }

    /// When the next pass has timer work to do.
    #[must_use]
    pub fn next_timer_due(&self) -> Option<DateTime<Utc>> {
        self.timers.next_due()
    }

    /// Shared read access for pose followers and UI.
    #[must_use]
    pub fn registry(&self) -> &Arc<MarkerRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn binder(&self) -> &ContentBinder {
        &self.binder
    }

    #[must_use]
    pub fn ledger(&self) -> &DebounceLedger {
        &self.ledger
    }

    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    // --- reconciliation ---

    fn reconcile(
        &mut self,
        observation: &MarkerObservation,
        now: DateTime<Utc>,
        session_claimed: &mut bool,
    ) {
        let id = observation.trackable_id;
        if !self.is_qualifying(observation) {
            // A dropout is not a session end; only hide.
            self.tracking.reset_streak(id);
            if self.binder.hide(id) {
                debug!(marker = %observation.name, trackable_id = %id, "content hidden");
            }
            self.arm_teardown(id);
            return;
        }

        self.cancel_teardown(id);
        self.binder.follow(id, observation.pose);
        if self.tracking.is_reported(id) {
            return;
        }

        let name = observation.name.as_str();
        if *session_claimed && self.machine.active_marker_name() != Some(name) {
            debug!(
                marker = name,
                trackable_id = %id,
                winner = ?self.machine.active_marker_name(),
                "marker lost same-pass tie-break"
            );
            self.tracking.mark_reported(id);
            return;
        }

        match self.machine.qualify(name, id, now, &self.ledger) {
            Qualification::Started(session) => {
                self.ledger.clear(name);
                self.emit_transition(Transition {
                    from: SessionState::Scanning,
                    to: SessionState::Active,
                });
                self.emit_session_started(&session);
                self.spawn_and_show(id, name, observation.pose);
                self.tracking.mark_reported(id);
                *session_claimed = true;
            }
            Qualification::Replaced { previous, current } => {
                self.cancel_completion();
                self.cancel_teardown(previous.owner);
                self.binder.destroy(previous.owner);
                // Only same-marker restarts are throttled.
                self.ledger
                    .suppress(&previous.marker_name, Duration::zero(), now);
                self.emit_session_ended(&previous, EndReason::Replaced);
                self.ledger.clear(name);
                self.emit_session_started(&current);
                self.spawn_and_show(id, name, observation.pose);
                self.tracking.mark_reported(id);
                *session_claimed = true;
            }
            Qualification::Redetected { previous_owner } => {
                if previous_owner != id {
                    self.cancel_teardown(previous_owner);
                    self.binder.rebind(previous_owner, id);
                }
                self.spawn_and_show(id, name, observation.pose);
                self.tracking.mark_reported(id);
            }
            Qualification::Suppressed => {
                debug!(
                    marker = name,
                    until = ?self.ledger.suppressed_until(name),
                    "marker suppressed after recent completion"
                );
            }
            Qualification::Ignored => {
                debug!(marker = name, state = %self.machine.state(), "marker ignored");
            }
        }
    }

    fn record(&mut self, observation: &MarkerObservation) {
        let sighting = self.tracking.observe(observation);
        if sighting.newly_tracked && observation.is_tracked() {
            debug!(
                marker = %observation.name,
                trackable_id = %observation.trackable_id,
                quality = ?observation.quality,
                "marker acquired"
            );
        }

        if !observation.has_usable_name() {
            return;
        }
        let name = observation.name.as_str();
        if observation.is_tracked() {
            self.registry.set(name, observation.clone());
        } else if self.registry.remove(name, observation.trackable_id) {
            if let Some(other) = self.tracking.other_claimant(name, observation.trackable_id) {
                self.registry.set(name, other.clone());
            }
        }
    }

    fn is_qualifying(&mut self, observation: &MarkerObservation) -> bool {
        let id = observation.trackable_id;
        match observation.quality {
            TrackingQuality::Tracking => {}
            TrackingQuality::Limited if self.config.allow_limited_tracking => {}
            TrackingQuality::Limited | TrackingQuality::None => return false,
        }

        if !observation.has_usable_name() {
            if self.tracking.take_warning(id, NameWarning::Invalid) {
                warn!(trackable_id = %id, "tracked marker has an empty name");
                self.emit(SessionEvent::Diagnostic(Diagnostic::InvalidMarkerName {
                    trackable_id: id,
                }));
            }
            return false;
        }

        if self.tracking.claimants(&observation.name) > 1 {
            if self.tracking.take_warning(id, NameWarning::Duplicate) {
                warn!(
                    marker = %observation.name,
                    trackable_id = %id,
                    "marker name claimed by more than one tracked instance"
                );
                self.emit(SessionEvent::Diagnostic(Diagnostic::DuplicateMarkerName {
                    trackable_id: id,
                    marker_name: observation.name.clone(),
                }));
            }
            return false;
        }

        true
    }

    fn spawn_and_show(&mut self, id: TrackableId, name: &str, pose: Pose) {
        match self.binder.ensure(id, name, pose) {
            EnsureOutcome::Spawned(_) | EnsureOutcome::Existing(_) => {
                self.binder.show(id);
            }
            EnsureOutcome::NoContent {
                first_warning: true,
            } => {
                self.emit(SessionEvent::Diagnostic(Diagnostic::MissingTemplate {
                    trackable_id: id,
                    marker_name: name.to_owned(),
                }));
            }
            EnsureOutcome::NoContent {
                first_warning: false,
            } => {}
        }
    }

    /// Forgets lost instances that neither own content nor the session.
    fn prune_lost(&mut self) {
        let binder = &self.binder;
        let owner = self.machine.active().map(|session| session.owner);
        for id in self
            .tracking
            .prune_lost(|id| binder.contains(id) || owner == Some(id))
        {
            self.binder.forget(id);
        }
    }

    // --- deferred work ---

    /// `delay` from now, saturating at the latest representable instant.
    fn deadline(&self, delay: Duration) -> DateTime<Utc> {
        let now = self.clock.now();
        now.checked_add_signed(delay).unwrap_or_else(|| {
            warn!(delay_ms = delay.num_milliseconds(), "timer deadline out of range");
            DateTime::<Utc>::MAX_UTC
        })
    }

    fn arm_completion(&mut self, session_id: Uuid) {
        let due = self.deadline(self.config.settle_delay());
        let timer = self
            .timers
            .schedule(due, Deferred::CompleteSession { session_id });
        self.completion = Some(PendingCompletion {
            session_id,
            timer: Some(timer),
        });
    }

    fn cancel_completion(&mut self) {
        if let Some(pending) = self.completion.take() {
            if let Some(timer) = pending.timer {
                self.timers.cancel(timer);
            }
            debug!(session_id = %pending.session_id, "pending completion cancelled");
        }
    }

    /// Starts the teardown countdown for hidden content of `id`, unless one
    /// is already running or teardown is disabled.
    fn arm_teardown(&mut self, id: TrackableId) {
        let Some(delay) = self.config.lost_teardown() else {
            return;
        };
        if !self.binder.contains(id)
            || self
                .lost_timers
                .get(&id)
                .is_some_and(|timer| self.timers.is_pending(*timer))
        {
            return;
        }
        let due = self.deadline(delay);
        let timer = self
            .timers
            .schedule(due, Deferred::TeardownLost { trackable_id: id });
        self.lost_timers.insert(id, timer);
        debug!(trackable_id = %id, %due, "lost content teardown armed");
    }

    fn cancel_teardown(&mut self, id: TrackableId) {
        if let Some(timer) = self.lost_timers.remove(&id) {
            if self.timers.cancel(timer).is_some() {
                debug!(trackable_id = %id, "lost content teardown cancelled");
            }
        }
    }

    fn cancel_all_timers(&mut self) {
        if let Some(pending) = self.completion.take() {
            debug!(session_id = %pending.session_id, "pending completion cancelled");
        }
        self.lost_timers.clear();
        self.timers.clear();
    }

    fn fire(&mut self, handle: TimerHandle, deferred: Deferred, now: DateTime<Utc>) {
        match deferred {
            Deferred::TeardownLost { trackable_id } => {
                if self.lost_timers.get(&trackable_id) != Some(&handle) {
                    debug!(%trackable_id, "stale teardown timer dropped");
                    return;
                }
                self.lost_timers.remove(&trackable_id);
                if self
                    .binder
                    .binding(trackable_id)
                    .is_some_and(|binding| !binding.visible)
                {
                    self.binder.destroy(trackable_id);
                    info!(
                        %trackable_id,
                        session = ?self.machine.active_marker_name(),
                        "lost content torn down"
                    );
                }
            }
            Deferred::CompleteSession { session_id } => {
                if self.completion.map(|pending| pending.session_id) != Some(session_id) {
                    debug!(%session_id, "stale completion timer dropped");
                    return;
                }
                self.completion = None;
                match self.machine.complete(session_id) {
                    Ok(ended) => {
                        self.cancel_teardown(ended.owner);
                        self.binder.destroy(ended.owner);
                        self.ledger.suppress(
                            &ended.marker_name,
                            self.config.suppression_window(),
                            now,
                        );
                        self.tracking.reset_all_reports();
                        self.prune_lost();
                        self.emit_session_ended(&ended, EndReason::Completed);
                        self.emit_transition(Transition {
                            from: SessionState::Active,
                            to: SessionState::Scanning,
                        });
                    }
                    Err(err) => debug!(%session_id, %err, "completion dropped"),
                }
            }
        }
    }

    // --- events ---

    fn emit_transition(&mut self, transition: Transition) {
        if transition.changed() {
            self.emit(SessionEvent::StateChanged {
                previous: transition.from,
                state: transition.to,
            });
        }
    }

    fn emit_session_started(&mut self, session: &ActiveSession) {
        info!(
            marker = %session.marker_name,
            session_id = %session.session_id,
            trackable_id = %session.owner,
            "session started"
        );
        self.emit(SessionEvent::SessionStarted {
            session_id: session.session_id,
            marker_name: session.marker_name.clone(),
        });
    }

    fn emit_session_ended(&mut self, session: &ActiveSession, reason: EndReason) {
        info!(
            marker = %session.marker_name,
            session_id = %session.session_id,
            ?reason,
            "session ended"
        );
        self.emit(SessionEvent::SessionEnded {
            session_id: session.session_id,
            marker_name: session.marker_name.clone(),
            reason,
        });
    }

    fn emit(&mut self, event: SessionEvent) {
        self.emitted += 1;
        self.observers.publish(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livingbooks_test_support::{
        ManualClock, MarkerScript, RecordingContentHost, RecordingObserver, StaticTemplates,
    };

    struct Harness {
        clock: ManualClock,
        coordinator: MarkerSessionCoordinator,
        observer: Arc<RecordingObserver>,
        script: MarkerScript,
    }

    fn harness() -> Harness {
        let clock = ManualClock::new();
        let mut coordinator = MarkerSessionCoordinator::with_collaborators(
            CoordinatorConfig::default(),
            Arc::new(clock.clone()),
            Arc::new(RecordingContentHost::new()),
            Arc::new(StaticTemplates::for_markers(&["fox", "owl"])),
        )
        .unwrap();
        let observer = Arc::new(RecordingObserver::new());
        coordinator.subscribe(observer.clone());
        Harness {
            clock,
            coordinator,
            observer,
            script: MarkerScript::new(),
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CoordinatorConfig {
            settle_delay_seconds: -1.0,
            ..CoordinatorConfig::default()
        };

        let result = MarkerSessionCoordinator::with_collaborators(
            config,
            Arc::new(ManualClock::new()),
            Arc::new(RecordingContentHost::new()),
            Arc::new(StaticTemplates::default()),
        );

        assert!(matches!(result, Err(DomainError::Configuration(_))));
    }

    #[test]
    fn test_huge_finite_delay_is_rejected() {
        let config = CoordinatorConfig {
            settle_delay_seconds: 1.0e13,
            ..CoordinatorConfig::default()
        };

        let result = MarkerSessionCoordinator::with_collaborators(
            config,
            Arc::new(ManualClock::new()),
            Arc::new(RecordingContentHost::new()),
            Arc::new(StaticTemplates::default()),
        );

        assert!(matches!(result, Err(DomainError::Configuration(_))));
    }

    #[test]
    fn test_completion_deadline_saturates_near_the_end_of_time() {
        let clock = ManualClock::starting_at(DateTime::<Utc>::MAX_UTC - Duration::seconds(1));
        let mut coordinator = MarkerSessionCoordinator::with_collaborators(
            CoordinatorConfig::default(),
            Arc::new(clock.clone()),
            Arc::new(RecordingContentHost::new()),
            Arc::new(StaticTemplates::for_markers(&["fox"])),
        )
        .unwrap();
        let mut script = MarkerScript::new();
        coordinator.request_start().unwrap();
        coordinator.submit(vec![script.tracking("fox")]);
        coordinator.run_pass();

        coordinator.notify_session_completed().unwrap();
        coordinator.run_pass();

        assert_eq!(coordinator.completion_due(), Some(DateTime::<Utc>::MAX_UTC));
        assert_eq!(coordinator.state(), SessionState::Active);
    }

    #[test]
    fn test_longest_allowed_delays_arm_without_overflow() {
        let config = CoordinatorConfig {
            settle_delay_seconds: livingbooks_core::config::MAX_SECONDS,
            suppression_window_seconds: livingbooks_core::config::MAX_SECONDS,
            lost_teardown_seconds: Some(livingbooks_core::config::MAX_SECONDS),
            ..CoordinatorConfig::default()
        };
        let clock = ManualClock::new();
        let mut coordinator = MarkerSessionCoordinator::with_collaborators(
            config,
            Arc::new(clock.clone()),
            Arc::new(RecordingContentHost::new()),
            Arc::new(StaticTemplates::for_markers(&["fox"])),
        )
        .unwrap();
        let mut script = MarkerScript::new();
        coordinator.request_start().unwrap();
        coordinator.submit(vec![script.tracking("fox")]);
        coordinator.run_pass();
        let start = clock.now();

        coordinator.notify_session_completed().unwrap();
        clock.advance(Duration::days(1));
        coordinator.run_pass();

        assert_eq!(coordinator.state(), SessionState::Scanning);
        assert_eq!(
            coordinator.ledger().suppressed_until("fox"),
            Some(start + Duration::days(2))
        );
    }

    #[test]
    fn test_quit_drops_every_pending_timer() {
        let config = CoordinatorConfig {
            lost_teardown_seconds: Some(1.5),
            ..CoordinatorConfig::default()
        };
        let clock = ManualClock::new();
        let mut coordinator = MarkerSessionCoordinator::with_collaborators(
            config,
            Arc::new(clock.clone()),
            Arc::new(RecordingContentHost::new()),
            Arc::new(StaticTemplates::for_markers(&["fox"])),
        )
        .unwrap();
        let mut script = MarkerScript::new();
        coordinator.request_start().unwrap();
        coordinator.submit(vec![script.tracking("fox")]);
        coordinator.run_pass();
        coordinator.notify_session_completed().unwrap();
        coordinator.submit(vec![script.lost("fox")]);
        coordinator.run_pass();
        assert_eq!(coordinator.timers.len(), 2);

        coordinator.request_quit().unwrap();

        assert!(coordinator.timers.is_empty());
        assert!(coordinator.lost_timers.is_empty());
        assert!(coordinator.next_timer_due().is_none());
        assert!(coordinator.tracking.is_empty());
    }

    #[test]
    fn test_completion_timer_is_armed_and_moved_by_repeat_signals() {
        let mut h = harness();
        h.coordinator.request_start().unwrap();
        h.coordinator.submit(vec![h.script.tracking("fox")]);
        h.coordinator.run_pass();
        let start = h.clock.now();

        h.coordinator.notify_session_completed().unwrap();
        assert_eq!(
            h.coordinator.completion_due(),
            Some(start + Duration::milliseconds(1500))
        );

        h.clock.advance_millis(1000);
        h.coordinator.notify_session_completed().unwrap();

        assert_eq!(
            h.coordinator.completion_due(),
            Some(start + Duration::milliseconds(2500))
        );
        assert_eq!(h.coordinator.timers.len(), 1);
    }

    #[test]
    fn test_pause_parks_completion_and_resume_rearms_it() {
        let mut h = harness();
        h.coordinator.request_start().unwrap();
        h.coordinator.submit(vec![h.script.tracking("fox")]);
        h.coordinator.run_pass();
        h.coordinator.notify_session_completed().unwrap();

        h.coordinator.request_pause().unwrap();
        assert!(h.coordinator.is_completion_pending());
        assert!(h.coordinator.completion_due().is_none());
        assert!(h.coordinator.timers.is_empty());

        h.clock.advance_millis(5000);
        h.coordinator.run_pass();
        assert_eq!(h.coordinator.state(), SessionState::Paused);

        h.coordinator.request_resume().unwrap();
        assert_eq!(
            h.coordinator.completion_due(),
            Some(h.clock.now() + Duration::milliseconds(1500))
        );
        h.clock.advance_millis(1500);
        h.coordinator.run_pass();

        assert_eq!(h.coordinator.state(), SessionState::Scanning);
        assert_eq!(h.observer.ended(), vec!["fox".to_owned()]);
    }

    #[test]
    fn test_stale_timer_does_not_complete_newer_session() {
        let mut h = harness();
        h.coordinator.request_start().unwrap();
        h.coordinator.submit(vec![h.script.tracking("fox")]);
        h.coordinator.run_pass();
        let fox_session = h.coordinator.active_session().unwrap().session_id;

        // Simulate a timer that escaped cancellation.
        let due = h.clock.now();
        h.coordinator.timers.schedule(
            due,
            Deferred::CompleteSession {
                session_id: fox_session,
            },
        );
        h.coordinator.submit(vec![h.script.tracking("owl")]);
        h.coordinator.run_pass();
        h.coordinator.run_pass();

        assert_eq!(h.coordinator.state(), SessionState::Active);
        assert_eq!(h.coordinator.active_marker_name(), Some("owl"));
    }

    #[test]
    fn test_pass_report_counts_work() {
        let mut h = harness();
        h.coordinator.request_start().unwrap();
        h.coordinator.submit(vec![h.script.tracking("fox"), h.script.tracking("owl")]);
        h.coordinator.submit(vec![h.script.tracking("fox")]);

        let report = h.coordinator.run_pass();

        assert_eq!(report.batches, 2);
        assert_eq!(report.observations, 3);
        assert_eq!(report.timers_fired, 0);
        // Scanning → Active, then SessionStarted.
        assert_eq!(report.events, 2);
    }
}
