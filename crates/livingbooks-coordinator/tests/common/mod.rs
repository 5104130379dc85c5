//! Shared fixtures for coordinator integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use livingbooks_coordinator::MarkerSessionCoordinator;
use livingbooks_core::config::CoordinatorConfig;
use livingbooks_core::observation::MarkerObservation;
use livingbooks_test_support::{
    ManualClock, MarkerScript, RecordingContentHost, RecordingObserver, StaticTemplates,
};

/// A coordinator wired to recording collaborators.
pub struct Fixture {
    pub clock: ManualClock,
    pub host: Arc<RecordingContentHost>,
    pub observer: Arc<RecordingObserver>,
    pub script: MarkerScript,
    pub coordinator: MarkerSessionCoordinator,
}

impl Fixture {
    /// Delivers one batch and runs a pass.
    pub fn deliver(&mut self, batch: Vec<MarkerObservation>) {
        self.coordinator.submit(batch);
        self.coordinator.run_pass();
    }

    /// Delivers a single `Tracking` observation of `name` and runs a pass.
    pub fn see(&mut self, name: &str) {
        let observation = self.script.tracking(name);
        self.deliver(vec![observation]);
    }

    pub fn lose(&mut self, name: &str) {
        let observation = self.script.lost(name);
        self.deliver(vec![observation]);
    }

    /// Advances the clock and runs an empty pass so due timers fire.
    pub fn wait_millis(&mut self, millis: i64) {
        self.clock.advance_millis(millis);
        self.coordinator.run_pass();
    }
}

/// Templates for `fox` and `owl`, default config.
pub fn fixture() -> Fixture {
    fixture_with(CoordinatorConfig::default(), &["fox", "owl"])
}

pub fn fixture_with(config: CoordinatorConfig, templates: &[&str]) -> Fixture {
    let clock = ManualClock::new();
    let host = Arc::new(RecordingContentHost::new());
    let mut coordinator = MarkerSessionCoordinator::with_collaborators(
        config,
        Arc::new(clock.clone()),
        host.clone(),
        Arc::new(StaticTemplates::for_markers(templates)),
    )
    .unwrap();
    let observer = Arc::new(RecordingObserver::new());
    coordinator.subscribe(observer.clone());
    Fixture {
        clock,
        host,
        observer,
        script: MarkerScript::new(),
        coordinator,
    }
}

/// A started fixture, already scanning.
pub fn scanning() -> Fixture {
    let mut fixture = fixture();
    fixture.coordinator.request_start().unwrap();
    fixture
}
