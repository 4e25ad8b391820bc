//! The per-field control loop.
//!
//! One `FieldController` owns everything for one monitored field: the
//! scoreboard source, the state machine, the rule engine and the
//! orchestrator. The loop is: override check, poll, observe, publish
//! facts, evaluate rules, act (plan or built-in), sleep at the governed
//! cadence.

use std::time::Duration;

use scenecast_rules::{Engine, FactValue, Facts};
use scenecast_scoreboard::{GameState, Reading, ScoreboardError, ScoreboardSource, StateMachine};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cadence::CadenceGovernor;
use crate::manual::ManualOverride;
use crate::orchestrator::Orchestrator;
use crate::switcher::SceneSwitcher;

pub struct FieldController<S: SceneSwitcher, P: ScoreboardSource> {
    field: String,
    source: P,
    machine: StateMachine,
    engine: Engine,
    orchestrator: Orchestrator<S>,
    manual: ManualOverride,
    cadence: CadenceGovernor,
    cancel: CancellationToken,
}

impl<S: SceneSwitcher, P: ScoreboardSource + Send> FieldController<S, P> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        field: impl Into<String>,
        source: P,
        machine: StateMachine,
        engine: Engine,
        orchestrator: Orchestrator<S>,
        manual: ManualOverride,
        cadence: CadenceGovernor,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            field: field.into(),
            source,
            machine,
            engine,
            orchestrator,
            manual,
            cadence,
            cancel,
        }
    }

    /// Runs until the cancellation token fires.
    pub async fn run(mut self) {
        info!(field = %self.field, "field controller started");

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            if self.manual.check() {
                self.orchestrator.cancel_active().await;
                if self.sleep_or_cancel(self.cadence.interval(false, None)).await {
                    break;
                }
                continue;
            }

            let reading = self.poll_once().await;
            let transition = self.machine.observe(&reading);
            let game_started = self.machine.take_game_just_started();

            if let Some(t) = &transition {
                self.orchestrator.on_transition(t).await;
            }

            let facts = self.build_facts(&reading, game_started).await;
            match self.engine.evaluate(&facts) {
                Some(plan) => self.orchestrator.on_action_plan(plan).await,
                None => {
                    self.orchestrator.clear_rule_latch().await;
                    if game_started {
                        self.orchestrator.start_breakout().await;
                    } else if let Some(t) = &transition {
                        self.orchestrator.switch_for_transition(t).await;
                    }
                    self.orchestrator.rotation_tick().await;
                }
            }

            let interval = self.cadence.interval(
                self.orchestrator.sequence_active().await,
                reading.break_timer,
            );
            if self.sleep_or_cancel(interval).await {
                break;
            }
        }

        self.orchestrator.cancel_active().await;
        info!(field = %self.field, "field controller stopped");
    }

    /// Poll failures map to an absent reading: the machine holds state
    /// and settles into intermission only on sustained absence.
    async fn poll_once(&mut self) -> Reading {
        match self.source.poll().await {
            Ok(reading) => reading,
            Err(ScoreboardError::Unavailable(reason)) => {
                debug!(field = %self.field, %reason, "scoreboard unavailable");
                Reading::absent(std::time::Instant::now())
            }
            Err(ScoreboardError::InvalidData(reason)) => {
                warn!(field = %self.field, %reason, "invalid scoreboard data");
                Reading::absent(std::time::Instant::now())
            }
        }
    }

    async fn build_facts(&self, reading: &Reading, game_started: bool) -> Facts {
        let mut facts = Facts::new();
        facts.set("state", self.machine.state().as_str());
        facts.set("paused", self.machine.state() == GameState::GamePaused);
        facts.set("game_started", game_started);
        facts.set("cycles_in_state", self.machine.cycles_in_state() as i64);
        facts.set("team1", reading.team1.as_str());
        facts.set("team2", reading.team2.as_str());
        facts.set(
            "game_time",
            reading.game_timer.map_or(FactValue::Null, FactValue::from),
        );
        facts.set(
            "break_time",
            reading.break_timer.map_or(FactValue::Null, FactValue::from),
        );
        facts.set("manual_override", self.manual.engaged());
        if let Some(reason) = self.machine.last_reason() {
            facts.set("last_reason", reason.as_str());
        }
        if let Some(scene) = self.orchestrator.current_scene().await {
            facts.set("current_scene", scene);
        }
        facts
    }

    async fn sleep_or_cancel(&self, interval: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => true,
            _ = tokio::time::sleep(interval) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SceneConfig, TimingConfig};
    use crate::testutil::RecordingSwitcher;
    use scenecast_rules::{ActiveRuleset, RuleSet};
    use scenecast_scoreboard::StateMachineConfig;
    use std::collections::VecDeque;
    use std::time::Instant;

    /// Replays a script of readings. Once the script runs out it keeps
    /// the game clock counting down like a live scoreboard, so repeated
    /// polls do not look like a frozen (paused) clock.
    struct ScriptedSource {
        script: VecDeque<Reading>,
        last: Option<Reading>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Reading>) -> Self {
            Self {
                script: script.into(),
                last: None,
            }
        }
    }

    impl ScoreboardSource for ScriptedSource {
        async fn poll(&mut self) -> Result<Reading, ScoreboardError> {
            match self.script.pop_front() {
                Some(next) => self.last = Some(next),
                None => {
                    if let Some(last) = &mut self.last {
                        last.break_timer = None;
                        last.game_timer = last.game_timer.map(|g| g.saturating_sub(1));
                    }
                }
            }
            Ok(self.last.clone().expect("non-empty script"))
        }
    }

    fn reading(break_timer: Option<u32>, game_timer: Option<u32>) -> Reading {
        Reading {
            team1: "ironmen".into(),
            team2: "dynasty".into(),
            break_timer,
            game_timer,
            timestamp: Instant::now(),
        }
    }

    fn controller(
        switcher: RecordingSwitcher,
        source: ScriptedSource,
        ruleset: RuleSet,
        manual_path: &std::path::Path,
        cancel: CancellationToken,
    ) -> FieldController<RecordingSwitcher, ScriptedSource> {
        let timings = TimingConfig::default();
        FieldController::new(
            "field1",
            source,
            StateMachine::new(StateMachineConfig::default()),
            Engine::new(ActiveRuleset::new(ruleset)),
            Orchestrator::new(switcher, SceneConfig::default(), timings.clone()),
            ManualOverride::new(manual_path),
            CadenceGovernor::new(&timings),
            cancel,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn game_start_runs_the_breakout_sequence() {
        let switcher = RecordingSwitcher::new();
        let tmp = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();

        let source = ScriptedSource::new(vec![
            reading(Some(30), Some(280)),
            reading(Some(29), Some(280)),
            reading(Some(28), Some(300)),
        ]);
        let ctrl = controller(
            switcher.clone(),
            source,
            RuleSet::default(),
            &tmp.path().join("pause"),
            cancel.clone(),
        );

        let handle = tokio::spawn(ctrl.run());
        tokio::time::sleep(Duration::from_secs(60)).await;
        cancel.cancel();
        handle.await.unwrap();

        let scenes = switcher.scenes();
        // Break classification switches to default, then the common
        // start value fires the full breakout.
        assert_eq!(scenes, ["default", "breakout", "default", "game"]);
        assert!(switcher.calls()[1].nowait);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_override_suppresses_all_switching() {
        let switcher = RecordingSwitcher::new();
        let tmp = tempfile::tempdir().unwrap();
        let sentinel = tmp.path().join("pause");
        std::fs::write(&sentinel, b"").unwrap();
        let cancel = CancellationToken::new();

        let source = ScriptedSource::new(vec![
            reading(Some(30), Some(280)),
            reading(Some(28), Some(300)),
        ]);
        let ctrl = controller(
            switcher.clone(),
            source,
            RuleSet::default(),
            &sentinel,
            cancel.clone(),
        );

        let handle = tokio::spawn(ctrl.run());
        tokio::time::sleep(Duration::from_secs(30)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert!(switcher.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn matching_rule_overrides_the_built_in_breakout() {
        let switcher = RecordingSwitcher::new();
        let tmp = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();

        let ruleset = RuleSet::parse(
            r#"{
                "rules": [{
                    "name": "sponsor_intro",
                    "priority": 100,
                    "conditions": [{"field": "game_started", "operator": "eq", "value": true}],
                    "actions": [{"type": "switch_scene", "scene": "sponsor"}]
                }]
            }"#,
        )
        .unwrap();

        let source = ScriptedSource::new(vec![
            reading(Some(30), Some(280)),
            reading(Some(29), Some(280)),
            reading(Some(28), Some(300)),
        ]);
        let ctrl = controller(
            switcher.clone(),
            source,
            ruleset,
            &tmp.path().join("pause"),
            cancel.clone(),
        );

        let handle = tokio::spawn(ctrl.run());
        tokio::time::sleep(Duration::from_secs(60)).await;
        cancel.cancel();
        handle.await.unwrap();

        let scenes = switcher.scenes();
        assert!(scenes.contains(&"sponsor".to_owned()));
        assert!(!scenes.contains(&"breakout".to_owned()));
    }

    #[tokio::test(start_paused = true)]
    async fn sustained_poll_failure_falls_back_to_interview() {
        let switcher = RecordingSwitcher::new();
        let tmp = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();

        struct FailingSource {
            good_polls: u32,
        }
        impl ScoreboardSource for FailingSource {
            async fn poll(&mut self) -> Result<Reading, ScoreboardError> {
                if self.good_polls > 0 {
                    self.good_polls -= 1;
                    return Ok(Reading {
                        team1: "ironmen".into(),
                        team2: "dynasty".into(),
                        break_timer: None,
                        game_timer: Some(280),
                        timestamp: Instant::now(),
                    });
                }
                Err(ScoreboardError::Unavailable("scrape failed".into()))
            }
        }

        let timings = TimingConfig::default();
        let ctrl = FieldController::new(
            "field1",
            FailingSource { good_polls: 2 },
            StateMachine::new(StateMachineConfig::default()),
            Engine::new(ActiveRuleset::new(RuleSet::default())),
            Orchestrator::new(switcher.clone(), SceneConfig::default(), timings.clone()),
            ManualOverride::new(tmp.path().join("pause")),
            CadenceGovernor::new(&timings),
            cancel.clone(),
        );

        let handle = tokio::spawn(ctrl.run());
        tokio::time::sleep(Duration::from_secs(30)).await;
        cancel.cancel();
        handle.await.unwrap();

        let scenes = switcher.scenes();
        assert_eq!(scenes.first().map(String::as_str), Some("game"));
        assert_eq!(scenes.last().map(String::as_str), Some("interview"));
    }
}
