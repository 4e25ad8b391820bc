//! The orchestrator proper: built-in sequences, rotation, action-plan
//! execution.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, join_all};
use scenecast_rules::{Action, ActionPlan};
use scenecast_scoreboard::{GameState, StateTransition, TransitionReason};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::SceneSwitchCache;
use crate::config::{SceneConfig, TimingConfig};
use crate::sequence::SequenceSlot;
use crate::switcher::SceneSwitcher;

/// Game/default alternation during active play.
///
/// Driven by control-loop ticks rather than its own timer so that
/// suspension preserves the phase exactly: no time accumulates between
/// `suspend` and `resume`.
#[derive(Debug)]
struct Rotation {
    period: Duration,
    running: bool,
    suspended: bool,
    game_phase: bool,
    phase_elapsed: Duration,
    last_tick: Option<Instant>,
}

impl Rotation {
    fn new(period: Duration) -> Self {
        Self {
            period,
            running: false,
            suspended: false,
            game_phase: true,
            phase_elapsed: Duration::ZERO,
            last_tick: None,
        }
    }

    fn start(&mut self) {
        self.running = true;
        self.suspended = false;
        self.game_phase = true;
        self.phase_elapsed = Duration::ZERO;
        self.last_tick = None;
    }

    fn stop(&mut self) {
        self.running = false;
        self.last_tick = None;
    }

    fn suspend(&mut self) {
        self.suspended = true;
        self.last_tick = None;
    }

    fn resume(&mut self) {
        if self.running {
            self.suspended = false;
            self.last_tick = None;
        }
    }

    /// Accumulates elapsed time; returns the new phase when it flips.
    fn tick(&mut self, now: Instant) -> Option<bool> {
        if !self.running || self.suspended {
            return None;
        }
        if let Some(last) = self.last_tick {
            self.phase_elapsed += now.saturating_duration_since(last);
        }
        self.last_tick = Some(now);

        if self.phase_elapsed >= self.period {
            self.game_phase = !self.game_phase;
            self.phase_elapsed = Duration::ZERO;
            return Some(self.game_phase);
        }
        None
    }

    /// Flips immediately, if rotating. Used by the `rotation_kick`
    /// custom action.
    fn force_flip(&mut self) -> Option<bool> {
        if !self.running {
            return None;
        }
        self.game_phase = !self.game_phase;
        self.phase_elapsed = Duration::ZERO;
        Some(self.game_phase)
    }
}

/// State shared with spawned sequence tasks.
struct Shared<S> {
    switcher: S,
    cache: Mutex<SceneSwitchCache>,
    rotation: Mutex<Rotation>,
    scenes: SceneConfig,
    timings: TimingConfig,
}

impl<S: SceneSwitcher> Shared<S> {
    /// Cached, awaited switch.
    async fn send(&self, scene: &str) {
        if !self.cache.lock().await.should_send(scene) {
            debug!(scene, "switch suppressed, scene already requested");
            return;
        }
        match self.switcher.switch(scene).await {
            Ok(()) => debug!(scene, "scene switched"),
            Err(err) => warn!(scene, error = %err, "scene switch failed"),
        }
    }

    /// Cached, fire-and-forget switch. No acknowledgment is awaited.
    async fn send_nowait(&self, scene: &str) {
        if !self.cache.lock().await.should_send(scene) {
            debug!(scene, "switch suppressed, scene already requested");
            return;
        }
        if let Err(err) = self.switcher.switch_nowait(scene).await {
            warn!(scene, error = %err, "scene switch failed");
        }
    }
}

/// Scene orchestrator for one monitored field.
pub struct Orchestrator<S: SceneSwitcher> {
    shared: Arc<Shared<S>>,
    slot: SequenceSlot,
    last_rule: Mutex<Option<String>>,
}

impl<S: SceneSwitcher> Orchestrator<S> {
    pub fn new(switcher: S, scenes: SceneConfig, timings: TimingConfig) -> Self {
        let rotation = Rotation::new(timings.rotation_period());
        Self {
            shared: Arc::new(Shared {
                switcher,
                cache: Mutex::new(SceneSwitchCache::new()),
                rotation: Mutex::new(rotation),
                scenes,
                timings,
            }),
            slot: SequenceSlot::new(),
            last_rule: Mutex::new(None),
        }
    }

    /// Bookkeeping for a state transition: cancels the in-flight
    /// sequence where the transition invalidates it and keeps rotation
    /// in step. Scene responses are separate (`switch_for_transition`)
    /// so a matching rule can override them.
    pub async fn on_transition(&self, transition: &StateTransition) {
        let mut rotation = self.shared.rotation.lock().await;
        match (transition.to, transition.reason) {
            (GameState::GamePaused, _) => {
                drop(rotation);
                self.slot.cancel_current().await;
                self.shared.rotation.lock().await.suspend();
            }
            (GameState::GameActive, TransitionReason::ResumeDetected) => rotation.resume(),
            (GameState::GameActive, _) => rotation.start(),
            (GameState::Break | GameState::Intermission, _) => {
                rotation.stop();
                drop(rotation);
                self.slot.cancel_current().await;
            }
            (GameState::Unknown, _) => {}
        }
        // A new transition re-arms rule plans.
        *self.last_rule.lock().await = None;
    }

    /// Built-in scene response to a transition, applied when no rule
    /// claimed the cycle.
    pub async fn switch_for_transition(&self, transition: &StateTransition) {
        match transition.to {
            GameState::Break => self.shared.send(&self.shared.scenes.default_scene).await,
            GameState::Intermission => self.shared.send(&self.shared.scenes.interview).await,
            GameState::GameActive => self.shared.send(&self.shared.scenes.game).await,
            GameState::GamePaused | GameState::Unknown => {}
        }
    }

    /// Runs the breakout sequence as the active sequence, displacing
    /// any incumbent.
    pub async fn start_breakout(&self) {
        let shared = Arc::clone(&self.shared);
        self.slot
            .start(move |cancel| run_breakout(shared, cancel))
            .await;
    }

    /// Runs a rule's action plan as the active sequence. A plan for the
    /// rule that is already latched is ignored; the latch clears on the
    /// next transition or non-matching cycle, so a rule fires once per
    /// match episode rather than once per poll.
    pub async fn on_action_plan(&self, plan: ActionPlan) {
        {
            let mut last = self.last_rule.lock().await;
            if last.as_deref() == Some(plan.rule_name.as_str()) {
                return;
            }
            *last = Some(plan.rule_name.clone());
        }

        info!(rule = %plan.rule_name, "starting rule action plan");
        let shared = Arc::clone(&self.shared);
        self.slot
            .start(move |cancel| run_actions(shared, plan.actions, cancel))
            .await;
    }

    /// Clears the rule latch after a cycle with no matching rule.
    pub async fn clear_rule_latch(&self) {
        *self.last_rule.lock().await = None;
    }

    /// Advances rotation. Skipped while a sequence is active so the
    /// rotation cannot talk over a breakout or a rule plan.
    pub async fn rotation_tick(&self) {
        if self.slot.is_active().await {
            return;
        }
        let flipped = self.shared.rotation.lock().await.tick(Instant::now());
        if let Some(game_phase) = flipped {
            let scene = if game_phase {
                self.shared.scenes.game.clone()
            } else {
                self.shared.scenes.default_scene.clone()
            };
            debug!(scene = %scene, "rotation flip");
            self.shared.send(&scene).await;
        }
    }

    pub async fn sequence_active(&self) -> bool {
        self.slot.is_active().await
    }

    /// Cancels the active sequence and waits for it to stop.
    pub async fn cancel_active(&self) {
        self.slot.cancel_current().await;
    }

    pub async fn current_scene(&self) -> Option<String> {
        self.shared
            .cache
            .lock()
            .await
            .last_requested()
            .map(str::to_owned)
    }

    /// Forgets the cached scene. Called after a reconnect, when the
    /// remote program scene is unknown again.
    pub async fn clear_switch_cache(&self) {
        self.shared.cache.lock().await.clear();
    }
}

/// Breakout: instant cut to the breakout scene, default after the hold,
/// game after the extra stage. The first switch is fire-and-forget;
/// cancellation is observed between stages only.
async fn run_breakout<S: SceneSwitcher>(shared: Arc<Shared<S>>, cancel: CancellationToken) {
    info!("breakout sequence started");
    shared.send_nowait(&shared.scenes.breakout).await;

    tokio::select! {
        _ = cancel.cancelled() => {
            debug!("breakout sequence cancelled");
            return;
        }
        _ = tokio::time::sleep(shared.timings.breakout_hold()) => {}
    }
    shared.send(&shared.scenes.default_scene).await;

    tokio::select! {
        _ = cancel.cancelled() => {
            debug!("breakout sequence cancelled");
            return;
        }
        _ = tokio::time::sleep(shared.timings.breakout_extra()) => {}
    }
    shared.send(&shared.scenes.game).await;
    debug!("breakout sequence finished");
}

/// Executes a plan's actions in order, checking cancellation at each
/// stage boundary. Boxed for recursion through nested sequences.
fn run_actions<S: SceneSwitcher>(
    shared: Arc<Shared<S>>,
    actions: Vec<Action>,
    cancel: CancellationToken,
) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        for action in actions {
            if cancel.is_cancelled() {
                return;
            }
            match action {
                Action::SwitchScene { scene } => shared.send(&scene).await,
                Action::Delay { seconds } => {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(Duration::from_secs_f64(seconds)) => {}
                    }
                }
                Action::Sequence { actions } => {
                    run_actions(Arc::clone(&shared), actions, cancel.clone()).await;
                }
                Action::Parallel { actions } => {
                    let branches: Vec<_> = actions
                        .into_iter()
                        .map(|a| run_actions(Arc::clone(&shared), vec![a], cancel.clone()))
                        .collect();
                    join_all(branches).await;
                }
                Action::Custom { handler } => match handler.as_str() {
                    "breakout" => run_breakout(Arc::clone(&shared), cancel.clone()).await,
                    "rotation_kick" => {
                        let flipped = shared.rotation.lock().await.force_flip();
                        if let Some(game_phase) = flipped {
                            let scene = if game_phase {
                                shared.scenes.game.clone()
                            } else {
                                shared.scenes.default_scene.clone()
                            };
                            shared.send(&scene).await;
                        }
                    }
                    other => warn!(handler = other, "unknown custom action handler, skipping"),
                },
            }
        }
    })
}
