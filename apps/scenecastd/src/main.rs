//! scenecastd: automated OBS scene switching driven by a scraped
//! scoreboard.

mod config;
mod source;

use std::path::PathBuf;
use std::sync::Arc;

use scenecast_obs_client::{ObsConfig, ReconnectConfig, Supervisor};
use scenecast_orchestrator::{
    CadenceGovernor, FieldController, ManualOverride, Orchestrator, OrchestratorError,
    SceneSwitcher,
};
use scenecast_rules::{ActiveRuleset, Engine, RuleSet, RuleWatcher, load_rules};
use scenecast_scoreboard::StateMachine;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::{Config, DEFAULT_CONFIG_PATH};
use source::FileSource;

/// Bridges the orchestrator's switch seam onto the OBS supervisor.
struct ObsSceneSwitcher {
    supervisor: Arc<Supervisor>,
}

impl SceneSwitcher for ObsSceneSwitcher {
    async fn switch(&self, scene: &str) -> Result<(), OrchestratorError> {
        self.supervisor
            .set_current_scene(scene)
            .await
            .map_err(|err| OrchestratorError::Switch(err.to_string()))
    }

    async fn switch_nowait(&self, scene: &str) -> Result<(), OrchestratorError> {
        self.supervisor
            .set_current_scene_nowait(scene)
            .await
            .map_err(|err| OrchestratorError::Switch(err.to_string()))
    }
}

fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("SCENECAST_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Loads the rule document. A missing file means built-ins only; a
/// malformed one is a startup error rather than a silent fallback.
fn load_ruleset(config: &Config) -> Result<RuleSet, String> {
    let Some(path) = &config.rules_path else {
        info!("no rules file configured, using built-in behavior");
        return Ok(RuleSet::default());
    };
    match load_rules(path) {
        Ok(ruleset) => {
            info!(path = %path.display(), rules = ruleset.len(), "rules loaded");
            Ok(ruleset)
        }
        Err(scenecast_rules::RuleError::Io(err)) => {
            warn!(path = %path.display(), error = %err, "rules file unreadable, using built-in behavior");
            Ok(RuleSet::default())
        }
        Err(err) => Err(format!("invalid rules file {}: {err}", path.display())),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,scenecast=debug")),
        )
        .init();

    let path = config_path();
    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(err) => {
            error!(path = %path.display(), error = %err, "failed to load config");
            std::process::exit(1);
        }
    };

    let ruleset = match load_ruleset(&config) {
        Ok(ruleset) => ruleset,
        Err(message) => {
            error!("{message}");
            std::process::exit(1);
        }
    };
    let active = ActiveRuleset::new(ruleset);

    let _rule_watcher = config.rules_path.as_ref().and_then(|rules_path| {
        match RuleWatcher::spawn(rules_path, active.clone()) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                warn!(error = %err, "rules watcher failed to start, hot reload disabled");
                None
            }
        }
    });

    let root_cancel = CancellationToken::new();

    let supervisor = Arc::new(Supervisor::new(
        ObsConfig {
            url: config.obs.url(),
            password: config.obs.password.clone(),
            reconnect: ReconnectConfig::default(),
        },
        root_cancel.child_token(),
    ));
    let supervisor_task = tokio::spawn({
        let supervisor = Arc::clone(&supervisor);
        async move { supervisor.run().await }
    });

    let mut controllers = Vec::new();
    for field in &config.fields {
        let controller = FieldController::new(
            field.name.clone(),
            FileSource::new(&field.snapshot_path),
            StateMachine::new(config.detection.clone().into()),
            Engine::new(active.clone()),
            Orchestrator::new(
                ObsSceneSwitcher {
                    supervisor: Arc::clone(&supervisor),
                },
                config.scenes.clone(),
                config.timings.clone(),
            ),
            ManualOverride::new(&config.pause_sentinel),
            CadenceGovernor::new(&config.timings),
            root_cancel.child_token(),
        );
        info!(field = %field.name, snapshot = %field.snapshot_path.display(), "starting field controller");
        controllers.push(tokio::spawn(controller.run()));
    }

    shutdown_signal().await;
    info!("shutting down");
    root_cancel.cancel();

    for controller in controllers {
        let _ = controller.await;
    }
    let _ = supervisor_task.await;
}

async fn shutdown_signal() {
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate => {}
    }
}
