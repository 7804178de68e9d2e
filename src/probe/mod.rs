//! Launchability probes.
//!
//! A probe runs the server's command with `--help` appended and all stdio discarded. It says
//! whether the executable can be started, not whether it speaks MCP.

mod outcome;

use outcome::ProbeOutcome;

use crate::model::{AppConfig, Entry, LaunchDefinition, ProbeMode, ProbeResult};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

pub const HELP_FLAG: &str = "--help";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(6);

/// How long to wait for a killed child to be reaped.
const REAP_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct Prober {
    timeout: Duration,
    mode: ProbeMode,
}

impl Default for Prober {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, ProbeMode::Launch)
    }
}

impl Prober {
    pub fn new(timeout: Duration, mode: ProbeMode) -> Self {
        Self { timeout, mode }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(cfg.probe_timeout, cfg.probe_mode)
    }

    pub async fn probe(&self, name: &str, def: &LaunchDefinition) -> ProbeResult {
        let outcome = self.run(def).await;
        tracing::debug!(server = name, ?outcome, "probe resolved");
        outcome.into_result(name)
    }

    /// Probe every entry concurrently. Results come back in input order.
    pub async fn probe_all(&self, entries: &[Entry]) -> Vec<ProbeResult> {
        let probes = entries
            .iter()
            .map(|entry| self.probe(&entry.name, &entry.definition));
        futures::future::join_all(probes).await
    }

    async fn run(&self, def: &LaunchDefinition) -> ProbeOutcome {
        let mut cmd = Command::new(&def.command);
        cmd.args(&def.args)
            .arg(HELP_FLAG)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(env) = &def.env {
            cmd.envs(env);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return ProbeOutcome::SpawnFailed(e),
        };

        let outcome = match self.mode {
            ProbeMode::Launch => ProbeOutcome::Started,
            ProbeMode::Exit => match tokio::time::timeout(self.timeout, child.wait()).await {
                Ok(Ok(status)) => return ProbeOutcome::Exited(status.code()),
                Ok(Err(e)) => ProbeOutcome::WaitFailed(e),
                Err(_) => ProbeOutcome::TimedOut,
            },
        };

        // Still running: terminate and reap so no zombie outlives the probe.
        if let Err(e) = child.start_kill() {
            tracing::debug!(command = %def.command, error = %e, "probe child already gone");
        }
        let _ = tokio::time::timeout(REAP_GRACE, child.wait()).await;
        outcome
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::time::Instant;

    fn sh(script: &str) -> LaunchDefinition {
        LaunchDefinition::new("sh", vec!["-c".into(), script.into()])
    }

    fn exit_prober(timeout: Duration) -> Prober {
        Prober::new(timeout, ProbeMode::Exit)
    }

    #[tokio::test]
    async fn missing_executable_is_not_found_quickly() {
        let started = Instant::now();
        let def = LaunchDefinition::new("/nonexistent/xyz", vec![]);
        let result = Prober::default().probe("ghost", &def).await;

        assert_eq!(result.name, "ghost");
        assert!(!result.reachable);
        assert!(result.detail.unwrap().starts_with("not found"));
        assert!(started.elapsed() < DEFAULT_TIMEOUT);
    }

    #[tokio::test]
    async fn launch_mode_counts_a_started_process() {
        // would fail in exit mode; launch mode never waits for it
        let result = Prober::default().probe("s", &sh("exit 9")).await;
        assert!(result.reachable);
        assert!(result.detail.is_none());
    }

    #[tokio::test]
    async fn launch_mode_kills_a_long_running_server() {
        let started = Instant::now();
        let result = Prober::new(Duration::from_secs(10), ProbeMode::Launch)
            .probe("daemon", &sh("exec sleep 30"))
            .await;

        assert!(result.reachable);
        assert!(result.detail.is_none());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn exit_mode_reports_exit_codes() {
        let prober = exit_prober(Duration::from_secs(5));

        let ok = prober.probe("ok", &sh("exit 0")).await;
        assert!(ok.reachable);

        let bad = prober.probe("bad", &sh("exit 3")).await;
        assert!(!bad.reachable);
        assert_eq!(bad.detail.as_deref(), Some("exit code 3"));
    }

    #[tokio::test]
    async fn exit_by_signal_counts_as_reachable() {
        let result = exit_prober(Duration::from_secs(5))
            .probe("sig", &sh("kill -9 $$"))
            .await;
        assert!(result.reachable);
    }

    #[tokio::test]
    async fn hung_process_times_out_and_is_killed() {
        let started = Instant::now();
        let result = exit_prober(Duration::from_millis(200))
            .probe("slow", &sh("exec sleep 30"))
            .await;

        assert!(!result.reachable);
        assert_eq!(result.detail.as_deref(), Some("timeout"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn env_overrides_reach_the_child() {
        let prober = exit_prober(Duration::from_secs(5));
        let script = r#"test "$CXMCP_PROBE" = yes"#;

        let mut env = BTreeMap::new();
        env.insert("CXMCP_PROBE".to_string(), "yes".to_string());
        let with_env = prober.probe("e", &sh(script).with_env(env)).await;
        assert!(with_env.reachable);

        let without = prober.probe("e", &sh(script)).await;
        assert_eq!(without.detail.as_deref(), Some("exit code 1"));
    }

    #[tokio::test]
    async fn probe_all_keeps_input_order() {
        let entries: Vec<Entry> = [
            ("one", sh("exit 0")),
            ("two", LaunchDefinition::new("/nonexistent/xyz", vec![])),
            ("three", sh("exit 2")),
        ]
        .into_iter()
        .map(|(name, definition)| Entry {
            name: name.to_string(),
            definition,
            enabled: true,
        })
        .collect();

        let results = exit_prober(Duration::from_secs(5))
            .probe_all(&entries)
            .await;
        let summary: Vec<(&str, bool)> = results
            .iter()
            .map(|r| (r.name.as_str(), r.reachable))
            .collect();
        assert_eq!(
            summary,
            vec![("one", true), ("two", false), ("three", false)]
        );
    }
}
