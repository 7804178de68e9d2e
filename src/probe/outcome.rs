use crate::model::ProbeResult;
use std::io;

/// The single event that settles a probe.
///
/// Spawn, exit and timer races are collapsed into one value before anything is reported, so
/// a probe can never resolve twice.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// The process was started; nothing is known about how it would finish.
    Started,
    /// The process finished. `None` means it was terminated by a signal.
    Exited(Option<i32>),
    SpawnFailed(io::Error),
    WaitFailed(io::Error),
    TimedOut,
}

impl ProbeOutcome {
    pub fn into_result(self, name: &str) -> ProbeResult {
        let (reachable, detail) = match self {
            ProbeOutcome::Started | ProbeOutcome::Exited(None) | ProbeOutcome::Exited(Some(0)) => {
                (true, None)
            }
            ProbeOutcome::Exited(Some(code)) => (false, Some(format!("exit code {code}"))),
            ProbeOutcome::SpawnFailed(e) if e.kind() == io::ErrorKind::NotFound => {
                (false, Some("not found".to_string()))
            }
            ProbeOutcome::SpawnFailed(e) => (false, Some(format!("not found: {e}"))),
            ProbeOutcome::WaitFailed(e) => (false, Some(format!("wait failed: {e}"))),
            ProbeOutcome::TimedOut => (false, Some("timeout".to_string())),
        };
        ProbeResult {
            name: name.to_string(),
            reachable,
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(outcome: ProbeOutcome) -> (bool, Option<String>) {
        let r = outcome.into_result("srv");
        assert_eq!(r.name, "srv");
        (r.reachable, r.detail)
    }

    #[test]
    fn started_and_clean_exits_are_reachable() {
        assert_eq!(resolve(ProbeOutcome::Started), (true, None));
        assert_eq!(resolve(ProbeOutcome::Exited(Some(0))), (true, None));
        assert_eq!(resolve(ProbeOutcome::Exited(None)), (true, None));
    }

    #[test]
    fn nonzero_exit_reports_code() {
        assert_eq!(
            resolve(ProbeOutcome::Exited(Some(127))),
            (false, Some("exit code 127".to_string()))
        );
    }

    #[test]
    fn spawn_failures_read_as_not_found() {
        let missing = io::Error::new(io::ErrorKind::NotFound, "no such file");
        assert_eq!(
            resolve(ProbeOutcome::SpawnFailed(missing)),
            (false, Some("not found".to_string()))
        );

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let (reachable, detail) = resolve(ProbeOutcome::SpawnFailed(denied));
        assert!(!reachable);
        assert!(detail.unwrap().starts_with("not found: "));
    }

    #[test]
    fn timeout_is_unreachable() {
        assert_eq!(
            resolve(ProbeOutcome::TimedOut),
            (false, Some("timeout".to_string()))
        );
    }
}
