//! Liveness and readiness probes over the storage pool.
//!
//! # Invariants
//! - Probes are stateless and recomputed on every call.
//! - Liveness depends only on a connectivity ping.
//! - Readiness additionally requires at most [`MAX_OPEN_CONNECTIONS`]
//!   checked-out connections, sampled before the ping. Idle connections the
//!   pool keeps after a burst do not hold readiness down.

use crate::db::{DbError, DbPool, DbResult};
use log::warn;
use serde::Serialize;
use std::collections::BTreeMap;

/// Readiness fails once more connections than this are open.
pub const MAX_OPEN_CONNECTIONS: u32 = 10;

const DATABASE_CHECK: &str = "database";

/// Storage surface the probes need.
pub trait StorageProbe {
    /// Round-trips a trivial statement.
    fn ping(&self) -> DbResult<()>;
    /// Connections currently serving work. Idle pooled connections do not count.
    fn open_connections(&self) -> u32;
}

impl StorageProbe for DbPool {
    fn ping(&self) -> DbResult<()> {
        let conn = self.get()?;
        conn.query_row("SELECT 1;", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    fn open_connections(&self) -> u32 {
        let state = self.state();
        state.connections.saturating_sub(state.idle_connections)
    }
}

/// Result of one named check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Pass,
    Fail(String),
}

/// Aggregated result of a probe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HealthStatus {
    checks: BTreeMap<&'static str, CheckOutcome>,
}

impl HealthStatus {
    fn record(&mut self, name: &'static str, outcome: CheckOutcome) {
        if let CheckOutcome::Fail(detail) = &outcome {
            warn!("event=health_probe module=health status=error check={name} error={detail}");
        }
        self.checks.insert(name, outcome);
    }

    /// True when every check passed.
    pub fn is_healthy(&self) -> bool {
        self.checks
            .values()
            .all(|outcome| matches!(outcome, CheckOutcome::Pass))
    }

    pub fn check(&self, name: &str) -> Option<&CheckOutcome> {
        self.checks.get(name)
    }

    /// Serializable summary: `{"status": .., "checks": {name: "ok" | detail}}`.
    pub fn report(&self) -> HealthReport {
        let checks = self
            .checks
            .iter()
            .map(|(name, outcome)| {
                let value = match outcome {
                    CheckOutcome::Pass => "ok".to_string(),
                    CheckOutcome::Fail(detail) => detail.clone(),
                };
                (name.to_string(), value)
            })
            .collect();

        HealthReport {
            status: if self.is_healthy() { "ok" } else { "error" },
            checks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub checks: BTreeMap<String, String>,
}

/// Liveness: storage answers a ping.
pub fn liveness<P: StorageProbe + ?Sized>(probe: &P) -> HealthStatus {
    let mut status = HealthStatus::default();
    status.record(DATABASE_CHECK, ping_outcome(probe.ping()));
    status
}

/// Readiness: storage answers a ping and the pool is not over its threshold.
pub fn readiness<P: StorageProbe + ?Sized>(probe: &P) -> HealthStatus {
    let mut status = HealthStatus::default();
    let open = probe.open_connections();
    let outcome = if open > MAX_OPEN_CONNECTIONS {
        CheckOutcome::Fail(format!(
            "too many open connections: {open} > {MAX_OPEN_CONNECTIONS}"
        ))
    } else {
        ping_outcome(probe.ping())
    };
    status.record(DATABASE_CHECK, outcome);
    status
}

fn ping_outcome(result: Result<(), DbError>) -> CheckOutcome {
    match result {
        Ok(()) => CheckOutcome::Pass,
        Err(err) => CheckOutcome::Fail(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{liveness, readiness, CheckOutcome, StorageProbe, MAX_OPEN_CONNECTIONS};
    use crate::db::{DbError, DbResult};
    use std::path::PathBuf;

    struct FakeProbe {
        reachable: bool,
        open: u32,
    }

    impl StorageProbe for FakeProbe {
        fn ping(&self) -> DbResult<()> {
            if self.reachable {
                Ok(())
            } else {
                Err(DbError::Sqlite(rusqlite::Error::InvalidPath(PathBuf::from(
                    "unreachable.db",
                ))))
            }
        }

        fn open_connections(&self) -> u32 {
            self.open
        }
    }

    #[test]
    fn readiness_fails_over_threshold_while_liveness_passes() {
        let probe = FakeProbe {
            reachable: true,
            open: 11,
        };

        assert!(liveness(&probe).is_healthy());

        let ready = readiness(&probe);
        assert!(!ready.is_healthy());
        match ready.check("database") {
            Some(CheckOutcome::Fail(detail)) => assert!(detail.contains("11 > 10")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn readiness_passes_at_threshold() {
        let probe = FakeProbe {
            reachable: true,
            open: MAX_OPEN_CONNECTIONS,
        };
        assert!(readiness(&probe).is_healthy());
    }

    #[test]
    fn unreachable_storage_fails_both_probes() {
        let probe = FakeProbe {
            reachable: false,
            open: 1,
        };
        assert!(!liveness(&probe).is_healthy());
        assert!(!readiness(&probe).is_healthy());
    }

    #[test]
    fn report_renders_status_and_checks() {
        let report = readiness(&FakeProbe {
            reachable: true,
            open: 12,
        })
        .report();
        assert_eq!(report.status, "error");
        assert!(report.checks["database"].starts_with("too many open connections"));

        let report = liveness(&FakeProbe {
            reachable: true,
            open: 12,
        })
        .report();
        assert_eq!(report.status, "ok");
        assert_eq!(report.checks["database"], "ok");
    }
}
