use std::str::FromStr;

/// How a reservation commit serializes against contenders for the same
/// slot. Both strategies produce the same observable outcome: exactly one
/// winner per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockStrategy {
    /// Hold the slot's exclusive lock for the whole unit of work.
    #[default]
    Pessimistic,
    /// Read a revision token, commit only if it is unchanged.
    Optimistic,
}

impl FromStr for LockStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pessimistic" => Ok(LockStrategy::Pessimistic),
            "optimistic" => Ok(LockStrategy::Optimistic),
            other => Err(format!("unknown lock strategy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineConfig {
    pub lock_strategy: LockStrategy,
    /// Prometheus exporter port for `observability::init`. None disables it.
    pub metrics_port: Option<u16>,
}

impl EngineConfig {
    /// Read configuration from `SLOTBOOK_*` environment variables, falling
    /// back to defaults on missing or unparsable values.
    pub fn from_env() -> Self {
        let lock_strategy = std::env::var("SLOTBOOK_LOCK_STRATEGY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        let metrics_port = std::env::var("SLOTBOOK_METRICS_PORT")
            .ok()
            .and_then(|s| s.parse().ok());
        Self {
            lock_strategy,
            metrics_port,
        }
    }
}
