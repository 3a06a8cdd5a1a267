use ulid::Ulid;

#[derive(Debug)]
pub enum EngineError {
    /// Caller-correctable input problem. Never retried internally.
    InvalidRequest(String),
    /// Lost the race for a slot. A legitimate outcome, not a defect.
    SlotAlreadyReserved(Ulid),
    WalError(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidRequest(reason) => write!(f, "invalid request: {reason}"),
            EngineError::SlotAlreadyReserved(id) => write!(f, "slot already reserved: {id}"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
