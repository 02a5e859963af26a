//! Error types shared by the hook layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookError {
    /// The next definition of a hooked symbol could not be located.
    #[error("required symbol {symbol} not found via RTLD_NEXT")]
    MissingSymbol { symbol: String },
    #[error("event log: {0}")]
    EventLog(#[from] std::io::Error),
}
