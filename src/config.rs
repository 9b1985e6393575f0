//! Interpreter configuration.

use crate::errors::ErrorMessages;
use crate::session::SessionManager;

/// The default recursion limit for topic inheritance, redirects and the
/// BEGIN block.
pub const DEFAULT_DEPTH: usize = 50;

/// The default Unicode punctuation class stripped from messages in UTF-8 mode.
pub const DEFAULT_UNICODE_PUNCTUATION: &str = "[.,!?;:]";

/// User-configurable properties of a [`RiveScript`](crate::RiveScript)
/// interpreter.
///
/// Construct with [`Config::basic`] (or [`Config::utf8`]) and adjust fields:
///
/// ```
/// use rivescript::Config;
///
/// let config = Config { strict: false, depth: 25, ..Config::basic() };
/// ```
pub struct Config {
    /// Whether strict syntax checking is enabled. When off, syntax errors are
    /// logged and the offending line is skipped.
    pub strict: bool,
    /// Whether UTF-8 mode is enabled for user messages and triggers.
    pub utf8: bool,
    /// Whether to force-lowercase trigger patterns at parse time.
    pub force_case: bool,
    /// Recursion limit; `0` falls back to [`DEFAULT_DEPTH`].
    pub depth: usize,
    /// Regex class of punctuation stripped from messages in UTF-8 mode.
    pub unicode_punctuation: String,
    /// Overrides for the engine-surfaced reply error strings.
    pub errors: ErrorMessages,
    /// Custom session store; `None` uses the in-memory default.
    pub session_manager: Option<Box<dyn SessionManager>>,
}

impl Config {
    /// The basic configuration: strict mode on, everything else off.
    pub fn basic() -> Self {
        Self {
            strict: true,
            utf8: false,
            force_case: false,
            depth: DEFAULT_DEPTH,
            unicode_punctuation: DEFAULT_UNICODE_PUNCTUATION.to_string(),
            errors: ErrorMessages::default(),
            session_manager: None,
        }
    }

    /// The basic configuration with UTF-8 mode enabled.
    pub fn utf8() -> Self {
        Self { utf8: true, ..Self::basic() }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::basic()
    }
}
