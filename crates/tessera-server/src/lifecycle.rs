//! Per-request execution state.
//!
//! ## Stages
//!
//! 1. **Idle** - Nothing has happened yet
//! 2. **Extracting input** - Request sources are merged into one object
//! 3. **Validating input** - The final input schema parses the merged object
//! 4. **Running middlewares** - Middlewares run in declaration order
//! 5. **Running handler** - The handler receives the input and the options
//! 6. **Validating output** - The output schema parses the handler output
//! 7. **Responding** - The result handler builds the response
//! 8. **Done**
//!
//! Any stage before responding may skip to it when an error occurs; every
//! stage except `Done` may move to `Failed`, which is reached only when the
//! result handler itself failed.

use serde_json::{Map, Value};
use tessera_core::{Options, TesseraError};
use tracing::trace;

/// Position of a request in the endpoint state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Stage {
    /// Not started.
    #[default]
    Idle = 0,
    /// Merging request sources.
    ExtractingInput = 1,
    /// Parsing the merged input.
    ValidatingInput = 2,
    /// Running middlewares.
    RunningMiddlewares = 3,
    /// Running the handler.
    RunningHandler = 4,
    /// Parsing the handler output.
    ValidatingOutput = 5,
    /// Calling the result handler.
    Responding = 6,
    /// Response produced.
    Done = 7,
    /// The result handler failed; the last-resort response was produced.
    Failed = 8,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ExtractingInput => "extracting_input",
            Self::ValidatingInput => "validating_input",
            Self::RunningMiddlewares => "running_middlewares",
            Self::RunningHandler => "running_handler",
            Self::ValidatingOutput => "validating_output",
            Self::Responding => "responding",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns the stage that follows on success.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::ExtractingInput),
            Self::ExtractingInput => Some(Self::ValidatingInput),
            Self::ValidatingInput => Some(Self::RunningMiddlewares),
            Self::RunningMiddlewares => Some(Self::RunningHandler),
            Self::RunningHandler => Some(Self::ValidatingOutput),
            Self::ValidatingOutput => Some(Self::Responding),
            Self::Responding => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// Returns `true` if moving from `self` to `to` is allowed.
    #[must_use]
    pub fn can_move_to(self, to: Self) -> bool {
        if self.next() == Some(to) {
            return true;
        }
        match to {
            Self::Responding => self < Self::Responding && self != Self::Idle,
            Self::Failed => self != Self::Done && self != Self::Failed,
            _ => false,
        }
    }

    /// Returns `true` for `Done` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// State recorded while one request runs through an endpoint.
///
/// Owned by a single execution and dropped with it.
#[derive(Debug, Default)]
pub struct Lifecycle {
    stage: Stage,
    /// Input merged from the request sources.
    pub raw_input: Map<String, Value>,
    /// Input after validation.
    pub input: Option<Map<String, Value>>,
    /// Options accumulated by middlewares.
    pub options: Options,
    /// Validated handler output.
    pub output: Option<Value>,
    /// The first error, if any.
    pub error: Option<TesseraError>,
}

impl Lifecycle {
    /// Creates an idle lifecycle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Moves to another stage.
    pub fn advance(&mut self, to: Stage) {
        debug_assert!(
            self.stage.can_move_to(to),
            "invalid transition {} -> {}",
            self.stage,
            to
        );
        trace!(from = self.stage.name(), to = to.name(), "stage transition");
        self.stage = to;
    }

    /// Records an error and jumps to [`Stage::Responding`].
    pub fn fail(&mut self, error: TesseraError) {
        self.error = Some(error);
        self.advance(Stage::Responding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(Stage::Idle < Stage::ExtractingInput);
        assert!(Stage::ExtractingInput < Stage::ValidatingInput);
        assert!(Stage::ValidatingInput < Stage::RunningMiddlewares);
        assert!(Stage::RunningMiddlewares < Stage::RunningHandler);
        assert!(Stage::RunningHandler < Stage::ValidatingOutput);
        assert!(Stage::ValidatingOutput < Stage::Responding);
        assert!(Stage::Responding < Stage::Done);
    }

    #[test]
    fn test_transitions() {
        assert!(Stage::Idle.can_move_to(Stage::ExtractingInput));
        assert!(Stage::ValidatingInput.can_move_to(Stage::Responding));
        assert!(Stage::ExtractingInput.can_move_to(Stage::Responding));
        assert!(Stage::Responding.can_move_to(Stage::Failed));
        assert!(Stage::Idle.can_move_to(Stage::Failed));

        assert!(!Stage::Idle.can_move_to(Stage::Responding));
        assert!(!Stage::Done.can_move_to(Stage::Failed));
        assert!(!Stage::RunningHandler.can_move_to(Stage::RunningMiddlewares));
        assert!(!Stage::ValidatingInput.can_move_to(Stage::RunningHandler));
    }

    #[test]
    fn test_terminal() {
        assert!(Stage::Done.is_terminal());
        assert!(Stage::Failed.is_terminal());
        assert!(!Stage::Responding.is_terminal());
        assert_eq!(Stage::Done.next(), None);
    }

    #[test]
    fn test_lifecycle_fail_jumps_to_responding() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(Stage::ExtractingInput);
        lifecycle.advance(Stage::ValidatingInput);
        lifecycle.fail(TesseraError::internal("bad"));
        assert_eq!(lifecycle.stage(), Stage::Responding);
        assert!(lifecycle.error.is_some());
        assert!(lifecycle.input.is_none());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::RunningMiddlewares.to_string(), "running_middlewares");
    }
}
