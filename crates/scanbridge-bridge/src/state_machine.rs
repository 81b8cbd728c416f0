//! Bridge lifecycle state machine.
//!
//! # States
//!
//! - `Disconnected`: no device handle
//! - `Connecting`: opening the scanner
//! - `Listening`: reading, classifying and forwarding lines
//! - `ShuttingDown`: cancellation observed, releasing the device
//! - `Stopped`: terminal
//!
//! # Valid Transitions
//!
//! - Disconnected → Connecting → Listening
//! - Connecting → Disconnected (open failed, retry pending)
//! - Listening → Disconnected (device lost)
//! - Disconnected/Connecting/Listening → ShuttingDown → Stopped
//!
//! # Examples
//!
//! ```
//! use scanbridge_bridge::{BridgeState, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! assert_eq!(machine.current_state(), BridgeState::Disconnected);
//!
//! machine.transition_to(BridgeState::Connecting).unwrap();
//! machine.transition_to(BridgeState::Listening).unwrap();
//! assert!(machine.transition_to(BridgeState::Connecting).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use scanbridge_core::{Error, Result};

/// Maximum number of state transitions to keep in history.
///
/// A flapping USB connection produces three transitions per reconnect, so
/// 100 entries cover the last thirty or so reconnects.
pub const MAX_HISTORY_SIZE: usize = 100;

/// Lifecycle state of the bridge loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeState {
    /// No open device handle.
    Disconnected,

    /// Opening the scanner.
    Connecting,

    /// Device open; lines are being processed.
    Listening,

    /// Cancellation observed; the device is being released.
    ShuttingDown,

    /// Terminal state.
    Stopped,
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            BridgeState::Disconnected => "Disconnected",
            BridgeState::Connecting => "Connecting",
            BridgeState::Listening => "Listening",
            BridgeState::ShuttingDown => "ShuttingDown",
            BridgeState::Stopped => "Stopped",
        };
        write!(f, "{}", state_str)
    }
}

impl BridgeState {
    /// Check if transition to target state is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use scanbridge_bridge::BridgeState;
    ///
    /// assert!(BridgeState::Listening.can_transition_to(&BridgeState::Disconnected));
    /// assert!(!BridgeState::Stopped.can_transition_to(&BridgeState::Connecting));
    /// ```
    pub fn can_transition_to(&self, target: &BridgeState) -> bool {
        matches!(
            (self, target),
            // From Disconnected
            (BridgeState::Disconnected, BridgeState::Connecting | BridgeState::ShuttingDown)
            // From Connecting
            | (BridgeState::Connecting, BridgeState::Listening | BridgeState::Disconnected | BridgeState::ShuttingDown)
            // From Listening
            | (BridgeState::Listening, BridgeState::Disconnected | BridgeState::ShuttingDown)
            // From ShuttingDown
            | (BridgeState::ShuttingDown, BridgeState::Stopped)
        )
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BridgeState::Stopped)
    }
}

/// Represents a single state transition with timestamp.
///
/// The `timestamp` is process-local and not serialized; deserializing sets
/// it to the current time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: BridgeState,

    /// The state transitioned to.
    pub to: BridgeState,

    /// When the transition occurred.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    /// Create a new state transition record.
    pub fn new(from: BridgeState, to: BridgeState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }
}

/// State machine tracking the bridge lifecycle.
///
/// This struct is not thread-safe by design; the bridge loop owns it.
#[derive(Debug)]
pub struct StateMachine {
    /// Current state.
    current_state: BridgeState,

    /// When the current state was entered.
    state_entered_at: Instant,

    /// History of state transitions (limited to MAX_HISTORY_SIZE).
    history: VecDeque<StateTransition>,
}

impl StateMachine {
    /// Create a new state machine in the Disconnected state.
    pub fn new() -> Self {
        Self {
            current_state: BridgeState::Disconnected,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Get the current state of the machine.
    pub fn current_state(&self) -> BridgeState {
        self.current_state
    }

    /// Get the time elapsed in the current state.
    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Transition to a new state, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the requested transition is
    /// not valid for the current state. The machine is left unchanged.
    pub fn transition_to(&mut self, new_state: BridgeState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);

        self.current_state = new_state;
        self.state_entered_at = Instant::now();
        self.history.push_back(transition.clone());
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }

        Ok(transition)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
