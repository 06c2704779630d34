//! Signals the toolkit can be told to ignore.

use serde::{Deserialize, Serialize};

/// A signal whose default handler can be disabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Signal {
    /// Interrupt.
    Sigint,
    /// Quit.
    Sigquit,
    /// Broken pipe.
    Sigpipe,
    /// Termination.
    Sigterm,
    /// CPU time limit exceeded.
    Sigxcpu,
}

impl Signal {
    /// Every supported signal.
    pub const ALL: [Signal; 5] = [
        Signal::Sigint,
        Signal::Sigquit,
        Signal::Sigpipe,
        Signal::Sigterm,
        Signal::Sigxcpu,
    ];

    /// POSIX signal number.
    #[must_use]
    pub const fn value(self) -> i64 {
        match self {
            Self::Sigint => 2,
            Self::Sigquit => 3,
            Self::Sigpipe => 13,
            Self::Sigterm => 15,
            Self::Sigxcpu => 24,
        }
    }

    /// Look a signal up by number.
    #[must_use]
    pub fn from_value(value: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.value() == value)
    }
}
