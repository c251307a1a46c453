// ── Connection phase cycle ──
//
// Four phases, two user-triggered and two timer-triggered transitions.
// `next` is the only place the cycle is encoded.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Stage of the connection lifecycle.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ConnectionPhase {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// What drives a phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTrigger {
    /// User intent: connect or disconnect.
    Toggle,
    /// The outstanding phase timer fired.
    TimerElapsed,
}

impl ConnectionPhase {
    /// The phase reached from `self` on `trigger`, or `None` if the
    /// trigger has no meaning here.
    pub const fn next(self, trigger: PhaseTrigger) -> Option<Self> {
        match (self, trigger) {
            (Self::Disconnected, PhaseTrigger::Toggle) => Some(Self::Connecting),
            (Self::Connecting, PhaseTrigger::TimerElapsed) => Some(Self::Connected),
            (Self::Connected, PhaseTrigger::Toggle) => Some(Self::Disconnecting),
            (Self::Disconnecting, PhaseTrigger::TimerElapsed) => Some(Self::Disconnected),
            _ => None,
        }
    }

    /// Phases that complete on a timer and ignore toggles.
    pub const fn is_transitional(self) -> bool {
        matches!(self, Self::Connecting | Self::Disconnecting)
    }

    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn full_cycle() {
        let mut phase = ConnectionPhase::Disconnected;
        let triggers = [
            PhaseTrigger::Toggle,
            PhaseTrigger::TimerElapsed,
            PhaseTrigger::Toggle,
            PhaseTrigger::TimerElapsed,
        ];
        let mut seen = vec![phase];
        for trigger in triggers {
            phase = phase.next(trigger).unwrap_or(phase);
            seen.push(phase);
        }
        assert_eq!(
            seen,
            [
                ConnectionPhase::Disconnected,
                ConnectionPhase::Connecting,
                ConnectionPhase::Connected,
                ConnectionPhase::Disconnecting,
                ConnectionPhase::Disconnected,
            ]
        );
    }

    #[test]
    fn transitional_phases_ignore_toggle() {
        for phase in ConnectionPhase::iter().filter(|p| p.is_transitional()) {
            assert_eq!(phase.next(PhaseTrigger::Toggle), None, "{phase}");
        }
    }

    #[test]
    fn settled_phases_ignore_timer() {
        assert_eq!(ConnectionPhase::Disconnected.next(PhaseTrigger::TimerElapsed), None);
        assert_eq!(ConnectionPhase::Connected.next(PhaseTrigger::TimerElapsed), None);
    }

    #[test]
    fn every_successor_is_adjacent() {
        let order: Vec<_> = ConnectionPhase::iter().collect();
        for (i, phase) in order.iter().enumerate() {
            for trigger in [PhaseTrigger::Toggle, PhaseTrigger::TimerElapsed] {
                if let Some(next) = phase.next(trigger) {
                    assert_eq!(next, order[(i + 1) % order.len()]);
                }
            }
        }
    }

    #[test]
    fn display_and_parse() {
        assert_eq!(ConnectionPhase::Disconnecting.to_string(), "disconnecting");
        assert_eq!("Connected".parse::<ConnectionPhase>().ok(), Some(ConnectionPhase::Connected));
    }
}
