//! Rig events relayed from the driver to the host.
//!
//! The driver reports front-panel changes through callbacks on its own
//! monitoring thread. The relay turns each callback into a [`RigEvent`]
//! carrying only plain, owned data, so nothing driver-side escapes onto the
//! host.

/// A sanitized notification originating from the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum RigEvent {
    /// The frequency of a VFO changed.
    Frequency {
        /// Symbolic VFO name (e.g. `"VFOA"`).
        vfo: String,
        /// New frequency in hertz.
        freq_hz: u64,
    },

    /// Push-to-talk state changed.
    Ptt {
        /// Symbolic VFO name.
        vfo: String,
        /// `true` if transmitting.
        on: bool,
    },
}

impl RigEvent {
    /// Short type tag: `"frequency"` or `"ptt"`.
    pub fn kind(&self) -> &'static str {
        match self {
            RigEvent::Frequency { .. } => "frequency",
            RigEvent::Ptt { .. } => "ptt",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_tags() {
        let freq = RigEvent::Frequency {
            vfo: "VFOA".into(),
            freq_hz: 14_074_000,
        };
        let ptt = RigEvent::Ptt {
            vfo: "currVFO".into(),
            on: true,
        };
        assert_eq!(freq.kind(), "frequency");
        assert_eq!(ptt.kind(), "ptt");
    }
}
