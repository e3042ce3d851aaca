//! # Bus configuration.
//!
//! Provides [`BusConfig`], the settings handed to
//! [`EventBus::builder`](crate::EventBus::builder).
//!
//! ## Sentinel values
//! - `dead_letters = false` → handler failures on unobserved paths are
//!   dropped instead of republished (the failure still shows up in awaited
//!   [`DispatchResult`](crate::DispatchResult)s).
//! - `strict = false` → kinds without a registered schema pass validation.

use crate::events::Kind;

/// Configuration for an event bus instance.
///
/// Defines:
/// - **Validation strictness**: whether unknown kinds may be published
/// - **Dead letters**: whether unobserved handler failures are republished
///
/// ## Field semantics
/// - `strict`: reject kinds the validator has no schema for. With no
///   validator installed, strict mode rejects every publish.
/// - `dead_letters`: republish failures of fire-and-forget invocations (and
///   of detached publishes) as events of `dead_letter_kind`.
/// - `dead_letter_kind`: kind used for those diagnostics events.
///
/// ## Notes
/// All fields are public for flexibility. Prefer
/// [`dead_letter_target`](Self::dead_letter_target) over reading the two
/// dead-letter fields separately.
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Reject events whose kind has no registered schema.
    ///
    /// Recovers closed-set kind discipline for applications that want it;
    /// the open default accepts any kind.
    pub strict: bool,

    /// Republish unobserved handler failures as dead-letter events.
    ///
    /// Failures of awaited invocations are always visible to the publisher
    /// through the dispatch result and are never dead-lettered.
    pub dead_letters: bool,

    /// Kind of dead-letter events.
    ///
    /// Failures while handling an event of this kind are never republished
    /// (recursion guard).
    pub dead_letter_kind: Kind,
}

impl BusConfig {
    /// Default dead-letter kind.
    pub const DEAD_LETTER_KIND: &'static str = "bus.dead_letter";

    /// Returns the dead-letter kind when dead-lettering is enabled.
    ///
    /// - `None` → dead letters disabled
    /// - `Some(kind)` → republish failures under `kind`
    #[inline]
    pub fn dead_letter_target(&self) -> Option<Kind> {
        if self.dead_letters {
            Some(self.dead_letter_kind.clone())
        } else {
            None
        }
    }
}

impl Default for BusConfig {
    /// Default configuration:
    ///
    /// - `strict = false` (open kind set)
    /// - `dead_letters = true` (unobserved failures are republished)
    /// - `dead_letter_kind = "bus.dead_letter"`
    fn default() -> Self {
        Self {
            strict: false,
            dead_letters: true,
            dead_letter_kind: Kind::from(Self::DEAD_LETTER_KIND),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enables_dead_letters() {
        let cfg = BusConfig::default();
        assert!(!cfg.strict);
        assert_eq!(
            cfg.dead_letter_target(),
            Some(Kind::from("bus.dead_letter"))
        );
    }

    #[test]
    fn test_disabled_dead_letters_fold_to_none() {
        let cfg = BusConfig {
            dead_letters: false,
            ..BusConfig::default()
        };
        assert_eq!(cfg.dead_letter_target(), None);
    }

    #[test]
    fn test_custom_dead_letter_kind() {
        let cfg = BusConfig {
            dead_letter_kind: Kind::from("diag.failed"),
            ..BusConfig::default()
        };
        assert_eq!(cfg.dead_letter_target(), Some(Kind::from("diag.failed")));
    }
}
