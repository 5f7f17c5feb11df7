//! MAC events raised towards the upper network stack.

use core::ops::{BitOr, BitOrAssign};

use crate::sync::CriticalSectionCell;

/// Event bit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacEvents(u16);

impl MacEvents {
    /// No events
    pub const NONE: Self = Self(0);
    /// At least one packet is waiting for pickup
    pub const RX_DONE: Self = Self(1 << 0);
    /// The receive path was hard-reset after repeated corrupt frames
    pub const RX_RESET: Self = Self(1 << 1);

    /// Raw bits
    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Whether no event is set
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether all bits of `other` are set
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Bits set in both
    #[inline]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }
}

impl BitOr for MacEvents {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for MacEvents {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Notification callback registered by the upper stack
pub type EventNotifier = fn(MacEvents);

struct EventState {
    pending: MacEvents,
    mask: MacEvents,
    notifier: Option<EventNotifier>,
}

/// Pending events plus the registered notifier.
///
/// Events accumulate until taken, so a consumer that polls instead of
/// registering a notifier still sees them.
pub struct EventFlags {
    state: CriticalSectionCell<EventState>,
}

impl EventFlags {
    /// Create with no pending events and no notifier
    pub const fn new() -> Self {
        Self {
            state: CriticalSectionCell::new(EventState {
                pending: MacEvents::NONE,
                mask: MacEvents::NONE,
                notifier: None,
            }),
        }
    }

    /// Register a notifier called for events in `mask`
    pub fn set_notifier(&self, mask: MacEvents, notifier: EventNotifier) {
        self.state.with(|s| {
            s.mask = mask;
            s.notifier = Some(notifier);
        });
    }

    /// Remove the notifier
    pub fn clear_notifier(&self) {
        self.state.with(|s| {
            s.mask = MacEvents::NONE;
            s.notifier = None;
        });
    }

    /// Record `events` and notify if any of them is enabled
    pub fn signal(&self, events: MacEvents) {
        let notify = self.state.with(|s| {
            s.pending |= events;
            let enabled = events.intersection(s.mask);
            s.notifier.filter(|_| !enabled.is_empty()).map(|f| (f, enabled))
        });
        // Called outside the critical section
        if let Some((notifier, enabled)) = notify {
            notifier(enabled);
        }
    }

    /// Pending events without clearing them
    pub fn get(&self) -> MacEvents {
        self.state.with_ref(|s| s.pending)
    }

    /// Take and clear pending events
    pub fn take(&self) -> MacEvents {
        self.state.with(|s| core::mem::take(&mut s.pending))
    }
}

impl Default for EventFlags {
    fn default() -> Self {
        Self::new()
    }
}
