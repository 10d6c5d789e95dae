//! Command-bus ownership arbitration.
//!
//! Exactly one of the memory controller and the payload executor drives the
//! command bus in any cycle. The switch starts on the controller side and
//! hands the bus over when the executor asks for it — immediately, or, with
//! refresh gating enabled, on the cycle a refresh command passes by (so the
//! handover never splits a refresh interval), optionally pinned to a
//! specific refresh ordinal via `at_refresh`. Returning the bus pulses the
//! external refresh timer's reset so tREFI accounting restarts from zero.

use crate::refresh::RefreshCounter;
use rowpulse::{MemoryType, PhaseCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    /// The memory controller owns the bus.
    Controller,
    /// The payload executor owns the bus.
    Payload,
}

#[derive(Debug)]
pub struct BusSwitch {
    state: SwitchState,
    refresh: RefreshCounter,
    with_refresh: bool,
    at_refresh: u64,
    latched_count: u64,
}

impl BusSwitch {
    #[must_use]
    pub fn new(memtype: MemoryType, nranks: u8, with_refresh: bool) -> Self {
        Self {
            state: SwitchState::Controller,
            refresh: RefreshCounter::new(memtype, nranks),
            with_refresh,
            at_refresh: 0,
            latched_count: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> SwitchState {
        self.state
    }

    /// High while the executor owns the bus.
    #[inline]
    #[must_use]
    pub fn dfi_ready(&self) -> bool {
        self.state == SwitchState::Payload
    }

    /// If non-zero, handover only happens at this refresh ordinal.
    pub fn set_at_refresh(&mut self, ordinal: u64) {
        self.at_refresh = ordinal;
    }

    #[inline]
    #[must_use]
    pub fn at_refresh(&self) -> u64 {
        self.at_refresh
    }

    /// The refresh ordinal latched at the last handover (or by
    /// [`latch_refresh_count`](Self::latch_refresh_count)).
    #[inline]
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.latched_count
    }

    /// The live counter value, unlatched.
    #[inline]
    #[must_use]
    pub fn live_refresh_count(&self) -> u64 {
        self.refresh.count()
    }

    /// Force an immediate latch of the refresh ordinal.
    pub fn latch_refresh_count(&mut self) {
        self.latched_count = self.refresh.count();
    }

    /// Advance the switch one cycle.
    ///
    /// `master_phase0` is phase 0 of the muxed bus, whichever side drives it
    /// — the refresh counter sees refreshes issued by both the controller
    /// and the executor. Returns `true` on the one cycle the external
    /// refresh timer must be reset (bus going back to the controller).
    pub fn poll(&mut self, wants_dfi: bool, master_phase0: &PhaseCommand) -> bool {
        let refresh_seen = self.refresh.is_refresh(master_phase0);
        let mut timer_reset = false;
        let mut granted = false;

        match self.state {
            SwitchState::Controller if wants_dfi => {
                // The counter increments this same cycle, hence the +1.
                let ordinal_matches =
                    self.at_refresh == 0 || self.at_refresh == self.refresh.count() + 1;
                let gate_open = if self.with_refresh {
                    refresh_seen && ordinal_matches
                } else {
                    true
                };
                if gate_open {
                    self.state = SwitchState::Payload;
                    granted = true;
                }
            }
            SwitchState::Payload if !wants_dfi => {
                timer_reset = true;
                self.state = SwitchState::Controller;
                log::debug!("bus returned to memory controller; refresh timer reset");
            }
            _ => {}
        }

        if refresh_seen {
            self.refresh.observe(master_phase0);
        }
        if granted {
            self.latched_count = self.refresh.count();
            log::debug!(
                "command bus granted to payload executor at refresh ordinal {}",
                self.latched_count
            );
        }
        timer_reset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle() -> PhaseCommand {
        PhaseCommand::idle(1)
    }

    fn refresh() -> PhaseCommand {
        PhaseCommand::refresh(1)
    }

    #[test]
    fn hands_over_immediately_without_gating() {
        let mut switch = BusSwitch::new(MemoryType::Ddr4, 1, false);
        assert!(!switch.dfi_ready());
        switch.poll(true, &idle());
        assert!(switch.dfi_ready());
    }

    #[test]
    fn gated_handover_waits_for_a_refresh() {
        let mut switch = BusSwitch::new(MemoryType::Ddr4, 1, true);
        switch.poll(true, &idle());
        assert!(!switch.dfi_ready());
        switch.poll(true, &refresh());
        assert!(switch.dfi_ready());
    }

    #[test]
    fn at_refresh_pins_the_handover_ordinal() {
        let mut switch = BusSwitch::new(MemoryType::Ddr4, 1, true);
        switch.set_at_refresh(3);
        switch.poll(true, &refresh());
        assert!(!switch.dfi_ready());
        switch.poll(true, &refresh());
        assert!(!switch.dfi_ready());
        // Third refresh: counter is 2, 2 + 1 == 3, gate opens.
        switch.poll(true, &refresh());
        assert!(switch.dfi_ready());
        assert_eq!(switch.refresh_count(), 3);
    }

    #[test]
    fn release_pulses_the_refresh_timer_once() {
        let mut switch = BusSwitch::new(MemoryType::Ddr4, 1, false);
        switch.poll(true, &idle());
        assert!(!switch.poll(true, &idle()));
        assert!(switch.poll(false, &idle()));
        assert!(!switch.poll(false, &idle()));
        assert!(!switch.dfi_ready());
    }

    #[test]
    fn counts_executor_refreshes_too() {
        let mut switch = BusSwitch::new(MemoryType::Ddr4, 1, false);
        switch.poll(true, &idle());
        // Executor now owns the bus and issues a refresh itself.
        switch.poll(true, &refresh());
        assert_eq!(switch.live_refresh_count(), 1);
    }

    #[test]
    fn on_demand_latch() {
        let mut switch = BusSwitch::new(MemoryType::Ddr4, 1, false);
        switch.poll(false, &refresh());
        switch.poll(false, &refresh());
        assert_eq!(switch.refresh_count(), 0);
        switch.latch_refresh_count();
        assert_eq!(switch.refresh_count(), 2);
    }
}
