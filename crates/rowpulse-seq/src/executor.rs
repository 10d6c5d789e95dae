//! The payload executor: fetch, decode, issue, repeat.
//!
//! A five-state machine drives the whole pipeline. READY idles with the
//! program counter pinned at zero. `start` requests the command bus and
//! parks in WAIT-DFI until the [`BusSwitch`] grants it; BUBBLE then lets the
//! two-cycle fetch pipeline fill before RUN begins decoding. RUN issues one
//! instruction per cycle, detouring through IDLE for multi-cycle timeslices
//! and back through BUBBLE after every taken LOOP branch. STOP or running
//! off the end of payload memory releases the bus and returns to READY.
//!
//! There is no runtime error path: a malformed payload produces
//! defined-but-useless bus traffic, and the only host-visible anomaly is the
//! scratchpad overflow bit.

use crate::PIPELINE_DELAY;
use crate::decoder::decode;
use crate::emitter::CommandEmitter;
use crate::fetcher::{FetchControl, Fetcher};
use crate::instruction::OpCode;
use crate::scratchpad::Scratchpad;
use crate::switch::BusSwitch;
use alloc::vec;
use alloc::vec::Vec;
use bitflags::bitflags;
use core::error::Error;
use core::fmt;
use rowpulse::{Geometry, MemoryType, PhaseCommand, Phy};

bitflags! {
    /// Host-visible status register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        /// The executor is not running.
        const READY = 0b01;
        /// Sticky scratchpad overflow.
        const OVERFLOW = 0b10;
    }
}

/// Construction parameters for a [`PayloadExecutor`].
#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    pub geom: Geometry,
    pub memtype: MemoryType,
    /// Payload memory depth in 32-bit words.
    pub payload_depth: usize,
    /// Scratchpad depth in bus-width words.
    pub scratchpad_depth: usize,
    /// Phase READ commands are issued on; everything else uses phase 0.
    pub rdphase: usize,
    /// Gate bus handover on refresh commands.
    pub with_refresh: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    RdPhaseOutOfRange { rdphase: usize, phases: usize },
    /// Payload memory must outsize the fetch pipeline.
    PayloadTooShallow { depth: usize },
    ZeroScratchpadDepth,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::RdPhaseOutOfRange { rdphase, phases } => {
                write!(f, "rdphase {rdphase} out of range for a {phases}-phase bus")
            }
            ConfigError::PayloadTooShallow { depth } => {
                write!(
                    f,
                    "payload depth {depth} must exceed the pipeline delay ({PIPELINE_DELAY})"
                )
            }
            ConfigError::ZeroScratchpadDepth => f.write_str("scratchpad depth must be non-zero"),
        }
    }
}

impl Error for ConfigError {}

/// A program longer than the configured payload memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadTooLarge {
    pub len: usize,
    pub depth: usize,
}

impl fmt::Display for PayloadTooLarge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "program of {} words does not fit in payload memory of depth {}",
            self.len, self.depth
        )
    }
}

impl Error for PayloadTooLarge {}

/// Output wires of one [`tick`](PayloadExecutor::tick).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickEvents {
    /// Pulsed on the cycle the bus goes back to the memory controller; the
    /// external refresh timer restarts its tREFI accounting from zero.
    pub refresh_timer_reset: bool,
}

/// Reason why [`PayloadExecutor::run_until_ready`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The executor returned to READY.
    Completed,
    /// The cycle limit elapsed first.
    HitCycleLimit,
}

/// Summary produced by [`PayloadExecutor::run_until_ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Cycles ticked during this run.
    pub cycles: u64,
    pub outcome: RunOutcome,
}

impl RunSummary {
    #[must_use]
    pub fn completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    #[must_use]
    pub fn hit_cycle_limit(&self) -> bool {
        self.outcome == RunOutcome::HitCycleLimit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ready,
    WaitDfi,
    Run,
    Idle,
    /// Pipeline refill after bus acquisition or a taken LOOP branch. The
    /// flag records whether the bubble belongs to program time (loop
    /// refill) or to startup, which the execution-time counters exclude.
    Bubble { executing: bool },
}

/// Cycle-accurate model of the payload execution engine.
///
/// One call to [`tick`](Self::tick) is one clock edge for every component:
/// the fetcher, the decoder, the emitter, the scratchpad, and the bus
/// switch all sample each other's pre-tick outputs and commit together, so
/// the model never observes a half-updated cycle.
#[derive(Debug)]
pub struct PayloadExecutor<const PHASES: usize> {
    geom: Geometry,
    payload: Vec<u32>,
    scratchpad: Scratchpad<PHASES>,
    fetcher: Fetcher,
    emitter: CommandEmitter<PHASES>,
    switch: BusSwitch,

    state: State,
    /// Instruction register: decoded combinationally every cycle.
    instr: u32,
    /// Payload-memory output register (synchronous read port).
    fetch_data: u32,
    loop_counter: u16,
    idle_counter: u32,
    wants_dfi: bool,
    start_strobe: bool,

    cycle: u64,
    exec_start: u64,
    exec_stop: u64,
    /// Registered emitter outputs, driven onto the bus this cycle.
    bus_out: [PhaseCommand; PHASES],
}

impl<const PHASES: usize> PayloadExecutor<PHASES> {
    pub fn new(config: ExecutorConfig) -> Result<Self, ConfigError> {
        if config.rdphase >= PHASES {
            return Err(ConfigError::RdPhaseOutOfRange {
                rdphase: config.rdphase,
                phases: PHASES,
            });
        }
        if config.payload_depth <= PIPELINE_DELAY {
            return Err(ConfigError::PayloadTooShallow {
                depth: config.payload_depth,
            });
        }
        if config.scratchpad_depth == 0 {
            return Err(ConfigError::ZeroScratchpadDepth);
        }
        Ok(Self {
            geom: config.geom,
            payload: vec![0; config.payload_depth],
            scratchpad: Scratchpad::new(config.scratchpad_depth),
            fetcher: Fetcher::new(config.payload_depth),
            emitter: CommandEmitter::new(&config.geom, config.rdphase),
            switch: BusSwitch::new(config.memtype, config.geom.nranks, config.with_refresh),
            state: State::Ready,
            instr: 0,
            fetch_data: 0,
            loop_counter: 0,
            idle_counter: 0,
            wants_dfi: false,
            start_strobe: false,
            cycle: 0,
            exec_start: 0,
            exec_stop: 0,
            bus_out: [PhaseCommand::idle(config.geom.nranks); PHASES],
        })
    }

    /// Load an encoded program at address zero.
    ///
    /// The rest of payload memory is zeroed; a zero word decodes as STOP,
    /// so running past the program terminates. Payload memory is read-only
    /// during execution — the host contract is to write only while
    /// [`status`](Self::status) reports READY.
    pub fn load_payload(&mut self, words: &[u32]) -> Result<(), PayloadTooLarge> {
        if words.len() > self.payload.len() {
            return Err(PayloadTooLarge {
                len: words.len(),
                depth: self.payload.len(),
            });
        }
        self.payload.fill(0);
        self.payload[..words.len()].copy_from_slice(words);
        Ok(())
    }

    /// Strobe the start register. Takes effect on the next tick, if READY.
    pub fn start(&mut self) {
        self.start_strobe = true;
    }

    #[must_use]
    pub fn status(&self) -> Status {
        let mut status = Status::empty();
        status.set(Status::READY, self.state == State::Ready);
        status.set(Status::OVERFLOW, self.scratchpad.overflow());
        status
    }

    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == State::Ready
    }

    /// High while the pipeline refills (a status helper for tests and
    /// debugging; nothing downstream keys on it).
    #[must_use]
    pub fn in_bubble(&self) -> bool {
        matches!(self.state, State::Bubble { .. })
    }

    /// Current scratchpad write cursor.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.scratchpad.cursor()
    }

    #[must_use]
    pub fn scratchpad(&self) -> &Scratchpad<PHASES> {
        &self.scratchpad
    }

    /// Cycle at which executing began (for the most recent run).
    #[must_use]
    pub fn exec_start(&self) -> u64 {
        self.exec_start
    }

    /// Cycle at which executing ended.
    #[must_use]
    pub fn exec_stop(&self) -> u64 {
        self.exec_stop
    }

    /// The free-running cycle counter.
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Refresh ordinal latched at the last handover or `refresh_update`.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.switch.refresh_count()
    }

    /// Gate the next handover to a specific refresh ordinal (0 = don't care).
    pub fn set_at_refresh(&mut self, ordinal: u64) {
        self.switch.set_at_refresh(ordinal);
    }

    /// Strobe: latch the live refresh ordinal into `refresh_count` now.
    pub fn refresh_update(&mut self) {
        self.switch.latch_refresh_count();
    }

    #[must_use]
    pub fn bus_switch(&self) -> &BusSwitch {
        &self.switch
    }

    /// Advance every component one clock edge.
    ///
    /// `mc` is what the memory controller drives on each phase this cycle;
    /// it reaches the PHY whenever the executor does not own the bus.
    pub fn tick<P: Phy<PHASES>>(
        &mut self,
        mc: &[PhaseCommand; PHASES],
        phy: &mut P,
    ) -> TickEvents {
        // Bus mux: the switch's current state picks this cycle's driver.
        let executor_owns = self.switch.dfi_ready();
        let bus = if executor_owns { self.bus_out } else { *mc };

        // Combinational decode of the instruction register.
        let d = decode(self.instr, &self.geom);

        let mut stall = false;
        let mut reset_pc = false;
        let mut jump = None;
        let mut exec = false;
        let mut executing = false;
        let mut scratchpad_reset = false;
        let mut next_state = self.state;
        let mut next_wants = self.wants_dfi;
        let mut next_loop = self.loop_counter;
        let mut next_idle = self.idle_counter;

        match self.state {
            State::Ready => {
                stall = true;
                reset_pc = true;
                if self.start_strobe {
                    next_wants = true;
                    next_state = State::WaitDfi;
                    log::trace!("start strobed; requesting the command bus");
                }
            }
            State::WaitDfi => {
                stall = true;
                scratchpad_reset = true;
                if executor_owns {
                    next_state = State::Bubble { executing: false };
                    next_idle = (PIPELINE_DELAY - 1) as u32;
                }
            }
            State::Run => {
                let end_of_memory = self.fetcher.mem_addr(false) == PIPELINE_DELAY - 1;
                let loop_pending =
                    d.op == Some(OpCode::Loop) && d.loop_count != self.loop_counter;
                if (end_of_memory || d.stop) && !loop_pending {
                    // STOP dominates an unfinished loop; end-of-memory does not.
                    next_wants = false;
                    next_state = State::Ready;
                    log::trace!("program complete; releasing the command bus");
                } else if d.op == Some(OpCode::Loop) {
                    executing = true;
                    if loop_pending {
                        // A jump of J rewinds over the J+1 preceding
                        // instructions; the fetcher folds in the pipeline
                        // delay itself.
                        jump = Some(d.loop_jump as usize + 1);
                        next_loop = self.loop_counter + 1;
                        next_state = State::Bubble { executing: true };
                        next_idle = (PIPELINE_DELAY - 1) as u32;
                    } else {
                        // Loop finished; clear so the next LOOP starts fresh.
                        next_loop = 0;
                    }
                } else {
                    executing = true;
                    exec = true;
                    // Timeslice 0 is illegal from the encoder but executes
                    // as 1; both stay in RUN for a single cycle.
                    if d.timeslice > 1 {
                        next_idle = d.timeslice - 2;
                        next_state = State::Idle;
                    }
                }
            }
            State::Idle => {
                stall = true;
                executing = true;
                if self.idle_counter == 0 {
                    next_state = State::Run;
                } else {
                    next_idle = self.idle_counter - 1;
                }
            }
            State::Bubble { executing: from_run } => {
                executing = from_run;
                if self.idle_counter == 0 {
                    next_state = State::Run;
                } else {
                    next_idle = self.idle_counter - 1;
                }
            }
        }

        // Synchronous fetch: memory data registers one cycle after the
        // address, the instruction register one cycle after that.
        let next_fetch = self.payload[self.fetcher.mem_addr(stall)];
        let next_instr = if stall { self.instr } else { self.fetch_data };

        // The PHY sees the muxed bus every cycle; read returns feed the
        // scratchpad only while the executor owns the bus.
        let reads = phy.clock(&bus);
        if scratchpad_reset {
            self.scratchpad.reset();
        } else if executor_owns {
            self.scratchpad.capture(&reads);
        }

        // Arbitration samples this cycle's wants_dfi and the muxed phase 0.
        let refresh_timer_reset = self.switch.poll(self.wants_dfi, &bus[0]);

        // Registered emitter outputs: on the bus next cycle.
        let next_bus_out = self.emitter.drive(&d, exec);

        self.fetcher.tick(&FetchControl {
            stall,
            reset_pc,
            jump,
        });

        // Execution-time snapshots.
        if self.start_strobe {
            self.exec_start = 0;
            self.exec_stop = 0;
        }
        if executing && self.exec_start == 0 {
            self.exec_start = self.cycle;
        }
        if executing {
            self.exec_stop = self.cycle + 1;
        }
        self.cycle += 1;

        // Commit.
        self.instr = next_instr;
        self.fetch_data = next_fetch;
        self.bus_out = next_bus_out;
        self.state = next_state;
        self.loop_counter = next_loop;
        self.idle_counter = next_idle;
        self.wants_dfi = next_wants;
        self.start_strobe = false;

        TickEvents { refresh_timer_reset }
    }

    /// [`tick`](Self::tick) with an idle memory controller.
    pub fn tick_idle<P: Phy<PHASES>>(&mut self, phy: &mut P) -> TickEvents {
        let idle = [PhaseCommand::idle(self.geom.nranks); PHASES];
        self.tick(&idle, phy)
    }

    /// Tick with an idle memory controller until READY or the cycle limit.
    ///
    /// Call after [`start`](Self::start). The limit bounds programs that
    /// never terminate (and handovers that never unblock, see
    /// [`set_at_refresh`](Self::set_at_refresh)).
    pub fn run_until_ready<P: Phy<PHASES>>(&mut self, phy: &mut P, limit: u64) -> RunSummary {
        let mut cycles = 0;
        while cycles < limit {
            self.tick_idle(phy);
            cycles += 1;
            if self.is_ready() {
                return RunSummary {
                    cycles,
                    outcome: RunOutcome::Completed,
                };
            }
        }
        RunSummary {
            cycles,
            outcome: RunOutcome::HitCycleLimit,
        }
    }
}
