//! A `no_std` cycle-accurate model of a DRAM payload micro-sequencer.
//!
//! `rowpulse-seq` executes small programs of raw DRAM commands (activate,
//! precharge, refresh, read, ...) with exact per-instruction timing, the way
//! a hardware payload executor wired between the memory controller and the
//! PHY would. It exists for workloads that need cycle-level control of the
//! command bus — row-hammer experiments above all — and deliberately does
//! not check that the traffic it generates respects DRAM timing; that is
//! the payload author's burden.
//!
//! # Architecture
//!
//! The model is built around three pieces:
//!
//! - **[`Encoder`] / [`decode`](decoder::decode)**: the 32-bit instruction
//!   codec. The encoder validates fields at build time; the decoder is a
//!   pure function used by the pipeline every cycle.
//! - **[`Phy`](rowpulse::Phy)**: the seam to everything below the command
//!   bus. Implement it to observe traffic or feed read data back.
//! - **[`PayloadExecutor`]**: the fetch/execute state machine, advanced one
//!   clock edge per [`tick`](PayloadExecutor::tick), together with the
//!   read-data scratchpad and the bus switch that arbitrates command-bus
//!   ownership against the memory controller.
//!
//! # Quick Start
//!
//! ```
//! use rowpulse::{Geometry, MemoryType, TestingPhy};
//! use rowpulse_seq::{Encoder, ExecutorConfig, Instruction, PayloadExecutor, Target};
//!
//! let geom = Geometry::new(1, 4, 16, 10).unwrap();
//! let encoder = Encoder::new(geom);
//! let row = encoder.address(None, 3, Some(Target::Row(0x1234))).unwrap();
//! let program = encoder
//!     .encode_program(&[
//!         Instruction::Act { timeslice: 4, address: row },
//!         Instruction::Stop,
//!     ])
//!     .unwrap();
//!
//! let mut executor: PayloadExecutor<1> = PayloadExecutor::new(ExecutorConfig {
//!     geom,
//!     memtype: MemoryType::Ddr4,
//!     payload_depth: 64,
//!     scratchpad_depth: 8,
//!     rdphase: 0,
//!     with_refresh: false,
//! })
//! .unwrap();
//! executor.load_payload(&program).unwrap();
//!
//! let mut phy: TestingPhy<1> = TestingPhy::new(1);
//! executor.start();
//! let run = executor.run_until_ready(&mut phy, 1_000);
//! assert!(run.completed());
//! assert_eq!(executor.exec_stop() - executor.exec_start(), 4);
//! ```
//!
//! # Timing model
//!
//! Every component advances on a single shared clock: one call to
//! [`PayloadExecutor::tick`] is one edge, all registers commit together, and
//! no component observes another's post-tick state within the same cycle.
//! The fetch pipeline has a fixed two-cycle latency ([`PIPELINE_DELAY`])
//! that all jump arithmetic compensates for.

#![no_std]
// Bit-field extraction truncates by construction
#![allow(clippy::cast_possible_truncation)]

extern crate alloc;

pub mod decoder;
pub mod emitter;
pub mod executor;
pub mod fetcher;
pub mod instruction;
pub mod refresh;
pub mod scratchpad;
pub mod switch;

/// Fixed fetch-to-decode latency of the pipeline, in cycles.
pub const PIPELINE_DELAY: usize = 2;

pub use decoder::{Decoded, decode};
pub use emitter::CommandEmitter;
pub use executor::{
    ConfigError, ExecutorConfig, PayloadExecutor, PayloadTooLarge, RunOutcome, RunSummary, Status,
    TickEvents,
};
pub use fetcher::{FetchControl, Fetcher};
pub use instruction::{EncodeError, Encoder, Instruction, OpCode, Target};
pub use refresh::RefreshCounter;
pub use scratchpad::Scratchpad;
pub use switch::{BusSwitch, SwitchState};
