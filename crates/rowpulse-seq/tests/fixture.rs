#![allow(dead_code)]

use rowpulse::{Geometry, MemoryType, TestingPhy};
use rowpulse_seq::{
    Encoder, ExecutorConfig, Instruction, PayloadExecutor, RunSummary, Target,
};

/// Bus shape shared by the scenario tests: four phases, READs on phase 1.
pub const PHASES: usize = 4;
pub const RDPHASE: usize = 1;

pub const PAYLOAD_DEPTH: usize = 64;
pub const SCRATCHPAD_DEPTH: usize = 8;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn geometry() -> Geometry {
    Geometry::new(1, 4, 16, 10).expect("test geometry is valid")
}

pub fn encoder() -> Encoder {
    Encoder::new(geometry())
}

pub fn executor(with_refresh: bool) -> PayloadExecutor<PHASES> {
    executor_with(PAYLOAD_DEPTH, SCRATCHPAD_DEPTH, with_refresh)
}

pub fn executor_with(
    payload_depth: usize,
    scratchpad_depth: usize,
    with_refresh: bool,
) -> PayloadExecutor<PHASES> {
    PayloadExecutor::new(ExecutorConfig {
        geom: geometry(),
        memtype: MemoryType::Ddr4,
        payload_depth,
        scratchpad_depth,
        rdphase: RDPHASE,
        with_refresh,
    })
    .expect("test config is valid")
}

pub fn phy() -> TestingPhy<PHASES> {
    TestingPhy::new(1)
}

/// Encode, load, start, and run a program to completion.
pub fn run_program(
    pe: &mut PayloadExecutor<PHASES>,
    phy: &mut TestingPhy<PHASES>,
    program: &[Instruction],
    limit: u64,
) -> RunSummary {
    init_logging();
    let words = encoder().encode_program(program).expect("program encodes");
    pe.load_payload(&words).expect("program fits");
    pe.start();
    let summary = pe.run_until_ready(phy, limit);
    assert!(
        summary.completed(),
        "program did not finish within {limit} cycles"
    );
    summary
}

pub fn row_address(bank: u8, row: u32) -> u32 {
    encoder()
        .address(None, bank, Some(Target::Row(row)))
        .expect("address encodes")
}

pub fn col_address(bank: u8, column: u32) -> u32 {
    encoder()
        .address(None, bank, Some(Target::Column(column)))
        .expect("address encodes")
}
