//! A classic double-sided row-hammer payload.
//!
//! Builds a program that hammers two aggressor rows around a victim row,
//! runs it against an instrumented PHY, and reports what actually hit the
//! bus. Set `RUST_LOG=debug` to watch the bus handover happen.

use rowpulse::{Geometry, MemoryType, TestingPhy};
use rowpulse_seq::{
    Encoder, ExecutorConfig, Instruction, OpCode, PayloadExecutor, Target,
};

const BANK: u8 = 0;
const VICTIM_ROW: u32 = 0x1000;
const ITERATIONS: u16 = 999; // LOOP runs the pair count + 1 times
const ROW_TIMESLICE: u32 = 4;

fn main() {
    env_logger::init();

    let geom = Geometry::new(1, 4, 16, 10).expect("geometry is valid");
    let encoder = Encoder::new(geom);
    let aggressor = |row: u32| {
        encoder
            .address(None, BANK, Some(Target::Row(row)))
            .expect("row address encodes")
    };
    let above = aggressor(VICTIM_ROW - 1);
    let below = aggressor(VICTIM_ROW + 1);

    let program = encoder
        .encode_program(&[
            Instruction::Act { timeslice: ROW_TIMESLICE, address: above },
            Instruction::Pre { timeslice: ROW_TIMESLICE, address: above },
            Instruction::Act { timeslice: ROW_TIMESLICE, address: below },
            Instruction::Pre { timeslice: ROW_TIMESLICE, address: below },
            Instruction::Loop { count: ITERATIONS, jump: 3 },
            Instruction::Ref { timeslice: 8 },
            Instruction::Stop,
        ])
        .expect("program encodes");

    let mut executor: PayloadExecutor<1> = PayloadExecutor::new(ExecutorConfig {
        geom,
        memtype: MemoryType::Ddr4,
        payload_depth: 64,
        scratchpad_depth: 8,
        rdphase: 0,
        with_refresh: false,
    })
    .expect("config is valid");
    executor.load_payload(&program).expect("program fits");

    let mut phy: TestingPhy<1> = TestingPhy::new(1);
    executor.start();
    let run = executor.run_until_ready(&mut phy, 100_000);
    assert!(run.completed(), "payload did not finish");

    let activates = executor_count(&phy, OpCode::Act);
    let precharges = executor_count(&phy, OpCode::Pre);
    let refreshes = executor_count(&phy, OpCode::Ref);

    println!(
        "Hammered rows {:#06x}/{:#06x} around victim {VICTIM_ROW:#06x}",
        VICTIM_ROW - 1,
        VICTIM_ROW + 1
    );
    println!(
        "{activates} activates, {precharges} precharges, {refreshes} refresh \
         in {} bus cycles",
        run.cycles
    );
    println!(
        "Execution occupied cycles {}..{} ({} executing cycles)",
        executor.exec_start(),
        executor.exec_stop(),
        executor.exec_stop() - executor.exec_start()
    );
}

fn executor_count(phy: &TestingPhy<1>, op: OpCode) -> usize {
    phy.issued_where(|c| c.command.lines() == op.lines()).len()
}
