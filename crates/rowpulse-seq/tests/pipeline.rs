mod fixture;

#[cfg(test)]
mod tests {
    use super::fixture;
    use super::fixture::row_address;
    use rowpulse_seq::{Instruction, OpCode};

    #[test]
    fn executing_time_spans_loop_refills() {
        // Three passes over ACT/PRE: two with a taken branch (5 cycles
        // each: three decodes plus the two-cycle refill), one falling
        // through (3 cycles). 13 executing cycles in total.
        let addr = row_address(0, 1);
        let mut pe = fixture::executor(false);
        let mut phy = fixture::phy();
        fixture::run_program(
            &mut pe,
            &mut phy,
            &[
                Instruction::Act { timeslice: 1, address: addr },
                Instruction::Pre { timeslice: 1, address: addr },
                Instruction::Loop { count: 2, jump: 1 },
                Instruction::Stop,
            ],
            1_000,
        );

        assert_eq!(phy.issued().len(), 6);
        assert_eq!(pe.exec_stop() - pe.exec_start(), 13);
    }

    #[test]
    fn loop_count_zero_falls_through() {
        let addr = row_address(0, 2);
        let mut pe = fixture::executor(false);
        let mut phy = fixture::phy();
        fixture::run_program(
            &mut pe,
            &mut phy,
            &[
                Instruction::Act { timeslice: 1, address: addr },
                Instruction::Pre { timeslice: 1, address: addr },
                Instruction::Loop { count: 0, jump: 1 },
                Instruction::Act { timeslice: 1, address: addr },
                Instruction::Stop,
            ],
            1_000,
        );
        // No repetition: ACT, PRE, ACT.
        assert_eq!(phy.issued().len(), 3);
    }

    #[test]
    fn running_off_the_end_of_memory_terminates() {
        let addr = row_address(0, 3);
        let mut pe = fixture::executor_with(8, 8, false);
        let mut phy = fixture::phy();
        let program = [Instruction::Act { timeslice: 1, address: addr }; 8];
        fixture::run_program(&mut pe, &mut phy, &program, 1_000);

        // The word at the end-of-memory sentinel is decoded but not issued.
        assert_eq!(phy.issued().len(), 7);
        assert!(pe.is_ready());
    }

    #[test]
    fn unfinished_loop_wins_over_end_of_memory() {
        // LOOP sits on the last payload word; while its iterations remain,
        // the backward branch is taken instead of terminating.
        let addr = row_address(0, 4);
        let mut pe = fixture::executor_with(8, 8, false);
        let mut phy = fixture::phy();
        let mut program = [Instruction::Act { timeslice: 1, address: addr }; 7].to_vec();
        program.push(Instruction::Loop { count: 2, jump: 6 });
        fixture::run_program(&mut pe, &mut phy, &program, 1_000);

        // Seven ACTs per pass, three passes.
        assert_eq!(phy.issued().len(), 21);
    }

    #[test]
    fn zero_timeslice_word_executes_as_one_cycle() {
        // The encoder rejects timeslice 0 on DFI instructions, but a raw
        // word with one is still defined: it runs for a single cycle.
        let addr = row_address(2, 9);
        let act_ts0 = u32::from(OpCode::Act.bits()) | (addr << 8);
        let mut pe = fixture::executor(false);
        let mut phy = fixture::phy();
        fixture::init_logging();
        pe.load_payload(&[act_ts0, 0]).unwrap();
        pe.start();
        assert!(pe.run_until_ready(&mut phy, 100).completed());

        assert_eq!(phy.issued().len(), 1);
        assert_eq!(pe.exec_stop() - pe.exec_start(), 1);
    }

    #[test]
    fn scratchpad_overflow_is_sticky_until_the_next_run() {
        let addr = fixture::col_address(0, 1);
        let program = [
            Instruction::Read { timeslice: 2, address: addr },
            Instruction::Read { timeslice: 2, address: addr },
            Instruction::Read { timeslice: 2, address: addr },
            Instruction::Stop,
        ];
        let mut pe = fixture::executor_with(64, 2, false);
        let mut phy = fixture::phy();
        for word in [1u64, 2, 3] {
            phy.queue_read_data(word);
        }
        fixture::run_program(&mut pe, &mut phy, &program, 1_000);

        // Three writes into two slots: wrapped once, cursor back past zero.
        assert!(pe.status().contains(rowpulse_seq::Status::OVERFLOW));
        assert_eq!(pe.read_count(), 1);

        // A new run clears the cursor and the flag during WAIT-DFI.
        fixture::run_program(&mut pe, &mut phy, &[Instruction::Stop], 100);
        assert!(!pe.status().contains(rowpulse_seq::Status::OVERFLOW));
        assert_eq!(pe.read_count(), 0);
    }

    #[test]
    fn exec_counters_reset_on_each_start() {
        let mut pe = fixture::executor(false);
        let mut phy = fixture::phy();
        fixture::run_program(
            &mut pe,
            &mut phy,
            &[
                Instruction::Act { timeslice: 4, address: row_address(0, 5) },
                Instruction::Stop,
            ],
            100,
        );
        assert_eq!(pe.exec_stop() - pe.exec_start(), 4);

        fixture::run_program(
            &mut pe,
            &mut phy,
            &[Instruction::Noop { timeslice: 10 }, Instruction::Stop],
            100,
        );
        assert_eq!(pe.exec_stop() - pe.exec_start(), 10);
        assert!(pe.exec_start() > 0);
    }
}
