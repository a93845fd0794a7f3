use intcode_vm::{parse_program, AmplifierChain, Memory, Pause, VMError, VMState, VM};

fn memory(text: &str) -> Memory {
    Memory::new(parse_program(text).expect("valid program"))
}

#[test]
fn test_halt_program_leaves_memory_untouched() {
    for text in ["99", "99,1,2,3", "1099"] {
        let mut vm = VM::new(memory(text));
        let before = vm.memory().clone();
        assert_eq!(vm.run().unwrap(), Pause::Halted);
        assert_eq!(vm.memory(), &before);
    }
}

#[test]
fn test_memory_growth_on_write() {
    let mut memory = Memory::new(vec![1, 2, 3]);
    memory.write(9, 7).unwrap();
    assert_eq!(memory.len(), 10);
    for addr in 3..9 {
        assert_eq!(memory.read(addr).unwrap(), 0);
    }
}

#[test]
fn test_addressing_modes() {
    let mut vm = VM::new(memory("1002,4,3,4,33"));
    assert_eq!(vm.run().unwrap(), Pause::Halted);
    assert_eq!(vm.memory().as_slice()[4], 99);
}

#[test]
fn test_relative_writes_follow_cumulative_base() -> Result<(), VMError> {
    // arb 100, arb -30, arb 7, in rel[3]
    let mut vm = VM::with_inputs(memory("109,100,109,-30,109,7,203,3,99"), [55]);
    assert_eq!(vm.run()?, Pause::Halted);
    assert_eq!(vm.relative_base(), 77);
    assert_eq!(vm.memory().peek(80), Some(55));
    assert_eq!(vm.memory().len(), 81);
    Ok(())
}

#[test]
fn test_large_values() -> Result<(), VMError> {
    let mut vm = VM::new(memory("1102,34915192,34915192,7,4,7,99,0"));
    match vm.run()? {
        Pause::ProducedOutput(value) => {
            assert_eq!(value, 34915192 * 34915192);
            assert_eq!(value.to_string().len(), 16);
        }
        other => panic!("expected output, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_quine() -> Result<(), VMError> {
    let program = vec![
        109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99,
    ];
    let mut vm = VM::new(Memory::new(program.clone()));
    let mut outputs = Vec::new();
    loop {
        match vm.run()? {
            Pause::ProducedOutput(value) => outputs.push(value),
            Pause::Halted => break,
            Pause::AwaitingInput => panic!("quine does not read input"),
        }
    }
    assert_eq!(outputs, program);
    Ok(())
}

#[test]
fn test_feedback_loop_by_hand() -> Result<(), VMError> {
    // Drives five engines directly instead of through AmplifierChain
    let program = memory(
        "3,26,1001,26,-4,26,3,27,1002,27,2,27,1,27,26,27,4,27,1001,28,-1,28,1005,28,6,99,0,0,5",
    );
    let mut amplifiers: Vec<VM> = [9, 8, 7, 6, 5]
        .iter()
        .map(|&phase| VM::with_inputs(program.clone(), [phase]))
        .collect();

    let mut signal = 0;
    let mut last_output = None;
    while !amplifiers.iter().all(VM::is_halted) {
        for (index, amplifier) in amplifiers.iter_mut().enumerate() {
            amplifier.push_input(signal);
            if let Pause::ProducedOutput(value) = amplifier.run()? {
                signal = value;
                if index == 4 {
                    last_output = Some(value);
                }
            }
        }
    }

    assert_eq!(last_output, Some(139629729));
    Ok(())
}

#[test]
fn test_feedback_loop_chain() {
    let program = memory(
        "3,52,1001,52,-5,52,3,53,1,52,56,54,1007,54,5,55,1005,55,26,1001,54,\
         -5,54,1105,1,12,1,53,54,53,1008,54,0,55,1001,55,1,55,2,53,55,53,4,\
         53,1001,56,-1,56,1005,56,6,99,0,0,0,0,10",
    );
    let mut chain = AmplifierChain::new(&program, &[9, 7, 8, 5, 6]).unwrap();
    assert_eq!(chain.run_feedback(0).unwrap(), 18216);
}

#[test]
fn test_halted_engine_is_idempotent() -> Result<(), VMError> {
    let mut vm = VM::new(memory("109,19,204,-15,99"));
    assert!(matches!(vm.run()?, Pause::ProducedOutput(_)));
    assert_eq!(vm.run()?, Pause::Halted);

    let memory = vm.memory().clone();
    let base = vm.relative_base();
    for _ in 0..5 {
        assert_eq!(vm.run()?, Pause::Halted);
        assert_eq!(vm.state(), VMState::Halted);
    }
    assert_eq!(vm.memory(), &memory);
    assert_eq!(vm.relative_base(), base);
    Ok(())
}

#[test]
fn test_independent_engines_from_one_program() -> Result<(), VMError> {
    let program = memory("3,0,4,0,99");
    let mut first = VM::with_inputs(program.clone(), [1]);
    let mut second = VM::with_inputs(program.clone(), [2]);

    assert_eq!(first.run_to_halt()?, vec![1]);
    assert_eq!(second.run_to_halt()?, vec![2]);
    assert_eq!(program.as_slice(), &[3, 0, 4, 0, 99]);
    assert_eq!(first.memory().peek(0), Some(1));
    assert_eq!(second.memory().peek(0), Some(2));
    Ok(())
}

#[test]
fn test_fatal_errors_surface() {
    assert_eq!(
        VM::new(memory("4,-1,99")).run(),
        Err(VMError::NegativeAddress(-1))
    );
    assert_eq!(VM::new(memory("77")).run(), Err(VMError::UnknownOperation(77)));
    assert_eq!(
        VM::new(memory("11101,1,1,0,99")).run(),
        Err(VMError::ImmediateWrite { instruction: 11101 })
    );
}
