use hackc::{Features, RunOutcome, RunState, Session, VmCommand, STACK_BASE};

fn features() -> Features {
    "bootstrap,halt".parse().unwrap()
}

/// Build `src` as a single unit, let `setup` prepare RAM, and run it to completion.
fn run_vm(src: &str, setup: impl FnOnce(&mut RunState)) -> RunState {
    let binary = Session::new(features()).build(&[("Test", src)]).unwrap();
    let mut state = RunState::from_raw(binary.words()).unwrap();
    setup(&mut state);
    assert_eq!(state.run(100_000), RunOutcome::Halted);
    state
}

fn top(src: &str) -> i16 {
    run_vm(src, |_| {}).stack_top().unwrap() as i16
}

#[test]
fn push_push_add() {
    let state = run_vm("push constant 7\npush constant 8\nadd", |_| {});
    assert_eq!(state.sp(), 257);
    assert_eq!(state.stack_top(), Some(15));
}

#[test]
fn arithmetic_and_logic() {
    assert_eq!(top("push constant 3\npush constant 10\nsub"), -7);
    assert_eq!(top("push constant 5\nneg"), -5);
    assert_eq!(top("push constant 12\npush constant 10\nand"), 8);
    assert_eq!(top("push constant 12\npush constant 10\nor"), 14);
    assert_eq!(top("push constant 0\nnot"), -1);
}

#[test]
fn eq_pushes_canonical_booleans() {
    assert_eq!(top("push constant 4\npush constant 4\neq"), -1);
    assert_eq!(top("push constant 4\npush constant 5\neq"), 0);
}

#[test]
fn relational_operators() {
    assert_eq!(top("push constant 9\npush constant 2\ngt"), -1);
    assert_eq!(top("push constant 2\npush constant 9\ngt"), 0);
    assert_eq!(top("push constant 2\npush constant 9\nlt"), -1);
    assert_eq!(top("push constant 9\npush constant 9\nlt"), 0);
    // -3 < 1
    assert_eq!(top("push constant 3\nneg\npush constant 1\nlt"), -1);
}

#[test]
fn repeated_comparisons_do_not_interfere() {
    let src = "push constant 1\npush constant 1\neq\n\
               push constant 1\npush constant 2\neq\n\
               push constant 1\npush constant 1\neq";
    let state = run_vm(src, |_| {});
    assert_eq!(state.sp(), 259);
    assert_eq!(state.ram(256), 0xFFFF);
    assert_eq!(state.ram(257), 0);
    assert_eq!(state.ram(258), 0xFFFF);
}

#[test]
fn pop_then_push_argument_restores_value() {
    let src = "push constant 42\npop argument 2\n\
               push constant 99\npop temp 0\n\
               push argument 2";
    let state = run_vm(src, |state| state.set_ram(2, 400));
    assert_eq!(state.ram(402), 42);
    assert_eq!(state.stack_top(), Some(42));
    assert_eq!(state.sp(), 257);
}

#[test]
fn segments_round_trip() {
    let src = "push constant 11\npop local 1\n\
               push constant 12\npop this 3\n\
               push constant 13\npop that 0\n\
               push constant 14\npop static 5\n\
               push constant 15\npop temp 7\n\
               push local 1\npush this 3\npush that 0\npush static 5\npush temp 7";
    let state = run_vm(src, |state| {
        state.set_ram(1, 300);
        state.set_ram(3, 3000);
        state.set_ram(4, 4000);
    });
    assert_eq!(state.ram(301), 11);
    assert_eq!(state.ram(3003), 12);
    assert_eq!(state.ram(4000), 13);
    assert_eq!(state.ram(16), 14);
    assert_eq!(state.ram(12), 15);
    assert_eq!(state.sp(), 261);
    let stack: Vec<u16> = (256..261).map(|addr| state.ram(addr)).collect();
    assert_eq!(stack, vec![11, 12, 13, 14, 15]);
}

#[test]
fn pointer_aliases_this_and_that() {
    let src = "push constant 3030\npop pointer 0\n\
               push constant 3040\npop pointer 1\n\
               push constant 7\npop that 2\n\
               push pointer 0";
    let state = run_vm(src, |_| {});
    assert_eq!(state.ram(3), 3030);
    assert_eq!(state.ram(4), 3040);
    assert_eq!(state.ram(3042), 7);
    assert_eq!(state.stack_top(), Some(3030));
}

#[test]
fn stack_depth_matches_command_counts() {
    let src = "push constant 1\npush constant 2\npush constant 3\n\
               add\nneg\npush constant 4\ngt\n\
               push constant 5\npop temp 2\npush constant 6\nnot\nor";
    let net: i32 = src
        .lines()
        .map(|line| {
            let line = line.trim();
            let cmd = match line.split_whitespace().collect::<Vec<_>>()[..] {
                ["push", ..] => VmCommand::Push(hackc::Segment::Constant, 0),
                ["pop", ..] => VmCommand::Pop(hackc::Segment::Temp, 0),
                [op] => VmCommand::Arithmetic(op.parse().unwrap()),
                _ => unreachable!(),
            };
            cmd.depth_delta()
        })
        .sum();
    let state = run_vm(src, |_| {});
    assert_eq!(state.sp() as i32, STACK_BASE as i32 + net);
    assert_eq!(net, 2);
}

#[test]
fn separate_sessions_assemble_identically() {
    let src = "push constant 2\npush static 1\neq\npop static 0";
    let a = Session::new(Features::all()).build(&[("Main", src)]).unwrap();
    let b = Session::new(Features::all()).build(&[("Main", src)]).unwrap();
    assert_eq!(a.to_text(), b.to_text());
}
