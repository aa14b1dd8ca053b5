//! Stress tests: long runs and repeated lock/unlock cycles

use proptest::prelude::*;
use protmem_assembler::assemble;
use protmem_runtime::{HaltReason, ModeKind, VMConfig, VM};

#[test]
fn test_many_protection_round_trips() {
    let source = r#"
        .data
        secret: .byte 1
        .text
        _start:
            la t0, routine
            setproti t0
            la a3, secret
            li t0, 1
            setprotd a3, t0
            li s1, 1000
            li a0, 0
        loop:
            enterprot a5
            addi s1, s1, -1
            bnez s1, loop
            li a7, 93
            ecall
        routine:
            lbu t1, 0(a3)
            add a0, a0, t1
            exitprot a5
    "#;
    let result = VM::new(assemble(source).unwrap(), VMConfig::default())
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(result.halt_reason, HaltReason::Exit(1000));
    assert_eq!(result.final_mode, ModeKind::Unlocked);
}

#[test]
fn test_large_program() {
    let mut source = String::new();
    for _ in 0..5000 {
        source.push_str("addi a0, a0, 1\n");
    }
    source.push_str("li a7, 93\necall\n");
    let result = VM::new(assemble(&source).unwrap(), VMConfig::default())
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(result.exit_code(), Some(5000));
    assert_eq!(result.cycles, 5003);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_loop_counts(n in 1u32..500) {
        let source = format!(
            "li t0, {n}\nli a0, 0\nloop: addi a0, a0, 1\naddi t0, t0, -1\nbnez t0, loop\nli a7, 93\necall"
        );
        let result = VM::new(assemble(&source).unwrap(), VMConfig::default())
            .unwrap()
            .run()
            .unwrap();
        prop_assert_eq!(result.exit_code(), Some(n));
        prop_assert_eq!(result.cycles, 4 + 3 * n as u64 + 3);
    }
}
