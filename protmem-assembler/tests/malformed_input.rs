//! Tests for malformed input handling in the assembler
//!
//! Every error must name the line it was found on.

use protmem_assembler::{assemble, AssemblerError};

// ============================================================================
// Invalid Instruction Tests
// ============================================================================

#[test]
fn test_unknown_instruction() {
    let err = assemble("nop\nfoobar a0, a1").unwrap_err();
    assert_eq!(
        err,
        AssemblerError::UnknownInstruction { line: 2, mnemonic: "foobar".to_string() }
    );
}

#[test]
fn test_rv32_instruction_outside_subset() {
    let err = assemble("mul a0, a1, a2").unwrap_err();
    assert!(matches!(err, AssemblerError::UnknownInstruction { line: 1, .. }));
}

#[test]
fn test_blank_lines_are_fine() {
    assert!(assemble("\n\n   ecall\n\n").is_ok());
}

// ============================================================================
// Invalid Operand Tests
// ============================================================================

#[test]
fn test_missing_operand() {
    let err = assemble("add a0, a1").unwrap_err();
    assert!(matches!(err, AssemblerError::InvalidOperands { line: 1, .. }));
}

#[test]
fn test_extra_operand() {
    let err = assemble("enterprot a5, a4").unwrap_err();
    assert!(matches!(err, AssemblerError::InvalidOperands { line: 1, .. }));
}

#[test]
fn test_wrong_operand_kind() {
    let err = assemble("lb t1, a3").unwrap_err();
    assert!(matches!(err, AssemblerError::InvalidOperands { .. }));

    let err = assemble("setproti 5").unwrap_err();
    assert!(matches!(err, AssemblerError::InvalidOperands { .. }));
}

#[test]
fn test_invalid_register() {
    let err = assemble("lw a0, 0(x32)").unwrap_err();
    assert!(matches!(err, AssemblerError::SyntaxError { line: 1, .. }));
}

#[test]
fn test_empty_operand() {
    let err = assemble("add a0,, a1").unwrap_err();
    assert!(matches!(err, AssemblerError::SyntaxError { .. }));
}

#[test]
fn test_stray_character() {
    let err = assemble("nop\naddi a0, a0, @").unwrap_err();
    assert!(matches!(err, AssemblerError::SyntaxError { line: 2, .. }));
}

// ============================================================================
// Label Tests
// ============================================================================

#[test]
fn test_undefined_label() {
    let err = assemble("j missing").unwrap_err();
    assert_eq!(err, AssemblerError::UndefinedLabel { line: 1, label: "missing".to_string() });
}

#[test]
fn test_duplicate_label_across_sections() {
    let err = assemble("x: nop\n.data\nx: .byte 1").unwrap_err();
    assert_eq!(err, AssemblerError::DuplicateLabel { line: 3, label: "x".to_string() });
}

#[test]
fn test_undefined_label_in_word() {
    let err = assemble(".data\n.word nowhere").unwrap_err();
    assert!(matches!(err, AssemblerError::UndefinedLabel { line: 2, .. }));
}

// ============================================================================
// Directive Tests
// ============================================================================

#[test]
fn test_unknown_directive() {
    let err = assemble(".frobnicate 3").unwrap_err();
    assert_eq!(
        err,
        AssemblerError::InvalidDirective { line: 1, directive: "frobnicate".to_string() }
    );
}

#[test]
fn test_data_directive_in_text() {
    let err = assemble(".byte 1").unwrap_err();
    assert!(matches!(err, AssemblerError::WrongSection { line: 1, section: "text", .. }));
}

#[test]
fn test_instruction_in_data() {
    let err = assemble(".data\nenterprot a5").unwrap_err();
    assert!(matches!(err, AssemblerError::WrongSection { line: 2, section: "data", .. }));
}

#[test]
fn test_byte_out_of_range() {
    let err = assemble(".data\n.byte 256").unwrap_err();
    assert_eq!(err, AssemblerError::InvalidImmediate { line: 2, value: 256, bits: 8 });
}

#[test]
fn test_bad_directive_arguments() {
    assert!(matches!(
        assemble(".data\n.ascii 5").unwrap_err(),
        AssemblerError::InvalidDirective { .. }
    ));
    assert!(matches!(
        assemble(".data\n.zero -1").unwrap_err(),
        AssemblerError::InvalidDirective { .. }
    ));
    assert!(matches!(
        assemble(".data\n.align 40").unwrap_err(),
        AssemblerError::InvalidDirective { .. }
    ));
}

#[test]
fn test_odd_branch_offset() {
    let err = assemble("bne a0, zero, 5").unwrap_err();
    assert_eq!(err, AssemblerError::MisalignedTarget { line: 1, offset: 5 });
}

#[test]
fn test_lui_out_of_range() {
    let err = assemble("lui a0, 0x100000").unwrap_err();
    assert!(matches!(err, AssemblerError::InvalidImmediate { bits: 20, .. }));
    let err = assemble("lui a0, -1").unwrap_err();
    assert!(matches!(err, AssemblerError::InvalidImmediate { bits: 20, .. }));
}
