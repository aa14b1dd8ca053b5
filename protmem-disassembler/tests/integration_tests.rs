//! Integration tests for the Protmem disassembler
//!
//! Assembles real source, then checks decoding and the listing format.

use proptest::prelude::*;
use protmem_assembler::{assemble, encode, parse_instruction};
use protmem_disassembler::{decode, disassemble, format, DisassemblerError};
use protmem_spec::encoding::{pack_r, OPCODE_CUSTOM_0};
use protmem_spec::{Instruction, MachineConfig, Program, Register};

const DEMO: &str = r#"
    .data
    secret: .byte 17, 96, 101, 27
    .text
    _start:
        la a3, secret
        li t0, 4
        setprotd a3, t0
    loop:
        lb t1, 0(a3)
        addi t0, t0, -1
        bne t0, zero, loop
        enterprot a5
        exitprot a5
        ebreak
"#;

// ============================================================================
// Decode Tests
// ============================================================================

#[test]
fn test_decode_assembled_program() {
    let program = assemble(DEMO).unwrap();
    let decoded: Vec<Instruction> = program.code.iter().map(|w| decode(*w).unwrap()).collect();

    assert_eq!(decoded.len(), 11);
    assert_eq!(decoded[4], Instruction::Setprotd { rs1: Register::A3, rs2: Register::T0 });
    assert_eq!(decoded[7], Instruction::Bne { rs1: Register::T0, rs2: Register::ZERO, offset: -8 });
    assert_eq!(decoded[8], Instruction::Enterprot { rd: Register::A5 });
}

#[test]
fn test_decode_rejects_reserved_bits() {
    // setproti with rs2 != 0
    let word = pack_r(OPCODE_CUSTOM_0, 0, 0, 10, 3, 0);
    assert!(matches!(decode(word), Err(DisassemblerError::InvalidEncoding(w)) if w == word));

    // enterprot with funct7 != 0
    let word = pack_r(OPCODE_CUSTOM_0, 15, 2, 0, 0, 1);
    assert!(matches!(decode(word), Err(DisassemblerError::InvalidEncoding(_))));

    // unused funct3 in custom-0
    let word = pack_r(OPCODE_CUSTOM_0, 0, 7, 0, 0, 0);
    assert!(matches!(decode(word), Err(DisassemblerError::InvalidEncoding(_))));
}

#[test]
fn test_decode_unknown_major_opcode() {
    // AUIPC is outside the subset
    assert!(matches!(decode(0x0000_0517), Err(DisassemblerError::UnknownOpcode(0x17))));
    assert!(decode(0xFFFF_FFFF).is_err());
}

// ============================================================================
// Listing Tests
// ============================================================================

#[test]
fn test_listing_marks_entry_and_branches() {
    let program = assemble(DEMO).unwrap();
    let listing = disassemble(&program).unwrap();
    let base = MachineConfig::DEFAULT.code_base;

    assert!(listing.contains(&format!(">0x{base:08X}:")));
    assert!(listing.contains("setprotd a3, t0"));
    assert!(listing.contains(&format!("bne t0, zero, -8  # 0x{:08X}", base + 20)));
    assert!(listing.contains(".byte 17, 96, 101, 27"));
}

#[test]
fn test_listing_keeps_going_after_bad_word() {
    let program = assemble("nop\n.word 0xFFFFFFFF\nebreak").unwrap();
    let listing = disassemble(&program).unwrap();
    assert!(listing.contains("; ERROR:"));
    assert!(listing.contains("ebreak"));
}

#[test]
fn test_listing_rejects_inconsistent_program() {
    let mut program = Program::from_code(vec![0x0000_0073]);
    program.header.code_size = 8;
    assert!(matches!(disassemble(&program), Err(DisassemblerError::InvalidProgram(_))));
}

// ============================================================================
// Text Round Trip
// ============================================================================

#[test]
fn test_formatted_text_reassembles() {
    let program = assemble(DEMO).unwrap();
    for &word in &program.code {
        let text = format(&decode(word).unwrap());
        let reparsed = parse_instruction(&text).unwrap();
        assert_eq!(encode(&reparsed), word, "{text}");
    }
}

fn any_register() -> impl Strategy<Value = Register> {
    (0usize..32).prop_map(|i| Register::from_index(i).unwrap())
}

proptest! {
    #[test]
    fn prop_load_store_text_round_trip(
        rd in any_register(),
        rs1 in any_register(),
        imm in -2048i32..=2047,
        store in any::<bool>(),
    ) {
        let instr = if store {
            Instruction::Sb { rs1, rs2: rd, imm }
        } else {
            Instruction::Lbu { rd, rs1, imm }
        };
        let word = encode(&instr);
        prop_assert_eq!(decode(word).unwrap(), instr);
        prop_assert_eq!(parse_instruction(&format(&instr)).unwrap(), instr);
    }

    #[test]
    fn prop_decode_never_panics(word in any::<u32>()) {
        if let Ok(instr) = decode(word) {
            prop_assert_eq!(encode(&instr), word);
        }
    }
}
