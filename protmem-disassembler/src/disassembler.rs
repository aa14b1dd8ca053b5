//! Main disassembler logic

use crate::decoder::decode;
use crate::error::Result;
use crate::formatter::{branch_target, format};
use protmem_spec::Program;
use std::fmt::Write;

/// Disassemble a program into an annotated listing.
///
/// Undecodable words are listed with an error comment rather than
/// aborting the listing.
pub fn disassemble(program: &Program) -> Result<String> {
    program.validate()?;

    let header = &program.header;
    let mut output = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(output, "; Protmem Disassembly");
    let _ = writeln!(output, "; Entry point: 0x{:08X}", header.entry_point);
    let _ = writeln!(
        output,
        "; Code: 0x{:08X}, {} bytes ({} instructions)",
        header.code_base,
        header.code_size,
        program.code.len()
    );
    let _ = writeln!(output, "; Data: 0x{:08X}, {} bytes", header.data_base, header.data_size);
    output.push('\n');

    output.push_str(".text\n");
    for (i, &word) in program.code.iter().enumerate() {
        let addr = header.code_base + (i as u32) * 4;
        let marker = if addr == header.entry_point { ">" } else { " " };
        let _ = write!(output, "{marker}0x{addr:08X}:  {word:08X}  ");

        match decode(word) {
            Ok(instr) => {
                output.push_str(&format(&instr));
                if let Some(target) = branch_target(&instr, addr) {
                    let _ = write!(output, "  # 0x{target:08X}");
                }
            }
            Err(e) => {
                let _ = write!(output, "; ERROR: {e}");
            }
        }
        output.push('\n');
    }

    if !program.data.is_empty() {
        output.push_str("\n.data\n");
        for (i, chunk) in program.data.chunks(8).enumerate() {
            let addr = header.data_base + (i as u32) * 8;
            let bytes: Vec<String> = chunk.iter().map(|b| b.to_string()).collect();
            let _ = writeln!(output, " 0x{addr:08X}:  .byte {}", bytes.join(", "));
        }
    }

    Ok(output)
}
