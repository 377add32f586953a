//! Turns codegen's textual assembly into a [`Program`] the virtual machine
//! can execute directly: every mnemonic resolved to an [`pixardis_types::Instr`]
//! and every label resolved to an absolute instruction index (spec.md §4.5).

mod assembler;
mod error;

pub use assembler::{assemble, Program};
pub use error::AssembleError;

#[cfg(test)]
mod tests {
    use super::*;
    use pixardis_types::Instr;

    #[test]
    fn assembles_a_forward_jump() {
        let src = ".globals 0\n    push true\n    jz L0\n    push 1\n    drop\nL0:\n    halt\n";
        let program = assemble(src).unwrap();
        assert_eq!(
            program.instructions,
            vec![Instr::PushBool(true), Instr::Jz(4), Instr::PushInt(1), Instr::Drop, Instr::Halt]
        );
    }

    #[test]
    fn assembles_a_backward_jump() {
        let src = ".globals 0\nL0:\n    push false\n    jz L1\n    jmp L0\nL1:\n    halt\n";
        let program = assemble(src).unwrap();
        assert_eq!(
            program.instructions,
            vec![Instr::PushBool(false), Instr::Jz(3), Instr::Jmp(0), Instr::Halt]
        );
    }

    #[test]
    fn resolves_call_with_label_and_arg_count() {
        let src = ".globals 0\n    push 1\n    push 2\n    call fn_add, 2\n    halt\nfn_add:\n    oframe 2\n    push [0]\n    push [1]\n    add\n    cframe\n    ret\n";
        let program = assemble(src).unwrap();
        assert_eq!(program.instructions[2], Instr::Call(4, 2));
    }

    #[test]
    fn parses_all_slot_addressing_forms() {
        let src = ".globals 1\n    push [0]\n    push +[0]\n    push g[0]\n    push +g[0]\n    pop [0]\n    pop +[0]\n    pop g[0]\n    pop +g[0]\n    halt\n";
        let program = assemble(src).unwrap();
        assert_eq!(
            program.instructions,
            vec![
                Instr::PushLocal(0),
                Instr::PushIndexed(0),
                Instr::PushGlobal(0),
                Instr::PushIndexedGlobal(0),
                Instr::PopLocal(0),
                Instr::PopIndexed(0),
                Instr::PopGlobal(0),
                Instr::PopIndexedGlobal(0),
                Instr::Halt,
            ]
        );
    }

    #[test]
    fn parses_colour_literal() {
        let src = ".globals 0\n    push #FF8000\n    halt\n";
        let program = assemble(src).unwrap();
        assert_eq!(program.instructions[0], Instr::PushColour(0x00FF8000));
    }

    #[test]
    fn unknown_mnemonic_is_reported_with_its_line() {
        let src = ".globals 0\n    bogus\n";
        let err = assemble(src).unwrap_err();
        assert_eq!(err, AssembleError::UnknownMnemonic { line: 2, mnemonic: "bogus".to_string() });
    }

    #[test]
    fn unresolved_label_is_reported() {
        let src = ".globals 0\n    jmp nowhere\n";
        let err = assemble(src).unwrap_err();
        assert_eq!(err, AssembleError::UnresolvedLabel { line: 2, label: "nowhere".to_string() });
    }

    #[test]
    fn duplicate_label_is_reported() {
        let src = ".globals 0\nL0:\nL0:\n    halt\n";
        let err = assemble(src).unwrap_err();
        assert_eq!(err, AssembleError::DuplicateLabel { line: 3, label: "L0".to_string() });
    }

    #[test]
    fn missing_globals_directive_is_reported() {
        let src = "    halt\n";
        let err = assemble(src).unwrap_err();
        assert_eq!(err, AssembleError::MissingGlobalsDirective);
    }

    #[test]
    fn wrong_operand_count_is_reported() {
        let src = ".globals 0\n    add 1\n";
        let err = assemble(src).unwrap_err();
        assert_eq!(err, AssembleError::WrongOperandCount { line: 2, mnemonic: "add".to_string(), expected: 0, found: 1 });
    }
}
