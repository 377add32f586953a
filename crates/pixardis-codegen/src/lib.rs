//! Lowers a parsed, analyzed program into the textual assembly the
//! assembler consumes (spec.md §4.4). Codegen is deliberately thin: it
//! trusts [`pixardis_sema::Analysis`] for every name/type/slot decision and
//! only decides instruction *shape* (short-circuit jumps, array-literal
//! lowering, label naming).

mod codegen;

pub use codegen::generate;

#[cfg(test)]
mod tests {
    use super::*;
    use pixardis_parser::parse_source;
    use pixardis_sema::analyze;

    fn compile(src: &str) -> String {
        let (ast, parse_sink) = parse_source(src);
        assert!(parse_sink.is_empty(), "unexpected parse errors: {:?}", parse_sink.into_vec());
        let (analysis, sema_sink) = analyze(&ast, src);
        assert!(sema_sink.is_empty(), "unexpected sema errors: {:?}", sema_sink.into_vec());
        generate(&ast, &analysis)
    }

    #[test]
    fn emits_globals_directive_and_trailing_halt() {
        let asm = compile("let x:int = 1;");
        assert!(asm.starts_with(".globals 1\n"));
        assert!(asm.contains("halt"));
    }

    #[test]
    fn global_assignment_uses_global_opcodes() {
        let asm = compile("let x:int = 1; x = 2; let y:int = x;");
        assert!(asm.contains("pop g[0]"));
        assert!(asm.contains("push g[0]"));
    }

    #[test]
    fn function_mutating_a_global_emits_global_opcodes_inside_the_function() {
        let asm = compile("let i:int = 0; fun bump() -> bool { i = i + 1; return true; } let b:bool = bump();");
        assert!(asm.contains("fn_bump:"));
        let fn_body = asm.split("fn_bump:").nth(1).unwrap();
        assert!(fn_body.contains("push g[0]"));
        assert!(fn_body.contains("pop g[0]"));
    }

    #[test]
    fn call_targets_the_function_label_with_arg_count() {
        let asm = compile("fun add(a:int, b:int) -> int { return a + b; } let x:int = add(1,2);");
        assert!(asm.contains("call fn_add, 2"));
    }

    #[test]
    fn if_else_lowers_to_jz_and_two_labels() {
        let asm = compile("if (true) { let x:int = 1; } else { let y:int = 2; }");
        assert!(asm.contains("jz L0"));
        assert!(asm.contains("jmp L1"));
        assert!(asm.contains("L0:"));
        assert!(asm.contains("L1:"));
    }

    #[test]
    fn while_loop_places_test_at_top_and_back_edge_at_bottom() {
        let asm = compile("while (false) { __print 1; }");
        let lines: Vec<&str> = asm.lines().collect();
        let start_idx = lines.iter().position(|l| *l == "L0:").unwrap();
        let back_edge_idx = lines.iter().position(|l| l.trim() == "jmp L0").unwrap();
        assert!(back_edge_idx > start_idx);
    }

    #[test]
    fn and_short_circuits_with_dup_and_conditional_jump() {
        let asm = compile("let b:bool = true and false;");
        assert!(asm.contains("dup"));
        assert!(asm.contains("jz"));
    }

    #[test]
    fn or_short_circuits_with_dup_and_conditional_jump() {
        let asm = compile("let b:bool = true or false;");
        assert!(asm.contains("dup"));
        assert!(asm.contains("jnz"));
    }

    #[test]
    fn array_literal_pushes_in_reverse_then_pops_ascending() {
        let asm = compile("let xs:int[3] = [1,2,3];");
        let idx_3 = asm.find("push 3").unwrap();
        let idx_2 = asm.find("push 2").unwrap();
        let idx_1 = asm.find("push 1").unwrap();
        assert!(idx_3 < idx_2 && idx_2 < idx_1);
        let idx_pop0 = asm.find("pop [0]").unwrap();
        let idx_pop1 = asm.find("pop [1]").unwrap();
        let idx_pop2 = asm.find("pop [2]").unwrap();
        assert!(idx_pop0 < idx_pop1 && idx_pop1 < idx_pop2);
    }

    #[test]
    fn cast_emits_the_matching_conversion_opcode() {
        let asm = compile("let x:float = 1 as float;");
        assert!(asm.contains("itof"));
    }

    #[test]
    fn identical_source_yields_identical_assembly() {
        let src = "fun f(a:int) -> int { if (a > 0) { return a; } else { return 0; } }";
        assert_eq!(compile(src), compile(src));
    }

    #[test]
    fn builtin_statement_and_expression_lower_to_their_mnemonics() {
        let asm = compile("__clear #000000; let w:int = __width;");
        assert!(asm.contains("clear"));
        assert!(asm.contains("width"));
    }

    #[test]
    fn whole_valued_float_literal_keeps_its_decimal_point() {
        let asm = compile("let x:float = 3.0;");
        assert!(asm.contains("push 3.0"), "assembly was: {asm}");
        assert!(!asm.contains("push 3\n"), "assembly was: {asm}");
    }

    #[test]
    fn return_emits_cframe_before_ret() {
        let asm = compile("fun f() -> int { return 1; }");
        let cframe_idx = asm.find("cframe").unwrap();
        let ret_idx = asm.find("ret").unwrap();
        assert!(cframe_idx < ret_idx);
    }
}
