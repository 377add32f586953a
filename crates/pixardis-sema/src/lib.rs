//! Two-pass semantic analysis (spec.md §4.3): name resolution, type
//! checking, and slot assignment. The AST is never mutated — every
//! annotation lands in the [`Analysis`] side table, keyed by the arena
//! handle the node was allocated with (spec.md §9).

mod analysis;
mod analyzer;
mod scope;

pub use analysis::{Analysis, VarRef};
pub use analyzer::analyze;
pub use scope::Symbol;

#[cfg(test)]
mod tests {
    use super::*;
    use pixardis_parser::parse_source;

    fn analyze_src(src: &str) -> (pixardis_parser::Ast, Analysis, pixardis_types::DiagnosticSink) {
        let (ast, parse_sink) = parse_source(src);
        assert!(parse_sink.is_empty(), "unexpected parse errors: {:?}", parse_sink.into_vec());
        let (analysis, sema_sink) = analyze(&ast, src);
        (ast, analysis, sema_sink)
    }

    #[test]
    fn resolves_top_level_variable_and_assigns_global_slot() {
        let (ast, analysis, sink) = analyze_src("let x:int = 1; x = 2;");
        assert!(sink.is_empty(), "unexpected errors: {:?}", sink.into_vec());
        let assign_id = ast.top_level[1];
        let var_ref = analysis.assign_refs.get(&assign_id).expect("resolved assignment");
        assert!(var_ref.is_global);
        assert_eq!(var_ref.slot, 0);
    }

    #[test]
    fn function_can_mutate_a_global_variable() {
        let (_, _, sink) = analyze_src(
            "let i:int = 0; fun bump() -> bool { i = i + 1; return true; } let b:bool = bump();",
        );
        assert!(sink.is_empty(), "unexpected errors: {:?}", sink.into_vec());
    }

    #[test]
    fn forward_reference_to_function_is_allowed() {
        let (_, _, sink) = analyze_src("let x:int = add(1,2); fun add(a:int,b:int) -> int { return a + b; }");
        assert!(sink.is_empty(), "unexpected errors: {:?}", sink.into_vec());
    }

    #[test]
    fn rejects_redeclaration_in_the_same_scope() {
        let (_, _, sink) = analyze_src("let x:int = 1; let x:int = 2;");
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.into_vec()[0].kind, pixardis_types::DiagnosticKind::NameResolution);
    }

    #[test]
    fn allows_shadowing_in_a_nested_scope() {
        let (_, _, sink) = analyze_src("let x:int = 1; if (true) { let x:int = 2; }");
        assert!(sink.is_empty(), "unexpected errors: {:?}", sink.into_vec());
    }

    #[test]
    fn rejects_assigning_float_to_int_without_cast() {
        let (_, _, sink) = analyze_src("let x:int = 1; x = 1.5;");
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.into_vec()[0].kind, pixardis_types::DiagnosticKind::Type);
    }

    #[test]
    fn accepts_explicit_cast() {
        let (_, _, sink) = analyze_src("let x:int = 1; x = 1.5 as int;");
        assert!(sink.is_empty(), "unexpected errors: {:?}", sink.into_vec());
    }

    #[test]
    fn requires_every_path_to_return() {
        let (_, _, sink) =
            analyze_src("fun f(a:int) -> int { if (a > 0) { return 1; } }");
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.into_vec()[0].kind, pixardis_types::DiagnosticKind::Semantic);
    }

    #[test]
    fn accepts_return_in_both_branches() {
        let (_, _, sink) = analyze_src("fun f(a:int) -> int { if (a > 0) { return 1; } else { return 0; } }");
        assert!(sink.is_empty(), "unexpected errors: {:?}", sink.into_vec());
    }

    #[test]
    fn array_index_must_be_int() {
        let (_, _, sink) = analyze_src("let xs:int[3] = [1,2,3]; let y:int = xs[true];");
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.into_vec()[0].kind, pixardis_types::DiagnosticKind::Type);
    }

    #[test]
    fn short_circuit_does_not_require_matching_evaluated_rhs_type() {
        let (_, _, sink) = analyze_src("let b:bool = (1 > 0) and (2 > 1);");
        assert!(sink.is_empty(), "unexpected errors: {:?}", sink.into_vec());
    }

    #[test]
    fn builtin_statement_argument_types_are_checked() {
        let (_, _, sink) = analyze_src("__clear 5;");
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.into_vec()[0].kind, pixardis_types::DiagnosticKind::Type);
    }

    #[test]
    fn colour_scaling_by_int_is_allowed() {
        let (_, _, sink) = analyze_src("let c:colour = #FF0000 * 2;");
        assert!(sink.is_empty(), "unexpected errors: {:?}", sink.into_vec());
    }
}
