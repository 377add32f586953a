//! The Pixardis facade (spec.md §6): wires lexer → parser → semantic
//! analyzer → code generator → assembler → virtual machine into the handful
//! of operations a host (editor, CLI, test) actually calls.

pub mod config;

pub use config::VmConfig;
pub use pixardis_assembler::AssembleError;
pub use pixardis_vm::VmError;

use pixardis_assembler::{assemble, Program};
use pixardis_types::render_diagnostics;
use pixardis_vm::Vm;
use tracing::debug;

/// Result of [`compile`]: either ready-to-load assembly text, or the full set
/// of diagnostics collected across lexing, parsing and semantic analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    pub success: bool,
    pub assembly: String,
    pub errors: Vec<String>,
}

/// Lexes, parses, analyzes and (if no diagnostics were raised) generates
/// assembly for `source`. No assembly is produced when any diagnostic is
/// present — mirrors the "no code is emitted if any error is present" rule
/// of spec.md §4.3.
pub fn compile(source: &str) -> CompileOutput {
    let (ast, mut sink) = pixardis_parser::parse_source(source);
    let (analysis, sema_sink) = pixardis_sema::analyze(&ast, source);
    sink.extend(sema_sink);

    if !sink.is_empty() {
        debug!(error_count = sink.len(), "compilation failed");
        return CompileOutput { success: false, assembly: String::new(), errors: render_diagnostics(&sink.into_vec()) };
    }

    let assembly = pixardis_codegen::generate(&ast, &analysis);
    debug!(bytes = assembly.len(), "compilation succeeded");
    CompileOutput { success: true, assembly, errors: Vec::new() }
}

/// Outcome of a [`VmHandle::step`] burst: whether the VM can still make
/// progress, and the runtime error message if not.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub success: bool,
    pub error: Option<String>,
}

/// The facade's `vm_handle` (spec.md §6): a VM together with the canvas
/// dimensions and RNG seed it was created with, so `reset` can rebuild it
/// identically.
pub struct VmHandle {
    vm: Vm,
    width: u32,
    height: u32,
    seed: u64,
}

impl VmHandle {
    /// Creates a VM with no program loaded; `step` before `load_program`
    /// fails with [`VmError::ProgramCounterOutOfBounds`].
    pub fn create_vm(width: u32, height: u32, seed: u64) -> Self {
        let program = Program { instructions: Vec::new(), global_count: 0 };
        VmHandle { vm: Vm::new(program, width, height, seed), width, height, seed }
    }

    pub fn from_config(config: VmConfig) -> Self {
        Self::create_vm(config.width, config.height, config.seed)
    }

    /// Assembles `assembly_text` and loads it into the VM, replacing any
    /// program loaded previously (spec.md §4.5).
    pub fn load_program(&mut self, assembly_text: &str) -> Result<(), AssembleError> {
        let program = assemble(assembly_text)?;
        self.vm.load_program(program);
        Ok(())
    }

    /// Executes up to `n` instructions. `success` is true whenever the burst
    /// completed without a runtime error — including a clean `halt` partway
    /// through — and false only once the VM has recorded an error (spec.md
    /// §4.6); `is_halted` distinguishes "ran out of instructions" from "ran
    /// to completion" for a caller that needs to stop driving `step`.
    pub fn step(&mut self, n: u32) -> StepOutcome {
        self.vm.step(n);
        match self.vm.error() {
            Some(e) => StepOutcome { success: false, error: Some(e.to_string()) },
            None => StepOutcome { success: true, error: None },
        }
    }

    pub fn get_framebuffer(&self) -> &[u8] {
        self.vm.framebuffer()
    }

    /// The ordered sequence of lines `__print` has appended so far (spec.md
    /// §3, §6: `get_print_output(vm) → [string]`), oldest first.
    pub fn get_print_output(&self) -> Vec<&str> {
        self.vm.print_output().lines().collect()
    }

    pub fn clear_print_output(&mut self) {
        self.vm.clear_print_output()
    }

    pub fn is_halted(&self) -> bool {
        self.vm.is_halted()
    }

    /// Discards all VM state and rebuilds a fresh VM with the same
    /// dimensions and seed (spec.md §5, "Cancellation").
    pub fn reset(&mut self) {
        let program = Program { instructions: Vec::new(), global_count: 0 };
        self.vm = Vm::new(program, self.width, self.height, self.seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drives `step` in bursts of `chunk` instructions until the VM halts or
    /// errors, the way a host would between animation frames.
    fn run_to_halt(vm: &mut VmHandle, chunk: u32) {
        loop {
            let outcome = vm.step(chunk);
            assert!(outcome.success, "unexpected runtime error: {:?}", outcome.error);
            if vm.is_halted() {
                break;
            }
        }
    }

    #[test]
    fn compile_reports_a_lexical_and_type_error_together() {
        let output = compile("let x:int = 1; x = 1.5;");
        assert!(!output.success);
        assert!(output.assembly.is_empty());
        assert_eq!(output.errors.len(), 1);
        assert!(output.errors[0].contains("Type Error"));
    }

    #[test]
    fn compile_succeeds_and_produces_loadable_assembly() {
        let output = compile("__clear #102030; __print __read 0,0;");
        assert!(output.success);
        assert!(output.errors.is_empty());

        let mut vm = VmHandle::create_vm(4, 4, 1);
        vm.load_program(&output.assembly).unwrap();
        run_to_halt(&mut vm, 1_000);
        assert!(vm.is_halted());
        assert_eq!(vm.get_print_output(), vec!["#102030"]);
    }

    #[test]
    fn fibonacci_sample_prints_five() {
        let src = "
fun fibonacci(n:int) -> int {
    if (n < 2) {
        return n;
    }
    return fibonacci(n - 1) + fibonacci(n - 2);
}
__print fibonacci(5);
";
        let output = compile(src);
        assert!(output.success, "unexpected errors: {:?}", output.errors);

        let mut vm = VmHandle::create_vm(1, 1, 1);
        vm.load_program(&output.assembly).unwrap();
        run_to_halt(&mut vm, 10_000);
        assert!(vm.is_halted());
        assert_eq!(vm.get_print_output(), vec!["5"]);
    }

    #[test]
    fn short_circuit_and_skips_the_right_hand_call() {
        let src = "
let i:int = 0;
fun bump() -> bool {
    i = i + 1;
    return true;
}
let b:bool = (false and bump()) or (true or bump());
__print i;
";
        let output = compile(src);
        assert!(output.success, "unexpected errors: {:?}", output.errors);

        let mut vm = VmHandle::create_vm(1, 1, 1);
        vm.load_program(&output.assembly).unwrap();
        run_to_halt(&mut vm, 1_000);
        assert_eq!(vm.get_print_output(), vec!["0"]);
    }

    #[test]
    fn coordinate_flip_puts_source_origin_at_the_last_row() {
        let output = compile("__clear #000000; __write 0,0,#FF0000;");
        assert!(output.success);

        let mut vm = VmHandle::create_vm(2, 2, 1);
        vm.load_program(&output.assembly).unwrap();
        run_to_halt(&mut vm, 1_000);
        let offset = 3 * (2 * 2 - 2);
        assert_eq!(&vm.get_framebuffer()[offset..offset + 3], &[0xFF, 0x00, 0x00]);
    }

    #[test]
    fn partial_steps_match_one_large_step() {
        let output = compile("let i:int = 0; while (i < 50) { i = i + 1; __print i; }");
        assert!(output.success);

        let mut split = VmHandle::create_vm(1, 1, 1);
        split.load_program(&output.assembly).unwrap();
        split.step(100);
        split.step(100);

        let mut whole = VmHandle::create_vm(1, 1, 1);
        whole.load_program(&output.assembly).unwrap();
        whole.step(200);

        assert_eq!(split.get_print_output(), whole.get_print_output());
        assert_eq!(split.get_framebuffer(), whole.get_framebuffer());
    }

    #[test]
    fn stepping_before_a_program_is_loaded_is_a_runtime_error() {
        let mut vm = VmHandle::create_vm(1, 1, 1);
        let outcome = vm.step(1);
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn reset_rebuilds_a_fresh_vm_with_the_same_dimensions() {
        let output = compile("__clear #FFFFFF;");
        let mut vm = VmHandle::create_vm(2, 2, 7);
        vm.load_program(&output.assembly).unwrap();
        run_to_halt(&mut vm, 1_000);
        assert!(vm.get_framebuffer().iter().all(|&b| b == 0xFF));

        vm.reset();
        assert!(!vm.is_halted());
        assert!(vm.get_framebuffer().iter().all(|&b| b == 0));
    }
}
