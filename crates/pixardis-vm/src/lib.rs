//! The Pixardis stack machine: executes a resolved [`pixardis_assembler::Program`]
//! instruction by instruction, exposing the framebuffer and print output the
//! host facade polls after each `step` (spec.md §4.6, §5).

mod error;
mod vm;

pub use error::VmError;
pub use vm::Vm;

#[cfg(test)]
mod tests {
    use super::*;
    use pixardis_assembler::assemble;

    fn run(src: &str, width: u32, height: u32) -> Vm {
        let program = assemble(src).unwrap();
        let mut vm = Vm::new(program, width, height, 42);
        while vm.step(1_000) {}
        vm
    }

    #[test]
    fn arithmetic_and_halt() {
        let vm = run(".globals 0\n    push 2\n    push 3\n    add\n    drop\n    halt\n", 1, 1);
        assert!(vm.is_halted());
        assert!(vm.error().is_none());
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let vm = run(".globals 0\n    push 1\n    push 0\n    div\n    drop\n    halt\n", 1, 1);
        assert_eq!(vm.error(), Some(&VmError::DivisionByZero));
    }

    #[test]
    fn float_division_by_zero_is_a_runtime_error() {
        let vm = run(".globals 0\n    push 1.0\n    push 0.0\n    div\n    drop\n    halt\n", 1, 1);
        assert_eq!(vm.error(), Some(&VmError::DivisionByZero));
    }

    #[test]
    fn recursive_call_reuses_local_slots_per_activation() {
        // fib(n) = n < 2 ? n : fib(n-1) + fib(n-2); computes fib(6) = 8, then
        // prints it so the result is observable without a globals accessor.
        let src = "
.globals 0
    push 6
    call fn_fib, 1
    print
    halt
fn_fib:
    oframe 1
    push [0]
    push 2
    lt
    jz L0
    push [0]
    jmp L1
L0:
    push [0]
    push 1
    sub
    call fn_fib, 1
    push [0]
    push 2
    sub
    call fn_fib, 1
    add
L1:
    cframe
    ret
";
        let vm = run(src, 1, 1);
        assert!(vm.error().is_none(), "unexpected error: {:?}", vm.error());
        assert!(vm.is_halted());
        assert_eq!(vm.print_output(), "8\n");
    }

    #[test]
    fn global_write_pixel_respects_coordinate_flip() {
        let src = "
.globals 0
    push 0
    push 0
    push #FF0000
    write_pixel
    halt
";
        let vm = run(src, 2, 2);
        assert!(vm.error().is_none());
        // (0,0) in Pixardis's bottom-left origin is the last row of the buffer.
        let offset = 3 * (2 * 2 - 2);
        assert_eq!(&vm.framebuffer()[offset..offset + 3], &[0xFF, 0x00, 0x00]);
    }

    #[test]
    fn out_of_bounds_pixel_write_is_a_runtime_error() {
        let src = "
.globals 0
    push 99
    push 99
    push #FFFFFF
    write_pixel
    halt
";
        let vm = run(src, 2, 2);
        assert_eq!(vm.error(), Some(&VmError::PixelOutOfBounds { x: 99, y: 99, width: 2, height: 2 }));
    }

    #[test]
    fn clear_fills_the_whole_canvas() {
        let src = ".globals 0\n    push #00FF00\n    clear\n    halt\n";
        let vm = run(src, 2, 2);
        assert!(vm.framebuffer().chunks_exact(3).all(|px| px == [0x00, 0xFF, 0x00]));
    }

    #[test]
    fn print_appends_a_line_per_call() {
        let src = ".globals 0\n    push 1\n    print\n    push 2\n    print\n    halt\n";
        let vm = run(src, 1, 1);
        assert_eq!(vm.print_output(), "1\n2\n");
    }

    #[test]
    fn delay_suppresses_execution_for_that_many_steps() {
        let src = ".globals 0\n    push 3\n    delay\n    push 1\n    drop\n    halt\n";
        let program = assemble(src).unwrap();
        let mut vm = Vm::new(program, 1, 1, 1);
        vm.step(1); // push 3
        vm.step(1); // delay pops the operand and starts a 3-step countdown
        assert!(!vm.is_halted());
        vm.step(3); // three steps burned waiting, pc does not advance
        assert!(!vm.is_halted());
        vm.step(2); // push 1, drop now execute
        assert!(!vm.step(1)); // halt executes; step() reports execution has stopped
        assert!(vm.is_halted());
    }

    #[test]
    fn random_int_is_deterministic_for_a_fixed_seed() {
        let src = ".globals 0\n    push 10\n    rand\n    print\n    halt\n";
        let mut vm_a = Vm::new(assemble(src).unwrap(), 1, 1, 7);
        let mut vm_b = Vm::new(assemble(src).unwrap(), 1, 1, 7);
        while vm_a.step(10) {}
        while vm_b.step(10) {}
        assert_eq!(vm_a.print_output(), vm_b.print_output());
        assert!(!vm_a.print_output().is_empty());
    }

    #[test]
    fn load_program_resets_execution_but_preserves_the_framebuffer() {
        let first = ".globals 0\n    push #FFFFFF\n    clear\n    halt\n";
        let mut vm = Vm::new(assemble(first).unwrap(), 1, 1, 1);
        while vm.step(10) {}
        assert!(vm.is_halted());
        assert_eq!(vm.framebuffer(), &[0xFF, 0xFF, 0xFF]);

        let second = ".globals 0\n    push 9\n    print\n    halt\n";
        vm.load_program(assemble(second).unwrap());
        assert!(!vm.is_halted());
        assert_eq!(vm.framebuffer(), &[0xFF, 0xFF, 0xFF]);
        while vm.step(10) {}
        assert_eq!(vm.print_output(), "9\n");
    }

    #[test]
    fn reset_clears_framebuffer_and_halted_state() {
        let src = ".globals 0\n    push #FFFFFF\n    clear\n    halt\n";
        let program = assemble(src).unwrap();
        let mut vm = Vm::new(program, 1, 1, 1);
        while vm.step(10) {}
        assert!(vm.is_halted());
        vm.reset();
        assert!(!vm.is_halted());
        assert!(vm.framebuffer().iter().all(|&b| b == 0));
    }
}
