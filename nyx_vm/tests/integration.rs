//! End-to-end pipeline tests: source text → preprocess → assemble → run.

use nyx_asm::{Assembler, Preprocessor};
use nyx_core::{Immediate, Interner, Register};
use nyx_vm::{Vm, VmError};
use std::sync::Arc;

const MEM_SIZE: usize = 8192;

/// Compile source through the full front half of the pipeline.
fn compile(source: &str) -> Vec<u8> {
    let interner = Arc::new(Interner::new());
    let stmts = nyx_parser::parse(source, &interner).expect("parse failed");
    let expanded = Preprocessor::new(stmts, Arc::clone(&interner))
        .process()
        .expect("preprocess failed");
    Assembler::new(expanded, interner)
        .assemble()
        .expect("assembly failed")
}

/// Compile and run to completion, returning the halted VM.
fn run(source: &str) -> Vm {
    let image = compile(source);
    let mut vm = Vm::new(&image, MEM_SIZE).expect("vm construction failed");
    vm.run().expect("execution failed");
    vm
}

fn q(vm: &Vm, reg: Register) -> u64 {
    vm.regs.get(reg).as_u64()
}

#[test]
fn test_arithmetic_scenario() {
    let vm = run("\
mov q0, 20
mov q1, 5
add q2, q0, q1
sub q3, q0, q1
mul q4, q0, q1
div q5, q0, q1
hlt
");
    assert_eq!(q(&vm, Register::Q2), 25);
    assert_eq!(q(&vm, Register::Q3), 15);
    assert_eq!(q(&vm, Register::Q4), 100);
    assert_eq!(q(&vm, Register::Q5), 4);
}

#[test]
fn test_forward_jump_scenario() {
    let vm = run("jmp skip\nmov q0, 1\nskip: mov q0, 2\nhlt");
    assert_eq!(q(&vm, Register::Q0), 2);
}

#[test]
fn test_conditional_preprocessing_scenario() {
    let with_define = run("#define X\n#ifdef X\nmov q0, 1\n#else\nmov q0, 2\n#endif\nhlt");
    assert_eq!(q(&with_define, Register::Q0), 1);

    let without_define = run("#ifdef X\nmov q0, 1\n#else\nmov q0, 2\n#endif\nhlt");
    assert_eq!(q(&without_define, Register::Q0), 2);
}

#[test]
fn test_stack_scenario() {
    let vm = run("mov q0, 42\npush qword q0\nmov q0, 0\npop qword q0\nhlt");
    assert_eq!(q(&vm, Register::Q0), 42);
    assert_eq!(vm.regs.sp(), MEM_SIZE);
}

#[test]
fn test_push_pop_lifo_with_mixed_sizes() {
    let vm = run("\
push byte 1
push word 2
push dword 3
push qword 4
pop qword q3
pop dword q2
pop word q1
pop byte q0
hlt
");
    assert_eq!(q(&vm, Register::Q3), 4);
    assert_eq!(vm.regs.get(Register::D2), Immediate::DWord(3));
    assert_eq!(vm.regs.get(Register::W1), Immediate::Word(2));
    assert_eq!(vm.regs.get(Register::B0), Immediate::Byte(1));
    assert_eq!(vm.regs.sp(), MEM_SIZE);
}

#[test]
fn test_counting_loop() {
    // Sum 1..=10 into q1.
    let vm = run("\
mov q0, 0
mov q1, 0
loop:
inc q0
add q1, q1, q0
cmp q0, 10
jlt loop
hlt
");
    assert_eq!(q(&vm, Register::Q0), 10);
    assert_eq!(q(&vm, Register::Q1), 55);
}

#[test]
fn test_cmp_branch_matrix() {
    // 3 < 5: jlt taken, jgt not.
    let vm = run("\
mov q0, 3
cmp q0, 5
jlt less
mov q1, 0
hlt
less: mov q1, 1
hlt
");
    assert_eq!(q(&vm, Register::Q1), 1);

    let vm = run("\
mov q0, 5
cmp q0, 5
jeq equal
mov q1, 0
hlt
equal: mov q1, 1
jle also_le
hlt
also_le: mov q2, 1
hlt
");
    assert_eq!(q(&vm, Register::Q1), 1);
    assert_eq!(q(&vm, Register::Q2), 1);
}

#[test]
fn test_cmp_is_unsigned() {
    // -1 in a qword register compares above 1.
    let vm = run("\
mov q0, 0
sub q0, q0, 1
cmp q0, 1
jgt wrapped
mov q1, 0
hlt
wrapped: mov q1, 1
hlt
");
    assert_eq!(q(&vm, Register::Q1), 1);
}

#[test]
fn test_cmp_register_pair_and_jne() {
    let vm = run("\
mov q0, 7
mov q1, 8
cmp q0, q1
jne differ
mov q2, 0
hlt
differ: mov q2, 1
hlt
");
    assert_eq!(q(&vm, Register::Q2), 1);
}

#[test]
fn test_float_arithmetic_and_compare() {
    let vm = run("\
mov dd0, 1.5
mov dd1, 2.25
add dd2, dd0, dd1
mul dd3, dd0, dd1
cmp dd0, dd1
jlt smaller
mov q0, 0
hlt
smaller: mov q0, 1
hlt
");
    assert_eq!(vm.regs.get(Register::DD2), Immediate::Double(3.75));
    assert_eq!(vm.regs.get(Register::DD3), Immediate::Double(3.375));
    assert_eq!(q(&vm, Register::Q0), 1);
}

#[test]
fn test_single_precision_registers() {
    let vm = run("\
mov ff0, 0.5
mov ff1, 0.25
sub ff2, ff0, ff1
hlt
");
    assert_eq!(vm.regs.get(Register::FF2), Immediate::Float(0.25));
}

#[test]
fn test_register_width_aliasing() {
    let vm = run("\
mov q0, 0x1122334455667788
mov b0, 0xAA
hlt
");
    assert_eq!(q(&vm, Register::Q0), 0x1122_3344_5566_77AA);
}

#[test]
fn test_bitwise_and_shifts() {
    let vm = run("\
mov q0, 0xF0
mov q1, 0x3C
and q2, q0, q1
or q3, q0, q1
xor q4, q0, q1
shl q5, q1, 2
shr q6, q1, 2
hlt
");
    assert_eq!(q(&vm, Register::Q2), 0x30);
    assert_eq!(q(&vm, Register::Q3), 0xFC);
    assert_eq!(q(&vm, Register::Q4), 0xCC);
    assert_eq!(q(&vm, Register::Q5), 0xF0);
    assert_eq!(q(&vm, Register::Q6), 0x0F);
}

#[test]
fn test_ldr_str_round_trip() {
    let vm = run("\
mov q0, 0x1000
mov q1, 0xDEADBEEF
str q1, [q0]
ldr q2, [q0]
ldr d3, [q0]
hlt
");
    assert_eq!(q(&vm, Register::Q2), 0xDEAD_BEEF);
    assert_eq!(vm.regs.get(Register::D3), Immediate::DWord(0xDEAD_BEEF));
}

#[test]
fn test_sti_stores_immediate() {
    let vm = run("\
sti dword 77, [0x1200]
ldr d0, [0x1200]
hlt
");
    assert_eq!(vm.regs.get(Register::D0), Immediate::DWord(77));
}

#[test]
fn test_load_from_data_label() {
    let vm = run("\
ldr q0, [answer]
ldr b1, [answer, 8]
hlt
.section data
answer: dq 42
        db 7
");
    assert_eq!(q(&vm, Register::Q0), 42);
    assert_eq!(vm.regs.get(Register::B1), Immediate::Byte(7));
}

#[test]
fn test_call_and_ret() {
    let vm = run("\
_start:
mov q0, 1
call double_it
call double_it
hlt
double_it:
add q0, q0, q0
ret
");
    assert_eq!(q(&vm, Register::Q0), 4);
    assert_eq!(vm.regs.sp(), MEM_SIZE);
}

#[test]
fn test_call_through_register() {
    let vm = run("\
mov q5, target
call q5
hlt
target:
mov q0, 9
ret
");
    assert_eq!(q(&vm, Register::Q0), 9);
}

#[test]
fn test_inc_dec_neg() {
    let vm = run("\
mov q0, 10
inc q0
inc q0
dec q0
mov q1, 5
neg q1
mov dd0, 2.5
neg dd0
hlt
");
    assert_eq!(q(&vm, Register::Q0), 11);
    assert_eq!(q(&vm, Register::Q1), 5u64.wrapping_neg());
    assert_eq!(vm.regs.get(Register::DD0), Immediate::Double(-2.5));
}

#[test]
fn test_byte_register_wraps() {
    let vm = run("\
mov b0, 255
inc b0
hlt
");
    assert_eq!(vm.regs.get(Register::B0), Immediate::Byte(0));
}

#[test]
fn test_entry_point_skips_dead_code() {
    let vm = run("\
mov q0, 1
hlt
_start:
mov q0, 2
hlt
");
    assert_eq!(q(&vm, Register::Q0), 2);
}

#[test]
fn test_malloc_and_free_syscalls() {
    let vm = run("\
mov q0, 256
mov q15, 4
syscall
mov q10, q0
sti qword 123, [q10]
ldr q11, [q10]
hlt
");
    // The fresh block lands right after the configured memory.
    assert_eq!(q(&vm, Register::Q10), MEM_SIZE as u64);
    assert_eq!(q(&vm, Register::Q11), 123);
    assert_eq!(vm.mmu.size(), MEM_SIZE + 256);

    let vm = run("\
mov q0, 256
mov q15, 4
syscall
mov q15, 5
syscall
hlt
");
    assert_eq!(vm.mmu.size(), MEM_SIZE);
}

#[test]
fn test_invalid_free_address_errors() {
    let image = compile("\
mov q0, 12345
mov q15, 5
syscall
hlt
");
    let mut vm = Vm::new(&image, MEM_SIZE).unwrap();
    assert!(matches!(vm.run(), Err(VmError::InvalidFreeAddress(12345))));
}

#[test]
fn test_write_syscall_to_file() {
    use std::io::Read;

    let mut path = std::env::temp_dir();
    path.push(format!(
        "nyx_write_test_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    let path_str = path.display().to_string();

    // open(path, O_WRONLY|O_CREAT|O_TRUNC, 0o644); write(fd, message, 14);
    // close(fd). 0x241 = O_WRONLY | O_CREAT | O_TRUNC on Linux.
    let source = format!(
        "\
mov q0, path
mov d1, 0x241
mov w2, 0x1A4
mov q15, 0
syscall
mov q8, q0
mov d0, q8
mov q1, message
mov q2, 14
mov q15, 3
syscall
mov q9, q0
mov d0, q8
mov q15, 1
syscall
hlt
.section data
message: db \"Hello, world!\\n\"
path: .asciz \"{path_str}\"
"
    );

    let vm = run(&source);
    assert_eq!(q(&vm, Register::Q9), 14);

    let mut written = String::new();
    std::fs::File::open(&path)
        .expect("output file missing")
        .read_to_string(&mut written)
        .unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(written, "Hello, world!\n");
}

#[test]
fn test_read_syscall_from_file() {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "nyx_read_test_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::write(&path, b"AB").unwrap();
    let path_str = path.display().to_string();

    // open(path, O_RDONLY, 0); read(fd, 0x4000, 2); then load both bytes.
    let source = format!(
        "\
mov q0, path
mov d1, 0
mov w2, 0
mov q15, 0
syscall
mov d0, q0
mov q1, 0x1000
mov q2, 2
mov q15, 2
syscall
mov q9, q0
ldr b3, [0x1000]
ldr b4, [0x1000, 1]
hlt
.section data
path: .asciz \"{path_str}\"
"
    );

    let vm = run(&source);
    std::fs::remove_file(&path).ok();
    assert_eq!(q(&vm, Register::Q9), 2);
    assert_eq!(vm.regs.get(Register::B3), Immediate::Byte(b'A'));
    assert_eq!(vm.regs.get(Register::B4), Immediate::Byte(b'B'));
}

#[test]
fn test_hello_world_writes_to_stdout() {
    // The canonical hello world: writes 14 bytes to fd 1 and halts. The
    // byte count lands in q0.
    let vm = run("\
.section text
_start: mov q0, 1
        mov q1, message
        mov q2, 14
        mov q15, 3
        syscall
        hlt
.section data
message: db \"Hello, world!\\n\", 0x00
");
    assert_eq!(q(&vm, Register::Q0), 14);
    assert!(vm.is_halted());
}

#[test]
fn test_include_pipeline() {
    use std::path::PathBuf;

    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "nyx_integration_include_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("answer.nyx"), "#define ANSWER 42\n").unwrap();

    let interner = Arc::new(Interner::new());
    let stmts =
        nyx_parser::parse("#include \"answer.nyx\"\nmov q0, ANSWER\nhlt", &interner).unwrap();
    let expanded = Preprocessor::new(stmts, Arc::clone(&interner))
        .with_include_paths(vec![PathBuf::new(), dir.clone()])
        .process()
        .unwrap();
    let image = Assembler::new(expanded, interner).assemble().unwrap();

    let mut vm = Vm::new(&image, MEM_SIZE).unwrap();
    vm.run().unwrap();
    std::fs::remove_dir_all(&dir).ok();
    assert_eq!(q(&vm, Register::Q0), 42);
}

#[test]
fn test_missing_extension_symbol_errors() {
    let image = compile(".extern missing_fn\ncall missing_fn\nhlt");
    let mut vm = Vm::new(&image, MEM_SIZE).unwrap();
    assert!(matches!(vm.run(), Err(VmError::SymbolNotFound(name)) if name == "missing_fn"));
}

#[test]
fn test_loadext_of_missing_library_errors() {
    let image = compile("loadext \"/nonexistent/libnyx.so\"\nhlt");
    let mut vm = Vm::new(&image, MEM_SIZE).unwrap();
    assert!(matches!(
        vm.run(),
        Err(VmError::ExtensionLoadFailed { .. })
    ));
}

#[test]
fn test_resb_in_text_executes_as_nops() {
    let vm = run("mov q0, 5\nresb 4\nmov q1, 6\nhlt");
    assert_eq!(q(&vm, Register::Q0), 5);
    assert_eq!(q(&vm, Register::Q1), 6);
}

#[test]
fn test_constant_folded_operands_execute() {
    let vm = run("#define BASE 6\nmov q0, BASE * 7\nhlt");
    assert_eq!(q(&vm, Register::Q0), 42);
}

#[test]
fn test_jump_through_register() {
    let vm = run("\
mov q5, over
jmp q5
mov q0, 1
hlt
over: mov q0, 2
hlt
");
    assert_eq!(q(&vm, Register::Q0), 2);
}

#[test]
fn test_pop_to_memory() {
    let vm = run("\
push qword 99
pop qword [0x1800]
ldr q0, [0x1800]
hlt
");
    assert_eq!(q(&vm, Register::Q0), 99);
}

#[test]
fn test_push_from_memory() {
    let vm = run("\
sti qword 55, [0x1800]
push qword [0x1800]
pop qword q0
hlt
");
    assert_eq!(q(&vm, Register::Q0), 55);
}
