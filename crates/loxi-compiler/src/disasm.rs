//! Bytecode disassembler (spec.md §4.7 / original `dev.c`). A read-only
//! visitor over a [`Chunk`]; has no effect on compilation or execution.

use loxi_core::{Chunk, OpCode};
use std::fmt::Write as _;

/// Disassemble every instruction in `chunk`, prefixed with a `-- name --`
/// banner, matching `dev.c`'s `disas_ops`.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "-- {name} --");
    let mut offset = 0;
    while offset < chunk.code.len() {
        offset = disassemble_instruction(chunk, offset, &mut out);
    }
    out
}

/// Disassemble one instruction at `offset`, appending to `out`, and return
/// the offset of the next instruction. Exposed separately so `--trace` can
/// print the currently executing instruction without re-walking the chunk.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let line = chunk.line_at(offset);
    let _ = write!(out, "{offset:04} {line:>4} ");

    let byte = chunk.code[offset];
    let Some(op) = OpCode::from_byte(byte) else {
        let _ = writeln!(out, "Unknown op code {byte}");
        return offset + 1;
    };

    use OpCode::*;
    match op {
        Return | Nil | True | False | Negate | Add | Subtract | Multiply | Divide | Not
        | Equal | Less | Greater | Print | Pop | CloseUpvalue => simple(op, offset, out),
        Const => constant(op, chunk, offset, out),
        GetLocal | SetLocal | GetGlobal | DefineGlobal | SetGlobal | GetUpvalue | SetUpvalue
        | Call => byte_operand(op, chunk, offset, out),
        Jump | JumpIfFalse => jump(op, 1, chunk, offset, out),
        Loop => jump(op, -1, chunk, offset, out),
        Closure => closure(chunk, offset, out),
    }
}

fn simple(op: OpCode, offset: usize, out: &mut String) -> usize {
    let _ = writeln!(out, "{}", op.name());
    offset + 1
}

fn constant(op: OpCode, chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let index = chunk.code[offset + 1];
    let _ = writeln!(out, "{} {:4} {:?}", op.name(), index, chunk.constants.get(index as usize));
    offset + 2
}

fn byte_operand(op: OpCode, chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let slot = chunk.code[offset + 1];
    let _ = writeln!(out, "{} {:4}", op.name(), slot);
    offset + 2
}

fn jump(op: OpCode, sign: i32, chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let hi = chunk.code[offset + 1] as u16;
    let lo = chunk.code[offset + 2] as u16;
    let jump = (hi << 8) | lo;
    let target = offset as i64 + 3 + sign as i64 * jump as i64;
    let _ = writeln!(out, "{} {:4} -> {}", op.name(), offset, target);
    offset + 3
}

/// `OP_CLOSURE` is followed by `upvalue_count` `(is_local, index)` pairs,
/// but that count lives on the `FunctionObj` in the heap, not in the chunk
/// itself — this module only ever sees a `&Chunk`. We print the constant
/// operand and stop there, the same way `dev.c` prints only what each
/// opcode's fixed fields give it.
fn closure(chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let index = chunk.code[offset + 1];
    let _ = writeln!(
        out,
        "{} {:4} {:?}",
        OpCode::Closure.name(),
        index,
        chunk.constants.get(index as usize)
    );
    offset + 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use loxi_core::Value;

    #[test]
    fn simple_ops_print_without_operand() {
        let mut chunk = Chunk::new();
        chunk.append_op(OpCode::Return, 1);
        let text = disassemble_chunk(&chunk, "test");
        assert!(text.contains("OP_RETURN"));
        assert!(text.contains("-- test --"));
    }

    #[test]
    fn const_ops_print_the_constant_value() {
        let mut chunk = Chunk::new();
        let idx = chunk.append_constant(Value::Number(1.5)).unwrap();
        chunk.append_op(OpCode::Const, 1);
        chunk.append_byte(idx, 1);
        let text = disassemble_chunk(&chunk, "test");
        assert!(text.contains("OP_CONST"));
        assert!(text.contains("1.5"));
    }

    #[test]
    fn unknown_byte_reports_and_advances_one() {
        let mut chunk = Chunk::new();
        chunk.append_byte(250, 1);
        let mut out = String::new();
        let next = disassemble_instruction(&chunk, 0, &mut out);
        assert_eq!(next, 1);
        assert!(out.contains("Unknown op code"));
    }
}
