use loxi_core::{Heap, OpCode};

fn compiled_ops(source: &str) -> Vec<OpCode> {
    let mut heap = Heap::new();
    let r = loxi_compiler::compile(source, &mut heap).expect("should compile");
    let function = heap.get(r).as_function().unwrap();
    let mut ops = Vec::new();
    let mut i = 0;
    while i < function.chunk.code.len() {
        let op = OpCode::from_byte(function.chunk.code[i]).unwrap();
        let operand_len = match op {
            OpCode::Const
            | OpCode::GetLocal
            | OpCode::SetLocal
            | OpCode::GetGlobal
            | OpCode::DefineGlobal
            | OpCode::SetGlobal
            | OpCode::GetUpvalue
            | OpCode::SetUpvalue
            | OpCode::Call => 1,
            OpCode::Jump | OpCode::JumpIfFalse | OpCode::Loop => 2,
            OpCode::Closure => 1, // plus upvalue pairs, not needed for these tests
            _ => 0,
        };
        ops.push(op);
        i += 1 + operand_len;
    }
    ops
}

#[test]
fn arithmetic_expression_statement_balances_the_stack() {
    let ops = compiled_ops("1 + 2 * 3;");
    assert_eq!(
        ops,
        vec![
            OpCode::Const,
            OpCode::Const,
            OpCode::Const,
            OpCode::Multiply,
            OpCode::Add,
            OpCode::Pop,
            OpCode::Nil,
            OpCode::Return,
        ]
    );
}

#[test]
fn var_declaration_at_top_level_defines_a_global() {
    let ops = compiled_ops("var a = 1;");
    assert_eq!(ops, vec![OpCode::Const, OpCode::DefineGlobal, OpCode::Nil, OpCode::Return]);
}

#[test]
fn if_else_emits_balanced_jumps() {
    let ops = compiled_ops("if (true) { 1; } else { 2; }");
    assert_eq!(
        ops,
        vec![
            OpCode::True,
            OpCode::JumpIfFalse,
            OpCode::Pop,
            OpCode::Const,
            OpCode::Pop,
            OpCode::Jump,
            OpCode::Pop,
            OpCode::Const,
            OpCode::Pop,
            OpCode::Nil,
            OpCode::Return,
        ]
    );
}

#[test]
fn not_equal_lowers_to_equal_then_not() {
    let ops = compiled_ops("1 != 2;");
    assert_eq!(
        ops,
        vec![OpCode::Const, OpCode::Const, OpCode::Equal, OpCode::Not, OpCode::Pop, OpCode::Nil, OpCode::Return]
    );
}

#[test]
fn greater_equal_lowers_to_less_then_not() {
    let ops = compiled_ops("1 >= 2;");
    assert_eq!(
        ops,
        vec![OpCode::Const, OpCode::Const, OpCode::Less, OpCode::Not, OpCode::Pop, OpCode::Nil, OpCode::Return]
    );
}

#[test]
fn function_declaration_emits_closure_and_define_global() {
    let ops = compiled_ops("fun f(a) { return a; }");
    assert_eq!(ops, vec![OpCode::Closure, OpCode::DefineGlobal, OpCode::Nil, OpCode::Return]);
}

#[test]
fn declaring_256_locals_in_one_function_compiles() {
    let mut src = String::from("fun f() {");
    for i in 0..256 {
        src.push_str(&format!("var a{i} = {i};"));
    }
    src.push('}');
    let mut heap = Heap::new();
    assert!(loxi_compiler::compile(&src, &mut heap).is_ok());
}

#[test]
fn declaring_257_locals_in_one_function_is_a_compile_error() {
    let mut src = String::from("fun f() {");
    for i in 0..257 {
        src.push_str(&format!("var a{i} = {i};"));
    }
    src.push('}');
    let mut heap = Heap::new();
    let errs = loxi_compiler::compile(&src, &mut heap).unwrap_err();
    assert!(errs.iter().any(|e| e.message.contains("Too many local variables")));
}

#[test]
fn constant_pool_of_256_entries_compiles_257_errors() {
    let mut ok_src = String::new();
    for i in 0..256 {
        ok_src.push_str(&format!("print {i};"));
    }
    let mut heap = Heap::new();
    assert!(loxi_compiler::compile(&ok_src, &mut heap).is_ok());

    let mut bad_src = String::new();
    for i in 0..257 {
        bad_src.push_str(&format!("print {i};"));
    }
    let mut heap = Heap::new();
    let errs = loxi_compiler::compile(&bad_src, &mut heap).unwrap_err();
    assert!(errs.iter().any(|e| e.message.contains("Too many constants")));
}

#[test]
fn reading_a_local_in_its_own_initializer_is_a_compile_error() {
    let mut heap = Heap::new();
    let errs = loxi_compiler::compile("{ var a = a; }", &mut heap).unwrap_err();
    assert!(errs.iter().any(|e| e.message.contains("own initializer")));
}

#[test]
fn return_outside_any_function_is_a_compile_error() {
    let mut heap = Heap::new();
    let errs = loxi_compiler::compile("return 1;", &mut heap).unwrap_err();
    assert!(errs.iter().any(|e| e.message.contains("top-level")));
}

#[test]
fn redeclaring_a_name_in_the_same_scope_is_a_compile_error() {
    let mut heap = Heap::new();
    let errs = loxi_compiler::compile("{ var a = 1; var a = 2; }", &mut heap).unwrap_err();
    assert!(errs.iter().any(|e| e.message.contains("Already a variable")));
}

#[test]
fn panic_mode_recovers_at_the_next_statement_and_reports_later_errors_too() {
    let mut heap = Heap::new();
    let errs = loxi_compiler::compile("var ; var also bad; print 1;", &mut heap).unwrap_err();
    assert!(errs.len() >= 1);
}
