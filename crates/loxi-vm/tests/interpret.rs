use loxi_vm::{InterpretResult, Vm};

fn run(source: &str) -> InterpretResult {
    let mut vm = Vm::new();
    vm.interpret(source)
}

#[test]
fn arithmetic_expression_statement_runs_clean() {
    assert_eq!(run("print 1 + 2 * 3;"), InterpretResult::Ok);
}

#[test]
fn string_concatenation_runs_clean() {
    assert_eq!(run(r#"print "foo" + "bar";"#), InterpretResult::Ok);
}

#[test]
fn while_loop_counting_runs_clean() {
    assert_eq!(
        run("var i = 0; while (i < 5) { i = i + 1; } print i;"),
        InterpretResult::Ok
    );
}

#[test]
fn recursive_fibonacci_runs_clean() {
    let src = r#"
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        print fib(10);
    "#;
    assert_eq!(run(src), InterpretResult::Ok);
}

#[test]
fn closures_over_locals_run_clean() {
    let src = r#"
        fun makeCounter() {
            var count = 0;
            fun counter() {
                count = count + 1;
                return count;
            }
            return counter;
        }
        var counter = makeCounter();
        print counter();
        print counter();
    "#;
    assert_eq!(run(src), InterpretResult::Ok);
}

#[test]
fn nil_and_false_comparisons_run_clean() {
    assert_eq!(run("print nil == false; print !nil;"), InterpretResult::Ok);
}

#[test]
fn syntax_error_is_a_compile_error() {
    assert_eq!(run("var ;"), InterpretResult::CompileError);
}

#[test]
fn adding_a_number_and_a_string_is_a_runtime_error() {
    assert_eq!(run(r#"print 1 + "a";"#), InterpretResult::RuntimeError);
}

#[test]
fn negating_a_string_is_a_runtime_error() {
    assert_eq!(run(r#"print -"a";"#), InterpretResult::RuntimeError);
}

#[test]
fn reading_an_undefined_global_is_a_runtime_error() {
    assert_eq!(run("print nope;"), InterpretResult::RuntimeError);
}

#[test]
fn assigning_to_an_undefined_global_is_a_runtime_error() {
    assert_eq!(run("nope = 1;"), InterpretResult::RuntimeError);
}

#[test]
fn calling_a_non_callable_value_is_a_runtime_error() {
    assert_eq!(run("var x = 1; x();"), InterpretResult::RuntimeError);
}

#[test]
fn calling_with_the_wrong_arity_is_a_runtime_error() {
    assert_eq!(run("fun f(a, b) { return a + b; } f(1);"), InterpretResult::RuntimeError);
}

#[test]
fn deep_recursion_overflows_the_call_stack() {
    let src = r#"
        fun recurse(n) {
            return recurse(n + 1);
        }
        recurse(0);
    "#;
    assert_eq!(run(src), InterpretResult::RuntimeError);
}

#[test]
fn a_runtime_error_does_not_poison_the_next_interpret_call() {
    let mut vm = Vm::new();
    assert_eq!(vm.interpret("print 1 + \"a\";"), InterpretResult::RuntimeError);
    assert_eq!(vm.interpret("print 1 + 1;"), InterpretResult::Ok);
}

#[test]
fn clock_native_is_callable_and_returns_a_number() {
    assert_eq!(run("var t = clock(); print t >= 0;"), InterpretResult::Ok);
}
