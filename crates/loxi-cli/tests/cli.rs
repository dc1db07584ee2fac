use std::io::Write;
use std::process::Command;

fn loxi() -> Command {
    Command::new(env!("CARGO_BIN_EXE_loxi"))
}

fn script(source: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("tmp file");
    write!(f, "{source}").unwrap();
    f
}

#[test]
fn running_a_script_prints_its_output_and_exits_zero() {
    let f = script("print 1 + 2 * 3;");
    let out = loxi().arg(f.path()).output().expect("run loxi");
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "7");
}

#[test]
fn a_compile_error_exits_65() {
    let f = script("var ;");
    let out = loxi().arg(f.path()).output().expect("run loxi");
    assert_eq!(out.status.code(), Some(65));
}

#[test]
fn a_runtime_error_exits_70() {
    let f = script(r#"print 1 + "a";"#);
    let out = loxi().arg(f.path()).output().expect("run loxi");
    assert_eq!(out.status.code(), Some(70));
}

#[test]
fn a_missing_file_exits_74() {
    let out = loxi().arg("/no/such/file.lox").output().expect("run loxi");
    assert_eq!(out.status.code(), Some(74));
}

#[test]
fn disassemble_prints_bytecode_without_running() {
    let f = script("print 1 + 2;");
    let out = loxi().arg("--disassemble").arg(f.path()).output().expect("run loxi");
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("OP_CONST"));
    assert!(text.contains("OP_PRINT"));
    assert!(!text.contains('3'));
}

#[test]
fn fibonacci_end_to_end() {
    let f = script(
        r#"
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        print fib(10);
        "#,
    );
    let out = loxi().arg(f.path()).output().expect("run loxi");
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "55");
}
