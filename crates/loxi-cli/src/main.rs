//! Loxi CLI: run a script file, drop into a REPL, or disassemble a chunk.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use loxi_vm::{InterpretResult, Vm};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

#[derive(Parser)]
#[command(name = "loxi")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A bytecode interpreter for the loxi language", long_about = None)]
struct Cli {
    /// Script to run. Omit to start an interactive REPL.
    path: Option<PathBuf>,

    /// Print the compiled bytecode instead of running it.
    #[arg(long)]
    disassemble: bool,

    /// Print each instruction as it executes.
    #[arg(long)]
    trace: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.path {
        Some(path) => run_file(&path, cli.disassemble, cli.trace),
        None => {
            if cli.disassemble {
                eprintln!("--disassemble requires a script argument");
                return ExitCode::from(64);
            }
            run_repl(cli.trace);
            ExitCode::SUCCESS
        }
    }
}

fn run_file(path: &PathBuf, disassemble: bool, trace: bool) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Could not open file \"{}\": {e}", path.display());
            return ExitCode::from(74);
        }
    };
    tracing::debug!(bytes = source.len(), path = %path.display(), "loaded script");

    if disassemble {
        return disassemble_source(&source);
    }

    let mut vm = Vm::new();
    vm.trace = trace;
    match vm.interpret(&source) {
        InterpretResult::Ok => ExitCode::SUCCESS,
        InterpretResult::CompileError => ExitCode::from(65),
        InterpretResult::RuntimeError => ExitCode::from(70),
    }
}

fn disassemble_source(source: &str) -> ExitCode {
    let mut heap = loxi_core::Heap::new();
    match loxi_compiler::compile(source, &mut heap) {
        Ok(script_ref) => {
            let function = heap.get(script_ref).as_function().unwrap();
            print!("{}", loxi_compiler::disasm::disassemble_chunk(&function.chunk, "script"));
            ExitCode::SUCCESS
        }
        Err(errors) => {
            for e in &errors {
                eprintln!("{e}");
            }
            ExitCode::from(65)
        }
    }
}

fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|mut home| {
        home.push(".loxi_history");
        home
    })
}

fn run_repl(trace: bool) {
    println!("loxi {}", env!("CARGO_PKG_VERSION"));
    let mut editor = DefaultEditor::new().expect("terminal supports line editing");
    let history = history_path();
    if let Some(path) = &history {
        let _ = editor.load_history(path);
    }

    let mut vm = Vm::new();
    vm.trace = trace;

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                vm.interpret(&line);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Readline error: {e}");
                break;
            }
        }
    }

    if let Some(path) = &history {
        let _ = editor.save_history(path);
    }
}
