//! Single-pass Pratt parser and code generator (spec.md §4.5, §4.5.1).
//!
//! No intermediate AST: every grammar production emits bytecode directly
//! into the enclosing function's `Chunk` as it parses. Nested `fun`
//! declarations push a new [`FunctionFrame`] onto an explicit stack rather
//! than recursing through a pointer-linked compiler chain (spec.md §9:
//! "targets without recursion-via-pointers use an explicit stack of
//! Compiler structs").

use loxi_core::{Chunk, FunctionObj, Heap, ObjRef, OpCode, Value};

use crate::error::CompileError;
use crate::precedence::Precedence;
use crate::scanner::{Scanner, Token, TokenKind};

const MAX_LOCALS: usize = 256;
const MAX_PARAMS: usize = 255;

/// Parsing within a production that hits an error aborts with `Err(())`; the
/// diagnostic itself was already appended to `Compiler::errors` by
/// `error_at`. The declaration loop catches this and resynchronizes, so a
/// single bad statement never aborts the whole compilation (spec.md §7:
/// "panic mode suppresses cascades until synchronization").
type PResult<T> = Result<T, ()>;

#[derive(Clone, Copy, PartialEq)]
enum FunctionKind {
    Script,
    Function,
}

struct Local {
    name: String,
    depth: i32,
    is_captured: bool,
}

struct UpvalueDesc {
    index: u8,
    is_local: bool,
}

struct FunctionFrame {
    chunk: Chunk,
    name: Option<String>,
    arity: u8,
    kind: FunctionKind,
    locals: Vec<Local>,
    scope_depth: i32,
    upvalues: Vec<UpvalueDesc>,
}

impl FunctionFrame {
    fn new(kind: FunctionKind, name: Option<String>) -> Self {
        // Unlike the reference VM, the callee's own closure value is not
        // addressed through local slot 0 here — the VM keeps it directly on
        // `CallFrame` instead of reserving a stack slot for it, so local
        // index 0 is the function's first parameter (see `loxi_vm::vm`).
        FunctionFrame {
            chunk: Chunk::new(),
            name,
            arity: 0,
            kind,
            locals: Vec::new(),
            scope_depth: 0,
            upvalues: Vec::new(),
        }
    }
}

/// Which handler `get_rule` selects for a token kind. Expressed as tags
/// dispatched through a `match` rather than raw `fn` pointers: both are
/// "table-driven" in spirit, but tags sidestep fighting the borrow checker
/// over a table of methods that each need `&mut self`.
#[derive(Clone, Copy)]
enum Handler {
    None,
    Grouping,
    Unary,
    Binary,
    Number,
    Str,
    Literal,
    Variable,
    And,
    Or,
    Call,
}

struct Rule {
    prefix: Handler,
    infix: Handler,
    precedence: Precedence,
}

fn get_rule(kind: TokenKind) -> Rule {
    use Handler::*;
    use TokenKind::*;
    match kind {
        LeftParen => Rule { prefix: Grouping, infix: Call, precedence: Precedence::Call },
        Minus => Rule { prefix: Unary, infix: Binary, precedence: Precedence::Term },
        Plus => Rule { prefix: None, infix: Binary, precedence: Precedence::Term },
        Slash => Rule { prefix: None, infix: Binary, precedence: Precedence::Factor },
        Star => Rule { prefix: None, infix: Binary, precedence: Precedence::Factor },
        Bang => Rule { prefix: Unary, infix: None, precedence: Precedence::None },
        BangEqual => Rule { prefix: None, infix: Binary, precedence: Precedence::Equality },
        EqualEqual => Rule { prefix: None, infix: Binary, precedence: Precedence::Equality },
        Greater => Rule { prefix: None, infix: Binary, precedence: Precedence::Comparison },
        GreaterEqual => Rule { prefix: None, infix: Binary, precedence: Precedence::Comparison },
        Less => Rule { prefix: None, infix: Binary, precedence: Precedence::Comparison },
        LessEqual => Rule { prefix: None, infix: Binary, precedence: Precedence::Comparison },
        Identifier => Rule { prefix: Variable, infix: None, precedence: Precedence::None },
        String => Rule { prefix: Str, infix: None, precedence: Precedence::None },
        Number => Rule { prefix: Number, infix: None, precedence: Precedence::None },
        And => Rule { prefix: None, infix: And, precedence: Precedence::And },
        Or => Rule { prefix: None, infix: Or, precedence: Precedence::Or },
        False | Nil | True => Rule { prefix: Literal, infix: None, precedence: Precedence::None },
        _ => Rule { prefix: None, infix: None, precedence: Precedence::None },
    }
}

pub struct Compiler<'src, 'h> {
    scanner: Scanner<'src>,
    previous: Token<'src>,
    current: Token<'src>,
    had_error: bool,
    panic_mode: bool,
    errors: Vec<CompileError>,
    heap: &'h mut Heap,
    frames: Vec<FunctionFrame>,
}

/// Compile `source` into a top-level script function. On success, the
/// returned `ObjRef` names a `HeapObject::Function` the caller (the VM) wraps
/// in a closure and runs. On failure, every diagnostic collected across the
/// whole source is returned (spec.md §7: "multiple may be reported per
/// compilation").
pub fn compile(source: &str, heap: &mut Heap) -> Result<ObjRef, Vec<CompileError>> {
    tracing::debug!(bytes = source.len(), "compiling chunk");
    let mut c = Compiler {
        scanner: Scanner::new(source),
        previous: Token { kind: TokenKind::Error, lexeme: "", line: 0 },
        current: Token { kind: TokenKind::Error, lexeme: "", line: 0 },
        had_error: false,
        panic_mode: false,
        errors: Vec::new(),
        heap,
        frames: vec![FunctionFrame::new(FunctionKind::Script, None)],
    };

    c.advance();
    while !c.check(TokenKind::Eof) {
        if c.declaration().is_err() {
            c.synchronize();
        }
    }
    c.consume(TokenKind::Eof, "Expect end of expression.").ok();
    c.emit_return();

    let frame = c.frames.pop().expect("script frame");
    if c.had_error {
        tracing::debug!(count = c.errors.len(), "compilation failed");
        return Err(c.errors);
    }
    let mut function = FunctionObj::new(frame.name);
    function.arity = frame.arity;
    function.upvalue_count = frame.upvalues.len();
    function.chunk = frame.chunk;
    tracing::trace!(code_len = function.chunk.code.len(), "script chunk compiled");
    Ok(c.heap.alloc_function(function))
}

impl<'src, 'h> Compiler<'src, 'h> {
    // ---- token stream plumbing ----

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.scan_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            let message = self.current.lexeme;
            self.error_at(self.current, message);
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> PResult<()> {
        if self.current.kind == kind {
            self.advance();
            return Ok(());
        }
        self.error_at_current(message)
    }

    fn error_at_current<T>(&mut self, message: &str) -> PResult<T> {
        self.error_at(self.current, message);
        Err(())
    }

    fn error<T>(&mut self, message: &str) -> PResult<T> {
        self.error_at(self.previous, message);
        Err(())
    }

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;
        let text = match token.kind {
            TokenKind::Eof => format!("Error at end: {message}"),
            TokenKind::Error => format!("Error: {message}"),
            _ => format!("Error at '{}': {message}", token.lexeme),
        };
        self.errors.push(CompileError::new(text, token.line));
    }

    fn synchronize(&mut self) {
        self.panic_mode = false;
        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
            use TokenKind::*;
            match self.current.kind {
                Class | Fun | Var | For | If | While | Print | Return => return,
                _ => self.advance(),
            }
        }
    }

    // ---- chunk emission ----

    fn frame(&mut self) -> &mut FunctionFrame {
        self.frames.last_mut().expect("at least one frame")
    }

    fn cur(&self) -> &FunctionFrame {
        self.frames.last().expect("at least one frame")
    }

    fn chunk(&mut self) -> &mut Chunk {
        &mut self.frame().chunk
    }

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line;
        self.chunk().append_byte(byte, line);
    }

    fn emit_op(&mut self, op: OpCode) {
        let line = self.previous.line;
        self.chunk().append_op(op, line);
    }

    fn emit_ops(&mut self, a: OpCode, b: OpCode) {
        self.emit_op(a);
        self.emit_op(b);
    }

    fn emit_return(&mut self) {
        self.emit_op(OpCode::Nil);
        self.emit_op(OpCode::Return);
    }

    fn make_constant(&mut self, value: Value) -> PResult<u8> {
        match self.chunk().append_constant(value) {
            Ok(i) => Ok(i),
            Err(msg) => self.error(&msg),
        }
    }

    fn emit_constant(&mut self, value: Value) -> PResult<()> {
        let index = self.make_constant(value)?;
        self.emit_op(OpCode::Const);
        self.emit_byte(index);
        Ok(())
    }

    /// Emits a two-byte placeholder jump operand and returns its offset for
    /// later patching.
    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit_op(op);
        self.emit_byte(0xff);
        self.emit_byte(0xff);
        self.chunk().code.len() - 2
    }

    fn patch_jump(&mut self, offset: usize) -> PResult<()> {
        let jump = self.chunk().code.len() - offset - 2;
        if jump > u16::MAX as usize {
            return self.error("Too much code to jump over.");
        }
        let bytes = (jump as u16).to_be_bytes();
        self.chunk().code[offset] = bytes[0];
        self.chunk().code[offset + 1] = bytes[1];
        Ok(())
    }

    fn emit_loop(&mut self, loop_start: usize) -> PResult<()> {
        self.emit_op(OpCode::Loop);
        let offset = self.chunk().code.len() - loop_start + 2;
        if offset > u16::MAX as usize {
            return self.error("Loop body too large.");
        }
        let bytes = (offset as u16).to_be_bytes();
        self.emit_byte(bytes[0]);
        self.emit_byte(bytes[1]);
        Ok(())
    }

    // ---- scopes & locals ----

    fn begin_scope(&mut self) {
        self.frame().scope_depth += 1;
    }

    fn end_scope(&mut self) {
        self.frame().scope_depth -= 1;
        let depth = self.frame().scope_depth;
        loop {
            let action = match self.cur().locals.last() {
                Some(local) if local.depth > depth => Some(local.is_captured),
                _ => None,
            };
            match action {
                Some(true) => {
                    self.emit_op(OpCode::CloseUpvalue);
                    self.frame().locals.pop();
                }
                Some(false) => {
                    self.emit_op(OpCode::Pop);
                    self.frame().locals.pop();
                }
                None => break,
            }
        }
    }

    fn declare_variable(&mut self, name: &str) -> PResult<()> {
        if self.cur().scope_depth == 0 {
            return Ok(());
        }
        let depth = self.cur().scope_depth;
        let mut conflict = false;
        for local in self.cur().locals.iter().rev() {
            if local.depth != -1 && local.depth < depth {
                break;
            }
            if local.name == name {
                conflict = true;
                break;
            }
        }
        if conflict {
            return self.error("Already a variable with this name in this scope.");
        }
        self.add_local(name)
    }

    fn add_local(&mut self, name: &str) -> PResult<()> {
        if self.frame().locals.len() >= MAX_LOCALS {
            return self.error("Too many local variables in function.");
        }
        self.frame().locals.push(Local {
            name: name.to_string(),
            depth: -1,
            is_captured: false,
        });
        Ok(())
    }

    fn mark_initialized(&mut self) {
        if self.frame().scope_depth == 0 {
            return;
        }
        let depth = self.frame().scope_depth;
        self.frame().locals.last_mut().unwrap().depth = depth;
    }

    fn resolve_local(&self, frame_idx: usize, name: &str) -> PResult<Option<u8>> {
        for (i, local) in self.frames[frame_idx].locals.iter().enumerate().rev() {
            if local.name == name {
                if local.depth == -1 {
                    return Err(());
                }
                return Ok(Some(i as u8));
            }
        }
        Ok(None)
    }

    fn resolve_upvalue(&mut self, frame_idx: usize, name: &str) -> PResult<Option<u8>> {
        if frame_idx == 0 {
            return Ok(None);
        }
        match self.resolve_local(frame_idx - 1, name) {
            Ok(Some(local_idx)) => {
                self.frames[frame_idx - 1].locals[local_idx as usize].is_captured = true;
                return self.add_upvalue(frame_idx, local_idx, true);
            }
            Err(()) => return self.error("Can't read local variable in its own initializer."),
            Ok(None) => {}
        }
        match self.resolve_upvalue(frame_idx - 1, name)? {
            Some(enclosing_idx) => self.add_upvalue(frame_idx, enclosing_idx, false),
            None => Ok(None),
        }
    }

    fn add_upvalue(&mut self, frame_idx: usize, index: u8, is_local: bool) -> PResult<Option<u8>> {
        let ups = &self.frames[frame_idx].upvalues;
        for (i, up) in ups.iter().enumerate() {
            if up.index == index && up.is_local == is_local {
                return Ok(Some(i as u8));
            }
        }
        if ups.len() >= MAX_LOCALS {
            return self.error("Too many closure variables in function.");
        }
        self.frames[frame_idx].upvalues.push(UpvalueDesc { index, is_local });
        Ok(Some((self.frames[frame_idx].upvalues.len() - 1) as u8))
    }

    fn identifier_constant(&mut self, name: &str) -> PResult<u8> {
        let r = self.heap.intern_copy(name);
        self.make_constant(Value::Obj(r))
    }

    // ---- declarations & statements ----

    fn declaration(&mut self) -> PResult<()> {
        if self.match_token(TokenKind::Var) {
            self.var_declaration()
        } else if self.match_token(TokenKind::Fun) {
            self.fun_declaration()
        } else {
            self.statement()
        }
    }

    fn var_declaration(&mut self) -> PResult<()> {
        self.consume(TokenKind::Identifier, "Expect variable name.")?;
        let name = self.previous.lexeme.to_string();
        self.declare_variable(&name)?;
        let global = if self.frame().scope_depth == 0 {
            Some(self.identifier_constant(&name)?)
        } else {
            None
        };

        if self.match_token(TokenKind::Equal) {
            self.expression()?;
        } else {
            self.emit_op(OpCode::Nil);
        }
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;

        match global {
            Some(index) => {
                self.emit_op(OpCode::DefineGlobal);
                self.emit_byte(index);
            }
            None => self.mark_initialized(),
        }
        Ok(())
    }

    fn fun_declaration(&mut self) -> PResult<()> {
        self.consume(TokenKind::Identifier, "Expect function name.")?;
        let name = self.previous.lexeme.to_string();
        self.declare_variable(&name)?;
        if self.frame().scope_depth > 0 {
            self.mark_initialized();
        }
        let global = if self.frame().scope_depth == 0 {
            Some(self.identifier_constant(&name)?)
        } else {
            None
        };
        self.function(FunctionKind::Function, name)?;
        match global {
            Some(index) => {
                self.emit_op(OpCode::DefineGlobal);
                self.emit_byte(index);
            }
            None => {}
        }
        Ok(())
    }

    fn function(&mut self, kind: FunctionKind, name: String) -> PResult<()> {
        self.frames.push(FunctionFrame::new(kind, Some(name)));
        self.begin_scope();

        self.consume(TokenKind::LeftParen, "Expect '(' after function name.")?;
        if !self.check(TokenKind::RightParen) {
            loop {
                if self.frame().arity as usize >= MAX_PARAMS {
                    self.error_at_current::<()>("Can't have more than 255 parameters.")?;
                }
                self.frame().arity += 1;
                self.consume(TokenKind::Identifier, "Expect parameter name.")?;
                let pname = self.previous.lexeme.to_string();
                self.declare_variable(&pname)?;
                self.mark_initialized();
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;
        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.")?;
        self.block()?;

        self.emit_return();
        let frame = self.frames.pop().expect("function frame");
        let upvalue_count = frame.upvalues.len();
        let mut function = FunctionObj::new(frame.name);
        function.arity = frame.arity;
        function.upvalue_count = upvalue_count;
        function.chunk = frame.chunk;
        tracing::trace!(name = function.display_name(), arity = function.arity, "function chunk compiled");
        let fn_ref = self.heap.alloc_function(function);
        let const_idx = self.make_constant(Value::Obj(fn_ref))?;

        self.emit_op(OpCode::Closure);
        self.emit_byte(const_idx);
        for up in &frame.upvalues {
            self.emit_byte(u8::from(up.is_local));
            self.emit_byte(up.index);
        }
        Ok(())
    }

    fn block(&mut self) -> PResult<()> {
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            if self.declaration().is_err() {
                self.synchronize();
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")
    }

    fn statement(&mut self) -> PResult<()> {
        if self.match_token(TokenKind::Print) {
            self.print_statement()
        } else if self.match_token(TokenKind::If) {
            self.if_statement()
        } else if self.match_token(TokenKind::While) {
            self.while_statement()
        } else if self.match_token(TokenKind::For) {
            self.for_statement()
        } else if self.match_token(TokenKind::Return) {
            self.return_statement()
        } else if self.match_token(TokenKind::LeftBrace) {
            self.begin_scope();
            let r = self.block();
            self.end_scope();
            r
        } else {
            self.expression_statement()
        }
    }

    fn print_statement(&mut self) -> PResult<()> {
        self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
        self.emit_op(OpCode::Print);
        Ok(())
    }

    fn return_statement(&mut self) -> PResult<()> {
        if self.frame().kind == FunctionKind::Script {
            self.error::<()>("Can't return from top-level code.")?;
        }
        if self.match_token(TokenKind::Semicolon) {
            self.emit_return();
        } else {
            self.expression()?;
            self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
            self.emit_op(OpCode::Return);
        }
        Ok(())
    }

    fn if_statement(&mut self) -> PResult<()> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;

        let then_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.statement()?;

        let else_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(then_jump)?;
        self.emit_op(OpCode::Pop);

        if self.match_token(TokenKind::Else) {
            self.statement()?;
        }
        self.patch_jump(else_jump)
    }

    fn while_statement(&mut self) -> PResult<()> {
        let loop_start = self.chunk().code.len();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;

        let exit_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.statement()?;
        self.emit_loop(loop_start)?;

        self.patch_jump(exit_jump)?;
        self.emit_op(OpCode::Pop);
        Ok(())
    }

    fn for_statement(&mut self) -> PResult<()> {
        self.begin_scope();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        if self.match_token(TokenKind::Semicolon) {
            // no initializer
        } else if self.match_token(TokenKind::Var) {
            self.var_declaration()?;
        } else {
            self.expression_statement()?;
        }

        let mut loop_start = self.chunk().code.len();
        let mut exit_jump: Option<usize> = None;
        if !self.match_token(TokenKind::Semicolon) {
            self.expression()?;
            self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;
            exit_jump = Some(self.emit_jump(OpCode::JumpIfFalse));
            self.emit_op(OpCode::Pop);
        }

        if !self.match_token(TokenKind::RightParen) {
            let body_jump = self.emit_jump(OpCode::Jump);
            let inc_start = self.chunk().code.len();
            self.expression()?;
            self.emit_op(OpCode::Pop);
            self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

            self.emit_loop(loop_start)?;
            loop_start = inc_start;
            self.patch_jump(body_jump)?;
        }

        self.statement()?;
        self.emit_loop(loop_start)?;

        if let Some(exit) = exit_jump {
            self.patch_jump(exit)?;
            self.emit_op(OpCode::Pop);
        }
        self.end_scope();
        Ok(())
    }

    fn expression_statement(&mut self) -> PResult<()> {
        self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        self.emit_op(OpCode::Pop);
        Ok(())
    }

    // ---- expressions ----

    fn expression(&mut self) -> PResult<()> {
        self.parse_precedence(Precedence::Assignment)
    }

    fn parse_precedence(&mut self, precedence: Precedence) -> PResult<()> {
        self.advance();
        let prefix = get_rule(self.previous.kind).prefix;
        if matches!(prefix, Handler::None) {
            return self.error("Expect expression.");
        }
        let can_assign = precedence <= Precedence::Assignment;
        self.apply(prefix, can_assign)?;

        while precedence <= get_rule(self.current.kind).precedence {
            self.advance();
            let infix = get_rule(self.previous.kind).infix;
            self.apply(infix, can_assign)?;
        }

        if can_assign && self.match_token(TokenKind::Equal) {
            return self.error("Invalid assignment target.");
        }
        Ok(())
    }

    fn apply(&mut self, handler: Handler, can_assign: bool) -> PResult<()> {
        match handler {
            Handler::None => Ok(()),
            Handler::Grouping => self.grouping(),
            Handler::Unary => self.unary(),
            Handler::Binary => self.binary(),
            Handler::Number => self.number(),
            Handler::Str => self.string(),
            Handler::Literal => self.literal(),
            Handler::Variable => self.variable(can_assign),
            Handler::And => self.and(),
            Handler::Or => self.or(),
            Handler::Call => self.call(),
        }
    }

    fn grouping(&mut self) -> PResult<()> {
        self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after expression.")
    }

    fn unary(&mut self) -> PResult<()> {
        let kind = self.previous.kind;
        self.parse_precedence(Precedence::Unary)?;
        match kind {
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            TokenKind::Bang => self.emit_op(OpCode::Not),
            _ => unreachable!(),
        }
        Ok(())
    }

    fn binary(&mut self) -> PResult<()> {
        let kind = self.previous.kind;
        let rule = get_rule(kind);
        self.parse_precedence(rule.precedence.next())?;
        match kind {
            TokenKind::BangEqual => self.emit_ops(OpCode::Equal, OpCode::Not),
            TokenKind::EqualEqual => self.emit_op(OpCode::Equal),
            TokenKind::Greater => self.emit_op(OpCode::Greater),
            TokenKind::GreaterEqual => self.emit_ops(OpCode::Less, OpCode::Not),
            TokenKind::Less => self.emit_op(OpCode::Less),
            TokenKind::LessEqual => self.emit_ops(OpCode::Greater, OpCode::Not),
            TokenKind::Plus => self.emit_op(OpCode::Add),
            TokenKind::Minus => self.emit_op(OpCode::Subtract),
            TokenKind::Star => self.emit_op(OpCode::Multiply),
            TokenKind::Slash => self.emit_op(OpCode::Divide),
            _ => unreachable!(),
        }
        Ok(())
    }

    fn call(&mut self) -> PResult<()> {
        let argc = self.argument_list()?;
        self.emit_op(OpCode::Call);
        self.emit_byte(argc);
        Ok(())
    }

    fn argument_list(&mut self) -> PResult<u8> {
        let mut argc: u32 = 0;
        if !self.check(TokenKind::RightParen) {
            loop {
                self.expression()?;
                if argc == 255 {
                    self.error::<()>("Can't have more than 255 arguments.")?;
                }
                argc += 1;
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;
        Ok(argc as u8)
    }

    fn number(&mut self) -> PResult<()> {
        let value: f64 = self.previous.lexeme.parse().expect("scanner guarantees valid number");
        self.emit_constant(Value::Number(value))
    }

    fn string(&mut self) -> PResult<()> {
        let raw = self.previous.lexeme;
        let contents = &raw[1..raw.len() - 1];
        let r = self.heap.intern_copy(contents);
        self.emit_constant(Value::Obj(r))
    }

    fn literal(&mut self) -> PResult<()> {
        match self.previous.kind {
            TokenKind::False => self.emit_op(OpCode::False),
            TokenKind::True => self.emit_op(OpCode::True),
            TokenKind::Nil => self.emit_op(OpCode::Nil),
            _ => unreachable!(),
        }
        Ok(())
    }

    fn and(&mut self) -> PResult<()> {
        let end_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::And)?;
        self.patch_jump(end_jump)
    }

    fn or(&mut self) -> PResult<()> {
        let else_jump = self.emit_jump(OpCode::JumpIfFalse);
        let end_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(else_jump)?;
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::Or)?;
        self.patch_jump(end_jump)
    }

    fn variable(&mut self, can_assign: bool) -> PResult<()> {
        let name = self.previous.lexeme.to_string();
        self.named_variable(&name, can_assign)
    }

    fn named_variable(&mut self, name: &str, can_assign: bool) -> PResult<()> {
        let frame_idx = self.frames.len() - 1;
        let (get_op, set_op, arg) = match self.resolve_local(frame_idx, name) {
            Ok(Some(slot)) => (OpCode::GetLocal, OpCode::SetLocal, slot),
            Err(()) => return self.error("Can't read local variable in its own initializer."),
            Ok(None) => match self.resolve_upvalue(frame_idx, name)? {
                Some(slot) => (OpCode::GetUpvalue, OpCode::SetUpvalue, slot),
                None => {
                    let index = self.identifier_constant(name)?;
                    (OpCode::GetGlobal, OpCode::SetGlobal, index)
                }
            },
        };

        if can_assign && self.match_token(TokenKind::Equal) {
            self.expression()?;
            self.emit_op(set_op);
        } else {
            self.emit_op(get_op);
        }
        self.emit_byte(arg);
        Ok(())
    }
}
