//! Lowers an analyzed AST to textual assembly (spec.md §4.4). The emitter
//! never consults types beyond what [`Analysis`] already resolved — codegen
//! is a pure structural walk, one output line per instruction or label.

use pixardis_parser::{Ast, BinaryOp, ExprId, ExprKind, Function, StmtId, StmtKind, UnaryOp};
use pixardis_sema::Analysis;
use pixardis_types::Type;

/// Turns a fully-analyzed program into assembly text. `ast` and `analysis`
/// must come from the same [`pixardis_sema::analyze`] call — codegen trusts
/// `analysis` completely and panics on a missing entry rather than silently
/// emitting garbage, since a missing entry means sema and codegen have
/// drifted out of sync.
pub fn generate(ast: &Ast, analysis: &Analysis) -> String {
    let mut gen = Codegen { ast, analysis, lines: Vec::new(), label_counter: 0 };
    gen.emit_directive(format!(".globals {}", analysis.global_count));
    for &id in &ast.top_level {
        gen.emit_stmt(id);
    }
    gen.emit("halt");
    for f in &ast.functions {
        gen.emit_function(f);
    }
    let mut out = gen.lines.join("\n");
    out.push('\n');
    out
}

struct Codegen<'a> {
    ast: &'a Ast,
    analysis: &'a Analysis,
    lines: Vec<String>,
    label_counter: u32,
}

impl<'a> Codegen<'a> {
    fn next_label(&mut self) -> String {
        let label = format!("L{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    fn emit(&mut self, line: impl Into<String>) {
        self.lines.push(format!("    {}", line.into()));
    }

    fn emit_directive(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn emit_label(&mut self, label: &str) {
        self.lines.push(format!("{}:", label));
    }

    fn emit_function(&mut self, f: &Function) {
        self.emit_label(&format!("fn_{}", f.name));
        let frame_size = *self.analysis.function_frame_size.get(&f.name).expect("analyzed function frame size");
        self.emit(format!("oframe {}", frame_size));
        for &s in &f.body {
            self.emit_stmt(s);
        }
    }

    // ---- statements ----

    fn emit_stmt(&mut self, id: StmtId) {
        let kind = self.ast.stmt(id).kind.clone();
        match kind {
            StmtKind::Let { init, init_list, .. } => self.emit_let(id, init, init_list),
            StmtKind::Assign { index, value, .. } => self.emit_assign(id, index, value),
            StmtKind::If { cond, then_branch, else_branch } => self.emit_if(cond, &then_branch, &else_branch),
            StmtKind::While { cond, body } => self.emit_while(cond, &body),
            StmtKind::For { init, cond, step, body } => self.emit_for(init, cond, step, &body),
            StmtKind::Return { value } => {
                if let Some(value) = value {
                    self.emit_expr(value);
                }
                self.emit("cframe");
                self.emit("ret");
            }
            StmtKind::Block(inner) => {
                for s in inner {
                    self.emit_stmt(s);
                }
            }
            StmtKind::ExprStmt(e) => {
                self.emit_expr(e);
                self.emit("drop");
            }
            StmtKind::Builtin { name, args } => self.emit_builtin_stmt(&name, &args),
        }
    }

    fn emit_let(&mut self, id: StmtId, init: Option<ExprId>, init_list: Option<Vec<ExprId>>) {
        let var_ref = self.analysis.let_refs.get(&id).expect("analyzed let").clone();
        if let Some(init) = init {
            self.emit_expr(init);
            self.emit_store(var_ref.is_global, var_ref.slot);
        } else if let Some(list) = init_list {
            // Array literal: push elements right-to-left so the top of
            // stack after the pushes is element 0, then pop them into
            // consecutive slots in ascending order.
            for &elem in list.iter().rev() {
                self.emit_expr(elem);
            }
            for i in 0..list.len() as u32 {
                self.emit_store(var_ref.is_global, var_ref.slot + i);
            }
        }
    }

    fn emit_assign(&mut self, id: StmtId, index: Option<ExprId>, value: ExprId) {
        let var_ref = self.analysis.assign_refs.get(&id).expect("analyzed assignment").clone();
        self.emit_expr(value);
        if let Some(index) = index {
            self.emit_expr(index);
            self.emit_store_indexed(var_ref.is_global, var_ref.slot);
        } else {
            self.emit_store(var_ref.is_global, var_ref.slot);
        }
    }

    fn emit_store(&mut self, is_global: bool, slot: u32) {
        if is_global {
            self.emit(format!("pop g[{}]", slot));
        } else {
            self.emit(format!("pop [{}]", slot));
        }
    }

    fn emit_store_indexed(&mut self, is_global: bool, base: u32) {
        if is_global {
            self.emit(format!("pop +g[{}]", base));
        } else {
            self.emit(format!("pop +[{}]", base));
        }
    }

    fn emit_if(&mut self, cond: ExprId, then_branch: &[StmtId], else_branch: &Option<Vec<StmtId>>) {
        let else_label = self.next_label();
        let end_label = self.next_label();
        self.emit_expr(cond);
        self.emit(format!("jz {}", else_label));
        for &s in then_branch {
            self.emit_stmt(s);
        }
        self.emit(format!("jmp {}", end_label));
        self.emit_label(&else_label);
        if let Some(else_branch) = else_branch {
            for &s in else_branch {
                self.emit_stmt(s);
            }
        }
        self.emit_label(&end_label);
    }

    fn emit_while(&mut self, cond: ExprId, body: &[StmtId]) {
        let start_label = self.next_label();
        let end_label = self.next_label();
        self.emit_label(&start_label);
        self.emit_expr(cond);
        self.emit(format!("jz {}", end_label));
        for &s in body {
            self.emit_stmt(s);
        }
        self.emit(format!("jmp {}", start_label));
        self.emit_label(&end_label);
    }

    fn emit_for(&mut self, init: Option<StmtId>, cond: Option<ExprId>, step: Option<StmtId>, body: &[StmtId]) {
        if let Some(init) = init {
            self.emit_stmt(init);
        }
        let start_label = self.next_label();
        let end_label = self.next_label();
        self.emit_label(&start_label);
        if let Some(cond) = cond {
            self.emit_expr(cond);
            self.emit(format!("jz {}", end_label));
        }
        for &s in body {
            self.emit_stmt(s);
        }
        if let Some(step) = step {
            self.emit_stmt(step);
        }
        self.emit(format!("jmp {}", start_label));
        self.emit_label(&end_label);
    }

    fn emit_builtin_stmt(&mut self, name: &str, args: &[ExprId]) {
        for &a in args {
            self.emit_expr(a);
        }
        match name {
            "__clear" => self.emit("clear"),
            "__write" | "__pixel" => self.emit("write_pixel"),
            "__write_box" => self.emit("write_box"),
            "__print" => self.emit("print"),
            "__delay" => self.emit("delay"),
            other => unreachable!("builtin statement '{}' not recognized by codegen", other),
        }
    }

    // ---- expressions ----

    fn emit_expr(&mut self, id: ExprId) {
        let kind = self.ast.expr(id).kind.clone();
        match kind {
            ExprKind::IntLiteral(v) => self.emit(format!("push {}", v)),
            // `{:?}` always renders a decimal point (`3.0`, not `3`), so the
            // assembler's int-parse-first `push` operand rule can't swallow
            // a whole-valued float literal as `PushInt`.
            ExprKind::FloatLiteral(v) => self.emit(format!("push {:?}", v)),
            ExprKind::BoolLiteral(v) => self.emit(format!("push {}", v)),
            ExprKind::ColourLiteral(v) => self.emit(format!("push #{:06X}", v)),
            ExprKind::Variable(_) => {
                let var_ref = self.analysis.var_refs.get(&id).expect("analyzed variable reference");
                if var_ref.is_global {
                    self.emit(format!("push g[{}]", var_ref.slot));
                } else {
                    self.emit(format!("push [{}]", var_ref.slot));
                }
            }
            ExprKind::Index { index, .. } => {
                self.emit_expr(index);
                let var_ref = self.analysis.var_refs.get(&id).expect("analyzed index reference");
                if var_ref.is_global {
                    self.emit(format!("push +g[{}]", var_ref.slot));
                } else {
                    self.emit(format!("push +[{}]", var_ref.slot));
                }
            }
            ExprKind::Call { args, .. } => {
                for &a in &args {
                    self.emit_expr(a);
                }
                let target = self.analysis.call_targets.get(&id).expect("analyzed call target");
                self.emit(format!("call fn_{}, {}", target, args.len()));
            }
            ExprKind::BuiltinCall { name, args } => self.emit_builtin_expr(&name, &args),
            ExprKind::Unary { op, operand } => {
                self.emit_expr(operand);
                match op {
                    UnaryOp::Neg => self.emit("neg"),
                    UnaryOp::Not => self.emit("not"),
                }
            }
            ExprKind::Binary { op, lhs, rhs } => self.emit_binary(op, lhs, rhs),
            ExprKind::Cast { expr, target } => {
                let from = self.analysis.expr_type(expr).cloned().expect("analyzed cast operand type");
                self.emit_expr(expr);
                self.emit_cast(from, target);
            }
        }
    }

    fn emit_builtin_expr(&mut self, name: &str, args: &[ExprId]) {
        for &a in args {
            self.emit_expr(a);
        }
        match name {
            "__read" => self.emit("read_pixel"),
            "__random_int" => self.emit("rand"),
            "__width" => self.emit("width"),
            "__height" => self.emit("height"),
            other => unreachable!("builtin expression '{}' not recognized by codegen", other),
        }
    }

    fn emit_cast(&mut self, from: Type, to: Type) {
        match (from, to) {
            (Type::Int, Type::Float) => self.emit("itof"),
            (Type::Float, Type::Int) => self.emit("ftoi"),
            (Type::Int, Type::Colour) => self.emit("itoc"),
            (Type::Colour, Type::Int) => self.emit("ctoi"),
            (Type::Bool, Type::Int) => self.emit("btoi"),
            (Type::Int, Type::Bool) => self.emit("itob"),
            (from, to) => unreachable!("cast {} -> {} not allowed by semantic analysis", from, to),
        }
    }

    /// `and`/`or` short-circuit: the right operand is only evaluated when it
    /// can change the result, per spec.md §4.3.
    fn emit_binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) {
        match op {
            BinaryOp::And => {
                let false_label = self.next_label();
                let end_label = self.next_label();
                self.emit_expr(lhs);
                self.emit("dup");
                self.emit(format!("jz {}", false_label));
                self.emit("drop");
                self.emit_expr(rhs);
                self.emit(format!("jmp {}", end_label));
                self.emit_label(&false_label);
                self.emit_label(&end_label);
            }
            BinaryOp::Or => {
                let true_label = self.next_label();
                let end_label = self.next_label();
                self.emit_expr(lhs);
                self.emit("dup");
                self.emit(format!("jnz {}", true_label));
                self.emit("drop");
                self.emit_expr(rhs);
                self.emit(format!("jmp {}", end_label));
                self.emit_label(&true_label);
                self.emit_label(&end_label);
            }
            _ => {
                self.emit_expr(lhs);
                self.emit_expr(rhs);
                let mnemonic = match op {
                    BinaryOp::Add => "add",
                    BinaryOp::Sub => "sub",
                    BinaryOp::Mul => "mul",
                    BinaryOp::Div => "div",
                    BinaryOp::Mod => "mod",
                    BinaryOp::Eq => "eq",
                    BinaryOp::Ne => "ne",
                    BinaryOp::Lt => "lt",
                    BinaryOp::Le => "le",
                    BinaryOp::Gt => "gt",
                    BinaryOp::Ge => "ge",
                    BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
                };
                self.emit(mnemonic);
            }
        }
    }
}
