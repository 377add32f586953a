use std::collections::HashMap;

use pixardis_parser::{Ast, BinaryOp, ExprId, ExprKind, StmtId, StmtKind, UnaryOp};
use pixardis_types::{Diagnostic, DiagnosticKind, DiagnosticSink, Span, Type};

use crate::analysis::{Analysis, VarRef};
use crate::scope::{ScopeStack, Symbol};

pub fn analyze(ast: &Ast, source: &str) -> (Analysis, DiagnosticSink) {
    let lines: Vec<String> = source.lines().map(|l| l.to_string()).collect();
    let mut analyzer = Analyzer {
        ast,
        lines,
        sink: DiagnosticSink::new(),
        analysis: Analysis::new(),
        functions: HashMap::new(),
        global_slots: HashMap::new(),
        globals_by_name: HashMap::new(),
        in_function: false,
        current_return_type: None,
        next_local: 0,
    };
    analyzer.run();
    (analyzer.analysis, analyzer.sink)
}

#[derive(Debug, Clone)]
struct GlobalInfo {
    slot: u32,
    ty: Type,
    array_size: Option<usize>,
}

/// Walks the top-level statement tree (following into `if`/`while`/`for`/
/// block bodies, never into function bodies) assigning every `let` a dense
/// global slot in source order. This runs before any function body is
/// analyzed so a function can reference a global regardless of where in
/// the top-level sequence it is declared, mirroring the forward-reference
/// guarantee spec.md §4.2 requires for function calls.
///
/// If the same name is declared in two non-overlapping top-level blocks,
/// `globals_by_name` keeps only the later one for cross-function lookups;
/// each declaration still gets its own slot and its own, correctly-scoped
/// redeclaration diagnostics during the real walk. See DESIGN.md.
fn collect_global_slots(ast: &Ast) -> (HashMap<StmtId, GlobalInfo>, HashMap<String, StmtId>, u32) {
    let mut slots = HashMap::new();
    let mut by_name = HashMap::new();
    let mut counter = 0u32;
    walk_for_globals(ast, &ast.top_level, &mut slots, &mut by_name, &mut counter);
    (slots, by_name, counter)
}

fn walk_for_globals(
    ast: &Ast,
    stmts: &[StmtId],
    slots: &mut HashMap<StmtId, GlobalInfo>,
    by_name: &mut HashMap<String, StmtId>,
    counter: &mut u32,
) {
    for &id in stmts {
        match &ast.stmt(id).kind {
            StmtKind::Let { name, ty, array_size, .. } => {
                let slot = *counter;
                *counter += array_size.unwrap_or(1) as u32;
                slots.insert(id, GlobalInfo { slot, ty: ty.clone(), array_size: *array_size });
                by_name.insert(name.clone(), id);
            }
            StmtKind::If { then_branch, else_branch, .. } => {
                walk_for_globals(ast, then_branch, slots, by_name, counter);
                if let Some(else_branch) = else_branch {
                    walk_for_globals(ast, else_branch, slots, by_name, counter);
                }
            }
            StmtKind::While { body, .. } => walk_for_globals(ast, body, slots, by_name, counter),
            StmtKind::For { init, body, .. } => {
                if let Some(init) = init {
                    walk_for_globals(ast, std::slice::from_ref(init), slots, by_name, counter);
                }
                walk_for_globals(ast, body, slots, by_name, counter);
            }
            StmtKind::Block(inner) => walk_for_globals(ast, inner, slots, by_name, counter),
            _ => {}
        }
    }
}

struct Analyzer<'a> {
    ast: &'a Ast,
    lines: Vec<String>,
    sink: DiagnosticSink,
    analysis: Analysis,
    functions: HashMap<String, (Vec<Type>, Type)>,
    global_slots: HashMap<StmtId, GlobalInfo>,
    globals_by_name: HashMap<String, StmtId>,
    in_function: bool,
    current_return_type: Option<Type>,
    next_local: u32,
}

impl<'a> Analyzer<'a> {
    fn run(&mut self) {
        for f in &self.ast.functions {
            if self.functions.contains_key(&f.name) {
                self.name_error(f.span, format!("Function '{}' is already defined.", f.name));
                continue;
            }
            let params = f.params.iter().map(|p| p.ty.clone()).collect();
            self.functions.insert(f.name.clone(), (params, f.return_type.clone()));
        }

        let (global_slots, globals_by_name, global_count) = collect_global_slots(self.ast);
        self.global_slots = global_slots;
        self.globals_by_name = globals_by_name;
        self.analysis.global_count = global_count;

        let mut top_scope = ScopeStack::new();
        self.in_function = false;
        let top_level = self.ast.top_level.clone();
        for id in top_level {
            self.analyze_stmt(id, &mut top_scope);
        }

        for f in self.ast.functions.clone() {
            let mut scope = ScopeStack::new();
            for (i, p) in f.params.iter().enumerate() {
                scope.insert(
                    p.name.clone(),
                    Symbol::Variable { ty: p.ty.clone(), slot: i as u32, is_global: false, array_size: None },
                );
            }
            self.in_function = true;
            self.current_return_type = Some(f.return_type.clone());
            self.next_local = f.params.len() as u32;
            for &s in &f.body {
                self.analyze_stmt(s, &mut scope);
            }
            if !self.stmts_always_return(&f.body) {
                self.semantic_error(f.span, format!("Function '{}' does not return on every path.", f.name));
            }
            self.analysis.function_frame_size.insert(f.name.clone(), self.next_local);
        }
        self.in_function = false;
        self.current_return_type = None;
    }

    fn stmts_always_return(&self, stmts: &[StmtId]) -> bool {
        stmts.iter().any(|&s| self.stmt_always_returns(s))
    }

    fn stmt_always_returns(&self, id: StmtId) -> bool {
        match &self.ast.stmt(id).kind {
            StmtKind::Return { .. } => true,
            StmtKind::Block(inner) => self.stmts_always_return(inner),
            StmtKind::If { then_branch, else_branch: Some(else_branch), .. } => {
                self.stmts_always_return(then_branch) && self.stmts_always_return(else_branch)
            }
            _ => false,
        }
    }

    // ---- statements ----

    fn analyze_stmt(&mut self, id: StmtId, scope: &mut ScopeStack) {
        let span = self.ast.stmt(id).span;
        match &self.ast.stmt(id).kind {
            StmtKind::Let { .. } => self.analyze_let(id, scope),
            StmtKind::Assign { .. } => self.analyze_assign(id, scope),
            StmtKind::If { cond, then_branch, else_branch } => {
                let (cond, then_branch, else_branch) = (*cond, then_branch.clone(), else_branch.clone());
                let t = self.analyze_expr(cond, scope);
                if let Some(t) = t {
                    if t != Type::Bool {
                        self.type_error(span, format!("'if' condition must be bool, found {}.", t));
                    }
                }
                scope.push_frame();
                for s in then_branch {
                    self.analyze_stmt(s, scope);
                }
                scope.pop_frame();
                if let Some(else_branch) = else_branch {
                    scope.push_frame();
                    for s in else_branch {
                        self.analyze_stmt(s, scope);
                    }
                    scope.pop_frame();
                }
            }
            StmtKind::While { cond, body } => {
                let (cond, body) = (*cond, body.clone());
                let t = self.analyze_expr(cond, scope);
                if let Some(t) = t {
                    if t != Type::Bool {
                        self.type_error(span, format!("'while' condition must be bool, found {}.", t));
                    }
                }
                scope.push_frame();
                for s in body {
                    self.analyze_stmt(s, scope);
                }
                scope.pop_frame();
            }
            StmtKind::For { init, cond, step, body } => {
                let (init, cond, step, body) = (*init, *cond, *step, body.clone());
                scope.push_frame();
                if let Some(init) = init {
                    self.analyze_stmt(init, scope);
                }
                if let Some(cond) = cond {
                    let t = self.analyze_expr(cond, scope);
                    if let Some(t) = t {
                        if t != Type::Bool {
                            self.type_error(span, format!("'for' condition must be bool, found {}.", t));
                        }
                    }
                }
                if let Some(step) = step {
                    self.analyze_stmt(step, scope);
                }
                scope.push_frame();
                for s in body {
                    self.analyze_stmt(s, scope);
                }
                scope.pop_frame();
                scope.pop_frame();
            }
            StmtKind::Return { value } => self.analyze_return(*value, span, scope),
            StmtKind::Block(inner) => {
                let inner = inner.clone();
                scope.push_frame();
                for s in inner {
                    self.analyze_stmt(s, scope);
                }
                scope.pop_frame();
            }
            StmtKind::ExprStmt(expr) => {
                self.analyze_expr(*expr, scope);
            }
            StmtKind::Builtin { name, args } => {
                let (name, args) = (name.clone(), args.clone());
                self.analyze_builtin_statement(&name, &args, span, scope);
            }
        }
    }

    fn analyze_let(&mut self, id: StmtId, scope: &mut ScopeStack) {
        let (name, ty, array_size, init, init_list) = match &self.ast.stmt(id).kind {
            StmtKind::Let { name, ty, array_size, init, init_list } => {
                (name.clone(), ty.clone(), *array_size, *init, init_list.clone())
            }
            _ => unreachable!(),
        };
        let span = self.ast.stmt(id).span;

        if scope.declared_in_current_frame(&name) {
            self.name_error(span, format!("'{}' is already declared in this scope.", name));
        }

        if let Some(init) = init {
            let t = self.analyze_expr(init, scope);
            if let Some(t) = t {
                if t != ty {
                    self.type_error(span, format!("cannot assign {} to '{}' of type {} without 'as'.", t, name, ty));
                }
            }
        } else if let Some(list) = &init_list {
            let expected_len = array_size.unwrap_or(0);
            if list.len() != expected_len {
                self.type_error(
                    span,
                    format!("array literal for '{}' has {} elements, expected {}.", name, list.len(), expected_len),
                );
            }
            for &elem in list {
                let t = self.analyze_expr(elem, scope);
                if let Some(t) = t {
                    if t != ty {
                        self.type_error(span, format!("array element of '{}' has type {}, expected {}.", name, t, ty));
                    }
                }
            }
        }

        let var_ref = if self.in_function {
            let slot = self.next_local;
            self.next_local += array_size.unwrap_or(1) as u32;
            VarRef { is_global: false, slot, ty: ty.clone(), array_size }
        } else {
            let info = self.global_slots.get(&id).cloned().expect("top-level let pre-registered");
            VarRef { is_global: true, slot: info.slot, ty: ty.clone(), array_size }
        };

        if !scope.declared_in_current_frame(&name) {
            scope.insert(
                name,
                Symbol::Variable {
                    ty: var_ref.ty.clone(),
                    slot: var_ref.slot,
                    is_global: var_ref.is_global,
                    array_size: var_ref.array_size,
                },
            );
        }
        self.analysis.let_refs.insert(id, var_ref);
    }

    fn analyze_assign(&mut self, id: StmtId, scope: &mut ScopeStack) {
        let (name, index, value) = match &self.ast.stmt(id).kind {
            StmtKind::Assign { name, index, value } => (name.clone(), *index, *value),
            _ => unreachable!(),
        };
        let span = self.ast.stmt(id).span;

        let sym = self.lookup(&name, scope);
        match sym {
            None => {
                self.name_error(span, format!("Undefined variable '{}'.", name));
                self.analyze_expr(value, scope);
                if let Some(index) = index {
                    self.analyze_expr(index, scope);
                }
            }
            Some(Symbol::Function { .. }) => {
                self.name_error(span, format!("'{}' is a function, not a variable.", name));
            }
            Some(Symbol::Variable { ty, slot, is_global, array_size }) => {
                if let Some(index) = index {
                    if array_size.is_none() {
                        self.type_error(span, format!("'{}' is not an array.", name));
                    }
                    let idx_t = self.analyze_expr(index, scope);
                    if let Some(idx_t) = idx_t {
                        if idx_t != Type::Int {
                            self.type_error(span, format!("array index must be int, found {}.", idx_t));
                        }
                    }
                } else if array_size.is_some() {
                    self.type_error(span, format!("cannot assign directly to array '{}'; assign to an element.", name));
                }

                let val_t = self.analyze_expr(value, scope);
                if let Some(val_t) = val_t {
                    if val_t != ty {
                        self.type_error(span, format!("cannot assign {} to '{}' of type {} without 'as'.", val_t, name, ty));
                    }
                }

                self.analysis.assign_refs.insert(id, VarRef { is_global, slot, ty, array_size });
            }
        }
    }

    fn analyze_return(&mut self, value: Option<ExprId>, span: Span, scope: &mut ScopeStack) {
        if !self.in_function {
            self.semantic_error(span, "'return' is only valid inside a function.".to_string());
            return;
        }
        match value {
            None => {
                self.semantic_error(span, "a 'return' must provide a value; Pixardis has no unit type.".to_string());
            }
            Some(expr) => {
                let t = self.analyze_expr(expr, scope);
                let ret_ty = self.current_return_type.clone().expect("set inside a function");
                if let Some(t) = t {
                    if t != ret_ty {
                        self.type_error(
                            span,
                            format!("function declared to return {} but this 'return' yields {}.", ret_ty, t),
                        );
                    }
                }
            }
        }
    }

    fn analyze_builtin_statement(&mut self, name: &str, args: &[ExprId], span: Span, scope: &mut ScopeStack) {
        let arg_types: Vec<Option<Type>> = args.iter().map(|&a| self.analyze_expr(a, scope)).collect();
        match name {
            "__clear" => self.check_arg_types(span, name, &arg_types, &[Type::Colour]),
            "__write" | "__pixel" => self.check_arg_types(span, name, &arg_types, &[Type::Int, Type::Int, Type::Colour]),
            "__write_box" => self.check_arg_types(
                span,
                name,
                &arg_types,
                &[Type::Int, Type::Int, Type::Int, Type::Int, Type::Colour],
            ),
            "__print" => {
                if let Some(Some(t)) = arg_types.first() {
                    if !t.is_primitive() {
                        self.type_error(span, format!("__print cannot format a value of type {}.", t));
                    }
                }
            }
            "__delay" => self.check_arg_types(span, name, &arg_types, &[Type::Int]),
            other => self.semantic_error(span, format!("Unknown builtin statement '{}'.", other)),
        }
    }

    // ---- expressions ----

    fn analyze_expr(&mut self, id: ExprId, scope: &mut ScopeStack) -> Option<Type> {
        let span = self.ast.expr(id).span;
        let ty = match self.ast.expr(id).kind.clone() {
            ExprKind::IntLiteral(_) => Some(Type::Int),
            ExprKind::FloatLiteral(_) => Some(Type::Float),
            ExprKind::BoolLiteral(_) => Some(Type::Bool),
            ExprKind::ColourLiteral(_) => Some(Type::Colour),
            ExprKind::Variable(name) => self.resolve_variable(id, &name, span, scope),
            ExprKind::Index { name, index } => self.resolve_index(id, &name, index, span, scope),
            ExprKind::Call { name, args } => self.resolve_call(id, &name, &args, span, scope),
            ExprKind::BuiltinCall { name, args } => self.resolve_builtin_expr(&name, &args, span, scope),
            ExprKind::Unary { op, operand } => self.resolve_unary(op, operand, span, scope),
            ExprKind::Binary { op, lhs, rhs } => self.resolve_binary(op, lhs, rhs, span, scope),
            ExprKind::Cast { expr, target } => self.resolve_cast(expr, target, span, scope),
        };
        if let Some(t) = &ty {
            self.analysis.expr_types.insert(id, t.clone());
        }
        ty
    }

    fn resolve_variable(&mut self, id: ExprId, name: &str, span: Span, scope: &mut ScopeStack) -> Option<Type> {
        match self.lookup(name, scope) {
            Some(Symbol::Variable { ty, slot, is_global, array_size }) => {
                if array_size.is_some() {
                    self.semantic_error(span, format!("'{}' is an array; index it with '[...]'.", name));
                    return None;
                }
                self.analysis.var_refs.insert(id, VarRef { is_global, slot, ty: ty.clone(), array_size });
                Some(ty)
            }
            Some(Symbol::Function { .. }) => {
                self.name_error(span, format!("'{}' is a function; call it with '(...)'.", name));
                None
            }
            None => {
                self.name_error(span, format!("Undefined variable '{}'.", name));
                None
            }
        }
    }

    fn resolve_index(&mut self, id: ExprId, name: &str, index: ExprId, span: Span, scope: &mut ScopeStack) -> Option<Type> {
        let idx_t = self.analyze_expr(index, scope);
        match self.lookup(name, scope) {
            Some(Symbol::Variable { ty, slot, is_global, array_size }) => {
                if array_size.is_none() {
                    self.type_error(span, format!("'{}' is not an array.", name));
                    return None;
                }
                if let Some(idx_t) = idx_t {
                    if idx_t != Type::Int {
                        self.type_error(span, format!("array index must be int, found {}.", idx_t));
                    }
                }
                self.analysis.var_refs.insert(id, VarRef { is_global, slot, ty: ty.clone(), array_size });
                Some(ty)
            }
            Some(Symbol::Function { .. }) => {
                self.name_error(span, format!("'{}' is a function; it cannot be indexed.", name));
                None
            }
            None => {
                self.name_error(span, format!("Undefined variable '{}'.", name));
                None
            }
        }
    }

    fn resolve_call(&mut self, id: ExprId, name: &str, args: &[ExprId], span: Span, scope: &mut ScopeStack) -> Option<Type> {
        let arg_types: Vec<Option<Type>> = args.iter().map(|&a| self.analyze_expr(a, scope)).collect();
        match self.functions.get(name).cloned() {
            Some((params, ret)) => {
                if params.len() != args.len() {
                    self.semantic_error(
                        span,
                        format!("function '{}' expects {} argument(s), found {}.", name, params.len(), args.len()),
                    );
                } else {
                    for (i, (expected, got)) in params.iter().zip(arg_types.iter()).enumerate() {
                        if let Some(got) = got {
                            if got != expected {
                                self.type_error(
                                    span,
                                    format!("argument {} to '{}' expects {}, found {}.", i + 1, name, expected, got),
                                );
                            }
                        }
                    }
                }
                self.analysis.call_targets.insert(id, name.to_string());
                Some(ret)
            }
            None => {
                self.name_error(span, format!("Undefined function '{}'.", name));
                None
            }
        }
    }

    fn resolve_builtin_expr(&mut self, name: &str, args: &[ExprId], span: Span, scope: &mut ScopeStack) -> Option<Type> {
        let arg_types: Vec<Option<Type>> = args.iter().map(|&a| self.analyze_expr(a, scope)).collect();
        match name {
            "__read" => {
                self.check_arg_types(span, name, &arg_types, &[Type::Int, Type::Int]);
                Some(Type::Colour)
            }
            "__random_int" => {
                self.check_arg_types(span, name, &arg_types, &[Type::Int]);
                Some(Type::Int)
            }
            "__width" | "__height" => Some(Type::Int),
            other => {
                self.semantic_error(span, format!("'{}' cannot be used as an expression.", other));
                None
            }
        }
    }

    fn resolve_unary(&mut self, op: UnaryOp, operand: ExprId, span: Span, scope: &mut ScopeStack) -> Option<Type> {
        let t = self.analyze_expr(operand, scope)?;
        match op {
            UnaryOp::Neg => match t {
                Type::Int => Some(Type::Int),
                Type::Float => Some(Type::Float),
                other => {
                    self.type_error(span, format!("unary '-' is not defined for {}.", other));
                    None
                }
            },
            UnaryOp::Not => {
                if t == Type::Bool {
                    Some(Type::Bool)
                } else {
                    self.type_error(span, format!("'not' requires a bool operand, found {}.", t));
                    None
                }
            }
        }
    }

    fn resolve_binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId, span: Span, scope: &mut ScopeStack) -> Option<Type> {
        let lt = self.analyze_expr(lhs, scope);
        let rt = self.analyze_expr(rhs, scope);
        let (lt, rt) = match (lt, rt) {
            (Some(a), Some(b)) => (a, b),
            _ => return None,
        };
        use BinaryOp::*;
        match op {
            Add | Sub => match (&lt, &rt) {
                (Type::Int, Type::Int) => Some(Type::Int),
                (Type::Float, Type::Float) => Some(Type::Float),
                (Type::Colour, Type::Colour) => Some(Type::Colour),
                _ => {
                    self.type_error(span, format!("arithmetic is not defined for {} and {}.", lt, rt));
                    None
                }
            },
            Mul => match (&lt, &rt) {
                (Type::Int, Type::Int) => Some(Type::Int),
                (Type::Float, Type::Float) => Some(Type::Float),
                (Type::Colour, Type::Colour) => Some(Type::Colour),
                (Type::Colour, Type::Int) | (Type::Int, Type::Colour) => Some(Type::Colour),
                _ => {
                    self.type_error(span, format!("'*' is not defined for {} and {}.", lt, rt));
                    None
                }
            },
            Div => match (&lt, &rt) {
                (Type::Int, Type::Int) => Some(Type::Int),
                (Type::Float, Type::Float) => Some(Type::Float),
                _ => {
                    self.type_error(span, format!("'/' is not defined for {} and {}.", lt, rt));
                    None
                }
            },
            Mod => match (&lt, &rt) {
                (Type::Int, Type::Int) => Some(Type::Int),
                _ => {
                    self.type_error(span, "'%' is only defined for int.".to_string());
                    None
                }
            },
            Lt | Le | Gt | Ge => match (&lt, &rt) {
                (Type::Int, Type::Int) | (Type::Float, Type::Float) => Some(Type::Bool),
                _ => {
                    self.type_error(span, format!("comparison requires matching numeric operands, found {} and {}.", lt, rt));
                    None
                }
            },
            Eq | Ne => {
                if lt == rt {
                    Some(Type::Bool)
                } else {
                    self.type_error(span, format!("equality requires operands of the same type, found {} and {}.", lt, rt));
                    None
                }
            }
            And | Or => {
                if lt == Type::Bool && rt == Type::Bool {
                    Some(Type::Bool)
                } else {
                    self.type_error(span, "'and'/'or' require bool operands.".to_string());
                    None
                }
            }
        }
    }

    fn resolve_cast(&mut self, expr: ExprId, target: Type, span: Span, scope: &mut ScopeStack) -> Option<Type> {
        let t = self.analyze_expr(expr, scope)?;
        if t.cast_allowed(&target) {
            Some(target)
        } else {
            self.type_error(span, format!("cannot cast {} to {}.", t, target));
            None
        }
    }

    // ---- shared lookups & diagnostics ----

    fn lookup(&self, name: &str, scope: &ScopeStack) -> Option<Symbol> {
        if let Some(sym) = scope.lookup(name) {
            return Some(sym.clone());
        }
        if let Some(sym) = self.lookup_global_fallback(name) {
            return Some(sym);
        }
        self.functions.get(name).map(|(params, ret)| Symbol::Function { params: params.clone(), ret: ret.clone() })
    }

    fn lookup_global_fallback(&self, name: &str) -> Option<Symbol> {
        let stmt_id = *self.globals_by_name.get(name)?;
        let info = self.global_slots.get(&stmt_id)?;
        Some(Symbol::Variable { ty: info.ty.clone(), slot: info.slot, is_global: true, array_size: info.array_size })
    }

    fn check_arg_types(&mut self, span: Span, name: &str, got: &[Option<Type>], expected: &[Type]) {
        if got.len() != expected.len() {
            return;
        }
        for (i, (g, e)) in got.iter().zip(expected.iter()).enumerate() {
            if let Some(g) = g {
                if g != e {
                    self.type_error(span, format!("argument {} to '{}' expects {}, found {}.", i + 1, name, e, g));
                }
            }
        }
    }

    fn push_diag(&mut self, kind: DiagnosticKind, span: Span, message: String) {
        let line = self.lines.get((span.line.saturating_sub(1)) as usize).cloned().unwrap_or_default();
        self.sink.push(Diagnostic::new(kind, span, message, line));
    }

    fn name_error(&mut self, span: Span, message: String) {
        self.push_diag(DiagnosticKind::NameResolution, span, message);
    }

    fn type_error(&mut self, span: Span, message: String) {
        self.push_diag(DiagnosticKind::Type, span, message);
    }

    fn semantic_error(&mut self, span: Span, message: String) {
        self.push_diag(DiagnosticKind::Semantic, span, message);
    }
}
