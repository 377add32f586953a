use std::collections::HashMap;

use pixardis_parser::{ExprId, StmtId};
use pixardis_types::Type;

/// Where a resolved variable reference lives: the per-call-frame locals
/// array (addressed relative to the current frame) or the absolute-indexed
/// global array (spec.md §3's scope table flattened for codegen; see
/// DESIGN.md for why globals can't share the frame-relative local space).
#[derive(Debug, Clone, PartialEq)]
pub struct VarRef {
    pub is_global: bool,
    pub slot: u32,
    pub ty: Type,
    pub array_size: Option<usize>,
}

/// The output of semantic analysis: the AST is left untouched, every
/// annotation lives in a side table keyed by the node's arena handle
/// (spec.md §9).
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub expr_types: HashMap<ExprId, Type>,
    pub var_refs: HashMap<ExprId, VarRef>,
    pub assign_refs: HashMap<StmtId, VarRef>,
    pub let_refs: HashMap<StmtId, VarRef>,
    pub call_targets: HashMap<ExprId, String>,
    /// Total slot count (params + declared locals) each function's `oframe`
    /// must reserve.
    pub function_frame_size: HashMap<String, u32>,
    /// Total slot count of the global array (top-level variables, including
    /// those nested in top-level `if`/`while`/`for`/block bodies).
    pub global_count: u32,
}

impl Analysis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expr_type(&self, id: ExprId) -> Option<&Type> {
        self.expr_types.get(&id)
    }
}
