use std::collections::HashMap;

use pixardis_types::Type;

#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Variable {
        ty: Type,
        slot: u32,
        is_global: bool,
        array_size: Option<usize>,
    },
    Function {
        params: Vec<Type>,
        ret: Type,
    },
}

/// A stack of lexical frames used while walking a single function body (or
/// the top-level sequence, which is analyzed the same way). Shadowing
/// within the same frame is rejected by the caller before inserting;
/// shadowing across frames is allowed by construction, since `lookup`
/// searches innermost-first.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<HashMap<String, Symbol>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack { frames: vec![HashMap::new()] }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    pub fn declared_in_current_frame(&self, name: &str) -> bool {
        self.frames.last().is_some_and(|f| f.contains_key(name))
    }

    pub fn insert(&mut self, name: String, symbol: Symbol) {
        self.frames.last_mut().expect("at least one frame").insert(name, symbol);
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.frames.iter().rev().find_map(|f| f.get(name))
    }
}
