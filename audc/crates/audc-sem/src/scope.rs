//! Frame-stack symbol table for name resolution.
//!
//! Each code block and each function body corresponds to one frame. Lookup
//! walks from the innermost frame outward; declarations always insert into
//! the current frame, and a name may only be declared once per frame
//! (shadowing across frames is fine).

use audc_par::TypeSig;
use audc_util::{FxHashMap, Span};

/// What the checker knows about one declared variable.
#[derive(Clone, Debug)]
pub struct VarInfo {
    pub ty: TypeSig,
    pub decl_span: Span,
}

/// Stack of lexical frames.
pub struct SymbolTable {
    frames: Vec<FxHashMap<String, VarInfo>>,
}

impl SymbolTable {
    /// A table with a single (global) frame.
    pub fn new() -> Self {
        Self {
            frames: vec![FxHashMap::default()],
        }
    }

    /// Enter a nested frame.
    pub fn push_frame(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    /// Leave the current frame. The global frame is never popped.
    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Declare a name in the current frame.
    ///
    /// Fails when the current frame already holds the name; the caller
    /// reports the diagnostic.
    pub fn declare(&mut self, name: &str, ty: TypeSig, decl_span: Span) -> Result<(), ()> {
        let frame = self
            .frames
            .last_mut()
            .unwrap_or_else(|| unreachable!("global frame always present"));
        if frame.contains_key(name) {
            return Err(());
        }
        frame.insert(name.to_string(), VarInfo { ty, decl_span });
        Ok(())
    }

    /// Look a name up, innermost frame first.
    pub fn lookup(&self, name: &str) -> Option<&VarInfo> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
