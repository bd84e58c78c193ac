use std::collections::BTreeMap;

use crate::foundation::core::{SliceIndex, StackDims};

/// A value bound to a variable name during expression evaluation.
#[derive(Clone, Debug, PartialEq)]
pub enum VarValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// String value.
    Str(String),
}

impl VarValue {
    /// Human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            VarValue::Bool(_) => "boolean",
            VarValue::Int(_) => "integer",
            VarValue::Float(_) => "float",
            VarValue::Str(_) => "string",
        }
    }
}

/// Named variables exposed to rule conditions and reference expressions.
///
/// A context is seeded once with stack-level metadata and caller-supplied
/// annotations, then re-seeded with `c`/`z`/`t` for each slice it is
/// evaluated against.
#[derive(Clone, Debug, Default)]
pub struct VariableContext {
    vars: BTreeMap<String, VarValue>,
}

impl VariableContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn set(&mut self, name: impl Into<String>, value: VarValue) {
        self.vars.insert(name.into(), value);
    }

    /// Look up a variable by name.
    pub fn get(&self, name: &str) -> Option<&VarValue> {
        self.vars.get(name)
    }

    /// Bind the stack-level metadata variables.
    ///
    /// Exposes `width`, `height`, the input stack extents (`num_c`, `num_z`,
    /// `num_t`) and the reference stack extents (`ref_num_c`, `ref_num_z`,
    /// `ref_num_t`).
    pub fn set_stack_vars(
        &mut self,
        width: u32,
        height: u32,
        input: StackDims,
        reference: StackDims,
    ) {
        self.set("width", VarValue::Int(i64::from(width)));
        self.set("height", VarValue::Int(i64::from(height)));
        self.set("num_c", VarValue::Int(i64::from(input.channels)));
        self.set("num_z", VarValue::Int(i64::from(input.depths)));
        self.set("num_t", VarValue::Int(i64::from(input.times)));
        self.set("ref_num_c", VarValue::Int(i64::from(reference.channels)));
        self.set("ref_num_z", VarValue::Int(i64::from(reference.depths)));
        self.set("ref_num_t", VarValue::Int(i64::from(reference.times)));
    }

    /// Bind the current slice coordinates as `c`, `z`, and `t`.
    pub fn set_slice_vars(&mut self, index: SliceIndex) {
        self.set("c", VarValue::Int(i64::from(index.channel)));
        self.set("z", VarValue::Int(i64::from(index.depth)));
        self.set("t", VarValue::Int(i64::from(index.time)));
    }

    /// Clone of this context seeded with the given slice coordinates.
    pub fn for_slice(&self, index: SliceIndex) -> Self {
        let mut ctx = self.clone();
        ctx.set_slice_vars(index);
        ctx
    }
}
