// Runtime value types: strings, tables, prototypes, closures, upvalue cells

mod lua_table;
mod lua_value;

use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::Hasher;
use std::rc::Rc;

use crate::lua_vm::RegisterFile;

pub use lua_table::LuaTable;
pub use lua_value::{
    exact_number_from_str, matches_number_pattern, number_to_string, LuaValue, LuaValueKind,
};

/// Shared handle to a table value.
pub type LuaTableRef = Rc<RefCell<LuaTable>>;

/// Convenience constructor for a fresh table value.
pub fn new_table() -> LuaValue {
    LuaValue::Table(Rc::new(RefCell::new(LuaTable::new())))
}

/// Multi-return values from Lua functions.
#[derive(Debug, Clone)]
pub struct MultiValue {
    pub values: Option<Vec<LuaValue>>,
}

impl MultiValue {
    pub fn empty() -> Self {
        MultiValue { values: None }
    }

    pub fn single(value: LuaValue) -> Self {
        MultiValue {
            values: Some(vec![value]),
        }
    }

    pub fn multiple(values: Vec<LuaValue>) -> Self {
        MultiValue {
            values: Some(values),
        }
    }

    pub fn all_values(self) -> Vec<LuaValue> {
        self.values.unwrap_or_default()
    }

    pub fn first(&self) -> LuaValue {
        self.values
            .as_ref()
            .and_then(|v| v.first().cloned())
            .unwrap_or(LuaValue::Nil)
    }
}

/// Lua string (immutable, with cached hash)
#[derive(Debug, Clone)]
pub struct LuaString {
    data: String,
    hash: u64,
}

impl LuaString {
    pub fn new(s: String) -> Self {
        use std::hash::Hash;

        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        let hash = hasher.finish();

        LuaString { data: s, hash }
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    #[inline]
    pub fn cached_hash(&self) -> u64 {
        self.hash
    }
}

impl PartialEq for LuaString {
    fn eq(&self, other: &Self) -> bool {
        if self.hash != other.hash {
            return false;
        }
        self.data == other.data
    }
}

impl Eq for LuaString {}

impl std::hash::Hash for LuaString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

/// Runtime upvalue cell - open (pointing at a live register) or closed
/// (owning the captured value). Every closure capturing the same parent
/// local shares one cell.
pub struct LuaUpvalue {
    state: RefCell<UpvalueState>,
}

enum UpvalueState {
    Open {
        registers: Rc<RefCell<RegisterFile>>,
        index: usize,
    },
    Closed(LuaValue),
}

impl LuaUpvalue {
    /// Create an open cell bound to a register of a live activation.
    pub fn new_open(registers: Rc<RefCell<RegisterFile>>, index: usize) -> Rc<Self> {
        Rc::new(LuaUpvalue {
            state: RefCell::new(UpvalueState::Open { registers, index }),
        })
    }

    /// Create a closed cell owning a value.
    pub fn new_closed(value: LuaValue) -> Rc<Self> {
        Rc::new(LuaUpvalue {
            state: RefCell::new(UpvalueState::Closed(value)),
        })
    }

    pub fn is_open(&self) -> bool {
        matches!(*self.state.borrow(), UpvalueState::Open { .. })
    }

    pub fn get(&self) -> LuaValue {
        match &*self.state.borrow() {
            UpvalueState::Open { registers, index } => registers.borrow().get(*index),
            UpvalueState::Closed(v) => v.clone(),
        }
    }

    pub fn set(&self, value: LuaValue) {
        let mut state = self.state.borrow_mut();
        match &mut *state {
            UpvalueState::Open { registers, index } => {
                registers.borrow_mut().set(*index, value);
            }
            UpvalueState::Closed(v) => *v = value,
        }
    }

    /// Transition open → closed, unlinking the cell from its register.
    /// Closing an already-closed cell is a no-op.
    pub fn close(&self, final_value: LuaValue) {
        let mut state = self.state.borrow_mut();
        if matches!(*state, UpvalueState::Open { .. }) {
            *state = UpvalueState::Closed(final_value);
        }
    }
}

impl fmt::Debug for LuaUpvalue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.borrow() {
            UpvalueState::Open { index, .. } => write!(f, "Upvalue::Open(reg={})", index),
            UpvalueState::Closed(v) => write!(f, "Upvalue::Closed({:?})", v),
        }
    }
}

/// `is_vararg` value that triggers legacy vararg staging: the surplus
/// arguments are collected into a table (with field `n`) stored right
/// after the declared parameters.
pub const COMPAT_VARARG: u8 = 7;

/// Compiled function prototype (bytecode + metadata). Immutable once built;
/// chunks are hand-assembled or produced by an external loader.
#[derive(Debug)]
pub struct Chunk {
    pub code: Vec<u32>,
    pub constants: Vec<LuaValue>,
    pub child_protos: Vec<Rc<Chunk>>,
    /// Source line for each instruction, parallel to `code`.
    pub line_info: Vec<u32>,
    pub param_count: usize,
    /// Vararg flag; `COMPAT_VARARG` (7) selects compat staging.
    pub is_vararg: u8,
    pub source_name: Option<String>,
    /// Names of this prototype's upvalues; the length is the upvalue count.
    pub upvalue_names: Vec<String>,
}

impl Chunk {
    pub fn new() -> Self {
        Chunk {
            code: Vec::new(),
            constants: Vec::new(),
            child_protos: Vec::new(),
            line_info: Vec::new(),
            param_count: 0,
            is_vararg: 0,
            source_name: None,
            upvalue_names: Vec::new(),
        }
    }

    pub fn upvalue_count(&self) -> usize {
        self.upvalue_names.len()
    }

    pub fn source(&self) -> &str {
        self.source_name.as_deref().unwrap_or("?")
    }

    pub fn line_at(&self, pc: usize) -> u32 {
        self.line_info.get(pc).copied().unwrap_or(0)
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}

/// A function value: prototype plus bound upvalue cells. Invoking it spins
/// up an activation that drives the prototype's bytecode.
pub struct LuaClosure {
    pub chunk: Rc<Chunk>,
    pub upvalues: Vec<Rc<LuaUpvalue>>,
}

impl LuaClosure {
    pub fn new(chunk: Rc<Chunk>, upvalues: Vec<Rc<LuaUpvalue>>) -> Self {
        LuaClosure { chunk, upvalues }
    }
}

impl fmt::Debug for LuaClosure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LuaClosure({})", self.chunk.source())
    }
}
