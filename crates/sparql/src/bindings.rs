//! Binding table: an append-only map from variable
//! name to typed value, backed by a single growable string buffer so a
//! row's payloads never need per-variable heap allocations. Capacity
//! follows a fixed-capacity inline array convention (`crate::fixed::FixedVec`)
//! rather than an unbounded `Vec`.
//!
//! Variable identity is the FNV-1a hash of its name (sigil stripped).
//! Collisions between two distinct variable names in the same query are
//! assumed not to happen — a documented assumption, not a guarantee
//! enforced at runtime.

use crate::fixed::FixedVec;

/// Binding-table capacity. Exceeding it during execution is an internal
/// invariant violation.
pub const MAX_BINDINGS: usize = 16;

/// FNV-1a over raw bytes, 32-bit variant.
pub fn fnv1a(bytes: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Hashes a variable's name with the leading `?`/`$` already stripped.
pub fn hash_variable_name(name: &str) -> u32 {
    fnv1a(name.as_bytes())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingType {
    #[default]
    Unbound,
    Uri,
    String,
    Integer,
    Double,
    Boolean,
}

/// One bound variable. Numeric/boolean payloads are stored
/// inline; `String`/`Uri` payloads reference the table's shared buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Binding {
    pub variable_hash: u32,
    pub binding_type: BindingType,
    pub int_value: i64,
    pub double_value: f64,
    pub bool_value: bool,
    pub string_offset: u32,
    pub string_length: u32,
    pub bind_scope_depth: u32,
}

/// Append-only sequence of `Binding`s plus one growable string buffer.
/// `truncate_to` both drops entries past `count` and rewinds the buffer,
/// which is what makes backtracking in the join engine reclaim space
/// instead of leaking it.
#[derive(Debug, Clone)]
pub struct BindingTable {
    entries: FixedVec<Binding, MAX_BINDINGS>,
    buffer: String,
}

impl BindingTable {
    pub fn new() -> Self {
        BindingTable { entries: FixedVec::new(), buffer: String::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `findBinding(name) → index | -1`, `O(n)` over the
    /// small binding count.
    pub fn find_binding(&self, variable_hash: u32) -> Option<usize> {
        self.entries
            .iter()
            .position(|b| b.binding_type != BindingType::Unbound && b.variable_hash == variable_hash)
    }

    pub fn binding_at(&self, index: usize) -> &Binding {
        &self.entries[index]
    }

    pub fn get_string(&self, index: usize) -> &str {
        let b = self.entries[index];
        debug_assert!(matches!(b.binding_type, BindingType::Uri | BindingType::String));
        &self.buffer[b.string_offset as usize..(b.string_offset + b.string_length) as usize]
    }

    /// Renders any binding's value as its SPARQL lexical text, for
    /// byte-equality comparisons and DISTINCT/ORDER BY hashing.
    pub fn lexical_at(&self, index: usize) -> String {
        let b = self.entries[index];
        match b.binding_type {
            BindingType::Unbound => String::new(),
            BindingType::Uri | BindingType::String => self.get_string(index).to_string(),
            BindingType::Integer => b.int_value.to_string(),
            BindingType::Double => b.double_value.to_string(),
            BindingType::Boolean => b.bool_value.to_string(),
        }
    }

    fn push_string(&mut self, variable_hash: u32, binding_type: BindingType, text: &str, bind_scope_depth: u32) {
        let string_offset = self.buffer.len() as u32;
        self.buffer.push_str(text);
        let string_length = text.len() as u32;
        self.entries
            .try_push(Binding {
                variable_hash,
                binding_type,
                string_offset,
                string_length,
                bind_scope_depth,
                ..Binding::default()
            })
            .expect("binding table capacity exceeded");
    }

    pub fn bind_uri(&mut self, variable_hash: u32, text: &str, bind_scope_depth: u32) {
        self.push_string(variable_hash, BindingType::Uri, text, bind_scope_depth);
    }

    pub fn bind_string(&mut self, variable_hash: u32, text: &str, bind_scope_depth: u32) {
        self.push_string(variable_hash, BindingType::String, text, bind_scope_depth);
    }

    pub fn bind_integer(&mut self, variable_hash: u32, value: i64, bind_scope_depth: u32) {
        self.entries
            .try_push(Binding {
                variable_hash,
                binding_type: BindingType::Integer,
                int_value: value,
                bind_scope_depth,
                ..Binding::default()
            })
            .expect("binding table capacity exceeded");
    }

    pub fn bind_double(&mut self, variable_hash: u32, value: f64, bind_scope_depth: u32) {
        self.entries
            .try_push(Binding {
                variable_hash,
                binding_type: BindingType::Double,
                double_value: value,
                bind_scope_depth,
                ..Binding::default()
            })
            .expect("binding table capacity exceeded");
    }

    pub fn bind_boolean(&mut self, variable_hash: u32, value: bool, bind_scope_depth: u32) {
        self.entries
            .try_push(Binding {
                variable_hash,
                binding_type: BindingType::Boolean,
                bool_value: value,
                bind_scope_depth,
                ..Binding::default()
            })
            .expect("binding table capacity exceeded");
    }

    /// Binds a raw store/pattern lexical form, classifying it as `Uri`
    /// (`<...>`) or `String` (anything else — a pattern-scan result is
    /// always one of these two shapes).
    pub fn bind_lexical(&mut self, variable_hash: u32, text: &str, bind_scope_depth: u32) {
        if text.starts_with('<') {
            self.bind_uri(variable_hash, text, bind_scope_depth);
        } else {
            self.bind_string(variable_hash, text, bind_scope_depth);
        }
    }

    /// `tryBind(var, value)`: if the variable is already
    /// bound, require byte-equality with `value`; otherwise bind it.
    pub fn try_bind_lexical(&mut self, variable_hash: u32, text: &str, bind_scope_depth: u32) -> bool {
        if let Some(idx) = self.find_binding(variable_hash) {
            self.lexical_at(idx) == text
        } else {
            self.bind_lexical(variable_hash, text, bind_scope_depth);
            true
        }
    }

    /// `truncateTo(k)`: drops entries beyond `k` and
    /// rewinds the string buffer to the end of the retained entries'
    /// payloads.
    pub fn truncate_to(&mut self, count: usize) {
        self.entries.truncate(count);
        let new_buffer_len = if count == 0 {
            0
        } else {
            let last = self.entries[count - 1];
            (last.string_offset + last.string_length) as usize
        };
        self.buffer.truncate(new_buffer_len);
    }

    /// FNV-1a across all bound values' lexical text, `|`-separated.
    pub fn distinct_hash(&self) -> u32 {
        let mut joined = String::new();
        for i in 0..self.entries.len() {
            if i > 0 {
                joined.push('|');
            }
            joined.push_str(&self.lexical_at(i));
        }
        fnv1a(joined.as_bytes())
    }
}

impl Default for BindingTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_and_find_roundtrips() {
        let mut t = BindingTable::new();
        let h = hash_variable_name("x");
        t.bind_uri(h, "<http://a>", 0);
        let idx = t.find_binding(h).unwrap();
        assert_eq!(t.get_string(idx), "<http://a>");
    }

    #[test]
    fn try_bind_rejects_mismatched_rebind() {
        let mut t = BindingTable::new();
        let h = hash_variable_name("x");
        assert!(t.try_bind_lexical(h, "<http://a>", 0));
        assert!(!t.try_bind_lexical(h, "<http://b>", 0));
        assert!(t.try_bind_lexical(h, "<http://a>", 0));
    }

    #[test]
    fn truncate_to_rewinds_buffer() {
        let mut t = BindingTable::new();
        let h1 = hash_variable_name("x");
        let h2 = hash_variable_name("y");
        t.bind_string(h1, "hello", 0);
        t.bind_string(h2, "world", 0);
        t.truncate_to(1);
        assert_eq!(t.len(), 1);
        assert_eq!(t.get_string(0), "hello");
        t.bind_string(h2, "abc", 0);
        assert_eq!(t.get_string(1), "abc");
    }

    #[test]
    fn distinct_hash_is_order_sensitive_and_stable() {
        let mut a = BindingTable::new();
        a.bind_string(1, "x", 0);
        a.bind_string(2, "y", 0);
        let mut b = BindingTable::new();
        b.bind_string(1, "x", 0);
        b.bind_string(2, "y", 0);
        assert_eq!(a.distinct_hash(), b.distinct_hash());
    }
}
