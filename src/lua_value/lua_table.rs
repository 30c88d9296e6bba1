// Lua table backed by an insertion-ordered hash map (indexmap + ahash)
// Array-style access goes through the same map; the length operator counts
// consecutive integer keys from 1

use ahash::RandomState;
use indexmap::IndexMap;

use crate::lua_value::lua_value::exact_number_from_str;
use crate::LuaValue;

pub struct LuaTable {
    map: IndexMap<LuaValue, LuaValue, RandomState>,
    metatable: Option<LuaValue>,
}

impl LuaTable {
    pub fn new() -> Self {
        LuaTable {
            map: IndexMap::with_hasher(RandomState::new()),
            metatable: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        LuaTable {
            map: IndexMap::with_capacity_and_hasher(capacity, RandomState::new()),
            metatable: None,
        }
    }

    pub fn get_metatable(&self) -> Option<LuaValue> {
        self.metatable.clone()
    }

    pub fn set_metatable(&mut self, mt: Option<LuaValue>) {
        self.metatable = mt;
    }

    /// Member lookup. Numeric-valued string keys fold into number keys, so
    /// `t["1"]` and `t[1]` address the same slot.
    pub fn raw_get(&self, key: &LuaValue) -> Option<LuaValue> {
        match normalized(key) {
            Some(k) => self.map.get(&k).cloned(),
            None => self.map.get(key).cloned(),
        }
    }

    /// Member write. Assigning nil removes the entry.
    pub fn raw_set(&mut self, key: LuaValue, value: LuaValue) {
        let key = normalized(&key).unwrap_or(key);
        if value.is_nil() {
            self.map.shift_remove(&key);
        } else {
            self.map.insert(key, value);
        }
    }

    #[inline]
    pub fn get_int(&self, key: i64) -> Option<LuaValue> {
        self.map.get(&LuaValue::number(key as f64)).cloned()
    }

    #[inline]
    pub fn set_int(&mut self, key: i64, value: LuaValue) {
        self.raw_set(LuaValue::number(key as f64), value);
    }

    pub fn get_str(&self, key: &str) -> Option<LuaValue> {
        self.raw_get(&LuaValue::str(key))
    }

    /// Length operator: the highest `k` such that keys `1..=k` are all
    /// present.
    pub fn length(&self) -> usize {
        let mut k = 0usize;
        while self.map.contains_key(&LuaValue::number((k + 1) as f64)) {
            k += 1;
        }
        k
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.map.len()
    }
}

impl Default for LuaTable {
    fn default() -> Self {
        Self::new()
    }
}

// String/number key identity: a string whose text is exactly a number's
// canonical rendering names the same slot as the number itself.
fn normalized(key: &LuaValue) -> Option<LuaValue> {
    match key {
        LuaValue::String(s) => exact_number_from_str(s.as_str()).map(LuaValue::number),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_get_set() {
        let mut t = LuaTable::new();
        t.raw_set(LuaValue::str("a"), LuaValue::number(1.0));
        assert_eq!(t.get_str("a"), Some(LuaValue::number(1.0)));
        assert_eq!(t.get_str("b"), None);
    }

    #[test]
    fn test_nil_assignment_removes() {
        let mut t = LuaTable::new();
        t.set_int(1, LuaValue::number(5.0));
        t.set_int(1, LuaValue::nil());
        assert_eq!(t.get_int(1), None);
        assert!(t.is_empty());
    }

    #[test]
    fn test_length_counts_consecutive_keys() {
        let mut t = LuaTable::new();
        t.set_int(1, LuaValue::str("a"));
        t.set_int(2, LuaValue::str("b"));
        t.set_int(4, LuaValue::str("d"));
        assert_eq!(t.length(), 2);
        t.set_int(3, LuaValue::str("c"));
        assert_eq!(t.length(), 4);
    }

    #[test]
    fn test_numeric_string_key_identity() {
        let mut t = LuaTable::new();
        t.raw_set(LuaValue::str("1"), LuaValue::str("one"));
        assert_eq!(t.get_int(1), Some(LuaValue::str("one")));
        // A non-canonical numeric text stays a string key
        t.raw_set(LuaValue::str("01"), LuaValue::str("oh-one"));
        assert_eq!(t.get_str("01"), Some(LuaValue::str("oh-one")));
        assert_eq!(t.get_int(1), Some(LuaValue::str("one")));
    }

    #[test]
    fn test_metatable_round_trip() {
        let mut t = LuaTable::new();
        assert!(t.get_metatable().is_none());
        let mt = LuaValue::Table(std::rc::Rc::new(std::cell::RefCell::new(LuaTable::new())));
        t.set_metatable(Some(mt.clone()));
        assert!(t.get_metatable().unwrap().raw_equals(&mt));
    }
}
