use std::collections::HashMap;

/// Index of an interned string in a [`SymbolTable`].
pub type SymbolId = usize;

/// Interns every identifier, keyword and pin name seen during one compilation.
///
/// Ids are handed out sequentially from zero and never change for the lifetime of the table.
/// Each compilation owns its own table, so independent circuits can be built side by side.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    texts: Vec<String>,
    ids: HashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    /// The id for `text`, if it has been interned.
    pub fn query(&self, text: &str) -> Option<SymbolId> {
        self.ids.get(text).copied()
    }

    /// The id for `text`, interning it first if needed.
    pub fn lookup(&mut self, text: &str) -> SymbolId {
        if let Some(id) = self.ids.get(text) {
            return *id;
        }
        let id = self.texts.len();
        self.texts.push(text.to_string());
        self.ids.insert(text.to_string(), id);
        id
    }

    pub fn lookup_all(&mut self, texts: &[&str]) -> Vec<SymbolId> {
        texts.iter().map(|text| self.lookup(text)).collect()
    }

    pub fn get_name_string(&self, id: SymbolId) -> Option<&str> {
        self.texts.get(id).map(|text| text.as_str())
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

#[test]
fn symbol_table_interns() {
    let mut symbols = SymbolTable::new();
    let [a, b] = [symbols.lookup("a"), symbols.lookup("b")];
    assert_eq!(a, 0);
    assert_eq!(b, 1);
    assert_eq!(symbols.lookup("a"), a);
    assert_eq!(symbols.query("b"), Some(b));
    assert_eq!(symbols.query("c"), None);
    assert_eq!(symbols.get_name_string(b), Some("b"));
    assert_eq!(symbols.get_name_string(7), None);
    assert_eq!(symbols.lookup_all(&["c", "a"]), vec![2, 0]);
    assert_eq!(symbols.len(), 3);
}
