use std::collections::HashMap;

/// Interned identifier. Only meaningful together with the [`Interner`] that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Symbol(u32);

/// Identifier table of a single compilation.
///
/// Each compile call creates its own table and drops it at the end, so names never leak from one
/// program into the next.
#[derive(Debug, Default)]
pub(crate) struct Interner {
    names: Vec<String>,
    symbols: HashMap<String, Symbol>,
}

impl Interner {
    pub(crate) fn intern(&mut self, name: &str) -> Symbol {
        if let Some(&symbol) = self.symbols.get(name) {
            return symbol;
        }
        let symbol = Symbol(u32::try_from(self.names.len()).expect("too many identifiers"));
        self.names.push(name.to_owned());
        self.symbols.insert(name.to_owned(), symbol);
        symbol
    }

    pub(crate) fn resolve(&self, symbol: Symbol) -> &str {
        &self.names[symbol.0 as usize]
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }
}
