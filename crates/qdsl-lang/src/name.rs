use std::sync::{LazyLock, PoisonError, RwLock};

use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

static NAME_INTERNER: LazyLock<RwLock<StringInterner<DefaultBackend>>> =
    LazyLock::new(|| RwLock::new(StringInterner::default()));

/// An interned node name.
///
/// Two names built from equal text are always the same symbol, so comparing
/// names is an integer comparison rather than a string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(DefaultSymbol);

impl Name {
    pub fn new(s: &str) -> Self {
        intern(s)
    }

    /// Looks up an already interned name without inserting it.
    pub fn get(s: &str) -> Option<Self> {
        NAME_INTERNER
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(s)
            .map(Self)
    }

    pub fn as_str(&self) -> String {
        self.resolve_with(str::to_string)
    }

    pub fn resolve_with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        let interner = NAME_INTERNER.read().unwrap_or_else(PoisonError::into_inner);
        // Symbols are only ever minted by this table and never removed.
        f(interner.resolve(self.0).unwrap_or_default())
    }
}

/// Returns the canonical [`Name`] for `s`, inserting it on first use.
pub fn intern(s: &str) -> Name {
    if let Some(name) = Name::get(s) {
        return name;
    }

    // `get_or_intern` re-checks under the write lock, so a racing insert of the
    // same text still resolves to a single symbol.
    let symbol = NAME_INTERNER
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_intern(s);
    Name(symbol)
}

/// Number of distinct names interned so far.
pub fn interned_count() -> usize {
    NAME_INTERNER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.resolve_with(|s| write!(f, "{}", s))
    }
}
