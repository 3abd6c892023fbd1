//! Byte-offset references into the original query source.
//!
//! AST nodes never copy source text; they carry a `Span` and resolve it
//! against the source string on demand. A zero-length span at offset `0`
//! is used as the canonical "empty"/wildcard span (see `Span::EMPTY`).

/// A `(offset, length)` reference into the source string being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub offset: u32,
    pub length: u32,
}

impl Span {
    /// The canonical empty span, used where the pattern scanner (§4.7)
    /// wants a wildcard rather than a bound term.
    pub const EMPTY: Span = Span { offset: 0, length: 0 };

    /// Sentinel for `VALUES`'s `UNDEF`.
    pub const UNDEF: Span = Span { offset: 0, length: u32::MAX };

    pub fn is_undef(&self) -> bool {
        self.length == u32::MAX
    }

    pub fn new(offset: u32, length: u32) -> Self {
        Span { offset, length }
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Resolve this span against `source`. Panics if the span is out of
    /// bounds; callers that parsed `source` correctly never hit that path.
    pub fn resolve<'a>(&self, source: &'a str) -> &'a str {
        &source[self.offset as usize..(self.offset + self.length) as usize]
    }

    pub fn end(&self) -> u32 {
        self.offset + self.length
    }

    pub fn covers(&self, source_len: usize) -> bool {
        self.end() as usize <= source_len
    }
}
