/// Placeholder Tokenizer Module
///
/// Splits a query template on the unescaped placeholder markers `?`, `&`
/// and `!` into literal fragments plus a parallel list of placeholder
/// kinds. A backslash escapes a marker; the backslash is removed from the
/// emitted fragment. The tokenized form is what the prepared-query registry
/// stores and what execute-time substitution walks.

/// How a bound value is substituted into the query at execute time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// `?` - the value is escaped and quoted as a SQL literal.
    Scalar,
    /// `&` - the value names a file whose binary contents are substituted.
    Opaque,
    /// `!` - the value is substituted verbatim, unquoted.
    Misc,
}

/// A tokenized query template, ready for execute-time substitution.
///
/// Invariant: `tokens.len() == kinds.len() + 1` - fragments and
/// placeholders strictly alternate, starting and ending with a fragment
/// (which may be empty).
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    tokens: Vec<String>,
    kinds: Vec<PlaceholderKind>,
    raw: String,
}

impl PreparedQuery {
    /// Number of placeholders the template carries.
    pub fn placeholder_count(&self) -> usize {
        self.kinds.len()
    }

    /// The original, untokenized template.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Literal fragments between the placeholders.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Placeholder kinds, in template order.
    pub fn kinds(&self) -> &[PlaceholderKind] {
        &self.kinds
    }
}

/// Tokenizes a query template.
///
/// # Examples
///
/// ```
/// use sqlport::core::tokenizer::{tokenize, PlaceholderKind};
///
/// let query = tokenize("INSERT INTO t (a, b) VALUES (?, !)");
/// assert_eq!(query.placeholder_count(), 2);
/// assert_eq!(query.kinds()[0], PlaceholderKind::Scalar);
/// assert_eq!(query.kinds()[1], PlaceholderKind::Misc);
/// ```
pub fn tokenize(template: &str) -> PreparedQuery {
    let mut tokens = Vec::new();
    let mut kinds = Vec::new();
    let mut fragment = String::new();

    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek().copied() {
                // An escaped marker becomes a literal marker character.
                Some(next) if matches!(next, '?' | '&' | '!') => {
                    fragment.push(next);
                    chars.next();
                }
                _ => fragment.push('\\'),
            },
            '?' => {
                tokens.push(std::mem::take(&mut fragment));
                kinds.push(PlaceholderKind::Scalar);
            }
            '&' => {
                tokens.push(std::mem::take(&mut fragment));
                kinds.push(PlaceholderKind::Opaque);
            }
            '!' => {
                tokens.push(std::mem::take(&mut fragment));
                kinds.push(PlaceholderKind::Misc);
            }
            _ => fragment.push(c),
        }
    }
    tokens.push(fragment);

    PreparedQuery {
        tokens,
        kinds,
        raw: template.to_string(),
    }
}
