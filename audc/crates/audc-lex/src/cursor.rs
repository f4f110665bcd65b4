//! Character cursor for traversing Aud source code.
//!
//! The cursor owns a normalized copy of the source (`\r\n` and lone `\r`
//! collapsed to `\n`) and maintains position state while the lexer iterates
//! through it. End-of-input is the `'\0'` sentinel, never a real character.

/// Collapse `\r\n` and lone `\r` line endings to `\n`.
///
/// All byte offsets in spans index into the normalized text returned here.
///
/// # Examples
///
/// ```
/// use audc_lex::cursor::normalize;
///
/// assert_eq!(normalize("a\r\nb\rc\n"), "a\nb\nc\n");
/// ```
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    out
}

/// A cursor for traversing source code character by character.
///
/// Handles UTF-8 correctly and tracks 1-based line/column numbers; a `\n`
/// increments the line and resets the column.
///
/// # Examples
///
/// ```
/// use audc_lex::Cursor;
///
/// let mut cursor = Cursor::new("int x;");
/// assert_eq!(cursor.current_char(), 'i');
/// cursor.advance();
/// assert_eq!(cursor.current_char(), 'n');
/// assert_eq!(cursor.column(), 2);
/// ```
pub struct Cursor {
    /// Normalized source text.
    source: String,

    /// Current byte position in the source.
    position: usize,

    /// Current line number (1-based).
    line: u32,

    /// Current column number (1-based, in characters).
    column: u32,
}

impl Cursor {
    /// Creates a cursor over the given raw source, normalizing line endings.
    pub fn new(raw: &str) -> Self {
        Self {
            source: normalize(raw),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Returns the current character, or `'\0'` at the end of the source.
    #[inline]
    pub fn current_char(&self) -> char {
        self.peek(0)
    }

    /// Returns the k-th upcoming character without consuming anything.
    ///
    /// # Examples
    ///
    /// ```
    /// use audc_lex::Cursor;
    ///
    /// let cursor = Cursor::new("abc");
    /// assert_eq!(cursor.peek(0), 'a');
    /// assert_eq!(cursor.peek(2), 'c');
    /// assert_eq!(cursor.peek(3), '\0');
    /// ```
    pub fn peek(&self, k: usize) -> char {
        self.source[self.position..]
            .chars()
            .nth(k)
            .unwrap_or('\0')
    }

    /// Consumes and returns one character, updating line/column tracking.
    ///
    /// Returns `'\0'` without moving if already at the end.
    pub fn advance(&mut self) -> char {
        let Some(c) = self.source[self.position..].chars().next() else {
            return '\0';
        };
        self.position += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    /// Consumes the expected character if it is next.
    pub fn match_char(&mut self, expected: char) -> bool {
        if self.current_char() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// True once the whole source has been consumed.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    /// Current line number (1-based).
    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Current column number (1-based).
    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Current byte position in the normalized source.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Slice of the normalized source from `start` to the current position.
    pub fn slice_from(&self, start: usize) -> &str {
        &self.source[start..self.position]
    }

    /// The full normalized source.
    pub fn source(&self) -> &str {
        &self.source
    }
}
