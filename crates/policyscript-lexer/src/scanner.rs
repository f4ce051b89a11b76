use tracing::{debug, trace};

use crate::position::{Position, Range};
use crate::token::{self, Token, TokenKind};
use crate::{LexErrorKind, LexerError};

/// Scanner mode determines which grammar applies at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerMode {
    /// Prose: headings, paragraphs and comments.
    Document,
    /// Between a block keyword and its opening brace.
    BlockInit,
    /// Code inside `@keyword { ... }`.
    Block,
}

/// Callback receiving every lexical error as `(message, position)`.
pub type ErrorHandler<'a> = Box<dyn FnMut(&str, Position) + 'a>;

/// Cursor state. Copied before speculative lookahead and assigned back on
/// failure, so a failed match leaves the scanner exactly where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    ch: char,
    line: usize,
    column: usize,
    offset: usize,
}

/// PolicyScript source scanner.
///
/// Splits a document into prose tokens and, inside `@keyword { ... }`
/// fences, into code tokens. Scanning never fails: malformed input is
/// reported through [`LexerError`]s and the token stream always ends with
/// a single [`TokenKind::Eof`].
///
/// - `Vec<char>` source for index-based navigation
/// - `Copy` cursor for save/restore lookahead
/// - mode-aware dispatch (`Document` / `BlockInit` / `Block`)
/// - synthetic `;` at line breaks that end a code statement
pub struct Scanner<'a> {
    chars: Vec<char>,
    cursor: Cursor,
    mode: ScannerMode,
    /// `@define` may name a type before its opening brace.
    expect_type_name: bool,
    block_depth: usize,
    /// Keyword and position of the block opened from document mode.
    open_block: Option<(TokenKind, Position)>,
    terminator_pending: bool,
    errors: Vec<LexerError>,
    on_error: Option<ErrorHandler<'a>>,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given source, starting in document mode.
    pub fn new(source: &str) -> Self {
        let chars: Vec<char> = source.chars().collect();
        let ch = chars.first().copied().unwrap_or('\0');
        Self {
            chars,
            cursor: Cursor {
                ch,
                line: 1,
                column: 0,
                offset: 0,
            },
            mode: ScannerMode::Document,
            expect_type_name: false,
            block_depth: 0,
            open_block: None,
            terminator_pending: false,
            errors: Vec::new(),
            on_error: None,
        }
    }

    /// Create a scanner with a specific starting mode.
    ///
    /// Starting in [`ScannerMode::Block`] lexes a bare code snippet: there is
    /// no enclosing fence, so end of input is not an unterminated block.
    pub fn with_mode(source: &str, mode: ScannerMode) -> Self {
        let mut scanner = Self::new(source);
        scanner.mode = mode;
        scanner
    }

    /// Install a callback invoked for every lexical error.
    pub fn with_error_handler(mut self, handler: impl FnMut(&str, Position) + 'a) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Tokenize the entire source, returning the tokens and any errors.
    pub fn tokenize(source: &str) -> (Vec<Token>, Vec<LexerError>) {
        let mut scanner = Scanner::new(source);
        let tokens = scanner.scan();
        (tokens, scanner.errors)
    }

    /// Scan all remaining tokens. The last token is always `Eof`.
    pub fn scan(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.is(TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Read the next token. Returns `Eof` forever once input is exhausted.
    pub fn next_token(&mut self) -> Token {
        let token = match self.mode {
            ScannerMode::Document => self.document_token(),
            ScannerMode::BlockInit => self.block_init_token(),
            ScannerMode::Block => self.block_token(),
        };
        trace!(
            target: "policyscript::lexer",
            kind = %token.kind,
            range = %token.range,
            "scanned token"
        );
        token
    }

    pub fn mode(&self) -> ScannerMode {
        self.mode
    }

    pub fn errors(&self) -> &[LexerError] {
        &self.errors
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Consume the scanner, keeping only its errors.
    pub fn into_errors(self) -> Vec<LexerError> {
        self.errors
    }

    // =========================================================================
    // Document mode
    // =========================================================================

    fn document_token(&mut self) -> Token {
        let line_start = self.skip_whitespace_and_breaks();

        if self.is_at_end() {
            return self.eof_token();
        }

        match self.cursor.ch {
            // Only a heading in the first column and followed by a space.
            '_' if self.cursor.column == 0 && self.peek() == ' ' => {
                let start = self.position();
                self.read_until_double_line_break(TokenKind::Heading, start)
            }
            '#' => self.read_comment(),
            '@' if self.cursor.column == 0 => match self.try_block_keyword() {
                Some(token) => token,
                None => self.read_until_double_line_break(TokenKind::Paragraph, line_start),
            },
            _ => self.read_until_double_line_break(TokenKind::Paragraph, line_start),
        }
    }

    /// Read lines until a blank line, end of input, or a line starting with
    /// `#`. Lines are joined with `\n`; the blank line is consumed, the
    /// comment line is not.
    fn read_until_double_line_break(&mut self, kind: TokenKind, start: Position) -> Token {
        let mut end = start;
        let mut literal: Option<String> = None;
        let mut segment_start = start.offset;

        loop {
            let mut whitespace_only = true;

            while !self.is_at_end() && self.cursor.ch != '\n' {
                if !is_whitespace(self.cursor.ch) {
                    if whitespace_only && self.cursor.ch == '#' {
                        return self.make_token(kind, literal.unwrap_or_default(), start, end);
                    }
                    whitespace_only = false;
                }
                self.advance();
            }

            if !whitespace_only {
                end = self.position();
                let line = self.slice(segment_start, end.offset);
                let line = line.trim_end_matches('\r');
                match literal.as_mut() {
                    Some(text) => {
                        text.push('\n');
                        text.push_str(line);
                    }
                    None => literal = Some(line.to_string()),
                }
            }

            if self.is_at_end() || whitespace_only {
                // Consume the blank line's break.
                self.advance();
                return self.make_token(kind, literal.unwrap_or_default(), start, end);
            }

            self.advance();
            segment_start = self.cursor.offset;
        }
    }

    /// Read a comment, merging following lines that also start with `#`.
    fn read_comment(&mut self) -> Token {
        let start = self.position();
        let mut literal = String::new();

        loop {
            self.advance(); // consume `#`
            let segment_start = self.cursor.offset;

            while !self.is_at_end() && self.cursor.ch != '\n' {
                self.advance();
            }

            let end = self.position();
            literal.push_str(self.slice(segment_start, end.offset).trim_end_matches('\r'));

            if !self.next_line_starts_with('#') {
                return self.make_token(TokenKind::Comment, literal, start, end);
            }
            literal.push('\n');
        }
    }

    /// Step over the current line break and indentation. Succeeds if the
    /// next line starts with `expected`; otherwise the cursor is restored.
    fn next_line_starts_with(&mut self, expected: char) -> bool {
        if self.is_at_end() {
            return false;
        }

        let saved = self.cursor;
        self.advance(); // consume `\n`
        self.skip_whitespace();

        if !self.is_at_end() && self.cursor.ch == expected {
            return true;
        }

        self.cursor = saved;
        false
    }

    /// Confirm an `@keyword` at the cursor. Restores the cursor if the word
    /// is not a block keyword.
    fn try_block_keyword(&mut self) -> Option<Token> {
        let saved = self.cursor;
        let start = self.position();
        self.advance(); // consume `@`

        while is_ident_continue(self.cursor.ch) {
            self.advance();
        }

        let word = self.slice(start.offset, self.cursor.offset);
        match token::lookup_block_keyword(&word) {
            Some(kind) => {
                debug!(target: "policyscript::lexer", keyword = %kind, %start, "block keyword");
                self.mode = ScannerMode::BlockInit;
                self.expect_type_name = kind == TokenKind::Define;
                self.open_block = Some((kind, start));
                Some(self.make_token(kind, word, start, self.position()))
            }
            None => {
                self.cursor = saved;
                None
            }
        }
    }

    // =========================================================================
    // Block-init mode
    // =========================================================================

    fn block_init_token(&mut self) -> Token {
        self.skip_whitespace();

        if !self.is_at_end() && self.cursor.ch == '{' {
            self.mode = ScannerMode::Block;
            self.block_depth = 1;
            self.expect_type_name = false;
            self.terminator_pending = false;
            debug!(target: "policyscript::lexer", "entering block mode");
            return self.single(TokenKind::LBrace);
        }

        if self.expect_type_name && is_ident_start(self.cursor.ch) {
            self.expect_type_name = false;
            return self.read_word(|_| TokenKind::Ident);
        }

        debug!(
            target: "policyscript::lexer",
            position = %self.position(),
            "block keyword not followed by `{{`, back to document mode"
        );
        self.mode = ScannerMode::Document;
        self.expect_type_name = false;
        self.open_block = None;
        self.document_token()
    }

    // =========================================================================
    // Block mode
    // =========================================================================

    fn block_token(&mut self) -> Token {
        if let Some(terminator) = self.skip_block_whitespace() {
            return terminator;
        }

        if self.is_at_end() {
            if let Some((keyword, position)) = self.open_block.take() {
                self.report(LexErrorKind::UnterminatedBlock(keyword), position);
                self.mode = ScannerMode::Document;
                self.block_depth = 0;
            }
            self.terminator_pending = false;
            return self.eof_token();
        }

        let ch = self.cursor.ch;
        let token = match ch {
            // Comments neither arm nor disarm the terminator.
            '#' => return self.read_comment(),

            '!' if self.peek() == '=' => self.double(TokenKind::NotEq),
            '<' if self.peek() == '=' => self.double(TokenKind::LtEq),
            '>' if self.peek() == '=' => self.double(TokenKind::GtEq),
            '<' => self.single(TokenKind::Lt),
            '>' => self.single(TokenKind::Gt),
            '=' => self.single(TokenKind::Eq),
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '*' => self.single(TokenKind::Mult),
            '/' => self.single(TokenKind::Div),
            ':' => self.single(TokenKind::Colon),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '{' => {
                self.block_depth += 1;
                self.single(TokenKind::LBrace)
            }
            '}' => self.close_brace(),

            '`' => self.read_text(),
            '|' if self.peek().is_ascii_digit() => self.read_temporal(),

            // Checked before identifiers: `R5` is money, not a name.
            c if token::is_currency_symbol(c) && self.peek().is_ascii_digit() => {
                self.read_number(true)
            }
            c if c.is_ascii_digit() => self.read_number(false),
            c if is_ident_start(c) => self.read_word(token::lookup_ident),

            c => {
                let start = self.position();
                self.advance();
                self.report(LexErrorKind::IllegalCharacter(c), start);
                self.make_token(TokenKind::Illegal, c.to_string(), start, self.position())
            }
        };

        self.terminator_pending = self.mode == ScannerMode::Block && token.kind.ends_statement();
        token
    }

    /// Skip whitespace and line breaks. Crossing a break while a statement
    /// is pending yields the synthetic `;` instead.
    fn skip_block_whitespace(&mut self) -> Option<Token> {
        while !self.is_at_end() {
            match self.cursor.ch {
                '\n' if self.terminator_pending => {
                    let start = self.position();
                    self.advance();
                    self.terminator_pending = false;
                    if self.is_at_end() {
                        return None;
                    }
                    return Some(self.make_token(
                        TokenKind::Semicolon,
                        "\n",
                        start,
                        self.position(),
                    ));
                }
                c if is_whitespace(c) || c == '\n' => self.advance(),
                _ => break,
            }
        }
        None
    }

    fn close_brace(&mut self) -> Token {
        let token = self.single(TokenKind::RBrace);
        self.block_depth = self.block_depth.saturating_sub(1);

        if self.block_depth == 0 && self.open_block.is_some() {
            self.open_block = None;
            self.mode = ScannerMode::Document;
            debug!(target: "policyscript::lexer", "leaving block mode");
        }
        token
    }

    /// Scan backtick-delimited text. Newlines are kept verbatim.
    fn read_text(&mut self) -> Token {
        let start = self.position();
        self.advance(); // consume opening backtick
        let content_start = self.cursor.offset;

        while !self.is_at_end() && self.cursor.ch != '`' {
            self.advance();
        }

        let literal = self.slice(content_start, self.cursor.offset);
        if self.is_at_end() {
            self.report(LexErrorKind::UnterminatedText, start);
        } else {
            self.advance(); // consume closing backtick
        }

        self.make_token(TokenKind::Text, literal, start, self.position())
    }

    /// Scan a number and its optional suffix: `%`, a period unit, or (with a
    /// leading currency symbol) nothing at all.
    fn read_number(&mut self, money: bool) -> Token {
        let start = self.position();
        let mut literal = String::new();

        if money {
            literal.push(self.cursor.ch);
            self.advance();
        }

        self.read_digits(&mut literal);

        let mut kind = TokenKind::Integer;
        if self.cursor.ch == '.' && self.peek().is_ascii_digit() {
            kind = TokenKind::Decimal;
            literal.push('.');
            self.advance();
            while self.cursor.ch.is_ascii_digit() {
                literal.push(self.cursor.ch);
                self.advance();
            }
        }

        if money {
            return self.make_token(TokenKind::Money, literal, start, self.position());
        }

        if self.cursor.ch == '%' {
            self.advance();
            return self.make_token(TokenKind::Percent, literal, start, self.position());
        }

        if kind == TokenKind::Integer {
            if let Some(unit) = self.sniff_period_unit() {
                literal.push(' ');
                literal.push_str(&unit);
                return self.make_token(TokenKind::Period, literal, start, self.position());
            }
        }

        self.make_token(kind, literal, start, self.position())
    }

    /// Digits with `_` group separators. A separator must sit between digits.
    fn read_digits(&mut self, literal: &mut String) {
        loop {
            let c = self.cursor.ch;
            if c.is_ascii_digit() {
                literal.push(c);
                self.advance();
            } else if c == '_' && self.peek().is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Look for a period unit word after an integer, on the same line.
    /// Restores the cursor if the next word is not a unit.
    fn sniff_period_unit(&mut self) -> Option<String> {
        let saved = self.cursor;
        self.skip_whitespace();

        if is_ident_start(self.cursor.ch) {
            let word_start = self.cursor.offset;
            while is_ident_continue(self.cursor.ch) {
                self.advance();
            }
            let word = self.slice(word_start, self.cursor.offset);
            if token::is_period_unit(&word) {
                return Some(word);
            }
        }

        self.cursor = saved;
        None
    }

    /// Scan a `|`-fenced date (`|2024/01/15|`) or time (`|10:30|`). The first
    /// separator decides which.
    fn read_temporal(&mut self) -> Token {
        let start = self.position();
        self.advance(); // consume opening `|`
        let content_start = self.cursor.offset;
        let mut separator: Option<char> = None;

        while !self.is_at_end() {
            let c = self.cursor.ch;
            if c.is_ascii_digit() {
                self.advance();
                continue;
            }
            match separator {
                None if c == '/' || c == ':' => {
                    separator = Some(c);
                    self.advance();
                }
                Some(sep) if c == sep => self.advance(),
                _ => break,
            }
        }

        let kind = match separator {
            Some(':') => TokenKind::Time,
            _ => TokenKind::Date,
        };
        let literal = self.slice(content_start, self.cursor.offset);

        if !self.is_at_end() && self.cursor.ch == '|' {
            self.advance();
        } else {
            self.report(LexErrorKind::UnterminatedTemporalLiteral(kind), start);
        }

        self.make_token(kind, literal, start, self.position())
    }

    /// Scan an identifier-shaped word and let `classify` pick its kind.
    fn read_word(&mut self, classify: fn(&str) -> TokenKind) -> Token {
        let start = self.position();

        while is_ident_continue(self.cursor.ch) {
            self.advance();
        }

        let word = self.slice(start.offset, self.cursor.offset);
        let kind = classify(&word);
        self.make_token(kind, word, start, self.position())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Skip blank lines, returning the start of the first non-blank line.
    fn skip_whitespace_and_breaks(&mut self) -> Position {
        let mut line_start = self.position();
        loop {
            self.skip_whitespace();
            if !self.is_at_end() && self.cursor.ch == '\n' {
                self.advance();
                line_start = self.position();
            } else {
                return line_start;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && is_whitespace(self.cursor.ch) {
            self.advance();
        }
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let start = self.position();
        let literal = self.cursor.ch.to_string();
        self.advance();
        self.make_token(kind, literal, start, self.position())
    }

    fn double(&mut self, kind: TokenKind) -> Token {
        let start = self.position();
        self.advance();
        self.advance();
        let literal = self.slice(start.offset, self.cursor.offset);
        self.make_token(kind, literal, start, self.position())
    }

    fn eof_token(&self) -> Token {
        let position = self.position();
        self.make_token(TokenKind::Eof, String::new(), position, position)
    }

    fn make_token(
        &self,
        kind: TokenKind,
        literal: impl Into<String>,
        start: Position,
        end: Position,
    ) -> Token {
        Token::new(kind, literal, Range::new(start, end))
    }

    fn report(&mut self, kind: LexErrorKind, position: Position) {
        let error = LexerError::new(kind, position);
        debug!(target: "policyscript::lexer", %error, "lexical error");
        if let Some(handler) = self.on_error.as_mut() {
            handler(&error.kind.to_string(), position);
        }
        self.errors.push(error);
    }

    fn position(&self) -> Position {
        Position::new(self.cursor.line, self.cursor.column, self.cursor.offset)
    }

    fn slice(&self, from: usize, to: usize) -> String {
        self.chars[from..to].iter().collect()
    }

    fn peek(&self) -> char {
        self.chars.get(self.cursor.offset + 1).copied().unwrap_or('\0')
    }

    fn advance(&mut self) {
        if self.is_at_end() {
            return;
        }
        if self.cursor.ch == '\n' {
            self.cursor.line += 1;
            self.cursor.column = 0;
        } else {
            self.cursor.column += 1;
        }
        self.cursor.offset += 1;
        self.cursor.ch = self.chars.get(self.cursor.offset).copied().unwrap_or('\0');
    }

    fn is_at_end(&self) -> bool {
        self.cursor.offset >= self.chars.len()
    }
}

fn is_whitespace(ch: char) -> bool {
    ch == ' ' || ch == '\t' || ch == '\r'
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
