// Statement Splitter - stateful lexical scan of a SQL script
//
// Divides a script into executable statements on `;`, ignoring semicolons
// inside string literals, quoted identifiers and comments. No SQL parsing.

use super::statement::Statement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Single,
    Double,
    Backtick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comment {
    Line,
    Block,
}

/// Running context carried across characters and lines
///
/// One `Option` per group: at most one quote and at most one comment can be
/// open at any time.
#[derive(Debug, Default)]
struct ScanState {
    quote: Option<Quote>,
    comment: Option<Comment>,
}

impl ScanState {
    /// Open `kind`, close it if it is the open quote, ignore it inside another quote
    fn toggle_quote(&mut self, kind: Quote) {
        match self.quote {
            None => self.quote = Some(kind),
            Some(open) if open == kind => self.quote = None,
            Some(_) => {}
        }
    }
}

/// Text of the statement currently being scanned
#[derive(Debug, Default)]
struct StatementBuffer {
    text: String,
    // Set once a non-whitespace character outside a comment is pushed
    has_code: bool,
}

impl StatementBuffer {
    fn push_code(&mut self, ch: char) {
        if !ch.is_whitespace() {
            self.has_code = true;
        }
        self.text.push(ch);
    }

    fn push_comment(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn push_comment_char(&mut self, ch: char) {
        self.text.push(ch);
    }

    /// Emit the buffered statement (if it holds any code) and reset
    fn flush(&mut self, out: &mut Vec<Statement>) {
        if self.has_code {
            if let Some(statement) = Statement::new(&self.text) {
                out.push(statement);
            }
        }
        self.text.clear();
        self.has_code = false;
    }
}

/// Split a SQL script into its statements, in source order
///
/// Rules:
/// - `;` outside quotes and comments terminates a statement and is dropped
/// - `'`, `"` and `` ` `` open/close quoted regions; a `'` or `"` directly
///   after a backslash does not
/// - `--` comments run to end of line, `/* */` comments may span lines;
///   comment text stays inside the surrounding statement verbatim
/// - chunks holding only whitespace or comments produce nothing
/// - a trailing statement without `;` is still emitted
/// - unterminated quotes or comments never fail; the rest of the script
///   ends up in the last statement
///
/// # Example
/// ```
/// use sqlwatch_core::domain::split_statements;
///
/// let statements = split_statements("INSERT INTO t VALUES ('a;b'); SELECT 1;");
/// assert_eq!(statements.len(), 2);
/// assert_eq!(statements[0], "INSERT INTO t VALUES ('a;b')");
/// ```
pub fn split_statements(script: &str) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut state = ScanState::default();
    let mut buffer = StatementBuffer::default();

    for line in script.split('\n') {
        scan_line(line, &mut state, &mut buffer, &mut statements);

        if state.comment == Some(Comment::Line) {
            state.comment = None;
        }
        buffer.push_comment_char('\n');
    }

    buffer.flush(&mut statements);
    statements
}

fn scan_line(
    line: &str,
    state: &mut ScanState,
    buffer: &mut StatementBuffer,
    out: &mut Vec<Statement>,
) {
    let mut chars = line.char_indices().peekable();
    let mut prev: Option<char> = None;

    while let Some((pos, ch)) = chars.next() {
        let next = chars.peek().map(|&(_, c)| c);

        // Line comment swallows the rest of the line
        if state.quote.is_none()
            && state.comment != Some(Comment::Block)
            && ch == '-'
            && next == Some('-')
        {
            state.comment = Some(Comment::Line);
            buffer.push_comment(&line[pos..]);
            return;
        }

        if state.quote.is_none()
            && state.comment != Some(Comment::Line)
            && ch == '/'
            && next == Some('*')
        {
            state.comment = Some(Comment::Block);
            buffer.push_comment("/*");
            chars.next();
            prev = Some('*');
            continue;
        }

        if state.comment.is_some() {
            buffer.push_comment_char(ch);
            prev = Some(ch);
            if state.comment == Some(Comment::Block) && ch == '*' && next == Some('/') {
                chars.next();
                buffer.push_comment_char('/');
                state.comment = None;
                prev = Some('/');
            }
            continue;
        }

        let escaped = prev == Some('\\');
        prev = Some(ch);

        match ch {
            '\'' if !escaped => state.toggle_quote(Quote::Single),
            '"' if !escaped => state.toggle_quote(Quote::Double),
            '`' => state.toggle_quote(Quote::Backtick),
            ';' if state.quote.is_none() => {
                buffer.flush(out);
                continue;
            }
            _ => {}
        }
        buffer.push_code(ch);
    }
}
