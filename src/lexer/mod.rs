use crate::lexer::cursor::Cursor;
use crate::span::{Span, SrcOffset};

pub mod cursor;

/// A 'light' token that only carries basic and easily derivable info
#[derive(Debug)]
pub struct LToken {
    pub kind: LTokenKind,
    pub len: usize,
}

impl LToken {
    pub fn new(kind: LTokenKind, len: usize) -> Self {
        LToken { kind, len }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LTokenKind {
    /// Any run of characters that is not whitespace or a comment
    Word,
    /// `//` up to the end of the line
    Comment,
    Whitespace,
    Newline,
    Eof,
}

#[cfg(test)]
fn tokenize(input: &str) -> impl Iterator<Item = LToken> + '_ {
    let mut cursor = Cursor::new(input);
    std::iter::from_fn(move || {
        let token = cursor.advance_token();
        if token.kind != LTokenKind::Eof {
            Some(token)
        } else {
            None
        }
    })
}

/// Test if a character is considered to be whitespace. Newlines are significant and excluded.
pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\x0b' | '\x0c')
}

impl Cursor<'_> {
    pub fn advance_token(&mut self) -> LToken {
        let first_char = match self.bump() {
            Some(c) => c,
            None => return LToken::new(LTokenKind::Eof, 0),
        };
        let token_kind = match first_char {
            '/' if self.first() == '/' => {
                self.take_while(|c| c != '\n');
                LTokenKind::Comment
            }
            '\n' => LTokenKind::Newline,
            c if is_whitespace(c) => {
                self.take_while(is_whitespace);
                LTokenKind::Whitespace
            }
            _ => {
                self.eat_word();
                LTokenKind::Word
            }
        };
        let res = LToken::new(token_kind, self.pos_in_token());
        self.reset_pos();
        res
    }

    fn eat_word(&mut self) {
        while !self.is_eof() {
            let c = self.first();
            if c == '\n' || is_whitespace(c) || (c == '/' && self.second() == '/') {
                break;
            }
            self.bump();
        }
    }
}

/// Single whitespace-delimited word of a source line.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Word<'a> {
    pub text: &'a str,
    pub span: Span,
}

/// A source line that contains at least one word once comments are removed.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Line<'a> {
    /// 1-based line number
    pub number: usize,
    pub words: Vec<Word<'a>>,
}

impl<'a> Line<'a> {
    /// Span from the first to the last word on the line.
    pub fn span(&self) -> Span {
        match (self.words.first(), self.words.last()) {
            (Some(first), Some(last)) => first.span.join(last.span),
            _ => Span::dummy(),
        }
    }

    /// Words of the line with whitespace removed between them.
    pub fn joined(&self) -> String {
        self.words.iter().map(|word| word.text).collect()
    }
}

/// Iterator over the meaningful lines of a source. Blank and comment-only lines are skipped.
pub struct Lines<'a> {
    src: &'a str,
    cursor: Cursor<'a>,
    offs: usize,
    number: usize,
    done: bool,
}

pub fn lines(src: &str) -> Lines<'_> {
    Lines {
        src,
        cursor: Cursor::new(src),
        offs: 0,
        number: 1,
        done: false,
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut words = Vec::new();
        while !self.done {
            let tok = self.cursor.advance_token();
            let start = self.offs;
            self.offs += tok.len;
            match tok.kind {
                LTokenKind::Word => words.push(Word {
                    text: &self.src[start..self.offs],
                    span: Span::new(SrcOffset(start), tok.len),
                }),
                LTokenKind::Comment | LTokenKind::Whitespace => {}
                LTokenKind::Newline | LTokenKind::Eof => {
                    let number = self.number;
                    if tok.kind == LTokenKind::Eof {
                        self.done = true;
                    } else {
                        self.number += 1;
                    }
                    if !words.is_empty() {
                        return Some(Line { number, words });
                    }
                }
            }
        }
        None
    }
}
