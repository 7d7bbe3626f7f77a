use crate::lexer::{Lexer, Token};

/// The lexer plus a pushback stack, giving the parser as much lookahead as it
/// has tokens to hand back.
pub struct TokenStream {
    lexer: Lexer,
    pushed_back: Vec<Token>,
}

impl TokenStream {
    pub fn new(source: &str) -> Self {
        Self {
            lexer: Lexer::new(source),
            pushed_back: Vec::new(),
        }
    }

    /// Most recently pushed-back token first, then fresh tokens from the lexer.
    pub fn get(&mut self) -> Token {
        match self.pushed_back.pop() {
            Some(token) => token,
            None => self.lexer.next_token(),
        }
    }

    pub fn put_back(&mut self, token: Token) {
        tracing::trace!(kind = ?token.kind, depth = self.pushed_back.len() + 1, "put back");
        self.pushed_back.push(token);
    }

    /// Number of tokens waiting to be re-read.
    pub fn pending(&self) -> usize {
        self.pushed_back.len()
    }

    pub fn line(&self) -> usize {
        self.lexer.line()
    }
}
