//! 搜索语言的词法分析器

use crate::token::{Span, Token, TokenKind};

/// 五种日期时间字面量形状, 按长度从长到短排列
/// `#` 匹配一个 ASCII 数字, 其余字符逐字匹配
const DATETIME_SHAPES: [&str; 5] = [
    "####-##-##T##:##:##Z",
    "####-##-##T##:##:##",
    "####-##-##T##:##Z",
    "####-##-##T##:##",
    "####-##-##",
];

pub struct Lexer<'a> {
    input: &'a str,
    /// 输入字符串中的当前位置（字节索引）
    position: usize,
}

/// 扫描整个输入, 返回以 Eof 结尾的 token 序列
pub fn scan(input: &str) -> Vec<Token<'_>> {
    let mut tokens: Vec<_> = Lexer::new(input).collect();
    tokens.push(Token {
        kind: TokenKind::Eof,
        lexeme: "",
        span: Span::new(input.len(), input.len()),
    });
    tokens
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    /// 返回当前位置的字符，不推进位置
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// 推进位置一个字符并返回该字符
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    /// 跳过空白字符
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// 组装一个从 start 到当前位置的 token
    fn token_at(&self, kind: TokenKind, start: usize) -> Token<'a> {
        Token {
            kind,
            lexeme: &self.input[start..self.position],
            span: Span::new(start, self.position),
        }
    }

    /// 尝试从 start 处匹配一个日期时间字面量, 最长形状优先
    /// 匹配成功时消费整个跨度; 失败时不消费额外字符
    fn read_datetime(&mut self, start: usize) -> Option<Token<'a>> {
        for shape in DATETIME_SHAPES {
            let end = start + shape.len();
            if end > self.input.len() {
                continue;
            }
            let candidate = &self.input.as_bytes()[start..end];
            let matched = candidate.iter().zip(shape.bytes()).all(|(&c, s)| {
                if s == b'#' {
                    c.is_ascii_digit()
                } else {
                    c == s
                }
            });
            if matched {
                self.position = end;
                return Some(self.token_at(TokenKind::Datetime, start));
            }
        }
        None
    }

    /// 读取字面量或保留字
    /// 首字符之后可以包含字母、数字、下划线和点号
    fn read_word(&mut self, start: usize) -> Token<'a> {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                self.bump();
            } else {
                break;
            }
        }
        let literal = &self.input[start..self.position];
        let kind = match_keyword(literal);
        Token {
            kind,
            lexeme: literal,
            span: Span::new(start, self.position),
        }
    }
}

/// 保留字表, 大小写不敏感; 未命中的串降级为普通字面量（如用户名）
fn match_keyword(s: &str) -> TokenKind {
    match s.to_ascii_lowercase().as_str() {
        "h1" => TokenKind::ModelH1,
        "h2" => TokenKind::ModelH2,
        "h3" => TokenKind::ModelH3,
        "h4" => TokenKind::ModelH4,
        "h5" => TokenKind::ModelH5,
        "h6" => TokenKind::ModelH6,
        "acq" => TokenKind::ConfigAcq,
        "acq0" => TokenKind::ConfigAcq0,
        "asic0" => TokenKind::ConfigAsic0,
        "asic1" => TokenKind::ConfigAsic1,
        "bee" => TokenKind::ConfigBee,
        "liktrg" => TokenKind::ConfigLiktrg,
        "obs" => TokenKind::ConfigObs,
        "submitted" => TokenKind::Submitted,
        "uplinked" => TokenKind::Uplinked,
        "by" => TokenKind::By,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        _ => TokenKind::Literal,
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.skip_whitespace();
            let start = self.position;

            let c = self.bump()?;

            let token = match c {
                '=' => self.token_at(TokenKind::Eq, start),
                '(' => self.token_at(TokenKind::LParen, start),
                ')' => self.token_at(TokenKind::RParen, start),
                '>' => {
                    if self.peek() == Some('=') {
                        self.bump();
                        self.token_at(TokenKind::Gte, start)
                    } else {
                        self.token_at(TokenKind::Gt, start)
                    }
                }
                '<' => {
                    if self.peek() == Some('=') {
                        self.bump();
                        self.token_at(TokenKind::Lte, start)
                    } else {
                        self.token_at(TokenKind::Lt, start)
                    }
                }
                '!' => {
                    if self.peek() == Some('=') {
                        self.bump();
                        self.token_at(TokenKind::NotEq, start)
                    } else {
                        // 裸 '!' 等价于 not 关键字
                        self.token_at(TokenKind::Not, start)
                    }
                }
                c if c.is_ascii_digit() => {
                    match self.read_datetime(start) {
                        Some(token) => token,
                        // 不构成日期时间的数字被丢弃, 不产生 token
                        None => continue,
                    }
                }
                _ => self.read_word(start),
            };
            return Some(token);
        }
    }
}
