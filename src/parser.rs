//! 搜索表达式的语法分析器
//!
//! ## 语法（优先级从低到高）
//!
//! ```text
//! expression := or
//! or         := and ( "or" and )*
//! and        := unary ( ("and")? unary )*     // 显式 and 与并列隐式 and 等价
//! unary      := "not" primary | primary
//! primary    := 型号原子                       -> Query(_model, _=, <型号>)
//!             | 配置原子                       -> Query(<配置>, _isnull, _isnull)
//!             | 状态词 [ 比较符 日期时间        -> Query(状态, 比较符, 日期时间)
//!                      | "by" 字面量           -> Query(状态, by, 用户名) ]
//!                                              // 裸状态词 -> Query(状态, _isnull, _isnull)
//!             | "(" expression ")"            -> Grouping(内部表达式)
//! ```
//!
//! 单 token 前瞻的递归下降, 无回溯; 隐式 and 在语法层合成
//! （lexeme 为 `_and`）, token 流本身保持统一。
//!
//! ## 解析示例
//!
//! ```text
//! // 型号与状态
//! h1 and submitted
//!
//! // 并列即隐式 and
//! h1 submitted
//!
//! // 归属查询与分组
//! (h1 or h2) and submitted by admin
//!
//! // 时间比较
//! uplinked >= 2023-01-01T00:00:00Z
//! ```

use crate::ast::Expr;
use crate::token::{Span, Token, TokenKind};

/// 括号嵌套深度上限, 限制递归深度
pub const MAX_GROUP_DEPTH: usize = 32;

pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    position: usize,
    /// 当前括号嵌套深度
    depth: usize,
    max_depth: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Option<Span>,
}

impl ParseError {
    pub fn new(message: String, span: Option<Span>) -> Self {
        Self { message, span }
    }

    pub fn at_position(message: String, span: Span) -> Self {
        Self {
            message,
            span: Some(span),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.span {
            Some(span) => write!(f, "{} (at {}-{})", self.message, span.start, span.end),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        Self::with_depth_limit(tokens, MAX_GROUP_DEPTH)
    }

    pub fn with_depth_limit(tokens: &'a [Token<'a>], max_depth: usize) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
            max_depth,
        }
    }

    /// 解析整个 token 流, 返回一棵表达式树
    pub fn parse(&mut self) -> Result<Expr<'a>, ParseError> {
        self.expression()
    }

    fn expression(&mut self) -> Result<Expr<'a>, ParseError> {
        self.or()
    }

    fn or(&mut self) -> Result<Expr<'a>, ParseError> {
        let mut expr = self.and()?;

        while let Some(operator) = self.match_kinds(&[TokenKind::Or]) {
            let right = self.and()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr<'a>, ParseError> {
        let mut expr = self.unary()?;

        // 显式 and 之外, 两个并列的条件也按 and 连接
        loop {
            let operator = if let Some(operator) = self.match_kinds(&[TokenKind::And]) {
                operator
            } else if !self.at_end() && !self.check(&[TokenKind::Or, TokenKind::RParen]) {
                // 合成隐式 and 运算符
                Token {
                    kind: TokenKind::And,
                    lexeme: "_and",
                    span: self.peek().span,
                }
            } else {
                break;
            };

            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr<'a>, ParseError> {
        if let Some(operator) = self.match_kinds(&[TokenKind::Not]) {
            let operand = self.primary()?;
            return Ok(Expr::Unary {
                operator,
                operand: Box::new(operand),
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr<'a>, ParseError> {
        if let Some(model) = self.match_where(TokenKind::is_model_atom) {
            return Ok(Expr::Query {
                key: Token {
                    kind: TokenKind::Model,
                    lexeme: "_model",
                    span: model.span,
                },
                operator: Token {
                    kind: TokenKind::Eq,
                    lexeme: "_=",
                    span: model.span,
                },
                value: model,
            });
        }

        if let Some(config) = self.match_where(TokenKind::is_config_atom) {
            let isnull = Token {
                kind: TokenKind::IsNull,
                lexeme: "_isnull",
                span: config.span,
            };
            return Ok(Expr::Query {
                key: config,
                operator: isnull,
                value: isnull,
            });
        }

        if let Some(noun) = self.match_where(TokenKind::is_status_word) {
            if let Some(comparator) = self.match_where(TokenKind::is_comparator) {
                if let Some(datetime) = self.match_kinds(&[TokenKind::Datetime]) {
                    return Ok(Expr::Query {
                        key: noun,
                        operator: comparator,
                        value: datetime,
                    });
                }
                return Err(ParseError::at_position(
                    format!(
                        "A valid datetime is expected after '{} {}'",
                        noun.lexeme, comparator.lexeme
                    ),
                    self.peek().span,
                ));
            }

            if let Some(by) = self.match_kinds(&[TokenKind::By]) {
                if let Some(username) = self.match_kinds(&[TokenKind::Literal]) {
                    return Ok(Expr::Query {
                        key: noun,
                        operator: by,
                        value: username,
                    });
                }
                return Err(ParseError::at_position(
                    format!(
                        "An username is expected after '{} {}'",
                        noun.lexeme, by.lexeme
                    ),
                    self.peek().span,
                ));
            }

            // 裸状态词查询对应的标志位
            let isnull = Token {
                kind: TokenKind::IsNull,
                lexeme: "_isnull",
                span: noun.span,
            };
            return Ok(Expr::Query {
                key: noun,
                operator: isnull,
                value: isnull,
            });
        }

        if let Some(open) = self.match_kinds(&[TokenKind::LParen]) {
            self.depth += 1;
            if self.depth > self.max_depth {
                return Err(ParseError::at_position(
                    format!("Grouping nested deeper than {} levels", self.max_depth),
                    open.span,
                ));
            }
            let inner = self.expression()?;
            self.expect(TokenKind::RParen, "Expected ')' after expression")?;
            self.depth -= 1;
            return Ok(Expr::Grouping(Box::new(inner)));
        }

        Err(ParseError::at_position(
            format!("An expression cannot start with '{}'", self.peek().lexeme),
            self.peek().span,
        ))
    }

    /// 返回当前 token，不推进位置
    fn peek(&self) -> Token<'a> {
        self.tokens
            .get(self.position)
            .copied()
            .unwrap_or(Token::EOF)
    }

    /// 返回当前 token 并推进位置
    fn advance(&mut self) -> Token<'a> {
        let token = self.peek();
        if !self.at_end() {
            self.position += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// 检查当前 token 是否匹配给定类型之一, 不消费; 在末尾时返回 false
    fn check(&self, kinds: &[TokenKind]) -> bool {
        !self.at_end() && kinds.contains(&self.peek().kind)
    }

    /// 匹配给定类型之一并消费 token
    fn match_kinds(&mut self, kinds: &[TokenKind]) -> Option<Token<'a>> {
        if self.check(kinds) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// 按谓词匹配并消费 token
    fn match_where(&mut self, accept: fn(TokenKind) -> bool) -> Option<Token<'a>> {
        let token = self.peek();
        if token.kind != TokenKind::Eof && accept(token.kind) {
            self.position += 1;
            Some(token)
        } else {
            None
        }
    }

    /// 期望特定类型的 token 并消费，否则返回错误
    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token<'a>, ParseError> {
        if self.check(&[kind]) {
            Ok(self.advance())
        } else {
            Err(ParseError::at_position(
                message.to_string(),
                self.peek().span,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;

    fn parse_string(input: &str) -> Result<(), ParseError> {
        let tokens = lexer::scan(input);
        Parser::new(&tokens).parse().map(|_| ())
    }

    fn printed(input: &str) -> String {
        let tokens = lexer::scan(input);
        Parser::new(&tokens).parse().unwrap().print()
    }

    #[test]
    fn test_model_atom() {
        assert_eq!(printed("h1"), "Query(_model, _=, h1)");
        assert_eq!(printed("H4"), "Query(_model, _=, H4)");
    }

    #[test]
    fn test_config_atom() {
        assert_eq!(printed("acq"), "Query(acq, _isnull, _isnull)");
        assert_eq!(printed("liktrg"), "Query(liktrg, _isnull, _isnull)");
    }

    #[test]
    fn test_bare_status_word() {
        assert_eq!(printed("submitted"), "Query(submitted, _isnull, _isnull)");
        assert_eq!(printed("uplinked"), "Query(uplinked, _isnull, _isnull)");
    }

    #[test]
    fn test_attribution_query() {
        assert_eq!(printed("submitted by admin"), "Query(submitted, by, admin)");
        assert_eq!(printed("uplinked by testuser"), "Query(uplinked, by, testuser)");
    }

    #[test]
    fn test_datetime_comparison() {
        assert_eq!(
            printed("submitted > 2023-01-01"),
            "Query(submitted, >, 2023-01-01)"
        );
        assert_eq!(
            printed("uplinked <= 2023-01-01T10:30:45Z"),
            "Query(uplinked, <=, 2023-01-01T10:30:45Z)"
        );
    }

    #[test]
    fn test_explicit_and() {
        assert_eq!(
            printed("h1 and submitted"),
            "Binary(Query(_model, _=, h1), and, Query(submitted, _isnull, _isnull))"
        );
    }

    #[test]
    fn test_implicit_and_is_synthesized() {
        assert_eq!(
            printed("h1 submitted"),
            "Binary(Query(_model, _=, h1), _and, Query(submitted, _isnull, _isnull))"
        );
    }

    #[test]
    fn test_or_expression() {
        assert_eq!(
            printed("h1 or h2"),
            "Binary(Query(_model, _=, h1), or, Query(_model, _=, h2))"
        );
    }

    #[test]
    fn test_not_expression() {
        assert_eq!(
            printed("not uplinked"),
            "Unary(not, Query(uplinked, _isnull, _isnull))"
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        assert_eq!(
            printed("h1 or h2 and uplinked"),
            "Binary(Query(_model, _=, h1), or, \
             Binary(Query(_model, _=, h2), and, Query(uplinked, _isnull, _isnull)))"
        );
    }

    #[test]
    fn test_grouping_overrides_precedence() {
        assert_eq!(
            printed("(h1 or h2) and uplinked"),
            "Binary(Grouping(Binary(Query(_model, _=, h1), or, Query(_model, _=, h2))), \
             and, Query(uplinked, _isnull, _isnull))"
        );
        assert_eq!(
            printed("h1 or (h2 and uplinked)"),
            "Binary(Query(_model, _=, h1), or, \
             Grouping(Binary(Query(_model, _=, h2), and, Query(uplinked, _isnull, _isnull))))"
        );
    }

    #[test]
    fn test_dangling_comparator_is_error() {
        let err = parse_string("submitted >").unwrap_err();
        assert!(err.message.contains("datetime"), "got: {}", err.message);

        let err = parse_string("submitted > baddate").unwrap_err();
        assert!(err.message.contains("datetime"), "got: {}", err.message);
    }

    #[test]
    fn test_by_without_username_is_error() {
        let err = parse_string("submitted by").unwrap_err();
        assert!(err.message.contains("username"), "got: {}", err.message);

        // a reserved word is not a username literal
        assert!(parse_string("submitted by and").is_err());
    }

    #[test]
    fn test_unclosed_paren_is_error() {
        let err = parse_string("(h1").unwrap_err();
        assert_eq!(err.message, "Expected ')' after expression");
    }

    #[test]
    fn test_bad_primary_start_is_error() {
        let err = parse_string("by admin").unwrap_err();
        assert_eq!(err.message, "An expression cannot start with 'by'");

        let err = parse_string("").unwrap_err();
        assert_eq!(err.message, "An expression cannot start with ''");

        // numeric-id search is not part of the grammar
        let err = parse_string("id = 42").unwrap_err();
        assert_eq!(err.message, "An expression cannot start with 'id'");
    }

    #[test]
    fn test_double_not_is_error() {
        assert!(parse_string("not not h1").is_err());
    }

    #[test]
    fn test_group_depth_is_capped() {
        let deep = |n: usize| format!("{}h1{}", "(".repeat(n), ")".repeat(n));

        let input = deep(2);
        let tokens = lexer::scan(&input);
        assert!(Parser::with_depth_limit(&tokens, 2).parse().is_ok());

        let input = deep(3);
        let tokens = lexer::scan(&input);
        let err = Parser::with_depth_limit(&tokens, 2).parse().unwrap_err();
        assert!(err.message.contains("nested deeper"), "got: {}", err.message);

        // the default limit handles realistic nesting
        assert!(parse_string(&deep(MAX_GROUP_DEPTH)).is_ok());
        assert!(parse_string(&deep(MAX_GROUP_DEPTH + 1)).is_err());
    }

    #[test]
    fn test_error_carries_span() {
        let err = parse_string("h1 and ^oops").unwrap_err();
        assert_eq!(err.span, Some(Span::new(7, 12)));
    }
}
