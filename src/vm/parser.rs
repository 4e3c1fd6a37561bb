//! Recursive-descent parser for the embedded VM
//!
//! Hand-written with precedence climbing for binary operators, in the same
//! shape as the statement parser elsewhere in this crate's lineage: a token
//! cursor with `peek`/`advance`/`expect` helpers and one method per grammar
//! production. Semicolons are optional statement terminators.

use crate::vm::ast::{AssignOp, BinOp, Expr, Stmt, UnOp};
use crate::vm::error::VmError;
use crate::vm::lexer::{tokenize, Tok, Token};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, VmError> {
        Ok(Parser {
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    pub fn parse_program(&mut self) -> Result<Vec<Stmt>, VmError> {
        let mut stmts = Vec::new();
        while !self.check(&Tok::Eof) {
            stmts.push(self.statement()?);
        }
        Ok(stmts)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn line(&self) -> usize {
        self.peek().line
    }

    fn check(&self, tok: &Tok) -> bool {
        &self.peek().tok == tok
    }

    fn advance(&mut self) -> Token {
        let t = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.check(tok) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: Tok, what: &str) -> Result<(), VmError> {
        if self.eat(&tok) {
            Ok(())
        } else {
            Err(VmError::Syntax {
                message: format!("expected {} but found {}", what, self.peek().tok),
                line: self.line(),
            })
        }
    }

    fn ident(&mut self, what: &str) -> Result<String, VmError> {
        match self.peek().tok.clone() {
            Tok::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(VmError::Syntax {
                message: format!("expected {} but found {}", what, other),
                line: self.line(),
            }),
        }
    }

    // === Statements ===

    fn statement(&mut self) -> Result<Stmt, VmError> {
        match self.peek().tok {
            Tok::Var | Tok::Let | Tok::Const => self.var_decl(),
            Tok::Function => self.function_decl(),
            Tok::If => self.if_statement(),
            Tok::While => self.while_statement(),
            Tok::For => self.for_statement(),
            Tok::Return => self.return_statement(),
            Tok::Semi => {
                // Empty statement
                self.advance();
                Ok(Stmt::Expr(Expr::Null))
            }
            _ => {
                let expr = self.expression()?;
                self.eat(&Tok::Semi);
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn var_decl(&mut self) -> Result<Stmt, VmError> {
        let line = self.line();
        self.advance(); // var/let/const
        let name = self.ident("variable name")?;
        let init = if self.eat(&Tok::Eq) {
            Some(self.expression()?)
        } else {
            None
        };
        self.eat(&Tok::Semi);
        Ok(Stmt::VarDecl { name, init, line })
    }

    fn function_decl(&mut self) -> Result<Stmt, VmError> {
        self.advance(); // function
        let name = self.ident("function name")?;
        self.expect(Tok::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(&Tok::RParen) {
            loop {
                params.push(self.ident("parameter name")?);
                if !self.eat(&Tok::Comma) {
                    break;
                }
            }
        }
        self.expect(Tok::RParen, "')'")?;
        let body = self.block()?;
        Ok(Stmt::FunctionDecl { name, params, body })
    }

    fn if_statement(&mut self) -> Result<Stmt, VmError> {
        self.advance(); // if
        self.expect(Tok::LParen, "'('")?;
        let cond = self.expression()?;
        self.expect(Tok::RParen, "')'")?;
        let then_body = self.block_or_single()?;
        let else_body = if self.eat(&Tok::Else) {
            if self.check(&Tok::If) {
                Some(vec![self.if_statement()?])
            } else {
                Some(self.block_or_single()?)
            }
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_body,
            else_body,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, VmError> {
        self.advance(); // while
        self.expect(Tok::LParen, "'('")?;
        let cond = self.expression()?;
        self.expect(Tok::RParen, "')'")?;
        let body = self.block_or_single()?;
        Ok(Stmt::While { cond, body })
    }

    fn for_statement(&mut self) -> Result<Stmt, VmError> {
        self.advance(); // for
        self.expect(Tok::LParen, "'('")?;
        let init = if self.check(&Tok::Semi) {
            self.advance();
            None
        } else {
            let stmt = match self.peek().tok {
                Tok::Var | Tok::Let | Tok::Const => self.var_decl()?,
                _ => {
                    let e = self.expression()?;
                    self.eat(&Tok::Semi);
                    Stmt::Expr(e)
                }
            };
            // var_decl consumed its own semicolon when present
            Some(Box::new(stmt))
        };
        let cond = if self.check(&Tok::Semi) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(Tok::Semi, "';'")?;
        let update = if self.check(&Tok::RParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(Tok::RParen, "')'")?;
        let body = self.block_or_single()?;
        Ok(Stmt::For {
            init,
            cond,
            update,
            body,
        })
    }

    fn return_statement(&mut self) -> Result<Stmt, VmError> {
        let line = self.line();
        self.advance(); // return
        let value = if self.check(&Tok::Semi) || self.check(&Tok::RBrace) {
            None
        } else {
            Some(self.expression()?)
        };
        self.eat(&Tok::Semi);
        Ok(Stmt::Return { value, line })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, VmError> {
        self.expect(Tok::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        while !self.check(&Tok::RBrace) && !self.check(&Tok::Eof) {
            stmts.push(self.statement()?);
        }
        self.expect(Tok::RBrace, "'}'")?;
        Ok(stmts)
    }

    fn block_or_single(&mut self) -> Result<Vec<Stmt>, VmError> {
        if self.check(&Tok::LBrace) {
            self.block()
        } else {
            Ok(vec![self.statement()?])
        }
    }

    // === Expressions, by descending precedence ===

    fn expression(&mut self) -> Result<Expr, VmError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, VmError> {
        let expr = self.logical_or()?;
        let op = match self.peek().tok {
            Tok::Eq => Some(AssignOp::Assign),
            Tok::PlusEq => Some(AssignOp::AddAssign),
            Tok::MinusEq => Some(AssignOp::SubAssign),
            Tok::StarEq => Some(AssignOp::MulAssign),
            Tok::SlashEq => Some(AssignOp::DivAssign),
            _ => None,
        };
        if let Some(op) = op {
            let line = self.line();
            if let Expr::Ident { name, .. } = expr {
                self.advance();
                let value = Box::new(self.assignment()?);
                return Ok(Expr::Assign {
                    target: name,
                    op,
                    value,
                    line,
                });
            }
            return Err(VmError::Syntax {
                message: "invalid assignment target".to_string(),
                line,
            });
        }
        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr, VmError> {
        let mut lhs = self.logical_and()?;
        while self.check(&Tok::OrOr) {
            let line = self.line();
            self.advance();
            let rhs = self.logical_and()?;
            lhs = Expr::Binary {
                op: BinOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn logical_and(&mut self) -> Result<Expr, VmError> {
        let mut lhs = self.equality()?;
        while self.check(&Tok::AndAnd) {
            let line = self.line();
            self.advance();
            let rhs = self.equality()?;
            lhs = Expr::Binary {
                op: BinOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Expr, VmError> {
        let mut lhs = self.comparison()?;
        loop {
            let op = match self.peek().tok {
                Tok::EqEq => BinOp::Eq,
                Tok::EqEqEq => BinOp::StrictEq,
                Tok::NotEq => BinOp::Ne,
                Tok::NotEqEq => BinOp::StrictNe,
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.comparison()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr, VmError> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek().tok {
                Tok::Lt => BinOp::Lt,
                Tok::Le => BinOp::Le,
                Tok::Gt => BinOp::Gt,
                Tok::Ge => BinOp::Ge,
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.additive()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr, VmError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek().tok {
                Tok::Plus => BinOp::Add,
                Tok::Minus => BinOp::Sub,
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expr, VmError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek().tok {
                Tok::Star => BinOp::Mul,
                Tok::Slash => BinOp::Div,
                Tok::Percent => BinOp::Mod,
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, VmError> {
        let line = self.line();
        match self.peek().tok {
            Tok::Minus => {
                self.advance();
                Ok(Expr::Unary {
                    op: UnOp::Neg,
                    expr: Box::new(self.unary()?),
                    line,
                })
            }
            Tok::Bang => {
                self.advance();
                Ok(Expr::Unary {
                    op: UnOp::Not,
                    expr: Box::new(self.unary()?),
                    line,
                })
            }
            // Prefix increment/decrement desugar to compound assignment.
            Tok::PlusPlus | Tok::MinusMinus => {
                let op = if self.check(&Tok::PlusPlus) {
                    AssignOp::AddAssign
                } else {
                    AssignOp::SubAssign
                };
                self.advance();
                let name = self.ident("identifier after increment")?;
                Ok(Expr::Assign {
                    target: name,
                    op,
                    value: Box::new(Expr::Number(1.0)),
                    line,
                })
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expr, VmError> {
        let mut expr = self.primary()?;
        loop {
            match self.peek().tok {
                Tok::Dot => {
                    let line = self.line();
                    self.advance();
                    let property = self.ident("property name")?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                        line,
                    };
                }
                Tok::LParen => {
                    let line = self.line();
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(&Tok::RParen) {
                        loop {
                            args.push(self.expression()?);
                            if !self.eat(&Tok::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(Tok::RParen, "')'")?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        line,
                    };
                }
                // Postfix increment/decrement, desugared like the prefix form.
                Tok::PlusPlus | Tok::MinusMinus => {
                    let line = self.line();
                    let op = if self.check(&Tok::PlusPlus) {
                        AssignOp::AddAssign
                    } else {
                        AssignOp::SubAssign
                    };
                    self.advance();
                    if let Expr::Ident { name, .. } = expr {
                        expr = Expr::Assign {
                            target: name,
                            op,
                            value: Box::new(Expr::Number(1.0)),
                            line,
                        };
                    } else {
                        return Err(VmError::Syntax {
                            message: "invalid increment target".to_string(),
                            line,
                        });
                    }
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, VmError> {
        let line = self.line();
        match self.peek().tok.clone() {
            Tok::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            Tok::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            Tok::True => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            Tok::False => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            Tok::Null => {
                self.advance();
                Ok(Expr::Null)
            }
            Tok::Ident(name) => {
                self.advance();
                Ok(Expr::Ident { name, line })
            }
            Tok::LParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect(Tok::RParen, "')'")?;
                Ok(expr)
            }
            other => Err(VmError::Syntax {
                message: format!("unexpected token {}", other),
                line,
            }),
        }
    }
}
