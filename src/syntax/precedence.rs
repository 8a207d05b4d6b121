use std::collections::HashMap;
use std::sync::LazyLock;

use super::token_type::TokenType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Conditional, // a ? b : c
    LogicalOr,   // ||
    LogicalAnd,  // &&
    Equals,      // ==, !=
    LessGreater, // <, >, <=, >=
    Sum,         // +, -
    Product,     // *, /
    Prefix,      // -x, !x
    Call,        // f(x)
    Index,       // a[i], a.b
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    Prefix,
    Infix,
    Postfix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo {
    pub token: TokenType,
    pub precedence: Precedence,
    pub associativity: Assoc,
    pub fixity: Fixity,
}

const fn op(token: TokenType, precedence: Precedence, associativity: Assoc, fixity: Fixity) -> OpInfo {
    OpInfo {
        token,
        precedence,
        associativity,
        fixity,
    }
}

// Single source of truth for operator precedence + associativity.
pub const OPERATOR_TABLE: &[OpInfo] = &[
    op(TokenType::Question, Precedence::Conditional, Assoc::Right, Fixity::Infix),
    op(TokenType::Or, Precedence::LogicalOr, Assoc::Left, Fixity::Infix),
    op(TokenType::And, Precedence::LogicalAnd, Assoc::Left, Fixity::Infix),
    op(TokenType::Eq, Precedence::Equals, Assoc::Left, Fixity::Infix),
    op(TokenType::NotEq, Precedence::Equals, Assoc::Left, Fixity::Infix),
    op(TokenType::Lt, Precedence::LessGreater, Assoc::Left, Fixity::Infix),
    op(TokenType::Gt, Precedence::LessGreater, Assoc::Left, Fixity::Infix),
    op(TokenType::Lte, Precedence::LessGreater, Assoc::Left, Fixity::Infix),
    op(TokenType::Gte, Precedence::LessGreater, Assoc::Left, Fixity::Infix),
    op(TokenType::Plus, Precedence::Sum, Assoc::Left, Fixity::Infix),
    op(TokenType::Minus, Precedence::Sum, Assoc::Left, Fixity::Infix),
    op(TokenType::Asterisk, Precedence::Product, Assoc::Left, Fixity::Infix),
    op(TokenType::Slash, Precedence::Product, Assoc::Left, Fixity::Infix),
    // Postfix operators handled by Pratt infix dispatch
    op(TokenType::LParen, Precedence::Call, Assoc::Left, Fixity::Postfix),
    op(TokenType::LBracket, Precedence::Index, Assoc::Left, Fixity::Postfix),
    op(TokenType::Dot, Precedence::Index, Assoc::Left, Fixity::Postfix),
    // Prefix operators
    op(TokenType::Bang, Precedence::Prefix, Assoc::Right, Fixity::Prefix),
    op(TokenType::Minus, Precedence::Prefix, Assoc::Right, Fixity::Prefix),
];

static INFIX_TABLE: LazyLock<HashMap<TokenType, OpInfo>> = LazyLock::new(|| {
    OPERATOR_TABLE
        .iter()
        .filter(|info| info.fixity != Fixity::Prefix)
        .map(|info| (info.token, *info))
        .collect()
});

static PREFIX_TABLE: LazyLock<HashMap<TokenType, OpInfo>> = LazyLock::new(|| {
    OPERATOR_TABLE
        .iter()
        .filter(|info| info.fixity == Fixity::Prefix)
        .map(|info| (info.token, *info))
        .collect()
});

pub fn infix_op(token_type: TokenType) -> Option<OpInfo> {
    INFIX_TABLE.get(&token_type).copied()
}

pub fn prefix_op(token_type: TokenType) -> Option<OpInfo> {
    PREFIX_TABLE.get(&token_type).copied()
}

pub fn token_precedence(token_type: TokenType) -> Precedence {
    infix_op(token_type)
        .map(|op| op.precedence)
        .unwrap_or(Precedence::Lowest)
}

fn precedence_below(precedence: Precedence) -> Precedence {
    match precedence {
        Precedence::Lowest | Precedence::Conditional => Precedence::Lowest,
        Precedence::LogicalOr => Precedence::Conditional,
        Precedence::LogicalAnd => Precedence::LogicalOr,
        Precedence::Equals => Precedence::LogicalAnd,
        Precedence::LessGreater => Precedence::Equals,
        Precedence::Sum => Precedence::LessGreater,
        Precedence::Product => Precedence::Sum,
        Precedence::Prefix => Precedence::Product,
        Precedence::Call => Precedence::Prefix,
        Precedence::Index => Precedence::Call,
    }
}

/// Precedence to parse the right-hand side of an infix operator with.
pub fn rhs_precedence_for_infix(token_type: TokenType) -> Precedence {
    match infix_op(token_type) {
        Some(op) if op.associativity == Assoc::Right => precedence_below(op.precedence),
        Some(op) => op.precedence,
        None => Precedence::Lowest,
    }
}
