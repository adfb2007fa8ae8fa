// Copyright (c) 2016-2020 Fabian Schuiki

//! The abstract syntax tree of a coverage script, as handed over by the
//! parser. Expressions carry spans into the registered source buffers;
//! symbols are opaque handles into the script's declaration arena.

use std::fmt;

use mealy_common::name::Name;
use mealy_common::source::{Span, Spanned};
use num::BigInt;

use crate::symtbl::{Symbol, SymbolTable};

pub use self::ExprData::*;
pub use self::GroupKind::*;
pub use self::StmtData::*;

/// An expression with the span it covers in the source.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Expr {
    pub span: Span,
    pub data: ExprData,
}

impl Expr {
    pub fn new(span: Span, data: ExprData) -> Expr {
        Expr { span, data }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ExprData {
    /// A reference to a declared signal.
    SymExpr(Symbol),
    /// An integer literal, optionally carrying an explicit width. Widths are
    /// never inferred from the value; a width-less literal is only
    /// meaningful where the surrounding construct consumes its value rather
    /// than its bits.
    IntExpr {
        value: BigInt,
        width: Option<BigInt>,
    },
    /// A bit select `s[i]` or part select `s[i:j]`. The indexes are
    /// expressions that must fold to compile-time constants.
    SelectExpr {
        symbol: Spanned<Symbol>,
        index: Box<Expr>,
        index2: Option<Box<Expr>>,
    },
    /// A concatenation `{a, b, c}` of any number of parts.
    ConcatExpr(Vec<Expr>),
    /// A replication `{n{e}}` with a compile-time constant count.
    ReplicateExpr { count: usize, expr: Box<Expr> },
    UnaryExpr(UnaryOp, Box<Expr>),
    BinaryExpr(BinaryOp, Box<Expr>, Box<Expr>),
    /// A conditional `c ? t : e`.
    CondExpr(Box<Expr>, Box<Expr>, Box<Expr>),
}

/// A unary operator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum UnaryOp {
    /// Bitwise negation `~`.
    Not,
    /// Arithmetic negation `-`.
    Neg,
    /// Logical negation `!`.
    LogicNot,
    /// AND reduction `&`.
    RedAnd,
    /// OR reduction `|`.
    RedOr,
    /// XOR reduction `^`.
    RedXor,
    /// NAND reduction `~&`.
    RedNand,
    /// NOR reduction `~|`.
    RedNor,
    /// XNOR reduction `~^`.
    RedXnor,
}

impl UnaryOp {
    /// Whether the operator's result is a single bit regardless of the
    /// operand width.
    pub fn is_reduction(self) -> bool {
        match self {
            UnaryOp::Not | UnaryOp::Neg => false,
            UnaryOp::LogicNot
            | UnaryOp::RedAnd
            | UnaryOp::RedOr
            | UnaryOp::RedXor
            | UnaryOp::RedNand
            | UnaryOp::RedNor
            | UnaryOp::RedXnor => true,
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            UnaryOp::Not => write!(f, "~"),
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::LogicNot => write!(f, "!"),
            UnaryOp::RedAnd => write!(f, "&"),
            UnaryOp::RedOr => write!(f, "|"),
            UnaryOp::RedXor => write!(f, "^"),
            UnaryOp::RedNand => write!(f, "~&"),
            UnaryOp::RedNor => write!(f, "~|"),
            UnaryOp::RedXnor => write!(f, "~^"),
        }
    }
}

/// A binary operator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
    LogicAnd,
    LogicOr,
}

impl BinaryOp {
    /// Whether the operator's result is a single bit regardless of the
    /// operand widths.
    pub fn is_reduction(self) -> bool {
        match self {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => false,
            BinaryOp::Eq
            | BinaryOp::Neq
            | BinaryOp::Lt
            | BinaryOp::Leq
            | BinaryOp::Gt
            | BinaryOp::Geq
            | BinaryOp::LogicAnd
            | BinaryOp::LogicOr => true,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::And => write!(f, "&"),
            BinaryOp::Or => write!(f, "|"),
            BinaryOp::Xor => write!(f, "^"),
            BinaryOp::Eq => write!(f, "=="),
            BinaryOp::Neq => write!(f, "!="),
            BinaryOp::Lt => write!(f, "<"),
            BinaryOp::Leq => write!(f, "<="),
            BinaryOp::Gt => write!(f, ">"),
            BinaryOp::Geq => write!(f, ">="),
            BinaryOp::LogicAnd => write!(f, "&&"),
            BinaryOp::LogicOr => write!(f, "||"),
        }
    }
}

/// A binding from an expression to a record destination. The destination is
/// sampled each time the enclosing block's guard is true.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Record {
    pub span: Span,
    pub expr: Expr,
    pub dest: Spanned<Symbol>,
}

/// A guarded group of records. A block without a guard samples its records
/// on every cycle.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Block {
    pub span: Span,
    pub guard: Option<Expr>,
    pub records: Vec<Record>,
}

/// A named coverage group, scoped to matching instance labels.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Group {
    pub span: Span,
    pub name: Name,
    pub width: BigInt,
    pub pred: ScopePred,
    pub kind: GroupKind,
}

/// Which runtime scopes a group applies to.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ScopePred {
    /// The group applies to every scope of the module.
    Any,
    /// The group applies to exactly one instance path.
    Exact(Name),
    /// The group applies to every instance path below a prefix.
    Prefix(Name),
}

impl ScopePred {
    /// Whether the predicate matches a runtime scope label.
    pub fn matches(&self, scope: &str) -> bool {
        match *self {
            ScopePred::Any => true,
            ScopePred::Exact(name) => name.as_str() == scope,
            ScopePred::Prefix(name) => scope.starts_with(&name.as_str()),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GroupKind {
    /// An enumerated multi-value domain over one or more records.
    Recs(Vec<Symbol>),
    /// A per-bit tracked domain over a single wide record, for registers
    /// where full value enumeration is infeasible.
    BitsRecord(Symbol),
}

/// A coverage module: the signals, sampling blocks, record destinations, and
/// groups declared for one hardware module.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Module {
    pub span: Span,
    pub name: Name,
    pub name_span: Span,
    pub signals: Vec<Symbol>,
    pub blocks: Vec<Block>,
    pub records: Vec<Symbol>,
    pub groups: Vec<Group>,
}

/// An explicit, finite enumeration of the values a record is expected to
/// take.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CoverList {
    pub span: Span,
    pub values: Vec<Spanned<BigInt>>,
}

/// A top-level statement.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Stmt {
    pub span: Span,
    pub data: StmtData,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum StmtData {
    /// `cover module.record`, optionally with an explicit cover list.
    CoverStmt {
        module: Spanned<Name>,
        record: Spanned<Symbol>,
        list: Option<CoverList>,
    },
    /// `cross module.record ...`; currently passed through unchecked.
    CrossStmt {
        module: Spanned<Name>,
        records: Vec<Spanned<Symbol>>,
    },
}

/// A complete coverage script: the shared declaration arena, the modules in
/// declaration order, and the top-level statements.
#[derive(Debug)]
pub struct Script {
    pub symtbl: SymbolTable,
    pub modules: Vec<Module>,
    pub stmts: Vec<Stmt>,
}

impl Script {
    /// Find a module by name.
    pub fn module_index(&self, name: Name) -> Option<usize> {
        self.modules.iter().position(|m| m.name == name)
    }
}
