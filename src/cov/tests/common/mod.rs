// Copyright (c) 2016-2020 Fabian Schuiki
#![allow(dead_code)]

//! Shorthands for building scripts in tests.

use mealy_common::name::{intern, Name};
use mealy_common::source::{Spanned, INVALID_SPAN};
use mealy_cov::ast::*;
use mealy_cov::symtbl::{Slice, Symbol, SymbolTable};
use num::BigInt;

pub fn sym(symbol: Symbol) -> Expr {
    Expr::new(INVALID_SPAN, SymExpr(symbol))
}

pub fn int(value: i64) -> Expr {
    Expr::new(
        INVALID_SPAN,
        IntExpr {
            value: BigInt::from(value),
            width: None,
        },
    )
}

pub fn int_w(value: i64, width: i64) -> Expr {
    Expr::new(
        INVALID_SPAN,
        IntExpr {
            value: BigInt::from(value),
            width: Some(BigInt::from(width)),
        },
    )
}

pub fn select(symbol: Symbol, index: Expr) -> Expr {
    Expr::new(
        INVALID_SPAN,
        SelectExpr {
            symbol: Spanned::new(symbol, INVALID_SPAN),
            index: Box::new(index),
            index2: None,
        },
    )
}

pub fn select2(symbol: Symbol, index: Expr, index2: Expr) -> Expr {
    Expr::new(
        INVALID_SPAN,
        SelectExpr {
            symbol: Spanned::new(symbol, INVALID_SPAN),
            index: Box::new(index),
            index2: Some(Box::new(index2)),
        },
    )
}

pub fn concat(parts: Vec<Expr>) -> Expr {
    Expr::new(INVALID_SPAN, ConcatExpr(parts))
}

pub fn repl(count: usize, expr: Expr) -> Expr {
    Expr::new(
        INVALID_SPAN,
        ReplicateExpr {
            count,
            expr: Box::new(expr),
        },
    )
}

pub fn un(op: UnaryOp, arg: Expr) -> Expr {
    Expr::new(INVALID_SPAN, UnaryExpr(op, Box::new(arg)))
}

pub fn bin(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::new(INVALID_SPAN, BinaryExpr(op, Box::new(lhs), Box::new(rhs)))
}

pub fn cond(c: Expr, t: Expr, e: Expr) -> Expr {
    Expr::new(INVALID_SPAN, CondExpr(Box::new(c), Box::new(t), Box::new(e)))
}

pub fn record(expr: Expr, dest: Symbol) -> Record {
    Record {
        span: INVALID_SPAN,
        expr,
        dest: Spanned::new(dest, INVALID_SPAN),
    }
}

pub fn block(guard: Option<Expr>, records: Vec<Record>) -> Block {
    Block {
        span: INVALID_SPAN,
        guard,
        records,
    }
}

pub fn group(name: &str, width: i64, pred: ScopePred, kind: GroupKind) -> Group {
    Group {
        span: INVALID_SPAN,
        name: intern(name),
        width: BigInt::from(width),
        pred,
        kind,
    }
}

pub fn module(name: &str, blocks: Vec<Block>, records: Vec<Symbol>, groups: Vec<Group>) -> Module {
    Module {
        span: INVALID_SPAN,
        name: intern(name),
        name_span: INVALID_SPAN,
        signals: Vec::new(),
        blocks,
        records,
        groups,
    }
}

pub fn cover(module: &str, record: Symbol, list: Option<CoverList>) -> Stmt {
    Stmt {
        span: INVALID_SPAN,
        data: CoverStmt {
            module: Spanned::new(intern(module), INVALID_SPAN),
            record: Spanned::new(record, INVALID_SPAN),
            list,
        },
    }
}

pub fn cover_list<I: IntoIterator<Item = i64>>(values: I) -> CoverList {
    CoverList {
        span: INVALID_SPAN,
        values: values
            .into_iter()
            .map(|v| Spanned::new(BigInt::from(v), INVALID_SPAN))
            .collect(),
    }
}

pub fn script(symtbl: SymbolTable, modules: Vec<Module>, stmts: Vec<Stmt>) -> Script {
    Script {
        symtbl,
        modules,
        stmts,
    }
}

/// A symbol table with one 8-bit signal `a` (slice 7:0) and one record `r`.
pub fn simple_table() -> (SymbolTable, Symbol, Symbol) {
    let mut st = SymbolTable::new();
    let a = st.declare_signal(intern("a"), Slice::new(7, 0));
    let r = st.declare_record(intern("r"));
    (st, a, r)
}

/// The messages of a failed check, in diagnostic order.
pub fn messages<T: std::fmt::Debug>(
    result: Result<T, mealy_common::errors::DiagList>,
) -> Vec<String> {
    result
        .unwrap_err()
        .into_iter()
        .map(|d| d.message)
        .collect()
}

pub fn name(s: &str) -> Name {
    intern(s)
}
