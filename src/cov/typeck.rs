// Copyright (c) 2016-2020 Fabian Schuiki

//! The width checker. Walks every block, record, and top-level cover
//! statement of a script and computes, or rejects, the bit width of every
//! expression. There is no implicit width promotion anywhere in the
//! language; operands of mismatched widths are reported, never resolved.
//!
//! Independent sibling checks accumulate all of their diagnostics, so a user
//! sees every width error in one run. Checks that feed each other
//! short-circuit; once a prerequisite fails, only its diagnostics propagate.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use log::{debug, trace};
use mealy_common::errors::{fail, gather, join, CheckResult, DiagBuilder2, DiagList};
use mealy_common::source::{Span, Spanned};
use num::{BigInt, One, Signed};

use crate::ast::{CoverList, Expr, ExprData, Module, Script, Stmt, StmtData};
use crate::konst::{bit_fits, fold};
use crate::symtbl::{Decl, Symbol, SymbolTable};

/// The widths the checker inferred for a script's record destinations.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct WidthTable {
    widths: HashMap<Symbol, BigInt>,
}

impl WidthTable {
    /// Look up the inferred width of a record.
    pub fn get(&self, sym: Symbol) -> Option<&BigInt> {
        self.widths.get(&sym)
    }

    /// The number of records that received a width.
    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// Iterate over the recorded widths in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &BigInt)> {
        self.widths.iter().map(|(&sym, width)| (sym, width))
    }

    fn set(&mut self, sym: Symbol, width: BigInt) {
        self.widths.insert(sym, width);
    }
}

/// A script whose widths have been checked. The merge engine only accepts
/// checked scripts.
#[derive(Debug)]
pub struct CheckedScript<'a> {
    pub script: &'a Script,
    pub widths: WidthTable,
}

/// Check the widths of every module and top-level statement of a script.
///
/// All independent diagnostics are accumulated; a failed result carries
/// every width error of the run in source order.
pub fn check_script(script: &Script) -> CheckResult<CheckedScript> {
    let mut widths = WidthTable::default();
    let mut failed = HashSet::new();
    let mut diags: Option<DiagList> = None;
    for module in &script.modules {
        debug!("width checking module `{}`", module.name);
        if let Err(d) = check_module(&script.symtbl, module, &mut widths, &mut failed) {
            merge_diags(&mut diags, d);
        }
    }
    for stmt in &script.stmts {
        if let Err(d) = check_stmt(script, &widths, &failed, stmt) {
            merge_diags(&mut diags, d);
        }
    }
    debug!(
        "inferred record widths: {}",
        widths
            .iter()
            .map(|(sym, w)| format!("{}={}", script.symtbl.name_of(sym), w))
            .join(", ")
    );
    match diags {
        Some(diags) => Err(diags),
        None => Ok(CheckedScript { script, widths }),
    }
}

/// Check one module's blocks and records, filling in the width table for
/// every record whose expression checks out.
fn check_module(
    st: &SymbolTable,
    module: &Module,
    widths: &mut WidthTable,
    failed: &mut HashSet<Symbol>,
) -> CheckResult<()> {
    let mut diags: Option<DiagList> = None;
    for block in &module.blocks {
        if let Some(ref guard) = block.guard {
            match width_of_expr(st, guard) {
                Ok(w) if w.is_one() => (),
                Ok(w) => merge_diags(
                    &mut diags,
                    DiagBuilder2::error(format!(
                        "Block is guarded by expression with width {}, not 1",
                        w
                    ))
                    .span(guard.span)
                    .into(),
                ),
                Err(d) => merge_diags(&mut diags, d),
            }
        }
        let mut seen = HashSet::new();
        for record in &block.records {
            let dest = record.dest.value;
            if !st.contains(dest) {
                panic!(
                    "{}",
                    DiagBuilder2::bug("record destination refers to an undeclared symbol")
                );
            }
            match st.get(dest) {
                Decl::RecordDecl { .. } => (),
                decl => panic!(
                    "{}",
                    DiagBuilder2::bug(format!(
                        "record destination `{}` is not a record",
                        decl.name()
                    ))
                ),
            }
            if !seen.insert(dest) {
                // The symbol table builder must have rejected this.
                panic!(
                    "{}",
                    DiagBuilder2::bug(format!(
                        "record `{}` bound twice in one block",
                        st.name_of(dest)
                    ))
                );
            }
            match width_of_expr(st, &record.expr) {
                Ok(w) => {
                    trace!("record `{}` has width {}", st.name_of(dest), w);
                    match widths.get(dest) {
                        Some(prev) if *prev != w => merge_diags(
                            &mut diags,
                            DiagBuilder2::error(format!(
                                "record `{}` is bound to expressions of different widths",
                                st.name_of(dest)
                            ))
                            .span(record.span)
                            .add_note(format!("this expression has width {}", w))
                            .add_note(format!("an earlier expression has width {}", prev))
                            .into(),
                        ),
                        Some(_) => (),
                        None => widths.set(dest, w),
                    }
                }
                Err(d) => {
                    failed.insert(dest);
                    merge_diags(&mut diags, d);
                }
            }
        }
    }
    match diags {
        Some(diags) => Err(diags),
        None => Ok(()),
    }
}

/// Compute the width of an expression, or reject it.
pub fn width_of_expr(st: &SymbolTable, expr: &Expr) -> CheckResult<BigInt> {
    match expr.data {
        ExprData::SymExpr(sym) => match *st.get(sym) {
            Decl::SignalDecl { ref slice, .. } => Ok(slice.width()),
            Decl::RecordDecl { name } => fail(
                DiagBuilder2::error(format!("`{}` is a record, not a signal", name))
                    .span(expr.span),
            ),
        },
        ExprData::IntExpr {
            ref value,
            ref width,
        } => match *width {
            Some(ref w) => Ok(w.clone()),
            None => fail(
                DiagBuilder2::error(format!("integer literal `{}` has no width", value))
                    .span(expr.span)
                    .add_note("attach an explicit width to the literal"),
            ),
        },
        ExprData::SelectExpr {
            symbol,
            ref index,
            ref index2,
        } => width_of_select(st, expr.span, symbol, index, index2.as_deref()),
        ExprData::ConcatExpr(ref parts) => {
            let widths = gather(parts.iter().map(|part| width_of_expr(st, part)))?;
            Ok(widths.into_iter().sum())
        }
        ExprData::ReplicateExpr {
            count,
            expr: ref inner,
        } => Ok(BigInt::from(count) * width_of_expr(st, inner)?),
        ExprData::UnaryExpr(op, ref arg) => {
            let w = width_of_expr(st, arg)?;
            if op.is_reduction() {
                Ok(BigInt::one())
            } else {
                Ok(w)
            }
        }
        ExprData::BinaryExpr(op, ref lhs, ref rhs) => {
            let (lw, rw) = join(width_of_expr(st, lhs), width_of_expr(st, rhs))?;
            if lw != rw {
                fail(
                    DiagBuilder2::error(format!(
                        "operands of `{}` have different widths {} and {}",
                        op, lw, rw
                    ))
                    .span(expr.span),
                )
            } else if op.is_reduction() {
                Ok(BigInt::one())
            } else {
                Ok(lw)
            }
        }
        ExprData::CondExpr(ref cond, ref then, ref other) => {
            let (cw, (tw, ow)) = join(
                width_of_expr(st, cond),
                join(width_of_expr(st, then), width_of_expr(st, other)),
            )?;
            let cond_ok = if cw.is_one() {
                Ok(())
            } else {
                fail(
                    DiagBuilder2::error(format!(
                        "width {} != 1 so can't be used as a condition",
                        cw
                    ))
                    .span(cond.span),
                )
            };
            let branch_ok = if tw == ow {
                Ok(())
            } else {
                fail(
                    DiagBuilder2::error(
                        "left and right side of conditional have different widths",
                    )
                    .span(expr.span)
                    .add_note(format!("left side has width {}", tw))
                    .add_note(format!("right side has width {}", ow)),
                )
            };
            join(cond_ok, branch_ok)?;
            Ok(tw)
        }
    }
}

/// Compute the width of a bit or part select. The index expressions must
/// fold to constants, and the resolved range must lie within the symbol's
/// declared slice.
fn width_of_select(
    st: &SymbolTable,
    span: Span,
    symbol: Spanned<Symbol>,
    index: &Expr,
    index2: Option<&Expr>,
) -> CheckResult<BigInt> {
    let slice = match *st.get(symbol.value) {
        Decl::SignalDecl { ref slice, .. } => slice,
        Decl::RecordDecl { name } => {
            return fail(
                DiagBuilder2::error(format!("`{}` is a record, not a signal", name))
                    .span(symbol.span),
            );
        }
    };
    let fold_index = |idx: &Expr| match fold(idx) {
        Some(v) => Ok(v),
        None => fail(DiagBuilder2::error("can't compute width of bit selection").span(idx.span)),
    };
    let (i, j) = join(
        fold_index(index),
        match index2 {
            Some(idx) => fold_index(idx).map(Some),
            None => Ok(None),
        },
    )?;
    let (lo, hi) = match j {
        Some(ref j) => (i.clone().min(j.clone()), i.clone().max(j.clone())),
        None => (i.clone(), i.clone()),
    };
    if lo < *slice.low() || hi > *slice.high() {
        let name = st.name_of(symbol.value);
        let sel = match j {
            Some(ref j) => format!("[{}:{}]", i, j),
            None => format!("[{}]", i),
        };
        return fail(
            DiagBuilder2::error(format!("selection `{}` overflows size of symbol `{}`", sel, name))
                .span(span)
                .add_note(format!("`{}` is declared with range {}", name, slice)),
        );
    }
    Ok(match j {
        Some(j) => (i - j).abs() + 1,
        None => BigInt::one(),
    })
}

/// Check a top-level statement against the inferred widths.
fn check_stmt(
    script: &Script,
    widths: &WidthTable,
    failed: &HashSet<Symbol>,
    stmt: &Stmt,
) -> CheckResult<()> {
    match stmt.data {
        StmtData::CoverStmt {
            module,
            record,
            ref list,
        } => {
            let midx = match script.module_index(module.value) {
                Some(midx) => midx,
                None => panic!(
                    "{}",
                    DiagBuilder2::bug(format!("cover of unknown module `{}`", module.value))
                ),
            };
            if !script.modules[midx].records.contains(&record.value) {
                panic!(
                    "{}",
                    DiagBuilder2::bug(format!(
                        "cover of `{}.{}` which is not a record of that module",
                        module.value,
                        script.symtbl.name_of(record.value)
                    ))
                );
            }
            let width = match widths.get(record.value) {
                Some(width) => width,
                // The record's own check already failed and reported; there
                // is no width to validate against.
                None if failed.contains(&record.value) => return Ok(()),
                None => panic!(
                    "{}",
                    DiagBuilder2::bug(format!(
                        "record `{}` has no inferred width",
                        script.symtbl.name_of(record.value)
                    ))
                ),
            };
            check_cover_list(&script.symtbl, record, width, list.as_ref())
        }
        StmtData::CrossStmt { .. } => Ok(()),
    }
}

/// Validate an explicit cover list against a record's inferred width, or
/// require one for wide records.
fn check_cover_list(
    st: &SymbolTable,
    record: Spanned<Symbol>,
    width: &BigInt,
    list: Option<&CoverList>,
) -> CheckResult<()> {
    match list {
        Some(list) => gather(list.values.iter().map(|lit| {
            if bit_fits(&lit.value, width) {
                Ok(())
            } else {
                fail(
                    DiagBuilder2::error(format!(
                        "cover value {} doesn't fit in width {}",
                        lit.value, width
                    ))
                    .span(lit.span),
                )
            }
        }))
        .map(|_| ()),
        None => {
            if *width > BigInt::from(16) {
                fail(
                    DiagBuilder2::error(format!(
                        "record `{}` has width {} more than 16 and no cover list",
                        st.name_of(record.value),
                        width
                    ))
                    .span(record.span)
                    .add_note("enumerate the expected values explicitly"),
                )
            } else {
                Ok(())
            }
        }
    }
}

fn merge_diags(diags: &mut Option<DiagList>, d: DiagList) {
    match diags {
        Some(diags) => diags.append(d),
        None => *diags = Some(d),
    }
}
