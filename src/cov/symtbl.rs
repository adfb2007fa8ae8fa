// Copyright (c) 2016-2020 Fabian Schuiki

//! The declaration arena. Signals and coverage records are declared once,
//! receive an opaque `Symbol` handle, and are referred to by that handle
//! everywhere else. Scripts and modules hold handles rather than references,
//! so the arena can be shared across modules without any form of interior
//! mutability.

use std::fmt;

use mealy_common::name::Name;
use num::{BigInt, Signed};

/// A lightweight handle to a declaration in a [`SymbolTable`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(pub u32);

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// A signal's declared bit range.
///
/// The two bounds carry no ordering guarantee; `7:0` and `0:7` declare the
/// same set of bits.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Slice {
    pub a: BigInt,
    pub b: BigInt,
}

impl Slice {
    pub fn new<A: Into<BigInt>, B: Into<BigInt>>(a: A, b: B) -> Slice {
        Slice {
            a: a.into(),
            b: b.into(),
        }
    }

    /// The number of bits the slice covers.
    pub fn width(&self) -> BigInt {
        (&self.a - &self.b).abs() + 1
    }

    /// The lower of the two bounds.
    pub fn low(&self) -> &BigInt {
        std::cmp::min(&self.a, &self.b)
    }

    /// The higher of the two bounds.
    pub fn high(&self) -> &BigInt {
        std::cmp::max(&self.a, &self.b)
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.a, self.b)
    }
}

/// A declared fact about a symbol.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Decl {
    /// A signal with its declared bit range.
    SignalDecl { name: Name, slice: Slice },
    /// A coverage record destination. Its width is not a declared fact; the
    /// width checker infers it from the recorded expression.
    RecordDecl { name: Name },
}

impl Decl {
    /// The name under which the symbol was declared.
    pub fn name(&self) -> Name {
        match *self {
            Decl::SignalDecl { name, .. } => name,
            Decl::RecordDecl { name } => name,
        }
    }
}

/// An ordered arena of declarations.
///
/// Symbols are handed out in declaration order and never invalidated. The
/// table is immutable once the parser has populated it.
#[derive(Debug, Default)]
pub struct SymbolTable {
    decls: Vec<Decl>,
}

impl SymbolTable {
    /// Create a new empty symbol table.
    pub fn new() -> SymbolTable {
        SymbolTable { decls: Vec::new() }
    }

    /// Add a declaration to the arena and obtain its handle.
    pub fn declare(&mut self, decl: Decl) -> Symbol {
        let sym = Symbol(self.decls.len() as u32);
        self.decls.push(decl);
        sym
    }

    /// Declare a signal with the given bit range.
    pub fn declare_signal(&mut self, name: Name, slice: Slice) -> Symbol {
        self.declare(Decl::SignalDecl { name, slice })
    }

    /// Declare a coverage record destination.
    pub fn declare_record(&mut self, name: Name) -> Symbol {
        self.declare(Decl::RecordDecl { name })
    }

    /// Look up the declaration a symbol refers to.
    ///
    /// Panics if the handle does not belong to this table; handles are only
    /// ever produced by `declare`, so that is a compiler bug.
    pub fn get(&self, sym: Symbol) -> &Decl {
        &self.decls[sym.0 as usize]
    }

    /// Whether a declaration exists for the given symbol.
    pub fn contains(&self, sym: Symbol) -> bool {
        (sym.0 as usize) < self.decls.len()
    }

    /// The name under which a symbol was declared.
    pub fn name_of(&self, sym: Symbol) -> Name {
        self.get(sym).name()
    }

    /// Iterate over the declarations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &Decl)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, decl)| (Symbol(i as u32), decl))
    }
}
