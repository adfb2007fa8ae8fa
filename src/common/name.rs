// Copyright (c) 2016-2020 Fabian Schuiki

//! A name table that internalizes all names presented to it and allows for
//! them to be referred to by a lightweight tag. This structure is heavily
//! inspired by the interner used in the Rust compiler.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;

/// A name is a lightweight 32 bit tag that refers to a string in a name
/// table. During parsing, encountered strings are inserted into the name
/// table and only the corresponding tag is kept in the AST node.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(pub u32);

impl Name {
    /// Return the string representation of this name.
    pub fn as_str(self) -> String {
        get_name_table().get(self)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self, self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.as_str(), f)
    }
}

impl serde::Serialize for Name {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.as_str())
    }
}

/// A lookup table of names. Internalizes strings and allows for bidirectional
/// lookup, i.e. by string or by assigned name.
pub struct NameTable {
    map: HashMap<String, Name>,
    vect: Vec<String>,
}

impl NameTable {
    /// Create a new empty name table.
    pub fn new() -> NameTable {
        NameTable {
            map: HashMap::new(),
            vect: Vec::new(),
        }
    }

    /// Obtain a name for a string. This either inserts the string into the
    /// table and returns the new name, or returns the existing name if the
    /// string already exists in the table.
    pub fn intern(&mut self, value: &str) -> Name {
        if let Some(&idx) = self.map.get(value) {
            return idx;
        }
        let new_idx = Name(self.vect.len() as u32);
        self.map.insert(value.to_string(), new_idx);
        self.vect.push(value.to_string());
        new_idx
    }

    /// Retrieve the string given a name tag.
    pub fn get(&self, idx: Name) -> String {
        self.vect[idx.0 as usize].clone()
    }

    /// Try to find a string.
    pub fn find(&self, value: &str) -> Option<Name> {
        self.map.get(value).copied()
    }
}

static NAME_TABLE: Lazy<Mutex<NameTable>> = Lazy::new(|| Mutex::new(NameTable::new()));

/// Access the global name table.
pub fn get_name_table() -> MutexGuard<'static, NameTable> {
    NAME_TABLE.lock().unwrap()
}

/// Intern a string into the global name table.
pub fn intern(value: &str) -> Name {
    get_name_table().intern(value)
}
