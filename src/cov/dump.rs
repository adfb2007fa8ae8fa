// Copyright (c) 2016-2020 Fabian Schuiki

//! Access to raw runtime coverage dumps.
//!
//! A dump is produced by the runtime instrumentation, aggregated over all
//! test runs, and read by an external driver. The merge engine only sees it
//! through the traits in this module: a global test-run count, per-module
//! data paired positionally with the script's modules, and per-scope value
//! sets addressed by integer group keys.
//!
//! Keys form two channels. A non-negative key `k` carries the observed
//! values (or one-bits) of group `k`; the negative key `-(k + 1)` carries
//! the zero-bits for the bits-record interpretation of group `k`.

use std::collections::{BTreeMap, BTreeSet};

use num::BigInt;

/// A raw coverage dump.
pub trait RawDump {
    /// The number of test runs aggregated into the dump.
    fn test_count(&self) -> u64;

    /// The number of modules the dump carries data for.
    fn module_count(&self) -> usize;

    /// The data recorded for the module at the given position.
    fn module_data(&self, index: usize) -> &dyn ModuleData;
}

/// The per-scope data recorded for one module.
pub trait ModuleData {
    /// Iterate over the scopes coverage was collected under, in the dump's
    /// order. Scopes never instantiated during the runs are simply absent.
    fn scopes(&self) -> Box<dyn Iterator<Item = (&str, &dyn ScopeData)> + '_>;
}

/// The value sets recorded under one scope.
pub trait ScopeData {
    /// The maximum group index referenced by any key in this scope, taking
    /// both the value channel and the zero-bit channel into account.
    /// Returns -1 if the scope references no group at all.
    fn max_group_key(&self) -> i64;

    /// The set of observed integers recorded under a key, if any.
    fn values_for_key(&self, key: i64) -> Option<&BTreeSet<BigInt>>;
}

/// An in-memory dump, used by tests and by drivers that materialize a dump
/// before merging.
#[derive(Debug, Default)]
pub struct MemDump {
    pub test_count: u64,
    pub modules: Vec<MemModuleData>,
}

/// In-memory per-module data.
#[derive(Debug, Default)]
pub struct MemModuleData {
    pub scopes: Vec<(String, MemScopeData)>,
}

/// In-memory per-scope data.
#[derive(Debug, Default)]
pub struct MemScopeData {
    values: BTreeMap<i64, BTreeSet<BigInt>>,
}

impl MemScopeData {
    pub fn new() -> MemScopeData {
        Default::default()
    }

    /// Record a set of observed values under a key.
    pub fn insert<I>(&mut self, key: i64, values: I)
    where
        I: IntoIterator,
        I::Item: Into<BigInt>,
    {
        self.values
            .entry(key)
            .or_insert_with(BTreeSet::new)
            .extend(values.into_iter().map(Into::into));
    }
}

impl RawDump for MemDump {
    fn test_count(&self) -> u64 {
        self.test_count
    }

    fn module_count(&self) -> usize {
        self.modules.len()
    }

    fn module_data(&self, index: usize) -> &dyn ModuleData {
        &self.modules[index]
    }
}

impl ModuleData for MemModuleData {
    fn scopes(&self) -> Box<dyn Iterator<Item = (&str, &dyn ScopeData)> + '_> {
        Box::new(
            self.scopes
                .iter()
                .map(|(name, scope)| (name.as_str(), scope as &dyn ScopeData)),
        )
    }
}

impl ScopeData for MemScopeData {
    fn max_group_key(&self) -> i64 {
        self.values
            .keys()
            .map(|&key| if key < 0 { -key - 1 } else { key })
            .max()
            .unwrap_or(-1)
    }

    fn values_for_key(&self, key: i64) -> Option<&BTreeSet<BigInt>> {
        self.values.get(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_group_key_spans_both_channels() {
        let mut scope = MemScopeData::new();
        assert_eq!(scope.max_group_key(), -1);
        scope.insert(0, vec![1]);
        assert_eq!(scope.max_group_key(), 0);
        // Key -3 is the zero-bit channel of group 2.
        scope.insert(-3, vec![0]);
        assert_eq!(scope.max_group_key(), 2);
        scope.insert(1, vec![4]);
        assert_eq!(scope.max_group_key(), 2);
    }
}
