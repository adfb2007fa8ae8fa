// Copyright (c) 2016-2020 Fabian Schuiki

//! The coverage merge engine. Reconciles a width-checked script against a
//! raw runtime dump and produces the coverage report tree handed to the
//! renderer.
//!
//! In contrast to the width checker this pass fails fast: the first
//! structural incompatibility aborts the merge with a single diagnostic. A
//! mismatch here means the dump does not belong to the script, and further
//! findings would be noise. Known instrumentation artifacts are tolerated;
//! see [`classify_bits`] for the padding band.

use std::collections::BTreeSet;

use bitflags::bitflags;
use log::debug;
use mealy_common::errors::{DiagBuilder2, DiagResult2};
use mealy_common::name::Name;
use num::{BigInt, Signed, ToPrimitive};
use serde::Serialize;

use crate::ast::{Group, GroupKind, Module};
use crate::dump::{ModuleData, RawDump, ScopeData};
use crate::konst::bit_fits;
use crate::symtbl::SymbolTable;
use crate::typeck::CheckedScript;

bitflags! {
    /// Knobs for the merge engine.
    pub struct MergeFlags: u8 {
        /// Tolerate a dump whose module sequence is shorter or longer than
        /// the script's, pairing modules up to the shorter of the two.
        /// Intended as a development escape hatch for stale dumps; all other
        /// compatibility checks stay in force.
        const LENIENT_MODULES = 1 << 0;
    }
}

/// A merged coverage report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub test_count: u64,
    pub modules: Vec<ModCoverage>,
}

/// The coverage collected for one module, over all scopes it was
/// instantiated under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModCoverage {
    pub name: Name,
    pub scopes: Vec<ScopeCoverage>,
}

/// The coverage collected under one runtime scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeCoverage {
    pub scope: String,
    pub groups: Vec<(Name, GroupCoverage)>,
}

/// The coverage of one group under one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GroupCoverage {
    /// The values observed for an enumerated group.
    Recs {
        records: Vec<Name>,
        values: BTreeSet<BigInt>,
    },
    /// The bit indexes observed as zero and as one for a bits record.
    BRec {
        record: Name,
        zeros: BTreeSet<u64>,
        ones: BTreeSet<u64>,
    },
    /// The group does not apply at this scope. A placeholder, not a zero
    /// result; renderers show it as blank.
    BadScope,
}

/// Merge a raw coverage dump into a width-checked script.
///
/// Stops at the first structural incompatibility and reports it as a single
/// fatal diagnostic.
pub fn merge_coverage(
    checked: &CheckedScript,
    dump: &dyn RawDump,
    flags: MergeFlags,
) -> DiagResult2<Coverage> {
    let script = checked.script;
    let paired = if dump.module_count() == script.modules.len() {
        script.modules.len()
    } else if flags.contains(MergeFlags::LENIENT_MODULES) {
        debug!(
            "pairing {} of {} script modules against the dump",
            dump.module_count().min(script.modules.len()),
            script.modules.len()
        );
        dump.module_count().min(script.modules.len())
    } else {
        return Err(DiagBuilder2::fatal(format!(
            "coverage dump contains data for {} modules, but the script declares {}",
            dump.module_count(),
            script.modules.len()
        ))
        .add_note("log file is likely out of date"));
    };
    let mut modules = Vec::with_capacity(paired);
    for (index, module) in script.modules.iter().take(paired).enumerate() {
        modules.push(merge_module(
            &script.symtbl,
            module,
            dump.module_data(index),
        )?);
    }
    Ok(Coverage {
        test_count: dump.test_count(),
        modules,
    })
}

/// Merge the per-scope data of one module.
fn merge_module(
    st: &SymbolTable,
    module: &Module,
    data: &dyn ModuleData,
) -> DiagResult2<ModCoverage> {
    let mut scopes = Vec::new();
    for (scope, sd) in data.scopes() {
        debug!("merging scope `{}` of module `{}`", scope, module.name);
        if sd.max_group_key() >= module.groups.len() as i64 {
            return Err(DiagBuilder2::fatal(format!(
                "scope `{}` references group {} but module `{}` declares only {} groups",
                scope,
                sd.max_group_key(),
                module.name,
                module.groups.len()
            ))
            .add_note("log file is likely out of date"));
        }
        let mut groups = Vec::new();
        for (index, group) in module.groups.iter().enumerate() {
            let coverage = if group.pred.matches(scope) {
                merge_group(st, scope, group, index, sd)?
            } else {
                GroupCoverage::BadScope
            };
            groups.push((group.name, coverage));
        }
        scopes.push(ScopeCoverage {
            scope: scope.to_string(),
            groups,
        });
    }
    Ok(ModCoverage {
        name: module.name,
        scopes,
    })
}

/// Merge the raw value sets of one group under one scope.
fn merge_group(
    st: &SymbolTable,
    scope: &str,
    group: &Group,
    index: usize,
    sd: &dyn ScopeData,
) -> DiagResult2<GroupCoverage> {
    match group.kind {
        GroupKind::Recs(ref records) => {
            let values = sd
                .values_for_key(index as i64)
                .cloned()
                .unwrap_or_default();
            for value in &values {
                if !bit_fits(value, &group.width) {
                    return Err(DiagBuilder2::fatal(format!(
                        "scope `{}` observed value {} which is wider than width {} of group `{}`",
                        scope, value, group.width, group.name
                    ))
                    .add_note("log file is likely out of date"));
                }
            }
            Ok(GroupCoverage::Recs {
                records: records.iter().map(|&sym| st.name_of(sym)).collect(),
                values,
            })
        }
        GroupKind::BitsRecord(record) => {
            let ones = classify_bits(sd.values_for_key(index as i64), &group.width, group)?;
            let zeros = classify_bits(
                sd.values_for_key(-(index as i64) - 1),
                &group.width,
                group,
            )?;
            Ok(GroupCoverage::BRec {
                record: st.name_of(record),
                zeros,
                ones,
            })
        }
    }
}

/// Validate and reclassify the raw bit indexes of a bits record.
///
/// The runtime instrumentation does not know a record's exact declared
/// width and may emit up to 64 extra zero-padding high bits. Indexes in
/// that band are expected artifacts and dropped; anything beyond it, or
/// negative, is corrupt data.
fn classify_bits(
    raw: Option<&BTreeSet<BigInt>>,
    width: &BigInt,
    group: &Group,
) -> DiagResult2<BTreeSet<u64>> {
    let mut kept = BTreeSet::new();
    let limit = width + 64;
    for index in raw.into_iter().flatten() {
        if index.is_negative() {
            return Err(DiagBuilder2::fatal(format!(
                "negative index {} in group `{}` is invalid",
                index, group.name
            ))
            .add_note("coverage dump is corrupt"));
        }
        if *index >= limit {
            return Err(DiagBuilder2::fatal(format!(
                "index {} too big for the width {} of group `{}`",
                index, width, group.name
            ))
            .add_note("coverage dump is corrupt"));
        }
        if index < width {
            let index = index
                .to_u64()
                .expect("in-range bit index must fit in u64");
            kept.insert(index);
        }
    }
    Ok(kept)
}
