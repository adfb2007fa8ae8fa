// Copyright (c) 2016-2020 Fabian Schuiki

mod common;
use common::*;

use mealy_common::name::intern;
use mealy_cov::ast::{GroupKind, ScopePred, Script};
use mealy_cov::dump::{MemDump, MemModuleData, MemScopeData};
use mealy_cov::merge::{merge_coverage, GroupCoverage, MergeFlags};
use mealy_cov::typeck::check_script;
use num::BigInt;

/// A script with one module `top`: signal `a` (7:0), record `r` sampled
/// from it, and one group of the given kind and width.
fn one_group_script(width: i64, pred: ScopePred, bits: bool) -> Script {
    let (st, a, r) = simple_table();
    let kind = if bits {
        GroupKind::BitsRecord(r)
    } else {
        GroupKind::Recs(vec![r])
    };
    let m = module(
        "top",
        vec![block(None, vec![record(sym(a), r)])],
        vec![r],
        vec![group("g", width, pred, kind)],
    );
    script(st, vec![m], vec![])
}

fn one_scope_dump(test_count: u64, scope: &str, data: MemScopeData) -> MemDump {
    MemDump {
        test_count,
        modules: vec![MemModuleData {
            scopes: vec![(scope.to_string(), data)],
        }],
    }
}

#[test]
fn observed_values_merge_into_recs() {
    let s = one_group_script(8, ScopePred::Any, false);
    let checked = check_script(&s).unwrap();
    let mut sd = MemScopeData::new();
    sd.insert(0, vec![3, 255]);
    let dump = one_scope_dump(17, "top.dut", sd);
    let coverage = merge_coverage(&checked, &dump, MergeFlags::empty()).unwrap();
    assert_eq!(coverage.test_count, 17);
    assert_eq!(coverage.modules.len(), 1);
    assert_eq!(coverage.modules[0].name, intern("top"));
    let scope = &coverage.modules[0].scopes[0];
    assert_eq!(scope.scope, "top.dut");
    assert_eq!(scope.groups.len(), 1);
    assert_eq!(scope.groups[0].0, intern("g"));
    match scope.groups[0].1 {
        GroupCoverage::Recs {
            ref records,
            ref values,
        } => {
            assert_eq!(records, &vec![intern("r")]);
            let expected: Vec<BigInt> = vec![BigInt::from(3), BigInt::from(255)];
            assert_eq!(values.iter().cloned().collect::<Vec<_>>(), expected);
        }
        ref other => panic!("expected Recs coverage, got {:?}", other),
    }
}

#[test]
fn oversized_observed_value_fails() {
    let s = one_group_script(8, ScopePred::Any, false);
    let checked = check_script(&s).unwrap();
    let mut sd = MemScopeData::new();
    sd.insert(0, vec![256]);
    let dump = one_scope_dump(1, "top.dut", sd);
    let err = merge_coverage(&checked, &dump, MergeFlags::empty()).unwrap_err();
    assert!(err.message.contains("wider than width 8"));
}

#[test]
fn bits_record_splits_and_tolerates_padding() {
    let s = one_group_script(4, ScopePred::Any, true);
    let checked = check_script(&s).unwrap();
    let mut sd = MemScopeData::new();
    // Ones channel of group 0; 4 and 67 are padding artifacts.
    sd.insert(0, vec![0, 1, 4, 67]);
    // Zeros channel of group 0; 66 is a padding artifact.
    sd.insert(-1, vec![2, 66]);
    let dump = one_scope_dump(1, "top.dut", sd);
    let coverage = merge_coverage(&checked, &dump, MergeFlags::empty()).unwrap();
    match coverage.modules[0].scopes[0].groups[0].1 {
        GroupCoverage::BRec {
            record,
            ref zeros,
            ref ones,
        } => {
            assert_eq!(record, intern("r"));
            assert_eq!(ones.iter().copied().collect::<Vec<_>>(), vec![0, 1]);
            assert_eq!(zeros.iter().copied().collect::<Vec<_>>(), vec![2]);
        }
        ref other => panic!("expected BRec coverage, got {:?}", other),
    }
}

#[test]
fn bit_index_boundaries() {
    // Width 4: index 3 is kept, 4 and 67 are padding, 68 and -1 are corrupt.
    for (index, expect) in vec![
        (3, Some(vec![3])),
        (4, Some(vec![])),
        (67, Some(vec![])),
        (68, None),
        (-1, None),
    ] {
        let s = one_group_script(4, ScopePred::Any, true);
        let checked = check_script(&s).unwrap();
        let mut sd = MemScopeData::new();
        sd.insert(0, vec![index]);
        let dump = one_scope_dump(1, "top.dut", sd);
        let result = merge_coverage(&checked, &dump, MergeFlags::empty());
        match expect {
            Some(ones) => match result.unwrap().modules[0].scopes[0].groups[0].1 {
                GroupCoverage::BRec { ones: ref o, .. } => {
                    assert_eq!(o.iter().copied().collect::<Vec<_>>(), ones);
                }
                ref other => panic!("expected BRec coverage, got {:?}", other),
            },
            None => {
                let err = result.unwrap_err();
                if index < 0 {
                    assert!(err.message.contains("negative index"));
                } else {
                    assert!(err.message.contains("too big for the width"));
                }
            }
        }
    }
}

#[test]
fn non_matching_scope_is_bad_scope() {
    let s = one_group_script(8, ScopePred::Exact(intern("top.core")), false);
    let checked = check_script(&s).unwrap();
    let mut sd = MemScopeData::new();
    sd.insert(0, vec![5]);
    let dump = one_scope_dump(1, "top.io", sd);
    let coverage = merge_coverage(&checked, &dump, MergeFlags::empty()).unwrap();
    // The placeholder never carries observed data.
    assert_eq!(
        coverage.modules[0].scopes[0].groups[0].1,
        GroupCoverage::BadScope
    );
}

#[test]
fn prefix_predicate_matches_below() {
    let s = one_group_script(8, ScopePred::Prefix(intern("top.core")), false);
    let checked = check_script(&s).unwrap();
    let mut sd = MemScopeData::new();
    sd.insert(0, vec![5]);
    let dump = one_scope_dump(1, "top.core.alu", sd);
    let coverage = merge_coverage(&checked, &dump, MergeFlags::empty()).unwrap();
    match coverage.modules[0].scopes[0].groups[0].1 {
        GroupCoverage::Recs { ref values, .. } => assert_eq!(values.len(), 1),
        ref other => panic!("expected Recs coverage, got {:?}", other),
    }
}

#[test]
fn group_key_at_group_count_fails() {
    // One declared group means the only valid key is 0.
    let s = one_group_script(8, ScopePred::Any, false);
    let checked = check_script(&s).unwrap();
    let mut sd = MemScopeData::new();
    sd.insert(1, vec![5]);
    let dump = one_scope_dump(1, "top.dut", sd);
    let err = merge_coverage(&checked, &dump, MergeFlags::empty()).unwrap_err();
    assert!(err.message.contains("references group 1"));
    assert!(err.message.contains("declares only 1 groups"));
}

#[test]
fn unseen_scopes_are_absent() {
    let s = one_group_script(8, ScopePred::Any, false);
    let checked = check_script(&s).unwrap();
    let dump = MemDump {
        test_count: 3,
        modules: vec![MemModuleData { scopes: vec![] }],
    };
    let coverage = merge_coverage(&checked, &dump, MergeFlags::empty()).unwrap();
    assert_eq!(coverage.test_count, 3);
    assert!(coverage.modules[0].scopes.is_empty());
}

#[test]
fn module_count_mismatch_is_fatal_unless_lenient() {
    let s = one_group_script(8, ScopePred::Any, false);
    let checked = check_script(&s).unwrap();
    let dump = MemDump {
        test_count: 1,
        modules: vec![
            MemModuleData { scopes: vec![] },
            MemModuleData { scopes: vec![] },
        ],
    };
    let err = merge_coverage(&checked, &dump, MergeFlags::empty()).unwrap_err();
    assert!(err.message.contains("2 modules"));
    assert!(err.message.contains("declares 1"));

    let coverage = merge_coverage(&checked, &dump, MergeFlags::LENIENT_MODULES).unwrap();
    assert_eq!(coverage.modules.len(), 1);

    // The other direction: a dump that is too short.
    let dump = MemDump {
        test_count: 1,
        modules: vec![],
    };
    assert!(merge_coverage(&checked, &dump, MergeFlags::empty()).is_err());
    let coverage = merge_coverage(&checked, &dump, MergeFlags::LENIENT_MODULES).unwrap();
    assert!(coverage.modules.is_empty());
}

#[test]
fn wide_values_survive_the_merge() {
    // Values beyond the host integer width must come through untruncated.
    let s = one_group_script(100, ScopePred::Any, false);
    let checked = check_script(&s).unwrap();
    let wide: BigInt = (BigInt::from(1) << 100) - 1;
    let mut sd = MemScopeData::new();
    sd.insert(0, vec![wide.clone()]);
    let dump = one_scope_dump(1, "top.dut", sd);
    let coverage = merge_coverage(&checked, &dump, MergeFlags::empty()).unwrap();
    match coverage.modules[0].scopes[0].groups[0].1 {
        GroupCoverage::Recs { ref values, .. } => assert!(values.contains(&wide)),
        ref other => panic!("expected Recs coverage, got {:?}", other),
    }
}

#[test]
fn coverage_serializes_for_the_renderer() {
    let s = one_group_script(8, ScopePred::Any, false);
    let checked = check_script(&s).unwrap();
    let mut sd = MemScopeData::new();
    sd.insert(0, vec![3]);
    let dump = one_scope_dump(2, "top.dut", sd);
    let coverage = merge_coverage(&checked, &dump, MergeFlags::empty()).unwrap();
    let json = serde_json::to_string(&coverage).unwrap();
    assert!(json.contains("\"top.dut\""));
    assert!(json.contains("\"test_count\":2"));
}
