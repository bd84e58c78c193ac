use super::*;
use crate::foundation::core::SliceIndex;

#[test]
fn helper_constructors_format_their_category() {
    assert_eq!(
        RegError::validation("bad stack").to_string(),
        "validation error: bad stack"
    );
    assert_eq!(
        RegError::evaluation("bad expr").to_string(),
        "evaluation error: bad expr"
    );
    assert_eq!(
        RegError::align("diverged").to_string(),
        "alignment error: diverged"
    );
    assert_eq!(
        RegError::serde("bad json").to_string(),
        "serialization error: bad json"
    );
}

#[test]
fn unresolved_reference_reports_raw_coordinates() {
    let err = RegError::UnresolvedReference {
        at: SliceIndex::new(1, 0, 0),
        referenced: (-1, 0, 7),
    };
    assert_eq!(
        err.to_string(),
        "unresolved transformation reference for slice (c=1, z=0, t=0): \
         no usable slice at (c=-1, z=0, t=7)"
    );
}

#[test]
fn integrity_report_lists_every_violation() {
    let report = GraphIntegrityReport {
        violations: vec![
            GraphViolation::ConflictingSource(SliceIndex::new(0, 0, 1)),
            GraphViolation::UnresolvedInput(SliceIndex::new(1, 0, 0)),
            GraphViolation::Cycle(SliceIndex::new(1, 2, 3)),
        ],
    };
    assert_eq!(
        RegError::GraphIntegrity(report).to_string(),
        "transformation graph is invalid: \
         conflicting transformation source for slice (c=0, z=0, t=1); \
         unresolved transformation input for slice (c=1, z=0, t=0); \
         dependency cycle through slice (c=1, z=2, t=3)"
    );
}

#[test]
fn cancelled_is_a_distinct_variant() {
    let err = RegError::Cancelled;
    assert!(matches!(err, RegError::Cancelled));
    assert_eq!(err.to_string(), "registration run cancelled");
}
