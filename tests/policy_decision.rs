use gnre_tables::policy::{Disposition, FaultKind, Step, decide};

#[test]
fn category_level_faults_skip_the_category() {
    for kind in [FaultKind::NotFound, FaultKind::Timeout, FaultKind::Intercepted] {
        assert_eq!(decide(Step::OpenCategory, kind), Disposition::SkipCategory);
        assert_eq!(decide(Step::ListJurisdictions, kind), Disposition::SkipCategory);
    }
}

#[test]
fn pair_level_faults_skip_the_pair() {
    assert_eq!(decide(Step::SelectJurisdiction, FaultKind::Script), Disposition::SkipPair);
    assert_eq!(decide(Step::TriggerPrint, FaultKind::Timeout), Disposition::SkipPair);
    assert_eq!(decide(Step::TriggerPrint, FaultKind::Intercepted), Disposition::SkipPair);
    assert_eq!(decide(Step::Merge, FaultKind::Store), Disposition::SkipPair);
}

#[test]
fn table_and_close_faults_let_the_pair_finish() {
    assert_eq!(decide(Step::AwaitTable, FaultKind::Timeout), Disposition::Proceed);
    assert_eq!(decide(Step::EnterFrame, FaultKind::NotFound), Disposition::Proceed);
    assert_eq!(decide(Step::Extract, FaultKind::Malformed), Disposition::Proceed);
    assert_eq!(decide(Step::Extract, FaultKind::Script), Disposition::Proceed);
    assert_eq!(decide(Step::CloseDialogs, FaultKind::Intercepted), Disposition::Proceed);
}

#[test]
fn lost_session_aborts_from_any_step() {
    assert_eq!(decide(Step::CloseDialogs, FaultKind::SessionLost), Disposition::AbortRun);
    assert_eq!(decide(Step::SelectJurisdiction, FaultKind::SessionLost), Disposition::AbortRun);
    assert_eq!(decide(Step::Extract, FaultKind::SessionLost), Disposition::AbortRun);
}
