use prosa::session::{Execution, Session};

/// Run localized source in a fresh session, batch mode.
pub fn run(source: &str) -> Execution {
    let mut session = Session::new();
    session
        .execute(source, "<teste>")
        .expect("unexpected termination request")
}

/// Run localized source and return its stdout, asserting success.
pub fn output(source: &str) -> String {
    let execution = run(source);
    assert!(
        execution.succeeded(),
        "execution failed: {:?}",
        execution.failure
    );
    execution.stdout
}

/// Run localized source and return its failure descriptor.
pub fn failure(source: &str) -> prosa::session::Failure {
    let execution = run(source);
    execution
        .failure
        .unwrap_or_else(|| panic!("expected a failure, got stdout {:?}", execution.stdout))
}
