/// Default base URL for the solving service.
pub const DEFAULT_SOLVER_BASE_URL: &str = "http://localhost:8000";

#[must_use]
pub fn solve_url(base: &str) -> String {
    join(base, "solve")
}

#[must_use]
pub fn solve_stream_url(base: &str) -> String {
    join(base, "solve/stream")
}

#[must_use]
pub fn feedback_url(base: &str) -> String {
    join(base, "feedback")
}

#[must_use]
pub fn health_url(base: &str) -> String {
    join(base, "health")
}

fn join(base: &str, path: &str) -> String {
    let base = base.trim();
    let base = if base.is_empty() {
        DEFAULT_SOLVER_BASE_URL
    } else {
        base
    };

    format!("{}/{path}", base.trim_end_matches('/'))
}
