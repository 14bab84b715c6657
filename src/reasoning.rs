//! Rule-based reasons and confidence scoring
//!
//! Turns the binary cascade verdict into an explainable finding. The rules
//! are deterministic and their order is fixed: it drives both the confidence
//! score and reproducible output.

const SENSITIVE_PATHS: [&str; 3] = ["/admin", "/login", "/wp-admin"];
const HIGH_RISK_METHODS: [&str; 3] = ["POST", "PUT", "DELETE"];

/// Reason used for every structurally rejected line.
pub const REJECTED_REASON: &str = "Invalid or unsupported log format";

/// Fallback when the verdict came purely from the models.
pub const STATISTICAL_REASON: &str = "Statistical anomaly";

/// Ordered list of matched heuristics for a parsed request.
pub fn reasons(method: &str, path: &str, status: u32) -> Vec<&'static str> {
    let mut out = Vec::new();

    if SENSITIVE_PATHS.contains(&path) {
        out.push("Sensitive endpoint access");
    }
    if path.contains("..") {
        out.push("Path traversal attempt");
    }
    if status >= 400 {
        out.push("Error response pattern");
    }
    if HIGH_RISK_METHODS.contains(&method) {
        out.push("High-risk HTTP method");
    }
    if out.is_empty() {
        out.push(STATISTICAL_REASON);
    }

    out
}

/// Confidence in the finding, 0-100.
///
/// Structural rejection is certain (100). Cascade-derived findings start at
/// 40, gain 15 per matched reason and cap at 98: full certainty is reserved
/// for rejections.
pub fn confidence(n_reasons: usize, rejected: bool) -> u8 {
    if rejected {
        return 100;
    }
    (40 + 15 * n_reasons as u32).min(98) as u8
}
