//! Batch orchestrator: raw lines in, one finding per line out

use crate::bundle::ModelBundle;
use crate::cascade::Verdict;
use crate::error::Result;
use crate::parser::{self, Protocol};
use crate::reasoning;
use crate::validation::LogValidator;
use serde::{Deserialize, Serialize};

/// Triage status of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingStatus {
    Rejected,
    Normal,
    Anomaly,
}

impl From<Verdict> for FindingStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Normal => FindingStatus::Normal,
            Verdict::Anomaly => FindingStatus::Anomaly,
        }
    }
}

/// Per-line triage record returned to the caller, serialized verbatim on
/// the wire as `{log, status, protocol, reason, confidence}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub log: String,
    pub status: FindingStatus,
    pub protocol: Protocol,
    pub reason: String,
    pub confidence: u8,
}

impl Finding {
    fn rejected(log: &str) -> Self {
        Self {
            log: log.to_string(),
            status: FindingStatus::Rejected,
            protocol: Protocol::NotApplicable,
            reason: reasoning::REJECTED_REASON.to_string(),
            confidence: reasoning::confidence(0, true),
        }
    }
}

/// Analyzes a batch of raw log lines.
///
/// Returns exactly one finding per input line, in input order. Structurally
/// invalid lines are rejected up front and never reach the models; when no
/// line survives validation the cascade and vectorizer are not invoked at
/// all. Only collaborator failures (unfitted or incompatible models) error.
pub fn analyze_lines(bundle: &ModelBundle, lines: &[String]) -> Result<Vec<Finding>> {
    let validator = LogValidator::new();

    let mut findings: Vec<Option<Finding>> = vec![None; lines.len()];
    let mut valid: Vec<&str> = Vec::new();
    let mut index_map: Vec<usize> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if validator.is_valid(line) {
            valid.push(line);
            index_map.push(i);
        } else {
            findings[i] = Some(Finding::rejected(line));
        }
    }

    if !valid.is_empty() {
        let features = bundle.build_features(&valid)?;
        let outcome = bundle.classify(&features)?;

        for (slot, (&original_idx, line)) in index_map.iter().zip(&valid).enumerate() {
            let parsed = parser::parse(line);
            let reasons = reasoning::reasons(&parsed.method, &parsed.path, parsed.status);
            let confidence = reasoning::confidence(reasons.len(), false);

            findings[original_idx] = Some(Finding {
                log: line.to_string(),
                status: outcome.labels[slot].into(),
                protocol: parsed.protocol,
                reason: reasons.join(", "),
                confidence,
            });
        }
    }

    Ok(findings
        .into_iter()
        .map(|f| f.expect("every input line yields exactly one finding"))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_invalid_batch_never_touches_models() {
        // The bundle is unfitted: any model or vectorizer call would error,
        // so success proves the short-circuit.
        let bundle = ModelBundle::new();
        let lines = vec!["garbage".to_string(), String::new(), "also not a log".to_string()];

        let findings = analyze_lines(&bundle, &lines).unwrap();
        assert_eq!(findings.len(), 3);
        for (finding, line) in findings.iter().zip(&lines) {
            assert_eq!(finding.status, FindingStatus::Rejected);
            assert_eq!(finding.confidence, 100);
            assert_eq!(finding.protocol, Protocol::NotApplicable);
            assert_eq!(finding.reason, reasoning::REJECTED_REASON);
            assert_eq!(&finding.log, line);
        }
    }

    #[test]
    fn test_unfitted_bundle_with_valid_lines_errors() {
        let bundle = ModelBundle::new();
        let lines =
            vec![r#"10.0.0.1 - - [10/Oct/2023:13:55:36 -0700] "GET / HTTP/1.1" 200"#.to_string()];
        assert!(analyze_lines(&bundle, &lines).is_err());
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let bundle = ModelBundle::new();
        assert!(analyze_lines(&bundle, &[]).unwrap().is_empty());
    }
}
