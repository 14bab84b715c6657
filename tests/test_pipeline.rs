//! Integration test: end-to-end triage pipeline

use logwarden::prelude::*;

fn normal_corpus() -> Vec<String> {
    let paths = ["/index.html", "/about", "/static/app.css", "/api/items"];
    let mut lines = Vec::new();
    for i in 0..100 {
        lines.push(format!(
            r#"192.168.1.{} - - [10/Oct/2023:13:{:02}:{:02} -0700] "GET {} HTTP/1.1" 200"#,
            i % 25,
            i % 60,
            (i * 7) % 60,
            paths[i % paths.len()],
        ));
    }
    lines
}

fn fitted_bundle() -> ModelBundle {
    let corpus = normal_corpus();
    let refs: Vec<&str> = corpus.iter().map(|s| s.as_str()).collect();
    let mut bundle = ModelBundle::new();
    bundle.fit(&refs).unwrap();
    bundle
}

#[test]
fn test_one_finding_per_line_in_input_order() {
    let bundle = fitted_bundle();
    let lines = vec![
        "not a log line".to_string(),
        r#"192.168.1.3 - - [10/Oct/2023:13:05:14 -0700] "GET /index.html HTTP/1.1" 200"#
            .to_string(),
        "@@@".to_string(),
        r#"192.168.1.4 - - [10/Oct/2023:13:06:21 -0700] "GET /about HTTP/1.1" 200"#.to_string(),
        String::new(),
    ];

    let findings = analyze_lines(&bundle, &lines).unwrap();
    assert_eq!(findings.len(), lines.len());
    for (finding, line) in findings.iter().zip(&lines) {
        assert_eq!(&finding.log, line);
    }
    // Invalid lines stay in place, not grouped up front.
    assert_eq!(findings[0].status, FindingStatus::Rejected);
    assert_ne!(findings[1].status, FindingStatus::Rejected);
    assert_eq!(findings[2].status, FindingStatus::Rejected);
    assert_ne!(findings[3].status, FindingStatus::Rejected);
    assert_eq!(findings[4].status, FindingStatus::Rejected);
}

#[test]
fn test_rejected_finding_invariants() {
    let bundle = fitted_bundle();
    let lines = vec!["garbage input".to_string()];

    let findings = analyze_lines(&bundle, &lines).unwrap();
    let f = &findings[0];
    assert_eq!(f.status, FindingStatus::Rejected);
    assert_eq!(f.confidence, 100);
    assert_eq!(f.protocol, Protocol::NotApplicable);
    assert_eq!(f.reason, "Invalid or unsupported log format");
}

#[test]
fn test_every_classified_finding_has_a_reason() {
    let bundle = fitted_bundle();
    let lines = vec![
        r#"192.168.1.9 - - [10/Oct/2023:13:10:00 -0700] "GET /index.html HTTP/1.1" 200"#
            .to_string(),
        r#"192.168.1.9 - - [10/Oct/2023:13:10:01 -0700] "POST /admin HTTP/1.1" 403"#.to_string(),
    ];

    let findings = analyze_lines(&bundle, &lines).unwrap();
    for f in &findings {
        assert!(!f.reason.is_empty());
        assert!(f.confidence <= 98);
    }
    assert_eq!(findings[0].reason, "Statistical anomaly");
    assert_eq!(
        findings[1].reason,
        "Sensitive endpoint access, Error response pattern, High-risk HTTP method"
    );
    assert_eq!(findings[1].confidence, 85);
}

#[test]
fn test_path_traversal_reason() {
    let bundle = fitted_bundle();
    let lines = vec![
        r#"10.0.0.2 - - [10/Oct/2023:13:11:00 -0700] "GET /files/../etc/passwd HTTP/1.1" 200"#
            .to_string(),
    ];

    let findings = analyze_lines(&bundle, &lines).unwrap();
    assert!(findings[0].reason.contains("Path traversal attempt"));
}

#[test]
fn test_cascade_narrows_monotonically() {
    let bundle = fitted_bundle();
    let mut lines = normal_corpus();
    lines.truncate(20);
    lines.push(
        r#"6.6.6.6 - - [10/Oct/2023:03:00:00 -0700] "DELETE /wp-admin/setup.php HTTP/1.0" 500"#
            .to_string(),
    );
    let refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();

    let features = bundle.build_features(&refs).unwrap();
    let outcome = bundle.classify(&features).unwrap();

    let rows: Vec<usize> = (0..refs.len()).collect();
    assert!(outcome.stage_a_survivors.iter().all(|i| rows.contains(i)));
    assert!(outcome
        .stage_b_survivors
        .iter()
        .all(|i| outcome.stage_a_survivors.contains(i)));
    assert!(outcome
        .stage_c_survivors
        .iter()
        .all(|i| outcome.stage_b_survivors.contains(i)));
}

#[test]
fn test_single_valid_line_skips_density_stage() {
    let bundle = fitted_bundle();
    let lines =
        vec![r#"192.168.1.3 - - [10/Oct/2023:13:05:14 -0700] "GET /index.html HTTP/1.1" 200"#];

    let features = bundle.build_features(&lines).unwrap();
    let outcome = bundle.classify(&features).unwrap();
    // Stage B has no neighborhood and must pass Stage A's set through.
    assert_eq!(outcome.stage_b_survivors, outcome.stage_a_survivors);
}

#[test]
fn test_all_invalid_batch_short_circuits() {
    // Unfitted bundle: any model invocation would error, so a successful
    // all-rejected response proves the cascade was never reached.
    let bundle = ModelBundle::new();
    let lines = vec!["x".to_string(), "y".to_string()];

    let findings = analyze_lines(&bundle, &lines).unwrap();
    assert!(findings.iter().all(|f| f.status == FindingStatus::Rejected));
}

#[test]
fn test_familiar_traffic_is_mostly_normal() {
    let bundle = fitted_bundle();
    let lines: Vec<String> = normal_corpus().into_iter().take(30).collect();

    let findings = analyze_lines(&bundle, &lines).unwrap();
    let normal = findings
        .iter()
        .filter(|f| f.status == FindingStatus::Normal)
        .count();
    assert!(normal > 20, "expected most familiar lines normal, got {normal}");
}

#[test]
fn test_finding_serializes_wire_record() {
    let bundle = fitted_bundle();
    let lines =
        vec![r#"192.168.1.3 - - [10/Oct/2023:13:05:14 -0700] "GET /index.html HTTP/1.1" 200"#
            .to_string()];

    let findings = analyze_lines(&bundle, &lines).unwrap();
    let value = serde_json::to_value(&findings[0]).unwrap();
    assert!(value.get("log").is_some());
    assert!(value.get("status").is_some());
    assert_eq!(value["protocol"], "HTTP");
    assert!(value.get("reason").is_some());
    assert!(value.get("confidence").is_some());
}
