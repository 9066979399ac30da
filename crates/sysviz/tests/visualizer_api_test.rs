//! Integration tests for the public visualization API
//!
//! These cover the pieces that run without an installed kernel: discovery,
//! request construction, and the standalone document generator.

use std::fs;

use sysviz::{View, VizError, VizRequest, fallback, locate};

const MODEL: &str = "package Robot {\n  part def Arm {\n    part joints : Joint[6];\n  }\n  part def Joint;\n}\n";

#[test]
fn discovery_and_combination_feed_the_request() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("sub")).unwrap();
    fs::write(tmp.path().join("robot.sysml"), MODEL).unwrap();
    fs::write(tmp.path().join("sub/extra.sysml"), "package Extra {}\n").unwrap();

    let models = locate::find_models(tmp.path());
    assert_eq!(models.len(), 2);

    let source = locate::combine_sources(&models).unwrap();
    assert_eq!(locate::primary_package(&source).as_deref(), Some("Robot"));

    let request = VizRequest::new(View::Interconnection, None, None).unwrap();
    assert_eq!(
        request.magic("Robot"),
        "%viz --view Interconnection Robot"
    );
}

#[test]
fn request_validation_runs_before_any_process_exists() {
    let err = "Orbit".parse::<View>().unwrap_err();
    assert!(matches!(err, VizError::InvalidRequest(_)));

    let err = VizRequest::new(View::Tree, None, Some(String::new())).unwrap_err();
    assert!(matches!(err, VizError::InvalidRequest(_)));
}

#[test]
fn standalone_document_matches_across_runs() {
    let first = fallback::plantuml_source(MODEL).unwrap();
    let second = fallback::plantuml_source(MODEL).unwrap();
    assert_eq!(first, second);
    assert!(first.contains("package \"Robot\""));
    assert!(first.contains("joints: Joint[6]"));
}
