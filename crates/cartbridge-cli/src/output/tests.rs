// Tests for output formatting
//
// These cover the human and machine renderings of transformation outcomes,
// rule-set problems and migration logs.

use super::*;
use cartbridge_core::mapping::MappingError;
use cartbridge_core::MigrationStatus;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

fn failure() -> RuleFailure {
    RuleFailure {
        rule_index: 5,
        source_field: "price[0].gross".to_string(),
        dest_field: "variants[0].price".to_string(),
        error: MappingError::RequiredFieldMissing {
            field: "price[0].gross".to_string(),
        },
    }
}

fn aborted() -> TransformOutcome {
    TransformOutcome {
        document: json!({"title": "Trail Runner"}),
        failure: Some(failure()),
        applied: 2,
        skipped: 3,
    }
}

#[test]
fn test_outcome_human_success() {
    let outcome = TransformOutcome {
        document: json!({"title": "Trail Runner"}),
        failure: None,
        applied: 1,
        skipped: 0,
    };
    let formatted = OutputFormat::Human.format_outcome(&outcome, false).unwrap();
    assert!(formatted.contains("Transformation succeeded (1 applied, 0 skipped)"));
    assert!(formatted.contains("\"title\": \"Trail Runner\""));
}

#[test]
fn test_outcome_human_failure_hides_partial_by_default() {
    let formatted = OutputFormat::Human.format_outcome(&aborted(), false).unwrap();
    assert!(formatted.contains("aborted at rule 5"));
    assert!(formatted.contains("Kind: required_field_missing"));
    assert!(formatted.contains("Required field price[0].gross not found in source data"));
    assert!(!formatted.contains("Trail Runner"));

    let with_partial = OutputFormat::Human.format_outcome(&aborted(), true).unwrap();
    assert!(with_partial.contains("Partial document (2 rule(s) applied)"));
    assert!(with_partial.contains("Trail Runner"));
}

#[test]
fn test_outcome_machine_shape() {
    let value = outcome_to_value(&aborted(), false);
    assert_eq!(value["success"], json!(false));
    assert_eq!(value["document"], Value::Null);
    assert_eq!(value["failure"]["rule_index"], json!(5));
    assert_eq!(value["failure"]["kind"], json!("required_field_missing"));

    let value = outcome_to_value(&aborted(), true);
    assert_eq!(value["document"], json!({"title": "Trail Runner"}));

    let formatted = OutputFormat::Json.format_outcome(&aborted(), true).unwrap();
    let parsed: Value = serde_json::from_str(&formatted).unwrap();
    assert_eq!(parsed["skipped"], json!(3));
}

#[test]
fn test_rule_problems_human() {
    assert_eq!(
        OutputFormat::Human.format_rule_problems(4, &[]).unwrap(),
        "✅ All 4 rule(s) are valid\n"
    );

    let formatted = OutputFormat::Human
        .format_rule_problems(16, &[failure()])
        .unwrap();
    assert!(formatted.contains("1 problem(s) in 16 rule(s)"));
    assert!(formatted.contains("rule 5 (price[0].gross -> variants[0].price)"));
}

#[test]
fn test_migration_logs_table() {
    let mut log = MigrationLog::new(10, "p-1", json!({}));
    log.id = 1;
    log.mark_in_progress("local-run-1-1").unwrap();
    log.mark_failed("destination rejected").unwrap();

    let formatted = OutputFormat::Human.format_migration_logs(&[log.clone()]).unwrap();
    let lines: Vec<&str> = formatted.lines().collect();
    assert!(lines[0].starts_with("ID"));
    assert!(lines[2].contains("failed"));
    assert!(lines[2].contains("destination rejected"));

    let yaml = OutputFormat::Yaml.format_migration_logs(&[log]).unwrap();
    assert!(yaml.contains("status: failed"));
    assert_eq!(MigrationStatus::Failed.as_str(), "failed");
}

#[test]
fn test_writer_suppresses_chatter_for_machine_formats() {
    let buffer = SharedBuffer::default();
    let mut writer =
        OutputWriter::with_writer(OutputFormat::Json, false, false, Box::new(buffer.clone()));

    writer.info("loading").unwrap();
    writer.success("done").unwrap();
    writer.section("Result").unwrap();
    writer.data(&json!({"ok": true})).unwrap();

    assert_eq!(buffer.contents(), "{\"ok\":true}\n");
}

#[test]
fn test_writer_human_messages() {
    let buffer = SharedBuffer::default();
    let mut writer =
        OutputWriter::with_writer(OutputFormat::Human, false, false, Box::new(buffer.clone()));

    writer.info("loading").unwrap();
    writer.warning("careful").unwrap();
    writer.section("Result").unwrap();

    assert_eq!(
        buffer.contents(),
        "INFO: loading\nWARNING: careful\n\n=== Result ===\n"
    );
}

#[test]
fn test_quiet_writer_keeps_errors() {
    let buffer = SharedBuffer::default();
    let mut writer =
        OutputWriter::with_writer(OutputFormat::Human, false, true, Box::new(buffer.clone()));

    writer.info("loading").unwrap();
    writer.error("broken").unwrap();

    assert_eq!(buffer.contents(), "ERROR: broken\n");
}
