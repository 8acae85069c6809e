//! Integration tests for the riskreg CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get a riskreg command isolated from the user's environment
fn riskreg() -> Command {
    let mut cmd = Command::cargo_bin("riskreg").unwrap();
    cmd.env_remove("RISKREG_DATA")
        .env_remove("RISKREG_AUTHOR")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create a workspace seeded with the demo dataset
fn setup_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    riskreg()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success();
    tmp
}

/// Helper to create an empty workspace
fn setup_empty_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    riskreg()
        .current_dir(tmp.path())
        .args(["init", "--empty"])
        .assert()
        .success();
    tmp
}

/// Run a command in the workspace and return trimmed stdout
fn stdout_of(tmp: &TempDir, args: &[&str]) -> String {
    let output = riskreg().current_dir(tmp.path()).args(args).output().unwrap();
    assert!(
        output.status.success(),
        "command {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn read_document(tmp: &TempDir) -> serde_json::Value {
    let content = fs::read_to_string(tmp.path().join(".riskreg/db.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn find<'a>(doc: &'a serde_json::Value, collection: &str, id: &str) -> &'a serde_json::Value {
    doc[collection]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["id"] == id)
        .unwrap_or_else(|| panic!("{} {} not found", collection, id))
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    riskreg()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("risk"))
        .stdout(predicate::str::contains("project"))
        .stdout(predicate::str::contains("dashboard"));
}

#[test]
fn test_version_displays() {
    riskreg()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("riskreg"));
}

#[test]
fn test_unknown_command_fails() {
    riskreg().arg("frobnicate").assert().failure();
}

#[test]
fn test_outside_workspace_fails() {
    let tmp = TempDir::new().unwrap();
    riskreg()
        .current_dir(tmp.path())
        .args(["risk", "list"])
        .assert()
        .failure();
}

// ============================================================================
// Init Tests
// ============================================================================

#[test]
fn test_init_creates_workspace() {
    let tmp = TempDir::new().unwrap();

    riskreg()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized risk register"));

    assert!(tmp.path().join(".riskreg/config.yaml").exists());
    assert!(tmp.path().join(".riskreg/db.json").exists());

    let doc = read_document(&tmp);
    assert_eq!(doc["risks"].as_array().unwrap().len(), 5);
    assert_eq!(doc["projects"].as_array().unwrap().len(), 4);
    assert_eq!(doc["config"]["projectArchiveMinutes"], 1);
}

#[test]
fn test_init_empty_register() {
    let tmp = setup_empty_workspace();
    let doc = read_document(&tmp);
    assert!(doc["risks"].as_array().unwrap().is_empty());
    assert!(doc["companies"].as_array().unwrap().is_empty());
}

#[test]
fn test_init_twice_keeps_existing_document() {
    let tmp = setup_workspace();
    riskreg()
        .current_dir(tmp.path())
        .args(["risk", "rm", "RSK005", "-y"])
        .assert()
        .success();

    riskreg()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    let doc = read_document(&tmp);
    assert_eq!(doc["risks"].as_array().unwrap().len(), 4);
}

#[test]
fn test_data_flag_bypasses_workspace() {
    let tmp = TempDir::new().unwrap();
    let data = tmp.path().join("register.json");

    // A missing document is seeded on first use
    riskreg()
        .arg("--data")
        .arg(&data)
        .args(["-f", "json", "dashboard"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"openRiskCount\": 3"));

    assert!(data.exists());
}

// ============================================================================
// Dashboard Tests
// ============================================================================

#[test]
fn test_dashboard_counts_demo_data() {
    let tmp = setup_workspace();
    let out = stdout_of(&tmp, &["-f", "json", "dashboard"]);
    let dashboard: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(dashboard["openRiskCount"], 3);
    assert_eq!(dashboard["executionProjectCount"], 1);
    assert_eq!(dashboard["companyCount"], 2);
    assert_eq!(dashboard["staffCount"], 2);
}

#[test]
fn test_dashboard_text_output() {
    let tmp = setup_workspace();
    riskreg()
        .current_dir(tmp.path())
        .args(["dashboard", "--detail"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Open risks"))
        .stdout(predicate::str::contains("Risks by level"));
}

// ============================================================================
// Reference Collection Tests
// ============================================================================

#[test]
fn test_staff_add_assigns_next_sequential_id() {
    let tmp = setup_workspace();
    let id = stdout_of(
        &tmp,
        &["-f", "id", "staff", "add", "Beatriz", "-e", "bia@empresa.com", "-c", "EMP001"],
    );
    assert_eq!(id, "COL003");

    riskreg()
        .current_dir(tmp.path())
        .args(["staff", "list", "--company", "EMP001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Beatriz"))
        .stdout(predicate::str::contains("Carlos"))
        .stdout(predicate::str::contains("Ana").not());
}

#[test]
fn test_company_add_and_list_formats() {
    let tmp = setup_empty_workspace();
    let id = stdout_of(&tmp, &["-f", "id", "company", "add", "Filial Sorriso"]);
    assert_eq!(id, "EMP001");

    let csv = stdout_of(&tmp, &["-f", "csv", "company", "list"]);
    assert!(csv.lines().next().unwrap().starts_with("id,"));
    assert!(csv.contains("Filial Sorriso"));

    let md = stdout_of(&tmp, &["-f", "md", "company", "list"]);
    assert!(md.contains("| Filial Sorriso"));
}

#[test]
fn test_company_add_rejects_duplicate_id() {
    let tmp = setup_workspace();
    riskreg()
        .current_dir(tmp.path())
        .args(["company", "add", "Clone", "--id", "EMP001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("EMP001"));
}

#[test]
fn test_empty_list_message() {
    let tmp = setup_empty_workspace();
    riskreg()
        .current_dir(tmp.path())
        .args(["risk", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No risks found."));
}

#[test]
fn test_category_kinds_are_separate() {
    let tmp = setup_empty_workspace();
    let general = stdout_of(&tmp, &["-f", "id", "category", "add", "Operational"]);
    let risk = stdout_of(&tmp, &["-f", "id", "category", "add", "Supply", "--risk"]);
    assert_eq!(general, "CAT001");
    assert_eq!(risk, "RCAT001");

    let listed = stdout_of(&tmp, &["-f", "id", "category", "list", "--risk"]);
    assert_eq!(listed, "RCAT001");
}

// ============================================================================
// Stakeholder Group Tests
// ============================================================================

#[test]
fn test_add_members_to_closed_group_fails() {
    let tmp = setup_workspace();
    riskreg()
        .current_dir(tmp.path())
        .args(["group", "add-members", "STKGRP001", "--staff", "COL002"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("closed"));
}

#[test]
fn test_reopened_group_accepts_members_once() {
    let tmp = setup_workspace();
    stdout_of(&tmp, &["group", "open", "STKGRP001"]);
    stdout_of(
        &tmp,
        &["group", "add-members", "STKGRP001", "--staff", "COL001,COL002"],
    );

    let doc = read_document(&tmp);
    let group = find(&doc, "stakeholderGroups", "STKGRP001");
    let staff: Vec<&str> = group["memberStaffIds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(staff, vec!["COL001", "COL002"]);
}

// ============================================================================
// Risk Tests
// ============================================================================

#[test]
fn test_risk_new_assesses_level() {
    let tmp = setup_workspace();
    let id = stdout_of(
        &tmp,
        &[
            "-f", "id", "risk", "new", "-t", "Flood in warehouse", "-c", "EMP002",
            "-p", "very_high", "-i", "high",
        ],
    );
    assert!(id.starts_with("RSK-"));

    let doc = read_document(&tmp);
    let risk = find(&doc, "risks", &id);
    assert_eq!(risk["riskLevel"], "High");
    assert_eq!(risk["status"], "open");
    assert_eq!(risk["history"][0]["event"], "Risk created");
}

#[test]
fn test_risk_edit_records_history() {
    let tmp = setup_workspace();
    riskreg()
        .current_dir(tmp.path())
        .args(["risk", "edit", "RSK001", "--probability", "very_high"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Probability: Medium → Very High | Risk level: Medium → High",
        ));

    let doc = read_document(&tmp);
    let risk = find(&doc, "risks", "RSK001");
    let history = risk["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1]["author"], "System");
    assert_eq!(risk["riskLevel"], "High");
}

#[test]
fn test_risk_edit_resolves_names() {
    let tmp = setup_workspace();
    stdout_of(&tmp, &["risk", "edit", "RSK001", "--analyst", "COL002"]);

    let history = stdout_of(&tmp, &["-f", "json", "risk", "history", "RSK001"]);
    assert!(history.contains("Analyst: Carlos → Ana"));
}

#[test]
fn test_risk_edit_without_changes_keeps_history() {
    let tmp = setup_workspace();
    riskreg()
        .current_dir(tmp.path())
        .args(["risk", "edit", "RSK001", "--status", "open"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unchanged"));

    let doc = read_document(&tmp);
    assert_eq!(find(&doc, "risks", "RSK001")["history"].as_array().unwrap().len(), 1);
}

#[test]
fn test_risk_edit_json_patch() {
    let tmp = setup_workspace();
    stdout_of(
        &tmp,
        &["risk", "edit", "RSK004", "--json", r#"{"status": "mitigating"}"#],
    );

    let doc = read_document(&tmp);
    let risk = find(&doc, "risks", "RSK004");
    assert_eq!(risk["status"], "mitigating");
    assert_eq!(risk["history"][1]["event"], "Status: Open → Mitigating");
}

#[test]
fn test_risk_edit_rejects_unknown_status() {
    let tmp = setup_workspace();
    riskreg()
        .current_dir(tmp.path())
        .args(["risk", "edit", "RSK001", "--status", "archived"])
        .assert()
        .failure();
}

#[test]
fn test_risk_list_filters() {
    let tmp = setup_workspace();
    let open = stdout_of(&tmp, &["risk", "list", "--status", "open", "--count"]);
    assert_eq!(open, "3");

    let high = stdout_of(&tmp, &["-f", "id", "risk", "list", "--level", "high"]);
    assert_eq!(high, "RSK005");

    let search = stdout_of(&tmp, &["-f", "id", "risk", "list", "--search", "NETWORK"]);
    assert_eq!(search, "RSK004");
}

#[test]
fn test_risk_show_missing() {
    let tmp = setup_workspace();
    riskreg()
        .current_dir(tmp.path())
        .args(["risk", "show", "RSK999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("RSK999"));
}

#[test]
fn test_risk_occurrence_appends_narrative() {
    let tmp = setup_workspace();
    stdout_of(
        &tmp,
        &[
            "risk", "occurrence", "RSK001",
            "--impediment", "Compressor stopped",
            "--actions", "Move stock to backup room",
            "--responsible", "COL002",
            "--item", "Compressor:1:1200",
        ],
    );

    let doc = read_document(&tmp);
    let risk = find(&doc, "risks", "RSK001");
    let last = risk["history"].as_array().unwrap().last().unwrap().clone();
    let event = last["event"].as_str().unwrap();
    assert!(event.contains("Compressor stopped"));
    assert_eq!(last["author"], "Ana");
}

#[test]
fn test_generate_project_from_risk() {
    let tmp = setup_workspace();
    let id = stdout_of(&tmp, &["-f", "id", "risk", "generate-project", "RSK004"]);
    assert!(id.starts_with("PRJ-"));

    let doc = read_document(&tmp);
    let project = find(&doc, "projects", &id);
    assert_eq!(project["riskId"], "RSK004");
    assert_eq!(project["stage"], "backlog");
    assert_eq!(project["title"], "IT network failure");
    assert_eq!(project["history"][0]["event"], "Generated from risk RSK004");

    let risk = find(&doc, "risks", "RSK004");
    let last = risk["history"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["event"], format!("Project {} generated", id));
}

// ============================================================================
// Project Tests
// ============================================================================

#[test]
fn test_project_stage_change_sets_closed_at() {
    let tmp = setup_workspace();
    riskreg()
        .current_dir(tmp.path())
        .args(["project", "edit", "PRJ002", "--stage", "done"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stage: Execution → Done"));

    let doc = read_document(&tmp);
    assert!(find(&doc, "projects", "PRJ002")["closedAt"].is_string());

    stdout_of(&tmp, &["project", "edit", "PRJ002", "--stage", "execution"]);
    let doc = read_document(&tmp);
    assert!(find(&doc, "projects", "PRJ002").get("closedAt").is_none());
}

#[test]
fn test_project_clear_deadline() {
    let tmp = setup_workspace();
    riskreg()
        .current_dir(tmp.path())
        .args(["project", "edit", "PRJ001", "--clear-deadline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("→ None"));

    let doc = read_document(&tmp);
    assert!(find(&doc, "projects", "PRJ001").get("deadline").is_none());

    riskreg()
        .current_dir(tmp.path())
        .args(["project", "edit", "PRJ001", "--clear-deadline", "--deadline", "2030-01-01"])
        .assert()
        .failure();
}

#[test]
fn test_project_advance() {
    let tmp = setup_workspace();
    stdout_of(&tmp, &["project", "advance", "PRJ004"]);

    let doc = read_document(&tmp);
    assert_eq!(find(&doc, "projects", "PRJ004")["stage"], "planning");

    riskreg()
        .current_dir(tmp.path())
        .args(["project", "advance", "PRJ003"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already Done"));
}

#[test]
fn test_project_soft_delete_hides_from_list() {
    let tmp = setup_workspace();
    stdout_of(&tmp, &["project", "rm", "PRJ004", "-y"]);

    let listed = stdout_of(&tmp, &["-f", "id", "project", "list"]);
    assert!(!listed.contains("PRJ004"));

    let with_deleted = stdout_of(&tmp, &["-f", "id", "project", "list", "--deleted"]);
    assert!(with_deleted.contains("PRJ004"));

    let doc = read_document(&tmp);
    assert_eq!(find(&doc, "projects", "PRJ004")["deleted"], true);
}

#[test]
fn test_project_purge_removes_record() {
    let tmp = setup_workspace();
    stdout_of(&tmp, &["project", "rm", "PRJ004", "--purge", "-y"]);

    let doc = read_document(&tmp);
    assert!(doc["projects"]
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["id"] != "PRJ004"));
}

#[test]
fn test_archive_sweep_respects_delay() {
    let tmp = setup_workspace();

    // Demo PRJ003 was closed at seeding time; a zero delay makes it due now
    stdout_of(&tmp, &["config", "set", "project_archive_minutes", "0"]);
    riskreg()
        .current_dir(tmp.path())
        .args(["project", "archive-sweep"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PRJ003"));

    let doc = read_document(&tmp);
    let project = find(&doc, "projects", "PRJ003");
    assert_eq!(project["archived"], true);
    let last = project["history"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["event"], "Project archived");

    // Already archived projects are not swept twice
    riskreg()
        .current_dir(tmp.path())
        .args(["project", "archive-sweep"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No projects due"));
}

#[test]
fn test_archive_sweep_waits_for_delay() {
    let tmp = setup_workspace();
    stdout_of(&tmp, &["config", "set", "project_archive_minutes", "600"]);
    stdout_of(&tmp, &["project", "archive-sweep"]);

    let doc = read_document(&tmp);
    assert!(find(&doc, "projects", "PRJ003").get("archived").is_none());
}

#[test]
fn test_project_execution_checklist() {
    let tmp = setup_workspace();
    stdout_of(&tmp, &["project", "add-stage", "PRJ002", "Procurement"]);
    stdout_of(&tmp, &["project", "add-task", "PRJ002", "Request quotes"]);
    stdout_of(&tmp, &["project", "add-task", "PRJ002", "Sign contract", "--stage", "1"]);
    stdout_of(&tmp, &["project", "toggle-task", "PRJ002", "procurement", "1"]);

    let doc = read_document(&tmp);
    let stages = find(&doc, "projects", "PRJ002")["stages"].as_array().unwrap().clone();
    assert_eq!(stages.len(), 1);
    assert_eq!(stages[0]["tasks"][0]["completed"], true);
    assert_eq!(stages[0]["tasks"][1]["completed"], false);

    riskreg()
        .current_dir(tmp.path())
        .args(["project", "show", "PRJ002"])
        .assert()
        .success()
        .stdout(predicate::str::contains("50% complete"));
}

// ============================================================================
// Config and Demo Tests
// ============================================================================

#[test]
fn test_config_set_author_in_workspace() {
    let tmp = setup_workspace();
    stdout_of(&tmp, &["config", "set", "author", "Auditor"]);

    let author = stdout_of(&tmp, &["config", "show", "author"]);
    assert_eq!(author, "Auditor");

    riskreg()
        .current_dir(tmp.path())
        .args(["config", "set", "colour", "blue"])
        .assert()
        .failure();
}

#[test]
fn test_occurrence_defaults_responsible_to_author() {
    let tmp = setup_workspace();
    stdout_of(&tmp, &["config", "set", "author", "Auditor"]);
    stdout_of(
        &tmp,
        &["risk", "occurrence", "RSK005", "--impediment", "Inspection failed"],
    );

    let doc = read_document(&tmp);
    let risk = find(&doc, "risks", "RSK005");
    let last = risk["history"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["author"], "Auditor");
}

#[test]
fn test_demo_merges_once() {
    let tmp = setup_workspace();
    riskreg()
        .current_dir(tmp.path())
        .args(["demo", "-y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 10 demo record(s)"));

    riskreg()
        .current_dir(tmp.path())
        .args(["demo", "-y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing added"));
}

#[test]
fn test_completions_generate() {
    riskreg()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("riskreg"));
}
