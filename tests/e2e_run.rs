mod support_service;

use std::fs;
use std::path::PathBuf;
#[cfg(unix)]
use std::time::Duration;

use tempfile::tempdir;

#[cfg(unix)]
use support_service::spawn_perfana;
use support_service::{
    MockResponses, profile_yaml, run_perfana, run_perfana_with_env, spawn_perfana_mock_or_skip,
};

#[cfg(unix)]
const REQUEST_WAIT: Duration = Duration::from_secs(10);

fn write_profile(base_url: &str) -> Result<(tempfile::TempDir, PathBuf), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("perfana.yaml");
    fs::write(&path, profile_yaml(base_url))
        .map_err(|err| format!("write profile failed: {}", err))?;
    Ok((dir, path))
}

fn describe(output: &std::process::Output) -> String {
    format!(
        "status: {:?}\nstdout: {}\nstderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn e2e_zero_duration_run_completes() -> Result<(), String> {
    let Some((url, server)) = spawn_perfana_mock_or_skip(MockResponses::default())? else {
        return Ok(());
    };
    let (_dir, profile) = write_profile(&url)?;

    let output = run_perfana([
        "--config".to_owned(),
        profile.to_string_lossy().into_owned(),
        "run".to_owned(),
        "start".to_owned(),
        "--rampupTime".to_owned(),
        "PT0m".to_owned(),
        "--constantLoadTime".to_owned(),
        "PT0m".to_owned(),
        "--variable".to_owned(),
        "region=eu".to_owned(),
    ])?;
    if !output.status.success() {
        return Err(describe(&output));
    }

    let requests = server.requests();
    let paths: Vec<&str> = requests.iter().map(|request| request.path.as_str()).collect();
    if paths != ["/api/init", "/api/test", "/api/test"] {
        return Err(format!("Unexpected request sequence: {:?}", paths));
    }
    if requests
        .iter()
        .any(|request| request.authorization.as_deref() != Some("Bearer e2e-key"))
    {
        return Err("Every request must carry the bearer token".to_owned());
    }

    let [_, start, completion] = requests.as_slice() else {
        return Err("Expected three requests".to_owned());
    };
    let start = start.json()?;
    let completion = completion.json()?;
    if start.get("completed") != Some(&serde_json::json!(false))
        || completion.get("completed") != Some(&serde_json::json!(true))
    {
        return Err(format!("Unexpected completed flags: {} / {}", start, completion));
    }
    if completion.get("testRunId") != Some(&serde_json::json!("e2e-run"))
        || completion.get("rampUp") != Some(&serde_json::json!("0"))
        || completion.get("version") != Some(&serde_json::json!("1.0.0"))
        || completion.get("tags") != Some(&serde_json::json!(["k6", "jfr"]))
        || completion.get("variables")
            != Some(&serde_json::json!([{"placeholder": "region", "value": "eu"}]))
    {
        return Err(format!("Unexpected completion payload: {}", completion));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("TestRunID: e2e-run") || !stdout.contains("Finished...") {
        return Err(describe(&output));
    }
    Ok(())
}

#[cfg(unix)]
#[test]
fn e2e_interrupt_sends_abort_annotation() -> Result<(), String> {
    let Some((url, server)) = spawn_perfana_mock_or_skip(MockResponses::default())? else {
        return Ok(());
    };
    let (_dir, profile) = write_profile(&url)?;

    let child = spawn_perfana([
        "--config".to_owned(),
        profile.to_string_lossy().into_owned(),
        "run".to_owned(),
        "start".to_owned(),
        "--rampupTime".to_owned(),
        "PT1m".to_owned(),
        "--constantLoadTime".to_owned(),
        "PT1m".to_owned(),
    ])?;

    server.wait_for_requests(2, REQUEST_WAIT)?;
    let pid = i32::try_from(child.id()).map_err(|err| format!("pid out of range: {}", err))?;
    // SAFETY: `pid` belongs to the child spawned above, which has not been reaped yet.
    let rc = unsafe { libc::kill(pid, libc::SIGINT) };
    if rc != 0 {
        return Err(format!("kill failed with {}", rc));
    }

    let output = child
        .wait_with_output()
        .map_err(|err| format!("wait failed: {}", err))?;
    if !output.status.success() {
        return Err(describe(&output));
    }

    let requests = server.requests();
    let paths: Vec<&str> = requests.iter().map(|request| request.path.as_str()).collect();
    if paths != ["/api/init", "/api/test", "/api/events"] {
        return Err(format!("Unexpected request sequence: {:?}", paths));
    }
    let Some(annotation) = requests.last() else {
        return Err("Missing annotation".to_owned());
    };
    let annotation = annotation.json()?;
    if annotation.get("title") != Some(&serde_json::json!("Test aborted"))
        || annotation.get("tags") != Some(&serde_json::json!(["aborted", "manual"]))
    {
        return Err(format!("Unexpected annotation: {}", annotation));
    }
    if !String::from_utf8_lossy(&output.stdout).contains("Abort event sent successfully!") {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_init_failure_exits_non_zero() -> Result<(), String> {
    let responses = MockResponses {
        init_status: 500,
        init_body: r#"{"error":"down"}"#,
    };
    let Some((url, server)) = spawn_perfana_mock_or_skip(responses)? else {
        return Ok(());
    };
    let (_dir, profile) = write_profile(&url)?;

    let output = run_perfana([
        "--config".to_owned(),
        profile.to_string_lossy().into_owned(),
        "run".to_owned(),
        "start".to_owned(),
    ])?;
    if output.status.success() {
        return Err(describe(&output));
    }
    if server.paths() != ["/api/init"] {
        return Err(format!("Unexpected request sequence: {:?}", server.paths()));
    }
    Ok(())
}

#[test]
fn e2e_init_writes_profile() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("profiles").join("perfana.yaml");

    let output = run_perfana([
        "init".to_owned(),
        "--config".to_owned(),
        path.to_string_lossy().into_owned(),
        "--apiKey".to_owned(),
        "written-key".to_owned(),
        "--base-url".to_owned(),
        "https://perfana.example".to_owned(),
    ])?;
    if !output.status.success() {
        return Err(describe(&output));
    }

    let written =
        fs::read_to_string(&path).map_err(|err| format!("read profile failed: {}", err))?;
    if !written.contains("apiKey: written-key")
        || !written.contains("https://perfana.example")
        || !written.contains("enabled: false")
    {
        return Err(format!("Unexpected profile:\n{}", written));
    }
    if !String::from_utf8_lossy(&output.stdout).contains("mTLS enabled: false") {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_missing_profile_is_fatal() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("absent.yaml");

    let output = run_perfana([
        "--config".to_owned(),
        path.to_string_lossy().into_owned(),
        "run".to_owned(),
        "start".to_owned(),
    ])?;
    if output.status.success() {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_stop_prints_message() -> Result<(), String> {
    let output = run_perfana(["stop"])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    if !String::from_utf8_lossy(&output.stdout).contains("Stopping the Perfana run...") {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_no_color_env_values_are_accepted() -> Result<(), String> {
    for value in ["1", "", "false"] {
        let output = run_perfana_with_env(["stop"], &[("NO_COLOR", value)])?;
        if !output.status.success() {
            return Err(format!("NO_COLOR={:?}\n{}", value, describe(&output)));
        }
    }
    Ok(())
}
