use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::tempdir;

use easel_cli::{Args, CliError, session::SessionError};

/// Collects all .toml session files from a directory
fn collect_session_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("toml")
            })
            .collect()
    } else {
        Vec::new()
    };

    files.sort();
    files
}

fn args(input: &Path, output: &Path) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        config: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_sessions() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let sessions =
        collect_session_files(Path::new(env!("CARGO_MANIFEST_DIR")).join("sessions"));
    assert!(!sessions.is_empty(), "No sessions found in sessions/");

    let mut failed = Vec::new();

    for session_path in &sessions {
        let output_path = temp_dir.path().join(format!(
            "{}.svg",
            session_path.file_stem().unwrap().to_string_lossy()
        ));

        match easel_cli::run(&args(session_path, &output_path)) {
            Ok(()) => {
                let svg = fs::read_to_string(&output_path).unwrap();
                assert!(svg.contains("<svg"), "{} produced no svg", session_path.display());
            }
            Err(err) => failed.push((session_path.clone(), err)),
        }
    }

    if !failed.is_empty() {
        eprintln!("\nSessions that failed:");
        for (path, err) in &failed {
            eprintln!("  {}: {err}", path.display());
        }
        panic!("{} of {} sessions failed", failed.len(), sessions.len());
    }
}

#[test]
fn e2e_drawn_connector_is_exported() {
    let temp_dir = tempdir().unwrap();
    let input = temp_dir.path().join("draw.toml");
    let output = temp_dir.path().join("draw.svg");
    fs::write(
        &input,
        r#"
variant = "bpmn"

[[shapes]]
id = "A"
kind = "task"
x = 0
y = 0
width = 100
height = 60

[[shapes]]
id = "B"
kind = "task"
x = 200
y = 0
width = 100
height = 60

[[events]]
kind = "pointer_down"
x = 100
y = 30

[[events]]
kind = "pointer_move"
x = 200
y = 30

[[events]]
kind = "pointer_up"
x = 200
y = 30
"#,
    )
    .unwrap();

    easel_cli::run(&args(&input, &output)).unwrap();

    let svg = fs::read_to_string(&output).unwrap();
    assert!(svg.contains("M 100 30 L 200 30"));
    assert!(svg.contains("marker-arrow"));
}

#[test]
fn e2e_invalid_session_fails() {
    let temp_dir = tempdir().unwrap();
    let input = temp_dir.path().join("broken.toml");
    let output = temp_dir.path().join("broken.svg");
    fs::write(&input, "variant = \"flowchart\"\n").unwrap();

    let err = easel_cli::run(&args(&input, &output)).unwrap_err();
    assert!(matches!(err, CliError::Session(SessionError::Parse(_))));
    assert!(!output.exists());
}
