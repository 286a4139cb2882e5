use crate::advisor::ErrorAdvisor;
use crate::analysis::{AnalysisError, BuildLogAnalyzer};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

const RESTORE_LOG: &str = r#"
[10:01:12] Restoring packages for C:\src\Axis.Web\Axis.Web.csproj...
[10:01:14] C:\src\Axis.Web\Axis.Web.csproj : error NU1605: Detected package downgrade: Newtonsoft.Json from 13.0.3 to 12.0.1. Reference the package directly from the project to select a different version.
[10:01:14] C:\src\Axis.Data\Axis.Data.csproj : error NU1010: The PackageReference items Dapper, Polly do not have corresponding PackageVersion.
[10:01:15] C:\src\Directory.Packages.props : warning NU1506: Duplicate 'PackageVersion' items found. The duplicate 'PackageVersion' items are: Moq 4.18.0, Moq 4.20.0.
[10:01:15] warning NU1701: Package 'Legacy.Lib 1.0.0' was restored using '.NETFramework,Version=v4.6.1'
[10:01:20] Restore failed.
"#;

fn analyzer() -> BuildLogAnalyzer {
    BuildLogAnalyzer::new(ErrorAdvisor::new()).unwrap()
}

#[test]
fn test_analyze_text_counts_codes() {
    let analysis = analyzer().analyze_text("restore.log", RESTORE_LOG);

    assert_eq!(analysis.total_errors, 4);
    assert_eq!(analysis.counts.get("NU1605"), Some(&1));
    assert_eq!(analysis.counts.get("NU1010"), Some(&2));
    assert_eq!(analysis.counts.get("NU1506"), Some(&1));
    assert_eq!(
        analysis.packages_affected,
        vec![
            "Dapper".to_string(),
            "Moq".to_string(),
            "Newtonsoft.Json".to_string(),
            "Polly".to_string(),
        ]
    );
    assert_eq!(analysis.unrecognized, vec!["NU1701".to_string()]);
}

#[test]
fn test_clean_log_has_no_detections() {
    let analysis = analyzer().analyze_text("ok.log", "Build succeeded.\n    0 Warning(s)\n    0 Error(s)\n");
    assert_eq!(analysis.total_errors, 0);
    assert!(analysis.counts.is_empty());
    assert!(analysis.unrecognized.is_empty());
}

#[tokio::test]
async fn test_analyze_log_reads_invalid_utf8() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("build.log");
    let mut bytes = b"\xff\xfe garbage\n".to_vec();
    bytes.extend_from_slice(b"error MSB4062: The \"GenerateResource\" task could not be loaded\n");
    fs::write(&path, bytes).unwrap();

    let analysis = analyzer().analyze_log(&path).await.unwrap();
    assert_eq!(analysis.counts.get("MSB4062"), Some(&1));
    assert_eq!(analysis.detections[0].line_number, 2);
}

#[tokio::test]
async fn test_analyze_missing_file() {
    let result = analyzer()
        .analyze_log(std::path::Path::new("/nonexistent/build.log"))
        .await;
    assert!(matches!(result, Err(AnalysisError::Io { .. })));
}

#[tokio::test]
async fn test_analyze_directory_filters_extensions() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("b-restore.log"), RESTORE_LOG).unwrap();
    fs::write(
        temp_dir.path().join("a-build.txt"),
        "error NU1202: Package Serilog 4.0.0 is not compatible with net48 (.NETFramework,Version=v4.8).",
    )
    .unwrap();
    fs::write(temp_dir.path().join("notes.md"), "error NU1103 in a readme").unwrap();
    fs::create_dir(temp_dir.path().join("nested")).unwrap();
    fs::write(temp_dir.path().join("nested").join("c.log"), "error NU1103").unwrap();

    let results = analyzer().analyze_directory(temp_dir.path()).await.unwrap();
    let names: Vec<_> = results
        .iter()
        .map(|r| r.file.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a-build.txt".to_string(), "b-restore.log".to_string()]);
    assert_eq!(results[0].counts.get("NU1202"), Some(&1));
}

#[tokio::test]
async fn test_analyze_directory_custom_extensions() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("teamcity.out"), RESTORE_LOG).unwrap();
    fs::write(temp_dir.path().join("other.log"), RESTORE_LOG).unwrap();

    let results = analyzer()
        .with_extensions(vec![".OUT".to_string()])
        .analyze_directory(temp_dir.path())
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_empty_directory_reports_no_logs() {
    let temp_dir = TempDir::new().unwrap();
    let result = analyzer().analyze_directory(temp_dir.path()).await;
    assert!(matches!(result, Err(AnalysisError::NoLogsFound(_))));
}

#[cfg(unix)]
#[tokio::test]
async fn test_analyze_directory_follows_symlinked_logs() {
    let temp_dir = TempDir::new().unwrap();
    let artifacts = temp_dir.path().join("artifacts");
    let logs = temp_dir.path().join("logs");
    fs::create_dir(&artifacts).unwrap();
    fs::create_dir(&logs).unwrap();
    fs::write(
        artifacts.join("agent-7.log"),
        "error NU1103: Unable to find package Axis.Core with version (>= 2.1.0)",
    )
    .unwrap();
    std::os::unix::fs::symlink(artifacts.join("agent-7.log"), logs.join("build.log")).unwrap();
    std::os::unix::fs::symlink(&artifacts, logs.join("linked-dir.log")).unwrap();

    let results = analyzer().analyze_directory(&logs).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].file, logs.join("build.log"));
    assert_eq!(results[0].counts.get("NU1103"), Some(&1));
}

#[cfg(unix)]
#[tokio::test]
async fn test_analyze_directory_skips_unreadable_logs() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("a-restore.log"), RESTORE_LOG).unwrap();
    std::os::unix::fs::symlink(
        temp_dir.path().join("gone.log.bak"),
        temp_dir.path().join("b-dangling.log"),
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("c-build.txt"),
        "error MSB4062: The \"GenerateResource\" task could not be loaded",
    )
    .unwrap();

    let results = analyzer().analyze_directory(temp_dir.path()).await.unwrap();
    let names: Vec<_> = results
        .iter()
        .map(|r| r.file.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a-restore.log".to_string(), "c-build.txt".to_string()]);
}
