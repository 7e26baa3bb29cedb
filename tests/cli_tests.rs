use rstest::rstest;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

struct TestContext {
    _dir: TempDir,
    vertical_path: PathBuf,
    products_path: PathBuf,
    output_path: PathBuf,
}

impl TestContext {
    fn new(vertical_json: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let vertical_path = dir.path().join("vertical.json");
        let products_path = dir.path().join("products.csv");
        let output_path = dir.path().join("scored.json");

        let mut vertical_file = File::create(&vertical_path).unwrap();
        write!(vertical_file, "{}", vertical_json).unwrap();

        let mut products_file = File::create(&products_path).unwrap();
        writeln!(products_file, "product_id,sub_population,attribute,value").unwrap();
        writeln!(products_file, "1,oled,REPAIR,4").unwrap();
        writeln!(products_file, "2,oled,REPAIR,9").unwrap();
        writeln!(products_file, "3,lcd,REPAIR,6").unwrap();
        writeln!(products_file, "3,lcd,WARRANTY,2").unwrap();

        Self {
            _dir: dir,
            vertical_path,
            products_path,
            output_path,
        }
    }

    fn command(&self, subcommand: &str) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_scoreforge"));
        cmd.arg(subcommand)
            .arg("--vertical")
            .arg(&self.vertical_path)
            .arg("--products")
            .arg(&self.products_path);
        cmd
    }
}

const VERTICAL: &str = r#"{
    "id": "tv",
    "attributes": [
        {"key": "REPAIR", "asScore": true, "betterIs": "LOWER"},
        {"key": "WARRANTY", "asScore": true}
    ],
    "impactScore": {"criteriasPonderation": {"REPAIR": 0.7, "WARRANTY": 0.3}}
}"#;

#[test]
fn test_score_writes_ranked_products() {
    let ctx = TestContext::new(VERTICAL);
    let output = ctx
        .command("score")
        .arg("--output")
        .arg(&ctx.output_path)
        .arg("--parallel")
        .arg("false")
        .output()
        .expect("Failed to execute binary");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("IMPACT_SCORE"));
    assert!(stdout.contains("attribute2score"));

    let json = std::fs::read_to_string(&ctx.output_path).unwrap();
    let products: serde_json::Value = serde_json::from_str(&json).unwrap();
    let first = &products[0];
    assert_eq!(first["id"], 1);
    assert_eq!(first["ranking"]["globalPosition"], 1);
    assert_eq!(first["ranking"]["globalCount"], 3);
    assert_eq!(first["scores"]["WARRANTY"]["virtual"], true);
}

const NEGATIVE_WEIGHT: &str = r#"{
    "id": "tv",
    "attributes": [{"key": "REPAIR", "asScore": true}],
    "impactScore": {"criteriasPonderation": {"REPAIR": -1.0}}
}"#;

#[rstest]
#[case::unknown_stage(VERTICAL, "score", &["--stages", "attribute2score,astrology"], 1, "")]
#[case::clean_vertical(VERTICAL, "validate", &[], 0, "No issue found")]
#[case::strict_clean_vertical(VERTICAL, "validate", &["--strict"], 0, "No issue found")]
#[case::negative_weight(NEGATIVE_WEIGHT, "validate", &[], 2, "invalid weight")]
fn test_exit_status(
    #[case] vertical: &str,
    #[case] subcommand: &str,
    #[case] extra: &[&str],
    #[case] expected_code: i32,
    #[case] expected_stdout: &str,
) {
    let ctx = TestContext::new(vertical);
    let output = ctx
        .command(subcommand)
        .args(extra)
        .output()
        .expect("Failed to execute binary");

    assert_eq!(
        output.status.code(),
        Some(expected_code),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains(expected_stdout));
}
