//! Integration tests that drive the binary's building blocks from an on-disk
//! config file, the way `agrocalc` wires them at startup.

use std::path::{Path, PathBuf};

use agro_cli::app::{self, SaveRequest};
use agro_cli::config::AppConfig;
use agro_cli::utils::{ReportTarget, parse_assignment};
use agro_core::{CalculatorType, Session};
use pretty_assertions::assert_eq;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture_assignments() -> Vec<(String, String)> {
    std::fs::read_to_string(fixture("save_inputs.txt"))
        .expect("fixture inputs should be readable")
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| parse_assignment(l).unwrap())
        .collect()
}

#[test]
fn test_load_fixture_config() {
    let config = AppConfig::load(Some(&fixture("agrocalc.toml"))).expect("fixture should load");

    assert_eq!(config.owner_id.as_deref(), Some("produtor-01"));
    assert_eq!(config.database.backend.as_deref(), Some("memory"));
    assert_eq!(config.db_config().connection_string, ":memory:");
    assert_eq!(config.logging.level, "agro_core=debug,info");
    assert_eq!(config.logging.file, Some(PathBuf::from("agrocalc.log")));
}

#[tokio::test]
async fn test_configured_backend_saves_and_reopens() {
    let config = AppConfig::load(Some(&fixture("agrocalc.toml"))).unwrap();
    let repo = app::build_registry()
        .create(&config.db_config())
        .await
        .expect("configured backend should open");
    let session = Session::new(config.owner_id.unwrap());

    let route = app::save_report(
        &*repo,
        Some(&session),
        CalculatorType::BreakEven,
        SaveRequest {
            assignments: fixture_assignments(),
            title: Some("Soja 25/26".to_string()),
            client: Some("Fazenda Aurora".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let id = route.report_id.expect("save should assign an id");

    let rendered = app::open_report(&*repo, ReportTarget::Id(id)).await.unwrap();
    assert!(rendered.contains("Título: Soja 25/26"));
    assert!(rendered.contains("Cliente: Fazenda Aurora"));
    assert!(rendered.contains("Lucro total (100 ha): R$\u{a0}232.500,00"));

    let recent = app::recent_reports(&*repo, &session).await.unwrap();
    assert_eq!(recent.lines().count(), 1);
    assert!(recent.contains("Ponto de Equilíbrio"));
}
