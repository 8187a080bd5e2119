//! Command handlers behind `agrocalc`. Each returns the text to print so the
//! binary stays a thin dispatcher.

use std::fmt::Write as _;

use agro_core::db::{MemoryRepositoryFactory, RepositoryRegistry};
use agro_core::{
    AgroRepository, CalculatorType, Evaluation, FormInputs, PageRoute, Report, ReportLifecycle,
    Session,
};
use agro_db_sqlite::SqliteRepositoryFactory;
use anyhow::{Context, Result};
use chrono::Local;
use tracing::{info, warn};

use crate::utils::ReportTarget;

/// Build a registry containing every backend this binary ships with.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry.register(Box::new(MemoryRepositoryFactory));
    registry
}

/// One line per calculator: tag, page slug, name and input fields.
pub fn calculator_table() -> String {
    let mut out = String::new();
    for t in CalculatorType::ALL {
        let fields: Vec<_> = t.engine().fields().iter().map(|f| f.key).collect();
        let _ = writeln!(
            out,
            "{:<22} {:<26} {}\n    {}",
            t.as_str(),
            t.route_slug(),
            t.label(),
            fields.join(", ")
        );
    }
    out
}

/// Assignment keys the calculator does not declare. They are still stored
/// with the form but no formula reads them.
pub fn undeclared_keys<'a>(
    calculator_type: CalculatorType,
    assignments: &'a [(String, String)],
) -> Vec<&'a str> {
    let fields = calculator_type.engine().fields();
    assignments
        .iter()
        .map(|(key, _)| key.as_str())
        .filter(|key| !fields.iter().any(|f| f.key == *key))
        .collect()
}

fn warn_undeclared(
    calculator_type: CalculatorType,
    assignments: &[(String, String)],
) {
    for key in undeclared_keys(calculator_type, assignments) {
        warn!(calculator = %calculator_type, key, "unknown field, no formula uses it");
    }
}

/// Runs a calculator on its defaults overridden by `assignments`.
pub fn compute(
    calculator_type: CalculatorType,
    assignments: &[(String, String)],
) -> Evaluation {
    warn_undeclared(calculator_type, assignments);
    let engine = calculator_type.engine();
    let mut inputs = FormInputs::from_defaults(engine.fields());
    for (key, value) in assignments {
        inputs.set(key.as_str(), value.as_str());
    }
    engine.evaluate(&inputs)
}

/// Everything `save` can change on a page.
#[derive(Debug, Clone, Default)]
pub struct SaveRequest {
    pub report_id: Option<i64>,
    pub assignments: Vec<(String, String)>,
    pub title: Option<String>,
    pub client: Option<String>,
    pub location: Option<String>,
}

/// Opens the page (loading `report_id` when given), applies the request and
/// saves. Returns the page route, which carries the report id.
pub async fn save_report<R: AgroRepository + ?Sized>(
    repo: &R,
    session: Option<&Session>,
    calculator_type: CalculatorType,
    request: SaveRequest,
) -> Result<PageRoute> {
    warn_undeclared(calculator_type, &request.assignments);
    let route = PageRoute {
        calculator_type,
        report_id: request.report_id,
    };
    let page = ReportLifecycle::open(repo, route)
        .await
        .with_context(|| format!("Failed to open {route}"))?;

    for (key, value) in &request.assignments {
        page.set_input(key, value.as_str());
    }
    if let Some(title) = request.title {
        page.set_title(title);
    }
    if request.client.is_some() || request.location.is_some() {
        let client = request.client.or_else(|| page.client_name());
        page.set_client(client.as_deref(), request.location.as_deref());
    }

    let id = page.save(session).await.context("Failed to save report")?;
    info!(id, "saved {}", page.route());
    Ok(page.route())
}

/// Loads a report onto its calculator page and renders it with a fresh
/// summary.
pub async fn open_report<R: AgroRepository + ?Sized>(
    repo: &R,
    target: ReportTarget,
) -> Result<String> {
    let route = match target {
        ReportTarget::Route(route) => route,
        ReportTarget::Id(id) => {
            let report = repo
                .get_report_by_id(id)
                .await
                .with_context(|| format!("Failed to fetch report {id}"))?
                .with_context(|| format!("Report {id} not found"))?;
            PageRoute::with_report(report.calculator_type, id)
        }
    };

    let page = ReportLifecycle::open(repo, route)
        .await
        .with_context(|| format!("Failed to open {route}"))?;

    let mut out = String::new();
    let _ = writeln!(out, "{}", page.route());
    let _ = writeln!(out, "Título: {}", page.title());
    if let Some(client) = page.client_name() {
        let _ = writeln!(out, "Cliente: {client}");
    }
    let _ = writeln!(out, "\nEntradas:");
    for (key, value) in page.inputs().iter() {
        let _ = writeln!(out, "  {key} = {value}");
    }
    let _ = writeln!(out, "\n{}", page.evaluate().summary);
    Ok(out)
}

fn report_line(report: &Report) -> String {
    let mut line = format!(
        "{:>6}  {}  {:<26} {}",
        report.id,
        report.updated_at.with_timezone(&Local).format("%d/%m/%Y %H:%M"),
        report.calculator_type.label(),
        report.title
    );
    if let Some(client) = &report.client_name {
        let _ = write!(line, " ({client})");
    }
    line
}

pub async fn recent_reports<R: AgroRepository + ?Sized>(
    repo: &R,
    session: &Session,
) -> Result<String> {
    let reports = repo
        .get_recent_reports(&session.owner_id)
        .await
        .context("Failed to list recent reports")?;
    if reports.is_empty() {
        return Ok("Nenhum relatório salvo.\n".to_string());
    }
    Ok(reports.iter().map(|r| report_line(r) + "\n").collect())
}

pub async fn list_clients<R: AgroRepository + ?Sized>(
    repo: &R,
    session: &Session,
) -> Result<String> {
    let clients = repo
        .get_clients(&session.owner_id)
        .await
        .context("Failed to list clients")?;
    if clients.is_empty() {
        return Ok("Nenhum cliente cadastrado.\n".to_string());
    }
    let mut out = String::new();
    for c in clients {
        let _ = match c.location {
            Some(location) => writeln!(out, "{:>6}  {} - {}", c.id, c.name, location),
            None => writeln!(out, "{:>6}  {}", c.id, c.name),
        };
    }
    Ok(out)
}

pub async fn delete_report<R: AgroRepository + ?Sized>(
    repo: &R,
    id: i64,
) -> Result<()> {
    repo.delete_report(id)
        .await
        .with_context(|| format!("Failed to delete report {id}"))?;
    info!(id, "report deleted");
    Ok(())
}

pub async fn delete_client<R: AgroRepository + ?Sized>(
    repo: &R,
    id: i64,
) -> Result<()> {
    repo.delete_client(id)
        .await
        .with_context(|| format!("Failed to delete client {id}"))?;
    info!(id, "client deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use agro_core::db::MemoryRepository;
    use agro_core::{DbConfig, LifecycleError, ResultValue};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn set(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn registry_ships_sqlite_and_memory() {
        let registry = build_registry();

        assert_eq!(registry.available_backends(), vec!["memory", "sqlite"]);
        assert_eq!(
            registry.resolve(&DbConfig::default()).unwrap(),
            DbConfig::new("sqlite", "agrocalc.db")
        );
        assert!(registry.resolve(&DbConfig::new("memory", "agrocalc.db")).is_err());
    }

    #[test]
    fn calculator_table_lists_every_calculator() {
        let table = calculator_table();

        for t in CalculatorType::ALL {
            assert!(table.contains(t.route_slug()), "{t} missing");
        }
    }

    #[test]
    fn compute_applies_assignments_over_defaults() {
        let eval = compute(
            CalculatorType::FuelEfficiency,
            &set(&[("area_ha", "50"), ("liters", "600"), ("hours", "12")]),
        );

        assert_eq!(eval.results.number("liters_ha"), Some(dec!(12)));
        assert_eq!(
            eval.results.get("status"),
            Some(&ResultValue::Text("efficient".to_string()))
        );
        assert!(eval.summary.starts_with("Consumo de Combustível"));
    }

    #[test]
    fn misspelled_fields_are_reported_and_ignored() {
        let assignments = set(&[("aera", "10"), ("area", "10"), ("current_v", "35")]);

        assert_eq!(undeclared_keys(CalculatorType::Liming, &assignments), vec!["aera"]);
        assert_eq!(
            compute(CalculatorType::Liming, &assignments).results,
            compute(CalculatorType::Liming, &assignments[1..]).results
        );
    }

    #[tokio::test]
    async fn save_then_update_through_the_same_id() {
        let repo = MemoryRepository::new();
        let session = Session::new("u1");

        let route = save_report(
            &repo,
            Some(&session),
            CalculatorType::BreakEven,
            SaveRequest {
                assignments: set(&[("cost_ha", "5800"), ("price", "125"), ("expected_yield", "65")]),
                client: Some("Fazenda Aurora".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let id = route.report_id.unwrap();

        let updated = save_report(
            &repo,
            Some(&session),
            CalculatorType::BreakEven,
            SaveRequest {
                report_id: Some(id),
                assignments: set(&[("price", "100")]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated, route);
        let stored = repo.get_report_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.data.inputs.number("cost_ha"), dec!(5800));
        assert_eq!(stored.data.results.number("break_even_yield"), Some(dec!(58)));
        assert_eq!(stored.client_name.as_deref(), Some("Fazenda Aurora"));
    }

    #[tokio::test]
    async fn save_without_session_is_rejected() {
        let repo = MemoryRepository::new();

        let err = save_report(&repo, None, CalculatorType::Liming, SaveRequest::default())
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<LifecycleError>(),
            Some(&LifecycleError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn open_renders_inputs_and_summary() {
        let repo = MemoryRepository::new();
        let session = Session::new("u1");
        let route = save_report(
            &repo,
            Some(&session),
            CalculatorType::Liming,
            SaveRequest {
                assignments: set(&[("current_v", "35"), ("target_v", "60"), ("ctc", "8"), ("prnt", "80")]),
                title: Some("Talhão 2".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let id = route.report_id.unwrap();

        let by_id = open_report(&repo, ReportTarget::Id(id)).await.unwrap();
        let by_route = open_report(&repo, ReportTarget::Route(route)).await.unwrap();

        assert_eq!(by_id, by_route);
        assert!(by_id.starts_with(&format!("/calculadoras/calagem?id={id}\n")));
        assert!(by_id.contains("Título: Talhão 2"));
        assert!(by_id.contains("Calcário (NC): 2.50 t/ha"));
    }

    #[tokio::test]
    async fn listing_and_deleting() {
        let repo = MemoryRepository::new();
        let session = Session::new("u1");

        assert_eq!(recent_reports(&repo, &session).await.unwrap(), "Nenhum relatório salvo.\n");

        let route = save_report(
            &repo,
            Some(&session),
            CalculatorType::SeedingRate,
            SaveRequest {
                client: Some("Sítio Primavera".to_string()),
                location: Some("Londrina - PR".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let id = route.report_id.unwrap();

        assert!(recent_reports(&repo, &session).await.unwrap().contains("Densidade de Semeadura"));
        assert!(
            list_clients(&repo, &session)
                .await
                .unwrap()
                .contains("Sítio Primavera - Londrina - PR")
        );

        delete_report(&repo, id).await.unwrap();
        assert!(delete_report(&repo, id).await.is_err());
        assert_eq!(recent_reports(&repo, &session).await.unwrap(), "Nenhum relatório salvo.\n");
    }
}
