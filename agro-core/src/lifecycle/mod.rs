//! Per-page orchestration of load, recompute and save.
//!
//! A [`ReportLifecycle`] owns the form state of one calculator page. Every
//! input change recomputes the results synchronously; saving upserts the
//! client and then creates the report (first save) or overwrites it (later
//! saves). The results written are always recomputed from the inputs written,
//! so a stored report's cached results match its inputs.
//!
//! ```text
//! NEW ──save──▶ SAVED ◀──save── LOADED
//!                 │ ▲
//!                 └─┘ save
//! ```

mod route;

pub use route::PageRoute;

use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::calculations::{Evaluation, FormulaEngine};
use crate::db::repository::{AgroRepository, RepositoryError};
use crate::input::{FormInputs, InputValue, ResultSet};
use crate::models::{CalculatorType, NewReport, ReportData, ReportPatch, Session};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("a signed-in user is required to save reports")]
    Unauthenticated,

    #[error("report {0} not found")]
    ReportNotFound(i64),

    #[error("report {id} was produced by the {found} calculator, not {expected}")]
    CalculatorMismatch {
        id: i64,
        expected: CalculatorType,
        found: CalculatorType,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Fresh page, nothing stored yet.
    New,
    /// Opened from a stored report and not saved since.
    Loaded,
    Saved,
}

#[derive(Debug, Clone)]
struct PageState {
    state: LifecycleState,
    report_id: Option<i64>,
    inputs: FormInputs,
    results: ResultSet,
    title: String,
    client_name: Option<String>,
    client_location: Option<String>,
    dirty: bool,
}

/// What one save writes.
#[derive(Debug, Clone, PartialEq)]
struct Draft {
    report_id: Option<i64>,
    inputs: FormInputs,
    title: String,
    client_name: Option<String>,
    client_location: Option<String>,
}

/// Controller for one calculator page, generic over the store.
pub struct ReportLifecycle<'r, R: AgroRepository + ?Sized> {
    repo: &'r R,
    engine: FormulaEngine,
    page: Mutex<PageState>,
    save_gate: tokio::sync::Mutex<()>,
}

impl<'r, R: AgroRepository + ?Sized> ReportLifecycle<'r, R> {
    /// A `NEW` page with every field at its default.
    pub fn new(
        repo: &'r R,
        calculator_type: CalculatorType,
    ) -> Self {
        let engine = calculator_type.engine();
        let inputs = FormInputs::from_defaults(engine.fields());
        let results = engine.compute(&inputs);
        Self {
            repo,
            engine,
            page: Mutex::new(PageState {
                state: LifecycleState::New,
                report_id: None,
                inputs,
                results,
                title: calculator_type.label().to_string(),
                client_name: None,
                client_location: None,
                dirty: false,
            }),
            save_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Opens the page a route points at: `NEW` without an id, `LOADED` from
    /// the stored report with one.
    pub async fn open(
        repo: &'r R,
        route: PageRoute,
    ) -> Result<Self, LifecycleError> {
        let page = Self::new(repo, route.calculator_type);
        if let Some(id) = route.report_id {
            page.load(id).await?;
        }
        Ok(page)
    }

    /// Replaces the page with a stored report. Declared fields missing from the
    /// snapshot take their defaults and the results are recomputed rather than
    /// read from the snapshot. Waits for an in-flight save to finish first.
    pub async fn load(
        &self,
        id: i64,
    ) -> Result<(), LifecycleError> {
        let _gate = self.save_gate.lock().await;
        let expected = self.engine.calculator_type();
        let report = self
            .repo
            .get_report_by_id(id)
            .await
            .inspect_err(|e| error!(id, error = %e, "failed to load report"))?
            .ok_or(LifecycleError::ReportNotFound(id))?;

        if report.calculator_type != expected {
            warn!(id, found = %report.calculator_type, %expected, "report opened on the wrong calculator");
            return Err(LifecycleError::CalculatorMismatch {
                id,
                expected,
                found: report.calculator_type,
            });
        }

        let mut inputs = report.data.inputs;
        let filled = inputs.fill_defaults(self.engine.fields());
        let results = self.engine.compute(&inputs);

        let mut page = self.page();
        *page = PageState {
            state: LifecycleState::Loaded,
            report_id: Some(id),
            inputs,
            results,
            title: report.title,
            client_name: report.client_name,
            client_location: None,
            dirty: false,
        };
        info!(id, calculator = %expected, filled, "report loaded");
        Ok(())
    }

    pub fn calculator_type(&self) -> CalculatorType {
        self.engine.calculator_type()
    }

    pub fn state(&self) -> LifecycleState {
        self.page().state
    }

    pub fn report_id(&self) -> Option<i64> {
        self.page().report_id
    }

    /// True when the form changed since it was opened or last saved.
    pub fn is_dirty(&self) -> bool {
        self.page().dirty
    }

    pub fn inputs(&self) -> FormInputs {
        self.page().inputs.clone()
    }

    pub fn results(&self) -> ResultSet {
        self.page().results.clone()
    }

    pub fn title(&self) -> String {
        self.page().title.clone()
    }

    pub fn client_name(&self) -> Option<String> {
        self.page().client_name.clone()
    }

    /// Results and shareable summary for the current form.
    pub fn evaluate(&self) -> Evaluation {
        self.engine.evaluate(&self.page().inputs)
    }

    /// Sets one field and recomputes. Returns the new results.
    pub fn set_input(
        &self,
        key: &str,
        value: impl Into<InputValue>,
    ) -> ResultSet {
        let mut page = self.page();
        page.inputs.set(key, value);
        page.results = self.engine.compute(&page.inputs);
        page.dirty = true;
        page.results.clone()
    }

    pub fn set_title(
        &self,
        title: impl Into<String>,
    ) {
        let mut page = self.page();
        page.title = title.into();
        page.dirty = true;
    }

    /// Client the next save files the report under. A blank name detaches it.
    pub fn set_client(
        &self,
        name: Option<&str>,
        location: Option<&str>,
    ) {
        let mut page = self.page();
        page.client_name = name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);
        page.client_location = location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        page.dirty = true;
    }

    /// Route of the page, with the report id once there is one.
    pub fn route(&self) -> PageRoute {
        PageRoute {
            calculator_type: self.engine.calculator_type(),
            report_id: self.page().report_id,
        }
    }

    /// Stores the current form. The first save creates the report and adopts
    /// its id; later saves overwrite it. Saves are serialized, so a save
    /// requested while another runs waits and then updates the same report.
    ///
    /// On failure the error is logged and returned; the page is untouched.
    pub async fn save(
        &self,
        session: Option<&Session>,
    ) -> Result<i64, LifecycleError> {
        let session = session.ok_or(LifecycleError::Unauthenticated)?;
        let _gate = self.save_gate.lock().await;

        let draft = self.draft();
        let results = self.engine.compute(&draft.inputs);

        let id = self
            .write(session, &draft, results)
            .await
            .inspect_err(|e| {
                error!(
                    calculator = %self.engine.calculator_type(),
                    report_id = ?draft.report_id,
                    error = %e,
                    "failed to save report"
                )
            })?;

        let mut page = self.page();
        page.report_id = Some(id);
        page.state = LifecycleState::Saved;
        page.dirty = page.inputs != draft.inputs
            || page.title != draft.title
            || page.client_name != draft.client_name;
        info!(id, calculator = %self.engine.calculator_type(), "report saved");
        Ok(id)
    }

    async fn write(
        &self,
        session: &Session,
        draft: &Draft,
        results: ResultSet,
    ) -> Result<i64, RepositoryError> {
        if let Some(name) = &draft.client_name {
            let client_id = self
                .repo
                .save_client(&session.owner_id, name, draft.client_location.as_deref())
                .await?;
            debug!(client_id, "client upserted");
        }

        let data = ReportData {
            inputs: draft.inputs.clone(),
            results,
        };

        match draft.report_id {
            None => {
                self.repo
                    .save_report(NewReport {
                        owner_id: session.owner_id.clone(),
                        calculator_type: self.engine.calculator_type(),
                        title: draft.title.clone(),
                        client_name: draft.client_name.clone(),
                        data,
                    })
                    .await
            }
            Some(id) => {
                self.repo
                    .update_report(
                        id,
                        ReportPatch {
                            title: Some(draft.title.clone()),
                            client_name: Some(draft.client_name.clone()),
                            data: Some(data),
                        },
                    )
                    .await?;
                Ok(id)
            }
        }
    }

    fn draft(&self) -> Draft {
        let page = self.page();
        Draft {
            report_id: page.report_id,
            inputs: page.inputs.clone(),
            title: page.title.clone(),
            client_name: page.client_name.clone(),
            client_location: page.client_location.clone(),
        }
    }

    fn page(&self) -> MutexGuard<'_, PageState> {
        self.page.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::db::MemoryRepository;
    use crate::models::{Client, Report};

    /// Memory store that counts writes and can be told to reject them.
    #[derive(Default)]
    struct TestRepository {
        inner: MemoryRepository,
        creates: AtomicUsize,
        updates: AtomicUsize,
        fail_writes: AtomicBool,
    }

    impl TestRepository {
        fn check(&self) -> Result<(), RepositoryError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                Err(RepositoryError::Connection("offline".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl AgroRepository for TestRepository {
        async fn save_client(
            &self,
            owner_id: &str,
            name: &str,
            location: Option<&str>,
        ) -> Result<i64, RepositoryError> {
            self.check()?;
            self.inner.save_client(owner_id, name, location).await
        }

        async fn get_clients(
            &self,
            owner_id: &str,
        ) -> Result<Vec<Client>, RepositoryError> {
            self.inner.get_clients(owner_id).await
        }

        async fn delete_client(
            &self,
            id: i64,
        ) -> Result<(), RepositoryError> {
            self.inner.delete_client(id).await
        }

        async fn save_report(
            &self,
            report: NewReport,
        ) -> Result<i64, RepositoryError> {
            self.check()?;
            self.creates.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.inner.save_report(report).await
        }

        async fn update_report(
            &self,
            id: i64,
            patch: ReportPatch,
        ) -> Result<(), RepositoryError> {
            self.check()?;
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.inner.update_report(id, patch).await
        }

        async fn get_report_by_id(
            &self,
            id: i64,
        ) -> Result<Option<Report>, RepositoryError> {
            self.inner.get_report_by_id(id).await
        }

        async fn get_recent_reports(
            &self,
            owner_id: &str,
        ) -> Result<Vec<Report>, RepositoryError> {
            self.inner.get_recent_reports(owner_id).await
        }

        async fn delete_report(
            &self,
            id: i64,
        ) -> Result<(), RepositoryError> {
            self.inner.delete_report(id).await
        }
    }

    fn session() -> Session {
        Session::new("user-1")
    }

    fn fill_npk<R: AgroRepository + ?Sized>(page: &ReportLifecycle<'_, R>) {
        page.set_input("target_n", "80");
        page.set_input("target_p", "40");
        page.set_input("target_k", "0");
        page.set_input("formula_n", "4");
        page.set_input("formula_p", "14");
        page.set_input("formula_k", "8");
        page.set_input("priority", "P");
    }

    #[test]
    fn new_page_starts_from_defaults() {
        let repo = TestRepository::default();
        let page = ReportLifecycle::new(&repo, CalculatorType::HarvestLoss);

        assert_eq!(page.state(), LifecycleState::New);
        assert_eq!(page.report_id(), None);
        assert_eq!(page.inputs().text("crop"), "soy");
        assert_eq!(page.route().to_string(), "/calculadoras/perdas-colheita");
        assert!(!page.is_dirty());
    }

    #[test]
    fn set_input_recomputes() {
        let repo = TestRepository::default();
        let page = ReportLifecycle::new(&repo, CalculatorType::FertilizerDose);

        fill_npk(&page);

        assert_eq!(page.results().number("dose_ha").map(|d| d.round_dp(1)), Some(dec!(285.7)));
        assert!(page.is_dirty());
    }

    #[tokio::test]
    async fn first_save_creates_and_adopts_id() {
        let repo = TestRepository::default();
        let page = ReportLifecycle::new(&repo, CalculatorType::FertilizerDose);
        fill_npk(&page);
        page.set_client(Some("Fazenda Aurora"), Some("Rio Verde - GO"));

        let id = page.save(Some(&session())).await.unwrap();

        assert_eq!(page.state(), LifecycleState::Saved);
        assert_eq!(page.report_id(), Some(id));
        assert_eq!(page.route().to_string(), format!("/calculadoras/adubacao?id={id}"));
        assert!(!page.is_dirty());
        assert_eq!(repo.creates.load(Ordering::SeqCst), 1);

        let clients = repo.get_clients("user-1").await.unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].location.as_deref(), Some("Rio Verde - GO"));
    }

    #[tokio::test]
    async fn later_saves_update_the_same_report() {
        let repo = TestRepository::default();
        let page = ReportLifecycle::new(&repo, CalculatorType::FertilizerDose);
        fill_npk(&page);

        let id = page.save(Some(&session())).await.unwrap();
        page.set_input("area", "10");
        let again = page.save(Some(&session())).await.unwrap();

        assert_eq!(again, id);
        assert_eq!(repo.creates.load(Ordering::SeqCst), 1);
        assert_eq!(repo.updates.load(Ordering::SeqCst), 1);

        let stored = repo.get_report_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.data.inputs.number("area"), dec!(10));
        assert_eq!(stored.data.results.number("bags"), Some(dec!(58)));
    }

    #[tokio::test]
    async fn stored_results_match_a_recompute_of_stored_inputs() {
        let repo = TestRepository::default();
        for t in CalculatorType::ALL {
            let page = ReportLifecycle::new(&repo, t);
            for field in t.engine().fields() {
                if field.default == crate::input::FieldDefault::Empty {
                    page.set_input(field.key, "12.5");
                }
            }

            let id = page.save(Some(&session())).await.unwrap();
            let stored = repo.get_report_by_id(id).await.unwrap().unwrap();

            assert_eq!(stored.calculator_type, t);
            assert_eq!(t.engine().compute(&stored.data.inputs), stored.data.results, "{t}");
        }
    }

    #[tokio::test]
    async fn reopened_report_recomputes_to_the_saved_results() {
        let repo = TestRepository::default();
        let page = ReportLifecycle::new(&repo, CalculatorType::FertilizerDose);
        fill_npk(&page);
        page.set_title("Talhão 7");
        let id = page.save(Some(&session())).await.unwrap();

        let reopened = ReportLifecycle::open(
            &repo,
            PageRoute::with_report(CalculatorType::FertilizerDose, id),
        )
        .await
        .unwrap();

        assert_eq!(reopened.state(), LifecycleState::Loaded);
        assert_eq!(reopened.title(), "Talhão 7");
        assert_eq!(reopened.inputs(), page.inputs());
        assert_eq!(reopened.results(), page.results());
    }

    #[tokio::test]
    async fn load_fills_missing_fields_with_defaults() {
        let repo = TestRepository::default();
        let id = repo
            .save_report(NewReport {
                owner_id: "user-1".to_string(),
                calculator_type: CalculatorType::HarvestLoss,
                title: "Colheita".to_string(),
                client_name: None,
                data: ReportData {
                    inputs: FormInputs::new()
                        .with("sample_grams", "12")
                        .with("sample_area_m2", "2"),
                    results: ResultSet::new(),
                },
            })
            .await
            .unwrap();

        let page = ReportLifecycle::new(&repo, CalculatorType::HarvestLoss);
        page.load(id).await.unwrap();

        let inputs = page.inputs();
        assert_eq!(inputs.text("crop"), "soy");
        assert_eq!(inputs.text("method"), "weight");
        assert_eq!(inputs.len(), CalculatorType::HarvestLoss.engine().fields().len());
        assert_eq!(page.results().number("kg_ha"), Some(dec!(60)));
    }

    #[tokio::test]
    async fn loading_a_missing_or_foreign_report_fails() {
        let repo = TestRepository::default();
        let other = ReportLifecycle::new(&repo, CalculatorType::Liming);
        let id = other.save(Some(&session())).await.unwrap();

        let page = ReportLifecycle::new(&repo, CalculatorType::BreakEven);

        assert_eq!(page.load(999).await, Err(LifecycleError::ReportNotFound(999)));
        assert_eq!(
            page.load(id).await,
            Err(LifecycleError::CalculatorMismatch {
                id,
                expected: CalculatorType::BreakEven,
                found: CalculatorType::Liming,
            })
        );
        assert_eq!(page.state(), LifecycleState::New);
    }

    #[tokio::test]
    async fn save_requires_a_session() {
        let repo = TestRepository::default();
        let page = ReportLifecycle::new(&repo, CalculatorType::SoilWater);

        assert_eq!(page.save(None).await, Err(LifecycleError::Unauthenticated));
        assert_eq!(repo.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_save_leaves_the_page_untouched() {
        let repo = TestRepository::default();
        let page = ReportLifecycle::new(&repo, CalculatorType::FertilizerDose);
        fill_npk(&page);
        let before = page.inputs();
        repo.fail_writes.store(true, Ordering::SeqCst);

        let result = page.save(Some(&session())).await;

        assert_eq!(
            result,
            Err(LifecycleError::Repository(RepositoryError::Connection(
                "offline".to_string()
            )))
        );
        assert_eq!(page.state(), LifecycleState::New);
        assert_eq!(page.report_id(), None);
        assert_eq!(page.inputs(), before);
        assert!(page.is_dirty());

        repo.fail_writes.store(false, Ordering::SeqCst);
        assert!(page.save(Some(&session())).await.is_ok());
    }

    #[tokio::test]
    async fn double_submit_creates_once_then_updates() {
        let repo = TestRepository::default();
        let page = ReportLifecycle::new(&repo, CalculatorType::BreakEven);
        page.set_input("cost_ha", "5800");
        let s = session();

        let (a, b) = tokio::join!(page.save(Some(&s)), page.save(Some(&s)));

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(repo.creates.load(Ordering::SeqCst), 1);
        assert_eq!(repo.updates.load(Ordering::SeqCst), 1);
        assert_eq!(repo.get_recent_reports("user-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn load_during_a_save_waits_and_wins() {
        let repo = TestRepository::default();
        let s = session();
        let stored = ReportLifecycle::new(&repo, CalculatorType::BreakEven);
        stored.set_input("cost_ha", "4200");
        let stored_id = stored.save(Some(&s)).await.unwrap();

        let page = ReportLifecycle::new(&repo, CalculatorType::BreakEven);
        page.set_input("cost_ha", "5800");
        let (saved, loaded) = tokio::join!(page.save(Some(&s)), page.load(stored_id));

        assert_ne!(saved.unwrap(), stored_id);
        loaded.unwrap();
        assert_eq!(page.state(), LifecycleState::Loaded);
        assert_eq!(page.report_id(), Some(stored_id));
        assert_eq!(page.inputs().number("cost_ha"), dec!(4200));
        assert!(!page.is_dirty());
    }
}
