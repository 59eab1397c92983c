pub mod interactive;
pub mod token;
pub mod validate;

use std::sync::OnceLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};

use crate::client::{ApiClient, ClientError, Page, Query};
use crate::models::{
    EndInputRollPayload, Id, InputRollCreatePayload, Job, JobCreatePayload, Machine, OutputRoll,
    OutputRollCreatePayload, ProcessOrder,
};
pub use token::{RequestToken, RequestTokens};
pub use validate::{FlagSelection, InputForm, OutputForm, ValidationError};

pub const WEIGHT_UNIT: &str = "KG";
const ACTIVE_JOBS_PAGE: usize = 100;
const JOB_ROLLS_PAGE: usize = 10;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("select a {0} first")]
    MissingSelection(&'static str),

    #[error("{0} is locked while a job is active")]
    Locked(&'static str),

    #[error("{0}")]
    Invalid(#[from] ValidationError),

    #[error("No active job selected")]
    NoActiveJob,

    #[error("the input form is not available right now")]
    InputDisabled,

    #[error("the output form is not available right now")]
    OutputDisabled,

    #[error("process order '{0}' is not in the loaded list")]
    UnknownProcessOrder(String),

    #[error("job #{0} is not one of the active jobs")]
    UnknownJob(Id),

    #[error("job was created but could not be found among the active jobs")]
    CreatedJobMissing,

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    NoMachine,
    AwaitingShiftDate,
    AwaitingProcessOrder,
    ReadyToStart,
    JobActive,
    JobEnding,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldLocks {
    pub machine: bool,
    pub shift: bool,
    pub date: bool,
    pub process_order: bool,
    pub input_enabled: bool,
    pub output_enabled: bool,
}

impl Default for FieldLocks {
    fn default() -> Self {
        Self {
            machine: false,
            shift: false,
            date: false,
            process_order: false,
            input_enabled: true,
            output_enabled: false,
        }
    }
}

impl FieldLocks {
    fn lock_all(&mut self) {
        self.machine = true;
        self.shift = true;
        self.date = true;
        self.process_order = true;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    /// A newer load was started; this response was dropped.
    Stale,
}

/// Backend calls the workflow depends on.
#[allow(async_fn_in_trait)]
pub trait ProductionApi {
    async fn process_orders(&self, query: &Query) -> Result<Vec<ProcessOrder>, ClientError>;
    async fn machine_jobs(&self, machine_id: Id) -> Result<Vec<Job>, ClientError>;
    /// `None` when the backend acknowledges without echoing the job.
    async fn create_job(&self, payload: &JobCreatePayload) -> Result<Option<Job>, ClientError>;
    async fn end_input_roll(&self, payload: &EndInputRollPayload) -> Result<(), ClientError>;
    async fn create_output_roll(
        &self,
        payload: &OutputRollCreatePayload,
    ) -> Result<Option<OutputRoll>, ClientError>;
    async fn job_rolls(&self, job_id: Id) -> Result<Vec<OutputRoll>, ClientError>;
}

fn echoed<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Option<T> {
    let has_id = value
        .get("id")
        .and_then(|v| v.as_i64())
        .is_some_and(|id| id > 0);
    if !has_id {
        return None;
    }
    serde_json::from_value(value).ok()
}

impl ProductionApi for ApiClient {
    async fn process_orders(&self, query: &Query) -> Result<Vec<ProcessOrder>, ClientError> {
        let page: Page<ProcessOrder> = self.get_page("/api/sap/process_order", query).await?;
        Ok(page.data)
    }

    async fn machine_jobs(&self, machine_id: Id) -> Result<Vec<Job>, ClientError> {
        let query = Query::new()
            .push("machine_id", machine_id)
            .push("per_page", ACTIVE_JOBS_PAGE);
        let page: Page<Job> = self
            .get_page("/api/jobs/filter-with-input-rolls", &query)
            .await?;
        Ok(page.data)
    }

    async fn create_job(&self, payload: &JobCreatePayload) -> Result<Option<Job>, ClientError> {
        let value: serde_json::Value = self.post_json("/api/jobs/create", payload).await?;
        Ok(echoed(value))
    }

    async fn end_input_roll(&self, payload: &EndInputRollPayload) -> Result<(), ClientError> {
        let _: serde_json::Value = self.post_json("/api/input-rolls/end", payload).await?;
        Ok(())
    }

    async fn create_output_roll(
        &self,
        payload: &OutputRollCreatePayload,
    ) -> Result<Option<OutputRoll>, ClientError> {
        let value: serde_json::Value = self.post_json("/api/output-rolls/create", payload).await?;
        Ok(echoed(value))
    }

    async fn job_rolls(&self, job_id: Id) -> Result<Vec<OutputRoll>, ClientError> {
        let query = Query::new()
            .push("job_id", job_id)
            .push("per_page", JOB_ROLLS_PAGE);
        let page: Page<OutputRoll> = self.get_page("/api/output-rolls/filter", &query).await?;
        Ok(page.data)
    }
}

fn line_pattern() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| Regex::new(r"LINE(\d+)").expect("line pattern compiles"))
}

/// `"PRINTING LINE3"` → `Some("3")`.
pub fn line_number(machine_name: &str) -> Option<String> {
    line_pattern()
        .captures(machine_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Operator session on one machine: selection, active job and the output
/// rolls produced against it.
#[derive(Debug, Default)]
pub struct Workflow {
    machine: Option<Machine>,
    shift_id: Option<Id>,
    date: Option<NaiveDate>,
    process_orders: Vec<ProcessOrder>,
    process_order: Option<ProcessOrder>,
    current_job: Option<Job>,
    active_jobs: Vec<Job>,
    output_rolls: Vec<OutputRoll>,
    locks: FieldLocks,
    tokens: RequestTokens,
    ending: bool,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.machine.is_none() {
            return Phase::NoMachine;
        }
        if self.ending && self.current_job.is_some() {
            return Phase::JobEnding;
        }
        if self.current_job.is_some() {
            return Phase::JobActive;
        }
        if self.shift_id.is_none() || self.date.is_none() {
            return Phase::AwaitingShiftDate;
        }
        if self.process_order.is_none() {
            return Phase::AwaitingProcessOrder;
        }
        Phase::ReadyToStart
    }

    pub fn machine(&self) -> Option<&Machine> {
        self.machine.as_ref()
    }

    pub fn shift_id(&self) -> Option<Id> {
        self.shift_id
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn process_orders(&self) -> &[ProcessOrder] {
        &self.process_orders
    }

    pub fn process_order(&self) -> Option<&ProcessOrder> {
        self.process_order.as_ref()
    }

    pub fn current_job(&self) -> Option<&Job> {
        self.current_job.as_ref()
    }

    pub fn active_jobs(&self) -> &[Job] {
        &self.active_jobs
    }

    pub fn output_rolls(&self) -> &[OutputRoll] {
        &self.output_rolls
    }

    pub fn locks(&self) -> FieldLocks {
        self.locks
    }

    pub fn select_machine(&mut self, machine: Machine) -> Result<(), WorkflowError> {
        if self.locks.machine {
            return Err(WorkflowError::Locked("machine"));
        }
        info!(machine_id = machine.id, machine = %machine.name, "machine selected");
        self.machine = Some(machine);
        self.reset_job_state();
        Ok(())
    }

    /// Back to machine selection with every field unlocked.
    pub fn clear_machine(&mut self) {
        info!("returning to machine selection");
        self.machine = None;
        self.reset_job_state();
        self.locks = FieldLocks::default();
    }

    fn reset_job_state(&mut self) {
        self.tokens.invalidate();
        self.process_orders.clear();
        self.process_order = None;
        self.current_job = None;
        self.active_jobs.clear();
        self.output_rolls.clear();
        self.ending = false;
        self.locks.input_enabled = true;
        self.locks.output_enabled = false;
    }

    fn invalidate_process_orders(&mut self) {
        self.tokens.invalidate();
        self.process_orders.clear();
        self.process_order = None;
    }

    pub fn set_shift(&mut self, shift_id: Id) -> Result<(), WorkflowError> {
        if self.locks.shift {
            return Err(WorkflowError::Locked("shift"));
        }
        if self.shift_id != Some(shift_id) {
            self.shift_id = Some(shift_id);
            self.invalidate_process_orders();
        }
        Ok(())
    }

    pub fn set_date(&mut self, date: NaiveDate) -> Result<(), WorkflowError> {
        if self.locks.date {
            return Err(WorkflowError::Locked("date"));
        }
        if self.date != Some(date) {
            self.date = Some(date);
            self.invalidate_process_orders();
        }
        Ok(())
    }

    /// Unsets the date so shift and date get picked again.
    pub fn clear_date(&mut self) -> Result<(), WorkflowError> {
        if self.locks.date {
            return Err(WorkflowError::Locked("date"));
        }
        self.date = None;
        self.invalidate_process_orders();
        Ok(())
    }

    /// Issues a token and builds the process-order query for the current
    /// machine, shift and date.
    pub fn begin_process_order_load(&self) -> Result<(RequestToken, Query), WorkflowError> {
        let machine = self
            .machine
            .as_ref()
            .ok_or(WorkflowError::MissingSelection("machine"))?;
        let shift_id = self
            .shift_id
            .ok_or(WorkflowError::MissingSelection("shift"))?;
        let date = self.date.ok_or(WorkflowError::MissingSelection("date"))?;

        let query = Query::new()
            .push("section_ids", machine.section_id)
            .push_opt("line", line_number(&machine.name))
            .push("shift", shift_id)
            .push("posting_date", date.format("%Y-%m-%d"));
        Ok((self.tokens.issue(), query))
    }

    /// Applies a process-order response unless a newer load superseded it.
    /// The selection is always cleared so the operator has to pick one.
    pub fn apply_process_orders(
        &mut self,
        token: RequestToken,
        result: Result<Vec<ProcessOrder>, ClientError>,
    ) -> Result<LoadOutcome, WorkflowError> {
        if !self.tokens.is_current(token) {
            debug!(?token, "dropping stale process order response");
            return Ok(LoadOutcome::Stale);
        }
        let orders = result?;
        let count = orders.len();
        self.process_orders = orders;
        self.process_order = None;
        info!(count, "process orders loaded");
        Ok(LoadOutcome::Loaded(count))
    }

    pub async fn load_process_orders<A: ProductionApi>(
        &mut self,
        api: &A,
    ) -> Result<LoadOutcome, WorkflowError> {
        let (token, query) = self.begin_process_order_load()?;
        let result = api.process_orders(&query).await;
        self.apply_process_orders(token, result)
    }

    pub fn select_process_order(&mut self, process_order: &str) -> Result<(), WorkflowError> {
        if self.locks.process_order {
            return Err(WorkflowError::Locked("process order"));
        }
        let found = self
            .process_orders
            .iter()
            .find(|po| po.process_order == process_order)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownProcessOrder(process_order.to_string()))?;
        self.process_order = Some(found);
        Ok(())
    }

    pub fn clear_process_order(&mut self) -> Result<(), WorkflowError> {
        if self.locks.process_order {
            return Err(WorkflowError::Locked("process order"));
        }
        self.process_order = None;
        Ok(())
    }

    /// A current job keeps every selection field locked; dropping it frees
    /// shift, date and process order again.
    fn adopt_job(&mut self, job: Job) {
        info!(job_id = job.id, batch = %job.batch, "job active");
        self.shift_id = Some(job.shift_id);
        self.current_job = Some(job);
        self.locks.lock_all();
        self.locks.input_enabled = false;
        self.locks.output_enabled = true;
        self.ending = false;
    }

    fn release_job(&mut self) {
        self.current_job = None;
        self.output_rolls.clear();
        self.ending = false;
        self.locks.output_enabled = false;
        self.locks.input_enabled = true;
        self.locks.shift = false;
        self.locks.date = false;
        self.locks.process_order = false;
    }

    /// Refreshes the machine's unconsumed jobs. The current job is kept while
    /// it is still active; otherwise the first active job is adopted.
    pub async fn load_active_jobs<A: ProductionApi>(&mut self, api: &A) -> Result<usize, WorkflowError> {
        let machine_id = self
            .machine
            .as_ref()
            .map(|m| m.id)
            .ok_or(WorkflowError::MissingSelection("machine"))?;
        let jobs = api.machine_jobs(machine_id).await?;
        self.active_jobs = jobs.into_iter().filter(Job::is_active).collect();

        if let Some(id) = self.current_job.as_ref().map(|j| j.id) {
            match self.active_jobs.iter().find(|j| j.id == id).cloned() {
                Some(job) => {
                    self.current_job = Some(job);
                    return Ok(self.active_jobs.len());
                }
                None => {
                    info!(job_id = id, "current job is no longer active");
                    self.release_job();
                }
            }
        }
        if let Some(first) = self.active_jobs.first().cloned() {
            self.adopt_job(first);
        }
        Ok(self.active_jobs.len())
    }

    pub fn select_active_job(&mut self, job_id: Id) -> Result<(), WorkflowError> {
        let job = self
            .active_jobs
            .iter()
            .find(|j| j.id == job_id)
            .cloned()
            .ok_or(WorkflowError::UnknownJob(job_id))?;
        if self.current_job.as_ref().map(|j| j.id) != Some(job_id) {
            self.output_rolls.clear();
        }
        self.adopt_job(job);
        Ok(())
    }

    /// Starts a job on the selected machine by consuming a new input roll.
    /// On failure the input form is enabled again.
    pub async fn handle_input_submit<A: ProductionApi>(
        &mut self,
        api: &A,
        form: &InputForm,
    ) -> Result<&Job, WorkflowError> {
        if !self.locks.input_enabled {
            return Err(WorkflowError::InputDisabled);
        }
        validate::validate_input(
            form,
            self.process_order.as_ref().map(|po| po.process_order.as_str()),
            self.machine.is_some(),
            self.shift_id.is_some(),
        )?;
        let (machine_id, shift_id, production_order) =
            match (&self.machine, self.shift_id, &self.process_order) {
                (Some(m), Some(s), Some(po)) => (m.id, s, po.process_order.clone()),
                _ => return Err(WorkflowError::MissingSelection("process order")),
            };

        let payload = JobCreatePayload {
            machine_id,
            shift_id,
            production_order,
            input_roll: InputRollCreatePayload {
                job_id: 0,
                batch: form.batch.trim().to_string(),
                material_document: None,
                material_number: form.material_number.trim().to_string(),
                start_meter: form.start_meter,
                start_weight: validate::weight_text(form.start_weight),
                consumed_weight: None,
            },
        };

        self.locks.input_enabled = false;
        match self.create_and_locate_job(api, &payload).await {
            Ok(job) => {
                if !self.active_jobs.iter().any(|j| j.id == job.id) {
                    self.active_jobs.push(job.clone());
                }
                self.output_rolls.clear();
                self.adopt_job(job);
                self.current_job.as_ref().ok_or(WorkflowError::NoActiveJob)
            }
            Err(e) => {
                self.locks.input_enabled = true;
                Err(e)
            }
        }
    }

    async fn create_and_locate_job<A: ProductionApi>(
        &self,
        api: &A,
        payload: &JobCreatePayload,
    ) -> Result<Job, WorkflowError> {
        if let Some(job) = api.create_job(payload).await? {
            return Ok(job);
        }
        // An older unconsumed job can share the batch; the newest one is ours.
        let jobs = api.machine_jobs(payload.machine_id).await?;
        jobs.into_iter()
            .filter(Job::is_active)
            .filter(|j| {
                j.production_order == payload.production_order
                    && j.batch == payload.input_roll.batch
            })
            .max_by_key(|j| j.id)
            .ok_or(WorkflowError::CreatedJobMissing)
    }

    pub fn begin_start_new(&mut self) -> Result<(), WorkflowError> {
        if self.current_job.is_none() {
            return Err(WorkflowError::NoActiveJob);
        }
        self.ending = true;
        self.locks.output_enabled = false;
        Ok(())
    }

    pub fn cancel_start_new(&mut self) {
        self.ending = false;
        self.locks.output_enabled = self.current_job.is_some();
    }

    /// Closes the current input roll with the consumed weight and gets the
    /// input form ready for the next roll.
    pub async fn confirm_start_new<A: ProductionApi>(
        &mut self,
        api: &A,
        used_weight: f64,
    ) -> Result<(), WorkflowError> {
        let job = self.current_job.as_ref().ok_or(WorkflowError::NoActiveJob)?;
        let start = job
            .start_weight_kg()
            .ok_or_else(|| ValidationError::InvalidStartWeight(job.start_weight.clone()))?;
        validate::validate_used_weight(used_weight, start)?;

        let posting_date = self.date.unwrap_or_else(|| Local::now().date_naive());
        let payload = EndInputRollPayload {
            id: job.id,
            weight_unit: WEIGHT_UNIT.to_string(),
            posting_date: posting_date.format("%Y-%m-%d").to_string(),
            batch: job.batch.clone(),
            input_roll_id: job.input_roll_id,
            consumed_weight: validate::weight_text(used_weight),
            material_number: job.material_number.clone().unwrap_or_default(),
            production_order: job.production_order.clone(),
        };
        api.end_input_roll(&payload).await?;

        let finished = payload.id;
        info!(job_id = finished, used_weight, "input roll consumed");
        self.active_jobs.retain(|j| j.id != finished);
        self.release_job();
        Ok(())
    }

    pub async fn handle_output_submit<A: ProductionApi>(
        &mut self,
        api: &A,
        form: &OutputForm,
    ) -> Result<(), WorkflowError> {
        let job = self.current_job.as_ref().ok_or(WorkflowError::NoActiveJob)?;
        if !self.locks.output_enabled {
            return Err(WorkflowError::OutputDisabled);
        }
        validate::validate_output(form)?;
        let (flag_reason, flag_count) = validate::encode_flags(&form.flags);
        let payload = OutputRollCreatePayload {
            final_meter: form.final_meter,
            batch: job.batch.clone(),
            flag_reason,
            core_weight: Some(form.core_weight),
            shift_id: job.shift_id,
            job_id: job.id,
            machine_id: job.machine_id,
            input_roll_id: job.input_roll_id,
            flag_count,
        };
        match api.create_output_roll(&payload).await? {
            Some(roll) => {
                info!(roll_id = roll.id, batch = %roll.output_batch, "output roll created");
                self.output_rolls.insert(0, roll);
            }
            None => {
                self.load_job_rolls(api).await?;
            }
        }
        Ok(())
    }

    pub async fn load_job_rolls<A: ProductionApi>(&mut self, api: &A) -> Result<usize, WorkflowError> {
        let job_id = self
            .current_job
            .as_ref()
            .map(|j| j.id)
            .ok_or(WorkflowError::NoActiveJob)?;
        self.output_rolls = api.job_rolls(job_id).await?;
        Ok(self.output_rolls.len())
    }

    pub async fn refresh<A: ProductionApi>(&mut self, api: &A) -> Result<(), WorkflowError> {
        self.load_active_jobs(api).await?;
        if self.current_job.is_some() {
            self.load_job_rolls(api).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_line_number() {
        assert_eq!(line_number("PRINTING LINE3").as_deref(), Some("3"));
        assert_eq!(line_number("SLITTER-LINE12 B").as_deref(), Some("12"));
        assert_eq!(line_number("Laminator"), None);
        assert_eq!(line_number("line4"), None);
    }

    #[test]
    fn phase_follows_selection() {
        let mut wf = Workflow::new();
        assert_eq!(wf.phase(), Phase::NoMachine);
        wf.select_machine(Machine {
            id: 1,
            name: "LINE1".to_string(),
            ..Machine::default()
        })
        .unwrap();
        assert_eq!(wf.phase(), Phase::AwaitingShiftDate);
        wf.set_shift(1).unwrap();
        wf.set_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()).unwrap();
        assert_eq!(wf.phase(), Phase::AwaitingProcessOrder);
    }

    #[test]
    fn process_order_load_needs_full_selection() {
        let wf = Workflow::new();
        assert!(matches!(
            wf.begin_process_order_load(),
            Err(WorkflowError::MissingSelection("machine"))
        ));
    }

    #[test]
    fn query_carries_section_line_shift_and_date() {
        let mut wf = Workflow::new();
        wf.select_machine(Machine {
            id: 4,
            name: "PRINT LINE2".to_string(),
            section_id: 7,
            ..Machine::default()
        })
        .unwrap();
        wf.set_shift(2).unwrap();
        wf.set_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()).unwrap();
        let (_, query) = wf.begin_process_order_load().unwrap();
        assert_eq!(query.get("section_ids"), Some("7"));
        assert_eq!(query.get("line"), Some("2"));
        assert_eq!(query.get("shift"), Some("2"));
        assert_eq!(query.get("posting_date"), Some("2024-05-01"));
    }

    #[test]
    fn stale_process_orders_are_dropped() {
        let mut wf = Workflow::new();
        wf.select_machine(Machine::default()).unwrap();
        wf.set_shift(1).unwrap();
        wf.set_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()).unwrap();

        let (old, _) = wf.begin_process_order_load().unwrap();
        let (new, _) = wf.begin_process_order_load().unwrap();

        let late = vec![ProcessOrder {
            process_order: "OLD".to_string(),
            ..ProcessOrder::default()
        }];
        assert_eq!(
            wf.apply_process_orders(old, Ok(late)).unwrap(),
            LoadOutcome::Stale
        );
        assert!(wf.process_orders().is_empty());

        let fresh = vec![ProcessOrder {
            process_order: "NEW".to_string(),
            ..ProcessOrder::default()
        }];
        assert_eq!(
            wf.apply_process_orders(new, Ok(fresh)).unwrap(),
            LoadOutcome::Loaded(1)
        );
        assert_eq!(wf.process_orders()[0].process_order, "NEW");
    }

    #[test]
    fn single_process_order_is_not_auto_selected() {
        let mut wf = Workflow::new();
        wf.select_machine(Machine::default()).unwrap();
        wf.set_shift(1).unwrap();
        wf.set_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()).unwrap();
        let (token, _) = wf.begin_process_order_load().unwrap();
        let only = vec![ProcessOrder {
            process_order: "ONLY".to_string(),
            ..ProcessOrder::default()
        }];
        wf.apply_process_orders(token, Ok(only)).unwrap();
        assert!(wf.process_order().is_none());
        assert_eq!(wf.phase(), Phase::AwaitingProcessOrder);
        wf.select_process_order("ONLY").unwrap();
        assert_eq!(wf.phase(), Phase::ReadyToStart);
        assert!(matches!(
            wf.select_process_order("MISSING"),
            Err(WorkflowError::UnknownProcessOrder(_))
        ));
    }

    #[test]
    fn changing_shift_drops_loaded_orders() {
        let mut wf = Workflow::new();
        wf.select_machine(Machine::default()).unwrap();
        wf.set_shift(1).unwrap();
        wf.set_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()).unwrap();
        let (token, _) = wf.begin_process_order_load().unwrap();
        wf.apply_process_orders(token, Ok(vec![ProcessOrder::default()]))
            .unwrap();
        wf.set_shift(2).unwrap();
        assert!(wf.process_orders().is_empty());
        assert!(!wf.tokens.is_current(token));
    }

    #[test]
    fn start_new_requires_job() {
        let mut wf = Workflow::new();
        assert!(matches!(
            wf.begin_start_new(),
            Err(WorkflowError::NoActiveJob)
        ));
    }
}
