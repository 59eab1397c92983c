use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::extract::Query as AxumQuery;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::client::{ApiClient, ClientError, ClientOptions, Query};
use crate::models::{
    EndInputRollPayload, Id, Job, JobCreatePayload, Machine, OutputRoll, OutputRollCreatePayload,
    ProcessOrder,
};
use crate::production::{
    FlagSelection, InputForm, LoadOutcome, OutputForm, Phase, ProductionApi, ValidationError,
    Workflow, WorkflowError,
};
use crate::resources::{ListRequest, ResourceError, ResourceKind};

#[derive(Default)]
struct FakeState {
    jobs: Vec<Job>,
    rolls: Vec<OutputRoll>,
    fail_create: bool,
    echo: bool,
    next_id: Id,
    created_jobs: Vec<JobCreatePayload>,
    ended: Vec<EndInputRollPayload>,
    created_rolls: Vec<OutputRollCreatePayload>,
}

struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    fn echoing() -> Self {
        Self {
            state: Mutex::new(FakeState {
                echo: true,
                next_id: 10,
                ..FakeState::default()
            }),
        }
    }

    fn silent() -> Self {
        let api = Self::echoing();
        api.state.lock().unwrap().echo = false;
        api
    }
}

impl ProductionApi for FakeApi {
    async fn process_orders(&self, _query: &Query) -> Result<Vec<ProcessOrder>, ClientError> {
        Ok(["PO-1", "PO-2"]
            .iter()
            .map(|po| ProcessOrder {
                process_order: po.to_string(),
                ..ProcessOrder::default()
            })
            .collect())
    }

    async fn machine_jobs(&self, machine_id: Id) -> Result<Vec<Job>, ClientError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .jobs
            .iter()
            .filter(|j| j.machine_id == machine_id)
            .cloned()
            .collect())
    }

    async fn create_job(&self, payload: &JobCreatePayload) -> Result<Option<Job>, ClientError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(ClientError::Api {
                status: 400,
                message: "Batch roll number already exists".to_string(),
            });
        }
        state.next_id += 1;
        let job = Job {
            id: state.next_id,
            machine_id: payload.machine_id,
            shift_id: payload.shift_id,
            production_order: payload.production_order.clone(),
            batch: payload.input_roll.batch.clone(),
            start_weight: payload.input_roll.start_weight.clone(),
            input_roll_id: state.next_id + 100,
            material_number: Some(payload.input_roll.material_number.clone()),
            ..Job::default()
        };
        state.jobs.push(job.clone());
        state.created_jobs.push(payload.clone());
        Ok(state.echo.then_some(job))
    }

    async fn end_input_roll(&self, payload: &EndInputRollPayload) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        let used = payload.consumed_weight.parse::<f64>().ok();
        if let Some(job) = state.jobs.iter_mut().find(|j| j.id == payload.id) {
            job.consumed_weight = used;
        }
        state.ended.push(payload.clone());
        Ok(())
    }

    async fn create_output_roll(
        &self,
        payload: &OutputRollCreatePayload,
    ) -> Result<Option<OutputRoll>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let roll = OutputRoll {
            id: state.next_id,
            job_id: payload.job_id,
            output_batch: format!("{}-{}", payload.batch, state.next_id),
            final_meter: payload.final_meter,
            flag_reason: payload.flag_reason.clone(),
            flag_count: payload.flag_count,
            ..OutputRoll::default()
        };
        state.rolls.insert(0, roll.clone());
        state.created_rolls.push(payload.clone());
        Ok(state.echo.then_some(roll))
    }

    async fn job_rolls(&self, job_id: Id) -> Result<Vec<OutputRoll>, ClientError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rolls
            .iter()
            .filter(|r| r.job_id == job_id)
            .cloned()
            .collect())
    }
}

fn may_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn line_machine() -> Machine {
    Machine {
        id: 3,
        name: "PRINT LINE1".to_string(),
        section_id: 2,
        ..Machine::default()
    }
}

fn input_form(batch: &str) -> InputForm {
    InputForm {
        material_number: "M-100".to_string(),
        batch: batch.to_string(),
        start_weight: 250.0,
        start_meter: 4000.0,
    }
}

async fn ready_workflow<A: ProductionApi>(api: &A) -> Workflow {
    let mut wf = Workflow::new();
    wf.select_machine(line_machine()).unwrap();
    wf.set_shift(1).unwrap();
    wf.set_date(may_first()).unwrap();
    assert_eq!(
        wf.load_process_orders(api).await.unwrap(),
        LoadOutcome::Loaded(2)
    );
    wf.select_process_order("PO-1").unwrap();
    assert_eq!(wf.phase(), Phase::ReadyToStart);
    wf
}

#[tokio::test]
async fn input_submit_locks_selection_and_switches_to_output() {
    let api = FakeApi::echoing();
    let mut wf = ready_workflow(&api).await;

    let job_id = wf
        .handle_input_submit(&api, &input_form("B-1"))
        .await
        .unwrap()
        .id;

    assert_eq!(wf.phase(), Phase::JobActive);
    assert_eq!(wf.current_job().map(|j| j.id), Some(job_id));
    let locks = wf.locks();
    assert!(locks.machine && locks.shift && locks.date && locks.process_order);
    assert!(!locks.input_enabled);
    assert!(locks.output_enabled);
    assert!(matches!(wf.set_shift(2), Err(WorkflowError::Locked("shift"))));

    let state = api.state.lock().unwrap();
    let sent = &state.created_jobs[0];
    assert_eq!(sent.machine_id, 3);
    assert_eq!(sent.production_order, "PO-1");
    assert_eq!(sent.input_roll.start_weight, "250");
    assert_eq!(sent.input_roll.job_id, 0);
}

#[tokio::test]
async fn failed_input_submit_reenables_the_form() {
    let api = FakeApi::echoing();
    api.state.lock().unwrap().fail_create = true;
    let mut wf = ready_workflow(&api).await;

    let err = wf
        .handle_input_submit(&api, &input_form("B-1"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Batch roll number already exists");
    assert_eq!(wf.phase(), Phase::ReadyToStart);
    assert!(wf.locks().input_enabled);
    assert!(!wf.locks().shift);
}

#[tokio::test]
async fn input_submit_needs_the_form_filled() {
    let api = FakeApi::echoing();
    let mut wf = ready_workflow(&api).await;
    let mut form = input_form(" ");
    let err = wf.handle_input_submit(&api, &form).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Invalid(ValidationError::Missing("Batch"))
    ));

    form.batch = "B-1".to_string();
    form.start_weight = 0.0;
    let err = wf.handle_input_submit(&api, &form).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Invalid(ValidationError::NotPositive("Start weight"))
    ));
    assert!(api.state.lock().unwrap().created_jobs.is_empty());
}

#[tokio::test]
async fn unechoed_job_is_found_among_machine_jobs() {
    let api = FakeApi::silent();
    let mut wf = ready_workflow(&api).await;

    let job = wf
        .handle_input_submit(&api, &input_form("B-7"))
        .await
        .unwrap();
    assert_eq!(job.batch, "B-7");
    assert_eq!(job.production_order, "PO-1");
    assert_eq!(wf.active_jobs().len(), 1);
}

#[tokio::test]
async fn start_new_consumes_the_roll_and_next_submit_locks_again() {
    let api = FakeApi::echoing();
    let mut wf = ready_workflow(&api).await;
    wf.handle_input_submit(&api, &input_form("B-1"))
        .await
        .unwrap();

    wf.begin_start_new().unwrap();
    assert_eq!(wf.phase(), Phase::JobEnding);
    assert!(!wf.locks().output_enabled);

    let err = wf.confirm_start_new(&api, 300.0).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Invalid(ValidationError::UsedWeightTooHigh { .. })
    ));
    assert!(api.state.lock().unwrap().ended.is_empty());

    wf.confirm_start_new(&api, 240.5).await.unwrap();
    assert!(wf.current_job().is_none());
    assert!(wf.active_jobs().is_empty());
    let locks = wf.locks();
    assert!(locks.machine);
    assert!(!locks.shift && !locks.date && !locks.process_order);
    assert!(locks.input_enabled);
    assert!(!locks.output_enabled);
    assert_eq!(wf.phase(), Phase::ReadyToStart);

    {
        let state = api.state.lock().unwrap();
        let ended = &state.ended[0];
        assert_eq!(ended.consumed_weight, "240.5");
        assert_eq!(ended.posting_date, "2024-05-01");
        assert_eq!(ended.weight_unit, "KG");
        assert_eq!(ended.material_number, "M-100");
    }

    wf.handle_input_submit(&api, &input_form("B-2"))
        .await
        .unwrap();
    let locks = wf.locks();
    assert!(locks.shift && locks.date && locks.process_order);
    assert_eq!(wf.current_job().map(|j| j.batch.as_str()), Some("B-2"));
}

#[tokio::test]
async fn output_submit_checks_flags_and_prepends_the_roll() {
    let api = FakeApi::echoing();
    let mut wf = ready_workflow(&api).await;

    let no_job = wf
        .handle_output_submit(&api, &OutputForm::default())
        .await
        .unwrap_err();
    assert!(matches!(no_job, WorkflowError::NoActiveJob));

    wf.handle_input_submit(&api, &input_form("B-1"))
        .await
        .unwrap();

    let mut form = OutputForm {
        final_meter: 1200.0,
        core_weight: 1.5,
        flags: vec![FlagSelection {
            reason: "Wrinkles".to_string(),
            count: 0,
        }],
    };
    let err = wf.handle_output_submit(&api, &form).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Invalid(ValidationError::FlagCount(_))
    ));
    assert!(api.state.lock().unwrap().created_rolls.is_empty());

    form.flags = vec![
        FlagSelection {
            reason: "Wrinkles".to_string(),
            count: 2,
        },
        FlagSelection {
            reason: "Edge damage".to_string(),
            count: 1,
        },
    ];
    wf.handle_output_submit(&api, &form).await.unwrap();
    form.flags.clear();
    wf.handle_output_submit(&api, &form).await.unwrap();

    let rolls = wf.output_rolls();
    assert_eq!(rolls.len(), 2);
    assert!(rolls[0].id > rolls[1].id);

    let state = api.state.lock().unwrap();
    let flagged = &state.created_rolls[0];
    assert_eq!(
        flagged.flag_reason.as_deref(),
        Some("Wrinkles (2), Edge damage (1)")
    );
    assert_eq!(flagged.flag_count, 3);
    assert_eq!(flagged.batch, "B-1");
    assert_eq!(state.created_rolls[1].flag_reason, None);
    assert_eq!(state.created_rolls[1].flag_count, 0);
}

#[tokio::test]
async fn unechoed_roll_reloads_job_rolls() {
    let api = FakeApi::silent();
    let mut wf = ready_workflow(&api).await;
    wf.handle_input_submit(&api, &input_form("B-1"))
        .await
        .unwrap();
    let form = OutputForm {
        final_meter: 900.0,
        core_weight: 1.2,
        flags: Vec::new(),
    };
    wf.handle_output_submit(&api, &form).await.unwrap();
    assert_eq!(wf.output_rolls().len(), 1);
    assert_eq!(wf.output_rolls()[0].final_meter, 900.0);
}

#[tokio::test]
async fn active_jobs_skip_consumed_and_adopt_the_first() {
    let api = FakeApi::echoing();
    {
        let mut state = api.state.lock().unwrap();
        state.jobs = vec![
            Job {
                id: 1,
                machine_id: 3,
                consumed_weight: Some(80.0),
                ..Job::default()
            },
            Job {
                id: 2,
                machine_id: 3,
                shift_id: 2,
                batch: "B-9".to_string(),
                ..Job::default()
            },
            Job {
                id: 3,
                machine_id: 5,
                ..Job::default()
            },
        ];
    }
    let mut wf = Workflow::new();
    wf.select_machine(line_machine()).unwrap();

    assert_eq!(wf.load_active_jobs(&api).await.unwrap(), 1);
    assert_eq!(wf.current_job().map(|j| j.id), Some(2));
    assert_eq!(wf.shift_id(), Some(2));
    assert_eq!(wf.phase(), Phase::JobActive);
    assert!(wf.locks().output_enabled);
}

#[tokio::test]
async fn refresh_moves_on_when_the_current_job_is_consumed_elsewhere() {
    let api = FakeApi::echoing();
    {
        let mut state = api.state.lock().unwrap();
        state.jobs = vec![
            Job {
                id: 2,
                machine_id: 3,
                shift_id: 1,
                batch: "B-2".to_string(),
                ..Job::default()
            },
            Job {
                id: 4,
                machine_id: 3,
                shift_id: 2,
                batch: "B-4".to_string(),
                ..Job::default()
            },
        ];
    }
    let mut wf = Workflow::new();
    wf.select_machine(line_machine()).unwrap();
    wf.refresh(&api).await.unwrap();
    assert_eq!(wf.current_job().map(|j| j.id), Some(2));

    api.state.lock().unwrap().jobs[0].consumed_weight = Some(50.0);
    wf.refresh(&api).await.unwrap();
    assert_eq!(wf.current_job().map(|j| j.id), Some(4));
    assert_eq!(wf.shift_id(), Some(2));
    assert_eq!(wf.phase(), Phase::JobActive);
    assert!(wf.locks().output_enabled);

    api.state.lock().unwrap().jobs[1].end_datetime = Some("2024-05-01 18:00:00".to_string());
    wf.refresh(&api).await.unwrap();
    assert!(wf.current_job().is_none());
    assert!(wf.output_rolls().is_empty());
    let locks = wf.locks();
    assert!(!locks.shift && !locks.date && !locks.process_order);
    assert!(locks.input_enabled);
    assert!(!locks.output_enabled);
    wf.set_shift(1).unwrap();
    wf.set_date(may_first()).unwrap();
    assert_eq!(wf.phase(), Phase::AwaitingProcessOrder);
}

#[tokio::test]
async fn unechoed_job_prefers_the_newest_matching_batch() {
    let api = FakeApi::silent();
    api.state.lock().unwrap().jobs.push(Job {
        id: 5,
        machine_id: 3,
        shift_id: 1,
        production_order: "PO-1".to_string(),
        batch: "B-1".to_string(),
        start_weight: "120".to_string(),
        ..Job::default()
    });
    let mut wf = ready_workflow(&api).await;

    let job = wf
        .handle_input_submit(&api, &input_form("B-1"))
        .await
        .unwrap();
    assert_eq!(job.id, 11);
    assert_eq!(job.start_weight, "250");
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client_for(base_url: String) -> ApiClient {
    ApiClient::new(&ClientOptions {
        base_url,
        timeout_seconds: 5,
        ..ClientOptions::default()
    })
    .unwrap()
}

fn with_reference_routes(router: Router) -> Router {
    router
        .route(
            "/api/users",
            get(|| async { Json(json!([{"id": 7, "full_name": "Ama Owusu"}])) }),
        )
        .route(
            "/api/lookups/shifts",
            get(|| async { Json(json!([{"id": 1, "name": "Day"}, {"id": 2, "name": "Night"}])) }),
        )
        .route(
            "/api/lookups/downtime-reasons",
            get(|| async { Json(json!([{"id": 4, "name": "Ink change"}])) }),
        )
        .route(
            "/api/lookups/scrap-types",
            get(|| async { Json(json!([{"id": 5, "name": "Trim"}])) }),
        )
}

#[tokio::test]
async fn client_reads_paged_and_bare_bodies() {
    let app = Router::new()
        .route(
            "/api/machines/filter",
            get(|| async { Json(json!({"data": [{"id": 1, "name": "LINE1"}], "total_count": 42})) }),
        )
        .route(
            "/api/roles",
            get(|| async { Json(json!([{"id": 1, "name": "Admin"}, {"id": 2, "name": "Production"}])) }),
        );
    let client = client_for(serve(app).await);

    let machines = client
        .get_page::<Machine>("/api/machines/filter", &Query::new())
        .await
        .unwrap();
    assert_eq!(machines.total_count, 42);
    assert_eq!(machines.data[0].name, "LINE1");

    let roles = client
        .get_page::<crate::models::Role>("/api/roles", &Query::new())
        .await
        .unwrap();
    assert_eq!(roles.total_count, 2);
}

#[tokio::test]
async fn client_maps_error_bodies() {
    let app = Router::new()
        .route(
            "/api/users/create",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"message": "UNIQUE constraint failed: users.staffid"})),
                )
            }),
        )
        .route(
            "/api/plain",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
    let client = client_for(serve(app).await);

    let err = client
        .post_json::<_, Value>("/api/users/create", &json!({"staffid": "S1"}))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Api { status: 400, ref message } if message == "Staff ID already exists"
    ));

    let err = client
        .get_value("/api/missing", &Query::new())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Not Found");

    let err = client.get_value("/api/plain", &Query::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "boom");
}

#[tokio::test]
async fn downtime_listing_sends_filters_and_builds_stats() {
    let seen: Arc<Mutex<HashMap<String, String>>> = Arc::default();
    let recorder = seen.clone();
    let app = with_reference_routes(Router::new()).route(
        "/api/downtimes/filter",
        get(move |AxumQuery(q): AxumQuery<HashMap<String, String>>| {
            let recorder = recorder.clone();
            async move {
                *recorder.lock().unwrap() = q;
                Json(json!({
                    "data": [
                        {"id": 1, "shift_id": 1, "downtime_reason_id": 4, "duration_minutes": 45, "created_by": 7},
                        {"id": 2, "shift_id": 2, "downtime_reason_id": 4, "duration_minutes": 20, "created_by": 7}
                    ],
                    "total_count": 5
                }))
            }
        }),
    );
    let client = client_for(serve(app).await);

    let mut filters = BTreeMap::new();
    filters.insert("shift_id".to_string(), "1".to_string());
    let request = ListRequest {
        page: 2,
        per_page: 2,
        filters,
        detailed: false,
    };
    let listing = crate::resources::list(&client, ResourceKind::Downtimes, &request)
        .await
        .unwrap();

    let query = seen.lock().unwrap().clone();
    assert_eq!(query.get("shift_id").map(String::as_str), Some("1"));
    assert_eq!(query.get("page").map(String::as_str), Some("2"));
    assert_eq!(query.get("per_page").map(String::as_str), Some("2"));

    assert_eq!(listing.pagination.total_pages(), 3);
    assert_eq!(listing.table.rows.len(), 2);
    assert_eq!(listing.table.rows[0][1], "Day");
    assert_eq!(listing.table.rows[0][2], "Ink change");
    assert_eq!(listing.table.rows[0][6], "Ama Owusu");
    assert!(listing
        .stats
        .contains(&("Records".to_string(), "5".to_string())));
    assert!(listing
        .stats
        .contains(&("Total".to_string(), "1h 5m".to_string())));
}

#[tokio::test]
async fn input_rolls_are_filtered_and_paged_locally() {
    let app = with_reference_routes(Router::new()).route(
        "/api/input-rolls",
        get(|| async {
            Json(json!([
                {"id": 1, "batch": "A-1", "start_weight": "100", "created_at": "2024-05-01 08:00:00"},
                {"id": 2, "batch": "A-2", "start_weight": 90, "consumed_weight": 85.5, "created_at": "2024-05-01 09:00:00"},
                {"id": 3, "batch": "B-1", "start_weight": "80", "created_at": "2024-05-02 10:00:00"}
            ]))
        }),
    );
    let client = client_for(serve(app).await);

    let mut filters = BTreeMap::new();
    filters.insert("status".to_string(), "open".to_string());
    let request = ListRequest {
        page: 1,
        per_page: 1,
        filters,
        detailed: false,
    };
    let listing = crate::resources::list(&client, ResourceKind::InputRolls, &request)
        .await
        .unwrap();
    assert_eq!(listing.pagination.total, 2);
    assert_eq!(listing.table.rows.len(), 1);
    assert_eq!(listing.table.rows[0][1], "A-1");
    assert!(listing
        .stats
        .contains(&("Total".to_string(), "2".to_string())));
}

#[tokio::test]
async fn oversized_page_selects_the_all_option() {
    let app = Router::new().route(
        "/api/roles",
        get(|| async {
            Json(json!([
                {"id": 1, "name": "Admin"},
                {"id": 2, "name": "Production"},
                {"id": 3, "name": "Settings"}
            ]))
        }),
    );
    let client = client_for(serve(app).await);
    let request = ListRequest {
        page: 1,
        per_page: 50,
        filters: BTreeMap::new(),
        detailed: false,
    };
    let listing = crate::resources::list(&client, ResourceKind::Roles, &request)
        .await
        .unwrap();
    assert_eq!(listing.table.rows.len(), 3);
    let selected: Vec<&str> = listing
        .per_page_options
        .iter()
        .filter(|o| o.selected)
        .map(|o| o.label.as_str())
        .collect();
    assert_eq!(selected, vec!["All"]);
}

#[tokio::test]
async fn export_probes_the_total_then_fetches_everything() {
    let sizes: Arc<Mutex<Vec<usize>>> = Arc::default();
    let recorder = sizes.clone();
    let app = with_reference_routes(Router::new()).route(
        "/api/scraps/filter",
        get(move |AxumQuery(q): AxumQuery<HashMap<String, String>>| {
            let recorder = recorder.clone();
            async move {
                let per_page: usize = q
                    .get("per_page")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10);
                recorder.lock().unwrap().push(per_page);
                let all: Vec<Value> = (1..=3)
                    .map(|id| json!({"id": id, "shift_id": 1, "scrap_type_id": 5, "weight_kg": 2.5, "created_by": 7}))
                    .collect();
                let data: Vec<Value> = all.into_iter().take(per_page).collect();
                Json(json!({"data": data, "total_count": 3}))
            }
        }),
    );
    let client = client_for(serve(app).await);

    let (table, records) = crate::resources::export(&client, ResourceKind::Scraps, &BTreeMap::new())
        .await
        .unwrap();
    assert_eq!(*sizes.lock().unwrap(), vec![1, 3]);
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[2][3], "Trim");
    assert_eq!(records.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn delete_sends_the_id_in_the_body() {
    let body: Arc<Mutex<Option<Value>>> = Arc::default();
    let recorder = body.clone();
    let app = Router::new().route(
        "/api/machines/delete",
        delete(move |Json(payload): Json<Value>| {
            let recorder = recorder.clone();
            async move {
                *recorder.lock().unwrap() = Some(payload);
                Json(json!({"message": "Machine deleted"}))
            }
        }),
    );
    let client = client_for(serve(app).await);

    let reply = crate::resources::delete(&client, ResourceKind::Machines, 9)
        .await
        .unwrap();
    assert_eq!(reply["message"], "Machine deleted");
    assert_eq!(body.lock().unwrap().clone(), Some(json!({"id": 9})));
}

#[tokio::test]
async fn mutations_are_checked_before_any_request() {
    let client = client_for("http://127.0.0.1:9".to_string());

    let err = crate::resources::update(&client, ResourceKind::Machines, json!({"name": "LINE2"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::MissingId { .. }));

    let err = crate::resources::create(&client, ResourceKind::Consumables, json!({"id": 1}))
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::ReadOnly { .. }));

    let err = crate::resources::create(
        &client,
        ResourceKind::Downtimes,
        json!({"shift_id": 1, "start_time": "2024-05-01T09:00", "end_time": "2024-05-01T08:00"}),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ResourceError::InvalidPayload(_)));
}

#[tokio::test]
async fn hardware_bridge_reads_the_scale() {
    let app = Router::new().route(
        "/api/app/weight",
        get(|| async { Json(json!({"weight": "12.3456"})) }),
    );
    let base = serve(app).await;
    let bridge = crate::client::hardware::HardwareBridge::new(&base, 5).unwrap();
    assert_eq!(bridge.weight().await.unwrap(), 12.346);
}

#[tokio::test]
async fn workflow_refetches_a_job_the_backend_did_not_echo() {
    let app = Router::new()
        .route(
            "/api/sap/process_order",
            get(|| async { Json(json!([{"id": 1, "process_order": "PO-1"}, {"id": 2, "process_order": "PO-2"}])) }),
        )
        .route(
            "/api/jobs/create",
            post(|| async { Json(json!({"message": "Job created"})) }),
        )
        .route(
            "/api/jobs/filter-with-input-rolls",
            get(|| async {
                Json(json!({
                    "data": [
                        {"id": 76, "machine_id": 3, "production_order": "PO-1", "batch": "B-1", "consumed_weight": "40"},
                        {"id": 77, "machine_id": 3, "shift_id": 1, "production_order": "PO-1", "batch": "B-1", "start_weight": 250}
                    ],
                    "total_count": 2
                }))
            }),
        );
    let client = client_for(serve(app).await);
    let mut wf = ready_workflow(&client).await;

    let job = wf
        .handle_input_submit(&client, &input_form("B-1"))
        .await
        .unwrap();
    assert_eq!(job.id, 77);
    assert_eq!(job.start_weight_kg(), Some(250.0));
    assert_eq!(wf.phase(), Phase::JobActive);
}
