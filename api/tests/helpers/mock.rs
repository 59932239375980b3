use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::{Next, from_fn},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const TOKEN: &str = "test-token";

/// Shared record of what the client sent, plus knobs for failure injection.
#[derive(Clone, Default)]
pub struct Mock {
    inner: Arc<Mutex<Recorded>>,
}

#[derive(Default)]
struct Recorded {
    calls: Vec<(String, Value)>,
    flaky_failures: u32,
    flaky_hits: u32,
}

impl Mock {
    fn record(&self, label: impl Into<String>, body: Value) {
        self.inner.lock().unwrap().calls.push((label.into(), body));
    }

    /// Bodies of every call recorded under `label`, oldest first.
    pub fn calls(&self, label: &str) -> Vec<Value> {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(l, _)| l == label)
            .map(|(_, b)| b.clone())
            .collect()
    }

    /// Makes the next `n` hits on `/api/flaky` answer 500.
    pub fn set_flaky(&self, n: u32) {
        self.inner.lock().unwrap().flaky_failures = n;
    }

    pub fn flaky_hits(&self) -> u32 {
        self.inner.lock().unwrap().flaky_hits
    }
}

type Reply = (StatusCode, Json<Value>);

fn ok(data: Value) -> Reply {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": "OK", "data": data })),
    )
}

fn fail(status: StatusCode, message: &str) -> Reply {
    (
        status,
        Json(json!({ "success": false, "message": message, "data": {} })),
    )
}

async fn require_token(req: Request, next: Next) -> Response {
    let expected = format!("Bearer {TOKEN}");
    let authorized = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(expected.as_str());
    if !authorized {
        return fail(StatusCode::UNAUTHORIZED, "Invalid or expired token").into_response();
    }
    next.run(req).await
}

fn lecturer(id: &str, name: &str) -> Value {
    json!({ "_id": id, "name": name, "email": format!("{id}@campus.test") })
}

fn course(id: &str, name: &str, archived: bool) -> Value {
    json!({
        "_id": id,
        "courseName": name,
        "credits": 4,
        "year": 2,
        "semester": 1,
        "lecturerInCharge": lecturer("l1", "Dr. Smith"),
        "lecturers": [lecturer("l1", "Dr. Smith")],
        "isArchived": archived,
        "createdAt": "2025-01-02T08:00:00Z"
    })
}

fn course_ref(id: &str) -> Value {
    json!({ "_id": id, "courseName": format!("Course {id}"), "courseCode": id.to_uppercase() })
}

async fn login(Json(body): Json<Value>) -> Reply {
    if body["password"] != "secret" {
        return fail(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    ok(json!({ "token": TOKEN, "user": { "email": body["email"] } }))
}

async fn list_courses() -> Reply {
    ok(json!({
        "courses": [
            course("c1", "Database Systems", false),
            course("c2", "Legacy Networks", true)
        ],
        "stats": { "total": 2, "active": 1, "archived": 1 }
    }))
}

async fn list_lecturers() -> Reply {
    ok(json!({ "lecturers": [lecturer("l1", "Dr. Smith"), lecturer("l2", "Dr. Jones")] }))
}

async fn create_course(State(mock): State<Mock>, Json(body): Json<Value>) -> Reply {
    mock.record("create_course", body.clone());
    let mut created = course("c3", body["courseName"].as_str().unwrap_or_default(), false);
    created["credits"] = body["credits"].clone();
    ok(json!({ "course": created }))
}

async fn archive(State(mock): State<Mock>, Json(body): Json<Value>) -> Reply {
    mock.record("archive", body.clone());
    if body["courseId"] == "missing" {
        return fail(StatusCode::NOT_FOUND, "Course not found");
    }
    ok(json!({}))
}

async fn delete_course(State(mock): State<Mock>, Path(id): Path<String>) -> StatusCode {
    mock.record("delete_course", json!(id));
    StatusCode::NO_CONTENT
}

async fn projects() -> Reply {
    ok(json!({
        "projects": [
            {
                "_id": "p1", "projectName": "Library Database", "course": course_ref("c1"),
                "deadlineDate": "2030-05-01", "deadlineTime": "17:00",
                "mainTasks": [
                    { "id": "m1", "title": "ER diagram", "completed": false, "subtasks": [] }
                ]
            },
            { "_id": "p2", "projectName": "Router Lab", "course": course_ref("c2") },
            { "_id": "p3", "projectName": "Query Tuning", "course": course_ref("c1") }
        ],
        "student": { "_id": "u1", "name": "Ava Patel" }
    }))
}

async fn tasks() -> Reply {
    ok(json!({
        "tasks": [
            {
                "_id": "t1", "taskName": "Normalise schema", "course": course_ref("c1"),
                "subtasks": [ { "id": "s1", "title": "1NF", "completed": false } ]
            }
        ]
    }))
}

async fn project_progress(Query(q): Query<HashMap<String, String>>) -> Reply {
    match q.get("projectId").map(String::as_str) {
        Some("p1") => ok(json!({
            "progress": {
                "status": "inprogress",
                "mainTasks": [
                    { "id": "m1", "title": "ER diagram", "completed": false, "subtasks": [] }
                ]
            }
        })),
        _ => fail(StatusCode::NOT_FOUND, "Progress not found"),
    }
}

async fn task_progress() -> Reply {
    fail(StatusCode::NOT_FOUND, "Progress not found")
}

async fn save_project_progress(State(mock): State<Mock>, Json(body): Json<Value>) -> Reply {
    mock.record("project_progress", body);
    ok(json!({}))
}

async fn save_task_progress(State(mock): State<Mock>, Json(body): Json<Value>) -> Reply {
    mock.record("task_progress", body);
    ok(json!({}))
}

async fn schedule_reminders(State(mock): State<Mock>, Json(body): Json<Value>) -> Reply {
    mock.record("reminders", body);
    ok(json!({ "scheduled": 4 }))
}

async fn analyze(State(mock): State<Mock>, Json(body): Json<Value>) -> Reply {
    mock.record("analyze", body);
    ok(json!({
        "plagiarismScore": 12.0,
        "aiScore": 30.0,
        "aiFeedback": "Clear structure; cite your sources.",
        "analyzedAt": "2025-01-10T10:00:00Z"
    }))
}

async fn flagged() -> Reply {
    ok(json!([
        {
            "id": "f1",
            "student": { "id": "u1", "name": "Ava Patel", "studentId": "STU001" },
            "assignment": { "id": "a1", "title": "Normalization", "module": "CS3001" },
            "submittedAt": "2025-01-08 19:20",
            "plagiarismScore": 45,
            "status": "pending-review",
            "matchesFound": 9
        },
        {
            "id": "f2",
            "student": { "id": "u2", "name": "Liam Chen", "studentId": "STU002" },
            "assignment": { "id": "a1", "title": "Normalization", "module": "CS3001" },
            "submittedAt": "2025-01-09 08:00",
            "plagiarismScore": 22,
            "status": "confirmed"
        }
    ]))
}

async fn save_version(
    State(mock): State<Mock>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    mock.record(format!("version:{id}"), body);
    ok(json!({}))
}

async fn submit_version(
    State(mock): State<Mock>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    mock.record(format!("submit:{id}"), body);
    ok(json!({}))
}

async fn save_grade(
    State(mock): State<Mock>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    mock.record(format!("grade:{id}"), body);
    ok(json!({}))
}

async fn generate_feedback(State(mock): State<Mock>, Json(body): Json<Value>) -> Reply {
    mock.record("feedback", body);
    ok(json!({ "score": 60.0, "feedback": "Regenerated with more detail." }))
}

async fn notify(State(mock): State<Mock>, Json(body): Json<Value>) -> Reply {
    mock.record("notify", body);
    ok(json!({}))
}

async fn flaky(State(mock): State<Mock>) -> Reply {
    let failing = {
        let mut inner = mock.inner.lock().unwrap();
        inner.flaky_hits += 1;
        if inner.flaky_failures > 0 {
            inner.flaky_failures -= 1;
            true
        } else {
            false
        }
    };
    if failing {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Temporary failure");
    }
    ok(json!({ "value": 1 }))
}

async fn rejected() -> Reply {
    (
        StatusCode::OK,
        Json(json!({ "success": false, "message": "Deadline has passed", "data": null })),
    )
}

async fn acknowledged() -> Reply {
    (StatusCode::OK, Json(json!({ "success": true, "message": "Saved" })))
}

pub fn router(mock: Mock) -> Router {
    Router::new()
        .route("/api/admin/courses", get(list_courses).post(create_course))
        .route("/api/admin/courses/archive", post(archive))
        .route("/api/admin/courses/{id}", delete(delete_course))
        .route("/api/admin/lecturers/list", get(list_lecturers))
        .route("/api/projects-and-tasks/student/projects", get(projects))
        .route("/api/projects-and-tasks/student/tasks", get(tasks))
        .route(
            "/api/projects-and-tasks/student/project-progress",
            get(project_progress).post(save_project_progress),
        )
        .route(
            "/api/projects-and-tasks/student/task-progress",
            get(task_progress).post(save_task_progress),
        )
        .route(
            "/api/projects-and-tasks/notifications/scheduled-reminders",
            post(schedule_reminders),
        )
        .route("/api/integrity/checks", post(analyze))
        .route("/api/integrity/checks/flagged", get(flagged))
        .route("/api/versions/submission/{id}", post(save_version))
        .route("/api/submissions/{id}/submit", post(submit_version))
        .route("/api/submissions/{id}/grade", post(save_grade))
        .route("/api/feedback/generate", post(generate_feedback))
        .route("/api/notifications/grade-released", post(notify))
        .route("/api/flaky", get(flaky))
        .route("/api/rejected", post(rejected))
        .route("/api/acknowledged", get(acknowledged).post(acknowledged))
        .route_layer(from_fn(require_token))
        .route("/api/auth/login", post(login))
        .with_state(mock)
}

/// Serves the mock backend on an ephemeral local port and returns its base URL.
pub async fn spawn_server(mock: Mock) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(mock)).await.unwrap();
    });
    format!("http://{addr}")
}
