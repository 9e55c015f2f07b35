//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use attendance_core::domain::{AttendanceRecord, Course, Role, User};
use attendance_core::store::{ErrorKind, StateSnapshot, StoreMessage};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::auth::{LoginRequest, RegisterRequest, RegisterResponse};
use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::register_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        get_state_handler,
        add_course_handler,
        mark_attendance_handler,
        today_attendance_handler,
        clear_messages_handler,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            RegisterResponse,
            AddCourseRequest,
            AddCourseResponse,
            MarkAttendanceRequest,
            RoleDto,
            UserDto,
            CourseDto,
            AttendanceRecordDto,
            SnapshotResponse,
            ErrorReply,
        )
    ),
    tags(
        (name = "Attendance API", description = "API endpoints for the university attendance tracker.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoleDto {
    Student,
    Instructor,
}

impl From<RoleDto> for Role {
    fn from(dto: RoleDto) -> Self {
        match dto {
            RoleDto::Student => Role::Student,
            RoleDto::Instructor => Role::Instructor,
        }
    }
}

impl From<Role> for RoleDto {
    fn from(role: Role) -> Self {
        match role {
            Role::Student => RoleDto::Student,
            Role::Instructor => RoleDto::Instructor,
        }
    }
}

/// A user as exposed to API consumers. The stored password never leaves
/// the store boundary.
#[derive(Serialize, ToSchema)]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: RoleDto,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role.into(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CourseDto {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub description: String,
    pub schedule: String,
    pub instructor_id: Uuid,
    pub student_ids: Vec<Uuid>,
}

impl From<Course> for CourseDto {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            name: course.name,
            code: course.code,
            description: course.description,
            schedule: course.schedule,
            instructor_id: course.instructor_id,
            student_ids: course.student_ids,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceRecordDto {
    pub id: Uuid,
    pub course_id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub is_present: bool,
    pub created_at: DateTime<Utc>,
}

impl From<AttendanceRecord> for AttendanceRecordDto {
    fn from(record: AttendanceRecord) -> Self {
        Self {
            id: record.id,
            course_id: record.course_id,
            student_id: record.student_id,
            date: record.date,
            is_present: record.is_present,
            created_at: record.created_at,
        }
    }
}

/// The role-filtered state snapshot returned by `GET /state`.
#[derive(Serialize, ToSchema)]
pub struct SnapshotResponse {
    pub current_user: Option<UserDto>,
    pub courses: Vec<CourseDto>,
    pub students: Vec<UserDto>,
    pub attendance_records: Vec<AttendanceRecordDto>,
    pub error: Option<String>,
    pub error_kind: Option<String>,
    pub success: Option<String>,
}

impl From<StateSnapshot> for SnapshotResponse {
    fn from(snap: StateSnapshot) -> Self {
        Self {
            current_user: snap.current_user.map(UserDto::from),
            courses: snap.courses.into_iter().map(CourseDto::from).collect(),
            students: snap.students.into_iter().map(UserDto::from).collect(),
            attendance_records: snap
                .attendance_records
                .into_iter()
                .map(AttendanceRecordDto::from)
                .collect(),
            error: snap.error.as_ref().map(|m| m.text.clone()),
            error_kind: snap.error.as_ref().map(|m| kind_name(m.kind).to_string()),
            success: snap.success,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AddCourseRequest {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub schedule: String,
}

#[derive(Serialize, ToSchema)]
pub struct AddCourseResponse {
    pub course_id: Uuid,
}

#[derive(Deserialize, ToSchema)]
pub struct MarkAttendanceRequest {
    pub course_id: Uuid,
    pub is_present: bool,
}

#[derive(Deserialize)]
pub struct TodayAttendanceQuery {
    pub course_id: Uuid,
    pub student_id: Uuid,
}

//=========================================================================================
// Error Reply
//=========================================================================================

/// The body returned for any failed store operation: the display string
/// plus its machine-readable kind.
#[derive(Serialize, ToSchema)]
pub struct ErrorReply {
    pub error: String,
    pub kind: String,
}

fn kind_name(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "validation",
        ErrorKind::Conflict => "conflict",
        ErrorKind::Auth => "auth",
        ErrorKind::Authorization => "authorization",
        ErrorKind::Remote => "remote",
    }
}

/// Maps a store error onto an HTTP status and JSON body.
pub fn store_error_reply(msg: StoreMessage) -> (StatusCode, Json<ErrorReply>) {
    let status = match msg.kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Auth => StatusCode::UNAUTHORIZED,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::Remote => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(ErrorReply {
            error: msg.text,
            kind: kind_name(msg.kind).to_string(),
        }),
    )
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Returns the latest role-filtered state snapshot.
#[utoipa::path(
    get,
    path = "/state",
    responses(
        (status = 200, description = "Current state snapshot", body = SnapshotResponse)
    )
)]
pub async fn get_state_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.store.lock().await;
    Json(SnapshotResponse::from(store.snapshot()))
}

/// Creates a course owned by the logged-in instructor.
#[utoipa::path(
    post,
    path = "/courses",
    request_body = AddCourseRequest,
    responses(
        (status = 201, description = "Course created", body = AddCourseResponse),
        (status = 403, description = "Session is not an instructor", body = ErrorReply)
    )
)]
pub async fn add_course_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddCourseRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorReply>)> {
    let mut store = state.store.lock().await;
    let course_id = store
        .add_course(&req.name, &req.code, &req.description, &req.schedule)
        .map_err(store_error_reply)?;

    Ok((StatusCode::CREATED, Json(AddCourseResponse { course_id })))
}

/// Marks the logged-in student present or absent for a course today.
/// Re-marking the same day replaces the earlier record.
#[utoipa::path(
    post,
    path = "/attendance",
    request_body = MarkAttendanceRequest,
    responses(
        (status = 200, description = "Attendance recorded", body = AttendanceRecordDto),
        (status = 403, description = "Session is not a student", body = ErrorReply)
    )
)]
pub async fn mark_attendance_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MarkAttendanceRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorReply>)> {
    let mut store = state.store.lock().await;
    let record = store
        .mark_attendance(req.course_id, req.is_present)
        .map_err(store_error_reply)?;

    Ok((StatusCode::OK, Json(AttendanceRecordDto::from(record))))
}

/// Looks up today's attendance record for a (course, student) pair.
/// Returns `null` when the student has not marked attendance today.
#[utoipa::path(
    get,
    path = "/attendance/today",
    params(
        ("course_id" = Uuid, Query, description = "The course to look up."),
        ("student_id" = Uuid, Query, description = "The student to look up.")
    ),
    responses(
        (status = 200, description = "Today's record, if any", body = Option<AttendanceRecordDto>)
    )
)]
pub async fn today_attendance_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TodayAttendanceQuery>,
) -> impl IntoResponse {
    let store = state.store.lock().await;
    let record = store
        .get_today_attendance(query.course_id, query.student_id)
        .cloned()
        .map(AttendanceRecordDto::from);
    Json(record)
}

/// Clears the store's error and success messages. The reference UI calls
/// this on a fixed delay after a message appears.
#[utoipa::path(
    post,
    path = "/messages/clear",
    responses(
        (status = 200, description = "Messages cleared")
    )
)]
pub async fn clear_messages_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut store = state.store.lock().await;
    store.clear_messages();
    StatusCode::OK
}
