//! crates/attendance_core/src/domain.rs
//!
//! Defines the pure, core data structures for the attendance application.
//! These structs are independent of any storage or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// The role a user holds, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Instructor,
}

/// An identity record. The email is unique across all users; the password
/// is kept as entered (hashing is out of scope for this service).
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// A course created by an instructor. Enrollment membership is static in
/// this version; there is no enroll/unenroll operation.
#[derive(Debug, Clone)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub description: String,
    pub schedule: String,
    pub instructor_id: Uuid,
    pub student_ids: Vec<Uuid>,
}

impl Course {
    pub fn has_student(&self, student_id: Uuid) -> bool {
        self.student_ids.contains(&student_id)
    }
}

/// A single presence/absence mark. At most one record exists per
/// (course_id, student_id, date) triple; re-marking replaces the prior
/// record. `created_at` exists for ordering only.
#[derive(Debug, Clone)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub course_id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub is_present: bool,
    pub created_at: DateTime<Utc>,
}

/// The profile document held by the remote identity backend in the
/// externally-backed auth variant.
#[derive(Debug, Clone)]
pub struct Profile {
    pub account_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Only meaningful for students.
    pub student_id: String,
    pub department: String,
}

/// The credential triple persisted by the remember-me collaborator.
#[derive(Debug, Clone, Default)]
pub struct SavedCredentials {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}
