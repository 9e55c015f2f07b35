//! crates/attendance_core/src/store.rs
//!
//! The in-memory domain store: owns the user, course, and attendance
//! collections plus the single session, exposes the mutation operations,
//! and publishes a role-filtered snapshot to subscribers after every
//! mutation.

use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use tokio::sync::watch;
use tracing::warn;
use uuid::Uuid;

use crate::domain::{AttendanceRecord, Course, Role, User};
use crate::ports::CredentialStore;

//=========================================================================================
// Messages
//=========================================================================================

/// Machine-readable category for a failed operation, surfaced alongside the
/// display string so callers can branch without parsing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required field was empty.
    Validation,
    /// The email is already registered.
    Conflict,
    /// No account matched the supplied credentials.
    Auth,
    /// The session's role is not allowed to perform the operation.
    Authorization,
    /// The remote identity backend failed.
    Remote,
}

/// An error message recorded on the store. It stays visible until
/// [`DomainStore::clear_messages`] is called.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{text}")]
pub struct StoreMessage {
    pub kind: ErrorKind,
    pub text: String,
}

impl StoreMessage {
    fn new(kind: ErrorKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

//=========================================================================================
// Snapshot
//=========================================================================================

/// The read-only state published to subscribers after every mutation.
///
/// `courses` is role-filtered for the current session; `students` is the
/// visible roster (all users with the Student role); `attendance_records`
/// is the full collection, consumers filter by course/student/date
/// themselves.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    pub current_user: Option<User>,
    pub courses: Vec<Course>,
    pub students: Vec<User>,
    pub attendance_records: Vec<AttendanceRecord>,
    pub error: Option<StoreMessage>,
    pub success: Option<String>,
}

//=========================================================================================
// Store Configuration
//=========================================================================================

/// Behavior toggles for the store.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// When false (the default), `login` only checks that the email exists,
    /// matching the reference behavior. When true, the stored password must
    /// also match.
    pub require_password_match: bool,
}

//=========================================================================================
// DomainStore
//=========================================================================================

/// The attendance domain service. Constructed once at process start and
/// exclusively owns all collections; every mutation flows through the
/// operations below.
pub struct DomainStore {
    users: Vec<User>,
    courses: Vec<Course>,
    attendance_records: Vec<AttendanceRecord>,
    session: Option<User>,
    error: Option<StoreMessage>,
    success: Option<String>,
    config: StoreConfig,
    credentials: Arc<dyn CredentialStore>,
    snapshot_tx: watch::Sender<StateSnapshot>,
}

impl DomainStore {
    pub fn new(config: StoreConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        let (snapshot_tx, _) = watch::channel(StateSnapshot::default());
        Self {
            users: Vec::new(),
            courses: Vec::new(),
            attendance_records: Vec::new(),
            session: None,
            error: None,
            success: None,
            config,
            credentials,
            snapshot_tx,
        }
    }

    /// Subscribes to state snapshots. The receiver always holds the latest
    /// published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// The currently authenticated user, if any.
    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref()
    }

    pub fn last_error(&self) -> Option<&StoreMessage> {
        self.error.as_ref()
    }

    pub fn last_success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    /// Builds the current snapshot without publishing it.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            current_user: self.session.clone(),
            courses: self.visible_courses(),
            students: self
                .users
                .iter()
                .filter(|u| u.role == Role::Student)
                .cloned()
                .collect(),
            attendance_records: self.attendance_records.clone(),
            error: self.error.clone(),
            success: self.success.clone(),
        }
    }

    //-------------------------------------------------------------------------------------
    // Authentication
    //-------------------------------------------------------------------------------------

    /// Registers a new user. By design policy registration does not start a
    /// session; the caller must log in explicitly afterward.
    pub fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Uuid, StoreMessage> {
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(self.fail(ErrorKind::Validation, "Please fill in all fields"));
        }
        if self.users.iter().any(|u| u.email == email) {
            return Err(self.fail(ErrorKind::Conflict, "Email already exists"));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
        };
        let id = user.id;
        self.users.push(user);
        self.error = None;
        self.success =
            Some("Registration successful! Please login with your credentials.".to_string());
        self.publish();
        Ok(id)
    }

    /// Authenticates by email. Whether the password is checked against the
    /// stored value is governed by [`StoreConfig::require_password_match`].
    ///
    /// On success the session is set and, if `remember_me` is true, the
    /// credential pair is persisted through the credential port; if false,
    /// any previously persisted pair is cleared.
    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<User, StoreMessage> {
        if email.is_empty() || password.is_empty() {
            return Err(self.fail(ErrorKind::Validation, "Please fill in all fields"));
        }

        let matched = self
            .users
            .iter()
            .find(|u| {
                u.email == email && (!self.config.require_password_match || u.password == password)
            })
            .cloned();

        let Some(user) = matched else {
            return Err(self.fail(ErrorKind::Auth, "Invalid credentials"));
        };

        if remember_me {
            if let Err(e) = self.credentials.save(email, password).await {
                warn!("failed to persist credentials: {e}");
            }
        } else if let Err(e) = self.credentials.clear().await {
            warn!("failed to clear persisted credentials: {e}");
        }

        self.session = Some(user.clone());
        self.error = None;
        self.success = Some("Login successful".to_string());
        self.publish();
        Ok(user)
    }

    /// Clears the session and unconditionally clears persisted credentials.
    pub async fn logout(&mut self) {
        if let Err(e) = self.credentials.clear().await {
            warn!("failed to clear persisted credentials: {e}");
        }
        self.session = None;
        self.publish();
    }

    //-------------------------------------------------------------------------------------
    // Courses
    //-------------------------------------------------------------------------------------

    /// Creates a course owned by the session's instructor. Requires an
    /// Instructor session; anyone else gets an Authorization error and no
    /// state change.
    pub fn add_course(
        &mut self,
        name: &str,
        code: &str,
        description: &str,
        schedule: &str,
    ) -> Result<Uuid, StoreMessage> {
        let instructor_id = match &self.session {
            Some(u) if u.role == Role::Instructor => u.id,
            _ => {
                return Err(self.fail(
                    ErrorKind::Authorization,
                    "Only instructors can add courses",
                ))
            }
        };

        let course = Course {
            id: Uuid::new_v4(),
            name: name.to_string(),
            code: code.to_string(),
            description: description.to_string(),
            schedule: schedule.to_string(),
            instructor_id,
            student_ids: Vec::new(),
        };
        let id = course.id;
        self.courses.push(course);
        self.success = Some("Course added successfully".to_string());
        self.publish();
        Ok(id)
    }

    //-------------------------------------------------------------------------------------
    // Attendance
    //-------------------------------------------------------------------------------------

    /// Marks the session's student present or absent for a course today.
    /// Replaces any existing record for the (course, student, today) triple,
    /// so at most one record per day survives and the latest call wins.
    pub fn mark_attendance(
        &mut self,
        course_id: Uuid,
        is_present: bool,
    ) -> Result<AttendanceRecord, StoreMessage> {
        let student_id = match &self.session {
            Some(u) if u.role == Role::Student => u.id,
            _ => {
                return Err(self.fail(
                    ErrorKind::Authorization,
                    "Only students can mark attendance",
                ))
            }
        };

        let today = Self::today();
        self.attendance_records
            .retain(|r| !(r.course_id == course_id && r.student_id == student_id && r.date == today));

        let record = AttendanceRecord {
            id: Uuid::new_v4(),
            course_id,
            student_id,
            date: today,
            is_present,
            created_at: Utc::now(),
        };
        self.attendance_records.push(record.clone());
        self.success = Some(
            if is_present {
                "Marked as Present"
            } else {
                "Marked as Absent"
            }
            .to_string(),
        );
        self.publish();
        Ok(record)
    }

    /// Pure lookup of today's record for a (course, student) pair.
    pub fn get_today_attendance(
        &self,
        course_id: Uuid,
        student_id: Uuid,
    ) -> Option<&AttendanceRecord> {
        let today = Self::today();
        self.attendance_records
            .iter()
            .find(|r| r.course_id == course_id && r.student_id == student_id && r.date == today)
    }

    //-------------------------------------------------------------------------------------
    // Messages
    //-------------------------------------------------------------------------------------

    /// Clears both the error and success messages. Callers decide when;
    /// the reference UI does this on a fixed delay after display.
    pub fn clear_messages(&mut self) {
        self.error = None;
        self.success = None;
        self.publish();
    }

    //-------------------------------------------------------------------------------------
    // Internals
    //-------------------------------------------------------------------------------------

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    fn fail(&mut self, kind: ErrorKind, text: &str) -> StoreMessage {
        let msg = StoreMessage::new(kind, text);
        self.error = Some(msg.clone());
        self.publish();
        msg
    }

    /// The role-filtered course view: an instructor sees the courses they
    /// teach, a student the courses they are enrolled in, anonymous sees
    /// nothing.
    fn visible_courses(&self) -> Vec<Course> {
        match &self.session {
            Some(u) if u.role == Role::Instructor => self
                .courses
                .iter()
                .filter(|c| c.instructor_id == u.id)
                .cloned()
                .collect(),
            Some(u) => self
                .courses
                .iter()
                .filter(|c| c.has_student(u.id))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    fn publish(&self) {
        // Receivers may all be gone; publishing is still fine.
        let _ = self.snapshot_tx.send(self.snapshot());
    }
}

//=========================================================================================
// Sample Data
//=========================================================================================

/// Seeds the store with the reference data set: one instructor, two
/// students, and two courses with static enrollments.
pub fn seed_sample_data(store: &mut DomainStore) {
    store.users.extend([
        User {
            id: Uuid::new_v4(),
            name: "Dr. Smith".to_string(),
            email: "smith@university.edu".to_string(),
            password: "somePassword".to_string(),
            role: Role::Instructor,
        },
        User {
            id: Uuid::new_v4(),
            name: "John Doe".to_string(),
            email: "john@student.edu".to_string(),
            password: "somePassword".to_string(),
            role: Role::Student,
        },
        User {
            id: Uuid::new_v4(),
            name: "Jane Wilson".to_string(),
            email: "jane@student.edu".to_string(),
            password: "somePassword".to_string(),
            role: Role::Student,
        },
    ]);

    let instructor = store.users[0].id;
    let john = store.users[1].id;
    let jane = store.users[2].id;

    store.courses.extend([
        Course {
            id: Uuid::new_v4(),
            name: "Computer Science 101".to_string(),
            code: "CS101".to_string(),
            description: "Introduction to Programming".to_string(),
            schedule: "MWF 10:00-11:00".to_string(),
            instructor_id: instructor,
            student_ids: vec![john, jane],
        },
        Course {
            id: Uuid::new_v4(),
            name: "Data Structures".to_string(),
            code: "CS201".to_string(),
            description: "Advanced Data Structures".to_string(),
            schedule: "TTh 2:00-3:30".to_string(),
            instructor_id: instructor,
            student_ids: vec![john],
        },
    ]);

    store.publish();
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SavedCredentials;
    use crate::ports::{CredentialStore, PortResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// An in-memory credential store that records what was persisted.
    #[derive(Default)]
    struct MemoryCredentials {
        saved: Mutex<SavedCredentials>,
    }

    #[async_trait]
    impl CredentialStore for MemoryCredentials {
        async fn save(&self, email: &str, password: &str) -> PortResult<()> {
            *self.saved.lock().unwrap() = SavedCredentials {
                email: email.to_string(),
                password: password.to_string(),
                remember_me: true,
            };
            Ok(())
        }

        async fn clear(&self) -> PortResult<()> {
            *self.saved.lock().unwrap() = SavedCredentials::default();
            Ok(())
        }

        async fn load(&self) -> PortResult<SavedCredentials> {
            Ok(self.saved.lock().unwrap().clone())
        }
    }

    fn new_store() -> (DomainStore, Arc<MemoryCredentials>) {
        let creds = Arc::new(MemoryCredentials::default());
        let store = DomainStore::new(StoreConfig::default(), creds.clone());
        (store, creds)
    }

    #[tokio::test]
    async fn register_rejects_empty_fields() {
        let (mut store, _) = new_store();
        let err = store
            .register("", "a@u.edu", "pw", Role::Student)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.text, "Please fill in all fields");
        assert!(store.snapshot().students.is_empty());
    }

    #[tokio::test]
    async fn register_enforces_email_uniqueness() {
        let (mut store, _) = new_store();
        store
            .register("A", "dup@u.edu", "pw1", Role::Student)
            .unwrap();
        let err = store
            .register("B", "dup@u.edu", "pw2", Role::Student)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.text, "Email already exists");
        assert_eq!(store.snapshot().students.len(), 1);
    }

    #[tokio::test]
    async fn register_does_not_authenticate() {
        let (mut store, _) = new_store();
        store
            .register("A", "a@u.edu", "pw", Role::Instructor)
            .unwrap();
        assert!(store.current_user().is_none());
        assert!(store.last_success().is_some());
    }

    #[tokio::test]
    async fn login_matches_email_only_by_default() {
        let (mut store, _) = new_store();
        store.register("A", "a@u.edu", "pw", Role::Student).unwrap();

        // The reference behavior accepts any non-empty password.
        let user = store.login("a@u.edu", "wrong", false).await.unwrap();
        assert_eq!(user.email, "a@u.edu");
        assert!(store.current_user().is_some());
    }

    #[tokio::test]
    async fn login_verifies_password_when_configured() {
        let creds = Arc::new(MemoryCredentials::default());
        let mut store = DomainStore::new(
            StoreConfig {
                require_password_match: true,
            },
            creds,
        );
        store.register("A", "a@u.edu", "pw", Role::Student).unwrap();

        let err = store.login("a@u.edu", "wrong", false).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Auth);
        assert!(store.current_user().is_none());

        store.login("a@u.edu", "pw", false).await.unwrap();
        assert!(store.current_user().is_some());
    }

    #[tokio::test]
    async fn login_unknown_email_sets_auth_error() {
        let (mut store, _) = new_store();
        let err = store.login("ghost@u.edu", "pw", false).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Auth);
        assert_eq!(err.text, "Invalid credentials");
        assert!(store.current_user().is_none());
    }

    #[tokio::test]
    async fn remember_me_persists_and_logout_clears() {
        let (mut store, creds) = new_store();
        store.register("A", "a@u.edu", "pw", Role::Student).unwrap();

        store.login("a@u.edu", "pw", true).await.unwrap();
        let saved = creds.load().await.unwrap();
        assert!(saved.remember_me);
        assert_eq!(saved.email, "a@u.edu");
        assert_eq!(saved.password, "pw");

        store.logout().await;
        assert!(store.current_user().is_none());
        let saved = creds.load().await.unwrap();
        assert!(!saved.remember_me);
        assert!(saved.email.is_empty());
    }

    #[tokio::test]
    async fn login_without_remember_me_clears_saved_pair() {
        let (mut store, creds) = new_store();
        store.register("A", "a@u.edu", "pw", Role::Student).unwrap();
        creds.save("a@u.edu", "pw").await.unwrap();

        store.login("a@u.edu", "pw", false).await.unwrap();
        assert!(!creds.load().await.unwrap().remember_me);
    }

    #[tokio::test]
    async fn add_course_requires_instructor() {
        let (mut store, _) = new_store();
        store.register("S", "s@u.edu", "pw", Role::Student).unwrap();
        store.login("s@u.edu", "pw", false).await.unwrap();
        store.clear_messages();

        let err = store.add_course("Algo", "CS301", "", "MWF 9-10").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
        assert!(store.snapshot().courses.is_empty());
        assert!(store.last_success().is_none());
    }

    #[tokio::test]
    async fn mark_attendance_requires_student() {
        let (mut store, _) = new_store();
        store
            .register("I", "i@u.edu", "pw", Role::Instructor)
            .unwrap();
        store.login("i@u.edu", "pw", false).await.unwrap();
        store.clear_messages();

        let err = store.mark_attendance(Uuid::new_v4(), true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
        assert!(store.snapshot().attendance_records.is_empty());
        assert!(store.last_success().is_none());
    }

    #[tokio::test]
    async fn mark_attendance_replaces_same_day_record() {
        let (mut store, _) = new_store();
        store.register("S", "s@u.edu", "pw", Role::Student).unwrap();
        let student_id = store.login("s@u.edu", "pw", false).await.unwrap().id;
        let course_id = Uuid::new_v4();

        store.mark_attendance(course_id, true).unwrap();
        assert_eq!(store.last_success(), Some("Marked as Present"));
        store.mark_attendance(course_id, false).unwrap();
        assert_eq!(store.last_success(), Some("Marked as Absent"));

        let records = store.snapshot().attendance_records;
        assert_eq!(records.len(), 1);
        assert!(!records[0].is_present);

        let today = store.get_today_attendance(course_id, student_id).unwrap();
        assert!(!today.is_present);
    }

    #[tokio::test]
    async fn derived_view_is_role_scoped() {
        let (mut store, _) = new_store();
        seed_sample_data(&mut store);

        // Instructor sees only the courses they teach.
        store
            .login("smith@university.edu", "pw", false)
            .await
            .unwrap();
        let snap = store.snapshot();
        assert_eq!(snap.courses.len(), 2);
        let instructor_id = snap.current_user.as_ref().unwrap().id;
        assert!(snap.courses.iter().all(|c| c.instructor_id == instructor_id));
        // The roster exposes only students.
        assert_eq!(snap.students.len(), 2);

        // Jane is only enrolled in CS101.
        store.login("jane@student.edu", "pw", false).await.unwrap();
        let snap = store.snapshot();
        assert_eq!(snap.courses.len(), 1);
        assert_eq!(snap.courses[0].code, "CS101");

        // Anonymous sees nothing.
        store.logout().await;
        assert!(store.snapshot().courses.is_empty());
    }

    #[tokio::test]
    async fn messages_persist_until_cleared() {
        let (mut store, _) = new_store();
        let _ = store.login("", "", false).await;
        assert!(store.last_error().is_some());

        store.register("A", "a@u.edu", "pw", Role::Student).unwrap();
        assert!(store.last_success().is_some());

        store.clear_messages();
        assert!(store.last_error().is_none());
        assert!(store.last_success().is_none());
    }

    #[tokio::test]
    async fn subscribers_see_latest_snapshot() {
        let (mut store, _) = new_store();
        let mut rx = store.subscribe();

        store.register("A", "a@u.edu", "pw", Role::Student).unwrap();
        store.login("a@u.edu", "pw", false).await.unwrap();

        let snap = rx.borrow_and_update();
        assert_eq!(
            snap.current_user.as_ref().map(|u| u.email.as_str()),
            Some("a@u.edu")
        );
    }

    #[tokio::test]
    async fn end_to_end_instructor_and_student_flow() {
        let (mut store, _) = new_store();

        store
            .register("Dr. A", "a@u.edu", "pw1", Role::Instructor)
            .unwrap();
        let instructor = store.login("a@u.edu", "pw1", false).await.unwrap();
        let course_id = store
            .add_course("Algorithms", "CS301", "", "MWF 9-10")
            .unwrap();

        let snap = store.snapshot();
        assert_eq!(snap.courses.len(), 1);
        assert_eq!(snap.courses[0].instructor_id, instructor.id);

        store.register("B", "b@u.edu", "pw2", Role::Student).unwrap();
        let student = store.login("b@u.edu", "pw2", false).await.unwrap();
        store.mark_attendance(course_id, true).unwrap();
        store.mark_attendance(course_id, false).unwrap();

        let records: Vec<_> = store
            .snapshot()
            .attendance_records
            .into_iter()
            .filter(|r| r.course_id == course_id && r.student_id == student.id)
            .collect();
        assert_eq!(records.len(), 1);
        assert!(!records[0].is_present);
    }
}
