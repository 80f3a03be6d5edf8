use chrono::Weekday;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role attached to every user account and request principal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Parent,
}

/// User account (the password hash never leaves the backend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

/// A student taught by the teacher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// User id of the linked parent account, if any
    pub parent_id: Option<String>,
    /// Rate charged per hour of individual tutoring
    pub hourly_rate: Decimal,
    pub level: Option<String>,
    pub active: bool,
    pub notes: Option<String>,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

impl Student {
    /// Display name used in rosters and summaries
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A group (class) of students taught together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Member student ids, in enrollment order (at least 2)
    pub student_ids: Vec<String>,
    pub hourly_rate: Decimal,
    pub active: bool,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

/// Discriminates who a one-off session was held for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Individual,
    Class,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Completed,
    Planned,
    Cancelled,
}

/// A one-off tutoring session, held for exactly one student or one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    /// Set when type is individual, absent otherwise
    pub student_id: Option<String>,
    /// Set when type is class, absent otherwise
    pub class_id: Option<String>,
    pub date: String, // ISO 8601 date (YYYY-MM-DD)
    pub duration_minutes: u32,
    pub price: Decimal,
    pub status: SessionStatus,
    pub notes: Option<String>,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

/// Discriminates who a recurring template is for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixedSessionType {
    Individual,
    Group,
}

/// Day of the week a recurring template falls on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// Human-readable day name
    pub fn day_name(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    pub fn to_weekday(&self) -> Weekday {
        match self {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
            DayOfWeek::Sunday => Weekday::Sun,
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// Weekly recurring session template (a slot, not a calendar event)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedSession {
    pub id: String,
    #[serde(rename = "type")]
    pub session_type: FixedSessionType,
    /// Set when type is individual, absent otherwise
    pub student_id: Option<String>,
    /// Set when type is group, absent otherwise
    pub class_id: Option<String>,
    pub day_of_week: DayOfWeek,
    pub start_time: String, // 24h clock (HH:MM)
    pub duration_minutes: u32,
    pub price: Decimal,
    pub notes: Option<String>,
    /// Inactive templates no longer accept new occurrences
    pub active: bool,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

/// Per-participant attendance record on a realized session.
/// The name fields are a snapshot taken when the occurrence was logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub present: bool,
    pub notes: Option<String>,
}

/// One dated occurrence of a recurring template, with its roster snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealizedSession {
    pub id: String,
    pub fixed_session_id: String,
    pub date: String, // ISO 8601 date (YYYY-MM-DD)
    pub duration_minutes: u32,
    pub price: Decimal,
    pub notes: Option<String>,
    pub attendance: Vec<AttendanceEntry>,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

impl RealizedSession {
    /// Look up a roster entry by student id
    pub fn attendance_for(&self, student_id: &str) -> Option<&AttendanceEntry> {
        self.attendance.iter().find(|a| a.student_id == student_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Bank,
    Check,
    Mobile,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Cancelled,
}

impl PaymentStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, PaymentStatus::Completed)
    }
}

/// A payment received from a student's family.
/// Invariant: `paid_date` is set if and only if `status` is completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub student_id: String,
    pub amount: Decimal,
    pub date: String, // ISO 8601 date (YYYY-MM-DD)
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Session ids this payment settles, if itemized
    pub session_ids: Vec<String>,
    /// RFC 3339 timestamp, present exactly when status is completed
    pub paid_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

/// Balance state derived for a student
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus {
    Pending,
    UpToDate,
}

/// Derived per-student payment view. Never persisted; recomputed on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub student_id: String,
    pub student_name: String,
    pub total_owed: Decimal,
    pub total_paid: Decimal,
    /// May be negative when the student is in credit
    pub remaining: Decimal,
    /// Session ids not referenced by any completed payment
    pub unpaid_session_ids: Vec<String>,
    pub last_payment_date: Option<String>,
    pub status: BalanceStatus,
}

/// Attendance counters derived over a student's realized sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceStats {
    pub total_sessions: u32,
    pub present_sessions: u32,
    pub absent_sessions: u32,
    /// Percentage of sessions attended, rounded to 2 decimals
    pub attendance_rate: f64,
}

/// One row of a student's attendance history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentAttendanceEntry {
    pub realized_session_id: String,
    pub fixed_session_id: String,
    pub date: String, // ISO 8601 date (YYYY-MM-DD)
    pub present: bool,
    pub notes: Option<String>,
}

/// Attendance history (date descending) plus the derived counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentAttendanceResponse {
    pub entries: Vec<StudentAttendanceEntry>,
    pub stats: AttendanceStats,
}

// ---------------------------------------------------------------------------
// Auth request/response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    /// Defaults to parent when omitted
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

// ---------------------------------------------------------------------------
// Student request types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateStudentRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub parent_id: Option<String>,
    pub hourly_rate: Decimal,
    pub level: Option<String>,
    pub notes: Option<String>,
}

/// Fields left as None are not touched by the update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateStudentRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub parent_id: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub level: Option<String>,
    pub active: Option<bool>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Group request/response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    pub student_ids: Vec<String>,
    /// Defaults to 20 when omitted
    pub hourly_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub student_ids: Option<Vec<String>>,
    pub hourly_rate: Option<Decimal>,
    pub active: Option<bool>,
}

/// Group write result: the stored group plus any requested member ids
/// that did not resolve to an existing student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupResponse {
    pub group: Group,
    pub rejected_student_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Session request types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub student_id: Option<String>,
    pub class_id: Option<String>,
    pub date: String, // ISO 8601 date (YYYY-MM-DD)
    pub duration_minutes: u32,
    pub price: Decimal,
    /// Defaults to completed when omitted (sessions are logged after the fact)
    pub status: Option<SessionStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateSessionRequest {
    pub date: Option<String>,
    pub duration_minutes: Option<u32>,
    pub price: Option<Decimal>,
    pub status: Option<SessionStatus>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Recurring template / occurrence request types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateFixedSessionRequest {
    #[serde(rename = "type")]
    pub session_type: FixedSessionType,
    pub student_id: Option<String>,
    pub class_id: Option<String>,
    pub day_of_week: DayOfWeek,
    pub start_time: String, // 24h clock (HH:MM)
    pub duration_minutes: u32,
    pub price: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateFixedSessionRequest {
    pub day_of_week: Option<DayOfWeek>,
    pub start_time: Option<String>,
    pub duration_minutes: Option<u32>,
    pub price: Option<Decimal>,
    pub notes: Option<String>,
    pub active: Option<bool>,
}

/// Overrides the defaulted present=true for one roster member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceOverride {
    pub student_id: String,
    pub present: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogOccurrenceRequest {
    pub date: String, // ISO 8601 date (YYYY-MM-DD)
    pub notes: Option<String>,
    #[serde(default)]
    pub attendance_overrides: Vec<AttendanceOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetAttendanceRequest {
    pub present: bool,
}

// ---------------------------------------------------------------------------
// Payment request types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub student_id: String,
    pub amount: Decimal,
    /// Defaults to today when omitted
    pub date: Option<String>,
    /// Defaults to cash when omitted
    pub method: Option<PaymentMethod>,
    /// Defaults to pending when omitted
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub session_ids: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePaymentRequest {
    pub amount: Option<Decimal>,
    pub date: Option<String>,
    pub method: Option<PaymentMethod>,
    pub status: Option<PaymentStatus>,
    pub session_ids: Option<Vec<String>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkPaidRequest {
    /// Overrides the stored method when given
    pub method: Option<PaymentMethod>,
}

// ---------------------------------------------------------------------------
// Record ids
// ---------------------------------------------------------------------------

/// Record IDs follow "<prefix>::<epoch_millis>::<suffix>" where the suffix
/// is 8 hex characters of a v4 uuid. The timestamp makes ids roughly
/// monotonic; the suffix covers same-millisecond collisions.
pub fn new_record_id(prefix: &str) -> String {
    let epoch_millis = chrono::Utc::now().timestamp_millis() as u64;
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}::{}::{}", prefix, epoch_millis, &suffix[..8])
}

/// Parse a record ID into (prefix, epoch_millis, suffix)
pub fn parse_record_id(id: &str) -> Result<(String, u64, String), RecordIdError> {
    let parts: Vec<&str> = id.split("::").collect();
    if parts.len() != 3 || parts[0].is_empty() || parts[2].is_empty() {
        return Err(RecordIdError::InvalidFormat);
    }

    let epoch_millis = parts[1]
        .parse::<u64>()
        .map_err(|_| RecordIdError::InvalidTimestamp)?;

    Ok((parts[0].to_string(), epoch_millis, parts[2].to_string()))
}

/// Extract the epoch timestamp from a record ID for sorting
pub fn record_id_timestamp(id: &str) -> Result<u64, RecordIdError> {
    parse_record_id(id).map(|(_, timestamp, _)| timestamp)
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordIdError {
    InvalidFormat,
    InvalidTimestamp,
}

impl fmt::Display for RecordIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordIdError::InvalidFormat => write!(f, "Invalid record ID format"),
            RecordIdError::InvalidTimestamp => write!(f, "Invalid timestamp in record ID"),
        }
    }
}

impl std::error::Error for RecordIdError {}
