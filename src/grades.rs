//! Student grade snapshots and new-grade detection

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use tracing::info;

use crate::kv::{self, KvStore, StoreError};
use crate::notifications::{Notification, NotificationStore, NotificationType};

const KEY_GRADES: &str = "grades";

/// One row of the backend's student-grades listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub section_letter: String,
    #[serde(default)]
    pub grade_number: i64,
    #[serde(default)]
    pub bimester_name: String,
    pub session_title: Option<String>,
    pub competency_name: Option<String>,
    pub value: String,
    pub observation: Option<String>,
    #[serde(default)]
    pub updated_at: String,
}

impl GradeRecord {
    /// (competency, session) pair; a grade is new when its key was not seen before.
    pub fn composite_key(&self) -> (Option<&str>, Option<&str>) {
        (
            self.competency_name.as_deref(),
            self.session_title.as_deref(),
        )
    }
}

pub fn new_grades<'a>(previous: &[GradeRecord], current: &'a [GradeRecord]) -> Vec<&'a GradeRecord> {
    let seen: HashSet<(Option<&str>, Option<&str>)> =
        previous.iter().map(GradeRecord::composite_key).collect();
    current
        .iter()
        .filter(|g| !seen.contains(&g.composite_key()))
        .collect()
}

pub fn snapshot_namespace(student_user_id: i64) -> String {
    format!("student_grades_{}", student_user_id)
}

pub fn load_snapshot(kv: &dyn KvStore, student_user_id: i64) -> Result<Vec<GradeRecord>, StoreError> {
    kv::try_load_list(kv, &snapshot_namespace(student_user_id), KEY_GRADES)
}

pub fn save_snapshot(
    kv: &dyn KvStore,
    student_user_id: i64,
    grades: &[GradeRecord],
) -> Result<(), StoreError> {
    kv::save_list(kv, &snapshot_namespace(student_user_id), KEY_GRADES, grades)
}

/// Who is looking at the grades: the student themself, or a guardian
/// following a linked student by name.
#[derive(Debug, Clone, PartialEq)]
pub enum Viewer {
    Student,
    Guardian { student_name: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub baseline: bool,
    pub new_grades: Vec<GradeRecord>,
    pub notifications: Vec<Notification>,
}

/// Compares `current` against the stored snapshot, records one NEW_GRADE
/// notification per new grade and replaces the snapshot.
///
/// The first sync for a student only stores the baseline.
pub fn sync_grades(
    kv: &dyn KvStore,
    notifications: &NotificationStore,
    student_user_id: i64,
    viewer: &Viewer,
    current: &[GradeRecord],
) -> Result<SyncOutcome, StoreError> {
    let previous = load_snapshot(kv, student_user_id)?;
    let baseline = previous.is_empty();

    let mut fresh: Vec<GradeRecord> = Vec::new();
    let mut created: Vec<Notification> = Vec::new();
    if !baseline {
        for grade in new_grades(&previous, current) {
            let competency = grade.competency_name.as_deref().unwrap_or("Competency");
            let session = grade.session_title.as_deref().unwrap_or("Session");
            let message = format!("{}: {} - {}", competency, grade.value, session);
            let (title, extra) = match viewer {
                Viewer::Student => (
                    "New grade registered".to_string(),
                    json!({ "competency": competency, "value": grade.value }),
                ),
                Viewer::Guardian { student_name } => (
                    format!("New grade - {}", student_name),
                    json!({
                        "studentId": student_user_id,
                        "studentName": student_name,
                        "value": grade.value,
                    }),
                ),
            };
            let n = notifications.add(
                &title,
                &message,
                NotificationType::NewGrade,
                Some(extra.to_string()),
                true,
            )?;
            info!(student_user_id, competency, value = %grade.value, "new grade detected");
            created.push(n);
            fresh.push(grade.clone());
        }
    }

    save_snapshot(kv, student_user_id, current)?;
    Ok(SyncOutcome {
        baseline,
        new_grades: fresh,
        notifications: created,
    })
}
