use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Grade labels offered by the enrollment form, primary then secondary.
pub const GRADE_LABELS: [&str; 11] = [
    "1ro Primaria",
    "2do Primaria",
    "3ro Primaria",
    "4to Primaria",
    "5to Primaria",
    "6to Primaria",
    "1ro Secundaria",
    "2do Secundaria",
    "3ro Secundaria",
    "4to Secundaria",
    "5to Secundaria",
];

pub fn is_known_grade(label: &str) -> bool {
    GRADE_LABELS.contains(&label)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub grade: String,
    pub enrollment_file: String,
    pub created_at: String,
    pub updated_at: String,
}

impl StudentRecord {
    /// The caller-supplied fields, without id or timestamps.
    pub fn draft(&self) -> StudentDraft {
        StudentDraft {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            grade: self.grade.clone(),
            enrollment_file: self.enrollment_file.clone(),
        }
    }

    pub(crate) fn matches(&self, needle: &str) -> bool {
        [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.grade,
            &self.enrollment_file,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Fields supplied when a record is created. Also the shape of one entry
/// in an import payload: `id`, `createdAt` and `updatedAt` are accepted
/// there and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDraft {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub enrollment_file: String,
}

impl StudentDraft {
    /// Trims every text field except `grade`, which comes from a fixed list.
    pub fn trimmed(&self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            grade: self.grade.clone(),
            enrollment_file: self.enrollment_file.trim().to_string(),
        }
    }

    /// Name of the first required field that is blank, in form order.
    pub fn first_blank_field(&self) -> Option<&'static str> {
        [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("grade", &self.grade),
            ("enrollmentFile", &self.enrollment_file),
        ]
        .into_iter()
        .find(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
    }

    pub fn into_patch(self) -> StudentPatch {
        StudentPatch {
            first_name: Some(self.first_name),
            last_name: Some(self.last_name),
            email: Some(self.email),
            grade: Some(self.grade),
            enrollment_file: Some(self.enrollment_file),
        }
    }
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_file: Option<String>,
}

impl StudentPatch {
    pub(crate) fn apply(&self, rec: &mut StudentRecord) {
        if let Some(v) = &self.first_name {
            rec.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            rec.last_name = v.clone();
        }
        if let Some(v) = &self.email {
            rec.email = v.clone();
        }
        if let Some(v) = &self.grade {
            rec.grade = v.clone();
        }
        if let Some(v) = &self.enrollment_file {
            rec.enrollment_file = v.clone();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total: usize,
    pub by_grade: BTreeMap<String, usize>,
}

pub fn sample_students() -> Vec<StudentDraft> {
    let row = |first: &str, last: &str, email: &str, grade: &str, file: &str| StudentDraft {
        first_name: first.into(),
        last_name: last.into(),
        email: email.into(),
        grade: grade.into(),
        enrollment_file: file.into(),
    };
    vec![
        row(
            "Juan",
            "Pérez García",
            "juan.perez@colegio.edu",
            "5to Primaria",
            "MAT-2024-001",
        ),
        row(
            "María",
            "López Martínez",
            "maria.lopez@colegio.edu",
            "3ro Secundaria",
            "MAT-2024-002",
        ),
        row(
            "Carlos",
            "Rodríguez Silva",
            "carlos.rodriguez@colegio.edu",
            "1ro Primaria",
            "MAT-2024-003",
        ),
    ]
}
