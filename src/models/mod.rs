//! Document models. Field names serialize in camelCase to match the wire
//! format and the stored JSON documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Tenant-namespace documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub course_name: String,
    pub fee: i64,
    pub no_of_lessons: i64,
    #[serde(default)]
    pub course_thumbnail: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_preliminary_required: bool,
    /// Reference into the central schools directory.
    pub school: Uuid,
    #[serde(default)]
    pub sections: Vec<Uuid>,
    #[serde(default)]
    pub forum: Option<Uuid>,
    #[serde(default)]
    pub preliminary_exam: Option<Uuid>,
    #[serde(default)]
    pub final_exam: Option<Uuid>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: Uuid,
    pub section_name: String,
    #[serde(default)]
    pub exam_required: bool,
    #[serde(default)]
    pub videos: Vec<Uuid>,
    #[serde(default)]
    pub exam: Option<Uuid>,
    #[serde(default)]
    pub course: Option<Uuid>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub video_name: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub section: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: Uuid,
    pub title: String,
    pub total_marks: i64,
    pub min_to_pass: i64,
    #[serde(default)]
    pub questions: Vec<Uuid>,
    #[serde(default)]
    pub section: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub prompt: String,
    pub options: Vec<QuestionOption>,
    /// Zero-based index into `options`; validated at write time only.
    pub correct_idx: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    /// Reference into the central student roster.
    pub user: Uuid,
    pub course: Uuid,
    pub content: String,
    /// Null for top-level comments; replies point at their parent.
    #[serde(default)]
    pub parent_comment: Option<Uuid>,
    #[serde(default)]
    pub likes: Vec<Uuid>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Central-namespace documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Salted digest, never the plaintext.
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub courses_offered: Vec<String>,
    #[serde(default)]
    pub is_verified: bool,
    /// Assigned by an admin after verification; null until then.
    #[serde(default)]
    pub sub_domain: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub official_contact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, skip_serializing)]
    pub reset_password_token: Option<String>,
    #[serde(default, skip_serializing)]
    pub reset_password_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Platform operator account; verifies schools and assigns subdomains.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePayment {
    pub id: Uuid,
    pub school_id: Uuid,
    pub course_id: Uuid,
    pub student_id: Uuid,
    #[serde(default)]
    pub gateway_txn_id: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
    pub course_name: String,
    pub fee: i64,
    pub no_of_lessons: i64,
    #[serde(default)]
    pub course_thumbnail: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_preliminary_required: bool,
    pub school_id: Uuid,
    #[serde(default)]
    pub sections: Vec<SectionInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionInput {
    pub section_name: String,
    #[serde(default)]
    pub exam_required: bool,
    #[serde(default)]
    pub exam: Option<ExamInput>,
    #[serde(default)]
    pub videos: Vec<VideoInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamInput {
    pub title: String,
    pub total_marks: i64,
    pub min_to_pass: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInput {
    pub video_name: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_idx: usize,
}

/// Exam slots a course can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamKind {
    Preliminary,
    Final,
}

impl ExamKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "preliminary" => Some(ExamKind::Preliminary),
            "final" => Some(ExamKind::Final),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Populated views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDetails {
    pub id: Uuid,
    pub section_name: String,
    pub exam_required: bool,
    pub course: Option<Uuid>,
    pub videos: Vec<Video>,
    pub exam: Option<Exam>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SectionDetails {
    pub fn new(section: Section, videos: Vec<Video>, exam: Option<Exam>) -> Self {
        Self {
            id: section.id,
            section_name: section.section_name,
            exam_required: section.exam_required,
            course: section.course,
            videos,
            exam,
            created_at: section.created_at,
            updated_at: section.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetails {
    pub id: Uuid,
    pub course_name: String,
    pub fee: i64,
    pub no_of_lessons: i64,
    pub course_thumbnail: Option<String>,
    pub description: Option<String>,
    pub is_preliminary_required: bool,
    pub school: Uuid,
    pub preliminary_exam: Option<Uuid>,
    pub final_exam: Option<Uuid>,
    pub is_deleted: bool,
    pub sections: Vec<SectionDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseDetails {
    pub fn new(course: Course, sections: Vec<SectionDetails>) -> Self {
        Self {
            id: course.id,
            course_name: course.course_name,
            fee: course.fee,
            no_of_lessons: course.no_of_lessons,
            course_thumbnail: course.course_thumbnail,
            description: course.description,
            is_preliminary_required: course.is_preliminary_required,
            school: course.school,
            preliminary_exam: course.preliminary_exam,
            final_exam: course.final_exam,
            is_deleted: course.is_deleted,
            sections,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

/// Pagination envelope returned by listing endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            total,
            page,
            limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn course_deserializes_from_stored_doc() {
        let doc = json!({
            "id": "0c7e3c5e-3c5e-4b5e-8b5e-0c7e3c5e4b5e",
            "courseName": "Algebra",
            "fee": 500,
            "noOfLessons": 12,
            "isPreliminaryRequired": true,
            "school": "1c7e3c5e-3c5e-4b5e-8b5e-0c7e3c5e4b5e",
            "sections": [],
            "isDeleted": false,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        });
        let course: Course = serde_json::from_value(doc).expect("deserialize");
        assert_eq!(course.course_name, "Algebra");
        assert!(course.is_preliminary_required);
        assert!(course.preliminary_exam.is_none());
    }

    #[test]
    fn school_never_serializes_password() {
        let doc = json!({
            "id": "0c7e3c5e-3c5e-4b5e-8b5e-0c7e3c5e4b5e",
            "name": "Gamers Club",
            "email": "gamersclub@eduvia.space",
            "password": "digest",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        });
        let school: School = serde_json::from_value(doc).expect("deserialize");
        let out = serde_json::to_value(&school).expect("serialize");
        assert!(out.get("password").is_none());
    }

    #[test]
    fn pagination_rounds_up() {
        let p = Pagination::new(11, 1, 10);
        assert_eq!(p.total_pages, 2);
        let p = Pagination::new(0, 1, 10);
        assert_eq!(p.total_pages, 0);
    }

    #[test]
    fn exam_kind_parses_case_insensitively() {
        assert_eq!(ExamKind::parse("Preliminary"), Some(ExamKind::Preliminary));
        assert_eq!(ExamKind::parse("FINAL"), Some(ExamKind::Final));
        assert_eq!(ExamKind::parse("midterm"), None);
    }
}
