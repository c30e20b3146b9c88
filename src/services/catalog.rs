use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::config;
use crate::models::{
    Course, Exam, ExamKind, Question, QuestionInput, Section, Video, VideoInput,
};
use crate::services::{decode, ServiceError, ServiceResult};
use crate::store::{collections, doc_id, DocumentStore};
use crate::tenant::TenantResolver;

/// Post-creation catalog maintenance: appending videos, attaching exams to
/// courses, and exam question management.
pub struct CatalogService<S: DocumentStore> {
    store: Arc<S>,
    resolver: Arc<TenantResolver<S>>,
}

impl<S: DocumentStore> Clone for CatalogService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<S: DocumentStore> CatalogService<S> {
    pub fn new(store: Arc<S>, resolver: Arc<TenantResolver<S>>) -> Self {
        Self { store, resolver }
    }

    /// Appends videos to a section, enforcing the per-section cap before any
    /// insert so a violation leaves the existing videos untouched.
    pub async fn add_videos_to_section(
        &self,
        tenant: &str,
        section_id: Uuid,
        videos: Vec<VideoInput>,
    ) -> ServiceResult<Vec<Video>> {
        if videos.is_empty() {
            return Err(ServiceError::Validation(
                "at least one video is required".to_string(),
            ));
        }

        let handle = self.resolver.resolve(tenant).await?;
        let doc = self
            .store
            .find_by_id(&handle.database, collections::SECTIONS, section_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Section not found".to_string()))?;
        let section: Section = decode(doc)?;

        let cap = config::config().course.max_videos_per_section;
        if section.videos.len() + videos.len() > cap {
            return Err(ServiceError::Validation(format!(
                "a section may hold at most {cap} videos"
            )));
        }

        let mut inserted = Vec::with_capacity(videos.len());
        for video in videos {
            let doc = self
                .store
                .insert(
                    &handle.database,
                    collections::VIDEOS,
                    json!({
                        "videoName": video.video_name,
                        "url": video.url,
                        "description": video.description,
                        "section": section_id,
                    }),
                )
                .await?;
            inserted.push(decode::<Video>(doc)?);
        }

        let mut video_ids = section.videos;
        video_ids.extend(inserted.iter().map(|v| v.id));
        self.store
            .update(
                &handle.database,
                collections::SECTIONS,
                section_id,
                json!({"videos": video_ids}),
            )
            .await?;

        Ok(inserted)
    }

    /// Attaches an existing exam to one of the course's exam slots. A
    /// preliminary exam is only valid on courses that require one.
    pub async fn set_course_exam(
        &self,
        tenant: &str,
        course_id: Uuid,
        kind: ExamKind,
        exam_id: Uuid,
    ) -> ServiceResult<Course> {
        let handle = self.resolver.resolve(tenant).await?;

        let exam_doc = self
            .store
            .find_by_id(&handle.database, collections::EXAMS, exam_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Exam not found".to_string()))?;
        let _exam: Exam = decode(exam_doc)?;

        let course_doc = self
            .store
            .find_by_id(&handle.database, collections::COURSES, course_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Course not found".to_string()))?;
        let course: Course = decode(course_doc)?;

        let patch = match kind {
            ExamKind::Preliminary => {
                if !course.is_preliminary_required {
                    return Err(ServiceError::Validation(
                        "This course does not require a preliminary exam".to_string(),
                    ));
                }
                json!({"preliminaryExam": exam_id})
            }
            ExamKind::Final => json!({"finalExam": exam_id}),
        };

        let updated = self
            .store
            .update(&handle.database, collections::COURSES, course_id, patch)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Course not found".to_string()))?;
        decode(updated)
    }

    /// Resolves a course's preliminary or final exam and returns its
    /// questions in exam order. An exam with no questions yields an empty
    /// list, not an error.
    pub async fn get_course_questions(
        &self,
        tenant: &str,
        course_id: Uuid,
        kind: ExamKind,
    ) -> ServiceResult<Vec<Question>> {
        let handle = self.resolver.resolve(tenant).await?;

        let course_doc = self
            .store
            .find_by_id(&handle.database, collections::COURSES, course_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Course not found or deleted".to_string()))?;
        let course: Course = decode(course_doc)?;
        if course.is_deleted {
            return Err(ServiceError::NotFound(
                "Course not found or deleted".to_string(),
            ));
        }

        let exam_id = match kind {
            ExamKind::Preliminary => {
                if !course.is_preliminary_required {
                    return Err(ServiceError::Validation(
                        "Preliminary exam is not required for this course".to_string(),
                    ));
                }
                course.preliminary_exam.ok_or_else(|| {
                    ServiceError::NotFound(
                        "No preliminary exam assigned to this course".to_string(),
                    )
                })?
            }
            ExamKind::Final => course.final_exam.ok_or_else(|| {
                ServiceError::NotFound("No final exam assigned to this course".to_string())
            })?,
        };

        let exam_doc = self
            .store
            .find_by_id(&handle.database, collections::EXAMS, exam_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Exam not found".to_string()))?;
        let exam: Exam = decode(exam_doc)?;

        let mut questions = Vec::with_capacity(exam.questions.len());
        for question_id in &exam.questions {
            if let Some(doc) = self
                .store
                .find_by_id(&handle.database, collections::QUESTIONS, *question_id)
                .await?
            {
                questions.push(decode::<Question>(doc)?);
            }
        }
        Ok(questions)
    }

    /// Creates a question and appends it to the exam's ordered list.
    /// Option-count and correct-index rules are enforced here, at write
    /// time; they are never re-validated retroactively.
    pub async fn add_exam_question(
        &self,
        tenant: &str,
        exam_id: Uuid,
        input: QuestionInput,
    ) -> ServiceResult<Question> {
        validate_question(&input)?;

        let handle = self.resolver.resolve(tenant).await?;
        let exam_doc = self
            .store
            .find_by_id(&handle.database, collections::EXAMS, exam_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Exam not found".to_string()))?;
        let exam: Exam = decode(exam_doc)?;

        let options: Vec<_> = input
            .options
            .iter()
            .map(|text| json!({"text": text}))
            .collect();
        let doc = self
            .store
            .insert(
                &handle.database,
                collections::QUESTIONS,
                json!({
                    "prompt": input.prompt,
                    "options": options,
                    "correctIdx": input.correct_idx,
                }),
            )
            .await?;
        let question: Question = decode(doc.clone())?;

        let mut question_ids = exam.questions;
        question_ids.push(doc_id(&doc)?);
        self.store
            .update(
                &handle.database,
                collections::EXAMS,
                exam_id,
                json!({"questions": question_ids}),
            )
            .await?;

        Ok(question)
    }

    /// Soft-deletes a section; reads filter the flag the same way they do
    /// for courses.
    pub async fn soft_delete_section(
        &self,
        tenant: &str,
        section_id: Uuid,
    ) -> ServiceResult<Option<Section>> {
        let handle = self.resolver.resolve(tenant).await?;
        let updated = self
            .store
            .update(
                &handle.database,
                collections::SECTIONS,
                section_id,
                json!({"isDeleted": true}),
            )
            .await?;
        updated.map(decode::<Section>).transpose()
    }
}

fn validate_question(input: &QuestionInput) -> ServiceResult<()> {
    if input.prompt.trim().is_empty() {
        return Err(ServiceError::Validation("prompt is required".to_string()));
    }
    if input.options.len() < 2 {
        return Err(ServiceError::Validation(
            "at least two options are required".to_string(),
        ));
    }
    if input.correct_idx >= input.options.len() {
        return Err(ServiceError::Validation(
            "correctIdx must be a valid position inside the options".to_string(),
        ));
    }
    Ok(())
}
