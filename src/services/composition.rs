use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::config;
use crate::models::{CourseDetails, CourseInput};
use crate::services::course_query::fetch_course_details;
use crate::services::{ServiceError, ServiceResult};
use crate::store::{collections, doc_id, DocumentStore, StoreSession};
use crate::tenant::TenantResolver;

/// Orchestrates creation of a course, its sections, each section's videos,
/// and optional exams as one atomic unit inside the tenant's namespace. No
/// other component writes section, video, or exam documents during course
/// creation.
pub struct CourseCompositionService<S: DocumentStore> {
    store: Arc<S>,
    resolver: Arc<TenantResolver<S>>,
}

impl<S: DocumentStore> Clone for CourseCompositionService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<S: DocumentStore> CourseCompositionService<S> {
    pub fn new(store: Arc<S>, resolver: Arc<TenantResolver<S>>) -> Self {
        Self { store, resolver }
    }

    /// Creates the full course aggregate. Either every document lands or
    /// none does; the underlying failure is reported unchanged, with no
    /// retry. Output section order matches input order.
    pub async fn create_course(
        &self,
        tenant: &str,
        input: CourseInput,
    ) -> ServiceResult<CourseDetails> {
        validate(&input)?;

        let handle = self.resolver.resolve(tenant).await?;
        let mut session = self.store.begin(&handle.database).await?;

        let course_id = match compose(session.as_mut(), &input).await {
            Ok(course_id) => {
                session.commit().await?;
                course_id
            }
            Err(err) => {
                // Abort and surface the original failure
                let _ = session.rollback().await;
                return Err(err);
            }
        };

        fetch_course_details(self.store.as_ref(), &handle.database, course_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound("Created course could not be re-read".to_string())
            })
    }
}

fn validate(input: &CourseInput) -> ServiceResult<()> {
    if input.course_name.trim().is_empty() {
        return Err(ServiceError::Validation(
            "courseName is required".to_string(),
        ));
    }
    if input.fee < 0 {
        return Err(ServiceError::Validation(
            "fee must not be negative".to_string(),
        ));
    }
    if input.no_of_lessons < 0 {
        return Err(ServiceError::Validation(
            "noOfLessons must not be negative".to_string(),
        ));
    }

    let cap = config::config().course.max_videos_per_section;
    for section in &input.sections {
        if section.section_name.trim().is_empty() {
            return Err(ServiceError::Validation(
                "sectionName is required".to_string(),
            ));
        }
        if section.videos.len() > cap {
            return Err(ServiceError::Validation(format!(
                "a section may hold at most {cap} videos"
            )));
        }
    }
    Ok(())
}

/// The write sequence. Runs entirely inside one session so a failure at any
/// step leaves no partial course behind.
async fn compose(session: &mut dyn StoreSession, input: &CourseInput) -> ServiceResult<Uuid> {
    let course_doc = session
        .insert(
            collections::COURSES,
            json!({
                "courseName": input.course_name,
                "fee": input.fee,
                "noOfLessons": input.no_of_lessons,
                "courseThumbnail": input.course_thumbnail,
                "description": input.description,
                "isPreliminaryRequired": input.is_preliminary_required,
                "school": input.school_id,
                "sections": [],
                "isDeleted": false,
            }),
        )
        .await?;
    let course_id = doc_id(&course_doc)?;

    let mut section_ids: Vec<Uuid> = Vec::with_capacity(input.sections.len());

    for section in &input.sections {
        // Exam first, with a null back-reference until its section exists
        let exam_id = match &section.exam {
            Some(exam) => {
                let doc = session
                    .insert(
                        collections::EXAMS,
                        json!({
                            "title": exam.title,
                            "totalMarks": exam.total_marks,
                            "minToPass": exam.min_to_pass,
                            "questions": [],
                            "section": null,
                        }),
                    )
                    .await?;
                Some(doc_id(&doc)?)
            }
            None => None,
        };

        let mut video_ids: Vec<Uuid> = Vec::with_capacity(section.videos.len());
        for video in &section.videos {
            let doc = session
                .insert(
                    collections::VIDEOS,
                    json!({
                        "videoName": video.video_name,
                        "url": video.url,
                        "description": video.description,
                        "section": null,
                    }),
                )
                .await?;
            video_ids.push(doc_id(&doc)?);
        }

        let section_doc = session
            .insert(
                collections::SECTIONS,
                json!({
                    "sectionName": section.section_name,
                    "examRequired": section.exam_required,
                    "videos": video_ids,
                    "exam": exam_id,
                    "course": course_id,
                    "isDeleted": false,
                }),
            )
            .await?;
        let section_id = doc_id(&section_doc)?;

        // Back-fill the section reference now that its id is known
        if let Some(exam_id) = exam_id {
            session
                .update(collections::EXAMS, exam_id, json!({"section": section_id}))
                .await?;
        }
        for video_id in &video_ids {
            session
                .update(collections::VIDEOS, *video_id, json!({"section": section_id}))
                .await?;
        }

        section_ids.push(section_id);
    }

    session
        .update(
            collections::COURSES,
            course_id,
            json!({"sections": section_ids}),
        )
        .await?;

    Ok(course_id)
}
