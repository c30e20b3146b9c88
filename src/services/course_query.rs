use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::config;
use crate::models::{Course, CourseDetails, Exam, Pagination, Section, SectionDetails, Video};
use crate::services::{decode, ServiceResult};
use crate::store::{collections, DocumentStore, Query, SortDirection};
use crate::tenant::TenantResolver;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCoursesParams {
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CoursePage {
    pub courses: Vec<Course>,
    pub pagination: Pagination,
}

pub struct CourseQueryService<S: DocumentStore> {
    store: Arc<S>,
    resolver: Arc<TenantResolver<S>>,
}

impl<S: DocumentStore> Clone for CourseQueryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<S: DocumentStore> CourseQueryService<S> {
    pub fn new(store: Arc<S>, resolver: Arc<TenantResolver<S>>) -> Self {
        Self { store, resolver }
    }

    /// Paginated, filtered, sorted listing. Soft-deleted courses never
    /// appear. Search is a case-insensitive substring match on the course
    /// name and description.
    pub async fn list_courses(
        &self,
        tenant: &str,
        params: ListCoursesParams,
    ) -> ServiceResult<CoursePage> {
        let handle = self.resolver.resolve(tenant).await?;
        let rules = &config::config().course;

        let limit = params
            .limit
            .unwrap_or(rules.default_page_limit)
            .clamp(1, rules.max_page_limit);
        let page = params.page.unwrap_or(1).max(1);
        // saturating: page arrives straight from the query string
        let skip = page.saturating_sub(1).saturating_mul(limit);

        let sort_by = params
            .sort_by
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "createdAt".to_string());
        let direction = SortDirection::parse_or_default(params.sort_order.as_deref());

        let mut filter = Query::new().eq("isDeleted", false);
        if let Some(search) = &params.search {
            filter = filter.search(&["courseName", "description"], search);
        }

        // The total is an independent read from the page fetch, so the two
        // can disagree under concurrent writes. Accepted.
        let total = self
            .store
            .count(&handle.database, collections::COURSES, filter.clone())
            .await?;
        let rows = self
            .store
            .find(
                &handle.database,
                collections::COURSES,
                filter.sort(sort_by, direction).skip(skip).limit(limit),
            )
            .await?;

        let courses = rows
            .into_iter()
            .map(decode::<Course>)
            .collect::<ServiceResult<Vec<_>>>()?;

        Ok(CoursePage {
            courses,
            pagination: Pagination::new(total, page, limit),
        })
    }

    /// Full nested fetch: sections in course order, each with its videos and
    /// exam populated. `None` when the course is missing or soft-deleted.
    pub async fn get_course_with_details(
        &self,
        tenant: &str,
        course_id: Uuid,
    ) -> ServiceResult<Option<CourseDetails>> {
        let handle = self.resolver.resolve(tenant).await?;
        fetch_course_details(self.store.as_ref(), &handle.database, course_id).await
    }

    /// Sets the soft-delete flag. Idempotent: re-deleting an already-deleted
    /// course still returns it with the flag set. `None` only when the id
    /// resolves to nothing.
    pub async fn soft_delete_course(
        &self,
        tenant: &str,
        course_id: Uuid,
    ) -> ServiceResult<Option<Course>> {
        let handle = self.resolver.resolve(tenant).await?;
        let updated = self
            .store
            .update(
                &handle.database,
                collections::COURSES,
                course_id,
                json!({"isDeleted": true}),
            )
            .await?;
        updated.map(decode::<Course>).transpose()
    }
}

/// Shared by the query service and the composition service's post-commit
/// re-fetch. Soft-deleted sections and dangling references are skipped.
pub(crate) async fn fetch_course_details<S: DocumentStore>(
    store: &S,
    namespace: &str,
    course_id: Uuid,
) -> ServiceResult<Option<CourseDetails>> {
    let Some(doc) = store
        .find_by_id(namespace, collections::COURSES, course_id)
        .await?
    else {
        return Ok(None);
    };
    let course: Course = decode(doc)?;
    if course.is_deleted {
        return Ok(None);
    }

    let mut sections = Vec::with_capacity(course.sections.len());
    for section_id in &course.sections {
        let Some(doc) = store
            .find_by_id(namespace, collections::SECTIONS, *section_id)
            .await?
        else {
            continue;
        };
        let section: Section = decode(doc)?;
        if section.is_deleted {
            continue;
        }

        let mut videos = Vec::with_capacity(section.videos.len());
        for video_id in &section.videos {
            if let Some(doc) = store
                .find_by_id(namespace, collections::VIDEOS, *video_id)
                .await?
            {
                videos.push(decode::<Video>(doc)?);
            }
        }

        let exam = match section.exam {
            Some(exam_id) => store
                .find_by_id(namespace, collections::EXAMS, exam_id)
                .await?
                .map(decode::<Exam>)
                .transpose()?,
            None => None,
        };

        sections.push(SectionDetails::new(section, videos, exam));
    }

    Ok(Some(CourseDetails::new(course, sections)))
}
