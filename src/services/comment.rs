use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::models::{Comment, Course};
use crate::services::{decode, ServiceError, ServiceResult};
use crate::store::{collections, DocumentStore, Query};
use crate::tenant::TenantResolver;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub course_id: Uuid,
    pub student_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub parent_comment_id: Option<Uuid>,
}

/// One comment with its replies nested beneath it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<CommentThread>,
}

/// Course discussion threads, stored flat in the tenant namespace and
/// reassembled into trees on read.
pub struct CommentService<S: DocumentStore> {
    store: Arc<S>,
    resolver: Arc<TenantResolver<S>>,
}

impl<S: DocumentStore> Clone for CommentService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<S: DocumentStore> CommentService<S> {
    pub fn new(store: Arc<S>, resolver: Arc<TenantResolver<S>>) -> Self {
        Self { store, resolver }
    }

    pub async fn add_comment(&self, tenant: &str, input: NewComment) -> ServiceResult<Comment> {
        if input.content.trim().is_empty() {
            return Err(ServiceError::Validation("content is required".to_string()));
        }

        let handle = self.resolver.resolve(tenant).await?;

        let course: Course = self
            .store
            .find_by_id(&handle.database, collections::COURSES, input.course_id)
            .await?
            .map(decode)
            .transpose()?
            .filter(|c: &Course| !c.is_deleted)
            .ok_or_else(|| ServiceError::NotFound("Course not found".to_string()))?;

        if let Some(parent_id) = input.parent_comment_id {
            let parent = self
                .fetch_live(&handle.database, parent_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Parent comment not found".to_string()))?;
            if parent.course != course.id {
                return Err(ServiceError::Validation(
                    "parent comment belongs to a different course".to_string(),
                ));
            }
        }

        let doc = self
            .store
            .insert(
                &handle.database,
                collections::COMMENTS,
                json!({
                    "user": input.student_id,
                    "course": input.course_id,
                    "content": input.content,
                    "parentComment": input.parent_comment_id,
                    "likes": [],
                    "isDeleted": false,
                }),
            )
            .await?;
        decode(doc)
    }

    /// All threads for a course: top-level comments in posting order, replies
    /// nested under their parent. Replies whose parent was deleted disappear
    /// with it.
    pub async fn course_comments(
        &self,
        tenant: &str,
        course_id: Uuid,
    ) -> ServiceResult<Vec<CommentThread>> {
        let handle = self.resolver.resolve(tenant).await?;
        let rows = self
            .store
            .find(
                &handle.database,
                collections::COMMENTS,
                Query::new().eq("course", course_id.to_string()),
            )
            .await?;

        let mut by_parent: HashMap<Option<Uuid>, Vec<Comment>> = HashMap::new();
        for doc in rows {
            let comment: Comment = decode(doc)?;
            if comment.is_deleted {
                continue;
            }
            by_parent.entry(comment.parent_comment).or_default().push(comment);
        }

        let top_level = by_parent.remove(&None).unwrap_or_default();
        Ok(top_level
            .into_iter()
            .map(|c| build_thread(c, &mut by_parent))
            .collect())
    }

    /// Soft-deletes a comment. Only the author may remove it; the store keeps
    /// the row so reply ids stay stable.
    pub async fn delete_comment(
        &self,
        tenant: &str,
        comment_id: Uuid,
        student_id: Uuid,
    ) -> ServiceResult<Comment> {
        let handle = self.resolver.resolve(tenant).await?;
        let comment = self
            .fetch_live(&handle.database, comment_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Comment not found".to_string()))?;
        if comment.user != student_id {
            return Err(ServiceError::Unauthorized(
                "Only the author can delete a comment".to_string(),
            ));
        }

        let doc = self
            .store
            .update(
                &handle.database,
                collections::COMMENTS,
                comment_id,
                json!({"isDeleted": true}),
            )
            .await?
            .ok_or_else(|| ServiceError::NotFound("Comment not found".to_string()))?;
        decode(doc)
    }

    /// Adds the student to the likes list. Liking twice is a no-op.
    pub async fn like_comment(
        &self,
        tenant: &str,
        comment_id: Uuid,
        student_id: Uuid,
    ) -> ServiceResult<Comment> {
        let handle = self.resolver.resolve(tenant).await?;
        let mut comment = self
            .fetch_live(&handle.database, comment_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Comment not found".to_string()))?;
        if comment.likes.contains(&student_id) {
            return Ok(comment);
        }
        comment.likes.push(student_id);
        self.store_likes(&handle.database, comment_id, &comment.likes)
            .await
    }

    pub async fn unlike_comment(
        &self,
        tenant: &str,
        comment_id: Uuid,
        student_id: Uuid,
    ) -> ServiceResult<Comment> {
        let handle = self.resolver.resolve(tenant).await?;
        let mut comment = self
            .fetch_live(&handle.database, comment_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Comment not found".to_string()))?;
        comment.likes.retain(|id| *id != student_id);
        self.store_likes(&handle.database, comment_id, &comment.likes)
            .await
    }

    async fn fetch_live(&self, namespace: &str, id: Uuid) -> ServiceResult<Option<Comment>> {
        Ok(self
            .store
            .find_by_id(namespace, collections::COMMENTS, id)
            .await?
            .map(decode)
            .transpose()?
            .filter(|c: &Comment| !c.is_deleted))
    }

    async fn store_likes(
        &self,
        namespace: &str,
        comment_id: Uuid,
        likes: &[Uuid],
    ) -> ServiceResult<Comment> {
        let doc = self
            .store
            .update(
                namespace,
                collections::COMMENTS,
                comment_id,
                json!({"likes": likes}),
            )
            .await?
            .ok_or_else(|| ServiceError::NotFound("Comment not found".to_string()))?;
        decode(doc)
    }
}

fn build_thread(
    comment: Comment,
    by_parent: &mut HashMap<Option<Uuid>, Vec<Comment>>,
) -> CommentThread {
    let replies = by_parent
        .remove(&Some(comment.id))
        .unwrap_or_default()
        .into_iter()
        .map(|c| build_thread(c, by_parent))
        .collect();
    CommentThread { comment, replies }
}
