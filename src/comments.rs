// Comments attached to classes

use crate::error::{CourseResult, Entity};
use crate::models::Comment;
use crate::record::next_id;
use crate::store::{RecordStore, delete_record};
use tracing::info;

pub struct CommentManager<'a, S: RecordStore> {
    store: &'a S,
}

impl<'a, S: RecordStore> CommentManager<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Comments on a class, oldest first
    pub fn list(&self, class_id: u64) -> CourseResult<Vec<Comment>> {
        let comments = self.store.load::<Comment>()?;
        Ok(comments.into_iter().filter(|c| c.class_id == class_id).collect())
    }

    pub fn create(&self, user_id: u64, class_id: u64, content: &str) -> CourseResult<Comment> {
        self.store.transact(|comments: &mut Vec<Comment>| {
            let comment = Comment {
                id: next_id(comments),
                user_id,
                class_id,
                content: content.to_string(),
            };
            comments.push(comment.clone());

            info!(id = comment.id, user_id, class_id, "Created comment");
            Ok(comment)
        })
    }

    pub fn delete(&self, comment_id: u64) -> CourseResult<()> {
        delete_record::<Comment, S>(self.store, comment_id, Entity::Comment)
    }
}
