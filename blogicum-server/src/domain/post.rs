use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;

pub const TITLE_MAX_CHARS: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    /// Publication moment; a value in the future schedules the post.
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(author_id: Uuid, draft: PostDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            text: draft.text,
            pub_date: draft.pub_date.unwrap_or(now),
            author_id,
            location_id: draft.location_id,
            category_id: draft.category_id,
            image: draft.image,
            is_published: draft.is_published.unwrap_or(true),
            created_at: now,
        }
    }
}

/// Author-supplied fields of a new post.
#[derive(Debug, Clone, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub location_id: Option<Uuid>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub pub_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_published: Option<bool>,
}

impl PostDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_title(&self.title)?;
        validate_text(&self.text)
    }
}

/// Partial update of a post. For nullable references the outer `Option`
/// says whether the field was sent, the inner one carries the new value
/// (`Some(None)` clears it).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostChanges {
    pub title: Option<String>,
    pub text: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub location_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "present")]
    pub category_id: Option<Option<Uuid>>,
    pub pub_date: Option<DateTime<Utc>>,
    pub is_published: Option<bool>,
}

impl PostChanges {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(text) = &self.text {
            validate_text(text)?;
        }
        Ok(())
    }

    pub fn apply(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(text) = self.text {
            post.text = text;
        }
        if let Some(image) = self.image {
            post.image = image;
        }
        if let Some(location_id) = self.location_id {
            post.location_id = location_id;
        }
        if let Some(category_id) = self.category_id {
            post.category_id = category_id;
        }
        if let Some(pub_date) = self.pub_date {
            post.pub_date = pub_date;
        }
        if let Some(is_published) = self.is_published {
            post.is_published = is_published;
        }
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_title(title: &str) -> Result<(), DomainError> {
    let len = title.trim().chars().count();
    if len == 0 || len > TITLE_MAX_CHARS {
        return Err(DomainError::Validation(format!(
            "title must be 1..={TITLE_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_text(text: &str) -> Result<(), DomainError> {
    if text.trim().is_empty() {
        return Err(DomainError::Validation("text must not be empty".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocationRef {
    pub id: Uuid,
    pub name: String,
}

/// A post with its related rows resolved and its comments counted, as shown
/// in feeds and on the detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: String,
    pub category: Option<CategoryRef>,
    pub location: Option<LocationRef>,
    pub comment_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, text: &str) -> PostDraft {
        PostDraft {
            title: title.into(),
            text: text.into(),
            image: None,
            location_id: None,
            category_id: None,
            pub_date: None,
            is_published: None,
        }
    }

    #[test]
    fn new_post_defaults_to_published_now() {
        let before = Utc::now();
        let post = Post::new(Uuid::new_v4(), draft("Hello", "World"));
        assert!(post.is_published);
        assert!(post.pub_date >= before);
        assert!(post.category_id.is_none());
    }

    #[test]
    fn draft_rejects_blank_or_oversized_title() {
        assert!(draft("  ", "body").validate().is_err());
        assert!(draft(&"x".repeat(TITLE_MAX_CHARS + 1), "body").validate().is_err());
        assert!(draft(&"x".repeat(TITLE_MAX_CHARS), "body").validate().is_ok());
        assert!(draft("title", "").validate().is_err());
    }

    #[test]
    fn changes_distinguish_absent_from_null() {
        let changes: PostChanges =
            serde_json::from_str(r#"{"title":"New","category_id":null}"#).unwrap();
        assert_eq!(changes.category_id, Some(None));
        assert_eq!(changes.location_id, None);

        let mut post = Post::new(Uuid::new_v4(), draft("Old", "body"));
        post.category_id = Some(Uuid::new_v4());
        post.location_id = Some(Uuid::new_v4());
        let location = post.location_id;
        changes.apply(&mut post);

        assert_eq!(post.title, "New");
        assert_eq!(post.category_id, None);
        assert_eq!(post.location_id, location);
    }
}
