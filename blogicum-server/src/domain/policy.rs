//! Who may see a post and who may change a post or comment.
//!
//! Every function here is pure: callers fetch the rows first and pass the
//! current time in. Denials are plain `false`; turning them into a "not
//! found" page (reads) or a redirect to the post (mutations) is the caller's
//! job.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::category::Category;
use crate::domain::comment::Comment;
use crate::domain::post::Post;

/// The identity behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    Anonymous,
    User(Uuid),
}

impl Requester {
    pub fn is(&self, user_id: Uuid) -> bool {
        matches!(self, Requester::User(id) if *id == user_id)
    }
}

/// Content with exactly one owning author.
pub trait Authored {
    fn author_id(&self) -> Uuid;
}

impl Authored for Post {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

/// A post without a category is never live: every public listing and the
/// detail page require a published category.
pub fn category_is_live(category: Option<&Category>) -> bool {
    category.is_some_and(|c| c.is_published)
}

/// The public branch of [`can_read`]: published, due, and in a published
/// category.
pub fn is_live(post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
    post.is_published && post.pub_date <= now && category_is_live(category)
}

/// `category` must be the row referenced by `post.category_id`.
pub fn can_read(
    post: &Post,
    category: Option<&Category>,
    requester: &Requester,
    now: DateTime<Utc>,
) -> bool {
    requester.is(post.author_id) || is_live(post, category, now)
}

pub fn can_read_now(post: &Post, category: Option<&Category>, requester: &Requester) -> bool {
    can_read(post, category, requester, Utc::now())
}

/// Only the author may edit or delete. There is no administrator override.
pub fn can_mutate<T: Authored>(item: &T, requester: &Requester) -> bool {
    requester.is(item.author_id())
}

/// The listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Home,
    Category(Uuid),
    Profile(Uuid),
}

/// Predicate applied to every post of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedFilter {
    pub author_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub public_only: bool,
}

impl FeedFilter {
    pub fn matches(&self, post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
        if self.author_id.is_some_and(|id| id != post.author_id) {
            return false;
        }
        if self.category_id.is_some() && self.category_id != post.category_id {
            return false;
        }
        !self.public_only || is_live(post, category, now)
    }
}

/// The home and category feeds are public-only for everybody, the author
/// included. Only a profile owner looking at their own profile sees hidden
/// and scheduled posts.
pub fn effective_feed_filter(feed: Feed, requester: &Requester) -> FeedFilter {
    match feed {
        Feed::Home => FeedFilter {
            author_id: None,
            category_id: None,
            public_only: true,
        },
        Feed::Category(category_id) => FeedFilter {
            author_id: None,
            category_id: Some(category_id),
            public_only: true,
        },
        Feed::Profile(owner) => FeedFilter {
            author_id: Some(owner),
            category_id: None,
            public_only: !requester.is(owner),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    struct Fixture {
        author: Uuid,
        post: Post,
        category: Category,
        now: DateTime<Utc>,
    }

    fn fixture() -> Fixture {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let category = Category::new("Travel".into(), "Trips".into(), "travel".into());
        let post = Post {
            id: Uuid::new_v4(),
            title: "Alps".into(),
            text: "Snow".into(),
            pub_date: now - Duration::days(1),
            author_id: author,
            location_id: None,
            category_id: Some(category.id),
            image: None,
            is_published: true,
            created_at: now - Duration::days(2),
        };
        Fixture {
            author,
            post,
            category,
            now,
        }
    }

    fn stranger() -> Requester {
        Requester::User(Uuid::new_v4())
    }

    #[test]
    fn live_post_is_readable_by_anyone() {
        let f = fixture();
        for requester in [Requester::Anonymous, stranger(), Requester::User(f.author)] {
            assert!(can_read(&f.post, Some(&f.category), &requester, f.now));
        }
    }

    #[test]
    fn unpublished_post_is_readable_only_by_author() {
        let mut f = fixture();
        f.post.is_published = false;
        assert!(!can_read(&f.post, Some(&f.category), &Requester::Anonymous, f.now));
        assert!(!can_read(&f.post, Some(&f.category), &stranger(), f.now));
        assert!(can_read(&f.post, Some(&f.category), &Requester::User(f.author), f.now));
    }

    #[test]
    fn scheduled_post_is_hidden_until_due_even_when_published() {
        let mut f = fixture();
        f.post.pub_date = f.now + Duration::days(1);
        assert!(!can_read(&f.post, Some(&f.category), &Requester::Anonymous, f.now));
        assert!(can_read(&f.post, Some(&f.category), &Requester::User(f.author), f.now));

        f.post.is_published = false;
        assert!(!can_read(&f.post, Some(&f.category), &stranger(), f.now));
        assert!(can_read(&f.post, Some(&f.category), &Requester::User(f.author), f.now));
    }

    #[test]
    fn can_read_now_uses_the_clock() {
        let mut f = fixture();
        assert!(can_read_now(&f.post, Some(&f.category), &Requester::Anonymous));

        f.post.pub_date = Utc::now() + Duration::minutes(5);
        assert!(!can_read_now(&f.post, Some(&f.category), &Requester::Anonymous));
        assert!(can_read_now(&f.post, Some(&f.category), &Requester::User(f.author)));
    }

    #[test]
    fn post_due_exactly_now_is_live() {
        let mut f = fixture();
        f.post.pub_date = f.now;
        assert!(is_live(&f.post, Some(&f.category), f.now));
    }

    #[test]
    fn unpublished_category_hides_published_post() {
        let mut f = fixture();
        f.category.is_published = false;
        assert!(!can_read(&f.post, Some(&f.category), &Requester::Anonymous, f.now));
        assert!(can_read(&f.post, Some(&f.category), &Requester::User(f.author), f.now));
    }

    #[test]
    fn post_without_category_is_never_live() {
        let mut f = fixture();
        f.post.category_id = None;
        assert!(!is_live(&f.post, None, f.now));
        assert!(!can_read(&f.post, None, &stranger(), f.now));
        assert!(can_read(&f.post, None, &Requester::User(f.author), f.now));
    }

    #[test]
    fn only_author_may_mutate_posts_and_comments() {
        let f = fixture();
        let commenter = Uuid::new_v4();
        let comment = Comment::new(f.post.id, commenter, "nice".into());

        assert!(can_mutate(&f.post, &Requester::User(f.author)));
        assert!(!can_mutate(&f.post, &stranger()));
        assert!(!can_mutate(&f.post, &Requester::Anonymous));

        assert!(can_mutate(&comment, &Requester::User(commenter)));
        assert!(!can_mutate(&comment, &Requester::User(f.author)));
    }

    #[test]
    fn home_feed_is_public_only_even_for_the_author() {
        let mut f = fixture();
        f.post.is_published = false;
        let filter = effective_feed_filter(Feed::Home, &Requester::User(f.author));
        assert!(filter.public_only);
        assert!(!filter.matches(&f.post, Some(&f.category), f.now));
    }

    #[test]
    fn category_feed_keeps_only_live_posts_of_that_category() {
        let f = fixture();
        let filter = effective_feed_filter(Feed::Category(f.category.id), &Requester::Anonymous);
        assert!(filter.matches(&f.post, Some(&f.category), f.now));

        let other = effective_feed_filter(Feed::Category(Uuid::new_v4()), &Requester::Anonymous);
        assert!(!other.matches(&f.post, Some(&f.category), f.now));
    }

    #[test]
    fn profile_feed_is_owner_aware() {
        let mut f = fixture();
        f.post.pub_date = f.now + Duration::hours(3);
        f.post.is_published = false;

        let own = effective_feed_filter(Feed::Profile(f.author), &Requester::User(f.author));
        assert!(!own.public_only);
        assert!(own.matches(&f.post, Some(&f.category), f.now));

        let visitor = effective_feed_filter(Feed::Profile(f.author), &stranger());
        assert!(visitor.public_only);
        assert!(!visitor.matches(&f.post, Some(&f.category), f.now));

        let someone_else = effective_feed_filter(Feed::Profile(Uuid::new_v4()), &Requester::User(f.author));
        assert!(!someone_else.matches(&f.post, Some(&f.category), f.now));
    }
}
