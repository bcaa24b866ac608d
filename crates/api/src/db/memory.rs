//! In-memory implementation of every store trait.
//!
//! Mirrors the relational behaviour the handlers rely on: unique emails,
//! foreign keys, cascading deletes, case-insensitive search, and paging
//! with an unwindowed total. Used by tests and local runs without a database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use quillpost_core::{CategoryId, CommentId, Email, LikeId, PageRequest, PostId, UserId};

use super::{
    CategoryStore, CommentStore, LikeStore, Page, PostStore, RepositoryError, UserStore,
};
use crate::models::{
    Category, CategoryFilter, Comment, CommentAuthor, CommentFilter, CommentWithAuthor, Like,
    LikeInfo, LikeOutcome, NewComment, NewPost, NewUser, Post, PostChanges, PostFilter, SortOrder,
    User, UserChanges, UserFilter,
};

/// Process-local database.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    categories: BTreeMap<CategoryId, Category>,
    posts: BTreeMap<PostId, Post>,
    comments: BTreeMap<CommentId, Comment>,
    likes: BTreeMap<LikeId, Like>,
    sequence: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.sequence += 1;
        self.sequence
    }

    fn email_taken(&self, email: &Email, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == *email && Some(u.id) != except)
    }

    fn remove_post(&mut self, id: PostId) -> bool {
        if self.posts.remove(&id).is_none() {
            return false;
        }
        self.comments.retain(|_, c| c.post_id != id);
        self.likes.retain(|_, l| l.post_id != id);
        true
    }

    fn remove_posts_where(&mut self, predicate: impl Fn(&Post) -> bool) -> usize {
        let doomed: Vec<PostId> = self
            .posts
            .values()
            .filter(|p| predicate(p))
            .map(|p| p.id)
            .collect();
        for id in &doomed {
            self.remove_post(*id);
        }
        doomed.len()
    }
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let count = i64::try_from(items.len()).unwrap_or(i64::MAX);
    let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let items = items
        .into_iter()
        .skip(skip)
        .take(page.limit() as usize)
        .collect();
    Page { items, count }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn missing(constraint: &str) -> RepositoryError {
    RepositoryError::InvalidReference(constraint.to_owned())
}

// =============================================================================
// Users
// =============================================================================

#[async_trait]
impl UserStore for MemoryDatabase {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, None) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let created = User {
            id: UserId::new(tables.next_id()),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            dob: user.dob,
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            gender: user.gender,
            password_hash: user.password_hash.clone(),
            profile_image_url: user.profile_image_url.clone(),
            address: user.address.clone(),
            user_type: user.user_type,
            created_at: Utc::now(),
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == *email).cloned())
    }

    async fn list(&self, filter: &UserFilter) -> Result<Page<User>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| filter.search.as_deref().is_none_or(|s| u.matches(s)))
            .cloned()
            .collect();
        users.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(paginate(users, filter.page))
    }

    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.email_taken(&changes.email, Some(id)) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let user = tables.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.first_name.clone_from(&changes.first_name);
        user.last_name.clone_from(&changes.last_name);
        user.dob = changes.dob;
        user.email = changes.email.clone();
        user.phone_number.clone_from(&changes.phone_number);
        user.gender = changes.gender;
        user.profile_image_url.clone_from(&changes.profile_image_url);
        user.address.clone_from(&changes.address);
        user.user_type = changes.user_type;
        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        tables.remove_posts_where(|p| p.user_id == id);
        tables.comments.retain(|_, c| c.user_id != id);
        tables.likes.retain(|_, l| l.user_id != id);
        Ok(())
    }

    async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        password_hash.clone_into(&mut user.password_hash);
        Ok(())
    }
}

// =============================================================================
// Categories
// =============================================================================

#[async_trait]
impl CategoryStore for MemoryDatabase {
    async fn create(&self, title: &str) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write().await;
        let category = Category {
            id: CategoryId::new(tables.next_id()),
            title: title.to_owned(),
            created_at: Utc::now(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn list(&self, filter: &CategoryFilter) -> Result<Page<Category>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables
            .categories
            .values()
            .filter(|c| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|s| contains_ci(&c.title, s))
            })
            .cloned()
            .collect();
        categories.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(paginate(categories, filter.page))
    }

    async fn update(&self, id: CategoryId, title: &str) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write().await;
        let category = tables
            .categories
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        title.clone_into(&mut category.title);
        Ok(category.clone())
    }

    async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.categories.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        let posts_removed = tables.remove_posts_where(|p| p.category_id == id);
        tracing::debug!(category_id = %id, posts_removed, "Category deleted");
        Ok(())
    }
}

// =============================================================================
// Posts
// =============================================================================

#[async_trait]
impl PostStore for MemoryDatabase {
    async fn create(&self, post: &NewPost) -> Result<Post, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&post.user_id) {
            return Err(missing("posts_user_id_fkey"));
        }
        if !tables.categories.contains_key(&post.category_id) {
            return Err(missing("posts_category_id_fkey"));
        }

        let created = Post {
            id: PostId::new(tables.next_id()),
            title: post.title.clone(),
            description: post.description.clone(),
            image_url: post.image_url.clone(),
            user_id: post.user_id,
            category_id: post.category_id,
            created_at: Utc::now(),
            updated_at: None,
            views_count: 0,
        };
        tables.posts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn record_view(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.posts.get_mut(&id).map(|post| {
            post.views_count += 1;
            post.clone()
        }))
    }

    async fn list(&self, filter: &PostFilter) -> Result<Page<Post>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|s| contains_ci(&p.title, s))
                    && filter.user_id.is_none_or(|id| p.user_id == id)
                    && filter.category_id.is_none_or(|id| p.category_id == id)
            })
            .cloned()
            .collect();
        posts.sort_by_key(|p| (p.created_at, p.id));
        if filter.sort_by_date == SortOrder::Desc {
            posts.reverse();
        }
        Ok(paginate(posts, filter.page))
    }

    async fn update(&self, id: PostId, changes: &PostChanges) -> Result<Post, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if !tables.categories.contains_key(&changes.category_id) {
            return Err(missing("posts_category_id_fkey"));
        }

        let post = tables.posts.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        post.title.clone_from(&changes.title);
        post.description.clone_from(&changes.description);
        post.image_url.clone_from(&changes.image_url);
        post.category_id = changes.category_id;
        post.updated_at = Some(Utc::now());
        Ok(post.clone())
    }

    async fn delete(&self, id: PostId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.remove_post(id) {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}

// =============================================================================
// Comments
// =============================================================================

#[async_trait]
impl CommentStore for MemoryDatabase {
    async fn create(&self, comment: &NewComment) -> Result<Comment, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(missing("comments_post_id_fkey"));
        }
        if !tables.users.contains_key(&comment.user_id) {
            return Err(missing("comments_user_id_fkey"));
        }

        let created = Comment {
            id: CommentId::new(tables.next_id()),
            post_id: comment.post_id,
            user_id: comment.user_id,
            description: comment.description.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.comments.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn list(
        &self,
        filter: &CommentFilter,
    ) -> Result<Page<CommentWithAuthor>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<CommentWithAuthor> = tables
            .comments
            .values()
            .filter(|c| {
                filter.post_id.is_none_or(|id| c.post_id == id)
                    && filter.user_id.is_none_or(|id| c.user_id == id)
            })
            .filter_map(|c| {
                let author = tables.users.get(&c.user_id)?;
                Some(CommentWithAuthor {
                    comment: c.clone(),
                    user: CommentAuthor {
                        id: author.id,
                        first_name: author.first_name.clone(),
                        last_name: author.last_name.clone(),
                        email: author.email.clone(),
                        profile_image_url: author.profile_image_url.clone(),
                    },
                })
            })
            .collect();
        comments.sort_by(|a, b| {
            (b.comment.created_at, b.comment.id).cmp(&(a.comment.created_at, a.comment.id))
        });
        Ok(paginate(comments, filter.page))
    }

    async fn update(&self, id: CommentId, description: &str) -> Result<Comment, RepositoryError> {
        let mut tables = self.tables.write().await;
        let comment = tables
            .comments
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        description.clone_into(&mut comment.description);
        comment.updated_at = Some(Utc::now());
        Ok(comment.clone())
    }

    async fn delete(&self, id: CommentId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        tables
            .comments
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

// =============================================================================
// Likes
// =============================================================================

#[async_trait]
impl LikeStore for MemoryDatabase {
    async fn toggle(
        &self,
        post_id: PostId,
        user_id: UserId,
        status: bool,
    ) -> Result<LikeOutcome, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post_id) {
            return Err(missing("likes_post_id_fkey"));
        }
        if !tables.users.contains_key(&user_id) {
            return Err(missing("likes_user_id_fkey"));
        }

        let existing = tables
            .likes
            .values()
            .find(|l| l.post_id == post_id && l.user_id == user_id)
            .map(|l| (l.id, l.status));

        let outcome = LikeOutcome::decide(existing.map(|(_, current)| current), status);
        match (outcome, existing) {
            (LikeOutcome::Created, _) => {
                let id = LikeId::new(tables.next_id());
                tables.likes.insert(
                    id,
                    Like {
                        id,
                        post_id,
                        user_id,
                        status,
                    },
                );
            }
            (LikeOutcome::Removed, Some((id, _))) => {
                tables.likes.remove(&id);
            }
            (LikeOutcome::Updated, Some((id, _))) => {
                if let Some(like) = tables.likes.get_mut(&id) {
                    like.status = status;
                }
            }
            (LikeOutcome::Removed | LikeOutcome::Updated, None) => {
                return Err(RepositoryError::NotFound);
            }
        }
        Ok(outcome)
    }

    async fn get(
        &self,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<Option<Like>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .likes
            .values()
            .find(|l| l.post_id == post_id && l.user_id == user_id)
            .cloned())
    }

    async fn counts(&self, post_id: PostId) -> Result<LikeInfo, RepositoryError> {
        let tables = self.tables.read().await;
        let (likes, dislikes) = tables
            .likes
            .values()
            .filter(|l| l.post_id == post_id)
            .fold((0, 0), |(likes, dislikes), l| {
                if l.status {
                    (likes + 1, dislikes)
                } else {
                    (likes, dislikes + 1)
                }
            });
        Ok(LikeInfo {
            likes_count: likes,
            dislikes_count: dislikes,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use quillpost_core::UserType;

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            dob: NaiveDate::from_ymd_opt(1990, 12, 10).unwrap(),
            email: Email::parse(email).unwrap(),
            phone_number: None,
            gender: None,
            password_hash: "hash".to_owned(),
            profile_image_url: None,
            address: None,
            user_type: UserType::Owner,
        }
    }

    async fn seed_post(db: &MemoryDatabase) -> (UserId, CategoryId, PostId) {
        let user = UserStore::create(db, &new_user("author@example.com"))
            .await
            .unwrap();
        let category = CategoryStore::create(db, "Rust").await.unwrap();
        let post = PostStore::create(
            db,
            &NewPost {
                title: "Ownership".to_owned(),
                description: "Borrowing explained".to_owned(),
                image_url: None,
                user_id: user.id,
                category_id: category.id,
            },
        )
        .await
        .unwrap();
        (user.id, category.id, post.id)
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let db = MemoryDatabase::default();
        UserStore::create(&db, &new_user("a@example.com")).await.unwrap();
        let err = UserStore::create(&db, &new_user("a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_page_two_of_fifteen() {
        let db = MemoryDatabase::default();
        for i in 0..15 {
            CategoryStore::create(&db, &format!("category {i}"))
                .await
                .unwrap();
        }

        let page = CategoryStore::list(
            &db,
            &CategoryFilter {
                page: PageRequest::new(10, 2).unwrap(),
                search: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(page.items.len(), 5);
        assert_eq!(page.count, 15);
    }

    #[tokio::test]
    async fn test_like_toggle_and_counts() {
        let db = MemoryDatabase::default();
        let (user_id, _, post_id) = seed_post(&db).await;

        assert_eq!(
            db.toggle(post_id, user_id, true).await.unwrap(),
            LikeOutcome::Created
        );
        assert_eq!(db.counts(post_id).await.unwrap().likes_count, 1);

        assert_eq!(
            db.toggle(post_id, user_id, false).await.unwrap(),
            LikeOutcome::Updated
        );
        let info = db.counts(post_id).await.unwrap();
        assert_eq!((info.likes_count, info.dislikes_count), (0, 1));

        assert_eq!(
            db.toggle(post_id, user_id, false).await.unwrap(),
            LikeOutcome::Removed
        );
        assert_eq!(db.counts(post_id).await.unwrap(), LikeInfo::default());
        assert!(LikeStore::get(&db, post_id, user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_category_delete_cascades_to_posts() {
        let db = MemoryDatabase::default();
        let (_, category_id, post_id) = seed_post(&db).await;

        CategoryStore::delete(&db, category_id).await.unwrap();

        assert!(PostStore::get(&db, post_id).await.unwrap().is_none());
        assert!(matches!(
            CategoryStore::delete(&db, category_id).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_post_requires_existing_category() {
        let db = MemoryDatabase::default();
        let user = UserStore::create(&db, &new_user("b@example.com")).await.unwrap();
        let err = PostStore::create(
            &db,
            &NewPost {
                title: "Orphan".to_owned(),
                description: "No category".to_owned(),
                image_url: None,
                user_id: user.id,
                category_id: CategoryId::new(999),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn test_record_view_increments() {
        let db = MemoryDatabase::default();
        let (_, _, post_id) = seed_post(&db).await;

        db.record_view(post_id).await.unwrap();
        let post = db.record_view(post_id).await.unwrap().unwrap();
        assert_eq!(post.views_count, 2);
    }
}
