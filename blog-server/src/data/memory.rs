//! In-memory stand-in for PostgreSQL and the upload directory, used by the
//! service and handler tests.

use super::comment_repository::CommentRepository;
use super::post_repository::PostRepository;
use super::user_repository::UserRepository;
use crate::domain::comment::PopulatedComment;
use crate::domain::post::{AuthorProfile, LikeResponse, NewPost, PopulatedPost, PostChanges};
use crate::domain::user::NewUser;
use crate::domain::{Comment, DomainError, Post, User};
use crate::infrastructure::blob_store::{generate_name, BlobStore, PUBLIC_PREFIX};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    next_id: i64,
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    blobs: HashMap<String, Vec<u8>>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn profile(&self, user_id: i64) -> Result<AuthorProfile, DomainError> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| AuthorProfile {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
            })
            .ok_or(DomainError::UserNotFound)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, name: &str, email: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.users.push(User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        });
        id
    }

    /// Makes every subsequent call fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn post(&self, id: i64) -> Option<Post> {
        let state = self.state.lock().unwrap();
        state.posts.iter().find(|p| p.id == id).cloned()
    }

    pub fn comment_count(&self) -> usize {
        self.state.lock().unwrap().comments.len()
    }

    pub fn blob(&self, reference: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state.blobs.get(reference).cloned()
    }

    pub fn blob_count(&self) -> usize {
        self.state.lock().unwrap().blobs.len()
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(DomainError::StoreUnavailable("memory store offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, author_id: i64, post: NewPost) -> Result<Post, DomainError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let post = Post {
            id: state.next_id(),
            title: post.title,
            body: post.body,
            image: post.image,
            author_id,
            likes: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        self.check()?;
        self.post(id).ok_or(DomainError::PostNotFound)
    }

    async fn find_populated(&self, id: i64) -> Result<PopulatedPost, DomainError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        let post = state
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(DomainError::PostNotFound)?;
        let author = state.profile(post.author_id)?;
        Ok(PopulatedPost { post, author })
    }

    async fn list_populated(&self) -> Result<Vec<PopulatedPost>, DomainError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        let mut posts = state
            .posts
            .iter()
            .map(|post| {
                Ok(PopulatedPost {
                    post: post.clone(),
                    author: state.profile(post.author_id)?,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        posts.sort_by(|a, b| {
            (b.post.created_at, b.post.id).cmp(&(a.post.created_at, a.post.id))
        });
        Ok(posts)
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, DomainError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DomainError::PostNotFound)?;
        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(body) = changes.body {
            post.body = body;
        }
        if let Some(image) = changes.image {
            post.image = Some(image);
        }
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let before = state.posts.len();
        state.posts.retain(|p| p.id != id);
        if state.posts.len() == before {
            return Err(DomainError::PostNotFound);
        }
        Ok(())
    }

    async fn toggle_like(&self, id: i64, user_id: i64) -> Result<LikeResponse, DomainError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DomainError::PostNotFound)?;
        let liked = match post.likes.iter().position(|&u| u == user_id) {
            Some(idx) => {
                post.likes.remove(idx);
                false
            }
            None => {
                post.likes.push(user_id);
                true
            }
        };
        Ok(LikeResponse {
            likes_count: post.likes.len() as i64,
            liked,
        })
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(
        &self,
        post_id: i64,
        author_id: i64,
        text: String,
    ) -> Result<Comment, DomainError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        if !state.posts.iter().any(|p| p.id == post_id) {
            return Err(DomainError::PostNotFound);
        }
        let comment = Comment {
            id: state.next_id(),
            post_id,
            author_id,
            text,
            created_at: Utc::now(),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_by_post(&self, post_id: i64) -> Result<Vec<PopulatedComment>, DomainError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        let mut comments = state
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| {
                Ok(PopulatedComment {
                    comment: c.clone(),
                    author: state.profile(c.author_id)?,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        comments.sort_by_key(|c| (c.comment.created_at, c.comment.id));
        Ok(comments)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(
        &self,
        new_user: NewUser,
        password_hash: String,
    ) -> Result<User, DomainError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| u.email == new_user.email) {
            return Err(DomainError::UserAlreadyExists);
        }
        let user = User {
            id: state.next_id(),
            name: new_user.name,
            email: new_user.email,
            password_hash,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, DomainError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn put(&self, original_name: &str, bytes: Vec<u8>) -> Result<String, DomainError> {
        let reference = format!("{}/{}", PUBLIC_PREFIX, generate_name(original_name));
        let mut state = self.state.lock().unwrap();
        state.blobs.insert(reference.clone(), bytes);
        Ok(reference)
    }

    async fn remove(&self, reference: &str) -> Result<(), DomainError> {
        self.state.lock().unwrap().blobs.remove(reference);
        Ok(())
    }
}
