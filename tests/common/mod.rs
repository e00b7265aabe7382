#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use zeroize::Zeroizing;

use devoria::{
    config::{BasicCredentials, Config},
    crypto::keys::KeyMaterial,
    error::{AppError, Result},
    models::{
        account::{Account, NewAccount},
        article::{Article, ArticleChanges, ArticleStatus, NewArticle},
        claims::Claims,
    },
    repositories::{account::AccountRepository, article::ArticleRepository},
    routes::build_router,
    services::{password, token::TokenService},
    session::cache::{CacheError, MemoryCache, SessionCache},
    state::AppState,
};

pub const PRIVATE_PEM: &[u8] = include_bytes!("../fixtures/id_rsa");
pub const PUBLIC_PEM: &[u8] = include_bytes!("../fixtures/id_rsa.pub");

pub const BASIC_USER: &str = "devoria-client";
pub const BASIC_PASSWORD: &str = "client-secret";

/// Accounts kept in a vector; ids are handed out sequentially unless seeded.
#[derive(Default)]
pub struct InMemoryAccounts {
    rows: Mutex<Vec<Account>>,
}

impl InMemoryAccounts {
    pub fn insert_with_id(&self, id: i64, email: &str, password_hash: String) -> Account {
        let account = Account {
            id,
            email: email.to_string(),
            password_hash,
            first_name: "Test".to_string(),
            last_name: "Account".to_string(),
            created_at: Utc::now(),
            last_modified_at: None,
        };
        self.rows.lock().unwrap().push(account.clone());
        account
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccounts {
    async fn save(&self, account: NewAccount) -> Result<Account> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|a| a.email == account.email) {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let stored = Account {
            id: rows.iter().map(|a| a.id).max().unwrap_or(0) + 1,
            email: account.email,
            password_hash: account.password_hash,
            first_name: account.first_name,
            last_name: account.last_name,
            created_at: account.created_at,
            last_modified_at: None,
        };
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(self.rows.lock().unwrap().iter().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        Ok(self.rows.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryArticles {
    rows: Mutex<Vec<Article>>,
}

impl InMemoryArticles {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl ArticleRepository for InMemoryArticles {
    async fn save(&self, article: NewArticle) -> Result<Article> {
        let mut rows = self.rows.lock().unwrap();
        let stored = Article {
            id: rows.iter().map(|a| a.id).max().unwrap_or(0) + 1,
            author_id: article.author_id,
            title: article.title,
            subtitle: article.subtitle,
            content: article.content,
            status: ArticleStatus::Draft,
            created_at: article.created_at,
            published_at: None,
            last_modified_at: None,
        };
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, changes: ArticleChanges) -> Result<Option<Article>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|a| a.id == changes.id).map(|a| {
            a.title = changes.title;
            a.subtitle = changes.subtitle;
            a.content = changes.content;
            a.last_modified_at = Some(changes.last_modified_at);
            a.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|a| a.id != id);
        Ok(rows.len() < before)
    }

    async fn set_status(
        &self,
        id: i64,
        status: ArticleStatus,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Article>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|a| a.id == id).map(|a| {
            a.status = status;
            if published_at.is_some() {
                a.published_at = published_at;
            }
            a.clone()
        }))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>> {
        Ok(self.rows.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }
}

/// A cache that never answers.
pub struct StalledCache;

#[async_trait]
impl SessionCache for StalledCache {
    async fn set_ex(&self, _: &str, _: String, _: Duration) -> std::result::Result<(), CacheError> {
        std::future::pending().await
    }

    async fn get(&self, _: &str) -> std::result::Result<Option<String>, CacheError> {
        std::future::pending().await
    }

    async fn del(&self, _: &str) -> std::result::Result<(), CacheError> {
        std::future::pending().await
    }

    async fn ping(&self) -> std::result::Result<(), CacheError> {
        std::future::pending().await
    }
}

/// A cache whose connection is gone.
pub struct UnreachableCache;

#[async_trait]
impl SessionCache for UnreachableCache {
    async fn set_ex(&self, _: &str, _: String, _: Duration) -> std::result::Result<(), CacheError> {
        Err(CacheError("connection refused".to_string()))
    }

    async fn get(&self, _: &str) -> std::result::Result<Option<String>, CacheError> {
        Err(CacheError("connection refused".to_string()))
    }

    async fn del(&self, _: &str) -> std::result::Result<(), CacheError> {
        Err(CacheError("connection refused".to_string()))
    }

    async fn ping(&self) -> std::result::Result<(), CacheError> {
        Err(CacheError("connection refused".to_string()))
    }
}

pub fn test_config() -> Config {
    Config {
        listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        redis_url: "redis://unused".to_string(),
        private_key_path: "tests/fixtures/id_rsa".into(),
        public_key_path: "tests/fixtures/id_rsa.pub".into(),
        token_ttl: Duration::from_secs(3600),
        session_secret: Zeroizing::new(vec![7u8; 32]),
        session_ttl: Duration::from_secs(3600),
        cache_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(15),
        basic_auth: BasicCredentials {
            username: Zeroizing::new(BASIC_USER.to_string()),
            password: Zeroizing::new(BASIC_PASSWORD.to_string()),
        },
    }
}

pub fn keys() -> Arc<KeyMaterial> {
    Arc::new(KeyMaterial::from_pem(PRIVATE_PEM, PUBLIC_PEM).unwrap())
}

/// Argon2 at its minimum cost so seeded logins stay fast.
pub fn cheap_hash(plain: &str) -> String {
    let params = argon2::Params::new(argon2::Params::MIN_M_COST, 1, 1, None).unwrap();
    password::hash_password_with(plain, params).unwrap()
}

/// Shared test context: the router wired to in-memory storage.
pub struct TestContext {
    pub router: Router,
    pub state: AppState,
    pub accounts: Arc<InMemoryAccounts>,
    pub articles: Arc<InMemoryArticles>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_cache(test_config(), Arc::new(MemoryCache::new()))
    }

    pub fn with_cache(config: Config, cache: Arc<dyn SessionCache>) -> Self {
        let accounts = Arc::new(InMemoryAccounts::default());
        let articles = Arc::new(InMemoryArticles::default());
        let state = AppState::new(&config, keys(), accounts.clone(), articles.clone(), cache)
            .unwrap();

        Self {
            router: build_router(state.clone()),
            state,
            accounts,
            articles,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.state.tokens
    }

    pub fn seed_account(&self, id: i64, email: &str, plain: &str) -> Account {
        self.accounts.insert_with_id(id, email, cheap_hash(plain))
    }

    /// A token for `account_id` signed with the service key, no login involved.
    pub fn token_for(&self, account_id: i64) -> String {
        self.tokens()
            .issue(account_id, &format!("account{}@devoria.test", account_id))
            .unwrap()
            .token
    }

    pub fn sign(&self, claims: &Claims) -> String {
        self.tokens().sign(claims).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn login(&self, email: &str, plain: &str) -> (StatusCode, Value) {
        self.send(json_request(
            "POST",
            "/v1/account/login",
            Some(&basic_header(BASIC_USER, BASIC_PASSWORD)),
            serde_json::json!({ "email": email, "password": plain }),
        ))
        .await
    }
}

pub fn basic_header(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, password)))
}

pub fn bearer_header(token: &str) -> String {
    format!("Bearer {}", token)
}

pub fn json_request(
    method: &str,
    uri: &str,
    authorization: Option<&str>,
    body: Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}
