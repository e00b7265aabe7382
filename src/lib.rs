pub mod config;
pub mod db;
pub mod error;
pub mod response;
pub mod routes;
pub mod state;

pub mod crypto {
    pub mod aes;
    pub mod keys;
}

pub mod models {
    pub mod account;
    pub mod article;
    pub mod claims;
    pub mod session;
}

pub mod repositories {
    pub mod account;
    pub mod article;
}

pub mod services {
    pub mod account;
    pub mod article;
    pub mod password;
    pub mod token;
}

pub mod session {
    pub mod cache;
    pub mod redis_cache;
    pub mod store;
}

pub mod handlers {
    pub mod account;
    pub mod article;
}

pub mod middleware_layer {
    pub mod basic_auth;
    pub mod bearer_auth;
    pub mod deadline;
}

pub mod validation {
    pub mod json;
    pub mod rules;
}
