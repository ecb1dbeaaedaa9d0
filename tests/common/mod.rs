#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use chirpy::configuration::{JwtSettings, Platform};
use chirpy::startup::{run, AppState};
use chirpy::store::MemoryStore;
use serde_json::{json, Value};

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(Platform::Dev, TEST_SECRET)
}

pub fn spawn_app_with(platform: Platform, secret: &str) -> TestApp {
    spawn_app_with_cost(platform, secret, 4)
}

pub fn spawn_app_with_cost(platform: Platform, secret: &str, password_hash_cost: u32) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store = Arc::new(MemoryStore::new());
    let jwt = JwtSettings {
        secret: secret.to_string(),
        ..JwtSettings::default()
    };
    let state = AppState::new(store.clone(), store.clone(), jwt, platform, password_hash_cost)
        .expect("Failed to build application state");

    let server = run(listener, state).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", &self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", &self.address, path))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn create_user(&self, email: &str, password: &str) -> Value {
        let response = self
            .post_json("/api/users", &json!({ "email": email, "password": password }))
            .await;
        assert_eq!(201, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post_json("/api/login", &json!({ "email": email, "password": password }))
            .await
    }

    /// Register and log in, returning the login body
    pub async fn logged_in_user(&self, email: &str, password: &str) -> Value {
        self.create_user(email, password).await;
        let response = self.login(email, password).await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }
}
