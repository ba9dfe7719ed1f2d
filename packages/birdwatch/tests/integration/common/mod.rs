use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, redirect};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde_json::Value;

use birdwatch::config::{
    AppConfig, AuthConfig, BirdsConfig, CorsConfig, DatabaseConfig, ServerConfig,
};
use birdwatch::entity::bird;
use birdwatch::state::AppState;
use birdwatch::utils::url_signer::{LinkAction, UrlSigner};

pub mod routes {
    pub const REGISTER: &str = "/api/v1/auth/register";
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const LOGOUT: &str = "/api/v1/auth/logout";
    pub const ME: &str = "/api/v1/auth/me";
    pub const BIRDS: &str = "/api/v1/birds";
    pub const ADD: &str = "/api/v1/birds/add";

    pub fn edit(id: i32) -> String {
        format!("/api/v1/birds/edit/{id}")
    }

    pub fn inc(id: i32) -> String {
        format!("/api/v1/birds/inc/{id}")
    }

    pub fn capitalize(id: i32) -> String {
        format!("/api/v1/birds/capitalize/{id}")
    }
}

pub const PASSWORD: &str = "securepass";
pub const LINK_SECRET: &str = "test-link-secret";
pub const JWT_SECRET: &str = "test-secret-for-integration-tests";

/// A running test server backed by its own in-memory SQLite database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub signer: UrlSigner,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
    /// `Location` header, for redirects.
    pub location: Option<String>,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let location = res
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            text,
            body,
            location,
        }
    }

    pub fn assert_redirects_to_listing(&self) {
        assert_eq!(self.status, 303, "Expected redirect, got: {}", self.text);
        assert_eq!(self.location.as_deref(), Some(routes::BIRDS));
    }
}

/// Form fields for a valid sighting.
pub fn sparrow() -> Vec<(&'static str, &'static str)> {
    vec![
        ("species_name", "Sparrow"),
        ("weight", "0.03"),
        ("diet", "seeds"),
        ("habitat", "urban"),
        ("sighting_count", "1"),
    ]
}

/// Replace one field of a form.
pub fn with_field(
    mut form: Vec<(&'static str, &'static str)>,
    name: &'static str,
    value: &'static str,
) -> Vec<(&'static str, &'static str)> {
    form.retain(|(k, _)| *k != name);
    form.push((name, value));
    form
}

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors: CorsConfig {
                allow_origins: vec![],
                max_age: 3600,
            },
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        auth: AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
            link_secret: LINK_SECRET.to_string(),
            session_ttl_hours: 1,
        },
        birds: BirdsConfig::default(),
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(test_config()).await
    }

    /// Spawn with ownership checks on edit/increment/capitalize turned off.
    pub async fn spawn_without_ownership_checks() -> Self {
        let mut config = test_config();
        config.birds = BirdsConfig {
            enforce_ownership: false,
        };
        Self::spawn_with(config).await
    }

    async fn spawn_with(config: AppConfig) -> Self {
        let db = birdwatch::database::init_db(&config.database)
            .await
            .expect("Failed to initialize test database");

        let signer = UrlSigner::new(&config.auth.link_secret).expect("Failed to build signer");
        let state = AppState {
            db: db.clone(),
            config,
            signer: Arc::new(signer.clone()),
        };

        let app = birdwatch::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        Self {
            addr,
            client,
            db,
            signer,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_form_with_token(
        &self,
        path: &str,
        form: &[(&str, &str)],
        token: &str,
    ) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .form(form)
            .send()
            .await
            .expect("Failed to send form POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    /// Register a user and log in, returning the auth token.
    pub async fn create_authenticated_user(&self, email: &str) -> String {
        let body = serde_json::json!({
            "email": email,
            "password": PASSWORD,
        });

        let reg = self.post_json(routes::REGISTER, &body).await;
        assert_eq!(reg.status, 201, "Registration failed: {}", reg.text);

        self.login(email).await
    }

    /// Log an existing user in again, opening a fresh session.
    pub async fn login(&self, email: &str) -> String {
        let body = serde_json::json!({
            "email": email,
            "password": PASSWORD,
        });
        let res = self.post_json(routes::LOGIN, &body).await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        res.body["token"]
            .as_str()
            .expect("Login response missing token")
            .to_string()
    }

    /// Log a sighting through the API and return its id.
    pub async fn create_bird(&self, token: &str, form: &[(&str, &str)]) -> i32 {
        let res = self.post_form_with_token(routes::ADD, form, token).await;
        res.assert_redirects_to_listing();

        bird::Entity::find()
            .all(&self.db)
            .await
            .expect("Failed to query birds")
            .into_iter()
            .map(|b| b.id)
            .max()
            .expect("No bird was created")
    }

    /// The caller's listing.
    pub async fn list(&self, token: &str) -> Vec<Value> {
        let res = self.get_with_token(routes::BIRDS, token).await;
        assert_eq!(res.status, 200, "Listing failed: {}", res.text);
        res.body["data"]
            .as_array()
            .expect("Listing missing data")
            .clone()
    }

    /// The signed link of `action` ("edit", "increment", "capitalize") for
    /// bird `id`, as rendered in the caller's listing.
    pub async fn link(&self, token: &str, id: i32, action: &str) -> String {
        self.list(token)
            .await
            .into_iter()
            .find(|b| b["id"] == id)
            .and_then(|b| b["links"][action].as_str().map(str::to_string))
            .unwrap_or_else(|| panic!("No {action} link for bird {id}"))
    }

    /// Session id carried by a token.
    pub fn session_id(&self, token: &str) -> String {
        birdwatch::utils::jwt::verify(token, JWT_SECRET)
            .expect("Token does not verify")
            .sid
    }

    /// A correctly signed link for any id, as the server would render it.
    pub fn signed_link(&self, token: &str, action: LinkAction, id: i32) -> String {
        self.signer
            .signed_path(routes::BIRDS, action, id, &self.session_id(token))
    }

    pub async fn find_bird(&self, id: i32) -> Option<bird::Model> {
        bird::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .expect("Failed to query bird")
    }

    pub async fn bird_count(&self) -> usize {
        bird::Entity::find()
            .all(&self.db)
            .await
            .expect("Failed to query birds")
            .len()
    }
}
