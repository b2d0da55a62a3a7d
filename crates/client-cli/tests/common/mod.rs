//! Spins up the real resource store on an ephemeral port for client tests

#![allow(dead_code)]

use basket::api::ApiClient;
use basket::auth::{LoginForm, RegisterForm};
use basket::storage::LocalStore;
use basket::Store;
use basket_server::{config::Config, db::Database, routes, state::AppState};
use shared::User;
use tempfile::TempDir;

pub struct TestBackend {
    pub api: ApiClient,
    _db_dir: TempDir,
}

pub async fn spawn_backend() -> TestBackend {
    let db_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.database.path = db_dir.path().join("basket.db").display().to_string();

    let db = Database::new(&config.database.path).await.unwrap();
    db.run_migrations().await.unwrap();
    let app = routes::create_router(AppState::new(db, config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestBackend {
        api: ApiClient::new(format!("http://{}", addr)),
        _db_dir: db_dir,
    }
}

/// A client store with its own scratch directory for durable state
pub struct TestClient {
    pub store: Store,
    pub backend: TestBackend,
    pub data_dir: TempDir,
}

pub async fn test_client() -> TestClient {
    let backend = spawn_backend().await;
    let data_dir = TempDir::new().unwrap();
    let local = LocalStore::open(data_dir.path()).unwrap();
    TestClient {
        store: Store::new(backend.api.clone(), local),
        backend,
        data_dir,
    }
}

pub fn register_form(email: &str, password: &str) -> RegisterForm {
    RegisterForm {
        email: email.to_string(),
        password: password.to_string(),
        name: "Alice".to_string(),
        surname: "Liddell".to_string(),
        cell_number: "555-0100".to_string(),
    }
}

/// Register and log in, returning the session user
pub async fn sign_in(store: &mut Store, email: &str, password: &str) -> User {
    store
        .auth
        .register(&mut register_form(email, password))
        .await
        .unwrap();

    let mut form = LoginForm {
        email: email.to_string(),
        password: password.to_string(),
    };
    store.auth.login(&mut store.session, &mut form).await.unwrap()
}
