#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use planeacion_api::app;
use planeacion_api::config::AppConfig;
use planeacion_api::testing::{test_config, test_state, MemoryStore, StaticVerifier};

pub const PASSWORD: &str = "abcdefgh";

pub fn timestamp(value: &Value) -> DateTime<Utc> {
    serde_json::from_value(value.clone()).expect("RFC 3339 timestamp")
}

/// In-process application over a fresh `MemoryStore` with one seeded org unit.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub unidad_id: i64,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with(test_config(), StaticVerifier::default()).await
    }

    pub async fn with(config: AppConfig, verifier: StaticVerifier) -> Self {
        let store = Arc::new(MemoryStore::new());
        let unidad_id = store
            .seed_unidad("Escuela Superior de Cómputo", Some("ESCOM"))
            .await;
        let router = app(test_state(config, store.clone(), verifier));
        Self { router, store, unidad_id }
    }

    /// Sends one request and returns the status plus the parsed JSON body
    /// (`Value::Null` when the body is empty).
    pub async fn request(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body: {:?}", bytes))?
        };
        Ok((status, body))
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };
        self.request(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, uri, None, token).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, uri, Some(body), token).await
    }

    pub async fn put(&self, uri: &str, body: Value, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::PUT, uri, Some(body), token).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::DELETE, uri, None, token).await
    }

    pub async fn register(&self, nombre: &str, email: &str) -> Result<Value> {
        let (status, body) = self
            .post(
                "/api/auth/register",
                json!({ "nombre": nombre, "email": email, "password": PASSWORD, "unidad_id": self.unidad_id }),
                None,
            )
            .await?;
        if status != StatusCode::CREATED {
            bail!("register {} failed: {} {}", email, status, body);
        }
        Ok(body["data"]["user"].clone())
    }

    pub async fn login(&self, email: &str) -> Result<String> {
        let (status, body) = self
            .post("/api/auth/login", json!({ "email": email, "password": PASSWORD }), None)
            .await?;
        if status != StatusCode::OK {
            bail!("login {} failed: {} {}", email, status, body);
        }
        body["data"]["access_token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no access_token")
    }

    /// Registers and logs in, returning the new user's id and token.
    pub async fn signup(&self, nombre: &str, email: &str) -> Result<(i64, String)> {
        let user = self.register(nombre, email).await?;
        let id = user["id"].as_i64().context("user has no id")?;
        let token = self.login(email).await?;
        Ok((id, token))
    }

    pub async fn create_planeacion(&self, token: &str, nombre: &str) -> Result<i64> {
        let (status, body) = self
            .post("/api/planeaciones", json!({ "nombre_planeacion": nombre }), Some(token))
            .await?;
        if status != StatusCode::CREATED {
            bail!("create planeación failed: {} {}", status, body);
        }
        body["data"]["id"].as_i64().context("create response has no id")
    }

    /// Creates a document with a subject and moves it to `finalizada`.
    pub async fn publish(&self, token: &str, nombre: &str, asignatura: &str) -> Result<i64> {
        let id = self.create_planeacion(token, nombre).await?;
        let uri = format!("/api/planeaciones/{}/datos-generales", id);
        let (status, body) = self.put(&uri, json!({ "asignatura": asignatura }), Some(token)).await?;
        if status != StatusCode::OK {
            bail!("save datos generales failed: {} {}", status, body);
        }
        self.set_status(token, id, "finalizada").await?;
        Ok(id)
    }

    pub async fn set_status(&self, token: &str, id: i64, status: &str) -> Result<()> {
        let uri = format!("/api/planeaciones/{}", id);
        let (code, body) = self.put(&uri, json!({ "status": status }), Some(token)).await?;
        if code != StatusCode::OK {
            bail!("status update failed: {} {}", code, body);
        }
        Ok(())
    }
}
