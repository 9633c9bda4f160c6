mod common;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn other_users_cannot_touch_a_document() -> Result<()> {
    let app = TestApp::new().await;
    let (_, ana) = app.signup("Ana Pérez", "ana@x.com").await?;
    let (_, luis) = app.signup("Luis Gómez", "luis@x.com").await?;
    let id = app.create_planeacion(&ana, "Cálculo Diferencial").await?;
    let uri = format!("/api/planeaciones/{id}");
    let datos_uri = format!("{uri}/datos-generales");

    let attempts = [
        app.get(&uri, Some(&luis)).await?,
        app.put(&uri, json!({ "nombre_planeacion": "Robado", "status": "finalizada" }), Some(&luis)).await?,
        app.delete(&uri, Some(&luis)).await?,
        app.get(&datos_uri, Some(&luis)).await?,
        app.put(&datos_uri, json!({ "asignatura": "Robada", "periodo": "2099-1" }), Some(&luis)).await?,
    ];
    for (status, body) in attempts {
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    // The owner's document is untouched.
    let (status, body) = app.get(&uri, Some(&ana)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nombre_planeacion"], "Cálculo Diferencial");
    assert_eq!(body["data"]["status"], "borrador");
    assert!(body["data"]["asignatura"].is_null());
    assert_eq!(app.store.datos_generales_count(id).await, 0);

    let (_, body) = app.get("/api/planeaciones", Some(&luis)).await?;
    assert!(body["data"].as_array().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn auth_cookie_alone_cannot_modify_documents() -> Result<()> {
    let app = TestApp::new().await;
    let (_, ana) = app.signup("Ana Pérez", "ana@x.com").await?;
    let id = app.create_planeacion(&ana, "Cálculo Diferencial").await?;
    let uri = format!("/api/planeaciones/{id}");
    let cookie = format!("auth_token={ana}");

    let update = Request::builder()
        .method("PUT")
        .uri(&uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, &cookie)
        .body(Body::from(json!({ "nombre_planeacion": "Cambiada", "status": "finalizada" }).to_string()))?;
    let (status, body) = app.request(update).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let delete = Request::builder()
        .method("DELETE")
        .uri(&uri)
        .header(header::COOKIE, &cookie)
        .body(Body::empty())?;
    let (status, _) = app.request(delete).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let list = Request::builder()
        .uri("/api/planeaciones")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())?;
    let (status, _) = app.request(list).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Still present and unchanged for the bearer-authenticated owner.
    let (status, body) = app.get(&uri, Some(&ana)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nombre_planeacion"], "Cálculo Diferencial");
    assert_eq!(body["data"]["status"], "borrador");
    Ok(())
}

#[tokio::test]
async fn missing_and_foreign_documents_look_the_same() -> Result<()> {
    let app = TestApp::new().await;
    let (_, ana) = app.signup("Ana Pérez", "ana@x.com").await?;
    let (_, luis) = app.signup("Luis Gómez", "luis@x.com").await?;
    let id = app.create_planeacion(&ana, "Cálculo").await?;

    let (_, foreign) = app.get(&format!("/api/planeaciones/{id}"), Some(&luis)).await?;
    let (_, missing) = app.get("/api/planeaciones/987654", Some(&luis)).await?;
    assert_eq!(foreign, missing);
    Ok(())
}

#[tokio::test]
async fn new_documents_take_the_org_unit_from_the_token() -> Result<()> {
    let app = TestApp::new().await;
    let (_, ana) = app.signup("Ana Pérez", "ana@x.com").await?;
    let otra = app.store.seed_unidad("Otra Escuela", None).await;

    let (status, body) = app
        .post("/api/planeaciones", json!({ "nombre_planeacion": "Cálculo", "unidad_academica_id": otra }), Some(&ana))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().unwrap();

    let (_, body) = app.get(&format!("/api/planeaciones/{id}"), Some(&ana)).await?;
    assert_eq!(body["data"]["unidad_academica_id"], app.unidad_id);
    Ok(())
}
