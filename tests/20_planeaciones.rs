mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn end_to_end_create_with_placeholder_title() -> Result<()> {
    let app = TestApp::new().await;
    let (ana_id, ana) = app.signup("Ana Pérez", "ana@x.com").await?;

    let (status, body) = app.post("/api/planeaciones", json!({ "nombre_planeacion": "" }), Some(&ana)).await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = app.get(&format!("/api/planeaciones/{id}"), Some(&ana)).await?;
    assert_eq!(status, StatusCode::OK);
    let doc = &body["data"];
    assert_eq!(doc["nombre_planeacion"], "Planeación sin título");
    assert_eq!(doc["status"], "borrador");
    assert_eq!(doc["docente_id"], ana_id);
    assert_eq!(doc["unidad_academica_id"], app.unidad_id);
    assert!(doc["slug"].is_null());
    assert!(doc["finalizada_at"].is_null());

    let (_, luis) = app.signup("Luis Gómez", "luis@x.com").await?;
    let (status, _) = app.get(&format!("/api/planeaciones/{id}"), Some(&luis)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn create_without_body_fields_uses_placeholder() -> Result<()> {
    let app = TestApp::new().await;
    let (_, ana) = app.signup("Ana Pérez", "ana@x.com").await?;

    let (status, body) = app.post("/api/planeaciones", json!({}), Some(&ana)).await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().unwrap();

    let (_, body) = app.get(&format!("/api/planeaciones/{id}"), Some(&ana)).await?;
    assert_eq!(body["data"]["nombre_planeacion"], "Planeación sin título");
    Ok(())
}

#[tokio::test]
async fn routes_require_a_token() -> Result<()> {
    let app = TestApp::new().await;

    for (status, body) in [
        app.get("/api/planeaciones", None).await?,
        app.post("/api/planeaciones", json!({}), None).await?,
        app.get("/api/planeaciones/1", None).await?,
        app.put("/api/planeaciones/1", json!({ "status": "finalizada" }), None).await?,
        app.delete("/api/planeaciones/1", None).await?,
        app.get("/api/planeaciones/1/datos-generales", None).await?,
        app.put("/api/planeaciones/1/datos-generales", json!({}), None).await?,
    ] {
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
    Ok(())
}

#[tokio::test]
async fn list_is_scoped_to_owner_and_newest_first() -> Result<()> {
    let app = TestApp::new().await;
    let (_, ana) = app.signup("Ana Pérez", "ana@x.com").await?;
    let (_, luis) = app.signup("Luis Gómez", "luis@x.com").await?;

    let first = app.create_planeacion(&ana, "Álgebra").await?;
    let second = app.create_planeacion(&ana, "Cálculo").await?;
    app.create_planeacion(&luis, "Física").await?;

    let (status, body) = app.get("/api/planeaciones", Some(&ana)).await?;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second, first]);
    Ok(())
}

#[tokio::test]
async fn bad_ids_are_400() -> Result<()> {
    let app = TestApp::new().await;
    let (_, ana) = app.signup("Ana Pérez", "ana@x.com").await?;

    for uri in ["/api/planeaciones/abc", "/api/planeaciones/0", "/api/planeaciones/-4"] {
        let (status, _) = app.get(uri, Some(&ana)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
    let (status, _) = app.get("/api/planeaciones/abc/datos-generales", Some(&ana)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.get("/api/planeaciones/999", Some(&ana)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn update_only_touches_fields_present() -> Result<()> {
    let app = TestApp::new().await;
    let (_, ana) = app.signup("Ana Pérez", "ana@x.com").await?;
    let id = app.create_planeacion(&ana, "Cálculo Diferencial").await?;
    let uri = format!("/api/planeaciones/{id}");
    let (_, before) = app.get(&uri, Some(&ana)).await?;

    let (status, body) = app.put(&uri, json!({ "status": "en_revision" }), Some(&ana)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ok"], true);

    let (_, after) = app.get(&uri, Some(&ana)).await?;
    assert_eq!(after["data"]["nombre_planeacion"], "Cálculo Diferencial");
    assert_eq!(after["data"]["status"], "en_revision");
    assert!(common::timestamp(&after["data"]["updated_at"]) > common::timestamp(&before["data"]["updated_at"]));

    let secciones = json!({ "datos_generales": true, "referencias": false });
    let (status, _) = app
        .put(&uri, json!({ "nombre_planeacion": "Cálculo I", "secciones_completas": secciones }), Some(&ana))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let (_, after) = app.get(&uri, Some(&ana)).await?;
    assert_eq!(after["data"]["nombre_planeacion"], "Cálculo I");
    assert_eq!(after["data"]["status"], "en_revision");
    assert_eq!(after["data"]["secciones_completas"], secciones);
    Ok(())
}

#[tokio::test]
async fn finalizing_stamps_slug_and_timestamp_once() -> Result<()> {
    let app = TestApp::new().await;
    let (_, ana) = app.signup("Ana Pérez", "ana@x.com").await?;
    let id = app.create_planeacion(&ana, "Cálculo Diferencial").await?;
    let uri = format!("/api/planeaciones/{id}");

    app.set_status(&ana, id, "finalizada").await?;
    let (_, body) = app.get(&uri, Some(&ana)).await?;
    let slug = body["data"]["slug"].as_str().unwrap().to_string();
    let finalizada_at = body["data"]["finalizada_at"].clone();
    assert_eq!(slug, format!("calculo-diferencial-{id}"));
    assert!(finalizada_at.is_string());

    // Re-sending the same status keeps the first publication time.
    app.set_status(&ana, id, "finalizada").await?;
    let (_, body) = app.get(&uri, Some(&ana)).await?;
    assert_eq!(body["data"]["finalizada_at"], finalizada_at);

    // A later rename does not move the public slug.
    app.set_status(&ana, id, "borrador").await?;
    app.put(&uri, json!({ "nombre_planeacion": "Otro título", "status": "finalizada" }), Some(&ana))
        .await?;
    let (_, body) = app.get(&uri, Some(&ana)).await?;
    assert_eq!(body["data"]["slug"], slug.as_str());
    assert_ne!(body["data"]["finalizada_at"], finalizada_at);
    Ok(())
}

#[tokio::test]
async fn delete_removes_document() -> Result<()> {
    let app = TestApp::new().await;
    let (_, ana) = app.signup("Ana Pérez", "ana@x.com").await?;
    let id = app.create_planeacion(&ana, "Cálculo").await?;
    let uri = format!("/api/planeaciones/{id}");

    let (status, body) = app.delete(&uri, Some(&ana)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ok"], true);

    let (status, _) = app.get(&uri, Some(&ana)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&uri, Some(&ana)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn datos_generales_start_empty() -> Result<()> {
    let app = TestApp::new().await;
    let (_, ana) = app.signup("Ana Pérez", "ana@x.com").await?;
    let id = app.create_planeacion(&ana, "Cálculo").await?;

    let (status, body) = app.get(&format!("/api/planeaciones/{id}/datos-generales"), Some(&ana)).await?;
    assert_eq!(status, StatusCode::OK);
    let datos = &body["data"];
    assert!(datos["id"].is_null());
    assert_eq!(datos["planeacion_id"], id);
    assert!(datos["asignatura"].is_null());
    assert!(datos["periodo"].is_null());
    assert!(datos["horas_total"].is_null());
    Ok(())
}

#[tokio::test]
async fn datos_generales_upsert_keeps_a_single_row() -> Result<()> {
    let app = TestApp::new().await;
    let (_, ana) = app.signup("Ana Pérez", "ana@x.com").await?;
    let id = app.create_planeacion(&ana, "Cálculo").await?;
    let uri = format!("/api/planeaciones/{id}/datos-generales");

    let first = json!({
        "asignatura": "Cálculo Diferencial",
        "periodo": "2024-1",
        "semestre_nivel": "1",
        "sesiones_aula": 30,
        "horas_teoria": 3.0,
        "horas_total": 4.5,
        "proposito": "Introducir límites",
    });
    let (status, _) = app.put(&uri, first, Some(&ana)).await?;
    assert_eq!(status, StatusCode::OK);

    let second = json!({
        "asignatura": "Cálculo Integral",
        "periodo": "2024-2",
        "sesiones_aula": 28,
        "horas_total": 6.0,
    });
    let (status, _) = app.put(&uri, second, Some(&ana)).await?;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.store.datos_generales_count(id).await, 1);

    let (_, body) = app.get(&uri, Some(&ana)).await?;
    let datos = &body["data"];
    assert!(datos["id"].is_i64());
    assert_eq!(datos["asignatura"], "Cálculo Integral");
    assert_eq!(datos["periodo"], "2024-2");
    assert_eq!(datos["sesiones_aula"], 28);
    assert_eq!(datos["horas_total"], 6.0);
    // Fields omitted on the second write are cleared.
    assert!(datos["semestre_nivel"].is_null());
    assert!(datos["horas_teoria"].is_null());
    assert!(datos["proposito"].is_null());

    let (_, doc) = app.get(&format!("/api/planeaciones/{id}"), Some(&ana)).await?;
    assert_eq!(doc["data"]["asignatura"], "Cálculo Integral");
    Ok(())
}

#[tokio::test]
async fn datos_generales_rejects_wrong_types() -> Result<()> {
    let app = TestApp::new().await;
    let (_, ana) = app.signup("Ana Pérez", "ana@x.com").await?;
    let id = app.create_planeacion(&ana, "Cálculo").await?;

    let (status, body) = app
        .put(&format!("/api/planeaciones/{id}/datos-generales"), json!({ "sesiones_aula": "treinta" }), Some(&ana))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}
