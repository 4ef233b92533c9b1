//! Drives the full router against an in-memory database

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use roster_api::{ApiServer, ApiServerConfig};
use roster_core::{NewOperator, OperatorIdentity, Roster};
use serde_json::{json, Value};
use tower::ServiceExt; // For oneshot()

const ADMIN_PASSWORD: &str = "correct-horse";

/// Migrated database with one operator account, plus the router over it
async fn setup_app() -> (Router, Roster) {
    let db = roster_db::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    roster_db::migrate(&db).await.expect("Failed to run migrations");

    let roster = Roster::new(db.clone());
    roster
        .operators()
        .create(
            &OperatorIdentity::system(),
            NewOperator {
                username: "admin".to_string(),
                password: ADMIN_PASSWORD.to_string(),
                full_name: "Portal Admin".to_string(),
                email: None,
            },
        )
        .await
        .unwrap();

    let config = ApiServerConfig {
        jwt_secret: "test-secret".to_string(),
        ..Default::default()
    };
    let app = ApiServer::new(config, db).build_router();
    (app, roster)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body.to_vec())
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn delete(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn login(app: &Router) -> String {
    let (status, _, body) = send(
        app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"username": "admin", "password": ADMIN_PASSWORD}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    body["token"].as_str().unwrap().to_string()
}

/// Create an owner and a person, then regenerate so the owner has "Team A"
async fn seed_team(app: &Router, token: &str) -> i64 {
    let (status, _, body) = send(
        app,
        json_request("POST", "/api/owners", Some(token), json!({"name": "Ravi"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let owner: Value = serde_json::from_slice(&body).unwrap();

    let (status, _, body) = send(
        app,
        json_request(
            "POST",
            "/api/teams/regenerate",
            Some(token),
            json!({"owner_ids": [owner["id"]]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let report: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["message"], "created 1 of 1 teams");
    report["teams"][0]["id"].as_i64().unwrap()
}

async fn add_person(app: &Router, token: &str, serial: i64, name: &str) -> StatusCode {
    let (status, _, _) = send(
        app,
        json_request(
            "POST",
            "/api/people",
            Some(token),
            json!({"serial_number": serial, "full_name": name, "mobile_number": "9876543210"}),
        ),
    )
    .await;
    status
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = setup_app().await;

    let (status, _, body) = send(&app, get("/api/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_mutations_require_session() {
    let (app, _) = setup_app().await;

    let (status, _, body) = send(
        &app,
        json_request("POST", "/api/owners", None, json!({"name": "Ravi"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["code"], "MISSING_AUTH");
}

#[tokio::test]
async fn test_login_sets_http_only_cookie() {
    let (app, _) = setup_app().await;

    let (status, headers, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"username": "admin", "password": ADMIN_PASSWORD}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let cookie = headers
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session_token="));
    assert!(cookie.contains("HttpOnly"));

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["operator"]["username"], "admin");
    assert!(body["operator"].get("password_hash").is_none());

    // The cookie alone authenticates
    let session = cookie.split(';').next().unwrap().to_string();
    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::COOKIE, session)
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let me: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(me["full_name"], "Portal Admin");
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let (app, _) = setup_app().await;

    let (status, _, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"username": "admin", "password": "nope-nope"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "Invalid username or password.");
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_person_lifecycle() {
    let (app, _) = setup_app().await;
    let token = login(&app).await;

    assert_eq!(add_person(&app, &token, 12, "Asha Rao").await, StatusCode::CREATED);
    assert_eq!(add_person(&app, &token, 12, "Other").await, StatusCode::CONFLICT);
    assert_eq!(add_person(&app, &token, 0, "Zero").await, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(&app, get("/api/people", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let list: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(list["total"], 1);
    let id = list["people"][0]["id"].as_i64().unwrap();

    let (status, _, _) = send(&app, delete(&format!("/api/people/{}", id), &token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = send(&app, delete(&format!("/api/people/{}", id), &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_assigned_person_cannot_be_deleted() {
    let (app, roster) = setup_app().await;
    let token = login(&app).await;
    let team_id = seed_team(&app, &token).await;
    add_person(&app, &token, 7, "Kiran").await;

    let (status, _, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/teams/{}/members", team_id),
            Some(&token),
            json!({"serial_number": 7}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let person = roster.people().lookup_by_serial(7).await.unwrap().unwrap();
    let (status, _, body) = send(&app, delete(&format!("/api/people/{}", person.id), &token)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["code"], "PERSON_IN_TEAM");
}

#[tokio::test]
async fn test_cross_team_membership_conflict() {
    let (app, _) = setup_app().await;
    let token = login(&app).await;

    for name in ["Ravi", "Meena"] {
        send(
            &app,
            json_request("POST", "/api/owners", Some(&token), json!({"name": name})),
        )
        .await;
    }
    let (_, _, body) = send(&app, get("/api/owners", Some(&token))).await;
    let owners: Value = serde_json::from_slice(&body).unwrap();
    let owner_ids: Vec<Value> = owners["owners"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].clone())
        .collect();

    let (_, _, body) = send(
        &app,
        json_request(
            "POST",
            "/api/teams/regenerate",
            Some(&token),
            json!({"owner_ids": owner_ids}),
        ),
    )
    .await;
    let report: Value = serde_json::from_slice(&body).unwrap();
    let team_a = report["teams"][0]["id"].as_i64().unwrap();
    let team_b = report["teams"][1]["id"].as_i64().unwrap();

    add_person(&app, &token, 3, "Dev").await;
    let (status, _, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/teams/{}/members", team_a),
            Some(&token),
            json!({"serial_number": 3}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/teams/{}/members", team_b),
            Some(&token),
            json!({"serial_number": 3}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "This person is already assigned to a team.");
    assert_eq!(body["code"], "ALREADY_ASSIGNED");
}

#[tokio::test]
async fn test_regenerate_rejects_unknown_owners() {
    let (app, _) = setup_app().await;
    let token = login(&app).await;
    seed_team(&app, &token).await;

    let (status, _, body) = send(
        &app,
        json_request(
            "POST",
            "/api/teams/regenerate",
            Some(&token),
            json!({"owner_ids": [4040]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["code"], "INVALID_OWNER_IDS");

    // Existing teams are untouched
    let (_, _, body) = send(&app, get("/api/teams", None)).await;
    let teams: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(teams["total"], 1);
    assert_eq!(teams["teams"][0]["name"], "Team A");
}

#[tokio::test]
async fn test_regenerate_rejects_captain_count_mismatch() {
    let (app, roster) = setup_app().await;
    let token = login(&app).await;
    seed_team(&app, &token).await;
    add_person(&app, &token, 5, "Asha").await;
    let owner_id = roster.owners().list_all().await.unwrap()[0].id;

    for captains in [json!([null, 5]), json!([5, null, null])] {
        let (status, _, body) = send(
            &app,
            json_request(
                "POST",
                "/api/teams/regenerate",
                Some(&token),
                json!({"owner_ids": [owner_id], "captain_serials": captains}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["code"], "CAPTAIN_COUNT_MISMATCH");
    }

    let teams = roster.teams().list_with_owners().await.unwrap();
    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].captain_serial_number, None);
}

#[tokio::test]
async fn test_captain_cannot_be_deleted() {
    let (app, roster) = setup_app().await;
    let token = login(&app).await;
    seed_team(&app, &token).await;
    add_person(&app, &token, 5, "Asha").await;
    let owner_id = roster.owners().list_all().await.unwrap()[0].id;

    let (status, _, _) = send(
        &app,
        json_request(
            "POST",
            "/api/teams/regenerate",
            Some(&token),
            json!({"owner_ids": [owner_id], "captain_serials": [5]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let person = roster.people().lookup_by_serial(5).await.unwrap().unwrap();
    let (status, _, body) = send(&app, delete(&format!("/api/people/{}", person.id), &token)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["code"], "PERSON_IS_CAPTAIN");
    assert!(roster.people().lookup_by_serial(5).await.unwrap().is_some());
}

#[tokio::test]
async fn test_team_views_by_slug() {
    let (app, _) = setup_app().await;
    let token = login(&app).await;
    seed_team(&app, &token).await;

    let (status, _, body) = send(&app, get("/api/teams/by-slug/a", None)).await;
    assert_eq!(status, StatusCode::OK);
    let detail: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(detail["team"]["name"], "Team A");
    assert_eq!(detail["team"]["owner_name"], "Ravi");

    let (status, _, _) = send(&app, get("/t/a", None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, headers, _) = send(&app, get("/t/zz", None)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get(header::LOCATION).unwrap(), "/api/teams");

    let (status, _, _) = send(&app, get("/t/a1", None)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_csv_export() {
    let (app, _) = setup_app().await;
    let token = login(&app).await;
    let team_id = seed_team(&app, &token).await;
    add_person(&app, &token, 21, "Lata, M").await;
    send(
        &app,
        json_request(
            "POST",
            &format!("/api/teams/{}/members", team_id),
            Some(&token),
            json!({"serial_number": 21}),
        ),
    )
    .await;

    let (status, headers, body) =
        send(&app, get(&format!("/api/teams/{}/export", team_id), Some(&token))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    let disposition = headers
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.contains("filename=\"Team_A_"));

    assert_eq!(&body[..3], &[0xEF, 0xBB, 0xBF]);
    let text = String::from_utf8(body[3..].to_vec()).unwrap();
    assert!(text.starts_with("Team Name,Owner,Total Members,Export Date\r\n"));
    assert!(text.contains("1,21,\"Lata, M\",9876543210,-"));

    let (status, headers, body) = send(
        &app,
        get(
            &format!("/api/teams/{}/export?format=print", team_id),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(String::from_utf8(body).unwrap().contains("Lata, M"));
}

#[tokio::test]
async fn test_owner_delete_reports_cascade() {
    let (app, _) = setup_app().await;
    let token = login(&app).await;
    let team_id = seed_team(&app, &token).await;
    add_person(&app, &token, 5, "Nila").await;
    send(
        &app,
        json_request(
            "POST",
            &format!("/api/teams/{}/members", team_id),
            Some(&token),
            json!({"serial_number": 5}),
        ),
    )
    .await;

    let (_, _, body) = send(&app, get("/api/owners", Some(&token))).await;
    let owners: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(owners["owners"][0]["team_count"], 1);
    let owner_id = owners["owners"][0]["id"].as_i64().unwrap();

    let (status, _, body) = send(&app, delete(&format!("/api/owners/{}", owner_id), &token)).await;
    assert_eq!(status, StatusCode::OK);
    let removal: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(removal["teams_removed"], 1);
    assert_eq!(removal["memberships_removed"], 1);

    let (_, _, body) = send(&app, get("/api/stats", Some(&token))).await;
    let stats: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(stats["teams"], 0);
    assert_eq!(stats["people"], 1);
    assert_eq!(stats["unassigned_people"], 1);
}

#[tokio::test]
async fn test_import_and_sample() {
    let (app, _) = setup_app().await;
    let token = login(&app).await;

    let (status, _, body) = send(
        &app,
        json_request(
            "POST",
            "/api/people/import",
            Some(&token),
            json!({"text": "E1, 100, Maya Iyer, 9000000001\nE2, 100, Repeat, 9000000002\njunk"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let report: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["added"], 1);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["messages"][0], "SR No 100 already exists");

    let (status, _, body) = send(
        &app,
        json_request("POST", "/api/people/sample", Some(&token), json!({"count": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let sample: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(sample["inserted"], 3);
    assert_eq!(sample["skipped"], 0);
}

#[tokio::test]
async fn test_operator_cannot_delete_self() {
    let (app, roster) = setup_app().await;
    let token = login(&app).await;
    let me = roster.operators().list().await.unwrap().remove(0);

    let (status, _, body) = send(&app, delete(&format!("/api/operators/{}", me.id), &token)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["code"], "SELF_DELETION");
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let (app, _) = setup_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"));
}
