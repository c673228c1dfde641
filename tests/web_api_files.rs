//! Web API File Tests
//!
//! Integration tests for upload, download, listing, signed links and deletion.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::multipart::MultipartForm;
use common::{bearer, create_test_server, token_for, TestContext};
use serde_json::Value;

/// Start an upload for `user` and return the response body.
async fn upload_file(ctx: &TestContext, user: &str, name: &str) -> Value {
    let response = ctx
        .server
        .post("/upload")
        .add_header(AUTHORIZATION, bearer(&token_for(user)))
        .multipart(
            MultipartForm::new()
                .add_text("file_name", name)
                .add_text("mime_type", "text/plain")
                .add_text("file_size", "12"),
        )
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

fn file_id(body: &Value) -> String {
    body["file_id"].as_str().unwrap().to_string()
}

async fn list_files(ctx: &TestContext, user: &str, query: &str) -> Value {
    let response = ctx
        .server
        .get(&format!("/files{query}"))
        .add_header(AUTHORIZATION, bearer(&token_for(user)))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

// ============================================================================
// Upload
// ============================================================================

#[tokio::test]
async fn test_upload() {
    let ctx = create_test_server().await;

    let response = ctx
        .server
        .post("/upload")
        .add_header(AUTHORIZATION, bearer(&token_for("U")))
        .multipart(
            MultipartForm::new()
                .add_text("file_name", "report.pdf")
                .add_text("mime_type", "application/pdf")
                .add_text("file_size", "2048"),
        )
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["success"], true);

    let id = file_id(&body);
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let expected_key = format!("uploads/U/{today}/{id}-report.pdf");
    assert_eq!(body["file_path"], expected_key.as_str());

    let upload_url = body["upload_url"].as_str().unwrap();
    assert!(upload_url.starts_with("memory://files/uploads/U/"));
    assert!(upload_url.contains("op=write"));
    assert!(upload_url.contains("content-type=application%2Fpdf"));

    assert_eq!(ctx.row_count().await, 1);
}

#[tokio::test]
async fn test_upload_unparseable_size_counts_as_zero() {
    let ctx = create_test_server().await;

    let response = ctx
        .server
        .post("/upload")
        .add_header(AUTHORIZATION, bearer(&token_for("U")))
        .multipart(
            MultipartForm::new()
                .add_text("file_name", "notes.txt")
                .add_text("file_size", "about a megabyte"),
        )
        .await;
    response.assert_status_ok();
    let id = file_id(&response.json::<Value>());

    let response = ctx
        .server
        .get("/download")
        .add_query_param("file_id", &id)
        .add_header(AUTHORIZATION, bearer(&token_for("U")))
        .await;
    let body = response.json::<Value>();
    assert_eq!(body["file_metadata"]["file_size"], 0);
    assert_eq!(body["file_metadata"]["mime_type"], Value::Null);
}

#[tokio::test]
async fn test_upload_missing_file_name() {
    let ctx = create_test_server().await;

    let response = ctx
        .server
        .post("/upload")
        .add_header(AUTHORIZATION, bearer(&token_for("U")))
        .multipart(MultipartForm::new().add_text("mime_type", "text/plain"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "file_name is required");
    assert_eq!(body["code"], "BAD_REQUEST");
    assert_eq!(ctx.objects.presign_calls(), 0);
    assert_eq!(ctx.row_count().await, 0);
}

#[tokio::test]
async fn test_upload_control_characters_rejected() {
    let ctx = create_test_server().await;

    let response = ctx
        .server
        .post("/upload")
        .add_header(AUTHORIZATION, bearer(&token_for("U")))
        .multipart(MultipartForm::new().add_text("file_name", "evil\r\nname.txt"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "file_name must not contain control characters"
    );
}

#[tokio::test]
async fn test_upload_path_traversal_rejected() {
    let ctx = create_test_server().await;

    for name in ["../../../../bob/2024-03-01/x.pdf", "..\\bob\\x.pdf", "sub/dir.txt"] {
        let response = ctx
            .server
            .post("/upload")
            .add_header(AUTHORIZATION, bearer(&token_for("alice")))
            .multipart(MultipartForm::new().add_text("file_name", name))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["error"],
            "file_name must not contain path separators",
            "{name}"
        );
    }

    assert_eq!(ctx.objects.presign_calls(), 0);
    assert_eq!(ctx.row_count().await, 0);
}

#[tokio::test]
async fn test_upload_name_too_long_for_key() {
    let ctx = create_test_server().await;

    // 255 characters, 1020 bytes
    let name = "\u{1D11E}".repeat(255);
    let response = ctx
        .server
        .post("/upload")
        .add_header(AUTHORIZATION, bearer(&token_for("U")))
        .multipart(MultipartForm::new().add_text("file_name", name))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "file_name is too long");
    assert_eq!(ctx.objects.presign_calls(), 0);
    assert_eq!(ctx.row_count().await, 0);
}

#[tokio::test]
async fn test_upload_requires_multipart_body() {
    let ctx = create_test_server().await;

    let response = ctx
        .server
        .post("/upload")
        .add_header(AUTHORIZATION, bearer(&token_for("U")))
        .json(&serde_json::json!({ "file_name": "a.txt" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["success"], false);
}

#[tokio::test]
async fn test_upload_grant_failure_stores_nothing() {
    let ctx = create_test_server().await;
    ctx.objects.fail_grants_matching("uploads/U/");

    let response = ctx
        .server
        .post("/upload")
        .add_header(AUTHORIZATION, bearer(&token_for("U")))
        .multipart(MultipartForm::new().add_text("file_name", "a.txt"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(body["error"], "Failed to generate signed URL");
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert_eq!(ctx.row_count().await, 0);
}

// ============================================================================
// Download and signed links
// ============================================================================

#[tokio::test]
async fn test_download() {
    let ctx = create_test_server().await;
    let uploaded = upload_file(&ctx, "U", "photo.jpg").await;
    let id = file_id(&uploaded);

    let response = ctx
        .server
        .get("/download")
        .add_query_param("file_id", &id)
        .add_header(AUTHORIZATION, bearer(&token_for("U")))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["success"], true);
    let url = body["download_url"].as_str().unwrap();
    assert!(url.contains("op=read"));

    let meta = &body["file_metadata"];
    assert_eq!(meta["id"], id.as_str());
    assert_eq!(meta["user_id"], "U");
    assert_eq!(meta["file_path"], uploaded["file_path"]);
    assert_eq!(meta["file_name"], "photo.jpg");
    assert_eq!(meta["mime_type"], "text/plain");
    assert_eq!(meta["file_size"], 12);
    assert!(meta["created_at"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_download_missing_file_id() {
    let ctx = create_test_server().await;

    let response = ctx
        .server
        .get("/download")
        .add_header(AUTHORIZATION, bearer(&token_for("U")))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "file_id is required");
}

#[tokio::test]
async fn test_download_unknown_file() {
    let ctx = create_test_server().await;

    let response = ctx
        .server
        .get("/download")
        .add_query_param("file_id", "does-not-exist")
        .add_header(AUTHORIZATION, bearer(&token_for("U")))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body = response.json::<Value>();
    assert_eq!(body["error"], "File not found or access denied");
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_signed_url() {
    let ctx = create_test_server().await;
    let id = file_id(&upload_file(&ctx, "U", "a.txt").await);

    let response = ctx
        .server
        .get(&format!("/files/{id}/signed-url"))
        .add_header(AUTHORIZATION, bearer(&token_for("U")))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["success"], true);
    assert_eq!(body["file_id"], id.as_str());
    assert!(body["file_sign_url"].as_str().unwrap().contains("op=read"));

    let expires = body["file_sign_url_expire"].as_str().unwrap();
    let expires = chrono::DateTime::parse_from_rfc3339(expires).unwrap();
    let remaining = expires.with_timezone(&chrono::Utc) - chrono::Utc::now();
    assert!(remaining <= chrono::Duration::seconds(3600));
    assert!(remaining > chrono::Duration::seconds(3500));
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
async fn test_other_owner_sees_not_found() {
    let ctx = create_test_server().await;
    let id = file_id(&upload_file(&ctx, "alice", "secret.txt").await);
    let bob = bearer(&token_for("bob"));
    let presigns = ctx.objects.presign_calls();

    let download = ctx
        .server
        .get("/download")
        .add_query_param("file_id", &id)
        .add_header(AUTHORIZATION, bob.clone())
        .await;
    let link = ctx
        .server
        .get(&format!("/files/{id}/signed-url"))
        .add_header(AUTHORIZATION, bob.clone())
        .await;
    let delete = ctx
        .server
        .delete(&format!("/files/{id}"))
        .add_header(AUTHORIZATION, bob.clone())
        .await;

    for response in [download, link, delete] {
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(
            response.json::<Value>()["error"],
            "File not found or access denied"
        );
    }

    let listing = list_files(&ctx, "bob", "").await;
    assert_eq!(listing["total"], 0);

    assert_eq!(ctx.objects.presign_calls(), presigns);
    assert_eq!(ctx.objects.delete_calls(), 0);
    assert_eq!(ctx.row_count().await, 1);
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_newest_first_with_links() {
    let ctx = create_test_server().await;
    upload_file(&ctx, "U", "first.txt").await;
    upload_file(&ctx, "U", "second.txt").await;
    upload_file(&ctx, "other", "theirs.txt").await;

    let body = list_files(&ctx, "U", "").await;

    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 2);
    assert_eq!(body["limit"], 50);
    assert_eq!(body["offset"], 0);

    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["file_name"], "second.txt");
    assert_eq!(files[1]["file_name"], "first.txt");
    for file in files {
        assert_eq!(file["user_id"], "U");
        assert!(file["file_sign_url"].as_str().unwrap().contains("op=read"));
        assert!(file["file_sign_url_expire"].is_string());
    }
}

#[tokio::test]
async fn test_list_pagination() {
    let ctx = create_test_server().await;
    for i in 0..5 {
        upload_file(&ctx, "U", &format!("f{i}.txt")).await;
    }

    let body = list_files(&ctx, "U", "?limit=2&offset=1").await;

    assert_eq!(body["total"], 5);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["offset"], 1);
    let names: Vec<_> = body["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["file_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["f3.txt", "f2.txt"]);
}

#[tokio::test]
async fn test_list_clamps_large_limit() {
    let ctx = create_test_server().await;
    for i in 0..101 {
        upload_file(&ctx, "U", &format!("f{i}.txt")).await;
    }

    let body = list_files(&ctx, "U", "?limit=500").await;

    assert_eq!(body["files"].as_array().unwrap().len(), 100);
    assert_eq!(body["limit"], 100);
    assert_eq!(body["total"], 101);
}

#[tokio::test]
async fn test_list_unparseable_params_use_defaults() {
    let ctx = create_test_server().await;
    upload_file(&ctx, "U", "a.txt").await;

    let body = list_files(&ctx, "U", "?limit=lots&offset=soon").await;

    assert_eq!(body["limit"], 50);
    assert_eq!(body["offset"], 0);
    assert_eq!(body["files"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_partial_link_failure() {
    let ctx = create_test_server().await;
    upload_file(&ctx, "U", "good-1.txt").await;
    upload_file(&ctx, "U", "broken.txt").await;
    upload_file(&ctx, "U", "good-2.txt").await;
    ctx.objects.fail_grants_matching("broken.txt");

    let body = list_files(&ctx, "U", "").await;

    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 3);
    for file in files {
        if file["file_name"] == "broken.txt" {
            assert!(file.get("file_sign_url").is_none());
            assert!(file.get("file_sign_url_expire").is_none());
        } else {
            assert!(file["file_sign_url"].is_string());
        }
    }
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_twice() {
    let ctx = create_test_server().await;
    let uploaded = upload_file(&ctx, "U", "a.txt").await;
    let id = file_id(&uploaded);

    let response = ctx
        .server
        .delete(&format!("/files/{id}"))
        .add_header(AUTHORIZATION, bearer(&token_for("U")))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "File deleted successfully");

    let response = ctx
        .server
        .delete(&format!("/files/{id}"))
        .add_header(AUTHORIZATION, bearer(&token_for("U")))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    assert_eq!(
        ctx.objects.deleted_keys(),
        vec![uploaded["file_path"].as_str().unwrap().to_string()]
    );
}

#[tokio::test]
async fn test_delete_when_storage_fails() {
    let ctx = create_test_server().await;
    let id = file_id(&upload_file(&ctx, "U", "a.txt").await);
    ctx.objects.fail_deletes(true);

    let response = ctx
        .server
        .delete(&format!("/files/{id}"))
        .add_header(AUTHORIZATION, bearer(&token_for("U")))
        .await;

    response.assert_status_ok();
    assert_eq!(ctx.objects.delete_calls(), 1);
    assert_eq!(ctx.row_count().await, 0);
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn test_upload_list_delete_flow() {
    let ctx = create_test_server().await;
    let token = bearer(&token_for("U"));

    let response = ctx
        .server
        .post("/upload")
        .add_header(AUTHORIZATION, token.clone())
        .multipart(
            MultipartForm::new()
                .add_text("file_name", "report.pdf")
                .add_text("mime_type", "application/pdf")
                .add_text("file_size", "2048"),
        )
        .await;
    response.assert_status_ok();
    let id = file_id(&response.json::<Value>());

    let body = list_files(&ctx, "U", "").await;
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["id"], id.as_str());
    assert_eq!(files[0]["file_name"], "report.pdf");
    assert_eq!(files[0]["file_size"], 2048);
    assert!(files[0]["file_sign_url"].is_string());

    ctx.server
        .delete(&format!("/files/{id}"))
        .add_header(AUTHORIZATION, token.clone())
        .await
        .assert_status_ok();

    let body = list_files(&ctx, "U", "").await;
    assert_eq!(body["total"], 0);
    assert!(body["files"].as_array().unwrap().is_empty());
}
