//! 群组 API 集成测试

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_creator_becomes_moderator_and_member() {
    let app = TestApp::new();
    let (user_id, token) = app.sign_up("founder").await;

    let group_id = app.create_group(&token, "rustaceans").await;

    let response = app.get(&format!("/api/v1/groups/{}", group_id), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["groupName"], "rustaceans");
    assert_eq!(response.body["moderators"][0]["id"], user_id.as_str());
    assert_eq!(response.body["users"][0]["id"], user_id.as_str());

    let response = app.get("/api/v1/groups", None).await;
    assert_eq!(response.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_group_name_conflicts() {
    let app = TestApp::new();
    let (_, token) = app.sign_up("founder").await;
    app.create_group(&token, "rustaceans").await;

    let response = app
        .post("/api/v1/groups", Some(&token), json!({ "groupName": "rustaceans" }))
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_subscribe_is_idempotent() {
    let app = TestApp::new();
    let (_, founder) = app.sign_up("founder").await;
    let (_, fan) = app.sign_up("fan").await;
    let group_id = app.create_group(&founder, "rustaceans").await;
    let uri = format!("/api/v1/groups/{}/subscribe", group_id);

    let response = app.post(&uri, Some(&fan), json!({})).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let response = app.post(&uri, Some(&fan), json!({})).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app.get(&format!("/api/v1/groups/{}", group_id), None).await;
    assert_eq!(response.body["users"].as_array().unwrap().len(), 2);

    let response = app.delete(&uri, Some(&fan)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let response = app.delete(&uri, Some(&fan)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app.get(&format!("/api/v1/groups/{}", group_id), None).await;
    assert_eq!(response.body["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_subscribe_requires_token() {
    let app = TestApp::new();
    let (_, founder) = app.sign_up("founder").await;
    let group_id = app.create_group(&founder, "rustaceans").await;

    let response = app
        .post(&format!("/api/v1/groups/{}/subscribe", group_id), None, json!({}))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_moderator_cannot_manage_group() {
    let app = TestApp::new();
    let (_, founder) = app.sign_up("founder").await;
    let (outsider_id, outsider) = app.sign_up("outsider").await;
    let group_id = app.create_group(&founder, "rustaceans").await;

    let response = app
        .post(
            &format!("/api/v1/groups/{}/moderators", group_id),
            Some(&outsider),
            json!({ "userId": outsider_id }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .put(
            &format!("/api/v1/groups/{}", group_id),
            Some(&outsider),
            json!({ "description": "taken over" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .delete(&format!("/api/v1/groups/{}", group_id), Some(&outsider))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_last_moderator_cannot_be_removed() {
    let app = TestApp::new();
    let (founder_id, founder) = app.sign_up("founder").await;
    let group_id = app.create_group(&founder, "rustaceans").await;

    let response = app
        .delete(
            &format!("/api/v1/groups/{}/moderators/{}", group_id, founder_id),
            Some(&founder),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = app.get(&format!("/api/v1/groups/{}", group_id), None).await;
    assert_eq!(response.body["moderators"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_moderator_handover() {
    let app = TestApp::new();
    let (founder_id, founder) = app.sign_up("founder").await;
    let (heir_id, heir) = app.sign_up("heir").await;
    let group_id = app.create_group(&founder, "rustaceans").await;

    let response = app
        .post(
            &format!("/api/v1/groups/{}/moderators", group_id),
            Some(&founder),
            json!({ "userId": heir_id }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    // The new moderator may now remove the founder
    let response = app
        .delete(
            &format!("/api/v1/groups/{}/moderators/{}", group_id, founder_id),
            Some(&heir),
        )
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app
        .put(
            &format!("/api/v1/groups/{}", group_id),
            Some(&founder),
            json!({ "description": "still mine?" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.get(&format!("/api/v1/groups/{}", group_id), None).await;
    let moderators = response.body["moderators"].as_array().unwrap();
    assert_eq!(moderators.len(), 1);
    assert_eq!(moderators[0]["id"], heir_id.as_str());
}

#[tokio::test]
async fn test_add_unknown_user_as_moderator() {
    let app = TestApp::new();
    let (_, founder) = app.sign_up("founder").await;
    let group_id = app.create_group(&founder, "rustaceans").await;

    let response = app
        .post(
            &format!("/api/v1/groups/{}/moderators", group_id),
            Some(&founder),
            json!({ "userId": "00000000-0000-0000-0000-000000000000" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_moderator_updates_and_deletes_group() {
    let app = TestApp::new();
    let (_, founder) = app.sign_up("founder").await;
    let group_id = app.create_group(&founder, "rustaceans").await;
    let uri = format!("/api/v1/groups/{}", group_id);

    let response = app
        .put(
            &uri,
            Some(&founder),
            json!({ "groupName": "ferris-fans", "description": "crabs welcome" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["groupName"], "ferris-fans");
    assert_eq!(response.body["description"], "crabs welcome");

    let response = app.delete(&uri, Some(&founder)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app.get(&uri, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_group_posts_are_filterable() {
    let app = TestApp::new();
    let (_, token) = app.sign_up("founder").await;
    let group_id = app.create_group(&token, "rustaceans").await;

    app.create_post(&token, "outside").await;
    let response = app
        .post(
            "/api/v1/posts",
            Some(&token),
            json!({ "content": "inside", "groupId": group_id }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let response = app
        .get(&format!("/api/v1/posts?groupId={}", group_id), None)
        .await;
    let posts = response.body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["content"], "inside");
    assert_eq!(response.body["totalCount"], 1);
}
