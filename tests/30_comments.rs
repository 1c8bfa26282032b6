mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use common::TestApp;

async fn post_comment(app: &TestApp, token: &str, story_id: Uuid, body: &str, parent: Option<&str>) -> Result<Value> {
    let (status, response) = app
        .request(
            Method::POST,
            "/comments",
            Some(token),
            Some(json!({ "story_id": story_id, "body": body, "parent_id": parent })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", response);
    Ok(response["data"].clone())
}

fn bodies(response: &Value) -> Vec<String> {
    response["data"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|c| c["body"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn comment_pages_honour_limit_and_skip() -> Result<()> {
    let app = TestApp::new()?;
    let story = app.seed_story("Daniel").await?;
    let (_, token) = app.user_with("reader@example.com", &["create-comment"]).await?;

    for n in 1..=5 {
        post_comment(&app, &token, story.id, &format!("comment {}", n), None).await?;
    }

    let (status, first) = app.get(&format!("/comments/{}?limit=2&skip=0", story.id), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bodies(&first), vec!["comment 1", "comment 2"]);

    let (_, last) = app.get(&format!("/comments/{}?limit=2&skip=4", story.id), None).await?;
    assert_eq!(bodies(&last), vec!["comment 5"]);

    let (_, all) = app.get(&format!("/comments/{}", story.id), None).await?;
    assert_eq!(bodies(&all).len(), 5);
    Ok(())
}

#[tokio::test]
async fn replies_are_scoped_to_their_parent() -> Result<()> {
    let app = TestApp::new()?;
    let story = app.seed_story("David").await?;
    let (_, token) = app.user_with("reader@example.com", &["create-comment"]).await?;

    let first = post_comment(&app, &token, story.id, "first", None).await?;
    let second = post_comment(&app, &token, story.id, "second", None).await?;
    let first_id = first["id"].as_str().unwrap_or_default().to_string();
    let second_id = second["id"].as_str().unwrap_or_default().to_string();

    post_comment(&app, &token, story.id, "reply to first", Some(&first_id)).await?;
    post_comment(&app, &token, story.id, "reply to second", Some(&second_id)).await?;

    let (_, replies) = app.get(&format!("/comment-replies/{}", first_id), None).await?;
    assert_eq!(bodies(&replies), vec!["reply to first"]);

    // Replies do not show up among top-level comments
    let (_, top_level) = app.get(&format!("/comments/{}", story.id), None).await?;
    assert_eq!(bodies(&top_level), vec!["first", "second"]);
    Ok(())
}

#[tokio::test]
async fn replies_cannot_be_nested() -> Result<()> {
    let app = TestApp::new()?;
    let story = app.seed_story("Esther").await?;
    let (_, token) = app.user_with("reader@example.com", &["create-comment"]).await?;

    let parent = post_comment(&app, &token, story.id, "parent", None).await?;
    let parent_id = parent["id"].as_str().unwrap_or_default().to_string();
    let reply = post_comment(&app, &token, story.id, "reply", Some(&parent_id)).await?;

    let (status, _) = app
        .request(
            Method::POST,
            "/comments",
            Some(&token),
            Some(json!({ "story_id": story.id, "body": "nested", "parent_id": reply["id"] })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn deleting_a_comment_removes_its_replies() -> Result<()> {
    let app = TestApp::new()?;
    let story = app.seed_story("Samson").await?;
    let (_, reader) = app.user_with("reader@example.com", &["create-comment"]).await?;
    let (_, moderator) = app.user_with("moderator@example.com", &["delete-comment"]).await?;

    let parent = post_comment(&app, &reader, story.id, "parent", None).await?;
    let parent_id = parent["id"].as_str().unwrap_or_default().to_string();
    post_comment(&app, &reader, story.id, "reply", Some(&parent_id)).await?;

    let (status, _) = app
        .request(Method::DELETE, &format!("/comment/{}", parent_id), Some(&reader), None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(Method::DELETE, &format!("/comment/{}", parent_id), Some(&moderator), None)
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (_, replies) = app.get(&format!("/comment-replies/{}", parent_id), None).await?;
    assert!(bodies(&replies).is_empty());
    Ok(())
}
