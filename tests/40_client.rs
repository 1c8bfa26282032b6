mod common;

use anyhow::Result;
use std::sync::Arc;

use bible_stories_api::client::{hooks, AdminClient};
use bible_stories_api::database::models::{CommentInput, LanguageInput, StoryQuestionInput};
use bible_stories_api::types::Page;
use common::{TestApp, PASSWORD};

async fn client_with(app: &TestApp, email: &str, permissions: &[&str]) -> Result<AdminClient> {
    let (_, token) = app.user_with(email, permissions).await?;
    let base_url = app.spawn().await?;
    Ok(AdminClient::new(base_url, Some(token))?)
}

#[tokio::test]
async fn hooks_on_the_same_key_share_one_entry() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_language("en").await?;
    let client = client_with(&app, "admin@example.com", &["create-language"]).await?;

    let mut first = hooks::use_languages(client.cache());
    let mut second = hooks::use_languages(client.cache());
    assert_eq!(client.cache().len(), 1);

    let a = first.settled().await;
    let b = second.settled().await;
    assert!(!a.is_loading);
    assert_eq!(a.data.len(), 1);
    assert_eq!(a.data, b.data);

    // Memoized until the entry changes
    assert!(Arc::ptr_eq(&first.state(), &first.state()));
    Ok(())
}

#[tokio::test]
async fn empty_category_list_settles_as_empty() -> Result<()> {
    let app = TestApp::new()?;
    let client = client_with(&app, "reader@example.com", &[]).await?;

    let mut categories = hooks::use_categories(client.cache());
    let state = categories.settled().await;
    assert!(state.data.is_empty());
    assert!(state.is_empty);
    assert!(!state.is_loading);
    assert!(state.error.is_none());
    Ok(())
}

#[tokio::test]
async fn writes_through_the_client_refresh_cached_lists() -> Result<()> {
    let app = TestApp::new()?;
    let client = client_with(&app, "admin@example.com", &["create-language", "delete-language"]).await?;

    let mut languages = hooks::use_languages(client.cache());
    let state = languages.settled().await;
    assert!(state.is_empty);

    let created = client
        .create_language(&LanguageInput {
            name: "Swahili".to_string(),
            code: "sw".to_string(),
            is_active: true,
        })
        .await?;

    let state = languages.settled().await;
    assert!(!state.is_empty);
    assert_eq!(state.data.first().map(|l| l.code.as_str()), Some("sw"));

    let mut detail = hooks::use_language(client.cache(), Some(created.id));
    assert_eq!(detail.settled().await.data.as_ref().map(|l| l.id), Some(created.id));

    client.delete_language(created.id).await?;
    assert!(languages.settled().await.is_empty);
    let detail = detail.settled().await;
    assert_eq!(detail.error.as_ref().and_then(|e| e.status()), Some(404));
    Ok(())
}

#[tokio::test]
async fn moving_a_question_refreshes_both_story_lists() -> Result<()> {
    let app = TestApp::new()?;
    let from = app.seed_story("Joseph").await?;
    let to = app.seed_story("Benjamin").await?;
    let client = client_with(&app, "editor@example.com", &["create-question", "edit-question"]).await?;

    let mut input = StoryQuestionInput {
        story_id: from.id,
        question: "Who was sold into Egypt?".to_string(),
        options: vec!["Joseph".to_string(), "Reuben".to_string()],
        answer_index: 0,
    };
    let question = client.create_story_question(&input).await?;

    let mut from_list = hooks::use_story_questions(client.cache(), Some(from.id));
    let mut to_list = hooks::use_story_questions(client.cache(), Some(to.id));
    assert_eq!(from_list.settled().await.data.len(), 1);
    assert!(to_list.settled().await.is_empty);

    input.story_id = to.id;
    client.update_story_question(question.id, &input).await?;

    assert!(from_list.settled().await.is_empty);
    let moved = to_list.settled().await;
    assert_eq!(moved.data.iter().map(|q| q.id).collect::<Vec<_>>(), vec![question.id]);
    Ok(())
}

#[tokio::test]
async fn mutate_picks_up_changes_made_elsewhere() -> Result<()> {
    let app = TestApp::new()?;
    let story = app.seed_story("Noah").await?;
    let client = client_with(&app, "reader@example.com", &[]).await?;

    let mut stories = hooks::use_stories(client.cache());
    assert_eq!(stories.settled().await.data.len(), 1);

    app.seed_story("Abraham").await?;

    // Still the cached list until someone revalidates it
    assert_eq!(stories.state().data.len(), 1);

    stories.mutate();
    let state = stories.settled().await;
    assert_eq!(state.data.len(), 2);
    assert!(state.data.iter().any(|s| s.id == story.id));
    Ok(())
}

#[tokio::test]
async fn rejected_reads_are_stored_as_errors() -> Result<()> {
    let app = TestApp::new()?;
    let client = client_with(&app, "reader@example.com", &["view-profile"]).await?;

    let mut users = hooks::use_users(client.cache());
    let state = users.settled().await;
    assert_eq!(state.error.as_ref().and_then(|e| e.status()), Some(403));
    assert!(state.data.is_empty());
    assert!(!state.is_loading);
    assert!(!state.is_validating);
    Ok(())
}

#[tokio::test]
async fn absent_ids_never_fetch() -> Result<()> {
    let app = TestApp::new()?;
    let client = client_with(&app, "reader@example.com", &[]).await?;

    let mut story = hooks::use_story(client.cache(), None);
    assert!(story.key().is_none());
    assert!(!story.changed().await);

    let state = story.state();
    assert!(state.data.is_none());
    assert!(!state.is_loading);
    assert!(state.error.is_none());
    assert!(client.cache().is_empty());
    Ok(())
}

#[tokio::test]
async fn new_comments_refresh_every_page_of_the_story() -> Result<()> {
    let app = TestApp::new()?;
    let story = app.seed_story("Gideon").await?;
    let client = client_with(&app, "reader@example.com", &["create-comment"]).await?;

    let mut first_page = hooks::use_comments(client.cache(), Some(story.id), Page::new(2, 0));
    assert!(first_page.settled().await.is_empty);

    for body in ["one", "two", "three"] {
        client
            .create_comment(&CommentInput {
                story_id: story.id,
                body: body.to_string(),
                parent_id: None,
            })
            .await?;
    }

    let state = first_page.settled().await;
    let bodies: Vec<&str> = state.data.iter().map(|c| c.body.as_str()).collect();
    assert_eq!(bodies, vec!["one", "two"]);
    Ok(())
}

#[tokio::test]
async fn login_switches_the_client_identity() -> Result<()> {
    let app = TestApp::new()?;
    app.user_with("miriam@example.com", &["view-profile"]).await?;
    let base_url = app.spawn().await?;
    let client = AdminClient::new(base_url, None)?;

    assert_eq!(client.whoami().await.err().and_then(|e| e.status()), Some(401));

    let session = client.login("miriam@example.com", PASSWORD).await?;
    assert_eq!(session.user.email, "miriam@example.com");

    let principal = client.whoami().await?;
    assert_eq!(principal.email, "miriam@example.com");
    assert_eq!(principal.permissions, vec!["view-profile".to_string()]);
    Ok(())
}
