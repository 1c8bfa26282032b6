//! Permission identifiers granted to users and declared on routes.

pub const VIEW_PROFILE: &str = "view-profile";

pub const VIEW_USER: &str = "view-user";
pub const CREATE_USER: &str = "create-user";
pub const EDIT_USER: &str = "edit-user";
pub const DELETE_USER: &str = "delete-user";

pub const CREATE_LANGUAGE: &str = "create-language";
pub const EDIT_LANGUAGE: &str = "edit-language";
pub const DELETE_LANGUAGE: &str = "delete-language";

pub const CREATE_CATEGORY: &str = "create-category";
pub const EDIT_CATEGORY: &str = "edit-category";
pub const DELETE_CATEGORY: &str = "delete-category";

pub const VIEW_STORY: &str = "view-story";
pub const CREATE_STORY: &str = "create-story";
pub const EDIT_STORY: &str = "edit-story";
pub const DELETE_STORY: &str = "delete-story";

pub const VIEW_QUESTION: &str = "view-question";
pub const CREATE_QUESTION: &str = "create-question";
pub const EDIT_QUESTION: &str = "edit-question";
pub const DELETE_QUESTION: &str = "delete-question";

pub const CREATE_COMMENT: &str = "create-comment";
pub const DELETE_COMMENT: &str = "delete-comment";

pub const VIEW_NOTIFICATION: &str = "view-notification";
pub const SEND_NOTIFICATION: &str = "send-notification";
pub const DELETE_NOTIFICATION: &str = "delete-notification";

/// Granted to self-registered readers.
pub const DEFAULT_USER_PERMISSIONS: &[&str] = &[VIEW_PROFILE, CREATE_COMMENT];

/// Every permission known to the API; granted to the bootstrap admin.
pub const ALL: &[&str] = &[
    VIEW_PROFILE,
    VIEW_USER,
    CREATE_USER,
    EDIT_USER,
    DELETE_USER,
    CREATE_LANGUAGE,
    EDIT_LANGUAGE,
    DELETE_LANGUAGE,
    CREATE_CATEGORY,
    EDIT_CATEGORY,
    DELETE_CATEGORY,
    VIEW_STORY,
    CREATE_STORY,
    EDIT_STORY,
    DELETE_STORY,
    VIEW_QUESTION,
    CREATE_QUESTION,
    EDIT_QUESTION,
    DELETE_QUESTION,
    CREATE_COMMENT,
    DELETE_COMMENT,
    VIEW_NOTIFICATION,
    SEND_NOTIFICATION,
    DELETE_NOTIFICATION,
];

pub fn owned(permissions: &[&str]) -> Vec<String> {
    permissions.iter().map(|p| p.to_string()).collect()
}
