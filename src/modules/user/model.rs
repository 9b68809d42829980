use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::modules::user::schema::UserEntity;

pub const MIN_AGE_YEARS: i32 = 13;

fn validate_username(username: &str) -> Result<(), ValidationError> {
    let valid_chars = username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid_chars {
        return Err(ValidationError::new("username")
            .with_message("Username may only contain letters, digits, '_' and '-'".into()));
    }
    Ok(())
}

const PASSWORD_SPECIALS: &str = "@$!%*?&";

fn validate_password(password: &str) -> Result<(), ValidationError> {
    let allowed =
        password.chars().all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c));
    if !allowed {
        return Err(ValidationError::new("password").with_message(
            "Password may only contain letters, digits and @$!%*?&".into(),
        ));
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if !(has_lower && has_upper && has_digit && has_special) {
        return Err(ValidationError::new("password").with_message(
            "Password must contain upper and lower case letters, a digit and one of @$!%*?&"
                .into(),
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if !name.chars().all(|c| c.is_alphabetic() || c == ' ' || c == '-') {
        return Err(ValidationError::new("name")
            .with_message("Names may only contain letters, spaces and '-'".into()));
    }
    Ok(())
}

fn validate_min_age(birth_date: &NaiveDate) -> Result<(), ValidationError> {
    let today = Utc::now().date_naive();
    let limit = today
        .with_year(today.year() - MIN_AGE_YEARS)
        // 29 February
        .or_else(|| today.pred_opt().and_then(|d| d.with_year(d.year() - MIN_AGE_YEARS)));

    match limit {
        Some(limit) if *birth_date <= limit => Ok(()),
        _ => Err(ValidationError::new("age")
            .with_message(format!("User must be at least {MIN_AGE_YEARS} years old").into())),
    }
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpModel {
    #[validate(
        length(min = 3, max = 16, message = "Username must be 3 to 16 characters long"),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters long"),
        custom(function = "validate_password"),
        must_match(other = "password_confirmation", message = "Passwords do not match")
    )]
    pub password: String,
    pub password_confirmation: String,
    #[validate(
        length(min = 1, max = 100, message = "First name must be 1 to 100 characters long"),
        custom(function = "validate_name")
    )]
    pub first_name: String,
    #[validate(
        length(min = 1, max = 100, message = "Last name must be 1 to 100 characters long"),
        custom(function = "validate_name")
    )]
    pub last_name: String,
    #[validate(custom(function = "validate_min_age"))]
    pub birth_date: NaiveDate,
}

#[derive(Deserialize, Validate)]
pub struct SignInModel {
    /// Username or email.
    #[validate(length(min = 3, message = "Identifier must be at least 3 characters long"))]
    pub identifier: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserModel {
    #[validate(
        length(min = 3, max = 16, message = "Username must be 3 to 16 characters long"),
        custom(function = "validate_username")
    )]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(
        length(min = 1, max = 100, message = "First name must be 1 to 100 characters long"),
        custom(function = "validate_name")
    )]
    pub first_name: Option<String>,
    #[validate(
        length(min = 1, max = 100, message = "Last name must be 1 to 100 characters long"),
        custom(function = "validate_name")
    )]
    pub last_name: Option<String>,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordModel {
    #[validate(length(min = 1, message = "Old password cannot be empty"))]
    pub old_password: String,
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters long"),
        custom(function = "validate_password"),
        must_match(other = "password_confirmation", message = "Passwords do not match")
    )]
    pub password: String,
    pub password_confirmation: String,
}

pub struct InsertUser {
    pub username: String,
    pub email: String,
    pub hash_password: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
}

#[derive(Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
    }
}

impl From<UpdateUserModel> for UpdateUser {
    fn from(model: UpdateUserModel) -> Self {
        UpdateUser {
            username: model.username,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub avatar_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserEntity> for UserResponse {
    fn from(entity: UserEntity) -> Self {
        UserResponse {
            id: entity.id,
            username: entity.username,
            email: entity.email,
            first_name: entity.first_name,
            last_name: entity.last_name,
            birth_date: entity.birth_date,
            avatar_url: entity.avatar_url,
            created_at: entity.created_at,
        }
    }
}

/// Profile fields any authenticated user may see about another one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PublicUserResponse {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
}

impl From<UserEntity> for PublicUserResponse {
    fn from(entity: UserEntity) -> Self {
        PublicUserResponse {
            id: entity.id,
            username: entity.username,
            first_name: entity.first_name,
            last_name: entity.last_name,
            avatar_url: entity.avatar_url,
        }
    }
}
