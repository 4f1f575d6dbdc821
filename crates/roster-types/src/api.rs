use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Field, Gender, MemberType, User};

// -- Auth --

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Public self-registration. Fields default to empty so that missing values
/// are reported as validation errors instead of decode errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Country id or country name.
    #[serde(default)]
    pub country_id: String,
    #[serde(default)]
    pub national_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub email: String,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivateRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub new_password: String,
}

// -- Accounts --

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAccountRequest {
    #[serde(default)]
    pub name: String,
    /// When set the admin user is this address, created inactive, and must
    /// be activated with the returned token.
    #[serde(default)]
    pub admin_email: Option<String>,
}

/// Credential handed out with a new account's admin user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountSecret {
    AdminPassword(String),
    ActivationToken(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccountResponse {
    pub admin_user: User,
    #[serde(flatten)]
    pub secret: AccountSecret,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetAccountActiveRequest {
    pub active: bool,
}

// -- Users --

#[derive(Debug, Clone, Deserialize)]
pub struct NewUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// -- Groups --

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewGroupRequest {
    /// Parent when creating a sub-group, or the group another account is
    /// invited to create a sub-group in.
    #[serde(default)]
    pub parent_group_id: Option<Uuid>,
    /// Another account invited to create this group. Name and description
    /// must then be empty: they are copied from the parent group.
    #[serde(default)]
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Makes the group user-owned instead of account-owned.
    #[serde(default)]
    pub owner_user_id: Option<Uuid>,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// Replacement name and description plus a partial data patch: `null`
/// deletes a key, a string sets it, absent keys are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupUpdate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub data: BTreeMap<String, Option<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGroupMember {
    pub member_type: MemberType,
    pub member_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetFieldsRequest {
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DelFieldsRequest {
    pub names: Vec<String>,
}

// -- Messages --

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub to_user_id: Option<Uuid>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub message_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkReadRequest {
    pub read: bool,
}

// -- Listing filters --

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountsFilter {
    pub id: Option<Uuid>,
    /// Substring of the name.
    pub name: Option<String>,
    pub active: Option<bool>,
    pub admin: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersFilter {
    /// Substring of the username.
    pub username: Option<String>,
    pub account_id: Option<Uuid>,
    pub active: Option<bool>,
    pub admin: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupsFilter {
    pub id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub parent_group_id: Option<Uuid>,
    /// Substring of the name.
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonsFilter {
    pub name: Option<String>,
    pub surname: Option<String>,
}
