use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Attribute values of one entity instance, ordered by name.
pub type Metas = BTreeMap<String, String>;

// -- Accounts and users --

/// A tenant. Exactly one account carries `admin = true`: the system account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub admin: bool,
    pub expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub account: Account,
    pub username: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub admin: bool,
    pub active: bool,
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<Person>,
}

impl User {
    /// Admin user of the system account.
    pub fn is_system_admin(&self) -> bool {
        self.admin && self.account.admin
    }

    /// Admin user of a regular (tenant) account.
    pub fn is_tenant_admin(&self) -> bool {
        self.admin && !self.account.admin
    }
}

/// A logged-in user. The token is the bearer credential sent as `X-Auth-Token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub time_created: DateTime<Utc>,
    pub time_updated: DateTime<Utc>,
}

// -- Persons --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            other => Err(format!("invalid gender \"{other}\" != male|female")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub national_id_pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nationality {
    pub country: Country,
    pub national_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nationalities: Vec<Nationality>,
}

// -- Groups --

/// Who may list and manage the members of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "OwnerTag", from = "OwnerTag")]
pub enum GroupOwner {
    Account(Uuid),
    User(Uuid),
    /// Owner kinds this version does not know. Never grants anything.
    Other { owner_type: String, owner_id: String },
}

impl GroupOwner {
    pub fn from_parts(owner_type: &str, owner_id: &str) -> Self {
        let other = || Self::Other {
            owner_type: owner_type.to_string(),
            owner_id: owner_id.to_string(),
        };
        match (owner_type, owner_id.parse::<Uuid>()) {
            ("account", Ok(id)) => Self::Account(id),
            ("user", Ok(id)) => Self::User(id),
            _ => other(),
        }
    }

    pub fn owner_type(&self) -> &str {
        match self {
            Self::Account(_) => "account",
            Self::User(_) => "user",
            Self::Other { owner_type, .. } => owner_type,
        }
    }

    pub fn owner_id(&self) -> String {
        match self {
            Self::Account(id) | Self::User(id) => id.to_string(),
            Self::Other { owner_id, .. } => owner_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OwnerTag {
    owner_type: String,
    owner_id: String,
}

impl From<GroupOwner> for OwnerTag {
    fn from(owner: GroupOwner) -> Self {
        Self {
            owner_type: owner.owner_type().to_string(),
            owner_id: owner.owner_id(),
        }
    }
}

impl From<OwnerTag> for GroupOwner {
    fn from(tag: OwnerTag) -> Self {
        GroupOwner::from_parts(&tag.owner_type, &tag.owner_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub account: Account,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_group_id: Option<Uuid>,
    /// Resolved ancestor chain. Only filled in when a single group is fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<Group>>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub invitation: bool,
    pub owner: GroupOwner,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: Metas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberType {
    User,
    Group,
}

impl MemberType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "group" => Ok(Self::Group),
            other => Err(format!("unknown member type \"{other}\"")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: Uuid,
    pub group: Group,
    pub member_type: MemberType,
    pub member_id: Uuid,
}

// -- Attribute store --

/// Entity classes that can carry metas and fields. The tag is the
/// `table_name` column of the attribute tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityClass {
    Accounts,
    Users,
    Groups,
    Persons,
}

impl EntityClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::Users => "users",
            Self::Groups => "groups",
            Self::Persons => "persons",
        }
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema hint for one named attribute of a class of entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub table_id: String,
    /// Fields sort ascending on this, then on name.
    #[serde(default)]
    pub order_nr: i64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub description: String,
}

// -- Messages --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub from_user_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_username: Option<String>,
    pub to_user_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_username: Option<String>,
    pub message: String,
    pub time_sent: DateTime<Utc>,
    pub time_read: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InboxStatus {
    #[default]
    All,
    Read,
    Unread,
}

impl FromStr for InboxStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Self::All),
            "read" => Ok(Self::Read),
            "unread" => Ok(Self::Unread),
            other => Err(format!("unknown status \"{other}\", expected read|unread")),
        }
    }
}
