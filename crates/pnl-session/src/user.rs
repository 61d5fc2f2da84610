#![forbid(unsafe_code)]

//! The user entity.

use serde::{Deserialize, Serialize};

use crate::mapper::Mapper;

/// A user as the application sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// A user as the API sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// [`Mapper`] between [`User`] and [`UserDto`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UserMapper;

impl Mapper<User, UserDto> for UserMapper {
    fn to_domain(&self, raw: UserDto) -> User {
        User {
            id: raw.id,
            email: raw.email,
            name: raw.name,
            avatar_url: raw.avatar_url,
        }
    }

    fn to_persistence(&self, domain: User) -> UserDto {
        UserDto {
            id: domain.id,
            email: domain.email,
            name: domain.name,
            avatar_url: domain.avatar_url,
        }
    }
}
