use crate::entities::{UserRole, profile_entity as profiles};
use crate::models::MemberResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: UserRole,
    pub member: Option<MemberResponse>,
}

impl ProfileResponse {
    pub fn new(profile: profiles::Model, member: Option<MemberResponse>) -> Self {
        Self {
            id: profile.id,
            full_name: profile.full_name,
            email: profile.email,
            role: profile.role,
            member,
        }
    }
}
