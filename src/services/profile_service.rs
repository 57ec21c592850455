use crate::database::DbPool;
use crate::entities::{UserRole, profile_entity as profiles};
use crate::error::{AppError, AppResult};
use crate::models::{MemberResponse, ProfileResponse};
use crate::services::MemberService;
use sea_orm::EntityTrait;
use uuid::Uuid;

#[derive(Clone)]
pub struct ProfileService {
    pool: DbPool,
}

impl ProfileService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, user_id: Uuid) -> AppResult<Option<profiles::Model>> {
        Ok(profiles::Entity::find_by_id(user_id).one(self.pool.as_ref()).await?)
    }

    /// 资料尚未创建时返回 None，由路由守卫决定如何处理
    pub async fn find_role(&self, user_id: Uuid) -> AppResult<Option<UserRole>> {
        Ok(self.find(user_id).await?.map(|p| p.role))
    }

    /// 当前用户的资料及其会员记录
    pub async fn get_me(
        &self,
        user_id: Uuid,
        member_service: &MemberService,
    ) -> AppResult<ProfileResponse> {
        let profile = self
            .find(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
        let member = member_service
            .find_by_user(user_id)
            .await?
            .map(MemberResponse::from);
        Ok(ProfileResponse::new(profile, member))
    }
}
