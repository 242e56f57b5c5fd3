use super::locks::EntityLocks;
use crate::domain::member::Member;
use crate::domain::ports::MemberStoreBox;
use crate::error::{CommerceError, Result, StoreError};
use tracing::{info, instrument};

pub struct MemberService {
    members: MemberStoreBox,
    locks: EntityLocks,
}

impl MemberService {
    pub fn new(members: MemberStoreBox) -> Self {
        Self {
            members,
            locks: EntityLocks::new(),
        }
    }

    /// Registers a member; the email must not be taken.
    #[instrument(skip(self, name, password))]
    pub async fn create_member(&self, email: &str, name: &str, password: &str) -> Result<Member> {
        // argon2 is CPU-bound; keep it off the async workers
        let member = {
            let (email, name, password) = (email.to_string(), name.to_string(), password.to_string());
            tokio::task::spawn_blocking(move || Member::new(email, name, &password))
                .await
                .map_err(|_| CommerceError::PasswordHash)??
        };

        let _guard = self.locks.lock(email).await;
        let existing = self
            .members
            .find_by_email(email)
            .await
            .map_err(|e| CommerceError::store("check existing member with email", email, e))?;
        if existing.is_some() {
            return Err(CommerceError::MemberAlreadyExists(email.to_string()));
        }

        self.members
            .save(&member)
            .await
            .map_err(|e| CommerceError::store("save member", member.id(), e))?;

        info!(member_id = member.id(), "member created");
        Ok(member)
    }

    pub async fn get_member(&self, id: &str) -> Result<Member> {
        self.members
            .get(id)
            .await
            .map_err(|e| CommerceError::store("load member", id, e))?
            .ok_or_else(|| CommerceError::MemberNotFound(id.to_string()))
    }

    #[instrument(skip(self, id, name), fields(member_id = id))]
    pub async fn update_member(&self, id: &str, name: &str) -> Result<Member> {
        let _guard = self.locks.lock(id).await;
        let mut member = self.get_member(id).await?;
        member.rename(name)?;

        self.members
            .update(&member)
            .await
            .map_err(|e| CommerceError::store("update member", id, e))?;

        info!("member renamed");
        Ok(member)
    }

    #[instrument(skip(self, id), fields(member_id = id))]
    pub async fn delete_member(&self, id: &str) -> Result<()> {
        let _guard = self.locks.lock(id).await;
        match self.members.delete(id).await {
            Ok(()) => {
                info!("member deleted");
                Ok(())
            }
            Err(StoreError::NotFound(_)) => Err(CommerceError::MemberNotFound(id.to_string())),
            Err(e) => Err(CommerceError::store("delete member", id, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryMemberStore;

    fn service() -> MemberService {
        MemberService::new(Box::new(InMemoryMemberStore::new()))
    }

    #[tokio::test]
    async fn test_create_and_get_member() {
        let service = service();
        let member = service
            .create_member("kim@example.com", "Kim", "password123")
            .await
            .unwrap();

        let stored = service.get_member(member.id()).await.unwrap();
        assert_eq!(stored.email(), "kim@example.com");
        assert!(stored.verify_password("password123"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_hashing_runs_off_the_runtime_thread() {
        let service = service();
        let member = service
            .create_member("kim@example.com", "Kim", "password123")
            .await
            .unwrap();
        assert!(member.verify_password("password123"));

        let result = service.create_member("lee@example.com", "Lee", "short").await;
        assert!(matches!(result, Err(CommerceError::InvalidPassword)));
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let service = service();
        service
            .create_member("kim@example.com", "Kim", "password123")
            .await
            .unwrap();

        let result = service
            .create_member("kim@example.com", "Other", "password456")
            .await;
        assert!(matches!(result, Err(CommerceError::MemberAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_update_member() {
        let service = service();
        let member = service
            .create_member("kim@example.com", "Kim", "password123")
            .await
            .unwrap();

        let renamed = service.update_member(member.id(), "Lee").await.unwrap();
        assert_eq!(renamed.name(), "Lee");

        let result = service.update_member(member.id(), "").await;
        assert!(matches!(result, Err(CommerceError::InvalidName)));
        assert_eq!(service.get_member(member.id()).await.unwrap().name(), "Lee");
    }

    #[tokio::test]
    async fn test_delete_member() {
        let service = service();
        let member = service
            .create_member("kim@example.com", "Kim", "password123")
            .await
            .unwrap();

        service.delete_member(member.id()).await.unwrap();
        assert!(service.get_member(member.id()).await.unwrap_err().is_not_found());
        assert!(matches!(
            service.delete_member(member.id()).await,
            Err(CommerceError::MemberNotFound(_))
        ));

        // the email is free again
        service
            .create_member("kim@example.com", "Kim", "password123")
            .await
            .unwrap();
    }
}
