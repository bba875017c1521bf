//! Profile edits and the photo gallery.

use std::sync::Arc;

use crate::backend::Backend;
use crate::confirm::{Confirmed, DeletePhoto};
use crate::constants::MAX_PHOTOS_PER_USER;
use crate::id_gen::{photo_id, short};
use crate::profile::{Photo, Profile, ProfileEdit, ProfileWithPhotos};
use crate::time_utils;
use crate::validation::{validate_bio, validate_display_name};
use crate::{AppError, AppResult};

pub struct ProfileService {
    backend: Arc<dyn Backend>,
}

impl ProfileService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn load(&self, user_id: &str) -> AppResult<ProfileWithPhotos> {
        let profile = self
            .backend
            .get_profile(user_id)?
            .ok_or_else(|| AppError::NotFound(format!("profile {}", short(user_id))))?;
        let photos = self.backend.list_photos(user_id)?;
        Ok(ProfileWithPhotos { profile, photos })
    }

    /// Validate, merge and write. A user without a profile row gets one.
    pub fn update_profile(&self, user_id: &str, edit: &ProfileEdit) -> AppResult<Profile> {
        if let Some(name) = &edit.display_name {
            validate_display_name(name.trim())?;
        }
        if let Some(bio) = &edit.bio {
            validate_bio(bio)?;
        }

        let mut profile = match self.backend.get_profile(user_id)? {
            Some(p) => p,
            None => {
                let name = edit.display_name.as_deref().map(str::trim).unwrap_or_default();
                validate_display_name(name)?;
                Profile::new(user_id, name)
            }
        };
        edit.apply(&mut profile);
        profile.updated_at = time_utils::now();
        self.backend.upsert_profile(&profile)?;
        tracing::info!(user = %short(user_id), "Profile updated");
        Ok(profile)
    }

    // ── Photos ──

    /// Oldest first.
    pub fn photos(&self, user_id: &str) -> AppResult<Vec<Photo>> {
        self.backend.list_photos(user_id)
    }

    /// The first photo of a user becomes primary.
    pub fn add_photo(&self, user_id: &str, url: &str) -> AppResult<Photo> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::Validation("사진을 선택해주세요.".into()));
        }
        let existing = self.backend.list_photos(user_id)?;
        if existing.len() >= MAX_PHOTOS_PER_USER {
            return Err(AppError::Validation(format!(
                "사진은 최대 {}장까지 등록할 수 있어요.",
                MAX_PHOTOS_PER_USER
            )));
        }

        let photo = Photo {
            id: photo_id(),
            user_id: user_id.to_string(),
            url: url.to_string(),
            is_primary: existing.is_empty(),
            created_at: time_utils::now(),
        };
        self.backend.insert_photo(&photo)?;
        Ok(photo)
    }

    pub fn set_primary_photo(&self, user_id: &str, photo_id: &str) -> AppResult<()> {
        let photos = self.backend.list_photos(user_id)?;
        if !photos.iter().any(|p| p.id == photo_id) {
            return Err(AppError::NotFound(format!("photo {}", short(photo_id))));
        }
        self.backend.set_primary_photo(user_id, photo_id)
    }

    /// Deleting the primary photo promotes the oldest remaining one.
    pub fn delete_photo(&self, user_id: &str, confirmed: Confirmed<DeletePhoto>) -> AppResult<()> {
        let target = confirmed.into_inner().photo_id;
        let photos = self.backend.list_photos(user_id)?;
        let Some(deleted) = photos.iter().find(|p| p.id == target) else {
            return Err(AppError::NotFound(format!("photo {}", short(&target))));
        };
        let was_primary = deleted.is_primary;

        if !self.backend.delete_photo(user_id, &target)? {
            return Err(AppError::NotFound(format!("photo {}", short(&target))));
        }

        if was_primary {
            if let Some(next) = photos.iter().find(|p| p.id != target) {
                self.backend.set_primary_photo(user_id, &next.id)?;
                tracing::debug!(user = %short(user_id), photo = %short(&next.id), "Primary photo promoted");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::PendingConfirmation;
    use crate::geo::Coordinates;
    use crate::test_helpers::setup_backend;

    fn svc() -> ProfileService {
        ProfileService::new(setup_backend(&["minsu"]))
    }

    fn delete(id: &str) -> Confirmed<DeletePhoto> {
        PendingConfirmation::new(DeletePhoto { photo_id: id.to_string() }).confirm()
    }

    #[test]
    fn test_update_profile_validates_first() {
        let svc = svc();
        let edit = ProfileEdit {
            display_name: Some("김".into()),
            ..ProfileEdit::default()
        };
        let err = svc.update_profile("minsu", &edit).unwrap_err();
        assert_eq!(err.user_message(), "닉네임은 최소 2자 이상이어야 합니다.");

        let edit = ProfileEdit {
            bio: Some("가".repeat(201)),
            ..ProfileEdit::default()
        };
        assert!(svc.update_profile("minsu", &edit).is_err());
        assert_eq!(svc.load("minsu").unwrap().profile.display_name, "minsu");
    }

    #[test]
    fn test_update_profile_obscures_location() {
        let svc = svc();
        let edit = ProfileEdit {
            display_name: Some("  김민수 ".into()),
            location: Some(Coordinates::new(37.56789, 126.97812)),
            ..ProfileEdit::default()
        };
        let updated = svc.update_profile("minsu", &edit).unwrap();
        assert_eq!(updated.display_name, "김민수");
        assert_eq!(updated.approx_lat, Some(37.57));
        assert_eq!(updated.approx_lng, Some(126.98));
        assert_eq!(svc.load("minsu").unwrap().profile, updated);
    }

    #[test]
    fn test_first_photo_is_primary_and_cap_applies() {
        let svc = svc();
        let first = svc.add_photo("minsu", "https://cdn/1.jpg").unwrap();
        assert!(first.is_primary);
        for i in 2..=MAX_PHOTOS_PER_USER {
            let p = svc.add_photo("minsu", &format!("https://cdn/{}.jpg", i)).unwrap();
            assert!(!p.is_primary);
        }
        assert!(matches!(svc.add_photo("minsu", "https://cdn/7.jpg"), Err(AppError::Validation(_))));
        assert_eq!(svc.photos("minsu").unwrap().len(), MAX_PHOTOS_PER_USER);
    }

    #[test]
    fn test_set_primary_leaves_one() {
        let svc = svc();
        svc.add_photo("minsu", "https://cdn/1.jpg").unwrap();
        let second = svc.add_photo("minsu", "https://cdn/2.jpg").unwrap();
        svc.set_primary_photo("minsu", &second.id).unwrap();

        let primaries: Vec<_> = svc.photos("minsu").unwrap().into_iter().filter(|p| p.is_primary).collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].id, second.id);
        assert!(matches!(svc.set_primary_photo("minsu", "nope"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_deleting_primary_promotes_oldest() {
        let svc = svc();
        let first = svc.add_photo("minsu", "https://cdn/1.jpg").unwrap();
        let second = svc.add_photo("minsu", "https://cdn/2.jpg").unwrap();
        svc.add_photo("minsu", "https://cdn/3.jpg").unwrap();

        svc.delete_photo("minsu", delete(&first.id)).unwrap();
        let photos = svc.photos("minsu").unwrap();
        assert_eq!(photos.len(), 2);
        assert!(photos.iter().find(|p| p.id == second.id).unwrap().is_primary);
        assert!(matches!(svc.delete_photo("minsu", delete(&first.id)), Err(AppError::NotFound(_))));
    }
}
