/// Validated changes for an existing user.
///
/// `password_hash: None` keeps the stored credential. `role_ids` replaces
/// the whole role set.
#[derive(Debug, Clone)]
pub struct UpdateUserDto {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
    pub role_ids: Vec<String>,
}
