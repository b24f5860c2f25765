/// Validated, hashed and role-resolved input for a new user row.
#[derive(Debug, Clone)]
pub struct CreateUserDto {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub role_ids: Vec<String>,
}
