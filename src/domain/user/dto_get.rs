use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSortField {
    Name,
    Email,
    #[default]
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// List query. `roles` matches users holding any of the names.
#[derive(Debug, Clone, Default)]
pub struct GetUserDto {
    pub search: Option<String>,
    pub roles: Vec<String>,
    pub sort_by: UserSortField,
    pub sort_dir: SortDirection,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}
