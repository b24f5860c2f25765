//! Declarative description of the user management screen
//!
//! Form, table, filter and routes are plain data so that any front end
//! (or the `/api/v1/users/schema` endpoint) can render them.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::user::fields::{EMAIL_MAX_LENGTH, NAME_MAX_LENGTH, PASSWORD_MAX_LENGTH};
use crate::domain::{Role, User};

/// Characters of the name shown in the table before truncation.
pub const NAME_DISPLAY_LIMIT: usize = 30;
pub const CREATED_AT_FORMAT: &str = "%b %d, %Y";
pub const EMPTY_STATE_HEADING: &str = "No users found";
pub const EMPTY_STATE_DESCRIPTION: &str = "You can create a user using the Create User button.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Email,
    Password,
    Toggle,
    MultiSelect,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub max_length: Option<usize>,
    pub unique: bool,
    pub hidden: bool,
    pub searchable: bool,
    /// Stored values are never sent back to the form.
    pub redisplay: bool,
    pub default: Option<bool>,
    pub options: Vec<SelectOption>,
}

impl FormField {
    fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            max_length: None,
            unique: false,
            hidden: false,
            searchable: false,
            redisplay: true,
            default: None,
            options: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FormSection {
    pub title: &'static str,
    pub description: &'static str,
    pub collapsible: bool,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Badge,
    Date,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: ColumnKind,
    pub searchable: bool,
    pub sortable: bool,
    pub copyable: bool,
    pub limit: Option<usize>,
    pub date_format: Option<&'static str>,
}

impl ColumnSpec {
    fn new(name: &'static str, label: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            label,
            kind,
            searchable: false,
            sortable: false,
            copyable: false,
            limit: None,
            date_format: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FilterSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub multiple: bool,
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RouteSpec {
    pub name: &'static str,
    pub path: &'static str,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NavigationSpec {
    pub group: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResourceSchema {
    pub form: Vec<FormSection>,
    pub columns: Vec<ColumnSpec>,
    pub filters: Vec<FilterSpec>,
    pub default_sort: &'static str,
    pub empty_state_heading: &'static str,
    pub empty_state_description: &'static str,
    pub routes: Vec<RouteSpec>,
    pub navigation: NavigationSpec,
}

/// Builds the screen description. `roles` are the options the principal may
/// pick from, i.e. the result of `UserDirectory::assignable_roles`.
pub fn user_resource(roles: &[Role], require_password_on_create: bool) -> ResourceSchema {
    let options: Vec<SelectOption> = roles
        .iter()
        .map(|r| SelectOption {
            value: r.name.clone(),
            label: r.name.clone(),
        })
        .collect();

    let mut name = FormField::new("name", "Full Name", FieldKind::Text);
    name.required = true;
    name.max_length = Some(NAME_MAX_LENGTH);

    let mut email = FormField::new("email", "Email Address", FieldKind::Email);
    email.required = true;
    email.max_length = Some(EMAIL_MAX_LENGTH);
    email.unique = true;

    let mut password = FormField::new("password", "Password", FieldKind::Password);
    password.required = require_password_on_create;
    password.max_length = Some(PASSWORD_MAX_LENGTH);
    password.redisplay = false;

    let mut is_active = FormField::new("is_active", "Active", FieldKind::Toggle);
    is_active.hidden = true;
    is_active.default = Some(true);

    let mut role_select = FormField::new("roles", "Roles", FieldKind::MultiSelect);
    role_select.searchable = true;
    role_select.options = options.clone();

    let mut name_col = ColumnSpec::new("name", "Full Name", ColumnKind::Text);
    name_col.searchable = true;
    name_col.sortable = true;
    name_col.limit = Some(NAME_DISPLAY_LIMIT);

    let mut email_col = ColumnSpec::new("email", "Email", ColumnKind::Text);
    email_col.searchable = true;
    email_col.sortable = true;
    email_col.copyable = true;

    let mut created_col = ColumnSpec::new("created_at", "Created", ColumnKind::Date);
    created_col.sortable = true;
    created_col.date_format = Some(CREATED_AT_FORMAT);

    ResourceSchema {
        form: vec![
            FormSection {
                title: "User Information",
                description: "Fill in the basic information of the user.",
                collapsible: true,
                fields: vec![name, email, password, is_active],
            },
            FormSection {
                title: "User Roles",
                description: "Assign one or more roles to the user.",
                collapsible: false,
                fields: vec![role_select],
            },
        ],
        columns: vec![
            name_col,
            email_col,
            ColumnSpec::new("roles", "Roles", ColumnKind::Badge),
            created_col,
        ],
        filters: vec![FilterSpec {
            name: "roles",
            label: "Filter by Role",
            multiple: true,
            options,
        }],
        default_sort: "created_at desc",
        empty_state_heading: EMPTY_STATE_HEADING,
        empty_state_description: EMPTY_STATE_DESCRIPTION,
        routes: vec![
            RouteSpec { name: "list", path: "/" },
            RouteSpec { name: "create", path: "/create" },
            RouteSpec { name: "edit", path: "/{id}/edit" },
        ],
        navigation: NavigationSpec {
            group: "Data Master",
            label: "User",
            icon: "heroicon-o-users",
        },
    }
}

/// Cuts `text` to `limit` characters, appending `...` when something was cut.
pub fn limit_text(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}...", cut.trim_end())
}

/// One rendered table row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub name_display: String,
    pub email: String,
    pub is_active: bool,
    pub roles: Vec<String>,
    pub roles_display: String,
    pub created_at: String,
    pub created_at_display: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            name_display: limit_text(&user.name, NAME_DISPLAY_LIMIT),
            email: user.email.clone(),
            is_active: user.is_active,
            roles: user.roles.iter().cloned().collect(),
            roles_display: user.roles_display(),
            created_at: user.created_at.to_rfc3339(),
            created_at_display: user.created_at.format(CREATED_AT_FORMAT).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn role(name: &str) -> Role {
        Role {
            id: format!("r-{name}"),
            name: name.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn form_and_table_follow_the_screen_layout() {
        let schema = user_resource(&[role("editor"), role("viewer")], false);

        let titles: Vec<_> = schema.form.iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["User Information", "User Roles"]);
        assert_eq!(
            schema.form[0].description,
            "Fill in the basic information of the user."
        );
        assert_eq!(schema.form[1].description, "Assign one or more roles to the user.");

        let fields: Vec<_> = schema
            .form
            .iter()
            .flat_map(|s| s.fields.iter().map(|f| f.name))
            .collect();
        assert_eq!(fields, vec!["name", "email", "password", "is_active", "roles"]);

        let password = &schema.form[0].fields[2];
        assert!(!password.required);
        assert!(!password.redisplay);

        let is_active = &schema.form[0].fields[3];
        assert!(is_active.hidden);
        assert_eq!(is_active.default, Some(true));

        let columns: Vec<_> = schema.columns.iter().map(|c| c.label).collect();
        assert_eq!(columns, vec!["Full Name", "Email", "Roles", "Created"]);
        assert_eq!(schema.filters[0].options.len(), 2);
        assert_eq!(schema.routes[2].path, "/{id}/edit");
        assert_eq!(schema.empty_state_heading, "No users found");
        assert_eq!(
            schema.empty_state_description,
            "You can create a user using the Create User button."
        );
    }

    #[test]
    fn password_requirement_is_configurable() {
        let schema = user_resource(&[], true);
        assert!(schema.form[0].fields[2].required);
    }

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(limit_text("Ann", 30), "Ann");
        let long = "Bartholomew Fitzgerald Montgomery-Smythe";
        let shown = limit_text(long, NAME_DISPLAY_LIMIT);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.trim_end_matches("...").chars().count(), 30);
    }

    #[test]
    fn row_formats_roles_and_date() {
        let at = Utc.with_ymd_and_hms(2026, 10, 7, 12, 0, 0).unwrap();
        let user = User {
            id: "u1".into(),
            name: "Ann".into(),
            email: "ann@example.com".into(),
            password_hash: Some("hash".into()),
            is_active: true,
            roles: ["viewer", "editor"].iter().map(|s| s.to_string()).collect(),
            created_at: at,
            updated_at: at,
            deleted_at: None,
        };

        let row = UserRow::from(&user);
        assert_eq!(row.roles_display, "editor, viewer");
        assert_eq!(row.created_at_display, "Oct 07, 2026");
        assert_eq!(row.name_display, "Ann");
    }
}
