//! Form models checked locally before anything reaches the network.

use shared::{
    domain::{Category, HouseholdId},
    protocol::{CreateCategoryRequest, RegisterRequest, UpdateCategoryRequest},
};
use validator::{Validate, ValidationErrors};

pub const NAME_TOO_SHORT: &str = "name must contain at least 2 characters";

#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct CategoryDraft {
    #[validate(length(min = 2, message = "name must contain at least 2 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub household_id: Option<HouseholdId>,
}

impl CategoryDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            is_active: true,
            household_id: None,
        }
    }

    /// Pre-fills an edit form from an existing row.
    pub fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone(),
            is_active: category.is_active,
            household_id: category.household.as_ref().map(|household| household.id),
        }
    }

    pub fn to_request(&self) -> CreateCategoryRequest {
        CreateCategoryRequest {
            name: self.name.clone(),
            description: self.description.clone(),
            is_active: Some(self.is_active),
            household_id: self.household_id,
        }
    }
}

/// Partial update. Absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct CategoryPatch {
    #[validate(length(min = 2, message = "name must contain at least 2 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub household_id: Option<HouseholdId>,
}

impl CategoryPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.is_active.is_none()
            && self.household_id.is_none()
    }

    pub fn to_request(&self) -> UpdateCategoryRequest {
        UpdateCategoryRequest {
            name: self.name.clone(),
            description: self.description.clone(),
            is_active: self.is_active,
            household_id: self.household_id,
        }
    }
}

impl From<CategoryDraft> for CategoryPatch {
    fn from(draft: CategoryDraft) -> Self {
        Self {
            name: Some(draft.name),
            description: draft.description,
            is_active: Some(draft.is_active),
            household_id: draft.household_id,
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct LoginForm {
    #[validate(email(message = "enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 3, message = "username must contain at least 3 characters"))]
    pub username: String,
    #[validate(email(message = "enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must contain at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
        }
    }
}

/// Flattens validation failures into `(field, message)` pairs sorted by field,
/// ready to be shown next to each input.
pub fn field_messages(errors: &ValidationErrors) -> Vec<(String, String)> {
    let mut messages = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                (field.to_string(), message)
            })
        })
        .collect::<Vec<_>>();
    messages.sort();
    messages
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
