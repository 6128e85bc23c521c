//! Input model checks for the posts endpoints.
//! Collects field-level errors so clients get the whole picture at once.

use crate::errors::{AppError, FieldError};

pub const MAX_TITLE_LEN: usize = 256;
pub const MAX_CONTENT_LEN: usize = 65_536;

fn check_required_text(
    field: &'static str,
    value: &str,
    max: usize,
    errors: &mut Vec<FieldError>,
) {
    if value.trim().is_empty() {
        errors.push(FieldError {
            field,
            message: "must not be empty".to_string(),
        });
    } else if value.len() > max {
        errors.push(FieldError {
            field,
            message: format!("must be at most {} bytes", max),
        });
    }
}

/// Validate the fields shared by insert and update post bodies.
pub fn validate_post_input(blog_id: i32, title: &str, content: &str) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if blog_id < 1 {
        errors.push(FieldError {
            field: "blogId",
            message: "must be a positive blog id".to_string(),
        });
    }
    check_required_text("title", title, MAX_TITLE_LEN, &mut errors);
    check_required_text("content", content, MAX_CONTENT_LEN, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Validate the cutoff year of the bulk archive/delete endpoints.
pub fn validate_bulk_query(blog_name: &str, prior_to_year: i32) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if blog_name.trim().is_empty() {
        errors.push(FieldError {
            field: "blogName",
            message: "must not be empty".to_string(),
        });
    }
    if !(1..=9999).contains(&prior_to_year) {
        errors.push(FieldError {
            field: "priorToYear",
            message: "must be a calendar year between 1 and 9999".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}
