use course_watch::NotificationError;

/// Prefix for email subjects
pub const SUBJECT_PREFIX: &str = "Course Tracker";

/// Trimmed destination, or an error if nothing is left.
pub fn validate_destination(destination: &str) -> Result<&str, NotificationError> {
    let trimmed = destination.trim();
    if trimmed.is_empty() {
        return Err(NotificationError::InvalidDestination(destination.to_string()));
    }
    Ok(trimmed)
}

/// Trimmed destination that at least looks like an email address.
pub fn validate_email(destination: &str) -> Result<&str, NotificationError> {
    let email = validate_destination(destination)?;
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(NotificationError::InvalidDestination(destination.to_string())),
    }
}

/// Email subject line for a notification title.
pub fn email_subject(title: &str) -> String {
    format!("{} -- {}", SUBJECT_PREFIX, title)
}

/// Plain-text email body, e.g. `Course Open: CS 1332 - A`.
pub fn email_text(title: &str, body: &str) -> String {
    format!("{}: {}", title, body)
}
