// src/utils.rs
use anyhow::Result;
use rocket::http::ContentType;

pub const MAX_MESSAGE_CHARS: usize = 4000;
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Collapse inner whitespace and trim
pub fn normalize_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Minimal shape check: one `@`, a non-empty local part and a dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Get file extension in lowercase
pub fn get_file_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Extension used to store an application document, from its declared content type
/// or, failing that, from the uploaded file name.
pub fn document_extension(content_type: Option<&ContentType>, filename: Option<&str>) -> Result<&'static str> {
    if let Some(ct) = content_type {
        let ext = match (ct.top().as_str(), ct.sub().as_str()) {
            ("application", "pdf") => Some("pdf"),
            ("application", "msword") => Some("doc"),
            ("application", "vnd.openxmlformats-officedocument.wordprocessingml.document") => {
                Some("docx")
            }
            ("image", "png") => Some("png"),
            ("image", "jpeg") | ("image", "jpg") => Some("jpg"),
            _ => None,
        };
        if let Some(ext) = ext {
            return Ok(ext);
        }
    }

    let ext = filename
        .and_then(get_file_extension)
        .ok_or_else(|| anyhow::anyhow!("Unsupported document type"))?;
    match ext.as_str() {
        "pdf" => Ok("pdf"),
        "doc" => Ok("doc"),
        "docx" => Ok("docx"),
        "png" => Ok("png"),
        "jpg" | "jpeg" => Ok("jpg"),
        other => anyhow::bail!(
            "Unsupported document type: {}. Allowed: pdf, doc, docx, png, jpeg",
            other
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Jane   Doe "), "Jane Doe");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("jane@example.com"));
        assert!(!is_valid_email("jane.example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane@@example.com"));
        assert!(!is_valid_email("ja ne@example.com"));
    }

    #[test]
    fn test_get_file_extension() {
        assert_eq!(get_file_extension("test.pdf"), Some("pdf".to_string()));
        assert_eq!(
            get_file_extension("document.DOCX"),
            Some("docx".to_string())
        );
        assert_eq!(get_file_extension("noext"), None);
    }

    #[test]
    fn test_document_extension() {
        assert_eq!(document_extension(Some(&ContentType::PDF), None).unwrap(), "pdf");
        assert_eq!(document_extension(Some(&ContentType::PNG), None).unwrap(), "png");
        assert_eq!(document_extension(Some(&ContentType::JPEG), None).unwrap(), "jpg");
        assert_eq!(
            document_extension(Some(&ContentType::Binary), Some("cv.DOCX")).unwrap(),
            "docx"
        );
        assert_eq!(document_extension(None, Some("letter.doc")).unwrap(), "doc");
        assert!(document_extension(Some(&ContentType::Plain), Some("notes.txt")).is_err());
        assert!(document_extension(None, None).is_err());
    }
}
