//! Staged media upload helpers: filename derivation, MIME lookup, and the
//! ordered multipart plan.
//!
//! The remote platform signs the staging parameters; the multipart body
//! must repeat them in the exact order given, with the binary file part
//! appended last. The plan is built here as plain data so that ordering
//! is unit-testable without any network.

use serde::{Deserialize, Serialize};

/// Form field name for the binary part of a staged upload.
pub const FILE_FIELD_NAME: &str = "file";

// ---------------------------------------------------------------------------
// Filename / MIME derivation
// ---------------------------------------------------------------------------

/// Derive an upload filename from a source image URL.
///
/// Takes the last path segment with any query string stripped. Falls back
/// to a generated `image-{uuid}.jpg` name when the URL has no usable
/// segment.
pub fn filename_from_url(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let segment = without_query.rsplit('/').next().unwrap_or("");
    if segment.is_empty() || !segment.contains('.') {
        format!("image-{}.jpg", uuid::Uuid::new_v4())
    } else {
        segment.to_string()
    }
}

/// Guess a MIME type from a filename extension.
pub fn mime_for_filename(filename: &str) -> &'static str {
    let ext = filename
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Staged upload targets and the multipart plan
// ---------------------------------------------------------------------------

/// One signed parameter of a staged upload target. Order matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedParameter {
    pub name: String,
    pub value: String,
}

/// An upload target issued by the platform's staging call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedUploadTarget {
    /// Where the multipart body must be POSTed.
    pub url: String,
    /// Durable reference to use in the subsequent product mutation.
    pub resource_url: String,
    /// Signed form parameters, in the order the platform issued them.
    pub parameters: Vec<StagedParameter>,
}

/// Fully ordered field list for one staged upload POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Text { name: String, value: String },
    File { name: String, filename: String },
}

/// Build the ordered multipart plan for a target.
///
/// Signed parameters keep their issued order; the file part is always
/// last. The receiving endpoint validates a signature over the fields and
/// rejects any reordering.
pub fn plan_upload_form(target: &StagedUploadTarget, filename: &str) -> Vec<FormField> {
    let mut fields: Vec<FormField> = target
        .parameters
        .iter()
        .map(|p| FormField::Text {
            name: p.name.clone(),
            value: p.value.clone(),
        })
        .collect();
    fields.push(FormField::File {
        name: FILE_FIELD_NAME.to_string(),
        filename: filename.to_string(),
    });
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target_with(params: &[(&str, &str)]) -> StagedUploadTarget {
        StagedUploadTarget {
            url: "https://upload.example.com/signed".into(),
            resource_url: "https://cdn.example.com/r/1".into(),
            parameters: params
                .iter()
                .map(|(n, v)| StagedParameter {
                    name: n.to_string(),
                    value: v.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_filename_from_url_strips_query() {
        assert_eq!(
            filename_from_url("https://cdn.example.com/a/b/photo.png?v=3&w=200"),
            "photo.png"
        );
        assert_eq!(
            filename_from_url("https://cdn.example.com/hero.jpeg#frag"),
            "hero.jpeg"
        );
    }

    #[test]
    fn test_filename_fallback_is_generated() {
        let name = filename_from_url("https://cdn.example.com/");
        assert!(name.starts_with("image-"));
        assert!(name.ends_with(".jpg"));

        // A trailing segment without an extension also falls back.
        let name = filename_from_url("https://cdn.example.com/images");
        assert!(name.starts_with("image-"));
    }

    #[test]
    fn test_mime_lookup() {
        assert_eq!(mime_for_filename("a.JPG"), "image/jpeg");
        assert_eq!(mime_for_filename("a.png"), "image/png");
        assert_eq!(mime_for_filename("a.webp"), "image/webp");
        assert_eq!(mime_for_filename("a.bin"), "application/octet-stream");
    }

    #[test]
    fn test_plan_preserves_order_and_appends_file_last() {
        let target = target_with(&[
            ("key", "tmp/123/photo.png"),
            ("policy", "base64policy"),
            ("signature", "sig"),
        ]);
        let plan = plan_upload_form(&target, "photo.png");

        assert_eq!(plan.len(), 4);
        assert_eq!(
            plan[0],
            FormField::Text {
                name: "key".into(),
                value: "tmp/123/photo.png".into()
            }
        );
        assert_eq!(
            plan[2],
            FormField::Text {
                name: "signature".into(),
                value: "sig".into()
            }
        );
        assert_eq!(
            plan[3],
            FormField::File {
                name: FILE_FIELD_NAME.into(),
                filename: "photo.png".into()
            }
        );
    }

    #[test]
    fn test_plan_with_no_parameters_still_has_file() {
        let target = target_with(&[]);
        let plan = plan_upload_form(&target, "x.png");
        assert_eq!(plan.len(), 1);
        assert!(matches!(plan[0], FormField::File { .. }));
    }
}
