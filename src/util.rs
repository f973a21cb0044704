use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

pub(crate) const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Replaces every `{timestamp}` in `template` with `now` as `YYYYmmdd_HHMMSS`.
pub fn expand_image_name(template: &str, now: DateTime<Local>) -> String {
    if !template.contains(TIMESTAMP_PLACEHOLDER) {
        return template.to_string();
    }
    let stamp = now.format(TIMESTAMP_FORMAT).to_string();
    template.replace(TIMESTAMP_PLACEHOLDER, &stamp)
}

/// Where a capture taken at `now` ends up.
pub fn output_path(imagepath: &str, imagename: &str, now: DateTime<Local>) -> PathBuf {
    Path::new(imagepath).join(expand_image_name(imagename, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 9, 19, 12, 30, 5).unwrap()
    }

    #[test]
    fn test_plain_name_is_untouched() {
        assert_eq!(expand_image_name("screencapture.jpeg", noon()), "screencapture.jpeg");
    }

    #[test]
    fn test_timestamp_is_expanded() {
        assert_eq!(
            expand_image_name("scope_{timestamp}.jpeg", noon()),
            "scope_20240919_123005.jpeg"
        );
    }

    #[test]
    fn test_output_path_joins_directory() {
        let path = output_path("captures", "a.jpeg", noon());
        assert_eq!(path, Path::new("captures").join("a.jpeg"));
    }
}
