//! Upload payloads and the client-side checks run before submission

use bytes::Bytes;

use crate::error::{CoreError, CoreResult};

/// Extension every upload must carry
pub const CSV_EXTENSION: &str = ".csv";

/// A file chosen for upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// MIME type sent with the multipart part
    pub fn mime(&self) -> &str {
        self.content_type.as_deref().unwrap_or("text/csv")
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Check the file name carries a `.csv` extension (ASCII case-insensitive)
pub fn is_csv_file_name(file_name: &str) -> bool {
    let name = file_name.trim();
    name.len() > CSV_EXTENSION.len()
        && name
            .get(name.len() - CSV_EXTENSION.len()..)
            .map_or(false, |ext| ext.eq_ignore_ascii_case(CSV_EXTENSION))
}

/// Validate a selection before it is submitted
pub fn validate_upload(file: Option<&UploadFile>) -> CoreResult<&UploadFile> {
    let file = file.ok_or(CoreError::MissingFile)?;
    if !is_csv_file_name(&file.file_name) {
        return Err(CoreError::InvalidFileType {
            file_name: file.file_name.clone(),
        });
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_names() {
        assert!(is_csv_file_name("statement.csv"));
        assert!(is_csv_file_name("March.CSV"));
        assert!(!is_csv_file_name("statement.xlsx"));
        assert!(!is_csv_file_name("csv"));
        assert!(!is_csv_file_name(".csv"));
        assert!(!is_csv_file_name("statement.csv.exe"));
    }

    #[test]
    fn test_validate_upload() {
        let ok = UploadFile::new("bank.csv", "date,description,amount\n");
        assert!(validate_upload(Some(&ok)).is_ok());

        let wrong = UploadFile::new("bank.pdf", vec![1u8, 2, 3]);
        assert_eq!(
            validate_upload(Some(&wrong)),
            Err(CoreError::InvalidFileType {
                file_name: "bank.pdf".to_string()
            })
        );

        assert_eq!(validate_upload(None), Err(CoreError::MissingFile));
    }

    #[test]
    fn test_default_mime() {
        let file = UploadFile::new("bank.csv", "x");
        assert_eq!(file.mime(), "text/csv");
        assert_eq!(file.with_content_type("application/vnd.ms-excel").mime(), "application/vnd.ms-excel");
    }
}
