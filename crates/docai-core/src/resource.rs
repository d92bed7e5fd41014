//! Processor addressing: resource names and regional endpoints.

use std::fmt;

use crate::ProcessError;

/// Host suffix of the regional Document AI service.
pub const SERVICE_HOST: &str = "documentai.googleapis.com";

/// Port the regional service listens on.
pub const SERVICE_PORT: u16 = 443;

/// Identifies a remote processor by project, location, and processor id.
///
/// Every identifier is non-empty and limited to ASCII alphanumerics, `-`,
/// `_` and `.`, so the derived resource name always has exactly six path
/// segments and the location always yields a `documentai.googleapis.com`
/// subdomain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorReference {
    project: String,
    location: String,
    processor: String,
}

impl ProcessorReference {
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        processor: impl Into<String>,
    ) -> Result<Self, ProcessError> {
        let project = project.into();
        let location = location.into();
        let processor = processor.into();

        check_segment("project", &project)?;
        check_segment("location", &location)?;
        check_segment("processor", &processor)?;

        Ok(Self {
            project,
            location,
            processor,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn processor(&self) -> &str {
        &self.processor
    }

    /// `projects/{project}/locations/{location}/processors/{processor}`
    pub fn resource_name(&self) -> String {
        format!(
            "projects/{}/locations/{}/processors/{}",
            self.project, self.location, self.processor
        )
    }

    /// The regional endpoint serving this processor's location.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::for_location(&self.location)
    }
}

impl fmt::Display for ProcessorReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.resource_name())
    }
}

fn check_segment(field: &str, value: &str) -> Result<(), ProcessError> {
    if value.trim().is_empty() {
        return Err(ProcessError::InvalidReference(format!("{field} is empty")));
    }
    if let Some(c) = value.chars().find(|c| !is_id_char(*c)) {
        return Err(ProcessError::InvalidReference(format!(
            "{field} {value:?} contains {c:?}"
        )));
    }
    Ok(())
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// A `host:port` pair the client connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// `{location}-documentai.googleapis.com:443`
    pub fn for_location(location: &str) -> Self {
        Self {
            host: format!("{location}-{SERVICE_HOST}"),
            port: SERVICE_PORT,
        }
    }

    /// Base URL for the REST surface of this endpoint.
    pub fn base_url(&self) -> String {
        format!("https://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_name_from_literals() {
        let r = ProcessorReference::new("my-proj", "us", "abc123").unwrap();
        assert_eq!(
            r.resource_name(),
            "projects/my-proj/locations/us/processors/abc123"
        );
        assert_eq!(r.to_string(), r.resource_name());
    }

    #[test]
    fn endpoint_for_us() {
        let r = ProcessorReference::new("my-proj", "us", "abc123").unwrap();
        assert_eq!(r.endpoint().to_string(), "us-documentai.googleapis.com:443");
    }

    #[test]
    fn endpoint_for_eu() {
        let e = Endpoint::for_location("eu");
        assert_eq!(e.host, "eu-documentai.googleapis.com");
        assert_eq!(e.port, 443);
        assert_eq!(e.base_url(), "https://eu-documentai.googleapis.com:443");
    }

    #[test]
    fn empty_fields_rejected() {
        for (p, l, x) in [("", "us", "abc"), ("p", "", "abc"), ("p", "us", "  ")] {
            let err = ProcessorReference::new(p, l, x).unwrap_err();
            assert!(matches!(err, ProcessError::InvalidReference(_)), "{err}");
        }
    }

    #[test]
    fn slash_rejected() {
        let err = ProcessorReference::new("p", "us/central", "abc").unwrap_err();
        match err {
            ProcessError::InvalidReference(msg) => assert!(msg.contains("location")),
            other => panic!("expected InvalidReference, got {other:?}"),
        }
    }

    #[test]
    fn url_delimiters_in_location_rejected() {
        for loc in ["attacker.example?", "x@attacker.example#", "us:8443#", "us central"] {
            let err = ProcessorReference::new("my-proj", loc, "abc123").unwrap_err();
            assert!(matches!(err, ProcessError::InvalidReference(_)), "{loc}: {err}");
        }
    }

    #[test]
    fn url_delimiters_in_project_and_processor_rejected() {
        for (p, x) in [("my-proj?x=1", "abc123"), ("my-proj", "abc#frag"), ("a:b", "abc")] {
            let err = ProcessorReference::new(p, "us", x).unwrap_err();
            assert!(matches!(err, ProcessError::InvalidReference(_)), "{err}");
        }
    }

    #[test]
    fn project_ids_with_dots_accepted() {
        let r = ProcessorReference::new("example.com.my-proj", "eu", "a_1").unwrap();
        assert_eq!(r.endpoint().host, "eu-documentai.googleapis.com");
    }
}
