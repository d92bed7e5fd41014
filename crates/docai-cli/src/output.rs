use std::io::Write;
use std::path::PathBuf;

use docai_core::ProcessingResult;
use owo_colors::OwoColorize;

use crate::settings::Settings;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print page and entity counts for a processed document.
pub fn print_summary(
    w: &mut dyn Write,
    result: &ProcessingResult,
    color: ColorMode,
) -> std::io::Result<()> {
    let doc = result.document();
    writeln!(w)?;
    if color.enabled() {
        writeln!(w, "{}", "SUMMARY".bold())?;
    } else {
        writeln!(w, "SUMMARY")?;
    }
    writeln!(w, "  Characters: {}", result.text().chars().count())?;
    writeln!(w, "  Pages: {}", doc.pages.len())?;
    if let Some(ref mime) = doc.mime_type {
        writeln!(w, "  MIME type: {}", mime)?;
    }

    if doc.entities.is_empty() {
        let msg = "No entities extracted";
        if color.enabled() {
            writeln!(w, "  {}", msg.dimmed())?;
        } else {
            writeln!(w, "  {}", msg)?;
        }
        return Ok(());
    }

    writeln!(w, "  Entities: {}", doc.entities.len())?;
    for entity in &doc.entities {
        let line = format!(
            "{} = {:?} ({:.0}%)",
            entity.entity_type,
            truncate(&entity.mention_text, 60),
            entity.confidence * 100.0
        );
        if color.enabled() && entity.confidence < 0.5 {
            writeln!(w, "    {}", line.yellow())?;
        } else {
            writeln!(w, "    {}", line)?;
        }
    }
    Ok(())
}

/// Print the resolved configuration. The access token is never shown.
pub fn print_config(
    w: &mut dyn Write,
    settings: &Settings,
    files: &[(PathBuf, bool)],
    color: ColorMode,
) -> std::io::Result<()> {
    let unset = "(unset)";
    let rows = [
        ("project", settings.project.as_deref().unwrap_or(unset)),
        ("location", settings.location.as_str()),
        ("processor", settings.processor.as_deref().unwrap_or(unset)),
        (
            "api_endpoint",
            settings.api_endpoint.as_deref().unwrap_or("(regional default)"),
        ),
        (
            "access_token",
            if settings.access_token.is_some() {
                "*** (config)"
            } else {
                "(environment)"
            },
        ),
        (
            "mime_type",
            settings.default_mime_type.as_deref().unwrap_or("(guessed)"),
        ),
    ];

    for (key, value) in rows {
        if color.enabled() {
            writeln!(w, "{:>14} {}", key.bold(), value)?;
        } else {
            writeln!(w, "{:>14} {}", key, value)?;
        }
    }

    writeln!(w)?;
    writeln!(w, "Config files:")?;
    for (path, present) in files {
        let marker = if *present { "found" } else { "missing" };
        if color.enabled() && !present {
            writeln!(w, "  {} {}", path.display(), marker.dimmed())?;
        } else {
            writeln!(w, "  {} {}", path.display(), marker)?;
        }
    }
    Ok(())
}

/// Print a failure to stderr-style output.
pub fn print_error(w: &mut dyn Write, err: &anyhow::Error, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "error:".red().bold(), err)?;
    } else {
        writeln!(w, "error: {}", err)?;
    }
    for cause in err.chain().skip(1) {
        writeln!(w, "  caused by: {}", cause)?;
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn config_listing_hides_token() {
        let settings = Settings {
            project: Some("my-proj".into()),
            location: "us".into(),
            access_token: Some("ya29.secret".into()),
            ..Default::default()
        };
        let mut out = Vec::new();
        print_config(
            &mut out,
            &settings,
            &[(PathBuf::from(".docai.toml"), false)],
            ColorMode(false),
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("my-proj"));
        assert!(text.contains(".docai.toml missing"));
        assert!(!text.contains("ya29.secret"));
    }

    #[test]
    fn error_lists_causes() {
        let err = anyhow::anyhow!("inner").context("outer");
        let mut out = Vec::new();
        print_error(&mut out, &err, ColorMode(false)).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "error: outer\n  caused by: inner\n"
        );
    }
}
