//! Link Builder
//!
//! Renders marketplace URLs from an identifier triple. Templates use
//! `{publisher}`, `{extension}` and `{version}` placeholders and are parsed
//! once up front, so a malformed template is rejected at configuration time
//! rather than on every request.

use crate::error::VsixError;
use crate::identifier::IdentifierTriple;
use std::fmt;

/// Marketplace item page
pub const DEFAULT_DISPLAY_TEMPLATE: &str =
    "https://marketplace.visualstudio.com/items?itemName={publisher}.{extension}";

/// Direct package download from the publisher's asset gallery
pub const DEFAULT_DOWNLOAD_TEMPLATE: &str = "https://{publisher}.gallery.vsassets.io/_apis/public\
/gallery/publisher/{publisher}/extension/{extension}/{version}\
/assetbyname/Microsoft.VisualStudio.Services.VSIXPackage";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Publisher,
    Extension,
    Version,
}

/// A parsed URL template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTemplate {
    source: String,
    parts: Vec<Part>,
}

impl LinkTemplate {
    pub fn parse(source: &str) -> Result<Self, VsixError> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(VsixError::Template(format!(
                            "unclosed placeholder in '{}'",
                            source
                        )));
                    }

                    let part = match name.as_str() {
                        "publisher" => Part::Publisher,
                        "extension" => Part::Extension,
                        "version" => Part::Version,
                        other => {
                            return Err(VsixError::Template(format!(
                                "unknown placeholder '{{{}}}' in '{}'",
                                other, source
                            )))
                        }
                    };
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(part);
                }
                '}' => {
                    return Err(VsixError::Template(format!(
                        "unbalanced '}}' in '{}'",
                        source
                    )))
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            parts,
        })
    }

    /// Whether the template needs a concrete version to render
    pub fn uses_version(&self) -> bool {
        self.parts.contains(&Part::Version)
    }

    /// Substitute the triple into the template.
    ///
    /// The result must be an absolute URL.
    pub fn render(&self, triple: &IdentifierTriple) -> Result<String, VsixError> {
        let mut out = String::with_capacity(self.source.len() + 32);
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Publisher => out.push_str(triple.publisher()),
                Part::Extension => out.push_str(triple.extension()),
                Part::Version => match triple.version() {
                    Some(version) => out.push_str(version),
                    None => {
                        return Err(VsixError::Template(format!(
                            "'{}' requires a version for {}",
                            self.source, triple
                        )))
                    }
                },
            }
        }

        url::Url::parse(&out)
            .map_err(|e| VsixError::Template(format!("'{}' is not a valid URL: {}", out, e)))?;
        Ok(out)
    }
}

impl fmt::Display for LinkTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Holds the display and download templates
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    display: LinkTemplate,
    download: LinkTemplate,
}

impl LinkBuilder {
    pub fn new(display: LinkTemplate, download: LinkTemplate) -> Result<Self, VsixError> {
        if display.uses_version() {
            return Err(VsixError::Template(format!(
                "display template '{}' must not depend on the version",
                display
            )));
        }
        Ok(Self { display, download })
    }

    /// Marketplace page for the extension; any pinned version is ignored
    pub fn display_link(&self, triple: &IdentifierTriple) -> Result<String, VsixError> {
        self.display.render(triple)
    }

    /// Package location; the triple must carry a concrete version
    pub fn download_link(&self, triple: &IdentifierTriple) -> Result<String, VsixError> {
        self.download.render(triple)
    }

    /// Builder for the public Visual Studio Marketplace
    pub fn marketplace() -> Result<Self, VsixError> {
        Self::new(
            LinkTemplate::parse(DEFAULT_DISPLAY_TEMPLATE)?,
            LinkTemplate::parse(DEFAULT_DOWNLOAD_TEMPLATE)?,
        )
    }
}
