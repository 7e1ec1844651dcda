//! `{{port:NAME}}` / `{{host:NAME}}` placeholders in workflow environment values.

use crate::error::{Error, LookupError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Global template regex compiled once
static TEMPLATE_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_template_regex() -> &'static Regex {
    TEMPLATE_REGEX
        .get_or_init(|| Regex::new(r"\{\{([^}]+)\}\}").expect("static regex pattern is valid"))
}

/// Source of resolved connection parameters.
pub trait ConnectionInfo {
    fn default_port(&self, service: &str) -> std::result::Result<u16, LookupError>;
    fn resolved_host(&self, service: &str) -> std::result::Result<String, LookupError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Port(String),
    Host(String),
}

/// A parsed environment value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut last = 0;

        for cap in get_template_regex().captures_iter(source) {
            let Some(full) = cap.get(0) else { continue };
            if full.start() > last {
                segments.push(Segment::Literal(source[last..full.start()].to_string()));
            }
            let inner = cap[1].trim();
            let (kind, name) = inner.split_once(':').ok_or_else(|| {
                Error::Template(format!(
                    "'{{{{{}}}}}' needs a kind, e.g. {{{{port:{}}}}}",
                    inner, inner
                ))
            })?;
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(Error::Template(format!(
                    "'{}' names no service",
                    full.as_str()
                )));
            }
            segments.push(match kind.trim() {
                "port" => Segment::Port(name),
                "host" => Segment::Host(name),
                other => {
                    return Err(Error::Template(format!(
                        "unknown placeholder kind '{}' in '{}' (expected port or host)",
                        other,
                        full.as_str()
                    )))
                }
            });
            last = full.end();
        }
        if last < source.len() {
            segments.push(Segment::Literal(source[last..].to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Services this template needs connection parameters for.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Port(n) | Segment::Host(n) => Some(n.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn render(&self, info: &dyn ConnectionInfo) -> std::result::Result<String, LookupError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Port(name) => out.push_str(&info.default_port(name)?.to_string()),
                Segment::Host(name) => out.push_str(&info.resolved_host(name)?),
            }
        }
        Ok(out)
    }
}

impl serde::Serialize for Template {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}
