use crate::error::{Result, SonarError};
use crate::models::RenderType;

/// Inline flag requesting a video render instead of a still image.
pub const VIDEO_FLAG: &str = "-webm";
/// Inline flag requesting the quote only, with no render.
pub const TEXT_FLAG: &str = "-text";

pub const USAGE: &str = "usage: sonar <query> [-webm] [-text]";

/// A parsed `sonar` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SonarCommand {
    pub query: String,
    pub render_type: RenderType,
    pub text_only: bool,
}

impl SonarCommand {
    /// Parse the argument text of a command. Flag tokens may appear anywhere
    /// and are removed from the query.
    pub fn parse(args: &str) -> Result<Self> {
        let mut render_type = RenderType::Image;
        let mut text_only = false;
        let mut words = Vec::new();

        for token in args.split_whitespace() {
            match token {
                VIDEO_FLAG => render_type = RenderType::Video,
                TEXT_FLAG => text_only = true,
                word => words.push(word),
            }
        }

        if words.is_empty() {
            return Err(SonarError::InvalidInput("missing search query".to_string()));
        }

        Ok(Self {
            query: words.join(" "),
            render_type,
            text_only,
        })
    }
}

/// If `line` invokes `trigger` (e.g. `.sonar`), return the argument text.
pub fn strip_trigger<'a>(line: &'a str, trigger: &str) -> Option<&'a str> {
    let rest = line.trim_start().strip_prefix(trigger)?;
    if rest.is_empty() {
        Some(rest)
    } else if rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}
