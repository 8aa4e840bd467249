//! Markdown to HTML with console blocks turned into animation containers.
//!
//! Each console block becomes an empty `div.termynal` carrying the widget
//! options and line data as JSON attributes. Links to external sites open in
//! a new tab.

use std::fmt;
use std::ops::Range;

use pulldown_cmark::{CowStr, Event, Parser as CmarkParser, Tag, TagEnd, html};
use pulldown_cmark_escape::{escape_href, escape_html};

use crate::config::AnimationConfig;
use crate::document::{OPTIONS, collect_code, console_language};
use crate::parser::{ParseError, Parser};

#[derive(Debug)]
pub enum RenderError {
    Json(serde_json::Error),
    Write(fmt::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Json(e) => write!(f, "cannot encode line data: {}", e),
            RenderError::Write(e) => write!(f, "cannot write html: {}", e),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<serde_json::Error> for RenderError {
    fn from(e: serde_json::Error) -> Self {
        RenderError::Json(e)
    }
}

impl From<fmt::Error> for RenderError {
    fn from(e: fmt::Error) -> Self {
        RenderError::Write(e)
    }
}

#[derive(Debug)]
pub struct RenderedPage {
    pub html: String,
    /// Number of animation containers emitted.
    pub animations: usize,
    pub warnings: Vec<ParseError>,
}

pub struct Renderer<'a, S> {
    languages: &'a [S],
    config: AnimationConfig,
}

impl<'a, S: AsRef<str>> Renderer<'a, S> {
    pub fn new(languages: &'a [S], config: AnimationConfig) -> Self {
        Renderer { languages, config }
    }

    pub fn render(&self, source: &str, file_id: usize) -> Result<RenderedPage, RenderError> {
        let events: Vec<(Event<'_>, Range<usize>)> =
            CmarkParser::new_ext(source, OPTIONS).into_offset_iter().collect();
        let options = serde_json::to_string(&self.config)?;

        let mut out: Vec<Event<'_>> = Vec::with_capacity(events.len());
        let mut warnings = Vec::new();
        let mut animations = 0;
        // One entry per open link: whether it was rewritten.
        let mut links: Vec<bool> = Vec::new();

        let mut i = 0;
        while i < events.len() {
            let (ref ev, ref range) = events[i];
            i += 1;

            if console_language(ev, self.languages).is_some() {
                let (content, offset, _) = collect_code(&events, &mut i, range.start);
                let mut transcript = Parser::new(&content, file_id).at_offset(offset).parse();
                let lines = serde_json::to_string(&transcript.lines)?;
                let mut div = String::from("<div class=\"termynal\" data-termynal-options=\"");
                escape_html(&mut div, &options)?;
                div.push_str("\" data-termynal-lines=\"");
                escape_html(&mut div, &lines)?;
                div.push_str("\"></div>\n");
                out.push(Event::Html(CowStr::from(div)));
                warnings.append(&mut transcript.warnings);
                animations += 1;
                continue;
            }

            match ev {
                Event::Start(Tag::Link {
                    dest_url, title, ..
                }) if is_external(dest_url) => {
                    let mut tag = String::from("<a href=\"");
                    escape_href(&mut tag, dest_url)?;
                    if !title.is_empty() {
                        tag.push_str("\" title=\"");
                        escape_html(&mut tag, title)?;
                    }
                    tag.push('"');
                    tag.push_str(" target=\"_blank\">");
                    out.push(Event::InlineHtml(CowStr::from(tag)));
                    links.push(true);
                }
                Event::Start(Tag::Link { .. }) => {
                    out.push(ev.clone());
                    links.push(false);
                }
                Event::End(TagEnd::Link) => {
                    if links.pop().unwrap_or(false) {
                        out.push(Event::InlineHtml(CowStr::Borrowed("</a>")));
                    } else {
                        out.push(ev.clone());
                    }
                }
                _ => out.push(ev.clone()),
            }
        }

        let mut html_out = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut html_out, out.into_iter());
        Ok(RenderedPage {
            html: html_out,
            animations,
            warnings,
        })
    }
}

fn is_external(dest: &str) -> bool {
    dest.starts_with("http://") || dest.starts_with("https://") || dest.starts_with("//")
}
