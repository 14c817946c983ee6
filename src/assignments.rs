use std::{fs, io, path::Path};

use log::info;
use thiserror::Error;

use crate::model::AssignmentEvent;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("could not read assignment feed: {0}")]
    Io(#[from] io::Error),
    #[error("assignment feed is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Loads an exported assignment snapshot. A missing file is an empty feed.
pub fn load_feed(path: &Path) -> Result<Vec<AssignmentEvent>, FeedError> {
    if !path.exists() {
        info!(
            "event=feed_load module=assignments status=skipped path={}",
            path.display()
        );
        return Ok(vec![]);
    }
    let content = fs::read_to_string(path)?;
    let assignments = parse_feed(&content)?;
    info!(
        "event=feed_load module=assignments status=ok count={}",
        assignments.len()
    );
    Ok(assignments)
}

pub fn parse_feed(content: &str) -> Result<Vec<AssignmentEvent>, FeedError> {
    if content.trim().is_empty() {
        return Ok(vec![]);
    }
    Ok(serde_json::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_missing_fields() {
        let feed = parse_feed(r#"[{ "due": "2026-05-09T09:00:00" }]"#).unwrap();
        assert_eq!(feed[0].title, "Assignment");
        assert_eq!(feed[0].course, "Canvas course");
        assert_eq!(feed[0].accent_color, None);
        assert_eq!(feed[0].url, None);
    }

    #[test]
    fn reads_color_and_url() {
        let feed = parse_feed(
            r##"[{ "title": "Lab 3", "course": "CS101", "color": "#FFB1B2", "url": "https://example.edu/a/3" }]"##,
        )
        .unwrap();
        assert_eq!(feed[0].accent_color.as_deref(), Some("#FFB1B2"));
        assert_eq!(feed[0].url.as_deref(), Some("https://example.edu/a/3"));
        assert_eq!(feed[0].due, None);
    }

    #[test]
    fn blank_file_is_empty_feed() {
        assert!(parse_feed("  \n").unwrap().is_empty());
    }

    #[test]
    fn rejects_non_array() {
        assert!(parse_feed(r#"{"title": "x"}"#).is_err());
    }
}
