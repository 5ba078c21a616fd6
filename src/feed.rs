//! RSS rendering of decision records.

use askama::Template;

use crate::config::FinalizeConfig;
use crate::errors::AppError;
use crate::models::event::Event;
use crate::models::feed_item::FeedItem;

pub const CHANNEL_DESCRIPTION: &str = "You will be notified here once a date for this event is decided.";
pub const CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub description: String,
    pub guid: String,
    pub pub_date: String,
}

#[derive(Template)]
#[template(path = "feed.xml")]
pub struct FeedTemplate {
    pub title: String,
    pub link: String,
    pub description: String,
    pub entries: Vec<FeedEntry>,
}

/// Render the RSS 2.0 channel of an event, one item per decision record.
pub fn render_rss(event: &Event, items: &[FeedItem], config: &FinalizeConfig) -> Result<String, AppError> {
    let entries = items
        .iter()
        .map(|item| FeedEntry {
            title: item.title.clone(),
            link: item.link.clone(),
            description: item.description.clone(),
            guid: format!("{}-{}", item.event_id, item.id),
            pub_date: item.created_at.to_rfc2822(),
        })
        .collect();

    let tmpl = FeedTemplate {
        title: event.title.clone(),
        link: config.vote_link(&event.id),
        description: CHANNEL_DESCRIPTION.to_string(),
        entries,
    };
    Ok(tmpl.render()?)
}
