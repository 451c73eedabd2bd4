//! Channel video listing without the YouTube Data API.
//!
//! Videos are scraped from the channel's `/videos` page (`ytInitialData`),
//! falling back to the public RSS feed, which carries no durations or view
//! counts.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use dots_core::models::{ChannelVideo, VideoFeed};
use dots_core::AppError;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

pub const DEFAULT_MAX_RESULTS: usize = 50;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const INITIAL_DATA_MARKER: &str = "var ytInitialData = ";

static HANDLE_IN_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"youtube\.com/(?:@|c/|channel/|user/)([^/\s?]+)").expect("handle pattern is valid")
});
static CHANNEL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""channelId":"([^"]+)""#).expect("channel id pattern is valid")
});
static CANONICAL_CHANNEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<link rel="canonical" href="https://www\.youtube\.com/channel/([^"]+)""#)
        .expect("canonical pattern is valid")
});
static PAGE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title>([^<]+)</title>").expect("title pattern is valid"));
static YOUTUBE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*-\s*YouTube$").expect("suffix pattern is valid"));
static LENGTH_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+):(\d+)(?::(\d+))?").expect("length pattern is valid"));
static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d,]+)").expect("digits pattern is valid"));
static RSS_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<entry>(.*?)</entry>").expect("entry pattern is valid"));
static RSS_VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<yt:videoId>([^<]+)</yt:videoId>").expect("video id pattern is valid")
});
static RSS_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<media:description>([^<]*)</media:description>")
        .expect("description pattern is valid")
});
static RSS_PUBLISHED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<published>([^<]+)</published>").expect("published pattern is valid"));
static RSS_THUMBNAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<media:thumbnail url="([^"]+)""#).expect("thumbnail pattern is valid")
});

#[async_trait]
pub trait VideoFeedClient: Send + Sync {
    async fn get_channel_videos(
        &self,
        channel: &str,
        max_results: usize,
    ) -> Result<VideoFeed, AppError>;
}

/// Channel handle from a handle (`@name`, `name`) or a channel URL.
pub fn extract_handle(channel: &str) -> Result<String> {
    let mut handle = channel.trim().to_string();
    if handle.contains("youtube.com") {
        handle = HANDLE_IN_URL
            .captures(&handle)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| anyhow!("Invalid YouTube channel URL format: {}", channel))?;
    }
    Ok(handle.trim_start_matches('@').to_string())
}

/// `Xh Ym Zs`, dropping leading zero units.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Compact view count: `1.5K`, `2.3M`.
pub fn format_view_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Seconds from a `M:SS` or `H:MM:SS` length label.
fn parse_length_text(text: &str) -> Option<u64> {
    let caps = LENGTH_TEXT.captures(text)?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
    match num(3) {
        Some(seconds) => Some(num(1)? * 3600 + num(2)? * 60 + seconds),
        None => Some(num(1)? * 60 + num(2)?),
    }
}

fn parse_view_count(text: &str) -> u64 {
    DIGITS
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
        .unwrap_or(0)
}

fn decode_xml_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn default_thumbnail(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/hqdefault.jpg", video_id)
}

fn text_of(value: &Value) -> Option<&str> {
    value
        .pointer("/runs/0/text")
        .or_else(|| value.get("simpleText"))
        .and_then(Value::as_str)
}

fn channel_id_from_page(html: &str) -> Option<String> {
    CHANNEL_ID
        .captures(html)
        .or_else(|| CANONICAL_CHANNEL.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn channel_title_from_page(html: &str) -> String {
    PAGE_TITLE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| YOUTUBE_SUFFIX.replace(m.as_str(), "").trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Unknown Channel".to_string())
}

/// Videos embedded in a channel `/videos` page.
pub fn parse_initial_data(html: &str, max_results: usize) -> Result<Vec<ChannelVideo>> {
    let start = html
        .find(INITIAL_DATA_MARKER)
        .context("ytInitialData not found in page")?
        + INITIAL_DATA_MARKER.len();
    let rest = &html[start..];
    let end = rest
        .find(";</script>")
        .context("ytInitialData is not terminated")?;

    let data: Value =
        serde_json::from_str(&rest[..end]).context("ytInitialData is not valid JSON")?;

    let tabs = data
        .pointer("/contents/twoColumnBrowseResultsRenderer/tabs")
        .and_then(Value::as_array)
        .context("Could not find video data structure")?;

    let contents = tabs
        .iter()
        .find_map(|tab| {
            tab.pointer("/tabRenderer/content/richGridRenderer/contents")
                .and_then(Value::as_array)
        })
        .context("Could not find videos tab")?;

    let videos = contents
        .iter()
        .filter_map(|item| item.pointer("/richItemRenderer/content/videoRenderer"))
        .filter_map(|renderer| {
            let id = renderer.get("videoId")?.as_str()?.to_string();
            let title = renderer
                .get("title")
                .and_then(text_of)
                .unwrap_or("Untitled")
                .to_string();
            let thumbnail = renderer
                .pointer("/thumbnail/thumbnails")
                .and_then(Value::as_array)
                .and_then(|thumbs| thumbs.last())
                .and_then(|thumb| thumb.get("url"))
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| default_thumbnail(&id));
            let views = renderer
                .get("viewCountText")
                .and_then(text_of)
                .map(parse_view_count)
                .unwrap_or(0);
            let duration = renderer
                .pointer("/lengthText/simpleText")
                .and_then(Value::as_str)
                .and_then(parse_length_text)
                .map(format_duration)
                .unwrap_or_default();
            let description = renderer
                .get("descriptionSnippet")
                .and_then(text_of)
                .unwrap_or_default()
                .to_string();
            let published_at = renderer
                .pointer("/publishedTimeText/simpleText")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            Some(ChannelVideo {
                video_url: format!("{}{}", WATCH_URL, id),
                id,
                title,
                description,
                thumbnail,
                published_at,
                duration,
                view_count: format_view_count(views),
            })
        })
        .take(max_results)
        .collect();

    Ok(videos)
}

/// Videos listed in a channel RSS feed.
pub fn parse_rss_feed(xml: &str, max_results: usize) -> Vec<ChannelVideo> {
    let capture = |re: &Regex, text: &str| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    };

    RSS_ENTRY
        .captures_iter(xml)
        .filter_map(|caps| {
            let entry = caps.get(1)?.as_str();
            let id = capture(&RSS_VIDEO_ID, entry)?;
            let title = capture(&PAGE_TITLE, entry)
                .map(|t| decode_xml_entities(&t))
                .unwrap_or_else(|| "Untitled".to_string());
            Some(ChannelVideo {
                video_url: format!("{}{}", WATCH_URL, id),
                title,
                description: capture(&RSS_DESCRIPTION, entry)
                    .map(|d| decode_xml_entities(&d))
                    .unwrap_or_default(),
                thumbnail: capture(&RSS_THUMBNAIL, entry).unwrap_or_else(|| default_thumbnail(&id)),
                published_at: capture(&RSS_PUBLISHED, entry).unwrap_or_default(),
                duration: String::new(),
                view_count: String::new(),
                id,
            })
        })
        .take(max_results)
        .collect()
}

pub struct YouTubeClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(http_client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self
            .http_client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Failed to fetch {}: {}", url, status));
        }
        response.text().await.context("Failed to read page body")
    }

    async fn scrape_videos(&self, handle: &str, max_results: usize) -> Result<Vec<ChannelVideo>> {
        let html = self
            .fetch_page(&format!("{}/@{}/videos", self.base_url, handle))
            .await?;
        parse_initial_data(&html, max_results)
    }

    async fn rss_videos(&self, channel_id: &str, max_results: usize) -> Result<Vec<ChannelVideo>> {
        let xml = self
            .fetch_page(&format!(
                "{}/feeds/videos.xml?channel_id={}",
                self.base_url, channel_id
            ))
            .await
            .context("Failed to parse RSS feed")?;
        Ok(parse_rss_feed(&xml, max_results))
    }

    async fn channel_videos(&self, channel: &str, max_results: usize) -> Result<VideoFeed> {
        let handle = extract_handle(channel)?;

        let page = self
            .fetch_page(&format!("{}/@{}", self.base_url, handle))
            .await
            .context("Failed to get channel ID")?;
        let channel_id =
            channel_id_from_page(&page).context("Could not extract channel ID from page")?;
        let channel_title = channel_title_from_page(&page);

        let videos = match self.scrape_videos(&handle, max_results).await {
            Ok(videos) => videos,
            Err(scrape_error) => {
                tracing::warn!(
                    handle = %handle,
                    error = %scrape_error,
                    "Channel page scrape failed, falling back to RSS"
                );
                self.rss_videos(&channel_id, max_results)
                    .await
                    .map_err(|_| scrape_error)?
            }
        };

        Ok(VideoFeed {
            total_videos: videos.len(),
            videos,
            channel_id,
            channel_title,
        })
    }
}

#[async_trait]
impl VideoFeedClient for YouTubeClient {
    async fn get_channel_videos(
        &self,
        channel: &str,
        max_results: usize,
    ) -> Result<VideoFeed, AppError> {
        let feed = self
            .channel_videos(channel, max_results)
            .await
            .map_err(|e| {
                tracing::error!(channel = %channel, error = %e, "Failed to fetch YouTube videos");
                AppError::Upstream(format!("Failed to fetch YouTube videos: {:#}", e))
            })?;

        tracing::info!(
            channel_id = %feed.channel_id,
            total_videos = feed.total_videos,
            "Fetched channel videos"
        );
        Ok(feed)
    }
}
