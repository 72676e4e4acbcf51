//! RSS 2.0 feed fetcher.
//!
//! Items need both a `<link>` and a `<title>`. Descriptions may carry HTML,
//! entity-escaped or in CDATA; either way it is decoded first and then
//! reduced to plain text. Unknown entities are kept as written.
//!
//! `<pubDate>` is parsed as RFC 2822; an unparseable date leaves the
//! article undated.

use super::Fetcher;
use crate::error::FetchError;
use crate::models::RawArticle;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use reqwest::Client;
use scraper::Html;
use std::time::Duration as StdDuration;
use tracing::{debug, instrument};
use url::Url;

const USER_AGENT: &str = concat!("cn_econ_news/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct RssFetcher {
    source: String,
    url: String,
    client: Client,
    max_items: usize,
}

impl RssFetcher {
    pub fn new(
        source: impl Into<String>,
        url: impl Into<String>,
        max_items: usize,
        timeout: StdDuration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            source: source.into(),
            url: url.into(),
            client,
            max_items,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Fetcher for RssFetcher {
    fn source(&self) -> &str {
        &self.source
    }

    #[instrument(level = "info", skip_all, fields(source = %self.source, url = %self.url))]
    async fn fetch(&self) -> Result<Vec<RawArticle>, FetchError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let base = Url::parse(&self.url).ok();
        let articles = parse_feed(&body, &self.source, base.as_ref(), self.max_items)?;
        debug!(count = articles.len(), "Parsed feed");
        Ok(articles)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Description,
    PubDate,
}

#[derive(Debug, Default)]
struct ItemFields {
    title: String,
    link: String,
    description: String,
    pub_date: String,
}

impl ItemFields {
    fn push(&mut self, field: Field, text: &str) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
            Field::PubDate => &mut self.pub_date,
        };
        slot.push_str(text);
    }

    fn into_article(self, source: &str, base: Option<&Url>) -> Option<RawArticle> {
        let title = self.title.trim().to_string();
        let link = self.link.trim();
        if title.is_empty() || link.is_empty() {
            return None;
        }
        let original_url = match base {
            Some(base) => base.join(link).ok()?.to_string(),
            None => link.to_string(),
        };
        Some(RawArticle {
            source: source.to_string(),
            original_url,
            title,
            content: strip_html(&self.description),
            published_at: DateTime::parse_from_rfc2822(self.pub_date.trim())
                .ok()
                .map(|d| d.with_timezone(&Utc)),
        })
    }
}

/// Parse an RSS document into at most `max_items` articles.
///
/// The first `max_items` `<item>` elements are considered; those missing a
/// link or title are dropped, so fewer may be returned.
pub fn parse_feed(
    xml: &str,
    source: &str,
    base: Option<&Url>,
    max_items: usize,
) -> Result<Vec<RawArticle>, FetchError> {
    let mut reader = Reader::from_str(xml);
    // Entity references arrive as separate events, so text around them is
    // kept verbatim and fields are trimmed once the item is complete.
    reader.config_mut().trim_text(false);

    let mut articles = Vec::new();
    let mut seen_items = 0usize;
    let mut current: Option<ItemFields> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"item" => current = Some(ItemFields::default()),
                b"title" => field = Some(Field::Title),
                b"link" => field = Some(Field::Link),
                b"description" => field = Some(Field::Description),
                b"pubDate" => field = Some(Field::PubDate),
                _ => field = None,
            },
            Ok(Event::Text(t)) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    item.push(f, &String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Ok(Event::CData(t)) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    item.push(f, &String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Ok(Event::GeneralRef(r)) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    let resolved = match r.resolve_char_ref() {
                        Ok(Some(ch)) => ch.to_string(),
                        _ => {
                            let name = String::from_utf8_lossy(&r).into_owned();
                            resolve_predefined_entity(&name)
                                .map_or_else(|| format!("&{name};"), str::to_string)
                        }
                    };
                    item.push(f, &resolved);
                }
            }
            Ok(Event::End(e)) => {
                field = None;
                if e.local_name().as_ref() == b"item" {
                    if let Some(item) = current.take() {
                        seen_items += 1;
                        articles.extend(item.into_article(source, base));
                        if seen_items >= max_items {
                            break;
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FetchError::Feed {
                    feed: source.to_string(),
                    message: format!("malformed XML at {}: {e}", reader.buffer_position()),
                });
            }
            _ => {}
        }
    }

    Ok(articles)
}

/// Reduce an HTML fragment to whitespace-normalized text.
pub fn strip_html(fragment: &str) -> String {
    let doc = Html::parse_fragment(fragment);
    doc.root_element().text().flat_map(str::split_whitespace).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>36氪</title>
    <link>https://36kr.com</link>
    <item>
      <title>AI芯片市场规模突破千亿</title>
      <link>https://36kr.com/p/1001</link>
      <description><![CDATA[<p>国内<b>AI芯片</b>厂商加速扩产。</p><p>融资规模创新高。</p>]]></description>
      <pubDate>Tue, 06 May 2025 08:30:00 +0800</pubDate>
    </item>
    <item>
      <title>没有链接的条目</title>
      <description>忽略</description>
    </item>
    <item>
      <title><![CDATA[新能源车出口增长]]></title>
      <link>/p/1003</link>
      <pubDate>not a date</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed_items() {
        let base = Url::parse("https://36kr.com/feed").unwrap();
        let articles = parse_feed(FEED, "36kr", Some(&base), 20).unwrap();
        assert_eq!(articles.len(), 2);

        let first = &articles[0];
        assert_eq!(first.source, "36kr");
        assert_eq!(first.title, "AI芯片市场规模突破千亿");
        assert_eq!(first.original_url, "https://36kr.com/p/1001");
        assert_eq!(first.content, "国内 AI芯片 厂商加速扩产。 融资规模创新高。");
        assert_eq!(
            first.published_at,
            Some(Utc.with_ymd_and_hms(2025, 5, 6, 0, 30, 0).unwrap())
        );

        let second = &articles[1];
        assert_eq!(second.title, "新能源车出口增长");
        assert_eq!(second.original_url, "https://36kr.com/p/1003");
        assert!(second.published_at.is_none());
        assert!(second.content.is_empty());
    }

    #[test]
    fn test_entity_escaped_item() {
        let xml = "<rss><channel><item>\
            <title>AT&amp;T 与 华为 &#x4E2D;标</title>\
            <link>https://a.com/x?a=1&amp;b=2</link>\
            <description>&lt;p&gt;国内&lt;b&gt;芯片&lt;/b&gt;扩产&lt;/p&gt;</description>\
            </item></channel></rss>";
        let articles = parse_feed(xml, "36kr", None, 20).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "AT&T 与 华为 中标");
        assert_eq!(articles[0].original_url, "https://a.com/x?a=1&b=2");
        assert_eq!(articles[0].content, "国内 芯片 扩产");
    }

    #[test]
    fn test_entities_survive_link_resolution() {
        let base = Url::parse("https://www.huxiu.com/rss/0.xml").unwrap();
        let xml = "<rss><channel><item>\
            <title>&quot;十五五&quot;规划 &#20013;国经济</title>\
            <link>/article/1.html?from=rss&amp;id=7</link>\
            <description>利润&gt;预期 &nbsp;</description>\
            </item></channel></rss>";
        let articles = parse_feed(xml, "huxiu", Some(&base), 20).unwrap();
        assert_eq!(articles[0].title, "\"十五五\"规划 中国经济");
        assert_eq!(
            articles[0].original_url,
            "https://www.huxiu.com/article/1.html?from=rss&id=7"
        );
        // Unknown XML entities are left for the HTML pass to decode.
        assert_eq!(articles[0].content, "利润>预期");
    }

    #[test]
    fn test_max_items_counts_raw_entries() {
        // The second entry is dropped but still counts toward the limit.
        let articles = parse_feed(FEED, "36kr", None, 2).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].original_url, "https://36kr.com/p/1001");
    }

    #[test]
    fn test_channel_title_is_not_an_item() {
        let articles = parse_feed(FEED, "36kr", None, 20).unwrap();
        assert!(articles.iter().all(|a| a.title != "36氪"));
    }

    #[test]
    fn test_malformed_feed_is_an_error() {
        let err = parse_feed("<rss><channel><item></channel></rss>", "huxiu", None, 20).unwrap_err();
        assert!(matches!(err, FetchError::Feed { ref feed, .. } if feed == "huxiu"));
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<div>  一季度 <span>GDP</span>\n增长</div>"), "一季度 GDP 增长");
        assert_eq!(strip_html("纯文本"), "纯文本");
        assert_eq!(strip_html(""), "");
    }
}
