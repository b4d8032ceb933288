//! ArenaScans runs the Madara WordPress theme. Markup differs between theme
//! versions, so every lookup tries a short list of selectors in turn.

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use chrono::NaiveDate;
use fancy_regex::Regex;
use scraper::{ElementRef, Html};
use tankobon_lib::prelude::*;

use crate::{
    fetch::{HttpClient, RequestOptions},
    html::{absolute_url, first_attr, is_http, pattern, selector, text_of},
};

pub const ID: &str = "arenascans";
pub const BASE_URL: &str = "https://arenascan.com";

const SEARCH_ITEMS: [&str; 4] = [".c-tabs-item__content", ".post-item", ".manga-item", ".bsx"];
const CHAPTER_ITEMS: [&str; 2] = [".wp-manga-chapter", "#chapterlist li"];
const PAGE_IMAGES: [&str; 3] = [".reading-content img", ".page-break img", "#readerarea img"];
const LOCKED_CLASSES: [&str; 3] = ["premium", "locked", "vip"];

pub struct ArenaScans {
    client: Arc<HttpClient>,
    base_url: String,
    slug: Regex,
}

impl ArenaScans {
    pub fn new(client: Arc<HttpClient>) -> SourceResult<Self> {
        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            slug: slug_pattern()?,
        })
    }

    async fn fetch_ajax_chapters(&self, manga_id: &str) -> SourceResult<String> {
        let url = format!("{}/wp-admin/admin-ajax.php", self.base_url);
        let form = [("action", "manga_get_chapters"), ("manga", manga_id)];

        self.client
            .post_form(&url, &form, RequestOptions::default().referer(&self.base_url))
            .await
    }
}

/// Elements matched by the first selector in `candidates` that matches anything
fn select_first<'a>(doc: &'a Html, candidates: &[&str]) -> SourceResult<Vec<ElementRef<'a>>> {
    for css in candidates {
        let sel = selector(css)?;
        let found: Vec<_> = doc.select(&sel).collect();
        if !found.is_empty() {
            return Ok(found);
        }
    }

    Ok(vec![])
}

fn slug_pattern() -> SourceResult<Regex> {
    pattern(r"/manga/([^/]+)/")
}

fn manga_slug(slug: &Regex, href: &str) -> SourceResult<Option<String>> {
    let caps = slug
        .captures(href)
        .map_err(|e| SourceError::Unavailable(format!("bad manga link {href:?}: {e}")))?;
    Ok(caps.and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string()))
}

fn parse_search(slug_re: &Regex, base_url: &str, html: &str) -> SourceResult<Vec<TitleCandidate>> {
    let doc = Html::parse_document(html);
    let title_link_sel = selector(".post-title a, .title a, h3 a")?;
    let any_link_sel = selector("a")?;
    let tt_sel = selector(".tt")?;

    let mut candidates: Vec<TitleCandidate> = vec![];
    for item in select_first(&doc, &SEARCH_ITEMS)? {
        let is_bsx = item.value().classes().any(|c| c == "bsx");
        let link = item
            .select(&title_link_sel)
            .next()
            .or_else(|| is_bsx.then(|| item.select(&any_link_sel).next()).flatten());
        let Some(link) = link else {
            continue;
        };

        let mut title = text_of(&link);
        if is_bsx {
            if let Some(tt) = item.select(&tt_sel).next().map(|el| text_of(&el)) {
                title = tt;
            } else if let Some(attr) = first_attr(&link, &["title"]) {
                title = attr;
            }
        }

        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(slug) = manga_slug(slug_re, href)? else {
            continue;
        };
        if title.is_empty() || candidates.iter().any(|c| c.id == slug) {
            continue;
        }

        candidates.push(TitleCandidate {
            source_id: ID.to_string(),
            url: absolute_url(base_url, &format!("/manga/{slug}/")),
            id: slug,
            title,
            alt_titles: vec![],
        });
    }

    Ok(candidates)
}

fn parse_date(text: &str) -> Option<i64> {
    let date = NaiveDate::parse_from_str(text.trim(), "%B %d, %Y").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}

/// Any dash separated part of a class names a locked state, so
/// `premium-block` counts and `unlocked` does not
fn is_locked(item: &ElementRef<'_>) -> bool {
    item.value()
        .classes()
        .flat_map(|class| class.split('-'))
        .any(|part| LOCKED_CLASSES.contains(&part))
}

/// Chapter records from a title page or an ajax fragment, plus the
/// manga post id when the page defers its list to ajax.
fn parse_chapters(base_url: &str, html: &str) -> SourceResult<(Vec<RawChapterRecord>, Option<String>)> {
    let doc = Html::parse_document(html);
    let link_sel = selector("a")?;
    let num_sel = selector(".chapternum")?;
    let date_sel = selector(".chapter-release-date, .chapterdate")?;

    let mut seen = HashSet::new();
    let mut records = vec![];
    for item in select_first(&doc, &CHAPTER_ITEMS)? {
        let Some(link) = item.select(&link_sel).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href").filter(|href| !href.is_empty()) else {
            continue;
        };
        let url = absolute_url(base_url, href);
        if !seen.insert(url.clone()) {
            continue;
        }

        let label = item
            .select(&num_sel)
            .next()
            .map(|el| text_of(&el))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| text_of(&link));

        records.push(RawChapterRecord {
            source_id: ID.to_string(),
            label,
            url,
            uploaded: item
                .select(&date_sel)
                .next()
                .and_then(|el| parse_date(&text_of(&el))),
            locked: is_locked(&item),
        });
    }

    let holder_sel = selector("#manga-chapters-holder")?;
    let manga_id = doc
        .select(&holder_sel)
        .next()
        .and_then(|el| first_attr(&el, &["data-id"]));

    Ok((records, manga_id))
}

fn parse_pages(html: &str) -> SourceResult<Vec<String>> {
    let doc = Html::parse_document(html);

    let mut seen = HashSet::new();
    Ok(select_first(&doc, &PAGE_IMAGES)?
        .iter()
        .filter_map(|img| first_attr(img, &["data-src", "data-lazy-src", "src"]))
        .filter(|src| is_http(src))
        .filter(|src| seen.insert(src.clone()))
        .collect())
}

#[async_trait]
impl Source for ArenaScans {
    fn source_info(&self) -> SourceInfo {
        SourceInfo {
            id: ID.to_string(),
            name: "Arena Scans".to_string(),
            url: BASE_URL.to_string(),
            version: tankobon_lib::LIB_VERSION.to_string(),
        }
    }

    async fn resolve(&self, query: &str) -> SourceResult<Vec<TitleCandidate>> {
        let url = format!("{}/", self.base_url);
        let params = [("s", query), ("post_type", "wp-manga")];
        let html = self
            .client
            .get_text(&url, RequestOptions::query(&params).referer(&self.base_url))
            .await?;

        let candidates = parse_search(&self.slug, &self.base_url, &html)?;
        if candidates.is_empty() {
            return Err(SourceError::NotFound(format!("no arenascans title for {query:?}")));
        }

        Ok(candidates)
    }

    async fn list_chapters(&self, title: &TitleMatch) -> SourceResult<ChapterListing> {
        let url = absolute_url(&self.base_url, &format!("/manga/{}/", title.id));
        let html = self
            .client
            .get_text(&url, RequestOptions::default().referer(&self.base_url))
            .await?;

        let (mut records, manga_id) = parse_chapters(&self.base_url, &html)?;
        if records.is_empty() {
            if let Some(manga_id) = manga_id {
                debug!("arenascans: {} lists chapters over ajax, post {manga_id}", title.id);
                let fragment = self.fetch_ajax_chapters(&manga_id).await?;
                (records, _) = parse_chapters(&self.base_url, &fragment)?;
            }
        }
        info!("arenascans: {} chapters for {}", records.len(), title.title);

        Ok(ChapterListing::complete(records))
    }

    async fn fetch_pages(&self, path: &str) -> SourceResult<Vec<String>> {
        let url = absolute_url(&self.base_url, path);
        let html = self
            .client
            .get_text(&url, RequestOptions::default().referer(&self.base_url))
            .await?;

        let pages = parse_pages(&html)?;
        if pages.is_empty() {
            return Err(SourceError::Unavailable(format!("no reader images at {url}")));
        }

        Ok(pages)
    }
}
