use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use fancy_regex::Regex;
use scraper::{ElementRef, Html};
use tankobon_lib::prelude::*;

use crate::{
    fetch::{HttpClient, MOBILE_USER_AGENT, RequestOptions},
    html::{
        absolute_url, first_attr, is_http, pattern, query_param, selector, strip_query, text_of,
    },
};

pub const ID: &str = "webtoon";
pub const BASE_URL: &str = "https://www.webtoons.com";
pub const MOBILE_URL: &str = "https://m.webtoons.com";

const REFERER: &str = "https://www.webtoons.com/";

/// Patterns matched against raw list markup
struct Patterns {
    page: Regex,
    app_only: Regex,
}

impl Patterns {
    fn new() -> SourceResult<Self> {
        Ok(Self {
            page: pattern(r"[?&](?:amp;)?page=(\d+)")?,
            app_only: pattern(
                r"(?i)Read\s*(?:<em>)?(\d+)(?:</em>)?\s*new episodes only on the app!",
            )?,
        })
    }
}

pub struct Webtoon {
    client: Arc<HttpClient>,
    base_url: String,
    mobile_url: String,
    pagination: PaginationConfig,
    patterns: Patterns,
}

impl Webtoon {
    pub fn new(client: Arc<HttpClient>, pagination: PaginationConfig) -> SourceResult<Self> {
        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            mobile_url: MOBILE_URL.to_string(),
            pagination,
            patterns: Patterns::new()?,
        })
    }

    async fn fetch_list_page(
        &self,
        list_url: &str,
        title_no: &str,
        req: PageRequest,
    ) -> SourceResult<Page<RawChapterRecord>> {
        let page = req.index.to_string();
        let query = [("title_no", title_no), ("page", page.as_str())];
        let html = self
            .client
            .get_text(list_url, RequestOptions::query(&query).referer(REFERER))
            .await?;

        parse_list_page(&self.patterns, &self.base_url, &html, req.index)
    }

    /// Number of newer episodes the mobile site only offers in the app
    async fn app_only_count(&self, title_no: &str) -> usize {
        let url = format!("{}/en/fantasy/dummy/list", self.mobile_url);
        let query = [("title_no", title_no)];
        let opts = RequestOptions::query(&query).user_agent(MOBILE_USER_AGENT);

        let html = self.client.get_text(&url, opts).await;
        match html.and_then(|html| parse_app_only_count(&self.patterns, &html)) {
            Ok(count) => count,
            Err(e) => {
                warn!("webtoon: app only check failed for {title_no}: {e}");
                0
            }
        }
    }
}

fn search_title(item: &ElementRef<'_>) -> SourceResult<Option<String>> {
    let title_sel = selector("strong, .subj")?;
    if let Some(el) = item.select(&title_sel).next() {
        let title = text_of(&el);
        return Ok(Some(title).filter(|t| !t.is_empty()));
    }

    let div_sel = selector("div")?;
    Ok(item
        .select(&div_sel)
        .map(|el| text_of(&el))
        .find(|t| t.chars().count() > 2 && t != "UP" && t != "NEW"))
}

fn parse_search(base_url: &str, html: &str) -> SourceResult<Vec<TitleCandidate>> {
    let doc = Html::parse_document(html);
    let card_sel = selector("li .card_item, li ._card_item, a._card_item")?;
    let generic_sel = selector(r#"a[href*="title_no="]"#)?;
    let link_sel = selector("a")?;

    let mut items: Vec<ElementRef<'_>> = doc.select(&card_sel).collect();
    if items.is_empty() {
        debug!("webtoon: no search cards, falling back to title_no links");
        items = doc.select(&generic_sel).collect();
    }

    let mut candidates: Vec<TitleCandidate> = vec![];
    for item in items {
        let link = if item.value().name() == "a" {
            Some(item)
        } else {
            item.select(&link_sel).next()
        };
        let Some(href) = link.and_then(|link| link.value().attr("href")) else {
            continue;
        };
        let Some(id) = query_param(href, "title_no") else {
            continue;
        };
        if candidates.iter().any(|c| c.id == id) {
            continue;
        }
        let Some(title) = search_title(&item)? else {
            continue;
        };

        candidates.push(TitleCandidate {
            source_id: ID.to_string(),
            id,
            title,
            url: absolute_url(base_url, href),
            alt_titles: vec![],
        });
    }

    Ok(candidates)
}

fn parse_date(text: &str) -> Option<i64> {
    let date = NaiveDate::parse_from_str(text.trim(), "%b %d, %Y").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}

/// Label keyed on `episode_no`, numbers in the subject are only display text
fn episode_label(episode_no: &str, subject: &str) -> String {
    let plain = format!("Episode {episode_no}");
    if subject.is_empty() || subject.eq_ignore_ascii_case(&plain) {
        plain
    } else {
        format!("{plain} - {subject}")
    }
}

fn regex_failure(e: fancy_regex::Error) -> SourceError {
    SourceError::Unavailable(format!("webtoon markup did not match: {e}"))
}

/// Highest page number linked from the pager, never below `current`
fn max_page(patterns: &Patterns, doc: &Html, html: &str, current: usize) -> SourceResult<usize> {
    let pager_sel = selector(".paginate a")?;

    let mut max = current.max(1);
    for link in doc.select(&pager_sel) {
        if let Some(page) = link
            .value()
            .attr("href")
            .and_then(|href| query_param(href, "page"))
            .and_then(|page| page.parse::<usize>().ok())
        {
            max = max.max(page);
        }
        if let Ok(page) = text_of(&link).parse::<usize>() {
            max = max.max(page);
        }
    }

    for caps in patterns.page.captures_iter(html) {
        let caps = caps.map_err(regex_failure)?;
        if let Some(page) = caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) {
            max = max.max(page);
        }
    }

    Ok(max)
}

fn parse_list_page(
    patterns: &Patterns,
    base_url: &str,
    html: &str,
    index: usize,
) -> SourceResult<Page<RawChapterRecord>> {
    let doc = Html::parse_document(html);
    let item_sel = selector("#_listUl li")?;
    let link_sel = selector("a")?;
    let subj_span_sel = selector(".subj span")?;
    let subj_sel = selector(".subj")?;
    let date_sel = selector(".date")?;

    let mut episodes = vec![];
    let mut items = vec![];
    for item in doc.select(&item_sel) {
        let Some(href) = item
            .select(&link_sel)
            .next()
            .and_then(|link| link.value().attr("href"))
        else {
            continue;
        };
        let Some(episode_no) = query_param(href, "episode_no") else {
            continue;
        };

        let subject = item
            .select(&subj_span_sel)
            .next()
            .or_else(|| item.select(&subj_sel).next())
            .map(|el| text_of(&el))
            .unwrap_or_default();

        items.push(RawChapterRecord {
            source_id: ID.to_string(),
            label: episode_label(&episode_no, &subject),
            url: absolute_url(base_url, href),
            uploaded: item
                .select(&date_sel)
                .next()
                .and_then(|el| parse_date(&text_of(&el))),
            locked: false,
        });
        episodes.push(episode_no);
    }

    Ok(Page {
        items,
        signature: episodes.join(","),
        next_cursor: None,
        total: Some(PageTotal::Pages(max_page(patterns, &doc, html, index)?)),
    })
}

fn parse_app_only_count(patterns: &Patterns, html: &str) -> SourceResult<usize> {
    let count = patterns
        .app_only
        .captures(html)
        .map_err(regex_failure)?
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);

    Ok(count)
}

fn episode_no(record: &RawChapterRecord) -> Option<u64> {
    query_param(&record.url, "episode_no")?.parse().ok()
}

/// Placeholder records for episodes that are announced but only readable in the app
fn app_only_records(base_url: &str, title_no: &str, newest: u64, count: usize) -> Vec<RawChapterRecord> {
    (1..=count as u64)
        .map(|k| newest + k)
        .map(|no| RawChapterRecord {
            source_id: ID.to_string(),
            label: format!("Episode {no}"),
            url: format!(
                "{base_url}/en/genre/title/episode/viewer?title_no={title_no}&episode_no={no}"
            ),
            uploaded: None,
            locked: true,
        })
        .collect()
}

fn parse_pages(html: &str) -> SourceResult<Vec<String>> {
    let doc = Html::parse_document(html);
    let img_sel = selector(".viewer_img img")?;

    Ok(doc
        .select(&img_sel)
        .filter_map(|img| first_attr(&img, &["data-url"]))
        .filter(|url| is_http(url))
        .collect())
}

#[async_trait]
impl Source for Webtoon {
    fn source_info(&self) -> SourceInfo {
        SourceInfo {
            id: ID.to_string(),
            name: "WEBTOON".to_string(),
            url: BASE_URL.to_string(),
            version: tankobon_lib::LIB_VERSION.to_string(),
        }
    }

    async fn resolve(&self, query: &str) -> SourceResult<Vec<TitleCandidate>> {
        let url = format!("{}/en/search", self.base_url);
        let params = [("keyword", query)];
        let html = self
            .client
            .get_text(&url, RequestOptions::query(&params).referer(REFERER))
            .await?;

        let candidates = parse_search(&self.base_url, &html)?;
        if candidates.is_empty() {
            return Err(SourceError::NotFound(format!("no webtoon for {query:?}")));
        }

        Ok(candidates)
    }

    async fn list_chapters(&self, title: &TitleMatch) -> SourceResult<ChapterListing> {
        // the canonical list url keeps its genre path, redirects would drop the page param
        let list_url = match strip_query(&title.url) {
            url if is_http(url) => url.to_string(),
            _ => format!("{}/en/genre/title/list", self.base_url),
        };
        let list_url = list_url.as_str();
        let title_no = title.id.as_str();

        let result = paginate(
            &self.pagination,
            |record: &RawChapterRecord| record.url.clone(),
            move |req| self.fetch_list_page(list_url, title_no, req),
        )
        .await?;
        info!("webtoon: {} episodes over {} pages", result.items.len(), result.pages);

        let mut records = result.items;
        let app_only = self.app_only_count(title_no).await;
        if app_only > 0 {
            let newest = records.iter().filter_map(episode_no).max().unwrap_or(0);
            info!("webtoon: {app_only} episodes after {newest} are app only");
            records.extend(app_only_records(&self.base_url, title_no, newest, app_only));
        }

        Ok(ChapterListing {
            records,
            pagination: result.status,
        })
    }

    async fn fetch_pages(&self, path: &str) -> SourceResult<Vec<String>> {
        let url = absolute_url(&self.base_url, path);
        let html = self
            .client
            .get_text(&url, RequestOptions::default().referer(REFERER))
            .await?;

        let pages = parse_pages(&html)?;
        if pages.is_empty() {
            return Err(SourceError::Unavailable(format!("no viewer images at {url}")));
        }

        Ok(pages)
    }
}
