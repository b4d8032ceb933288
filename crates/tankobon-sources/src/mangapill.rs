use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use scraper::Html;
use tankobon_lib::prelude::*;

use crate::{
    fetch::{HttpClient, RequestOptions},
    html::{absolute_url, collapse_whitespace, first_attr, is_http, selector, text_of},
};

pub const ID: &str = "mangapill";
pub const BASE_URL: &str = "https://mangapill.com";

const MAX_RESULTS: usize = 10;

pub struct MangaPill {
    client: Arc<HttpClient>,
    base_url: String,
}

impl MangaPill {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }
}

/// `/manga/2/one-piece` into `("2", "one-piece")`
fn split_manga_href(href: &str) -> Option<(&str, &str)> {
    let rest = href.strip_prefix("/manga/")?;
    let (id, slug) = rest.split_once('/')?;
    let slug = slug.trim_end_matches('/');
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) || slug.is_empty() {
        return None;
    }

    Some((id, slug))
}

fn parse_search(base_url: &str, html: &str) -> SourceResult<Vec<TitleCandidate>> {
    let doc = Html::parse_document(html);
    let link_sel = selector(r#"a[href^="/manga/"]"#)?;
    let title_sel = selector("div.mt-3, div")?;

    let mut candidates: Vec<TitleCandidate> = vec![];
    for link in doc.select(&link_sel) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some((id, slug)) = split_manga_href(href) else {
            continue;
        };

        let title = link
            .select(&title_sel)
            .map(|el| text_of(&el))
            .find(|t| !t.is_empty());

        match candidates.iter_mut().find(|c| c.id == id) {
            Some(existing) => {
                // the cover link comes first and has no text, the caption link follows
                if let Some(title) = title {
                    if existing.title == slug.replace('-', " ") {
                        existing.title = title;
                    }
                }
            }
            None => {
                if candidates.len() >= MAX_RESULTS {
                    break;
                }
                candidates.push(TitleCandidate {
                    source_id: ID.to_string(),
                    id: id.to_string(),
                    title: title.unwrap_or_else(|| slug.replace('-', " ")),
                    url: absolute_url(base_url, &format!("/manga/{id}/{slug}")),
                    alt_titles: vec![],
                });
            }
        }
    }

    Ok(candidates)
}

fn parse_chapters(base_url: &str, html: &str) -> SourceResult<Vec<RawChapterRecord>> {
    let doc = Html::parse_document(html);
    let link_sel = selector(r#"a[href^="/chapters/"]"#)?;

    let mut seen = HashSet::new();
    let mut records = vec![];
    for link in doc.select(&link_sel) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !seen.insert(href.to_string()) {
            continue;
        }

        let label = first_attr(&link, &["title"])
            .map(|t| collapse_whitespace(&t))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| text_of(&link));

        records.push(RawChapterRecord {
            source_id: ID.to_string(),
            label,
            url: absolute_url(base_url, href),
            uploaded: None,
            locked: false,
        });
    }

    Ok(records)
}

fn parse_pages(html: &str) -> SourceResult<Vec<String>> {
    let doc = Html::parse_document(html);
    let img_sel = selector("img.js-page")?;

    let mut seen = HashSet::new();
    Ok(doc
        .select(&img_sel)
        .filter_map(|img| first_attr(&img, &["data-src", "src"]))
        .filter(|src| is_http(src))
        .filter(|src| seen.insert(src.clone()))
        .collect())
}

#[async_trait]
impl Source for MangaPill {
    fn source_info(&self) -> SourceInfo {
        SourceInfo {
            id: ID.to_string(),
            name: "MangaPill".to_string(),
            url: BASE_URL.to_string(),
            version: tankobon_lib::LIB_VERSION.to_string(),
        }
    }

    async fn resolve(&self, query: &str) -> SourceResult<Vec<TitleCandidate>> {
        let url = format!("{}/search", self.base_url);
        let params = [("q", query)];
        let html = self
            .client
            .get_text(&url, RequestOptions::query(&params).referer(&self.base_url))
            .await?;

        let candidates = parse_search(&self.base_url, &html)?;
        if candidates.is_empty() {
            return Err(SourceError::NotFound(format!("no mangapill title for {query:?}")));
        }

        Ok(candidates)
    }

    async fn list_chapters(&self, title: &TitleMatch) -> SourceResult<ChapterListing> {
        let url = absolute_url(&self.base_url, &title.url);
        let html = self
            .client
            .get_text(&url, RequestOptions::default().referer(&self.base_url))
            .await?;

        let records = parse_chapters(&self.base_url, &html)?;
        info!("mangapill: {} chapters for {}", records.len(), title.title);

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
            return Err(SourceError::Unavailable(format!("no page images found at {url}")));
        }

        Ok(pages)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SEARCH: &str = r#"
        <div class="grid">
          <div>
            <a href="/manga/2/one-piece" class="relative block"><figure><img data-src="https://cdn/op.jpg"></figure></a>
            <div class="mt-3">
              <a href="/manga/2/one-piece"><div class="mt-3 font-black leading-tight">One Piece</div></a>
              <div class="text-xs text-secondary">ONE PIECE</div>
            </div>
          </div>
          <div>
            <a href="/manga/3250/one-piece-party" class="relative block"><figure></figure></a>
            <div class="mt-3">
              <a href="/manga/3250/one-piece-party"><div class="mt-3 font-black">One Piece Party</div></a>
            </div>
          </div>
          <a href="/manga/oops">broken</a>
        </div>"#;

    const CHAPTERS: &str = r#"
        <div id="chapters">
          <a class="border" href="/chapters/2-11045000/one-piece-chapter-1045" title="One Piece Chapter 1045">Chapter 1045</a>
          <a class="border" href="/chapters/2-11044500/one-piece-chapter-1044.5">Chapter 1044.5</a>
          <a class="border" href="/chapters/2-11045000/one-piece-chapter-1045">Chapter 1045</a>
          <a class="border" href="/chapters/2-10001000/one-piece-chapter-1">  Chapter
              1 </a>
        </div>"#;

    const PAGES: &str = r#"
        <chapter-page><picture><img class="js-page" data-src="https://cdn.readdetectiveconan.com/file/1.jpeg"></picture></chapter-page>
        <chapter-page><picture><img class="js-page" src="https://cdn.readdetectiveconan.com/file/2.jpeg"></picture></chapter-page>
        <chapter-page><picture><img class="js-page" data-src="https://cdn.readdetectiveconan.com/file/1.jpeg"></picture></chapter-page>
        <img class="js-page" src="/static/placeholder.png">
        <img class="logo" src="https://mangapill.com/logo.png">"#;

    #[test]
    fn test_parse_search() {
        let candidates = parse_search(BASE_URL, SEARCH).unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].id, "2");
        assert_eq!(candidates[0].title, "One Piece");
        assert_eq!(candidates[0].url, "https://mangapill.com/manga/2/one-piece");
        assert_eq!(candidates[1].title, "One Piece Party");
    }

    #[test]
    fn test_parse_chapters_keeps_order_and_drops_duplicates() {
        let records = parse_chapters(BASE_URL, CHAPTERS).unwrap();

        let labels: Vec<&str> = records.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["One Piece Chapter 1045", "Chapter 1044.5", "Chapter 1"]
        );
        assert_eq!(
            records[2].url,
            "https://mangapill.com/chapters/2-10001000/one-piece-chapter-1"
        );
        assert!(records.iter().all(|r| r.source_id == ID && !r.locked));
    }

    #[test]
    fn test_parse_pages() {
        let pages = parse_pages(PAGES).unwrap();
        assert_eq!(
            pages,
            vec![
                "https://cdn.readdetectiveconan.com/file/1.jpeg",
                "https://cdn.readdetectiveconan.com/file/2.jpeg",
            ]
        );
    }
}
