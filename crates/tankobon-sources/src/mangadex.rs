use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use serde::Deserialize;
use tankobon_lib::prelude::*;

use crate::fetch::{HttpClient, RequestOptions};

pub const ID: &str = "mangadex";
pub const API_URL: &str = "https://api.mangadex.org";
pub const SITE_URL: &str = "https://mangadex.org";

const SEARCH_LIMIT: &str = "5";
const FEED_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
struct Collection<T> {
    data: Vec<T>,
    #[serde(default)]
    total: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct MangaData {
    id: String,
    attributes: MangaAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MangaAttributes {
    #[serde(default)]
    title: BTreeMap<String, String>,
    #[serde(default)]
    alt_titles: Vec<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct ChapterData {
    id: String,
    attributes: ChapterAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChapterAttributes {
    volume: Option<String>,
    chapter: Option<String>,
    title: Option<String>,
    external_url: Option<String>,
    publish_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AtHome {
    base_url: String,
    chapter: AtHomeChapter,
}

#[derive(Debug, Deserialize)]
struct AtHomeChapter {
    hash: String,
    data: Vec<String>,
}

pub struct MangaDex {
    client: Arc<HttpClient>,
    api_url: String,
    language: String,
    pagination: PaginationConfig,
}

impl MangaDex {
    pub fn new(client: Arc<HttpClient>, language: &str, pagination: PaginationConfig) -> Self {
        Self {
            client,
            api_url: API_URL.to_string(),
            language: language.to_string(),
            pagination,
        }
    }

    async fn fetch_feed_page(&self, manga_id: &str, req: PageRequest) -> SourceResult<Page<RawChapterRecord>> {
        let url = format!("{}/manga/{manga_id}/feed", self.api_url);
        let offset = ((req.index - 1) * FEED_LIMIT).to_string();
        let limit = FEED_LIMIT.to_string();
        let query = [
            ("translatedLanguage[]", self.language.as_str()),
            ("order[chapter]", "asc"),
            ("limit", limit.as_str()),
            ("offset", offset.as_str()),
        ];

        let feed: Collection<ChapterData> =
            self.client.get_json(&url, RequestOptions::query(&query)).await?;
        Ok(feed_page(feed))
    }
}

fn preferred_title(titles: &BTreeMap<String, String>) -> Option<String> {
    titles
        .get("en")
        .or_else(|| titles.values().next())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn search_candidates(list: Collection<MangaData>) -> Vec<TitleCandidate> {
    list.data
        .into_iter()
        .filter_map(|manga| {
            let title = preferred_title(&manga.attributes.title)?;
            let mut alt_titles: Vec<String> = manga
                .attributes
                .title
                .values()
                .chain(manga.attributes.alt_titles.iter().flat_map(|alt| alt.values()))
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty() && *t != title)
                .collect();
            alt_titles.dedup();

            Some(TitleCandidate {
                source_id: ID.to_string(),
                url: format!("{SITE_URL}/title/{}", manga.id),
                id: manga.id,
                title,
                alt_titles,
            })
        })
        .collect()
}

fn chapter_label(attrs: &ChapterAttributes) -> String {
    let title = attrs
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let mut label = match (attrs.volume.as_deref(), attrs.chapter.as_deref()) {
        (Some(vol), Some(ch)) => format!("Vol. {vol} Chapter {ch}"),
        (None, Some(ch)) => format!("Chapter {ch}"),
        (_, None) => title.unwrap_or("Oneshot").to_string(),
    };

    if attrs.chapter.is_some() {
        if let Some(title) = title {
            label.push_str(" - ");
            label.push_str(title);
        }
    }

    label
}

fn feed_page(feed: Collection<ChapterData>) -> Page<RawChapterRecord> {
    let signature = feed
        .data
        .iter()
        .map(|ch| ch.id.as_str())
        .collect::<Vec<_>>()
        .join(",");

    let items = feed
        .data
        .into_iter()
        .map(|ch| RawChapterRecord {
            source_id: ID.to_string(),
            label: chapter_label(&ch.attributes),
            url: format!("{SITE_URL}/chapter/{}", ch.id),
            uploaded: ch
                .attributes
                .publish_at
                .as_deref()
                .and_then(|at| chrono::DateTime::parse_from_rfc3339(at).ok())
                .map(|at| at.timestamp()),
            locked: ch.attributes.external_url.is_some(),
        })
        .collect();

    Page {
        items,
        signature,
        next_cursor: None,
        total: feed.total.map(PageTotal::Items),
    }
}

fn chapter_id(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

#[async_trait]
impl Source for MangaDex {
    fn source_info(&self) -> SourceInfo {
        SourceInfo {
            id: ID.to_string(),
            name: "MangaDex".to_string(),
            url: SITE_URL.to_string(),
            version: tankobon_lib::LIB_VERSION.to_string(),
        }
    }

    async fn resolve(&self, query: &str) -> SourceResult<Vec<TitleCandidate>> {
        let url = format!("{}/manga", self.api_url);
        let params = [
            ("title", query),
            ("limit", SEARCH_LIMIT),
            ("order[relevance]", "desc"),
        ];

        let list: Collection<MangaData> =
            self.client.get_json(&url, RequestOptions::query(&params)).await?;
        let candidates = search_candidates(list);
        if candidates.is_empty() {
            return Err(SourceError::NotFound(format!("no mangadex title for {query:?}")));
        }

        Ok(candidates)
    }

    async fn list_chapters(&self, title: &TitleMatch) -> SourceResult<ChapterListing> {
        let manga_id = title.id.as_str();
        let result = paginate(
            &self.pagination,
            |record: &RawChapterRecord| record.url.clone(),
            move |req| self.fetch_feed_page(manga_id, req),
        )
        .await?;

        info!("mangadex: {} chapters over {} pages", result.items.len(), result.pages);

        Ok(ChapterListing {
            records: result.items,
            pagination: result.status,
        })
    }

    async fn fetch_pages(&self, path: &str) -> SourceResult<Vec<String>> {
        let url = format!("{}/at-home/server/{}", self.api_url, chapter_id(path));
        let at_home: AtHome = self.client.get_json(&url, RequestOptions::default()).await?;

        if at_home.chapter.data.is_empty() {
            return Err(SourceError::NotFound(format!("no pages hosted for {path}")));
        }

        Ok(at_home
            .chapter
            .data
            .iter()
            .map(|file| format!("{}/data/{}/{file}", at_home.base_url, at_home.chapter.hash))
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SEARCH: &str = r#"{
        "result": "ok",
        "data": [
            {
                "id": "a1c7c817-4e59-43b7-9365-09675a149a6f",
                "attributes": {
                    "title": {"en": "One Piece"},
                    "altTitles": [{"ja-ro": "Wan Pīsu"}, {"ja": "ワンピース"}]
                }
            },
            {
                "id": "deadbeef",
                "attributes": {"title": {}, "altTitles": []}
            }
        ],
        "total": 2
    }"#;

    const FEED: &str = r#"{
        "data": [
            {"id": "c1", "attributes": {"volume": "1", "chapter": "1", "title": "Romance Dawn", "externalUrl": null, "publishAt": "2018-01-20T13:00:00+00:00"}},
            {"id": "c2", "attributes": {"volume": null, "chapter": "1.5", "title": "", "externalUrl": null, "publishAt": null}},
            {"id": "c3", "attributes": {"volume": null, "chapter": "2", "title": null, "externalUrl": "https://mangaplus.shueisha.co.jp/viewer/1", "publishAt": null}},
            {"id": "c4", "attributes": {"volume": null, "chapter": null, "title": "Special", "externalUrl": null, "publishAt": null}}
        ],
        "limit": 100,
        "offset": 0,
        "total": 4
    }"#;

    #[test]
    fn test_search_candidates() {
        let list: Collection<MangaData> = serde_json::from_str(SEARCH).unwrap();
        let candidates = search_candidates(list);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "One Piece");
        assert_eq!(candidates[0].alt_titles, vec!["Wan Pīsu", "ワンピース"]);
        assert_eq!(
            candidates[0].url,
            "https://mangadex.org/title/a1c7c817-4e59-43b7-9365-09675a149a6f"
        );
    }

    #[test]
    fn test_feed_page() {
        let feed: Collection<ChapterData> = serde_json::from_str(FEED).unwrap();
        let page = feed_page(feed);

        assert_eq!(page.total, Some(PageTotal::Items(4)));
        assert_eq!(page.signature, "c1,c2,c3,c4");

        let labels: Vec<&str> = page.items.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Vol. 1 Chapter 1 - Romance Dawn", "Chapter 1.5", "Chapter 2", "Special"]
        );
        assert_eq!(page.items[0].uploaded, Some(1516453200));
        assert!(page.items[2].locked);
        assert!(!page.items[0].locked);
        assert_eq!(page.items[3].url, "https://mangadex.org/chapter/c4");
    }

    #[test]
    fn test_chapter_id_from_path() {
        assert_eq!(chapter_id("https://mangadex.org/chapter/abc-123"), "abc-123");
        assert_eq!(chapter_id("abc-123"), "abc-123");
    }
}
