use fancy_regex::Regex;
use rayon::prelude::*;
use tankobon_lib::prelude::*;

/// Result of normalizing one provider listing, both halves in provider order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedListing {
    pub chapters: Vec<NormalizedChapter>,
    pub unnumbered: Vec<UnnumberedChapter>,
}

impl NormalizedListing {
    pub fn len(&self) -> usize {
        self.chapters.len() + self.unnumbered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty() && self.unnumbered.is_empty()
    }
}

enum Normalized {
    Numbered(NormalizedChapter),
    Unnumbered(UnnumberedChapter),
}

/// Turns provider chapter labels into chapter keys.
///
/// A number right after a chapter keyword (`Chapter`, `Ch.`, `Episode`,
/// `Ep.`, `#`) wins over any other number in the label, so
/// `Vol. 3 Chapter 21` is chapter 21. Without a keyword the first number is
/// used. Labels with no number at all go to the unnumbered bucket.
pub struct ChapterNormalizer {
    keyword_re: Regex,
    number_re: Regex,
}

impl ChapterNormalizer {
    pub fn new() -> Result<Self, fancy_regex::Error> {
        Ok(Self {
            keyword_re: Regex::new(
                r"(?i)(?:(?<![a-z])(?:chapter|chap|ch|episode|ep)[.:]?|#)\s*(\d+(?:[.,]\d+)?)",
            )?,
            number_re: Regex::new(r"(\d+(?:[.,]\d+)?)")?,
        })
    }

    fn first_capture(re: &Regex, label: &str) -> Option<ChapterKey> {
        let caps = re.captures(label).ok()??;
        ChapterKey::parse(caps.get(1)?.as_str())
    }

    pub fn chapter_key(&self, label: &str) -> Option<ChapterKey> {
        Self::first_capture(&self.keyword_re, label)
            .or_else(|| Self::first_capture(&self.number_re, label))
    }

    pub fn normalize(&self, records: Vec<RawChapterRecord>) -> NormalizedListing {
        let normalized: Vec<Normalized> = records
            .into_par_iter()
            .map(|record| match self.chapter_key(&record.label) {
                Some(key) => Normalized::Numbered(NormalizedChapter::from_record(record, key)),
                None => {
                    debug!(
                        "unparsable chapter label {:?} from {}",
                        record.label, record.source_id
                    );
                    Normalized::Unnumbered(record.into())
                }
            })
            .collect();

        let mut listing = NormalizedListing::default();
        for item in normalized {
            match item {
                Normalized::Numbered(chapter) => listing.chapters.push(chapter),
                Normalized::Unnumbered(chapter) => listing.unnumbered.push(chapter),
            }
        }

        listing
    }
}
