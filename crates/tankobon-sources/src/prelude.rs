pub use crate::arenascans::ArenaScans;
pub use crate::fetch::{HttpClient, RequestOptions};
pub use crate::manager::{BUILTIN_SOURCES, SourceManager};
pub use crate::mangadex::MangaDex;
pub use crate::mangapill::MangaPill;
pub use crate::webtoon::Webtoon;
