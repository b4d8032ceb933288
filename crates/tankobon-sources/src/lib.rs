#[macro_use]
extern crate log;

pub mod arenascans;
pub mod fetch;
pub mod html;
pub mod manager;
pub mod mangadex;
pub mod mangapill;
pub mod prelude;
pub mod webtoon;
