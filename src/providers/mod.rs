pub mod archive_parser;
pub mod caching;
pub mod eastmoney;
pub mod sina;
pub mod util;
