//! Source-specific configurations over the shared extraction routine, plus
//! the enrichment sources feeding the name map.

pub mod espn;
pub mod hupu;
pub mod nba_cn;
pub mod overrides;
