//! NBA China (china.nba.cn): the official localized-name directory. A JSON
//! player list per season year exposes each player's Latin and Chinese
//! display names; recent seasons are walked newest first so fresher entries
//! win under the name map's first-writer rule.

use chrono::Datelike;
use serde::Deserialize;
use tracing::{info, warn};

use crate::fetcher::Fetcher;
use crate::merge::NameMap;

#[derive(Debug, Deserialize)]
struct PlayerListResponse {
    #[serde(default)]
    payload: Payload,
}

#[derive(Debug, Default, Deserialize)]
struct Payload {
    #[serde(default)]
    players: Vec<PlayerEntry>,
}

#[derive(Debug, Deserialize)]
struct PlayerEntry {
    #[serde(rename = "playerProfile", default)]
    profile: PlayerProfile,
}

#[derive(Debug, Default, Deserialize)]
struct PlayerProfile {
    #[serde(rename = "displayName", default)]
    display_name: String,
    #[serde(rename = "displayNameEn", default)]
    display_name_en: String,
}

pub fn player_list_url(season_year: i32) -> String {
    format!(
        "https://china.nba.cn/stats2/league/playerlist.json?seasonYear={}",
        season_year
    )
}

/// Loads the official Latin/Chinese name pairs for the most recent seasons
/// into `names`. Per-season failures are logged and skipped; an unreachable
/// endpoint leaves the map as it was.
pub fn load_official_names(fetcher: &mut Fetcher, names: &mut NameMap) {
    let current_year = chrono::Utc::now().year();
    for year in (current_year - 5..=current_year).rev() {
        let url = player_list_url(year);
        let body = match fetcher.fetch(&url) {
            Some(body) => body,
            None => {
                warn!(year, "player list unavailable");
                continue;
            }
        };
        match serde_json::from_str::<PlayerListResponse>(&body) {
            Ok(response) => {
                let mut added = 0usize;
                for player in response.payload.players {
                    let profile = player.profile;
                    if profile.display_name_en.is_empty() || profile.display_name.is_empty() {
                        continue;
                    }
                    if names.add(&profile.display_name_en, &profile.display_name) {
                        added += 1;
                    }
                }
                info!(year, added, "loaded official player names");
            }
            Err(e) => warn!(year, error = %e, "failed to parse player list"),
        }
    }
}
