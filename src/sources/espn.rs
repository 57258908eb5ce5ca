//! ESPN (espn.com): the salary/roster enrichment source. ESPN splits one
//! roster over several tables and labels columns in English, so the specs
//! here probe headers rather than trusting a single class hint.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;

use crate::clean::CleanRules;
use crate::extract::TableSpec;
use crate::record::{Field, Record, RecordSet};

pub const SOURCE: &str = "espn";

/// ESPN team code -> Chinese team name.
pub const TEAMS: &[(&str, &str)] = &[
    ("bos", "波士顿凯尔特人"),
    ("bkn", "布鲁克林篮网"),
    ("ny", "纽约尼克斯"),
    ("phi", "费城76人"),
    ("tor", "多伦多猛龙"),
    ("chi", "芝加哥公牛"),
    ("cle", "克利夫兰骑士"),
    ("det", "底特律活塞"),
    ("ind", "印第安纳步行者"),
    ("mil", "密尔沃基雄鹿"),
    ("atl", "亚特兰大老鹰"),
    ("cha", "夏洛特黄蜂"),
    ("mia", "迈阿密热火"),
    ("orl", "奥兰多魔术"),
    ("wsh", "华盛顿奇才"),
    ("den", "丹佛掘金"),
    ("min", "明尼苏达森林狼"),
    ("okc", "俄克拉荷马城雷霆"),
    ("por", "波特兰开拓者"),
    ("utah", "犹他爵士"),
    ("gsw", "金州勇士"),
    ("lac", "洛杉矶快船"),
    ("lal", "洛杉矶湖人"),
    ("phx", "菲尼克斯太阳"),
    ("sac", "萨克拉门托国王"),
    ("dal", "达拉斯独行侠"),
    ("hou", "休斯顿火箭"),
    ("mem", "孟菲斯灰熊"),
    ("no", "新奥尔良鹈鹕"),
    ("sa", "圣安东尼奥马刺"),
];

/// ESPN team code -> full Latin team name, used to build roster URL slugs.
const TEAM_NAMES: &[(&str, &str)] = &[
    ("bos", "Boston Celtics"),
    ("bkn", "Brooklyn Nets"),
    ("ny", "New York Knicks"),
    ("phi", "Philadelphia 76ers"),
    ("tor", "Toronto Raptors"),
    ("chi", "Chicago Bulls"),
    ("cle", "Cleveland Cavaliers"),
    ("det", "Detroit Pistons"),
    ("ind", "Indiana Pacers"),
    ("mil", "Milwaukee Bucks"),
    ("atl", "Atlanta Hawks"),
    ("cha", "Charlotte Hornets"),
    ("mia", "Miami Heat"),
    ("orl", "Orlando Magic"),
    ("wsh", "Washington Wizards"),
    ("den", "Denver Nuggets"),
    ("min", "Minnesota Timberwolves"),
    ("okc", "Oklahoma City Thunder"),
    ("por", "Portland Trail Blazers"),
    ("utah", "Utah Jazz"),
    ("gsw", "Golden State Warriors"),
    ("lac", "LA Clippers"),
    ("lal", "Los Angeles Lakers"),
    ("phx", "Phoenix Suns"),
    ("sac", "Sacramento Kings"),
    ("dal", "Dallas Mavericks"),
    ("hou", "Houston Rockets"),
    ("mem", "Memphis Grizzlies"),
    ("no", "New Orleans Pelicans"),
    ("sa", "San Antonio Spurs"),
];

/// Hupu Chinese team name -> ESPN team code, the join used when merging
/// rosters with salaries.
pub fn code_for_team(chinese_name: &str) -> Option<&'static str> {
    TEAMS
        .iter()
        .find(|(_, name)| *name == chinese_name)
        .map(|(code, _)| *code)
}

pub fn team_name(code: &str) -> &str {
    TEAMS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, n)| *n)
        .unwrap_or(code)
}

pub fn roster_url(code: &str) -> String {
    let slug = TEAM_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, n)| n.to_lowercase().replace(' ', "-"))
        .unwrap_or_default();
    format!("https://www.espn.com/nba/team/roster/_/name/{}/{}", code, slug)
}

pub fn standings_url() -> &'static str {
    "https://www.espn.com/nba/standings"
}

pub fn roster_spec() -> TableSpec {
    TableSpec {
        source: SOURCE,
        default_headers: &[],
        header_probe: &["Name", "POS", "Salary"],
        link_columns: &[("Name", "PlayerLink")],
        require: &["Name"],
        ..Default::default()
    }
}

pub fn roster_rules() -> CleanRules {
    CleanRules {
        trim: &["Name", "Salary"],
        dedup_key: Some("Name"),
        ..Default::default()
    }
}

/// Player-stat leaderboard views: category code -> pre-sorted stats URL.
pub const STAT_CATEGORIES: &[(&str, &str)] = &[
    ("points", "https://www.espn.com/nba/stats/player"),
    (
        "assists",
        "https://www.espn.com/nba/stats/player/_/table/offensive/sort/avgAssists/dir/desc",
    ),
    (
        "rebounds",
        "https://www.espn.com/nba/stats/player/_/table/general/sort/avgRebounds/dir/desc",
    ),
    (
        "blocks",
        "https://www.espn.com/nba/stats/player/_/table/defensive/sort/avgBlocks/dir/desc",
    ),
    (
        "steals",
        "https://www.espn.com/nba/stats/player/_/table/defensive/sort/avgSteals/dir/desc",
    ),
    (
        "3pm",
        "https://www.espn.com/nba/stats/player/_/table/offensive/sort/avgThreePointFieldGoalsMade/dir/desc",
    ),
];

pub fn stats_url(category: &str) -> Option<&'static str> {
    STAT_CATEGORIES
        .iter()
        .find(|(code, _)| *code == category)
        .map(|(_, url)| *url)
}

/// The leaderboard page splits one list over a rank/name table and a stats
/// table, so both are probed and contribute their own rows.
pub fn stats_spec() -> TableSpec {
    TableSpec {
        source: SOURCE,
        default_headers: &[],
        header_probe: &["Name", "GP", "PTS"],
        link_columns: &[("Name", "PlayerLink")],
        ..Default::default()
    }
}

pub fn stats_rules() -> CleanRules {
    CleanRules {
        trim: &["Name"],
        ..Default::default()
    }
}

/// Team-stat views merged into one artifact; offensive and defensive columns
/// are prefixed when joined onto the general view.
pub const TEAM_STAT_VIEWS: &[(&str, &str)] = &[
    ("general", "https://www.espn.com/nba/stats/team"),
    ("offensive", "https://www.espn.com/nba/stats/team/_/view/offensive"),
    ("defensive", "https://www.espn.com/nba/stats/team/_/view/defensive"),
];

pub fn team_stats_url(view: &str) -> &'static str {
    TEAM_STAT_VIEWS
        .iter()
        .find(|(v, _)| *v == view)
        .map(|(_, url)| *url)
        .unwrap_or(TEAM_STAT_VIEWS[0].1)
}

pub fn team_stats_spec() -> TableSpec {
    TableSpec {
        source: SOURCE,
        default_headers: &[],
        header_probe: &["Team", "GP", "PTS"],
        link_columns: &[("Team", "TeamLink")],
        require: &["Team"],
        ..Default::default()
    }
}

pub fn team_stats_rules() -> CleanRules {
    CleanRules {
        trim: &["Team"],
        dedup_key: Some("Team"),
        ..Default::default()
    }
}

/// Pulls the team code out of a roster/stats href
/// (`/nba/team/_/name/lal/los-angeles-lakers` -> `lal`).
pub fn team_code_from_link(href: &str) -> Option<&str> {
    let rest = href.split("/_/name/").nth(1)?;
    let code = rest.split('/').next()?;
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

pub fn standings_spec() -> TableSpec {
    TableSpec {
        source: SOURCE,
        default_headers: &[],
        header_probe: &["W", "L", "PCT"],
        ..Default::default()
    }
}

pub fn standings_rules() -> CleanRules {
    CleanRules {
        rank: &["W", "L"],
        percent: &["PCT"],
        ..Default::default()
    }
}

static PLAYER_LINK_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Fallback roster extraction when ESPN's table markup is missing: collect
/// player profile links, de-duplicated by display name.
pub fn roster_from_links(html: &str, team: &str) -> RecordSet {
    let document = Html::parse_document(html);
    let mut set = RecordSet::new(SOURCE, "roster");
    let mut seen: HashSet<String> = HashSet::new();
    for link in document.select(&PLAYER_LINK_SEL) {
        let href = match link.value().attr("href") {
            Some(h) if h.contains("/nba/player/_/id/") => h,
            _ => continue,
        };
        let name: String = link
            .text()
            .collect::<String>()
            .trim()
            .to_string();
        if name.is_empty() || !seen.insert(name.clone()) {
            continue;
        }
        let mut record = Record::new();
        record.set("Team", Field::Text(team.to_string()));
        record.set("Name", Field::Text(name));
        record.set("PlayerLink", Field::Text(href.to_string()));
        set.push(record);
    }
    set
}
