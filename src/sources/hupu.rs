//! Hupu NBA (nba.hupu.com): the primary source. Player stat leaderboards,
//! team stats, conference standings, and per-team rosters, all served as
//! `players_table` HTML tables with Chinese column labels.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::clean::CleanRules;
use crate::extract::{SectionSpec, TableSpec};
use crate::record::{Field, Record, RecordSet};

pub const SOURCE: &str = "hupu";

/// One player-stat leaderboard category: URL code, localized name used for
/// artifact files, table shape, and cleaning rules.
#[derive(Debug, Clone, Copy)]
pub struct StatCategory {
    pub code: &'static str,
    pub name: &'static str,
    pub fields: &'static [&'static str],
    pub numeric: &'static [&'static str],
    pub percent: &'static [&'static str],
    /// Score/rebound/assist leaders are crawled first.
    pub priority: u8,
}

pub const CATEGORIES: &[StatCategory] = &[
    StatCategory {
        code: "pts",
        name: "得分榜",
        fields: &["排名", "球员", "球队", "场次", "时间", "得分"],
        numeric: &["场次", "时间", "得分"],
        percent: &[],
        priority: 1,
    },
    StatCategory {
        code: "reb",
        name: "篮板榜",
        fields: &["排名", "球员", "球队", "场次", "前场", "后场", "总篮板"],
        numeric: &["场次", "前场", "后场", "总篮板"],
        percent: &[],
        priority: 1,
    },
    StatCategory {
        code: "asts",
        name: "助攻榜",
        fields: &["排名", "球员", "球队", "场次", "时间", "助攻"],
        numeric: &["场次", "时间", "助攻"],
        percent: &[],
        priority: 1,
    },
    StatCategory {
        code: "fgp",
        name: "投篮命中率",
        fields: &["排名", "球员", "球队", "场次", "命中", "出手", "命中率"],
        numeric: &["场次", "命中", "出手"],
        percent: &["命中率"],
        priority: 2,
    },
    StatCategory {
        code: "tpp",
        name: "三分命中率",
        fields: &["排名", "球员", "球队", "场次", "命中", "出手", "命中率"],
        numeric: &["场次", "命中", "出手"],
        percent: &["命中率"],
        priority: 2,
    },
    StatCategory {
        code: "ftp",
        name: "罚球命中率",
        fields: &["排名", "球员", "球队", "场次", "命中", "出手", "命中率"],
        numeric: &["场次", "命中", "出手"],
        percent: &["命中率"],
        priority: 2,
    },
    StatCategory {
        code: "blk",
        name: "盖帽榜",
        fields: &["排名", "球员", "球队", "场次", "时间", "盖帽"],
        numeric: &["场次", "时间", "盖帽"],
        percent: &[],
        priority: 2,
    },
    StatCategory {
        code: "stl",
        name: "抢断榜",
        fields: &["排名", "球员", "球队", "场次", "时间", "抢断"],
        numeric: &["场次", "时间", "抢断"],
        percent: &[],
        priority: 2,
    },
];

pub fn category(code: &str) -> Option<&'static StatCategory> {
    CATEGORIES.iter().find(|c| c.code == code)
}

/// Hupu team code -> Chinese team name, all 30 franchises.
pub const TEAMS: &[(&str, &str)] = &[
    ("celtics", "波士顿凯尔特人"),
    ("nets", "布鲁克林篮网"),
    ("knicks", "纽约尼克斯"),
    ("76ers", "费城76人"),
    ("raptors", "多伦多猛龙"),
    ("bulls", "芝加哥公牛"),
    ("cavaliers", "克利夫兰骑士"),
    ("pistons", "底特律活塞"),
    ("pacers", "印第安纳步行者"),
    ("bucks", "密尔沃基雄鹿"),
    ("hawks", "亚特兰大老鹰"),
    ("hornets", "夏洛特黄蜂"),
    ("heat", "迈阿密热火"),
    ("magic", "奥兰多魔术"),
    ("wizards", "华盛顿奇才"),
    ("nuggets", "丹佛掘金"),
    ("timberwolves", "明尼苏达森林狼"),
    ("thunder", "俄克拉荷马城雷霆"),
    ("blazers", "波特兰开拓者"),
    ("jazz", "犹他爵士"),
    ("warriors", "金州勇士"),
    ("clippers", "洛杉矶快船"),
    ("lakers", "洛杉矶湖人"),
    ("suns", "菲尼克斯太阳"),
    ("kings", "萨克拉门托国王"),
    ("mavericks", "达拉斯独行侠"),
    ("rockets", "休斯顿火箭"),
    ("grizzlies", "孟菲斯灰熊"),
    ("pelicans", "新奥尔良鹈鹕"),
    ("spurs", "圣安东尼奥马刺"),
];

pub fn team_name(code: &str) -> &str {
    TEAMS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, n)| *n)
        .unwrap_or(code)
}

/// Short conference membership fragments, the fallback heuristic when the
/// standings page's section markers are inconsistent.
const EASTERN_TEAMS: &[&str] = &[
    "活塞", "尼克斯", "凯尔特人", "魔术", "76人", "猛龙", "骑士", "热火",
    "老鹰", "雄鹿", "公牛", "黄蜂", "篮网", "步行者", "奇才",
];
const WESTERN_TEAMS: &[&str] = &[
    "雷霆", "掘金", "火箭", "湖人", "马刺", "森林狼", "太阳", "勇士",
    "灰熊", "独行侠", "爵士", "开拓者", "国王", "快船", "鹈鹕",
];

/// Season tag for today, e.g. "2024-25". A new season starts in October.
pub fn current_season() -> String {
    use chrono::Datelike;
    let today = chrono::Local::now();
    let start = if today.month() >= 10 {
        today.year()
    } else {
        today.year() - 1
    };
    format!("{}-{:02}", start, (start + 1) % 100)
}

pub fn player_stats_url(code: &str, page: usize) -> String {
    if page <= 1 {
        format!("/stats/players/{}", code)
    } else {
        format!("/stats/players/{}/{}", code, page)
    }
}

pub fn team_stats_url() -> &'static str {
    "/stats/teams"
}

pub fn standings_url() -> &'static str {
    "/standings"
}

pub fn roster_url(team_code: &str) -> String {
    format!("/players/{}", team_code)
}

pub fn player_stats_spec(cat: &StatCategory) -> TableSpec {
    TableSpec {
        source: SOURCE,
        table_class: Some("players_table"),
        default_headers: cat.fields,
        link_columns: &[("球员", "球员链接"), ("球队", "球队链接")],
        ..Default::default()
    }
}

pub fn player_stats_rules(cat: &StatCategory) -> CleanRules {
    CleanRules {
        numeric: cat.numeric,
        percent: cat.percent,
        rank: &["排名"],
        ..Default::default()
    }
}

pub fn team_stats_spec() -> TableSpec {
    TableSpec {
        source: SOURCE,
        table_class: Some("players_table"),
        default_headers: &[
            "排名", "球队", "投篮", "三分", "罚球", "篮板", "助攻", "失误",
            "抢断", "盖帽", "犯规", "得分",
        ],
        link_columns: &[("球队", "球队链接")],
        ..Default::default()
    }
}

pub fn team_stats_rules() -> CleanRules {
    CleanRules {
        numeric: &[
            "投篮", "三分", "罚球", "篮板", "助攻", "失误", "抢断", "盖帽",
            "犯规", "得分",
        ],
        rank: &["排名"],
        ..Default::default()
    }
}

pub fn standings_spec() -> TableSpec {
    TableSpec {
        source: SOURCE,
        table_class: Some("players_table"),
        default_headers: &[
            "排名", "球队", "胜", "负", "胜率", "胜差", "主场", "客场",
            "分区", "最近10场", "连胜/连负",
        ],
        link_columns: &[("球队", "球队链接")],
        skip_empty_cells: true,
        require: &["球队", "胜"],
        skip_row_words: &["队名", "胜场差"],
        section: Some(SectionSpec {
            label: "联盟",
            default_tag: "东部",
            markers: &[("东部", "东部"), ("西部", "西部")],
            membership: &[("东部", EASTERN_TEAMS), ("西部", WESTERN_TEAMS)],
        }),
        ..Default::default()
    }
}

pub fn standings_rules() -> CleanRules {
    CleanRules {
        rank: &["排名", "胜", "负"],
        percent: &["胜率"],
        ..Default::default()
    }
}

pub fn roster_spec() -> TableSpec {
    TableSpec {
        source: SOURCE,
        table_class: Some("players_table"),
        default_headers: &["", "姓名", "号码", "位置", "身高", "体重", "生日", "合同"],
        rename: &[("姓名", "球员")],
        link_columns: &[("球员", "球员链接")],
        paren_columns: &[("球员", "英文名")],
        require: &["球员"],
        ..Default::default()
    }
}

pub fn roster_rules() -> CleanRules {
    CleanRules {
        trim: &["球员", "英文名"],
        dedup_key: Some("球员"),
        ..Default::default()
    }
}

static PLAYER_SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/players/([a-zA-Z-]+)-\d+\.html").unwrap());
static PAGE_NUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d+)$").unwrap());
static ROSTER_LINK_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static PAGER_LINK_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div.page a").unwrap());
static PAREN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[（(]([^）)]+)[）)]").unwrap());

/// Extracts the concatenated-name slug from a player detail link
/// (`/players/lebronjames-65.html` -> `lebronjames`). Hyphens become spaces;
/// the result is a secondary identity signal for the name map.
pub fn player_slug(href: &str) -> Option<String> {
    PLAYER_SLUG_RE
        .captures(href)
        .map(|caps| caps[1].replace('-', " "))
}

/// Reads the pager under the stats table. Absent or unparseable pager means
/// a single page.
pub fn page_count(html: &str) -> usize {
    let document = Html::parse_document(html);
    let mut max_page = 1usize;
    for link in document.select(&PAGER_LINK_SEL) {
        let text: String = link.text().collect::<String>().trim().to_string();
        if let Ok(n) = text.parse::<usize>() {
            max_page = max_page.max(n);
        } else if let Some(href) = link.value().attr("href") {
            if let Some(caps) = PAGE_NUM_RE.captures(href) {
                if let Ok(n) = caps[1].parse::<usize>() {
                    max_page = max_page.max(n);
                }
            }
        }
    }
    max_page
}

/// Fallback roster extraction for pages without a table: scan player detail
/// links directly, picking up the parenthesized Latin name from the
/// surrounding text when present.
pub fn roster_from_links(html: &str, team: &str) -> RecordSet {
    let document = Html::parse_document(html);
    let mut set = RecordSet::new(SOURCE, "roster");
    for link in document.select(&ROSTER_LINK_SEL) {
        let href = match link.value().attr("href") {
            Some(h) if h.contains("/players/") && h.contains(".html") => h,
            _ => continue,
        };
        let name: String = link
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            continue;
        }
        let parent_text = link
            .parent()
            .and_then(scraper::ElementRef::wrap)
            .map(|p| p.text().collect::<String>())
            .unwrap_or_default();
        let latin = PAREN_RE
            .captures(&parent_text)
            .map(|caps| caps[1].trim().to_string())
            .unwrap_or_default();

        let mut record = Record::new();
        record.set("球队", Field::Text(team.to_string()));
        record.set("球员", Field::Text(name));
        record.set("英文名", Field::Text(latin));
        record.set("球员链接", Field::Text(href.to_string()));
        set.push(record);
    }
    set
}
