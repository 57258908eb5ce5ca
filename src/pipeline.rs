//! Per-season orchestration: fetch -> extract -> clean -> merge -> store.
//! Sources, categories, and teams are processed strictly sequentially; every
//! unit of work (one page, one table, one team) degrades on its own and the
//! batch moves on.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::clean::clean;
use crate::config::Config;
use crate::error::{Result, ScraperError};
use crate::extract::extract;
use crate::fetcher::Fetcher;
use crate::merge::{attach_display_names, build_lookup, merge_field, MatchStats, NameMap};
use crate::record::{Field, RecordSet};
use crate::sources::{espn, hupu, nba_cn, overrides};
use crate::store::{
    CsvStore, WriteMode, MERGED_DIR, PLAYER_STATS_DIR, ROSTERS_DIR, STANDINGS_DIR, TEAM_STATS_DIR,
};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Installs the Ctrl-C handler. Batch loops stop at the next unit boundary
/// instead of aborting mid-write, and the run reports partial completion.
pub fn install_interrupt_handler() {
    if let Err(e) = ctrlc::set_handler(request_interrupt) {
        warn!(error = %e, "could not install interrupt handler");
    }
}

/// Marks the current batch for early stop. Called from the signal handler.
pub fn request_interrupt() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

#[cfg(test)]
pub(crate) fn clear_interrupt() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}

pub struct Pipeline {
    fetcher: Fetcher,
    store: CsvStore,
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = Fetcher::new(&config)?;
        let store = CsvStore::new(&config.output_dir);
        Ok(Self {
            fetcher,
            store,
            config,
        })
    }

    pub fn store(&self) -> &CsvStore {
        &self.store
    }

    /// Crawls one player-stat leaderboard across its pages, cleans it, and
    /// persists it. Unknown categories are a configuration error; everything
    /// downstream degrades per unit.
    pub fn crawl_player_stats(&mut self, code: &str, season: &str) -> Result<()> {
        let cat = hupu::category(code)
            .ok_or_else(|| ScraperError::Config(format!("unknown stat category: {}", code)))?;
        info!(category = code, season, "crawling player stats");

        let first = match self.fetcher.fetch(&hupu::player_stats_url(code, 1)) {
            Some(body) => body,
            None => {
                warn!(category = code, "player stats page unavailable");
                return Ok(());
            }
        };

        let spec = hupu::player_stats_spec(cat);
        let mut set = extract(&first, &spec, code);

        let pages = hupu::page_count(&first).min(self.config.max_stat_pages);
        for page in 2..=pages {
            match self.fetcher.fetch(&hupu::player_stats_url(code, page)) {
                Some(body) => {
                    let page_set = extract(&body, &spec, code);
                    set.records.extend(page_set.records);
                }
                None => warn!(category = code, page, "stats page unavailable, skipping"),
            }
        }

        clean(&mut set, &hupu::player_stats_rules(cat));
        set.add_column("赛季", season);
        self.store.save_in(
            PLAYER_STATS_DIR,
            &set,
            &format!("{}_{}.csv", cat.name, season),
            WriteMode::Overwrite,
        );
        info!(category = code, rows = set.len(), "player stats done");
        Ok(())
    }

    pub fn crawl_all_player_stats(&mut self, season: &str) -> Result<()> {
        for cat in hupu::CATEGORIES {
            if interrupted() {
                warn!("interrupted, stopping player stats batch");
                break;
            }
            self.crawl_player_stats(cat.code, season)?;
        }
        Ok(())
    }

    pub fn crawl_team_stats(&mut self, season: &str) -> Result<()> {
        info!(season, "crawling team stats");
        match self.fetcher.fetch(hupu::team_stats_url()) {
            Some(body) => {
                let mut set = extract(&body, &hupu::team_stats_spec(), "team_stats");
                clean(&mut set, &hupu::team_stats_rules());
                set.add_column("赛季", season);
                self.store.save_in(
                    TEAM_STATS_DIR,
                    &set,
                    &format!("球队数据_{}.csv", season),
                    WriteMode::Overwrite,
                );
            }
            None => warn!("team stats page unavailable"),
        }
        self.crawl_espn_team_stats(season)
    }

    /// ESPN serves team statistics as three views; the offensive and
    /// defensive tables are joined onto the general one by team name, their
    /// extra columns prefixed.
    pub fn crawl_espn_team_stats(&mut self, season: &str) -> Result<()> {
        info!(season, "crawling ESPN team stats");
        let general = match self.fetcher.fetch(espn::team_stats_url("general")) {
            Some(body) => body,
            None => {
                warn!("ESPN general team stats unavailable");
                return Ok(());
            }
        };
        let mut set = extract(&general, &espn::team_stats_spec(), "team_stats");
        clean(&mut set, &espn::team_stats_rules());
        annotate_team_codes(&mut set);

        for (view, prefix) in [("offensive", "OFF_"), ("defensive", "DEF_")] {
            match self.fetcher.fetch(espn::team_stats_url(view)) {
                Some(body) => {
                    let mut side = extract(&body, &espn::team_stats_spec(), "team_stats");
                    clean(&mut side, &espn::team_stats_rules());
                    merge_team_view(&mut set, &side, prefix);
                }
                None => warn!(view, "ESPN team stats view unavailable"),
            }
        }

        set.add_column("赛季", season);
        self.store.save_in(
            TEAM_STATS_DIR,
            &set,
            &format!("ESPN_球队统计_{}.csv", season),
            WriteMode::Overwrite,
        );
        Ok(())
    }

    /// Crawls one ESPN player-stat leaderboard view. Unknown categories are
    /// a configuration error, as on the Hupu side.
    pub fn crawl_espn_player_stats(&mut self, category: &str, season: &str) -> Result<()> {
        let url = espn::stats_url(category)
            .ok_or_else(|| ScraperError::Config(format!("unknown ESPN stat category: {}", category)))?;
        info!(category, season, "crawling ESPN player stats");

        let body = match self.fetcher.fetch(url) {
            Some(body) => body,
            None => {
                warn!(category, "ESPN stats page unavailable");
                return Ok(());
            }
        };
        let mut set = extract(&body, &espn::stats_spec(), category);
        clean(&mut set, &espn::stats_rules());
        set.add_column("Category", category);
        set.add_column("赛季", season);
        self.store.save_in(
            PLAYER_STATS_DIR,
            &set,
            &format!("ESPN_{}_{}.csv", category, season),
            WriteMode::Overwrite,
        );
        Ok(())
    }

    pub fn crawl_all_espn_player_stats(&mut self, season: &str) -> Result<()> {
        for &(category, _) in espn::STAT_CATEGORIES {
            if interrupted() {
                warn!("interrupted, stopping ESPN stats batch");
                break;
            }
            self.crawl_espn_player_stats(category, season)?;
        }
        Ok(())
    }

    pub fn crawl_standings(&mut self, season: &str) -> Result<()> {
        info!(season, "crawling standings");
        match self.fetcher.fetch(hupu::standings_url()) {
            Some(body) => {
                let mut set = extract(&body, &hupu::standings_spec(), "standings");
                clean(&mut set, &hupu::standings_rules());
                set.add_column("赛季", season);
                self.store.save_in(
                    STANDINGS_DIR,
                    &set,
                    &format!("战绩排行_{}.csv", season),
                    WriteMode::Overwrite,
                );
            }
            None => warn!("standings page unavailable"),
        }

        match self.fetcher.fetch(espn::standings_url()) {
            Some(body) => {
                let mut set = extract(&body, &espn::standings_spec(), "standings");
                clean(&mut set, &espn::standings_rules());
                set.add_column("赛季", season);
                self.store.save_in(
                    STANDINGS_DIR,
                    &set,
                    &format!("ESPN_standings_{}.csv", season),
                    WriteMode::Overwrite,
                );
            }
            None => warn!("ESPN standings page unavailable"),
        }
        Ok(())
    }

    /// Crawls one Hupu team roster; returns the cleaned set for reuse by the
    /// merge stage (also persisted as its own artifact).
    pub fn crawl_roster(&mut self, team_code: &str, season: &str) -> Option<RecordSet> {
        let team = hupu::team_name(team_code);
        info!(team, season, "crawling roster");
        let body = match self.fetcher.fetch(&hupu::roster_url(team_code)) {
            Some(body) => body,
            None => {
                warn!(team, "roster page unavailable");
                return None;
            }
        };
        let mut set = extract(&body, &hupu::roster_spec(), "roster");
        if set.is_empty() {
            // Markup without the roster table still carries player links
            set = hupu::roster_from_links(&body, team);
        }
        set.add_column("球队", team);
        clean(&mut set, &hupu::roster_rules());
        set.add_column("赛季", season);
        self.store.save_in(
            ROSTERS_DIR,
            &set,
            &format!("{}_{}.csv", team, season),
            WriteMode::Overwrite,
        );
        if set.is_empty() {
            None
        } else {
            Some(set)
        }
    }

    pub fn crawl_all_rosters(&mut self, season: &str) -> Result<()> {
        for &(code, _) in hupu::TEAMS {
            if interrupted() {
                warn!("interrupted, stopping roster batch");
                break;
            }
            self.crawl_roster(code, season);
        }
        Ok(())
    }

    /// Priority order: rosters first, then the score/rebound/assist
    /// leaderboards, then standings.
    pub fn crawl_priority(&mut self, season: &str) -> Result<()> {
        self.crawl_all_rosters(season)?;
        for cat in hupu::CATEGORIES.iter().filter(|c| c.priority == 1) {
            self.crawl_player_stats(cat.code, season)?;
        }
        self.crawl_standings(season)
    }

    pub fn crawl_espn_roster(&mut self, code: &str) -> RecordSet {
        let team = espn::team_name(code);
        info!(team, code, "crawling ESPN roster");
        let body = match self.fetcher.fetch(&espn::roster_url(code)) {
            Some(body) => body,
            None => {
                warn!(team, "ESPN roster unavailable");
                return RecordSet::new(espn::SOURCE, "roster");
            }
        };
        let mut set = extract(&body, &espn::roster_spec(), "roster");
        if set.is_empty() {
            set = espn::roster_from_links(&body, team);
        } else {
            set.add_column("Team", team);
        }
        clean(&mut set, &espn::roster_rules());
        set
    }

    /// Builds the read-only name map for this run: official directory first,
    /// then slug-derived entries from the Hupu leaderboards, then the manual
    /// override table. Insertion is first-writer-wins throughout.
    pub fn build_name_map(&mut self) -> NameMap {
        let mut names = NameMap::new();
        nba_cn::load_official_names(&mut self.fetcher, &mut names);
        self.load_slug_names(&mut names);
        overrides::apply_overrides(&mut names);
        info!(entries = names.len(), "name map ready");
        names
    }

    /// Walks the scoring leaderboard pages and registers each player's URL
    /// slug as an alternate Latin spelling of the Chinese display name.
    fn load_slug_names(&mut self, names: &mut NameMap) {
        let cat = match hupu::category("pts") {
            Some(cat) => cat,
            None => return,
        };
        let spec = hupu::player_stats_spec(cat);
        let mut added = 0usize;
        for page in 1..=self.config.max_stat_pages {
            let body = match self.fetcher.fetch(&hupu::player_stats_url("pts", page)) {
                Some(body) => body,
                None => continue,
            };
            let set = extract(&body, &spec, "pts");
            if set.is_empty() {
                break;
            }
            for record in &set.records {
                let display = match record.text("球员") {
                    Some(name) if !name.is_empty() => name,
                    _ => continue,
                };
                let slug = record
                    .text("球员链接")
                    .and_then(hupu::player_slug);
                if let Some(slug) = slug {
                    if names.add(&slug, display) {
                        added += 1;
                    }
                }
            }
        }
        info!(added, "loaded slug-derived names");
    }

    /// The flagship reconciliation: for every franchise, join the Hupu
    /// roster (Chinese identity + Latin name) with the ESPN roster (salary)
    /// on fuzzy name identity, and fill localized names for players the
    /// name map resolves.
    pub fn merge_rosters_with_salary(&mut self, season: &str) -> Result<()> {
        let names = self.build_name_map();
        let mut overall = MatchStats::default();

        for &(hupu_code, team) in hupu::TEAMS {
            if interrupted() {
                warn!("interrupted, stopping salary merge batch");
                break;
            }
            let espn_code = match espn::code_for_team(team) {
                Some(code) => code,
                None => {
                    warn!(team, "no ESPN code for team");
                    continue;
                }
            };

            let mut roster = match self.crawl_roster(hupu_code, season) {
                Some(set) => set,
                None => continue,
            };
            let espn_roster = self.crawl_espn_roster(espn_code);
            if espn_roster.is_empty() {
                warn!(team, "ESPN roster empty, no salary data this run");
            }

            let salaries = build_lookup(&espn_roster, "Name", "Salary");
            let stats = merge_field(&mut roster, &salaries, "英文名", "薪资");
            overall.total += stats.total;
            overall.matched += stats.matched;

            attach_display_names(&mut roster, "球员", &names, "球员中文名");

            self.store.save_in(
                MERGED_DIR,
                &roster,
                &format!("{}_{}.csv", team, season),
                WriteMode::Overwrite,
            );
        }

        info!(season, "salary merge matched {}", overall);
        Ok(())
    }

    /// Crawls every ESPN roster and annotates it with localized player names
    /// resolved through the name map.
    pub fn crawl_espn_rosters(&mut self, season: &str) -> Result<()> {
        let names = self.build_name_map();
        for &(code, team) in espn::TEAMS {
            if interrupted() {
                warn!("interrupted, stopping ESPN roster batch");
                break;
            }
            let mut set = self.crawl_espn_roster(code);
            if set.is_empty() {
                continue;
            }
            attach_display_names(&mut set, "Name", &names, "球员中文名");
            set.add_column("赛季", season);
            self.store.save_in(
                ROSTERS_DIR,
                &set,
                &format!("ESPN_{}_{}.csv", team, season),
                WriteMode::Overwrite,
            );
        }
        Ok(())
    }
}

/// Derives the TeamCode column from each record's captured team link.
fn annotate_team_codes(set: &mut RecordSet) {
    for record in &mut set.records {
        let code = record
            .text("TeamLink")
            .and_then(espn::team_code_from_link)
            .map(str::to_string);
        if let Some(code) = code {
            record.set("TeamCode", Field::Text(code));
        }
    }
}

/// Joins one ESPN team-stats view onto the general set by team name; columns
/// the general view already carries are skipped, the rest land prefixed.
fn merge_team_view(base: &mut RecordSet, view: &RecordSet, prefix: &str) {
    for record in &mut base.records {
        let team = match record.text("Team") {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => continue,
        };
        let extra = view
            .records
            .iter()
            .find(|r| r.text("Team") == Some(team.as_str()));
        if let Some(extra) = extra {
            for (label, value) in extra.iter() {
                if record.get(label).is_none() {
                    record.set(format!("{}{}", prefix, label), value.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn team_record(pairs: &[(&str, &str)]) -> Record {
        let mut r = Record::new();
        for (label, value) in pairs {
            r.set(*label, Field::Text((*value).to_string()));
        }
        r
    }

    #[test]
    fn team_views_join_by_name_with_prefixed_columns() {
        let mut base = RecordSet::new("espn", "team_stats");
        base.push(team_record(&[("Team", "Boston Celtics"), ("GP", "82"), ("PTS", "120.6")]));
        base.push(team_record(&[("Team", "Denver Nuggets"), ("GP", "82"), ("PTS", "114.9")]));

        let mut offensive = RecordSet::new("espn", "team_stats");
        offensive.push(team_record(&[("Team", "Boston Celtics"), ("GP", "82"), ("AST", "26.9")]));

        merge_team_view(&mut base, &offensive, "OFF_");
        // New columns land prefixed, shared ones are not duplicated.
        assert_eq!(base.records[0].text("OFF_AST"), Some("26.9"));
        assert!(base.records[0].get("OFF_GP").is_none());
        assert_eq!(base.records[0].text("GP"), Some("82"));
        // A team absent from the view keeps only its general columns.
        assert!(base.records[1].get("OFF_AST").is_none());
    }

    #[test]
    fn team_codes_derive_from_links() {
        let mut set = RecordSet::new("espn", "team_stats");
        set.push(team_record(&[
            ("Team", "Los Angeles Lakers"),
            ("TeamLink", "/nba/team/_/name/lal/los-angeles-lakers"),
        ]));
        set.push(team_record(&[("Team", "No Link Club")]));
        annotate_team_codes(&mut set);
        assert_eq!(set.records[0].text("TeamCode"), Some("lal"));
        assert!(set.records[1].get("TeamCode").is_none());
    }

    #[test]
    fn interrupt_flag_round_trips() {
        clear_interrupt();
        assert!(!interrupted());
        request_interrupt();
        assert!(interrupted());
        clear_interrupt();
        assert!(!interrupted());
    }
}
