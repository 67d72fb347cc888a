use tracing::{Level, debug, span, trace};

use crate::{
    analyzer::{
        analyzer::Analyzer,
        events::{Decoded, LogEvent, decode_message},
        survey::SurveyStats,
    },
    config::ParserConfig,
    line::parse_line,
    types::{FlagColor, Slot, Timestamp},
};

use super::{
    player::Player,
    registry::{PlayerId, PlayerRegistry},
    report::StatsReport,
};

/// Folds a log into per-player statistics.
///
/// Lines go through the tokenizer and the grammar table; each decoded event
/// updates the registry and the affected players. Nothing in a log is fatal:
/// lines that do not parse and events about unknown clients are skipped and
/// counted in the survey.
pub struct StatsController {
    config: ParserConfig,
    registry: PlayerRegistry,
    clock: Timestamp,
    survey: SurveyStats,
    finished: bool,
}

impl Default for StatsController {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl StatsController {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            registry: PlayerRegistry::new(),
            clock: Timestamp::default(),
            survey: SurveyStats::new(),
            finished: false,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Timestamp of the last line that carried one.
    pub fn clock(&self) -> Timestamp {
        self.clock
    }

    pub fn survey(&self) -> &SurveyStats {
        &self.survey
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    /// Players in creation order.
    pub fn players(&self) -> &[Player] {
        self.registry.players()
    }

    pub fn player_by_slot(&self, slot: Slot) -> Option<&Player> {
        self.registry.by_slot(slot)
    }

    pub fn player_by_name(&self, name: &str) -> Option<&Player> {
        self.registry.by_name(name)
    }

    /// Apply one decoded event at `at`. Also the entry point for callers
    /// that tokenize and decode lines themselves.
    pub fn handle_event(&mut self, at: Timestamp, event: &LogEvent) {
        let resolved = match event {
            LogEvent::InitGame => {
                self.handle_init_game(at);
                true
            }
            LogEvent::ClientConnect {
                slot,
                name,
                address,
            } => {
                self.handle_connect(*slot, name, address);
                true
            }
            LogEvent::ClientUserinfoChanged {
                slot,
                name,
                class,
                wfc,
                ..
            } => self.handle_userinfo_changed(at, *slot, name, class, wfc),
            LogEvent::ClientDisconnect { slot } => self.handle_disconnect(at, *slot),
            LogEvent::Kill {
                killer,
                victim,
                cause,
                ..
            } => self.handle_kill(at, *killer, *victim, cause),
            LogEvent::BaseDefend { name, .. } => self
                .registry
                .by_name_mut(name)
                .map(Player::defend_base)
                .is_some(),
            LogEvent::FlagDefend { name, .. } => self
                .registry
                .by_name_mut(name)
                .map(Player::defend_flag)
                .is_some(),
            LogEvent::CarrierAssist { name, .. } => self
                .registry
                .by_name_mut(name)
                .map(Player::assist_carrier)
                .is_some(),
            LogEvent::FlagGrab { name, color } => self.handle_flag_grab(at, name, *color),
            LogEvent::FlagCapture { name, .. } => self
                .registry
                .by_name_mut(name)
                .map(|player| player.capture_flag(at))
                .is_some(),
        };

        if !resolved {
            trace!("{at} {:?} refers to an unknown client", event);
            self.survey.unresolved_references += 1;
        }
    }

    fn handle_init_game(&mut self, at: Timestamp) {
        debug!("new match at {at}, closing sessions for {} players", self.registry.len());
        self.close_all_sessions(at);
        self.registry.reset_slots();
    }

    fn handle_connect(&mut self, slot: Slot, name: &str, address: &str) -> PlayerId {
        self.registry
            .connect(slot, name, address, &self.config.unnamed_sentinel)
    }

    fn handle_userinfo_changed(
        &mut self,
        at: Timestamp,
        slot: Slot,
        name: &str,
        class: &str,
        wfc: &str,
    ) -> bool {
        if self.registry.rename_slot(slot, name).is_none() {
            return false;
        }
        let Some(player) = self.registry.by_slot_mut(slot) else {
            return false;
        };

        // Only "0" is known to mean "not playing"; any other value is taken
        // to select the class from the model string.
        let class = if wfc == "0" { None } else { Some(class) };
        player.change_class(at, class);
        true
    }

    fn handle_disconnect(&mut self, at: Timestamp, slot: Slot) -> bool {
        let Some(player) = self.registry.by_slot_mut(slot) else {
            return false;
        };
        player.close_sessions(at);
        self.registry.release_slot(slot);
        true
    }

    fn handle_kill(&mut self, at: Timestamp, killer: Slot, victim: Slot, cause: &str) -> bool {
        if killer == victim {
            let intentional = self.config.is_intentional_death(cause);
            let Some(player) = self.registry.by_slot_mut(killer) else {
                return false;
            };
            if intentional {
                player.intentional_death(at);
            } else {
                player.death(at, cause, true);
            }
            return true;
        }

        let mut resolved = false;
        if let Some(player) = self.registry.by_slot_mut(killer) {
            player.frag(cause);
            resolved = true;
        }
        if let Some(player) = self.registry.by_slot_mut(victim) {
            player.death(at, cause, false);
            resolved = true;
        }
        resolved
    }

    fn handle_flag_grab(&mut self, at: Timestamp, name: &str, color: FlagColor) -> bool {
        let Some(player) = self.registry.by_name_mut(name) else {
            return false;
        };
        player.grab_flag(at, color);
        true
    }

    fn close_all_sessions(&mut self, at: Timestamp) {
        for player in self.registry.players_mut() {
            player.close_sessions(at);
        }
    }

    /// Close every open session and build one record per player.
    pub fn build_report(mut self) -> StatsReport {
        self.finish();
        let sentinel = self.config.unnamed_sentinel.as_str();
        StatsReport::new(
            self.registry
                .players()
                .iter()
                .map(|player| player.to_record(sentinel))
                .collect(),
        )
    }

    /// Build the report and hand back the survey alongside it.
    pub fn into_parts(mut self) -> (StatsReport, SurveyStats) {
        let survey = std::mem::take(&mut self.survey);
        (self.build_report(), survey)
    }
}

impl Analyzer for StatsController {
    fn process(&mut self, line: &str) {
        let span = span!(Level::TRACE, "line processing");
        let _enter = span.enter();

        self.survey.total_lines += 1;
        let Some(parsed) = parse_line(line) else {
            trace!("not an event line: {line:?}");
            self.survey.malformed_lines += 1;
            return;
        };
        self.survey.event_lines += 1;
        self.clock = parsed.timestamp;

        match decode_message(parsed.message) {
            Decoded::Event(event) => {
                self.survey.record(&event);
                self.handle_event(parsed.timestamp, &event);
            }
            Decoded::Unmatched => {
                trace!("no grammar for {:?}", parsed.message);
                self.survey.unmatched_messages += 1;
            }
            Decoded::Rejected(kind) => {
                trace!("{kind:?} line has out of range fields: {:?}", parsed.message);
                self.survey.rejected_messages += 1;
            }
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        // A log without a single clocked line has nothing to close.
        if self.clock > Timestamp::default() {
            debug!("end of log at {}", self.clock);
            self.close_all_sessions(self.clock);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lines: &[&str]) -> StatsController {
        let mut controller = StatsController::default();
        for line in lines {
            controller.process(line);
        }
        controller
    }

    const FOO_CONNECT: &str = "1:05 ClientConnect: 3, Name: Foo, Ip: 10.0.0.1:27960 DATE: 2004-05-01";
    const BAR_CONNECT: &str = "1:05 ClientConnect: 4, Name: Bar, Ip: 10.0.0.2:27960 DATE: 2004-05-01";

    #[test]
    fn suicide_is_not_a_death() {
        let controller = run(&[
            FOO_CONNECT,
            "1:06 Kill: 3 3 20: Foo killed Foo by MOD_SUICIDE",
            "2:00 InitGame: \\sv_hostname\\WFA",
        ]);
        let foo = controller.player_by_name("Foo").unwrap();
        assert_eq!(foo.stats().kills, 0);
        assert_eq!(foo.stats().deaths, 0);
        assert_eq!(foo.stats().oopsies, 0);
    }

    #[test]
    fn kill_with_oversized_cause_code_is_counted() {
        let controller = run(&[
            FOO_CONNECT,
            BAR_CONNECT,
            "0:10 Kill: 3 4 99999999999: Foo killed Bar by MOD_ROCKET",
        ]);
        assert_eq!(controller.player_by_name("Foo").unwrap().stats().kills, 1);
        assert_eq!(controller.player_by_name("Bar").unwrap().stats().deaths, 1);
        assert_eq!(controller.survey().rejected_messages, 0);
    }

    #[test]
    fn zero_padded_slot_is_the_same_client() {
        let controller = run(&[
            "1:05 ClientConnect: 03, Name: Foo, Ip: 10.0.0.1:27960 DATE: 2004-05-01",
            "1:06 Kill: 3 3 7: Foo killed Foo by MOD_ROCKET_SPLASH",
        ]);
        assert_eq!(controller.player_by_slot(Slot(3)).unwrap().stats().oopsies, 1);
    }

    #[test]
    fn unintentional_self_kill_is_an_oopsie() {
        let controller = run(&[
            FOO_CONNECT,
            "1:06 Kill: 3 3 7: Foo killed Foo by MOD_ROCKET_SPLASH",
        ]);
        let foo = controller.player_by_name("Foo").unwrap();
        assert_eq!(foo.stats().deaths, 1);
        assert_eq!(foo.stats().oopsies, 1);
        assert_eq!(foo.stats().deaths_by_cause["MOD_ROCKET_SPLASH"], 1);
        assert_eq!(foo.stats().kills, 0);
    }

    #[test]
    fn kill_credits_killer_and_victim_independently() {
        let mut controller = run(&[
            FOO_CONNECT,
            BAR_CONNECT,
            "1:10 Kill: 3 4 6: Foo killed Bar by MOD_ROCKET",
            "1:11 Kill: 1022 4 22: <world> killed Bar by MOD_TRIGGER_HURT",
            "1:12 Kill: 3 9 6: Foo killed Ghost by MOD_ROCKET",
        ]);
        controller.finish();

        let foo = controller.player_by_name("Foo").unwrap();
        assert_eq!(foo.stats().kills, 2);
        assert_eq!(foo.killstreak().best(), 2);
        let bar = controller.player_by_name("Bar").unwrap();
        assert_eq!(bar.stats().deaths, 2);
        assert_eq!(bar.stats().deaths_by_cause["MOD_TRIGGER_HURT"], 1);
        assert_eq!(controller.survey().unresolved_references, 0);
    }

    #[test]
    fn victim_loses_the_flag_on_death() {
        let controller = run(&[
            FOO_CONNECT,
            BAR_CONNECT,
            "1:10 Bar got the RED flag!",
            "1:25 Kill: 3 4 6: Foo killed Bar by MOD_ROCKET",
            "1:40 Bar captured the RED flag!",
        ]);
        let bar = controller.player_by_name("Bar").unwrap();
        assert_eq!(bar.stats().flag_carry_time, 15);
        assert_eq!(bar.stats().flag_grabs, 1);
        assert_eq!(bar.stats().flag_captures, 1);
    }

    #[test]
    fn userinfo_drives_the_class_session() {
        let mut controller = run(&[
            FOO_CONNECT,
            "1:10 ClientUserinfoChanged: 3 n\\Foo\\t\\1\\model\\redsoldier\\hmodel\\redsoldier\\wfc\\2",
            "1:30 ClientUserinfoChanged: 3 n\\Foo\\t\\1\\model\\redsoldier\\hmodel\\redsoldier\\wfc\\2",
            "1:50 ClientUserinfoChanged: 3 n\\Foo\\t\\1\\model\\redmedic\\hmodel\\redmedic\\wfc\\5",
            "2:00 ClientUserinfoChanged: 3 n\\Foo\\t\\1\\model\\redmedic\\hmodel\\redmedic\\wfc\\0",
        ]);
        controller.finish();

        let foo = controller.player_by_name("Foo").unwrap();
        assert_eq!(foo.class(), None);
        assert_eq!(foo.stats().played_time, 50);
        assert_eq!(foo.stats().played_time_by_class["soldier"], 40);
        assert_eq!(foo.stats().played_time_by_class["medic"], 10);
    }

    #[test]
    fn userinfo_rename_keeps_totals() {
        let controller = run(&[
            FOO_CONNECT,
            "1:10 Foo defends the RED base!",
            "1:11 ClientUserinfoChanged: 3 n\\Fooz\\t\\1\\model\\redsoldier\\hmodel\\redsoldier\\wfc\\1",
            "1:12 Fooz defends the RED flag!",
        ]);
        let player = controller.player_by_slot(Slot(3)).unwrap();
        assert_eq!(player.name(), "Fooz");
        assert_eq!(player.aliases(), ["Foo".to_owned(), "Fooz".to_owned()]);
        assert_eq!(player.stats().base_defends, 1);
        assert_eq!(player.stats().flag_defends, 1);
    }

    #[test]
    fn disconnect_closes_sessions_and_frees_the_slot() {
        let controller = run(&[
            FOO_CONNECT,
            "1:10 ClientUserinfoChanged: 3 n\\Foo\\t\\1\\model\\bluescout\\hmodel\\bluescout\\wfc\\1",
            "1:15 Foo got the BLUE flag!",
            "1:20 ClientDisconnect: 3",
            "1:21 ClientDisconnect: 3",
        ]);
        assert!(controller.player_by_slot(Slot(3)).is_none());
        let foo = controller.player_by_name("Foo").unwrap();
        assert_eq!(foo.flag(), None);
        assert_eq!(foo.stats().flag_carry_time, 5);
        assert_eq!(foo.stats().played_time, 10);
        assert_eq!(controller.survey().unresolved_references, 1);
    }

    #[test]
    fn new_match_voids_slots() {
        let controller = run(&[
            FOO_CONNECT,
            "2:00 InitGame: \\sv_hostname\\WFA",
            "2:01 Kill: 3 3 7: Foo killed Foo by MOD_ROCKET_SPLASH",
        ]);
        assert!(controller.player_by_slot(Slot(3)).is_none());
        assert_eq!(controller.player_by_name("Foo").unwrap().stats().deaths, 0);
    }

    #[test]
    fn unknown_names_and_slots_are_no_ops() {
        let controller = run(&[
            "0:10 Nobody got the RED flag!",
            "0:11 ClientUserinfoChanged: 7 n\\Nobody\\t\\1\\model\\redsoldier\\hmodel\\redsoldier\\wfc\\1",
            "0:12 Kill: 1 2 6: A killed B by MOD_ROCKET",
        ]);
        assert!(controller.players().is_empty());
        assert!(controller.player_by_name("Nobody").is_none());
        assert_eq!(controller.survey().unresolved_references, 3);
    }

    #[test]
    fn survey_accounts_for_every_line() {
        let controller = run(&[
            "------------------------------------------------------------",
            "0:00 InitGame: \\sv_hostname\\WFA",
            "0:01 say: Foo: hi",
            "0:02 ClientDisconnect: 99999999999",
            FOO_CONNECT,
        ]);
        let survey = controller.survey();
        assert_eq!(survey.total_lines, 5);
        assert_eq!(survey.malformed_lines, 1);
        assert_eq!(survey.event_lines, 4);
        assert_eq!(survey.unmatched_messages, 1);
        assert_eq!(survey.rejected_messages, 1);
        assert_eq!(survey.events(), 2);
        assert_eq!(controller.clock(), Timestamp(65));
    }

    #[test]
    fn finish_closes_at_the_last_clock() {
        let controller = run(&[
            FOO_CONNECT,
            "1:10 ClientUserinfoChanged: 3 n\\Foo\\t\\1\\model\\redsoldier\\hmodel\\redsoldier\\wfc\\1",
            "1:10 Kill: 3 9 6: Foo killed Ghost by MOD_ROCKET",
            "1:40 say: Foo: bye",
        ]);
        let report = controller.build_report();
        let foo = report.find("Foo").unwrap();
        assert_eq!(foo.played_time, 30);
        assert_eq!(foo.killstreak, 1);
    }
}
