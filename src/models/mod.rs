use crate::error::ScrapeError;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── League ────────────────────────────────────────────────────────────────────

/// Site partition. Each league is served from its own subdomain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum League {
    Fwa,
    Cc,
}

impl League {
    pub fn as_str(self) -> &'static str {
        match self {
            League::Fwa => "fwa",
            League::Cc => "cc",
        }
    }

    /// Root every request of this league is built from. Ends with '/'
    /// so relative hrefs from the pages join underneath it.
    pub fn base_url(self) -> String {
        format!("https://{}.chocolateclash.com/cc_n/", self.as_str())
    }
}

impl FromStr for League {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fwa" => Ok(League::Fwa),
            "cc" => Ok(League::Cc),
            other => Err(ScrapeError::UnknownLeague(other.to_string())),
        }
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Clan ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clan {
    pub tag: String,
    pub name: String,
    pub league: String,
    pub url: String,
}

// ── Member log entries ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub timestamp: String,
    pub action: String,
    pub clan: Clan,
}

/// One row of the war log.
///
/// `fix_war_pid` is true exactly when `fix_war_pid_url` is set, and then
/// `color` is `None`. A row without an opponent clan never has a color.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attack {
    pub timestamp: String,
    pub information: String,
    pub color: Option<String>,
    pub member_on_clan: Option<Clan>,
    pub opponent_clan: Option<Clan>,
    pub fix_war_pid: bool,
    pub fix_war_pid_url: Option<String>,
}

impl Attack {
    /// Date part of the timestamp, when it starts with `YYYY-MM-DD`.
    pub fn date(&self) -> Option<NaiveDate> {
        let head = self.timestamp.trim().get(..10)?;
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    }

    /// Purple and red rows mark attacks that broke war rules.
    pub fn is_violation(&self) -> bool {
        self.color
            .as_deref()
            .map(|c| c.eq_ignore_ascii_case("purple") || c.eq_ignore_ascii_case("red"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub timestamp: String,
    pub note: String,
    pub author: String,
}

// ── Member ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub tag: String,
    pub name: String,
    pub synchronized: bool,
    pub in_game_url: String,
    pub donations: u32,
    pub donations_received: u32,
    pub town_hall_level: u32,
    pub role: String,
    pub clan: Clan,
    pub actions: Vec<Action>,
    pub attacks: Vec<Attack>,
    pub notes: Vec<Note>,
}

impl Member {
    /// Attacks dated strictly after `today - window_days`. A window reaching
    /// past the calendar range covers every dated attack.
    pub fn recent_attacks(&self, today: NaiveDate, window_days: i64) -> Vec<&Attack> {
        let cutoff = Duration::try_days(window_days).and_then(|w| today.checked_sub_signed(w));
        self.attacks
            .iter()
            .filter(|a| {
                a.date()
                    .is_some_and(|d| cutoff.is_none_or(|cutoff| d > cutoff))
            })
            .collect()
    }

    /// A member stays eligible for war while no recent attack is purple or red.
    pub fn is_war_eligible(&self, today: NaiveDate, window_days: i64) -> bool {
        !self
            .recent_attacks(today, window_days)
            .iter()
            .any(|a| a.is_violation())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn attack(timestamp: &str, color: Option<&str>) -> Attack {
        Attack {
            timestamp: timestamp.to_string(),
            color: color.map(str::to_string),
            opponent_clan: color.map(|_| Clan::default()),
            ..Default::default()
        }
    }

    fn populated_member() -> Member {
        let clan = Clan {
            tag: "#2PP".into(),
            name: "Home".into(),
            league: "FWA".into(),
            url: "https://fwa.chocolateclash.com/cc_n/clan.php?tag=2PP".into(),
        };
        Member {
            tag: "#PRQL2VJR".into(),
            name: "Bob".into(),
            synchronized: true,
            in_game_url: "clashofclans://action=OpenPlayerProfile&tag=PRQL2VJR".into(),
            donations: 120,
            donations_received: 80,
            town_hall_level: 14,
            role: "Co-leader".into(),
            clan: clan.clone(),
            actions: vec![Action {
                timestamp: "2024-01-01".into(),
                action: "Joined".into(),
                clan: clan.clone(),
            }],
            attacks: vec![
                Attack {
                    timestamp: "2024-01-02".into(),
                    information: "3 stars".into(),
                    color: Some("green".into()),
                    member_on_clan: Some(clan.clone()),
                    opponent_clan: Some(Clan { tag: "#9XX".into(), ..clan.clone() }),
                    fix_war_pid: false,
                    fix_war_pid_url: None,
                },
                Attack {
                    timestamp: "2024-01-03".into(),
                    information: "unknown".into(),
                    color: None,
                    member_on_clan: None,
                    opponent_clan: None,
                    fix_war_pid: true,
                    fix_war_pid_url: Some("https://fwa.chocolateclash.com/cc_n/fixwarpidissue.php?x=1".into()),
                },
            ],
            notes: vec![Note {
                timestamp: "2024-01-04".into(),
                note: "Friendly".into(),
                author: "Alice".into(),
            }],
        }
    }

    #[test]
    fn test_league_from_str() {
        assert_eq!("fwa".parse::<League>().unwrap(), League::Fwa);
        assert_eq!("cc".parse::<League>().unwrap(), League::Cc);
        for bad in ["", "FWA", "gold", "fwa "] {
            assert!(matches!(bad.parse::<League>(), Err(ScrapeError::UnknownLeague(s)) if s == bad));
        }
    }

    #[test]
    fn test_league_base_url_contains_identifier() {
        for league in [League::Fwa, League::Cc] {
            let base = league.base_url();
            assert!(base.contains(&format!("//{}.", league)));
            assert!(base.ends_with('/'));
        }
    }

    #[test]
    fn test_member_json_round_trip() {
        let member = populated_member();
        let json = serde_json::to_string(&member).unwrap();
        let back: Member = serde_json::from_str(&json).unwrap();
        assert_eq!(back, member);
        assert!(back.attacks[0].color.is_some());
        assert!(back.attacks[1].color.is_none());
        assert!(back.attacks[1].opponent_clan.is_none());
    }

    #[test]
    fn test_member_json_field_names() {
        let value = serde_json::to_value(populated_member()).unwrap();
        for key in ["inGameUrl", "donationsReceived", "townHallLevel", "actions", "attacks", "notes"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        let absent = &value["attacks"][1];
        assert!(absent["color"].is_null());
        assert!(absent["memberOnClan"].is_null());
        assert!(absent["opponentClan"].is_null());
        assert_eq!(absent["fixWarPid"], true);
        assert!(value["attacks"][0]["fixWarPidUrl"].is_null());
    }

    #[test]
    fn test_attack_date() {
        assert_eq!(
            attack("2024-03-05 12:00:00", None).date(),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(attack("yesterday", None).date(), None);
        assert_eq!(attack("", None).date(), None);
    }

    #[test]
    fn test_war_eligibility_window() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let mut member = Member::default();
        member.attacks = vec![
            attack("2023-12-01", Some("red")),
            attack("2024-01-20", Some("green")),
            attack("not a date", Some("purple")),
        ];
        assert_eq!(member.recent_attacks(today, 30).len(), 1);
        assert!(member.is_war_eligible(today, 30));

        member.attacks.push(attack("2024-01-25", Some("Purple")));
        assert!(!member.is_war_eligible(today, 30));
        assert!(member.is_war_eligible(today, 3));
    }

    #[test]
    fn test_war_eligibility_huge_window() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let mut member = Member::default();
        member.attacks = vec![
            attack("1999-06-01", Some("red")),
            attack("2024-01-20", Some("green")),
            attack("undated", Some("purple")),
        ];
        assert_eq!(member.recent_attacks(today, 1_000_000_000).len(), 2);
        assert!(!member.is_war_eligible(today, 1_000_000_000));
        assert_eq!(member.recent_attacks(today, i64::MAX).len(), 2);
    }
}
