use regex::Regex;
use std::sync::LazyLock;

// ── Patterns ──────────────────────────────────────────────────────────────────

// All of these run against the whole text of the `#top` block, not per line.
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| re(r"for\s(#[\w\d]+)"));
static RE_NAME: LazyLock<Regex> = LazyLock::new(|| re(r"Name:\s([\w\d.-]+)"));
static RE_SYNC: LazyLock<Regex> = LazyLock::new(|| re(r"Synchronized:\s(\w+)"));
static RE_DONATIONS: LazyLock<Regex> = LazyLock::new(|| re(r"Donates:\s(\d+)"));
static RE_RECEIVED: LazyLock<Regex> = LazyLock::new(|| re(r"Receives:\s(\d+)"));
static RE_TOWN_HALL: LazyLock<Regex> = LazyLock::new(|| re(r"Town\sHall:\s(\d+)"));
static RE_ROLE: LazyLock<Regex> = LazyLock::new(|| re(r"Rank:\s([\w+-]+)"));
static RE_CLAN: LazyLock<Regex> = LazyLock::new(|| re(r"Clan:\s(.+)Donates:"));

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("hardcoded regex pattern is valid")
}

/// First capture group of `re` in `text`, or "" when it does not match.
fn capture<'t>(re: &Regex, text: &'t str) -> &'t str {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or("")
}

fn capture_u32(re: &Regex, text: &str) -> u32 {
    capture(re, text).parse().unwrap_or(0)
}

// ── Profile header fields ─────────────────────────────────────────────────────

/// The `Clan: <name> (<tag>) (<league>)` part of the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClanFragment {
    pub name: String,
    pub tag: String,
    pub league: String,
}

/// Everything the header text yields. Misses stay at their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFields {
    pub tag: String,
    pub name: String,
    pub synchronized: bool,
    pub donations: u32,
    pub donations_received: u32,
    pub town_hall_level: u32,
    pub role: String,
    pub clan: Option<ClanFragment>,
}

pub fn extract_profile_fields(text: &str) -> ProfileFields {
    ProfileFields {
        tag: capture(&RE_TAG, text).to_string(),
        name: capture(&RE_NAME, text).to_string(),
        synchronized: parse_sync_flag(capture(&RE_SYNC, text)),
        donations: capture_u32(&RE_DONATIONS, text),
        donations_received: capture_u32(&RE_RECEIVED, text),
        town_hall_level: capture_u32(&RE_TOWN_HALL, text),
        role: capture(&RE_ROLE, text).to_string(),
        clan: parse_clan_fragment(capture(&RE_CLAN, text)),
    }
}

/// "yes" in any case is true, anything else false.
pub fn parse_sync_flag(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("yes")
}

/// Split `Name (TAG) (League)` on '('. Needs at least three parts.
/// "Foo (2PP) (FWA)" → name "Foo", tag "#2PP", league "FWA"
pub fn parse_clan_fragment(fragment: &str) -> Option<ClanFragment> {
    let mut parts = fragment.split('(');
    let name = parts.next()?.trim();
    let tag = strip_first(parts.next()?, ")");
    let league = strip_first(parts.next()?, ")");

    Some(ClanFragment {
        name: name.to_string(),
        tag: normalize_tag(&tag),
        league,
    })
}

fn strip_first(s: &str, pat: &str) -> String {
    s.trim().replacen(pat, "", 1).trim().to_string()
}

// ── Tags, links, labels ───────────────────────────────────────────────────────

/// Prefix a tag with '#' unless it already has one.
pub fn normalize_tag(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    let bare = raw.trim_start_matches('#').trim_start_matches("%23");
    format!("#{}", bare)
}

/// Clan tag from a link like `clan.php?tag=2PP` (segment after the last '=').
pub fn tag_from_href(href: &str) -> String {
    let last = href.rsplit('=').next().unwrap_or("");
    normalize_tag(last)
}

/// Value of the `color` declaration in an inline style.
/// "color:purple;" → "purple" | "font-weight:bold; color: red" → "red"
pub fn style_color(style: &str) -> Option<String> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .find(|(prop, _)| prop.trim().eq_ignore_ascii_case("color"))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// League labels render as "(FWA)"; drop the first pair of parentheses.
pub fn strip_parens(s: &str) -> String {
    s.trim().replacen('(', "", 1).replacen(')', "", 1).trim().to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Member Information for #PRQL2VJR\n\
        Name: Bob.the-Builder\n\
        Synchronized: Yes\n\
        Town Hall: 14\n\
        Rank: Co-leader\n\
        Clan: Home Base (2PP8Q) (FWA) Donates: 1234\n\
        Receives: 567\n";

    #[test]
    fn test_extract_profile_fields() {
        let f = extract_profile_fields(HEADER);
        assert_eq!(f.tag, "#PRQL2VJR");
        assert_eq!(f.name, "Bob.the-Builder");
        assert!(f.synchronized);
        assert_eq!(f.town_hall_level, 14);
        assert_eq!(f.role, "Co-leader");
        assert_eq!(f.donations, 1234);
        assert_eq!(f.donations_received, 567);
        assert_eq!(
            f.clan,
            Some(ClanFragment {
                name: "Home Base".into(),
                tag: "#2PP8Q".into(),
                league: "FWA".into(),
            })
        );
    }

    #[test]
    fn test_extract_profile_fields_empty_text() {
        assert_eq!(extract_profile_fields(""), ProfileFields::default());
    }

    #[test]
    fn test_sync_flag() {
        assert!(extract_profile_fields("Synchronized: Yes").synchronized);
        assert!(extract_profile_fields("Synchronized: YES").synchronized);
        assert!(!extract_profile_fields("Synchronized: No").synchronized);
        assert!(!extract_profile_fields("Name: x").synchronized);
        assert!(!parse_sync_flag("yesterday"));
    }

    #[test]
    fn test_clan_fragment_needs_three_parts() {
        assert_eq!(parse_clan_fragment("Lonely (2PP)"), None);
        assert_eq!(parse_clan_fragment(""), None);
        let clan = parse_clan_fragment("A (B) (C) (D)").unwrap();
        assert_eq!((clan.name.as_str(), clan.tag.as_str(), clan.league.as_str()), ("A", "#B", "C"));
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("ABC123"), "#ABC123");
        assert_eq!(normalize_tag("#ABC123"), "#ABC123");
        assert_eq!(normalize_tag("%23ABC123"), "#ABC123");
        assert_eq!(normalize_tag("  "), "");
    }

    #[test]
    fn test_tag_from_href() {
        assert_eq!(tag_from_href("clan.php?tag=ABC123"), "#ABC123");
        assert_eq!(tag_from_href("clan.php?x=1&tag=QQ"), "#QQ");
        assert_eq!(tag_from_href(""), "");
    }

    #[test]
    fn test_style_color() {
        assert_eq!(style_color("color:purple;").as_deref(), Some("purple"));
        assert_eq!(style_color("font-weight:bold; color: Red").as_deref(), Some("Red"));
        assert_eq!(style_color("background-color:red"), None);
        assert_eq!(style_color(""), None);
    }

    #[test]
    fn test_strip_parens() {
        assert_eq!(strip_parens("(Gold)"), "Gold");
        assert_eq!(strip_parens(" ( FWA ) "), "FWA");
        assert_eq!(strip_parens("plain"), "plain");
    }
}
