use crate::models::{Action, Attack, Clan, Member, Note};
use crate::scraper::cleaner::{
    extract_profile_fields, strip_parens, style_color, tag_from_href, ProfileFields,
};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Substring that identifies the site's war pid repair endpoint.
pub const FIX_WAR_PID_MARKER: &str = "fixwarpidissue";

static SELECTORS: LazyLock<Selectors> = LazyLock::new(Selectors::new);

struct Selectors {
    top: Selector,
    anchor: Selector,
    table_body: Selector,
    fix_link: Selector,
}

impl Selectors {
    fn new() -> Self {
        Self {
            top: sel("#top"),
            anchor: sel("a"),
            table_body: sel("table > tbody"),
            // Third child anchor anywhere under a second column
            fix_link: sel("td:nth-child(2) a:nth-child(3)"),
        }
    }
}

fn sel(s: &str) -> Selector {
    Selector::parse(s).expect("hardcoded selector is valid")
}

// ── Element helpers ───────────────────────────────────────────────────────────

fn text_of(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn element_children<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

fn is(el: &ElementRef, tag: &str) -> bool {
    el.value().name() == tag
}

/// `n`-th element child (1-based, like `:nth-child`), if it is a `tag`.
fn nth_child<'a>(el: ElementRef<'a>, n: usize, tag: &str) -> Option<ElementRef<'a>> {
    element_children(el).nth(n.checked_sub(1)?).filter(|c| is(c, tag))
}

fn href<'a>(el: ElementRef<'a>) -> &'a str {
    el.value().attr("href").unwrap_or("").trim()
}

/// Anchor at child position `n` of `cell`, only when it carries a link.
fn linked_anchor<'a>(cell: ElementRef<'a>, n: usize) -> Option<ElementRef<'a>> {
    nth_child(cell, n, "a").filter(|a| !href(*a).is_empty())
}

fn cell_text(row: ElementRef, n: usize) -> String {
    nth_child(row, n, "td").map(text_of).unwrap_or_default()
}

/// Resolve a page href against the league root.
pub fn absolute_url(base: &Url, href: &str) -> String {
    if href.is_empty() {
        return String::new();
    }
    base.join(href)
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

fn clan_from_anchor(anchor: ElementRef, league: String, base: &Url) -> Clan {
    let link = href(anchor);
    Clan {
        tag: tag_from_href(link),
        name: text_of(anchor),
        league,
        url: absolute_url(base, link),
    }
}

// ── Table classification ──────────────────────────────────────────────────────

/// The member page renders three look-alike tables, told apart by the
/// second cell of their first row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Action,
    Information,
    Note,
    Unknown,
}

impl TableKind {
    /// Checked in order; the first marker found in the header wins.
    const MARKERS: [(&'static str, TableKind); 3] = [
        ("Action", TableKind::Action),
        ("Information", TableKind::Information),
        ("Note", TableKind::Note),
    ];

    pub fn classify(header: &str) -> Self {
        Self::MARKERS
            .iter()
            .find(|(marker, _)| header.contains(marker))
            .map(|(_, kind)| *kind)
            .unwrap_or(TableKind::Unknown)
    }

    /// Rows between the header and, for paginated tables, the footer.
    fn data_rows<'r, 'a>(self, rows: &'r [ElementRef<'a>]) -> &'r [ElementRef<'a>] {
        let range = match self {
            TableKind::Action | TableKind::Information => 1..rows.len().saturating_sub(1),
            TableKind::Note => 1..rows.len(),
            TableKind::Unknown => return &[],
        };
        rows.get(range).unwrap_or(&[])
    }
}

// ── Row parsers ───────────────────────────────────────────────────────────────

fn parse_action_row(row: ElementRef, base: &Url) -> Action {
    let clan_cell = nth_child(row, 3, "td");
    let league = clan_cell
        .and_then(|td| {
            element_children(td)
                .filter(|c| is(c, "span"))
                .flat_map(element_children)
                .find(|c| is(c, "span"))
        })
        .map(text_of)
        .unwrap_or_default();
    let clan = clan_cell
        .and_then(|td| element_children(td).find(|c| is(c, "a")))
        .map(|a| clan_from_anchor(a, league, base))
        .unwrap_or_default();

    Action {
        timestamp: cell_text(row, 1),
        action: cell_text(row, 2),
        clan,
    }
}

/// Clan linked at child `anchor_at` of the information cell, league label
/// in the span right after it.
fn linked_clan(cell: ElementRef, anchor_at: usize, base: &Url) -> Option<Clan> {
    let anchor = linked_anchor(cell, anchor_at)?;
    let league = nth_child(cell, anchor_at + 1, "span")
        .map(|s| strip_parens(&text_of(s)))
        .unwrap_or_default();
    Some(clan_from_anchor(anchor, league, base))
}

/// Color of the first styled span in the cell, empty when there is none.
fn inline_color(cell: ElementRef) -> String {
    element_children(cell)
        .filter(|c| is(c, "span"))
        .find_map(|span| span.value().attr("style"))
        .and_then(style_color)
        .unwrap_or_default()
}

fn parse_attack_row(row: ElementRef, base: &Url) -> Attack {
    let mut attack = Attack {
        timestamp: cell_text(row, 1),
        information: cell_text(row, 2),
        ..Default::default()
    };
    let Some(cell) = nth_child(row, 2, "td") else {
        return attack;
    };

    attack.fix_war_pid_url = linked_anchor(cell, 3).map(|a| absolute_url(base, href(a)));
    attack.fix_war_pid = attack.fix_war_pid_url.is_some();
    attack.member_on_clan = linked_clan(cell, 4, base);
    attack.opponent_clan = linked_clan(cell, 6, base);

    // A pending pid fix hides the outcome, and without an opponent there
    // is no outcome to color.
    attack.color = match (&attack.fix_war_pid_url, &attack.opponent_clan) {
        (None, Some(_)) => Some(inline_color(cell)),
        (Some(_), _) | (None, None) => None,
    };

    attack
}

fn parse_note_row(row: ElementRef) -> Note {
    Note {
        timestamp: cell_text(row, 1),
        note: cell_text(row, 2),
        author: cell_text(row, 3),
    }
}

// ── Tables ────────────────────────────────────────────────────────────────────

/// Rows gathered from every recognised table on a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberLogs {
    pub actions: Vec<Action>,
    pub attacks: Vec<Attack>,
    pub notes: Vec<Note>,
}

/// Classify one `tbody` and parse its rows into `logs`.
pub fn parse_table_body(tbody: ElementRef, base: &Url, logs: &mut MemberLogs) -> TableKind {
    let rows: Vec<ElementRef> = element_children(tbody).filter(|r| is(r, "tr")).collect();
    let header = rows.first().map(|r| cell_text(*r, 2)).unwrap_or_default();
    let kind = TableKind::classify(&header);
    let data = kind.data_rows(&rows);

    match kind {
        TableKind::Action => logs
            .actions
            .extend(data.iter().map(|r| parse_action_row(*r, base))),
        TableKind::Information => logs
            .attacks
            .extend(data.iter().map(|r| parse_attack_row(*r, base))),
        TableKind::Note => logs.notes.extend(data.iter().map(|r| parse_note_row(*r))),
        TableKind::Unknown => {}
    }

    kind
}

pub fn parse_tables(doc: &Html, base: &Url) -> MemberLogs {
    let mut logs = MemberLogs::default();
    for (i, tbody) in doc.select(&SELECTORS.table_body).enumerate() {
        if parse_table_body(tbody, base, &mut logs) == TableKind::Unknown {
            debug!("Skipping unrecognised table #{}", i);
        }
    }
    logs
}

// ── Profile header ────────────────────────────────────────────────────────────

/// Identity block at the top of the member page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileHeader {
    pub fields: ProfileFields,
    pub in_game_url: String,
    pub clan_url: String,
}

pub fn parse_profile_header(doc: &Html, base: &Url) -> ProfileHeader {
    let mut header = ProfileHeader::default();
    let Some(top) = doc.select(&SELECTORS.top).next() else {
        return header;
    };

    for a in top.select(&SELECTORS.anchor) {
        let link = href(a);
        if link.starts_with("clashofclans://") {
            header.in_game_url = link.to_string();
        } else if link.starts_with("clan.php?tag=") {
            header.clan_url = absolute_url(base, link);
        }
    }

    header.fields = extract_profile_fields(&top.text().collect::<String>());
    header
}

impl ProfileHeader {
    fn into_member(self, logs: MemberLogs) -> Member {
        let fields = self.fields;
        let clan_id = fields.clan.unwrap_or_default();
        Member {
            tag: fields.tag,
            name: fields.name,
            synchronized: fields.synchronized,
            in_game_url: self.in_game_url,
            donations: fields.donations,
            donations_received: fields.donations_received,
            town_hall_level: fields.town_hall_level,
            role: fields.role,
            clan: Clan {
                tag: clan_id.tag,
                name: clan_id.name,
                league: clan_id.league,
                url: self.clan_url,
            },
            actions: logs.actions,
            attacks: logs.attacks,
            notes: logs.notes,
        }
    }
}

// ── Whole page ────────────────────────────────────────────────────────────────

/// Build a `Member` from a fetched member page.
pub fn parse_member_page(html: &str, base: &Url) -> Member {
    let doc = Html::parse_document(html);
    let header = parse_profile_header(&doc, base);
    let logs = parse_tables(&doc, base);
    header.into_member(logs)
}

/// Links to the war pid repair endpoint found on a member page.
pub fn find_fix_war_pid_links(html: &str, base: &Url) -> Vec<Url> {
    let doc = Html::parse_document(html);
    doc.select(&SELECTORS.fix_link)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|h| base.join(h.trim()).ok())
        .filter(|u| u.as_str().contains(FIX_WAR_PID_MARKER))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
