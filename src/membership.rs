//! Membership snapshot building.
//!
//! Turns raw per-channel member lists into the normalized [`Snapshot`] the
//! engine reconciles against: deduplicated, display names escaped, sorted
//! for rendering. Building is pure; it never touches the selection store.

use crate::roster::{RawChannel, RawRoster};
use crate::types::{Channel, ChannelUser, Snapshot};
use std::collections::HashSet;

/// Escape text for embedding into HTML markup.
///
/// Names come from an external platform and are later spliced into markup by
/// the presentation layer, so they are escaped unconditionally here. Same
/// character table as the classic escape-html: `&`, `<`, `>`, `"`, `'`.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Normalize one raw channel: dedup by user id (first occurrence wins),
/// prefer nickname over username, escape, sort by display name.
fn build_channel(raw: RawChannel) -> Channel {
    let mut seen = HashSet::new();
    let mut users: Vec<ChannelUser> = Vec::with_capacity(raw.members.len());

    for member in raw.members {
        if !seen.insert(member.id.clone()) {
            continue;
        }
        let display_name = member.nickname.as_deref().unwrap_or(&member.username);
        users.push(ChannelUser {
            id: member.id,
            display_name: escape_html(display_name),
            avatar: member.avatar,
        });
    }

    // Case-sensitive lexicographic order, applied per channel.
    users.sort_by(|a, b| a.display_name.cmp(&b.display_name));

    Channel {
        id: raw.id,
        name: raw.name,
        users,
    }
}

/// Build a normalized snapshot from one coherent roster read.
///
/// Empty team channels are retained; the render list is filtered later, the
/// engine still prunes and computes against full membership.
pub fn build_snapshot(raw: RawRoster) -> Snapshot {
    Snapshot {
        lobby: build_channel(raw.lobby),
        team_channels: raw.teams.into_iter().map(build_channel).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::RawMember;
    use crate::types::{ChannelId, UserId};

    fn raw_channel(id: &str, members: Vec<RawMember>) -> RawChannel {
        RawChannel {
            id: ChannelId::from(id),
            name: id.to_string(),
            members,
        }
    }

    #[test]
    fn test_escape_html_table() {
        assert_eq!(
            escape_html(r#"<b>"A" & 'B'</b>"#),
            "&lt;b&gt;&quot;A&quot; &amp; &#39;B&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain name"), "plain name");
    }

    #[test]
    fn test_nickname_preferred_over_username() {
        let channel = build_channel(raw_channel(
            "alpha",
            vec![
                RawMember::new("u1", "global_name").with_nickname("Nick"),
                RawMember::new("u2", "fallback_name"),
            ],
        ));
        assert_eq!(channel.users[0].display_name, "Nick");
        assert_eq!(channel.users[1].display_name, "fallback_name");
    }

    #[test]
    fn test_dedup_first_occurrence_wins() {
        let channel = build_channel(raw_channel(
            "alpha",
            vec![
                RawMember::new("u1", "first"),
                RawMember::new("u1", "second"),
            ],
        ));
        assert_eq!(channel.users.len(), 1);
        assert_eq!(channel.users[0].display_name, "first");
    }

    #[test]
    fn test_sort_is_case_sensitive_lexicographic() {
        let channel = build_channel(raw_channel(
            "alpha",
            vec![
                RawMember::new("u1", "bravo"),
                RawMember::new("u2", "Alpha"),
                RawMember::new("u3", "Zulu"),
            ],
        ));
        let names: Vec<&str> = channel.users.iter().map(|u| u.display_name.as_str()).collect();
        // Uppercase sorts before lowercase under byte order.
        assert_eq!(names, vec!["Alpha", "Zulu", "bravo"]);
    }

    #[test]
    fn test_name_escaped_in_snapshot() {
        let channel = build_channel(raw_channel(
            "alpha",
            vec![RawMember::new("u1", "<script>alert(1)</script>")],
        ));
        assert_eq!(
            channel.users[0].display_name,
            "&lt;script&gt;alert(1)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_empty_team_channels_retained() {
        let snapshot = build_snapshot(RawRoster {
            lobby: raw_channel("lobby", vec![]),
            teams: vec![
                raw_channel("alpha", vec![RawMember::new("u1", "one")]),
                raw_channel("bravo", vec![]),
            ],
        });
        assert_eq!(snapshot.team_channels.len(), 2);
        assert!(snapshot.team_channels[1].is_empty());
    }

    #[test]
    fn test_build_is_idempotent() {
        let make = || RawRoster {
            lobby: raw_channel("lobby", vec![RawMember::new("u1", "one")]),
            teams: vec![raw_channel(
                "alpha",
                vec![
                    RawMember::new("u2", "two").with_avatar("av2"),
                    RawMember::new("u3", "three"),
                ],
            )],
        };
        assert_eq!(build_snapshot(make()), build_snapshot(make()));
    }

    #[test]
    fn test_avatar_carried_through() {
        let channel = build_channel(raw_channel(
            "alpha",
            vec![RawMember::new("u1", "one").with_avatar("abc123")],
        ));
        assert_eq!(channel.users[0].avatar.as_deref(), Some("abc123"));
        assert_eq!(channel.users[0].id, UserId::from("u1"));
    }
}
