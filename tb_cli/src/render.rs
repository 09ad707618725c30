//! Plain-text and JSON output for CLI commands.

use serde::Serialize;
use std::collections::HashMap;
use tournament_bracket::bracket::{AdvanceOutcome, Bracket, Match, MatchStatus};
use tournament_bracket::{Player, PlayerId, ScoreReport, Tournament};

/// Print `value` as pretty JSON, or the text produced by `text`
pub fn print<T: Serialize>(
    json: bool,
    value: &T,
    text: impl FnOnce() -> String,
) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

/// Display name of an optional player
pub fn name(names: &HashMap<PlayerId, String>, player_id: Option<PlayerId>) -> String {
    match player_id {
        Some(id) => names.get(&id).cloned().unwrap_or_else(|| id.to_string()),
        None => "-".to_string(),
    }
}

pub fn player_line(player: &Player) -> String {
    format!("{}  {}", player.id, player.name)
}

pub fn tournament_line(tournament: &Tournament) -> String {
    format!(
        "{}  {:<12} {:>3} players  {}",
        tournament.id,
        tournament.status.to_string(),
        tournament.player_count(),
        tournament.name
    )
}

pub fn tournament_detail(tournament: &Tournament, names: &HashMap<PlayerId, String>) -> String {
    let mut out = vec![
        format!("{} ({})", tournament.name, tournament.id),
        format!("Status:  {}", tournament.status),
        format!("Created: {}", tournament.created_at.format("%Y-%m-%d %H:%M:%S UTC")),
        format!("Players: {}", tournament.player_count()),
    ];
    for (seat, id) in tournament.player_ids.iter().enumerate() {
        out.push(format!("  {:>3}. {}", seat + 1, name(names, Some(*id))));
    }
    out.join("\n")
}

/// One line per match: position, players, scores and status
pub fn match_line(m: &Match, names: &HashMap<PlayerId, String>) -> String {
    let result = match m.status {
        MatchStatus::Completed => format!(
            "{}-{}  winner {}",
            m.score1,
            m.score2,
            name(names, m.winner_id)
        ),
        MatchStatus::Bye => format!("bye -> {}", name(names, m.winner_id)),
        MatchStatus::Pending | MatchStatus::InProgress => m.status.to_string(),
    };

    format!(
        "  [{}] {} vs {}  {}  ({})",
        m.position,
        name(names, m.player1_id),
        name(names, m.player2_id),
        result,
        m.id
    )
}

pub fn bracket(bracket: &Bracket, names: &HashMap<PlayerId, String>) -> String {
    if bracket.is_empty() {
        return format!("No bracket generated for {}", bracket.tournament_id);
    }

    let rounds = bracket.round_count();
    let mut out = Vec::new();
    for round in 1..=rounds {
        let title = if round == rounds {
            "Final".to_string()
        } else {
            format!("Round {round}")
        };
        out.push(title);
        out.extend(bracket.round(round).iter().map(|m| match_line(m, names)));
    }
    out.join("\n")
}

pub fn score_report(report: &ScoreReport, names: &HashMap<PlayerId, String>) -> String {
    let mut out = vec![match_line(&report.scored, names)];
    match report.advance {
        AdvanceOutcome::MutatedNextRound(next) => out.push(format!(
            "{} advances to match {}",
            name(names, report.scored.winner_id),
            next
        )),
        AdvanceOutcome::NoFurtherRound => out.push("Final recorded".to_string()),
    }
    if report.changed.len() > 2 {
        out.push(format!("{} matches updated", report.changed.len()));
    }
    if report.tournament_completed {
        out.push(format!(
            "Tournament complete, champion: {}",
            name(names, report.scored.winner_id)
        ));
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tournament_bracket::bracket::{generate, score_match};
    use uuid::Uuid;

    #[test]
    fn test_bracket_text_lists_rounds() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let names: HashMap<PlayerId, String> = ids
            .iter()
            .zip(["Ada", "Bo", "Cy"])
            .map(|(id, n)| (*id, n.to_string()))
            .collect();

        let tournament_id = Uuid::new_v4();
        let mut matches = generate(tournament_id, &ids).unwrap();
        let first = matches[0].id;
        score_match(&mut matches, first, 5, 2).unwrap();

        let text = bracket(&Bracket::from_matches(tournament_id, matches), &names);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Round 1");
        assert!(lines[1].contains("Ada vs Bo  5-2  winner Ada"));
        assert!(lines[2].contains("Cy vs -  bye -> Cy"));
        assert_eq!(lines[3], "Final");
        assert!(lines[4].contains("Ada vs Cy  pending"));
    }

    #[test]
    fn test_unknown_player_falls_back_to_id() {
        let id = Uuid::new_v4();
        assert_eq!(name(&HashMap::new(), Some(id)), id.to_string());
        assert_eq!(name(&HashMap::new(), None), "-");
    }
}
