//! Prompt assembly and the per-kind length policy table (spec.md §4.4).

use debate_core::{
    AxisVector, PhilosopherProfile, RagHit, Role, StrategyEntry, Utterance, UtteranceKind,
};

/// Target/hard-cap output token budget for one utterance kind.
#[derive(Debug, Clone, Copy)]
pub struct LengthPolicy {
    pub target_min: u32,
    pub target_max: u32,
    pub hard_cap: u32,
}

impl LengthPolicy {
    pub const fn new(target_min: u32, target_max: u32, hard_cap: u32) -> Self {
        LengthPolicy { target_min, target_max, hard_cap }
    }
}

/// Length policy table from spec.md §4.4.
pub fn length_policy(kind: UtteranceKind) -> LengthPolicy {
    match kind {
        UtteranceKind::Opening => LengthPolicy::new(600, 900, 1300),
        UtteranceKind::Attack | UtteranceKind::Defense | UtteranceKind::Followup => {
            LengthPolicy::new(80, 160, 300)
        }
        // No dedicated row in spec.md's length-policy table; closing
        // statements are substantive but shorter than an opening, so this
        // borrows the moderator-summary budget (DESIGN.md Open Question).
        UtteranceKind::Conclusion => LengthPolicy::new(300, 600, 1500),
        UtteranceKind::ModeratorIntro => LengthPolicy::new(400, 800, 1500),
        UtteranceKind::ModeratorSummary => LengthPolicy::new(300, 600, 1500),
        UtteranceKind::ModeratorConclusion => LengthPolicy::new(300, 600, 1500),
        UtteranceKind::UserInput => LengthPolicy::new(0, 0, 0),
    }
}

/// Last R=6 utterances carried into the prompt as recent history (spec.md
/// §4.4).
pub const RECENT_HISTORY_WINDOW: usize = 6;

/// Context gathered for one Builder call. Everything here is assembled by
/// the caller (Scheduler); the Builder itself never reaches into room state.
#[derive(Debug, Clone)]
pub struct BuildContext<'a> {
    pub topic: &'a str,
    pub language: &'a str,
    pub speaker_role: Role,
    pub stance_statement: &'a str,
    pub recent_history: &'a [Utterance],
    pub kind: UtteranceKind,
    pub philosopher: &'a PhilosopherProfile,
    pub strategy: Option<&'a StrategyEntry>,
    pub rag_bundle: &'a [RagHit],
    /// For attack turns: the claim text of the targeted Argument.
    pub target_claim: Option<&'a str>,
}

fn task_instruction(kind: UtteranceKind) -> &'static str {
    match kind {
        UtteranceKind::Opening => {
            "Deliver your opening statement establishing your position on the topic."
        }
        UtteranceKind::Attack => "Attack the weakest point of your opponent's most recent argument.",
        UtteranceKind::Defense => "Defend your position against the opponent's most recent attack.",
        UtteranceKind::Followup => "Press your advantage with a followup point building on your prior argument.",
        UtteranceKind::Conclusion => "Deliver your closing statement, summarizing your strongest points without introducing new arguments.",
        UtteranceKind::ModeratorIntro => "Introduce the debate topic and both participants neutrally.",
        UtteranceKind::ModeratorSummary => "Summarize the debate so far neutrally, without taking a side.",
        UtteranceKind::ModeratorConclusion => "Deliver a neutral closing summary of the debate's arc.",
        UtteranceKind::UserInput => "",
    }
}

fn format_history(history: &[Utterance]) -> String {
    history
        .iter()
        .rev()
        .take(RECENT_HISTORY_WINDOW)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .map(|u| format!("{}: {}", u.speaker_id, u.text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_evidence(bundle: &[RagHit]) -> String {
    bundle
        .iter()
        .enumerate()
        .map(|(i, hit)| format!("[{}] ({:?}) {}: {}", i + 1, hit.source_kind, hit.title, hit.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Sensitivity-weighted description of the philosopher's vulnerability
/// profile, included so the model leans into its own established style.
fn philosopher_cue(profile: &PhilosopherProfile, sensitivity: &AxisVector) -> String {
    format!(
        "{} ({}): {}. Style: {}.",
        profile.display_name, profile.key, profile.essence, profile.debate_style
    )
    .to_string()
    + &format!(" (sensitivity axes carried internally: {:?})", sensitivity)
}

pub fn system_prompt(ctx: &BuildContext<'_>) -> String {
    format!(
        "You are {}, playing the role of {:?} in a formal debate. {}\n\
         Hard constraint: respond in the same language as the topic text ({}).\n\
         Stay fully in character; never break the fourth wall or mention you are an AI.",
        ctx.philosopher.display_name, ctx.speaker_role, ctx.philosopher.personality, ctx.language
    )
}

pub fn user_prompt(ctx: &BuildContext<'_>) -> String {
    let mut sections = vec![
        format!("Topic: {}", ctx.topic),
        format!("Your stance: {}", ctx.stance_statement),
    ];

    let history = format_history(ctx.recent_history);
    if !history.is_empty() {
        sections.push(format!("Recent dialogue:\n{history}"));
    }

    if let Some(claim) = ctx.target_claim {
        sections.push(format!("Target claim to attack: {claim}"));
    }

    sections.push(format!("Task: {}", task_instruction(ctx.kind)));

    if let Some(strategy) = ctx.strategy {
        sections.push(format!(
            "Rhetorical strategy to employ: {} — {}. Stylistic cue: {}",
            strategy.id, strategy.description, strategy.stylistic_cue
        ));
    }

    if !ctx.rag_bundle.is_empty() {
        sections.push(format!(
            "Evidence (cite with [n] markers matching the list below):\n{}",
            format_evidence(ctx.rag_bundle)
        ));
    }

    let policy = length_policy(ctx.kind);
    sections.push(format!(
        "Length: aim for {}-{} tokens, never exceed {} tokens.",
        policy.target_min, policy.target_max, policy.hard_cap
    ));

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_core::RagSourceKind;

    fn profile() -> PhilosopherProfile {
        PhilosopherProfile {
            key: "kant".into(),
            display_name: "Immanuel Kant".into(),
            essence: "Duty above consequence".into(),
            debate_style: "Systematic and exacting".into(),
            personality: "Formal, precise".into(),
            key_traits: vec![],
            representative_quote: String::new(),
            attack_weights: Default::default(),
            defense_weights: Default::default(),
            followup_weights: Default::default(),
            rag_affinity: 0.5,
            vulnerability_sensitivity: AxisVector::ZERO,
            rag_stat: AxisVector::ZERO,
        }
    }

    #[test]
    fn length_policy_matches_table() {
        let p = length_policy(UtteranceKind::Opening);
        assert_eq!((p.target_min, p.target_max, p.hard_cap), (600, 900, 1300));
        let p = length_policy(UtteranceKind::Attack);
        assert_eq!((p.target_min, p.target_max, p.hard_cap), (80, 160, 300));
    }

    #[test]
    fn user_prompt_includes_evidence_list_when_rag_used() {
        let profile = profile();
        let hit = RagHit {
            source_kind: RagSourceKind::Web,
            source_id: "s1".into(),
            title: "Title".into(),
            snippet: "Snippet".into(),
            score: 0.9,
        };
        let ctx = BuildContext {
            topic: "AI rights",
            language: "en",
            speaker_role: Role::Pro,
            stance_statement: "AI deserves rights",
            recent_history: &[],
            kind: UtteranceKind::Attack,
            philosopher: &profile,
            strategy: None,
            rag_bundle: &[hit],
            target_claim: Some("AI has no moral status"),
        };
        let prompt = user_prompt(&ctx);
        assert!(prompt.contains("[1]"));
        assert!(prompt.contains("Target claim to attack"));
    }

    #[test]
    fn recent_history_is_capped_to_window() {
        let history: Vec<Utterance> = (0..10)
            .map(|i| Utterance {
                id: format!("u{i}"),
                room_id: "r".into(),
                speaker_id: format!("speaker{i}"),
                role: Role::Pro,
                text: format!("text{i}"),
                timestamp: chrono::Utc::now(),
                kind: UtteranceKind::Attack,
                metadata: Default::default(),
            })
            .collect();
        let formatted = format_history(&history);
        assert_eq!(formatted.lines().count(), RECENT_HISTORY_WINDOW);
        assert!(formatted.contains("speaker9"));
        assert!(!formatted.contains("speaker3"));
    }
}
