//! Turn generation (spec.md §4.4/§4.5 tying together): given a
//! [`TurnDescriptor`] for a non-user speaker, assembles the context the
//! Argument Builder needs — running the Strategy Selector and, if it calls
//! for retrieval, the RAG Gateway first — and returns the built
//! [`Utterance`]. Appending it to room history, persisting it, and
//! publishing it are the caller's job (`crate::actor`), which is also the
//! only place that holds the room's mutation lock.

use std::time::Duration;

use debate_analyzer::analyze_utterance;
use debate_builder::{build_utterance, BuildContext};
use debate_core::{
    CompletionRequest, DebateRoom, Error, ModelAlias, PhilosopherProfile, RagHit, RagSourceKind,
    RagTimeoutPolicy, Result, Role, Side, Utterance, UtteranceKind,
};
use debate_strategy::{
    decide_rag_use, lookup_attack, lookup_defense, lookup_followup, select_attack_strategy,
    select_defense_strategy, select_followup_strategy, OpponentMoveInfo,
};

use crate::deps::Deps;

const RAG_MAX_TOTAL: u32 = 5;

fn equal_source_weights() -> Vec<(RagSourceKind, f64)> {
    vec![(RagSourceKind::Web, 1.0), (RagSourceKind::Vector, 1.0), (RagSourceKind::Philosopher, 1.0)]
}

fn profile_for(deps: &Deps, profile_key: &str) -> Result<&PhilosopherProfile> {
    deps.philosophers
        .get(profile_key)
        .ok_or_else(|| Error::ConfigInvalid(format!("no philosopher profile for key '{profile_key}'")))
}

/// Runs the RAG Gateway's combined search if `decide_rag_use` says it is
/// worth its cost, else returns an empty bundle (spec.md §4.1 RAG-use
/// decision / §8: "`rag_used` is true iff ... AND RAG Gateway returned at
/// least one item").
async fn maybe_retrieve(
    deps: &Deps,
    use_rag: bool,
    query: &str,
    rag_timeout: RagTimeoutPolicy,
) -> Vec<RagHit> {
    if !use_rag {
        return Vec::new();
    }
    match deps.rag.combined(query, &equal_source_weights(), RAG_MAX_TOTAL, rag_timeout).await {
        Ok(result) => result.hits,
        Err(err) => {
            tracing::warn!(error = %err, "rag combined() failed; proceeding without evidence");
            Vec::new()
        }
    }
}

fn recent_history(room: &DebateRoom) -> &[Utterance] {
    let start = room.speaking_history.len().saturating_sub(debate_builder::RECENT_HISTORY_WINDOW);
    &room.speaking_history[start..]
}

/// Last utterance by a side other than `side`, skipping moderator turns.
fn last_opposing_utterance<'a>(room: &'a DebateRoom, side: Side) -> Option<&'a Utterance> {
    room.speaking_history.iter().rev().find(|u| room.participant(&u.speaker_id).and_then(|p| p.role.side()) != Some(side) && u.role != Role::Moderator)
}

fn opponent_move_info(utterance: Option<&Utterance>) -> OpponentMoveInfo {
    match utterance {
        Some(u) => OpponentMoveInfo {
            inferred_strategy_id: u.metadata.strategy_id.clone(),
            rag_used_by_opponent: u.metadata.rag_used,
            opponent_text: u.text.clone(),
        },
        None => OpponentMoveInfo::default(),
    }
}

/// Builds one interactive-phase utterance (attack/defense/followup) for
/// `speaker_id`, running strategy selection and, conditionally, retrieval
/// first. Returns the utterance with `metadata.target_argument_id` already
/// populated for attack turns; the caller still owns appending it.
#[allow(clippy::too_many_arguments)]
pub async fn run_interactive_turn(
    deps: &Deps,
    room: &DebateRoom,
    speaker_id: &str,
    side: Side,
    kind: UtteranceKind,
    llm_timeout: Duration,
    rag_timeout: RagTimeoutPolicy,
) -> Result<Utterance> {
    let participant = room.participant(speaker_id).ok_or_else(|| Error::UnknownRoom(speaker_id.to_string()))?;
    let profile = profile_for(deps, &participant.profile_key)?;
    let catalogue = &deps.strategies.catalogue;

    let (strategy_id, target_claim, target_argument_id) = match kind {
        UtteranceKind::Attack => {
            let target = debate_scheduler::select_target_argument(room, side);
            let blocked = target
                .map(|a| debate_strategy::recent_against(&room.state, speaker_id, &a.id))
                .unwrap_or_default();
            let vulnerability = target.map(|a| a.per_axis_vulnerability).unwrap_or(debate_core::AxisVector::ZERO);
            let id = select_attack_strategy(catalogue, profile, &vulnerability, &blocked)?;
            (id, target.map(|a| a.claim.as_str()), target.map(|a| a.id.clone()))
        }
        UtteranceKind::Defense => {
            let last = last_opposing_utterance(room, side);
            let info = opponent_move_info(last);
            let id = select_defense_strategy(catalogue, profile, &deps.strategies.attack_to_defense, &info)?;
            (id, None, None)
        }
        UtteranceKind::Followup => {
            let last = last_opposing_utterance(room, side);
            let info = opponent_move_info(last);
            let id = select_followup_strategy(catalogue, profile, &deps.strategies.defense_to_followup, &info)?;
            (id, None, None)
        }
        other => unreachable!("run_interactive_turn called with non-interactive kind {other:?}"),
    };

    let strategy_entry = match kind {
        UtteranceKind::Attack => lookup_attack(catalogue, &strategy_id)?,
        UtteranceKind::Defense => lookup_defense(catalogue, &strategy_id)?,
        UtteranceKind::Followup => lookup_followup(catalogue, &strategy_id)?,
        _ => unreachable!(),
    };

    let rag_decision = decide_rag_use(strategy_entry.rag_weights.as_ref(), &profile.rag_stat);
    let query = target_claim.unwrap_or(room.topic.as_str());
    let rag_bundle = maybe_retrieve(deps, rag_decision.use_rag, query, rag_timeout).await;

    let stance_statement = match side {
        Side::Pro => room.stance_pro.as_str(),
        Side::Con => room.stance_con.as_str(),
    };
    let ctx = BuildContext {
        topic: &room.topic,
        language: &room.language,
        speaker_role: participant.role,
        stance_statement,
        recent_history: recent_history(room),
        kind,
        philosopher: profile,
        strategy: Some(strategy_entry),
        rag_bundle: &rag_bundle,
        target_claim,
    };

    let mut utterance =
        build_utterance(deps.llm.as_ref(), &room.id, &ctx, speaker_id, deps.models.turn, llm_timeout).await?;
    utterance.metadata.target_argument_id = target_argument_id;
    Ok(utterance)
}

/// Builds a moderator utterance (intro/summary/conclusion). Moderators
/// never select a strategy or retrieve evidence (spec.md §4.6: the
/// moderator's capabilities are `can_summarize` only).
pub async fn run_moderator_turn(
    deps: &Deps,
    room: &DebateRoom,
    kind: UtteranceKind,
    llm_timeout: Duration,
) -> Result<Utterance> {
    let profile = profile_for(deps, &room.moderator_profile_key)?;
    let ctx = BuildContext {
        topic: &room.topic,
        language: &room.language,
        speaker_role: Role::Moderator,
        stance_statement: "",
        recent_history: recent_history(room),
        kind,
        philosopher: profile,
        strategy: None,
        rag_bundle: &[],
        target_claim: None,
    };
    build_utterance(deps.llm.as_ref(), &room.id, &ctx, "moderator", deps.models.opening_and_moderator, llm_timeout)
        .await
}

/// Builds a closing statement for `speaker_id` (spec.md §3 Stage:
/// `pro_conclusion`/`con_conclusion`). No strategy selection or retrieval;
/// the task instruction alone ("summarize your strongest points without
/// introducing new arguments") governs content.
pub async fn run_conclusion_turn(
    deps: &Deps,
    room: &DebateRoom,
    speaker_id: &str,
    llm_timeout: Duration,
) -> Result<Utterance> {
    let participant = room.participant(speaker_id).ok_or_else(|| Error::UnknownRoom(speaker_id.to_string()))?;
    let profile = profile_for(deps, &participant.profile_key)?;
    let stance_statement = match participant.role.side() {
        Some(Side::Pro) => room.stance_pro.as_str(),
        Some(Side::Con) => room.stance_con.as_str(),
        None => "",
    };
    let ctx = BuildContext {
        topic: &room.topic,
        language: &room.language,
        speaker_role: participant.role,
        stance_statement,
        recent_history: recent_history(room),
        kind: UtteranceKind::Conclusion,
        philosopher: profile,
        strategy: None,
        rag_bundle: &[],
        target_claim: None,
    };
    build_utterance(deps.llm.as_ref(), &room.id, &ctx, speaker_id, deps.models.turn, llm_timeout).await
}

/// Generates the one-per-role stance statement at room creation (spec.md
/// §3: "stance statements for pro and con, generated once at room
/// creation"). Not an [`Utterance`] — it never enters `speaking_history` —
/// so it bypasses the Builder's kind-indexed length policy and issues a
/// direct `complete()` call with the dedicated 80-150/300 budget from
/// spec.md §4.4's length-policy table.
pub async fn generate_stance_statement(
    deps: &Deps,
    topic: &str,
    language: &str,
    side: Side,
    llm_timeout: Duration,
) -> Result<String> {
    let side_word = match side {
        Side::Pro => "in favor of",
        Side::Con => "against",
    };
    let req = CompletionRequest {
        system_prompt: format!(
            "You write a single, neutral stance statement for a formal debate. \
             Respond in the same language as the topic text ({language})."
        ),
        user_prompt: format!(
            "Topic: {topic}\n\nWrite one concise stance statement {side_word} this topic, \
             suitable as the opening position a debater will argue from. Plain prose, no preamble."
        ),
        model: ModelAlias::Low,
        max_tokens: 300,
        timeout: llm_timeout,
        response_schema: None,
    };
    Ok(deps.llm.complete(req).await?.text)
}

/// Runs argument extraction + vulnerability scoring on a just-appended
/// utterance so its claims are available as attack targets for the
/// opposing side (spec.md §4.2). Analyzed for every non-moderator speaker;
/// the analyzer's own idempotence guard makes re-invocation on the same
/// utterance a no-op.
pub async fn analyze_for_targeting(
    deps: &Deps,
    room: &mut DebateRoom,
    utterance: &Utterance,
    llm_timeout: Duration,
) -> Result<()> {
    if utterance.role == Role::Moderator {
        return Ok(());
    }
    analyze_utterance(
        deps.llm.as_ref(),
        &mut room.state,
        &utterance.speaker_id,
        &utterance.id,
        &utterance.text,
        deps.models.analysis,
        llm_timeout,
        true,
    )
    .await?;
    Ok(())
}
