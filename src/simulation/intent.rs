//! Intent processor - applies one agent's declared action to the world
//!
//! Processing order for every intent:
//! 1. Confidence and thought (sets `stateAnim` to thinking or idle)
//! 2. Action-specific effect, which may overwrite `stateAnim`
//! 3. Optional message payload
//!
//! Preconditions that fail (unknown target, out of range, self-target) are
//! absorbed silently: the decision layer is best-effort and will simply act
//! again next cycle.

use crate::core::config::SimulationConfig;
use crate::core::types::{AgentId, MessageId, Millis};
use crate::entity::{Agent, AnimState, Message};
use crate::intent::{ActionKind, Intent, MessagePayload};
use crate::world::World;
use rand::Rng;

/// What happened to an intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentOutcome {
    /// The acting agent does not exist; nothing changed
    UnknownAgent,
    /// The intent took full effect
    Applied(ActionKind),
    /// Presentation fields were updated but the action itself was dropped
    Ignored(ActionKind, IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    MissingTarget,
    UnknownTarget,
    SelfTarget,
    OutOfRange,
    AlreadyAllied,
}

/// Apply `intent` on behalf of `agent_id`
pub fn apply_intent<R: Rng + ?Sized>(
    world: &mut World,
    config: &SimulationConfig,
    agent_id: &AgentId,
    intent: &Intent,
    now: Millis,
    rng: &mut R,
) -> IntentOutcome {
    let Some(agent) = world.agent_mut(agent_id) else {
        tracing::debug!(agent = %agent_id, "intent for unknown agent ignored");
        return IntentOutcome::UnknownAgent;
    };

    apply_thought(agent, intent, config, now);

    let result = match intent.action {
        ActionKind::Move => apply_move(world, config, agent_id, intent),
        ActionKind::Trade => apply_trade(world, config, agent_id, intent),
        ActionKind::Attack => apply_attack(world, config, agent_id, intent),
        ActionKind::Ally => apply_ally(world, agent_id, intent),
        ActionKind::Idle | ActionKind::Unrecognized => Ok(()),
    };

    if let Some(payload) = &intent.message {
        post_message(world, agent_id, payload, now, rng);
    }

    match result {
        Ok(()) => IntentOutcome::Applied(intent.action),
        Err(reason) => {
            tracing::debug!(agent = %agent_id, action = ?intent.action, ?reason, "intent absorbed");
            IntentOutcome::Ignored(intent.action, reason)
        }
    }
}

fn apply_thought(agent: &mut Agent, intent: &Intent, config: &SimulationConfig, now: Millis) {
    agent.confidence = intent.confidence.clamp(0.0, 1.0);
    match intent.thought().filter(|t| !t.is_empty()) {
        Some(thought) => {
            agent.last_thoughts = Some(thought.to_string());
            agent.thought_bubble_until = Some(now + config.thought_bubble_ms);
            agent.state_anim = AnimState::Thinking;
        }
        None => agent.state_anim = AnimState::Idle,
    }
}

fn apply_move(
    world: &mut World,
    config: &SimulationConfig,
    agent_id: &AgentId,
    intent: &Intent,
) -> Result<(), IgnoreReason> {
    let target = intent
        .target_position()
        .filter(|p| p.is_finite())
        .ok_or(IgnoreReason::MissingTarget)?;
    let target = if config.clamp_to_bounds {
        target.clamped(world.width, world.height)
    } else {
        target
    };
    if let Some(agent) = world.agent_mut(agent_id) {
        agent.target_pos = Some(target);
    }
    Ok(())
}

/// Both parties of a two-agent action, already checked for range
fn engaged_pair<'w>(
    world: &'w mut World,
    config: &SimulationConfig,
    agent_id: &AgentId,
    intent: &Intent,
) -> Result<(&'w mut Agent, &'w mut Agent), IgnoreReason> {
    let target_id = intent.target_agent().ok_or(IgnoreReason::MissingTarget)?;
    if target_id == agent_id {
        return Err(IgnoreReason::SelfTarget);
    }
    let (actor, target) = world
        .agent_pair_mut(agent_id, target_id)
        .ok_or(IgnoreReason::UnknownTarget)?;
    if actor.position.distance(&target.position) >= config.interaction_range {
        return Err(IgnoreReason::OutOfRange);
    }
    Ok((actor, target))
}

fn apply_trade(
    world: &mut World,
    config: &SimulationConfig,
    agent_id: &AgentId,
    intent: &Intent,
) -> Result<(), IgnoreReason> {
    let (actor, target) = engaged_pair(world, config, agent_id, intent)?;
    actor.adjust_trust(&target.id, config.trade_trust_delta);
    target.adjust_trust(&actor.id, config.trade_trust_delta);
    Ok(())
}

fn apply_attack(
    world: &mut World,
    config: &SimulationConfig,
    agent_id: &AgentId,
    intent: &Intent,
) -> Result<(), IgnoreReason> {
    let (actor, target) = engaged_pair(world, config, agent_id, intent)?;

    actor.state_anim = AnimState::Conflict;
    target.state_anim = AnimState::Conflict;
    actor.conflict_wait = config.conflict_cooldown_ticks;
    target.conflict_wait = config.conflict_cooldown_ticks;

    // The attacker gains the full amount even if the target runs dry.
    target.energy = (target.energy - config.attack_energy).max(0.0);
    actor.energy += config.attack_energy;

    actor.adjust_trust(&target.id, config.attack_trust_delta);
    target.adjust_trust(&actor.id, config.attack_trust_delta);
    Ok(())
}

fn apply_ally(world: &mut World, agent_id: &AgentId, intent: &Intent) -> Result<(), IgnoreReason> {
    let target_id = intent.target_agent().ok_or(IgnoreReason::MissingTarget)?;
    if target_id == agent_id {
        return Err(IgnoreReason::SelfTarget);
    }
    if world.agent(target_id).is_none() {
        return Err(IgnoreReason::UnknownTarget);
    }
    let Some(actor) = world.agent_mut(agent_id) else {
        return Err(IgnoreReason::UnknownTarget);
    };
    if !actor.alliances.insert(target_id.clone()) {
        return Err(IgnoreReason::AlreadyAllied);
    }
    actor.state_anim = AnimState::AllyFormed;
    Ok(())
}

fn post_message<R: Rng + ?Sized>(
    world: &mut World,
    sender: &AgentId,
    payload: &MessagePayload,
    now: Millis,
    rng: &mut R,
) {
    let message = Message::new(
        MessageId::from_random_bytes(rng.gen()),
        sender.clone(),
        payload.receiver_id.clone(),
        payload.content.clone(),
        now,
    );
    world.push_message(message);
    if let Some(agent) = world.agent_mut(sender) {
        agent.last_message = Some(payload.content.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec2;
    use crate::entity::Faction;
    use crate::world::WorldMode;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn id(s: &str) -> AgentId {
        AgentId::new(s)
    }

    fn two_agents(distance: f64) -> World {
        let mut world = World::new(800.0, 600.0, WorldMode::Cooperative);
        world.add_agent(Agent::new(id("a"), "A", Faction::Red, Vec2::new(100.0, 100.0)));
        world.add_agent(Agent::new(id("b"), "B", Faction::Blue, Vec2::new(100.0 + distance, 100.0)));
        world
    }

    fn apply(world: &mut World, agent: &str, intent: &Intent) -> IntentOutcome {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        apply_intent(world, &SimulationConfig::default(), &id(agent), intent, 10_000, &mut rng)
    }

    #[test]
    fn test_unknown_agent_is_noop() {
        let mut world = two_agents(10.0);
        let outcome = apply(&mut world, "ghost", &Intent::idle(0.2).with_message(id("a"), "hi"));
        assert_eq!(outcome, IntentOutcome::UnknownAgent);
        assert!(world.messages().is_empty());
    }

    #[test]
    fn test_thought_sets_bubble() {
        let mut world = two_agents(10.0);
        apply(&mut world, "a", &Intent::idle(0.4).with_thought("planning"));
        let a = world.agent(&id("a")).unwrap();
        assert_eq!(a.state_anim, AnimState::Thinking);
        assert_eq!(a.last_thoughts.as_deref(), Some("planning"));
        assert_eq!(a.thought_bubble_until, Some(16_000));
        assert_eq!(a.confidence, 0.4);
    }

    #[test]
    fn test_empty_thought_counts_as_none() {
        let mut world = two_agents(10.0);
        apply(&mut world, "a", &Intent::idle(0.4).with_thought(""));
        let a = world.agent(&id("a")).unwrap();
        assert_eq!(a.state_anim, AnimState::Idle);
        assert!(a.last_thoughts.is_none());
    }

    #[test]
    fn test_confidence_is_clamped() {
        let mut world = two_agents(10.0);
        apply(&mut world, "a", &Intent::idle(3.0));
        assert_eq!(world.agent(&id("a")).unwrap().confidence, 1.0);
    }

    #[test]
    fn test_move_sets_target_only() {
        let mut world = two_agents(10.0);
        let outcome = apply(&mut world, "a", &Intent::move_to(Vec2::new(300.0, 200.0), 0.9));
        assert_eq!(outcome, IntentOutcome::Applied(ActionKind::Move));
        let a = world.agent(&id("a")).unwrap();
        assert_eq!(a.target_pos, Some(Vec2::new(300.0, 200.0)));
        assert_eq!(a.position, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_move_target_clamped_to_world() {
        let mut world = two_agents(10.0);
        apply(&mut world, "a", &Intent::move_to(Vec2::new(-40.0, 9_000.0), 0.9));
        assert_eq!(world.agent(&id("a")).unwrap().target_pos, Some(Vec2::new(0.0, 600.0)));
    }

    #[test]
    fn test_move_with_agent_target_is_ignored() {
        let mut world = two_agents(10.0);
        let outcome = apply(&mut world, "a", &Intent::toward(ActionKind::Move, id("b"), 0.9));
        assert_eq!(
            outcome,
            IntentOutcome::Ignored(ActionKind::Move, IgnoreReason::MissingTarget)
        );
        assert!(world.agent(&id("a")).unwrap().target_pos.is_none());
    }

    #[test]
    fn test_trade_in_range_raises_both_trusts() {
        let mut world = two_agents(30.0);
        apply(&mut world, "a", &Intent::toward(ActionKind::Trade, id("b"), 1.0));
        assert_eq!(world.agent(&id("a")).unwrap().trust_toward(&id("b")), 1);
        assert_eq!(world.agent(&id("b")).unwrap().trust_toward(&id("a")), 1);
    }

    #[test]
    fn test_trade_at_exact_range_is_ignored() {
        let mut world = two_agents(50.0);
        let outcome = apply(&mut world, "a", &Intent::toward(ActionKind::Trade, id("b"), 1.0));
        assert_eq!(
            outcome,
            IntentOutcome::Ignored(ActionKind::Trade, IgnoreReason::OutOfRange)
        );
        assert_eq!(world.agent(&id("a")).unwrap().trust_toward(&id("b")), 0);
    }

    #[test]
    fn test_attack_scenario() {
        let mut world = two_agents(10.0);
        apply(&mut world, "a", &Intent::toward(ActionKind::Attack, id("b"), 1.0));
        let a = world.agent(&id("a")).unwrap();
        let b = world.agent(&id("b")).unwrap();
        assert_eq!(a.energy, 110.0);
        assert_eq!(b.energy, 90.0);
        assert_eq!(a.conflict_wait, 10);
        assert_eq!(b.conflict_wait, 10);
        assert_eq!(a.state_anim, AnimState::Conflict);
        assert_eq!(b.state_anim, AnimState::Conflict);
        assert_eq!(a.trust_toward(&id("b")), -5);
        assert_eq!(b.trust_toward(&id("a")), -5);
    }

    #[test]
    fn test_attack_clamps_target_but_pays_attacker_in_full() {
        let mut world = two_agents(10.0);
        world.agent_mut(&id("b")).unwrap().energy = 4.0;
        apply(&mut world, "a", &Intent::toward(ActionKind::Attack, id("b"), 1.0));
        assert_eq!(world.agent(&id("b")).unwrap().energy, 0.0);
        assert_eq!(world.agent(&id("a")).unwrap().energy, 110.0);
    }

    #[test]
    fn test_self_attack_is_ignored() {
        let mut world = two_agents(10.0);
        let outcome = apply(&mut world, "a", &Intent::toward(ActionKind::Attack, id("a"), 1.0));
        assert_eq!(
            outcome,
            IntentOutcome::Ignored(ActionKind::Attack, IgnoreReason::SelfTarget)
        );
        assert_eq!(world.agent(&id("a")).unwrap().energy, 100.0);
    }

    #[test]
    fn test_ally_is_one_directional() {
        let mut world = two_agents(500.0);
        apply(&mut world, "a", &Intent::toward(ActionKind::Ally, id("b"), 1.0));
        let a = world.agent(&id("a")).unwrap();
        assert!(a.is_allied_with(&id("b")));
        assert_eq!(a.state_anim, AnimState::AllyFormed);
        assert!(!world.agent(&id("b")).unwrap().is_allied_with(&id("a")));
    }

    #[test]
    fn test_repeat_ally_keeps_idle_state() {
        let mut world = two_agents(10.0);
        apply(&mut world, "a", &Intent::toward(ActionKind::Ally, id("b"), 1.0));
        let outcome = apply(&mut world, "a", &Intent::toward(ActionKind::Ally, id("b"), 1.0));
        assert_eq!(
            outcome,
            IntentOutcome::Ignored(ActionKind::Ally, IgnoreReason::AlreadyAllied)
        );
        let a = world.agent(&id("a")).unwrap();
        assert_eq!(a.alliances.len(), 1);
        assert_eq!(a.state_anim, AnimState::Idle);
    }

    #[test]
    fn test_message_rides_along_with_ignored_action() {
        let mut world = two_agents(500.0);
        let intent = Intent::toward(ActionKind::Attack, id("b"), 1.0).with_message(id("b"), "watch out");
        let outcome = apply(&mut world, "a", &intent);
        assert!(matches!(outcome, IntentOutcome::Ignored(..)));

        assert_eq!(world.messages().len(), 1);
        let message = &world.messages()[0];
        assert_eq!(message.sender_id, id("a"));
        assert_eq!(message.receiver_id, id("b"));
        assert!(!message.delivered);
        assert_eq!(message.timestamp, 10_000);
        assert_eq!(world.agent(&id("a")).unwrap().last_message.as_deref(), Some("watch out"));
    }

    #[test]
    fn test_next_intent_resets_conflict_anim() {
        let mut world = two_agents(10.0);
        apply(&mut world, "a", &Intent::toward(ActionKind::Attack, id("b"), 1.0));
        apply(&mut world, "a", &Intent::idle(1.0));
        assert_eq!(world.agent(&id("a")).unwrap().state_anim, AnimState::Idle);
        assert_eq!(world.agent(&id("b")).unwrap().state_anim, AnimState::Conflict);
    }
}
