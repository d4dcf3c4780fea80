//! The peer session: lifecycle orchestration and message dispatch
//!
//! One `PeerSession` runs one side of a match. Every state transition
//! happens on the simulation tick: inbound channel events are drained
//! first, then the current phase advances. The local player is the only
//! writer of its own state; everything known about the opponent arrives
//! as messages. Damage is self-authoritative: a peer only ever reduces
//! its own health and announces the result.

use tracing::{debug, info, warn};

use crate::ai::AiController;
use crate::game::arena::Arena;
use crate::game::player::{facing_from_velocity, PLAYER_RADIUS};
use crate::game::projectile::throw_parameters;
use crate::game::{InputAction, InputFrame, PlayerState, ProjectileRecord};
use crate::net::protocol::PeerMsg;
use crate::net::transport::{ChannelEvent, PeerChannel};
use crate::session::ready::ReadyExchange;
use crate::session::replication::{RemotePlayer, ReplicationCadence};
use crate::session::round::{EndReason, RoundOutcome, RoundPhase, RoundState};
use crate::session::PeerRole;
use crate::util::rate_limit::PeerRateLimiter;
use crate::util::time::{tick_delta, tick_delta_ms};

pub struct PeerSession {
    role: PeerRole,
    /// Owned for the whole session; None in single-peer mode
    channel: Option<PeerChannel>,
    connected: bool,
    arena: Arena,
    local: PlayerState,
    remote: RemotePlayer,
    projectiles: Vec<ProjectileRecord>,
    round: RoundState,
    ready: ReadyExchange,
    cadence: ReplicationCadence,
    limiter: PeerRateLimiter,
    /// Drives the remote player when there is no peer
    ai: Option<AiController>,
    ai_level: u8,
    /// A `dead` message arrived this tick; resolved after simulation so a
    /// same-tick local death can take priority
    pending_remote_dead: bool,
    dead_sent: bool,
    finished: bool,
}

impl PeerSession {
    /// Session over an established channel. `ai_level` is only consulted
    /// if the opponent goes away and play degrades to single-peer.
    pub fn online(channel: PeerChannel, role: PeerRole, ai_level: u8) -> Self {
        Self::build(Some(channel), role, None, ai_level)
    }

    /// Single-peer session against the scripted opponent
    pub fn solo(ai_level: u8, seed: u64) -> Self {
        Self::build(
            None,
            PeerRole::Primary,
            Some(AiController::new(ai_level, seed)),
            ai_level,
        )
    }

    fn build(
        channel: Option<PeerChannel>,
        role: PeerRole,
        ai: Option<AiController>,
        ai_level: u8,
    ) -> Self {
        let arena = Arena::default();
        let (lx, ly) = arena.spawn_point(role);
        let (rx, ry) = arena.spawn_point(role.other());
        let connected = channel.is_some();

        Self {
            role,
            channel,
            connected,
            arena,
            local: PlayerState::spawn(lx, ly),
            remote: RemotePlayer::spawn(rx, ry),
            projectiles: Vec::new(),
            round: RoundState::new(),
            // Without a peer the remote readiness signal is pinned true
            ready: ReadyExchange::new(!connected),
            cadence: ReplicationCadence::new(),
            limiter: PeerRateLimiter::new(),
            ai,
            ai_level,
            pending_remote_dead: false,
            dead_sent: false,
            finished: false,
        }
    }

    /// Advance one simulation tick with this tick's local input
    pub fn tick(&mut self, input: &InputFrame) {
        if self.finished {
            // Torn down: late ticks and callbacks are ignored
            return;
        }

        self.drain_channel();

        if matches!(input.action, Some(InputAction::ReturnToMenu)) {
            self.leave_to_menu();
            return;
        }

        match self.round.phase() {
            RoundPhase::Lobby => self.round.enter_ready(),
            RoundPhase::ReadyNegotiation => self.tick_ready(input),
            RoundPhase::Countdown => {
                let step_before = self.round.countdown_display();
                if self.round.tick_countdown(tick_delta_ms()) {
                    info!(role = ?self.role, "Round started");
                } else if self.round.countdown_display() != step_before {
                    if let Some(step) = self.round.countdown_display() {
                        info!(step, "Countdown");
                    }
                }
            }
            RoundPhase::Active => self.tick_active(input),
            RoundPhase::RoundEnd | RoundPhase::RematchNegotiation => {
                if matches!(input.action, Some(InputAction::RequestRematch)) {
                    self.request_rematch();
                }
            }
        }
    }

    // --- observable state ---

    pub fn role(&self) -> PeerRole {
        self.role
    }

    pub fn phase(&self) -> RoundPhase {
        self.round.phase()
    }

    pub fn outcome(&self) -> Option<RoundOutcome> {
        self.round.outcome()
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.round.reason()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// True once the player has left to the menu; the session is inert
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn local_player(&self) -> &PlayerState {
        &self.local
    }

    pub fn remote_player(&self) -> &RemotePlayer {
        &self.remote
    }

    pub fn projectiles(&self) -> &[ProjectileRecord] {
        &self.projectiles
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    // --- inbound ---

    fn drain_channel(&mut self) {
        let mut events = Vec::new();
        if let Some(channel) = self.channel.as_mut() {
            while let Some(event) = channel.poll() {
                events.push(event);
            }
        }
        for event in events {
            match event {
                ChannelEvent::Message(msg) => {
                    if !self.limiter.check_inbound() {
                        warn!(role = ?self.role, "Rate limited peer message");
                        continue;
                    }
                    self.handle_message(msg);
                }
                ChannelEvent::Closed => self.handle_disconnect(),
            }
        }
    }

    fn handle_message(&mut self, msg: PeerMsg) {
        match msg {
            PeerMsg::ReadyStatus { is_ready } => match self.round.phase() {
                RoundPhase::Lobby | RoundPhase::ReadyNegotiation => {
                    self.ready.observe_remote(is_ready);
                }
                phase => debug!(?phase, "Ignoring ready_status"),
            },
            PeerMsg::Move {
                x,
                y,
                vx,
                vy,
                facing_direction,
            } => {
                if self.round.phase() == RoundPhase::Active {
                    self.remote.apply_move(x, y, vx, vy, facing_direction);
                } else {
                    debug!(phase = ?self.round.phase(), "Ignoring move outside active round");
                }
            }
            PeerMsg::Throw {
                x,
                y,
                size_multiplier,
                launch_velocity,
            } => {
                if self.round.phase() == RoundPhase::Active {
                    // The opponent's throw replays here with the vertical
                    // direction inverted into our half
                    let thrower = self.role.other();
                    self.projectiles.push(ProjectileRecord::launch(
                        thrower,
                        x,
                        y,
                        size_multiplier,
                        launch_velocity,
                        thrower.throw_direction(),
                    ));
                } else {
                    debug!(phase = ?self.round.phase(), "Ignoring throw outside active round");
                }
            }
            PeerMsg::Dead => {
                if self.round.phase() == RoundPhase::Active {
                    self.pending_remote_dead = true;
                } else {
                    debug!(phase = ?self.round.phase(), "Ignoring dead message");
                }
            }
            PeerMsg::RematchRequest => self.handle_rematch_request(),
            PeerMsg::RematchAccept => {
                if matches!(
                    self.round.phase(),
                    RoundPhase::RoundEnd | RoundPhase::RematchNegotiation
                ) {
                    info!(role = ?self.role, "Rematch accepted by opponent");
                    self.restart_round();
                } else {
                    debug!(phase = ?self.round.phase(), "Ignoring rematch_accept");
                }
            }
            PeerMsg::ReturnToMenu => self.handle_opponent_left(),
        }
    }

    fn handle_rematch_request(&mut self) {
        if !matches!(
            self.round.phase(),
            RoundPhase::RoundEnd | RoundPhase::RematchNegotiation
        ) {
            debug!(phase = ?self.round.phase(), "Ignoring rematch_request");
            return;
        }
        self.round.enter_rematch_negotiation();
        self.round.rematch.remote_requested = true;
        if self.round.rematch.local_requested {
            // Both requests crossed in flight. The Primary alone answers,
            // so exactly one accept is produced; both sides restart.
            if self.role == PeerRole::Primary {
                self.send(PeerMsg::RematchAccept);
            }
            self.restart_round();
        }
    }

    fn handle_opponent_left(&mut self) {
        info!(role = ?self.role, "Opponent returned to menu");
        self.connected = false;
        if !self.round.has_ended() {
            self.end_round(RoundOutcome::Win, EndReason::OpponentLeft);
        }
    }

    fn handle_disconnect(&mut self) {
        if !self.connected {
            return;
        }
        warn!(role = ?self.role, "Transport lost");
        self.connected = false;
        if !self.round.has_ended() {
            self.end_round(RoundOutcome::Win, EndReason::Disconnected);
        }
    }

    // --- phase ticks ---

    fn tick_ready(&mut self, input: &InputFrame) {
        if let Some(value) = self.ready.observe_local(input.is_ready) {
            self.send(PeerMsg::ReadyStatus { is_ready: value });
        }
        if self.ready.both_ready() {
            self.round.latch_start();
        }
        if self.round.tick_start_delay(tick_delta_ms()) {
            info!(role = ?self.role, "Both players ready, counting down");
        }
    }

    fn tick_active(&mut self, input: &InputFrame) {
        let bounds = self.arena.bounds_for(self.role);
        self.local.apply_move(input.move_x, input.move_y, &bounds);

        match input.action {
            Some(InputAction::Charge { power }) => self.local.add_charge(power),
            Some(InputAction::Throw { power }) => self.throw(power),
            _ => {}
        }

        self.local.upkeep();
        self.advance_opponent();
        self.update_projectiles();
        self.resolve_round_end();

        if self.round.phase() == RoundPhase::Active && self.cadence.should_send() {
            self.send(PeerMsg::Move {
                x: self.local.x,
                y: self.local.y,
                vx: self.local.vx,
                vy: self.local.vy,
                facing_direction: self.local.facing,
            });
        }
    }

    fn throw(&mut self, power: f32) {
        if !self.local.can_throw() {
            return;
        }
        let charge = self.local.consume_charge();
        let (size_multiplier, launch_velocity) = throw_parameters(charge, power);
        let (x, y) = (self.local.x, self.local.y);
        self.projectiles.push(ProjectileRecord::launch(
            self.role,
            x,
            y,
            size_multiplier,
            launch_velocity,
            self.role.throw_direction(),
        ));
        self.send(PeerMsg::Throw {
            x,
            y,
            size_multiplier,
            launch_velocity,
        });
    }

    /// Move the opponent's rendered copy: smoothing toward replicated
    /// targets online, direct control by the scripted opponent otherwise
    fn advance_opponent(&mut self) {
        if let Some(ai) = self.ai.as_mut() {
            let ai_role = self.role.other();
            let bounds = self.arena.bounds_for(ai_role);
            let home_y = (bounds.min_y + bounds.max_y) / 2.0;
            let decision = {
                let incoming: Vec<&ProjectileRecord> = self
                    .projectiles
                    .iter()
                    .filter(|ball| ball.owner == self.role)
                    .collect();
                ai.update(
                    (self.remote.x, self.remote.y),
                    (self.local.x, self.local.y),
                    &incoming,
                    home_y,
                )
            };

            let dt = tick_delta();
            let (x, y) = bounds.clamp(
                self.remote.x + decision.vx * dt,
                self.remote.y + decision.vy * dt,
            );
            self.remote.drive(
                x,
                y,
                decision.vx,
                decision.vy,
                facing_from_velocity(decision.vx, decision.vy),
            );

            if let Some(throw) = decision.throw {
                let (size_multiplier, launch_velocity) =
                    throw_parameters(throw.charge, throw.power);
                self.projectiles.push(ProjectileRecord::launch(
                    ai_role,
                    x,
                    y,
                    size_multiplier,
                    launch_velocity,
                    ai_role.throw_direction(),
                ));
            }
        } else {
            self.remote.interpolate();
        }
    }

    fn update_projectiles(&mut self) {
        let arena = self.arena;
        let role = self.role;
        let local = &mut self.local;
        let remote = &self.remote;

        self.projectiles.retain_mut(|ball| {
            if !ball.update(&arena) {
                return false;
            }
            if ball.owner != role {
                if ball.hits(local.x, local.y, PLAYER_RADIUS) {
                    local.apply_damage(ball.damage());
                    return false;
                }
            } else if ball.hits(remote.x, remote.y, PLAYER_RADIUS) {
                // Visual cleanup only: the opponent is the sole authority
                // over its own health and will report the result itself
                return false;
            }
            true
        });
    }

    /// Resolve this tick's round-end triggers. A local death is checked
    /// first so that, when it coincides with a remote `dead`, the
    /// self-reported loss wins and the guard absorbs the other trigger.
    fn resolve_round_end(&mut self) {
        if self.local.is_dead() {
            if !self.dead_sent {
                self.dead_sent = true;
                self.send(PeerMsg::Dead);
            }
            self.end_round(RoundOutcome::Loss, EndReason::LocalDeath);
        }
        if std::mem::take(&mut self.pending_remote_dead) {
            self.end_round(RoundOutcome::Win, EndReason::OpponentDied);
        }
    }

    fn end_round(&mut self, outcome: RoundOutcome, reason: EndReason) {
        if self.round.end(outcome, reason) {
            info!(
                role = ?self.role,
                ?outcome,
                ?reason,
                duration_secs = self.round.active_secs(),
                "Round over"
            );
        }
    }

    // --- round end actions ---

    fn request_rematch(&mut self) {
        if !self.connected {
            // No handshake possible: reset locally and carry on alone
            info!(role = ?self.role, "Opponent gone, restarting locally");
            self.ensure_opponent_ai();
            self.restart_round();
            return;
        }
        if self.round.rematch.local_requested {
            return;
        }
        if self.round.rematch.remote_requested {
            // The opponent asked first; answering is the acceptance
            self.send(PeerMsg::RematchAccept);
            self.restart_round();
        } else {
            self.round.rematch.local_requested = true;
            self.round.enter_rematch_negotiation();
            self.send(PeerMsg::RematchRequest);
        }
    }

    fn leave_to_menu(&mut self) {
        info!(role = ?self.role, "Leaving to menu");
        self.send(PeerMsg::ReturnToMenu);
        self.connected = false;
        // Dropping the channel releases the transport exactly once; all
        // periodic broadcasts and timers stop with the tick loop
        self.channel = None;
        self.finished = true;
        self.round.to_lobby();
    }

    fn restart_round(&mut self) {
        let (lx, ly) = self.arena.spawn_point(self.role);
        self.local.respawn(lx, ly);
        let (rx, ry) = self.arena.spawn_point(self.role.other());
        self.remote.respawn(rx, ry);
        self.projectiles.clear();
        self.dead_sent = false;
        self.pending_remote_dead = false;
        self.cadence = ReplicationCadence::new();
        self.round.restart();
        info!(role = ?self.role, "Rematch, counting down");
    }

    /// The remote player needs a driver for single-peer rounds
    fn ensure_opponent_ai(&mut self) {
        if self.ai.is_none() {
            self.ai = Some(AiController::new(self.ai_level, rand::random()));
        }
    }

    fn send(&self, msg: PeerMsg) {
        if !self.connected {
            return;
        }
        if let Some(channel) = &self.channel {
            channel.send(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::Facing;

    fn online_pair() -> (PeerSession, PeerSession) {
        let (a, b) = PeerChannel::pair();
        (
            PeerSession::online(a, PeerRole::Primary, 5),
            PeerSession::online(b, PeerRole::Secondary, 5),
        )
    }

    fn ready() -> InputFrame {
        InputFrame {
            is_ready: true,
            ..Default::default()
        }
    }

    fn idle() -> InputFrame {
        InputFrame::default()
    }

    fn action(action: InputAction) -> InputFrame {
        InputFrame {
            action: Some(action),
            ..Default::default()
        }
    }

    fn run_to_active(p: &mut PeerSession, s: &mut PeerSession) {
        for _ in 0..400 {
            p.tick(&ready());
            s.tick(&ready());
            if p.phase() == RoundPhase::Active && s.phase() == RoundPhase::Active {
                return;
            }
        }
        panic!("sessions never reached the active round");
    }

    /// Drive both sessions to RoundEnd by killing the secondary
    fn end_round_by_death(p: &mut PeerSession, s: &mut PeerSession) {
        run_to_active(p, s);
        s.local.health = 0.0;
        s.tick(&idle());
        p.tick(&idle());
        assert_eq!(s.phase(), RoundPhase::RoundEnd);
        assert_eq!(p.phase(), RoundPhase::RoundEnd);
    }

    #[test]
    fn round_starts_only_when_both_ready() {
        let (mut p, mut s) = online_pair();

        for _ in 0..100 {
            p.tick(&ready());
            s.tick(&idle());
        }
        assert_eq!(p.phase(), RoundPhase::ReadyNegotiation);
        assert_eq!(s.phase(), RoundPhase::ReadyNegotiation);

        run_to_active(&mut p, &mut s);
        assert_eq!(p.phase(), RoundPhase::Active);
        assert_eq!(s.phase(), RoundPhase::Active);
    }

    #[test]
    fn countdown_lasts_three_seconds_of_ticks() {
        let (mut p, mut s) = online_pair();

        let mut guard = 0;
        while p.phase() != RoundPhase::Countdown {
            p.tick(&ready());
            s.tick(&ready());
            guard += 1;
            assert!(guard < 200, "countdown never began");
        }

        let mut ticks = 0;
        while p.phase() == RoundPhase::Countdown {
            p.tick(&ready());
            s.tick(&ready());
            ticks += 1;
            assert!(ticks < 200, "countdown never finished");
        }
        // 3 x 1000 ms steps at 30 TPS, then the go tick
        assert!((89..=92).contains(&ticks), "countdown took {ticks} ticks");
        assert_eq!(p.phase(), RoundPhase::Active);
    }

    #[test]
    fn movement_is_replicated_and_smoothed() {
        let (mut p, mut s) = online_pair();
        run_to_active(&mut p, &mut s);

        let move_right = InputFrame {
            move_x: 1.0,
            is_ready: true,
            ..Default::default()
        };
        for _ in 0..9 {
            p.tick(&move_right);
            s.tick(&ready());
        }

        let remote = s.remote_player();
        assert!(remote.target_x > 410.0, "target_x = {}", remote.target_x);
        assert_eq!(remote.facing, Facing::Right);
        // Rendered position eases rather than snapping
        assert!(remote.x < remote.target_x);
    }

    #[test]
    fn stale_messages_before_active_are_ignored() {
        let (mut p, s) = online_pair();

        // Inject from the secondary's side without ticking it
        s.channel.as_ref().unwrap().send(PeerMsg::Move {
            x: 50.0,
            y: 50.0,
            vx: 0.0,
            vy: 0.0,
            facing_direction: Facing::Up,
        });
        s.channel.as_ref().unwrap().send(PeerMsg::Dead);

        for _ in 0..5 {
            p.tick(&idle());
        }
        assert_eq!(p.remote_player().target_x, 400.0);
        assert_eq!(p.remote_player().target_y, 120.0);
        assert_ne!(p.phase(), RoundPhase::RoundEnd);
    }

    #[test]
    fn throw_replicates_and_damages_only_the_receiver() {
        let (mut p, mut s) = online_pair();
        run_to_active(&mut p, &mut s);

        p.tick(&action(InputAction::Throw { power: 20.0 }));
        s.tick(&ready());

        // Both sides see one Primary-owned snowball flying up the arena
        assert_eq!(p.projectiles().len(), 1);
        assert_eq!(s.projectiles().len(), 1);
        assert_eq!(s.projectiles()[0].owner, PeerRole::Primary);
        assert!(p.projectiles()[0].vel_y < 0.0);
        assert!(s.projectiles()[0].vel_y < 0.0);

        for _ in 0..60 {
            p.tick(&ready());
            s.tick(&ready());
        }

        // Only the receiver's own overlap test reduced its own health
        assert!(s.local_player().health < 0.99);
        assert_eq!(p.local_player().health, 1.0);
        assert!(p.projectiles().is_empty());
        assert!(s.projectiles().is_empty());
    }

    #[test]
    fn self_death_is_announced_once_and_opponent_wins() {
        let (mut p, mut s) = online_pair();
        run_to_active(&mut p, &mut s);

        s.local.health = 0.0;
        s.tick(&idle());
        assert_eq!(s.phase(), RoundPhase::RoundEnd);
        assert_eq!(s.outcome(), Some(RoundOutcome::Loss));
        assert_eq!(s.end_reason(), Some(EndReason::LocalDeath));

        p.tick(&idle());
        assert_eq!(p.phase(), RoundPhase::RoundEnd);
        assert_eq!(p.outcome(), Some(RoundOutcome::Win));
        assert_eq!(p.end_reason(), Some(EndReason::OpponentDied));

        // Nothing double-processes afterwards
        for _ in 0..10 {
            p.tick(&idle());
            s.tick(&idle());
        }
        assert_eq!(p.outcome(), Some(RoundOutcome::Win));
        assert_eq!(s.outcome(), Some(RoundOutcome::Loss));
    }

    #[test]
    fn simultaneous_death_and_dead_message_prefers_self_loss() {
        let (mut p, mut s) = online_pair();
        run_to_active(&mut p, &mut s);

        // Secondary dies and its dead message is already queued for the
        // primary when the primary's own health hits zero the same tick
        s.local.health = 0.0;
        s.tick(&idle());
        p.local.health = 0.0;
        p.tick(&idle());

        assert_eq!(p.outcome(), Some(RoundOutcome::Loss));
        assert_eq!(p.end_reason(), Some(EndReason::LocalDeath));

        // The primary's own dead message reaches an already-ended round
        s.tick(&idle());
        assert_eq!(s.outcome(), Some(RoundOutcome::Loss));
    }

    #[test]
    fn sequential_rematch_restarts_both_sides() {
        let (mut p, mut s) = online_pair();
        end_round_by_death(&mut p, &mut s);

        // Secondary asks first, primary answers
        s.tick(&action(InputAction::RequestRematch));
        assert_eq!(s.phase(), RoundPhase::RematchNegotiation);
        p.tick(&idle());
        p.tick(&action(InputAction::RequestRematch));
        assert_eq!(p.phase(), RoundPhase::Countdown);
        s.tick(&idle());
        assert_eq!(s.phase(), RoundPhase::Countdown);

        // Clean slate on both sides
        assert_eq!(p.outcome(), None);
        assert_eq!(s.outcome(), None);
        assert_eq!(p.local_player().health, 1.0);
        assert_eq!(s.local_player().health, 1.0);
        assert!(p.projectiles().is_empty());

        // And the loop plays again
        run_to_active(&mut p, &mut s);
    }

    #[test]
    fn crossed_rematch_requests_produce_one_accept() {
        let (mut p, mut s) = online_pair();
        end_round_by_death(&mut p, &mut s);

        // Both requests are in flight before either peer has seen the
        // other's: each side believes it asked first
        p.round.rematch.local_requested = true;
        s.round.rematch.local_requested = true;
        p.channel.as_ref().unwrap().send(PeerMsg::RematchRequest);
        s.channel.as_ref().unwrap().send(PeerMsg::RematchRequest);

        p.tick(&idle());
        s.tick(&idle());

        assert_eq!(p.phase(), RoundPhase::Countdown);
        assert_eq!(s.phase(), RoundPhase::Countdown);

        // The secondary sent nothing back: the primary's accept was the
        // only one on the wire
        assert!(p.channel.as_mut().unwrap().poll().is_none());
    }

    #[test]
    fn disconnect_mid_round_wins_and_degrades_to_solo() {
        let (mut p, mut s) = online_pair();
        run_to_active(&mut p, &mut s);

        drop(s);
        p.tick(&idle());

        assert_eq!(p.phase(), RoundPhase::RoundEnd);
        assert_eq!(p.outcome(), Some(RoundOutcome::Win));
        assert_eq!(p.end_reason(), Some(EndReason::Disconnected));
        assert!(!p.is_connected());

        // Rematch is local-only now: no handshake, straight to countdown
        p.tick(&action(InputAction::RequestRematch));
        assert_eq!(p.phase(), RoundPhase::Countdown);

        // The scripted opponent has taken over the remote player
        for _ in 0..200 {
            p.tick(&idle());
        }
        assert_eq!(p.phase(), RoundPhase::Active);
        let bounds = p.arena().bounds_for(PeerRole::Secondary);
        assert!(p.remote_player().y >= bounds.min_y);
        assert!(p.remote_player().y <= bounds.max_y);
    }

    #[test]
    fn return_to_menu_tears_down_and_notifies() {
        let (mut p, mut s) = online_pair();
        run_to_active(&mut p, &mut s);

        s.tick(&action(InputAction::ReturnToMenu));
        assert!(s.is_finished());
        assert_eq!(s.phase(), RoundPhase::Lobby);
        assert!(!s.is_connected());

        p.tick(&idle());
        assert_eq!(p.phase(), RoundPhase::RoundEnd);
        assert_eq!(p.outcome(), Some(RoundOutcome::Win));
        assert_eq!(p.end_reason(), Some(EndReason::OpponentLeft));

        // The channel closing right after must not rewrite the outcome
        for _ in 0..5 {
            p.tick(&idle());
        }
        assert_eq!(p.end_reason(), Some(EndReason::OpponentLeft));

        // A finished session ignores further ticks
        s.tick(&ready());
        assert_eq!(s.phase(), RoundPhase::Lobby);
    }

    #[test]
    fn solo_round_runs_to_a_loss_against_the_bot() {
        let mut session = PeerSession::solo(10, 7);

        for _ in 0..400 {
            session.tick(&ready());
            if session.phase() == RoundPhase::Active {
                break;
            }
        }
        assert_eq!(session.phase(), RoundPhase::Active);

        // Standing still against the hardest opponent ends one way
        let mut ticks = 0;
        while session.phase() == RoundPhase::Active {
            session.tick(&idle());
            ticks += 1;
            assert!(ticks < 6000, "the scripted opponent never won");
        }
        assert_eq!(session.outcome(), Some(RoundOutcome::Loss));
        assert_eq!(session.end_reason(), Some(EndReason::LocalDeath));
    }
}
