use std::collections::HashMap;

use thiserror::Error;

use shiritori_types::{VoteKind, WordEntry};

use crate::kana::to_hiragana;

/// An unresolved vote. At most one exists per room at any time.
#[derive(Debug, Clone)]
pub struct PendingVote {
    pub kind: VoteKind,
    pub word: String,
    pub hiragana: String,
    /// The player who submitted the word under vote.
    pub player: String,
    /// Set for challenge votes only.
    pub challenger: Option<String>,
    /// Ballots cast so far: voter name -> accept.
    pub votes: HashMap<String, bool>,
    pub reason: String,
    pub resolved: bool,
}

/// The outcome of a resolved vote.
#[derive(Debug, Clone)]
pub struct VoteResolution {
    pub kind: VoteKind,
    pub word: String,
    pub hiragana: String,
    pub player: String,
    pub challenger: Option<String>,
    pub accepted: bool,
    /// True only when a challenge vote was not accepted: the word is reverted.
    pub reverted: bool,
}

/// Describes a freshly started vote, for the `vote_request` broadcast.
#[derive(Debug, Clone)]
pub struct VoteSummary {
    pub kind: VoteKind,
    pub word: String,
    pub player: String,
    pub challenger: Option<String>,
    pub reason: String,
    pub vote_count: usize,
    pub total_players: usize,
}

#[derive(Debug, Error, PartialEq)]
pub enum VoteError {
    #[error("投票中です。投票が終わるまでお待ちください")]
    AlreadyPending,
    #[error("ルームに参加していません")]
    NotInRoom,
    #[error("自分の単語には指摘できません")]
    OwnWord,
}

/// Single-slot vote state machine for a room.
///
/// Roster snapshots are passed in by the caller (the room holds the player
/// list); the manager itself only tracks the pending ballot.
#[derive(Debug, Default)]
pub struct VoteManager {
    pending: Option<PendingVote>,
}

impl VoteManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|pv| !pv.resolved)
    }

    pub fn pending(&self) -> Option<&PendingVote> {
        self.pending.as_ref()
    }

    /// Discards any pending vote unconditionally.
    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Starts a vote to challenge the last accepted word. The challenger
    /// auto-votes reject (they believe the word should be removed).
    pub fn start_challenge_vote(
        &mut self,
        challenger: &str,
        last_word: &WordEntry,
        roster: &[String],
    ) -> Result<VoteSummary, VoteError> {
        if self.has_pending() {
            return Err(VoteError::AlreadyPending);
        }
        if !roster.iter().any(|n| n == challenger) {
            return Err(VoteError::NotInRoom);
        }
        if last_word.player == challenger {
            return Err(VoteError::OwnWord);
        }

        let mut votes = HashMap::new();
        votes.insert(challenger.to_string(), false);

        let pv = PendingVote {
            kind: VoteKind::Challenge,
            word: last_word.word.clone(),
            hiragana: to_hiragana(&last_word.word),
            player: last_word.player.clone(),
            challenger: Some(challenger.to_string()),
            votes,
            reason: format!("「{}」は存在しない単語かもしれません", last_word.word),
            resolved: false,
        };
        let summary = VoteSummary {
            kind: VoteKind::Challenge,
            word: pv.word.clone(),
            player: pv.player.clone(),
            challenger: pv.challenger.clone(),
            reason: pv.reason.clone(),
            vote_count: pv.votes.len(),
            total_players: eligible_voters(Some(&pv), roster),
        };
        self.pending = Some(pv);
        Ok(summary)
    }

    /// Starts a genre vote for a word that failed genre membership. The
    /// submitter auto-votes accept.
    pub fn start_genre_vote(
        &mut self,
        word: &str,
        hiragana: &str,
        player: &str,
        genre: &str,
        roster: &[String],
    ) -> VoteSummary {
        let mut votes = HashMap::new();
        votes.insert(player.to_string(), true);

        let pv = PendingVote {
            kind: VoteKind::Genre,
            word: word.to_string(),
            hiragana: hiragana.to_string(),
            player: player.to_string(),
            challenger: None,
            votes,
            reason: format!("「{}」はジャンル「{}」のリストにありません", word, genre),
            resolved: false,
        };
        let summary = VoteSummary {
            kind: VoteKind::Genre,
            word: pv.word.clone(),
            player: pv.player.clone(),
            challenger: None,
            reason: pv.reason.clone(),
            vote_count: pv.votes.len(),
            total_players: eligible_voters(Some(&pv), roster),
        };
        self.pending = Some(pv);
        summary
    }

    /// Records a ballot. Resolves and returns the outcome once every eligible
    /// voter has voted. No-ops for absent votes, non-members, and the
    /// challenged player.
    pub fn cast_vote(
        &mut self,
        player: &str,
        accept: bool,
        roster: &[String],
    ) -> Option<VoteResolution> {
        let pv = match self.pending.as_mut() {
            Some(pv) if !pv.resolved => pv,
            _ => return None,
        };
        if !roster.iter().any(|n| n == player) {
            return None;
        }
        // The challenged player cannot vote
        if pv.kind == VoteKind::Challenge && pv.player == player {
            return None;
        }

        pv.votes.insert(player.to_string(), accept);

        if pv.votes.len() < eligible_voters(Some(pv), roster) {
            return None;
        }
        Some(self.resolve(roster))
    }

    /// Resolves the vote with whatever ballots exist (timeout path).
    /// Missing eligible voters count as reject.
    pub fn force_resolve(&mut self, roster: &[String]) -> Option<VoteResolution> {
        match self.pending.as_ref() {
            Some(pv) if !pv.resolved => {}
            _ => return None,
        }
        Some(self.resolve(roster))
    }

    /// Lets the active challenger withdraw a pending challenge vote.
    /// Has no side effects on game state.
    pub fn withdraw_challenge(&mut self, challenger: &str) -> bool {
        match self.pending.as_ref() {
            Some(pv)
                if !pv.resolved
                    && pv.kind == VoteKind::Challenge
                    && pv.challenger.as_deref() == Some(challenger) =>
            {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Current ballot count and eligible voter total.
    pub fn counts(&self, roster: &[String]) -> (usize, usize) {
        let count = self.pending.as_ref().map_or(0, |pv| pv.votes.len());
        (count, eligible_voters(self.pending.as_ref(), roster))
    }

    fn resolve(&mut self, roster: &[String]) -> VoteResolution {
        let pv = self.pending.take().expect("resolve called without a pending vote");

        let accept_count = pv.votes.values().filter(|&&v| v).count();
        let mut reject_count = pv.votes.len() - accept_count;
        // Missing eligible voters count as reject; ties reject.
        reject_count += eligible_voters(Some(&pv), roster).saturating_sub(pv.votes.len());
        let accepted = accept_count > reject_count;

        VoteResolution {
            kind: pv.kind,
            word: pv.word,
            hiragana: pv.hiragana,
            player: pv.player,
            challenger: pv.challenger,
            accepted,
            reverted: pv.kind == VoteKind::Challenge && !accepted,
        }
    }
}

/// Number of players allowed to vote: everyone except the challenged player
/// of a challenge vote.
fn eligible_voters(pending: Option<&PendingVote>, roster: &[String]) -> usize {
    let mut total = roster.len();
    if let Some(pv) = pending {
        if pv.kind == VoteKind::Challenge && roster.iter().any(|n| n == &pv.player) {
            total -= 1;
        }
    }
    total
}
