use crate::interaction::UserRef;
use rand::seq::SliceRandom;
use rand::Rng;

/// What ending a giveaway produced. Either way the giveaway is marked
/// ended afterwards; there is no retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NoParticipants,
    Winners(Vec<UserRef>),
}

/// Uniform sampling without replacement: every participant has the same
/// chance, nobody is drawn twice, and `min(winner_count, participants)`
/// winners come out.
pub fn draw_winners<R: Rng + ?Sized>(
    participants: &[UserRef],
    winner_count: i32,
    rng: &mut R,
) -> Vec<UserRef> {
    let count = (winner_count.max(0) as usize).min(participants.len());
    participants.choose_multiple(rng, count).copied().collect()
}

pub fn decide<R: Rng + ?Sized>(
    participants: &[UserRef],
    winner_count: i32,
    rng: &mut R,
) -> Outcome {
    if participants.is_empty() {
        Outcome::NoParticipants
    } else {
        Outcome::Winners(draw_winners(participants, winner_count, rng))
    }
}
