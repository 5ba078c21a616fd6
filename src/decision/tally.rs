use crate::models::event::CandidateDate;
use crate::models::participant::ResponseStatus;

/// Number of `available` answers a candidate date received.
pub fn score(date: &CandidateDate) -> usize {
    date.responses
        .iter()
        .filter(|r| r.status == ResponseStatus::Available)
        .count()
}

/// Candidate dates sharing the highest positive score, in input order.
///
/// Dates nobody marked available never win, so an event without a single
/// `available` answer yields an empty result. Every date tied at the maximum
/// is returned; breaking the tie is left to the caller.
pub fn most_voted(dates: &[CandidateDate]) -> Vec<&CandidateDate> {
    let mut best = 0;
    let mut winners = Vec::new();
    for date in dates {
        let score = score(date);
        if score == 0 {
            continue;
        }
        if score > best {
            best = score;
            winners.clear();
            winners.push(date);
        } else if score == best {
            winners.push(date);
        }
    }
    winners
}
