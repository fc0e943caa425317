//! At-most-once settlement per offer.
//!
//! An offer reference identifies an external message. While an offer with
//! that reference rests on any channel's book the reference is *open*, and
//! no other channel may accept a submission carrying it. Once the message
//! has taken part in a settlement, as either the resting or the incoming
//! side, it is *settled* and no later submission may use it again.
//!
//! Because a resting reference is held open for its whole life on the book,
//! the resting side of a match can never have been settled somewhere else.
//!
//! Both sets are unbounded: books keep every offer for the life of the
//! process anyway, and the references are plain `u64`s.

use std::collections::HashSet;

use paddock_types::{OfferRef, PaddockError, Result};

/// Tracks which offer references are on a book and which have settled.
#[derive(Debug, Default)]
pub struct SettlementGuard {
    open: HashSet<OfferRef>,
    settled: HashSet<OfferRef>,
}

impl SettlementGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail if `offer` has already been settled.
    pub fn ensure_unsettled(&self, offer: OfferRef) -> Result<()> {
        if self.settled.contains(&offer) {
            return Err(PaddockError::OfferAlreadySettled(offer));
        }
        Ok(())
    }

    /// Reserve `offer` for a submission about to reach a book.
    ///
    /// # Errors
    /// - [`PaddockError::OfferAlreadySettled`] if the reference settled before
    /// - [`PaddockError::DuplicateOffer`] if it rests on some book right now
    pub fn claim(&mut self, offer: OfferRef) -> Result<()> {
        self.ensure_unsettled(offer)?;
        if !self.open.insert(offer) {
            return Err(PaddockError::DuplicateOffer(offer));
        }
        Ok(())
    }

    /// Give a claimed reference back (the offer was cancelled or never
    /// reached the book). Returns `false` if it was not open.
    pub fn release(&mut self, offer: OfferRef) -> bool {
        self.open.remove(&offer)
    }

    /// Record both sides of a settlement.
    ///
    /// Either both references are recorded or neither is.
    ///
    /// # Errors
    /// Returns [`PaddockError::OfferAlreadySettled`] naming the first
    /// reference that was already used.
    pub fn mark_settled(&mut self, resting: OfferRef, incoming: OfferRef) -> Result<()> {
        self.ensure_unsettled(resting)?;
        self.ensure_unsettled(incoming)?;
        if resting == incoming {
            return Err(PaddockError::OfferAlreadySettled(incoming));
        }
        self.open.remove(&resting);
        self.open.remove(&incoming);
        self.settled.insert(resting);
        self.settled.insert(incoming);
        Ok(())
    }

    #[must_use]
    pub fn is_settled(&self, offer: OfferRef) -> bool {
        self.settled.contains(&offer)
    }

    /// Whether `offer` is claimed by a resting or in-flight submission.
    #[must_use]
    pub fn is_open(&self, offer: OfferRef) -> bool {
        self.open.contains(&offer)
    }

    /// Number of settled offer references.
    #[must_use]
    pub fn len(&self) -> usize {
        self.settled.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_settle_ok() {
        let mut guard = SettlementGuard::new();
        guard.mark_settled(OfferRef(1), OfferRef(2)).unwrap();
        assert!(guard.is_settled(OfferRef(1)));
        assert!(guard.is_settled(OfferRef(2)));
        assert_eq!(guard.len(), 2);
    }

    #[test]
    fn reused_resting_ref_blocked() {
        let mut guard = SettlementGuard::new();
        guard.mark_settled(OfferRef(1), OfferRef(2)).unwrap();

        let err = guard.mark_settled(OfferRef(1), OfferRef(3)).unwrap_err();
        assert!(
            matches!(err, PaddockError::OfferAlreadySettled(r) if r == OfferRef(1)),
            "Expected OfferAlreadySettled, got: {err:?}"
        );
        assert!(!guard.is_settled(OfferRef(3)), "failed mark must not record anything");
    }

    #[test]
    fn reused_incoming_ref_blocked() {
        let mut guard = SettlementGuard::new();
        guard.mark_settled(OfferRef(1), OfferRef(2)).unwrap();
        assert!(guard.ensure_unsettled(OfferRef(2)).is_err());
        assert!(guard.mark_settled(OfferRef(5), OfferRef(2)).is_err());
        assert!(!guard.is_settled(OfferRef(5)));
    }

    #[test]
    fn same_ref_on_both_sides_blocked() {
        let mut guard = SettlementGuard::new();
        assert!(guard.mark_settled(OfferRef(4), OfferRef(4)).is_err());
        assert!(guard.is_empty());
    }

    #[test]
    fn open_ref_cannot_be_claimed_twice() {
        let mut guard = SettlementGuard::new();
        guard.claim(OfferRef(5)).unwrap();
        let err = guard.claim(OfferRef(5)).unwrap_err();
        assert!(matches!(err, PaddockError::DuplicateOffer(r) if r == OfferRef(5)));

        assert!(guard.release(OfferRef(5)));
        assert!(!guard.release(OfferRef(5)));
        guard.claim(OfferRef(5)).unwrap();
    }

    #[test]
    fn settling_closes_claims() {
        let mut guard = SettlementGuard::new();
        guard.claim(OfferRef(1)).unwrap();
        guard.claim(OfferRef(2)).unwrap();
        guard.mark_settled(OfferRef(1), OfferRef(2)).unwrap();

        assert!(!guard.is_open(OfferRef(1)));
        assert!(!guard.is_open(OfferRef(2)));
        let err = guard.claim(OfferRef(1)).unwrap_err();
        assert!(matches!(err, PaddockError::OfferAlreadySettled(_)));
    }

    #[test]
    fn empty_guard() {
        let guard = SettlementGuard::default();
        assert!(guard.is_empty());
        assert!(guard.ensure_unsettled(OfferRef(1)).is_ok());
        assert!(!guard.is_open(OfferRef(1)));
    }
}
