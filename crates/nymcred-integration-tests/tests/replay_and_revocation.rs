//! Replay rejection, retention window, and revocation through the ledger.

mod common;

use std::time::Duration;

use common::{nonce, World};
use nymcred_ledger::{IdentityLedger, LedgerError, Revocation};
use nymcred_crypto::Ed25519KeyPair;
use nymcred_vc::{RejectReason, Verdict, VerifierConfig};
use rand_core::OsRng;

#[test]
fn identical_proof_and_nonce_is_accepted_once() {
    let world = World::new();
    let verifier = world.verifier();
    let n = nonce("abc123");
    let proof = world.present(&["m3"], &n);
    assert!(verifier.verify(&proof, &n, &world.ledger).unwrap().is_accept());
    for _ in 0..3 {
        assert_eq!(
            verifier.verify(&proof, &n, &world.ledger).unwrap(),
            Verdict::Reject(RejectReason::Replayed)
        );
    }
    assert_eq!(verifier.replay_cache().len(), 1);
}

#[test]
fn rejected_presentations_are_not_remembered() {
    let world = World::new();
    let verifier = world.verifier();
    let proof = world.present(&["m3"], &nonce("first"));
    assert_eq!(
        verifier.verify(&proof, &nonce("second"), &world.ledger).unwrap(),
        Verdict::Reject(RejectReason::NonceMismatch)
    );
    assert!(verifier.replay_cache().is_empty());
    assert!(verifier.verify(&proof, &nonce("first"), &world.ledger).unwrap().is_accept());
}

#[test]
fn entries_expire_after_the_window() {
    let world = World::new();
    let config = VerifierConfig {
        replay_window: Duration::from_millis(50),
        ..VerifierConfig::default()
    };
    let verifier = world.verifier_with(&config);
    let n = nonce("abc123");
    let proof = world.present(&["m3"], &n);
    assert!(verifier.verify(&proof, &n, &world.ledger).unwrap().is_accept());
    std::thread::sleep(Duration::from_millis(120));
    assert!(verifier.verify(&proof, &n, &world.ledger).unwrap().is_accept());
}

#[test]
fn capacity_bounds_the_cache() {
    let world = World::new();
    let config = VerifierConfig {
        replay_capacity: 4,
        ..VerifierConfig::default()
    };
    let verifier = world.verifier_with(&config);
    for i in 0..4 {
        let n = nonce(&format!("n{i}"));
        let proof = world.present(&["m1"], &n);
        assert!(verifier.verify(&proof, &n, &world.ledger).unwrap().is_accept());
    }
    for i in 4..10 {
        let n = nonce(&format!("n{i}"));
        let proof = world.present(&["m1"], &n);
        assert_eq!(
            verifier.verify(&proof, &n, &world.ledger).unwrap(),
            Verdict::Reject(RejectReason::Replayed)
        );
    }
    assert_eq!(verifier.replay_cache().len(), 4);
}

#[test]
fn full_cache_still_rejects_replays_within_the_window() {
    let world = World::new();
    let config = VerifierConfig {
        replay_window: Duration::from_secs(3600),
        replay_capacity: 1,
        ..VerifierConfig::default()
    };
    let verifier = world.verifier_with(&config);
    let n = nonce("abc123");
    let first = world.present(&["m3"], &n);
    let second = world.present(&["m3"], &n);

    assert_eq!(
        verifier.verify(&first, &n, &world.ledger).unwrap(),
        Verdict::Accept(
            [("m3".to_string(), "student".to_string())].into_iter().collect()
        )
    );
    assert_eq!(
        verifier.verify(&second, &n, &world.ledger).unwrap(),
        Verdict::Reject(RejectReason::Replayed)
    );
    assert_eq!(
        verifier.verify(&first, &n, &world.ledger).unwrap(),
        Verdict::Reject(RejectReason::Replayed)
    );
    assert_eq!(verifier.replay_cache().len(), 1);
}

#[test]
fn full_cache_admits_again_after_the_window() {
    let world = World::new();
    let config = VerifierConfig {
        replay_window: Duration::from_millis(50),
        replay_capacity: 1,
        ..VerifierConfig::default()
    };
    let verifier = world.verifier_with(&config);
    let n = nonce("abc123");
    let first = world.present(&["m3"], &n);
    let second = world.present(&["m3"], &n);
    assert!(verifier.verify(&first, &n, &world.ledger).unwrap().is_accept());
    assert!(!verifier.verify(&second, &n, &world.ledger).unwrap().is_accept());
    std::thread::sleep(Duration::from_millis(120));
    assert!(verifier.verify(&second, &n, &world.ledger).unwrap().is_accept());
}

#[test]
fn revocation_rejects_every_later_presentation() {
    let world = World::new();
    let verifier = world.verifier();
    let before = world.present(&["m3"], &nonce("before"));

    let revocation = world
        .issuer
        .revocation(world.ledger.id(), world.holder.pseudonym())
        .unwrap();
    world.ledger.revoke(world.holder.pseudonym(), &revocation).unwrap();
    assert!(world.ledger.lookup(world.holder.pseudonym()).unwrap().revoked);

    // Proofs made before and after revocation, with any disclosure.
    assert_eq!(
        verifier.verify(&before, &nonce("before"), &world.ledger).unwrap(),
        Verdict::Reject(RejectReason::RevokedCredential)
    );
    for disclose in [&[][..], &["m1"][..], &["m1", "m2", "m3"][..]] {
        let n = nonce("after");
        let proof = world.present(disclose, &n);
        assert_eq!(
            verifier.verify(&proof, &n, &world.ledger).unwrap(),
            Verdict::Reject(RejectReason::RevokedCredential)
        );
    }

    assert!(matches!(
        world.ledger.revoke(world.holder.pseudonym(), &revocation),
        Err(LedgerError::AlreadyRevoked(_))
    ));
}

#[test]
fn revocation_needs_an_authorized_signature() {
    let world = World::new();
    let rogue = Ed25519KeyPair::generate(&mut OsRng);
    let statement = nymcred_ledger::RevocationStatement::new(world.ledger.id(), *world.holder.pseudonym());
    let forged = Revocation::sign(&rogue, &statement).unwrap();
    assert!(matches!(
        world.ledger.revoke(world.holder.pseudonym(), &forged),
        Err(LedgerError::UnauthorizedRevocation(_))
    ));

    // A valid authority, but a statement for a different ledger.
    let other = nymcred_ledger::InMemoryLedger::new();
    let misdirected = world
        .issuer
        .revocation(other.id(), world.holder.pseudonym())
        .unwrap();
    assert!(world.ledger.revoke(world.holder.pseudonym(), &misdirected).is_err());

    let verifier = world.verifier();
    let n = nonce("still-valid");
    let proof = world.present(&["m3"], &n);
    assert!(verifier.verify(&proof, &n, &world.ledger).unwrap().is_accept());
}

#[test]
fn ledger_outage_is_retryable() {
    let world = World::new();
    let verifier = world.verifier();
    let n = nonce("abc123");
    let proof = world.present(&["m3"], &n);

    world.ledger.set_available(false);
    let err = verifier.verify(&proof, &n, &world.ledger).unwrap_err();
    assert!(matches!(err, LedgerError::Unavailable(_)));
    assert!(err.is_transient());
    assert!(verifier.replay_cache().is_empty());

    // Failures before the ledger step never touch it.
    assert_eq!(
        verifier.verify(&proof, &nonce("other"), &world.ledger).unwrap(),
        Verdict::Reject(RejectReason::NonceMismatch)
    );

    world.ledger.set_available(true);
    assert!(verifier.verify(&proof, &n, &world.ledger).unwrap().is_accept());
}
