//! Tests for webhook signature verification.
//!
//! Covers the `sha256=` format rule, HMAC correctness against a known
//! vector, constant-time comparison semantics and the unauthenticated mode.

use super::*;
use proptest::prelude::*;

// ============================================================================
// Known-answer tests
// ============================================================================

mod digest_tests {
    use super::*;

    /// RFC 4231 test case 2 (HMAC-SHA256, key "Jefe").
    #[test]
    fn test_digest_matches_rfc4231_vector() {
        let digest = compute_digest_hex(b"what do ya want for nothing?", "Jefe").unwrap();
        assert_eq!(
            digest,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_digest_is_lowercase_hex() {
        let digest = compute_digest_hex(b"payload", "secret").unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_sign_payload_adds_prefix() {
        let signature = sign_payload(b"payload", "secret").unwrap();
        let digest = compute_digest_hex(b"payload", "secret").unwrap();
        assert_eq!(signature, format!("sha256={}", digest));
    }
}

// ============================================================================
// verify_signature tests
// ============================================================================

mod verify_signature_tests {
    use super::*;

    #[test]
    fn test_valid_signature_accepted() {
        let body = br#"{"type":"payment.success","data":{"amount":500}}"#;
        let signature = sign_payload(body, "my-secret").unwrap();

        assert!(verify_signature(body, &signature, "my-secret").is_ok());
        assert!(is_valid_signature(body, &signature, "my-secret"));
    }

    #[test]
    fn test_missing_prefix_is_invalid_format() {
        let body = b"hello";
        let digest = compute_digest_hex(body, "secret").unwrap();

        let result = verify_signature(body, &digest, "secret");
        assert_eq!(result, Err(SignatureError::InvalidFormat));
    }

    #[test]
    fn test_other_algorithm_prefix_is_invalid_format() {
        let body = b"hello";
        let digest = compute_digest_hex(body, "secret").unwrap();

        let result = verify_signature(body, &format!("sha1={}", digest), "secret");
        assert_eq!(result, Err(SignatureError::InvalidFormat));
    }

    #[test]
    fn test_short_digest_is_mismatch() {
        let result = verify_signature(b"hello", "sha256=deadbeef", "secret");
        assert_eq!(result, Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_wrong_secret_is_mismatch() {
        let body = b"some payload";
        let signature = sign_payload(body, "correct-secret").unwrap();

        let result = verify_signature(body, &signature, "wrong-secret");
        assert_eq!(result, Err(SignatureError::Mismatch));
    }

    /// Digests are compared as lowercase hex text, exactly as computed.
    #[test]
    fn test_uppercase_digest_is_mismatch() {
        let body = b"hello";
        let digest = compute_digest_hex(body, "secret").unwrap().to_uppercase();

        let result = verify_signature(body, &format!("sha256={}", digest), "secret");
        assert_eq!(result, Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_empty_body_signs_and_verifies() {
        let signature = sign_payload(b"", "secret").unwrap();
        assert!(verify_signature(b"", &signature, "secret").is_ok());
    }

    /// Whitespace changes the raw bytes, so a re-serialised body must fail.
    #[test]
    fn test_reformatted_json_body_fails() {
        let original = br#"{"type":"user.signup","data":{}}"#;
        let reformatted = br#"{ "type": "user.signup", "data": {} }"#;
        let signature = sign_payload(original, "secret").unwrap();

        assert_eq!(
            verify_signature(reformatted, &signature, "secret"),
            Err(SignatureError::Mismatch)
        );
    }
}

// ============================================================================
// constant_time_eq tests
// ============================================================================

mod constant_time_eq_tests {
    use super::*;

    #[test]
    fn test_equal_inputs() {
        assert!(constant_time_eq(b"abcdef", b"abcdef"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_different_lengths_never_equal() {
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(!constant_time_eq(b"abcd", b"abc"));
        assert!(!constant_time_eq(b"", b"a"));
    }

    #[test]
    fn test_single_byte_difference_detected_anywhere() {
        let base = b"0123456789abcdef".to_vec();
        for i in 0..base.len() {
            let mut other = base.clone();
            other[i] ^= 0x01;
            assert!(!constant_time_eq(&base, &other), "difference at {} missed", i);
        }
    }

    /// Timing differential check: comparing digests that differ in the first
    /// byte must take about as long as digests that differ in the last byte.
    ///
    /// Wall-clock measurements are noisy on shared CI runners, so this runs
    /// only on demand: `cargo test -- --ignored timing`.
    #[test]
    #[ignore]
    fn test_timing_independent_of_mismatch_position() {
        use std::time::Instant;

        const ITERATIONS: usize = 200_000;
        let expected = compute_digest_hex(b"timing", "secret").unwrap().into_bytes();

        let mut early = expected.clone();
        early[0] ^= 0x01;
        let mut late = expected.clone();
        let last = late.len() - 1;
        late[last] ^= 0x01;

        let measure = |candidate: &[u8]| {
            let start = Instant::now();
            for _ in 0..ITERATIONS {
                std::hint::black_box(constant_time_eq(
                    std::hint::black_box(&expected),
                    std::hint::black_box(candidate),
                ));
            }
            start.elapsed().as_secs_f64()
        };

        // Warm up, then take the best of several runs for each case.
        measure(&early);
        let early_time = (0..5).map(|_| measure(&early)).fold(f64::MAX, f64::min);
        let late_time = (0..5).map(|_| measure(&late)).fold(f64::MAX, f64::min);

        let ratio = early_time.max(late_time) / early_time.min(late_time);
        assert!(
            ratio < 1.5,
            "comparison time depends on mismatch position: early={early_time:.4}s late={late_time:.4}s"
        );
    }
}

// ============================================================================
// SignatureVerifier tests
// ============================================================================

mod verifier_tests {
    use super::*;

    #[test]
    fn test_verifier_without_secret_skips() {
        let verifier = SignatureVerifier::new(None);

        assert!(!verifier.is_enabled());
        assert_eq!(
            verifier.verify(b"anything", None),
            Ok(VerificationOutcome::Skipped)
        );
        assert_eq!(
            verifier.verify(b"anything", Some("sha256=deadbeef")),
            Ok(VerificationOutcome::Skipped)
        );
    }

    #[test]
    fn test_empty_secret_disables_verification() {
        let verifier = SignatureVerifier::new(Some(String::new()));
        assert!(!verifier.is_enabled());
    }

    #[test]
    fn test_verifier_with_secret_requires_header() {
        let verifier = SignatureVerifier::new(Some("secret".to_string()));

        assert_eq!(
            verifier.verify(b"body", None),
            Err(SignatureError::Missing)
        );
    }

    #[test]
    fn test_verifier_accepts_valid_signature() {
        let verifier = SignatureVerifier::new(Some("secret".to_string()));
        let signature = sign_payload(b"body", "secret").unwrap();

        assert_eq!(
            verifier.verify(b"body", Some(&signature)),
            Ok(VerificationOutcome::Verified)
        );
    }

    #[test]
    fn test_verifier_rejects_bad_prefix() {
        let verifier = SignatureVerifier::new(Some("secret".to_string()));
        assert_eq!(
            verifier.verify(b"body", Some("md5=abc")),
            Err(SignatureError::InvalidFormat)
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let verifier = SignatureVerifier::new(Some("top-secret-value".to_string()));
        let debug_str = format!("{:?}", verifier);

        assert!(
            !debug_str.contains("top-secret-value"),
            "secret must not appear in debug output; got: {}",
            debug_str
        );
        assert!(debug_str.contains("<REDACTED>"));
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_signed_body_always_verifies(
        body in proptest::collection::vec(any::<u8>(), 0..512),
        secret in "[ -~]{1,64}",
    ) {
        let signature = sign_payload(&body, &secret).unwrap();
        prop_assert!(is_valid_signature(&body, &signature, &secret));
    }

    #[test]
    fn prop_signature_does_not_verify_other_body(
        body in proptest::collection::vec(any::<u8>(), 0..256),
        other in proptest::collection::vec(any::<u8>(), 0..256),
        secret in "[ -~]{1,64}",
    ) {
        prop_assume!(body != other);
        let signature = sign_payload(&body, &secret).unwrap();
        prop_assert!(!is_valid_signature(&other, &signature, &secret));
    }
}
